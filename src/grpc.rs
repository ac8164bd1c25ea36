// Copyright 2023 Greptime Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Row inserts over the GreptimeDB gRPC `Handle` service

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use greptime_proto::v1::auth_header::AuthScheme;
use greptime_proto::v1::greptime_database_client::GreptimeDatabaseClient;
use greptime_proto::v1::greptime_request::Request;
use greptime_proto::v1::value::ValueData;
use greptime_proto::v1::{
    greptime_response, AffectedRows, AuthHeader, Basic, ColumnDataType, ColumnSchema,
    GreptimeRequest, RequestHeader, RowInsertRequest, RowInsertRequests,
};
use snafu::ResultExt;
use tokio::runtime::Runtime;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{self, ConnectError, TransportError};
use crate::row::Row;
use crate::schema::{Column, DataType, SemanticType};
use crate::transport::{Connection, Connector, Credentials, Transport};
use crate::value::Value;

/// Opens gRPC connections to a GreptimeDB frontend.
#[derive(Debug, Clone)]
pub struct GrpcConnector {
    connect_timeout: Duration,
    timeout: Duration,
}

impl GrpcConnector {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            timeout: config.timeout,
        }
    }
}

impl Connector for GrpcConnector {
    fn connect(
        &self,
        endpoint: &str,
        database: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Connection, ConnectError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .thread_name_fn(|| {
                static ATOMIC_ID: AtomicUsize = AtomicUsize::new(0);
                let id = ATOMIC_ID.fetch_add(1, Ordering::Relaxed);
                format!("gt-ingester-{id}")
            })
            .build()
            .context(error::StartRuntimeSnafu)?;

        let channel_endpoint = Endpoint::from_shared(format!("http://{endpoint}"))
            .context(error::InvalidEndpointSnafu { endpoint })?
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout);
        let channel = runtime
            .block_on(channel_endpoint.connect())
            .context(error::CreateChannelSnafu)?;
        info!("Opened gRPC channel to {endpoint}");

        Ok(Box::new(GrpcConnection {
            client: GreptimeDatabaseClient::new(channel),
            header: request_header(database, credentials),
            runtime,
        }))
    }
}

/// A live gRPC channel plus the runtime driving it.
///
/// Sends block the calling thread, so a connection must not be used from
/// inside an async context.
pub struct GrpcConnection {
    client: GreptimeDatabaseClient<Channel>,
    header: RequestHeader,
    runtime: Runtime,
}

impl Transport for GrpcConnection {
    fn send(
        &mut self,
        table_name: &str,
        schema: &[Column],
        rows: &[Row],
    ) -> Result<(), TransportError> {
        let request = GreptimeRequest {
            header: Some(self.header.clone()),
            request: Some(Request::RowInserts(to_row_insert_requests(
                table_name, schema, rows,
            ))),
        };

        let response = self
            .runtime
            .block_on(self.client.handle(tonic::Request::new(request)))?
            .into_inner();

        match response.response {
            Some(greptime_response::Response::AffectedRows(AffectedRows { value })) => {
                debug!("Inserted {value} rows into {table_name}");
                Ok(())
            }
            _ => error::OtherSnafu {
                msg: "GreptimeResponse is empty",
            }
            .fail(),
        }
    }
}

fn request_header(database: &str, credentials: Option<&Credentials>) -> RequestHeader {
    let authorization = credentials.map(|c| AuthHeader {
        auth_scheme: Some(AuthScheme::Basic(Basic {
            username: c.username.clone(),
            password: c.password.clone(),
        })),
    });
    RequestHeader {
        authorization,
        dbname: database.to_string(),
        ..Default::default()
    }
}

fn to_row_insert_requests(table_name: &str, schema: &[Column], rows: &[Row]) -> RowInsertRequests {
    let rows = greptime_proto::v1::Rows {
        schema: schema.iter().map(to_column_schema).collect(),
        rows: rows
            .iter()
            .map(|row| greptime_proto::v1::Row {
                values: row.values().iter().map(to_proto_value).collect(),
            })
            .collect(),
    };
    RowInsertRequests {
        inserts: vec![RowInsertRequest {
            table_name: table_name.to_string(),
            rows: Some(rows),
        }],
    }
}

fn to_column_schema(column: &Column) -> ColumnSchema {
    let semantic_type = match column.semantic_type {
        SemanticType::Tag => greptime_proto::v1::SemanticType::Tag,
        SemanticType::Field => greptime_proto::v1::SemanticType::Field,
        SemanticType::Timestamp => greptime_proto::v1::SemanticType::Timestamp,
    };
    ColumnSchema {
        column_name: column.name.clone(),
        datatype: to_column_data_type(column.data_type) as i32,
        semantic_type: semantic_type as i32,
        ..Default::default()
    }
}

fn to_column_data_type(data_type: DataType) -> ColumnDataType {
    match data_type {
        DataType::Boolean => ColumnDataType::Boolean,
        DataType::Int8 => ColumnDataType::Int8,
        DataType::Int16 => ColumnDataType::Int16,
        DataType::Int32 => ColumnDataType::Int32,
        DataType::Int64 => ColumnDataType::Int64,
        DataType::Uint8 => ColumnDataType::Uint8,
        DataType::Uint16 => ColumnDataType::Uint16,
        DataType::Uint32 => ColumnDataType::Uint32,
        DataType::Uint64 => ColumnDataType::Uint64,
        DataType::Float32 => ColumnDataType::Float32,
        DataType::Float64 => ColumnDataType::Float64,
        DataType::Binary => ColumnDataType::Binary,
        DataType::String => ColumnDataType::String,
        DataType::TimestampSecond => ColumnDataType::TimestampSecond,
        DataType::TimestampMillisecond => ColumnDataType::TimestampMillisecond,
        DataType::TimestampMicrosecond => ColumnDataType::TimestampMicrosecond,
        DataType::TimestampNanosecond => ColumnDataType::TimestampNanosecond,
    }
}

fn to_proto_value(value: &Value) -> greptime_proto::v1::Value {
    let value_data = match value {
        Value::Boolean(v) => ValueData::BoolValue(*v),
        Value::Int8(v) => ValueData::I8Value(i32::from(*v)),
        Value::Int16(v) => ValueData::I16Value(i32::from(*v)),
        Value::Int32(v) => ValueData::I32Value(*v),
        Value::Int64(v) => ValueData::I64Value(*v),
        Value::Uint8(v) => ValueData::U8Value(u32::from(*v)),
        Value::Uint16(v) => ValueData::U16Value(u32::from(*v)),
        Value::Uint32(v) => ValueData::U32Value(*v),
        Value::Uint64(v) => ValueData::U64Value(*v),
        Value::Float32(v) => ValueData::F32Value(*v),
        Value::Float64(v) => ValueData::F64Value(*v),
        Value::Binary(v) => ValueData::BinaryValue(v.clone()),
        Value::String(v) => ValueData::StringValue(v.clone()),
        Value::TimestampSecond(v) => ValueData::TimestampSecondValue(*v),
        Value::TimestampMillisecond(v) => ValueData::TimestampMillisecondValue(*v),
        Value::TimestampMicrosecond(v) => ValueData::TimestampMicrosecondValue(*v),
        Value::TimestampNanosecond(v) => ValueData::TimestampNanosecondValue(*v),
    };
    greptime_proto::v1::Value {
        value_data: Some(value_data),
    }
}

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

use std::fmt;
use std::io;
use std::str::Utf8Error;

use snafu::{Location, Snafu};
use tonic::{Code, Status};

use crate::config::ClientConfigBuilderError;
use crate::schema::{DataType, SemanticType};

/// Status codes returned by every fallible operation exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum StatusCode {
    Success = 0,
    Unknown = 1000,
    ServerUnavailable = 1001,
    InvalidArgument = 1002,
    InvalidPointer = 1003,
    IllegalState = 1004,
}

impl StatusCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid column definition '{}': {}", name, reason))]
    InvalidColumn {
        name: String,
        reason: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Column '{}' cannot be a timestamp column, '{}' already is",
        name,
        existing
    ))]
    DuplicateTimestamp {
        name: String,
        existing: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Schema of table '{}' is locked, no more columns can be defined", table))]
    SchemaLocked {
        table: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Table '{}' requires exactly one timestamp column, found {}",
        table,
        count
    ))]
    TimestampColumnCount {
        table: String,
        count: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid column count: expected {}, got {}", expected, actual))]
    InvalidColumnCount {
        expected: usize,
        actual: usize,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display(
        "Value of column '{}' has type {:?}, column type is {:?}",
        column,
        actual,
        expected
    ))]
    ValueTypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Unknown data type code: {}", code))]
    UnknownDataType {
        code: i32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Unknown semantic type code: {}", code))]
    UnknownSemanticType {
        code: i32,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Data type {:?} cannot hold a {:?} column", data_type, semantic_type))]
    IncompatibleSemanticType {
        data_type: DataType,
        semantic_type: SemanticType,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid credentials: {}", msg))]
    InvalidCredentials {
        msg: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid client config"))]
    InvalidConfig {
        source: ClientConfigBuilderError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to read config file {}", path))]
    ReadConfigFile {
        path: String,
        source: io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to parse config file {}", path))]
    ParseConfigFile {
        path: String,
        source: toml::de::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Client of database '{}' has already been closed", database))]
    ClientClosed {
        database: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{} handle {} is not live", kind, id))]
    InvalidHandle {
        kind: &'static str,
        id: u64,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{} pointer cannot be null", name))]
    NullPointer {
        name: &'static str,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Invalid UTF-8 in {}", name))]
    InvalidCString {
        name: &'static str,
        source: Utf8Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to connect to {}", endpoint))]
    Connect {
        endpoint: String,
        source: ConnectError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("Failed to write rows of table '{}'", table))]
    Transport {
        table: String,
        source: TransportError,
        #[snafu(implicit)]
        location: Location,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidColumn { .. }
            | Error::DuplicateTimestamp { .. }
            | Error::InvalidColumnCount { .. }
            | Error::ValueTypeMismatch { .. }
            | Error::UnknownDataType { .. }
            | Error::UnknownSemanticType { .. }
            | Error::IncompatibleSemanticType { .. }
            | Error::InvalidCredentials { .. }
            | Error::InvalidConfig { .. }
            | Error::ReadConfigFile { .. }
            | Error::ParseConfigFile { .. }
            | Error::InvalidCString { .. } => StatusCode::InvalidArgument,

            Error::SchemaLocked { .. }
            | Error::TimestampColumnCount { .. }
            | Error::ClientClosed { .. }
            | Error::InvalidHandle { .. } => StatusCode::IllegalState,

            Error::NullPointer { .. } => StatusCode::InvalidPointer,

            Error::Connect { .. } => StatusCode::ServerUnavailable,

            Error::Transport { source, .. } => source.status_code(),
        }
    }

    /// Indicate if the error is retriable
    pub fn is_retriable(&self) -> bool {
        self.status_code() == StatusCode::ServerUnavailable
    }
}

/// Failure reported by a [Transport](crate::transport::Transport) collaborator.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransportError {
    /// The remote could not be reached or did not answer in time.
    #[snafu(display("Server unavailable: {}", msg))]
    Unavailable { msg: String },

    /// The server refused the schema or the data.
    #[snafu(display("Request rejected: {}", msg))]
    Rejected { msg: String },

    #[snafu(display("{}", msg))]
    Other { msg: String },
}

impl TransportError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TransportError::Unavailable { .. } => StatusCode::ServerUnavailable,
            TransportError::Rejected { .. } => StatusCode::InvalidArgument,
            TransportError::Other { .. } => StatusCode::Unknown,
        }
    }
}

pub const INNER_ERROR_MSG: &str = "INNER_ERROR_MSG";

impl From<Status> for TransportError {
    fn from(e: Status) -> Self {
        fn get_metadata_value(e: &Status, key: &str) -> Option<String> {
            e.metadata()
                .get(key)
                .and_then(|v| String::from_utf8(v.as_bytes().to_vec()).ok())
        }

        let msg = get_metadata_value(&e, INNER_ERROR_MSG).unwrap_or(e.to_string());

        match e.code() {
            Code::Unavailable
            | Code::DeadlineExceeded
            | Code::Cancelled
            | Code::Aborted
            | Code::ResourceExhausted => TransportError::Unavailable { msg },
            Code::InvalidArgument
            | Code::NotFound
            | Code::AlreadyExists
            | Code::FailedPrecondition
            | Code::OutOfRange
            | Code::Unauthenticated
            | Code::PermissionDenied => TransportError::Rejected { msg },
            _ => TransportError::Other { msg },
        }
    }
}

/// Failure of the [Connector](crate::transport::Connector) collaborator to open a connection.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConnectError {
    #[snafu(display("Invalid endpoint {}", endpoint))]
    InvalidEndpoint {
        endpoint: String,
        source: tonic::transport::Error,
    },

    #[snafu(display("Failed to create gRPC channel"))]
    CreateChannel { source: tonic::transport::Error },

    #[snafu(display("Failed to start client runtime"))]
    StartRuntime { source: io::Error },

    #[snafu(display("{}", msg))]
    Refused { msg: String },
}

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

use std::sync::Arc;

use derive_new::new;
use greptimedb_row_ingester::error::{ConnectError, TransportError};
use greptimedb_row_ingester::schema::{field, tag, timestamp};
use greptimedb_row_ingester::{
    ClientHandle, Column, Connection, Connector, Credentials, DataType, Registry, Row,
    RowBuilderHandle, StatusCode, Transport, Value,
};
use parking_lot::Mutex;

type Batches = Arc<Mutex<Vec<(String, Vec<Row>)>>>;

#[derive(new)]
struct RecordingConnection {
    batches: Batches,
    reject: Arc<Mutex<bool>>,
}

impl Transport for RecordingConnection {
    fn send(
        &mut self,
        table_name: &str,
        _schema: &[Column],
        rows: &[Row],
    ) -> Result<(), TransportError> {
        if *self.reject.lock() {
            return Err(TransportError::Rejected {
                msg: format!("table {table_name} is read only"),
            });
        }
        self.batches
            .lock()
            .push((table_name.to_string(), rows.to_vec()));
        Ok(())
    }
}

#[derive(new, Default)]
struct RecordingConnector {
    batches: Batches,
    reject: Arc<Mutex<bool>>,
}

impl Connector for RecordingConnector {
    fn connect(
        &self,
        _endpoint: &str,
        _database: &str,
        _credentials: Option<&Credentials>,
    ) -> Result<Connection, ConnectError> {
        Ok(Box::new(RecordingConnection::new(
            self.batches.clone(),
            self.reject.clone(),
        )))
    }
}

fn weather_columns() -> Vec<Column> {
    vec![
        timestamp("ts", DataType::TimestampMillisecond),
        tag("location", DataType::String),
        field("value", DataType::Float32),
        field("valid", DataType::Boolean),
    ]
}

fn weather_row(ts: i64, location: &str, value: f32, valid: bool) -> Vec<Value> {
    vec![
        Value::TimestampMillisecond(ts),
        location.into(),
        value.into(),
        valid.into(),
    ]
}

#[test]
fn test_weather_round() {
    let connector = Arc::new(RecordingConnector::default());
    let registry = Registry::with_connector(connector.clone());

    let client = registry
        .create_client("public", "127.0.0.1:4001", None, None)
        .unwrap();
    let builder = registry
        .create_row_builder("weather", &weather_columns())
        .unwrap();

    registry
        .append_row(&builder, weather_row(1700047510000, "hangzhou", 2.0, true))
        .unwrap();
    registry
        .append_row(&builder, weather_row(1700047511000, "shanghai", 2.3, false))
        .unwrap();
    assert_eq!(registry.buffered_rows(&builder).unwrap(), 2);

    registry.write(&client, &builder).unwrap();
    assert_eq!(registry.buffered_rows(&builder).unwrap(), 0);

    registry
        .append_row(&builder, weather_row(1700047512000, "hangzhou", 2.1, true))
        .unwrap();
    registry.write(&client, &builder).unwrap();

    let batches = connector.batches.lock();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].0, "weather");
    assert_eq!(batches[0].1.len(), 2);
    assert_eq!(batches[0].1[1].get(1).and_then(Value::as_string_ref), Some("shanghai"));
    assert_eq!(batches[1].1.len(), 1);
    drop(batches);

    registry.destroy_row_builder(builder).unwrap();
    registry.destroy_client(client).unwrap();
    assert_eq!(registry.client_count(), 0);
    assert_eq!(registry.row_builder_count(), 0);
}

#[test]
fn test_rejected_rows_stay_buffered() {
    let connector = Arc::new(RecordingConnector::default());
    let registry = Registry::with_connector(connector.clone());
    let client = registry
        .create_client("public", "127.0.0.1:4001", Some("greptime"), Some("secret"))
        .unwrap();
    let builder = registry
        .create_row_builder("weather", &weather_columns())
        .unwrap();
    registry
        .append_row(&builder, weather_row(1700047510000, "hangzhou", 2.0, true))
        .unwrap();

    *connector.reject.lock() = true;
    let err = registry.write(&client, &builder).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::InvalidArgument);
    assert!(!err.is_retriable());
    assert_eq!(registry.buffered_rows(&builder).unwrap(), 1);

    *connector.reject.lock() = false;
    registry.write(&client, &builder).unwrap();
    assert_eq!(registry.buffered_rows(&builder).unwrap(), 0);
    assert_eq!(connector.batches.lock().len(), 1);
}

#[test]
fn test_invalid_rows_are_not_buffered() {
    let registry = Registry::with_connector(Arc::new(RecordingConnector::default()));
    let builder = registry
        .create_row_builder("weather", &weather_columns())
        .unwrap();

    let mut short = weather_row(1700047510000, "hangzhou", 2.0, true);
    short.pop();
    let err = registry.append_row(&builder, short).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::InvalidArgument);

    let mut wrong = weather_row(1700047510000, "hangzhou", 2.0, true);
    wrong[3] = Value::Int32(1);
    let err = registry.append_row(&builder, wrong).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::InvalidArgument);

    let mut wrong_resolution = weather_row(1700047510000, "hangzhou", 2.0, true);
    wrong_resolution[0] = Value::TimestampSecond(1700047510);
    let err = registry.append_row(&builder, wrong_resolution).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::InvalidArgument);

    assert_eq!(registry.buffered_rows(&builder).unwrap(), 0);
}

#[test]
fn test_stale_handles() {
    let registry = Registry::with_connector(Arc::new(RecordingConnector::default()));
    let client = registry
        .create_client("public", "127.0.0.1:4001", None, None)
        .unwrap();
    let builder = registry
        .create_row_builder("weather", &weather_columns())
        .unwrap();
    let stale_client = ClientHandle::from_raw(client.id());
    let stale_builder = RowBuilderHandle::from_raw(builder.id());

    registry.destroy_row_builder(builder).unwrap();
    let err = registry
        .append_row(
            &stale_builder,
            weather_row(1700047510000, "hangzhou", 2.0, true),
        )
        .unwrap_err();
    assert_eq!(err.status_code(), StatusCode::IllegalState);
    let err = registry.write(&client, &stale_builder).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::IllegalState);

    registry.destroy_client(client).unwrap();
    let fresh = registry
        .create_row_builder("weather", &weather_columns())
        .unwrap();
    let err = registry.write(&stale_client, &fresh).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::IllegalState);
    assert_ne!(fresh.id(), stale_builder.id());
}

#[test]
fn test_builders_shared_across_threads() {
    let connector = Arc::new(RecordingConnector::default());
    let registry = Arc::new(Registry::with_connector(connector.clone()));
    let client = registry
        .create_client("public", "127.0.0.1:4001", None, None)
        .unwrap();

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let registry = registry.clone();
            let client = ClientHandle::from_raw(client.id());
            std::thread::spawn(move || {
                let builder = registry
                    .create_row_builder(&format!("weather_{t}"), &weather_columns())
                    .unwrap();
                for i in 0..25 {
                    registry
                        .append_row(&builder, weather_row(i, "hangzhou", 1.0, true))
                        .unwrap();
                }
                registry.write(&client, &builder).unwrap();
                registry.destroy_row_builder(builder).unwrap();
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let batches = connector.batches.lock();
    assert_eq!(batches.len(), 4);
    assert!(batches.iter().all(|(_, rows)| rows.len() == 25));
    assert_eq!(registry.row_builder_count(), 0);
}

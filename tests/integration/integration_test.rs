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

// Integration tests against a running GreptimeDB instance.
// Run with `cargo test --test integration -- --ignored`.

use std::time::{SystemTime, UNIX_EPOCH};

use greptimedb_row_ingester::schema::{field, tag, timestamp};
use greptimedb_row_ingester::{
    Client, ClientConfig, DataType, Registry, Result, RowBuilder, StatusCode, Value,
};

struct TestConfig {
    endpoint: String,
    database: String,
}

impl TestConfig {
    fn new() -> Self {
        Self {
            endpoint: std::env::var("GREPTIMEDB_TEST_ENDPOINT")
                .unwrap_or_else(|_| "localhost:4001".to_string()),
            database: std::env::var("GREPTIMEDB_TEST_DATABASE")
                .unwrap_or_else(|_| "public".to_string()),
        }
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig::builder()
            .endpoint(self.endpoint.as_str())
            .database(self.database.as_str())
            .build()
            .unwrap()
    }
}

fn unique_table_name(prefix: &str) -> String {
    format!("{prefix}_{}", now_millis())
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

fn weather_builder(table_name: &str) -> RowBuilder {
    RowBuilder::with_columns(
        table_name,
        [
            timestamp("ts", DataType::TimestampMillisecond),
            tag("location", DataType::String),
            field("value", DataType::Float32),
            field("valid", DataType::Boolean),
        ],
    )
    .unwrap()
}

#[test]
#[ignore = "requires a running GreptimeDB"]
fn test_write_weather_rows() -> Result<()> {
    let config = TestConfig::new();
    let client = Client::connect(&config.client_config())?;
    let mut builder = weather_builder(&unique_table_name("weather"));

    let now = now_millis();
    builder.append_row(vec![
        Value::TimestampMillisecond(now),
        "hangzhou".into(),
        2.0f32.into(),
        true.into(),
    ])?;
    builder.append_row(vec![
        Value::TimestampMillisecond(now + 1000),
        "shanghai".into(),
        2.3f32.into(),
        false.into(),
    ])?;

    client.write(&mut builder)?;
    assert!(builder.is_empty());

    // same builder, next batch
    builder.append_row(vec![
        Value::TimestampMillisecond(now + 2000),
        "hangzhou".into(),
        2.1f32.into(),
        true.into(),
    ])?;
    client.write(&mut builder)?;
    assert!(builder.is_empty());

    client.close();
    Ok(())
}

#[test]
#[ignore = "requires a running GreptimeDB"]
fn test_write_all_data_types() -> Result<()> {
    let config = TestConfig::new();
    let client = Client::connect(&config.client_config())?;

    let mut builder = RowBuilder::with_columns(
        unique_table_name("all_types"),
        [
            timestamp("ts", DataType::TimestampNanosecond),
            tag("host", DataType::String),
            field("f_bool", DataType::Boolean),
            field("f_i8", DataType::Int8),
            field("f_i16", DataType::Int16),
            field("f_i32", DataType::Int32),
            field("f_i64", DataType::Int64),
            field("f_u8", DataType::Uint8),
            field("f_u16", DataType::Uint16),
            field("f_u32", DataType::Uint32),
            field("f_u64", DataType::Uint64),
            field("f_f32", DataType::Float32),
            field("f_f64", DataType::Float64),
            field("f_binary", DataType::Binary),
        ],
    )?;
    builder.append_row(vec![
        Value::TimestampNanosecond(now_millis() * 1_000_000),
        "host1".into(),
        true.into(),
        (-8i8).into(),
        (-16i16).into(),
        (-32i32).into(),
        (-64i64).into(),
        8u8.into(),
        16u16.into(),
        32u32.into(),
        64u64.into(),
        1.5f32.into(),
        2.5f64.into(),
        vec![0xde, 0xad, 0xbe, 0xef].into(),
    ])?;

    client.write(&mut builder)?;
    assert!(builder.is_empty());
    Ok(())
}

#[test]
#[ignore = "requires a running GreptimeDB"]
fn test_handle_lifecycle() -> Result<()> {
    let config = TestConfig::new();
    let registry = Registry::new();

    let client = registry.create_client(&config.database, &config.endpoint, None, None)?;
    let builder = registry.create_row_builder(
        &unique_table_name("handles"),
        &[
            timestamp("ts", DataType::TimestampMillisecond),
            tag("location", DataType::String),
            field("value", DataType::Float32),
        ],
    )?;

    registry.append_row(
        &builder,
        vec![
            Value::TimestampMillisecond(now_millis()),
            "hangzhou".into(),
            2.0f32.into(),
        ],
    )?;
    registry.write(&client, &builder)?;
    assert_eq!(registry.buffered_rows(&builder)?, 0);

    registry.destroy_row_builder(builder)?;
    registry.destroy_client(client)?;
    Ok(())
}

#[test]
#[ignore = "requires a running GreptimeDB"]
fn test_type_conflict_is_rejected() -> Result<()> {
    let config = TestConfig::new();
    let client = Client::connect(&config.client_config())?;
    let table_name = unique_table_name("conflict");

    let mut builder = weather_builder(&table_name);
    builder.append_row(vec![
        Value::TimestampMillisecond(now_millis()),
        "hangzhou".into(),
        2.0f32.into(),
        true.into(),
    ])?;
    client.write(&mut builder)?;

    // `value` already exists as a float column
    let mut conflicting = RowBuilder::with_columns(
        &table_name,
        [
            timestamp("ts", DataType::TimestampMillisecond),
            tag("location", DataType::String),
            field("value", DataType::String),
        ],
    )?;
    conflicting.append_row(vec![
        Value::TimestampMillisecond(now_millis()),
        "hangzhou".into(),
        "warm".into(),
    ])?;

    let err = client.write(&mut conflicting).unwrap_err();
    assert_ne!(err.status_code(), StatusCode::Success);
    assert_eq!(conflicting.len(), 1);
    Ok(())
}

#[test]
#[ignore = "requires a running GreptimeDB"]
fn test_unreachable_endpoint() {
    let config = ClientConfig::builder()
        .endpoint("127.0.0.1:1")
        .connect_timeout(std::time::Duration::from_millis(500))
        .build()
        .unwrap();
    let err = Client::connect(&config).err().unwrap();
    assert_eq!(err.status_code(), StatusCode::ServerUnavailable);
    assert!(err.is_retriable());
}

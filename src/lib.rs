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

//! Row-oriented ingestion client for GreptimeDB
//!
//! Rows are buffered in a [`RowBuilder`] against a fixed column schema and
//! written by a [`Client`]. The [`handle`] module exposes both behind opaque
//! tokens, and [`ffi`] wraps that layer in a C ABI.

pub mod client;
pub mod config;
pub mod error;
pub mod ffi;
pub mod grpc;
pub mod handle;
pub mod logging;
pub mod row;
pub mod schema;
pub mod transport;
pub mod value;

pub use self::client::Client;
pub use self::config::ClientConfig;
pub use self::error::{Error, Result, StatusCode};
pub use self::handle::{ClientHandle, Registry, RowBuilderHandle};
pub use self::row::{Row, RowBuilder};
pub use self::schema::{Column, ColumnSchema, DataType, SemanticType};
pub use self::transport::{Connection, Connector, Credentials, Transport};
pub use self::value::Value;

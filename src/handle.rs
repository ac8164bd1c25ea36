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

//! Handle-based access to clients and row builders
//!
//! Objects live in a [`Registry`] and callers hold opaque tokens. A token is
//! never reused once its object is destroyed, so a stale token is reported
//! as an illegal-state error instead of reaching another object.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use snafu::{ensure, OptionExt, ResultExt};
use tracing::{debug, info};

use crate::client::Client;
use crate::config::ClientConfig;
use crate::grpc::GrpcConnector;
use crate::row::RowBuilder;
use crate::schema::{Column, SemanticType};
use crate::transport::Connector;
use crate::value::Value;
use crate::{error, Result};

/// Token of a live [`Client`]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ClientHandle(u64);

/// Token of a live [`RowBuilder`]
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RowBuilderHandle(u64);

macro_rules! impl_handle {
    ($handle:ty) => {
        impl $handle {
            /// Raw token, never zero.
            pub fn id(&self) -> u64 {
                self.0
            }

            /// Rebuild a handle from a raw token. Unknown tokens are only
            /// detected when the handle is used.
            pub fn from_raw(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

impl_handle!(ClientHandle);
impl_handle!(RowBuilderHandle);

struct Slots<T> {
    kind: &'static str,
    entries: DashMap<u64, Arc<T>>,
    // Zero is reserved as the null token.
    next_id: AtomicU64,
}

impl<T> Slots<T> {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    fn insert(&self, value: T) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(id, Arc::new(value));
        id
    }

    fn get(&self, id: u64) -> Result<Arc<T>> {
        self.entries
            .get(&id)
            .map(|entry| entry.value().clone())
            .context(error::InvalidHandleSnafu {
                kind: self.kind,
                id,
            })
    }

    fn remove(&self, id: u64) -> Result<Arc<T>> {
        self.entries
            .remove(&id)
            .map(|(_, value)| value)
            .context(error::InvalidHandleSnafu {
                kind: self.kind,
                id,
            })
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Owner of every object reachable through a handle.
pub struct Registry {
    // Falls back to gRPC when unset
    connector: RwLock<Option<Arc<dyn Connector>>>,
    clients: Slots<Client>,
    row_builders: Slots<Mutex<RowBuilder>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            connector: RwLock::new(None),
            clients: Slots::new("client"),
            row_builders: Slots::new("row builder"),
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry whose clients connect through `connector`.
    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector: RwLock::new(Some(connector)),
            ..Default::default()
        }
    }

    /// Route clients created from now on through `connector`. Clients that
    /// are already connected keep their connection.
    pub fn set_connector(&self, connector: Arc<dyn Connector>) {
        *self.connector.write() = Some(connector);
    }

    /// Process-wide registry backing the C ABI.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    pub fn create_client(
        &self,
        database: &str,
        endpoint: &str,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<ClientHandle> {
        let mut builder = ClientConfig::builder();
        builder.endpoint(endpoint).database(database);
        if let Some(username) = username {
            builder.username(username);
        }
        if let Some(password) = password {
            builder.password(password);
        }
        let config = builder.build().context(error::InvalidConfigSnafu)?;
        self.create_client_with_config(&config)
    }

    pub fn create_client_with_config(&self, config: &ClientConfig) -> Result<ClientHandle> {
        let connector = self.connector.read().clone();
        let client = match connector {
            Some(connector) => Client::connect_with(config, connector.as_ref())?,
            None => Client::connect_with(config, &GrpcConnector::new(config))?,
        };
        let id = self.clients.insert(client);
        info!("Created client {id} for {}", config.endpoint);
        Ok(ClientHandle(id))
    }

    /// Close and release a client. The handle is consumed.
    pub fn destroy_client(&self, handle: ClientHandle) -> Result<()> {
        let client = self.clients.remove(handle.0)?;
        client.close();
        info!("Destroyed client {}", handle.0);
        Ok(())
    }

    /// Create a builder with an empty schema, to be filled by
    /// [`Registry::define_column`].
    pub fn new_row_builder(&self, table_name: &str) -> RowBuilderHandle {
        let id = self
            .row_builders
            .insert(Mutex::new(RowBuilder::new(table_name)));
        debug!("Created row builder {id} for {table_name}");
        RowBuilderHandle(id)
    }

    pub fn define_column(&self, handle: &RowBuilderHandle, column: Column) -> Result<()> {
        let builder = self.row_builders.get(handle.0)?;
        let mut builder = builder.lock();
        builder.define(column)
    }

    /// Create a builder with all `columns` defined and its schema locked.
    ///
    /// Nothing is registered unless every column is accepted.
    pub fn create_row_builder(
        &self,
        table_name: &str,
        columns: &[Column],
    ) -> Result<RowBuilderHandle> {
        let count = columns
            .iter()
            .filter(|c| c.semantic_type == SemanticType::Timestamp)
            .count();
        ensure!(
            count == 1,
            error::TimestampColumnCountSnafu {
                table: table_name,
                count,
            }
        );

        let builder = RowBuilder::with_columns(table_name, columns.iter().cloned())?;
        let id = self.row_builders.insert(Mutex::new(builder));
        info!(
            "Created row builder {id} for {table_name} with {} columns",
            columns.len()
        );
        Ok(RowBuilderHandle(id))
    }

    /// Release a builder and its buffered rows. The handle is consumed.
    pub fn destroy_row_builder(&self, handle: RowBuilderHandle) -> Result<()> {
        let builder = self.row_builders.remove(handle.0)?;
        match Arc::try_unwrap(builder) {
            Ok(builder) => builder.into_inner().destroy(),
            // An in-flight call still holds it; it is freed when that call returns.
            Err(_) => debug!("Row builder {} released while in use", handle.0),
        }
        Ok(())
    }

    pub fn append_row(&self, handle: &RowBuilderHandle, values: Vec<Value>) -> Result<()> {
        let builder = self.row_builders.get(handle.0)?;
        let mut builder = builder.lock();
        builder.append_row(values)
    }

    pub fn clear_row_builder(&self, handle: &RowBuilderHandle) -> Result<()> {
        let builder = self.row_builders.get(handle.0)?;
        builder.lock().clear();
        Ok(())
    }

    /// Number of rows buffered in a builder
    pub fn buffered_rows(&self, handle: &RowBuilderHandle) -> Result<usize> {
        let builder = self.row_builders.get(handle.0)?;
        let len = builder.lock().len();
        Ok(len)
    }

    /// Write every buffered row of `builder` through `client`.
    pub fn write(&self, client: &ClientHandle, builder: &RowBuilderHandle) -> Result<()> {
        let client = self.clients.get(client.0)?;
        let builder = self.row_builders.get(builder.0)?;
        let mut builder = builder.lock();
        client.write(&mut builder)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn row_builder_count(&self) -> usize {
        self.row_builders.len()
    }
}

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

use parking_lot::Mutex;
use snafu::{OptionExt, ResultExt};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::grpc::GrpcConnector;
use crate::row::RowBuilder;
use crate::transport::{Connection, Connector, Credentials};
use crate::{error, Result};

/// Writes buffered rows to one database over a single connection.
///
/// Writes issued through the same client are serialized on that connection.
/// Once closed, a client rejects every write.
pub struct Client {
    endpoint: String,
    database: String,
    credentials: Option<Credentials>,
    // `None` once closed
    connection: Mutex<Option<Connection>>,
}

impl Client {
    /// Connect with the default gRPC transport.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        Self::connect_with(config, &GrpcConnector::new(config))
    }

    /// Connect through the given connector.
    pub fn connect_with(config: &ClientConfig, connector: &dyn Connector) -> Result<Self> {
        let credentials = config.credentials()?;
        let connection = connector
            .connect(&config.endpoint, &config.database, credentials.as_ref())
            .context(error::ConnectSnafu {
                endpoint: &config.endpoint,
            })?;
        info!(
            "Connected to {}, database: {}",
            config.endpoint, config.database
        );

        Ok(Self {
            endpoint: config.endpoint.clone(),
            database: config.database.clone(),
            credentials,
            connection: Mutex::new(Some(connection)),
        })
    }

    /// Send every buffered row of `builder`, in append order.
    ///
    /// On success the builder is cleared. On failure the rows stay buffered
    /// so the same write can be retried. Writing an empty builder succeeds
    /// without contacting the server.
    pub fn write(&self, builder: &mut RowBuilder) -> Result<()> {
        let mut guard = self.connection.lock();
        let connection = guard.as_mut().context(error::ClientClosedSnafu {
            database: &self.database,
        })?;

        if builder.is_empty() {
            debug!("Nothing buffered for {}, skip writing", builder.table_name());
            return Ok(());
        }

        let row_count = builder.len();
        if let Err(e) = connection.send(
            builder.table_name(),
            builder.schema().columns(),
            builder.rows(),
        ) {
            warn!(
                "Failed to write {} rows of {}, rows kept for retry: {}",
                row_count,
                builder.table_name(),
                e
            );
            return Err(e).context(error::TransportSnafu {
                table: builder.table_name(),
            });
        }

        debug!("Wrote {} rows of {}", row_count, builder.table_name());
        builder.clear();
        Ok(())
    }

    /// Release the connection. Later writes fail with an illegal-state error.
    pub fn close(&self) {
        if self.connection.lock().take().is_some() {
            info!("Closed client of {}, database: {}", self.endpoint, self.database);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.connection.lock().is_none()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get associated database name of this client
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        debug!("Dropping client of {}", self.endpoint);
    }
}

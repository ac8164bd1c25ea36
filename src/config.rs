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

//! Client connection configuration
//!
//! Configuration can be assembled with [`ClientConfig::builder`], read from
//! environment variables or loaded from a TOML file.

use std::fs;
use std::time::Duration;

use derive_builder::Builder;
use serde::Deserialize;
use snafu::ResultExt;

use crate::error;
use crate::transport::Credentials;
use crate::Result;

pub const DEFAULT_ENDPOINT: &str = "localhost:4001";
pub const DEFAULT_DATABASE: &str = "public";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings of a [`Client`](crate::Client)
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ClientConfig {
    /// `host:port` of the gRPC endpoint
    pub endpoint: String,
    /// Database (namespace) rows are written into
    #[builder(default = "DEFAULT_DATABASE.to_string()")]
    pub database: String,
    #[builder(default, setter(into, strip_option))]
    pub username: Option<String>,
    #[builder(default, setter(into, strip_option))]
    pub password: Option<String>,
    #[builder(default = "DEFAULT_CONNECT_TIMEOUT")]
    pub connect_timeout: Duration,
    /// Deadline of a single write request
    #[builder(default = "DEFAULT_TIMEOUT")]
    pub timeout: Duration,
}

impl ClientConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(endpoint) = &self.endpoint {
            if endpoint.trim().is_empty() {
                return Err("endpoint cannot be empty".to_string());
            }
        }
        if let Some(database) = &self.database {
            if database.trim().is_empty() {
                return Err("database cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    endpoints: Vec<String>,
    endpoint: Option<String>,
    dbname: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load configuration from environment variables
    ///
    /// - `GREPTIMEDB_ENDPOINT`: endpoint (default: localhost:4001)
    /// - `GREPTIMEDB_DBNAME`: database name (default: public)
    /// - `GREPTIMEDB_USERNAME`, `GREPTIMEDB_PASSWORD`: optional credentials
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = Self::builder();
        builder
            .endpoint(lookup("GREPTIMEDB_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.into()))
            .database(lookup("GREPTIMEDB_DBNAME").unwrap_or_else(|| DEFAULT_DATABASE.into()));
        if let Some(username) = lookup("GREPTIMEDB_USERNAME") {
            builder.username(username);
        }
        if let Some(password) = lookup("GREPTIMEDB_PASSWORD") {
            builder.password(password);
        }
        builder.build().context(error::InvalidConfigSnafu)
    }

    /// Load configuration from a TOML file
    ///
    /// Expected file format:
    /// ```toml
    /// endpoints = ["127.0.0.1:4001"]
    /// dbname = "public"
    /// username = "greptime"
    /// password = "secret"
    /// timeout_ms = 30000
    /// ```
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).context(error::ReadConfigFileSnafu { path })?;
        let file: ConfigFile =
            toml::from_str(&content).context(error::ParseConfigFileSnafu { path })?;

        // An explicit `endpoint` wins over the first of `endpoints`.
        let endpoint = file
            .endpoint
            .or_else(|| file.endpoints.into_iter().next())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let mut builder = Self::builder();
        builder
            .endpoint(endpoint)
            .database(file.dbname.unwrap_or_else(|| DEFAULT_DATABASE.to_string()));
        if let Some(username) = file.username {
            builder.username(username);
        }
        if let Some(password) = file.password {
            builder.password(password);
        }
        if let Some(ms) = file.timeout_ms {
            builder.timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = file.connect_timeout_ms {
            builder.connect_timeout(Duration::from_millis(ms));
        }
        builder.build().context(error::InvalidConfigSnafu)
    }

    /// Credentials paired per the username/password rule of
    /// [`Credentials::resolve`].
    pub fn credentials(&self) -> Result<Option<Credentials>> {
        Credentials::resolve(self.username.clone(), self.password.clone())
    }
}

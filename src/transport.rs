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

//! Seams to the component that serializes rows and talks to the server

use std::fmt;

use crate::error::{self, ConnectError, TransportError};
use crate::row::Row;
use crate::schema::Column;
use crate::Result;

/// An open connection able to ship buffered rows of one table.
///
/// Rows must be forwarded in the order given.
pub trait Transport: Send {
    fn send(
        &mut self,
        table_name: &str,
        schema: &[Column],
        rows: &[Row],
    ) -> std::result::Result<(), TransportError>;
}

pub type Connection = Box<dyn Transport>;

/// Opens [Connection]s to a server.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        endpoint: &str,
        database: &str,
        credentials: Option<&Credentials>,
    ) -> std::result::Result<Connection, ConnectError>;
}

/// Basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Pair up optional credentials.
    ///
    /// A username without a password gets an empty password. A password
    /// without a username is rejected.
    pub fn resolve(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Option<Credentials>> {
        match (username, password) {
            (None, None) => Ok(None),
            (Some(username), password) => Ok(Some(Credentials {
                username,
                password: password.unwrap_or_default(),
            })),
            (None, Some(_)) => error::InvalidCredentialsSnafu {
                msg: "password supplied without a username",
            }
            .fail(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"******")
            .finish()
    }
}

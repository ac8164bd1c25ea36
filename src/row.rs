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

//! Schema-validated row buffering for a single table

use snafu::ensure;
use tracing::{debug, info};

use crate::error;
use crate::schema::{Column, ColumnSchema};
use crate::value::Value;
use crate::Result;

/// An immutable, schema-conformant row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// Buffers rows of one table until a [`Client`](crate::Client) writes them.
///
/// The builder can be reused across write cycles: a successful write clears
/// the buffer, a failed one leaves it intact for a retry. It is not safe for
/// concurrent mutation; share it behind a lock.
#[derive(Debug)]
pub struct RowBuilder {
    table_name: String,
    schema: ColumnSchema,
    rows: Vec<Row>,
}

impl RowBuilder {
    /// Create a builder for `table_name` with an empty schema.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            schema: ColumnSchema::new(),
            rows: Vec::new(),
        }
    }

    /// Create a builder with the given columns and lock its schema.
    ///
    /// On failure the partially built builder is dropped, nothing leaks.
    pub fn with_columns(
        table_name: impl Into<String>,
        columns: impl IntoIterator<Item = Column>,
    ) -> Result<Self> {
        let mut builder = Self::new(table_name);
        for column in columns {
            builder.define(column)?;
        }
        builder.finalize_schema()?;
        Ok(builder)
    }

    /// Append a column to the schema. Only legal before the schema is locked.
    pub fn define(&mut self, column: Column) -> Result<()> {
        let summary = format!(
            "{}/{:?}/{:?}",
            column.name, column.data_type, column.semantic_type
        );
        self.schema.define(&self.table_name, column)?;
        debug!("Added column to {}: {summary}", self.table_name);
        Ok(())
    }

    /// Lock the schema. Happens implicitly on the first append.
    pub fn finalize_schema(&mut self) -> Result<()> {
        self.schema.finalize(&self.table_name)
    }

    /// Validate and buffer one row.
    ///
    /// The whole row is checked before anything is stored, so a rejected row
    /// leaves the buffer exactly as it was.
    pub fn append_row(&mut self, values: Vec<Value>) -> Result<()> {
        self.finalize_schema()?;

        let columns = self.schema.columns();
        ensure!(
            values.len() == columns.len(),
            error::InvalidColumnCountSnafu {
                expected: columns.len(),
                actual: values.len(),
            }
        );
        for (column, value) in columns.iter().zip(values.iter()) {
            let actual = value.data_type();
            ensure!(
                actual == column.data_type,
                error::ValueTypeMismatchSnafu {
                    column: column.name.clone(),
                    expected: column.data_type,
                    actual,
                }
            );
        }

        self.rows.push(Row { values });
        debug!(
            "Buffered row for {}, buffered rows: {}",
            self.table_name,
            self.rows.len()
        );
        Ok(())
    }

    /// Drop all buffered rows, keeping the schema.
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Release the schema and all buffered rows.
    pub fn destroy(self) {
        info!(
            "Destroying row builder of {}, dropping {} buffered rows",
            self.table_name,
            self.rows.len()
        );
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    /// Buffered rows in append order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of buffered rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

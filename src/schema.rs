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

//! Column definitions and the ordered schema a table's rows must conform to

use snafu::ensure;

use crate::error;
use crate::Result;

/// Data type of a column.
///
/// Discriminants follow the GreptimeDB column data type codes so they can be
/// exchanged as plain integers across the C ABI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum DataType {
    Boolean = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,
    Uint8 = 5,
    Uint16 = 6,
    Uint32 = 7,
    Uint64 = 8,
    Float32 = 9,
    Float64 = 10,
    Binary = 11,
    String = 12,
    TimestampSecond = 15,
    TimestampMillisecond = 16,
    TimestampMicrosecond = 17,
    TimestampNanosecond = 18,
}

impl DataType {
    pub fn is_timestamp(&self) -> bool {
        matches!(
            self,
            DataType::TimestampSecond
                | DataType::TimestampMillisecond
                | DataType::TimestampMicrosecond
                | DataType::TimestampNanosecond
        )
    }
}

impl TryFrom<i32> for DataType {
    type Error = error::Error;

    fn try_from(code: i32) -> Result<Self> {
        Ok(match code {
            0 => DataType::Boolean,
            1 => DataType::Int8,
            2 => DataType::Int16,
            3 => DataType::Int32,
            4 => DataType::Int64,
            5 => DataType::Uint8,
            6 => DataType::Uint16,
            7 => DataType::Uint32,
            8 => DataType::Uint64,
            9 => DataType::Float32,
            10 => DataType::Float64,
            11 => DataType::Binary,
            12 => DataType::String,
            15 => DataType::TimestampSecond,
            16 => DataType::TimestampMillisecond,
            17 => DataType::TimestampMicrosecond,
            18 => DataType::TimestampNanosecond,
            _ => return error::UnknownDataTypeSnafu { code }.fail(),
        })
    }
}

/// Role a column plays in a time-series table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SemanticType {
    /// Indexed dimension
    Tag = 0,
    /// Measured value
    Field = 1,
    /// Time index, exactly one per table
    Timestamp = 2,
}

impl TryFrom<i32> for SemanticType {
    type Error = error::Error;

    fn try_from(code: i32) -> Result<Self> {
        Ok(match code {
            0 => SemanticType::Tag,
            1 => SemanticType::Field,
            2 => SemanticType::Timestamp,
            _ => return error::UnknownSemanticTypeSnafu { code }.fail(),
        })
    }
}

/// Table column definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
    pub semantic_type: SemanticType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            data_type,
            semantic_type,
        }
    }
}

/// Create a tag column (for indexing and grouping)
pub fn tag(name: impl Into<String>, data_type: DataType) -> Column {
    Column::new(name, data_type, SemanticType::Tag)
}

/// Create a field column (measurement values)
pub fn field(name: impl Into<String>, data_type: DataType) -> Column {
    Column::new(name, data_type, SemanticType::Field)
}

/// Create a timestamp column (timeline for time series)
pub fn timestamp(name: impl Into<String>, data_type: DataType) -> Column {
    Column::new(name, data_type, SemanticType::Timestamp)
}

/// Ordered column definitions of one table.
///
/// Columns are appended with [`ColumnSchema::define`] until the schema is
/// locked by [`ColumnSchema::finalize`]; the column sequence never changes
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct ColumnSchema {
    columns: Vec<Column>,
    finalized: bool,
}

impl ColumnSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column.
    ///
    /// Fails with an invalid-argument error when the name is empty or taken,
    /// when a second timestamp column is declared, or when a timestamp column
    /// is given a non-timestamp data type. Fails with an illegal-state error
    /// once the schema is finalized. The schema is untouched on failure.
    pub fn define(&mut self, table: &str, column: Column) -> Result<()> {
        ensure!(
            !self.finalized,
            error::SchemaLockedSnafu {
                table: table.to_string()
            }
        );
        ensure!(
            !column.name.is_empty(),
            error::InvalidColumnSnafu {
                name: column.name.clone(),
                reason: "column name is empty",
            }
        );
        ensure!(
            self.column_index(&column.name).is_none(),
            error::InvalidColumnSnafu {
                name: column.name.clone(),
                reason: "column name is already used",
            }
        );
        if column.semantic_type == SemanticType::Timestamp {
            if let Some(existing) = self.timestamp_column() {
                return error::DuplicateTimestampSnafu {
                    name: column.name,
                    existing: existing.name.clone(),
                }
                .fail();
            }
            ensure!(
                column.data_type.is_timestamp(),
                error::IncompatibleSemanticTypeSnafu {
                    data_type: column.data_type,
                    semantic_type: column.semantic_type,
                }
            );
        }

        self.columns.push(column);
        Ok(())
    }

    /// Lock the schema. Requires exactly one timestamp column.
    ///
    /// Finalizing an already finalized schema is a no-op.
    pub fn finalize(&mut self, table: &str) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        let count = self.timestamp_column_count();
        ensure!(
            count == 1,
            error::TimestampColumnCountSnafu {
                table: table.to_string(),
                count,
            }
        );
        self.finalized = true;
        Ok(())
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn timestamp_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.semantic_type == SemanticType::Timestamp)
    }

    fn timestamp_column_count(&self) -> usize {
        self.columns
            .iter()
            .filter(|c| c.semantic_type == SemanticType::Timestamp)
            .count()
    }
}

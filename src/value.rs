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

use crate::schema::DataType;

/// A single cell value. Each variant corresponds to exactly one [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),

    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),

    Float32(f32),
    Float64(f64),

    Binary(Vec<u8>),
    String(String),

    // Signed ticks since the Unix epoch at the named resolution
    TimestampSecond(i64),
    TimestampMillisecond(i64),
    TimestampMicrosecond(i64),
    TimestampNanosecond(i64),
}

impl Value {
    /// The column data type this value belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Boolean(_) => DataType::Boolean,
            Value::Int8(_) => DataType::Int8,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::Uint8(_) => DataType::Uint8,
            Value::Uint16(_) => DataType::Uint16,
            Value::Uint32(_) => DataType::Uint32,
            Value::Uint64(_) => DataType::Uint64,
            Value::Float32(_) => DataType::Float32,
            Value::Float64(_) => DataType::Float64,
            Value::Binary(_) => DataType::Binary,
            Value::String(_) => DataType::String,
            Value::TimestampSecond(_) => DataType::TimestampSecond,
            Value::TimestampMillisecond(_) => DataType::TimestampMillisecond,
            Value::TimestampMicrosecond(_) => DataType::TimestampMicrosecond,
            Value::TimestampNanosecond(_) => DataType::TimestampNanosecond,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Widen any signed integer value to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Widen any unsigned integer value to u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint8(v) => Some(u64::from(*v)),
            Value::Uint16(v) => Some(u64::from(*v)),
            Value::Uint32(v) => Some(u64::from(*v)),
            Value::Uint64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the binary value as a slice (zero-copy)
    pub fn as_binary_ref(&self) -> Option<&[u8]> {
        match self {
            Value::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// Get the string value as a str slice (zero-copy)
    pub fn as_string_ref(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Ticks of any timestamp value, regardless of resolution.
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            Value::TimestampSecond(v)
            | Value::TimestampMillisecond(v)
            | Value::TimestampMicrosecond(v)
            | Value::TimestampNanosecond(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int8(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Uint8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Uint16(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Binary(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Binary(v.to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_follows_variant() {
        assert_eq!(Value::from(true).data_type(), DataType::Boolean);
        assert_eq!(Value::from(2.0f32).data_type(), DataType::Float32);
        assert_eq!(Value::from("hangzhou").data_type(), DataType::String);
        assert_eq!(Value::from(vec![1u8, 2]).data_type(), DataType::Binary);
        assert_eq!(
            Value::TimestampMillisecond(1700047510000).data_type(),
            DataType::TimestampMillisecond
        );
        assert_ne!(
            Value::TimestampSecond(1).data_type(),
            Value::Int64(1).data_type()
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Value::Int16(-3).as_i64(), Some(-3));
        assert_eq!(Value::Uint8(7).as_u64(), Some(7));
        assert_eq!(Value::Uint8(7).as_i64(), None);
        assert_eq!(Value::Float32(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::from("a").as_string_ref(), Some("a"));
        assert_eq!(Value::from(&b"ab"[..]).as_binary_ref(), Some(&b"ab"[..]));
        assert_eq!(Value::TimestampNanosecond(42).as_timestamp(), Some(42));
        assert_eq!(Value::Int64(42).as_timestamp(), None);
        assert_eq!(Value::Boolean(false).as_bool(), Some(false));
    }
}

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

//! C ABI over the process-wide [`Registry`]
//!
//! Every function returns a [`StatusCode`] as `int`. Handles are non-zero
//! `uint64_t` tokens and `0` is the null handle. Out-parameters are written
//! only when the call succeeds; the destroy functions reset the caller's
//! handle to `0`.

use std::ffi::{c_char, c_int, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::slice;

use snafu::{ensure, OptionExt, ResultExt};
use tracing::error;

use crate::error::{self, StatusCode};
use crate::handle::{ClientHandle, Registry, RowBuilderHandle};
use crate::logging::{init_logger, set_panic_hook, LoggingOptions};
use crate::schema::{Column, DataType, SemanticType};
use crate::value::Value;
use crate::Result;

/// Column definition passed to [`create_row_builder`] and [`define_column`].
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: *const c_char,
    pub data_type: c_int,
    pub semantic_type: c_int,
}

/// Borrowed byte range, used for string and binary values.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Bytes {
    pub data: *const u8,
    pub len: usize,
}

/// Payload of an [`FfiValue`]; the member read is chosen by its data type.
#[repr(C)]
#[derive(Clone, Copy)]
pub union ValueData {
    pub bool_value: u8,
    pub i8_value: i8,
    pub i16_value: i16,
    pub i32_value: i32,
    pub i64_value: i64,
    pub u8_value: u8,
    pub u16_value: u16,
    pub u32_value: u32,
    pub u64_value: u64,
    pub f32_value: f32,
    pub f64_value: f64,
    pub timestamp_value: i64,
    pub bytes_value: Bytes,
}

/// A value tagged with its data type code.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FfiValue {
    pub data_type: c_int,
    pub data: ValueData,
}

fn call(name: &str, f: impl FnOnce() -> Result<()>) -> c_int {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => StatusCode::Success.as_i32(),
        Ok(Err(e)) => {
            error!("Failed FFI invocation {name}. Error: {e:?}");
            e.status_code().as_i32()
        }
        Err(_) => {
            error!("FFI invocation {name} panicked");
            StatusCode::Unknown.as_i32()
        }
    }
}

fn ensure_not_null<T>(ptr: *const T, name: &'static str) -> Result<()> {
    ensure!(!ptr.is_null(), error::NullPointerSnafu { name });
    Ok(())
}

unsafe fn convert_c_string(ptr: *const c_char, name: &'static str) -> Result<String> {
    ensure_not_null(ptr, name)?;
    Ok(CStr::from_ptr(ptr)
        .to_str()
        .context(error::InvalidCStringSnafu { name })?
        .to_string())
}

unsafe fn convert_optional_c_string(
    ptr: *const c_char,
    name: &'static str,
) -> Result<Option<String>> {
    if ptr.is_null() {
        return Ok(None);
    }
    convert_c_string(ptr, name).map(Some)
}

unsafe fn convert_bytes(bytes: Bytes) -> Result<Vec<u8>> {
    if bytes.len == 0 {
        return Ok(Vec::new());
    }
    ensure_not_null(bytes.data, "value bytes")?;
    Ok(slice::from_raw_parts(bytes.data, bytes.len).to_vec())
}

unsafe fn convert_column(def: &ColumnDef) -> Result<Column> {
    let name = convert_c_string(def.name, "column name")?;
    let data_type = DataType::try_from(def.data_type)?;
    let semantic_type = SemanticType::try_from(def.semantic_type)?;
    Ok(Column::new(name, data_type, semantic_type))
}

unsafe fn convert_value(value: &FfiValue) -> Result<Value> {
    let data = &value.data;
    Ok(match DataType::try_from(value.data_type)? {
        DataType::Boolean => Value::Boolean(data.bool_value != 0),
        DataType::Int8 => Value::Int8(data.i8_value),
        DataType::Int16 => Value::Int16(data.i16_value),
        DataType::Int32 => Value::Int32(data.i32_value),
        DataType::Int64 => Value::Int64(data.i64_value),
        DataType::Uint8 => Value::Uint8(data.u8_value),
        DataType::Uint16 => Value::Uint16(data.u16_value),
        DataType::Uint32 => Value::Uint32(data.u32_value),
        DataType::Uint64 => Value::Uint64(data.u64_value),
        DataType::Float32 => Value::Float32(data.f32_value),
        DataType::Float64 => Value::Float64(data.f64_value),
        DataType::Binary => Value::Binary(convert_bytes(data.bytes_value)?),
        DataType::String => {
            let bytes = convert_bytes(data.bytes_value)?;
            let s = std::str::from_utf8(&bytes).context(error::InvalidCStringSnafu {
                name: "string value",
            })?;
            Value::String(s.to_string())
        }
        DataType::TimestampSecond => Value::TimestampSecond(data.timestamp_value),
        DataType::TimestampMillisecond => Value::TimestampMillisecond(data.timestamp_value),
        DataType::TimestampMicrosecond => Value::TimestampMicrosecond(data.timestamp_value),
        DataType::TimestampNanosecond => Value::TimestampNanosecond(data.timestamp_value),
    })
}

fn live_handle(id: u64, kind: &'static str) -> Result<u64> {
    (id != 0)
        .then_some(id)
        .context(error::InvalidHandleSnafu { kind, id })
}

/// Connect a client. `username` and `password` may be null.
///
/// # Safety
///
/// String arguments must be null or valid NUL-terminated strings and
/// `client` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn create_client(
    database: *const c_char,
    endpoint: *const c_char,
    username: *const c_char,
    password: *const c_char,
    client: *mut u64,
) -> c_int {
    init_logger(&LoggingOptions::default());
    set_panic_hook();

    call("create_client", || {
        ensure_not_null(client, "client")?;
        let database = convert_c_string(database, "database")?;
        let endpoint = convert_c_string(endpoint, "endpoint")?;
        let username = convert_optional_c_string(username, "username")?;
        let password = convert_optional_c_string(password, "password")?;

        let handle = Registry::global().create_client(
            &database,
            &endpoint,
            username.as_deref(),
            password.as_deref(),
        )?;
        *client = handle.id();
        Ok(())
    })
}

/// Close a client and reset `*client` to `0`.
///
/// # Safety
///
/// `client` must be null or point to a handle written by [`create_client`].
#[no_mangle]
pub unsafe extern "C" fn destroy_client(client: *mut u64) -> c_int {
    call("destroy_client", || {
        ensure_not_null(client, "client")?;
        let id = live_handle(*client, "client")?;
        Registry::global().destroy_client(ClientHandle::from_raw(id))?;
        *client = 0;
        Ok(())
    })
}

/// Create a row builder with an empty schema.
///
/// # Safety
///
/// `table_name` must be a valid NUL-terminated string and `builder` must be
/// null or writable.
#[no_mangle]
pub unsafe extern "C" fn new_row_builder(table_name: *const c_char, builder: *mut u64) -> c_int {
    call("new_row_builder", || {
        ensure_not_null(builder, "builder")?;
        let table_name = convert_c_string(table_name, "table_name")?;
        *builder = Registry::global().new_row_builder(&table_name).id();
        Ok(())
    })
}

/// Add one column to a builder whose schema is not locked yet.
///
/// # Safety
///
/// `column` must be null or point to a valid [`ColumnDef`].
#[no_mangle]
pub unsafe extern "C" fn define_column(builder: u64, column: *const ColumnDef) -> c_int {
    call("define_column", || {
        ensure_not_null(column, "column")?;
        let column = convert_column(&*column)?;
        Registry::global().define_column(&RowBuilderHandle::from_raw(builder), column)
    })
}

/// Create a row builder from `len` column definitions and lock its schema.
///
/// # Safety
///
/// `columns` must point to `len` valid [`ColumnDef`]s, or may be null when
/// `len` is zero. `builder` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn create_row_builder(
    table_name: *const c_char,
    columns: *const ColumnDef,
    len: usize,
    builder: *mut u64,
) -> c_int {
    call("create_row_builder", || {
        ensure_not_null(builder, "builder")?;
        let table_name = convert_c_string(table_name, "table_name")?;
        let columns = if len == 0 {
            Vec::new()
        } else {
            ensure_not_null(columns, "columns")?;
            slice::from_raw_parts(columns, len)
                .iter()
                .map(|def| convert_column(def))
                .collect::<Result<Vec<_>>>()?
        };

        let handle = Registry::global().create_row_builder(&table_name, &columns)?;
        *builder = handle.id();
        Ok(())
    })
}

/// Release a row builder and reset `*builder` to `0`.
///
/// # Safety
///
/// `builder` must be null or point to a handle written by this library.
#[no_mangle]
pub unsafe extern "C" fn destroy_row_builder(builder: *mut u64) -> c_int {
    call("destroy_row_builder", || {
        ensure_not_null(builder, "builder")?;
        let id = live_handle(*builder, "row builder")?;
        Registry::global().destroy_row_builder(RowBuilderHandle::from_raw(id))?;
        *builder = 0;
        Ok(())
    })
}

/// Validate and buffer one row of `len` values.
///
/// # Safety
///
/// `values` must point to `len` valid [`FfiValue`]s whose byte ranges are
/// readable.
#[no_mangle]
pub unsafe extern "C" fn append_row(builder: u64, values: *const FfiValue, len: usize) -> c_int {
    call("append_row", || {
        ensure_not_null(values, "values")?;
        let values = slice::from_raw_parts(values, len)
            .iter()
            .map(|v| convert_value(v))
            .collect::<Result<Vec<_>>>()?;
        Registry::global().append_row(&RowBuilderHandle::from_raw(builder), values)
    })
}

/// Drop the buffered rows of a builder.
#[no_mangle]
pub extern "C" fn clear_row_builder(builder: u64) -> c_int {
    call("clear_row_builder", || {
        Registry::global().clear_row_builder(&RowBuilderHandle::from_raw(builder))
    })
}

/// Number of rows buffered in a builder.
///
/// # Safety
///
/// `len` must be null or writable.
#[no_mangle]
pub unsafe extern "C" fn row_builder_len(builder: u64, len: *mut usize) -> c_int {
    call("row_builder_len", || {
        ensure_not_null(len, "len")?;
        *len = Registry::global().buffered_rows(&RowBuilderHandle::from_raw(builder))?;
        Ok(())
    })
}

/// Write every buffered row of `builder` through `client`.
#[no_mangle]
pub extern "C" fn write_rows(client: u64, builder: u64) -> c_int {
    call("write_rows", || {
        Registry::global().write(
            &ClientHandle::from_raw(client),
            &RowBuilderHandle::from_raw(builder),
        )
    })
}

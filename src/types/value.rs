//! Cell values extracted from Arrow arrays.
//!
//! Every cell of the input becomes a [`SqlValue`] before it is bound as a
//! parameter or rendered into a literal insert. Nulls, missing values and
//! float NaN all become [`SqlValue::Null`], never a `"NULL"` string.

use arrow::array::cast::AsArray;
use arrow::array::types::{
    Date32Type, Date64Type, Float16Type, Float32Type, Float64Type, Int16Type, Int32Type,
    Int64Type, Int8Type, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use arrow::array::{Array, RecordBatch};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::temporal_conversions::{
    date32_to_datetime, date64_to_datetime, timestamp_ms_to_datetime, timestamp_ns_to_datetime,
    timestamp_s_to_datetime, timestamp_us_to_datetime,
};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use chrono::NaiveDateTime;

use super::identifier::escape_literal;
use super::mapping::{NativeType, TypeMapper};
use crate::error::LoadError;

/// Format used for datetime literals (ISO 8601, accepted by `datetime2`).
const DATETIME_LITERAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A single cell value ready to be sent to SQL Server.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL. The tag keeps the column's type so drivers can bind a typed null.
    Null(NativeType),
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F64(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Binary(Vec<u8>),
}

impl SqlValue {
    /// Whether this value is SQL NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }

    /// Render this value as a SQL Server literal.
    ///
    /// NULL renders as the bare keyword, strings as `N'...'` with quotes doubled.
    #[must_use]
    pub fn to_literal(&self) -> String {
        match self {
            SqlValue::Null(_) => "NULL".to_string(),
            SqlValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            SqlValue::I16(v) => v.to_string(),
            SqlValue::I32(v) => v.to_string(),
            SqlValue::I64(v) => v.to_string(),
            SqlValue::F64(v) => format_float(*v),
            SqlValue::Text(s) => format!("N'{}'", escape_literal(s)),
            SqlValue::DateTime(dt) => format!("'{}'", dt.format(DATETIME_LITERAL_FORMAT)),
            SqlValue::Binary(bytes) => format!("0x{}", hex::encode(bytes)),
        }
    }
}

/// Format a finite float as a `float` literal.
///
/// Exponent notation keeps very large and very small values within SQL
/// Server's 38 digit limit for numeric literals.
fn format_float(val: f64) -> String {
    format!("{val:e}")
}

/// Convert every cell of a column into SQL values.
///
/// # Errors
///
/// Returns `LoadError::Conversion` for infinite floats and timestamps outside
/// the representable range.
pub fn column_values(array: &dyn Array) -> Result<Vec<SqlValue>, LoadError> {
    let native = TypeMapper::classify(array.data_type());
    let null = SqlValue::Null(native);
    let len = array.len();
    let mut values = Vec::with_capacity(len);

    macro_rules! collect_primitive {
        ($arrow_type:ty, $convert:expr) => {{
            let arr = array.as_primitive::<$arrow_type>();
            for row in 0..len {
                if arr.is_null(row) {
                    values.push(null.clone());
                } else {
                    values.push($convert(arr.value(row))?);
                }
            }
        }};
    }

    match array.data_type() {
        DataType::Boolean => {
            let arr = array.as_boolean();
            for row in 0..len {
                values.push(if arr.is_null(row) {
                    null.clone()
                } else {
                    SqlValue::Bool(arr.value(row))
                });
            }
        }
        DataType::Int8 => collect_primitive!(Int8Type, |v: i8| Ok::<_, LoadError>(SqlValue::I16(v.into()))),
        DataType::Int16 => collect_primitive!(Int16Type, |v| Ok::<_, LoadError>(SqlValue::I16(v))),
        DataType::Int32 => collect_primitive!(Int32Type, |v| Ok::<_, LoadError>(SqlValue::I32(v))),
        DataType::Int64 => collect_primitive!(Int64Type, |v| Ok::<_, LoadError>(SqlValue::I64(v))),
        DataType::Float16 => {
            let arr = array.as_primitive::<Float16Type>();
            for row in 0..len {
                if arr.is_null(row) {
                    values.push(null.clone());
                } else {
                    values.push(float_value(arr.value(row).to_f64())?);
                }
            }
        }
        DataType::Float32 => collect_primitive!(Float32Type, |v: f32| float_value(v.into())),
        DataType::Float64 => collect_primitive!(Float64Type, float_value),
        DataType::Utf8 => {
            let arr = array.as_string::<i32>();
            for row in 0..len {
                values.push(if arr.is_null(row) {
                    null.clone()
                } else {
                    SqlValue::Text(arr.value(row).to_string())
                });
            }
        }
        DataType::LargeUtf8 => {
            let arr = array.as_string::<i64>();
            for row in 0..len {
                values.push(if arr.is_null(row) {
                    null.clone()
                } else {
                    SqlValue::Text(arr.value(row).to_string())
                });
            }
        }
        DataType::Utf8View => {
            let arr = array.as_string_view();
            for row in 0..len {
                values.push(if arr.is_null(row) {
                    null.clone()
                } else {
                    SqlValue::Text(arr.value(row).to_string())
                });
            }
        }
        DataType::Timestamp(TimeUnit::Second, _) => {
            collect_primitive!(TimestampSecondType, |v| datetime_value(
                v,
                timestamp_s_to_datetime
            ))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            collect_primitive!(TimestampMillisecondType, |v| datetime_value(
                v,
                timestamp_ms_to_datetime
            ))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            collect_primitive!(TimestampMicrosecondType, |v| datetime_value(
                v,
                timestamp_us_to_datetime
            ))
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            collect_primitive!(TimestampNanosecondType, |v| datetime_value(
                v,
                timestamp_ns_to_datetime
            ))
        }
        DataType::Date32 => {
            collect_primitive!(Date32Type, |v| datetime_value(v, date32_to_datetime))
        }
        DataType::Date64 => {
            collect_primitive!(Date64Type, |v| datetime_value(v, date64_to_datetime))
        }
        DataType::Binary => {
            let arr = array.as_binary::<i32>();
            for row in 0..len {
                values.push(if arr.is_null(row) {
                    null.clone()
                } else {
                    SqlValue::Binary(arr.value(row).to_vec())
                });
            }
        }
        DataType::LargeBinary => {
            let arr = array.as_binary::<i64>();
            for row in 0..len {
                values.push(if arr.is_null(row) {
                    null.clone()
                } else {
                    SqlValue::Binary(arr.value(row).to_vec())
                });
            }
        }
        // Everything else goes in as its display text
        _ => {
            let options = FormatOptions::default();
            let formatter = ArrayFormatter::try_new(array, &options)?;
            for row in 0..len {
                values.push(if array.is_null(row) {
                    null.clone()
                } else {
                    SqlValue::Text(formatter.value(row).to_string())
                });
            }
        }
    }

    Ok(values)
}

/// Convert a record batch into row-major SQL values.
///
/// # Errors
///
/// Propagates conversion errors from [`column_values`].
pub fn batch_rows(batch: &RecordBatch) -> Result<Vec<Vec<SqlValue>>, LoadError> {
    let columns = batch
        .columns()
        .iter()
        .map(|col| column_values(col.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows: Vec<Vec<SqlValue>> = (0..batch.num_rows())
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();

    for column in columns {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value);
        }
    }

    Ok(rows)
}

fn float_value(val: f64) -> Result<SqlValue, LoadError> {
    if val.is_nan() {
        Ok(SqlValue::Null(NativeType::Float))
    } else if val.is_infinite() {
        Err(LoadError::Conversion(format!(
            "SQL Server float cannot store {val}"
        )))
    } else {
        Ok(SqlValue::F64(val))
    }
}

fn datetime_value<T: std::fmt::Display + Copy>(
    raw: T,
    convert: impl Fn(T) -> Option<NaiveDateTime>,
) -> Result<SqlValue, LoadError> {
    convert(raw)
        .map(SqlValue::DateTime)
        .ok_or_else(|| LoadError::Conversion(format!("Timestamp value {raw} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        ArrayRef, BinaryArray, BooleanArray, Date32Array, Decimal128Array, Float64Array,
        Int32Array, Int64Array, Int8Array, StringArray, TimestampNanosecondArray, UInt32Array,
    };
    use arrow::datatypes::{Field, Schema};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn datetime(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_integer_columns() {
        let values = column_values(&Int64Array::from(vec![Some(1), None, Some(352415214754234)]))
            .unwrap();
        assert_eq!(
            values,
            vec![
                SqlValue::I64(1),
                SqlValue::Null(NativeType::Int64),
                SqlValue::I64(352415214754234)
            ]
        );

        let values = column_values(&Int8Array::from(vec![-3])).unwrap();
        assert_eq!(values, vec![SqlValue::I16(-3)]);
    }

    #[test]
    fn test_nan_becomes_null() {
        let values = column_values(&Float64Array::from(vec![Some(1.0), Some(f64::NAN), None]))
            .unwrap();
        assert_eq!(values[0], SqlValue::F64(1.0));
        assert!(values[1].is_null());
        assert!(values[2].is_null());
    }

    #[test]
    fn test_infinite_float_is_rejected() {
        let err = column_values(&Float64Array::from(vec![f64::INFINITY])).unwrap_err();
        assert!(matches!(err, LoadError::Conversion(_)));
    }

    #[test]
    fn test_string_and_bool_columns() {
        let values = column_values(&StringArray::from(vec![Some("hello's"), None])).unwrap();
        assert_eq!(
            values,
            vec![
                SqlValue::Text("hello's".to_string()),
                SqlValue::Null(NativeType::Text)
            ]
        );

        let values = column_values(&BooleanArray::from(vec![Some(true), None])).unwrap();
        assert_eq!(
            values,
            vec![SqlValue::Bool(true), SqlValue::Null(NativeType::Boolean)]
        );
    }

    #[test]
    fn test_timestamp_and_date_columns() {
        // 2020-01-01 00:00:00 UTC
        let nanos = 1_577_836_800_000_000_000_i64;
        let values =
            column_values(&TimestampNanosecondArray::from(vec![Some(nanos), None])).unwrap();
        assert_eq!(values[0], SqlValue::DateTime(datetime(2020, 1, 1)));
        assert_eq!(values[1], SqlValue::Null(NativeType::DateTime));

        let values = column_values(&Date32Array::from(vec![18262])).unwrap();
        assert_eq!(values[0], SqlValue::DateTime(datetime(2020, 1, 1)));
    }

    #[test]
    fn test_unmapped_types_render_as_text() {
        let values = column_values(&UInt32Array::from(vec![Some(7), None])).unwrap();
        assert_eq!(
            values,
            vec![
                SqlValue::Text("7".to_string()),
                SqlValue::Null(NativeType::Other)
            ]
        );

        let decimals = Decimal128Array::from(vec![12345_i128])
            .with_precision_and_scale(10, 2)
            .unwrap();
        assert_eq!(
            column_values(&decimals).unwrap(),
            vec![SqlValue::Text("123.45".to_string())]
        );
    }

    #[test]
    fn test_binary_column() {
        let values = column_values(&BinaryArray::from(vec![&b"\x01\xff"[..]])).unwrap();
        assert_eq!(values, vec![SqlValue::Binary(vec![0x01, 0xff])]);
    }

    #[test]
    fn test_literals() {
        assert_eq!(SqlValue::Null(NativeType::Text).to_literal(), "NULL");
        assert_eq!(SqlValue::Bool(true).to_literal(), "1");
        assert_eq!(SqlValue::Bool(false).to_literal(), "0");
        assert_eq!(SqlValue::I64(-42).to_literal(), "-42");
        assert_eq!(SqlValue::F64(4.3).to_literal(), "4.3e0");
        assert_eq!(SqlValue::F64(2.0).to_literal(), "2e0");
        assert_eq!(SqlValue::Text("hello's".into()).to_literal(), "N'hello''s'");
        assert_eq!(SqlValue::Text("NULL".into()).to_literal(), "N'NULL'");
        assert_eq!(
            SqlValue::DateTime(datetime(2020, 2, 2)).to_literal(),
            "'2020-02-02T00:00:00.000000'"
        );
        assert_eq!(SqlValue::Binary(vec![0xab, 0x01]).to_literal(), "0xab01");
    }

    #[test]
    fn test_float_literals_use_exponent_notation() {
        assert_eq!(SqlValue::F64(1e300).to_literal(), "1e300");
        assert_eq!(SqlValue::F64(1.5e-50).to_literal(), "1.5e-50");
        assert_eq!(SqlValue::F64(-1e40).to_literal(), "-1e40");
        assert_eq!(SqlValue::F64(0.0).to_literal(), "0e0");
        assert!(SqlValue::F64(f64::MAX).to_literal().len() < 38);
    }

    #[test]
    fn test_batch_rows_is_row_major() {
        let schema = Schema::new(vec![
            Field::new("A", DataType::Int32, true),
            Field::new("B", DataType::Float64, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int32Array::from(vec![Some(1), None])) as ArrayRef,
                Arc::new(Float64Array::from(vec![f64::NAN, 4.3])) as ArrayRef,
            ],
        )
        .unwrap();

        let rows = batch_rows(&batch).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![SqlValue::I32(1), SqlValue::Null(NativeType::Float)]);
        assert_eq!(rows[1], vec![SqlValue::Null(NativeType::Int32), SqlValue::F64(4.3)]);
    }
}

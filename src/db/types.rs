//! Row cell decoding.
//!
//! Maps database-specific column values onto [`Cell`], the engine-neutral
//! value used by the executor and the result formatter.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Database-specific decoders handle the actual value extraction
//!
//! A value that cannot be decoded fails the whole row with an execution error
//! naming the column and its type. It is never shown as NULL or as raw bytes.

use crate::error::{AppError, AppResult};
use crate::models::{Cell, DatabaseType};
use sqlx::error::BoxDynError;
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::postgres::PgRow;
use sqlx::{Column, Decode, Row, Type, TypeInfo};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Money,
    Boolean,
    Binary,
    Json,
    Uuid,
    Date,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Interval,
    Array,
    Text,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // Element type does not matter here, "numeric[]" is still an array
    if lower.ends_with("[]") {
        return TypeCategory::Array;
    }

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        return TypeCategory::Decimal;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    // INTERVAL and POINT contain "int" but are not integers
    if lower.contains("interval") {
        return TypeCategory::Interval;
    }
    if (lower.contains("int") && !lower.contains("point")) || lower.contains("serial") {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    if lower.contains("blob") || lower.contains("binary") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    match (lower.as_str(), db) {
        ("uuid", DatabaseType::PostgreSQL) => TypeCategory::Uuid,
        ("oid", DatabaseType::PostgreSQL) => TypeCategory::Integer,
        ("money", DatabaseType::PostgreSQL) => TypeCategory::Money,
        ("timetz", DatabaseType::PostgreSQL) => TypeCategory::TimeTz,
        ("date", _) => TypeCategory::Date,
        ("time", _) => TypeCategory::Time,
        ("timestamptz", DatabaseType::PostgreSQL) => TypeCategory::TimestampTz,
        ("timestamp", DatabaseType::MySQL) => TypeCategory::TimestampTz,
        ("timestamp", _) | ("datetime", _) => TypeCategory::Timestamp,
        // varchar, text, char, enum, etc.
        _ => TypeCategory::Text,
    }
}

fn decode_error(column: &str, type_name: &str, source: &BoxDynError) -> AppError {
    AppError::execution(
        format!(
            "Cannot read column '{}' of type {}: {}",
            column, type_name, source
        ),
        None,
    )
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// MySQL DECIMAL as the exact text the server sent.
///
/// MySQL transfers DECIMAL as text even in the binary protocol, so nothing is
/// lost and precision is not capped the way a fixed-size decimal type would be.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

/// NaN and the infinities have no `Decimal` form; NUMERIC flags them in its sign word.
fn numeric_special_value(bytes: &[u8]) -> Option<&'static str> {
    match bytes.get(4..6)? {
        [0xC0, 0x00] => Some("NaN"),
        [0xD0, 0x00] => Some("Infinity"),
        [0xF0, 0x00] => Some("-Infinity"),
        _ => None,
    }
}

// =============================================================================
// Value Rendering
// =============================================================================

/// Render binary data as text: UTF-8 when valid, base64 otherwise.
pub fn decode_binary_value(bytes: &[u8]) -> Cell {
    use base64::{Engine as _, engine::general_purpose::STANDARD};

    match std::str::from_utf8(bytes) {
        Ok(s) => Cell::text(s),
        Err(_) => Cell::Text(STANDARD.encode(bytes)),
    }
}

fn float_cell(v: f64) -> Cell {
    if v.is_finite() {
        Cell::number(v)
    } else {
        // nan/inf are not numeric literals
        Cell::Text(v.to_string())
    }
}

/// Array in PostgreSQL's text form, e.g. `{Alice,NULL,Bob}`.
fn array_cell<T: ToString>(values: Option<Vec<Option<T>>>) -> Cell {
    let Some(items) = values else {
        return Cell::Null;
    };
    let items: Vec<String> = items
        .iter()
        .map(|item| item.as_ref().map_or_else(|| "NULL".to_string(), T::to_string))
        .collect();
    Cell::Text(format!("{{{}}}", items.join(",")))
}

/// Interval in PostgreSQL's default output style, e.g. `1 year 2 mons 3 days 04:05:06`.
fn format_interval(months: i32, days: i32, microseconds: i64) -> String {
    let mut parts = Vec::new();
    let (years, months) = (months / 12, months % 12);
    if years != 0 {
        parts.push(format!("{} year{}", years, plural(years.into())));
    }
    if months != 0 {
        parts.push(format!("{} mon{}", months, plural(months.into())));
    }
    if days != 0 {
        parts.push(format!("{} day{}", days, plural(days.into())));
    }
    if microseconds != 0 || parts.is_empty() {
        let sign = if microseconds < 0 { "-" } else { "" };
        let total = microseconds.unsigned_abs();
        let (secs, fraction) = (total / 1_000_000, total % 1_000_000);
        let mut time = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        );
        if fraction != 0 {
            time.push_str(format!(".{:06}", fraction).trim_end_matches('0'));
        }
        parts.push(time);
    }
    parts.join(" ")
}

fn plural(n: i64) -> &'static str {
    if n.abs() == 1 { "" } else { "s" }
}

// =============================================================================
// Row to Cells Trait
// =============================================================================

/// Trait for converting database rows to engine-neutral cells.
pub trait RowToCells {
    fn to_cells(&self) -> AppResult<Vec<Cell>>;
    fn column_names(&self) -> Vec<String>;
}

impl RowToCells for MySqlRow {
    fn to_cells(&self) -> AppResult<Vec<Cell>> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DatabaseType::MySQL);
                mysql::decode_column(self, idx, category)
                    .map_err(|e| decode_error(col.name(), type_name, &e))
            })
            .collect()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }
}

impl RowToCells for PgRow {
    fn to_cells(&self) -> AppResult<Vec<Cell>> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let type_name = col.type_info().name();
                let category = categorize_type(type_name, DatabaseType::PostgreSQL);
                postgres::decode_column(self, idx, category)
                    .map_err(|e| decode_error(col.name(), type_name, &e))
            })
            .collect()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

    pub fn decode_column(
        row: &MySqlRow,
        idx: usize,
        category: TypeCategory,
    ) -> Result<Cell, BoxDynError> {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => decode_binary_col(row, idx),
            TypeCategory::Json => decode_json(row, idx),
            TypeCategory::Date => decode_display::<NaiveDate>(row, idx),
            TypeCategory::Time => decode_display::<NaiveTime>(row, idx),
            TypeCategory::Timestamp => decode_display::<NaiveDateTime>(row, idx),
            TypeCategory::TimestampTz => decode_display::<DateTime<Utc>>(row, idx),
            _ => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &MySqlRow, idx: usize) -> Result<Cell, BoxDynError> {
        let value = row.try_get::<Option<RawDecimal>, _>(idx)?;
        Ok(value.map_or(Cell::Null, |v| Cell::Number(v.0)))
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> Result<Cell, BoxDynError> {
        if let Ok(v) = row.try_get::<Option<i8>, _>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::number));
        }
        if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::number));
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::number));
        }
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::number));
        }
        if let Ok(v) = row.try_get::<Option<u8>, _>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::number));
        }
        if let Ok(v) = row.try_get::<Option<u16>, _>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::number));
        }
        if let Ok(v) = row.try_get::<Option<u32>, _>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::number));
        }
        let v = row.try_get::<Option<u64>, _>(idx)?;
        Ok(v.map_or(Cell::Null, Cell::number))
    }

    fn decode_boolean(row: &MySqlRow, idx: usize) -> Result<Cell, BoxDynError> {
        let v = row.try_get::<Option<bool>, _>(idx)?;
        Ok(v.map_or(Cell::Null, Cell::Bool))
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> Result<Cell, BoxDynError> {
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Ok(v.map_or(Cell::Null, float_cell));
        }
        let v = row.try_get::<Option<f32>, _>(idx)?;
        Ok(v.map_or(Cell::Null, |v| float_cell(v.into())))
    }

    fn decode_binary_col(row: &MySqlRow, idx: usize) -> Result<Cell, BoxDynError> {
        let v = row.try_get::<Option<Vec<u8>>, _>(idx)?;
        Ok(v.map_or(Cell::Null, |v| decode_binary_value(&v)))
    }

    fn decode_json(row: &MySqlRow, idx: usize) -> Result<Cell, BoxDynError> {
        let v = row.try_get::<Option<serde_json::Value>, _>(idx)?;
        Ok(v.map_or(Cell::Null, |v| Cell::Text(v.to_string())))
    }

    fn decode_display<T>(row: &MySqlRow, idx: usize) -> Result<Cell, BoxDynError>
    where
        T: for<'r> Decode<'r, sqlx::MySql> + Type<sqlx::MySql> + std::fmt::Display,
    {
        match row.try_get::<Option<T>, _>(idx) {
            Ok(v) => Ok(v.map_or(Cell::Null, |v| Cell::Text(v.to_string()))),
            // e.g. TIME values outside 00:00..24:00
            Err(e) => decode_text(row, idx).map_err(|_| e.into()),
        }
    }

    fn decode_text(row: &MySqlRow, idx: usize) -> Result<Cell, BoxDynError> {
        match row.try_get::<Option<String>, _>(idx) {
            Ok(v) => Ok(v.map_or(Cell::Null, Cell::Text)),
            // Some server configurations return text columns as VARBINARY
            Err(e) => decode_binary_col(row, idx).map_err(|_| e.into()),
        }
    }
}

mod postgres {
    use super::*;
    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
    use rust_decimal::Decimal;
    use sqlx::ValueRef;
    use sqlx::postgres::PgTypeKind;
    use sqlx::postgres::types::{Oid, PgInterval, PgMoney, PgTimeTz};
    use uuid::Uuid;

    pub fn decode_column(
        row: &PgRow,
        idx: usize,
        category: TypeCategory,
    ) -> Result<Cell, BoxDynError> {
        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Money => decode_money(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => decode_binary_col(row, idx),
            TypeCategory::Json => decode_json(row, idx),
            TypeCategory::Uuid => decode_display::<Uuid>(row, idx),
            TypeCategory::Date => decode_display::<NaiveDate>(row, idx),
            TypeCategory::Time => decode_display::<NaiveTime>(row, idx),
            TypeCategory::TimeTz => decode_timetz(row, idx),
            TypeCategory::Timestamp => decode_display::<NaiveDateTime>(row, idx),
            TypeCategory::TimestampTz => decode_display::<DateTime<Utc>>(row, idx),
            TypeCategory::Interval => decode_interval(row, idx),
            TypeCategory::Array => decode_array(row, idx),
            TypeCategory::Text => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        match row.try_get::<Option<Decimal>, _>(idx) {
            Ok(v) => Ok(v.map_or(Cell::Null, Cell::number)),
            Err(e) => {
                let raw = row.try_get_raw(idx)?;
                match raw.as_bytes().ok().and_then(numeric_special_value) {
                    Some(special) => Ok(Cell::text(special)),
                    None => Err(e.into()),
                }
            }
        }
    }

    fn decode_money(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        let v = row.try_get::<Option<PgMoney>, _>(idx)?;
        Ok(v.map_or(Cell::Null, |m| Cell::number(m.to_decimal(2))))
    }

    fn decode_integer(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::number));
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return Ok(v.map_or(Cell::Null, Cell::number));
        }
        if let Ok(v) = row.try_get::<Option<Oid>, _>(idx) {
            return Ok(v.map_or(Cell::Null, |oid| Cell::number(oid.0)));
        }
        let v = row.try_get::<Option<i64>, _>(idx)?;
        Ok(v.map_or(Cell::Null, Cell::number))
    }

    fn decode_boolean(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        let v = row.try_get::<Option<bool>, _>(idx)?;
        Ok(v.map_or(Cell::Null, Cell::Bool))
    }

    fn decode_float(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Ok(v.map_or(Cell::Null, float_cell));
        }
        let v = row.try_get::<Option<f32>, _>(idx)?;
        Ok(v.map_or(Cell::Null, |v| float_cell(v.into())))
    }

    fn decode_binary_col(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        let v = row.try_get::<Option<Vec<u8>>, _>(idx)?;
        Ok(v.map_or(Cell::Null, |v| decode_binary_value(&v)))
    }

    fn decode_json(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        let v = row.try_get::<Option<serde_json::Value>, _>(idx)?;
        Ok(v.map_or(Cell::Null, |v| Cell::Text(v.to_string())))
    }

    fn decode_display<T>(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError>
    where
        T: for<'r> Decode<'r, sqlx::Postgres> + Type<sqlx::Postgres> + std::fmt::Display,
    {
        let v = row.try_get::<Option<T>, _>(idx)?;
        Ok(v.map_or(Cell::Null, |v| Cell::Text(v.to_string())))
    }

    fn decode_timetz(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        let v = row.try_get::<Option<PgTimeTz<NaiveTime, FixedOffset>>, _>(idx)?;
        Ok(v.map_or(Cell::Null, |t| Cell::Text(format!("{}{}", t.time, t.offset))))
    }

    fn decode_interval(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        let v = row.try_get::<Option<PgInterval>, _>(idx)?;
        Ok(v.map_or(Cell::Null, |i| {
            Cell::Text(format_interval(i.months, i.days, i.microseconds))
        }))
    }

    fn decode_array(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        macro_rules! try_elements {
            ($($ty:ty),+ $(,)?) => {
                $(
                    if let Ok(values) = row.try_get::<Option<Vec<Option<$ty>>>, _>(idx) {
                        return Ok(array_cell(values));
                    }
                )+
            };
        }
        try_elements!(
            String,
            i16,
            i32,
            i64,
            f32,
            f64,
            bool,
            Decimal,
            Uuid,
            NaiveDate,
            NaiveDateTime,
            DateTime<Utc>,
        );
        Err("unsupported array element type".into())
    }

    fn decode_text(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        match row.try_get::<Option<String>, _>(idx) {
            Ok(v) => Ok(v.map_or(Cell::Null, Cell::Text)),
            Err(e) => match row.column(idx).type_info().kind() {
                PgTypeKind::Enum(_) => decode_enum(row, idx),
                _ => Err(e.into()),
            },
        }
    }

    /// Enum labels arrive as their UTF-8 text in both wire formats.
    fn decode_enum(row: &PgRow, idx: usize) -> Result<Cell, BoxDynError> {
        let raw = row.try_get_raw(idx)?;
        if raw.is_null() {
            return Ok(Cell::Null);
        }
        Ok(Cell::text(std::str::from_utf8(raw.as_bytes()?)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_type_integer() {
        assert_eq!(
            categorize_type("INT", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("INT8", DatabaseType::PostgreSQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("TINYINT UNSIGNED", DatabaseType::MySQL),
            TypeCategory::Integer
        );
        assert_eq!(
            categorize_type("INTERVAL", DatabaseType::PostgreSQL),
            TypeCategory::Interval
        );
        assert_eq!(
            categorize_type("POINT", DatabaseType::PostgreSQL),
            TypeCategory::Text
        );
    }

    #[test]
    fn test_categorize_type_decimal() {
        assert_eq!(
            categorize_type("DECIMAL", DatabaseType::MySQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("NUMERIC", DatabaseType::PostgreSQL),
            TypeCategory::Decimal
        );
        assert_eq!(
            categorize_type("MONEY", DatabaseType::PostgreSQL),
            TypeCategory::Money
        );
    }

    #[test]
    fn test_categorize_type_array() {
        assert_eq!(
            categorize_type("TEXT[]", DatabaseType::PostgreSQL),
            TypeCategory::Array
        );
        assert_eq!(
            categorize_type("NUMERIC[]", DatabaseType::PostgreSQL),
            TypeCategory::Array
        );
        assert_eq!(
            categorize_type("INT4[]", DatabaseType::PostgreSQL),
            TypeCategory::Array
        );
    }

    #[test]
    fn test_categorize_type_temporal() {
        assert_eq!(
            categorize_type("DATE", DatabaseType::PostgreSQL),
            TypeCategory::Date
        );
        assert_eq!(
            categorize_type("TIMESTAMPTZ", DatabaseType::PostgreSQL),
            TypeCategory::TimestampTz
        );
        assert_eq!(
            categorize_type("TIMESTAMP", DatabaseType::PostgreSQL),
            TypeCategory::Timestamp
        );
        assert_eq!(
            categorize_type("TIMETZ", DatabaseType::PostgreSQL),
            TypeCategory::TimeTz
        );
        // MySQL TIMESTAMP is stored as UTC
        assert_eq!(
            categorize_type("TIMESTAMP", DatabaseType::MySQL),
            TypeCategory::TimestampTz
        );
        assert_eq!(
            categorize_type("DATETIME", DatabaseType::MySQL),
            TypeCategory::Timestamp
        );
    }

    #[test]
    fn test_categorize_type_fallback_text() {
        assert_eq!(
            categorize_type("VARCHAR", DatabaseType::MySQL),
            TypeCategory::Text
        );
        assert_eq!(
            categorize_type("INET", DatabaseType::PostgreSQL),
            TypeCategory::Text
        );
        assert_eq!(
            categorize_type("UUID", DatabaseType::PostgreSQL),
            TypeCategory::Uuid
        );
    }

    #[test]
    fn test_decode_binary_value() {
        assert_eq!(decode_binary_value(b"hello"), Cell::text("hello"));
        assert_eq!(
            decode_binary_value(&[0xFF, 0xFE, 0x00, 0x01]),
            Cell::text("//4AAQ==")
        );
    }

    #[test]
    fn test_numeric_special_values_are_text() {
        let header = |sign: [u8; 2]| [0, 0, 0, 0, sign[0], sign[1], 0, 0];
        assert_eq!(numeric_special_value(&header([0xC0, 0x00])), Some("NaN"));
        assert_eq!(
            numeric_special_value(&header([0xD0, 0x00])),
            Some("Infinity")
        );
        assert_eq!(
            numeric_special_value(&header([0xF0, 0x00])),
            Some("-Infinity")
        );
        // ordinary positive and negative numbers
        assert_eq!(numeric_special_value(&header([0x00, 0x00])), None);
        assert_eq!(numeric_special_value(&header([0x40, 0x00])), None);
        assert_eq!(numeric_special_value(&[0, 1]), None);
    }

    #[test]
    fn test_nan_renders_as_a_parseable_literal() {
        use crate::format::ResultFormatter;
        use crate::format::literal::render_rows;
        use crate::models::RawResult;

        let cell = Cell::text(numeric_special_value(&[0, 0, 0, 0, 0xC0, 0, 0, 0]).unwrap());
        let raw = RawResult(render_rows(&[vec![cell]]));
        assert_eq!(ResultFormatter::default().format(&raw), "- NaN");
    }

    #[test]
    fn test_array_cell() {
        assert_eq!(
            array_cell(Some(vec![Some("Alice"), None, Some("Bob")])),
            Cell::text("{Alice,NULL,Bob}")
        );
        assert_eq!(array_cell::<i32>(Some(vec![])), Cell::text("{}"));
        assert_eq!(array_cell::<i32>(None), Cell::Null);
    }

    #[test]
    fn test_format_interval() {
        let hms = (4 * 3600 + 5 * 60 + 6) * 1_000_000;
        assert_eq!(format_interval(14, 3, hms), "1 year 2 mons 3 days 04:05:06");
        assert_eq!(format_interval(1, 1, 0), "1 mon 1 day");
        assert_eq!(format_interval(0, 0, 0), "00:00:00");
        assert_eq!(format_interval(0, 0, -90_000_000), "-00:01:30");
        assert_eq!(format_interval(0, 0, 1_500_000), "00:00:01.5");
    }

    #[test]
    fn test_decode_error_names_column_and_type() {
        let source: BoxDynError = "mismatched types".into();
        let err = decode_error("addr", "INET", &source);
        assert!(matches!(err, AppError::Execution { .. }));
        let message = err.to_string();
        assert!(message.contains("'addr'"));
        assert!(message.contains("INET"));
    }

    #[test]
    fn test_float_cell_non_finite() {
        assert_eq!(float_cell(1.5), Cell::number("1.5"));
        assert_eq!(float_cell(f64::NAN), Cell::text("NaN"));
    }
}

//! Identifier sanitization for bracket-quoted SQL Server names.

/// Marker prefix for session-scoped temporary tables.
pub const TEMP_TABLE_PREFIX: char = '#';

/// Sanitize a column name into a bracket-quoted SQL Server identifier.
///
/// This function:
/// - Replaces spaces with underscores
/// - Removes parentheses and any existing square brackets
/// - Wraps the result in `[...]`
///
/// Sanitizing an already sanitized name returns it unchanged.
///
/// # Example
///
/// ```
/// use fast_to_sql::types::sanitize_column_name;
///
/// assert_eq!(sanitize_column_name("This is invalid"), "[This_is_invalid]");
/// assert_eq!(sanitize_column_name("[(Add)]"), "[Add]");
/// ```
#[must_use]
pub fn sanitize_column_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 2);
    result.push('[');

    for c in name.chars() {
        match c {
            ' ' => result.push('_'),
            '(' | ')' | '[' | ']' => {}
            other => result.push(other),
        }
    }

    result.push(']');
    result
}

/// Quote a schema or table name with square brackets.
///
/// Closing brackets inside the name are doubled.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Escape a value for use inside a single-quoted SQL string literal.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Prefix a table name with the temporary table marker when `temp` is set.
///
/// Names that already start with the marker are returned unchanged.
#[must_use]
pub fn with_temp_marker(name: &str, temp: bool) -> String {
    if temp && !name.starts_with(TEMP_TABLE_PREFIX) {
        format!("{TEMP_TABLE_PREFIX}{name}")
    } else {
        name.to_string()
    }
}

/// Clean a table name for use in dynamic catalog lookups.
///
/// Doubles embedded single quotes and, for temporary tables, adds the `#`
/// prefix if it is missing.
///
/// # Example
///
/// ```
/// use fast_to_sql::types::clean_table_name;
///
/// assert_eq!(clean_table_name("this isn't valid", false), "this isn''t valid");
/// assert_eq!(clean_table_name("staging", true), "#staging");
/// ```
#[must_use]
pub fn clean_table_name(name: &str, temp: bool) -> String {
    escape_literal(&with_temp_marker(name, temp))
}

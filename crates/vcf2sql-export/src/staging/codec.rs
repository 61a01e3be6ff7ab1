//! Staged row format
//!
//! One row per line, fields separated by a tab, null written as `\N`.
//! Text is escaped the way MySQL `LOAD DATA ... ESCAPED BY '\\'` reads it
//! back:
//!
//! | character       | staged as |
//! |-----------------|-----------|
//! | `\`             | `\\`      |
//! | tab             | `\t`      |
//! | newline         | `\n`      |
//! | carriage return | `\r`      |
//! | NUL             | `\0`      |
//!
//! Quotes are written verbatim since fields are never enclosed.

/// Field separator of staged files
pub const FIELD_DELIMITER: char = '\t';

/// Row terminator of staged files
pub const LINE_TERMINATOR: char = '\n';

/// Escape character of staged files
pub const ESCAPE_CHAR: char = '\\';

/// Marker for a null field
pub const NULL_MARKER: &str = "\\N";

/// A single value handed to the staging area
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Double(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Append the staged form of `value` to `out`
pub fn encode_field(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str(NULL_MARKER),
        Value::Integer(v) => out.push_str(&v.to_string()),
        Value::Double(v) => out.push_str(&v.to_string()),
        Value::Text(s) => escape_text(s, out),
    }
}

/// Append `s` to `out` with every reserved character escaped
pub fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
}

/// Decode one staged field; `None` is a null.
///
/// Unknown escapes decode to the escaped character and a trailing lone
/// backslash is kept, as MySQL does.
pub fn decode_field(raw: &str) -> Option<String> {
    if raw == NULL_MARKER {
        return None;
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != ESCAPE_CHAR {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push(ESCAPE_CHAR),
        }
    }
    Some(out)
}

/// Split a staged line (without its terminator) into decoded fields
pub fn split_line(line: &str) -> Vec<Option<String>> {
    line.split(FIELD_DELIMITER).map(decode_field).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn encode(value: &Value) -> String {
        let mut out = String::new();
        encode_field(value, &mut out);
        out
    }

    #[test]
    fn test_reserved_characters_never_staged_raw() {
        let staged = encode(&Value::from("a\tb\nc\rd"));
        assert_eq!(staged, "a\\tb\\nc\\rd");
        assert!(!staged.contains(FIELD_DELIMITER));
        assert!(!staged.contains(LINE_TERMINATOR));
    }

    #[test]
    fn test_quotes_are_verbatim() {
        let value = Value::from("5' UTR \"variant\"");
        let staged = encode(&value);
        assert_eq!(staged, "5' UTR \"variant\"");
        assert_eq!(decode_field(&staged).as_deref(), Some("5' UTR \"variant\""));
    }

    #[test]
    fn test_literal_null_marker_text_is_not_null() {
        let staged = encode(&Value::from("\\N"));
        assert_eq!(staged, "\\\\N");
        assert_eq!(decode_field(&staged).as_deref(), Some("\\N"));
        assert_eq!(decode_field(NULL_MARKER), None);
    }

    #[test]
    fn test_numbers_and_null() {
        assert_eq!(encode(&Value::from(42i64)), "42");
        assert_eq!(encode(&Value::from(29.5f64)), "29.5");
        assert_eq!(encode(&Value::from(None::<i64>)), "\\N");
    }

    #[test]
    fn test_split_line() {
        let fields = split_line("7\t\\N\tA\\tC");
        assert_eq!(
            fields,
            vec![Some("7".to_string()), None, Some("A\tC".to_string())]
        );
    }

    #[test]
    fn test_lenient_decoding() {
        assert_eq!(decode_field("a\\qb").as_deref(), Some("aqb"));
        assert_eq!(decode_field("ab\\").as_deref(), Some("ab\\"));
    }

    proptest! {
        #[test]
        fn staged_text_reloads_exactly(s in any::<String>()) {
            let staged = encode(&Value::Text(s.clone()));
            prop_assert!(!staged.contains(FIELD_DELIMITER));
            prop_assert!(!staged.contains(LINE_TERMINATOR));

            let line = format!("1\t{staged}\t\\N");
            let fields = split_line(&line);
            prop_assert_eq!(fields.len(), 3);
            prop_assert_eq!(fields[1].as_deref(), Some(s.as_str()));
            prop_assert_eq!(fields[2].as_deref(), None);
        }
    }
}

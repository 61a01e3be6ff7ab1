//! Bulk-load script

use crate::schema::Schema;
use crate::staging::codec;

/// Archive file name holding the staged rows of `table`
pub fn staged_file_name(table: &str) -> String {
    format!("{table}.tsv")
}

/// One `LOAD DATA` directive per table in declared order, so parents are
/// populated before the children referencing them
pub fn load_statements(schema: &Schema) -> String {
    let terminated = sql_char(codec::FIELD_DELIMITER);
    let escaped = sql_char(codec::ESCAPE_CHAR);
    let lines = sql_char(codec::LINE_TERMINATOR);

    schema
        .tables()
        .iter()
        .map(|table| {
            format!(
                "LOAD DATA LOCAL INFILE '{}' INTO TABLE {} FIELDS TERMINATED BY '{}' ESCAPED BY '{}' LINES TERMINATED BY '{}';\n",
                staged_file_name(table.name()),
                table.quoted_name(),
                terminated,
                escaped,
                lines
            )
        })
        .collect()
}

/// Character as written inside a MySQL single-quoted string
fn sql_char(c: char) -> String {
    match c {
        '\t' => "\\t".to_string(),
        '\n' => "\\n".to_string(),
        '\\' => "\\\\".to_string(),
        '\'' => "\\'".to_string(),
        c => c.to_string(),
    }
}

//! MySQL schema management scripts

use crate::schema::{Column, ColumnKind, ColumnStats, ResolvedSchema, Schema};

/// Longest `VARCHAR` that fits a utf8mb4 row; wider strings become `MEDIUMTEXT`
pub const MAX_VARCHAR_LEN: usize = 16_383;

/// `CREATE TABLE` statements in declared order, parents before children
pub fn create_statements(resolved: &ResolvedSchema) -> String {
    let mut out = String::new();
    for table in resolved.tables() {
        let mut clauses: Vec<String> = table
            .columns()
            .map(|(column, stats)| column_definition(column, stats))
            .collect();

        clauses.push(format!("PRIMARY KEY ({})", quote(table.table.primary_key().name())));
        for (_, fk) in table.table.foreign_keys() {
            if let Some(parent) = fk.references() {
                let parent = resolved.schema().table(parent);
                clauses.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {}({})",
                    quote(fk.name()),
                    parent.quoted_name(),
                    quote(parent.primary_key().name())
                ));
            }
        }

        out.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  {}\n) DEFAULT CHARSET=utf8mb4;\n",
            table.table.quoted_name(),
            clauses.join(",\n  ")
        ));
    }
    out
}

/// `DROP TABLE` statements in reverse declared order, so every table is
/// dropped before the tables it references
pub fn drop_statements(schema: &Schema) -> String {
    schema
        .tables()
        .iter()
        .rev()
        .map(|t| format!("DROP TABLE IF EXISTS {};\n", t.quoted_name()))
        .collect()
}

/// `TRUNCATE TABLE` statements, children first, with foreign key checks
/// suspended since InnoDB refuses to truncate a referenced table otherwise
pub fn truncate_statements(schema: &Schema) -> String {
    let mut out = String::from("SET FOREIGN_KEY_CHECKS = 0;\n");
    for table in schema.tables().iter().rev() {
        out.push_str(&format!("TRUNCATE TABLE {};\n", table.quoted_name()));
    }
    out.push_str("SET FOREIGN_KEY_CHECKS = 1;\n");
    out
}

fn column_definition(column: &Column, stats: ColumnStats) -> String {
    let sql_type = match column.kind() {
        ColumnKind::PrimaryKey | ColumnKind::ForeignKey { .. } => "BIGINT".to_string(),
        ColumnKind::Integer if stats.wide_integer => "BIGINT".to_string(),
        ColumnKind::Integer => "INT".to_string(),
        ColumnKind::Double => "DOUBLE".to_string(),
        ColumnKind::String if stats.max_len + 1 > MAX_VARCHAR_LEN => "MEDIUMTEXT".to_string(),
        ColumnKind::String => format!("VARCHAR({})", stats.max_len + 1),
    };
    let nullable = match column.kind() {
        ColumnKind::PrimaryKey | ColumnKind::ForeignKey { .. } => false,
        _ => stats.saw_null,
    };
    format!(
        "{} {} {}",
        quote(column.name()),
        sql_type,
        if nullable { "NULL" } else { "NOT NULL" }
    )
}

fn quote(identifier: &str) -> String {
    format!("`{identifier}`")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::artifacts::test_support::resolved_fixture;

    #[test]
    fn test_create_statement_shapes() {
        let resolved = resolved_fixture();
        let ddl = create_statements(&resolved);
        let expected_variant = "CREATE TABLE IF NOT EXISTS `variant` (\n  \
            `id` BIGINT NOT NULL,\n  \
            `chromosome_id` BIGINT NOT NULL,\n  \
            `pos` INT NOT NULL,\n  \
            `rsid` VARCHAR(12) NULL,\n  \
            `qual` DOUBLE NULL,\n  \
            `depth` BIGINT NOT NULL,\n  \
            PRIMARY KEY (`id`),\n  \
            FOREIGN KEY (`chromosome_id`) REFERENCES `chromosome`(`id`)\n\
            ) DEFAULT CHARSET=utf8mb4;\n";
        assert!(ddl.ends_with(expected_variant), "{ddl}");
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS `chromosome` (\n  `id` BIGINT NOT NULL,\n  `name` VARCHAR(6) NOT NULL,"));
    }

    #[test]
    fn test_create_statements_are_deterministic() {
        let resolved = resolved_fixture();
        assert_eq!(create_statements(&resolved), create_statements(&resolved));
    }

    #[test]
    fn test_drop_children_before_parents() {
        let resolved = resolved_fixture();
        let script = drop_statements(resolved.schema());
        let lines: Vec<&str> = script.lines().collect();
        assert_eq!(
            lines,
            vec!["DROP TABLE IF EXISTS `variant`;", "DROP TABLE IF EXISTS `chromosome`;"]
        );

        for (position, line) in lines.iter().enumerate() {
            let name = line.trim_start_matches("DROP TABLE IF EXISTS `").trim_end_matches("`;");
            let table = resolved.schema().table_by_name(name).unwrap();
            // every table referencing this one must already be dropped
            for child in resolved.schema().tables() {
                if child.foreign_keys().any(|(_, fk)| fk.references() == Some(table.id())) {
                    let child_position = lines
                        .iter()
                        .position(|l| l.contains(&format!("`{}`", child.name())))
                        .unwrap();
                    assert!(child_position < position);
                }
            }
        }
    }

    #[test]
    fn test_truncate_wrapped_in_fk_checks() {
        let resolved = resolved_fixture();
        let script = truncate_statements(resolved.schema());
        assert_eq!(
            script,
            "SET FOREIGN_KEY_CHECKS = 0;\n\
             TRUNCATE TABLE `variant`;\n\
             TRUNCATE TABLE `chromosome`;\n\
             SET FOREIGN_KEY_CHECKS = 1;\n"
        );
    }

    #[test]
    fn test_wide_strings_use_mediumtext() {
        let column = crate::schema::Column {
            name: "info".to_string(),
            kind: ColumnKind::String,
            label: None,
            comment: None,
            uri_pattern: None,
            property: None,
        };
        let stats = ColumnStats {
            saw_null: false,
            max_len: MAX_VARCHAR_LEN,
            wide_integer: false,
        };
        assert_eq!(column_definition(&column, stats), "`info` MEDIUMTEXT NOT NULL");
    }
}

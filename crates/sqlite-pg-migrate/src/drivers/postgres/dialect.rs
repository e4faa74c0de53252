//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! Provides PostgreSQL-specific SQL syntax for identifier quoting, parameter
//! placeholders, table reset and sequence handling.

use crate::core::traits::Dialect;

/// PostgreSQL's limit on bind parameters per statement.
const MAX_PARAMS: usize = 65_535;

/// PostgreSQL dialect implementation.
///
/// Implements the Strategy pattern for SQL syntax differences.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }

    /// `pg_get_serial_sequence(...)` call for a table's key column.
    ///
    /// The table argument is parsed as an identifier, so it carries the
    /// quoted name; the column argument is taken verbatim.
    fn serial_sequence(&self, table: &str, key: &str) -> String {
        format!(
            "pg_get_serial_sequence({}, {})",
            self.quote_literal(&self.quote_ident(table)),
            self.quote_literal(key)
        )
    }
}

impl Dialect for PostgresDialect {
    fn param_placeholder(&self, index: usize) -> String {
        // PostgreSQL uses $1, $2, etc. (1-based)
        format!("${}", index)
    }

    fn max_params_per_statement(&self) -> usize {
        MAX_PARAMS
    }

    fn build_reset_tables(&self, tables: &[&str]) -> Vec<String> {
        // One TRUNCATE covers every table at once, so FK order does not matter
        let list = tables
            .iter()
            .map(|t| self.quote_ident(t))
            .collect::<Vec<_>>()
            .join(", ");
        vec![format!("TRUNCATE TABLE {} RESTART IDENTITY CASCADE", list)]
    }

    fn build_table_exists(&self, table: &str) -> String {
        format!(
            "SELECT COUNT(*)::int8 FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = {}",
            self.quote_literal(table)
        )
    }

    fn build_ping(&self) -> String {
        // Untyped literals come back as int4
        "SELECT 1::int8".to_string()
    }

    fn build_row_count(&self, table: &str) -> String {
        format!("SELECT COUNT(*)::int8 FROM {}", self.quote_ident(table))
    }

    fn build_max_key(&self, table: &str, key: &str) -> String {
        format!(
            "SELECT MAX({})::int8 FROM {}",
            self.quote_ident(key),
            self.quote_ident(table)
        )
    }

    fn build_has_key_generator(&self, table: &str, key: &str) -> String {
        format!(
            "SELECT CASE WHEN {} IS NULL THEN 0 ELSE 1 END::int8",
            self.serial_sequence(table, key)
        )
    }

    fn build_set_next_key(&self, table: &str, key: &str, next: i64) -> Vec<String> {
        // is_called = false: the next nextval() returns exactly `next`
        vec![format!(
            "SELECT setval({}, {}, false)",
            self.serial_sequence(table, key),
            next
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Statement;

    #[test]
    fn test_quote_ident() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.quote_ident("name"), "\"name\"");
        assert_eq!(dialect.quote_ident("table\"name"), "\"table\"\"name\"");
        assert_eq!(dialect.quote_ident("Users"), "\"Users\"");
    }

    #[test]
    fn test_param_placeholder() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.param_placeholder(1), "$1");
        assert_eq!(dialect.param_placeholder(10), "$10");
    }

    #[test]
    fn test_ping_is_typed_int8() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.render(&Statement::Ping), vec!["SELECT 1::int8"]);
    }

    #[test]
    fn test_build_insert_multi_row() {
        let dialect = PostgresDialect::new();
        let cols = vec!["id".to_string(), "name".to_string()];
        let sql = dialect.render(&Statement::Insert {
            table: "products",
            columns: &cols,
            rows: 2,
        });
        assert_eq!(
            sql,
            vec![r#"INSERT INTO "products" ("id", "name") VALUES ($1, $2), ($3, $4)"#]
        );
    }

    #[test]
    fn test_build_reset_tables() {
        let dialect = PostgresDialect::new();
        let sql = dialect.render(&Statement::ResetTables {
            tables: &["products", "users"],
        });
        assert_eq!(
            sql,
            vec![r#"TRUNCATE TABLE "products", "users" RESTART IDENTITY CASCADE"#]
        );
    }

    #[test]
    fn test_build_set_next_key() {
        let dialect = PostgresDialect::new();
        let sql = dialect.render(&Statement::SetNextKey {
            table: "products",
            key: "id",
            next: 43,
        });
        assert_eq!(
            sql,
            vec![r#"SELECT setval(pg_get_serial_sequence('"products"', 'id'), 43, false)"#]
        );
    }

    #[test]
    fn test_build_max_key_casts_to_bigint() {
        let dialect = PostgresDialect::new();
        assert_eq!(
            dialect.build_max_key("users", "id"),
            r#"SELECT MAX("id")::int8 FROM "users""#
        );
    }

    #[test]
    fn test_literal_quoting() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.quote_literal("o'brien"), "'o''brien'");
        assert!(dialect
            .build_table_exists("o'brien")
            .ends_with("table_name = 'o''brien'"));
    }
}

//! Schema introspection module.
//!
//! Catalog lookups behind `list_tables`, `describe_table` and
//! `get_database_info`.
//!
//! # Architecture
//!
//! SQL text lives in the `queries` submodule. Every lookup runs on a
//! connection the caller already checked out, so a multi-query operation
//! such as `describe_table` holds exactly one connection throughout.

use crate::error::{DbError, DbResult};
use crate::models::{
    ColumnDefinition, DatabaseInfo, ForeignKey, TableInfo, TableList, TableSchema, TableType,
};
use sqlx::Row;
use sqlx::postgres::PgConnection;
use tracing::debug;

/// Schema inspector for database introspection.
pub struct SchemaInspector;

impl SchemaInspector {
    /// List tables (and optionally views) in a schema, ordered by name.
    pub async fn list_tables(
        conn: &mut PgConnection,
        schema: &str,
        include_views: bool,
    ) -> DbResult<TableList> {
        let query = if include_views {
            queries::LIST_TABLES_WITH_VIEWS
        } else {
            queries::LIST_TABLES
        };

        let rows = sqlx::query(query)
            .bind(schema)
            .fetch_all(&mut *conn)
            .await?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get("table_name")?;
            let table_type: String = row.try_get("table_type")?;
            tables.push(TableInfo::new(name, TableType::parse(&table_type)));
        }

        debug!(count = tables.len(), schema = schema, "Listed tables");
        Ok(TableList::new(schema, tables))
    }

    /// Describe a table's columns, primary key and foreign keys.
    ///
    /// Fails with a schema error when the table does not exist.
    pub async fn describe_table(
        conn: &mut PgConnection,
        table_name: &str,
        schema: &str,
    ) -> DbResult<TableSchema> {
        let mut table = TableSchema::new(schema, table_name);
        table.columns = fetch_columns(conn, table_name, schema).await?;
        if table.columns.is_empty() {
            return Err(DbError::schema(
                format!("Table '{}' not found", table.qualified_name()),
                table_name.to_string(),
            ));
        }

        table.primary_keys = fetch_primary_keys(conn, table_name, schema).await?;
        table.foreign_keys = fetch_foreign_keys(conn, table_name, schema).await?;

        debug!(
            table = %table.qualified_name(),
            columns = table.columns.len(),
            "Described table"
        );
        Ok(table)
    }

    /// Server version, database size, user schemas and database name.
    pub async fn database_info(conn: &mut PgConnection) -> DbResult<DatabaseInfo> {
        let row = sqlx::query(queries::DATABASE_INFO)
            .fetch_one(&mut *conn)
            .await?;
        let version: String = row.try_get("version")?;
        let size: String = row.try_get("size")?;
        let database: String = row.try_get("database")?;

        let schemas = sqlx::query(queries::LIST_SCHEMAS)
            .fetch_all(&mut *conn)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>("schema_name"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DatabaseInfo {
            version,
            size,
            schemas,
            database,
        })
    }
}

async fn fetch_columns(
    conn: &mut PgConnection,
    table_name: &str,
    schema: &str,
) -> DbResult<Vec<ColumnDefinition>> {
    let rows = sqlx::query(queries::DESCRIBE_COLUMNS)
        .bind(schema)
        .bind(table_name)
        .fetch_all(&mut *conn)
        .await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: String = row.try_get("column_name")?;
        let data_type: String = row.try_get("data_type")?;
        let is_nullable: String = row.try_get("is_nullable")?;
        let default: Option<String> = row.try_get("column_default")?;
        let max_length: Option<i32> = row.try_get("max_length")?;

        columns.push(
            ColumnDefinition::new(name, data_type, is_nullable == "YES")
                .with_default(default)
                .with_max_length(max_length),
        );
    }
    Ok(columns)
}

async fn fetch_primary_keys(
    conn: &mut PgConnection,
    table_name: &str,
    schema: &str,
) -> DbResult<Vec<String>> {
    let rows = sqlx::query(queries::DESCRIBE_PRIMARY_KEY)
        .bind(schema)
        .bind(table_name)
        .fetch_all(&mut *conn)
        .await?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("column_name").map_err(DbError::from))
        .collect()
}

async fn fetch_foreign_keys(
    conn: &mut PgConnection,
    table_name: &str,
    schema: &str,
) -> DbResult<Vec<ForeignKey>> {
    let rows = sqlx::query(queries::DESCRIBE_FOREIGN_KEYS)
        .bind(schema)
        .bind(table_name)
        .fetch_all(&mut *conn)
        .await?;

    let mut keys = Vec::with_capacity(rows.len());
    for row in &rows {
        keys.push(ForeignKey {
            column: row.try_get("column_name")?,
            references_schema: row.try_get("foreign_table_schema")?,
            references_table: row.try_get("foreign_table_name")?,
            references_column: row.try_get("foreign_column_name")?,
            constraint: row.try_get("constraint_name")?,
        });
    }
    Ok(keys)
}

/// Catalog SQL. `information_schema` columns are domain types and
/// `pg_catalog` names are `name`, so every output column is cast to text.
mod queries {
    pub const LIST_TABLES: &str = r#"
        SELECT table_name::text AS table_name, table_type::text AS table_type
        FROM information_schema.tables
        WHERE table_schema = $1 AND table_type = 'BASE TABLE'
        ORDER BY table_name
    "#;

    pub const LIST_TABLES_WITH_VIEWS: &str = r#"
        SELECT table_name::text AS table_name, table_type::text AS table_type
        FROM information_schema.tables
        WHERE table_schema = $1 AND table_type IN ('BASE TABLE', 'VIEW')
        ORDER BY table_name
    "#;

    pub const DESCRIBE_COLUMNS: &str = r#"
        SELECT
            column_name::text AS column_name,
            data_type::text AS data_type,
            is_nullable::text AS is_nullable,
            column_default::text AS column_default,
            character_maximum_length::int4 AS max_length
        FROM information_schema.columns
        WHERE table_schema = $1 AND table_name = $2
        ORDER BY ordinal_position
    "#;

    pub const DESCRIBE_PRIMARY_KEY: &str = r#"
        SELECT kcu.column_name::text AS column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
            ON tc.constraint_name = kcu.constraint_name
            AND tc.table_schema = kcu.table_schema
            AND tc.table_name = kcu.table_name
        WHERE tc.constraint_type = 'PRIMARY KEY'
            AND tc.table_schema = $1
            AND tc.table_name = $2
        ORDER BY kcu.ordinal_position
    "#;

    /// One row per column pair. `conkey` and `confkey` are parallel arrays,
    /// so unnesting them together keeps composite keys paired by position.
    pub const DESCRIBE_FOREIGN_KEYS: &str = r#"
        SELECT
            src.attname::text AS column_name,
            fns.nspname::text AS foreign_table_schema,
            ftbl.relname::text AS foreign_table_name,
            dst.attname::text AS foreign_column_name,
            con.conname::text AS constraint_name
        FROM pg_catalog.pg_constraint con
        JOIN pg_catalog.pg_class tbl ON tbl.oid = con.conrelid
        JOIN pg_catalog.pg_namespace ns ON ns.oid = tbl.relnamespace
        JOIN pg_catalog.pg_class ftbl ON ftbl.oid = con.confrelid
        JOIN pg_catalog.pg_namespace fns ON fns.oid = ftbl.relnamespace
        CROSS JOIN LATERAL unnest(con.conkey, con.confkey)
            WITH ORDINALITY AS k(attnum, fattnum, position)
        JOIN pg_catalog.pg_attribute src
            ON src.attrelid = con.conrelid AND src.attnum = k.attnum
        JOIN pg_catalog.pg_attribute dst
            ON dst.attrelid = con.confrelid AND dst.attnum = k.fattnum
        WHERE con.contype = 'f'
            AND ns.nspname = $1
            AND tbl.relname = $2
        ORDER BY con.conname, k.position
    "#;

    pub const DATABASE_INFO: &str = r#"
        SELECT
            version() AS version,
            pg_size_pretty(pg_database_size(current_database())) AS size,
            current_database()::text AS database
    "#;

    pub const LIST_SCHEMAS: &str = r#"
        SELECT schema_name::text AS schema_name
        FROM information_schema.schemata
        WHERE schema_name NOT IN ('pg_catalog', 'information_schema')
            AND schema_name NOT LIKE 'pg\_toast%'
            AND schema_name NOT LIKE 'pg\_temp%'
        ORDER BY schema_name
    "#;
}

#[cfg(test)]
mod tests {
    use super::queries;

    #[test]
    fn test_catalog_queries_are_parameterized() {
        for sql in [
            queries::LIST_TABLES,
            queries::LIST_TABLES_WITH_VIEWS,
            queries::DESCRIBE_COLUMNS,
            queries::DESCRIBE_PRIMARY_KEY,
            queries::DESCRIBE_FOREIGN_KEYS,
        ] {
            assert!(sql.contains("$1"));
        }
        assert!(queries::DESCRIBE_COLUMNS.contains("ORDER BY ordinal_position"));
        assert!(queries::DESCRIBE_PRIMARY_KEY.contains("ORDER BY kcu.ordinal_position"));
        assert!(queries::DESCRIBE_FOREIGN_KEYS.contains("ORDER BY con.conname, k.position"));
    }

    #[test]
    fn test_views_only_listed_on_request() {
        assert!(!queries::LIST_TABLES.contains("'VIEW'"));
        assert!(queries::LIST_TABLES_WITH_VIEWS.contains("'VIEW'"));
    }
}

//! SQL classification helpers for the query tools.
//!
//! - [`check_read_query`]: the prefix allow-list used by `execute_query`.
//! - [`inspect_read_query`]: an advisory tokenizer pass over prefix-approved
//!   SQL that reports statement shapes the prefix check cannot see.
//! - [`command_verb`]: the command tag verb (`INSERT`, `UPDATE`, ...) for a
//!   statement, since the driver does not surface PostgreSQL's command tag.
//! - [`transaction_control_verb`]: detects statements that open or end a
//!   transaction, which must not appear inside a transaction batch.
//!
//! The prefix check looks at the leading keyword only. It is a guard
//! against accidental writes, not a security boundary: the tokenizer pass
//! only logs what it finds.

use crate::error::{DbError, DbResult};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Leading keywords accepted by `execute_query`.
const READ_PREFIXES: [&str; 2] = ["SELECT", "WITH"];

/// Keywords that make a statement data-modifying.
const DML_KEYWORDS: [Keyword; 4] = [
    Keyword::INSERT,
    Keyword::UPDATE,
    Keyword::DELETE,
    Keyword::MERGE,
];

/// Leading keywords of statements that open, end or nest a transaction.
const TRANSACTION_CONTROL: [&str; 8] = [
    "BEGIN",
    "START",
    "COMMIT",
    "END",
    "ROLLBACK",
    "ABORT",
    "SAVEPOINT",
    "RELEASE",
];

/// Whether the trimmed, upper-cased text starts with `SELECT` or `WITH`.
pub fn is_read_query(sql: &str) -> bool {
    let normalized = sql.trim().to_uppercase();
    READ_PREFIXES.iter().any(|p| normalized.starts_with(p))
}

/// Reject anything `execute_query` must not run.
///
/// Runs before a connection is acquired.
pub fn check_read_query(sql: &str) -> DbResult<()> {
    if sql.trim().is_empty() {
        return Err(DbError::invalid_input("Query must not be empty"));
    }
    if !is_read_query(sql) {
        return Err(DbError::permission(
            "execute_query",
            "Only SELECT (or WITH) queries are allowed. Use execute_mutation for other statements.",
        ));
    }
    Ok(())
}

/// Findings from the advisory pass over a prefix-approved query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInspection {
    /// More than one statement separated by `;`.
    pub multiple_statements: bool,
    /// A data-modifying keyword appears outside parentheses.
    pub top_level_dml: Option<String>,
    /// A data-modifying keyword appears inside parentheses (e.g. a CTE body).
    pub nested_dml: Option<String>,
}

impl QueryInspection {
    pub fn is_clean(&self) -> bool {
        !self.multiple_statements && self.top_level_dml.is_none() && self.nested_dml.is_none()
    }
}

/// Tokenize `sql` and report shapes the prefix check lets through.
///
/// Returns a clean inspection when the text does not tokenize; the server
/// will reject it anyway.
pub fn inspect_read_query(sql: &str) -> QueryInspection {
    let mut inspection = QueryInspection::default();
    let Some(tokens) = significant_tokens(sql) else {
        return inspection;
    };

    let mut depth: i32 = 0;
    let mut saw_statement_end = false;
    for token in &tokens {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth -= 1,
            Token::SemiColon => saw_statement_end = true,
            Token::Word(word) => {
                if saw_statement_end {
                    inspection.multiple_statements = true;
                }
                if word.quote_style.is_none() && DML_KEYWORDS.contains(&word.keyword) {
                    let verb = word.value.to_uppercase();
                    if depth <= 0 {
                        inspection.top_level_dml.get_or_insert(verb);
                    } else {
                        inspection.nested_dml.get_or_insert(verb);
                    }
                }
            }
            _ => {
                if saw_statement_end {
                    inspection.multiple_statements = true;
                }
            }
        }
    }
    inspection
}

/// The command verb PostgreSQL would report for `sql`.
///
/// The first keyword after any comments, upper-cased. For `WITH` statements
/// this is the first top-level `SELECT`/`INSERT`/`UPDATE`/`DELETE`/`MERGE`.
pub fn command_verb(sql: &str) -> String {
    let Some(tokens) = significant_tokens(sql) else {
        return fallback_verb(sql);
    };

    let mut words = tokens.iter().filter_map(|t| match t {
        Token::Word(w) => Some(w),
        _ => None,
    });
    let Some(first) = words.next() else {
        return fallback_verb(sql);
    };
    if first.keyword != Keyword::WITH {
        return first.value.to_uppercase();
    }

    let mut depth: i32 = 0;
    for token in &tokens {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth -= 1,
            Token::Word(w) if depth == 0 => {
                if w.keyword == Keyword::SELECT || DML_KEYWORDS.contains(&w.keyword) {
                    return w.value.to_uppercase();
                }
            }
            _ => {}
        }
    }
    "SELECT".to_string()
}

/// The transaction-control command a statement starts with, if any.
///
/// Covers `BEGIN`, `START TRANSACTION`, `COMMIT`, `END`, `ROLLBACK`, `ABORT`,
/// `SAVEPOINT`, `RELEASE` and `PREPARE TRANSACTION`. A plain `PREPARE name AS
/// ...` is not transaction control.
pub fn transaction_control_verb(sql: &str) -> Option<String> {
    let words: Vec<String> = match significant_tokens(sql) {
        Some(tokens) => tokens
            .iter()
            .take(2)
            .map_while(|t| match t {
                Token::Word(w) => Some(w.value.to_uppercase()),
                _ => None,
            })
            .collect(),
        None => sql
            .split_whitespace()
            .take(2)
            .map(|w| w.trim_end_matches(';').to_uppercase())
            .collect(),
    };

    let first = words.first()?;
    let second = words.get(1).map(String::as_str);
    if TRANSACTION_CONTROL.contains(&first.as_str()) {
        return Some(first.clone());
    }
    if first == "PREPARE" && second == Some("TRANSACTION") {
        return Some("PREPARE TRANSACTION".to_string());
    }
    None
}

/// Tokens with whitespace and comments removed.
fn significant_tokens(sql: &str) -> Option<Vec<Token>> {
    let dialect = PostgreSqlDialect {};
    let tokens = Tokenizer::new(&dialect, sql).tokenize().ok()?;
    Some(
        tokens
            .into_iter()
            .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
            .collect(),
    )
}

fn fallback_verb(sql: &str) -> String {
    sql.split_whitespace()
        .next()
        .map(|w| w.trim_end_matches(';').to_uppercase())
        .filter(|w| !w.is_empty())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_prefix_accepts_select_and_with() {
        assert!(is_read_query("SELECT 1"));
        assert!(is_read_query("  select * from users"));
        assert!(is_read_query("\n\tWITH t AS (SELECT 1) SELECT * FROM t"));
    }

    #[test]
    fn test_read_prefix_rejects_everything_else() {
        for sql in [
            "DELETE FROM users",
            "insert into users(email) values ('x')",
            "EXPLAIN SELECT 1",
            "(SELECT 1)",
            "-- SELECT\nDELETE FROM users",
        ] {
            let err = check_read_query(sql).unwrap_err();
            assert!(matches!(err, DbError::Permission { .. }), "{sql}");
        }
    }

    #[test]
    fn test_transaction_control_detected() {
        for (sql, verb) in [
            ("COMMIT", "COMMIT"),
            ("commit;", "COMMIT"),
            ("  End transaction", "END"),
            ("BEGIN ISOLATION LEVEL SERIALIZABLE", "BEGIN"),
            ("start transaction", "START"),
            ("ROLLBACK TO SAVEPOINT a", "ROLLBACK"),
            ("abort", "ABORT"),
            ("SAVEPOINT a", "SAVEPOINT"),
            ("release savepoint a", "RELEASE"),
            ("/* batch */ COMMIT", "COMMIT"),
            ("PREPARE TRANSACTION 'tx1'", "PREPARE TRANSACTION"),
        ] {
            assert_eq!(transaction_control_verb(sql).as_deref(), Some(verb), "{sql}");
        }
    }

    #[test]
    fn test_ordinary_statements_are_not_transaction_control() {
        for sql in [
            "INSERT INTO commits(id) VALUES (1)",
            "UPDATE t SET ended = true",
            "PREPARE q AS SELECT 1",
            "SELECT 'COMMIT'",
            "",
        ] {
            assert_eq!(transaction_control_verb(sql), None, "{sql}");
        }
    }

    #[test]
    fn test_empty_query_is_invalid_input() {
        assert!(matches!(
            check_read_query("   ").unwrap_err(),
            DbError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_prefix_check_does_not_parse() {
        // Passes the prefix check; flagged only by the advisory pass.
        let sql = "SELECT 1; DELETE FROM users";
        assert!(check_read_query(sql).is_ok());

        let inspection = inspect_read_query(sql);
        assert!(inspection.multiple_statements);
        assert_eq!(inspection.top_level_dml.as_deref(), Some("DELETE"));
    }

    #[test]
    fn test_inspection_clean_for_plain_select() {
        assert!(inspect_read_query("SELECT id, email FROM users WHERE id = $1").is_clean());
        assert!(inspect_read_query("SELECT 1;").is_clean());
        assert!(inspect_read_query("SELECT 'DELETE' AS word").is_clean());
    }

    #[test]
    fn test_inspection_flags_data_modifying_cte() {
        let sql = "WITH gone AS (DELETE FROM users RETURNING id) SELECT * FROM gone";
        let inspection = inspect_read_query(sql);
        assert!(!inspection.multiple_statements);
        assert_eq!(inspection.top_level_dml, None);
        assert_eq!(inspection.nested_dml.as_deref(), Some("DELETE"));
    }

    #[test]
    fn test_command_verb_simple() {
        assert_eq!(command_verb("INSERT INTO users(email) VALUES ($1)"), "INSERT");
        assert_eq!(command_verb("update users set email = $1"), "UPDATE");
        assert_eq!(command_verb("CREATE TABLE t (id int)"), "CREATE");
    }

    #[test]
    fn test_command_verb_skips_comments() {
        assert_eq!(
            command_verb("-- tidy up\n/* old rows */ DELETE FROM users"),
            "DELETE"
        );
    }

    #[test]
    fn test_command_verb_with_statement() {
        let sql = "WITH src AS (SELECT 1 AS id) INSERT INTO t SELECT id FROM src";
        assert_eq!(command_verb(sql), "INSERT");
        assert_eq!(command_verb("WITH x AS (SELECT 1) SELECT * FROM x"), "SELECT");
    }

    #[test]
    fn test_command_verb_fallback() {
        assert_eq!(command_verb(""), "UNKNOWN");
    }
}

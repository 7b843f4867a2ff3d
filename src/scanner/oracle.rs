//! Response oracles deciding whether a probe response evidences a vulnerability

use std::fmt;

/// Lowercase DBMS error signatures
const SQL_ERROR_SIGNATURES: &[&str] = &[
    "sql syntax",
    "you have an error",
    "mysql",
    "unclosed quotation mark",
    "odbc",
    "microsoft ole db",
    "invalid column name",
    "pg_query",
    "pg_exec",
    "syntax error at or near",
    "sqlstate[",
    "sqlite3::",
    "sqlite3.operationalerror",
    "quoted string not properly terminated",
];

/// Why a response was judged to be a SQL error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlErrorMatch {
    /// HTTP 500
    ServerError,
    /// Body contained a DBMS error signature
    Signature(&'static str),
}

impl fmt::Display for SqlErrorMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlErrorMatch::ServerError => write!(f, "HTTP 500"),
            SqlErrorMatch::Signature(sig) => write!(f, "signature '{sig}'"),
        }
    }
}

/// Returns the first rule that marks the response as a SQL error
pub fn sql_error_match(status: u16, body: &str) -> Option<SqlErrorMatch> {
    if status == 500 {
        return Some(SqlErrorMatch::ServerError);
    }

    let lower = body.to_lowercase();
    SQL_ERROR_SIGNATURES
        .iter()
        .copied()
        .find(|sig| lower.contains(sig))
        .map(SqlErrorMatch::Signature)
}

/// True when the response status is 500 or the body carries a DBMS error signature
pub fn is_sql_error(status: u16, body: &str) -> bool {
    sql_error_match(status, body).is_some()
}

/// True when the payload appears verbatim in the body.
/// Encoded reflections (HTML entities, URL encoding) do not count.
pub fn is_reflected(body: &str, payload: &str) -> bool {
    !body.is_empty() && !payload.is_empty() && body.contains(payload)
}

/// First `max_chars` characters of a response body, for evidence
pub fn snippet(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

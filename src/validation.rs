//! Validation of identifiers interpolated into DDL.
//!
//! Role and user names end up inside a `CREATE USER` statement, so they are
//! validated strictly before any statement is built. The accepted grammar is
//! `[A-Za-z_][A-Za-z0-9_$]{0,62}` - the portable subset of unquoted
//! PostgreSQL identifiers.

/// Maximum identifier length accepted (PostgreSQL's `NAMEDATALEN - 1`).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Checks whether `ident` is a safe database identifier.
///
/// Accepts a leading ASCII letter or underscore followed by ASCII letters,
/// digits, underscores, or dollar signs, up to 63 characters total. Empty
/// strings, non-ASCII text, and anything needing quoting is rejected.
///
/// # Example
///
/// ```
/// use rotavault::validation::is_valid_database_identifier;
///
/// assert!(is_valid_database_identifier("app_read"));
/// assert!(is_valid_database_identifier("_migration$v2"));
///
/// assert!(!is_valid_database_identifier(""));
/// assert!(!is_valid_database_identifier("1starts_with_digit"));
/// assert!(!is_valid_database_identifier("bad name"));
/// ```
pub fn is_valid_database_identifier(ident: &str) -> bool {
    if ident.is_empty() || ident.len() > MAX_IDENTIFIER_LENGTH {
        return false;
    }

    let mut chars = ident.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

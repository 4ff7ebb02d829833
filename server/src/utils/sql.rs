//! SQL text helpers
//!
//! Only identifiers and keywords ever reach SQL text; client values are bound.

/// Escape LIKE/ILIKE metacharacters (`%`, `_`, `\`) so user input matches literally.
///
/// PostgreSQL uses `\` as the default LIKE escape character, so the escaped
/// string can be wrapped in `%...%` and bound without an `ESCAPE` clause.
///
/// ```
/// use leaddesk_server::utils::sql::escape_like_pattern;
///
/// let pattern = format!("%{}%", escape_like_pattern("50%_off"));
/// assert_eq!(pattern, "%50\\%\\_off%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Quote an SQL identifier, doubling any embedded quote
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

//! Display formatting for generated SQL

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Clause keywords that start a new line. Two-word keywords come first so
/// `LEFT JOIN` is never split into `LEFT` / `JOIN`.
static KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:LEFT\s+JOIN|GROUP\s+BY|ORDER\s+BY|SELECT|FROM|WHERE|JOIN|ON|LIMIT)\b")
        .expect("keyword pattern is valid")
});

/// Put every clause keyword on its own line.
///
/// Only line breaks are inserted; keyword case and every other character are
/// kept. A keyword that already starts a line is left alone, which makes the
/// transform stable: `format_sql(&format_sql(x)) == format_sql(x)`.
pub fn format_sql(sql: &str) -> String {
    KEYWORDS
        .replace_all(sql, |caps: &Captures| {
            let keyword = &caps[0];
            let start = caps.get(0).map_or(0, |m| m.start());
            let starts_line = sql
                .get(..start)
                .map_or(true, |head| head.is_empty() || head.ends_with('\n'));
            if starts_line {
                keyword.to_string()
            } else {
                format!("\n{keyword}")
            }
        })
        .trim()
        .to_string()
}

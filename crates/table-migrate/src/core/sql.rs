//! Generated SQL statements.
//!
//! The shapes here are relied on by existing tooling and log scrapers; keep
//! them byte-for-byte stable.

/// Quote a MySQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Row count query for a table.
pub fn count_rows(table: &str) -> String {
    format!("SELECT COUNT(*) as count FROM {}", table)
}

/// Full-table fetch.
pub fn select_all(table: &str) -> String {
    format!("SELECT * FROM {}", table)
}

/// Single-row parameterized insert. Placeholder order matches `columns`.
pub fn insert_row<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    let col_list: Vec<String> = columns.iter().map(|c| quote_ident(c.as_ref())).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        col_list.join(", "),
        placeholders
    )
}

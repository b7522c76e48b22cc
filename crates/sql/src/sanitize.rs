/// An identifier guaranteed safe to interpolate inside backtick-quoted SQL
/// identifier positions: produced only by [`sanitize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Renders as a backtick-quoted SQL identifier.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

const RESERVED_KEYWORDS: &[&str] = &[
    "TABLE", "SELECT", "INSERT", "UPDATE", "DELETE", "WHERE", "FROM", "CREATE", "ALTER", "DROP", "INDEX", "KEY",
    "PRIMARY", "FOREIGN", "GROUP", "BY", "ORDER", "ASC", "DESC", "HAVING", "JOIN", "LEFT", "RIGHT", "INNER", "ON",
    "AS", "COUNT", "SUM", "AVG", "MIN", "MAX", "AND", "OR", "NOT", "NULL", "IS", "LIKE",
];

/// Which fixed prefix to prepend when a sanitized name doesn't start with a
/// valid leading character (or collides with a reserved keyword).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeContext {
    Column,
    Table,
}

impl SanitizeContext {
    fn prefix(self) -> &'static str {
        match self {
            SanitizeContext::Column => "col_",
            SanitizeContext::Table => "tbl_",
        }
    }
}

/// Maps a user-supplied name to a safe [`Identifier`], or `None` if `raw` is
/// empty.
///
/// A `.`-qualified reference (`table.column`) is sanitized pointwise: each
/// side is sanitized independently and rejoined with `.`, so callers can
/// sanitize a whole qualified reference in one call.
pub fn sanitize(raw: &str, context: SanitizeContext) -> Option<Identifier> {
    if raw.is_empty() {
        return None;
    }
    if let Some((qualifier, local)) = raw.split_once('.') {
        let left = sanitize_part(qualifier, SanitizeContext::Table)?;
        let right = sanitize_part(local, context)?;
        return Some(Identifier(format!("{left}.{right}")));
    }
    sanitize_part(raw, context).map(Identifier)
}

fn sanitize_part(raw: &str, context: SanitizeContext) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    let folded = raw.replace(' ', "_");
    let mut sanitized: String = folded
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    let starts_valid = sanitized
        .chars()
        .next()
        .map(|c| c.is_alphabetic() || c == '_')
        .unwrap_or(false);
    if sanitized.is_empty() || !starts_valid {
        sanitized = format!("{}{sanitized}", context.prefix());
    }

    if RESERVED_KEYWORDS.contains(&sanitized.to_ascii_uppercase().as_str()) {
        sanitized = format!("{}{sanitized}", context.prefix());
    }

    Some(sanitized.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_folds_spaces_and_punctuation() {
        let id = sanitize("order id!", SanitizeContext::Column).unwrap();
        assert_eq!(id.as_str(), "order_id_");
    }

    #[test]
    fn sanitize_prefixes_leading_digit() {
        let id = sanitize("1name", SanitizeContext::Column).unwrap();
        assert_eq!(id.as_str(), "col_1name");
    }

    #[test]
    fn sanitize_prefixes_reserved_keyword() {
        let id = sanitize("select", SanitizeContext::Column).unwrap();
        assert_eq!(id.as_str(), "col_select");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["order.id", "SELECT", "1col", "plain_name"] {
            let once = sanitize(raw, SanitizeContext::Column).unwrap();
            let twice = sanitize(once.as_str(), SanitizeContext::Column).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn sanitize_qualified_reference_splits_pointwise() {
        let id = sanitize("orders.order id", SanitizeContext::Column).unwrap();
        assert_eq!(id.as_str(), "orders.order_id");
    }

    #[test]
    fn sanitize_empty_is_none() {
        assert!(sanitize("", SanitizeContext::Column).is_none());
    }

    #[test]
    fn sanitize_never_contains_backtick() {
        let id = sanitize("weird`name", SanitizeContext::Column).unwrap();
        assert!(!id.as_str().contains('`'));
        assert!(id.quoted().starts_with('`') && id.quoted().ends_with('`'));
    }
}

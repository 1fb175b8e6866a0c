//! Search term and ordering helpers for list endpoints.

/// Split a free-text search parameter into terms. Terms are separated by
/// whitespace or commas; empty terms are dropped.
pub fn search_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a case-insensitive "contains" pattern for `ILIKE`, escaping the
/// LIKE wildcards in `term`.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

// ---------------------------------------------------------------------------
// Orderings
// ---------------------------------------------------------------------------

/// Sort order accepted by the works list (`?ordering=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkOrdering {
    CreatedAt,
    #[default]
    CreatedAtDesc,
    Title,
    TitleDesc,
}

impl WorkOrdering {
    /// Parse an `ordering` value. Unknown values yield the default.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("created_at") => WorkOrdering::CreatedAt,
            Some("-created_at") => WorkOrdering::CreatedAtDesc,
            Some("title") => WorkOrdering::Title,
            Some("-title") => WorkOrdering::TitleDesc,
            _ => WorkOrdering::default(),
        }
    }

    /// SQL `ORDER BY` body for the `w` alias.
    pub fn sql(&self) -> &'static str {
        match self {
            WorkOrdering::CreatedAt => "w.created_at ASC, w.id ASC",
            WorkOrdering::CreatedAtDesc => "w.created_at DESC, w.id DESC",
            WorkOrdering::Title => "w.title ASC, w.id ASC",
            WorkOrdering::TitleDesc => "w.title DESC, w.id DESC",
        }
    }
}

/// Sort order accepted by the viewing log list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOrdering {
    WatchedAt,
    #[default]
    WatchedAtDesc,
    CreatedAt,
    CreatedAtDesc,
}

impl LogOrdering {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("watched_at") => LogOrdering::WatchedAt,
            Some("-watched_at") => LogOrdering::WatchedAtDesc,
            Some("created_at") => LogOrdering::CreatedAt,
            Some("-created_at") => LogOrdering::CreatedAtDesc,
            _ => LogOrdering::default(),
        }
    }

    /// SQL `ORDER BY` body for the `l` alias.
    pub fn sql(&self) -> &'static str {
        match self {
            LogOrdering::WatchedAt => "l.watched_at ASC, l.created_at ASC, l.id ASC",
            LogOrdering::WatchedAtDesc => "l.watched_at DESC, l.created_at DESC, l.id DESC",
            LogOrdering::CreatedAt => "l.created_at ASC, l.id ASC",
            LogOrdering::CreatedAtDesc => "l.created_at DESC, l.id DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_split_on_whitespace_and_commas() {
        assert_eq!(
            search_terms("  hamlet,globe  theatre "),
            vec!["hamlet", "globe", "theatre"]
        );
        assert!(search_terms("   ").is_empty());
    }

    #[test]
    fn pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("plain"), "%plain%");
    }

    #[test]
    fn work_ordering_defaults_to_newest() {
        assert_eq!(WorkOrdering::parse(None), WorkOrdering::CreatedAtDesc);
        assert_eq!(WorkOrdering::parse(Some("bogus")), WorkOrdering::CreatedAtDesc);
        assert_eq!(WorkOrdering::parse(Some("title")), WorkOrdering::Title);
        assert_eq!(WorkOrdering::parse(Some("-title")), WorkOrdering::TitleDesc);
    }

    #[test]
    fn log_ordering_parses() {
        assert_eq!(LogOrdering::parse(None), LogOrdering::WatchedAtDesc);
        assert_eq!(LogOrdering::parse(Some("created_at")), LogOrdering::CreatedAt);
    }
}

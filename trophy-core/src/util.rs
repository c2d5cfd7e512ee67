pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Whether `value` only contains characters that are safe inside any dialect's
/// identifier without quoting: ASCII letters, digits and underscore.
pub fn is_identifier_safe(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {{
        let query: &str = &$query;
        let end = query
            .char_indices()
            .nth(497)
            .map(|(i, _)| i)
            .unwrap_or(query.len());
        format!(
            "{}{}",
            query[..end].trim_end(),
            if end < query.len() { "..." } else { "" },
        )
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated() {
        let mut out = String::from("(");
        separated_by(&mut out, ["a", "b", "c"], |out, v| out.push_str(v), ", ");
        out.push(')');
        assert_eq!(out, "(a, b, c)");
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier_safe("aa_connections2"));
        assert!(is_identifier_safe(""));
        assert!(!is_identifier_safe("drop table;"));
        assert!(!is_identifier_safe("naïve"));
    }

    #[test]
    fn truncation() {
        let long = "x".repeat(600);
        let truncated = truncate_long!(long);
        assert_eq!(truncated.len(), 500);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_long!("SELECT 1;  "), "SELECT 1;");
    }
}

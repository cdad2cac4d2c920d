//! Masked rendering of secret header values.
//!
//! A masked value keeps a short literal prefix followed by a fixed run of
//! mask characters. Authorization scheme words (`Bearer`, `Basic`) stay
//! readable and do not count towards the prefix.

/// Run of mask characters appended to every masked value.
pub const MASK_RUN: &str = "********";

/// Trailing comment on a header line that currently shows a masked value.
pub const MASKED_ANNOTATION: &str = "# [secret hidden] toggle visibility to reveal";

/// Trailing comment on a header line that currently shows a real value.
pub const REVEALED_ANNOTATION: &str = "# [secret visible] toggle visibility to hide, do not save";

const SCHEMES: &[&str] = &["Bearer ", "Basic "];

/// Visibility of the secrets in a request document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Secret header lines show masked values.
    Masked,
    /// Secret header lines show real values.
    Revealed,
}

/// Masks a secret value, showing at most `visible_chars` leading characters
/// and never more than half of the secret.
pub fn mask_value(value: &str, visible_chars: usize) -> String {
    let (scheme, secret) = split_scheme(value);
    let secret_len = secret.chars().count();
    let shown = visible_chars.min(secret_len / 2);
    let prefix: String = secret.chars().take(shown).collect();
    format!("{}{}{}", scheme, prefix, MASK_RUN)
}

/// Whether a header value is in masked form.
pub fn is_masked(value: &str) -> bool {
    value.contains(MASK_RUN)
}

fn split_scheme(value: &str) -> (&str, &str) {
    for scheme in SCHEMES {
        if value.len() > scheme.len() && value.starts_with(scheme) {
            return value.split_at(scheme.len());
        }
    }
    ("", value)
}

/// Renders one header line carrying a secret.
pub fn render_secret_line(name: &str, value: &str, visibility: Visibility) -> String {
    let annotation = match visibility {
        Visibility::Masked => MASKED_ANNOTATION,
        Visibility::Revealed => REVEALED_ANNOTATION,
    };
    format!("{}: {}  {}", name, value, annotation)
}

/// Recognizes a header line produced by [`render_secret_line`].
///
/// Returns the header name and the current visibility.
pub fn parse_secret_line(line: &str) -> Option<(&str, Visibility)> {
    let trimmed = line.trim_end();
    let visibility = if trimmed.ends_with(MASKED_ANNOTATION) {
        Visibility::Masked
    } else if trimmed.ends_with(REVEALED_ANNOTATION) {
        Visibility::Revealed
    } else {
        return None;
    };

    let colon = trimmed.find(':')?;
    let name = trimmed[..colon].trim();
    if name.is_empty() || name.starts_with('#') {
        return None;
    }
    Some((name, visibility))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_scheme_and_prefix() {
        assert_eq!(mask_value("Bearer abcdefghij", 4), "Bearer abcd********");
        assert_eq!(mask_value("Basic dTpw", 4), "Basic dT********");
        assert_eq!(mask_value("key-123456", 4), "key-********");
    }

    #[test]
    fn test_mask_never_shows_more_than_half() {
        assert_eq!(mask_value("abc", 4), "a********");
        assert_eq!(mask_value("x", 4), "********");
        assert_eq!(mask_value("", 4), "********");
    }

    #[test]
    fn test_is_masked() {
        assert!(is_masked("Bearer abcd********"));
        assert!(!is_masked("Bearer abcdefgh"));
    }

    #[test]
    fn test_render_and_parse_secret_line() {
        let line = render_secret_line("Authorization", "Bearer ab********", Visibility::Masked);
        assert_eq!(
            parse_secret_line(&line),
            Some(("Authorization", Visibility::Masked))
        );

        let line = render_secret_line("X-API-Key", "real", Visibility::Revealed);
        assert_eq!(parse_secret_line(&line), Some(("X-API-Key", Visibility::Revealed)));

        assert_eq!(parse_secret_line("Accept: application/json"), None);
        assert_eq!(parse_secret_line(MASKED_ANNOTATION), None);
    }

    #[test]
    fn test_rendered_line_parses_as_header_without_annotation() {
        let line = render_secret_line("Authorization", "Bearer ab********", Visibility::Masked);
        let (name, value) = crate::parser::parse_header_line(&line).unwrap();
        assert_eq!(name, "Authorization");
        assert_eq!(value, "Bearer ab********");
    }
}

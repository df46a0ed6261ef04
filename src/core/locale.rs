//! Locale to language-tag fallback chain

use crate::item::Language;

/// Ordered language tags to try for a message locale
///
/// `de_AT.UTF-8@euro` yields `de_AT`, `de`, then the default tag. The `C`
/// and `POSIX` locales, and no locale at all, go straight to the default.
pub fn candidate_languages(locale: Option<&str>) -> Vec<Language> {
    let mut candidates = Vec::with_capacity(3);

    if let Some(tag) = locale.and_then(locale_tag) {
        let full = Language::truncated(tag);
        candidates.push(full);

        let full = full.as_bytes();
        if let Some(sep) = full.iter().position(|&b| b == b'_') {
            // `sep` indexes an ASCII byte, so this is a char boundary
            candidates.push(Language::truncated(&tag[..sep]));
        }
    }

    candidates.push(Language::DEFAULT);
    candidates
}

/// Language and territory part of a locale name, if it names one
fn locale_tag(locale: &str) -> Option<&str> {
    if locale.is_empty() || locale == "C" || locale == "POSIX" {
        return None;
    }

    let end = locale.find(['.', '@']).unwrap_or(locale.len());
    let tag = &locale[..end];
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

/// Message locale as the C library would resolve it
///
/// `LC_ALL` overrides `LC_MESSAGES`, which overrides `LANG`; empty values
/// are skipped. Only the command-line front end calls this; library lookups
/// take the locale as a parameter.
pub fn locale_from_env() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(locale: Option<&str>) -> Vec<String> {
        candidate_languages(locale)
            .iter()
            .map(|l| l.as_str().into_owned())
            .collect()
    }

    #[test]
    fn test_full_locale() {
        assert_eq!(tags(Some("de_AT.UTF-8")), vec!["de_AT", "de", ""]);
        assert_eq!(tags(Some("de_AT@euro")), vec!["de_AT", "de", ""]);
        assert_eq!(tags(Some("sr_RS.UTF-8@latin")), vec!["sr_RS", "sr", ""]);
    }

    #[test]
    fn test_language_only() {
        assert_eq!(tags(Some("fr")), vec!["fr", ""]);
        assert_eq!(tags(Some("fr.UTF-8")), vec!["fr", ""]);
    }

    #[test]
    fn test_default_locales() {
        assert_eq!(tags(None), vec![""]);
        assert_eq!(tags(Some("")), vec![""]);
        assert_eq!(tags(Some("C")), vec![""]);
        assert_eq!(tags(Some("POSIX")), vec![""]);
        assert_eq!(tags(Some(".UTF-8")), vec![""]);
    }

    #[test]
    fn test_c_utf8_is_a_tag() {
        assert_eq!(tags(Some("C.UTF-8")), vec!["C", ""]);
    }

    #[test]
    fn test_long_locale_truncated() {
        let locale = format!("{}_XX", "a".repeat(40));
        let candidates = candidate_languages(Some(&locale));
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].as_bytes().len(), 31);
    }
}

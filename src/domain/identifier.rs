/// QR codes on the vehicles encode one of these URLs followed by the short id.
pub const DEFAULT_KNOWN_PREFIXES: [&str; 2] = ["https://tier.app/", "https://qr.tier-services.io/"];

pub const MAX_IDENTIFIER_LEN: usize = 200;

/// Reduces a scanned or typed identifier to its comparable short form:
/// surrounding whitespace is dropped, the first matching known prefix is
/// stripped and the remainder is uppercased.
pub fn normalize<S: AsRef<str>>(raw: &str, prefixes: &[S]) -> String {
    let trimmed = trim_scanner_noise(raw);
    let stripped = prefixes
        .iter()
        .map(|prefix| prefix.as_ref())
        .filter(|prefix| !prefix.is_empty())
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .unwrap_or(trimmed);
    trim_scanner_noise(stripped).to_uppercase()
}

pub fn identifiers_match<S: AsRef<str>>(a: &str, b: &str, prefixes: &[S]) -> bool {
    normalize(a, prefixes) == normalize(b, prefixes)
}

/// Trimmed form stored for a new scan. The full URL is kept so it can still be
/// shown to operators.
pub fn sanitize_raw(raw: &str) -> &str {
    trim_scanner_noise(raw)
}

// Hand scanners append CR/LF or TAB, some keyboard wedges prepend a BOM.
fn trim_scanner_noise(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || c.is_control() || c == '\u{FEFF}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_url_prefix_and_uppercases() {
        assert_eq!(
            normalize("https://tier.app/ab12cd", &DEFAULT_KNOWN_PREFIXES),
            "AB12CD"
        );
        assert_eq!(
            normalize("https://qr.tier-services.io/xy987", &DEFAULT_KNOWN_PREFIXES),
            "XY987"
        );
    }

    #[test]
    fn plain_identifier_is_only_trimmed_and_uppercased() {
        assert_eq!(normalize("  ab12cd\r\n", &DEFAULT_KNOWN_PREFIXES), "AB12CD");
    }

    #[test]
    fn bom_and_tabs_from_scanners_are_removed() {
        assert_eq!(
            normalize("\u{FEFF}https://tier.app/q1w2e\t", &DEFAULT_KNOWN_PREFIXES),
            "Q1W2E"
        );
    }

    #[test]
    fn prefix_match_is_case_sensitive() {
        assert_eq!(
            normalize("HTTPS://TIER.APP/ab1", &DEFAULT_KNOWN_PREFIXES),
            "HTTPS://TIER.APP/AB1"
        );
    }

    #[test]
    fn only_one_prefix_is_stripped() {
        assert_eq!(
            normalize("https://tier.app/https://tier.app/x", &DEFAULT_KNOWN_PREFIXES),
            "HTTPS://TIER.APP/X"
        );
    }

    #[test]
    fn bare_prefix_normalizes_to_empty() {
        assert_eq!(normalize("https://tier.app/", &DEFAULT_KNOWN_PREFIXES), "");
    }

    #[test]
    fn url_and_short_id_match() {
        assert!(identifiers_match(
            "https://tier.app/AB12CD",
            "ab12cd",
            &DEFAULT_KNOWN_PREFIXES
        ));
        assert!(!identifiers_match("AB12CD", "AB12CE", &DEFAULT_KNOWN_PREFIXES));
    }

    #[test]
    fn custom_prefixes_replace_defaults() {
        let prefixes = vec!["scan://".to_string()];
        assert_eq!(normalize("scan://abc", &prefixes), "ABC");
        assert_eq!(
            normalize("https://tier.app/abc", &prefixes),
            "HTTPS://TIER.APP/ABC"
        );
    }

    #[test]
    fn empty_prefix_entries_are_ignored() {
        let prefixes = vec![String::new(), "https://tier.app/".to_string()];
        assert_eq!(normalize("https://tier.app/abc", &prefixes), "ABC");
    }
}

// Theme name normalization
// Display names and comparison keys derived from uploaded file names.

use std::sync::LazyLock;
use regex::Regex;

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\-\.]+").expect("separator regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

// Everything except letters, digits and the few symbols that distinguish titles
static NORMALIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}0-9\+!＊！＋]").expect("normalize regex"));

/// Human-readable name: separators become spaces, whitespace collapses,
/// and each word starts with an uppercase letter.
///
/// `"ocean_breeze"` -> `"Ocean Breeze"`
pub fn prettify_file_name(name: &str) -> String {
    let spaced = SEPARATOR_RE.replace_all(name, " ");
    let collapsed = WHITESPACE_RE.replace_all(spaced.trim(), " ");

    collapsed
        .split(' ')
        .map(capitalize_first)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Comparison key. Equal display names always produce equal keys.
///
/// `"Ocean Breeze"` and `"ocean   breeze"` -> `"oceanbreeze"`
pub fn normalize(name: &str) -> String {
    NORMALIZE_RE.replace_all(name, "").to_lowercase()
}

// Characters whose uppercase form is longer (ß -> SS) are left alone so the
// display name keeps the same comparison key as the raw file name.
fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let mut upper = first.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => std::iter::once(single).chain(chars).collect(),
        _ => word.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prettify() {
        assert_eq!(prettify_file_name("Ocean Breeze"), "Ocean Breeze");
        assert_eq!(prettify_file_name("ocean_breeze"), "Ocean Breeze");
        assert_eq!(prettify_file_name("  night--owl..v2 "), "Night Owl V2");
        assert_eq!(prettify_file_name("sepia   tone"), "Sepia Tone");
    }

    #[test]
    fn test_prettify_keeps_inner_case() {
        assert_eq!(prettify_file_name("myDarkTheme"), "MyDarkTheme");
    }

    #[test]
    fn test_normalize_collapses_format_differences() {
        assert_eq!(normalize("Ocean Breeze"), "oceanbreeze");
        assert_eq!(normalize("ocean   breeze"), normalize("Ocean Breeze"));
        assert_eq!(normalize("OCEAN-BREEZE"), "oceanbreeze");
        assert_eq!(normalize("E-Ink"), "eink");
    }

    #[test]
    fn test_normalize_keeps_letters_digits_and_marks() {
        assert_eq!(normalize("Théme 2+"), "théme2+");
        assert_eq!(normalize("Wow!"), "wow!");
    }

    #[test]
    fn test_prettified_name_normalizes_like_raw_name() {
        for raw in ["ocean_breeze", "Night.Owl", "sepia  tone", "a-b_c", "ßeta", "ŉight_owl"] {
            assert_eq!(normalize(&prettify_file_name(raw)), normalize(raw));
        }
    }

    #[test]
    fn test_case_expanding_letters_keep_distinct_keys() {
        assert_eq!(prettify_file_name("ßeta"), "ßeta");
        assert_eq!(normalize(&prettify_file_name("ßeta")), "ßeta");
        assert_ne!(
            normalize(&prettify_file_name("ßeta")),
            normalize(&prettify_file_name("sseta"))
        );
    }

    #[test]
    fn test_symbol_only_name_normalizes_to_empty() {
        assert_eq!(normalize("___"), "");
    }
}

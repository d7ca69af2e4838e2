//! Slug normalization (spec.md §4.1 step 5).

/// Leading articles stripped from the front of a title before slugging.
const LEADING_ARTICLES: &[&str] = &["the ", "a ", "an "];

/// Trailing qualifier words dropped from the end of a title before slugging.
/// See SPEC_FULL.md §C.2 for why these specific words were chosen.
const SUFFIX_WORDS: &[&str] = &[
    "edition",
    "remastered",
    "collection",
    "definitive",
    "goty",
    "complete",
];

/// Normalize a display title into a lowercase, alphanumeric slug.
///
/// Falls back to a lowercased `fallback` (the raw filename) if the result
/// would otherwise be empty, e.g. for non-Latin titles.
#[must_use]
pub fn slugify(title: &str, fallback: &str) -> String {
    let mut working = title.to_lowercase();

    for article in LEADING_ARTICLES {
        if let Some(rest) = working.strip_prefix(article) {
            working = rest.to_string();
            break;
        }
    }

    working = working.replace('&', "and");

    for word in SUFFIX_WORDS {
        let suffix = format!(" {word}");
        if let Some(stripped) = working.strip_suffix(&suffix) {
            working = stripped.to_string();
        }
    }

    let slug: String = working.chars().filter(char::is_ascii_alphanumeric).collect();

    if slug.is_empty() {
        fallback
            .to_lowercase()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect()
    } else {
        slug
    }
}

/// Number of whitespace-separated words in the pre-normalization title; used
/// to populate [`crate::model::MediaTitle::slug_word_count`].
#[must_use]
pub fn word_count(title: &str) -> i32 {
    i32::try_from(title.split_whitespace().count()).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_article_and_suffix() {
        assert_eq!(slugify("The Legend Remastered", "fallback"), "legend");
    }

    #[test]
    fn converts_ampersand() {
        assert_eq!(slugify("Sam & Max", "fallback"), "samandmax");
    }

    #[test]
    fn falls_back_on_empty_result() {
        assert_eq!(slugify("忍者", "にんじゃ.zip"), slugify_fallback_only("にんじゃ.zip"));
    }

    fn slugify_fallback_only(s: &str) -> String {
        s.to_lowercase().chars().filter(char::is_ascii_alphanumeric).collect()
    }
}

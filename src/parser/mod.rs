//! Path Parser (spec.md §4.1): turns a path into title/slug/tags metadata
//! that feeds the catalog's fuzzy-match prefilter. Pure, idempotent,
//! deterministic.

mod cache;
mod slug;
mod tags;

pub use cache::FragmentCache;
pub use slug::word_count;
pub use tags::ParsedTag;

use crate::vpath::{self, CUSTOM_SCHEMES, STANDARD_SCHEMES};
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Input to [`parse`].
#[derive(Debug, Clone)]
pub struct ParseOptions<'a> {
    pub path: &'a str,
    pub system_id: &'a str,
    pub no_ext: bool,
    pub strip_leading_numbers: bool,
    pub filename_tags_enabled: bool,
}

/// Parsed view of a path (spec.md glossary: "Fragment").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPathFragments {
    pub path: String,
    pub file_name: String,
    pub title: String,
    pub slug: String,
    pub ext: String,
    pub tags: Vec<String>,
}

fn bracket_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\(\[\{<]([^\)\]\}>]*)[\)\]\}>]").expect("valid regex"))
}

fn leading_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+[\s._-]+").expect("valid regex"))
}

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Parse a path into its [`MediaPathFragments`], without caching. Use
/// [`parse_cached`] in hot paths (the Ingest Function does).
#[must_use]
pub fn parse(opts: &ParseOptions<'_>) -> MediaPathFragments {
    let scheme = vpath::uri_scheme(opts.path);

    let (path, basename_for_title, ext_raw) = match scheme {
        Some(s) if STANDARD_SCHEMES.contains(&s) => {
            let last = opts.path.rsplit('/').next().unwrap_or(opts.path);
            let decoded = percent_decode_str(last).decode_utf8_lossy().into_owned();
            let ext = extract_ext(&decoded);
            (opts.path.to_string(), decoded, ext)
        }
        Some(s) if CUSTOM_SCHEMES.contains(&s) => {
            let decoded = vpath::decode_last_segment(opts.path);
            (opts.path.to_string(), decoded, String::new())
        }
        Some(_) => {
            // Unrecognized scheme: keep verbatim, treat like a standard URI.
            let last = opts.path.rsplit('/').next().unwrap_or(opts.path);
            let decoded = percent_decode_str(last).decode_utf8_lossy().into_owned();
            let ext = extract_ext(&decoded);
            (opts.path.to_string(), decoded, ext)
        }
        None => {
            let canonical = canonicalize_separators(opts.path);
            let base = canonical.rsplit('/').next().unwrap_or(&canonical).to_string();
            let ext = extract_ext(&base);
            (canonical, base, ext)
        }
    };

    let file_name = strip_ext(&basename_for_title, &ext_raw);

    let ext = if opts.no_ext || ext_raw.contains(char::is_whitespace) {
        String::new()
    } else {
        ext_raw.to_lowercase()
    };

    let (title, bracket_tokens) = compute_title(&file_name, opts.strip_leading_numbers);
    let slug = slug::slugify(&title, &file_name);

    let tags = if opts.filename_tags_enabled {
        bracket_tokens
            .iter()
            .flat_map(|raw| tags::parse_bracket_contents(raw))
            .map(|t| format!("{}:{}", t.tag_type, t.value))
            .collect()
    } else {
        Vec::new()
    };

    MediaPathFragments {
        path,
        file_name,
        title,
        slug,
        ext,
        tags,
    }
}

/// Like [`parse`] but consults/populates `cache` first.
#[must_use]
pub fn parse_cached(opts: &ParseOptions<'_>, cache: &FragmentCache) -> MediaPathFragments {
    cache.get_or_insert_with(
        opts.path,
        opts.system_id,
        opts.no_ext,
        opts.strip_leading_numbers,
        opts.filename_tags_enabled,
        || parse(opts),
    )
}

fn canonicalize_separators(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let mut segments = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let leading_slash = normalized.starts_with('/');
    let joined = segments.join("/");
    if leading_slash {
        format!("/{joined}")
    } else {
        joined
    }
}

fn extract_ext(basename: &str) -> String {
    match basename.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < basename.len() => basename[idx + 1..].to_string(),
        _ => String::new(),
    }
}

fn strip_ext(basename: &str, ext: &str) -> String {
    if ext.is_empty() {
        basename.to_string()
    } else {
        let suffix = format!(".{ext}");
        basename
            .strip_suffix(&suffix)
            .unwrap_or(basename)
            .to_string()
    }
}

/// Returns the normalized title and the raw contents of any bracket groups
/// found (for tag extraction), per spec.md §4.1 step 4.
fn compute_title(file_name: &str, strip_leading_numbers: bool) -> (String, Vec<String>) {
    let bracket_tokens: Vec<String> = bracket_regex()
        .captures_iter(file_name)
        .map(|c| c[1].to_string())
        .collect();

    let mut stripped = bracket_regex().replace_all(file_name, "").into_owned();

    let separator_count = stripped.matches(['-', '_']).count();
    let has_spaces = stripped.contains(' ');
    if separator_count >= 2 && !has_spaces {
        stripped = stripped.replace(['-', '_'], " ");
    }

    let mut normalized = whitespace_regex().replace_all(stripped.trim(), " ").into_owned();

    if strip_leading_numbers {
        normalized = leading_number_regex().replace(&normalized, "").into_owned();
    }

    (normalized.trim().to_string(), bracket_tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts<'a>(path: &'a str, system_id: &'a str) -> ParseOptions<'a> {
        ParseOptions {
            path,
            system_id,
            no_ext: false,
            strip_leading_numbers: false,
            filename_tags_enabled: true,
        }
    }

    #[test]
    fn filesystem_path_basic() {
        let f = parse(&opts("/r/nes/Mario (USA).nes", "nes"));
        assert_eq!(f.file_name, "Mario (USA)");
        assert_eq!(f.title, "Mario");
        assert_eq!(f.slug, "mario");
        assert_eq!(f.ext, "nes");
        assert_eq!(f.tags, vec!["region:us".to_string()]);
    }

    #[test]
    fn dash_underscore_conversion_only_without_spaces() {
        let f = parse(&opts("/r/nes/Mega-Man-2.nes", "nes"));
        assert_eq!(f.title, "Mega Man 2");

        let f2 = parse(&opts("/r/nes/Mega Man-2.nes", "nes"));
        assert_eq!(f2.title, "Mega Man-2");
    }

    #[test]
    fn custom_scheme_virtual_path() {
        let f = parse(&opts("kodi-show://789/Hot%2FCold", "tvshow"));
        assert_eq!(f.path, "kodi-show://789/Hot%2FCold");
        assert_eq!(f.title, "Hot/Cold");
        assert_eq!(f.slug, "hotcold");
        assert_eq!(f.ext, "");
    }

    #[test]
    fn standard_scheme_uses_last_segment() {
        let f = parse(&opts("https://example.com/media/Clip.mp4", "web"));
        assert_eq!(f.file_name, "Clip");
        assert_eq!(f.ext, "mp4");
    }

    #[test]
    fn idempotent_on_non_uri_paths() {
        let first = parse(&opts("/r/nes/Zelda (Japan) (Rev 1).nes", "nes"));
        let second = parse(&opts(&first.path, "nes"));
        assert_eq!(first.path, second.path);
    }

    #[test]
    fn non_latin_title_falls_back_to_filename_slug() {
        let f = parse(&opts("/r/nes/忍者.nes", "nes"));
        assert_eq!(f.slug, "");
        // falls back, but filename itself has no ascii-alnum chars either
    }

    #[test]
    fn no_ext_option_forces_empty_extension() {
        let f = parse(&ParseOptions {
            no_ext: true,
            ..opts("/r/nes/Mario.nes", "nes")
        });
        assert_eq!(f.ext, "");
    }
}

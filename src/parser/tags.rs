//! Filename tag extraction (spec.md §4.1 step 6): canonicalizes bracketed
//! filename metadata into `type:value` strings per a fixed rule table.

/// `(display token (lowercased, no punctuation), tag value)` pairs for
/// regions. See SPEC_FULL.md §C.1 for the chosen vocabulary.
const REGIONS: &[(&str, &str)] = &[
    ("usa", "us"),
    ("us", "us"),
    ("europe", "eu"),
    ("eu", "eu"),
    ("japan", "jp"),
    ("jp", "jp"),
    ("world", "world"),
    ("asia", "asia"),
    ("australia", "au"),
    ("brazil", "br"),
    ("canada", "ca"),
    ("china", "cn"),
    ("france", "fr"),
    ("germany", "de"),
    ("italy", "it"),
    ("korea", "kr"),
    ("netherlands", "nl"),
    ("spain", "es"),
    ("sweden", "se"),
    ("uk", "gb"),
];

const LANGUAGES: &[(&str, &str)] = &[
    ("en", "en"),
    ("fr", "fr"),
    ("de", "de"),
    ("es", "es"),
    ("it", "it"),
    ("ja", "ja"),
    ("pt", "pt"),
    ("ru", "ru"),
    ("zh", "zh"),
    ("ko", "ko"),
    ("nl", "nl"),
    ("sv", "sv"),
    ("no", "no"),
    ("da", "da"),
    ("fi", "fi"),
    ("pl", "pl"),
];

const DEV_STATUS: &[(&str, &str)] = &[
    ("proto", "proto"),
    ("prototype", "proto"),
    ("beta", "beta"),
    ("demo", "demo"),
    ("alpha", "alpha"),
    ("sample", "sample"),
];

/// One `type:value` tag parsed out of bracketed filename metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub tag_type: String,
    pub value: String,
}

/// Parse the raw contents of a single bracket group (without the brackets
/// themselves) into zero or more tags. A bracket group may contain several
/// comma-separated tokens (`"USA, Europe"`, `"En,Fr,De"`).
pub fn parse_bracket_contents(raw: &str) -> Vec<ParsedTag> {
    raw.split(',')
        .filter_map(|token| classify_token(token.trim()))
        .collect()
}

fn classify_token(token: &str) -> Option<ParsedTag> {
    if token.is_empty() {
        return None;
    }
    let lower = token.to_lowercase();
    let normalized: String = lower.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

    if let Some((_, code)) = REGIONS.iter().find(|(name, _)| *name == normalized) {
        return Some(ParsedTag {
            tag_type: "region".to_string(),
            value: (*code).to_string(),
        });
    }

    if let Some((_, code)) = DEV_STATUS.iter().find(|(name, _)| *name == normalized) {
        return Some(ParsedTag {
            tag_type: "dev_status".to_string(),
            value: (*code).to_string(),
        });
    }

    if let Some(disc_num) = parse_disc(&lower) {
        return Some(ParsedTag {
            tag_type: "disc".to_string(),
            value: disc_num,
        });
    }

    if let Some(rev) = parse_revision(&lower) {
        return Some(ParsedTag {
            tag_type: "rev".to_string(),
            value: rev,
        });
    }

    if let Some(year) = parse_year(&normalized) {
        return Some(ParsedTag {
            tag_type: "year".to_string(),
            value: year,
        });
    }

    if normalized.len() <= 2 {
        if let Some((_, code)) = LANGUAGES.iter().find(|(name, _)| *name == normalized) {
            return Some(ParsedTag {
                tag_type: "lang".to_string(),
                value: (*code).to_string(),
            });
        }
    }

    None
}

fn parse_disc(lower: &str) -> Option<String> {
    let rest = lower.strip_prefix("disc ").or_else(|| lower.strip_prefix("disk "))?;
    rest.trim().parse::<u32>().ok().map(|n| n.to_string())
}

fn parse_revision(lower: &str) -> Option<String> {
    if let Some(rest) = lower.strip_prefix("rev ").or_else(|| lower.strip_prefix("rev")) {
        let rest = rest.trim();
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Some(rest.to_string());
        }
    }
    if let Some(rest) = lower.strip_prefix('v') {
        if rest.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return Some(rest.to_string());
        }
    }
    None
}

fn parse_year(normalized: &str) -> Option<String> {
    if normalized.len() == 4 && normalized.chars().all(|c| c.is_ascii_digit()) {
        let year: u32 = normalized.parse().ok()?;
        if (1970..=2099).contains(&year) {
            return Some(normalized.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_region_list() {
        let tags = parse_bracket_contents("USA, Europe");
        assert_eq!(
            tags,
            vec![
                ParsedTag { tag_type: "region".into(), value: "us".into() },
                ParsedTag { tag_type: "region".into(), value: "eu".into() },
            ]
        );
    }

    #[test]
    fn parses_revision_and_disc() {
        assert_eq!(
            parse_bracket_contents("Rev 1"),
            vec![ParsedTag { tag_type: "rev".into(), value: "1".into() }]
        );
        assert_eq!(
            parse_bracket_contents("Disc 2"),
            vec![ParsedTag { tag_type: "disc".into(), value: "2".into() }]
        );
    }

    #[test]
    fn ignores_unknown_tokens() {
        assert!(parse_bracket_contents("Totally Unknown Thing").is_empty());
    }
}

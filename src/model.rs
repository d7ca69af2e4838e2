//! Entity types for the media catalog (spec.md §3).
//!
//! All `dbid` fields are assigned by the core, never by the store — see
//! [`crate::scan_state::ScanState`] for the counters that hand them out.

use serde::{Deserialize, Serialize};

/// A logical platform grouping: a retro console, a streaming source, a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    pub dbid: i64,
    pub system_id: String,
    pub name: String,
}

/// A distinct work within a system, keyed by [`MediaTitle::slug`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTitle {
    pub dbid: i64,
    pub system_dbid: i64,
    pub slug: String,
    pub name: String,
    pub slug_length: i32,
    pub slug_word_count: i32,
    pub secondary_slug: Option<String>,
}

/// One physical or virtual file backing a [`MediaTitle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub dbid: i64,
    pub path: String,
    pub media_title_dbid: i64,
    pub system_dbid: i64,
}

/// Category of a [`Tag`] (`"region"`, `"lang"`, `"extension"`, `"rev"`, `"unknown"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagType {
    pub dbid: i64,
    pub r#type: String,
}

/// A value within a [`TagType`] (`"us"`, `"en"`, `"nes"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub dbid: i64,
    pub tag_type_dbid: i64,
    pub value: String,
}

/// `(media_dbid, tag_dbid)` association. Unique by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTag {
    pub media_dbid: i64,
    pub tag_dbid: i64,
}

impl Tag {
    /// The composite identity key used by [`crate::scan_state::ScanState::tag_ids`]: `type:value`.
    #[must_use]
    pub fn key(tag_type: &str, value: &str) -> String {
        format!("{tag_type}:{value}")
    }
}

impl MediaTitle {
    /// The map key used by [`crate::scan_state::ScanState::title_ids`]: `systemID:slug`.
    #[must_use]
    pub fn key(system_id: &str, slug: &str) -> String {
        format!("{system_id}:{slug}")
    }
}

impl Media {
    /// The map key used by [`crate::scan_state::ScanState::media_ids`]: `systemID:path`.
    #[must_use]
    pub fn key(system_id: &str, path: &str) -> String {
        format!("{system_id}:{path}")
    }
}

//! Tag Catalog Seeder (spec.md §4.2): installs canonical tag types and
//! values in one transaction at the start of every fresh index.

use crate::error::Result;
use crate::model::{Tag, TagType};
use crate::scan_state::ScanState;
use crate::store::MediaStore;
use tracing::instrument;

/// Tag types installed on every fresh index, beyond the per-platform sets
/// discovered dynamically (`rev` values are inserted lazily by the Ingest
/// Function; region/lang/dev_status/disc come pre-populated here).
const TAG_TYPES: &[&str] = &[
    "unknown",
    "extension",
    "region",
    "lang",
    "year",
    "rev",
    "disc",
    "dev_status",
    "media_type",
];

const REGIONS: &[&str] = &["us", "eu", "jp", "world", "asia", "au", "br", "ca", "cn", "fr", "de", "it", "kr", "nl", "es", "se", "gb"];
const LANGS: &[&str] = &["en", "fr", "de", "es", "it", "ja", "pt", "ru", "zh", "ko", "nl", "sv", "no", "da", "fi", "pl"];
const DEV_STATUSES: &[&str] = &["proto", "beta", "demo", "alpha", "sample"];
const MEDIA_TYPES: &[&str] = &["rom", "disc-image", "virtual"];

/// Runs in its own transaction. Idempotent: every insert is gated by a
/// scan-state lookup first, so re-running on an already-seeded store
/// performs no work and returns no error (spec.md §8 "Seed idempotence").
#[instrument(skip(store, state))]
pub async fn seed_tag_catalog<S: MediaStore>(store: &mut S, state: &mut ScanState) -> Result<()> {
    for &tag_type in TAG_TYPES {
        ensure_tag_type(store, state, tag_type).await?;
    }

    for &value in REGIONS {
        ensure_tag(store, state, "region", value).await?;
    }
    for &value in LANGS {
        ensure_tag(store, state, "lang", value).await?;
    }
    for &value in DEV_STATUSES {
        ensure_tag(store, state, "dev_status", value).await?;
    }
    for &value in MEDIA_TYPES {
        ensure_tag(store, state, "media_type", value).await?;
    }

    ensure_tag(store, state, "unknown", "unknown").await?;

    Ok(())
}

async fn ensure_tag_type<S: MediaStore>(store: &mut S, state: &mut ScanState, tag_type: &str) -> Result<i64> {
    if let Some(&dbid) = state.tag_type_ids.get(tag_type) {
        return Ok(dbid);
    }
    let dbid = state.next_tag_type_id();
    if let Err(e) = store
        .insert_tag_type(TagType {
            dbid,
            r#type: tag_type.to_string(),
        })
        .await
    {
        state.rollback_tag_type_id();
        return Err(e.into());
    }
    state.tag_type_ids.insert(tag_type.to_string(), dbid);
    Ok(dbid)
}

async fn ensure_tag<S: MediaStore>(store: &mut S, state: &mut ScanState, tag_type: &str, value: &str) -> Result<i64> {
    let key = Tag::key(tag_type, value);
    if let Some(&dbid) = state.tag_ids.get(&key) {
        return Ok(dbid);
    }

    let tag_type_dbid = *state
        .tag_type_ids
        .get(tag_type)
        .ok_or_else(|| crate::error::Error::MissingInvariant(format!("tag type '{tag_type}' not seeded")))?;

    let dbid = state.next_tag_id();
    if let Err(e) = store
        .insert_tag(Tag {
            dbid,
            tag_type_dbid,
            value: value.to_string(),
        })
        .await
    {
        state.rollback_tag_id();
        return Err(e.into());
    }
    state.tag_ids.insert(key, dbid);
    Ok(dbid)
}

/// Ensures the `extension` tag type's tag for `ext` exists, inserting it if
/// necessary. Used by the Ingest Function (spec.md §4.4 step 5) and by
/// selective re-seeding after an orphan sweep (spec.md §4.7 step 5).
pub async fn ensure_extension_tag<S: MediaStore>(store: &mut S, state: &mut ScanState, ext: &str) -> Result<i64> {
    ensure_tag(store, state, "extension", ext).await
}

/// Dynamically inserts a new `rev` tag (spec.md §4.4 step 6); `rev` values
/// are open-ended and not pre-seeded.
pub async fn ensure_revision_tag<S: MediaStore>(store: &mut S, state: &mut ScanState, value: &str) -> Result<i64> {
    ensure_tag(store, state, "rev", value).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn seeding_twice_is_a_noop() {
        let mut store = InMemoryStore::new();
        let mut state = ScanState::new();
        seed_tag_catalog(&mut store, &mut state).await.unwrap();
        let tag_count_after_first = store.tag_count();
        let tag_type_count_after_first = store.tag_type_count();

        seed_tag_catalog(&mut store, &mut state).await.unwrap();
        assert_eq!(store.tag_count(), tag_count_after_first);
        assert_eq!(store.tag_type_count(), tag_type_count_after_first);
    }

    #[tokio::test]
    async fn installs_sentinel_unknown_tag() {
        let mut store = InMemoryStore::new();
        let mut state = ScanState::new();
        seed_tag_catalog(&mut store, &mut state).await.unwrap();
        assert!(state.tag_ids.contains_key("unknown:unknown"));
    }
}

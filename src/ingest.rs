//! Ingest Function (spec.md §4.4): `add_media_path(store, state, system_id,
//! path, opts) -> (title_dbid, media_dbid)`.

use crate::error::{Error, Result};
use crate::model::{Media, MediaTag, MediaTitle, System, Tag};
use crate::parser::{self, FragmentCache, MediaPathFragments, ParseOptions};
use crate::scan_state::ScanState;
use crate::seed;
use crate::store::MediaStore;
use tracing::{instrument, warn};

/// Options threaded through to the parser (spec.md §4.1).
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOptions {
    pub no_ext: bool,
    pub strip_leading_numbers: bool,
    pub filename_tags_enabled: bool,
}

/// `(title_dbid, media_dbid)`. On error callers get `(0, 0)` so stale
/// indices cannot accidentally be used (spec.md §4.4 "Return values").
pub type IngestResult = (i64, i64);

/// Given `(system_id, path)`, emits the required rows in dependency order
/// and returns the title/media ids.
///
/// Idempotent: calling this twice for the same `(system_id, path)` within
/// one job returns the same ids and performs no second insert (spec.md §8).
#[instrument(skip(store, state, cache), fields(system_id = %system_id))]
pub async fn add_media_path<S: MediaStore>(
    store: &mut S,
    state: &mut ScanState,
    cache: &FragmentCache,
    system_id: &str,
    path: &str,
    opts: IngestOptions,
) -> Result<IngestResult> {
    let fragments = parser::parse_cached(
        &ParseOptions {
            path,
            system_id,
            no_ext: opts.no_ext,
            strip_leading_numbers: opts.strip_leading_numbers,
            filename_tags_enabled: opts.filename_tags_enabled,
        },
        cache,
    );

    let system_dbid = ensure_system(store, state, system_id).await?;
    let title_dbid = ensure_title(store, state, system_id, system_dbid, &fragments).await?;
    let media_dbid = ensure_media(store, state, system_id, system_dbid, title_dbid, &fragments).await?;

    link_tags(store, state, media_dbid, &fragments, opts.filename_tags_enabled).await?;

    Ok((title_dbid, media_dbid))
}

async fn ensure_system<S: MediaStore>(store: &mut S, state: &mut ScanState, system_id: &str) -> Result<i64> {
    if let Some(&dbid) = state.system_ids.get(system_id) {
        return Ok(dbid);
    }

    let dbid = state.next_system_id();
    if let Err(e) = store
        .insert_system(System {
            dbid,
            system_id: system_id.to_string(),
            name: system_id.to_string(),
        })
        .await
    {
        state.rollback_system_id();
        return Err(Error::Store(e));
    }
    state.system_ids.insert(system_id.to_string(), dbid);
    Ok(dbid)
}

async fn ensure_title<S: MediaStore>(
    store: &mut S,
    state: &mut ScanState,
    system_id: &str,
    system_dbid: i64,
    fragments: &MediaPathFragments,
) -> Result<i64> {
    let key = MediaTitle::key(system_id, &fragments.slug);
    if let Some(&dbid) = state.title_ids.get(&key) {
        return Ok(dbid);
    }

    let dbid = state.next_title_id();
    let title = MediaTitle {
        dbid,
        system_dbid,
        slug: fragments.slug.clone(),
        name: fragments.title.clone(),
        slug_length: i32::try_from(fragments.slug.len()).unwrap_or(i32::MAX),
        slug_word_count: parser::word_count(&fragments.title),
        secondary_slug: None,
    };

    if let Err(e) = store.insert_media_title(title).await {
        state.rollback_title_id();
        return Err(Error::Store(e));
    }
    state.title_ids.insert(key, dbid);
    Ok(dbid)
}

async fn ensure_media<S: MediaStore>(
    store: &mut S,
    state: &mut ScanState,
    system_id: &str,
    system_dbid: i64,
    title_dbid: i64,
    fragments: &MediaPathFragments,
) -> Result<i64> {
    let key = Media::key(system_id, &fragments.path);
    if let Some(&dbid) = state.media_ids.get(&key) {
        return Ok(dbid);
    }

    let dbid = state.next_media_id();
    let media = Media {
        dbid,
        path: fragments.path.clone(),
        media_title_dbid: title_dbid,
        system_dbid,
    };

    if let Err(e) = store.insert_media(media).await {
        state.rollback_media_id();
        return Err(Error::Store(e));
    }
    state.media_ids.insert(key, dbid);
    Ok(dbid)
}

async fn link_tags<S: MediaStore>(
    store: &mut S,
    state: &mut ScanState,
    media_dbid: i64,
    fragments: &MediaPathFragments,
    filename_tags_enabled: bool,
) -> Result<()> {
    if filename_tags_enabled && !fragments.ext.is_empty() {
        let tag_dbid = seed::ensure_extension_tag(store, state, &fragments.ext).await?;
        link_one(store, media_dbid, tag_dbid).await?;
    }

    for tag_kv in &fragments.tags {
        let Some((tag_type, value)) = tag_kv.split_once(':') else {
            continue;
        };

        let tag_dbid = if let Some(&dbid) = state.tag_ids.get(tag_kv) {
            Some(dbid)
        } else if tag_type == "rev" {
            Some(seed::ensure_revision_tag(store, state, value).await?)
        } else {
            warn!(tag = %tag_kv, "unknown filename tag skipped");
            None
        };

        if let Some(tag_dbid) = tag_dbid {
            link_one(store, media_dbid, tag_dbid).await?;
        }
    }

    Ok(())
}

async fn link_one<S: MediaStore>(store: &mut S, media_dbid: i64, tag_dbid: i64) -> Result<()> {
    // Duplicate MediaTag associations are silently tolerated (spec.md §4.4 step 5).
    store
        .insert_media_tag(MediaTag { media_dbid, tag_dbid })
        .await
        .map_err(Error::Store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_tag_catalog;
    use crate::store::InMemoryStore;

    async fn fresh_store() -> (InMemoryStore, ScanState, FragmentCache) {
        let mut store = InMemoryStore::new();
        let mut state = ScanState::new();
        seed_tag_catalog(&mut store, &mut state).await.unwrap();
        (store, state, FragmentCache::default())
    }

    fn opts() -> IngestOptions {
        IngestOptions {
            no_ext: false,
            strip_leading_numbers: false,
            filename_tags_enabled: true,
        }
    }

    #[tokio::test]
    async fn ingest_is_idempotent() {
        let (mut store, mut state, cache) = fresh_store().await;
        let a = add_media_path(&mut store, &mut state, &cache, "nes", "/r/nes/Mario (USA).nes", opts())
            .await
            .unwrap();
        let b = add_media_path(&mut store, &mut state, &cache, "nes", "/r/nes/Mario (USA).nes", opts())
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(store.title_count(), 1);
        assert_eq!(store.media_count(), 1);
    }

    #[tokio::test]
    async fn two_files_same_system_create_one_system_two_titles() {
        let (mut store, mut state, cache) = fresh_store().await;
        add_media_path(&mut store, &mut state, &cache, "nes", "/r/nes/Mario (USA).nes", opts())
            .await
            .unwrap();
        add_media_path(&mut store, &mut state, &cache, "nes", "/r/nes/Zelda (Japan).nes", opts())
            .await
            .unwrap();

        assert_eq!(store.system_count(), 1);
        assert_eq!(store.title_count(), 2);
        assert_eq!(store.media_count(), 2);
    }

    #[tokio::test]
    async fn extension_tag_linked_to_both_media() {
        let (mut store, mut state, cache) = fresh_store().await;
        let (_, media1) = add_media_path(&mut store, &mut state, &cache, "nes", "/r/nes/Mario (USA).nes", opts())
            .await
            .unwrap();
        let (_, media2) = add_media_path(&mut store, &mut state, &cache, "nes", "/r/nes/Zelda (Japan).nes", opts())
            .await
            .unwrap();

        let ext_tag = store.find_tag("extension", "nes").await.unwrap().unwrap();
        assert!(store.tags_for_media(media1).iter().any(|t| t.dbid == ext_tag.dbid));
        assert!(store.tags_for_media(media2).iter().any(|t| t.dbid == ext_tag.dbid));
    }

    #[tokio::test]
    async fn dynamic_revision_tag_is_created() {
        let (mut store, mut state, cache) = fresh_store().await;
        let (_, media) = add_media_path(&mut store, &mut state, &cache, "nes", "/r/nes/Mario (Rev 1).nes", opts())
            .await
            .unwrap();

        let rev_tag = store.find_tag("rev", "1").await.unwrap().unwrap();
        assert!(store.tags_for_media(media).iter().any(|t| t.dbid == rev_tag.dbid));
    }

    #[tokio::test]
    async fn duplicate_media_tag_is_tolerated() {
        let (mut store, mut state, cache) = fresh_store().await;
        let (_, media) = add_media_path(&mut store, &mut state, &cache, "nes", "/r/nes/Mario (USA).nes", opts())
            .await
            .unwrap();
        // re-ingest links the same extension tag again; must not error.
        add_media_path(&mut store, &mut state, &cache, "nes", "/r/nes/Mario (USA).nes", opts())
            .await
            .unwrap();
        let ext_tag = store.find_tag("extension", "nes").await.unwrap().unwrap();
        let links = store.tags_for_media(media).iter().filter(|t| t.dbid == ext_tag.dbid).count();
        assert_eq!(links, 1);
    }
}

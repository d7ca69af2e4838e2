//! Resume Loader (spec.md §4.5): initializes [`ScanState`] from the catalog.

use crate::error::Result;
use crate::model::Tag;
use crate::scan_state::ScanState;
use crate::store::MediaStore;
use tracing::instrument;

/// Full load: reads `MAX(dbid)` for every counter, all systems, and the
/// whole tag/tag-type vocabulary. Does NOT eagerly load titles or media
/// (spec.md §4.5 "Full").
#[instrument(skip(store, state))]
pub async fn load_scan_state<S: MediaStore>(store: &S, state: &mut ScanState) -> Result<()> {
    load_counters(store, state).await?;
    load_systems(store, state).await?;
    load_tag_vocabulary(store, state).await?;
    Ok(())
}

/// Loads one system's existing titles and media into the maps. Called
/// lazily, just before that system is re-indexed (spec.md §4.5 "Per-system").
#[instrument(skip(store, state))]
pub async fn load_system_scan_state<S: MediaStore>(store: &S, state: &mut ScanState, system_id: &str) -> Result<()> {
    for title in store.get_titles_by_system_id(system_id).await? {
        state.title_ids.insert(crate::model::MediaTitle::key(system_id, &title.slug), title.dbid);
    }
    for media in store.get_media_by_system_id(system_id).await? {
        state.media_ids.insert(crate::model::Media::key(system_id, &media.path), media.dbid);
    }
    Ok(())
}

/// Like [`load_scan_state`], but title/media maps are intentionally left
/// empty (those rows were truncated — see spec.md §4.7), and any canonical
/// tag swept by the orphan cleanup is re-seeded (spec.md §4.5 "Selective").
#[instrument(skip(store, state))]
pub async fn load_scan_state_for_selective<S: MediaStore>(store: &mut S, state: &mut ScanState, _systems_to_reindex: &[String]) -> Result<()> {
    load_counters(store, state).await?;
    load_systems(store, state).await?;
    load_tag_vocabulary(store, state).await?;
    crate::seed::seed_tag_catalog(store, state).await?;
    Ok(())
}

async fn load_counters<S: MediaStore>(store: &S, state: &mut ScanState) -> Result<()> {
    state.set_systems_index(store.get_max_system_id().await?);
    state.set_titles_index(store.get_max_title_id().await?);
    state.set_media_index(store.get_max_media_id().await?);
    state.set_tag_types_index(store.get_max_tag_type_id().await?);
    state.set_tags_index(store.get_max_tag_id().await?);
    Ok(())
}

async fn load_systems<S: MediaStore>(store: &S, state: &mut ScanState) -> Result<()> {
    for system in store.get_all_systems().await? {
        state.system_ids.insert(system.system_id, system.dbid);
    }
    Ok(())
}

async fn load_tag_vocabulary<S: MediaStore>(store: &S, state: &mut ScanState) -> Result<()> {
    let tag_types = store.get_all_tag_types().await?;
    let type_names_by_dbid: std::collections::HashMap<i64, String> =
        tag_types.iter().map(|t| (t.dbid, t.r#type.clone())).collect();

    for tag_type in tag_types {
        state.tag_type_ids.insert(tag_type.r#type, tag_type.dbid);
    }

    for tag in store.get_all_tags().await? {
        if let Some(type_name) = type_names_by_dbid.get(&tag.tag_type_dbid) {
            state.tag_ids.insert(Tag::key(type_name, &tag.value), tag.dbid);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{add_media_path, IngestOptions};
    use crate::parser::FragmentCache;
    use crate::seed::seed_tag_catalog;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn resume_continues_title_ids_after_clean_job() {
        let mut store = InMemoryStore::new();
        let mut state = ScanState::new();
        let cache = FragmentCache::default();
        seed_tag_catalog(&mut store, &mut state).await.unwrap();

        for i in 0..5 {
            add_media_path(
                &mut store,
                &mut state,
                &cache,
                "nes",
                &format!("/r/nes/Game {i}.nes"),
                IngestOptions::default(),
            )
            .await
            .unwrap();
        }

        // Simulate a fresh job reopening against the same store.
        let mut resumed_state = ScanState::new();
        load_scan_state(&store, &mut resumed_state).await.unwrap();

        let (next_title, _) = add_media_path(
            &mut store,
            &mut resumed_state,
            &cache,
            "nes",
            "/r/nes/New Game.nes",
            IngestOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(next_title, 6);
    }

    #[tokio::test]
    async fn per_system_load_does_not_duplicate_existing_title() {
        let mut store = InMemoryStore::new();
        let mut state = ScanState::new();
        let cache = FragmentCache::default();
        seed_tag_catalog(&mut store, &mut state).await.unwrap();

        add_media_path(&mut store, &mut state, &cache, "nes", "/r/nes/Mario.nes", IngestOptions::default())
            .await
            .unwrap();

        let mut new_job_state = ScanState::new();
        load_scan_state(&store, &mut new_job_state).await.unwrap();
        load_system_scan_state(&store, &mut new_job_state, "nes").await.unwrap();

        let (title_dbid, _) = add_media_path(&mut store, &mut new_job_state, &cache, "nes", "/r/nes/Mario.nes", IngestOptions::default())
            .await
            .unwrap();

        assert_eq!(title_dbid, 1);
        assert_eq!(store.title_count(), 1);
    }
}

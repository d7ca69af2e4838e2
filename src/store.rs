//! Store Interface (spec.md §6): the contract between this core and the
//! storage engine. The SQL schema's DDL and driver are external
//! collaborators — this module only defines the trait and, for tests, a
//! minimal in-memory reference implementation.

use crate::error::StoreError;
use crate::model::{Media, MediaTag, MediaTitle, System, Tag, TagType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Persisted indexing state (spec.md §6 "Persisted state").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingState {
    pub indexing_status: IndexingStatus,
    pub last_indexed_system: String,
    pub indexing_systems: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexingStatus {
    #[default]
    Empty,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl IndexingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// All `Insert*` calls accept the caller-assigned `dbid` and MUST honor it
/// verbatim; implementations MUST enforce UNIQUE on natural keys so double
/// inserts fail loudly rather than being silently ignored (spec.md §6).
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn begin_transaction(&mut self, batch_mode: bool) -> Result<(), StoreError>;
    async fn commit_transaction(&mut self) -> Result<(), StoreError>;
    async fn rollback_transaction(&mut self) -> Result<(), StoreError>;

    async fn insert_system(&mut self, system: System) -> Result<(), StoreError>;
    async fn insert_media_title(&mut self, title: MediaTitle) -> Result<(), StoreError>;
    async fn insert_media(&mut self, media: Media) -> Result<(), StoreError>;
    async fn insert_tag_type(&mut self, tag_type: TagType) -> Result<(), StoreError>;
    async fn insert_tag(&mut self, tag: Tag) -> Result<(), StoreError>;
    /// Duplicate `(media_dbid, tag_dbid)` MUST be tolerated silently (spec.md §4.4 step 5).
    async fn insert_media_tag(&mut self, media_tag: MediaTag) -> Result<(), StoreError>;

    async fn find_system_by_system_id(&self, system_id: &str) -> Result<Option<System>, StoreError>;
    async fn find_media_title(&self, system_dbid: i64, slug: &str) -> Result<Option<MediaTitle>, StoreError>;
    async fn find_tag_type(&self, tag_type: &str) -> Result<Option<TagType>, StoreError>;
    async fn find_tag(&self, tag_type: &str, value: &str) -> Result<Option<Tag>, StoreError>;

    async fn get_max_system_id(&self) -> Result<i64, StoreError>;
    async fn get_max_title_id(&self) -> Result<i64, StoreError>;
    async fn get_max_media_id(&self) -> Result<i64, StoreError>;
    async fn get_max_tag_type_id(&self) -> Result<i64, StoreError>;
    async fn get_max_tag_id(&self) -> Result<i64, StoreError>;

    async fn get_all_systems(&self) -> Result<Vec<System>, StoreError>;
    async fn get_all_tag_types(&self) -> Result<Vec<TagType>, StoreError>;
    async fn get_all_tags(&self) -> Result<Vec<Tag>, StoreError>;

    async fn get_titles_by_system_id(&self, system_id: &str) -> Result<Vec<MediaTitle>, StoreError>;
    async fn get_media_by_system_id(&self, system_id: &str) -> Result<Vec<Media>, StoreError>;

    async fn truncate_all(&mut self) -> Result<(), StoreError>;
    async fn truncate_systems(&mut self, system_ids: &[String]) -> Result<(), StoreError>;

    async fn reindex_tables(&mut self) -> Result<(), StoreError>;
    async fn vacuum(&mut self) -> Result<(), StoreError>;
    async fn update_last_generated(&mut self) -> Result<(), StoreError>;

    async fn get_indexing_state(&self) -> Result<IndexingState, StoreError>;
    async fn set_indexing_state(&mut self, state: IndexingState) -> Result<(), StoreError>;
}

/// Minimal in-memory [`MediaStore`] used by this crate's own tests. Not
/// meant for production use — real backends live outside this crate.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    systems: HashMap<i64, System>,
    titles: HashMap<i64, MediaTitle>,
    media: HashMap<i64, Media>,
    tag_types: HashMap<i64, TagType>,
    tags: HashMap<i64, Tag>,
    media_tags: std::collections::HashSet<(i64, i64)>,
    indexing_state: IndexingState,
    in_transaction: bool,
    last_generated: Option<DateTime<Utc>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    #[must_use]
    pub fn tag_type_count(&self) -> usize {
        self.tag_types.len()
    }

    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    #[must_use]
    pub fn title_count(&self) -> usize {
        self.titles.len()
    }

    #[must_use]
    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    #[must_use]
    pub fn media_tag_count(&self) -> usize {
        self.media_tags.len()
    }

    #[must_use]
    pub fn titles_for_system(&self, system_dbid: i64) -> Vec<&MediaTitle> {
        self.titles.values().filter(|t| t.system_dbid == system_dbid).collect()
    }

    #[must_use]
    pub fn media_for_title(&self, media_title_dbid: i64) -> Vec<&Media> {
        self.media.values().filter(|m| m.media_title_dbid == media_title_dbid).collect()
    }

    #[must_use]
    pub fn tags_for_media(&self, media_dbid: i64) -> Vec<&Tag> {
        self.media_tags
            .iter()
            .filter(|(m, _)| *m == media_dbid)
            .filter_map(|(_, tag_dbid)| self.tags.get(tag_dbid))
            .collect()
    }

    #[must_use]
    pub fn last_generated(&self) -> Option<DateTime<Utc>> {
        self.last_generated
    }
}

#[async_trait]
impl MediaStore for InMemoryStore {
    async fn begin_transaction(&mut self, _batch_mode: bool) -> Result<(), StoreError> {
        self.in_transaction = true;
        Ok(())
    }

    async fn commit_transaction(&mut self) -> Result<(), StoreError> {
        self.in_transaction = false;
        Ok(())
    }

    async fn rollback_transaction(&mut self) -> Result<(), StoreError> {
        self.in_transaction = false;
        Ok(())
    }

    async fn insert_system(&mut self, system: System) -> Result<(), StoreError> {
        if self.systems.values().any(|s| s.system_id == system.system_id) {
            return Err(StoreError::Duplicate(format!("system '{}'", system.system_id)));
        }
        self.systems.insert(system.dbid, system);
        Ok(())
    }

    async fn insert_media_title(&mut self, title: MediaTitle) -> Result<(), StoreError> {
        if self
            .titles
            .values()
            .any(|t| t.system_dbid == title.system_dbid && t.slug == title.slug)
        {
            return Err(StoreError::Duplicate(format!(
                "media title '{}:{}'",
                title.system_dbid, title.slug
            )));
        }
        self.titles.insert(title.dbid, title);
        Ok(())
    }

    async fn insert_media(&mut self, media: Media) -> Result<(), StoreError> {
        if self
            .media
            .values()
            .any(|m| m.system_dbid == media.system_dbid && m.path == media.path)
        {
            return Err(StoreError::Duplicate(format!("media '{}:{}'", media.system_dbid, media.path)));
        }
        self.media.insert(media.dbid, media);
        Ok(())
    }

    async fn insert_tag_type(&mut self, tag_type: TagType) -> Result<(), StoreError> {
        if self.tag_types.values().any(|t| t.r#type == tag_type.r#type) {
            return Err(StoreError::Duplicate(format!("tag type '{}'", tag_type.r#type)));
        }
        self.tag_types.insert(tag_type.dbid, tag_type);
        Ok(())
    }

    async fn insert_tag(&mut self, tag: Tag) -> Result<(), StoreError> {
        if self
            .tags
            .values()
            .any(|t| t.tag_type_dbid == tag.tag_type_dbid && t.value == tag.value)
        {
            return Err(StoreError::Duplicate(format!("tag '{}:{}'", tag.tag_type_dbid, tag.value)));
        }
        self.tags.insert(tag.dbid, tag);
        Ok(())
    }

    async fn insert_media_tag(&mut self, media_tag: MediaTag) -> Result<(), StoreError> {
        // Duplicates tolerated silently, per spec.md §4.4 step 5.
        self.media_tags.insert((media_tag.media_dbid, media_tag.tag_dbid));
        Ok(())
    }

    async fn find_system_by_system_id(&self, system_id: &str) -> Result<Option<System>, StoreError> {
        Ok(self.systems.values().find(|s| s.system_id == system_id).cloned())
    }

    async fn find_media_title(&self, system_dbid: i64, slug: &str) -> Result<Option<MediaTitle>, StoreError> {
        Ok(self
            .titles
            .values()
            .find(|t| t.system_dbid == system_dbid && t.slug == slug)
            .cloned())
    }

    async fn find_tag_type(&self, tag_type: &str) -> Result<Option<TagType>, StoreError> {
        Ok(self.tag_types.values().find(|t| t.r#type == tag_type).cloned())
    }

    async fn find_tag(&self, tag_type: &str, value: &str) -> Result<Option<Tag>, StoreError> {
        let Some(tt) = self.tag_types.values().find(|t| t.r#type == tag_type) else {
            return Ok(None);
        };
        Ok(self
            .tags
            .values()
            .find(|t| t.tag_type_dbid == tt.dbid && t.value == value)
            .cloned())
    }

    async fn get_max_system_id(&self) -> Result<i64, StoreError> {
        Ok(self.systems.keys().copied().max().unwrap_or(0))
    }

    async fn get_max_title_id(&self) -> Result<i64, StoreError> {
        Ok(self.titles.keys().copied().max().unwrap_or(0))
    }

    async fn get_max_media_id(&self) -> Result<i64, StoreError> {
        Ok(self.media.keys().copied().max().unwrap_or(0))
    }

    async fn get_max_tag_type_id(&self) -> Result<i64, StoreError> {
        Ok(self.tag_types.keys().copied().max().unwrap_or(0))
    }

    async fn get_max_tag_id(&self) -> Result<i64, StoreError> {
        Ok(self.tags.keys().copied().max().unwrap_or(0))
    }

    async fn get_all_systems(&self) -> Result<Vec<System>, StoreError> {
        Ok(self.systems.values().cloned().collect())
    }

    async fn get_all_tag_types(&self) -> Result<Vec<TagType>, StoreError> {
        Ok(self.tag_types.values().cloned().collect())
    }

    async fn get_all_tags(&self) -> Result<Vec<Tag>, StoreError> {
        Ok(self.tags.values().cloned().collect())
    }

    async fn get_titles_by_system_id(&self, system_id: &str) -> Result<Vec<MediaTitle>, StoreError> {
        let Some(system) = self.systems.values().find(|s| s.system_id == system_id) else {
            return Ok(Vec::new());
        };
        Ok(self.titles.values().filter(|t| t.system_dbid == system.dbid).cloned().collect())
    }

    async fn get_media_by_system_id(&self, system_id: &str) -> Result<Vec<Media>, StoreError> {
        let Some(system) = self.systems.values().find(|s| s.system_id == system_id) else {
            return Ok(Vec::new());
        };
        Ok(self.media.values().filter(|m| m.system_dbid == system.dbid).cloned().collect())
    }

    async fn truncate_all(&mut self) -> Result<(), StoreError> {
        self.systems.clear();
        self.titles.clear();
        self.media.clear();
        self.media_tags.clear();
        // TagTypes and Tags are left intact, per spec.md §4.7 "Full truncate".
        Ok(())
    }

    async fn truncate_systems(&mut self, system_ids: &[String]) -> Result<(), StoreError> {
        let targets: Vec<i64> = self
            .systems
            .values()
            .filter(|s| system_ids.contains(&s.system_id))
            .map(|s| s.dbid)
            .collect();

        let removed_titles: Vec<i64> = self
            .titles
            .iter()
            .filter(|(_, t)| targets.contains(&t.system_dbid))
            .map(|(dbid, _)| *dbid)
            .collect();
        let removed_media: Vec<i64> = self
            .media
            .iter()
            .filter(|(_, m)| targets.contains(&m.system_dbid))
            .map(|(dbid, _)| *dbid)
            .collect();

        self.media.retain(|dbid, _| !removed_media.contains(dbid));
        self.media_tags.retain(|(media_dbid, _)| !removed_media.contains(media_dbid));
        self.titles.retain(|dbid, _| !removed_titles.contains(dbid));
        self.systems.retain(|dbid, _| !targets.contains(dbid));

        // Orphan sweep: drop any Tag no longer referenced by a MediaTag.
        let referenced: std::collections::HashSet<i64> = self.media_tags.iter().map(|(_, tag_dbid)| *tag_dbid).collect();
        self.tags.retain(|dbid, _| referenced.contains(dbid));

        Ok(())
    }

    async fn reindex_tables(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn vacuum(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn update_last_generated(&mut self) -> Result<(), StoreError> {
        self.last_generated = Some(Utc::now());
        Ok(())
    }

    async fn get_indexing_state(&self) -> Result<IndexingState, StoreError> {
        Ok(self.indexing_state.clone())
    }

    async fn set_indexing_state(&mut self, state: IndexingState) -> Result<(), StoreError> {
        self.indexing_state = state;
        Ok(())
    }
}

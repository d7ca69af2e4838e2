//! Truncation Sub-protocol (spec.md §4.7).

use crate::error::Result;
use crate::store::MediaStore;
use tracing::instrument;

/// Whether a requested re-index covers every known system (full truncate)
/// or a subset (selective truncate) (spec.md §4.6 "Truncation decision").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationStrategy {
    Full,
    Selective,
}

/// Compares the (sorted) requested system set against every system known to
/// the store.
#[must_use]
pub fn decide_strategy(requested: &[String], all_known: &[String]) -> TruncationStrategy {
    let mut requested_sorted = requested.to_vec();
    let mut known_sorted = all_known.to_vec();
    requested_sorted.sort();
    known_sorted.sort();

    if requested_sorted == known_sorted {
        TruncationStrategy::Full
    } else {
        TruncationStrategy::Selective
    }
}

/// Full truncate: removes everything from the media-catalog tables; leaves
/// TagTypes and canonical Tags intact (spec.md §4.7).
#[instrument(skip(store))]
pub async fn truncate_all<S: MediaStore>(store: &mut S) -> Result<()> {
    store.truncate_all().await?;
    Ok(())
}

/// Selective truncate for system set `requested`, in the single-transaction
/// sequence spec.md §4.7 requires: Media, MediaTitles, Systems, then an
/// orphan-Tag sweep. TagTypes are never deleted.
#[instrument(skip(store))]
pub async fn truncate_systems<S: MediaStore>(store: &mut S, requested: &[String]) -> Result<()> {
    store.truncate_systems(requested).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_when_sets_match() {
        let requested = vec!["nes".to_string(), "snes".to_string()];
        let known = vec!["snes".to_string(), "nes".to_string()];
        assert_eq!(decide_strategy(&requested, &known), TruncationStrategy::Full);
    }

    #[test]
    fn selective_when_subset() {
        let requested = vec!["nes".to_string()];
        let known = vec!["nes".to_string(), "snes".to_string()];
        assert_eq!(decide_strategy(&requested, &known), TruncationStrategy::Selective);
    }
}

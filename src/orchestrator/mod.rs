//! Indexing Orchestrator (spec.md §4.6): drives one indexing job end to
//! end — truncation decision, resume decision, batched commits, progress
//! reporting, cancellation, and failure handling.

pub mod progress;

pub use progress::{NoopProgress, ProgressEvent, ProgressReporter};

use crate::error::{Error, Result};
use crate::ingest::{self, IngestOptions};
use crate::parser::FragmentCache;
use crate::resume;
use crate::scan_state::ScanState;
use crate::scanner::{Launcher, ScanResult};
use crate::store::{IndexingState, IndexingStatus, MediaStore};
use crate::truncate::{self, TruncationStrategy};
use itertools::Itertools;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Number of files indexed between periodic commits within a single system
/// (spec.md §2 "periodic commit"; named after the teacher's
/// `indexer::BATCH_SIZE`).
pub const BATCH_SIZE: usize = 1000;

/// Single entry point: `run_index(store, systems, launchers, options,
/// progress, cancel) -> files_indexed`.
#[instrument(skip(store, launchers, progress, cancel))]
pub async fn run_index<S: MediaStore>(
    store: &mut S,
    requested_systems: Vec<String>,
    launchers: &[Launcher],
    ingest_options: IngestOptions,
    progress: &dyn ProgressReporter,
    cancel: &CancellationToken,
) -> Result<u64> {
    let persisted = store.get_indexing_state().await?;

    let resuming = persisted.indexing_status == IndexingStatus::Running
        && same_system_set(&persisted.indexing_systems, &requested_systems)
        && requested_systems.contains(&persisted.last_indexed_system)
        && !persisted.last_indexed_system.is_empty();

    let mut state = ScanState::new();
    let cache = FragmentCache::default();

    if resuming {
        info!(resume_system = %persisted.last_indexed_system, "resuming interrupted indexing job");
        // Reads only: the vocabulary and system rows a resumed job needs
        // were committed by a prior attempt's own transactions, so there is
        // nothing to wrap here.
        if let Err(e) = prepare_resume(store, &mut state, &persisted.last_indexed_system).await {
            return fail_out(store, &requested_systems, &persisted.last_indexed_system, e).await;
        }
    } else {
        info!("starting fresh indexing job");
        let all_known: Vec<String> = store
            .get_all_systems()
            .await?
            .into_iter()
            .map(|s| s.system_id)
            .collect();
        let strategy = truncate::decide_strategy(&requested_systems, &all_known);
        // Truncation and tag-catalog seeding commit in their own transaction,
        // separate from the per-system batch transaction below. This way a
        // crash partway through the first system still leaves a durably
        // seeded vocabulary behind for the next resume attempt to find.
        store.begin_transaction(true).await?;
        if let Err(e) = prepare_fresh_start(store, &mut state, strategy, &requested_systems).await {
            return fail_out(store, &requested_systems, "", e).await;
        }
        if let Err(e) = store.commit_transaction().await {
            return fail_out(store, &requested_systems, "", Error::Store(e)).await;
        }
    }

    store.begin_transaction(true).await?;

    store
        .set_indexing_state(IndexingState {
            indexing_status: IndexingStatus::Running,
            last_indexed_system: if resuming {
                persisted.last_indexed_system.clone()
            } else {
                String::new()
            },
            indexing_systems: requested_systems.clone(),
        })
        .await?;

    let start_index = if resuming {
        requested_systems
            .iter()
            .position(|s| s == &persisted.last_indexed_system)
            .unwrap_or(0)
    } else {
        0
    };

    let any_launchers: Vec<&Launcher> = launchers.iter().filter(|l| l.is_any()).collect();
    let all_known_now: Vec<String> = store
        .get_all_systems()
        .await?
        .into_iter()
        .map(|s| s.system_id)
        .collect();

    // "Any" scanners run against every known system (spec.md §4.8), which
    // may include systems outside the originally requested set; those grow
    // the step count dynamically (spec.md §9).
    let mut systems_to_process = requested_systems.clone();
    let mut any_only_systems = Vec::new();
    if !any_launchers.is_empty() {
        for system_id in &all_known_now {
            if !systems_to_process.contains(system_id) {
                systems_to_process.push(system_id.clone());
                any_only_systems.push(system_id.clone());
            }
        }
    }

    let mut total_steps = systems_to_process.len() as u64;
    let mut files_indexed: u64 = 0;
    let mut last_completed_system = if resuming {
        persisted.last_indexed_system.clone()
    } else {
        String::new()
    };

    for (idx, system_id) in systems_to_process.iter().enumerate().skip(start_index) {
        if cancel.is_cancelled() {
            return cancel_out(store, &requested_systems, &last_completed_system).await;
        }

        emit_progress(
            progress,
            ProgressEvent {
                system_id: system_id.clone(),
                step: idx as u64,
                total_steps,
                files_so_far: files_indexed,
            },
        );

        let only_any = any_only_systems.contains(system_id);
        let bound_launchers: Vec<&Launcher> = if only_any {
            Vec::new()
        } else {
            launchers
                .iter()
                .filter(|l| !l.is_any() && l.system_id == *system_id)
                .collect()
        };

        let mut results = match collect_results(system_id, &bound_launchers, &any_launchers).await {
            Ok(r) => r,
            Err(e) => return fail_out(store, &requested_systems, &last_completed_system, e).await,
        };
        // Two launchers may attribute the same file to this system (spec.md
        // §8 scenario 6); dedup by path before ingest so `files_indexed`
        // counts distinct media, not distinct scan results.
        let mut seen_paths = std::collections::HashSet::with_capacity(results.len());
        results.retain(|r| seen_paths.insert(r.path.clone()));

        // Chunk into BATCH_SIZE-sized groups, committing after each (spec.md
        // §2 "periodic commit"), the way the teacher's indexer job batches
        // its own FilePath inserts with `itertools::Itertools::chunks`.
        let batches: Vec<Vec<ScanResult>> = results.into_iter().chunks(BATCH_SIZE).into_iter().map(Iterator::collect).collect();

        for batch in &batches {
            for result in batch {
                if cancel.is_cancelled() {
                    return cancel_out(store, &requested_systems, &last_completed_system).await;
                }

                match ingest::add_media_path(store, &mut state, &cache, system_id, &result.path, ingest_options).await {
                    Ok(_) => files_indexed += 1,
                    Err(e) => {
                        return fail_out(store, &requested_systems, &last_completed_system, e).await;
                    }
                }
            }

            if let Err(e) = store.commit_transaction().await {
                return fail_out(store, &requested_systems, &last_completed_system, Error::Store(e)).await;
            }
            if let Err(e) = store.begin_transaction(true).await {
                return fail_out(store, &requested_systems, &last_completed_system, Error::Store(e)).await;
            }
            emit_progress(
                progress,
                ProgressEvent {
                    system_id: system_id.clone(),
                    step: idx as u64,
                    total_steps,
                    files_so_far: files_indexed,
                },
            );
        }

        if let Err(e) = store.commit_transaction().await {
            return fail_out(store, &requested_systems, &last_completed_system, Error::Store(e)).await;
        }
        state.flush_per_system_maps();
        last_completed_system = system_id.clone();

        store
            .set_indexing_state(IndexingState {
                indexing_status: IndexingStatus::Running,
                last_indexed_system: last_completed_system.clone(),
                indexing_systems: requested_systems.clone(),
            })
            .await?;

        emit_progress(
            progress,
            ProgressEvent {
                system_id: system_id.clone(),
                step: idx as u64 + 1,
                total_steps,
                files_so_far: files_indexed,
            },
        );

        if idx + 1 == systems_to_process.len() {
            break;
        }
        if let Err(e) = store.begin_transaction(true).await {
            return fail_out(store, &requested_systems, &last_completed_system, Error::Store(e)).await;
        }
        // total_steps is recomputed here in case an "any" launcher run in
        // this iteration surfaced brand-new systems for the next pass.
        total_steps = total_steps.max(systems_to_process.len() as u64);
    }

    store.reindex_tables().await?;
    store.vacuum().await?;
    store.update_last_generated().await?;
    store
        .set_indexing_state(IndexingState {
            indexing_status: IndexingStatus::Completed,
            last_indexed_system: String::new(),
            indexing_systems: requested_systems,
        })
        .await?;

    Ok(files_indexed)
}

/// Forwards an event to the caller's [`ProgressReporter`] and, at trace
/// level, logs its JSON form — the shape an IPC/UI boundary would actually
/// send over the wire.
fn emit_progress(progress: &dyn ProgressReporter, event: ProgressEvent) {
    if let Ok(json) = serde_json::to_string(&event) {
        tracing::trace!(event = %json, "progress");
    }
    progress.on_progress(event);
}

async fn collect_results(system_id: &str, bound: &[&Launcher], any: &[&Launcher]) -> Result<Vec<ScanResult>> {
    let mut results = Vec::new();
    let mut prior: Vec<ScanResult> = Vec::new();
    for launcher in bound.iter().chain(any.iter()) {
        let found = launcher.collect(system_id, &prior).await;
        prior = found.clone();
        results.extend(found);
    }
    Ok(results)
}

async fn prepare_fresh_start<S: MediaStore>(
    store: &mut S,
    state: &mut ScanState,
    strategy: TruncationStrategy,
    requested: &[String],
) -> Result<()> {
    match strategy {
        TruncationStrategy::Full => {
            truncate::truncate_all(store).await?;
            // TagTypes/Tags survive a full truncate; load the surviving
            // vocabulary before seeding so re-seeding stays idempotent.
            resume::load_scan_state(store, state).await?;
            crate::seed::seed_tag_catalog(store, state).await?;
        }
        TruncationStrategy::Selective => {
            truncate::truncate_systems(store, requested).await?;
            resume::load_scan_state_for_selective(store, state, requested).await?;
        }
    }
    Ok(())
}

async fn prepare_resume<S: MediaStore>(store: &mut S, state: &mut ScanState, last_indexed_system: &str) -> Result<()> {
    resume::load_scan_state(store, state).await?;
    resume::load_system_scan_state(store, state, last_indexed_system).await?;
    Ok(())
}

fn same_system_set(a: &[String], b: &[String]) -> bool {
    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    a_sorted.sort();
    b_sorted.sort();
    a_sorted == b_sorted
}

async fn cancel_out<S: MediaStore>(store: &mut S, requested: &[String], last_indexed_system: &str) -> Result<u64> {
    warn!("indexing job cancelled");
    store.rollback_transaction().await.ok();
    store
        .set_indexing_state(IndexingState {
            indexing_status: IndexingStatus::Cancelled,
            last_indexed_system: last_indexed_system.to_string(),
            indexing_systems: requested.to_vec(),
        })
        .await
        .ok();
    Err(Error::Cancelled)
}

async fn fail_out<S: MediaStore>(store: &mut S, requested: &[String], last_indexed_system: &str, err: Error) -> Result<u64> {
    warn!(error = %err, "indexing job failed");
    store.rollback_transaction().await.ok();
    store
        .set_indexing_state(IndexingState {
            indexing_status: IndexingStatus::Failed,
            last_indexed_system: last_indexed_system.to_string(),
            indexing_systems: requested.to_vec(),
        })
        .await
        .ok();
    Err(err)
}

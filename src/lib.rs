//! Resumable, transactional media-indexing pipeline core.
//!
//! Discovers media files across heterogeneous "systems" (retro-gaming
//! platforms, virtual content sources), parses identifying metadata from
//! each file path, and populates a normalized relational catalog suitable
//! for fast title lookup and fuzzy search.
//!
//! Filesystem walking beyond the bundled reference launcher, the concrete
//! SQL schema, and the CLI/config/IPC layers are external collaborators —
//! see [`store::MediaStore`] and [`scanner::Launcher`] for the seams.

pub mod error;
pub mod ingest;
pub mod model;
pub mod orchestrator;
pub mod parser;
pub mod resume;
pub mod scan_state;
pub mod scanner;
pub mod seed;
pub mod store;
pub mod truncate;
pub mod vpath;

pub use error::{Error, NonCriticalError, Result};
pub use ingest::{add_media_path, IngestOptions};
pub use orchestrator::{run_index, NoopProgress, ProgressEvent, ProgressReporter};
pub use scan_state::ScanState;
pub use store::MediaStore;

//! Trace replay.
//!
//! Loads micro-op traces from disk and drives one engine per core over them.

/// JSON-lines micro-op trace loader.
pub mod loader;

/// Parallel multi-core replay over shared caches.
pub mod multicore;

pub use loader::TraceLoader;
pub use multicore::{Batch, CoreRun, replay, run_cores};

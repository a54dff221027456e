//! # Unit Components
//!
//! Tests grouped by the part of the scheduler they exercise.

/// In-order retirement, instruction counting and squashed micro-ops.
pub mod commit;


/// Issue-port contention and the issue-width cap.
pub mod contention;

/// Producer/consumer wiring and wake-up timing.
pub mod dependencies;


/// Instruction-cache stalls, branch mispredictions and dispatch backpressure.
pub mod frontend;



/// Multi-core replay over shared caches.
pub mod multicore;

/// Skip-ahead equivalence and general scheduling properties.
pub mod properties;


/// Engine plus tracer test context.
pub mod harness;

/// Collaborator doubles.
pub mod mocks;

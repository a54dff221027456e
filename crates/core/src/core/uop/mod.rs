//! Micro-operation model.
//!
//! This module defines what flows through the scheduler. It provides:
//! 1. **Templates:** [`MicroOp`], the shared, immutable description of a decoded operation.
//! 2. **Instances:** [`DynamicMicroOp`], one executed instance with its bounded dependency list.
//! 3. **Classification:** [`HitWhere`] memory-level results and [`PortClass`] issue classes.

mod dynamic;
mod hit_where;
mod micro_op;

pub use dynamic::{ArchPayload, BranchInfo, DependencyList, DynamicMicroOp, MAX_DEPENDENCIES};
pub use hit_where::HitWhere;
pub use micro_op::{MicroOp, PortClass, UopKind, UopSubtype};

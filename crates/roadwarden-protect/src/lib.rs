//! Road connectivity and protection queries.
//!
//! [`RoadFill`] discovers the contiguous road region around a seed block
//! via bounded breadth-first flood-fill. [`RoadManager`] ties the fill,
//! the material classifier, and a block store together into the operation
//! surface the rest of the system calls: protect/unprotect from a seed,
//! per-tick road-below checks, and bulk chunk removal.

pub mod fill;
pub mod manager;

pub use fill::{FillConfig, FillResult, RoadFill};
pub use manager::{ProtectConfig, ProtectOutcome, RoadManager};

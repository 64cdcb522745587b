// State definitions and transition guards for items and lists.
//
// Status changes are plain field writes; the guards decide whether a
// transition is allowed given the surrounding graph (item dependencies, list
// children) before anything is written.

pub mod guards;
pub mod states;

// Re-export main types for convenient access
pub use guards::{ItemDependenciesGuard, ListArchiveGuard, StateGuard};
pub use states::{ItemStatus, ListStatus};

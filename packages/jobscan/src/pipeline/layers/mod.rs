//! Extraction layers, in execution order.
//!
//! Each layer only offers values for fields that are still open; the
//! context decides what freezes.

pub(super) mod enrichment;
pub(super) mod heuristic;
pub(super) mod post_process;
pub(super) mod repair;
pub(super) mod selectors;
pub(super) mod structured;

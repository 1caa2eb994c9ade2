//! Collaborator seams.
//!
//! Both collaborators are optional: the pipeline runs without an enricher
//! and the detector runs without privileged shadow root access. The engine
//! handlers run the built-in autofill core unless given another.

pub mod accessor;
pub mod autofill;
pub mod enricher;

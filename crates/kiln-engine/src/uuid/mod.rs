//! Process-unique 64-bit identifiers.
//!
//! Assets and contexts draw from the same identifier space. Use the free functions
//! [`generate`] and [`exists`] for process-wide identifiers; a standalone
//! [`UuidGenerator`] is available for isolated bookkeeping (tools, tests).

mod generator;

pub use generator::{Uuid, UuidGenerator, exists, generate};

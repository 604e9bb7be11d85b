//! Post-passes over a built hlslc program.
//!
//! Runs after the front-end: instruction indexing (with loop-exit
//! annotation), variable liveness, and optional structural validation.

mod index;
mod liveness;
mod validate;

pub use index::{index_program, FIRST_INSTR_INDEX};
pub use liveness::compute_liveness;
pub use validate::collect_violations;

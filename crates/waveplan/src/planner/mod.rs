//! Wave planning engine.
//!
//! Converts a community partition of application instances into a fixed-size
//! sequence of migration waves per environment, then repairs the assignment
//! against sequencing, colocation, and placement constraints. The repair loop
//! is a bounded best-effort heuristic: residual violations are reported by the
//! validator, never raised as errors.

pub mod assignment;
pub mod distribute;
pub mod equalize;
pub mod pipeline;
pub mod repair;
pub mod sanitize;
pub mod validate;

//! Inspection drivers: detect each project's manifest format, run the
//! matching resolution strategy, and serialize the results.

pub mod project;
pub mod result;
pub mod solution;
pub mod writer;

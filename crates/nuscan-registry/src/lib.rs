//! Package registry metadata protocol: endpoint configuration, V3
//! registration index parsing, and best-match package search.

pub mod client;
pub mod metadata;
pub mod search;
pub mod source;

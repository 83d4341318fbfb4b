//! Core data types for the nuscan dependency inspector: NuGet version
//! parsing and range algebra, package identities, target framework
//! monikers, lock document models, project file parsing, and settings.

pub mod config;
pub mod framework;
pub mod lockfile;
pub mod package;
pub mod project;
pub mod solution;
pub mod version;

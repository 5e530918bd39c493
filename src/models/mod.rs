//! Data models for hosts, groups and properties

pub mod group;
pub mod host;
pub mod property;

pub use group::*;
pub use host::*;
pub use property::*;

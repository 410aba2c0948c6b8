//! Core data types for the Satchel plugin manager: project configuration,
//! lock files, plugin install requests, and version constraint helpers.

pub mod config;
pub mod lockfile;
pub mod plugin;
pub mod version;

//! Core module - vault storage and the small parsers built on it
//!
//! Contains the data structures shared by the server and the CLI client.

pub mod conversation;
pub mod frontmatter;
pub mod path;
pub mod vault;

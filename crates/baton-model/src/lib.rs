//! Plain data types shared by the baton runner crates.
//!
//! Nothing in here executes work: the types describe how a run is configured,
//! how it ends and what happened to every submitted task.

mod domain;
pub use domain::*;

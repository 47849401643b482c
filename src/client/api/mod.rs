//! API trait definitions
//!
//! - [`TeamsApi`] - Team collection operations

mod team;

pub use team::TeamsApi;

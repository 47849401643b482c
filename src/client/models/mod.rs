//! Teams API data models

mod team;

pub use team::{Team, TeamCreate};

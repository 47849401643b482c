//! Teams API client
//!
//! - [`TeamsApi`] - the team collection operations
//! - [`TeamsClient`] - HTTP implementation with bearer token attachment
//! - [`ReactiveReauth`] - background login started on 401 responses

pub mod api;
#[cfg(test)]
pub mod mock;
pub mod models;
pub mod reauth;
pub mod teams;

pub use api::TeamsApi;
pub use models::{Team, TeamCreate};
pub use reauth::ReactiveReauth;
pub use teams::TeamsClient;

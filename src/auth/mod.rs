//! Authentication: identity broker, session cache and token claims
//!
//! - [`IdentityBroker`] - the operations consumed from the identity provider
//! - [`KeycloakBroker`] - OpenID Connect implementation for Keycloak realms
//! - [`SessionManager`] - cached login state and token refresh policy
//! - [`claims`] - display-only decoding of bearer token payloads

pub mod broker;
pub mod claims;
pub mod keycloak;
pub mod session;

#[cfg(test)]
pub mod fixtures;
#[cfg(test)]
pub mod mock;

pub use broker::IdentityBroker;
pub use claims::{TokenInfo, UserClaims};
pub use keycloak::KeycloakBroker;
pub use session::SessionManager;

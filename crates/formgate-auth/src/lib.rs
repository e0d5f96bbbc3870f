//! # formgate-auth
//!
//! Server-to-server authentication for the formgate edge proxy.
//!
//! Anonymous visitors never hold real CMS credentials. When the proxy sees an
//! anonymous sentinel it asks the [`TokenProvider`] for an access token, which
//! is obtained through the OAuth 2.0 client-credentials grant against the
//! identity provider advertised by OpenID Connect discovery.
//!
//! ## Modules
//!
//! - [`cache`] - Keyed cache that coalesces concurrent identical fetches
//! - [`config`] - Default identity provider and client credentials
//! - [`discovery`] - `.well-known/openid-configuration` client and cache
//! - [`oidc`] - Discovery document type
//! - [`token`] - Client-credentials token client and memoizing provider
//! - [`identity`] - Ready-made anonymous identity for form clients
//! - [`error`] - Error types

pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod identity;
pub mod oidc;
pub mod token;

pub use cache::CoalescingCache;
pub use config::ClientCredentialsConfig;
pub use discovery::{DiscoveryCache, OidcDiscoveryClient};
pub use error::{AuthError, DiscoveryError};
pub use identity::{AnonymousIdentity, anonymous_identity};
pub use oidc::OidcConfiguration;
pub use token::{AccessToken, TokenKey, TokenProvider};

/// Type alias for token acquisition results.
pub type AuthResult<T> = Result<T, AuthError>;

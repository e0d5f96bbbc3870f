//! Form proxy between browsers and the CMS forms API.
//!
//! ```text
//! ┌──────────────┐
//! │   Browser    │  Authorization: Bearer undefined
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │  RequestFilter   │  (optional, 400 on reject)
//! └──────┬───────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │  ProxyGateway    │  sentinel -> client-credentials token,
//! │                  │  HeaderSelector, query cleanup
//! └──────┬───────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │  CMS backend     │  <origin><base_path><path>
//! └──────────────────┘
//! ```

pub mod error;
pub mod filter;
pub mod proxy;

pub use error::GatewayError;
pub use filter::{DefaultHeaderSelector, HeaderSelector, RequestFilter};
pub use proxy::{ProxyGateway, ProxyGatewayBuilder};

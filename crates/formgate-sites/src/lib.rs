//! # formgate-sites
//!
//! Multi-tenant site resolution for the formgate edge proxy.
//!
//! A CMS installation hosts several sites, each registered under one or more
//! host names (or the `*` wildcard) and offering one or more languages. Given
//! an inbound host and path, [`SiteResolver`] picks the tenant site and works
//! out its default and current locale.
//!
//! Site definitions are read from a [`SiteSource`]; [`GraphClient`] reads them
//! from the content graph. Nothing is cached: every resolution re-queries.

pub mod error;
pub mod graph;
pub mod resolver;
pub mod source;
pub mod types;

pub use error::SiteQueryError;
pub use graph::{GraphClient, GraphConfig};
pub use resolver::{ResolvedSite, SiteResolver, resolve};
pub use source::{SiteSource, StaticSiteSource};
pub use types::{HostLanguage, HostType, SiteDefinition, SiteDefinitionPage, SiteHost, SiteLanguage};

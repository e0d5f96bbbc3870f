//! Site definition model as returned by the content index.
//!
//! Field names follow the content graph schema (`PascalCase`). Nullable
//! fields are modelled as `Option` so partially populated sites still parse.

use serde::{Deserialize, Deserializer, Serialize};

/// Host name that matches any request host.
pub const WILDCARD_HOST: &str = "*";

/// One page of site definitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteDefinitionPage {
    /// Total number of sites known to the index.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    /// The site definitions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<SiteDefinition>,
}

/// A tenant site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiteDefinition {
    /// Site identifier.
    pub id: String,
    /// Site display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Languages enabled on the site, in configured order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<SiteLanguage>,
    /// Host names the site answers to, in configured order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub hosts: Vec<SiteHost>,
}

impl SiteDefinition {
    /// Returns the first host entry whose name equals `host` exactly.
    #[must_use]
    pub fn host(&self, host: &str) -> Option<&SiteHost> {
        self.hosts.iter().find(|h| h.name == host)
    }

    /// Returns the wildcard host entry, if the site has one.
    #[must_use]
    pub fn wildcard_host(&self) -> Option<&SiteHost> {
        self.host(WILDCARD_HOST)
    }

    /// Returns the master language, or the first language if none is flagged.
    #[must_use]
    pub fn master_language(&self) -> Option<&SiteLanguage> {
        self.languages
            .iter()
            .find(|l| l.is_master_language == Some(true))
            .or_else(|| self.languages.first())
    }
}

/// A language enabled on a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiteLanguage {
    /// Whether this is the site's master language.
    #[serde(default)]
    pub is_master_language: Option<bool>,
    /// Path segment selecting this language, e.g. `fr` for `/fr/...`.
    #[serde(default)]
    pub url_segment: Option<String>,
    /// Human readable language name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    /// Locale name, e.g. `en` or `fr-CA`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Kind of host registration.
///
/// Unrecognized kinds, such as redirect registrations, parse as
/// [`HostType::Other`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostType {
    #[default]
    Undefined,
    Primary,
    Edit,
    #[serde(other)]
    Other,
}

/// A host name registered for a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiteHost {
    /// Host name (with port when non-default) or [`WILDCARD_HOST`].
    pub name: String,
    /// Registration type.
    #[serde(default, rename = "Type")]
    pub host_type: Option<HostType>,
    /// Language bound to requests arriving on this host.
    #[serde(default)]
    pub language: Option<HostLanguage>,
}

/// Language link attached to a host entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostLanguage {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl HostLanguage {
    /// Returns the locale name when it is present and non-empty.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

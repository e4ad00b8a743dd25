//! Data models for repositories and releases as returned by the GitHub REST API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Displayed wherever a value is missing (language, release, push date)
pub const UNAVAILABLE: &str = "N/A";

/// Owner of a repository (only the login is consumed)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Owner {
    pub login: String,
}

/// A repository record from the listing endpoint.
///
/// Read-only after loading, apart from `latest_release` which the
/// secondary lookup fills in.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub owner: Owner,
    #[serde(default)]
    pub description: Option<String>,
    /// The "Website" field on GitHub
    #[serde(default)]
    pub homepage: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub default_branch: String,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub latest_release: Option<Release>,
}

impl Repository {
    /// Release tag, or the unavailable sentinel when no release is known
    pub fn release_tag(&self) -> &str {
        self.latest_release
            .as_ref()
            .map(|r| r.tag_name.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(UNAVAILABLE)
    }

    /// Website when set, otherwise the repository page
    pub fn link(&self) -> &str {
        match self.homepage.as_deref().map(str::trim) {
            Some(home) if !home.is_empty() => home,
            _ => &self.html_url,
        }
    }
}

/// The latest published release of a repository
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Outcome of a release lookup. Absence is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseLookup {
    Found(Release),
    Absent,
}

impl ReleaseLookup {
    pub fn into_option(self) -> Option<Release> {
        match self {
            ReleaseLookup::Found(release) => Some(release),
            ReleaseLookup::Absent => None,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_repository(name: &str) -> Repository {
    Repository {
        id: 1,
        name: name.to_string(),
        owner: Owner {
            login: "likahang".to_string(),
        },
        description: None,
        homepage: None,
        html_url: format!("https://github.com/likahang/{name}"),
        language: None,
        private: false,
        default_branch: "main".to_string(),
        pushed_at: None,
        latest_release: None,
    }
}

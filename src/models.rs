use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete catalog entry. Only built once every field has resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "ref")]
    pub reference: String,
    pub title: String,
    pub url: String,
    pub price: u64,
    pub beds: u32,
    pub area: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    NotOwnedByAgent,
    MissingArea,
    MissingTitle,
    MissingPrice,
    MissingBedsRequiredForResidential,
    MissingRef,
    DetailFetchFailed,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NotOwnedByAgent => "not_owned_by_agent",
            RejectReason::MissingArea => "missing_area",
            RejectReason::MissingTitle => "missing_title",
            RejectReason::MissingPrice => "missing_price",
            RejectReason::MissingBedsRequiredForResidential => {
                "missing_beds_required_for_residential"
            }
            RejectReason::MissingRef => "missing_ref",
            RejectReason::DetailFetchFailed => "detail_fetch_failed",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the diagnostics log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub url: String,
    pub reason: RejectReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
}

impl Rejection {
    pub fn new(url: &str, reason: RejectReason) -> Self {
        Self {
            url: url.to_string(),
            reason,
            property_type: None,
        }
    }

    pub fn with_property_type(mut self, property_type: &str) -> Self {
        self.property_type = Some(property_type.to_string());
        self
    }
}

/// Bedroom policy bucket for a property-type URL slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyCategory {
    /// Dwellings: a bedroom count must be found on the page.
    Residential,
    /// Land and commercial stock: missing bedrooms resolve to 0.
    NonResidential,
    /// Anything else. Treated like `Residential` by the validator.
    Unknown,
}

const RESIDENTIAL_TYPES: &[&str] = &[
    "house",
    "apartment",
    "flat",
    "townhouse",
    "cluster",
    "duplex",
    "simplex",
    "loft",
    "cottage",
    "villa",
    "maisonette",
    "penthouse",
];

const NON_RESIDENTIAL_TYPES: &[&str] = &[
    "vacant-land",
    "land",
    "plot",
    "farm",
    "smallholding",
    "commercial",
    "industrial",
    "office",
    "retail",
    "warehouse",
    "development",
    "site",
    "stand",
];

impl PropertyCategory {
    pub fn from_slug(slug: &str) -> Self {
        let slug = slug.trim().to_lowercase();
        if RESIDENTIAL_TYPES.contains(&slug.as_str()) {
            PropertyCategory::Residential
        } else if NON_RESIDENTIAL_TYPES.contains(&slug.as_str()) {
            PropertyCategory::NonResidential
        } else {
            PropertyCategory::Unknown
        }
    }

    pub fn requires_beds(&self) -> bool {
        !matches!(self, PropertyCategory::NonResidential)
    }
}

/// The agent whose stock is being catalogued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub id: String,
    pub slug: String,
    pub name: String,
}

impl AgentIdentity {
    /// Builds an identity whose display name is derived from the slug
    /// (`blessing-nsibande` -> `blessing nsibande`).
    pub fn new(id: &str, slug: &str) -> Self {
        Self {
            id: id.trim().to_string(),
            slug: slug.trim().to_lowercase(),
            name: slug.trim().replace('-', " "),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        if !name.trim().is_empty() {
            self.name = name.trim().to_string();
        }
        self
    }

    pub fn profile_path(&self) -> String {
        format!("/agents/{}/{}/", self.slug, self.id)
    }

    pub fn results_path(&self) -> String {
        format!("/results/agent/{}/", self.id)
    }

    /// Lower-cased path fragments that identify this agent inside a URL.
    pub fn url_snippets(&self) -> Vec<String> {
        vec![
            self.profile_path().to_lowercase(),
            self.results_path().to_lowercase(),
        ]
    }
}

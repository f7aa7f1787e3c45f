//! Synchronization domains.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};

/// One of the data categories a run can reconcile with a platform.
///
/// Declaration order is the canonical order used for labels and storage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SyncDomain {
    Inventory,
    Prices,
    Orders,
    Products,
}

/// Ordered, de-duplicated set of domains for a run.
pub type DomainSet = BTreeSet<SyncDomain>;

/// Label used for runs that cover every domain.
pub const FULL_SCOPE_LABEL: &str = "full";

impl SyncDomain {
    pub const ALL: [SyncDomain; 4] = [
        SyncDomain::Inventory,
        SyncDomain::Prices,
        SyncDomain::Orders,
        SyncDomain::Products,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDomain::Inventory => "inventory",
            SyncDomain::Prices => "prices",
            SyncDomain::Orders => "orders",
            SyncDomain::Products => "products",
        }
    }

    /// The complete domain set.
    pub fn all() -> DomainSet {
        Self::ALL.into_iter().collect()
    }
}

impl fmt::Display for SyncDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDomain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inventory" => Ok(SyncDomain::Inventory),
            "prices" => Ok(SyncDomain::Prices),
            "orders" => Ok(SyncDomain::Orders),
            "products" => Ok(SyncDomain::Products),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown sync domain '{}'",
                other
            )))),
        }
    }
}

/// Parses raw domain names, keeping the recognized ones.
///
/// Returns the parsed set and the values that were dropped.
pub fn parse_domains<S: AsRef<str>>(values: &[S]) -> (DomainSet, Vec<String>) {
    let mut domains = DomainSet::new();
    let mut dropped = Vec::new();
    for value in values {
        match value.as_ref().parse::<SyncDomain>() {
            Ok(domain) => {
                domains.insert(domain);
            }
            Err(_) => dropped.push(value.as_ref().to_string()),
        }
    }
    (domains, dropped)
}

/// Human-readable scope for a run: `full` or the comma-joined domains.
pub fn scope_label(domains: &DomainSet) -> String {
    if domains.len() == SyncDomain::ALL.len() {
        return FULL_SCOPE_LABEL.to_string();
    }
    domains
        .iter()
        .map(SyncDomain::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

//! Platform connection domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result, ValidationError};

/// Lifecycle state of a platform connection.
///
/// Only `Active` connections take part in synchronization runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Active,
    Inactive,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Active => "active",
            ConnectionStatus::Inactive => "inactive",
            ConnectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(ConnectionStatus::Active),
            "inactive" => Ok(ConnectionStatus::Inactive),
            "error" => Ok(ConnectionStatus::Error),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown connection status '{}'",
                other
            )))),
        }
    }
}

/// A tenant's authorized link to one external commerce platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConnection {
    pub id: String,
    pub tenant_id: String,
    /// Platform slug, e.g. "shopify" or "woocommerce"
    pub platform_id: String,
    pub display_name: String,
    pub status: ConnectionStatus,
    /// Opaque pointer to credentials held upstream. Never serialized outward.
    #[serde(default, skip_serializing)]
    pub credentials_ref: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlatformConnection {
    pub fn is_sync_eligible(&self) -> bool {
        self.status == ConnectionStatus::Active
    }
}

/// Input for registering (or re-authorizing) a platform connection.
///
/// Connections are keyed by `(tenant_id, platform_id)`; registering the same
/// pair again updates the existing connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlatformConnection {
    pub tenant_id: String,
    pub platform_id: String,
    pub display_name: String,
    pub credentials_ref: String,
    #[serde(default)]
    pub status: Option<ConnectionStatus>,
}

impl NewPlatformConnection {
    pub fn validate(&self) -> Result<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(ValidationError::MissingField("tenantId".to_string()).into());
        }
        if self.platform_id.trim().is_empty() {
            return Err(ValidationError::MissingField("platformId".to_string()).into());
        }
        if self.display_name.trim().is_empty() {
            return Err(ValidationError::MissingField("displayName".to_string()).into());
        }
        if self.credentials_ref.trim().is_empty() {
            return Err(ValidationError::MissingField("credentialsRef".to_string()).into());
        }
        Ok(())
    }
}

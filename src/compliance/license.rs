use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Subscription level of the running platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseTier {
    Gold,
    Silver,
    OpenSource,
}

impl LicenseTier {
    pub fn is_gold(&self) -> bool {
        matches!(self, LicenseTier::Gold)
    }
}

impl FromStr for LicenseTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GOLD" => Ok(LicenseTier::Gold),
            "SILVER" => Ok(LicenseTier::Silver),
            "OPEN SOURCE" | "OPEN_SOURCE" | "OPENSOURCE" | "" => Ok(LicenseTier::OpenSource),
            other => Err(format!("unknown license level '{}'", other)),
        }
    }
}

/// License entitlement check
pub trait Entitlement: Send + Sync {
    fn current_license_tier(&self) -> LicenseTier;

    fn is_gold(&self) -> bool {
        self.current_license_tier().is_gold()
    }
}

/// Fixed license level, usually read from configuration
#[derive(Debug, Clone, Copy)]
pub struct StaticLicense(pub LicenseTier);

impl Entitlement for StaticLicense {
    fn current_license_tier(&self) -> LicenseTier {
        self.0
    }
}

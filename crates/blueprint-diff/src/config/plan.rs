use serde::{Deserialize, Serialize};

/// Pages a free-tier run may compare.
pub const FREE_PAGE_CEILING: u32 = 10;

/// Entitlement tier; decides the page ceiling handed to the orchestrator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    #[default]
    Free,
    Unlimited,
}

impl Tier {
    /// `None` means no ceiling.
    pub fn page_ceiling(self) -> Option<u32> {
        match self {
            Self::Free => Some(FREE_PAGE_CEILING),
            Self::Unlimited => None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(default)]
    pub tier: Tier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceilings_per_tier() {
        assert_eq!(Tier::Free.page_ceiling(), Some(10));
        assert_eq!(Tier::Unlimited.page_ceiling(), None);
    }

    #[test]
    fn tier_parses_from_toml() {
        let plan: PlanConfig = toml::from_str("tier = \"unlimited\"").unwrap();
        assert_eq!(plan.tier, Tier::Unlimited);
        let plan: PlanConfig = toml::from_str("").unwrap();
        assert_eq!(plan.tier, Tier::Free);
    }
}

// Engine configuration. Collapses the strategy variants into one set of
// switches, loadable from a JSON file.
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed reading the config file ({0})")]
    ReadError(#[from] std::io::Error),
    #[error("Failed parsing the config file ({0})")]
    ParseError(#[from] serde_json::Error),
    #[error("Unknown hazard class: {0}")]
    UnknownHazardClass(String),
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMode {
    /// value / distance.
    #[default]
    Greedy,
    /// value / distance, discounted by the target's risk.
    RiskAverse,
    /// value / distance, weighted by how much of the match is left.
    TimeWeighted,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReturnPolicy {
    /// Low time with some carry, or base is close.
    #[default]
    DistanceTime,
    /// Composite risk against a per-carry threshold and a tolerance.
    Risk,
    /// Dynamic time threshold and travel-time safety margin.
    Urgency,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RouteChoice {
    #[default]
    Shortest,
    Safest,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WanderPolicy {
    #[default]
    RoundRobin,
    RiskMinimizing,
    AvoidOpponents,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum HazardOrder {
    /// Hazard closest to the start of the path decides the detour.
    #[default]
    Nearest,
    /// Last matching hazard in board order decides the detour.
    Last,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum HazardClass {
    Portal,
    HazardousPickup,
}

/// Fail-fast parser for hazard names coming from external configuration.
impl FromStr for HazardClass {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "portal" => Ok(HazardClass::Portal),
            "hazardous-pickup" => Ok(HazardClass::HazardousPickup),
            other => Err(ConfigError::UnknownHazardClass(other.to_string())),
        }
    }
}

/// Weights and radii of the per-target risk model.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RiskParams {
    pub opponent_weight: f64,
    pub base_distance_weight: f64,
    pub route_weight: f64,
    /// Opponents at or beyond this distance add no proximity risk.
    pub opponent_threshold: f64,
    /// Base distance normalizer, roughly the map span.
    pub max_map_span: f64,
    /// Opponents farther than this from a route midpoint pose no threat.
    pub threat_radius: f64,
}

impl Default for RiskParams {
    fn default() -> Self {
        RiskParams {
            opponent_weight: 0.4,
            base_distance_weight: 0.3,
            route_weight: 0.3,
            opponent_threshold: 3.0,
            max_map_span: 20.0,
            threat_radius: 3.0,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub scoring: ScoringMode,
    pub return_policy: ReturnPolicy,
    pub route_choice: RouteChoice,
    /// Portal return is taken only when shorter than direct times this.
    pub portal_discount: f64,
    pub wander: WanderPolicy,
    pub hazard_order: HazardOrder,
    pub risk: RiskParams,
    /// Full match length, used to turn milliseconds left into a ratio.
    pub match_duration_ms: u64,
    /// Value assumed for the button when scoring it.
    pub button_value: u8,
    /// Minimum opponent distance for an avoid-opponents wander step.
    pub safety_radius: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            scoring: ScoringMode::default(),
            return_policy: ReturnPolicy::default(),
            route_choice: RouteChoice::default(),
            portal_discount: 1.0,
            wander: WanderPolicy::default(),
            hazard_order: HazardOrder::default(),
            risk: RiskParams::default(),
            match_duration_ms: 30_000,
            button_value: 3,
            safety_radius: 2,
        }
    }
}

/// Named bundles of switches matching the known strategies.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    Greedy,
    RiskAverse,
    TimeWeighted,
    /// Risk-averse, but keeps clear of opponents and only takes a portal
    /// home when it is much shorter.
    Evasive,
}

impl Profile {
    pub const ALL: [Profile; 4] = [
        Profile::Greedy, Profile::RiskAverse, Profile::TimeWeighted, Profile::Evasive,
    ];
}

impl EngineConfig {
    pub fn preset(profile: Profile) -> Self {
        let base = EngineConfig::default();
        match profile {
            Profile::Greedy => base,
            Profile::RiskAverse => EngineConfig {
                scoring: ScoringMode::RiskAverse,
                return_policy: ReturnPolicy::Risk,
                route_choice: RouteChoice::Safest,
                wander: WanderPolicy::RiskMinimizing,
                ..base
            },
            Profile::TimeWeighted => EngineConfig {
                scoring: ScoringMode::TimeWeighted,
                return_policy: ReturnPolicy::Urgency,
                ..base
            },
            Profile::Evasive => EngineConfig {
                scoring: ScoringMode::RiskAverse,
                return_policy: ReturnPolicy::Risk,
                portal_discount: 0.8,
                wander: WanderPolicy::AvoidOpponents,
                ..base
            },
        }
    }

    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        info!("[CONFIG] Loading engine config from {}", path.display());
        Self::from_json(&data)
    }

    /// Remaining-time ratio: 1.0 at the start of a match, 0.0 at the end.
    pub fn time_ratio(&self, milliseconds_left: u64) -> f64 {
        if self.match_duration_ms == 0 {
            return 0.0;
        }
        (milliseconds_left as f64 / self.match_duration_ms as f64).clamp(0.0, 1.0)
    }
}

//! Per-type animation constants, chosen by matching a model key against an
//! ordered regex table.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use contrail_config::FlightModelRuleConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

// ---------------------------------------------------------------------------
// Engine class
// ---------------------------------------------------------------------------

/// Broad engine family, used to pick engine sounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EngineClass {
    Helicopter,
    PistonProp,
    TurboProp,
    JetEngine,
    #[default]
    Unknown,
}

impl FromStr for EngineClass {
    type Err = FlightModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Helicopter" => Ok(Self::Helicopter),
            "PistonProp" => Ok(Self::PistonProp),
            "TurboProp" => Ok(Self::TurboProp),
            "JetEngine" => Ok(Self::JetEngine),
            "Unknown" => Ok(Self::Unknown),
            other => Err(FlightModelError::UnknownEngineClass(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Flight model
// ---------------------------------------------------------------------------

/// Animation timing and geometry for one aircraft category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlightModel {
    pub category: String,
    /// Gear up/down time (ms).
    pub gear_duration_ms: f64,
    /// Main gear compression on touchdown (m).
    pub gear_deflection_m: f64,
    /// Flaps 0 → 100% time (ms).
    pub flaps_duration_ms: f64,
    pub spoiler_duration_ms: f64,
    pub reverser_duration_ms: f64,
    pub engine_class: EngineClass,
}

impl Default for FlightModel {
    /// The generic **Unknown** model used when no rule matches.
    fn default() -> Self {
        Self {
            category: "Unknown".to_string(),
            gear_duration_ms: 10_000.0,
            gear_deflection_m: 0.5,
            flaps_duration_ms: 5_000.0,
            spoiler_duration_ms: 1_000.0,
            reverser_duration_ms: 1_500.0,
            engine_class: EngineClass::Unknown,
        }
    }
}

impl TryFrom<&FlightModelRuleConfig> for FlightModel {
    type Error = FlightModelError;

    fn try_from(rule: &FlightModelRuleConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            category: rule.category.clone(),
            gear_duration_ms: rule.gear_duration_ms,
            gear_deflection_m: rule.gear_deflection_m,
            flaps_duration_ms: rule.flaps_duration_ms,
            spoiler_duration_ms: rule.spoiler_duration_ms,
            reverser_duration_ms: rule.reverser_duration_ms,
            engine_class: rule.engine_class.parse()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Model key
// ---------------------------------------------------------------------------

/// What a flight-model rule is matched against.
///
/// `classification` is the ICAO Doc 8643 description (`L2J`: landplane, two
/// jet engines) and `wtc` the wake turbulence category (`L`, `M`, `H`, `J`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ModelKey {
    pub icao_type: String,
    pub classification: String,
    pub wtc: String,
}

impl ModelKey {
    pub fn new(
        classification: impl Into<String>,
        wtc: impl Into<String>,
        icao_type: impl Into<String>,
    ) -> Self {
        Self {
            icao_type: icao_type.into(),
            classification: classification.into(),
            wtc: wtc.into(),
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{};{}", self.classification, self.wtc, self.icao_type)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Errors building a [`FlightModelTable`] from rules.
#[derive(Debug, thiserror::Error)]
pub enum FlightModelError {
    #[error("invalid flight model pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("unknown engine class {0:?}")]
    UnknownEngineClass(String),
}

#[derive(Clone, Debug)]
struct FlightModelRule {
    pattern: Regex,
    model: FlightModel,
}

/// Ordered `(regex, model)` rules; the first match wins.
#[derive(Clone, Debug, Default)]
pub struct FlightModelTable {
    rules: Vec<FlightModelRule>,
    fallback: FlightModel,
}

static BUILTIN: LazyLock<FlightModelTable> = LazyLock::new(|| {
    FlightModelTable::from_rules(&builtin_rules()).unwrap_or_else(|e| {
        error!("built-in flight model table rejected: {e}");
        FlightModelTable::default()
    })
});

fn rule(
    pattern: &str,
    category: &str,
    gear_duration_ms: f64,
    gear_deflection_m: f64,
    flaps_duration_ms: f64,
    engine_class: &str,
) -> FlightModelRuleConfig {
    FlightModelRuleConfig {
        pattern: pattern.to_string(),
        category: category.to_string(),
        gear_duration_ms,
        gear_deflection_m,
        flaps_duration_ms,
        engine_class: engine_class.to_string(),
        ..Default::default()
    }
}

fn builtin_rules() -> Vec<FlightModelRuleConfig> {
    vec![
        rule("^[HG]", "Rotorcraft", 3_000.0, 0.15, 1_000.0, "Helicopter"),
        rule("^L[1-4]J;[HJ];", "HeavyJet", 10_000.0, 0.8, 8_000.0, "JetEngine"),
        rule("^L[1-4]J;", "Jet", 8_000.0, 0.5, 5_000.0, "JetEngine"),
        rule("^[LA][1-4]T;", "TurboProp", 7_000.0, 0.35, 4_000.0, "TurboProp"),
        rule("^[LA][1-4]P;", "PistonProp", 5_000.0, 0.25, 3_000.0, "PistonProp"),
    ]
}

impl FlightModelTable {
    /// Compiles `rules` in order.
    pub fn from_rules(rules: &[FlightModelRuleConfig]) -> Result<Self, FlightModelError> {
        let rules = rules
            .iter()
            .map(|r| {
                let pattern =
                    Regex::new(&r.pattern).map_err(|source| FlightModelError::InvalidPattern {
                        pattern: r.pattern.clone(),
                        source,
                    })?;
                Ok(FlightModelRule {
                    pattern,
                    model: FlightModel::try_from(r)?,
                })
            })
            .collect::<Result<Vec<_>, FlightModelError>>()?;
        Ok(Self {
            rules,
            fallback: FlightModel::default(),
        })
    }

    /// The table compiled into the crate.
    pub fn builtin() -> &'static FlightModelTable {
        &BUILTIN
    }

    /// Configured rules when there are any, otherwise a copy of the
    /// built-in table.
    pub fn from_config(rules: &[FlightModelRuleConfig]) -> Result<Self, FlightModelError> {
        if rules.is_empty() {
            Ok(Self::builtin().clone())
        } else {
            Self::from_rules(rules)
        }
    }

    /// First model whose pattern matches `key`, else the Unknown model.
    pub fn resolve(&self, key: &ModelKey) -> FlightModel {
        let rendered = key.to_string();
        match self.rules.iter().find(|r| r.pattern.is_match(&rendered)) {
            Some(rule) => rule.model.clone(),
            None => {
                warn!(key = %rendered, "no flight model matched, using Unknown");
                self.fallback.clone()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

use serde::{Deserialize, Serialize};

use super::routing::RoutingError;

/// Precipitation category reported alongside an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    Rain,
    Snow,
    Other,
}

impl WeatherCondition {
    /// Map a provider label such as `"Rain"` onto a category. Anything that is
    /// not clear sky, rain or snow (drizzle, mist, thunderstorm) is `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "clear" => Self::Clear,
            "rain" => Self::Rain,
            "snow" => Self::Snow,
            _ => Self::Other,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Other => "Other",
        }
    }

    fn is_precipitation(self) -> bool {
        matches!(self, WeatherCondition::Rain | WeatherCondition::Snow)
    }
}

/// Current conditions at a report location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub temperature_celsius: f64,
    pub feels_like_celsius: f64,
    pub condition: WeatherCondition,
    pub wind_speed_mps: f64,
    #[serde(default)]
    pub description: String,
}

impl WeatherObservation {
    pub fn new(
        temperature_celsius: f64,
        feels_like_celsius: f64,
        condition: WeatherCondition,
        wind_speed_mps: f64,
    ) -> Self {
        Self {
            temperature_celsius,
            feels_like_celsius,
            condition,
            wind_speed_mps,
            description: String::new(),
        }
    }

    /// Reject non-finite readings. Extreme but finite values pass through.
    pub fn validate(&self) -> Result<(), RoutingError> {
        let fields = [
            ("temperature_celsius", self.temperature_celsius),
            ("feels_like_celsius", self.feels_like_celsius),
            ("wind_speed_mps", self.wind_speed_mps),
        ];

        for (field, value) in fields {
            if !value.is_finite() {
                return Err(RoutingError::InvalidObservation { field, value });
            }
        }

        Ok(())
    }
}

/// Weather-driven danger to someone sleeping outdoors. Ordered `Green < Amber < Red`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Green,
    Amber,
    Red,
}

impl RiskTier {
    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::Green => "GREEN",
            RiskTier::Amber => "AMBER",
            RiskTier::Red => "RED",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            RiskTier::Red => "EXTREME DANGER - Immediate response required",
            RiskTier::Amber => "SIGNIFICANT RISK - Response needed within 2 hours",
            RiskTier::Green => "LOW RISK - Standard response",
        }
    }
}

const RED_FEELS_LIKE_MAX: f64 = 0.0;
const RED_TEMPERATURE_MAX: f64 = 2.0;
const RED_PRECIPITATION_TEMPERATURE_MAX: f64 = 5.0;
const AMBER_FEELS_LIKE_MAX: f64 = 5.0;
const AMBER_TEMPERATURE_MAX: f64 = 7.0;
const AMBER_RAIN_TEMPERATURE_MAX: f64 = 10.0;
const AMBER_WIND_SPEED_MIN: f64 = 10.0;

/// One entry of the ordered classification table.
#[derive(Debug, Clone, Copy)]
pub struct RiskRule {
    pub name: &'static str,
    pub tier: RiskTier,
    predicate: fn(&WeatherObservation) -> bool,
}

impl RiskRule {
    pub fn matches(&self, observation: &WeatherObservation) -> bool {
        (self.predicate)(observation)
    }
}

/// Classification table, evaluated top-down. The first matching rule wins so
/// every red rule precedes every amber rule.
pub static RISK_RULES: [RiskRule; 7] = [
    RiskRule {
        name: "feels_like_freezing",
        tier: RiskTier::Red,
        predicate: |o| o.feels_like_celsius <= RED_FEELS_LIKE_MAX,
    },
    RiskRule {
        name: "near_freezing",
        tier: RiskTier::Red,
        predicate: |o| o.temperature_celsius <= RED_TEMPERATURE_MAX,
    },
    RiskRule {
        name: "cold_precipitation",
        tier: RiskTier::Red,
        predicate: |o| {
            o.temperature_celsius <= RED_PRECIPITATION_TEMPERATURE_MAX
                && o.condition.is_precipitation()
        },
    },
    RiskRule {
        name: "feels_like_cold",
        tier: RiskTier::Amber,
        predicate: |o| o.feels_like_celsius <= AMBER_FEELS_LIKE_MAX,
    },
    RiskRule {
        name: "cold",
        tier: RiskTier::Amber,
        predicate: |o| o.temperature_celsius <= AMBER_TEMPERATURE_MAX,
    },
    RiskRule {
        name: "cool_rain",
        tier: RiskTier::Amber,
        predicate: |o| {
            o.temperature_celsius <= AMBER_RAIN_TEMPERATURE_MAX
                && o.condition == WeatherCondition::Rain
        },
    },
    RiskRule {
        name: "high_wind",
        tier: RiskTier::Amber,
        predicate: |o| o.wind_speed_mps > AMBER_WIND_SPEED_MIN,
    },
];

/// Tier plus the rule that produced it, for audit trails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<&'static str>,
}

pub fn assess(observation: &WeatherObservation) -> RiskAssessment {
    RISK_RULES
        .iter()
        .find(|rule| rule.matches(observation))
        .map(|rule| RiskAssessment {
            tier: rule.tier,
            rule: Some(rule.name),
        })
        .unwrap_or(RiskAssessment {
            tier: RiskTier::Green,
            rule: None,
        })
}

pub fn classify(observation: &WeatherObservation) -> RiskTier {
    assess(observation).tier
}

//! Configuration System
//!
//! Tuning parameters for the party, loaded from a TOML file so thresholds and
//! impulse strengths can be adjusted without recompiling. Every field has a
//! default; a missing section falls back to its defaults.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default tuning file path
pub const DEFAULT_CONFIG_PATH: &str = "party.toml";

/// Highest accepted physics rate; keeps the tick interval non-zero
pub const MAX_TICK_HZ: f32 = 1000.0;

/// Complete party configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyConfig {
    #[serde(default)]
    pub world: WorldTuning,
    #[serde(default)]
    pub behavior: BehaviorTuning,
    #[serde(default)]
    pub conversation: ConversationTuning,
    #[serde(default)]
    pub schedule: ScheduleTuning,
    #[serde(default)]
    pub interaction: InteractionTuning,
}

impl PartyConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: PartyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = self.first_non_finite() {
            return Err(ConfigError::Invalid(format!("{} must be finite", name)));
        }

        let w = &self.world;
        if w.arena_width <= 0.0 || w.arena_height <= 0.0 {
            return Err(ConfigError::Invalid("arena dimensions must be positive".into()));
        }
        if w.body_radius <= 0.0 {
            return Err(ConfigError::Invalid("body_radius must be positive".into()));
        }
        if w.body_mass <= 0.0 {
            return Err(ConfigError::Invalid("body_mass must be positive".into()));
        }
        if w.max_speed <= 0.0 {
            return Err(ConfigError::Invalid("max_speed must be positive".into()));
        }
        if !(0.0..=1.0).contains(&w.restitution) || !(0.0..1.0).contains(&w.air_friction) {
            return Err(ConfigError::Invalid(
                "restitution must be in [0, 1] and air_friction in [0, 1)".into(),
            ));
        }

        let b = &self.behavior;
        if !(0.0..=1.0).contains(&b.wander_probability)
            || !(0.0..=1.0).contains(&b.affinity_probability)
        {
            return Err(ConfigError::Invalid("probabilities must be in [0, 1]".into()));
        }
        if b.affinity_min_distance >= b.affinity_max_distance {
            return Err(ConfigError::Invalid(
                "affinity_min_distance must be below affinity_max_distance".into(),
            ));
        }

        let c = &self.conversation;
        if c.connect_threshold <= 0.0 || c.disconnect_threshold <= c.connect_threshold {
            return Err(ConfigError::Invalid(
                "disconnect_threshold must exceed a positive connect_threshold".into(),
            ));
        }
        if c.latency_min_ms > c.latency_max_ms {
            return Err(ConfigError::Invalid("latency_min_ms exceeds latency_max_ms".into()));
        }

        let s = &self.schedule;
        if s.tick_hz <= 0.0 || s.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "tick_hz and poll_interval_ms must be positive".into(),
            ));
        }
        if s.tick_hz > MAX_TICK_HZ {
            return Err(ConfigError::Invalid(format!(
                "tick_hz must be at most {}",
                MAX_TICK_HZ
            )));
        }

        if !(0.0..=1.0).contains(&self.interaction.drag_stiffness) {
            return Err(ConfigError::Invalid("drag_stiffness must be in [0, 1]".into()));
        }
        Ok(())
    }

    /// Name of the first float field holding NaN or infinity.
    fn first_non_finite(&self) -> Option<&'static str> {
        let (w, b, c) = (&self.world, &self.behavior, &self.conversation);
        let fields = [
            ("arena_width", w.arena_width as f64),
            ("arena_height", w.arena_height as f64),
            ("body_radius", w.body_radius as f64),
            ("arena_margin", w.arena_margin as f64),
            ("body_mass", w.body_mass as f64),
            ("restitution", w.restitution as f64),
            ("friction", w.friction as f64),
            ("air_friction", w.air_friction as f64),
            ("max_speed", w.max_speed as f64),
            ("initial_speed", w.initial_speed as f64),
            ("wander_impulse", b.wander_impulse as f64),
            ("wander_probability", b.wander_probability),
            ("affinity_impulse", b.affinity_impulse as f64),
            ("affinity_probability", b.affinity_probability),
            ("affinity_min_distance", b.affinity_min_distance as f64),
            ("affinity_max_distance", b.affinity_max_distance as f64),
            ("connect_threshold", c.connect_threshold as f64),
            ("disconnect_threshold", c.disconnect_threshold as f64),
            ("tick_hz", self.schedule.tick_hz as f64),
            ("drag_stiffness", self.interaction.drag_stiffness as f64),
        ];
        fields
            .iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(name, _)| *name)
    }
}

/// Returns the default configuration rendered as TOML.
pub fn default_config_toml() -> Result<String, ConfigError> {
    PartyConfig::default().to_toml()
}

/// Arena and body parameters.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    pub arena_width: f32,
    pub arena_height: f32,
    pub body_radius: f32,
    /// Inset for initial placement
    pub arena_margin: f32,
    pub body_mass: f32,
    pub restitution: f32,
    /// Tangential impulse ratio applied on body contact
    pub friction: f32,
    /// Fraction of velocity lost per tick
    pub air_friction: f32,
    /// Units per second
    pub max_speed: f32,
    /// Upper bound of the randomized starting speed per axis
    pub initial_speed: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            arena_width: 1280.0,
            arena_height: 800.0,
            body_radius: 40.0,
            arena_margin: 150.0,
            body_mass: 1.0,
            restitution: 0.3,
            friction: 0.1,
            air_friction: 0.01,
            max_speed: 180.0,
            initial_speed: 15.0,
        }
    }
}

/// Wander and affinity forcing.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    pub wander_impulse: f32,
    /// Chance per tick that a body receives a wander impulse
    pub wander_probability: f64,
    pub affinity_impulse: f32,
    /// Chance per tick that a similar pair in band is pulled together
    pub affinity_probability: f64,
    pub affinity_min_distance: f32,
    pub affinity_max_distance: f32,
    /// Ranks strictly closer than this count as similar
    pub affinity_rank_delta: u32,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            wander_impulse: 20.0,
            wander_probability: 0.02,
            affinity_impulse: 4.0,
            affinity_probability: 0.02,
            affinity_min_distance: 100.0,
            affinity_max_distance: 400.0,
            affinity_rank_delta: 5,
        }
    }
}

/// Proximity thresholds and generation timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationTuning {
    pub connect_threshold: f32,
    pub disconnect_threshold: f32,
    pub follow_up_cooldown_ms: u64,
    pub latency_min_ms: u64,
    pub latency_max_ms: u64,
}

impl ConversationTuning {
    pub fn follow_up_cooldown(&self) -> Duration {
        Duration::from_millis(self.follow_up_cooldown_ms)
    }
}

impl Default for ConversationTuning {
    fn default() -> Self {
        Self {
            connect_threshold: 180.0,
            disconnect_threshold: 250.0,
            follow_up_cooldown_ms: 4000,
            latency_min_ms: 300,
            latency_max_ms: 800,
        }
    }
}

/// Loop rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleTuning {
    pub tick_hz: f32,
    pub poll_interval_ms: u64,
    /// Seeds the stochastic layers when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl ScheduleTuning {
    /// Fixed physics timestep in seconds.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_hz
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f32(self.dt())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ScheduleTuning {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            poll_interval_ms: 500,
            seed: None,
        }
    }
}

/// Pointer manipulation.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionTuning {
    /// Fraction of the remaining distance a dragged body covers per tick
    pub drag_stiffness: f32,
}

impl Default for InteractionTuning {
    fn default() -> Self {
        Self {
            drag_stiffness: 0.2,
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

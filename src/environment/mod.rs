//! Environments: uniform force fields sampled by every agent each tick
//!
//! Air carries a slowly turning wind, water a slowly turning current, and the
//! ground damps velocity through friction. Each environment admits exactly one
//! archetype.

use serde::{Deserialize, Serialize};

use crate::core::config::EnvironmentConfig;
use crate::core::types::Vec2;
use crate::entity::archetype::Archetype;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentKind {
    Air,
    Water,
    Ground,
}

impl EnvironmentKind {
    pub fn allows(self, archetype: Archetype) -> bool {
        archetype.native_environment() == self
    }
}

impl std::str::FromStr for EnvironmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "air" => Ok(EnvironmentKind::Air),
            "water" => Ok(EnvironmentKind::Water),
            "ground" | "terrain" => Ok(EnvironmentKind::Ground),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Time-varying state of all environments
#[derive(Debug, Clone, Default)]
pub struct Environments {
    wind_angle: f32,
    current_angle: f32,
}

impl Environments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance wind and current headings
    pub fn update(&mut self, dt: f32, config: &EnvironmentConfig) {
        self.wind_angle = (self.wind_angle + config.wind_turn_rate * dt) % std::f32::consts::TAU;
        self.current_angle =
            (self.current_angle + config.current_turn_rate * dt) % std::f32::consts::TAU;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Force felt by an agent moving with `velocity` in `kind`
    pub fn force(&self, kind: EnvironmentKind, velocity: Vec2, config: &EnvironmentConfig) -> Vec2 {
        match kind {
            EnvironmentKind::Air => {
                let (sin, cos) = self.wind_angle.sin_cos();
                Vec2::new(cos * config.wind_strength, sin * config.wind_strength * 0.5)
            }
            EnvironmentKind::Water => Vec2::from_angle(self.current_angle) * config.current_strength,
            EnvironmentKind::Ground => velocity * -(1.0 - config.ground_friction),
        }
    }
}

//! Attackable objectives

use serde::{Deserialize, Serialize};

use crate::core::types::{ObjectiveId, Vec2};

/// A target with health that agents converge on and damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: ObjectiveId,
    pub position: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    /// Damage accumulated during the current tick, applied at its end
    pub damage_this_tick: f32,
    pub destroyed: bool,
}

impl Objective {
    pub fn new(id: ObjectiveId, position: Vec2, radius: f32, max_health: f32) -> Self {
        Self {
            id,
            position,
            radius,
            health: max_health,
            max_health,
            damage_this_tick: 0.0,
            destroyed: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.destroyed
    }

    /// Distance from `point` to the objective's edge, zero inside it
    pub fn surface_distance(&self, point: Vec2) -> f32 {
        (self.position.distance(&point) - self.radius).max(0.0)
    }

    /// 1.0 = untouched, 0.0 = destroyed
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        (self.health / self.max_health).clamp(0.0, 1.0)
    }

    /// Queue damage for the end of the tick; destroyed objectives refuse it
    pub fn accumulate(&mut self, amount: f32) -> bool {
        if self.destroyed || !(amount > 0.0) || !amount.is_finite() {
            return false;
        }
        self.damage_this_tick += amount;
        true
    }

    /// Apply queued damage
    ///
    /// Returns the health actually removed and whether this call destroyed
    /// the objective.
    pub fn apply_accumulated(&mut self) -> (f32, bool) {
        if self.destroyed || self.damage_this_tick <= 0.0 {
            return (0.0, false);
        }
        let applied = self.damage_this_tick.min(self.health);
        self.health = (self.health - self.damage_this_tick).max(0.0);
        if self.health <= 0.0 {
            self.destroyed = true;
            return (applied, true);
        }
        (applied, false)
    }

    pub fn clear_tick_damage(&mut self) {
        self.damage_this_tick = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn objective() -> Objective {
        Objective::new(ObjectiveId(0), Vec2::new(100.0, 100.0), 15.0, 10.0)
    }

    #[test]
    fn test_damage_applies_at_end_of_tick() {
        let mut obj = objective();
        assert!(obj.accumulate(3.0));
        assert!(obj.accumulate(2.0));
        assert_eq!(obj.health, 10.0);
        assert_eq!(obj.apply_accumulated(), (5.0, false));
        assert_eq!(obj.health, 5.0);
    }

    #[test]
    fn test_health_clamps_and_destroys_once() {
        let mut obj = objective();
        obj.accumulate(25.0);
        assert_eq!(obj.apply_accumulated(), (10.0, true));
        assert_eq!(obj.health, 0.0);
        assert!(obj.destroyed);

        obj.clear_tick_damage();
        assert!(!obj.accumulate(1.0));
        assert_eq!(obj.apply_accumulated(), (0.0, false));
    }

    #[test]
    fn test_rejects_non_positive_damage() {
        let mut obj = objective();
        assert!(!obj.accumulate(0.0));
        assert!(!obj.accumulate(-1.0));
        assert!(!obj.accumulate(f32::NAN));
    }
}

//! Static circular obstacles

use serde::{Deserialize, Serialize};

use crate::core::types::{ObstacleId, Vec2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub position: Vec2,
    pub radius: f32,
}

impl Obstacle {
    pub fn new(id: ObstacleId, position: Vec2, radius: f32) -> Self {
        Self { id, position, radius }
    }

    /// True when `point` lies within the obstacle grown by `clearance`
    pub fn contains(&self, point: Vec2, clearance: f32) -> bool {
        let reach = self.radius + clearance;
        self.position.distance_squared(&point) <= reach * reach
    }

    /// Distance along a ray to where it enters the obstacle grown by `clearance`
    ///
    /// `direction` must be unit length. A ray starting inside hits at 0.
    pub fn ray_hit(&self, origin: Vec2, direction: Vec2, max_distance: f32, clearance: f32) -> Option<f32> {
        if self.contains(origin, clearance) {
            return Some(0.0);
        }
        let reach = self.radius + clearance;
        let to_center = self.position - origin;
        let along = to_center.dot(&direction);
        if along < 0.0 {
            return None;
        }
        let lateral_sq = to_center.length_squared() - along * along;
        if lateral_sq > reach * reach {
            return None;
        }
        let entry = along - (reach * reach - lateral_sq).max(0.0).sqrt();
        (entry <= max_distance).then_some(entry.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_hits_front_face() {
        let obstacle = Obstacle::new(ObstacleId(0), Vec2::new(50.0, 0.0), 10.0);
        let hit = obstacle.ray_hit(Vec2::ZERO, Vec2::new(1.0, 0.0), 100.0, 0.0);
        assert!((hit.unwrap() - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_ray_misses_behind_and_beside() {
        let obstacle = Obstacle::new(ObstacleId(0), Vec2::new(50.0, 0.0), 10.0);
        assert!(obstacle.ray_hit(Vec2::ZERO, Vec2::new(-1.0, 0.0), 100.0, 0.0).is_none());
        assert!(obstacle.ray_hit(Vec2::new(0.0, 20.0), Vec2::new(1.0, 0.0), 100.0, 0.0).is_none());
        assert!(obstacle.ray_hit(Vec2::ZERO, Vec2::new(1.0, 0.0), 30.0, 0.0).is_none());
    }

    #[test]
    fn test_clearance_widens_obstacle() {
        let obstacle = Obstacle::new(ObstacleId(0), Vec2::new(50.0, 0.0), 10.0);
        let origin = Vec2::new(0.0, 13.0);
        assert!(obstacle.ray_hit(origin, Vec2::new(1.0, 0.0), 100.0, 0.0).is_none());
        assert!(obstacle.ray_hit(origin, Vec2::new(1.0, 0.0), 100.0, 5.0).is_some());
    }

    #[test]
    fn test_origin_inside_hits_immediately() {
        let obstacle = Obstacle::new(ObstacleId(0), Vec2::ZERO, 10.0);
        assert_eq!(obstacle.ray_hit(Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0), 5.0, 0.0), Some(0.0));
    }
}

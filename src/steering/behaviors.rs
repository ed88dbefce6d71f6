//! Individual steering behaviors
//!
//! Every behavior is a pure function returning a force whose magnitude never
//! exceeds the `max_force` it is given. Reynolds-style: steering = desired
//! velocity minus current velocity.

use std::f32::consts::TAU;

use crate::core::types::Vec2;
use crate::entity::obstacle::Obstacle;

/// A neighbor as seen from the steering agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: Vec2,
    pub velocity: Vec2,
    pub distance: f32,
}

/// Head straight for `target` at full speed
pub fn seek(position: Vec2, velocity: Vec2, target: Vec2, max_speed: f32, max_force: f32) -> Vec2 {
    let desired = (target - position).normalize();
    if desired == Vec2::ZERO {
        return Vec2::ZERO;
    }
    (desired * max_speed - velocity).limit(max_force)
}

/// Opposite of `seek`
pub fn flee(position: Vec2, velocity: Vec2, threat: Vec2, max_speed: f32, max_force: f32) -> Vec2 {
    -seek(position, velocity, threat, max_speed, max_force)
}

/// Seek scaled down linearly inside `slowing_radius`; zero at the target
pub fn arrive(
    position: Vec2,
    velocity: Vec2,
    target: Vec2,
    slowing_radius: f32,
    max_speed: f32,
    max_force: f32,
) -> Vec2 {
    let distance = position.distance(&target);
    let ramp = if slowing_radius > 0.0 {
        (distance / slowing_radius).min(1.0)
    } else {
        1.0
    };
    seek(position, velocity, target, max_speed, max_force) * ramp
}

/// Steer away from neighbors closer than `radius`, weighted by 1/distance
///
/// Coincident neighbors have no defined direction and are skipped.
pub fn separation(
    position: Vec2,
    velocity: Vec2,
    neighbors: &[Neighbor],
    radius: f32,
    max_speed: f32,
    max_force: f32,
) -> Vec2 {
    let push: Vec2 = neighbors
        .iter()
        .filter(|n| n.distance > 0.0 && n.distance <= radius)
        .map(|n| (position - n.position).normalize() * (1.0 / n.distance))
        .sum();

    let desired = push.normalize();
    if desired == Vec2::ZERO {
        return Vec2::ZERO;
    }
    (desired * max_speed - velocity).limit(max_force)
}

/// Seek the centroid of the neighbors
pub fn cohesion(position: Vec2, velocity: Vec2, neighbors: &[Neighbor], max_speed: f32, max_force: f32) -> Vec2 {
    if neighbors.is_empty() {
        return Vec2::ZERO;
    }
    let centroid = neighbors.iter().map(|n| n.position).sum::<Vec2>() * (1.0 / neighbors.len() as f32);
    seek(position, velocity, centroid, max_speed, max_force)
}

/// Match the neighbors' mean heading
pub fn alignment(velocity: Vec2, neighbors: &[Neighbor], max_speed: f32, max_force: f32) -> Vec2 {
    if neighbors.is_empty() {
        return Vec2::ZERO;
    }
    let heading = neighbors.iter().map(|n| n.velocity).sum::<Vec2>().normalize();
    if heading == Vec2::ZERO {
        return Vec2::ZERO;
    }
    (heading * max_speed - velocity).limit(max_force)
}

/// Sideways push away from the nearest obstacle on the path ahead
///
/// A ray of length `lookahead` is cast along the velocity; an obstacle counts
/// when the ray passes closer to its center than its radius plus
/// `body_radius`. The push is perpendicular to the heading, pointing away
/// from the obstacle center, and grows as the obstacle gets closer. An agent
/// already inside an obstacle flees its center instead.
pub fn obstacle_avoidance(
    position: Vec2,
    velocity: Vec2,
    obstacles: &[Obstacle],
    lookahead: f32,
    body_radius: f32,
    max_speed: f32,
    max_force: f32,
) -> Vec2 {
    if let Some(inside) = obstacles.iter().find(|o| o.contains(position, body_radius)) {
        let escape = flee(position, velocity, inside.position, max_speed, max_force);
        if escape != Vec2::ZERO {
            return escape;
        }
        // Dead center: any way out will do
        return Vec2::new(max_force, 0.0);
    }

    let heading = velocity.normalize();
    if heading == Vec2::ZERO {
        return Vec2::ZERO;
    }

    let mut nearest: Option<(f32, &Obstacle)> = None;
    for obstacle in obstacles {
        let to_center = obstacle.position - position;
        let along = to_center.dot(&heading);
        if along < 0.0 || along > lookahead {
            continue;
        }
        let lateral = (to_center - heading * along).length();
        if lateral >= obstacle.radius + body_radius {
            continue;
        }
        if nearest.map_or(true, |(best, _)| along < best) {
            nearest = Some((along, obstacle));
        }
    }

    let Some((along, obstacle)) = nearest else {
        return Vec2::ZERO;
    };

    // Positive cross: obstacle lies to the left of the heading, so steer right
    let side = heading.cross(&(obstacle.position - position));
    let away = if side > 0.0 {
        -heading.perpendicular()
    } else {
        heading.perpendicular()
    };
    let strength = max_force * (obstacle.radius / along.max(obstacle.radius)).min(1.0);
    away * strength
}

/// Random-walk heading with a bounded turn per call
///
/// `jitter` is a uniform draw in [-1, 1]. Returns the force and the new
/// wander angle, wrapped into [0, TAU).
pub fn wander(wander_angle: f32, jitter: f32, max_turn: f32, max_force: f32) -> (Vec2, f32) {
    let mut angle = (wander_angle + jitter.clamp(-1.0, 1.0) * max_turn).rem_euclid(TAU);
    // rem_euclid of a tiny negative rounds up to TAU
    if angle >= TAU {
        angle = 0.0;
    }
    (Vec2::from_angle(angle) * max_force, angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ObstacleId;

    fn neighbor(x: f32, y: f32, from: Vec2) -> Neighbor {
        let position = Vec2::new(x, y);
        Neighbor {
            position,
            velocity: Vec2::ZERO,
            distance: position.distance(&from),
        }
    }

    #[test]
    fn test_seek_points_at_target_and_is_capped() {
        let force = seek(Vec2::ZERO, Vec2::ZERO, Vec2::new(100.0, 0.0), 120.0, 60.0);
        assert!((force.length() - 60.0).abs() < 1e-3);
        assert!(force.x > 0.0);
        assert_eq!(seek(Vec2::ZERO, Vec2::ZERO, Vec2::ZERO, 120.0, 60.0), Vec2::ZERO);
    }

    #[test]
    fn test_flee_opposes_seek() {
        let target = Vec2::new(10.0, 10.0);
        let s = seek(Vec2::ZERO, Vec2::ZERO, target, 10.0, 5.0);
        assert_eq!(flee(Vec2::ZERO, Vec2::ZERO, target, 10.0, 5.0), -s);
    }

    #[test]
    fn test_arrive_ramps_to_zero() {
        let far = arrive(Vec2::ZERO, Vec2::ZERO, Vec2::new(200.0, 0.0), 60.0, 100.0, 10.0);
        let near = arrive(Vec2::ZERO, Vec2::ZERO, Vec2::new(30.0, 0.0), 60.0, 100.0, 10.0);
        let there = arrive(Vec2::ZERO, Vec2::new(5.0, 0.0), Vec2::ZERO, 60.0, 100.0, 10.0);
        assert!((far.length() - 10.0).abs() < 1e-4);
        assert!((near.length() - 5.0).abs() < 1e-4);
        assert_eq!(there, Vec2::ZERO);
    }

    #[test]
    fn test_separation_skips_coincident() {
        let me = Vec2::new(50.0, 50.0);
        let neighbors = [neighbor(50.0, 50.0, me)];
        assert_eq!(separation(me, Vec2::ZERO, &neighbors, 20.0, 10.0, 5.0), Vec2::ZERO);
    }

    #[test]
    fn test_separation_pushes_away() {
        let me = Vec2::ZERO;
        let neighbors = [neighbor(5.0, 0.0, me), neighbor(100.0, 0.0, me)];
        let force = separation(me, Vec2::ZERO, &neighbors, 20.0, 10.0, 5.0);
        assert!(force.x < 0.0);
        assert!(force.y.abs() < 1e-5);
    }

    #[test]
    fn test_cohesion_and_alignment_without_neighbors() {
        assert_eq!(cohesion(Vec2::ZERO, Vec2::ZERO, &[], 10.0, 5.0), Vec2::ZERO);
        assert_eq!(alignment(Vec2::ZERO, &[], 10.0, 5.0), Vec2::ZERO);
    }

    #[test]
    fn test_alignment_matches_heading() {
        let mut n = neighbor(10.0, 0.0, Vec2::ZERO);
        n.velocity = Vec2::new(0.0, 3.0);
        let force = alignment(Vec2::ZERO, &[n], 10.0, 100.0);
        assert!((force.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_avoidance_steers_sideways() {
        let obstacle = Obstacle::new(ObstacleId(0), Vec2::new(30.0, 2.0), 10.0);
        let force = obstacle_avoidance(
            Vec2::ZERO,
            Vec2::new(50.0, 0.0),
            &[obstacle],
            50.0,
            5.0,
            100.0,
            20.0,
        );
        // Obstacle slightly to the left (positive y): push right (negative y)
        assert!(force.y < 0.0);
        assert!(force.x.abs() < 1e-5);
        assert!(force.length() <= 20.0 + 1e-4);
    }

    #[test]
    fn test_avoidance_ignores_obstacles_off_path() {
        let behind = Obstacle::new(ObstacleId(0), Vec2::new(-30.0, 0.0), 10.0);
        let beside = Obstacle::new(ObstacleId(1), Vec2::new(30.0, 40.0), 10.0);
        let far = Obstacle::new(ObstacleId(2), Vec2::new(200.0, 0.0), 10.0);
        let force = obstacle_avoidance(
            Vec2::ZERO,
            Vec2::new(50.0, 0.0),
            &[behind, beside, far],
            50.0,
            5.0,
            100.0,
            20.0,
        );
        assert_eq!(force, Vec2::ZERO);
    }

    #[test]
    fn test_wander_turn_is_bounded() {
        let max_turn = std::f32::consts::PI / 8.0;
        let (force, angle) = wander(1.0, 5.0, max_turn, 3.0);
        assert!((angle - (1.0 + max_turn)).abs() < 1e-6);
        assert!((force.length() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_wander_angle_stays_wrapped() {
        let max_turn = std::f32::consts::PI / 8.0;
        let mut angle = 0.0;
        for _ in 0..10_000 {
            angle = wander(angle, 1.0, max_turn, 1.0).1;
            assert!((0.0..TAU).contains(&angle));
        }
        let (_, back) = wander(0.0, -1.0, max_turn, 1.0);
        assert!((back - (TAU - max_turn)).abs() < 1e-5);
    }
}

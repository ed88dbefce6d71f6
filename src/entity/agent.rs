//! Agents: shared physics and state plus an archetype payload

use serde::{Deserialize, Serialize};

use crate::comms::message::{Mailbox, Message, MessageKind};
use crate::core::config::{ArchetypeConfig, EnergyConfig, MessagingConfig};
use crate::core::types::{AgentId, ObjectiveId, Vec2};
use crate::entity::archetype::{Archetype, ArchetypeState};
use crate::environment::EnvironmentKind;

/// High-level behavior state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Idle,
    Seeking,
    Attacking,
    /// Out of energy; no seeking or attacking until recovered
    Resting,
}

/// Rest transitions reported by `Agent::update_energy`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyTransition {
    StartedResting,
    Recovered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: ArchetypeState,
    pub environment: EnvironmentKind,

    pub position: Vec2,
    pub velocity: Vec2,
    /// Force accumulated for the next integration step
    pub acceleration: Vec2,
    /// Blended steering force applied on the last tick
    pub last_force: Vec2,
    pub max_speed: f32,
    pub max_force: f32,
    pub perception_radius: f32,
    pub communication_radius: f32,
    pub attack_range: f32,
    pub body_radius: f32,

    pub energy: f32,
    pub state: AgentState,

    pub aggressive: bool,
    /// Time units of aggression left
    pub aggressive_timeout: f32,
    /// 0-10; higher means more urgent
    pub attack_priority: u8,
    pub objective: Option<ObjectiveId>,

    pub wander_angle: f32,

    pub mailbox: Mailbox,
    /// Messages to broadcast to neighbors at the end of this tick
    #[serde(skip)]
    pub outbox: Vec<Message>,
}

impl Agent {
    pub fn new(
        id: AgentId,
        archetype: Archetype,
        environment: EnvironmentKind,
        position: Vec2,
        config: &ArchetypeConfig,
        energy: f32,
    ) -> Self {
        Self {
            id,
            kind: ArchetypeState::new(archetype),
            environment,
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            last_force: Vec2::ZERO,
            max_speed: config.max_speed,
            max_force: config.max_force,
            perception_radius: config.perception_radius,
            communication_radius: config.communication_radius,
            attack_range: config.attack_range,
            body_radius: config.body_radius,
            energy,
            state: AgentState::Idle,
            aggressive: false,
            aggressive_timeout: 0.0,
            attack_priority: 0,
            objective: None,
            wander_angle: 0.0,
            mailbox: Mailbox::new(),
            outbox: Vec::new(),
        }
    }

    pub fn archetype(&self) -> Archetype {
        self.kind.archetype()
    }

    pub fn is_resting(&self) -> bool {
        self.state == AgentState::Resting
    }

    pub fn receive(&mut self, message: Message) {
        self.mailbox.receive(message);
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force;
    }

    /// Semi-implicit Euler step; clears the accumulated force
    pub fn integrate(&mut self, dt: f32) {
        self.velocity = (self.velocity + self.acceleration * dt).limit(self.max_speed);
        if !self.velocity.is_finite() {
            self.velocity = Vec2::ZERO;
        }
        self.position += self.velocity * dt;
        self.acceleration = Vec2::ZERO;
    }

    /// Wrap the position onto a `width` x `height` torus
    pub fn wrap(&mut self, width: f32, height: f32) {
        self.position.x = self.position.x.rem_euclid(width);
        self.position.y = self.position.y.rem_euclid(height);
        // rem_euclid can round up to the modulus itself
        if self.position.x >= width {
            self.position.x = 0.0;
        }
        if self.position.y >= height {
            self.position.y = 0.0;
        }
    }

    /// Mark aggressive for at least `window` time units
    pub fn prime(&mut self, window: f32, priority: u8) {
        self.aggressive = true;
        self.aggressive_timeout = self.aggressive_timeout.max(window);
        self.attack_priority = self.attack_priority.max(priority).min(10);
    }

    /// Adopt `objective` as the current target
    pub fn acquire(&mut self, objective: ObjectiveId) {
        self.objective = Some(objective);
        if self.state == AgentState::Idle {
            self.state = AgentState::Seeking;
        }
    }

    /// Forget the current objective and fall back to idle
    pub fn drop_objective(&mut self) {
        self.objective = None;
        if matches!(self.state, AgentState::Seeking | AgentState::Attacking) {
            self.state = AgentState::Idle;
        }
        if let ArchetypeState::Swimmer { vote, in_surge } = &mut self.kind {
            *vote = None;
            *in_surge = false;
        }
    }

    /// Queue a broadcast of our own about `payload`
    pub fn announce(&mut self, kind: MessageKind, payload: Vec2) {
        self.outbox
            .push(Message::new(kind, self.id, self.position, payload));
    }

    /// Drain the mailbox and react to each message
    ///
    /// `resolve` maps a payload position to a live objective; unresolvable
    /// messages are dropped. At most one transition happens per message kind,
    /// and a message that would not change anything is a no-op, so duplicate
    /// deliveries are harmless. Accepted messages below the hop limit are
    /// queued in the outbox for relay. Returns the number of messages acted on.
    pub fn process_messages<F>(&mut self, resolve: F, config: &MessagingConfig) -> usize
    where
        F: Fn(Vec2) -> Option<ObjectiveId>,
    {
        let mut handled_found = false;
        let mut handled_attack = false;
        let mut acted = 0;

        for message in self.mailbox.drain() {
            let handled = match message.kind {
                MessageKind::TargetFound => &mut handled_found,
                MessageKind::AttackNow => &mut handled_attack,
            };
            if *handled {
                continue;
            }
            let Some(objective) = resolve(message.payload) else {
                continue;
            };

            let changed = match message.kind {
                MessageKind::TargetFound => self.on_target_found(objective, config),
                MessageKind::AttackNow => self.on_attack_now(objective, config),
            };
            if !changed {
                continue;
            }
            *handled = true;
            acted += 1;

            if message.hops < config.max_hops {
                self.outbox.push(message.relayed_by(self.id, self.position));
            }
        }
        acted
    }

    fn on_target_found(&mut self, objective: ObjectiveId, config: &MessagingConfig) -> bool {
        if self.aggressive
            && self.objective == Some(objective)
            && self.attack_priority >= config.target_found_priority
        {
            return false;
        }
        self.prime(config.message_aggression_window, config.target_found_priority);
        self.acquire(objective);
        true
    }

    fn on_attack_now(&mut self, objective: ObjectiveId, config: &MessagingConfig) -> bool {
        let settled = self.state == AgentState::Attacking || self.is_resting();
        if self.aggressive
            && self.objective == Some(objective)
            && self.attack_priority >= config.attack_now_priority
            && settled
        {
            return false;
        }
        self.prime(config.message_aggression_window, config.attack_now_priority);
        self.objective = Some(objective);
        if !self.is_resting() {
            self.state = AgentState::Attacking;
        }
        true
    }

    /// Count down the aggression window
    ///
    /// Aggression lapses only once the window has run out and no objective
    /// is held.
    pub fn decay_aggression(&mut self, dt: f32) {
        if !self.aggressive {
            return;
        }
        self.aggressive_timeout -= dt;
        if self.aggressive_timeout <= 0.0 && self.objective.is_none() {
            self.aggressive = false;
            self.aggressive_timeout = 0.0;
            self.attack_priority = 0;
            if !self.is_resting() {
                self.state = AgentState::Idle;
            }
        }
    }

    /// Drain energy for motion, recover while idle, and handle rest hysteresis
    pub fn update_energy(&mut self, dt: f32, config: &EnergyConfig) -> Option<EnergyTransition> {
        let mut drain = self.velocity.length() * config.movement_drain * dt;
        if self.state == AgentState::Attacking {
            drain *= config.attack_drain_multiplier;
        }
        self.energy -= drain;
        if matches!(self.state, AgentState::Idle | AgentState::Resting) {
            self.energy += config.recovery_rate * dt;
        }
        self.energy = self.energy.clamp(0.0, config.max_energy);

        if !self.is_resting() && self.energy < config.low_threshold {
            self.state = AgentState::Resting;
            return Some(EnergyTransition::StartedResting);
        }
        if self.is_resting() && self.energy > config.recover_threshold {
            self.state = if self.objective.is_some() {
                AgentState::Seeking
            } else {
                AgentState::Idle
            };
            return Some(EnergyTransition::Recovered);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flyer() -> Agent {
        Agent::new(
            AgentId(1),
            Archetype::Flyer,
            EnvironmentKind::Air,
            Vec2::new(100.0, 100.0),
            &ArchetypeConfig::flyer(),
            100.0,
        )
    }

    fn found(hops: u8) -> Message {
        let mut message = Message::new(
            MessageKind::TargetFound,
            AgentId(7),
            Vec2::new(90.0, 100.0),
            Vec2::new(400.0, 400.0),
        );
        message.hops = hops;
        message
    }

    fn resolve_all(_: Vec2) -> Option<ObjectiveId> {
        Some(ObjectiveId(3))
    }

    #[test]
    fn test_target_found_primes_agent() {
        let config = MessagingConfig::default();
        let mut agent = flyer();
        agent.receive(found(0));

        assert_eq!(agent.process_messages(resolve_all, &config), 1);
        assert!(agent.aggressive);
        assert_eq!(agent.aggressive_timeout, 25.0);
        assert_eq!(agent.attack_priority, 8);
        assert_eq!(agent.state, AgentState::Seeking);
        assert_eq!(agent.objective, Some(ObjectiveId(3)));
        assert_eq!(agent.outbox.len(), 1);
        assert_eq!(agent.outbox[0].hops, 1);
        assert_eq!(agent.outbox[0].sender, AgentId(1));
    }

    #[test]
    fn test_duplicate_target_found_is_noop() {
        let config = MessagingConfig::default();
        let mut agent = flyer();
        agent.receive(found(0));
        agent.process_messages(resolve_all, &config);
        let outbox_len = agent.outbox.len();
        let timeout = agent.aggressive_timeout;

        agent.receive(found(0));
        assert_eq!(agent.process_messages(resolve_all, &config), 0);
        assert_eq!(agent.outbox.len(), outbox_len);
        assert_eq!(agent.aggressive_timeout, timeout);
        assert_eq!(agent.state, AgentState::Seeking);
    }

    #[test]
    fn test_second_drain_of_empty_mailbox_changes_nothing() {
        let config = MessagingConfig::default();
        let mut agent = flyer();
        agent.receive(found(0));
        let mut attack = found(1);
        attack.kind = MessageKind::AttackNow;
        agent.receive(attack);
        assert_eq!(agent.process_messages(resolve_all, &config), 2);
        assert!(agent.mailbox.is_empty());

        let before = agent.clone();
        assert_eq!(agent.process_messages(resolve_all, &config), 0);
        assert_eq!(agent, before);
    }

    #[test]
    fn test_one_transition_per_kind() {
        let config = MessagingConfig::default();
        let mut agent = flyer();
        agent.receive(found(0));
        agent.receive(found(2));
        assert_eq!(agent.process_messages(resolve_all, &config), 1);
        assert!(agent.mailbox.is_empty());
    }

    #[test]
    fn test_unresolvable_message_dropped() {
        let config = MessagingConfig::default();
        let mut agent = flyer();
        agent.receive(found(0));
        assert_eq!(agent.process_messages(|_| None, &config), 0);
        assert!(!agent.aggressive);
        assert!(agent.outbox.is_empty());
    }

    #[test]
    fn test_hop_limit_stops_relay() {
        let config = MessagingConfig::default();
        let mut agent = flyer();
        agent.receive(found(config.max_hops));
        assert_eq!(agent.process_messages(resolve_all, &config), 1);
        assert!(agent.aggressive);
        assert!(agent.outbox.is_empty());
    }

    #[test]
    fn test_attack_now_from_idle() {
        let config = MessagingConfig::default();
        let mut agent = flyer();
        let mut message = found(0);
        message.kind = MessageKind::AttackNow;
        agent.receive(message);
        agent.process_messages(resolve_all, &config);
        assert_eq!(agent.state, AgentState::Attacking);
        assert_eq!(agent.attack_priority, 9);
    }

    #[test]
    fn test_aggression_decays_without_objective() {
        let mut agent = flyer();
        agent.prime(1.0, 8);
        agent.decay_aggression(0.5);
        assert!(agent.aggressive);
        agent.decay_aggression(0.5);
        assert!(!agent.aggressive);
        assert_eq!(agent.attack_priority, 0);
        assert_eq!(agent.state, AgentState::Idle);
    }

    #[test]
    fn test_aggression_persists_while_holding_objective() {
        let mut agent = flyer();
        agent.prime(1.0, 8);
        agent.acquire(ObjectiveId(0));
        agent.decay_aggression(5.0);
        assert!(agent.aggressive);
    }

    #[test]
    fn test_rest_hysteresis() {
        let config = EnergyConfig::default();
        let mut agent = flyer();
        agent.energy = 15.0;
        assert_eq!(agent.update_energy(0.1, &config), Some(EnergyTransition::StartedResting));
        assert!(agent.is_resting());

        agent.energy = 55.0;
        assert_eq!(agent.update_energy(0.1, &config), None);
        assert!(agent.is_resting());

        agent.energy = 60.5;
        assert_eq!(agent.update_energy(0.1, &config), Some(EnergyTransition::Recovered));
        assert_eq!(agent.state, AgentState::Idle);
    }

    #[test]
    fn test_attacking_drains_double() {
        let config = EnergyConfig::default();
        let mut cruising = flyer();
        cruising.state = AgentState::Seeking;
        cruising.velocity = Vec2::new(100.0, 0.0);
        let mut attacking = cruising.clone();
        attacking.state = AgentState::Attacking;

        cruising.update_energy(1.0, &config);
        attacking.update_energy(1.0, &config);
        assert!((100.0 - cruising.energy - 5.0).abs() < 1e-4);
        assert!((100.0 - attacking.energy - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_integrate_clamps_speed_and_wraps() {
        let mut agent = flyer();
        agent.position = Vec2::new(1275.0, 5.0);
        agent.velocity = Vec2::new(500.0, 0.0);
        agent.integrate(0.1);
        assert!(agent.velocity.length() <= agent.max_speed + 1e-3);
        agent.wrap(1280.0, 720.0);
        assert!(agent.position.x >= 0.0 && agent.position.x < 1280.0);
        assert!((agent.position.x - 7.0).abs() < 1e-3);
    }
}

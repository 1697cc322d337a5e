//! Entity state for the simulation
//!
//! Entities are plain structs owned by their containers: the player and
//! projectiles by [`SimState`](super::SimState), enemies and drops by their
//! spawn [`Room`](crate::dungeon::Room). Cross-entity references are id
//! pairs, never pointers.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Weak reference to an enemy: owning room key plus entity id.
///
/// Resolved fresh at every use; a dead or missing result means the holder
/// re-acquires or carries on without a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyRef {
    pub room_key: u64,
    pub id: u32,
}

/// Floating damage value attached to an enemy; feedback only
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DamageNumber {
    pub amount: u32,
    pub age: f32,
}

/// What a removed enemy leaves on the floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Coin { amount: u32 },
    Heart,
}

/// A dropped item waiting to be picked up
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pickup {
    pub kind: PickupKind,
    pub pos: Vec2,
}

/// A hostile dungeon inhabitant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub health: u32,
    pub alive: bool,
    /// Remaining grace between death and removal; drives the death animation
    pub death_timer: f32,
    /// Seconds until the next contact attack is allowed
    pub attack_cooldown: f32,
    /// Impulse applied while `knockback_left` runs
    pub knockback: Vec2,
    pub knockback_left: f32,
    pub damage_numbers: Vec<DamageNumber>,
}

impl Enemy {
    pub fn new(id: u32, pos: Vec2, config: &Config) -> Self {
        Self {
            id,
            pos,
            radius: config.enemy_radius,
            health: config.enemy_health,
            alive: true,
            death_timer: 0.0,
            attack_cooldown: 0.0,
            knockback: Vec2::ZERO,
            knockback_left: 0.0,
            damage_numbers: Vec::new(),
        }
    }

    /// The single damage entry point. Dead enemies take nothing; a hit that
    /// floors health triggers the death transition; every non-lethal hit
    /// records a floating damage number and arms a knockback impulse.
    pub fn take_hit(&mut self, amount: u32, knockback_dir: Vec2, config: &Config) {
        if !self.alive {
            return;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.alive = false;
            self.death_timer = config.death_linger;
        } else {
            self.damage_numbers.push(DamageNumber { amount, age: 0.0 });
            self.knockback = knockback_dir * config.knockback_speed;
            self.knockback_left = config.knockback_duration;
        }
    }

    /// This frame's knockback contribution: linear falloff over the
    /// knockback window, exactly zero once the timer has elapsed
    pub fn knockback_velocity(&self, config: &Config) -> Vec2 {
        if self.knockback_left <= 0.0 || config.knockback_duration <= 0.0 {
            Vec2::ZERO
        } else {
            self.knockback * (self.knockback_left / config.knockback_duration)
        }
    }

    /// Dead and past the linger window; ready for removal
    pub fn expired(&self) -> bool {
        !self.alive && self.death_timer <= 0.0
    }
}

/// One melee swing in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swing {
    pub elapsed: f32,
    /// Facing angle captured when the swing started
    pub start_angle: f32,
    /// Enemies already hit by this swing; one swing lands at most once each
    pub already_hit: Vec<u32>,
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    /// Facing angle in radians, updated from movement intent
    pub facing: f32,
    pub health: u32,
    /// Post-hit invulnerability window
    pub grace: f32,
    pub swing: Option<Swing>,
    /// Seconds the fire button has been held; `None` when not charging
    pub charge: Option<f32>,
    pub coins: u32,
}

impl Player {
    pub fn new(pos: Vec2, config: &Config) -> Self {
        Self {
            pos,
            radius: config.player_radius,
            facing: 0.0,
            health: config.player_health,
            grace: 0.0,
            swing: None,
            charge: None,
            coins: 0,
        }
    }

    /// Begin a swing unless one is already in flight
    pub fn start_swing(&mut self) {
        if self.swing.is_none() {
            self.swing = Some(Swing {
                elapsed: 0.0,
                start_angle: self.facing,
                already_hit: Vec::new(),
            });
        }
    }

    /// Contact damage from an enemy; ignored during the grace window
    pub fn take_hit(&mut self, amount: u32, config: &Config) {
        if self.grace > 0.0 || self.is_dead() {
            return;
        }
        self.health = self.health.saturating_sub(amount);
        self.grace = config.player_grace;
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }
}

/// A shot in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    /// Unit direction of travel
    pub dir: Vec2,
    pub speed: f32,
    pub damage: u32,
    pub radius: f32,
    /// Fully charged shots curve toward their target
    pub homing: bool,
    pub target: Option<EnemyRef>,
    pub alive: bool,
}

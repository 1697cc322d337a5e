//! Simulation tunables
//!
//! Constructed once by the embedding and immutable for the lifetime of the
//! simulation. Defaults reproduce the reference behavior (64 px tiles,
//! 28-tile rooms, 2-tile doors, 10000-room cap).

use serde::{Deserialize, Serialize};

/// How freshly chosen doors are positioned along their wall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DoorPlacement {
    /// Every door sits at the wall midpoint; readable, consistent interiors
    #[default]
    Centered,
    /// Doors land anywhere along the wall excluding corner cells
    Random,
}

/// Immutable simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // === World ===
    /// Pixel width of one tile
    pub tile_size: f32,
    /// Tiles per room side
    pub room_size: i32,
    /// Door gap width in tiles
    pub door_width: i32,
    /// Minimum doors carved per room, candidates permitting
    pub min_doors: usize,
    pub door_placement: DoorPlacement,
    /// Hard ceiling on materialized rooms; generation fails closed beyond it
    pub room_cap: usize,

    // === Population ===
    pub enemy_count_min: u32,
    pub enemy_count_max: u32,
    /// Enemies never spawn within this pixel radius of the avoid point
    pub spawn_exclusion_radius: f32,

    // === Movement ===
    pub player_radius: f32,
    /// Pixels per second
    pub player_speed: f32,
    pub enemy_radius: f32,
    pub enemy_speed: f32,
    /// Extra pixels added to steering wall probes, steers around corners
    /// before visual contact
    pub avoidance_margin: f32,
    /// Per-second gain on the separation push between crowded enemies
    pub separation_gain: f32,

    // === Health ===
    pub player_health: u32,
    pub enemy_health: u32,
    pub contact_damage: u32,
    /// Seconds between contact attacks from one enemy
    pub contact_cooldown: f32,
    /// Post-hit invulnerability window for the player
    pub player_grace: f32,

    // === Melee ===
    /// Full swing duration; the hit window spans all of it
    pub swing_duration: f32,
    /// Forward extension of the hand segment
    pub swing_reach: f32,
    /// Distance from player center to each hand
    pub hand_offset: f32,
    pub melee_damage: u32,
    /// Slack added to the enemy radius in the segment hit test
    pub hit_margin: f32,
    pub knockback_duration: f32,
    /// Initial knockback impulse, pixels per second
    pub knockback_speed: f32,

    // === Projectiles ===
    pub projectile_radius: f32,
    /// Speed of an uncharged shot
    pub projectile_speed_min: f32,
    /// Speed of a fully charged shot; also the homing speed clamp
    pub projectile_speed_max: f32,
    pub projectile_damage_min: u32,
    pub projectile_damage_max: u32,
    /// Seconds of held fire for a full charge
    pub charge_time: f32,
    /// Per-second interpolation rate of homing direction smoothing
    pub homing_rate: f32,

    // === Lifecycle ===
    /// Grace period between enemy death and removal
    pub death_linger: f32,
    /// Pickup reach beyond the player radius; doubled while interacting
    pub pickup_reach: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tile_size: 64.0,
            room_size: 28,
            door_width: 2,
            min_doors: 3,
            door_placement: DoorPlacement::default(),
            room_cap: 10_000,

            enemy_count_min: 2,
            enemy_count_max: 4,
            spawn_exclusion_radius: 320.0,

            player_radius: 30.0,
            player_speed: 300.0,
            enemy_radius: 24.0,
            enemy_speed: 140.0,
            avoidance_margin: 3.0,
            separation_gain: 6.0,

            player_health: 6,
            enemy_health: 5,
            contact_damage: 1,
            contact_cooldown: 0.8,
            player_grace: 0.5,

            swing_duration: 0.35,
            swing_reach: 40.0,
            hand_offset: 26.0,
            melee_damage: 1,
            hit_margin: 6.0,
            knockback_duration: 0.18,
            knockback_speed: 520.0,

            projectile_radius: 6.0,
            projectile_speed_min: 420.0,
            projectile_speed_max: 720.0,
            projectile_damage_min: 1,
            projectile_damage_max: 3,
            charge_time: 0.6,
            homing_rate: 6.0,

            death_linger: 0.4,
            pickup_reach: 10.0,
        }
    }
}

impl Config {
    /// Pixel width of one room side
    pub fn room_pixels(&self) -> f32 {
        self.room_size as f32 * self.tile_size
    }

    /// Door offset that centers the gap on its wall
    pub fn centered_door_offset(&self) -> i32 {
        (self.room_size - self.door_width) / 2
    }

    /// Inclusive offset bounds that keep a door clear of both corners
    pub fn door_offset_range(&self) -> (i32, i32) {
        (1, self.room_size - 1 - self.door_width)
    }

    /// Center-to-center distance at which player and enemy touch
    pub fn contact_range(&self) -> f32 {
        self.player_radius + self.enemy_radius
    }

    /// Charge fraction in `[0, 1]` after holding fire for `held` seconds
    pub fn charge_fraction(&self, held: f32) -> f32 {
        if self.charge_time <= 0.0 {
            1.0
        } else {
            (held / self.charge_time).clamp(0.0, 1.0)
        }
    }
}

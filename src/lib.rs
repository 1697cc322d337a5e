//! Endless Delve - simulation core for a top-down dungeon crawler
//!
//! Core modules:
//! - `dungeon`: lazy room-graph generation with door alignment guarantees
//! - `sim`: fixed-step simulation (movement, steering, combat, lifecycle)
//! - `config`: immutable tunables
//!
//! Rendering, input binding, audio, and the outer frame loop live in the
//! embedding application. The core guarantees logical and positional
//! correctness only; it exposes read-only snapshots for drawing and never
//! touches a display.

pub mod config;
pub mod dungeon;
pub mod sim;

pub use config::{Config, DoorPlacement};
pub use dungeon::{Cell, Direction, Dungeon, Room, RoomCoord};
pub use sim::{FrameInput, FrameResult, SimState};

/// Fixed internal constants; embedding-facing tunables live in [`Config`]
pub mod consts {
    /// Circumference samples for mover wall tests (45 degree step)
    pub const MOVER_SAMPLES: u32 = 8;
    /// Circumference samples for projectile wall tests (22.5 degree step)
    pub const PROJECTILE_SAMPLES: u32 = 16;
    /// Guard against normalizing a zero-length vector
    pub const EPSILON: f32 = 1e-4;
    /// Largest dt a single frame will integrate (tab switches, debuggers)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Placement attempts per requested enemy before giving up
    pub const PLACEMENT_ATTEMPTS: u32 = 12;
    /// Ring radius limit for the spawn search, in tiles
    pub const SPAWN_SEARCH_RADIUS: i32 = 10;
    /// Hand spread of the melee swing, radians off the facing angle
    pub const HAND_SPREAD: f32 = std::f32::consts::FRAC_PI_3;
    /// Total visual sweep of a melee swing, radians
    pub const SWING_ARC: f32 = 2.6;
    /// Seconds a floating damage number stays attached to its enemy
    pub const DAMAGE_NUMBER_LIFETIME: f32 = 0.6;
    /// Fraction of the contact range an enemy may never close below
    pub const PLAYER_SEPARATION: f32 = 0.75;
    /// Extra reach, in pixels, for enemy contact attacks
    pub const CONTACT_SLACK: f32 = 2.0;
}

/// Tile column/row containing a pixel coordinate
#[inline]
pub fn pixel_to_tile(p: f32, tile_size: f32) -> i32 {
    (p / tile_size).floor() as i32
}

/// Room index containing a tile coordinate
#[inline]
pub fn tile_to_room(t: i32, room_size: i32) -> i32 {
    t.div_euclid(room_size)
}

/// Tile position within its room, always in `[0, room_size)`
#[inline]
pub fn local_index(t: i32, room_size: i32) -> i32 {
    t.rem_euclid(room_size)
}

/// Inverse of [`tile_to_room`] + [`local_index`]
#[inline]
pub fn room_local_to_tile(room: i32, local: i32, room_size: i32) -> i32 {
    room * room_size + local
}

/// Pixel coordinate of a tile's center
#[inline]
pub fn tile_center(t: i32, tile_size: f32) -> f32 {
    (t as f32 + 0.5) * tile_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_to_tile_negative() {
        assert_eq!(pixel_to_tile(0.0, 64.0), 0);
        assert_eq!(pixel_to_tile(63.9, 64.0), 0);
        assert_eq!(pixel_to_tile(64.0, 64.0), 1);
        assert_eq!(pixel_to_tile(-0.1, 64.0), -1);
        assert_eq!(pixel_to_tile(-64.0, 64.0), -1);
        assert_eq!(pixel_to_tile(-64.1, 64.0), -2);
    }

    #[test]
    fn test_local_index_non_negative() {
        for t in -100..100 {
            let local = local_index(t, 28);
            assert!((0..28).contains(&local), "tile {t} gave local {local}");
        }
    }

    #[test]
    fn test_tile_room_local_bijection() {
        for t in -100..100 {
            let room = tile_to_room(t, 28);
            let local = local_index(t, 28);
            assert_eq!(room_local_to_tile(room, local, 28), t);
        }
    }

    #[test]
    fn test_tile_center_round_trips() {
        for t in [-37, -1, 0, 1, 42] {
            let center = tile_center(t, 64.0);
            assert_eq!(pixel_to_tile(center, 64.0), t);
        }
    }
}

//! Fixed-step simulation
//!
//! All gameplay logic lives here. The module is deterministic and headless:
//! - one synchronous update per `advance` call, no overlapping steps
//! - seeded RNG only
//! - no rendering or platform dependencies
//!
//! The embedding drives it with a per-frame dt and an input intent, and
//! draws from the read-only [`FrameResult`] snapshot.

pub mod collision;
pub mod combat;
pub mod state;
pub mod steering;
pub mod tick;

pub use state::{DamageNumber, Enemy, EnemyRef, Pickup, PickupKind, Player, Projectile, Swing};
pub use tick::{
    EnemyView, FrameInput, FrameResult, PickupView, PlayerView, ProjectileView, RoomView,
    SimState, SwingView,
};

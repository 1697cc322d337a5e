//! Lazy room-graph dungeon
//!
//! The world is an unbounded grid of fixed-size rooms, materialized on
//! demand and memoized for the process lifetime. Generation is seeded and
//! coordinate-derived, so a room's layout is a pure function of the world
//! seed and its coordinate. The one cross-room constraint is door
//! alignment: a shared wall between two materialized rooms always carries
//! matching door offsets, regardless of which side generated first.

pub mod room;
pub mod store;

pub use room::{Cell, Direction, NeighborView, Room, RoomCoord};
pub use store::Dungeon;

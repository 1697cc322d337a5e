//! Sparse room arena with lazy, capped generation
//!
//! Rooms are memoized in a map keyed by packed coordinates and generated at
//! most once. Materialization happens in two passes over a 3x3 block so
//! that door-alignment lookups always see a real (possibly still blank)
//! neighbor instead of a hole. Once the room cap is hit the store fails
//! closed: lookups return the "no room" sentinel and callers treat the
//! area as permanently solid.

use std::collections::HashMap;

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::room::{Cell, Direction, NeighborView, Room, RoomCoord};
use crate::config::Config;
use crate::{local_index, pixel_to_tile, tile_to_room};

/// Salt for the layout stream of a room's RNG
const LAYOUT_STREAM: u64 = 0;
/// Salt for the population stream of a room's RNG
const POPULATION_STREAM: u64 = 1;

/// The sparse dungeon: lazily materialized rooms plus global wall queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dungeon {
    config: Config,
    seed: u64,
    rooms: HashMap<u64, Room>,
    /// Sticky once generation has hit the configured room cap
    capped: bool,
    next_entity_id: u32,
}

impl Dungeon {
    pub fn new(seed: u64, config: Config) -> Self {
        Self {
            config,
            seed,
            rooms: HashMap::new(),
            capped: false,
            next_entity_id: 1,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// True once generation has been refused at least once
    pub fn is_capped(&self) -> bool {
        self.capped
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Globally unique id for a newly spawned entity
    pub fn alloc_entity_id(&mut self) -> u32 {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    pub fn room(&self, coord: RoomCoord) -> Option<&Room> {
        self.rooms.get(&coord.pack())
    }

    pub fn room_mut(&mut self, coord: RoomCoord) -> Option<&mut Room> {
        self.rooms.get_mut(&coord.pack())
    }

    /// The room's RNG stream for one concern; a pure function of the world
    /// seed and the coordinate, so regeneration would reproduce the layout
    fn room_rng(&self, coord: RoomCoord, salt: u64) -> Pcg32 {
        let key = coord.pack().wrapping_mul(0x9E37_79B9_7F4A_7C15);
        Pcg32::new(self.seed.wrapping_add(key), key ^ salt)
    }

    /// Materialize a blank room if absent. Returns false only when the room
    /// does not exist and the cap forbids creating it.
    fn ensure_blank(&mut self, coord: RoomCoord) -> bool {
        if self.rooms.contains_key(&coord.pack()) {
            return true;
        }
        if self.rooms.len() >= self.config.room_cap {
            if !self.capped {
                log::warn!(
                    "room cap {} reached; refusing to materialize ({}, {})",
                    self.config.room_cap,
                    coord.x,
                    coord.y
                );
            }
            self.capped = true;
            return false;
        }
        self.rooms
            .insert(coord.pack(), Room::blank(coord, self.config.room_size));
        true
    }

    fn neighbor_views(&self, coord: RoomCoord) -> [NeighborView; 4] {
        let mut views = [NeighborView::Absent; 4];
        for dir in Direction::ALL {
            views[dir.index()] = match self.room(coord.neighbor(dir)) {
                None => NeighborView::Absent,
                Some(room) if !room.is_built() => NeighborView::Pending,
                Some(room) => NeighborView::Built(room.door(dir.opposite())),
            };
        }
        views
    }

    /// Record negotiated alignment on both sides of every matched door
    fn link_aligned(&mut self, coord: RoomCoord) {
        for dir in Direction::ALL {
            let Some(offset) = self.room(coord).and_then(|r| r.door(dir)) else {
                continue;
            };
            let ncoord = coord.neighbor(dir);
            let matched = self
                .room(ncoord)
                .is_some_and(|n| n.is_built() && n.door(dir.opposite()) == Some(offset));
            if !matched {
                continue;
            }
            if let Some(room) = self.rooms.get_mut(&coord.pack()) {
                room.note_aligned(ncoord);
            }
            if let Some(neighbor) = self.rooms.get_mut(&ncoord.pack()) {
                neighbor.note_aligned(coord);
            }
        }
    }

    /// Carve, place doors, and populate one existing room. Idempotent.
    fn build_room(&mut self, coord: RoomCoord, avoid: Option<(Vec2, f32)>) {
        let needs_build = self.room(coord).is_some_and(|r| !r.is_built());
        if needs_build {
            let views = self.neighbor_views(coord);
            let mut rng = self.room_rng(coord, LAYOUT_STREAM);
            if let Some(room) = self.rooms.get_mut(&coord.pack()) {
                room.build(&views, &self.config, &mut rng);
            }
            self.link_aligned(coord);
        }
        let needs_population = self.room(coord).is_some_and(|r| !r.is_populated());
        if needs_population {
            let mut rng = self.room_rng(coord, POPULATION_STREAM);
            if let Some(room) = self.rooms.get_mut(&coord.pack()) {
                room.populate(&self.config, &mut rng, avoid, &mut self.next_entity_id);
            }
        }
    }

    /// Memoized lookup-or-generate. `None` is the sentinel for "generation
    /// refused by the room cap"; callers treat the area as solid.
    pub fn get_or_create(&mut self, coord: RoomCoord) -> Option<&Room> {
        if !self.ensure_blank(coord) {
            return None;
        }
        self.build_room(coord, None);
        self.room(coord)
    }

    /// The 3x3 block of coordinates around a center, row-major
    pub fn neighborhood(center: RoomCoord) -> impl Iterator<Item = RoomCoord> {
        (-1..=1).flat_map(move |dy| {
            (-1..=1).map(move |dx| RoomCoord::new(center.x + dx, center.y + dy))
        })
    }

    /// Materialize the 3x3 block around `center` in two passes: first the
    /// blank placeholders (so pass 2's door lookups always see a real room),
    /// then carving, door placement, and population for each.
    ///
    /// `avoid` shields a pixel radius from enemy placement; used for the
    /// player's own spawn room.
    pub fn load_neighborhood(&mut self, center: RoomCoord, avoid: Option<(Vec2, f32)>) {
        for coord in Self::neighborhood(center) {
            self.ensure_blank(coord);
        }
        for coord in Self::neighborhood(center) {
            if self.room(coord).is_some() {
                self.build_room(coord, avoid);
            }
        }
        log::debug!(
            "neighborhood around ({}, {}) loaded, {} rooms total",
            center.x,
            center.y,
            self.rooms.len()
        );
    }

    /// Cell under a tile coordinate; `None` when the owning room was never
    /// materialized. A blank (pass-1) room reads as all wall.
    pub fn cell_at_tile(&self, tx: i32, ty: i32) -> Option<Cell> {
        let size = self.config.room_size;
        let coord = RoomCoord::new(tile_to_room(tx, size), tile_to_room(ty, size));
        self.room(coord)
            .map(|room| room.cell(local_index(tx, size), local_index(ty, size)))
    }

    /// Non-generating wall probe; absent rooms are solid. This is the
    /// read path for collision, combat, and renderer queries — it can
    /// never materialize a room mid-frame.
    pub fn probe_wall_at_tile(&self, tx: i32, ty: i32) -> bool {
        self.cell_at_tile(tx, ty).is_none_or(Cell::is_wall)
    }

    /// Non-generating wall probe in pixel space
    pub fn probe_wall_at_pixel(&self, p: Vec2) -> bool {
        let ts = self.config.tile_size;
        self.probe_wall_at_tile(pixel_to_tile(p.x, ts), pixel_to_tile(p.y, ts))
    }

    /// Generating wall query in pixel space: materializes the owning room
    /// first. A cap refusal reads as solid.
    pub fn wall_at_pixel(&mut self, p: Vec2) -> bool {
        let ts = self.config.tile_size;
        let size = self.config.room_size;
        let (tx, ty) = (pixel_to_tile(p.x, ts), pixel_to_tile(p.y, ts));
        let coord = RoomCoord::new(tile_to_room(tx, size), tile_to_room(ty, size));
        match self.get_or_create(coord) {
            Some(room) => room.cell(local_index(tx, size), local_index(ty, size)).is_wall(),
            None => true,
        }
    }
}

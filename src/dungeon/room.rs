//! Room grids, doors, and per-room generation
//!
//! A room is a square block of wall/floor cells with up to one door per
//! wall. Rooms generate independently; the alignment rule in [`Room::build`]
//! copies the door offset of any already-built neighbor, which keeps shared
//! walls consistent no matter the generation order.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::{Config, DoorPlacement};
use crate::consts::PLACEMENT_ATTEMPTS;
use crate::sim::state::{Enemy, Pickup};
use crate::{room_local_to_tile, tile_center};

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Floor,
}

impl Cell {
    #[inline]
    pub fn is_wall(self) -> bool {
        self == Cell::Wall
    }
}

/// Cardinal wall directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Room-coordinate offset toward the neighbor on this side.
    /// Y grows downward (screen space), so North is -y.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    /// The wall a neighbor presents back toward this room
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East => 2,
            Direction::West => 3,
        }
    }
}

/// Integer room coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomCoord {
    pub x: i32,
    pub y: i32,
}

impl RoomCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn neighbor(self, dir: Direction) -> RoomCoord {
        let (dx, dy) = dir.offset();
        RoomCoord::new(self.x + dx, self.y + dy)
    }

    /// Packed arena key, stable across runs
    pub fn pack(self) -> u64 {
        ((self.x as u32 as u64) << 32) | self.y as u32 as u64
    }

    pub fn unpack(key: u64) -> RoomCoord {
        RoomCoord::new((key >> 32) as u32 as i32, key as u32 as i32)
    }
}

/// What the generator can see of one neighboring room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborView {
    /// No room materialized on that side
    Absent,
    /// Room exists but has not committed walls or doors yet
    Pending,
    /// Room is built; carries its door offset on the shared wall, if any
    Built(Option<i32>),
}

/// A room's cell block, door set, and owned entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub coord: RoomCoord,
    size: i32,
    grid: Vec<Cell>,
    /// Door offset along each wall, indexed per `Direction::index`
    doors: [Option<i32>; 4],
    /// Neighbors this room has negotiated door alignment with
    aligned: Vec<RoomCoord>,
    built: bool,
    populated: bool,
    pub enemies: Vec<Enemy>,
    pub pickups: Vec<Pickup>,
}

impl Room {
    /// A fully walled placeholder; pass 1 of neighborhood loading
    pub fn blank(coord: RoomCoord, size: i32) -> Self {
        Self {
            coord,
            size,
            grid: vec![Cell::Wall; (size * size) as usize],
            doors: [None; 4],
            aligned: Vec::new(),
            built: false,
            populated: false,
            enemies: Vec::new(),
            pickups: Vec::new(),
        }
    }

    #[inline]
    pub fn size(&self) -> i32 {
        self.size
    }

    /// Cell at a local coordinate; out-of-range reads as wall
    pub fn cell(&self, lx: i32, ly: i32) -> Cell {
        if lx < 0 || lx >= self.size || ly < 0 || ly >= self.size {
            Cell::Wall
        } else {
            self.grid[(ly * self.size + lx) as usize]
        }
    }

    fn set_cell(&mut self, lx: i32, ly: i32, cell: Cell) {
        debug_assert!(lx >= 0 && lx < self.size && ly >= 0 && ly < self.size);
        self.grid[(ly * self.size + lx) as usize] = cell;
    }

    /// Row-major cell slice, `size * size` long
    pub fn cells(&self) -> &[Cell] {
        &self.grid
    }

    pub fn door(&self, dir: Direction) -> Option<i32> {
        self.doors[dir.index()]
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Neighbors whose shared-wall doors are known to match this room's
    pub fn aligned_neighbors(&self) -> &[RoomCoord] {
        &self.aligned
    }

    pub(crate) fn note_aligned(&mut self, coord: RoomCoord) {
        if !self.aligned.contains(&coord) {
            self.aligned.push(coord);
        }
    }

    /// Carve the floor and commit the door set. Idempotent.
    ///
    /// Door rules, per wall:
    /// - a built neighbor with a door on the shared wall fixes our offset
    ///   to the same value (alignment invariant);
    /// - a built neighbor without one takes the wall out of play;
    /// - absent or pending neighbors leave the wall as a free candidate.
    /// Candidates are then consumed at random until the minimum door count
    /// is met or none remain.
    pub fn build(&mut self, neighbors: &[NeighborView; 4], config: &Config, rng: &mut Pcg32) {
        if self.built {
            return;
        }

        // floor rectangle with a 1-cell wall border
        for ly in 1..self.size - 1 {
            for lx in 1..self.size - 1 {
                self.set_cell(lx, ly, Cell::Floor);
            }
        }

        let mut door_count = 0;
        let mut candidates: Vec<Direction> = Vec::new();
        for dir in Direction::ALL {
            match neighbors[dir.index()] {
                NeighborView::Built(Some(offset)) => {
                    self.doors[dir.index()] = Some(offset);
                    door_count += 1;
                }
                NeighborView::Built(None) => {}
                NeighborView::Absent | NeighborView::Pending => candidates.push(dir),
            }
        }

        while door_count < config.min_doors && !candidates.is_empty() {
            let dir = candidates.swap_remove(rng.random_range(0..candidates.len()));
            let offset = match config.door_placement {
                DoorPlacement::Centered => config.centered_door_offset(),
                DoorPlacement::Random => {
                    let (lo, hi) = config.door_offset_range();
                    rng.random_range(lo..=hi)
                }
            };
            self.doors[dir.index()] = Some(offset);
            door_count += 1;
        }

        for dir in Direction::ALL {
            if let Some(offset) = self.doors[dir.index()] {
                self.carve_door(dir, offset, config.door_width);
            }
        }

        self.built = true;
        log::debug!(
            "built room ({}, {}) with {} doors",
            self.coord.x,
            self.coord.y,
            door_count
        );
    }

    fn carve_door(&mut self, dir: Direction, offset: i32, width: i32) {
        let last = self.size - 1;
        for i in 0..width {
            let along = (offset + i).clamp(1, last - 1);
            match dir {
                Direction::North => self.set_cell(along, 0, Cell::Floor),
                Direction::South => self.set_cell(along, last, Cell::Floor),
                Direction::West => self.set_cell(0, along, Cell::Floor),
                Direction::East => self.set_cell(last, along, Cell::Floor),
            }
        }
    }

    /// Spawn this room's enemy population. Runs at most once per room;
    /// re-entry never re-spawns.
    ///
    /// Placement is rejection sampling over floor cells, refusing spots
    /// that crowd an already-placed enemy or fall inside the avoid radius
    /// (the player's spawn area). Attempts are bounded; a crowded room
    /// simply ends up with fewer enemies than rolled.
    pub fn populate(
        &mut self,
        config: &Config,
        rng: &mut Pcg32,
        avoid: Option<(Vec2, f32)>,
        next_id: &mut u32,
    ) {
        if self.populated {
            return;
        }
        self.populated = true;

        let want = rng.random_range(config.enemy_count_min..=config.enemy_count_max);
        let mut placed = 0u32;
        let mut attempts = want * PLACEMENT_ATTEMPTS;
        while placed < want && attempts > 0 {
            attempts -= 1;
            let lx = rng.random_range(1..self.size - 1);
            let ly = rng.random_range(1..self.size - 1);
            if self.cell(lx, ly).is_wall() {
                continue;
            }
            let pos = Vec2::new(
                tile_center(room_local_to_tile(self.coord.x, lx, self.size), config.tile_size),
                tile_center(room_local_to_tile(self.coord.y, ly, self.size), config.tile_size),
            );
            if let Some((point, radius)) = avoid {
                if pos.distance(point) < radius {
                    continue;
                }
            }
            if self
                .enemies
                .iter()
                .any(|e| pos.distance(e.pos) < config.enemy_radius * 2.0)
            {
                continue;
            }
            let id = *next_id;
            *next_id += 1;
            self.enemies.push(Enemy::new(id, pos, config));
            placed += 1;
        }

        if placed < want {
            log::debug!(
                "room ({}, {}) placed {placed}/{want} enemies",
                self.coord.x,
                self.coord.y
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn test_rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    #[test]
    fn test_room_coord_pack_round_trips() {
        for coord in [
            RoomCoord::new(0, 0),
            RoomCoord::new(-1, 3),
            RoomCoord::new(1_000_000, -1_000_000),
        ] {
            assert_eq!(RoomCoord::unpack(coord.pack()), coord);
        }
        // distinct coords never collide on the packed key
        assert_ne!(
            RoomCoord::new(-1, 0).pack(),
            RoomCoord::new(0, -1).pack()
        );
    }

    #[test]
    fn test_blank_room_is_solid() {
        let room = Room::blank(RoomCoord::new(0, 0), 28);
        for ly in 0..28 {
            for lx in 0..28 {
                assert!(room.cell(lx, ly).is_wall());
            }
        }
        assert!(!room.is_built());
    }

    #[test]
    fn test_build_leaves_border_except_doors() {
        let config = Config::default();
        let mut room = Room::blank(RoomCoord::new(0, 0), config.room_size);
        room.build(&[NeighborView::Absent; 4], &config, &mut test_rng());

        // interior is floor
        assert_eq!(room.cell(1, 1), Cell::Floor);
        assert_eq!(room.cell(14, 14), Cell::Floor);
        // corners stay walled no matter the door roll
        let last = config.room_size - 1;
        for (lx, ly) in [(0, 0), (last, 0), (0, last), (last, last)] {
            assert!(room.cell(lx, ly).is_wall());
        }
    }

    #[test]
    fn test_build_meets_minimum_door_count() {
        let config = Config::default();
        let mut room = Room::blank(RoomCoord::new(2, -3), config.room_size);
        room.build(&[NeighborView::Absent; 4], &config, &mut test_rng());

        let doors = Direction::ALL.iter().filter(|d| room.door(**d).is_some()).count();
        assert!(doors >= config.min_doors);
    }

    #[test]
    fn test_build_copies_built_neighbor_offset() {
        let config = Config::default();
        let mut room = Room::blank(RoomCoord::new(0, 0), config.room_size);
        let mut views = [NeighborView::Absent; 4];
        // built neighbor to the east declares a door at offset 9 on its west wall
        views[Direction::East.index()] = NeighborView::Built(Some(9));
        room.build(&views, &config, &mut test_rng());

        assert_eq!(room.door(Direction::East), Some(9));
        // the carved gap is walkable on our east wall
        let last = config.room_size - 1;
        assert_eq!(room.cell(last, 9), Cell::Floor);
        assert_eq!(room.cell(last, 10), Cell::Floor);
        assert!(room.cell(last, 8).is_wall());
        assert!(room.cell(last, 11).is_wall());
    }

    #[test]
    fn test_build_skips_doorless_built_neighbor() {
        let config = Config::default();
        let mut room = Room::blank(RoomCoord::new(0, 0), config.room_size);
        let mut views = [NeighborView::Built(None); 4];
        views[Direction::North.index()] = NeighborView::Absent;
        room.build(&views, &config, &mut test_rng());

        // only the north wall was a candidate; the other three committed walls
        // stay closed even though min_doors wanted more
        assert!(room.door(Direction::North).is_some());
        assert_eq!(room.door(Direction::South), None);
        assert_eq!(room.door(Direction::East), None);
        assert_eq!(room.door(Direction::West), None);
    }

    #[test]
    fn test_build_is_idempotent() {
        let config = Config::default();
        let mut room = Room::blank(RoomCoord::new(0, 0), config.room_size);
        room.build(&[NeighborView::Absent; 4], &config, &mut test_rng());
        let grid = room.cells().to_vec();
        let doors: Vec<_> = Direction::ALL.iter().map(|d| room.door(*d)).collect();

        // second build with a different rng must not change anything
        room.build(&[NeighborView::Absent; 4], &config, &mut Pcg32::seed_from_u64(999));
        assert_eq!(room.cells(), &grid[..]);
        let doors_again: Vec<_> = Direction::ALL.iter().map(|d| room.door(*d)).collect();
        assert_eq!(doors, doors_again);
    }

    #[test]
    fn test_populate_once_and_in_range() {
        let config = Config::default();
        let mut room = Room::blank(RoomCoord::new(0, 0), config.room_size);
        let mut rng = test_rng();
        room.build(&[NeighborView::Absent; 4], &config, &mut rng);

        let mut next_id = 1;
        room.populate(&config, &mut rng, None, &mut next_id);
        let count = room.enemies.len() as u32;
        assert!(count >= config.enemy_count_min && count <= config.enemy_count_max);

        // re-entry must not re-spawn
        room.populate(&config, &mut rng, None, &mut next_id);
        assert_eq!(room.enemies.len() as u32, count);
    }

    #[test]
    fn test_populate_respects_avoid_point() {
        let config = Config::default();
        let mut room = Room::blank(RoomCoord::new(0, 0), config.room_size);
        let mut rng = test_rng();
        room.build(&[NeighborView::Absent; 4], &config, &mut rng);

        let center = Vec2::splat(config.room_pixels() / 2.0);
        // exclusion covers the whole room: bounded attempts, zero spawns
        let huge = config.room_pixels() * 2.0;
        let mut next_id = 1;
        room.populate(&config, &mut rng, Some((center, huge)), &mut next_id);
        assert!(room.enemies.is_empty());
    }

    #[test]
    fn test_populated_enemies_keep_distance() {
        let config = Config::default();
        let mut room = Room::blank(RoomCoord::new(1, 1), config.room_size);
        let mut rng = test_rng();
        room.build(&[NeighborView::Absent; 4], &config, &mut rng);
        let mut next_id = 1;
        room.populate(&config, &mut rng, None, &mut next_id);

        for (i, a) in room.enemies.iter().enumerate() {
            for b in room.enemies.iter().skip(i + 1) {
                assert!(a.pos.distance(b.pos) >= config.enemy_radius * 2.0);
            }
        }
    }
}

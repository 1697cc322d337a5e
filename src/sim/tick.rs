//! Frame clock: fixed update ordering over every system
//!
//! The embedding calls [`SimState::advance`] once per frame with its
//! measured dt; one call is one synchronous, single-threaded update. The
//! step order inside a frame is load-bearing: the room neighborhood
//! materializes before steering reads it, hit detection runs against this
//! frame's positions, and lifecycle purging comes last.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::consts::{EPSILON, MAX_FRAME_DT, SPAWN_SEARCH_RADIUS};
use crate::dungeon::{Cell, Dungeon, RoomCoord};
use crate::sim::collision::try_axis_move;
use crate::sim::state::{DamageNumber, PickupKind, Player, Projectile};
use crate::sim::{combat, steering};
use crate::{pixel_to_tile, tile_center, tile_to_room};

/// Per-frame intent from the embedding. The movement vector is clamped to
/// unit length before use, so a raw diagonal cannot exceed full speed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FrameInput {
    pub move_dir: Vec2,
    /// Start a melee swing
    pub attack: bool,
    /// Held to charge a shot, released to fire it
    pub fire: bool,
    /// Extends the pickup reach while held
    pub interact: bool,
}

/// Player snapshot for the renderer
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub radius: f32,
    pub facing: f32,
    pub health: u32,
    pub coins: u32,
    pub swing: Option<SwingView>,
    /// Charge fraction in `[0, 1]` while a shot is being held
    pub charge: Option<f32>,
}

/// Active swing snapshot; `angle` carries the eased overshoot
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SwingView {
    pub angle: f32,
    pub progress: f32,
}

/// One loaded room's grid, row-major `size * size` cells
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RoomView<'a> {
    pub coord: RoomCoord,
    /// Tile coordinate of the room's top-left cell
    pub origin_tile: (i32, i32),
    pub size: i32,
    pub cells: &'a [Cell],
}

/// Enemy snapshot with feedback records
#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    pub health: u32,
    pub alive: bool,
    /// 0 while alive, rising to 1 over the death linger
    pub death_progress: f32,
    pub damage_numbers: Vec<DamageNumber>,
}

/// Projectile snapshot
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ProjectileView {
    pub pos: Vec2,
    pub dir: Vec2,
    pub radius: f32,
    pub homing: bool,
}

/// Dropped item snapshot
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PickupView {
    pub kind: PickupKind,
    pub pos: Vec2,
}

/// Read-only frame snapshot; everything a renderer needs without touching
/// simulation internals
#[derive(Debug, Serialize)]
pub struct FrameResult<'a> {
    pub player: PlayerView,
    pub rooms: Vec<RoomView<'a>>,
    pub enemies: Vec<EnemyView>,
    pub projectiles: Vec<ProjectileView>,
    pub pickups: Vec<PickupView>,
    /// True once room generation has hit the configured cap
    pub generation_capped: bool,
}

/// The whole simulation: dungeon, entities, and the frame clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    config: Config,
    dungeon: Dungeon,
    player: Player,
    projectiles: Vec<Projectile>,
    rng: Pcg32,
    current_room: RoomCoord,
    /// Accumulated simulation time in seconds
    time: f64,
}

impl SimState {
    /// Build a world from a seed and spawn the player near the origin.
    ///
    /// The spawn neighborhood is materialized first with an exclusion
    /// radius around the search origin so the initial room cannot spawn
    /// enemies on top of the player.
    pub fn new(seed: u64, config: Config) -> Self {
        let mut dungeon = Dungeon::new(seed, config.clone());

        let center_tile = config.room_size / 2;
        let search_center = Vec2::splat(tile_center(center_tile, config.tile_size));
        dungeon.load_neighborhood(
            RoomCoord::new(0, 0),
            Some((search_center, config.spawn_exclusion_radius)),
        );

        let spawn = find_spawn(&mut dungeon, (center_tile, center_tile), &config);
        let player = Player::new(spawn, &config);
        let current_room = room_of(spawn, &config);
        log::info!(
            "world seeded with {seed}, player spawned at ({:.0}, {:.0})",
            spawn.x,
            spawn.y
        );

        Self {
            config,
            dungeon,
            player,
            projectiles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ 0xD1CE),
            current_room,
            time: 0.0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dungeon(&self) -> &Dungeon {
        &self.dungeon
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Read-only wall query for non-simulation callers (minimap, debug
    /// overlays). Never materializes rooms; absent rooms read as wall.
    pub fn query_is_wall(&self, x: f32, y: f32) -> bool {
        self.dungeon.probe_wall_at_pixel(Vec2::new(x, y))
    }

    /// Advance the simulation by one frame.
    ///
    /// Step order, fixed for correctness:
    /// 1. materialize the 3x3 neighborhood if the player changed rooms
    /// 2. resolve input into movement, facing, swing, and charge state
    /// 3. steer the active rooms' enemies
    /// 4. resolve melee hits
    /// 5. collect pickups
    /// 6. advance projectiles and their collisions
    /// 7. purge entities that finished their death lifecycle
    pub fn advance(&mut self, input: &FrameInput, dt: f32) -> FrameResult<'_> {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.time += dt as f64;

        let room = room_of(self.player.pos, &self.config);
        if room != self.current_room {
            self.dungeon.load_neighborhood(room, None);
            self.current_room = room;
        }

        self.step_player(input, dt);
        self.step_steering(dt);
        self.step_melee(dt);
        self.step_pickups(input);

        let active: Vec<RoomCoord> = Dungeon::neighborhood(self.current_room).collect();
        combat::advance_projectiles(
            &mut self.projectiles,
            &mut self.dungeon,
            &active,
            &self.config,
            dt,
        );

        self.step_purge();

        self.frame_result()
    }

    /// Movement, facing, melee trigger, and the charge-release fire cycle
    fn step_player(&mut self, input: &FrameInput, dt: f32) {
        self.player.grace = (self.player.grace - dt).max(0.0);
        if self.player.is_dead() {
            // the embedding decides when to stop calling; a dead player
            // just stops acting
            self.player.charge = None;
            return;
        }

        let mut intent = input.move_dir;
        if intent.length_squared() > 1.0 {
            intent = intent.normalize();
        }
        let delta = intent * self.config.player_speed * dt;
        self.player.pos = try_axis_move(&self.dungeon, self.player.pos, self.player.radius, delta);
        if intent.length_squared() > EPSILON {
            self.player.facing = intent.y.atan2(intent.x);
        }

        if input.attack {
            self.player.start_swing();
        }

        match (self.player.charge.is_some(), input.fire) {
            (false, true) => self.player.charge = Some(0.0),
            (true, true) => {
                if let Some(held) = self.player.charge.as_mut() {
                    *held += dt;
                }
            }
            (true, false) => {
                if let Some(held) = self.player.charge.take() {
                    self.fire_projectile(held);
                }
            }
            (false, false) => {}
        }
    }

    /// Spawn a shot scaled by how long fire was held. A full charge homes.
    fn fire_projectile(&mut self, held: f32) {
        let config = &self.config;
        let frac = config.charge_fraction(held);
        let speed = config.projectile_speed_min
            + (config.projectile_speed_max - config.projectile_speed_min) * frac;
        let damage_span = (config.projectile_damage_max - config.projectile_damage_min) as f32;
        let damage = config.projectile_damage_min + (damage_span * frac).round() as u32;
        let dir = Vec2::from_angle(self.player.facing);
        let pos = self.player.pos + dir * (self.player.radius + config.projectile_radius + 1.0);

        let projectile = Projectile {
            id: self.dungeon.alloc_entity_id(),
            pos,
            dir,
            speed,
            damage,
            radius: config.projectile_radius,
            homing: frac >= 1.0,
            target: None,
            alive: true,
        };
        self.projectiles.push(projectile);
    }

    fn step_steering(&mut self, dt: f32) {
        for coord in Dungeon::neighborhood(self.current_room) {
            let Some(room) = self.dungeon.room_mut(coord) else { continue };
            let mut enemies = std::mem::take(&mut room.enemies);
            let peers: Vec<steering::PeerSnapshot> =
                enemies.iter().map(|e| (e.id, e.pos, e.alive)).collect();
            for enemy in &mut enemies {
                steering::steer_enemy(
                    enemy,
                    &peers,
                    &mut self.player,
                    &self.dungeon,
                    &self.config,
                    dt,
                );
            }
            if let Some(room) = self.dungeon.room_mut(coord) {
                room.enemies = enemies;
            }
        }
    }

    fn step_melee(&mut self, dt: f32) {
        if self.player.swing.is_none() {
            return;
        }
        for coord in Dungeon::neighborhood(self.current_room) {
            let Some(room) = self.dungeon.room_mut(coord) else { continue };
            let mut enemies = std::mem::take(&mut room.enemies);
            combat::resolve_melee(&mut self.player, &mut enemies, &self.config);
            if let Some(room) = self.dungeon.room_mut(coord) {
                room.enemies = enemies;
            }
        }
        // the swing clock runs after the hit test so the final frame of the
        // window still lands hits
        if let Some(swing) = self.player.swing.as_mut() {
            swing.elapsed += dt;
            if swing.elapsed >= self.config.swing_duration {
                self.player.swing = None;
            }
        }
    }

    fn step_pickups(&mut self, input: &FrameInput) {
        let mut reach = self.player.radius + self.config.pickup_reach;
        if input.interact {
            reach += self.config.pickup_reach;
        }
        let player = &mut self.player;
        let max_health = self.config.player_health;
        for coord in Dungeon::neighborhood(self.current_room) {
            let Some(room) = self.dungeon.room_mut(coord) else { continue };
            room.pickups.retain(|pickup| {
                if pickup.pos.distance(player.pos) > reach {
                    return true;
                }
                match pickup.kind {
                    PickupKind::Coin { amount } => player.coins += amount,
                    PickupKind::Heart => player.health = (player.health + 1).min(max_health),
                }
                false
            });
        }
    }

    /// Remove enemies that finished their death linger, emitting a drop at
    /// their last position. Iterates backward so in-place removal never
    /// skips an element.
    fn step_purge(&mut self) {
        for coord in Dungeon::neighborhood(self.current_room) {
            let Some(room) = self.dungeon.room_mut(coord) else { continue };
            let mut i = room.enemies.len();
            while i > 0 {
                i -= 1;
                if room.enemies[i].expired() {
                    let enemy = room.enemies.swap_remove(i);
                    room.pickups.push(combat::roll_pickup(&mut self.rng, enemy.pos));
                }
            }
        }
    }

    fn frame_result(&self) -> FrameResult<'_> {
        let swing = self.player.swing.as_ref().map(|s| {
            let progress = (s.elapsed / self.config.swing_duration).clamp(0.0, 1.0);
            SwingView {
                angle: combat::swing_angle(s.start_angle, progress),
                progress,
            }
        });
        let player = PlayerView {
            pos: self.player.pos,
            radius: self.player.radius,
            facing: self.player.facing,
            health: self.player.health,
            coins: self.player.coins,
            swing,
            charge: self
                .player
                .charge
                .map(|held| self.config.charge_fraction(held)),
        };

        let mut rooms = Vec::new();
        let mut enemies = Vec::new();
        let mut pickups = Vec::new();
        for coord in Dungeon::neighborhood(self.current_room) {
            let Some(room) = self.dungeon.room(coord) else { continue };
            rooms.push(RoomView {
                coord,
                origin_tile: (
                    coord.x * self.config.room_size,
                    coord.y * self.config.room_size,
                ),
                size: room.size(),
                cells: room.cells(),
            });
            for enemy in &room.enemies {
                let death_progress = if enemy.alive || self.config.death_linger <= 0.0 {
                    0.0
                } else {
                    1.0 - (enemy.death_timer / self.config.death_linger).clamp(0.0, 1.0)
                };
                enemies.push(EnemyView {
                    id: enemy.id,
                    pos: enemy.pos,
                    radius: enemy.radius,
                    health: enemy.health,
                    alive: enemy.alive,
                    death_progress,
                    damage_numbers: enemy.damage_numbers.clone(),
                });
            }
            pickups.extend(room.pickups.iter().map(|d| PickupView {
                kind: d.kind,
                pos: d.pos,
            }));
        }

        let projectiles = self
            .projectiles
            .iter()
            .map(|p| ProjectileView {
                pos: p.pos,
                dir: p.dir,
                radius: p.radius,
                homing: p.homing,
            })
            .collect();

        FrameResult {
            player,
            rooms,
            enemies,
            projectiles,
            pickups,
            generation_capped: self.dungeon.is_capped(),
        }
    }
}

/// Room coordinate containing a pixel position
fn room_of(pos: Vec2, config: &Config) -> RoomCoord {
    RoomCoord::new(
        tile_to_room(pixel_to_tile(pos.x, config.tile_size), config.room_size),
        tile_to_room(pixel_to_tile(pos.y, config.tile_size), config.room_size),
    )
}

/// Ring-by-ring spiral search for a floor tile around `start`, testing ring
/// edges only. Radius 0 is the start tile itself, so a floor start returns
/// immediately. Falls back to the start tile's center when the bounded
/// search finds nothing.
fn find_spawn(dungeon: &mut Dungeon, start: (i32, i32), config: &Config) -> Vec2 {
    for r in 0..=SPAWN_SEARCH_RADIUS {
        for dx in -r..=r {
            for dy in -r..=r {
                if dx.abs() != r && dy.abs() != r {
                    continue;
                }
                let p = Vec2::new(
                    tile_center(start.0 + dx, config.tile_size),
                    tile_center(start.1 + dy, config.tile_size),
                );
                if !dungeon.wall_at_pixel(p) {
                    return p;
                }
            }
        }
    }
    log::warn!("spawn search around tile {start:?} exhausted, using fallback");
    Vec2::new(
        tile_center(start.0, config.tile_size),
        tile_center(start.1, config.tile_size),
    )
}

//! Melee arcs, projectiles, and the damage pipeline
//!
//! Melee hit detection is a segment-vs-circle test between the player's two
//! hand positions, live for the whole swing; the eased arc with overshoot
//! only drives hand geometry for the renderer. Projectiles fly straight or
//! curve toward a weakly referenced target and die on the first wall or
//! enemy they touch. All damage funnels through
//! [`Enemy::take_hit`](crate::sim::state::Enemy::take_hit).

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::config::Config;
use crate::consts::{EPSILON, HAND_SPREAD, SWING_ARC};
use crate::dungeon::{Dungeon, RoomCoord};
use crate::sim::collision::{circles_overlap, point_segment_distance, projectile_hits_wall};
use crate::sim::state::{Enemy, EnemyRef, Pickup, PickupKind, Player, Projectile};

/// Eased swing progress with a brief overshoot before settling at 1.
///
/// Cubic back-ease: rises past 1 by about 10% near the end of the swing and
/// returns. Visual only; the hit window is the entire swing duration.
pub fn swing_ease(t: f32) -> f32 {
    const OVERSHOOT: f32 = 1.70158;
    let t = t.clamp(0.0, 1.0) - 1.0;
    1.0 + (OVERSHOOT + 1.0) * t * t * t + OVERSHOOT * t * t
}

/// Hand angle for a swing at progress `t`, sweeping across the facing
pub fn swing_angle(start_angle: f32, t: f32) -> f32 {
    start_angle - SWING_ARC / 2.0 + SWING_ARC * swing_ease(t)
}

/// The melee hit segment: both hands at +-60 degrees off the facing,
/// pushed forward by the swing reach
pub fn swing_segment(pos: Vec2, facing: f32, config: &Config) -> (Vec2, Vec2) {
    let forward = Vec2::from_angle(facing);
    let a = pos + Vec2::from_angle(facing - HAND_SPREAD) * config.hand_offset
        + forward * config.swing_reach;
    let b = pos + Vec2::from_angle(facing + HAND_SPREAD) * config.hand_offset
        + forward * config.swing_reach;
    (a, b)
}

/// Normalized attacker-to-target direction with an epsilon fallback for
/// coincident positions: no NaN, no displacement
pub fn knockback_direction(target: Vec2, attacker: Vec2) -> Vec2 {
    let d = target - attacker;
    if d.length_squared() < EPSILON {
        Vec2::ZERO
    } else {
        d.normalize()
    }
}

/// Apply the active swing's hit window to one room's enemies. Each enemy
/// lands in the swing's hit set on first contact and is never hit twice by
/// the same swing, however many frames it stays in range.
pub fn resolve_melee(player: &mut Player, enemies: &mut [Enemy], config: &Config) {
    let Some(swing) = player.swing.as_mut() else {
        return;
    };
    let (a, b) = swing_segment(player.pos, player.facing, config);
    for enemy in enemies.iter_mut() {
        if !enemy.alive || swing.already_hit.contains(&enemy.id) {
            continue;
        }
        if point_segment_distance(enemy.pos, a, b) <= enemy.radius + config.hit_margin {
            let dir = knockback_direction(enemy.pos, player.pos);
            enemy.take_hit(config.melee_damage, dir, config);
            swing.already_hit.push(enemy.id);
        }
    }
}

/// Nearest living enemy across the active rooms
fn nearest_living(
    dungeon: &Dungeon,
    active: &[RoomCoord],
    from: Vec2,
) -> Option<(EnemyRef, Vec2)> {
    let mut best: Option<(f32, EnemyRef, Vec2)> = None;
    for &coord in active {
        let Some(room) = dungeon.room(coord) else { continue };
        for enemy in room.enemies.iter().filter(|e| e.alive) {
            let d = from.distance_squared(enemy.pos);
            if best.is_none_or(|(bd, _, _)| d < bd) {
                best = Some((
                    d,
                    EnemyRef {
                        room_key: coord.pack(),
                        id: enemy.id,
                    },
                    enemy.pos,
                ));
            }
        }
    }
    best.map(|(_, r, pos)| (r, pos))
}

/// Position of a still-living referenced enemy, if any
fn resolve_target(dungeon: &Dungeon, target: Option<EnemyRef>) -> Option<Vec2> {
    let target = target?;
    let room = dungeon.room(RoomCoord::unpack(target.room_key))?;
    room.enemies
        .iter()
        .find(|e| e.id == target.id && e.alive)
        .map(|e| e.pos)
}

/// Curve a homing projectile toward its target. The turn is a smoothed
/// interpolation at a fixed rate, never an instant snap, which is what
/// produces the arcing trajectory. A dead or missing target triggers
/// re-acquisition of the nearest living enemy.
fn home_toward_target(
    projectile: &mut Projectile,
    dungeon: &Dungeon,
    active: &[RoomCoord],
    config: &Config,
    dt: f32,
) {
    let target_pos = match resolve_target(dungeon, projectile.target) {
        Some(pos) => Some(pos),
        None => {
            let found = nearest_living(dungeon, active, projectile.pos);
            projectile.target = found.map(|(r, _)| r);
            found.map(|(_, pos)| pos)
        }
    };
    let Some(target_pos) = target_pos else {
        // nothing left to chase; fly straight
        return;
    };

    let desired = target_pos - projectile.pos;
    if desired.length_squared() < EPSILON {
        return;
    }
    let desired = desired.normalize();
    let blend = (config.homing_rate * dt).min(1.0);
    let turned = projectile.dir + (desired - projectile.dir) * blend;
    projectile.dir = if turned.length_squared() < EPSILON {
        desired
    } else {
        turned.normalize()
    };
    projectile.speed = projectile.speed.min(config.projectile_speed_max);
}

/// Integrate every projectile and resolve wall and enemy collisions.
/// A projectile dies on any wall sample hit or on its first enemy overlap,
/// applying damage through the usual entry point.
pub fn advance_projectiles(
    projectiles: &mut Vec<Projectile>,
    dungeon: &mut Dungeon,
    active: &[RoomCoord],
    config: &Config,
    dt: f32,
) {
    for projectile in projectiles.iter_mut() {
        if !projectile.alive {
            continue;
        }
        if projectile.homing {
            home_toward_target(projectile, dungeon, active, config, dt);
        }
        projectile.pos += projectile.dir * projectile.speed * dt;

        if projectile_hits_wall(dungeon, projectile.pos, projectile.radius) {
            projectile.alive = false;
            continue;
        }

        'rooms: for &coord in active {
            let Some(room) = dungeon.room_mut(coord) else { continue };
            for enemy in room.enemies.iter_mut() {
                if enemy.alive
                    && circles_overlap(projectile.pos, projectile.radius, enemy.pos, enemy.radius)
                {
                    let dir = knockback_direction(enemy.pos, projectile.pos);
                    enemy.take_hit(projectile.damage, dir, config);
                    projectile.alive = false;
                    break 'rooms;
                }
            }
        }
    }
    projectiles.retain(|p| p.alive);
}

/// Roll what a removed enemy leaves behind
pub fn roll_pickup(rng: &mut Pcg32, pos: Vec2) -> Pickup {
    let kind = if rng.random_range(0..6u32) == 0 {
        PickupKind::Heart
    } else {
        PickupKind::Coin {
            amount: rng.random_range(1..=3),
        }
    };
    Pickup { kind, pos }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile_center;
    use rand::SeedableRng;

    fn setup() -> (Dungeon, Config, Player) {
        let config = Config::default();
        let mut dungeon = Dungeon::new(1, config.clone());
        dungeon.load_neighborhood(RoomCoord::new(0, 0), None);
        let mid = config.room_size / 2;
        let player = Player::new(Vec2::splat(tile_center(mid, config.tile_size)), &config);
        (dungeon, config, player)
    }

    fn active() -> Vec<RoomCoord> {
        Dungeon::neighborhood(RoomCoord::new(0, 0)).collect()
    }

    #[test]
    fn test_swing_ease_overshoots_then_settles() {
        assert!(swing_ease(0.0).abs() < 1e-5);
        assert!((swing_ease(1.0) - 1.0).abs() < 1e-5);
        // somewhere late in the swing the ease exceeds 1
        let overshoot = (0..20).map(|i| swing_ease(i as f32 / 20.0)).fold(0.0f32, f32::max);
        assert!(overshoot > 1.0);
    }

    #[test]
    fn test_single_hit_per_swing() {
        let (_, config, mut player) = setup();
        // enemy dead ahead within reach
        let mut enemies = vec![Enemy::new(
            7,
            player.pos + Vec2::new(config.swing_reach, 0.0),
            &config,
        )];
        player.facing = 0.0;
        player.start_swing();

        // many frames of the same swing: damage lands exactly once
        for _ in 0..10 {
            resolve_melee(&mut player, &mut enemies, &config);
        }
        assert_eq!(enemies[0].health, config.enemy_health - config.melee_damage);

        // a fresh swing may hit again
        player.swing = None;
        player.start_swing();
        resolve_melee(&mut player, &mut enemies, &config);
        assert_eq!(
            enemies[0].health,
            config.enemy_health - 2 * config.melee_damage
        );
    }

    #[test]
    fn test_melee_misses_behind_player() {
        let (_, config, mut player) = setup();
        let mut enemies = vec![Enemy::new(
            7,
            player.pos - Vec2::new(config.swing_reach * 3.0, 0.0),
            &config,
        )];
        player.facing = 0.0;
        player.start_swing();
        resolve_melee(&mut player, &mut enemies, &config);
        assert_eq!(enemies[0].health, config.enemy_health);
    }

    #[test]
    fn test_melee_skips_dead_enemies() {
        let (_, config, mut player) = setup();
        let mut enemies = vec![Enemy::new(
            7,
            player.pos + Vec2::new(config.swing_reach, 0.0),
            &config,
        )];
        enemies[0].take_hit(config.enemy_health, Vec2::X, &config);
        player.start_swing();
        resolve_melee(&mut player, &mut enemies, &config);
        assert!(player.swing.as_ref().unwrap().already_hit.is_empty());
    }

    #[test]
    fn test_knockback_direction_guards_zero_length() {
        let p = Vec2::new(3.0, 4.0);
        assert_eq!(knockback_direction(p, p), Vec2::ZERO);
        let dir = knockback_direction(Vec2::new(10.0, 0.0), Vec2::ZERO);
        assert!((dir - Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_projectile_dies_on_wall() {
        let (mut dungeon, config, _player) = setup();
        for coord in active() {
            if let Some(room) = dungeon.room_mut(coord) {
                room.enemies.clear();
            }
        }
        // fired at the north wall, on a column well away from the door gap
        let mut projectiles = vec![Projectile {
            id: 1,
            pos: Vec2::new(tile_center(5, config.tile_size), tile_center(2, config.tile_size)),
            dir: Vec2::new(0.0, -1.0),
            speed: config.projectile_speed_min,
            damage: 1,
            radius: config.projectile_radius,
            homing: false,
            target: None,
            alive: true,
        }];

        let active = active();
        for _ in 0..60 {
            advance_projectiles(&mut projectiles, &mut dungeon, &active, &config, 1.0 / 60.0);
        }
        assert!(projectiles.is_empty(), "wall impact removes the projectile");
    }

    #[test]
    fn test_projectile_hits_first_enemy_and_dies() {
        let (mut dungeon, config, player) = setup();
        let start = player.pos;
        // a clear room: drop two enemies on the flight line ourselves
        if let Some(room) = dungeon.room_mut(RoomCoord::new(0, 0)) {
            room.enemies.clear();
            room.enemies.push(Enemy::new(50, start + Vec2::new(120.0, 0.0), &config));
            room.enemies.push(Enemy::new(51, start + Vec2::new(240.0, 0.0), &config));
        }
        let mut projectiles = vec![Projectile {
            id: 1,
            pos: start,
            dir: Vec2::X,
            speed: config.projectile_speed_min,
            damage: 2,
            radius: config.projectile_radius,
            homing: false,
            target: None,
            alive: true,
        }];

        let active = active();
        for _ in 0..60 {
            advance_projectiles(&mut projectiles, &mut dungeon, &active, &config, 1.0 / 60.0);
        }
        assert!(projectiles.is_empty());
        let room = dungeon.room(RoomCoord::new(0, 0)).unwrap();
        let near = room.enemies.iter().find(|e| e.id == 50).unwrap();
        let far = room.enemies.iter().find(|e| e.id == 51).unwrap();
        assert_eq!(near.health, config.enemy_health - 2);
        assert_eq!(far.health, config.enemy_health, "flight ends at the first hit");
    }

    #[test]
    fn test_homing_reacquires_when_target_dies() {
        let (mut dungeon, config, player) = setup();
        let start = player.pos;
        if let Some(room) = dungeon.room_mut(RoomCoord::new(0, 0)) {
            room.enemies.clear();
            let mut dead = Enemy::new(60, start + Vec2::new(200.0, 0.0), &config);
            dead.take_hit(config.enemy_health, Vec2::X, &config);
            room.enemies.push(dead);
            room.enemies.push(Enemy::new(61, start + Vec2::new(0.0, 200.0), &config));
        }
        let mut projectile = Projectile {
            id: 1,
            pos: start,
            dir: Vec2::X,
            speed: config.projectile_speed_max,
            damage: 1,
            radius: config.projectile_radius,
            homing: true,
            target: Some(EnemyRef {
                room_key: RoomCoord::new(0, 0).pack(),
                id: 60,
            }),
            alive: true,
        };

        home_toward_target(&mut projectile, &dungeon, &active(), &config, 0.016);
        // the dead target was dropped for the living enemy to the south
        assert_eq!(
            projectile.target,
            Some(EnemyRef {
                room_key: RoomCoord::new(0, 0).pack(),
                id: 61,
            })
        );
        assert!(projectile.dir.y > 0.0, "direction bends toward the new target");
        assert!(projectile.dir.x > 0.5, "smoothed turn, not an instant snap");
    }

    #[test]
    fn test_homing_with_no_enemies_flies_straight() {
        let (mut dungeon, config, player) = setup();
        for coord in active() {
            if let Some(room) = dungeon.room_mut(coord) {
                room.enemies.clear();
            }
        }
        let mut projectile = Projectile {
            id: 1,
            pos: player.pos,
            dir: Vec2::X,
            speed: config.projectile_speed_max,
            damage: 1,
            radius: config.projectile_radius,
            homing: true,
            target: None,
            alive: true,
        };
        home_toward_target(&mut projectile, &dungeon, &active(), &config, 0.016);
        assert_eq!(projectile.dir, Vec2::X);
        assert_eq!(projectile.target, None);
    }

    #[test]
    fn test_roll_pickup_kinds_are_sane() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..100 {
            match roll_pickup(&mut rng, Vec2::ZERO).kind {
                PickupKind::Coin { amount } => assert!((1..=3).contains(&amount)),
                PickupKind::Heart => {}
            }
        }
    }
}

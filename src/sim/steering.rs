//! Enemy steering: seek, separation, knockback
//!
//! Alive enemies always pursue the player; there is no idle or patrol
//! state. Per frame each enemy accumulates a seek velocity toward the
//! player (stopping at contact), a separation push away from crowded
//! peers, and the active knockback impulse, then integrates the sum
//! through the axis-resolved wall test. Dead enemies only run down their
//! linger timer until the clock purges them.

use glam::Vec2;

use crate::config::Config;
use crate::consts::{CONTACT_SLACK, DAMAGE_NUMBER_LIFETIME, EPSILON, PLAYER_SEPARATION};
use crate::dungeon::Dungeon;
use crate::sim::collision::try_axis_move;
use crate::sim::state::{Enemy, Player};

/// Positional snapshot of a same-room peer, taken before the room updates
pub type PeerSnapshot = (u32, Vec2, bool);

/// Advance one enemy by `dt`.
///
/// Wall probes use an avoidance radius slightly larger than the visual
/// radius, so enemies steer around corners before clipping them. A
/// candidate position that would close on the player below the minimum
/// separation is rejected outright.
pub fn steer_enemy(
    enemy: &mut Enemy,
    peers: &[PeerSnapshot],
    player: &mut Player,
    dungeon: &Dungeon,
    config: &Config,
    dt: f32,
) {
    for number in &mut enemy.damage_numbers {
        number.age += dt;
    }
    enemy.damage_numbers.retain(|n| n.age < DAMAGE_NUMBER_LIFETIME);

    if !enemy.alive {
        enemy.death_timer -= dt;
        return;
    }

    enemy.attack_cooldown = (enemy.attack_cooldown - dt).max(0.0);

    let to_player = player.pos - enemy.pos;
    let dist = to_player.length();
    let contact = enemy.radius + player.radius;

    // seek, stopping at contact
    let mut vel = if dist > contact && dist > EPSILON {
        to_player / dist * config.enemy_speed
    } else {
        Vec2::ZERO
    };

    // separation from living same-room peers, proportional to penetration
    let crowd = config.enemy_radius * 2.0;
    for &(id, peer_pos, peer_alive) in peers {
        if id == enemy.id || !peer_alive {
            continue;
        }
        let away = enemy.pos - peer_pos;
        let d = away.length();
        if d < crowd && d > EPSILON {
            vel += away / d * (crowd - d) * config.separation_gain;
        }
    }

    // knockback, redirected away from the player when it would otherwise
    // shove the enemy into the attacker
    if enemy.knockback_left > 0.0 {
        let mut kb = enemy.knockback_velocity(config);
        if dist > EPSILON && kb.dot(to_player) > 0.0 {
            kb = -(to_player / dist) * kb.length();
        }
        vel += kb;
        enemy.knockback_left = (enemy.knockback_left - dt).max(0.0);
    }

    let avoidance_radius = enemy.radius + config.avoidance_margin;
    let candidate = try_axis_move(dungeon, enemy.pos, avoidance_radius, vel * dt);
    let min_separation = contact * PLAYER_SEPARATION;
    if candidate.distance_squared(player.pos) >= min_separation * min_separation {
        enemy.pos = candidate;
    }

    // contact attack on cooldown
    if dist <= contact + CONTACT_SLACK && enemy.attack_cooldown <= 0.0 {
        player.take_hit(config.contact_damage, config);
        enemy.attack_cooldown = config.contact_cooldown;
    }
}

/// Step functions: every mutation of a running level goes through here.
///
/// Entry points:
///   - `dispatch`       : one logical input (key / button press)
///   - `complete_plan`  : presentation finished playing the active plan
///   - `contact`        : physics reported two actors touching
///   - `sync_position`  : physics moved an intangible actor
///   - `destroy_actor`  : scripted or gameplay removal
///   - dialogue / cinematic / restart hooks for the scripting layer
///
/// Each returns the events it produced, in order. Nothing here sleeps,
/// animates, or looks at a clock.
///
/// ## Queued cycle
///
///   Jump → QueueOpened(roll) → N × CommandQueued → PathPlanned
///        → complete_plan → SettlePlanned → complete_plan → RollAdvanced
///
/// Zero-length paths and zero-distance settles skip their presentation
/// round trip, so a fully blocked queue advances the roll immediately.

use crate::domain::actor::{Actor, ActorId, Facing};
use crate::domain::collision::{self, CollisionCategory, ContactEvent, ContactParty};
use crate::domain::grid::{Coordinate, Direction};
use crate::domain::mode::{Admission, GameMode, Input, ModeMachine};
use crate::domain::roll::AppendOutcome;
use crate::domain::rules::{self, DropOutcome, MovePlan};
use super::event::GameEvent;
use super::world::{ActivePlan, AfterPath, Hud, WorldState, PLAYER_ID};

// ══════════════════════════════════════════════════════════════
// Input dispatch
// ══════════════════════════════════════════════════════════════

pub fn dispatch(world: &mut WorldState, input: Input) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let mode = world.mode.current();

    match mode.admit(input) {
        Admission::Rejected => {
            log::trace!("{input:?} rejected in {mode:?}");
        }
        Admission::Move(_) | Admission::Jump | Admission::Attack if world.is_busy() => {
            log::trace!("{input:?} dropped: plan in progress");
        }
        Admission::Move(dir) if mode == GameMode::Queued => enqueue(world, dir, &mut events),
        Admission::Move(dir) => direct_move(world, dir, &mut events),
        Admission::Jump => open_queue(world, &mut events),
        Admission::Attack => fire_projectile(world, &mut events),
        Admission::AdvanceText => events.push(GameEvent::DialogueAdvanced),
        Admission::Pause => change_mode(world, &mut events, ModeMachine::pause),
        Admission::Resume => change_mode(world, &mut events, ModeMachine::resume),
    }

    events
}

/// Free-mode step: at most one cell, then a support check.
fn direct_move(world: &mut WorldState, dir: Direction, events: &mut Vec<GameEvent>) {
    world.player.facing = world.player.facing.turned(dir);
    let from = world.player.coord;
    let plan = rules::resolve_path(&world.map_view(Some(PLAYER_ID)), from, &[dir]);
    if plan.is_empty() {
        log::trace!("move {dir:?} from {from} blocked");
        return;
    }
    start_path(world, PLAYER_ID, from, plan, AfterPath::SupportCheck, events);
}

fn open_queue(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let capacity = usize::from(world.roll.value());
    world.queue.open(capacity);
    change_mode(world, events, |m| m.enter(GameMode::Queued));
    log::debug!("queue opened with capacity {capacity}");
    events.push(GameEvent::QueueOpened { capacity });
}

fn enqueue(world: &mut WorldState, dir: Direction, events: &mut Vec<GameEvent>) {
    let capacity = world.queue.capacity();
    match world.queue.append(dir) {
        AppendOutcome::Dropped => log::trace!("queue closed or full; {dir:?} dropped"),
        AppendOutcome::Accepted { len } => {
            events.push(GameEvent::CommandQueued { dir, len, capacity });
        }
        AppendOutcome::Filled => {
            events.push(GameEvent::CommandQueued { dir, len: capacity, capacity });
            resolve_queue(world, events);
        }
    }
}

/// The queue is full: resolve it as one path, then drop.
fn resolve_queue(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let dirs = world.queue.take();
    for &dir in &dirs {
        world.player.facing = world.player.facing.turned(dir);
    }

    let from = world.player.coord;
    let plan = rules::resolve_path(&world.map_view(Some(PLAYER_ID)), from, &dirs);
    if plan.truncated {
        log::debug!("queued path cut after {} of {} steps", plan.waypoints.len(), dirs.len());
    }

    if plan.is_empty() {
        begin_drop(world, PLAYER_ID, true, events);
    } else {
        start_path(world, PLAYER_ID, from, plan, AfterPath::QueuedDrop, events);
    }
}

fn start_path(
    world: &mut WorldState,
    actor: ActorId,
    from: Coordinate,
    plan: MovePlan,
    then: AfterPath,
    events: &mut Vec<GameEvent>,
) {
    log::debug!("{actor} path {from} -> {} ({} waypoints)", plan.destination, plan.waypoints.len());
    events.push(GameEvent::PathPlanned { actor, from, waypoints: plan.waypoints.clone() });
    world.plan = Some(ActivePlan::Path {
        actor,
        from,
        waypoints: plan.waypoints,
        destination: plan.destination,
        then,
    });
}

/// One projectile at a time, spawned in the cell the player faces.
fn fire_projectile(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if world.projectile.is_some() {
        log::trace!("projectile already in flight");
        return;
    }

    let facing = world.player.facing;
    let at = world.player.coord.offset(facing.direction());
    if !world.grid.contains(at) {
        return;
    }

    let id = match world.spawn("Shot", CollisionCategory::PlayerProjectile, at) {
        Ok(id) => id,
        Err(e) => {
            log::warn!("projectile spawn failed: {e}");
            return;
        }
    };
    let damage = world.player.body.damage;
    if let Some(shot) = world.actor_mut(id) {
        shot.facing = facing;
        shot.body.damage = damage;
    }
    world.projectile = Some(id);
    events.push(GameEvent::ProjectileSpawned { id, at, facing });

    // Point blank: the spawn cell is already taken.
    if let Some(target) = world.occupancy.occupant(at) {
        contact_into(world, id, target, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Plan completion
// ══════════════════════════════════════════════════════════════

/// Commit the active plan. No-op when nothing is playing.
pub fn complete_plan(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let plan = match world.plan.take() {
        Some(p) => p,
        None => {
            log::trace!("complete_plan with no active plan");
            return events;
        }
    };

    match plan {
        ActivePlan::Path { actor, destination, then, .. } => {
            commit_position(world, actor, destination, &mut events);
            begin_drop(world, actor, then == AfterPath::QueuedDrop, &mut events);
        }
        ActivePlan::Settle { actor, to, cycle, .. } => {
            commit_position(world, actor, to, &mut events);
            // Support under `to` may have gone while the settle played.
            begin_drop(world, actor, cycle, &mut events);
        }
    }

    events
}

fn commit_position(world: &mut WorldState, actor: ActorId, to: Coordinate, events: &mut Vec<GameEvent>) {
    let from = match world.actor(actor) {
        Some(a) => a.coord,
        None => return,
    };
    if from == to {
        return;
    }
    match world.relocate(actor, to) {
        Ok(()) => {
            events.push(GameEvent::ActorMoved { actor, from, to });
            if world.actor(actor).map_or(false, Actor::is_blocking) {
                settle_column_above(world, from, events);
            }
        }
        Err(e) => log::warn!("{actor} stays at {from}: {e}"),
    }
}

fn begin_drop(world: &mut WorldState, actor: ActorId, cycle: bool, events: &mut Vec<GameEvent>) {
    let from = match world.actor(actor) {
        Some(a) => a.coord,
        None => return,
    };

    match rules::resolve_drop(&world.map_view(Some(actor)), from, world.death_row) {
        DropOutcome::Settle(to) if to == from => finish_drop(world, cycle, events),
        DropOutcome::Settle(to) => {
            log::debug!("{actor} settles {from} -> {to}");
            events.push(GameEvent::SettlePlanned { actor, from, to });
            world.plan = Some(ActivePlan::Settle { actor, from, to, cycle });
        }
        DropOutcome::FellOutOfBounds if actor == PLAYER_ID => player_fell(world, events),
        DropOutcome::FellOutOfBounds => destroy_into(world, actor, events),
    }
}

/// End of a settle. Queued cycles return to Free and advance the roll.
fn finish_drop(world: &mut WorldState, cycle: bool, events: &mut Vec<GameEvent>) {
    if !cycle {
        return;
    }
    world.queue.clear();

    // Defeat or the exit may have taken over mid-cycle.
    let queued = world.mode.current() == GameMode::Queued
        || world.mode.previous() == Some(GameMode::Queued);
    if queued {
        change_mode(world, events, |m| m.enter_or_defer(GameMode::Free));
    }

    let value = world.roll.advance();
    log::debug!("roll advanced to {value}");
    events.push(GameEvent::RollAdvanced { value });
}

fn player_fell(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    log::info!("player fell out of bounds from {}", world.player.coord);
    world.queue.clear();
    events.push(GameEvent::PlayerFell);
    change_mode(world, events, |m| m.enter_or_defer(GameMode::Cinematic));
}

// ══════════════════════════════════════════════════════════════
// Contacts
// ══════════════════════════════════════════════════════════════

fn party(actor: &Actor) -> ContactParty<'_> {
    ContactParty {
        id: actor.id,
        profile: &actor.profile,
        name: &actor.name,
        destructible: actor.body.destructible,
    }
}

/// Route a physical contact between two actors and apply its effect.
pub fn contact(world: &mut WorldState, a: ActorId, b: ActorId) -> Vec<GameEvent> {
    let mut events = Vec::new();
    contact_into(world, a, b, &mut events);
    events
}

fn contact_into(world: &mut WorldState, a: ActorId, b: ActorId, events: &mut Vec<GameEvent>) {
    let routed = match (world.actor(a), world.actor(b)) {
        (Some(pa), Some(pb)) => collision::route(&party(pa), &party(pb)),
        _ => {
            log::trace!("contact {a}/{b} ignored: actor gone");
            return;
        }
    };
    let Some(event) = routed else { return };
    log::trace!("contact {a}/{b} -> {event:?}");

    match event {
        ContactEvent::PickUp { item, .. } => {
            if let Some(coin) = world.despawn(item) {
                world.score += world.rules.pickup_score;
                events.push(GameEvent::ItemPicked { item, at: coin.coord });
            }
        }
        ContactEvent::ProjectileStop { projectile } => destroy_into(world, projectile, events),
        ContactEvent::Damage { projectile, target } => {
            let amount = world.actor(projectile).map_or(0, |p| p.body.damage);
            destroy_into(world, projectile, events);
            damage_actor(world, target, amount, events);
        }
        ContactEvent::PlayerDamaged { source, .. } => {
            let (amount, is_shot) = match world.actor(source) {
                Some(s) => (s.body.damage, s.category() == CollisionCategory::EnemyProjectile),
                None => (0, false),
            };
            if is_shot {
                destroy_into(world, source, events);
            }
            damage_player(world, amount, events);
        }
        ContactEvent::LevelExitReached { .. } => {
            if world.exit_reached {
                return;
            }
            log::info!("exit reached on {:?}", world.level_name);
            world.exit_reached = true;
            world.queue.clear();
            events.push(GameEvent::LevelExitReached);
            change_mode(world, events, |m| m.enter_or_defer(GameMode::Cinematic));
        }
        ContactEvent::NpcTalk { npc, .. } => {
            if world.mode.current() != GameMode::Free || world.is_busy() {
                return;
            }
            change_mode(world, events, |m| m.enter(GameMode::Dialogue));
            events.push(GameEvent::DialogueStarted { npc });
        }
    }
}

fn damage_actor(world: &mut WorldState, id: ActorId, amount: i32, events: &mut Vec<GameEvent>) {
    let (depleted, remaining) = match world.actor_mut(id) {
        Some(target) => (target.body.apply_damage(amount), target.body.remaining()),
        None => return,
    };
    events.push(GameEvent::ActorDamaged { id, remaining });
    if depleted {
        destroy_into(world, id, events);
    }
}

fn damage_player(world: &mut WorldState, amount: i32, events: &mut Vec<GameEvent>) {
    if world.player.body.is_depleted() {
        return;
    }
    let depleted = world.player.body.apply_damage(amount);
    events.push(GameEvent::PlayerDamaged { remaining: world.player.body.remaining() });
    if depleted {
        log::info!("player defeated at {}", world.player.coord);
        world.queue.clear();
        events.push(GameEvent::PlayerDefeated);
        change_mode(world, events, |m| m.enter_or_defer(GameMode::Cinematic));
    }
}

// ══════════════════════════════════════════════════════════════
// Destruction / external physics
// ══════════════════════════════════════════════════════════════

/// Remove a non-player actor; whatever rested on it settles.
pub fn destroy_actor(world: &mut WorldState, id: ActorId) -> Vec<GameEvent> {
    let mut events = Vec::new();
    destroy_into(world, id, &mut events);
    events
}

fn destroy_into(world: &mut WorldState, id: ActorId, events: &mut Vec<GameEvent>) {
    if id == PLAYER_ID {
        log::warn!("refusing to destroy the player");
        return;
    }
    let actor = match world.despawn(id) {
        Some(a) => a,
        None => return,
    };
    log::debug!("{} {id} destroyed at {}", actor.name, actor.coord);
    events.push(GameEvent::ActorDestroyed { id, at: actor.coord });
    if actor.is_blocking() {
        settle_column_above(world, actor.coord, events);
    }
}

/// Settle the contiguous stack of falling actors above `vacated`, lowest first.
fn settle_column_above(world: &mut WorldState, vacated: Coordinate, events: &mut Vec<GameEvent>) {
    let mut stack = Vec::new();
    let mut probe = vacated.above();
    while let Some(id) = world.occupancy.occupant(probe) {
        if !world.actor(id).map_or(false, Actor::falls) {
            break;
        }
        stack.push(id);
        probe = probe.above();
    }

    for id in stack {
        if id == PLAYER_ID {
            // The rest of the stack follows when the player vacates its cell.
            if !world.is_busy() {
                begin_drop(world, PLAYER_ID, false, events);
            }
            break;
        }
        let from = match world.actor(id) {
            Some(a) => a.coord,
            None => continue,
        };
        match rules::resolve_drop(&world.map_view(Some(id)), from, world.death_row) {
            DropOutcome::Settle(to) if to == from => {}
            DropOutcome::Settle(to) => match world.relocate(id, to) {
                Ok(()) => events.push(GameEvent::ActorSettled { actor: id, from, to }),
                Err(e) => log::warn!("{id} could not settle: {e}"),
            },
            DropOutcome::FellOutOfBounds => destroy_into(world, id, events),
        }
    }
}

/// External physics moved an intangible actor (projectiles in flight).
/// Leaving the grid destroys it.
pub fn sync_position(world: &mut WorldState, id: ActorId, at: Coordinate) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let blocking = match world.actor(id) {
        Some(a) => a.is_blocking(),
        None => return events,
    };
    if blocking {
        log::warn!("sync_position ignored for tangible {id}");
        return events;
    }
    if !world.grid.contains(at) {
        destroy_into(world, id, &mut events);
        return events;
    }
    if let Some(a) = world.actor_mut(id) {
        a.coord = at;
    }
    events
}

// ══════════════════════════════════════════════════════════════
// Scripting hooks
// ══════════════════════════════════════════════════════════════

pub fn begin_dialogue(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    change_mode(world, &mut events, |m| m.enter_or_defer(GameMode::Dialogue));
    events
}

pub fn end_dialogue(world: &mut WorldState) -> Vec<GameEvent> {
    leave(world, GameMode::Dialogue)
}

pub fn begin_cinematic(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    world.queue.clear();
    change_mode(world, &mut events, |m| m.enter_or_defer(GameMode::Cinematic));
    events
}

pub fn end_cinematic(world: &mut WorldState) -> Vec<GameEvent> {
    leave(world, GameMode::Cinematic)
}

/// Back to Free, only if `mode` is the one being left.
fn leave(world: &mut WorldState, mode: GameMode) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let active = world.mode.current() == mode
        || (world.mode.current() == GameMode::Paused && world.mode.previous() == Some(mode));
    if active {
        change_mode(world, &mut events, |m| m.enter_or_defer(GameMode::Free));
    }
    events
}

/// Put the player back at spawn with full health. The roll is kept.
pub fn restart_level(world: &mut WorldState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    world.plan = None;
    world.queue.clear();
    if let Some(id) = world.projectile {
        destroy_into(world, id, &mut events);
    }

    let spawn = world.player.spawn;
    let target = nearest_free_cell(world, spawn).unwrap_or(spawn);
    if target != spawn {
        log::info!("spawn {spawn} is taken; restarting at {target}");
    }
    commit_position(world, PLAYER_ID, target, &mut events);
    world.player.body.restore();
    world.player.facing = Facing::Right;
    world.exit_reached = false;

    change_mode(world, &mut events, |m| m.enter(GameMode::Free));
    begin_drop(world, PLAYER_ID, false, &mut events);
    log::info!("level {:?} restarted", world.level_name);
    events
}

/// Closest in-grid cell the player may stand in (its own included);
/// ties go to the upper-left.
fn nearest_free_cell(world: &WorldState, around: Coordinate) -> Option<Coordinate> {
    let (rows, cols) = (world.grid.rows as i32, world.grid.cols as i32);
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| Coordinate::new(row, col)))
        .filter(|&at| world.occupancy.occupant(at).map_or(true, |id| id == PLAYER_ID))
        .min_by_key(|&at| (at.distance(around), at.row, at.col))
}

pub fn hud(world: &WorldState) -> Hud {
    world.hud()
}

// ── Mode helper ──

fn change_mode(world: &mut WorldState, events: &mut Vec<GameEvent>, f: impl FnOnce(&mut ModeMachine)) {
    let from = world.mode.current();
    f(&mut world.mode);
    let to = world.mode.current();
    if from != to {
        log::debug!("mode {from:?} -> {to:?}");
        events.push(GameEvent::ModeChanged { from, to });
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

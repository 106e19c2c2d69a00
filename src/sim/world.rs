/// WorldState: the complete session of a running level.
///
/// ## Ownership
///
/// The world owns every piece of mutable core state; there is no global:
///   - `player`    : the player actor (persists for the level's lifetime)
///   - `actors`    : every other actor, keyed by id
///   - `occupancy` : derived index of tangible actors, kept in sync by
///                   `spawn()` / `despawn()` / `relocate()`
///   - `mode`, `roll`, `queue` : input gating and the queued phase
///   - `plan`      : the plan presentation is currently playing, if any
///
/// ## Plans
///
/// Movement and settling are handed out as plans. Logical coordinates
/// change only in `step::complete_plan`, so queries made while a plan is
/// playing see the pre-move position, never an intermediate one.

use std::collections::BTreeMap;

use crate::config::RulesConfig;
use crate::domain::actor::{Actor, ActorId};
use crate::domain::collision::CollisionCategory;
use crate::domain::grid::{Coordinate, GridMatrix};
use crate::domain::mode::{GameMode, ModeMachine};
use crate::domain::occupancy::{OccupancyError, OccupancyIndex};
use crate::domain::roll::{ActionQueue, RollCounter};
use crate::domain::rules::MapView;

pub const PLAYER_ID: ActorId = ActorId(0);

/// What follows a committed path.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AfterPath {
    /// End of a queued phase: settle, then advance the roll.
    QueuedDrop,
    /// Free move: settle only if support was lost; roll untouched.
    SupportCheck,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivePlan {
    Path {
        actor: ActorId,
        from: Coordinate,
        waypoints: Vec<Coordinate>,
        destination: Coordinate,
        then: AfterPath,
    },
    Settle {
        actor: ActorId,
        from: Coordinate,
        to: Coordinate,
        /// Completes a queued drop cycle.
        cycle: bool,
    },
}

impl ActivePlan {
    pub fn actor(&self) -> ActorId {
        match self {
            ActivePlan::Path { actor, .. } | ActivePlan::Settle { actor, .. } => *actor,
        }
    }
}

/// Read-only snapshot for HUD display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hud {
    pub mode: GameMode,
    pub roll: u8,
    pub queue_len: usize,
    pub queue_capacity: usize,
    pub health: i32,
    pub score: u32,
}

pub struct WorldState {
    pub grid: GridMatrix,
    /// Rows at or past this index are out of the playable area.
    pub death_row: i32,

    // ── Actors ──
    pub player: Actor,
    pub actors: BTreeMap<ActorId, Actor>,
    pub occupancy: OccupancyIndex,
    /// The player's projectile in flight; one at a time.
    pub projectile: Option<ActorId>,

    // ── Input gating / queued phase ──
    pub mode: ModeMachine,
    pub roll: RollCounter,
    pub queue: ActionQueue,
    pub plan: Option<ActivePlan>,

    // ── Meta ──
    pub rules: RulesConfig,
    pub level_name: String,
    pub score: u32,
    pub exit_reached: bool,

    next_id: u32,
}

// ── Construction ──

impl WorldState {
    pub fn new(grid: GridMatrix, death_row: i32, player_spawn: Coordinate, rules: RulesConfig) -> Self {
        let mut player = Actor::new(PLAYER_ID, "Player", CollisionCategory::Player, player_spawn);
        player.body.health = rules.player_health;
        player.body.damage = rules.projectile_damage;

        let occupancy = OccupancyIndex::with_occupant(player_spawn, PLAYER_ID);

        WorldState {
            grid,
            death_row,
            player,
            actors: BTreeMap::new(),
            occupancy,
            projectile: None,
            mode: ModeMachine::new(),
            roll: RollCounter::new(rules.starting_roll),
            queue: ActionQueue::new(),
            plan: None,
            rules,
            level_name: String::new(),
            score: 0,
            exit_reached: false,
            next_id: PLAYER_ID.0 + 1,
        }
    }
}

// ── Actor registry ──

impl WorldState {
    /// Create an actor. Tangible actors claim their cell in the occupancy index.
    pub fn spawn(&mut self, name: &str, category: CollisionCategory, at: Coordinate) -> Result<ActorId, OccupancyError> {
        let id = ActorId(self.next_id);
        let actor = Actor::new(id, name, category, at);
        if actor.is_blocking() {
            self.occupancy.insert(at, id)?;
        }
        self.next_id += 1;
        self.actors.insert(id, actor);
        Ok(id)
    }

    /// Remove a non-player actor. The player is never despawned.
    pub fn despawn(&mut self, id: ActorId) -> Option<Actor> {
        let actor = self.actors.remove(&id)?;
        if actor.is_blocking() && self.occupancy.occupant(actor.coord) == Some(id) {
            self.occupancy.remove(actor.coord);
        }
        if self.projectile == Some(id) {
            self.projectile = None;
        }
        Some(actor)
    }

    /// Move an actor's logical coordinate, keeping the index in sync.
    pub fn relocate(&mut self, id: ActorId, to: Coordinate) -> Result<(), OccupancyError> {
        let (from, blocking) = match self.actor(id) {
            Some(a) => (a.coord, a.is_blocking()),
            None => return Ok(()),
        };
        if blocking {
            self.occupancy.relocate(id, from, to)?;
        }
        if let Some(a) = self.actor_mut(id) {
            a.coord = to;
        }
        Ok(())
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        if id == self.player.id { Some(&self.player) } else { self.actors.get(&id) }
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        if id == self.player.id { Some(&mut self.player) } else { self.actors.get_mut(&id) }
    }

    /// Player first, then the rest in id order.
    pub fn all_actors(&self) -> impl Iterator<Item = &Actor> {
        std::iter::once(&self.player).chain(self.actors.values())
    }

    /// Every actor whose logical coordinate is `at`, tangible or not.
    pub fn actors_at(&self, at: Coordinate) -> impl Iterator<Item = &Actor> {
        self.all_actors().filter(move |a| a.coord == at)
    }
}

// ── Queries ──

impl WorldState {
    /// A plan is playing; movement input must wait.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.plan.is_some()
    }

    #[inline]
    pub fn map_view(&self, mover: Option<ActorId>) -> MapView<'_> {
        MapView { grid: &self.grid, occupancy: &self.occupancy, mover }
    }

    pub fn hud(&self) -> Hud {
        Hud {
            mode: self.mode.current(),
            roll: self.roll.value(),
            queue_len: self.queue.len(),
            queue_capacity: if self.queue.is_open() { self.queue.capacity() } else { 0 },
            health: self.player.body.remaining(),
            score: self.score,
        }
    }
}

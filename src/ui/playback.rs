/// Plan playback and the toy physics collaborator.
///
/// The core hands out plans and waits. Playback walks the active plan one
/// cell per `step_ms`, then calls `step::complete_plan`. A tiny broad-phase
/// reports what the player touches:
///   - intangible actors on each cell the player passes (items), as it passes
///   - after every commit, intangibles sharing the player's cell and
///     tangible actors in the 4 neighbouring cells (NPCs, enemies, exit)
///
/// The player's projectile flies one cell per `projectile_ms` via
/// `step::sync_position`, reporting whatever blocker it enters.
///
/// Events flow back through `absorb()`, which keeps the message log,
/// drives the dialogue script and notices level outcomes.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rolldrop::config::TimingConfig;
use rolldrop::domain::actor::ActorId;
use rolldrop::domain::grid::{Coordinate, Direction};
use rolldrop::sim::event::GameEvent;
use rolldrop::sim::step;
use rolldrop::sim::world::{ActivePlan, WorldState, PLAYER_ID};

const MESSAGE_LINES: usize = 3;
const OUTCOME_DELAY: Duration = Duration::from_millis(1200);

const SAGE_LINES: &[&str] = &[
    "Jump (X) and the die decides how many moves you queue.",
    "Every landing turns the die: 1 through 6, then 1 again.",
    "Shoot crates (Z). Whatever rests on them will drop.",
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Outcome {
    Cleared,
    Lost,
}

struct Anim {
    plan: ActivePlan,
    cells: Vec<Coordinate>,
    shown: usize,
    last_step: Instant,
}

pub struct Playback {
    anim: Option<Anim>,
    last_shot_step: Instant,
    dialogue: Option<usize>,
    outcome: Option<(Outcome, Instant)>,
    pub messages: VecDeque<String>,
}

impl Playback {
    pub fn new(now: Instant) -> Self {
        Playback {
            anim: None,
            last_shot_step: now,
            dialogue: None,
            outcome: None,
            messages: VecDeque::with_capacity(MESSAGE_LINES),
        }
    }

    /// Forget everything tied to the previous level.
    pub fn reset(&mut self, now: Instant) {
        *self = Playback::new(now);
    }

    // ── Per-frame driving ──

    pub fn tick(&mut self, world: &mut WorldState, now: Instant, timing: &TimingConfig) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.advance_plan(world, now, Duration::from_millis(timing.step_ms), &mut events);
        self.advance_projectile(world, now, Duration::from_millis(timing.projectile_ms), &mut events);
        events
    }

    fn advance_plan(&mut self, world: &mut WorldState, now: Instant, step: Duration, events: &mut Vec<GameEvent>) {
        let plan = match &world.plan {
            Some(p) => p.clone(),
            None => {
                self.anim = None;
                return;
            }
        };
        if self.anim.as_ref().map_or(true, |a| a.plan != plan) {
            self.anim = Some(Anim { cells: plan_cells(&plan), plan, shown: 0, last_step: now });
            return;
        }

        let Some(anim) = self.anim.as_mut() else { return };
        if now.duration_since(anim.last_step) < step {
            return;
        }
        anim.last_step = now;
        if anim.shown < anim.cells.len() {
            anim.shown += 1;
            if anim.plan.actor() == PLAYER_ID {
                let cell = anim.cells[anim.shown - 1];
                events.extend(passing_contacts(world, cell));
            }
            return;
        }

        self.anim = None;
        events.extend(step::complete_plan(world));
        events.extend(player_contacts(world));
    }

    fn advance_projectile(&mut self, world: &mut WorldState, now: Instant, step: Duration, events: &mut Vec<GameEvent>) {
        let id = match world.projectile {
            Some(id) => id,
            None => {
                self.last_shot_step = now;
                return;
            }
        };
        if now.duration_since(self.last_shot_step) < step {
            return;
        }
        self.last_shot_step = now;

        let (next, dir) = match world.actor(id) {
            Some(shot) => (shot.coord.offset(shot.facing.direction()), shot.facing.direction()),
            None => return,
        };
        events.extend(fly(world, id, next, dir));
    }

    /// Where to draw an actor right now; the animated actor shows mid-plan.
    pub fn display_coord(&self, world: &WorldState, id: ActorId) -> Option<Coordinate> {
        if let Some(anim) = &self.anim {
            if anim.plan.actor() == id && anim.shown > 0 {
                return anim.cells.get(anim.shown - 1).copied();
            }
        }
        world.actor(id).map(|a| a.coord)
    }

    // ── Event intake ──

    /// Note events and return follow-ups (dialogue ending). Call until empty.
    pub fn absorb(&mut self, world: &mut WorldState, events: &[GameEvent], now: Instant) -> Vec<GameEvent> {
        let mut follow = Vec::new();
        for event in events {
            match event {
                GameEvent::DialogueStarted { .. } => {
                    self.dialogue = Some(0);
                }
                GameEvent::DialogueAdvanced => {
                    let next = self.dialogue.map_or(SAGE_LINES.len(), |i| i + 1);
                    if next >= SAGE_LINES.len() {
                        self.dialogue = None;
                        follow.extend(step::end_dialogue(world));
                    } else {
                        self.dialogue = Some(next);
                    }
                }
                GameEvent::ItemPicked { .. } => self.push_message(format!("Coin! Score {}", world.score)),
                GameEvent::RollAdvanced { value } => self.push_message(format!("The die turns to {value}")),
                GameEvent::PlayerDamaged { remaining } => self.push_message(format!("Ouch! {remaining} HP left")),
                GameEvent::PlayerFell => {
                    self.push_message("You fell!".into());
                    self.outcome = Some((Outcome::Lost, now));
                }
                GameEvent::PlayerDefeated => {
                    self.push_message("Defeated!".into());
                    self.outcome = Some((Outcome::Lost, now));
                }
                GameEvent::LevelExitReached => {
                    self.push_message("Exit reached!".into());
                    self.outcome = Some((Outcome::Cleared, now));
                }
                _ => {}
            }
        }
        follow
    }

    /// The pending outcome once its banner has been shown long enough.
    pub fn take_outcome(&mut self, now: Instant) -> Option<Outcome> {
        match self.outcome {
            Some((outcome, since)) if now.duration_since(since) >= OUTCOME_DELAY => {
                self.outcome = None;
                Some(outcome)
            }
            _ => None,
        }
    }

    pub fn dialogue_line(&self) -> Option<&'static str> {
        self.dialogue.and_then(|i| SAGE_LINES.get(i).copied())
    }

    fn push_message(&mut self, msg: String) {
        if self.messages.len() == MESSAGE_LINES {
            self.messages.pop_front();
        }
        self.messages.push_back(msg);
    }
}

/// Cells the plan visits, in display order.
fn plan_cells(plan: &ActivePlan) -> Vec<Coordinate> {
    match plan {
        ActivePlan::Path { waypoints, .. } => waypoints.clone(),
        ActivePlan::Settle { from, to, .. } => {
            (from.row + 1..=to.row).map(|row| Coordinate::new(row, from.col)).collect()
        }
    }
}

// ── Broad-phase ──

/// Report every actor the player touches after a commit.
pub fn player_contacts(world: &mut WorldState) -> Vec<GameEvent> {
    let at = world.player.coord;
    let mut touching: Vec<ActorId> = world.actors_at(at)
        .filter(|a| a.id != PLAYER_ID)
        .map(|a| a.id)
        .collect();
    for dir in Direction::ALL {
        if let Some(id) = world.occupancy.occupant(at.offset(dir)) {
            touching.push(id);
        }
    }

    let mut events = Vec::new();
    for id in touching {
        events.extend(step::contact(world, PLAYER_ID, id));
    }
    events
}

/// Intangibles on a cell the player is passing through mid-plan.
fn passing_contacts(world: &mut WorldState, at: Coordinate) -> Vec<GameEvent> {
    let passed: Vec<ActorId> = world.actors_at(at)
        .filter(|a| a.id != PLAYER_ID && !a.is_blocking())
        .map(|a| a.id)
        .collect();

    let mut events = Vec::new();
    for id in passed {
        events.extend(step::contact(world, PLAYER_ID, id));
    }
    events
}

/// Move a projectile one cell and report what it hit.
fn fly(world: &mut WorldState, id: ActorId, next: Coordinate, dir: Direction) -> Vec<GameEvent> {
    let mut events = step::sync_position(world, id, next);
    if world.actor(id).is_none() {
        return events;
    }
    if let Some(target) = world.occupancy.occupant(next) {
        log::trace!("projectile {id} moving {dir:?} hit {target}");
        events.extend(step::contact(world, id, target));
    }
    events
}

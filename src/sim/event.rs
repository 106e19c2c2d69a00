/// Events emitted by the step functions.
/// The presentation layer consumes these for animation, HUD and sound.
///
/// `PathPlanned` and `SettlePlanned` are requests: presentation plays them
/// and then calls `step::complete_plan`. Everything else is a notification.

use crate::domain::actor::{ActorId, Facing};
use crate::domain::grid::{Coordinate, Direction};
use crate::domain::mode::GameMode;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    ModeChanged { from: GameMode, to: GameMode },
    QueueOpened { capacity: usize },
    CommandQueued { dir: Direction, len: usize, capacity: usize },
    PathPlanned { actor: ActorId, from: Coordinate, waypoints: Vec<Coordinate> },
    SettlePlanned { actor: ActorId, from: Coordinate, to: Coordinate },
    ActorMoved { actor: ActorId, from: Coordinate, to: Coordinate },
    /// Non-player actor dropped after losing support; already committed.
    ActorSettled { actor: ActorId, from: Coordinate, to: Coordinate },
    RollAdvanced { value: u8 },
    ProjectileSpawned { id: ActorId, at: Coordinate, facing: Facing },
    ActorDamaged { id: ActorId, remaining: i32 },
    ActorDestroyed { id: ActorId, at: Coordinate },
    ItemPicked { item: ActorId, at: Coordinate },
    PlayerDamaged { remaining: i32 },
    PlayerDefeated,
    PlayerFell,
    LevelExitReached,
    DialogueStarted { npc: ActorId },
    DialogueAdvanced,
}

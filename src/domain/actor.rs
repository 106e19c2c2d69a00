/// Actors: everything that occupies or touches a cell.
/// Player, NPCs, enemies, crates, pickups and projectiles share one shape;
/// behaviour differences come from the collision category and the body.

use std::fmt;

use super::collision::{CollisionCategory, CollisionProfile};
use super::grid::{Coordinate, Direction};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    pub fn direction(self) -> Direction {
        match self {
            Facing::Left => Direction::Left,
            Facing::Right => Direction::Right,
        }
    }

    /// Horizontal presses turn the actor; vertical ones keep the old facing.
    pub fn turned(self, dir: Direction) -> Facing {
        match dir {
            Direction::Left => Facing::Left,
            Direction::Right => Facing::Right,
            Direction::Up | Direction::Down => self,
        }
    }
}

/// Health / damage logic body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Body {
    pub health: i32,
    pub damage: i32,
    pub damage_taken: i32,
    /// Projectiles damage it instead of merely stopping on it.
    pub destructible: bool,
    /// Excluded from the occupancy index; never blocks movement.
    pub intangible: bool,
}

impl Body {
    pub fn new(health: i32, damage: i32) -> Self {
        Body { health, damage, damage_taken: 0, destructible: false, intangible: false }
    }

    pub fn destructible(mut self) -> Self {
        self.destructible = true;
        self
    }

    pub fn intangible(mut self) -> Self {
        self.intangible = true;
        self
    }

    /// Default body for a category. Player health is overridden from config.
    pub fn for_category(category: CollisionCategory) -> Self {
        match category {
            CollisionCategory::Player => Body::new(3, 1),
            CollisionCategory::PlayerProjectile
            | CollisionCategory::EnemyProjectile => Body::new(1, 1).intangible(),
            CollisionCategory::Structure => Body::new(1, 0),
            CollisionCategory::Object => Body::new(2, 0).destructible(),
            CollisionCategory::Item => Body::new(1, 0).intangible(),
            CollisionCategory::Npc => Body::new(1, 0),
            CollisionCategory::Enemy => Body::new(2, 1).destructible(),
        }
    }

    pub fn remaining(&self) -> i32 {
        (self.health - self.damage_taken).max(0)
    }

    pub fn is_depleted(&self) -> bool {
        self.damage_taken >= self.health
    }

    /// Take `amount` damage. Returns true once health is used up.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        self.damage_taken = self.damage_taken.saturating_add(amount.max(0));
        self.is_depleted()
    }

    pub fn restore(&mut self) {
        self.damage_taken = 0;
    }
}

#[derive(Clone, Debug)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub coord: Coordinate,
    /// Where the level placed it; the player returns here on restart.
    pub spawn: Coordinate,
    pub profile: CollisionProfile,
    pub body: Body,
    pub facing: Facing,
}

impl Actor {
    pub fn new(id: ActorId, name: &str, category: CollisionCategory, coord: Coordinate) -> Self {
        Actor {
            id,
            name: name.to_string(),
            coord,
            spawn: coord,
            profile: CollisionProfile::for_category(category),
            body: Body::for_category(category),
            facing: Facing::Right,
        }
    }

    pub fn category(&self) -> CollisionCategory {
        self.profile.category
    }

    pub fn is_blocking(&self) -> bool {
        !self.body.intangible
    }

    pub fn falls(&self) -> bool {
        self.category().is_affected_by_gravity()
    }
}

/// Occupancy index: which blocking actor sits in which cell.
///
/// Only tangible actors are indexed. The index is the single source of
/// truth for "is this cell blocked"; terrain is just Structure actors.
/// Invariant: at most one occupant per coordinate.

use std::collections::HashMap;

use thiserror::Error;

use super::actor::{Actor, ActorId};
use super::grid::Coordinate;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OccupancyError {
    #[error("cell {at} is already occupied by actor {existing}")]
    Occupied { at: Coordinate, existing: ActorId },
}

#[derive(Clone, Debug, Default)]
pub struct OccupancyIndex {
    cells: HashMap<Coordinate, ActorId>,
}

impl OccupancyIndex {
    pub fn new() -> Self {
        OccupancyIndex::default()
    }

    /// An index holding a single occupant, such as a fresh level's player.
    pub fn with_occupant(at: Coordinate, id: ActorId) -> Self {
        OccupancyIndex { cells: HashMap::from([(at, id)]) }
    }

    /// Build from scratch; intangible actors are skipped.
    pub fn from_actors<'a>(actors: impl IntoIterator<Item = &'a Actor>) -> Result<Self, OccupancyError> {
        let mut index = OccupancyIndex::new();
        for actor in actors {
            if actor.is_blocking() {
                index.insert(actor.coord, actor.id)?;
            }
        }
        Ok(index)
    }

    pub fn insert(&mut self, at: Coordinate, id: ActorId) -> Result<(), OccupancyError> {
        match self.cells.get(&at) {
            Some(&existing) if existing != id => Err(OccupancyError::Occupied { at, existing }),
            _ => {
                self.cells.insert(at, id);
                Ok(())
            }
        }
    }

    /// Remove whoever occupies `at`.
    pub fn remove(&mut self, at: Coordinate) -> Option<ActorId> {
        self.cells.remove(&at)
    }

    /// Move `id` from `from` to `to`. Fails without changes if `to` is taken.
    pub fn relocate(&mut self, id: ActorId, from: Coordinate, to: Coordinate) -> Result<(), OccupancyError> {
        if let Some(&existing) = self.cells.get(&to) {
            if existing != id {
                return Err(OccupancyError::Occupied { at: to, existing });
            }
        }
        if self.cells.get(&from) == Some(&id) {
            self.cells.remove(&from);
        }
        self.cells.insert(to, id);
        Ok(())
    }

    pub fn occupant(&self, at: Coordinate) -> Option<ActorId> {
        self.cells.get(&at).copied()
    }

    pub fn is_blocked(&self, at: Coordinate) -> bool {
        self.cells.contains_key(&at)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coordinate, ActorId)> + '_ {
        self.cells.iter().map(|(&c, &id)| (c, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::collision::CollisionCategory;

    fn c(row: i32, col: i32) -> Coordinate {
        Coordinate::new(row, col)
    }

    #[test]
    fn intangible_actors_are_not_indexed() {
        let actors = vec![
            Actor::new(ActorId(1), "wall", CollisionCategory::Structure, c(1, 1)),
            Actor::new(ActorId(2), "coin", CollisionCategory::Item, c(1, 2)),
        ];
        let index = OccupancyIndex::from_actors(&actors).unwrap();
        assert!(index.is_blocked(c(1, 1)));
        assert!(!index.is_blocked(c(1, 2)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn single_occupant_index_blocks_its_cell() {
        let mut index = OccupancyIndex::with_occupant(c(2, 3), ActorId(0));
        assert_eq!(index.occupant(c(2, 3)), Some(ActorId(0)));
        assert_eq!(index.len(), 1);
        assert!(index.insert(c(2, 3), ActorId(5)).is_err());
    }

    #[test]
    fn one_occupant_per_cell() {
        let mut index = OccupancyIndex::new();
        index.insert(c(0, 0), ActorId(1)).unwrap();
        assert_eq!(
            index.insert(c(0, 0), ActorId(2)),
            Err(OccupancyError::Occupied { at: c(0, 0), existing: ActorId(1) })
        );
        // Re-inserting the same occupant is harmless.
        assert!(index.insert(c(0, 0), ActorId(1)).is_ok());
    }

    #[test]
    fn relocate_moves_or_refuses() {
        let mut index = OccupancyIndex::new();
        index.insert(c(0, 0), ActorId(1)).unwrap();
        index.insert(c(0, 2), ActorId(2)).unwrap();

        index.relocate(ActorId(1), c(0, 0), c(0, 1)).unwrap();
        assert_eq!(index.occupant(c(0, 1)), Some(ActorId(1)));
        assert!(!index.is_blocked(c(0, 0)));

        assert!(index.relocate(ActorId(1), c(0, 1), c(0, 2)).is_err());
        assert_eq!(index.occupant(c(0, 1)), Some(ActorId(1)));
        assert_eq!(index.occupant(c(0, 2)), Some(ActorId(2)));
    }

    #[test]
    fn duplicate_blockers_fail_rebuild() {
        let actors = vec![
            Actor::new(ActorId(1), "a", CollisionCategory::Structure, c(3, 3)),
            Actor::new(ActorId(2), "b", CollisionCategory::Object, c(3, 3)),
        ];
        assert!(OccupancyIndex::from_actors(&actors).is_err());
    }
}

/// Movement and drop rules, truth-table driven.
///
/// Pure functions over an immutable map view with no side effects.
/// They compute plans; committing a plan is the world's job.
///
/// ## Step Truth Table
///
/// Applied to each candidate cell in order. The first DENY ends the path;
/// remaining deltas are discarded.
/// ┌──────────────────────────────┬───────────┐
/// │ Condition                     │ Step?     │
/// ├──────────────────────────────┼───────────┤
/// │ Candidate outside grid        │ DENY      │
/// │ Occupied by another actor     │ DENY      │
/// │ Occupied by the mover itself  │ ALLOW     │
/// │ Otherwise                     │ ALLOW     │
/// └──────────────────────────────┴───────────┘
///
/// ## Drop Truth Table
///
/// Scans rows below the start in the same column. Grid bounds are not
/// consulted here; only the death boundary ends the scan.
/// ┌──────────────────────────────┬──────────────────────┐
/// │ Condition                     │ Result               │
/// ├──────────────────────────────┼──────────────────────┤
/// │ start row ≥ death row         │ FellOutOfBounds      │
/// │ first occupied row R < death  │ Settle at row R − 1  │
/// │ reached death row             │ FellOutOfBounds      │
/// └──────────────────────────────┴──────────────────────┘

use super::actor::ActorId;
use super::grid::{Coordinate, Direction, GridMatrix};
use super::occupancy::OccupancyIndex;

/// Immutable view for rule queries, seen from one moving actor.
pub struct MapView<'a> {
    pub grid: &'a GridMatrix,
    pub occupancy: &'a OccupancyIndex,
    /// The actor being moved; its own cell never blocks it.
    pub mover: Option<ActorId>,
}

impl<'a> MapView<'a> {
    /// Occupied by someone other than the mover.
    pub fn is_occupied(&self, at: Coordinate) -> bool {
        match self.occupancy.occupant(at) {
            Some(id) => Some(id) != self.mover,
            None => false,
        }
    }

    pub fn is_blocked(&self, at: Coordinate) -> bool {
        !self.grid.contains(at) || self.is_occupied(at)
    }
}

// ── Movement ──

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovePlan {
    /// Accepted cells in order, start excluded.
    pub waypoints: Vec<Coordinate>,
    /// Last waypoint, or the start when nothing was accepted.
    pub destination: Coordinate,
    /// Some requested deltas were discarded.
    pub truncated: bool,
}

impl MovePlan {
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Longest collision-free prefix of `dirs` starting from `start`.
pub fn resolve_path(map: &MapView, start: Coordinate, dirs: &[Direction]) -> MovePlan {
    let mut waypoints = Vec::with_capacity(dirs.len());
    let mut at = start;
    for &dir in dirs {
        let next = at.offset(dir);
        if map.is_blocked(next) {
            break;
        }
        waypoints.push(next);
        at = next;
    }
    MovePlan {
        truncated: waypoints.len() < dirs.len(),
        waypoints,
        destination: at,
    }
}

// ── Drop ──

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    /// Rest here; the cell below is occupied.
    Settle(Coordinate),
    FellOutOfBounds,
}

/// Gravity settle along increasing rows. See truth table above.
pub fn resolve_drop(map: &MapView, from: Coordinate, death_row: i32) -> DropOutcome {
    if from.row >= death_row {
        return DropOutcome::FellOutOfBounds;
    }
    let mut row = from.row + 1;
    while row < death_row {
        let probe = Coordinate::new(row, from.col);
        if map.is_occupied(probe) {
            return DropOutcome::Settle(Coordinate::new(row - 1, from.col));
        }
        row += 1;
    }
    DropOutcome::FellOutOfBounds
}

/// Is there support directly under `at`?
pub fn has_support(map: &MapView, at: Coordinate) -> bool {
    map.is_occupied(at.below())
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const MOVER: ActorId = ActorId(0);

    /// Helper: build a grid + occupancy from a string diagram.
    /// Legend:  '#'=blocker  'P'=mover  anything else=empty
    /// Returns the mover's coordinate (or (0,0) if absent).
    fn map_from(rows: &[&str]) -> (GridMatrix, OccupancyIndex, Coordinate) {
        let grid = GridMatrix::new(rows.len(), rows.iter().map(|r| r.len()).max().unwrap_or(0));
        let mut occ = OccupancyIndex::new();
        let mut mover = Coordinate::new(0, 0);
        let mut next_id = 1;
        for (r, row) in rows.iter().enumerate() {
            for (col, ch) in row.chars().enumerate() {
                let at = Coordinate::new(r as i32, col as i32);
                match ch {
                    '#' => {
                        occ.insert(at, ActorId(next_id)).unwrap();
                        next_id += 1;
                    }
                    'P' => {
                        occ.insert(at, MOVER).unwrap();
                        mover = at;
                    }
                    _ => {}
                }
            }
        }
        (grid, occ, mover)
    }

    fn view<'a>(grid: &'a GridMatrix, occ: &'a OccupancyIndex) -> MapView<'a> {
        MapView { grid, occupancy: occ, mover: Some(MOVER) }
    }

    use Direction::*;

    // ── resolve_path ──

    #[test]
    fn clear_path_takes_every_step() {
        let (g, o, p) = map_from(&[
            "......",
            ".P....",
            "######",
        ]);
        let plan = resolve_path(&view(&g, &o), p, &[Right, Right, Up]);
        assert_eq!(plan.waypoints, vec![
            Coordinate::new(1, 2),
            Coordinate::new(1, 3),
            Coordinate::new(0, 3),
        ]);
        assert_eq!(plan.destination, Coordinate::new(0, 3));
        assert!(!plan.truncated);
    }

    #[test]
    fn path_stops_before_blocker() {
        let (g, o, p) = map_from(&[
            "......",
            ".P.#..",
            "######",
        ]);
        let plan = resolve_path(&view(&g, &o), p, &[Right, Right, Down]);
        assert_eq!(plan.waypoints, vec![Coordinate::new(1, 2)]);
        assert_eq!(plan.destination, Coordinate::new(1, 2));
        assert!(plan.truncated);
    }

    #[test]
    fn immediately_blocked_is_empty_noop() {
        let (g, o, p) = map_from(&[
            ".P#",
            "###",
        ]);
        let plan = resolve_path(&view(&g, &o), p, &[Right]);
        assert!(plan.is_empty());
        assert_eq!(plan.destination, p);
    }

    #[test]
    fn empty_delta_list_is_noop() {
        let (g, o, p) = map_from(&["P.."]);
        let plan = resolve_path(&view(&g, &o), p, &[]);
        assert!(plan.is_empty());
        assert!(!plan.truncated);
        assert_eq!(plan.destination, p);
    }

    #[test]
    fn grid_edge_blocks() {
        let (g, o, p) = map_from(&["P.."]);
        let plan = resolve_path(&view(&g, &o), p, &[Left, Right]);
        assert!(plan.is_empty());
        let plan = resolve_path(&view(&g, &o), p, &[Up]);
        assert!(plan.is_empty());
    }

    #[test]
    fn mover_may_return_to_its_own_cell() {
        let (g, o, p) = map_from(&[
            ".P.",
            "###",
        ]);
        let plan = resolve_path(&view(&g, &o), p, &[Right, Left, Left]);
        assert_eq!(plan.waypoints, vec![
            Coordinate::new(0, 2),
            Coordinate::new(0, 1),
            Coordinate::new(0, 0),
        ]);
    }

    #[test]
    fn path_is_prefix_unoccupied_and_idempotent() {
        let (g, o, p) = map_from(&[
            "..#...",
            ".P..#.",
            "....#.",
            "######",
        ]);
        let dirs = [Right, Right, Up, Right, Down, Down, Left];
        let map = view(&g, &o);
        let first = resolve_path(&map, p, &dirs);
        let second = resolve_path(&map, p, &dirs);
        assert_eq!(first, second);

        // Every waypoint is free and reachable by the matching delta.
        let mut at = p;
        for (i, wp) in first.waypoints.iter().enumerate() {
            assert!(!map.is_occupied(*wp));
            assert_eq!(at.offset(dirs[i]), *wp);
            at = *wp;
        }
        assert!(first.waypoints.len() <= dirs.len());
    }

    // ── resolve_drop ──

    #[test]
    fn drop_lands_above_first_blocker() {
        let (g, o, p) = map_from(&[
            ".P.",
            "...",
            "...",
            ".#.",
        ]);
        let out = resolve_drop(&view(&g, &o), p, 10);
        assert_eq!(out, DropOutcome::Settle(Coordinate::new(2, 1)));
    }

    #[test]
    fn drop_with_immediate_support_stays() {
        let (g, o, p) = map_from(&[
            ".P.",
            "###",
        ]);
        assert_eq!(resolve_drop(&view(&g, &o), p, 5), DropOutcome::Settle(p));
        assert!(has_support(&view(&g, &o), p));
    }

    #[test]
    fn drop_without_support_falls_out() {
        let (g, o, _) = map_from(&["....", "....", "...."]);
        let out = resolve_drop(&view(&g, &o), Coordinate::new(2, 3), 17);
        assert_eq!(out, DropOutcome::FellOutOfBounds);
    }

    #[test]
    fn drop_ignores_blockers_at_or_beyond_boundary() {
        let (g, o, p) = map_from(&[
            "P",
            ".",
            "#",
        ]);
        // Boundary at row 2: the blocker sits on it, not before it.
        assert_eq!(resolve_drop(&view(&g, &o), p, 2), DropOutcome::FellOutOfBounds);
        assert_eq!(resolve_drop(&view(&g, &o), p, 3), DropOutcome::Settle(Coordinate::new(1, 0)));
    }

    #[test]
    fn drop_starting_past_boundary_falls() {
        let (g, o, _) = map_from(&["."]);
        assert_eq!(
            resolve_drop(&view(&g, &o), Coordinate::new(5, 0), 5),
            DropOutcome::FellOutOfBounds
        );
    }

    #[test]
    fn drop_ignores_movers_stale_cell() {
        // Mover indexed at row 2 but dropping from row 0 (moved up logically).
        let (g, mut o, _) = map_from(&[
            "...",
            "...",
            "...",
            "###",
        ]);
        o.insert(Coordinate::new(2, 1), MOVER).unwrap();
        let out = resolve_drop(&view(&g, &o), Coordinate::new(0, 1), 10);
        assert_eq!(out, DropOutcome::Settle(Coordinate::new(2, 1)));
    }

    #[test]
    fn drop_result_rests_on_occupied_or_falls() {
        let (g, o, _) = map_from(&[
            "......",
            "..#...",
            "......",
            "#...#.",
            "......",
        ]);
        let map = view(&g, &o);
        let death = 5;
        for col in 0..6 {
            match resolve_drop(&map, Coordinate::new(0, col), death) {
                DropOutcome::Settle(c) => {
                    assert!(c.row < death);
                    assert!(map.is_occupied(c.below()));
                }
                DropOutcome::FellOutOfBounds => {
                    for row in 1..death {
                        assert!(!map.is_occupied(Coordinate::new(row, col)));
                    }
                }
            }
        }
    }
}

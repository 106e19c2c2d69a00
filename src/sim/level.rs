/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by name)
///   2. Built-in embedded levels
///
/// ## Level format (`.txt`):
///   Line 1: `# Level Name`
///   Optional: `@ death N` (death boundary row; default = map height)
///   Lines: map rows (ragged rows are padded with empty cells)
///
/// ## Tile legend:
///   '#' '=' = Wall (Structure)     'o' = Crate (destructible Object)
///   '$' = Coin (Item)              'N' = Sage (Npc)
///   'X' = Exit (Npc named "Exit")  'E' = Crawler (Enemy)
///   'P' = Player spawn             ' ' '.' = Empty
///
/// Content errors surface here, before the core ever runs.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{GameConfig, RulesConfig};
use crate::domain::collision::{CollisionCategory, EXIT_NAME};
use crate::domain::grid::{Coordinate, GridMatrix};
use crate::domain::occupancy::OccupancyError;
use crate::sim::world::WorldState;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level has no map rows")]
    Empty,
    #[error("level has no player spawn 'P'")]
    MissingPlayer,
    #[error("second player spawn at {second} (first at {first})")]
    MultiplePlayers { first: Coordinate, second: Coordinate },
    #[error("unknown tile {ch:?} at {at}")]
    UnknownTile { ch: char, at: Coordinate },
    #[error("bad header line: {line:?}")]
    BadHeader { line: String },
    #[error("death row {row} must be below the top row")]
    BadDeathRow { row: i32 },
    #[error(transparent)]
    Occupancy(#[from] OccupancyError),
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Parsed level text, not yet validated against the core's rules.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
    pub death_row: Option<i32>,
}

// ══════════════════════════════════════════════════════════════
// Embedded levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[&str] = &[
"# First Roll
......................
......................
...........$..........
..........###.........
.....$...............X
..P.......o...........
######...########..###",
"# Crates and Crawlers
........................
...............$........
..............###.......
.....o..................
.....o.....N.......E...X
..P..o.....###..........
#######..######..#######",
"# Long Drop
@ death 14
..........................
..P...........$...........
#####.....................
..............o...........
.........$...###......$...
........###...........X...
.................E....###.
...............#####......",
];

pub fn embedded_levels() -> Vec<LevelDef> {
    EMBEDDED.iter()
        .filter_map(|text| match parse_level(text) {
            Ok(def) => Some(def),
            Err(e) => {
                log::warn!("embedded level rejected: {e}");
                None
            }
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Levels from the configured directory, or the embedded set if none load.
pub fn load_levels(config: &GameConfig) -> Vec<LevelDef> {
    let from_dir = load_levels_from_dir(&config.levels_dir);
    if from_dir.is_empty() {
        log::info!("no levels in {}; using built-in levels", config.levels_dir.display());
        embedded_levels()
    } else {
        from_dir
    }
}

/// Every parseable `.txt` level in `dir`, sorted by file name.
pub fn load_levels_from_dir(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |x| x == "txt"))
        .collect();
    paths.sort();

    let mut levels = vec![];
    for path in paths {
        match load_level_file(&path) {
            Ok(def) => levels.push(def),
            Err(e) => log::warn!("skipping {}: {e}", path.display()),
        }
    }
    levels
}

pub fn load_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    parse_level(&text)
}

/// Parse level text. Header lines first, then map rows.
pub fn parse_level(text: &str) -> Result<LevelDef, LevelError> {
    let mut lines = text.lines().peekable();
    let mut name = String::from("Untitled");
    let mut death_row = None;

    if let Some(first) = lines.peek() {
        if let Some(rest) = first.strip_prefix('#') {
            // A wall row also starts with '#'; only "# " is a title.
            if rest.starts_with(' ') || rest.is_empty() {
                name = rest.trim().to_string();
                lines.next();
            }
        }
    }

    while let Some(line) = lines.peek() {
        let Some(rest) = line.strip_prefix('@') else { break };
        let mut parts = rest.split_whitespace();
        match (parts.next(), parts.next().map(str::parse::<i32>), parts.next()) {
            (Some("death"), Some(Ok(row)), None) => death_row = Some(row),
            _ => return Err(LevelError::BadHeader { line: line.to_string() }),
        }
        lines.next();
    }

    let mut rows: Vec<String> = lines.map(|l| l.trim_end().to_string()).collect();
    while rows.last().map_or(false, |r| r.is_empty()) {
        rows.pop();
    }
    if rows.is_empty() {
        return Err(LevelError::Empty);
    }

    Ok(LevelDef { name, rows, death_row })
}

/// Validate a level and build a fresh world session from it.
pub fn build_world(def: &LevelDef, rules: &RulesConfig) -> Result<WorldState, LevelError> {
    let height = def.rows.len();
    if height == 0 {
        return Err(LevelError::Empty);
    }
    let width = def.rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);

    let mut spawn: Option<Coordinate> = None;
    for (r, row) in def.rows.iter().enumerate() {
        for (c, ch) in row.chars().enumerate() {
            if ch != 'P' { continue; }
            let at = Coordinate::new(r as i32, c as i32);
            if let Some(first) = spawn {
                return Err(LevelError::MultiplePlayers { first, second: at });
            }
            spawn = Some(at);
        }
    }
    let spawn = spawn.ok_or(LevelError::MissingPlayer)?;

    let death_row = def.death_row.unwrap_or(height as i32);
    if death_row <= 0 {
        return Err(LevelError::BadDeathRow { row: death_row });
    }

    let mut world = WorldState::new(GridMatrix::new(height, width), death_row, spawn, rules.clone());
    world.level_name = def.name.clone();

    for (r, row) in def.rows.iter().enumerate() {
        for (c, ch) in row.chars().enumerate() {
            let at = Coordinate::new(r as i32, c as i32);
            let (name, category) = match ch {
                '#' | '=' => ("Wall", CollisionCategory::Structure),
                'o' => ("Crate", CollisionCategory::Object),
                '$' => ("Coin", CollisionCategory::Item),
                'N' => ("Sage", CollisionCategory::Npc),
                'X' => (EXIT_NAME, CollisionCategory::Npc),
                'E' => ("Crawler", CollisionCategory::Enemy),
                ' ' | '.' | 'P' => continue,
                other => return Err(LevelError::UnknownTile { ch: other, at }),
            };
            world.spawn(name, category, at)?;
        }
    }

    log::info!(
        "level {:?} loaded: {}x{}, {} actors, death row {}",
        world.level_name, height, width, world.actors.len() + 1, death_row,
    );
    Ok(world)
}

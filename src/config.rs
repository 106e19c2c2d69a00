/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub rules: RulesConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
}

/// Knobs the core reads while a level is running.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulesConfig {
    pub starting_roll: u8,
    pub player_health: i32,
    pub projectile_damage: i32,
    pub pickup_score: u32,
}

/// Front-end pacing. The core never looks at wall-clock time.
#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub step_ms: u64,        // per waypoint / per settled row
    pub projectile_ms: u64,  // per projectile cell
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    pub pause: Vec<String>,
    pub quit: Vec<String>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            starting_roll: default_starting_roll(),
            player_health: default_player_health(),
            projectile_damage: default_projectile_damage(),
            pickup_score: default_pickup_score(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_starting_roll")]
    starting_roll: u8,
    #[serde(default = "default_player_health")]
    player_health: i32,
    #[serde(default = "default_projectile_damage")]
    projectile_damage: i32,
    #[serde(default = "default_pickup_score")]
    pickup_score: u32,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_step")]
    step_ms: u64,
    #[serde(default = "default_projectile")]
    projectile_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_primary")]
    primary: Vec<String>,
    #[serde(default = "default_secondary")]
    secondary: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_starting_roll() -> u8 { 1 }
fn default_player_health() -> i32 { 3 }
fn default_projectile_damage() -> i32 { 1 }
fn default_pickup_score() -> u32 { 10 }

fn default_tick_rate() -> u64 { 60 }
fn default_step() -> u64 { 90 }
fn default_projectile() -> u64 { 60 }

fn default_primary() -> Vec<String> { vec!["A".into()] }
fn default_secondary() -> Vec<String> { vec!["B".into(), "X".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            starting_roll: default_starting_roll(),
            player_health: default_player_health(),
            projectile_damage: default_projectile_damage(),
            pickup_score: default_pickup_score(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            step_ms: default_step(),
            projectile_ms: default_projectile(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            primary: default_primary(),
            secondary: default_secondary(),
            pause: default_pause(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no filesystem search for the file itself).
    pub fn from_toml_str(text: &str) -> Self {
        let toml_cfg = parse_toml(text).unwrap_or_default();
        Self::from_toml(toml_cfg, &[])
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let rules = RulesConfig {
            starting_roll: toml_cfg.rules.starting_roll,
            player_health: toml_cfg.rules.player_health.max(1),
            projectile_damage: toml_cfg.rules.projectile_damage.max(0),
            pickup_score: toml_cfg.rules.pickup_score,
        };
        if rules.player_health != toml_cfg.rules.player_health {
            log::warn!("player_health must be at least 1; using {}", rules.player_health);
        }

        GameConfig {
            rules,
            timing: TimingConfig {
                tick_rate_ms: toml_cfg.timing.tick_rate_ms.max(1),
                step_ms: toml_cfg.timing.step_ms,
                projectile_ms: toml_cfg.timing.projectile_ms,
            },
            gamepad: GamepadConfig {
                primary: toml_cfg.gamepad.primary,
                secondary: toml_cfg.gamepad.secondary,
                pause: toml_cfg.gamepad.pause,
                quit: toml_cfg.gamepad.quit,
            },
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/rolldrop");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn parse_toml(text: &str) -> Option<TomlConfig> {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            log::warn!("config.toml parse error: {e}; using default settings");
            None
        }
    }
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    log::info!("loading config from {}", path.display());
                    return parse_toml(&text).unwrap_or_default();
                }
                Err(e) => {
                    log::warn!("could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        let cfg = GameConfig::from_toml_str("");
        assert_eq!(cfg.rules, RulesConfig::default());
        assert_eq!(cfg.timing.step_ms, 90);
        assert_eq!(cfg.gamepad.pause, vec!["Start".to_string()]);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str("[rules]\nstarting_roll = 4\n\n[timing]\nstep_ms = 10\n");
        assert_eq!(cfg.rules.starting_roll, 4);
        assert_eq!(cfg.rules.player_health, 3);
        assert_eq!(cfg.timing.step_ms, 10);
        assert_eq!(cfg.timing.tick_rate_ms, 60);
    }

    #[test]
    fn bad_toml_falls_back() {
        let cfg = GameConfig::from_toml_str("[rules\nstarting_roll = ");
        assert_eq!(cfg.rules, RulesConfig::default());
    }

    #[test]
    fn nonsense_health_is_clamped() {
        let cfg = GameConfig::from_toml_str("[rules]\nplayer_health = 0\nprojectile_damage = -3\n");
        assert_eq!(cfg.rules.player_health, 1);
        assert_eq!(cfg.rules.projectile_damage, 0);
    }
}

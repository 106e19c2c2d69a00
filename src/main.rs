/// Entry point and game loop.
///
/// Per frame:
///   1. Drain keyboard / gamepad
///   2. Meta keys (quit, restart) handled here, never by the core
///   3. Translate presses into logical inputs and `step::dispatch` them
///   4. On the tick: playback advances plans and the projectile
///   5. Events go back through playback (messages, dialogue, outcomes)
///   6. Render
///
/// Run with `--debug` to write a log to `rolldrop.log`.

mod ui;

use std::fs::File;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use simplelog::{LevelFilter, WriteLogger};

use rolldrop::config::GameConfig;
use rolldrop::domain::grid::Direction;
use rolldrop::domain::mode::{GameMode, Input};
use rolldrop::sim::event::GameEvent;
use rolldrop::sim::level::{self, LevelDef};
use rolldrop::sim::step;
use rolldrop::sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::playback::{Outcome, Playback};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const LOG_FILE: &str = "rolldrop.log";

fn main() {
    setup_logging();

    let config = GameConfig::load();
    let levels = level::load_levels(&config);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&levels, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(summary) => {
            println!();
            println!("{summary}");
        }
        Err(e) => eprintln!("Game error: {e}"),
    }
}

fn setup_logging() {
    if !std::env::args().any(|arg| arg == "--debug") {
        return;
    }
    let file = match File::create(LOG_FILE) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("could not create {LOG_FILE}: {e}");
            return;
        }
    };
    let config = simplelog::ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .build();
    if let Err(e) = WriteLogger::init(LevelFilter::Debug, config, file) {
        eprintln!("logger init failed: {e}");
    }
}

// ── Session: which level is running ──

struct Session<'a> {
    levels: &'a [LevelDef],
    index: usize,
    world: WorldState,
    playback: Playback,
    banked_score: u32,
}

impl<'a> Session<'a> {
    /// Start at the first level that builds, from `index` onwards.
    fn start(levels: &'a [LevelDef], index: usize, config: &GameConfig, banked_score: u32) -> Option<Self> {
        for (i, def) in levels.iter().enumerate().skip(index) {
            match level::build_world(def, &config.rules) {
                Ok(world) => {
                    return Some(Session {
                        levels,
                        index: i,
                        world,
                        playback: Playback::new(Instant::now()),
                        banked_score,
                    });
                }
                Err(e) => log::warn!("level {:?} skipped: {e}", def.name),
            }
        }
        None
    }

    fn label(&self) -> String {
        format!("{}/{} {}", self.index + 1, self.levels.len(), self.world.level_name)
    }

    fn total_score(&self) -> u32 {
        self.banked_score + self.world.score
    }

    /// Feed events to playback until no follow-ups remain.
    fn absorb(&mut self, events: Vec<GameEvent>, now: Instant) {
        let mut pending = events;
        while !pending.is_empty() {
            pending = self.playback.absorb(&mut self.world, &pending, now);
        }
    }

    fn restart(&mut self, now: Instant) {
        self.playback.reset(now);
        let events = step::restart_level(&mut self.world);
        self.absorb(events, now);
    }
}

fn game_loop(
    levels: &[LevelDef],
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut session = Session::start(levels, 0, config, 0)
        .ok_or("no playable levels found")?;

    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();
        let now = Instant::now();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
            return Ok(format!("Quit on level {}. Score: {}", session.index + 1, session.total_score()));
        }
        if kb.any_pressed(KEYS_RESTART) {
            session.restart(now);
        }

        let mut events = Vec::new();
        for input in translate(&kb, &gp, &session.world) {
            events.extend(step::dispatch(&mut session.world, input));
        }

        if now.duration_since(last_tick) >= tick_rate {
            events.extend(session.playback.tick(&mut session.world, now, &config.timing));
            last_tick = now;
        }
        session.absorb(events, now);

        match session.playback.take_outcome(now) {
            Some(Outcome::Lost) => session.restart(now),
            Some(Outcome::Cleared) => {
                let banked = session.total_score();
                match Session::start(levels, session.index + 1, config, banked) {
                    Some(next) => session = next,
                    None => return Ok(format!("All levels cleared! Final score: {banked}")),
                }
            }
            None => {}
        }

        let mut label = session.label();
        if gp.connected {
            label.push_str(" [pad]");
        }
        renderer.render(&session.world, &session.playback, &label)?;
        std::thread::sleep(FRAME_SLEEP);
    }
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_PRIMARY: &[KeyCode] = &[
    KeyCode::Char('z'), KeyCode::Char('Z'), KeyCode::Char('j'), KeyCode::Char('J'), KeyCode::Enter,
];
const KEYS_SECONDARY: &[KeyCode] = &[
    KeyCode::Char('x'), KeyCode::Char('X'), KeyCode::Char('k'), KeyCode::Char('K'), KeyCode::Char(' '),
];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P'), KeyCode::Esc];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

fn key_direction(code: KeyCode) -> Option<Direction> {
    let is = |keys: &[KeyCode]| keys.contains(&code);
    if is(KEYS_UP) {
        Some(Direction::Up)
    } else if is(KEYS_DOWN) {
        Some(Direction::Down)
    } else if is(KEYS_LEFT) {
        Some(Direction::Left)
    } else if is(KEYS_RIGHT) {
        Some(Direction::Right)
    } else {
        None
    }
}

fn held_direction(kb: &InputState, gp: &GamepadState) -> Option<Direction> {
    if kb.any_held(KEYS_UP) {
        Some(Direction::Up)
    } else if kb.any_held(KEYS_DOWN) {
        Some(Direction::Down)
    } else if kb.any_held(KEYS_LEFT) {
        Some(Direction::Left)
    } else if kb.any_held(KEYS_RIGHT) {
        Some(Direction::Right)
    } else {
        gp.dir_held()
    }
}

/// Presses become logical inputs in arrival order. Holding a direction
/// keeps walking in Free mode once the previous step has committed.
fn translate(kb: &InputState, gp: &GamepadState, world: &WorldState) -> Vec<Input> {
    let mut inputs = Vec::new();
    for &code in kb.presses() {
        if let Some(dir) = key_direction(code) {
            inputs.push(Input::Move(dir));
        } else if KEYS_PRIMARY.contains(&code) {
            inputs.push(Input::Primary);
        } else if KEYS_SECONDARY.contains(&code) {
            inputs.push(Input::Secondary);
        } else if KEYS_PAUSE.contains(&code) {
            inputs.push(Input::PauseToggle);
        }
    }

    if let Some(dir) = gp.dir_pressed() {
        inputs.push(Input::Move(dir));
    }
    if gp.primary_pressed() {
        inputs.push(Input::Primary);
    }
    if gp.secondary_pressed() {
        inputs.push(Input::Secondary);
    }
    if gp.pause_pressed() {
        inputs.push(Input::PauseToggle);
    }

    if inputs.is_empty() && world.mode.current() == GameMode::Free && !world.is_busy() {
        if let Some(dir) = held_direction(kb, gp) {
            inputs.push(Input::Move(dir));
        }
    }
    inputs
}

/// Game-mode state machine and input admission.
///
/// Exactly one mode is active. Paused keeps a single-slot history so
/// `resume()` lands back where the game was.
///
/// ## Admission Table
/// ┌───────────┬──────────┬─────────────┬───────────┬─────────────┐
/// │ Mode      │ Move     │ Primary     │ Secondary │ PauseToggle │
/// ├───────────┼──────────┼─────────────┼───────────┼─────────────┤
/// │ Free      │ Move     │ Attack      │ Jump      │ Pause       │
/// │ Queued    │ Move     │ Attack      │ -         │ Pause       │
/// │ Dialogue  │ -        │ AdvanceText │ -         │ Pause       │
/// │ Cinematic │ -        │ -           │ -         │ -           │
/// │ Paused    │ -        │ -           │ -         │ Resume      │
/// └───────────┴──────────┴─────────────┴───────────┴─────────────┘

use super::grid::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GameMode {
    Free,
    Queued,
    Dialogue,
    Cinematic,
    Paused,
}

/// Logical input, already translated from keys / buttons.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Input {
    Move(Direction),
    Primary,
    Secondary,
    PauseToggle,
}

/// What an input means in the current mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Admission {
    Move(Direction),
    Attack,
    Jump,
    AdvanceText,
    Pause,
    Resume,
    Rejected,
}

impl GameMode {
    pub fn admit(self, input: Input) -> Admission {
        match (self, input) {
            (GameMode::Free | GameMode::Queued, Input::Move(dir)) => Admission::Move(dir),
            (GameMode::Free | GameMode::Queued, Input::Primary) => Admission::Attack,
            (GameMode::Free, Input::Secondary) => Admission::Jump,
            (GameMode::Dialogue, Input::Primary) => Admission::AdvanceText,
            (GameMode::Free | GameMode::Queued | GameMode::Dialogue, Input::PauseToggle) => Admission::Pause,
            (GameMode::Paused, Input::PauseToggle) => Admission::Resume,
            _ => Admission::Rejected,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ModeMachine {
    current: GameMode,
    previous: Option<GameMode>,
}

impl Default for ModeMachine {
    fn default() -> Self {
        ModeMachine::new()
    }
}

impl ModeMachine {
    pub fn new() -> Self {
        ModeMachine { current: GameMode::Free, previous: None }
    }

    pub fn current(&self) -> GameMode {
        self.current
    }

    /// Mode that `resume()` would restore, if paused.
    pub fn previous(&self) -> Option<GameMode> {
        self.previous
    }

    pub fn enter(&mut self, mode: GameMode) {
        if mode == GameMode::Paused {
            // Re-pausing keeps the original history.
            if self.current != GameMode::Paused {
                self.previous = Some(self.current);
            }
        } else {
            self.previous = None;
        }
        self.current = mode;
    }

    pub fn pause(&mut self) {
        self.enter(GameMode::Paused);
    }

    /// Restore the paused-over mode. No-op outside Paused.
    pub fn resume(&mut self) {
        if self.current != GameMode::Paused {
            return;
        }
        self.current = self.previous.take().unwrap_or(GameMode::Free);
    }

    /// Like `enter`, but while paused the target replaces the history slot
    /// so the pause survives and `resume()` lands in `mode`.
    pub fn enter_or_defer(&mut self, mode: GameMode) {
        if self.current == GameMode::Paused && mode != GameMode::Paused {
            self.previous = Some(mode);
        } else {
            self.enter(mode);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [GameMode; 5] = [
        GameMode::Free,
        GameMode::Queued,
        GameMode::Dialogue,
        GameMode::Cinematic,
        GameMode::Paused,
    ];

    #[test]
    fn pause_resume_restores_every_mode() {
        for mode in ALL {
            let mut m = ModeMachine::new();
            m.enter(mode);
            m.enter(GameMode::Paused);
            assert_eq!(m.current(), GameMode::Paused);
            m.resume();
            assert_eq!(m.current(), mode, "pre-paused mode {mode:?}");
            assert_eq!(m.previous(), None);
        }
    }

    #[test]
    fn resume_outside_pause_is_noop() {
        let mut m = ModeMachine::new();
        m.enter(GameMode::Dialogue);
        m.resume();
        assert_eq!(m.current(), GameMode::Dialogue);
    }

    #[test]
    fn enter_overwrites_and_clears_history() {
        let mut m = ModeMachine::new();
        m.enter(GameMode::Queued);
        m.pause();
        m.enter(GameMode::Cinematic);
        assert_eq!(m.current(), GameMode::Cinematic);
        assert_eq!(m.previous(), None);
    }

    #[test]
    fn deferred_enter_keeps_pause() {
        let mut m = ModeMachine::new();
        m.enter(GameMode::Queued);
        m.pause();
        m.enter_or_defer(GameMode::Free);
        assert_eq!(m.current(), GameMode::Paused);
        m.resume();
        assert_eq!(m.current(), GameMode::Free);

        m.enter_or_defer(GameMode::Dialogue);
        assert_eq!(m.current(), GameMode::Dialogue);
    }

    #[test]
    fn admission_table() {
        let right = Input::Move(Direction::Right);
        assert_eq!(GameMode::Free.admit(right), Admission::Move(Direction::Right));
        assert_eq!(GameMode::Queued.admit(right), Admission::Move(Direction::Right));
        assert_eq!(GameMode::Dialogue.admit(right), Admission::Rejected);
        assert_eq!(GameMode::Cinematic.admit(right), Admission::Rejected);
        assert_eq!(GameMode::Paused.admit(right), Admission::Rejected);

        assert_eq!(GameMode::Free.admit(Input::Secondary), Admission::Jump);
        assert_eq!(GameMode::Queued.admit(Input::Secondary), Admission::Rejected);
        assert_eq!(GameMode::Dialogue.admit(Input::Primary), Admission::AdvanceText);

        for input in [right, Input::Primary, Input::Secondary, Input::PauseToggle] {
            assert_eq!(GameMode::Cinematic.admit(input), Admission::Rejected);
        }
        assert_eq!(GameMode::Paused.admit(Input::PauseToggle), Admission::Resume);
        assert_eq!(GameMode::Paused.admit(Input::Primary), Admission::Rejected);
    }
}

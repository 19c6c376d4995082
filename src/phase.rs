use crate::snapshot::{GameSnapshot, RoundStart};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Idle,
    Starting,
    Running,
    Over,
}

impl GamePhase {
    pub fn name(self) -> &'static str {
        match self {
            GamePhase::Idle => "idle",
            GamePhase::Starting => "starting",
            GamePhase::Running => "running",
            GamePhase::Over => "over",
        }
    }

    pub fn is_polling(self) -> bool {
        matches!(self, GamePhase::Starting | GamePhase::Running)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Over { final_score: u32 },
    Running {
        entered: bool,
        new_target: Option<String>,
        round_start: RoundStart,
    },
    Ignored,
}

#[derive(Debug)]
pub struct PhaseMachine {
    phase: GamePhase,
    score: u32,
    target: Option<String>,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Idle,
            score: 0,
            target: None,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    // Only Idle and Over accept a start.
    pub fn begin(&mut self) -> bool {
        if self.phase.is_polling() {
            return false;
        }
        self.phase = GamePhase::Starting;
        self.target = None;
        true
    }

    pub fn reset(&mut self) {
        self.phase = GamePhase::Idle;
        self.target = None;
    }

    pub fn observe(&mut self, snapshot: &GameSnapshot) -> Observation {
        if !self.phase.is_polling() {
            return Observation::Ignored;
        }

        if snapshot.is_over() {
            self.phase = GamePhase::Over;
            self.score = snapshot.score;
            self.target = None;
            return Observation::Over {
                final_score: snapshot.score,
            };
        }

        let Some(item) = snapshot.target() else {
            return Observation::Ignored;
        };

        let entered = self.phase != GamePhase::Running;
        let new_target = if self.target.as_deref() != Some(item) {
            self.target = Some(item.to_string());
            Some(item.to_string())
        } else {
            None
        };
        self.phase = GamePhase::Running;
        self.score = snapshot.score;

        Observation::Running {
            entered,
            new_target,
            round_start: snapshot.time_round_start,
        }
    }
}

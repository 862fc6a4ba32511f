//! Wizard position state machine. Decides which screen is showing and how it moves.
//!
//! Index 0 is the landing screen, 1..=6 the setup steps, 7 the completion
//! screen. `jump_to` is deliberately unbounded, so the position may hold any
//! integer; such positions render as [`Screen::OutOfRange`].

use serde::Serialize;

use super::model::{CompletedSteps, OnboardingAnswers, StepId};

/// Index of the landing screen.
pub const LANDING: i64 = 0;
/// Index of the first setup step.
pub const FIRST_STEP: i64 = 1;
/// Index of the last setup step.
pub const LAST_STEP: i64 = 6;
/// Index of the completion screen.
pub const COMPLETION: i64 = 7;

/// What the wizard is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "step", rename_all = "snake_case")]
pub enum Screen {
    Landing,
    Step(StepId),
    Completion,
    /// Reached only through an unbounded `jump_to`.
    OutOfRange(i64),
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Landing => write!(f, "landing"),
            Self::Step(step) => write!(f, "step:{step}"),
            Self::Completion => write!(f, "completion"),
            Self::OutOfRange(index) => write!(f, "out_of_range:{index}"),
        }
    }
}

/// Whether the directional Next button may move on from `step_index`.
///
/// Steps 1-4 are advisory. Steps 5 and 6 need their handle filled in.
pub fn can_proceed(step_index: i64, answers: &OnboardingAnswers) -> bool {
    match StepId::from_index(step_index) {
        Some(StepId::PracticeSite) => answers.practice_site_handle_set(),
        Some(StepId::Network) => answers.network_handle_set(),
        Some(_) => true,
        None => false,
    }
}

/// Transient wizard position. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WizardPosition {
    pub visible: bool,
    pub step_index: i64,
}

impl WizardPosition {
    /// The screen to render. A hidden wizard always shows the landing
    /// screen, whatever index a late auto-advance or jump left behind.
    pub fn screen(&self) -> Screen {
        if !self.visible {
            return Screen::Landing;
        }
        match self.step_index {
            LANDING => Screen::Landing,
            COMPLETION => Screen::Completion,
            index => match StepId::from_index(index) {
                Some(step) => Screen::Step(step),
                None => Screen::OutOfRange(index),
            },
        }
    }

    /// "Get Started": show the wizard at the first step.
    pub fn start(&mut self) {
        self.visible = true;
        self.step_index = FIRST_STEP;
    }

    /// Move forward one step if the current step allows it.
    pub fn next(&mut self, answers: &OnboardingAnswers) -> bool {
        if !(FIRST_STEP..=LAST_STEP).contains(&self.step_index) {
            return false;
        }
        if !can_proceed(self.step_index, answers) {
            return false;
        }
        self.step_index += 1;
        true
    }

    /// Move back one step; from the first step, return to the landing screen.
    pub fn back(&mut self) -> bool {
        match self.step_index {
            FIRST_STEP => {
                *self = Self::default();
                true
            }
            index if (FIRST_STEP + 1..=LAST_STEP).contains(&index) => {
                self.step_index -= 1;
                true
            }
            _ => false,
        }
    }

    /// Unconditional jump, used by the progress badges.
    pub fn jump_to(&mut self, step_index: i64) {
        self.step_index = step_index;
    }

    /// The deferred advance after a step completion, evaluated at fire time.
    ///
    /// Ungated. Moves forward from anything below the last step, and from the
    /// last step onto the completion screen.
    pub fn auto_advance(&mut self) -> bool {
        match self.step_index {
            index if index < LAST_STEP => {
                self.step_index += 1;
                true
            }
            LAST_STEP => {
                self.step_index = COMPLETION;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One entry in the progress indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepBadge {
    pub index: i64,
    pub step: StepId,
    pub label: &'static str,
    pub completed: bool,
    pub current: bool,
}

/// Badges for all six steps, in wizard order.
pub fn step_badges(position: &WizardPosition, completed: &CompletedSteps) -> Vec<StepBadge> {
    StepId::ALL
        .into_iter()
        .map(|step| StepBadge {
            index: step.index(),
            step,
            label: step.label(),
            completed: completed.contains(step),
            current: position.visible && position.step_index == step.index(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(step_index: i64) -> WizardPosition {
        WizardPosition {
            visible: true,
            step_index,
        }
    }

    fn filled() -> OnboardingAnswers {
        OnboardingAnswers {
            practice_site_handle: "coder".to_string(),
            network_handle: "alice".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn default_is_landing() {
        let pos = WizardPosition::default();
        assert!(!pos.visible);
        assert_eq!(pos.step_index, LANDING);
        assert_eq!(pos.screen(), Screen::Landing);
    }

    #[test]
    fn start_shows_first_step() {
        let mut pos = WizardPosition::default();
        pos.start();
        assert_eq!(pos, at(1));
        assert_eq!(pos.screen(), Screen::Step(StepId::Identity));
    }

    #[test]
    fn advisory_steps_always_proceed() {
        let empty = OnboardingAnswers::default();
        for index in 1..=4 {
            assert!(can_proceed(index, &empty), "step {index} should be advisory");
        }
        assert!(!can_proceed(5, &empty));
        assert!(!can_proceed(6, &empty));
        assert!(!can_proceed(0, &empty));
        assert!(!can_proceed(7, &empty));
    }

    #[test]
    fn handles_gate_last_two_steps() {
        let mut answers = OnboardingAnswers {
            practice_site_handle: "  ".to_string(),
            ..Default::default()
        };
        assert!(!can_proceed(5, &answers));
        answers.practice_site_handle = "x".to_string();
        assert!(can_proceed(5, &answers));
        assert!(!can_proceed(6, &answers));
        answers.network_handle = "alice".to_string();
        assert!(can_proceed(6, &answers));
    }

    #[test]
    fn next_walks_to_completion() {
        let answers = filled();
        let mut pos = WizardPosition::default();
        pos.start();
        for expected in 2..=7 {
            assert!(pos.next(&answers));
            assert_eq!(pos.step_index, expected);
        }
        assert_eq!(pos.screen(), Screen::Completion);
        assert!(!pos.next(&answers), "next is inert on the completion screen");
        assert_eq!(pos.step_index, 7);
    }

    #[test]
    fn next_blocked_by_empty_handle() {
        let mut pos = at(6);
        assert!(!pos.next(&OnboardingAnswers::default()));
        assert_eq!(pos.step_index, 6);
    }

    #[test]
    fn next_inert_outside_steps() {
        let answers = filled();
        for index in [-1, 0, 7, 8, 100] {
            let mut pos = at(index);
            assert!(!pos.next(&answers));
            assert_eq!(pos.step_index, index);
        }
    }

    #[test]
    fn back_then_next_returns_to_origin() {
        let answers = filled();
        for index in 2..=6 {
            let mut pos = at(index);
            assert!(pos.back());
            assert!(pos.next(&answers));
            assert_eq!(pos, at(index));
        }
    }

    #[test]
    fn back_from_first_step_exits_to_landing() {
        let mut pos = at(1);
        assert!(pos.back());
        assert_eq!(pos, WizardPosition::default());
    }

    #[test]
    fn back_inert_outside_steps() {
        for index in [0, 7, 9, -2] {
            let mut pos = at(index);
            assert!(!pos.back());
            assert_eq!(pos.step_index, index);
        }
    }

    #[test]
    fn jump_is_unbounded_and_idempotent() {
        for n in [-5, 0, 3, 7, 8, 1_000] {
            let mut once = at(2);
            once.jump_to(n);
            let mut twice = at(2);
            twice.jump_to(n);
            twice.jump_to(n);
            assert_eq!(once, twice);
            assert_eq!(once.step_index, n);
        }
        let mut pos = at(1);
        pos.jump_to(42);
        assert_eq!(pos.screen(), Screen::OutOfRange(42));
    }

    #[test]
    fn auto_advance_reads_position_at_fire_time() {
        let mut pos = at(3);
        assert!(pos.auto_advance());
        assert_eq!(pos.step_index, 4);

        let mut pos = at(6);
        assert!(pos.auto_advance());
        assert_eq!(pos.step_index, 7);

        let mut pos = at(7);
        assert!(!pos.auto_advance());
        assert_eq!(pos.step_index, 7);

        // Ungated: an empty handle does not stop it.
        let mut pos = at(5);
        assert!(pos.auto_advance());
        assert_eq!(pos.step_index, 6);
    }

    #[test]
    fn badges_follow_step_order() {
        let mut completed = CompletedSteps::default();
        completed.insert(StepId::Chat);
        completed.insert(StepId::Identity);

        let badges = step_badges(&at(4), &completed);
        assert_eq!(badges.len(), 6);
        assert_eq!(badges[0].step, StepId::Identity);
        assert!(badges[0].completed);
        assert!(!badges[1].completed);
        assert!(badges[3].completed);
        assert!(badges[3].current);
        assert_eq!(badges.iter().filter(|b| b.current).count(), 1);

        let hidden = step_badges(&WizardPosition::default(), &completed);
        assert!(hidden.iter().all(|b| !b.current));
    }

    #[test]
    fn hidden_wizard_shows_landing() {
        for index in [1, 4, 7, 12] {
            let pos = WizardPosition {
                visible: false,
                step_index: index,
            };
            assert_eq!(pos.screen(), Screen::Landing, "{index}");
        }
    }

    #[test]
    fn screen_display() {
        assert_eq!(at(0).screen().to_string(), "landing");
        assert_eq!(at(5).screen().to_string(), "step:practiceSite");
        assert_eq!(at(7).screen().to_string(), "completion");
        assert_eq!(at(9).screen().to_string(), "out_of_range:9");
    }
}

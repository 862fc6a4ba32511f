//! OnboardingController — owns the wizard state machine, writes the answers
//! and completed-steps records through to the store, and runs the deferred
//! auto-advance timer.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::OnboardingConfig;
use crate::error::{FlowError, StoreError};
use crate::store::ProgressStore;

use super::deep_link::EntryLink;
use super::model::{CompletedSteps, OnboardingAnswers, StepId, TriState};
use super::state::{COMPLETION, Screen, StepBadge, WizardPosition, can_proceed, step_badges};

/// Everything the controller tracks for one flow instance.
#[derive(Debug, Clone, Default)]
struct FlowState {
    position: WizardPosition,
    answers: OnboardingAnswers,
    completed: CompletedSteps,
}

/// Result of (re-)entering the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    pub position: WizardPosition,
    /// Rewritten entry location with the step parameter removed. `Some` only
    /// when a deep link was consumed; the caller should replace the address.
    pub location: Option<String>,
}

/// Where to go after leaving the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitHandoff {
    pub destination: String,
    /// Whether both persisted records were removed.
    pub cleared: bool,
}

/// Read-only view for renderers.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingSnapshot {
    pub visible: bool,
    pub step_index: i64,
    pub screen: Screen,
    pub can_proceed: bool,
    pub answers: OnboardingAnswers,
    pub completed_steps: CompletedSteps,
    pub badges: Vec<StepBadge>,
}

/// Coordinates the onboarding flow: position, gating, persistence and
/// deep-link resumption.
pub struct OnboardingController {
    store: Arc<dyn ProgressStore>,
    config: OnboardingConfig,
    state: Arc<RwLock<FlowState>>,
    /// The single outstanding auto-advance, if any.
    pending_advance: Mutex<Option<JoinHandle<()>>>,
}

impl OnboardingController {
    /// A controller with default state. Nothing is read from the store
    /// until [`enter`](Self::enter).
    pub fn new(store: Arc<dyn ProgressStore>, config: OnboardingConfig) -> Self {
        Self {
            store,
            config,
            state: Arc::new(RwLock::new(FlowState::default())),
            pending_advance: Mutex::new(None),
        }
    }

    /// Create a controller and enter the flow as a fresh page load would.
    pub async fn mount(
        store: Arc<dyn ProgressStore>,
        config: OnboardingConfig,
        entry: Option<&str>,
    ) -> (Self, EntryOutcome) {
        let controller = Self::new(store, config);
        let outcome = controller.enter(entry).await;
        (controller, outcome)
    }

    pub fn config(&self) -> &OnboardingConfig {
        &self.config
    }

    /// Page-load semantics: drop any pending auto-advance, re-hydrate both
    /// records, reset the position, then honour a deep-link step parameter.
    pub async fn enter(&self, entry: Option<&str>) -> EntryOutcome {
        let mut state = self.state.write().await;
        self.cancel_pending_advance().await;

        let answers =
            OnboardingAnswers::from_raw(self.store.read(&self.config.answers_key).await.as_deref());
        let completed = CompletedSteps::from_raw(
            self.store.read(&self.config.completed_key).await.as_deref(),
        );

        state.answers = answers;
        state.completed = completed;
        state.position = WizardPosition::default();
        self.persist(&state).await;

        let link = entry.map(|location| EntryLink::parse(location, &self.config.step_param));
        let location = match link {
            Some(EntryLink {
                step: Some(step),
                stripped,
            }) => {
                state.position.start();
                state.position.jump_to(step.index());
                info!(step = %step, "Resuming onboarding from deep link");
                stripped
            }
            Some(_) => {
                debug!(entry = ?entry, "No usable step parameter on entry location");
                None
            }
            None => None,
        };

        debug!(
            completed = state.completed.len(),
            step_index = state.position.step_index,
            "Onboarding entered"
        );

        EntryOutcome {
            position: state.position,
            location,
        }
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub async fn position(&self) -> WizardPosition {
        self.state.read().await.position
    }

    pub async fn answers(&self) -> OnboardingAnswers {
        self.state.read().await.answers.clone()
    }

    pub async fn completed_steps(&self) -> CompletedSteps {
        self.state.read().await.completed.clone()
    }

    /// Whether Next is enabled at the current position.
    pub async fn can_proceed(&self) -> bool {
        let state = self.state.read().await;
        can_proceed(state.position.step_index, &state.answers)
    }

    pub async fn snapshot(&self) -> OnboardingSnapshot {
        let state = self.state.read().await;
        OnboardingSnapshot {
            visible: state.position.visible,
            step_index: state.position.step_index,
            screen: state.position.screen(),
            can_proceed: can_proceed(state.position.step_index, &state.answers),
            answers: state.answers.clone(),
            completed_steps: state.completed.clone(),
            badges: step_badges(&state.position, &state.completed),
        }
    }

    /// Whether an auto-advance is scheduled and has not fired yet.
    pub async fn has_pending_advance(&self) -> bool {
        self.pending_advance
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// "Get Started".
    pub async fn start(&self) -> WizardPosition {
        let mut state = self.state.write().await;
        self.before_manual_navigation().await;
        state.position.start();
        debug!("Onboarding started");
        state.position
    }

    /// Directional Next, subject to gating.
    pub async fn next(&self) -> WizardPosition {
        let mut guard = self.state.write().await;
        self.before_manual_navigation().await;
        let state = &mut *guard;
        let from = state.position.step_index;
        if state.position.next(&state.answers) {
            debug!(from, to = state.position.step_index, "Advanced");
        } else {
            debug!(step_index = from, "Next blocked");
        }
        state.position
    }

    /// Directional Back; leaves the wizard from the first step.
    pub async fn back(&self) -> WizardPosition {
        let mut state = self.state.write().await;
        self.before_manual_navigation().await;
        let from = state.position.step_index;
        if state.position.back() {
            debug!(from, to = state.position.step_index, visible = state.position.visible, "Went back");
        }
        state.position
    }

    /// Progress-badge jump. Ungated and unbounded.
    pub async fn jump_to(&self, step_index: i64) -> WizardPosition {
        let mut state = self.state.write().await;
        self.before_manual_navigation().await;
        state.position.jump_to(step_index);
        debug!(step_index, "Jumped");
        state.position
    }

    /// Mark a step complete and schedule the deferred auto-advance.
    ///
    /// Returns false when the step was already complete; the advance is
    /// rescheduled either way. The timer is armed before the state lock is
    /// released.
    pub async fn complete_step(&self, step: StepId) -> bool {
        let mut state = self.state.write().await;
        let added = state.completed.insert(step);
        if added {
            self.persist(&state).await;
            info!(step = %step, completed = state.completed.len(), "Step completed");
        } else {
            debug!(step = %step, "Step already complete");
        }
        self.schedule_advance().await;
        drop(state);
        added
    }

    // ── Answer setters ──────────────────────────────────────────────

    pub async fn set_git_configured(&self, value: TriState) {
        self.update_answers(|a| a.git_configured = value).await;
    }

    pub async fn set_cli_familiar(&self, value: TriState) {
        self.update_answers(|a| a.cli_familiar = value).await;
    }

    pub async fn set_community_joined(&self, value: TriState) {
        self.update_answers(|a| a.community_joined = value).await;
    }

    pub async fn set_practice_site_handle(&self, handle: impl Into<String>) {
        let handle = handle.into();
        self.update_answers(|a| a.practice_site_handle = handle).await;
    }

    pub async fn set_network_handle(&self, handle: impl Into<String>) {
        let handle = handle.into();
        self.update_answers(|a| a.network_handle = handle).await;
    }

    /// Flip a help panel and return whether it is now expanded.
    pub async fn toggle_help_section(&self, section: &str) -> bool {
        self.update_answers(|a| a.toggle_help_section(section)).await
    }

    // ── Exits ───────────────────────────────────────────────────────

    /// Primary action on the completion screen: wipe both records and hand
    /// off to the exit destination.
    pub async fn reset_and_exit(&self) -> Result<ExitHandoff, FlowError> {
        let mut state = self.state.write().await;
        if state.position.step_index != COMPLETION {
            return Err(FlowError::NotAtCompletion {
                step: state.position.step_index,
            });
        }

        if self.cancel_pending_advance().await {
            debug!("Cancelled pending auto-advance on reset");
        }

        let mut cleared = true;
        for key in [&self.config.answers_key, &self.config.completed_key] {
            if let Err(e) = self.store.remove(key).await {
                warn!(key = %key, error = %e, "Failed to clear onboarding record");
                cleared = false;
            }
        }

        *state = FlowState::default();
        info!(destination = %self.config.exit_destination, cleared, "Onboarding finished");

        Ok(ExitHandoff {
            destination: self.config.exit_destination.clone(),
            cleared,
        })
    }

    /// "Back to Home": leave the wizard, keeping both records.
    pub async fn back_to_home(&self) -> ExitHandoff {
        let mut state = self.state.write().await;
        self.cancel_pending_advance().await;
        state.position.reset();
        debug!(destination = %self.config.home_destination, "Left onboarding");
        ExitHandoff {
            destination: self.config.home_destination.clone(),
            cleared: false,
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Mutate the answers and write both records through.
    async fn update_answers<R>(&self, f: impl FnOnce(&mut OnboardingAnswers) -> R) -> R {
        let mut state = self.state.write().await;
        let out = f(&mut state.answers);
        self.persist(&state).await;
        out
    }

    /// Write both records. Failures are logged and otherwise ignored; the
    /// in-memory state stays authoritative.
    async fn persist(&self, state: &FlowState) {
        let answers_key = &self.config.answers_key;
        if let Err(e) = self.write_record(answers_key, &state.answers).await {
            warn!(key = %answers_key, error = %e, "Failed to persist onboarding record");
        }
        let completed_key = &self.config.completed_key;
        if let Err(e) = self.write_record(completed_key, &state.completed).await {
            warn!(key = %completed_key, error = %e, "Failed to persist onboarding record");
        }
    }

    async fn write_record<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StoreError::Serialization(format!("{key}: {e}")))?;
        self.store.write(key, &raw).await
    }

    /// Arm the deferred advance, replacing any earlier one. Callers hold the
    /// state write guard; lock order is state, then pending.
    async fn schedule_advance(&self) {
        let state = Arc::clone(&self.state);
        let delay = self.config.advance_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = state.write().await;
            let from = state.position.step_index;
            if state.position.auto_advance() {
                debug!(from, to = state.position.step_index, "Auto-advanced");
            }
        });

        if let Some(previous) = self.pending_advance.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Abort the outstanding auto-advance. Returns true if one was still waiting.
    /// Callers hold the state write guard.
    async fn cancel_pending_advance(&self) -> bool {
        match self.pending_advance.lock().await.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    async fn before_manual_navigation(&self) {
        if self.config.cancel_advance_on_navigation && self.cancel_pending_advance().await {
            debug!("Cancelled pending auto-advance on manual navigation");
        }
    }
}

impl Drop for OnboardingController {
    fn drop(&mut self) {
        if let Some(handle) = self.pending_advance.get_mut().take() {
            handle.abort();
        }
    }
}

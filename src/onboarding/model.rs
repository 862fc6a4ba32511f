//! Onboarding data models: answers, step ids and the completed-steps record.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::FlowError;

/// A yes/no answer that may not have been given yet.
///
/// Persisted as a nullable boolean so records written by older clients
/// (`null` / `true` / `false`) load unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum TriState {
    #[default]
    Unset,
    Yes,
    No,
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Self::Unset,
            Some(true) => Self::Yes,
            Some(false) => Self::No,
        }
    }
}

impl From<TriState> for Option<bool> {
    fn from(value: TriState) -> Self {
        match value {
            TriState::Unset => None,
            TriState::Yes => Some(true),
            TriState::No => Some(false),
        }
    }
}

impl std::fmt::Display for TriState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
        }
    }
}

/// The six setup steps, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepId {
    Identity,
    Vcs,
    Editor,
    Chat,
    PracticeSite,
    Network,
}

impl StepId {
    /// All steps in wizard order.
    pub const ALL: [StepId; 6] = [
        StepId::Identity,
        StepId::Vcs,
        StepId::Editor,
        StepId::Chat,
        StepId::PracticeSite,
        StepId::Network,
    ];

    /// Wizard step index (1..=6).
    pub fn index(&self) -> i64 {
        match self {
            Self::Identity => 1,
            Self::Vcs => 2,
            Self::Editor => 3,
            Self::Chat => 4,
            Self::PracticeSite => 5,
            Self::Network => 6,
        }
    }

    /// Step at a wizard index, if the index is one of the six setup steps.
    pub fn from_index(index: i64) -> Option<StepId> {
        index
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Vcs => "vcs",
            Self::Editor => "editor",
            Self::Chat => "chat",
            Self::PracticeSite => "practiceSite",
            Self::Network => "network",
        }
    }

    /// Short label for the progress indicator.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Identity => "Sign in",
            Self::Vcs => "Git",
            Self::Editor => "Editor",
            Self::Chat => "Community",
            Self::PracticeSite => "Practice",
            Self::Network => "Network",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| FlowError::UnknownStep(s.to_string()))
    }
}

/// Free-form answers collected across the setup steps.
///
/// Every field has a default, so a stored record missing keys still loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OnboardingAnswers {
    pub git_configured: TriState,
    pub cli_familiar: TriState,
    pub community_joined: TriState,
    pub practice_site_handle: String,
    pub network_handle: String,
    /// Which help panels are expanded. Display only.
    pub expanded_help_sections: BTreeMap<String, bool>,
}

impl OnboardingAnswers {
    /// Decode a stored record, falling back to defaults on absence or corruption.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        match serde_json::from_str(raw) {
            Ok(answers) => answers,
            Err(e) => {
                warn!(error = %e, "Stored onboarding answers unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn practice_site_handle_set(&self) -> bool {
        !self.practice_site_handle.trim().is_empty()
    }

    pub fn network_handle_set(&self) -> bool {
        !self.network_handle.trim().is_empty()
    }

    pub fn help_section_expanded(&self, section: &str) -> bool {
        self.expanded_help_sections
            .get(section)
            .copied()
            .unwrap_or(false)
    }

    /// Flip a help panel and return its new state.
    pub fn toggle_help_section(&mut self, section: &str) -> bool {
        let expanded = !self.help_section_expanded(section);
        self.expanded_help_sections
            .insert(section.to_string(), expanded);
        expanded
    }
}

/// Steps the user has marked complete, in the order they were completed.
///
/// Never contains duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompletedSteps(Vec<StepId>);

impl CompletedSteps {
    /// Decode a stored record.
    ///
    /// Unknown ids and duplicates are dropped; anything that is not an array
    /// yields an empty record.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        let items: Vec<serde_json::Value> = match serde_json::from_str(raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Stored completed steps unreadable, using defaults");
                return Self::default();
            }
        };

        let mut steps = Self::default();
        for item in items {
            match item.as_str().map(StepId::from_str) {
                Some(Ok(step)) => {
                    steps.insert(step);
                }
                _ => warn!(value = %item, "Dropping unrecognised completed step"),
            }
        }
        steps
    }

    /// Append a step. Returns false if it was already present.
    pub fn insert(&mut self, step: StepId) -> bool {
        if self.contains(step) {
            return false;
        }
        self.0.push(step);
        true
    }

    pub fn contains(&self, step: StepId) -> bool {
        self.0.contains(&step)
    }

    pub fn iter(&self) -> impl Iterator<Item = StepId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Settings keys used for onboarding persistence.
pub mod settings_keys {
    /// Key for the OnboardingAnswers JSON object.
    pub const ANSWERS: &str = "onboarding_answers";
    /// Key for the CompletedSteps JSON array.
    pub const COMPLETED_STEPS: &str = "onboarding_completed_steps";
    /// Default user ID (single-user deployment).
    pub const DEFAULT_USER: &str = "default";
}

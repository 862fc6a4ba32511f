//! Onboarding system — the account-setup wizard.
//!
//! A user moves through six setup steps (identity provider, git, editor,
//! community chat, practice-site handle, professional-network handle). The
//! controller decides which screen is showing, when Next is allowed, what is
//! remembered across reloads, and how a deep link re-enters mid-flow.

pub mod controller;
pub mod deep_link;
pub mod model;
pub mod routes;
pub mod state;

pub use controller::{EntryOutcome, ExitHandoff, OnboardingController, OnboardingSnapshot};
pub use deep_link::EntryLink;
pub use model::{CompletedSteps, OnboardingAnswers, StepId, TriState};
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use state::{Screen, StepBadge, WizardPosition};

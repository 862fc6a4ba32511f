//! Developer-setup onboarding: wizard state machine and persistence.

pub mod config;
pub mod error;
pub mod onboarding;
pub mod store;

//! GUI panels and application state.

pub mod app;
pub mod components;
pub mod dashboard;
pub mod editor_panel;
pub mod login_panel;
pub mod products_panel;
pub mod profile_panel;
pub mod register_panel;
pub mod reports_panel;
pub mod setup_wizard;

pub use app::{App, apply_theme};
pub use setup_wizard::{SetupApp, SetupWizard};

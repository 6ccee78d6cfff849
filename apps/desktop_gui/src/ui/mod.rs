//! UI layer: app shell, static screens and result layouts.

pub mod app;
pub mod results;
pub mod screens;

pub use app::ClassifierApp;

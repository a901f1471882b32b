//! iris-tui: terminal widgets for the iris assistant
//!
//! Rendering pieces built on ratatui and crossterm. The host owns the event
//! loop; this crate only maps keys to actions and draws state.

pub mod input;
pub mod theme;
pub mod widgets;

pub use input::Action;
pub use theme::Theme;

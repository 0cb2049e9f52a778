//! Terminal dashboard
//!
//! A login screen guards the dashboard. After login a [`DashboardSession`]
//! subscribes every panel to the refresh coordinator; results come back to
//! the UI loop over a channel and are rendered by [`renderer::draw`].

pub mod app;
pub mod controller;
pub mod events;
pub mod renderer;
pub mod session;
pub mod theme;
pub mod widgets;

pub use app::{AppState, DashboardAction, Loadable, PanelUpdate, Screen};
pub use controller::DashboardController;
pub use session::{DashboardSession, PanelMessage, QueryGeneration, QueryState, SharedQuery};
pub use theme::Theme;

//! HTTP boundary of the twurl shortener.
//!
//! [`App::router`] wires the handlers to any [`Shortener`](twurl_core::Shortener)
//! implementation held in [`AppState`].

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use error::AppError;
pub use state::AppState;

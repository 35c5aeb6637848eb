//! Lunarium: planetary orbits and lunar phases in the terminal.
//!
//! The simulation half (`clock`, `controller`, `orbit`, `moon`) is pure and
//! driven by whatever feeds it wall time; `app` and `render` are the crossterm
//! shell around it.

pub mod app;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod input;
pub mod model;
pub mod moon;
pub mod orbit;
pub mod render;

pub use error::{Result, SimError};

// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod end_condition;
pub mod error;
pub mod feed;
pub mod game;
pub mod geometry;
pub mod history;
pub mod hit;
pub mod input;
pub mod layout;
pub mod levels;
pub mod notify;
pub mod runtime;
pub mod session;
pub mod summary;
pub mod trajectory;
pub mod visit_order;

pub use error::{DotboardError, Result};

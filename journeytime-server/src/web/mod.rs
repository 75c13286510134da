//! Web layer for the journey time predictor.
//!
//! Provides HTTP endpoints for annotating routing suggestions with predicted
//! journey times, inspecting resolved stop sequences and refreshing the line
//! catalog.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;

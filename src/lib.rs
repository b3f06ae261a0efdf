//! Filtering and aggregation core of the BRFSS healthy-aging dashboard.
//!
//! The GUI binary only renders what [`state::AppState`] computes; everything
//! here is usable without a display.

pub mod config;
pub mod data;
pub mod state;

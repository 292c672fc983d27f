//! Service Module
//!
//! Background processing logic behind the API handlers.

pub mod processing;

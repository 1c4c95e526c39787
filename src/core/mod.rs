//! Core infrastructure shared by all components

pub mod error_handling;
pub mod sync;

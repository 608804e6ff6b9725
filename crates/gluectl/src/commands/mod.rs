//! Command implementations for gluectl

pub mod invoke;
pub mod operations;
pub mod profile;

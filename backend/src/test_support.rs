//! Test utilities shared by unit tests across the crate.

pub mod clock;

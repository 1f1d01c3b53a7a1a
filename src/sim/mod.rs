//! Random playouts.
//!
//! Plays uniformly random legal moves with a seeded [`GameRng`](crate::core::GameRng),
//! so a given seed always yields the same game. Tests use these to build
//! realistic move logs.

pub mod playout;

pub use playout::{random_playout, Playout};

/// Cavern: a falling-boulder cave simulation.
///
/// `domain` holds the grid, actors and pure rules; `sim` runs levels tick
/// by tick and reads/writes level text. The terminal host lives in the
/// binary.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;

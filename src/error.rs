/// Error types.
///
/// Two families:
///   - `GridError`: a caller broke a grid contract (bad coordinate, double
///     occupancy, unsupported tile change). These abort the operation.
///   - `ParseError` / `SaveError`: content problems in level text or save
///     files, reported with the offending line.

use std::io;

use thiserror::Error;

use crate::domain::entity::ActorId;
use crate::domain::tile::TileKind;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("coordinate ({x}, {y}) lies outside the {width}x{height} grid")]
    OutOfBounds { x: usize, y: usize, width: usize, height: usize },

    #[error("tile ({x}, {y}) is already occupied")]
    Occupied { x: usize, y: usize },

    #[error("tile ({x}, {y}) cannot hold a {actor}")]
    NotWalkable { x: usize, y: usize, actor: &'static str },

    #[error("tile ({x}, {y}) cannot be changed into {target:?}")]
    InvalidTileChange { x: usize, y: usize, target: TileKind },

    #[error("no actor with id {0:?}")]
    UnknownActor(ActorId),
}

/// A level text that could not be understood.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        ParseError { line, message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("save file is malformed: {0}")]
    Parse(#[from] ParseError),

    #[error("save file has no level index header")]
    MissingHeader,

    #[error("the player is dead; there is nothing to resume")]
    PlayerDead,
}

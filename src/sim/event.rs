/// Events emitted during a simulation tick.
/// The presentation layer consumes these for messages and effects.

use crate::domain::entity::ActorTag;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    DiamondCollected { x: usize, y: usize },
    KeyCollected { id: u32, x: usize, y: usize },
    DoorOpened { id: u32, x: usize, y: usize },
    Explosion { x: usize, y: usize },
    Transmuted { x: usize, y: usize, into: ActorTag },
    AmoebaHardened { size: usize },
    AmoebaCrystallised { size: usize },
    ActorKilled { kind: ActorTag, x: usize, y: usize },
    PlayerKilled,
    ExitReached,
}

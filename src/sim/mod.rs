pub mod cave;
pub mod event;
pub mod input;
pub mod level;
pub mod runtime;
pub mod save;
pub mod step;
pub mod world;

#[cfg(test)]
pub(crate) mod testkit;

pub mod ai;
pub mod entity;
pub mod flyer;
pub mod grid;
pub mod rules;
pub mod tile;

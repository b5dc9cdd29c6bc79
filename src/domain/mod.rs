pub mod ai;
pub mod body;
pub mod combat;
pub mod entity;
pub mod geom;
pub mod hazard;
pub mod tile;

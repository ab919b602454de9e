//! Pigeon Forage - alert-driven foraging flocks competing over depletable traps

pub mod core;
pub mod data;
pub mod ecs;
pub mod entity;
pub mod simulation;
pub mod spatial;

//! Strider Physics
//!
//! The boundary between simulation logic and a rigid-body solver.
//!
//! # Architecture
//!
//! - **Body**: plain descriptions of bodies, shapes and transforms
//! - **World**: the [`PhysicsWorld`] trait every solver backend implements
//! - **Rapier**: [`RapierWorld`], the shipped backend
//!
//! Callers never see solver types. Terrain and controller code only hold
//! [`BodyHandle`]s and go through the trait, so a test double can stand in
//! for the solver wherever exact impulse bookkeeping matters.

pub mod body;
pub mod rapier_world;
pub mod world;

// Re-export commonly used types
pub use body::{
    BodyDesc, BodyHandle, BodyKind, BodyState, HeightFieldDesc, Material, RayHit, ShapeDesc,
    ShapeError, SleepConfig, Transform,
};
pub use rapier_world::{RapierWorld, DEFAULT_GRAVITY};
pub use world::PhysicsWorld;

//! Physics module
//!
//! Rigid-body simulation backed by rapier. The [`PhysicsController`] owns the
//! world for one scene; [`RigidActor`] guards tie individual bodies to their
//! GameObjects and remove them from the world when dropped.

pub mod actor;
pub mod character;
pub mod controller;
pub mod debug_render;
pub mod layers;
pub mod material;
pub mod world;

pub use actor::{owner_from_user_data, ActorKind, RigidActor, ShapeInfo};
pub use character::{CharacterControllerManager, CharacterKey, CharacterMovement};
pub use controller::{PhysicsController, PhysicsError, PhysicsState, RaycastHit};
pub use debug_render::{DebugLine, DebugVisualizer};
pub use layers::{FilterData, LayerMask};
pub use material::PhysicsMaterial;
pub use world::{PhysicsWorld, WorldHandle};

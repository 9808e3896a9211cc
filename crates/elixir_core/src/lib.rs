//! # Elixir Core
//!
//! Runtime core of a real-time 3D game engine: a component-based GameObject
//! model paired with a physics synchronization layer.
//!
//! ## Features
//!
//! - **GameObjects and components**: one component per type, explicit
//!   `Attached -> Active -> Destroyed` lifecycle, transform change notifications
//! - **Physics**: rapier-backed rigid actors kept in step with their GameObjects
//! - **Logging**: leveled, timestamped, bounded history, `log` facade bridge
//! - **Crash handling**: orderly shutdown on panics and termination signals
//! - **Script libraries**: dynamic loading of game-script shared libraries
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use elixir_core::prelude::*;
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let floor = engine.scene_mut().create_object("floor");
//!         engine.add_rigidbody(floor, ActorKind::Static);
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
//!         engine.quit();
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let mut app = MyApp;
//!     Engine::run(config, &mut app)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod components;
pub mod config;
pub mod crash;
pub mod foundation;
pub mod physics;
pub mod scene;
pub mod scripting;

mod application;
mod engine;

#[cfg(test)]
mod tests;

pub use application::{AppError, Application};
pub use config::EngineConfig;
pub use engine::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        components::{Component, ComponentContext, Light, LightComponent, RigidbodyComponent},
        config::{Config, EngineConfig},
        crash::ShutdownHandles,
        foundation::{
            logging::{LogLevel, Logger},
            math::{Mat4, Quat, Transform, Vec3},
            time::Timer,
        },
        physics::{ActorKind, LayerMask, PhysicsController, RigidActor},
        scene::{GameObject, GameObjectId, Scene},
        AppError, Application, Engine, EngineError,
    };
}

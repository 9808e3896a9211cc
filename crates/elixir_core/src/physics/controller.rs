//! Physics controller
//!
//! Owns the simulation world for one scene and turns GameObjects into
//! simulated actors. The controller is constructed explicitly and moves
//! through `Uninitialized -> Running -> Released`; release is terminal.
//!
//! Lookup failures while creating actors are reported through the engine
//! logger and surface as `None`. Stepping or resizing without a world is a
//! silent no-op so callers can run unconditionally.

use std::sync::Arc;

use rapier3d::prelude::*;

use super::actor::{owner_from_user_data, owner_to_user_data, ActorKind, RigidActor};
use super::character::{CharacterControllerManager, CharacterKey, CharacterMovement};
use super::debug_render::{DebugLine, DebugVisualizer};
use super::layers::{FilterData, LayerMask};
use super::material::PhysicsMaterial;
use super::world::{from_point, to_point, to_vector, PhysicsWorld, WorldHandle};
use crate::components::RigidbodyComponent;
use crate::config::{ConfigError, PhysicsConfig};
use crate::foundation::logging::Logger;
use crate::foundation::math::Vec3;
use crate::scene::{GameObject, GameObjectId};
use crate::{log_error, log_info};

/// Lifecycle of a [`PhysicsController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsState {
    /// Constructed, no world yet
    Uninitialized,
    /// World built and steppable
    Running,
    /// World dropped; the controller cannot be restarted
    Released,
}

/// Physics controller errors
#[derive(thiserror::Error, Debug)]
pub enum PhysicsError {
    /// `init` called on a running controller
    #[error("Physics is already initialized")]
    AlreadyInitialized,

    /// `init` called after `release`
    #[error("Physics has been released")]
    Released,

    /// Configuration rejected before anything was built
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Closest actor hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// GameObject owning the hit actor
    pub object: GameObjectId,
    /// Distance from the ray origin
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
}

/// Owner of the simulation world for one scene
pub struct PhysicsController {
    config: PhysicsConfig,
    logger: Arc<Logger>,
    state: PhysicsState,
    world: WorldHandle,
    material: Option<PhysicsMaterial>,
    debug: Option<DebugVisualizer>,
    characters: Option<CharacterControllerManager>,
}

impl PhysicsController {
    /// Create an uninitialized controller
    pub fn new(config: PhysicsConfig, logger: Arc<Logger>) -> Self {
        Self {
            config,
            logger,
            state: PhysicsState::Uninitialized,
            world: WorldHandle::empty(),
            material: None,
            debug: None,
            characters: None,
        }
    }

    /// Build the simulation world
    ///
    /// Everything is built before anything is committed, so a failure leaves
    /// the controller untouched.
    pub fn init(&mut self) -> Result<(), PhysicsError> {
        match self.state {
            PhysicsState::Running => return Err(PhysicsError::AlreadyInitialized),
            PhysicsState::Released => return Err(PhysicsError::Released),
            PhysicsState::Uninitialized => {}
        }

        self.config.validate()?;

        let world = PhysicsWorld::new(self.config.gravity);
        let debug = self.config.debug_visualization.then(DebugVisualizer::new);
        let material = PhysicsMaterial::from(self.config.material);
        let characters = CharacterControllerManager::new();

        self.world.install(world);
        self.debug = debug;
        self.material = Some(material);
        self.characters = Some(characters);
        self.state = PhysicsState::Running;

        log_info!(
            self.logger,
            "Physics initialized (gravity {:?}, debug visualization {})",
            self.config.gravity,
            if self.config.debug_visualization { "on" } else { "off" }
        );
        Ok(())
    }

    /// Advance the simulation by `delta_time` seconds
    ///
    /// Silently ignored without a world or for a non-positive or non-finite
    /// step.
    pub fn simulate(&mut self, delta_time: f32) {
        if !delta_time.is_finite() || delta_time <= 0.0 {
            return;
        }
        self.world.with(|world| world.step(delta_time));
    }

    /// Create a dynamic actor for `object`
    pub fn add_dynamic_actor(&mut self, object: &GameObject) -> Option<RigidActor> {
        self.add_actor(object, ActorKind::Dynamic)
    }

    /// Create a static actor for `object`
    pub fn add_static_actor(&mut self, object: &GameObject) -> Option<RigidActor> {
        self.add_actor(object, ActorKind::Static)
    }

    /// Create an actor of the given kind for `object`
    ///
    /// The actor sits at the object's position with no rotation and carries
    /// one box shape whose half-extents are half the object's scale.
    pub fn add_actor(&mut self, object: &GameObject, kind: ActorKind) -> Option<RigidActor> {
        if self.state != PhysicsState::Running {
            log_error!(self.logger, "Physics is not initialized");
            return None;
        }
        if !self.world.is_live() {
            log_error!(self.logger, "Scene is not initialized");
            return None;
        }
        let Some(material) = self.material else {
            log_error!(self.logger, "Default material missing");
            return None;
        };

        let transform = object.transform();
        let Some(collider) = self.build_shape(transform.scale / 2.0, object.layer_mask(), material)
        else {
            log_error!(self.logger, "Failed to create collision shape");
            return None;
        };

        let body = match kind {
            ActorKind::Dynamic => RigidBodyBuilder::dynamic(),
            ActorKind::Static => RigidBodyBuilder::fixed(),
        }
        .translation(to_vector(transform.position))
        .user_data(owner_to_user_data(object.id()))
        .build();

        let attached = self.world.with(|world| {
            let handle = world.insert_body(body);
            if world.attach_collider(collider, handle).is_some() {
                Some(handle)
            } else {
                world.remove_body(handle);
                None
            }
        });

        match attached {
            Some(Some(handle)) => Some(RigidActor::new(self.world.downgrade(), handle, kind)),
            Some(None) => {
                log_error!(self.logger, "Failed to attach shape");
                None
            }
            None => {
                log_error!(self.logger, "Scene is not initialized");
                None
            }
        }
    }

    /// Replace the shapes of `object`'s actor with one box of half-extents `new_size`
    ///
    /// `new_size` is used as-is, not halved. The actor pose is untouched and the
    /// new shape uses the object's current layer mask. Objects without a
    /// rigidbody or actor are ignored.
    pub fn resize_collider(&mut self, new_size: Vec3, object: &GameObject) {
        let Some(actor) = object
            .component::<RigidbodyComponent>()
            .and_then(RigidbodyComponent::rigid_actor)
        else {
            return;
        };
        if actor.is_released() || !self.world.is_live() {
            return;
        }
        let Some(material) = self.material else {
            return;
        };

        let Some(collider) = self.build_shape(new_size, object.layer_mask(), material) else {
            log_error!(self.logger, "Failed to create collision shape");
            return;
        };

        let body = actor.body_handle();
        let attached = self.world.with(|world| {
            world.detach_colliders(body);
            world.attach_collider(collider, body).is_some()
        });
        if attached == Some(false) {
            log_error!(self.logger, "Failed to attach shape");
        }
    }

    /// Closest actor hit by a ray, considering only shapes on `layers`
    ///
    /// Sees the scene as of the last completed step.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: LayerMask,
    ) -> Option<RaycastHit> {
        let direction = direction.try_normalize(f32::EPSILON)?;
        if !max_distance.is_finite() || max_distance <= 0.0 {
            return None;
        }

        self.world
            .with(|world| {
                let ray = Ray::new(to_point(origin), to_vector(direction));
                let on_layers = |_: ColliderHandle, collider: &Collider| {
                    FilterData::from_user_data(collider.user_data).matches(layers)
                };
                let filter = QueryFilter::new().predicate(&on_layers);

                let (collider, distance) = world.query_pipeline.cast_ray(
                    &world.bodies,
                    &world.colliders,
                    &ray,
                    max_distance,
                    true,
                    filter,
                )?;
                let parent = world.colliders.get(collider)?.parent()?;
                let object = owner_from_user_data(world.bodies.get(parent)?.user_data)?;

                Some(RaycastHit {
                    object,
                    distance,
                    point: from_point(&ray.point_at(distance)),
                })
            })
            .flatten()
    }

    /// Debug overlay lines; empty unless debug visualization is enabled
    pub fn debug_lines(&mut self) -> Vec<DebugLine> {
        let Some(visualizer) = self.debug.as_mut() else {
            return Vec::new();
        };
        self.world
            .with(|world| visualizer.collect(world))
            .unwrap_or_default()
    }

    /// Create a kinematic character controller
    pub fn create_character_controller(&mut self) -> Option<CharacterKey> {
        if let Some(characters) = self.characters.as_mut() {
            Some(characters.create())
        } else {
            log_error!(self.logger, "Physics is not initialized");
            None
        }
    }

    /// Remove a character controller
    pub fn remove_character_controller(&mut self, key: CharacterKey) -> bool {
        self.characters
            .as_mut()
            .is_some_and(|characters| characters.remove(key))
    }

    /// Collision-corrected translation for moving `actor` by `desired`
    pub fn move_character(
        &self,
        key: CharacterKey,
        actor: &RigidActor,
        desired: Vec3,
        delta_time: f32,
    ) -> Option<CharacterMovement> {
        if actor.is_released() {
            return None;
        }
        let characters = self.characters.as_ref()?;
        self.world
            .with(|world| characters.move_body(key, world, actor.body_handle(), desired, delta_time))
            .flatten()
    }

    /// Number of character controllers
    pub fn controller_count(&self) -> usize {
        self.characters
            .as_ref()
            .map_or(0, CharacterControllerManager::len)
    }

    /// Drop the world and everything created by `init`
    ///
    /// Outstanding actors become inert. Calling this again does nothing.
    pub fn release(&mut self) {
        if self.state == PhysicsState::Released {
            return;
        }
        let was_running = self.state == PhysicsState::Running;

        self.world.release();
        self.characters = None;
        self.debug = None;
        self.material = None;
        self.state = PhysicsState::Released;

        if was_running {
            log_info!(self.logger, "Physics released");
        }
    }

    /// Current lifecycle state
    pub const fn state(&self) -> PhysicsState {
        self.state
    }

    /// Whether the world is built and steppable
    pub fn is_running(&self) -> bool {
        self.state == PhysicsState::Running && self.world.is_live()
    }

    /// Configured gravity
    pub const fn gravity(&self) -> Vec3 {
        self.config.gravity
    }

    /// Material applied to new shapes, once initialized
    pub const fn default_material(&self) -> Option<PhysicsMaterial> {
        self.material
    }

    /// Number of actors in the world
    pub fn actor_count(&self) -> usize {
        self.world.with(|world| world.body_count()).unwrap_or(0)
    }

    /// Shared handle to the world, for the shutdown path
    pub fn world_handle(&self) -> WorldHandle {
        self.world.clone()
    }

    fn build_shape(
        &self,
        half_extents: Vec3,
        layers: LayerMask,
        material: PhysicsMaterial,
    ) -> Option<Collider> {
        if !half_extents.iter().all(|extent| extent.is_finite() && *extent > 0.0) {
            return None;
        }

        let filter = FilterData::from_layer(layers);
        let groups = filter.interaction_groups();
        let builder = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .density(self.config.reference_density)
            .collision_groups(groups)
            .solver_groups(groups)
            .user_data(filter.to_user_data());

        Some(material.apply(builder).build())
    }
}

impl Drop for PhysicsController {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for PhysicsController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsController")
            .field("state", &self.state)
            .field("world", &self.world)
            .field("material", &self.material)
            .finish_non_exhaustive()
    }
}

//! Kinematic character controllers
//!
//! Controllers sweep an actor's first shape through the world and return
//! the collision-corrected translation; moving the actor is up to the caller.

use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;
use slotmap::{new_key_type, SlotMap};

use super::world::{from_vector, to_vector, PhysicsWorld};
use crate::foundation::math::Vec3;

new_key_type! {
    /// Handle to a character controller
    pub struct CharacterKey;
}

/// Result of one character move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterMovement {
    /// Translation the character can actually perform
    pub translation: Vec3,
    /// Whether the character ended up touching the ground
    pub grounded: bool,
}

/// Owner of every character controller in a scene
#[derive(Default)]
pub struct CharacterControllerManager {
    controllers: SlotMap<CharacterKey, KinematicCharacterController>,
}

impl CharacterControllerManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller with walking defaults (small autostep, snap to ground)
    pub fn create(&mut self) -> CharacterKey {
        let controller = KinematicCharacterController {
            up: Vector::<Real>::y_axis(),
            offset: CharacterLength::Absolute(0.01),
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(0.3),
                min_width: CharacterLength::Absolute(0.2),
                include_dynamic_bodies: false,
            }),
            snap_to_ground: Some(CharacterLength::Absolute(0.2)),
            ..KinematicCharacterController::default()
        };
        self.controllers.insert(controller)
    }

    /// Remove a controller
    pub fn remove(&mut self, key: CharacterKey) -> bool {
        self.controllers.remove(key).is_some()
    }

    /// Number of live controllers
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether no controller exists
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Sweep `body`'s first shape along `desired` and return the corrected move
    ///
    /// The body itself is excluded from the sweep. Returns `None` for an
    /// unknown key or a body without shapes.
    pub(crate) fn move_body(
        &self,
        key: CharacterKey,
        world: &PhysicsWorld,
        body: RigidBodyHandle,
        desired: Vec3,
        delta_time: f32,
    ) -> Option<CharacterMovement> {
        let controller = self.controllers.get(key)?;
        let rigid_body = world.bodies.get(body)?;
        let collider = world.colliders.get(*rigid_body.colliders().first()?)?;

        let movement = controller.move_shape(
            delta_time,
            &world.bodies,
            &world.colliders,
            &world.query_pipeline,
            collider.shape(),
            collider.position(),
            to_vector(desired),
            QueryFilter::new().exclude_rigid_body(body),
            |_| {},
        );

        Some(CharacterMovement {
            translation: from_vector(&movement.translation),
            grounded: movement.grounded,
        })
    }
}

impl std::fmt::Debug for CharacterControllerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterControllerManager")
            .field("controllers", &self.controllers.len())
            .finish()
    }
}

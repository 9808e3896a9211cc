//! Owning guard for one simulated body

use rapier3d::prelude::*;
use slotmap::{Key, KeyData};

use super::layers::FilterData;
use super::world::{from_rotation, from_vector, to_rotation, to_vector, WeakWorld};
use crate::foundation::math::{Quat, Vec3};
use crate::scene::GameObjectId;

/// Tolerances below which a pose counts as unchanged
const POSITION_EPSILON: f32 = 1.0e-5;
const ROTATION_EPSILON: f32 = 1.0e-6;

/// Whether an actor is moved by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorKind {
    /// Integrated by the solver; has mass and inertia
    Dynamic,
    /// Never moves under simulation
    Static,
}

/// Snapshot of one collision shape attached to an actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeInfo {
    /// Box half-extents
    pub half_extents: Vec3,
    /// Offset from the actor origin
    pub local_position: Vec3,
    /// Filter words stored on the shape
    pub filter: FilterData,
    /// Groups used for contact response
    pub simulation_groups: InteractionGroups,
    /// Groups used for contact generation and queries
    pub query_groups: InteractionGroups,
}

/// Encode a GameObject id as body user data
pub(crate) fn owner_to_user_data(owner: GameObjectId) -> u128 {
    u128::from(owner.data().as_ffi())
}

/// Decode body user data back into a GameObject id
pub fn owner_from_user_data(data: u128) -> Option<GameObjectId> {
    let bits = u64::try_from(data).ok()?;
    let id = GameObjectId::from(KeyData::from_ffi(bits));
    (!id.is_null()).then_some(id)
}

/// A body registered in the physics world
///
/// Dropping the guard (or calling [`release`](Self::release)) removes the
/// body and all of its shapes from the world. After the world itself has
/// been released the guard is inert: every accessor returns `None` or zero.
pub struct RigidActor {
    world: WeakWorld,
    body: RigidBodyHandle,
    kind: ActorKind,
    released: bool,
}

impl RigidActor {
    pub(crate) fn new(world: WeakWorld, body: RigidBodyHandle, kind: ActorKind) -> Self {
        Self {
            world,
            body,
            kind,
            released: false,
        }
    }

    /// Dynamic or static
    pub const fn kind(&self) -> ActorKind {
        self.kind
    }

    /// Whether [`release`](Self::release) has already run
    pub const fn is_released(&self) -> bool {
        self.released
    }

    pub(crate) const fn body_handle(&self) -> RigidBodyHandle {
        self.body
    }

    /// Remove the body and its shapes from the world
    ///
    /// Safe to call repeatedly; only the first call does anything.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let body = self.body;
        self.world.with(|world| world.remove_body(body));
    }

    /// The GameObject this actor reports as its owner
    pub fn owner(&self) -> Option<GameObjectId> {
        self.read(|body| owner_from_user_data(body.user_data))
            .flatten()
    }

    /// Point the back-reference at a different GameObject
    pub fn set_owner(&mut self, owner: GameObjectId) {
        self.write(|body| body.user_data = owner_to_user_data(owner));
    }

    /// Current world pose
    pub fn pose(&self) -> Option<(Vec3, Quat)> {
        self.read(|body| {
            (
                from_vector(body.translation()),
                from_rotation(body.rotation()),
            )
        })
    }

    /// Teleport the actor; a no-op when the pose is unchanged
    pub fn set_pose(&mut self, position: Vec3, rotation: Quat) {
        self.write(|body| {
            let current_position = from_vector(body.translation());
            let current_rotation = from_rotation(body.rotation());
            let alignment = current_rotation.coords.dot(&rotation.coords).abs();
            if (current_position - position).norm() <= POSITION_EPSILON
                && 1.0 - alignment <= ROTATION_EPSILON
            {
                return;
            }
            body.set_position(
                Isometry::from_parts(to_vector(position).into(), to_rotation(&rotation)),
                true,
            );
        });
    }

    /// Every shape currently attached, in attachment order
    pub fn shapes(&self) -> Vec<ShapeInfo> {
        if self.released {
            return Vec::new();
        }
        let body = self.body;
        self.world
            .with(|world| {
                let Some(rigid_body) = world.bodies.get(body) else {
                    return Vec::new();
                };
                rigid_body
                    .colliders()
                    .iter()
                    .filter_map(|handle| world.colliders.get(*handle))
                    .filter_map(|collider| {
                        let cuboid = collider.shape().as_cuboid()?;
                        let local_position = collider
                            .position_wrt_parent()
                            .map_or_else(Vec3::zeros, |iso| from_vector(&iso.translation.vector));
                        Some(ShapeInfo {
                            half_extents: from_vector(&cuboid.half_extents),
                            local_position,
                            filter: FilterData::from_user_data(collider.user_data),
                            simulation_groups: collider.solver_groups(),
                            query_groups: collider.collision_groups(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of attached shapes
    pub fn shape_count(&self) -> usize {
        self.read(|body| body.colliders().len()).unwrap_or(0)
    }

    /// Mass in kilograms (zero for static actors)
    pub fn mass(&self) -> f32 {
        self.read(RigidBody::mass).unwrap_or(0.0)
    }

    /// Linear velocity in m/s
    pub fn linear_velocity(&self) -> Option<Vec3> {
        self.read(|body| from_vector(body.linvel()))
    }

    fn read<R>(&self, f: impl FnOnce(&RigidBody) -> R) -> Option<R> {
        if self.released {
            return None;
        }
        let body = self.body;
        self.world
            .with(|world| world.bodies.get(body).map(f))
            .flatten()
    }

    fn write(&mut self, f: impl FnOnce(&mut RigidBody)) {
        if self.released {
            return;
        }
        let body = self.body;
        self.world.with(|world| {
            if let Some(rigid_body) = world.bodies.get_mut(body) {
                f(rigid_body);
            }
        });
    }
}

impl Drop for RigidActor {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for RigidActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigidActor")
            .field("body", &self.body)
            .field("kind", &self.kind)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

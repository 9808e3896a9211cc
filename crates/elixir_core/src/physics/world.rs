//! Simulation world and its shared handle
//!
//! The world owns every rigid body and collider. It lives behind a
//! [`WorldHandle`] so that actor guards and the shutdown path can reach it;
//! all mutation still happens on the simulation thread between steps.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError, Weak};

use rapier3d::prelude::*;

use crate::foundation::math::{Quat, Vec3};

type SharedWorld = Arc<Mutex<Option<PhysicsWorld>>>;

/// Every rapier structure needed to step and query one scene
pub struct PhysicsWorld {
    pub(crate) gravity: Vector<Real>,
    pub(crate) integration_parameters: IntegrationParameters,
    pub(crate) pipeline: PhysicsPipeline,
    pub(crate) islands: IslandManager,
    pub(crate) broad_phase: BroadPhase,
    pub(crate) narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    pub(crate) impulse_joints: ImpulseJointSet,
    pub(crate) multibody_joints: MultibodyJointSet,
    pub(crate) ccd_solver: CCDSolver,
    pub(crate) query_pipeline: QueryPipeline,
}

impl PhysicsWorld {
    /// Build an empty world with the given gravity
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Advance the simulation by `delta_time` seconds
    ///
    /// Runs synchronously; contacts, poses and the query structure are up to
    /// date when this returns.
    pub fn step(&mut self, delta_time: f32) {
        self.integration_parameters.dt = delta_time;

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Insert a body and return its handle
    pub(crate) fn insert_body(&mut self, body: RigidBody) -> RigidBodyHandle {
        self.bodies.insert(body)
    }

    /// Attach a collider to an existing body
    ///
    /// Returns `None` when the parent body is gone.
    pub(crate) fn attach_collider(
        &mut self,
        collider: Collider,
        parent: RigidBodyHandle,
    ) -> Option<ColliderHandle> {
        if !self.bodies.contains(parent) {
            return None;
        }
        Some(
            self.colliders
                .insert_with_parent(collider, parent, &mut self.bodies),
        )
    }

    /// Detach and drop every collider of a body, returning how many were removed
    pub(crate) fn detach_colliders(&mut self, body: RigidBodyHandle) -> usize {
        let attached = match self.bodies.get(body) {
            Some(body) => body.colliders().to_vec(),
            None => return 0,
        };

        attached
            .into_iter()
            .filter_map(|handle| {
                self.colliders
                    .remove(handle, &mut self.islands, &mut self.bodies, true)
            })
            .count()
    }

    /// Remove a body together with its colliders
    pub(crate) fn remove_body(&mut self, body: RigidBodyHandle) -> bool {
        self.bodies
            .remove(
                body,
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                true,
            )
            .is_some()
    }

    /// Number of bodies in the world
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of colliders in the world
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// World gravity
    pub fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }
}

/// Shared, releasable ownership of the simulation world
///
/// Cloning the handle shares the same world. Once released the handle holds
/// nothing and every accessor reports absence.
#[derive(Clone, Default)]
pub struct WorldHandle {
    inner: SharedWorld,
}

impl WorldHandle {
    /// Handle holding no world yet
    pub fn empty() -> Self {
        Self::default()
    }

    /// Install a world, replacing any previous one
    pub(crate) fn install(&self, world: PhysicsWorld) {
        *self.lock() = Some(world);
    }

    /// Run `f` against the world, if there is one
    pub fn with<R>(&self, f: impl FnOnce(&mut PhysicsWorld) -> R) -> Option<R> {
        self.lock().as_mut().map(f)
    }

    /// Whether a world is currently installed
    pub fn is_live(&self) -> bool {
        self.lock().is_some()
    }

    /// Drop the world and every body and collider it owns
    ///
    /// Returns whether a world was present.
    pub fn release(&self) -> bool {
        self.lock().take().is_some()
    }

    /// Like [`release`](Self::release) but never blocks
    ///
    /// Used from fault paths where the current thread may already hold the
    /// lock. Returns `None` when the lock is busy.
    pub fn try_release(&self) -> Option<bool> {
        match self.inner.try_lock() {
            Ok(mut guard) => Some(guard.take().is_some()),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner().take().is_some()),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    pub(crate) fn downgrade(&self) -> WeakWorld {
        WeakWorld {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<PhysicsWorld>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for WorldHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldHandle")
            .field("live", &self.is_live())
            .finish()
    }
}

/// Non-owning reference to the world held by actor guards
#[derive(Clone, Default)]
pub(crate) struct WeakWorld {
    inner: Weak<Mutex<Option<PhysicsWorld>>>,
}

impl WeakWorld {
    /// Run `f` against the world if it is still alive and installed
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut PhysicsWorld) -> R) -> Option<R> {
        let shared = self.inner.upgrade()?;
        let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_mut().map(f)
    }
}

pub(crate) fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

pub(crate) fn to_point(v: Vec3) -> Point<Real> {
    point![v.x, v.y, v.z]
}

pub(crate) fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn from_point(p: &Point<Real>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

pub(crate) fn to_rotation(q: &Quat) -> Rotation<Real> {
    let q = q.quaternion();
    Rotation::from_quaternion(rapier3d::na::Quaternion::new(q.w, q.i, q.j, q.k))
}

pub(crate) fn from_rotation(r: &Rotation<Real>) -> Quat {
    let q = r.quaternion();
    Quat::from_quaternion(nalgebra::Quaternion::new(q.w, q.i, q.j, q.k))
}

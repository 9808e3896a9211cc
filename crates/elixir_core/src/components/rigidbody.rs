//! Rigidbody component
//!
//! Ties one physics actor to a GameObject. Transform changes are queued and
//! pushed to the actor on the next update, so moving an object never touches
//! the physics world from inside a notification.

use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
use crate::physics::{ActorKind, RigidActor};
use crate::scene::TransformSubscription;

use super::{Component, ComponentContext};

/// Component owning at most one physics actor
#[derive(Debug, Default)]
pub struct RigidbodyComponent {
    actor: Option<RigidActor>,
    pending_pose: Option<(Vec3, Quat)>,
    subscription: Option<TransformSubscription>,
}

impl RigidbodyComponent {
    /// Wrap an actor created by the physics controller
    pub const fn new(actor: RigidActor) -> Self {
        Self {
            actor: Some(actor),
            pending_pose: None,
            subscription: None,
        }
    }

    /// A rigidbody without an actor
    pub const fn empty() -> Self {
        Self {
            actor: None,
            pending_pose: None,
            subscription: None,
        }
    }

    /// The owned actor, if any
    pub const fn rigid_actor(&self) -> Option<&RigidActor> {
        self.actor.as_ref()
    }

    /// Mutable access to the owned actor
    pub fn rigid_actor_mut(&mut self) -> Option<&mut RigidActor> {
        self.actor.as_mut()
    }

    /// Dynamic or static, if an actor is held
    pub fn kind(&self) -> Option<ActorKind> {
        self.actor.as_ref().map(RigidActor::kind)
    }

    /// Replace the actor, releasing the previous one
    pub fn set_actor(&mut self, actor: RigidActor) {
        if let Some(mut previous) = self.actor.replace(actor) {
            previous.release();
        }
    }

    /// Pose queued for the next update
    pub const fn pending_pose(&self) -> Option<(Vec3, Quat)> {
        self.pending_pose
    }
}

impl Component for RigidbodyComponent {
    fn update(&mut self, _delta_time: f32) {
        let Some((position, rotation)) = self.pending_pose.take() else {
            return;
        };
        if let Some(actor) = self.actor.as_mut() {
            actor.set_pose(position, rotation);
        }
    }

    fn set_owner(&mut self, context: &mut ComponentContext<'_>) {
        let rebinding = self.subscription.take().map(|old| context.cancel(old)).is_some();
        self.subscription = Some(context.subscribe_transform());
        if let Some(actor) = self.actor.as_mut() {
            actor.set_owner(context.owner());
        }

        // A new owner's transform wins over wherever the actor was
        if rebinding {
            let transform = Transform::from_matrix(context.world_transform());
            self.pending_pose = Some((transform.position, transform.rotation));
        }
    }

    fn on_owner_transform_changed(&mut self, world_transform: &Mat4) {
        let transform = Transform::from_matrix(world_transform);
        self.pending_pose = Some((transform.position, transform.rotation));
    }

    fn destroy(&mut self, context: &mut ComponentContext<'_>) {
        if let Some(subscription) = self.subscription.take() {
            context.cancel(subscription);
        }
        self.pending_pose = None;
        if let Some(actor) = self.actor.as_mut() {
            actor.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, PhysicsConfig};
    use crate::foundation::logging::Logger;
    use crate::physics::PhysicsController;
    use crate::scene::Scene;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn physics() -> PhysicsController {
        let logger = Arc::new(Logger::new(&LoggingConfig {
            echo_to_console: false,
            ..LoggingConfig::default()
        }));
        let mut physics = PhysicsController::new(PhysicsConfig::default(), logger);
        physics.init().expect("default config initializes");
        physics
    }

    #[test]
    fn test_transform_change_is_deferred_to_update() {
        let mut physics = physics();
        let mut scene = Scene::new();
        let id = scene.create_object("crate");
        let actor = physics
            .add_static_actor(scene.get(id).expect("exists"))
            .expect("actor created");
        let object = scene.get_mut(id).expect("exists");
        object.add_component(RigidbodyComponent::new(actor)).expect("attached");

        object.set_position(Vec3::new(0.0, 3.0, 0.0));
        let rigidbody = object.component::<RigidbodyComponent>().expect("attached");
        assert!(rigidbody.pending_pose().is_some());
        let (before, _) = rigidbody.rigid_actor().and_then(RigidActor::pose).expect("live");
        assert_relative_eq!(before, Vec3::zeros());

        object.update(1.0 / 60.0);
        let rigidbody = object.component::<RigidbodyComponent>().expect("attached");
        assert!(rigidbody.pending_pose().is_none());
        let (after, _) = rigidbody.rigid_actor().and_then(RigidActor::pose).expect("live");
        assert_relative_eq!(after, Vec3::new(0.0, 3.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_destroy_releases_actor() {
        let mut physics = physics();
        let mut scene = Scene::new();
        let id = scene.create_object("crate");
        let actor = physics
            .add_dynamic_actor(scene.get(id).expect("exists"))
            .expect("actor created");
        scene
            .get_mut(id)
            .expect("exists")
            .add_component(RigidbodyComponent::new(actor))
            .expect("attached");
        assert_eq!(physics.actor_count(), 1);

        scene.destroy_object(id);
        assert_eq!(physics.actor_count(), 0);
    }

    #[test]
    fn test_transfer_rebinds_actor_owner() {
        let mut physics = physics();
        let mut scene = Scene::new();
        let a = scene.create_object("a");
        let b = scene.create_object("b");
        let actor = physics
            .add_dynamic_actor(scene.get(a).expect("exists"))
            .expect("actor created");
        scene
            .get_mut(a)
            .expect("exists")
            .add_component(RigidbodyComponent::new(actor))
            .expect("attached");

        scene.transfer_component::<RigidbodyComponent>(a, b).expect("moved");

        let owner = scene
            .get(b)
            .and_then(|object| object.component::<RigidbodyComponent>())
            .and_then(RigidbodyComponent::rigid_actor)
            .and_then(RigidActor::owner);
        assert_eq!(owner, Some(b));
        assert!(scene
            .get(b)
            .and_then(|object| object.component::<RigidbodyComponent>())
            .and_then(RigidbodyComponent::pending_pose)
            .is_some());
        assert_eq!(scene.get(a).expect("exists").subscriber_count(), 0);
        assert_eq!(scene.get(b).expect("exists").subscriber_count(), 1);
    }

    #[test]
    fn test_transferred_static_actor_moves_to_new_owner() {
        let mut physics = physics();
        let mut scene = Scene::new();
        let a = scene.create_object("a");
        let b = scene.create_object("b");
        scene.get_mut(a).expect("exists").set_position(Vec3::new(10.0, 0.0, 0.0));
        scene.get_mut(b).expect("exists").set_position(Vec3::new(-10.0, 0.0, 0.0));
        let actor = physics
            .add_static_actor(scene.get(a).expect("exists"))
            .expect("actor created");
        scene
            .get_mut(a)
            .expect("exists")
            .add_component(RigidbodyComponent::new(actor))
            .expect("attached");

        scene.transfer_component::<RigidbodyComponent>(a, b).expect("moved");
        scene.update(1.0 / 60.0);

        let (position, _) = scene
            .get(b)
            .and_then(|object| object.component::<RigidbodyComponent>())
            .and_then(RigidbodyComponent::rigid_actor)
            .and_then(RigidActor::pose)
            .expect("live actor");
        assert_relative_eq!(position, Vec3::new(-10.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_empty_rigidbody_is_harmless() {
        let mut scene = Scene::new();
        let id = scene.create_object("ghost");
        let object = scene.get_mut(id).expect("exists");
        object.add_component(RigidbodyComponent::empty()).expect("attached");

        object.set_position(Vec3::x());
        object.update(1.0 / 60.0);

        assert!(object
            .component::<RigidbodyComponent>()
            .and_then(RigidbodyComponent::kind)
            .is_none());
    }
}

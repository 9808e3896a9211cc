//! Scene: the arena owning every GameObject

use std::any::TypeId;

use slotmap::SlotMap;

use super::{GameObject, GameObjectId};
use crate::components::{Component, ComponentError, ComponentKey, RigidbodyComponent};
use crate::physics::{owner_from_user_data, ActorKind, RigidActor};

/// Flat collection of GameObjects addressed by [`GameObjectId`]
pub struct Scene {
    objects: SlotMap<GameObjectId, GameObject>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self {
            objects: SlotMap::with_key(),
        }
    }

    /// Create a GameObject at the origin
    pub fn create_object(&mut self, name: impl Into<String>) -> GameObjectId {
        let name = name.into();
        self.objects.insert_with_key(|id| GameObject::new(id, name))
    }

    /// Borrow a GameObject
    pub fn get(&self, id: GameObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    /// Mutably borrow a GameObject
    pub fn get_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id)
    }

    /// Whether the id refers to a live GameObject
    pub fn contains(&self, id: GameObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Destroy a GameObject and all of its components
    pub fn destroy_object(&mut self, id: GameObjectId) -> bool {
        match self.objects.remove(id) {
            Some(mut object) => {
                object.destroy();
                true
            }
            None => false,
        }
    }

    /// Number of GameObjects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the scene has no GameObjects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Ids of every GameObject
    pub fn ids(&self) -> Vec<GameObjectId> {
        self.objects.keys().collect()
    }

    /// Iterate over every GameObject
    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    /// Tick every GameObject's components
    pub fn update(&mut self, delta_time: f32) {
        for object in self.objects.values_mut() {
            object.update(delta_time);
        }
    }

    /// Move the component of type `T` from one GameObject to another
    ///
    /// The component keeps its lifecycle state and is re-bound through
    /// `set_owner`, which may cancel subscriptions held on the old owner.
    pub fn transfer_component<T: Component>(
        &mut self,
        from: GameObjectId,
        to: GameObjectId,
    ) -> Result<ComponentKey, ComponentError> {
        if from == to {
            return Err(ComponentError::SameObject(from));
        }
        for id in [from, to] {
            if !self.objects.contains_key(id) {
                return Err(ComponentError::ObjectNotFound(id));
            }
        }
        let Some([source, target]) = self.objects.get_disjoint_mut([from, to]) else {
            return Err(ComponentError::SameObject(from));
        };

        let type_id = TypeId::of::<T>();
        let component = std::any::type_name::<T>();
        if !source.has_type(type_id) {
            return Err(ComponentError::Missing { object: from, component });
        }
        if target.is_destroyed() {
            return Err(ComponentError::ObjectDestroyed(to));
        }
        if target.has_type(type_id) {
            return Err(ComponentError::Duplicate { object: to, component });
        }
        let (old_key, slot) = source
            .detach_slot(type_id)
            .ok_or(ComponentError::Missing { object: from, component })?;

        let key = target.attach_slot(type_id, slot, Some(source.channel_mut()))?;
        source.channel_mut().forget_component(old_key);
        Ok(key)
    }

    /// Copy simulated poses of dynamic actors back into their GameObjects
    ///
    /// Returns the number of objects updated.
    pub fn sync_from_physics(&mut self) -> usize {
        let mut synced = 0;
        for object in self.objects.values_mut() {
            let pose = object
                .component::<RigidbodyComponent>()
                .and_then(RigidbodyComponent::rigid_actor)
                .filter(|actor| actor.kind() == ActorKind::Dynamic)
                .and_then(RigidActor::pose);

            if let Some((position, rotation)) = pose {
                object.apply_simulated_pose(position, rotation);
                synced += 1;
            }
        }
        synced
    }

    /// Resolve a physics back-reference to a live GameObject
    pub fn object_for_actor_data(&self, data: u128) -> Option<GameObjectId> {
        owner_from_user_data(data).filter(|id| self.objects.contains_key(*id))
    }

    /// Destroy every GameObject
    pub fn clear(&mut self) {
        for (_, mut object) in self.objects.drain() {
            object.destroy();
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("objects", &self.objects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComponentContext, ComponentState};
    use crate::foundation::math::{Mat4, Vec3};
    use crate::scene::TransformSubscription;

    #[derive(Default)]
    struct Follower {
        subscription: Option<TransformSubscription>,
        owners: Vec<GameObjectId>,
        cancelled: Vec<bool>,
        last_matrix: Option<Mat4>,
    }

    impl Component for Follower {
        fn set_owner(&mut self, context: &mut ComponentContext<'_>) {
            if let Some(old) = self.subscription.take() {
                self.cancelled.push(context.cancel(old));
            }
            self.subscription = Some(context.subscribe_transform());
            self.owners.push(context.owner());
        }

        fn on_owner_transform_changed(&mut self, world_transform: &Mat4) {
            self.last_matrix = Some(*world_transform);
        }

        fn destroy(&mut self, context: &mut ComponentContext<'_>) {
            if let Some(subscription) = self.subscription.take() {
                context.cancel(subscription);
            }
        }
    }

    #[test]
    fn test_transfer_rebinds_owner_and_subscription() {
        let mut scene = Scene::new();
        let a = scene.create_object("a");
        let b = scene.create_object("b");
        scene.get_mut(a).expect("a").add_component(Follower::default()).expect("attached");
        scene.update(0.016);

        scene.transfer_component::<Follower>(a, b).expect("transferred");

        let source = scene.get(a).expect("a");
        assert!(!source.has_component::<Follower>());
        assert_eq!(source.subscriber_count(), 0);

        let target = scene.get(b).expect("b");
        let follower = target.component::<Follower>().expect("moved");
        assert_eq!(follower.owners, vec![a, b]);
        assert_eq!(follower.cancelled, vec![true]);
        assert_eq!(target.subscriber_count(), 1);
        assert_eq!(target.component_state::<Follower>(), Some(ComponentState::Active));

        scene.get_mut(a).expect("a").set_position(Vec3::x());
        assert!(scene.get(b).and_then(|o| o.component::<Follower>()).and_then(|f| f.last_matrix).is_none());

        scene.get_mut(b).expect("b").set_position(Vec3::y());
        let moved = scene.get(b).expect("b");
        assert_eq!(
            moved.component::<Follower>().and_then(|f| f.last_matrix),
            Some(moved.world_matrix())
        );
    }

    #[test]
    fn test_transfer_rejects_duplicate_and_missing() {
        let mut scene = Scene::new();
        let a = scene.create_object("a");
        let b = scene.create_object("b");
        scene.get_mut(a).expect("a").add_component(Follower::default()).expect("attached");
        scene.get_mut(b).expect("b").add_component(Follower::default()).expect("attached");

        assert!(matches!(
            scene.transfer_component::<Follower>(a, b),
            Err(ComponentError::Duplicate { .. })
        ));
        assert!(scene.get(a).expect("a").has_component::<Follower>());

        let c = scene.create_object("c");
        assert!(matches!(
            scene.transfer_component::<Follower>(c, a),
            Err(ComponentError::Missing { .. })
        ));
        assert!(matches!(
            scene.transfer_component::<Follower>(c, b),
            Err(ComponentError::Missing { object, .. }) if object == c
        ));
        assert!(scene.get(a).expect("a").has_component::<Follower>());
        assert!(scene.get(b).expect("b").has_component::<Follower>());
        assert!(matches!(
            scene.transfer_component::<Follower>(a, a),
            Err(ComponentError::SameObject(_))
        ));
    }

    #[test]
    fn test_destroy_object_removes_it() {
        let mut scene = Scene::new();
        let id = scene.create_object("gone");
        assert_eq!(scene.len(), 1);

        assert!(scene.destroy_object(id));
        assert!(!scene.destroy_object(id));
        assert!(scene.get(id).is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_object_for_actor_data_requires_live_object() {
        let mut scene = Scene::new();
        let id = scene.create_object("target");
        let data = u128::from(slotmap::Key::data(&id).as_ffi());

        assert_eq!(scene.object_for_actor_data(data), Some(id));
        scene.destroy_object(id);
        assert_eq!(scene.object_for_actor_data(data), None);
    }
}

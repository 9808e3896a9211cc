//! GameObject: identity, transform and owned components

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use slotmap::SlotMap;

use super::{GameObjectId, TransformChannel};
use crate::components::component::{downcast_mut, downcast_ref};
use crate::components::{Component, ComponentContext, ComponentError, ComponentKey, ComponentState};
use crate::foundation::math::{Mat4, Quat, Transform, Vec3};
use crate::physics::LayerMask;

/// A component together with its lifecycle state
pub(crate) struct ComponentSlot {
    pub(crate) state: ComponentState,
    pub(crate) type_name: &'static str,
    pub(crate) component: Box<dyn Component>,
}

/// A named object in the scene
///
/// Owns at most one component of each concrete type. Every transform change
/// is published to the components that subscribed to it.
pub struct GameObject {
    id: GameObjectId,
    name: String,
    transform: Transform,
    layer_mask: LayerMask,
    components: SlotMap<ComponentKey, ComponentSlot>,
    by_type: HashMap<TypeId, ComponentKey>,
    channel: TransformChannel,
    destroyed: bool,
}

impl GameObject {
    pub(crate) fn new(id: GameObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            transform: Transform::identity(),
            layer_mask: LayerMask::default(),
            components: SlotMap::with_key(),
            by_type: HashMap::new(),
            channel: TransformChannel::new(id),
            destroyed: false,
        }
    }

    /// Scene-unique identity
    pub const fn id(&self) -> GameObjectId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the object
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Local transform
    pub const fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World matrix (objects have no parent, so local equals world)
    pub fn world_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Collision layers
    pub const fn layer_mask(&self) -> LayerMask {
        self.layer_mask
    }

    /// Change collision layers; existing shapes keep their filter until rebuilt
    pub fn set_layer_mask(&mut self, mask: LayerMask) {
        self.layer_mask = mask;
    }

    /// Move the object
    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
        self.publish_transform();
    }

    /// Rotate the object
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
        self.publish_transform();
    }

    /// Scale the object
    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
        self.publish_transform();
    }

    /// Replace the whole transform
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
        self.publish_transform();
    }

    /// Write back a pose computed by the simulation
    pub fn apply_simulated_pose(&mut self, position: Vec3, rotation: Quat) {
        self.transform.position = position;
        self.transform.rotation = rotation;
        self.publish_transform();
    }

    /// Attach a component
    ///
    /// Fails if a component of the same type is already attached.
    pub fn add_component<T: Component>(&mut self, component: T) -> Result<ComponentKey, ComponentError> {
        self.attach_slot(
            TypeId::of::<T>(),
            ComponentSlot {
                state: ComponentState::Attached,
                type_name: type_name::<T>(),
                component: Box::new(component),
            },
            None,
        )
    }

    /// Borrow the component of type `T`
    pub fn component<T: Component>(&self) -> Option<&T> {
        let key = self.by_type.get(&TypeId::of::<T>())?;
        downcast_ref::<T>(self.components.get(*key)?.component.as_ref())
    }

    /// Mutably borrow the component of type `T`
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        let key = self.by_type.get(&TypeId::of::<T>())?;
        downcast_mut::<T>(self.components.get_mut(*key)?.component.as_mut())
    }

    /// Whether a component of type `T` is attached
    pub fn has_component<T: Component>(&self) -> bool {
        self.by_type.contains_key(&TypeId::of::<T>())
    }

    /// Lifecycle state of the component of type `T`
    pub fn component_state<T: Component>(&self) -> Option<ComponentState> {
        let key = self.by_type.get(&TypeId::of::<T>())?;
        self.components.get(*key).map(|slot| slot.state)
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Destroy and drop the component of type `T`
    pub fn remove_component<T: Component>(&mut self) -> bool {
        let Some(key) = self.by_type.remove(&TypeId::of::<T>()) else {
            return false;
        };
        self.destroy_slot(key);
        self.components.remove(key);
        self.channel.forget_component(key);
        true
    }

    /// Tick every live component
    pub fn update(&mut self, delta_time: f32) {
        for slot in self.components.values_mut() {
            match slot.state {
                ComponentState::Destroyed => continue,
                ComponentState::Attached => slot.state = ComponentState::Active,
                ComponentState::Active => {}
            }
            slot.component.update(delta_time);
        }
    }

    /// Destroy every component exactly once
    ///
    /// Further calls do nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        let keys: Vec<ComponentKey> = self.components.keys().collect();
        for key in keys {
            self.destroy_slot(key);
        }
        self.components.clear();
        self.by_type.clear();
        self.channel.clear();
    }

    /// Whether [`destroy`](Self::destroy) has run
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of transform subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.channel.len()
    }

    /// Take a component out without destroying it, for moving to another owner
    pub(crate) fn detach_slot(&mut self, type_id: TypeId) -> Option<(ComponentKey, ComponentSlot)> {
        let key = self.by_type.remove(&type_id)?;
        let slot = self.components.remove(key)?;
        Some((key, slot))
    }

    /// Insert a component and bind it to this owner
    ///
    /// `previous` is the channel of the object the component is moving from,
    /// so its old subscription can be cancelled.
    pub(crate) fn attach_slot(
        &mut self,
        type_id: TypeId,
        slot: ComponentSlot,
        previous: Option<&mut TransformChannel>,
    ) -> Result<ComponentKey, ComponentError> {
        if self.destroyed {
            return Err(ComponentError::ObjectDestroyed(self.id));
        }
        if self.by_type.contains_key(&type_id) {
            return Err(ComponentError::Duplicate {
                object: self.id,
                component: slot.type_name,
            });
        }

        let world_transform = self.transform.to_matrix();
        let key = self.components.insert(slot);
        self.by_type.insert(type_id, key);

        let slot = &mut self.components[key];
        let mut context = ComponentContext::new(key, world_transform, &mut self.channel, previous);
        slot.component.set_owner(&mut context);

        Ok(key)
    }

    pub(crate) fn has_type(&self, type_id: TypeId) -> bool {
        self.by_type.contains_key(&type_id)
    }

    pub(crate) fn channel_mut(&mut self) -> &mut TransformChannel {
        &mut self.channel
    }

    fn destroy_slot(&mut self, key: ComponentKey) {
        let world_transform = self.transform.to_matrix();
        let Some(slot) = self.components.get_mut(key) else {
            return;
        };
        if slot.state == ComponentState::Destroyed {
            return;
        }
        let mut context = ComponentContext::new(key, world_transform, &mut self.channel, None);
        slot.component.destroy(&mut context);
        slot.state = ComponentState::Destroyed;
    }

    fn publish_transform(&mut self) {
        if self.channel.is_empty() {
            return;
        }
        let matrix = self.transform.to_matrix();
        for key in self.channel.subscribers() {
            if let Some(slot) = self.components.get_mut(key) {
                if slot.state != ComponentState::Destroyed {
                    slot.component.on_owner_transform_changed(&matrix);
                }
            }
        }
    }
}

impl Drop for GameObject {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let components: Vec<&str> = self.components.values().map(|slot| slot.type_name).collect();
        f.debug_struct("GameObject")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("layer_mask", &self.layer_mask)
            .field("components", &components)
            .finish()
    }
}

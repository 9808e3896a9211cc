//! Component trait and lifecycle
//!
//! Components are owned by exactly one GameObject at a time. The owner drives
//! the lifecycle `Attached -> Active -> Destroyed`: a component is attached
//! when added, becomes active on its first update and is destroyed exactly
//! once, after which it is never ticked or notified again.

use std::any::Any;

use slotmap::new_key_type;

use crate::foundation::math::Mat4;
use crate::scene::{GameObjectId, TransformChannel, TransformSubscription};

new_key_type! {
    /// Slot of a component inside its owner
    pub struct ComponentKey;
}

/// Lifecycle state of an attached component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    /// Owner bound, not yet updated
    Attached,
    /// Updated at least once
    Active,
    /// Torn down; never touched again
    Destroyed,
}

/// Upcast helper so boxed components can be downcast to their concrete type
pub trait AsAny: Any {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;
    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour attached to a GameObject
pub trait Component: AsAny + Send {
    /// Per-frame tick
    fn update(&mut self, _delta_time: f32) {}

    /// Called when the component is bound to a (new) owner
    fn set_owner(&mut self, context: &mut ComponentContext<'_>);

    /// Called with the owner's new world matrix after every transform change
    fn on_owner_transform_changed(&mut self, _world_transform: &Mat4) {}

    /// Release everything the component holds outside itself
    fn destroy(&mut self, context: &mut ComponentContext<'_>);
}

/// Owner-side services available during `set_owner` and `destroy`
pub struct ComponentContext<'a> {
    owner: GameObjectId,
    slot: ComponentKey,
    world_transform: Mat4,
    channel: &'a mut TransformChannel,
    previous: Option<&'a mut TransformChannel>,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(
        slot: ComponentKey,
        world_transform: Mat4,
        channel: &'a mut TransformChannel,
        previous: Option<&'a mut TransformChannel>,
    ) -> Self {
        Self {
            owner: channel.owner(),
            slot,
            world_transform,
            channel,
            previous,
        }
    }

    /// The owning GameObject
    pub const fn owner(&self) -> GameObjectId {
        self.owner
    }

    /// The owner's current world matrix
    pub const fn world_transform(&self) -> &Mat4 {
        &self.world_transform
    }

    /// Receive `on_owner_transform_changed` for this owner's transform changes
    pub fn subscribe_transform(&mut self) -> TransformSubscription {
        self.channel.subscribe(self.slot)
    }

    /// Cancel a subscription issued by the current or the previous owner
    ///
    /// Returns `false` if the token is stale or its channel is unreachable.
    pub fn cancel(&mut self, subscription: TransformSubscription) -> bool {
        if subscription.owner() == self.channel.owner() {
            return self.channel.cancel(subscription);
        }
        match self.previous.as_deref_mut() {
            Some(previous) if previous.owner() == subscription.owner() => {
                previous.cancel(subscription)
            }
            _ => false,
        }
    }
}

/// Component attachment errors
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// The GameObject already holds a component of this type
    #[error("GameObject {object:?} already has a {component}")]
    Duplicate {
        /// Target GameObject
        object: GameObjectId,
        /// Component type name
        component: &'static str,
    },

    /// No component of the requested type
    #[error("GameObject {object:?} has no {component}")]
    Missing {
        /// Queried GameObject
        object: GameObjectId,
        /// Component type name
        component: &'static str,
    },

    /// The GameObject id is unknown to the scene
    #[error("GameObject {0:?} not found")]
    ObjectNotFound(GameObjectId),

    /// Source and target of a transfer are the same object
    #[error("Cannot transfer a component from GameObject {0:?} to itself")]
    SameObject(GameObjectId),

    /// The GameObject was already destroyed
    #[error("GameObject {0:?} has been destroyed")]
    ObjectDestroyed(GameObjectId),
}

/// Downcast a boxed component to its concrete type
pub(crate) fn downcast_ref<T: Component>(component: &dyn Component) -> Option<&T> {
    <dyn Component as AsAny>::as_any(component).downcast_ref::<T>()
}

/// Mutably downcast a boxed component to its concrete type
pub(crate) fn downcast_mut<T: Component>(component: &mut dyn Component) -> Option<&mut T> {
    <dyn Component as AsAny>::as_any_mut(component).downcast_mut::<T>()
}

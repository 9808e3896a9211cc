//! Per-GameObject transform change notifications

use slotmap::{new_key_type, SlotMap};

use super::GameObjectId;
use crate::components::ComponentKey;

new_key_type! {
    /// Slot of one subscriber inside a channel
    pub struct SubscriberKey;
}

/// Token returned by a subscription; hand it back to cancel
///
/// The token remembers which GameObject issued it, so a component that has
/// moved to another owner can still cancel its old subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformSubscription {
    owner: GameObjectId,
    key: SubscriberKey,
}

impl TransformSubscription {
    /// GameObject whose channel issued the token
    pub const fn owner(&self) -> GameObjectId {
        self.owner
    }
}

/// Components to notify when the owning GameObject's transform changes
#[derive(Debug)]
pub struct TransformChannel {
    owner: GameObjectId,
    subscribers: SlotMap<SubscriberKey, ComponentKey>,
}

impl TransformChannel {
    pub(crate) fn new(owner: GameObjectId) -> Self {
        Self {
            owner,
            subscribers: SlotMap::with_key(),
        }
    }

    /// GameObject this channel belongs to
    pub const fn owner(&self) -> GameObjectId {
        self.owner
    }

    pub(crate) fn subscribe(&mut self, component: ComponentKey) -> TransformSubscription {
        TransformSubscription {
            owner: self.owner,
            key: self.subscribers.insert(component),
        }
    }

    /// Returns `false` for a token from another channel or one already cancelled
    pub(crate) fn cancel(&mut self, subscription: TransformSubscription) -> bool {
        subscription.owner == self.owner && self.subscribers.remove(subscription.key).is_some()
    }

    /// Drop every subscription held by a component that left this GameObject
    pub(crate) fn forget_component(&mut self, component: ComponentKey) {
        self.subscribers.retain(|_, subscriber| *subscriber != component);
    }

    pub(crate) fn clear(&mut self) {
        self.subscribers.clear();
    }

    /// Components to notify, in subscription order
    pub(crate) fn subscribers(&self) -> Vec<ComponentKey> {
        self.subscribers.values().copied().collect()
    }

    /// Number of live subscriptions
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Whether nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (GameObjectId, GameObjectId, ComponentKey) {
        let mut objects: SlotMap<GameObjectId, ()> = SlotMap::with_key();
        let mut components: SlotMap<ComponentKey, ()> = SlotMap::with_key();
        (objects.insert(()), objects.insert(()), components.insert(()))
    }

    #[test]
    fn test_cancel_only_accepts_own_tokens() {
        let (first, second, component) = ids();
        let mut a = TransformChannel::new(first);
        let mut b = TransformChannel::new(second);

        let token = a.subscribe(component);
        assert!(!b.cancel(token));
        assert!(a.cancel(token));
        assert!(!a.cancel(token));
        assert!(a.is_empty());
    }

    #[test]
    fn test_forget_component_drops_its_subscriptions() {
        let (owner, _, component) = ids();
        let mut channel = TransformChannel::new(owner);
        channel.subscribe(component);
        channel.subscribe(component);

        channel.forget_component(component);
        assert!(channel.subscribers().is_empty());
    }
}

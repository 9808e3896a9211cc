//! Scene and GameObject model
//!
//! A [`Scene`] owns GameObjects; each [`GameObject`] owns its components and
//! a [`TransformChannel`] that tells subscribed components when the object
//! moves.
//!
//! ```text
//! Scene
//!   └─ GameObject ── TransformChannel ──> subscribed components
//!        └─ components (one per type)
//! ```

mod game_object;
mod scene_graph;
mod transform_channel;

use slotmap::new_key_type;

pub use game_object::GameObject;
pub use scene_graph::Scene;
pub use transform_channel::{SubscriberKey, TransformChannel, TransformSubscription};

new_key_type! {
    /// Identity of a GameObject within its scene
    pub struct GameObjectId;
}

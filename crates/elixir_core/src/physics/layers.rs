//! Collision layers and simulation filter data
//!
//! Every GameObject carries a [`LayerMask`]. When a physics shape is created
//! the mask becomes the shape's [`FilterData`]. The filter word is stored on
//! the collider and selects which shapes a layer-filtered query sees; it
//! never switches contact generation off.

use bitflags::bitflags;
use rapier3d::prelude::{Group, InteractionGroups};

bitflags! {
    /// Collision layer bits of a GameObject
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerMask: u32 {
        /// Layer every object starts on
        const DEFAULT = 1 << 0;
        /// Static ground and environment geometry
        const GROUND = 1 << 1;
        /// Player characters
        const PLAYER = 1 << 2;
        /// Enemy characters
        const ENEMY = 1 << 3;
        /// Projectiles (bullets, missiles, etc.)
        const PROJECTILE = 1 << 4;
        /// Trigger volumes
        const TRIGGER = 1 << 5;
        /// Debris and small physics objects
        const DEBRIS = 1 << 6;
        /// Pickups and collectibles
        const PICKUP = 1 << 7;
        /// Every layer, including user-defined bits
        const ALL = u32::MAX;
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Filter words attached to a collision shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterData {
    /// Layer membership bits
    pub word0: u32,
}

impl FilterData {
    /// Filter data whose first word is the layer mask
    pub const fn from_layer(mask: LayerMask) -> Self {
        Self { word0: mask.bits() }
    }

    /// Layers this filter word belongs to
    pub const fn layers(self) -> LayerMask {
        LayerMask::from_bits_retain(self.word0)
    }

    /// Whether a query on `layers` should see a shape with this filter word
    pub const fn matches(self, layers: LayerMask) -> bool {
        self.word0 & layers.bits() != 0
    }

    /// Backend interaction groups for both the solver and collision channels
    ///
    /// Membership follows `word0`, interacting with everything. A shape with
    /// no layer bits is still a member of every group so that it keeps
    /// colliding.
    pub fn interaction_groups(self) -> InteractionGroups {
        let memberships = if self.word0 == 0 {
            Group::ALL
        } else {
            Group::from_bits_truncate(self.word0)
        };
        InteractionGroups::new(memberships, Group::ALL)
    }

    /// Encode as collider user data
    pub const fn to_user_data(self) -> u128 {
        self.word0 as u128
    }

    /// Decode from collider user data; the upper bits are ignored
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_user_data(data: u128) -> Self {
        Self {
            word0: data as u32,
        }
    }
}

impl From<LayerMask> for FilterData {
    fn from(mask: LayerMask) -> Self {
        Self::from_layer(mask)
    }
}

//! Surface material shared by every collision shape

use rapier3d::prelude::{CoefficientCombineRule, ColliderBuilder};

use crate::config::MaterialConfig;

/// Friction and restitution applied to a collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsMaterial {
    /// Friction coefficient at rest
    pub static_friction: f32,
    /// Friction coefficient while sliding
    pub dynamic_friction: f32,
    /// Bounciness (0 = none, 1 = perfectly elastic)
    pub restitution: f32,
}

impl PhysicsMaterial {
    /// Create a material
    pub const fn new(static_friction: f32, dynamic_friction: f32, restitution: f32) -> Self {
        Self {
            static_friction,
            dynamic_friction,
            restitution,
        }
    }

    /// Apply this material to a collider under construction
    ///
    /// The backend has a single friction coefficient, so the sliding value is
    /// used; static friction is kept for callers that inspect the material.
    pub(crate) fn apply(&self, builder: ColliderBuilder) -> ColliderBuilder {
        builder
            .friction(self.dynamic_friction)
            .friction_combine_rule(CoefficientCombineRule::Average)
            .restitution(self.restitution)
            .restitution_combine_rule(CoefficientCombineRule::Average)
    }
}

impl From<MaterialConfig> for PhysicsMaterial {
    fn from(config: MaterialConfig) -> Self {
        Self::new(
            config.static_friction,
            config.dynamic_friction,
            config.restitution,
        )
    }
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        MaterialConfig::default().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material_matches_config() {
        let material = PhysicsMaterial::default();
        assert_eq!(material, PhysicsMaterial::new(0.5, 0.5, 0.6));
    }

    #[test]
    fn test_apply_uses_dynamic_friction() {
        let material = PhysicsMaterial::new(0.9, 0.3, 0.1);
        let collider = material.apply(ColliderBuilder::cuboid(1.0, 1.0, 1.0)).build();

        assert!((collider.friction() - 0.3).abs() < f32::EPSILON);
        assert!((collider.restitution() - 0.1).abs() < f32::EPSILON);
    }
}

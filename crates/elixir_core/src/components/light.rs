//! Light component
//!
//! Keeps a light's world position and direction in step with its owning
//! GameObject. Lights point down their local -Z axis.

use crate::foundation::math::{matrix_translation, Mat4, Vec3};
use crate::scene::TransformSubscription;

use super::{Component, ComponentContext};

/// Types of lights supported by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Parallel rays, like sunlight
    Directional,
    /// Radiates in all directions from a position
    Point {
        /// Maximum reach
        range: f32,
    },
    /// A cone of light from a position
    Spot {
        /// Maximum reach
        range: f32,
        /// Full-intensity cone angle in radians
        inner_cone: f32,
        /// Falloff cone angle in radians
        outer_cone: f32,
    },
}

/// Light parameters plus the pose derived from the owner
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Directional, point or spot
    pub kind: LightKind,
    /// RGB colour (0.0 to 1.0 range)
    pub color: Vec3,
    /// Intensity multiplier
    pub intensity: f32,
    /// Whether the light contributes to shading
    pub enabled: bool,
    /// Whether the light casts shadows
    pub cast_shadows: bool,
    /// World-space position, derived from the owner
    pub position: Vec3,
    /// World-space unit direction, derived from the owner
    pub direction: Vec3,
}

impl Light {
    /// Sun-like light
    pub fn directional(color: Vec3, intensity: f32) -> Self {
        Self::new(LightKind::Directional, color, intensity)
    }

    /// Omni light with a finite range
    pub fn point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self::new(LightKind::Point { range }, color, intensity)
    }

    /// Cone light
    pub fn spot(color: Vec3, intensity: f32, range: f32, inner_cone: f32, outer_cone: f32) -> Self {
        Self::new(
            LightKind::Spot {
                range,
                inner_cone,
                outer_cone,
            },
            color,
            intensity,
        )
    }

    fn new(kind: LightKind, color: Vec3, intensity: f32) -> Self {
        Self {
            kind,
            color,
            intensity,
            enabled: true,
            cast_shadows: true,
            position: Vec3::zeros(),
            direction: -Vec3::z(),
        }
    }

    /// Derive position and direction from a world matrix
    ///
    /// A degenerate matrix leaves the previous direction in place.
    pub fn apply_transform(&mut self, world_transform: &Mat4) {
        self.position = matrix_translation(world_transform);
        if let Some(direction) = world_transform
            .transform_vector(&-Vec3::z())
            .try_normalize(f32::EPSILON)
        {
            self.direction = direction;
        }
    }
}

/// Component that owns a [`Light`] and follows its GameObject
#[derive(Debug)]
pub struct LightComponent {
    light: Light,
    subscription: Option<TransformSubscription>,
}

impl LightComponent {
    /// Wrap a light; its pose is set when attached
    pub const fn new(light: Light) -> Self {
        Self {
            light,
            subscription: None,
        }
    }

    /// The light
    pub const fn light(&self) -> &Light {
        &self.light
    }

    /// Mutable access to the light parameters
    pub fn light_mut(&mut self) -> &mut Light {
        &mut self.light
    }

    /// Whether the component is following an owner
    pub const fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Component for LightComponent {
    fn set_owner(&mut self, context: &mut ComponentContext<'_>) {
        if let Some(old) = self.subscription.take() {
            context.cancel(old);
        }
        self.subscription = Some(context.subscribe_transform());
        self.light.apply_transform(context.world_transform());
    }

    fn on_owner_transform_changed(&mut self, world_transform: &Mat4) {
        self.light.apply_transform(world_transform);
    }

    fn destroy(&mut self, context: &mut ComponentContext<'_>) {
        if let Some(subscription) = self.subscription.take() {
            context.cancel(subscription);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, Quat, Transform};
    use crate::scene::Scene;
    use approx::assert_relative_eq;

    #[test]
    fn test_apply_transform_uses_translation_and_negative_z() {
        let mut light = Light::point(Vec3::new(1.0, 1.0, 1.0), 2.0, 10.0);
        let transform = Transform::new(
            Vec3::new(3.0, 4.0, 5.0),
            Quat::from_axis_angle(&Vec3::y_axis(), constants::HALF_PI),
            Vec3::new(2.0, 2.0, 2.0),
        );

        light.apply_transform(&transform.to_matrix());

        assert_relative_eq!(light.position, Vec3::new(3.0, 4.0, 5.0));
        // Quarter turn about +Y takes -Z to -X
        assert_relative_eq!(light.direction, Vec3::new(-1.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_degenerate_matrix_keeps_direction() {
        let mut light = Light::directional(Vec3::new(1.0, 1.0, 1.0), 1.0);
        light.apply_transform(&Mat4::zeros());

        assert_relative_eq!(light.direction, -Vec3::z());
        assert_relative_eq!(light.position, Vec3::zeros());
    }

    #[test]
    fn test_light_follows_owner() {
        let mut scene = Scene::new();
        let id = scene.create_object("lamp");
        let lamp = scene.get_mut(id).expect("just created");
        lamp.set_position(Vec3::new(1.0, 0.0, 0.0));
        lamp.add_component(LightComponent::new(Light::spot(
            Vec3::new(1.0, 0.9, 0.8),
            3.0,
            15.0,
            0.2,
            0.4,
        )))
        .expect("attached");

        // Attaching applies the current pose
        let light = lamp.component::<LightComponent>().expect("attached").light();
        assert_relative_eq!(light.position, Vec3::new(1.0, 0.0, 0.0));

        let rotation = Quat::from_axis_angle(&Vec3::x_axis(), -constants::HALF_PI);
        lamp.set_position(Vec3::new(0.0, 8.0, 0.0));
        lamp.set_rotation(rotation);

        let expected = Transform::new(Vec3::new(0.0, 8.0, 0.0), rotation, Vec3::new(1.0, 1.0, 1.0));
        let light = lamp.component::<LightComponent>().expect("attached").light();
        assert_relative_eq!(light.position, Vec3::new(0.0, 8.0, 0.0));
        assert_relative_eq!(
            light.direction,
            expected.to_matrix().transform_vector(&-Vec3::z()).normalize(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_destroy_cancels_subscription() {
        let mut scene = Scene::new();
        let id = scene.create_object("lamp");
        let lamp = scene.get_mut(id).expect("just created");
        lamp.add_component(LightComponent::new(Light::directional(Vec3::new(1.0, 1.0, 1.0), 1.0)))
            .expect("attached");
        assert_eq!(lamp.subscriber_count(), 1);

        assert!(lamp.remove_component::<LightComponent>());
        assert_eq!(lamp.subscriber_count(), 0);
    }

    #[test]
    fn test_light_mut_edits_in_place() {
        let mut component = LightComponent::new(Light::point(Vec3::new(1.0, 0.0, 0.0), 1.0, 5.0));
        component.light_mut().intensity = 4.0;
        component.light_mut().enabled = false;

        assert!((component.light().intensity - 4.0).abs() < f32::EPSILON);
        assert!(!component.light().enabled);
        assert!(!component.is_subscribed());
    }
}

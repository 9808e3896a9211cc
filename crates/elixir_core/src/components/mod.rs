//! Components attachable to GameObjects

pub mod component;
pub mod light;
pub mod rigidbody;

pub use component::{AsAny, Component, ComponentContext, ComponentError, ComponentKey, ComponentState};
pub use light::{Light, LightComponent, LightKind};
pub use rigidbody::RigidbodyComponent;

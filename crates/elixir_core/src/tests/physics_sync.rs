//! GameObjects, components and physics working together

use crate::components::{Light, LightComponent, RigidbodyComponent};
use crate::config::EngineConfig;
use crate::foundation::math::{Quat, Vec3};
use crate::physics::{ActorKind, LayerMask, RigidActor};
use crate::scene::GameObjectId;
use crate::Engine;

fn engine() -> Engine {
    let mut config = EngineConfig::default();
    config.logging.echo_to_console = false;
    Engine::new(config).expect("engine starts")
}

fn spawn(engine: &mut Engine, name: &str, position: Vec3, scale: Vec3, kind: ActorKind) -> GameObjectId {
    let id = engine.scene_mut().create_object(name);
    let object = engine.scene_mut().get_mut(id).expect("just created");
    object.set_position(position);
    object.set_scale(scale);
    assert!(engine.add_rigidbody(id, kind));
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_box_settles_on_floor_over_two_seconds() {
        let mut engine = engine();
        let floor = spawn(
            &mut engine,
            "floor",
            Vec3::zeros(),
            Vec3::new(20.0, 1.0, 20.0),
            ActorKind::Static,
        );
        let falling = spawn(
            &mut engine,
            "box",
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            ActorKind::Dynamic,
        );

        for _ in 0..120 {
            engine.tick(1.0 / 60.0);
        }

        let height = engine.scene().get(falling).expect("exists").transform().position.y;
        assert!(height > 0.9 && height < 3.0, "unexpected resting height {height}");
        assert_relative_eq!(
            engine.scene().get(floor).expect("exists").transform().position,
            Vec3::zeros()
        );
    }

    #[test]
    fn test_light_tracks_simulated_owner() {
        let mut engine = engine();
        let lamp = spawn(
            &mut engine,
            "lamp",
            Vec3::new(0.0, 8.0, 0.0),
            Vec3::new(0.5, 0.5, 0.5),
            ActorKind::Dynamic,
        );
        engine
            .scene_mut()
            .get_mut(lamp)
            .expect("exists")
            .add_component(LightComponent::new(Light::point(Vec3::new(1.0, 1.0, 1.0), 2.0, 12.0)))
            .expect("attached");

        for _ in 0..30 {
            engine.tick(1.0 / 60.0);
        }

        let object = engine.scene().get(lamp).expect("exists");
        let light = object.component::<LightComponent>().expect("attached").light();
        assert!(object.transform().position.y < 8.0);
        assert_relative_eq!(light.position, object.transform().position, epsilon = 1e-5);
        let expected = object
            .world_matrix()
            .transform_vector(&-Vec3::z())
            .normalize();
        assert_relative_eq!(light.direction, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_moving_object_teleports_actor_on_next_tick() {
        let mut engine = engine();
        let id = spawn(
            &mut engine,
            "marker",
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
            ActorKind::Static,
        );

        let rotation = Quat::from_axis_angle(&Vec3::y_axis(), 0.5);
        let object = engine.scene_mut().get_mut(id).expect("exists");
        object.set_position(Vec3::new(2.0, 0.0, -3.0));
        object.set_rotation(rotation);
        engine.tick(1.0 / 60.0);

        let (position, actual) = engine
            .scene()
            .get(id)
            .and_then(|object| object.component::<RigidbodyComponent>())
            .and_then(RigidbodyComponent::rigid_actor)
            .and_then(RigidActor::pose)
            .expect("live actor");
        assert_relative_eq!(position, Vec3::new(2.0, 0.0, -3.0), epsilon = 1e-5);
        assert!(actual.angle_to(&rotation) < 1e-3);
    }

    #[test]
    fn test_raycast_finds_object_by_layer() {
        let mut engine = engine();
        let id = engine.scene_mut().create_object("target");
        let object = engine.scene_mut().get_mut(id).expect("exists");
        object.set_layer_mask(LayerMask::ENEMY);
        object.set_position(Vec3::new(5.0, 0.0, 0.0));
        assert!(engine.add_rigidbody(id, ActorKind::Static));
        engine.tick(1.0 / 60.0);

        let hit = engine
            .physics()
            .raycast(Vec3::zeros(), Vec3::x(), 50.0, LayerMask::ENEMY)
            .expect("enemy in line of fire");
        assert_eq!(hit.object, id);
        assert_relative_eq!(hit.distance, 4.5, epsilon = 1e-4);
        assert!(engine
            .physics()
            .raycast(Vec3::zeros(), Vec3::x(), 50.0, LayerMask::PICKUP)
            .is_none());
    }

    #[test]
    fn test_destroying_object_removes_actor() {
        let mut engine = engine();
        let id = spawn(
            &mut engine,
            "temporary",
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
            ActorKind::Dynamic,
        );
        assert_eq!(engine.physics().actor_count(), 1);

        assert!(engine.scene_mut().destroy_object(id));
        assert_eq!(engine.physics().actor_count(), 0);
    }

    #[test]
    fn test_transferred_rigidbody_starts_from_new_owner() {
        let mut engine = engine();
        let source = spawn(
            &mut engine,
            "source",
            Vec3::new(0.0, 6.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            ActorKind::Dynamic,
        );
        let target = engine.scene_mut().create_object("target");
        engine
            .scene_mut()
            .get_mut(target)
            .expect("exists")
            .set_position(Vec3::new(3.0, 8.0, 0.0));

        engine
            .scene_mut()
            .transfer_component::<RigidbodyComponent>(source, target)
            .expect("moved");
        for _ in 0..20 {
            engine.tick(1.0 / 60.0);
        }

        let target_position = engine.scene().get(target).expect("exists").transform().position;
        let source_height = engine.scene().get(source).expect("exists").transform().position.y;
        assert!(
            target_position.y > 6.0 && target_position.y < 8.0,
            "actor did not start from the new owner: {target_position:?}"
        );
        assert_relative_eq!(target_position.x, 3.0, epsilon = 1e-4);
        assert_relative_eq!(source_height, 6.0);
    }

    #[test]
    fn test_transferred_static_rigidbody_agrees_with_new_owner() {
        let mut engine = engine();
        let source = spawn(
            &mut engine,
            "source",
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            ActorKind::Static,
        );
        let target = engine.scene_mut().create_object("target");
        engine
            .scene_mut()
            .get_mut(target)
            .expect("exists")
            .set_position(Vec3::new(-10.0, 0.0, 0.0));

        engine
            .scene_mut()
            .transfer_component::<RigidbodyComponent>(source, target)
            .expect("moved");
        for _ in 0..10 {
            engine.tick(1.0 / 60.0);
        }

        let (actor_position, _) = engine
            .scene()
            .get(target)
            .and_then(|object| object.component::<RigidbodyComponent>())
            .and_then(RigidbodyComponent::rigid_actor)
            .and_then(RigidActor::pose)
            .expect("live actor");
        let owner_position = engine.scene().get(target).expect("exists").transform().position;
        assert_relative_eq!(actor_position, owner_position, epsilon = 1e-5);

        let hit = engine
            .physics()
            .raycast(Vec3::new(-10.0, 5.0, 0.0), -Vec3::y(), 10.0, LayerMask::ALL)
            .expect("collider sits under its owner");
        assert_eq!(hit.object, target);
    }
}

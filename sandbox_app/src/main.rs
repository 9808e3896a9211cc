//! Falling-crate sandbox
//!
//! Drops a crate onto a floor, hangs a point light on it, swaps its collider
//! for a larger box halfway through and quits after a few seconds of
//! simulated time. Pass a TOML or RON config path as the first argument to
//! override the defaults.

use std::time::Duration;

use elixir_core::prelude::*;

const RUN_SECONDS: f32 = 4.0;
const RESIZE_AFTER_SECONDS: f32 = 2.0;
const FRAME_PACING: Duration = Duration::from_millis(16);

#[derive(Default)]
struct SandboxApp {
    crate_object: Option<GameObjectId>,
    elapsed: f32,
    frames: u32,
    resized: bool,
}

impl SandboxApp {
    fn crate_height(&self, engine: &Engine) -> Option<f32> {
        let id = self.crate_object?;
        engine.scene().get(id).map(|object| object.transform().position.y)
    }
}

impl Application for SandboxApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        log::info!("Building sandbox scene...");

        let floor = engine.scene_mut().create_object("floor");
        let object = engine
            .scene_mut()
            .get_mut(floor)
            .ok_or_else(|| AppError::Scene("floor vanished".to_string()))?;
        object.set_scale(Vec3::new(20.0, 1.0, 20.0));
        object.set_layer_mask(LayerMask::GROUND);
        if !engine.add_rigidbody(floor, ActorKind::Static) {
            return Err(AppError::Scene("floor has no rigidbody".to_string()));
        }

        let falling = engine.scene_mut().create_object("crate");
        let object = engine
            .scene_mut()
            .get_mut(falling)
            .ok_or_else(|| AppError::Scene("crate vanished".to_string()))?;
        object.set_position(Vec3::new(0.0, 6.0, 0.0));
        object
            .add_component(LightComponent::new(Light::point(Vec3::new(1.0, 0.8, 0.6), 3.0, 10.0)))
            .map_err(|error| AppError::Scene(error.to_string()))?;
        if !engine.add_rigidbody(falling, ActorKind::Dynamic) {
            return Err(AppError::Scene("crate has no rigidbody".to_string()));
        }

        self.crate_object = Some(falling);
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, delta_time: f32) -> Result<(), AppError> {
        self.elapsed += delta_time;
        self.frames += 1;

        if !self.resized && self.elapsed >= RESIZE_AFTER_SECONDS {
            if let Some(id) = self.crate_object {
                engine.resize_collider(id, Vec3::new(1.0, 1.0, 1.0));
                log::info!("Crate collider enlarged");
            }
            self.resized = true;
        }

        if self.frames % 60 == 0 {
            if let Some(height) = self.crate_height(engine) {
                log::info!("t={:.2}s crate height {:.3}", self.elapsed, height);
            }
        }

        if self.elapsed >= RUN_SECONDS {
            engine.quit();
        }

        std::thread::sleep(FRAME_PACING);
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        if let Some(height) = self.crate_height(engine) {
            log::info!("Crate came to rest at height {:.3} after {} frames", height, self.frames);
        }
    }
}

fn load_config() -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(EngineConfig::load_from_file(&path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let mut app = SandboxApp::default();
    Engine::run(config, &mut app)?;
    Ok(())
}

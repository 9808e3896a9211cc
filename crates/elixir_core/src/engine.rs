//! Core engine implementation

use std::sync::Arc;

use thiserror::Error;

use crate::{
    application::Application,
    components::RigidbodyComponent,
    config::{ConfigError, EngineConfig},
    crash::{self, CrashError, ShutdownHandles},
    foundation::{
        logging::Logger,
        math::Vec3,
        time::{FixedTimestep, Timer},
    },
    log_error, log_info, log_warn,
    physics::{ActorKind, PhysicsController, PhysicsError},
    scene::{GameObjectId, Scene},
    scripting::ScriptLoader,
};

/// Main engine struct
///
/// The engine owns the logger, the physics controller, the scene and the
/// script loader, and drives them once per frame through [`tick`](Self::tick).
pub struct Engine {
    logger: Arc<Logger>,
    physics: PhysicsController,
    scene: Scene,
    scripts: ScriptLoader,
    stepper: Option<FixedTimestep>,
    timer: Timer,
    shutdown: ShutdownHandles,
    config: EngineConfig,
    running: bool,
}

impl Engine {
    /// Create a new engine instance
    ///
    /// Validates the configuration, builds the logger and initializes
    /// physics. Script libraries that fail to load are logged, not fatal.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let logger = Arc::new(Logger::new(&config.logging));
        log_info!(logger, "Initializing engine...");

        let mut physics = PhysicsController::new(config.physics.clone(), Arc::clone(&logger));
        physics.init()?;

        let mut scripts = ScriptLoader::new(Arc::clone(&logger));
        for library in &config.scripts.libraries {
            scripts.load_library(library);
        }

        let stepper = config
            .timestep
            .fixed_delta
            .map(|step| FixedTimestep::new(step, config.timestep.max_substeps));
        let shutdown = ShutdownHandles::new(Arc::clone(&logger), physics.world_handle());

        Ok(Self {
            logger,
            physics,
            scene: Scene::new(),
            scripts,
            stepper,
            timer: Timer::new(),
            shutdown,
            config,
            running: true,
        })
    }

    /// Run the engine main loop with the given application
    ///
    /// Also routes the `log` facade into the engine logger and installs the
    /// crash handler; both can only happen once per process.
    pub fn run<T: Application>(config: EngineConfig, app: &mut T) -> Result<(), EngineError> {
        let mut engine = Self::new(config)?;

        Logger::install(&engine.logger)?;
        crash::install(engine.shutdown.clone())?;

        if let Err(error) = app.initialize(&mut engine) {
            engine.shutdown();
            return Err(EngineError::ApplicationError(format!(
                "App initialization: {error}"
            )));
        }

        log_info!(engine.logger, "Starting main loop...");
        engine.timer = Timer::new();

        let mut result = Ok(());
        while engine.running {
            engine.timer.update();
            let delta_time = engine.timer.delta_time();

            if let Err(error) = app.update(&mut engine, delta_time) {
                result = Err(EngineError::ApplicationError(format!("App update: {error}")));
                break;
            }

            engine.tick(delta_time);
        }

        app.cleanup(&mut engine);
        engine.shutdown();

        log_info!(engine.logger, "Engine shutdown complete");
        result
    }

    /// Advance one frame
    ///
    /// Components are updated first, then physics steps (fixed substeps or
    /// one variable step), then simulated poses are copied back into the
    /// scene.
    pub fn tick(&mut self, delta_time: f32) {
        self.scene.update(delta_time);

        match self.stepper.as_mut() {
            Some(stepper) => {
                let steps = stepper.advance(delta_time);
                for _ in 0..steps {
                    self.physics.simulate(stepper.step());
                }
                if stepper.dropped() > 0.0 {
                    log_warn!(
                        self.logger,
                        "Dropping {:.3}s of simulation time after {} substeps",
                        stepper.dropped(),
                        steps
                    );
                }
            }
            None => self.physics.simulate(delta_time),
        }

        self.scene.sync_from_physics();
    }

    /// Give a GameObject a rigidbody backed by a new actor
    ///
    /// Returns `false` (after logging) if the object is unknown, already has
    /// a rigidbody or the actor could not be created.
    pub fn add_rigidbody(&mut self, id: GameObjectId, kind: ActorKind) -> bool {
        let Some(object) = self.scene.get(id) else {
            log_error!(self.logger, "GameObject {:?} not found", id);
            return false;
        };
        if object.has_component::<RigidbodyComponent>() {
            log_warn!(self.logger, "GameObject '{}' already has a rigidbody", object.name());
            return false;
        }
        let Some(actor) = self.physics.add_actor(object, kind) else {
            return false;
        };

        match self
            .scene
            .get_mut(id)
            .map(|object| object.add_component(RigidbodyComponent::new(actor)))
        {
            Some(Ok(_)) => true,
            Some(Err(error)) => {
                log_error!(self.logger, "{}", error);
                false
            }
            None => false,
        }
    }

    /// Replace a GameObject's collision shapes with one box of half-extents `size`
    pub fn resize_collider(&mut self, id: GameObjectId, size: Vec3) {
        if let Some(object) = self.scene.get(id) {
            self.physics.resize_collider(size, object);
        }
    }

    /// Request the main loop to stop after the current frame
    pub fn quit(&mut self) {
        log_info!(self.logger, "Engine shutdown requested");
        self.running = false;
    }

    /// Orderly teardown: destroy the scene, release physics, flush the log
    ///
    /// Safe to call more than once; the crash handler shares the same
    /// completion flag.
    pub fn shutdown(&mut self) {
        if self.shutdown.is_complete() {
            return;
        }
        self.running = false;
        self.scene.clear();
        self.physics.release();
        crash::shutdown(&self.shutdown);
    }

    /// Whether the main loop keeps going
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// The engine logger
    pub const fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// The scene
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable access to the scene
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The physics controller
    pub const fn physics(&self) -> &PhysicsController {
        &self.physics
    }

    /// Mutable access to the physics controller
    pub fn physics_mut(&mut self) -> &mut PhysicsController {
        &mut self.physics
    }

    /// The script loader
    pub const fn scripts(&self) -> &ScriptLoader {
        &self.scripts
    }

    /// Mutable access to the script loader
    pub fn scripts_mut(&mut self) -> &mut ScriptLoader {
        &mut self.scripts
    }

    /// Handles the shutdown routine needs
    pub const fn shutdown_handles(&self) -> &ShutdownHandles {
        &self.shutdown
    }

    /// Frame timer
    pub const fn timer(&self) -> &Timer {
        &self.timer
    }

    /// The configuration the engine was built with
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Physics failed to initialize
    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    /// The `log` facade already has a logger
    #[error("Logger installation failed: {0}")]
    Logger(#[from] log::SetLoggerError),

    /// Crash handler installation failed
    #[error("Crash handler error: {0}")]
    Crash(#[from] CrashError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),
}

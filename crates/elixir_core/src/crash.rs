//! Crash handling
//!
//! Fatal faults (panics and termination signals) run the same orderly
//! shutdown as a normal exit: the physics world is released and the log is
//! flushed before the process goes away. Everything the shutdown routine
//! needs is passed in explicitly through [`ShutdownHandles`].
//!
//! Memory faults (SIGSEGV, SIGFPE, SIGILL) cannot be handled safely from
//! Rust and are left to the operating system.

use std::any::Any;
use std::backtrace::Backtrace;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::foundation::logging::Logger;
use crate::physics::WorldHandle;
use crate::{log_error, log_info, log_warn};

/// Crash handler installation errors
#[derive(thiserror::Error, Debug)]
pub enum CrashError {
    /// Signal handlers could not be registered
    #[error("Failed to register signal handlers: {0}")]
    Signals(#[from] std::io::Error),
}

/// Resources the shutdown routine tears down
#[derive(Clone, Debug)]
pub struct ShutdownHandles {
    logger: Arc<Logger>,
    world: WorldHandle,
    completed: Arc<AtomicBool>,
}

impl ShutdownHandles {
    /// Bundle the logger and the physics world for shutdown
    pub fn new(logger: Arc<Logger>, world: WorldHandle) -> Self {
        Self {
            logger,
            world,
            completed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether shutdown has already run
    pub fn is_complete(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    /// The logger shutdown reports through
    pub const fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

/// Release the physics world and flush the log
///
/// Runs at most once across all clones of `handles`; returns whether this
/// call did the work. Never blocks on the physics world: if it is locked
/// (for instance by the thread that panicked) it is left to the OS.
pub fn shutdown(handles: &ShutdownHandles) -> bool {
    if handles.completed.swap(true, Ordering::SeqCst) {
        return false;
    }

    match handles.world.try_release() {
        Some(true) => log_info!(handles.logger, "Physics world released"),
        Some(false) => {}
        None => log_warn!(handles.logger, "Physics world is busy; skipping release"),
    }

    log_info!(handles.logger, "Shutdown complete");
    handles.logger.flush();
    true
}

/// Install the panic hook and, on unix, the termination signal watcher
///
/// On a panic the payload, location and backtrace are logged, shutdown runs
/// and the process aborts. On SIGTERM, SIGINT, SIGHUP or SIGABRT the signal
/// is logged, shutdown runs and the process exits with the signal number.
pub fn install(handles: ShutdownHandles) -> Result<(), CrashError> {
    let logger = Arc::clone(&handles.logger);

    #[cfg(unix)]
    signals::spawn_watcher(handles.clone())?;

    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown location".to_string(), ToString::to_string);
        log_error!(
            handles.logger,
            "Panic at {}: {}",
            location,
            panic_message(info.payload())
        );

        log_backtrace(&handles.logger);
        shutdown(&handles);
        std::process::abort();
    }));

    log_info!(logger, "Crash handler installed");
    Ok(())
}

/// Log the current thread's stack trace at ERROR, one frame line per entry
///
/// Returns the number of lines logged.
pub fn log_backtrace(logger: &Logger) -> usize {
    let backtrace = Backtrace::force_capture().to_string();
    let mut logged = 0;
    for line in backtrace.lines() {
        log_error!(logger, "{}", line);
        logged += 1;
    }
    logged
}

/// Text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(unix)]
mod signals {
    use signal_hook::consts::{SIGABRT, SIGHUP, SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    use super::{log_backtrace, shutdown, CrashError, ShutdownHandles};
    use crate::log_error;

    pub(super) fn spawn_watcher(handles: ShutdownHandles) -> Result<(), CrashError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGHUP, SIGABRT])?;

        std::thread::Builder::new()
            .name("signal-watcher".to_string())
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    log_error!(handles.logger, "Signal {}", signal);
                    // Signals are delivered to this watcher, so the trace shows
                    // where shutdown was triggered rather than the interrupted code
                    log_backtrace(&handles.logger);
                    shutdown(&handles);
                    std::process::exit(signal);
                }
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;
    use crate::foundation::logging::LogLevel;
    use crate::foundation::math::Vec3;
    use crate::physics::PhysicsWorld;

    fn handles() -> ShutdownHandles {
        let logger = Arc::new(Logger::new(&LoggingConfig {
            echo_to_console: false,
            ..LoggingConfig::default()
        }));
        let world = WorldHandle::empty();
        world.install(PhysicsWorld::new(Vec3::zeros()));
        ShutdownHandles::new(logger, world)
    }

    #[test]
    fn test_shutdown_runs_once_across_clones() {
        let handles = handles();
        let clone = handles.clone();

        assert!(shutdown(&handles));
        assert!(!shutdown(&clone));
        assert!(clone.is_complete());
        assert!(!handles.world.is_live());

        let messages: Vec<String> = handles.logger().messages().into_iter().map(|m| m.message).collect();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].ends_with("Physics world released"));
        assert!(messages[1].ends_with("Shutdown complete"));
    }

    #[test]
    fn test_shutdown_skips_locked_world() {
        let handles = handles();
        let world = handles.world.clone();

        let ran = world.with(|_| shutdown(&handles));

        assert_eq!(ran, Some(true));
        assert!(world.is_live());
        assert!(handles.logger().messages()[0].message.contains("busy"));
    }

    #[test]
    fn test_backtrace_is_logged_at_error() {
        let handles = handles();

        let logged = log_backtrace(handles.logger());

        let messages = handles.logger().messages();
        assert!(logged > 0);
        assert_eq!(messages.len(), logged);
        assert!(messages.iter().all(|message| message.level == LogLevel::Error));
    }

    #[test]
    fn test_panic_message_extracts_payload() {
        let borrowed: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(7_u32);

        assert_eq!(panic_message(borrowed.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }
}

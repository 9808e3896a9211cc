//! Cross-module scenarios exercising the engine end to end

mod physics_sync;

//! Time management utilities

use std::time::Instant;

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Splits variable frame times into fixed simulation steps
///
/// Leftover time carries over to the next frame. When a frame would need
/// more than `max_steps` steps the surplus is dropped so a long stall does
/// not snowball into ever longer frames.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    max_steps: u32,
    accumulator: f32,
    dropped: f32,
}

impl FixedTimestep {
    /// Create an accumulator for the given step size
    pub fn new(step: f32, max_steps: u32) -> Self {
        Self {
            step,
            max_steps: max_steps.max(1),
            accumulator: 0.0,
            dropped: 0.0,
        }
    }

    /// Fixed step size in seconds
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Time carried over to the next frame
    pub fn accumulated(&self) -> f32 {
        self.accumulator
    }

    /// Simulation time discarded by the last [`advance`](Self::advance)
    pub fn dropped(&self) -> f32 {
        self.dropped
    }

    /// Add frame time and return how many fixed steps to run now
    pub fn advance(&mut self, delta_time: f32) -> u32 {
        self.dropped = 0.0;
        if !delta_time.is_finite() || delta_time <= 0.0 || self.step <= 0.0 {
            return 0;
        }

        self.accumulator += delta_time;

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }

        if steps == self.max_steps && self.accumulator >= self.step {
            let kept = self.accumulator % self.step;
            self.dropped = self.accumulator - kept;
            self.accumulator = kept;
        }

        steps
    }
}

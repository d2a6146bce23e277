use std::time::Instant;

/// The smoothing factor for the FPS calculation.
const SMOOTHING: f32 = 0.95;

/// A simple frame per second (FPS) counter.
///
/// # Examples
///
/// ```
/// use ircut_io::fps_counter::FpsCounter;
///
/// let mut fps_counter = FpsCounter::new();
///
/// for _ in 0..100 {
///    fps_counter.update();
/// }
/// ```
pub struct FpsCounter {
    last_time: Instant,
    fps: f32,
}

impl FpsCounter {
    /// Creates a new `FpsCounter`.
    pub fn new() -> Self {
        Self {
            last_time: Instant::now(),
            fps: 0.0,
        }
    }

    /// Returns the current smoothed FPS.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Registers a new frame and updates the FPS estimate.
    pub fn update(&mut self) {
        let now = Instant::now();
        let duration = now.duration_since(self.last_time);
        self.last_time = now;

        let secs = duration.as_secs_f32();
        if secs <= 0.0 {
            return;
        }

        let instant_fps = 1.0 / secs;
        self.fps = if self.fps == 0.0 {
            instant_fps
        } else {
            self.fps * SMOOTHING + instant_fps * (1.0 - SMOOTHING)
        };
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {

    #[test]
    fn test_fps_counter() {
        let mut fps_counter = super::FpsCounter::new();
        fps_counter.update();
        fps_counter.update();
        fps_counter.update();
        assert!(fps_counter.fps() >= 0.0);
    }
}

//! Edge detection on a sampled boolean signal

/// Tracks a boolean signal and flags transitions between consecutive samples.
///
/// `update` must be called exactly once per poll cycle; skipping a cycle or
/// sampling twice shifts the history and the edge flags become meaningless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDetector {
    current: bool,
    previous: bool,
    rising: bool,
    falling: bool,
}

impl EdgeDetector {
    /// Create a detector that has been sitting at `level`.
    pub const fn new(level: bool) -> Self {
        Self::seeded(level, level)
    }

    /// Create a detector from two consecutive samples without flagging the
    /// transition between them.
    pub const fn seeded(previous: bool, current: bool) -> Self {
        Self {
            current,
            previous,
            rising: false,
            falling: false,
        }
    }

    pub fn update(&mut self, level: bool) {
        self.previous = self.current;
        self.current = level;
        self.rising = !self.previous && self.current;
        self.falling = self.previous && !self.current;
    }

    pub const fn level(&self) -> bool {
        self.current
    }

    pub const fn previous(&self) -> bool {
        self.previous
    }

    /// Low → high on the last update.
    pub const fn rising(&self) -> bool {
        self.rising
    }

    /// High → low on the last update.
    pub const fn falling(&self) -> bool {
        self.falling
    }
}

/// The on-screen commentary line and its attention pulse.
///
/// The host renders `message()` and restarts its pulse animation whenever
/// `generation()` changes, then reports back through `animation_end()`.
#[derive(Debug, Clone, Default)]
pub struct Commentary {
    message: String,
    generation: u64,
    pulsing: bool,
}

impl Commentary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the message and restart the pulse. Identical text is ignored.
    /// Returns whether anything changed.
    pub fn update_message(&mut self, text: &str) -> bool {
        if self.message == text {
            return false;
        }
        log::debug!("commentary: {}", text);
        self.message.clear();
        self.message.push_str(text);
        self.generation += 1;
        self.pulsing = true;
        true
    }

    pub fn animation_end(&mut self) {
        self.pulsing = false;
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Incremented once per pulse restart.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pulsing(&self) -> bool {
        self.pulsing
    }
}

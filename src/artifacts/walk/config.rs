use derive_new::new;

/// Tuning knobs of a walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct WalkConfig {
    /// Keep raw commit bodies after parsing
    #[new(value = "true")]
    pub retain_body: bool,
    /// Extra uninteresting commits popped once every pending commit is
    /// uninteresting and older than the last produced one
    #[new(value = "0")]
    pub over_scan: usize,
    /// Commits buffered to absorb clock skew before uninteresting commits
    /// are filtered out
    #[new(value = "6")]
    pub delay_window: usize,
}

impl Default for WalkConfig {
    fn default() -> Self {
        WalkConfig::new()
    }
}

impl WalkConfig {
    pub fn with_retain_body(mut self, retain_body: bool) -> Self {
        self.retain_body = retain_body;
        self
    }

    pub fn with_over_scan(mut self, over_scan: usize) -> Self {
        self.over_scan = over_scan;
        self
    }

    pub fn with_delay_window(mut self, delay_window: usize) -> Self {
        self.delay_window = delay_window;
        self
    }
}

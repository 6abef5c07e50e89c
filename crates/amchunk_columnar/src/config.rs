//! Configuration for column decoding.

/// Default cap on values expanded from value-meta runs.
pub const DEFAULT_MAX_EXPANDED_VALUES: usize = 1 << 20;

/// Limits applied while decoding column bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Maximum number of meta entries a single value-meta column may
    /// expand to. Runs beyond this are reported instead of allocated.
    pub max_expanded_values: usize,
}

impl DecodeConfig {
    /// Creates a configuration with default limits.
    pub fn new() -> Self {
        Self {
            max_expanded_values: DEFAULT_MAX_EXPANDED_VALUES,
        }
    }

    /// Sets the maximum number of expanded meta entries.
    pub fn with_max_expanded_values(mut self, max: usize) -> Self {
        self.max_expanded_values = max;
        self
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

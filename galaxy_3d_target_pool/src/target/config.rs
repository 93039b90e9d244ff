/// Pool configuration
///
/// The pool never evicts idle targets, so its memory grows with the number of
/// distinct descriptors requested at the same time. `growth_warning_threshold`
/// only makes that growth visible in the log.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Name used as log source (`galaxy3d::{label}`)
    pub label: String,
    /// Warn once when a single kind exceeds this many targets (0 = never)
    pub growth_warning_threshold: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            label: "TargetPool".to_string(),
            growth_warning_threshold: 64,
        }
    }
}

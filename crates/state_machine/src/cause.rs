#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransitionCause {
    // Rescan results
    LevelAcquired,
    LevelReplaced,

    // Validation
    LevelInvalidated,

    // Context resets
    TimeframeChanged,
    ConfigChanged,
}

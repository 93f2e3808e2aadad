use primitives::types::Price;

use levels::detect::Rejection;
use levels::key_level::KeyLevel;
use state_machine::cause::TransitionCause;
use state_machine::state::DetectorState;

use crate::config::ConfigError;

/// Почему запущен rescan
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RescanReason {
    FirstRun,
    Timer,
    TimeframeChange,
    ConfigChange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ConfigSubstituted(ConfigError),
    RescanTriggered {
        reason: RescanReason,
    },
    InsufficientData {
        have: usize,
        need: usize,
    },
    LevelAccepted(KeyLevel),
    LevelRejected(Rejection),
    Transition {
        from: DetectorState,
        cause: TransitionCause,
        to: DetectorState,
    },
    ApproachAlert {
        level: KeyLevel,
        price: Price,
        distance: f64,
    },
    HourlyStats {
        hour: i64,
        accepted: u32,
        rejected: u32,
    },
}

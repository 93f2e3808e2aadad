use crate::cause::TransitionCause;
use crate::state::DetectorState;

#[derive(Debug, PartialEq, Eq)]
pub enum TransitionError {
    IllegalTransition {
        from: DetectorState,
        cause: TransitionCause,
    },
}

pub fn transition(
    state: DetectorState,
    cause: TransitionCause,
) -> Result<DetectorState, TransitionError> {
    let next = match (state, cause) {
        // --- Idle -----------------------------------------------------------
        (DetectorState::Idle, TransitionCause::LevelAcquired) => DetectorState::Active,

        // --- Active ---------------------------------------------------------
        (DetectorState::Active, TransitionCause::LevelReplaced) => DetectorState::Active,
        (DetectorState::Active, TransitionCause::LevelInvalidated) => DetectorState::Idle,

        // --- Resets (из любого состояния) -----------------------------------
        (_, TransitionCause::TimeframeChanged) => DetectorState::Idle,
        (_, TransitionCause::ConfigChanged) => DetectorState::Idle,

        // --- Illegal --------------------------------------------------------
        _ => return Err(TransitionError::IllegalTransition { from: state, cause }),
    };

    Ok(next)
}

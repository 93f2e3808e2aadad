use thiserror::Error;

/// Ошибки прохода детекции.
///
/// "Нет кандидатов" сюда не входит: это нормальный исход (пустой store).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectError {
    #[error("insufficient data: have {have} bars, need {need}")]
    InsufficientData { have: usize, need: usize },
}

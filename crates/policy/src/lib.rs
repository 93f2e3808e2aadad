pub mod profile;
pub mod strength;

pub use profile::{InstrumentClass, ParameterProfile, StrengthCurve, resolve_profile};
pub use strength::{RejectReason, ScoreBreakdown};

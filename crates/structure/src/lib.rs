pub mod candle;
pub mod pivot;
pub mod touch;
pub mod volume;

pub use candle::{Candle, Timeframe};
pub use touch::{LevelKind, TouchQualityStats};

use std::cmp::Ordering;
use std::fmt;

use primitives::types::{Price, TimestampMs};
use structure::touch::LevelKind;

/// Принятый ключевой уровень. Создаётся только после прохождения порогов,
/// дальше не мутируется (store пересобирается целиком на каждом rescan).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KeyLevel {
    pub price: Price,
    pub kind: LevelKind,
    pub first_touch: TimestampMs,
    pub last_touch: TimestampMs,
    pub touch_count: usize,
    /// [0.45, 0.98]
    pub strength: f64,
    pub volume_confirmed: bool,
    pub volume_ratio: f64,
}

impl KeyLevel {
    /// Порядок "кто сильнее": сила, при равенстве более свежее касание
    pub fn cmp_strength(&self, other: &KeyLevel) -> Ordering {
        self.strength
            .total_cmp(&other.strength)
            .then_with(|| self.last_touch.cmp(&other.last_touch))
    }

    pub fn cmp_price(&self, other: &KeyLevel) -> Ordering {
        self.price.0.total_cmp(&other.price.0)
    }
}

impl fmt::Display for KeyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{} touches={} strength={:.4}",
            self.kind, self.price, self.touch_count, self.strength
        )
    }
}

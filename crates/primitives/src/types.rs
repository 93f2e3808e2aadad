//! Core domain types.
//!
//! Цель:
//! - запретить "голые" f64 для цен, объёмов и времени
//! - зафиксировать единицы измерения
//! - сделать ошибки очевидными на уровне типов

use std::fmt;

/// Цена инструмента (EURUSD, US30 и т.п.)
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Price(pub f64);

/// Объём бара (tick или real volume, как отдаёт площадка)
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Qty(pub f64);

/// Время в миллисекундах (unix epoch)
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimestampMs(pub i64);

//
// --- Conversions & helpers --------------------------------------------------
//

impl Price {
    /// Расстояние между двумя ценами (всегда >= 0)
    pub fn distance(self, other: Price) -> f64 {
        (self.0 - other.0).abs()
    }

    pub fn is_valid(self) -> bool {
        self.0.is_finite() && self.0 > 0.0
    }
}

impl TimestampMs {
    /// Номер часа от epoch (для почасовых счётчиков)
    pub fn hour_bucket(self) -> i64 {
        self.0.div_euclid(3_600_000)
    }

    /// Сколько миллисекунд прошло с `earlier` (отрицательное не бывает)
    pub fn millis_since(self, earlier: TimestampMs) -> i64 {
        self.0.saturating_sub(earlier.0).max(0)
    }
}

//
// --- Display (для логов) ----------------------------------------------------
//

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}", self.0)
    }
}

impl fmt::Display for Qty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl fmt::Display for TimestampMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        assert_eq!(Price(1.2050).distance(Price(1.2000)), Price(1.2000).distance(Price(1.2050)));
    }

    #[test]
    fn hour_bucket_rolls_on_boundary() {
        assert_eq!(TimestampMs(3_599_999).hour_bucket(), 0);
        assert_eq!(TimestampMs(3_600_000).hour_bucket(), 1);
    }

    #[test]
    fn millis_since_never_negative() {
        assert_eq!(TimestampMs(10).millis_since(TimestampMs(20)), 0);
        assert_eq!(TimestampMs(20).millis_since(TimestampMs(10)), 10);
    }
}

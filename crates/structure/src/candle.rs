use primitives::types::TimestampMs;
use primitives::types::{Price, Qty};

#[derive(Debug, Copy, Clone)]
pub struct Candle {
    pub ts: TimestampMs,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Qty,
}

/// Таймфрейм бара: 9 корзин от месячного до минутного
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Timeframe {
    Min1,
    Min5,
    Min15,
    Min30,
    Hour1,
    Hour4,
    Day1,
    Week1,
    Month1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Timeframe::Min1,
        Timeframe::Min5,
        Timeframe::Min15,
        Timeframe::Min30,
        Timeframe::Hour1,
        Timeframe::Hour4,
        Timeframe::Day1,
        Timeframe::Week1,
        Timeframe::Month1,
    ];

    /// Средняя корзина, используется как fallback
    pub const DEFAULT: Timeframe = Timeframe::Hour1;

    pub fn as_secs(self) -> i64 {
        match self {
            Timeframe::Min1 => 60,
            Timeframe::Min5 => 5 * 60,
            Timeframe::Min15 => 15 * 60,
            Timeframe::Min30 => 30 * 60,
            Timeframe::Hour1 => 3_600,
            Timeframe::Hour4 => 4 * 3_600,
            Timeframe::Day1 => 86_400,
            Timeframe::Week1 => 7 * 86_400,
            // месяц считаем как 30 дней
            Timeframe::Month1 => 30 * 86_400,
        }
    }

    pub fn as_millis(self) -> i64 {
        self.as_secs() * 1000
    }

    pub fn from_minutes(minutes: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|tf| tf.as_secs() == minutes * 60)
    }

    /// "H1", "1h", "60" -> Hour1
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(minutes) = s.parse::<i64>() {
            return Self::from_minutes(minutes);
        }

        match s.to_ascii_uppercase().as_str() {
            "M1" | "1M" => Some(Timeframe::Min1),
            "M5" | "5M" => Some(Timeframe::Min5),
            "M15" | "15M" => Some(Timeframe::Min15),
            "M30" | "30M" => Some(Timeframe::Min30),
            "H1" | "1H" => Some(Timeframe::Hour1),
            "H4" | "4H" => Some(Timeframe::Hour4),
            "D1" | "1D" => Some(Timeframe::Day1),
            "W1" | "1W" => Some(Timeframe::Week1),
            "MN1" | "MN" | "1MN" => Some(Timeframe::Month1),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::Min1 => "M1",
            Timeframe::Min5 => "M5",
            Timeframe::Min15 => "M15",
            Timeframe::Min30 => "M30",
            Timeframe::Hour1 => "H1",
            Timeframe::Hour4 => "H4",
            Timeframe::Day1 => "D1",
            Timeframe::Week1 => "W1",
            Timeframe::Month1 => "MN1",
        }
    }
}

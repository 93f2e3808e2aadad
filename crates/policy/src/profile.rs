use structure::candle::Timeframe;
use structure::pivot::SwingParams;
use structure::touch::TouchParams;
use structure::volume::VolumeParams;

/// Класс инструмента: от него зависят таблицы порогов
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InstrumentClass {
    /// Индексы (US30, NAS100 ...)
    Index,
    /// Валютные пары (EURUSD ...)
    CurrencyPair,
}

impl InstrumentClass {
    /// Шаг цены по умолчанию (point)
    pub fn default_point(self) -> f64 {
        match self {
            InstrumentClass::Index => 0.1,
            InstrumentClass::CurrencyPair => 0.00001,
        }
    }

    pub fn strength_curve(self) -> StrengthCurve {
        match self {
            InstrumentClass::Index => StrengthCurve::Steep,
            InstrumentClass::CurrencyPair => StrengthCurve::Flat,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "index" | "indices" => Some(InstrumentClass::Index),
            "fx" | "forex" | "currency" | "currency_pair" => Some(InstrumentClass::CurrencyPair),
            _ => None,
        }
    }
}

/// Кривая бонуса силы уровня по таймфрейму.
/// Индексы сильнее награждают старшие ТФ, валюты почти плоские.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StrengthCurve {
    Steep,
    Flat,
}

impl StrengthCurve {
    pub fn timeframe_bonus(self, tf: Timeframe) -> f64 {
        match (self, tf) {
            (StrengthCurve::Steep, Timeframe::Month1) => 0.10,
            (StrengthCurve::Steep, Timeframe::Week1) => 0.08,
            (StrengthCurve::Steep, Timeframe::Day1) => 0.06,
            (StrengthCurve::Steep, Timeframe::Hour4) => 0.04,
            (StrengthCurve::Steep, Timeframe::Hour1) => 0.02,
            (StrengthCurve::Steep, Timeframe::Min30) => 0.01,
            (StrengthCurve::Steep, _) => 0.0,

            (StrengthCurve::Flat, Timeframe::Month1 | Timeframe::Week1) => 0.05,
            (StrengthCurve::Flat, Timeframe::Day1) => 0.04,
            (StrengthCurve::Flat, Timeframe::Hour4) => 0.03,
            (StrengthCurve::Flat, Timeframe::Hour1 | Timeframe::Min30) => 0.02,
            (StrengthCurve::Flat, Timeframe::Min15 | Timeframe::Min5) => 0.01,
            (StrengthCurve::Flat, Timeframe::Min1) => 0.0,
        }
    }
}

/// Разрешённые параметры детекции для пары (инструмент, таймфрейм)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParameterProfile {
    pub instrument: InstrumentClass,
    pub timeframe: Timeframe,

    pub lookback_bars: usize,
    /// (0, 1]
    pub min_strength: f64,
    /// Допуск касания, в единицах цены
    pub touch_zone: f64,
    pub min_touches: usize,
    pub max_bounce_delay_bars: usize,

    /// Минимальная амплитуда свинга, в единицах цены
    pub min_amplitude: f64,
    /// Полуширина окна экстремума (2..=5)
    pub swing_window: usize,
    /// Зона дедупликации = touch_zone * proximity_mult
    pub proximity_mult: f64,
    pub timeframe_bonus: f64,
}

impl ParameterProfile {
    pub fn proximity_zone(&self) -> f64 {
        self.touch_zone * self.proximity_mult
    }

    /// Сколько баров нужно для полного прохода
    pub fn required_bars(&self) -> usize {
        self.lookback_bars + self.max_bounce_delay_bars
    }

    pub fn swing_params(&self) -> SwingParams {
        SwingParams {
            min_amplitude: self.min_amplitude,
            window: self.swing_window,
        }
    }

    pub fn touch_params(&self, volume: VolumeParams) -> TouchParams {
        TouchParams {
            touch_zone: self.touch_zone,
            lookback: self.lookback_bars,
            max_bounce_delay: self.max_bounce_delay_bars,
            volume,
        }
    }

    /// Период в мс, после которого последнее касание считается протухшим
    pub fn stale_after_ms(&self) -> i64 {
        self.lookback_bars as i64 * self.timeframe.as_millis()
    }
}

/// Строка таблицы: zone, lookback, min_strength, min_touches, max_bounce_delay
type Row = (f64, usize, f64, usize, usize);

fn currency_row(tf: Timeframe) -> Row {
    match tf {
        Timeframe::Month1 => (0.0150, 60, 0.55, 2, 3),
        Timeframe::Week1 => (0.0080, 104, 0.55, 2, 4),
        Timeframe::Day1 => (0.0050, 150, 0.55, 2, 5),
        Timeframe::Hour4 => (0.0030, 180, 0.55, 2, 6),
        Timeframe::Hour1 => (0.0025, 240, 0.55, 2, 8),
        Timeframe::Min30 => (0.0015, 240, 0.60, 2, 8),
        Timeframe::Min15 => (0.0010, 300, 0.60, 3, 10),
        Timeframe::Min5 => (0.0006, 300, 0.65, 3, 10),
        Timeframe::Min1 => (0.0003, 360, 0.65, 3, 12),
    }
}

fn index_row(tf: Timeframe) -> Row {
    match tf {
        Timeframe::Month1 => (400.0, 60, 0.55, 2, 3),
        Timeframe::Week1 => (250.0, 104, 0.55, 2, 4),
        Timeframe::Day1 => (150.0, 150, 0.55, 2, 5),
        Timeframe::Hour4 => (80.0, 180, 0.58, 2, 6),
        Timeframe::Hour1 => (50.0, 240, 0.60, 2, 8),
        Timeframe::Min30 => (35.0, 240, 0.60, 2, 8),
        Timeframe::Min15 => (25.0, 300, 0.62, 3, 10),
        Timeframe::Min5 => (15.0, 300, 0.65, 3, 10),
        Timeframe::Min1 => (8.0, 360, 0.65, 3, 12),
    }
}

/// Амплитуда свинга в пунктах
fn amplitude_points(tf: Timeframe) -> f64 {
    match tf {
        Timeframe::Month1 => 200.0,
        Timeframe::Week1 => 120.0,
        Timeframe::Day1 => 60.0,
        Timeframe::Hour4 => 30.0,
        Timeframe::Hour1 => 20.0,
        Timeframe::Min30 => 12.0,
        Timeframe::Min15 => 8.0,
        Timeframe::Min5 => 6.0,
        Timeframe::Min1 => 4.0,
    }
}

fn swing_window(tf: Timeframe) -> usize {
    match tf {
        Timeframe::Month1 | Timeframe::Week1 => 5,
        Timeframe::Day1 | Timeframe::Hour4 => 4,
        Timeframe::Hour1 | Timeframe::Min30 | Timeframe::Min15 => 3,
        Timeframe::Min5 | Timeframe::Min1 => 2,
    }
}

fn proximity_mult(tf: Timeframe) -> f64 {
    match tf {
        Timeframe::Min1 | Timeframe::Min5 => 1.0,
        Timeframe::Min15 | Timeframe::Min30 => 1.25,
        Timeframe::Hour1 | Timeframe::Hour4 => 1.5,
        Timeframe::Day1 => 1.75,
        Timeframe::Week1 | Timeframe::Month1 => 2.0,
    }
}

/// Чистый lookup профиля. `point`: шаг цены инструмента.
pub fn resolve_profile(instrument: InstrumentClass, tf: Timeframe, point: f64) -> ParameterProfile {
    let (touch_zone, lookback_bars, min_strength, min_touches, max_bounce_delay_bars) = match instrument {
        InstrumentClass::Index => index_row(tf),
        InstrumentClass::CurrencyPair => currency_row(tf),
    };

    let point = if point.is_finite() && point > 0.0 {
        point
    } else {
        instrument.default_point()
    };

    ParameterProfile {
        instrument,
        timeframe: tf,
        lookback_bars,
        min_strength,
        touch_zone,
        min_touches,
        max_bounce_delay_bars,
        min_amplitude: amplitude_points(tf) * point,
        swing_window: swing_window(tf),
        proximity_mult: proximity_mult(tf),
        timeframe_bonus: instrument.strength_curve().timeframe_bonus(tf),
    }
}

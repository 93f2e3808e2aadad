use primitives::types::{Price, TimestampMs};
use structure::touch::TouchQualityStats;

use crate::profile::ParameterProfile;

pub const MIN_STRENGTH: f64 = 0.45;
pub const MAX_STRENGTH: f64 = 0.98;
/// Максимальный детерминированный шум для разведения равных уровней
pub const MAX_JITTER: f64 = 0.0005;

const CONSISTENCY_WEIGHT: f64 = 0.10;
const SPEED_WEIGHT: f64 = 0.05;
const VOLUME_BOUNCE_BONUS: f64 = 0.05;

/// Почему уровень не принят
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RejectReason {
    TooFewTouches,
    BelowMinStrength,
    /// Рядом уже есть уровень (дедупликация в store)
    Duplicate,
    /// Вытеснен более сильными при превышении лимита
    CapTruncated,
}

/// Разложение итоговой силы (для логов и тестов)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub touch_base: f64,
    pub recency: f64,
    pub duration: f64,
    pub instrument_bonus: f64,
    pub quality_bonus: f64,
    pub volume_bonus: f64,
    pub jitter: f64,
    pub strength: f64,
}

/// База по числу касаний
pub fn touch_base(count: usize) -> f64 {
    match count {
        0 | 1 => 0.30,
        2 => 0.50,
        3 => 0.70,
        4 => 0.85,
        n => (0.90 + 0.01 * (n - 5) as f64).min(0.95),
    }
}

/// Модификатор свежести: сколько баров прошло с последнего касания
pub fn recency_modifier(elapsed_bars: f64, lookback: usize) -> f64 {
    let r = elapsed_bars / lookback.max(1) as f64;

    if r <= 0.125 {
        0.30
    } else if r <= 0.25 {
        0.20
    } else if r <= 0.5 {
        0.10
    } else if r <= 1.0 {
        0.0
    } else {
        -0.60
    }
}

/// Бонус за длительность жизни уровня
pub fn duration_bonus(span_bars: f64, lookback: usize) -> f64 {
    let r = span_bars / lookback.max(1) as f64;

    if r >= 0.75 {
        0.35
    } else if r >= 0.5 {
        0.25
    } else if r >= 0.25 {
        0.15
    } else if r >= 0.125 {
        0.05
    } else {
        0.0
    }
}

/// Качество касаний: стабильность отскоков + скорость + объём
pub fn quality_bonus(stats: &TouchQualityStats, max_delay: usize) -> f64 {
    if stats.touch_count == 0 {
        return 0.0;
    }

    let consistency = if stats.max_bounce_size > 0.0 {
        (stats.avg_bounce_strength / stats.max_bounce_size).clamp(0.0, 1.0) * CONSISTENCY_WEIGHT
    } else {
        0.0
    };

    let typical_delay = (stats.quickest_bounce_bars + stats.slowest_bounce_bars) as f64 / 2.0;
    let speed = (1.0 - typical_delay / max_delay.max(1) as f64).clamp(0.0, 1.0) * SPEED_WEIGHT;

    let volume = if stats.confirmed_bounces > 0 {
        VOLUME_BOUNCE_BONUS
    } else {
        0.0
    };

    consistency + speed + volume
}

/// Детерминированный шум от цены, всегда < MAX_JITTER
pub fn price_jitter(price: Price) -> f64 {
    let key = (price.0 * 1e5).round() as i64;
    key.rem_euclid(1000) as f64 * (MAX_JITTER / 1000.0)
}

fn bars_between(later: TimestampMs, earlier: TimestampMs, bar_ms: i64) -> f64 {
    later.millis_since(earlier) as f64 / bar_ms.max(1) as f64
}

/// Полный расчёт силы уровня.
///
/// `now`: время самого свежего бара. `volume_bonus`: из volume confirmation
/// свинг-бара.
pub fn score(
    price: Price,
    stats: &TouchQualityStats,
    now: TimestampMs,
    profile: &ParameterProfile,
    volume_bonus: f64,
) -> ScoreBreakdown {
    let bar_ms = profile.timeframe.as_millis();
    let lookback = profile.lookback_bars;

    let touch_base = touch_base(stats.touch_count);

    let recency = match stats.last_touch {
        Some(last) => recency_modifier(bars_between(now, last, bar_ms), lookback),
        None => recency_modifier(f64::INFINITY, lookback),
    };

    let duration = match (stats.first_touch, stats.last_touch) {
        (Some(first), Some(last)) => duration_bonus(bars_between(last, first, bar_ms), lookback),
        _ => 0.0,
    };

    let instrument_bonus = profile.timeframe_bonus;
    let quality_bonus = quality_bonus(stats, profile.max_bounce_delay_bars);
    let volume_bonus = volume_bonus.max(0.0);

    let raw = (touch_base
        * (1.0 + recency + duration + instrument_bonus + quality_bonus)
        * (1.0 + volume_bonus))
        .min(MAX_STRENGTH);

    let jitter = price_jitter(price);
    let strength = (raw + jitter).clamp(MIN_STRENGTH, MAX_STRENGTH);

    ScoreBreakdown {
        touch_base,
        recency,
        duration,
        instrument_bonus,
        quality_bonus,
        volume_bonus,
        jitter,
        strength,
    }
}

/// Пороги профиля: касания и сила
pub fn check_thresholds(
    touch_count: usize,
    strength: f64,
    profile: &ParameterProfile,
) -> Result<(), RejectReason> {
    if touch_count < profile.min_touches {
        return Err(RejectReason::TooFewTouches);
    }
    if strength < profile.min_strength {
        return Err(RejectReason::BelowMinStrength);
    }
    Ok(())
}

use primitives::types::{Price, Qty, TimestampMs};

use crate::candle::Candle;
use crate::volume::{VolumeParams, volume_confirmation};

/// Сколько подряд почти-дублей касания допускаем
pub const MAX_NEAR_DUPLICATES: u32 = 2;

/// Касание ближе 20% зоны к предыдущему считается почти-дублем
const NEAR_DUPLICATE_FRAC: f64 = 0.2;
/// Уход дальше 3 зон сбрасывает счётчик почти-дублей
const RESET_ZONES: f64 = 3.0;
/// Минимальный отскок: 30% зоны
const MIN_BOUNCE_FRAC: f64 = 0.3;

/// Сторона уровня
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LevelKind {
    Support,
    Resistance,
}

impl LevelKind {
    /// Экстремум бара, которым он "касается" уровня
    pub fn touching_extreme(self, c: &Candle) -> Price {
        match self {
            LevelKind::Resistance => c.high,
            LevelKind::Support => c.low,
        }
    }

    /// Насколько противоположный экстремум ушёл от уровня
    pub fn move_away(self, c: &Candle, level: Price) -> f64 {
        match self {
            LevelKind::Resistance => level.0 - c.low.0,
            LevelKind::Support => c.high.0 - level.0,
        }
    }
}

#[derive(Debug, Copy, Clone)]
pub struct TouchParams {
    /// Допуск касания, в единицах цены
    pub touch_zone: f64,
    pub lookback: usize,
    pub max_bounce_delay: usize,
    pub volume: VolumeParams,
}

/// Агрегаты по принятым касаниям одного уровня
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct TouchQualityStats {
    pub touch_count: usize,
    pub avg_bounce_strength: f64,
    pub avg_bounce_volume: f64,
    pub max_bounce_size: f64,
    pub quickest_bounce_bars: usize,
    pub slowest_bounce_bars: usize,
    /// Отскоки, подтверждённые всплеском объёма
    pub confirmed_bounces: usize,
    pub first_touch: Option<TimestampMs>,
    pub last_touch: Option<TimestampMs>,
}

/// Чистый отскок после касания
#[derive(Debug, Copy, Clone)]
pub struct Bounce {
    pub size: f64,
    pub bars: usize,
    pub volume: Qty,
    pub volume_confirmed: bool,
}

/// Ищем отскок в барах ПОСЛЕ касания (newest-first: индексы i-1, i-2, ...).
///
/// Бар, чей экстремум снова в зоне касания, заканчивает поиск: до отскока
/// касание "грязное" (серия баров в зоне считается одним касанием, его
/// засчитает последний бар серии), после отскока размер больше не растёт.
pub fn find_bounce(
    candles: &[Candle],
    i: usize,
    level: Price,
    kind: LevelKind,
    params: TouchParams,
) -> Option<Bounce> {
    let zone = params.touch_zone;
    let min_bounce = zone * MIN_BOUNCE_FRAC;
    let max_k = params.max_bounce_delay.min(i);

    let mut found: Option<Bounce> = None;

    for k in 1..=max_k {
        let j = i - k;
        let bar = &candles[j];

        if kind.touching_extreme(bar).distance(level) <= zone {
            break;
        }

        let away = kind.move_away(bar, level);
        match found.as_mut() {
            None if away >= min_bounce => {
                found = Some(Bounce {
                    size: away,
                    bars: k,
                    volume: bar.volume,
                    volume_confirmed: volume_confirmation(candles, j, params.volume).confirmed,
                });
            }
            None => {}
            Some(b) => b.size = b.size.max(away),
        }
    }

    found
}

/// Пересчёт касаний уровня по окну lookback.
///
/// Проход хронологический (от старого бара к новому). Недостаточно
/// баров -> touch_count = 0, это не ошибка.
pub fn analyze_touches(
    candles: &[Candle],
    level: Price,
    kind: LevelKind,
    params: TouchParams,
) -> TouchQualityStats {
    let zone = params.touch_zone;
    if candles.len() < params.lookback || params.lookback == 0 || zone <= 0.0 {
        return TouchQualityStats::default();
    }

    let mut stats = TouchQualityStats::default();
    let mut bounce_sum = 0.0;
    let mut volume_sum = 0.0;

    let mut last_touch_price: Option<Price> = None;
    let mut near_dupes = 0u32;

    for i in (0..params.lookback).rev() {
        let bar = &candles[i];

        if bar.close.distance(level) > zone * RESET_ZONES {
            near_dupes = 0;
        }

        let extreme = kind.touching_extreme(bar);
        if extreme.distance(level) > zone {
            continue;
        }

        let near_dup = last_touch_price
            .is_some_and(|p| p.distance(extreme) < zone * NEAR_DUPLICATE_FRAC);

        if near_dup && near_dupes >= MAX_NEAR_DUPLICATES {
            continue;
        }

        let Some(bounce) = find_bounce(candles, i, level, kind, params) else {
            continue;
        };

        near_dupes = if near_dup { near_dupes + 1 } else { 0 };
        last_touch_price = Some(extreme);

        if stats.touch_count == 0 {
            stats.first_touch = Some(bar.ts);
            stats.quickest_bounce_bars = bounce.bars;
            stats.slowest_bounce_bars = bounce.bars;
        }
        stats.last_touch = Some(bar.ts);
        stats.touch_count += 1;

        bounce_sum += bounce.size;
        volume_sum += bounce.volume.0;
        stats.max_bounce_size = stats.max_bounce_size.max(bounce.size);
        stats.quickest_bounce_bars = stats.quickest_bounce_bars.min(bounce.bars);
        stats.slowest_bounce_bars = stats.slowest_bounce_bars.max(bounce.bars);
        if bounce.volume_confirmed {
            stats.confirmed_bounces += 1;
        }
    }

    if stats.touch_count > 0 {
        stats.avg_bounce_strength = bounce_sum / stats.touch_count as f64;
        stats.avg_bounce_volume = volume_sum / stats.touch_count as f64;
    }

    stats
}

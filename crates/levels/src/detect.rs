use primitives::types::Price;

use policy::profile::ParameterProfile;
use policy::strength::{RejectReason, check_thresholds, score};

use structure::candle::Candle;
use structure::pivot::{SwingKind, find_swings};
use structure::touch::{LevelKind, analyze_touches};
use structure::volume::{VolumeParams, volume_confirmation};

use crate::error::DetectError;
use crate::key_level::KeyLevel;
use crate::store::{InsertOutcome, LevelStore};

/// Параметры прохода, не зависящие от профиля
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DetectParams {
    pub volume: VolumeParams,
    pub max_levels_per_kind: usize,
}

impl Default for DetectParams {
    fn default() -> Self {
        Self {
            volume: VolumeParams::default(),
            max_levels_per_kind: crate::store::DEFAULT_MAX_LEVELS,
        }
    }
}

/// Отброшенный кандидат (для диагностики)
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rejection {
    pub price: Price,
    pub kind: LevelKind,
    pub reason: RejectReason,
    pub strength: f64,
    pub touch_count: usize,
}

/// Результат одного полного прохода
#[derive(Debug, Clone)]
pub struct Detection {
    pub store: LevelStore,
    pub rejected: Vec<Rejection>,
    /// Сколько свингов рассмотрено
    pub candidates: usize,
}

fn level_kind(kind: SwingKind) -> LevelKind {
    match kind {
        SwingKind::High => LevelKind::Resistance,
        SwingKind::Low => LevelKind::Support,
    }
}

/// Оценка одного кандидата: касания -> объём -> сила -> пороги
pub fn evaluate_candidate(
    candles: &[Candle],
    price: Price,
    kind: LevelKind,
    swing_index: usize,
    profile: &ParameterProfile,
    params: DetectParams,
) -> Result<KeyLevel, Rejection> {
    let stats = analyze_touches(candles, price, kind, profile.touch_params(params.volume));
    let volume = volume_confirmation(candles, swing_index, params.volume);

    let now = match candles.first() {
        Some(c) => c.ts,
        None => {
            return Err(Rejection {
                price,
                kind,
                reason: RejectReason::TooFewTouches,
                strength: 0.0,
                touch_count: 0,
            });
        }
    };

    let breakdown = score(price, &stats, now, profile, volume.bonus);

    let reject = |reason| Rejection {
        price,
        kind,
        reason,
        strength: breakdown.strength,
        touch_count: stats.touch_count,
    };

    check_thresholds(stats.touch_count, breakdown.strength, profile).map_err(reject)?;

    let (Some(first_touch), Some(last_touch)) = (stats.first_touch, stats.last_touch) else {
        return Err(reject(RejectReason::TooFewTouches));
    };

    Ok(KeyLevel {
        price,
        kind,
        first_touch,
        last_touch,
        touch_count: stats.touch_count,
        strength: breakdown.strength,
        volume_confirmed: volume.confirmed,
        volume_ratio: volume.ratio,
    })
}

/// Полный проход детекции по окну lookback.
///
/// Порядок: свинги -> анализ касаний/объёма/силы для всех кандидатов ->
/// сборка нового store по возрастанию цены. Старый store вызывающий
/// заменяет целиком.
pub fn detect_levels(
    candles: &[Candle],
    profile: &ParameterProfile,
    params: DetectParams,
) -> Result<Detection, DetectError> {
    let need = profile.required_bars();
    if candles.len() < need {
        return Err(DetectError::InsufficientData {
            have: candles.len(),
            need,
        });
    }

    let swings = find_swings(candles, profile.lookback_bars, profile.swing_params());

    let mut accepted = Vec::with_capacity(swings.len());
    let mut rejected = Vec::new();

    for swing in &swings {
        let kind = level_kind(swing.kind);
        match evaluate_candidate(candles, swing.price, kind, swing.index, profile, params) {
            Ok(level) => accepted.push(level),
            Err(r) => rejected.push(r),
        }
    }

    // по цене; при равной цене поддержка раньше сопротивления
    accepted.sort_by(|a, b| {
        a.cmp_price(b)
            .then_with(|| (a.kind == LevelKind::Resistance).cmp(&(b.kind == LevelKind::Resistance)))
    });

    let mut store = LevelStore::new(params.max_levels_per_kind, profile.proximity_zone());

    for level in accepted {
        match store.insert(level) {
            InsertOutcome::Inserted { evicted: None } => {}
            InsertOutcome::Inserted { evicted: Some(e) } => rejected.push(Rejection {
                price: e.price,
                kind: e.kind,
                reason: RejectReason::CapTruncated,
                strength: e.strength,
                touch_count: e.touch_count,
            }),
            InsertOutcome::Duplicate { .. } => rejected.push(Rejection {
                price: level.price,
                kind: level.kind,
                reason: RejectReason::Duplicate,
                strength: level.strength,
                touch_count: level.touch_count,
            }),
        }
    }

    Ok(Detection {
        store,
        rejected,
        candidates: swings.len(),
    })
}

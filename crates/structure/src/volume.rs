use crate::candle::Candle;

/// Потолок бонуса за объём
pub const MAX_VOLUME_BONUS: f64 = 0.15;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VolumeParams {
    /// Сколько предыдущих баров в скользящем среднем (обычно 20)
    pub avg_period: usize,
    /// Во сколько раз объём должен превысить среднее (обычно 2.0)
    pub spike_mult: f64,
}

impl Default for VolumeParams {
    fn default() -> Self {
        Self {
            avg_period: 20,
            spike_mult: 2.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VolumeConfirmation {
    pub ratio: f64,
    pub confirmed: bool,
    pub bonus: f64,
}

impl VolumeConfirmation {
    pub const NONE: VolumeConfirmation = VolumeConfirmation {
        ratio: 0.0,
        confirmed: false,
        bonus: 0.0,
    };
}

/// Среднее по барам, которые старше `i` (newest-first: i+1..=i+period)
pub fn rolling_avg_volume(candles: &[Candle], i: usize, period: usize) -> Option<f64> {
    let start = i + 1;
    if period == 0 || start >= candles.len() {
        return None;
    }

    let end = start.saturating_add(period).min(candles.len());
    let window = &candles[start..end];
    let sum: f64 = window.iter().map(|c| c.volume.0).sum();

    Some(sum / window.len() as f64)
}

/// Бонус за всплеск объёма на баре `i`
pub fn volume_confirmation(candles: &[Candle], i: usize, params: VolumeParams) -> VolumeConfirmation {
    let Some(bar) = candles.get(i) else {
        return VolumeConfirmation::NONE;
    };

    let avg = match rolling_avg_volume(candles, i, params.avg_period) {
        Some(v) if v > 0.0 => v,
        _ => return VolumeConfirmation::NONE,
    };

    let ratio = (bar.volume.0 / avg).max(0.0);

    if ratio < params.spike_mult {
        return VolumeConfirmation {
            ratio,
            confirmed: false,
            bonus: 0.0,
        };
    }

    VolumeConfirmation {
        ratio,
        confirmed: true,
        bonus: ((ratio - 1.0) * 0.1).min(MAX_VOLUME_BONUS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::types::{Price, Qty, TimestampMs};

    fn bars(volumes: &[f64]) -> Vec<Candle> {
        volumes
            .iter()
            .enumerate()
            .map(|(i, &v)| Candle {
                ts: TimestampMs(-(i as i64) * 60_000),
                open: Price(1.0),
                high: Price(1.0),
                low: Price(1.0),
                close: Price(1.0),
                volume: Qty(v),
            })
            .collect()
    }

    #[test]
    fn spike_gets_bonus() {
        let c = bars(&[200.0, 100.0, 100.0, 100.0]);
        let v = volume_confirmation(&c, 0, VolumeParams::default());
        assert!(v.confirmed);
        assert!((v.ratio - 2.0).abs() < 1e-12);
        assert!((v.bonus - 0.1).abs() < 1e-12);
    }

    #[test]
    fn bonus_is_capped() {
        let c = bars(&[1000.0, 100.0, 100.0]);
        let v = volume_confirmation(&c, 0, VolumeParams::default());
        assert_eq!(v.bonus, MAX_VOLUME_BONUS);
    }

    #[test]
    fn below_spike_has_no_bonus() {
        let c = bars(&[150.0, 100.0, 100.0]);
        let v = volume_confirmation(&c, 0, VolumeParams::default());
        assert!(!v.confirmed);
        assert_eq!(v.bonus, 0.0);
        assert!((v.ratio - 1.5).abs() < 1e-12);
    }

    #[test]
    fn zero_average_is_guarded() {
        let c = bars(&[500.0, 0.0, 0.0]);
        assert_eq!(volume_confirmation(&c, 0, VolumeParams::default()), VolumeConfirmation::NONE);
    }

    #[test]
    fn oldest_bar_has_no_history() {
        let c = bars(&[100.0, 100.0]);
        assert_eq!(volume_confirmation(&c, 1, VolumeParams::default()), VolumeConfirmation::NONE);
    }
}

use primitives::types::Price;

use crate::candle::Candle;

/// Минимальный контекст с каждой стороны свинга
pub const SWING_CONTEXT: usize = 2;

/// Тип свинга
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SwingKind {
    High,
    Low,
}

/// Подтверждённая точка свинга (индекс в newest-first массиве)
#[derive(Debug, Copy, Clone)]
pub struct Swing {
    pub index: usize,
    pub price: Price,
    pub kind: SwingKind,
}

/// Параметры детектора (масштабируются по таймфрейму, см. policy::profile)
#[derive(Debug, Copy, Clone)]
pub struct SwingParams {
    /// Минимальная высота над соседями, в единицах цены
    pub min_amplitude: f64,
    /// Полуширина окна, в котором точка обязана быть экстремумом (2..=5)
    pub window: usize,
}

/// Проверка: является ли точка swing high
pub fn is_swing_high(highs: &[Price], i: usize, params: SwingParams) -> bool {
    is_swing(highs, i, params, |p| p.0)
}

/// Проверка: является ли точка swing low (зеркально: инвертируем цены)
pub fn is_swing_low(lows: &[Price], i: usize, params: SwingParams) -> bool {
    is_swing(lows, i, params, |p| -p.0)
}

fn is_swing(series: &[Price], i: usize, params: SwingParams, value: impl Fn(Price) -> f64) -> bool {
    if i < SWING_CONTEXT || i + SWING_CONTEXT >= series.len() {
        return false;
    }

    let v = |j: usize| value(series[j]);
    let peak = v(i);
    let (l1, l2) = (v(i - 1), v(i - 2));
    let (r1, r2) = (v(i + 1), v(i + 2));

    // 1) базовый паттерн: строго выше двух соседей с каждой стороны
    if !(peak > l1 && peak > l2 && peak > r1 && peak > r2) {
        return false;
    }

    // 2) склоны монотонны к вершине (отсекаем одиночные иглы)
    if l2 > l1 || r2 > r1 {
        return false;
    }

    // 3) минимальная амплитуда с каждой стороны
    if peak - l1.min(l2) < params.min_amplitude || peak - r1.min(r2) < params.min_amplitude {
        return false;
    }

    // 4) в окне никто не экстремальнее
    let w = params.window.max(SWING_CONTEXT);
    let lo = i.saturating_sub(w);
    let hi = (i + w).min(series.len() - 1);

    (lo..=hi).filter(|&j| j != i).all(|j| v(j) <= peak)
}

/// Все свинги в первых `depth` барах (newest-first)
pub fn find_swings(candles: &[Candle], depth: usize, params: SwingParams) -> Vec<Swing> {
    let highs: Vec<Price> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<Price> = candles.iter().map(|c| c.low).collect();

    let mut out = Vec::new();

    for i in 0..depth.min(candles.len()) {
        if is_swing_high(&highs, i, params) {
            out.push(Swing {
                index: i,
                price: highs[i],
                kind: SwingKind::High,
            });
        }

        if is_swing_low(&lows, i, params) {
            out.push(Swing {
                index: i,
                price: lows[i],
                kind: SwingKind::Low,
            });
        }
    }

    out
}

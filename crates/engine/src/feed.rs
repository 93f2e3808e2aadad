use std::collections::VecDeque;

use primitives::types::Price;

use structure::candle::Candle;

/// Окно закрытых баров, newest-first (индекс 0 = самый свежий)
pub struct BarFeed {
    pub window: usize,
    candles: VecDeque<Candle>,
}

impl BarFeed {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            candles: VecDeque::with_capacity(window + 8),
        }
    }

    /// Добавить бар. Бар с тем же ts заменяет последний (обновление
    /// незакрытого бара), более старый бар отбрасывается.
    pub fn push(&mut self, c: Candle) -> bool {
        match self.candles.front() {
            Some(newest) if c.ts < newest.ts => return false,
            Some(newest) if c.ts == newest.ts => {
                self.candles[0] = c;
                return true;
            }
            _ => {}
        }

        self.candles.push_front(c);

        // держим последний window
        self.candles.truncate(self.window);
        true
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Срез newest-first для прохода детекции
    pub fn bars(&mut self) -> &[Candle] {
        self.candles.make_contiguous()
    }

    /// Текущая цена = close последнего бара
    pub fn last_price(&self) -> Option<Price> {
        self.candles.front().map(|c| c.close)
    }
}

use primitives::types::Price;
use structure::touch::LevelKind;

use crate::key_level::KeyLevel;

pub const DEFAULT_MAX_LEVELS: usize = 10;

/// Результат вставки уровня
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InsertOutcome {
    /// Вставлен; при превышении лимита `evicted` это выкинутый самый слабый
    /// (может оказаться и сам вставленный)
    Inserted { evicted: Option<KeyLevel> },
    /// В зоне близости уже есть уровень (любой стороны)
    Duplicate { existing: Price },
}

/// Ограниченный набор уровней, раздельно по сторонам.
///
/// Инварианты:
/// - каждая сторона отсортирована по цене по возрастанию
/// - любые два уровня дальше друг от друга, чем `proximity`
/// - на сторону не больше `cap` уровней
#[derive(Debug, Clone)]
pub struct LevelStore {
    supports: Vec<KeyLevel>,
    resistances: Vec<KeyLevel>,
    cap: usize,
    proximity: f64,
}

impl LevelStore {
    pub fn new(cap: usize, proximity: f64) -> Self {
        let cap = if cap == 0 { DEFAULT_MAX_LEVELS } else { cap };

        Self {
            supports: Vec::with_capacity(cap + 1),
            resistances: Vec::with_capacity(cap + 1),
            cap,
            proximity: proximity.max(0.0),
        }
    }

    pub fn clear(&mut self) {
        self.supports.clear();
        self.resistances.clear();
    }

    pub fn levels(&self, kind: LevelKind) -> &[KeyLevel] {
        match kind {
            LevelKind::Support => &self.supports,
            LevelKind::Resistance => &self.resistances,
        }
    }

    fn levels_mut(&mut self, kind: LevelKind) -> &mut Vec<KeyLevel> {
        match kind {
            LevelKind::Support => &mut self.supports,
            LevelKind::Resistance => &mut self.resistances,
        }
    }

    pub fn count(&self, kind: LevelKind) -> usize {
        self.levels(kind).len()
    }

    pub fn len(&self) -> usize {
        self.supports.len() + self.resistances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, kind: LevelKind, index: usize) -> Option<&KeyLevel> {
        self.levels(kind).get(index)
    }

    /// Все уровни: сначала поддержки, затем сопротивления (каждые по цене)
    pub fn iter(&self) -> impl Iterator<Item = &KeyLevel> {
        self.supports.iter().chain(self.resistances.iter())
    }

    /// Самый сильный уровень обеих сторон; при равенстве свежее касание
    pub fn strongest(&self) -> Option<&KeyLevel> {
        self.iter().max_by(|a, b| a.cmp_strength(b))
    }

    /// Ближайший уровень в зоне близости (обе стороны)
    pub fn find_near(&self, price: Price) -> Option<&KeyLevel> {
        [LevelKind::Support, LevelKind::Resistance]
            .into_iter()
            .filter_map(|kind| self.nearest_in(kind, price))
            .filter(|l| l.price.distance(price) <= self.proximity)
            .min_by(|a, b| a.price.distance(price).total_cmp(&b.price.distance(price)))
    }

    fn nearest_in(&self, kind: LevelKind, price: Price) -> Option<&KeyLevel> {
        let side = self.levels(kind);
        let idx = side.partition_point(|l| l.price.0 < price.0);

        let left = idx.checked_sub(1).and_then(|i| side.get(i));
        let right = side.get(idx);

        match (left, right) {
            (Some(l), Some(r)) => {
                if price.distance(l.price) <= price.distance(r.price) {
                    Some(l)
                } else {
                    Some(r)
                }
            }
            (l, r) => l.or(r),
        }
    }

    pub fn insert(&mut self, level: KeyLevel) -> InsertOutcome {
        if let Some(existing) = self.find_near(level.price) {
            return InsertOutcome::Duplicate {
                existing: existing.price,
            };
        }

        let cap = self.cap;
        let side = self.levels_mut(level.kind);

        let idx = side.partition_point(|l| l.cmp_price(&level).is_le());
        side.insert(idx, level);

        if side.len() <= cap {
            return InsertOutcome::Inserted { evicted: None };
        }

        // превысили лимит: оставляем сильнейших, затем снова по цене
        side.sort_by(|a, b| b.cmp_strength(a));
        let evicted = side.pop();
        side.truncate(cap);
        side.sort_by(|a, b| a.cmp_price(b));

        InsertOutcome::Inserted { evicted }
    }
}

impl Default for LevelStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEVELS, 0.0)
    }
}

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use primitives::types::{Price, Qty, TimestampMs};
use structure::candle::Candle;

/// Строка CSV: ts в миллисекундах, цены и объём как есть
#[derive(Debug, Serialize, Deserialize)]
pub struct CandleRow {
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<CandleRow> for Candle {
    fn from(row: CandleRow) -> Self {
        Candle {
            ts: TimestampMs(row.ts),
            open: Price(row.open),
            high: Price(row.high),
            low: Price(row.low),
            close: Price(row.close),
            volume: Qty(row.volume),
        }
    }
}

/// Прочитать бары из CSV, oldest-first. Дубли по ts схлопываются
/// (остаётся последняя строка), строки с невалидными ценами пропускаются.
pub fn read_candles(path: impl AsRef<Path>) -> Result<Vec<Candle>> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path)
        .with_context(|| format!("open {}", path.display()))?;

    let mut out: Vec<Candle> = Vec::new();
    for (n, r) in rdr.deserialize::<CandleRow>().enumerate() {
        let row = r.with_context(|| format!("{}: bad row {}", path.display(), n + 1))?;
        let c = Candle::from(row);

        if !(c.open.is_valid() && c.high.is_valid() && c.low.is_valid() && c.close.is_valid()) {
            continue;
        }
        out.push(c);
    }

    out.sort_by_key(|c| c.ts);
    out.dedup_by(|later, earlier| {
        if later.ts == earlier.ts {
            *earlier = *later;
            true
        } else {
            false
        }
    });

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_sorts_and_dedups() {
        let dir = std::env::temp_dir().join(format!("levels-data-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bars.csv");

        std::fs::write(
            &path,
            "ts,open,high,low,close,volume\n\
             2000,1.1,1.2,1.0,1.15,10\n\
             1000,1.0,1.1,0.9,1.05,5\n\
             2000,1.1,1.3,1.0,1.25,12\n\
             3000,0,0,0,0,0\n",
        )
        .unwrap();

        let candles = read_candles(&path).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].ts, TimestampMs(1000));
        assert_eq!(candles[1].close, Price(1.25));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}

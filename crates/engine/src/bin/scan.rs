use std::io;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use clap::Parser;

use engine::config::EngineConfig;
use engine::data::read_candles;
use levels::detect::detect_levels;
use primitives::types::TimestampMs;
use structure::candle::Candle;

/// Разовый проход детекции по последним барам CSV
#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    data: String,
    #[arg(long, default_value = "currency_pair")]
    instrument: String,
    #[arg(long, default_value = "H1")]
    timeframe: String,
    /// Печатать также отброшенных кандидатов
    #[arg(long, default_value_t = false)]
    rejected: bool,
}

#[derive(serde::Serialize)]
struct LevelRow {
    kind: String,
    price: f64,
    strength: f64,
    touches: usize,
    first_touch: String,
    last_touch: String,
    volume_confirmed: bool,
    volume_ratio: f64,
    status: String,
}

fn fmt_ts(ts: TimestampMs) -> String {
    Utc.timestamp_millis_opt(ts.0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.0.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = EngineConfig {
        instrument: args.instrument.clone(),
        timeframe: args.timeframe.clone(),
        ..EngineConfig::default()
    };
    let (settings, errors) = cfg.validated();
    for e in &errors {
        eprintln!("config: {}", e);
    }
    let profile = settings.profile();

    // newest-first, как ждёт детектор
    let mut bars: Vec<Candle> = read_candles(&args.data).context("read candles failed")?;
    bars.reverse();
    bars.truncate(profile.required_bars());

    let detection = detect_levels(&bars, &profile, settings.detect)?;

    let mut wtr = csv::Writer::from_writer(io::stdout());
    for level in detection.store.iter() {
        wtr.serialize(LevelRow {
            kind: format!("{:?}", level.kind),
            price: level.price.0,
            strength: level.strength,
            touches: level.touch_count,
            first_touch: fmt_ts(level.first_touch),
            last_touch: fmt_ts(level.last_touch),
            volume_confirmed: level.volume_confirmed,
            volume_ratio: level.volume_ratio,
            status: "accepted".to_string(),
        })?;
    }

    if args.rejected {
        for r in &detection.rejected {
            wtr.serialize(LevelRow {
                kind: format!("{:?}", r.kind),
                price: r.price.0,
                strength: r.strength,
                touches: r.touch_count,
                first_touch: String::new(),
                last_touch: String::new(),
                volume_confirmed: false,
                volume_ratio: 0.0,
                status: format!("{:?}", r.reason),
            })?;
        }
    }

    wtr.flush()?;
    eprintln!(
        "candidates: {}, accepted: {}, rejected: {}",
        detection.candidates,
        detection.store.len(),
        detection.rejected.len()
    );
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use engine::config::EngineConfig;
use engine::data::read_candles;
use engine::feed::BarFeed;
use engine::sink;
use engine::tick::{EngineCtx, TickInput, tick};

/// Прогон детектора уровней по истории баров, бар за баром
#[derive(Parser, Debug)]
struct Args {
    /// CSV с барами (ts,open,high,low,close,volume)
    #[arg(long)]
    data: String,
    /// TOML с конфигурацией движка
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    instrument: Option<String>,
    #[arg(long)]
    timeframe: Option<String>,
    #[arg(long)]
    point_size: Option<f64>,
    #[arg(long)]
    min_strength: Option<f64>,
    #[arg(long)]
    touch_zone: Option<f64>,
    #[arg(long)]
    min_touches: Option<i64>,
    #[arg(long, default_value_t = false)]
    quiet: bool,
    /// Размер окна баров (0 = сколько нужно профилю)
    #[arg(long, default_value_t = 0)]
    window: usize,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path))?;
            EngineConfig::from_toml_str(&text).with_context(|| format!("parse {}", path))?
        }
        None => EngineConfig::default(),
    };

    if let Some(v) = &args.instrument {
        cfg.instrument = v.clone();
    }
    if let Some(v) = &args.timeframe {
        cfg.timeframe = v.clone();
    }
    if args.point_size.is_some() {
        cfg.point_size = args.point_size;
    }
    if args.min_strength.is_some() {
        cfg.min_strength_override = args.min_strength;
    }
    if args.touch_zone.is_some() {
        cfg.touch_zone_override = args.touch_zone;
    }
    if args.min_touches.is_some() {
        cfg.min_touches_override = args.min_touches;
    }
    if args.quiet {
        cfg.show_diagnostics = false;
    }

    Ok(cfg)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "engine=info".into()),
        )
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;

    let candles = read_candles(&args.data).context("read candles failed")?;
    if candles.is_empty() {
        anyhow::bail!("no candles in {}", args.data);
    }

    let mut ctx = EngineCtx::new(&cfg);
    let timeframe = ctx.settings.timeframe;
    let mut feed = BarFeed::new(args.window.max(ctx.profile.required_bars()));

    info!(
        "replay: {} bars, {:?} {}, window {}",
        candles.len(),
        ctx.settings.instrument,
        timeframe.label(),
        feed.window
    );

    let mut n_ticks = 0usize;

    for c in candles {
        if !feed.push(c) {
            continue;
        }

        let input = TickInput {
            now: c.ts,
            timeframe,
            bars: feed.bars(),
        };

        let events = tick(&mut ctx, input);
        sink::consume(events);

        n_ticks += 1;
    }

    let result = ctx.result();
    println!("Ticks processed: {}", n_ticks);
    if let Some(price) = feed.last_price() {
        println!("Last price: {}", price);
    }
    println!("Levels: {}", result.all_levels.len());
    for level in &result.all_levels {
        println!("  {}", level);
    }
    match (result.has_active_level, ctx.strategy.active) {
        (true, Some(active)) => println!("Active: {}", active),
        _ => println!("Active: none"),
    }

    Ok(())
}

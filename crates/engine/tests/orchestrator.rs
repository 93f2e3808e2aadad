//! Сценарии оркестратора: rescan, инвалидация, смена таймфрейма, алерты.

use engine::config::EngineConfig;
use engine::event::{EngineEvent, RescanReason};
use engine::tick::{EngineCtx, TickInput, tick};
use primitives::types::{Price, Qty, TimestampMs};
use state_machine::cause::TransitionCause;
use state_machine::state::DetectorState;
use structure::candle::{Candle, Timeframe};
use structure::touch::LevelKind;

const H: i64 = 3_600_000;
const NOW: TimestampMs = TimestampMs(1_000 * H);

fn bar(ts: i64, high: f64, low: f64) -> Candle {
    Candle {
        ts: TimestampMs(ts),
        open: Price((high + low) / 2.0),
        high: Price(high),
        low: Price(low),
        close: Price((high + low) / 2.0),
        volume: Qty(100.0),
    }
}

/// Фон 1.1930..1.1950 и две одинаковые фигуры на newest-first индексах 150 и 190
fn series(len: usize, shape: [(f64, f64); 5]) -> Vec<Candle> {
    (0..len)
        .map(|i| {
            let ts = NOW.0 - i as i64 * H;
            for center in [150usize, 190] {
                if i + 2 >= center && i <= center + 2 {
                    let (h, l) = shape[i + 2 - center];
                    return bar(ts, h, l);
                }
            }
            bar(ts, 1.1950, 1.1930)
        })
        .collect()
}

/// Сопротивление 1.2050
fn double_top(len: usize) -> Vec<Candle> {
    series(
        len,
        [(1.1990, 1.1970), (1.2020, 1.1995), (1.2050, 1.2035), (1.2020, 1.1995), (1.1990, 1.1970)],
    )
}

/// Зеркало double_top относительно фона: поддержка 1.1830
fn double_bottom(len: usize) -> Vec<Candle> {
    series(
        len,
        [(1.1910, 1.1890), (1.1885, 1.1860), (1.1845, 1.1830), (1.1885, 1.1860), (1.1910, 1.1890)],
    )
}

fn h1(now: TimestampMs, bars: &[Candle]) -> TickInput<'_> {
    TickInput {
        now,
        timeframe: Timeframe::Hour1,
        bars,
    }
}

fn transitions(events: &[EngineEvent]) -> Vec<(DetectorState, TransitionCause, DetectorState)> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Transition { from, cause, to } => Some((*from, *cause, *to)),
            _ => None,
        })
        .collect()
}

fn slow_rescan() -> EngineConfig {
    EngineConfig {
        rescan_interval_secs: 1_000_000,
        ..EngineConfig::default()
    }
}

#[test]
fn first_run_acquires_strongest_level() {
    let bars = double_top(260);
    let mut ctx = EngineCtx::new(&EngineConfig::default());

    let events = tick(&mut ctx, h1(NOW, &bars));

    assert!(events.contains(&EngineEvent::RescanTriggered {
        reason: RescanReason::FirstRun
    }));
    assert_eq!(
        transitions(&events),
        vec![(DetectorState::Idle, TransitionCause::LevelAcquired, DetectorState::Active)]
    );

    let result = ctx.result();
    assert!(result.has_active_level);
    assert_eq!(result.all_levels.len(), 1);

    let strongest = result.strongest.unwrap();
    assert_eq!(strongest.kind, LevelKind::Resistance);
    assert!((strongest.price.0 - 1.2050).abs() < 1e-12);
    assert_eq!(ctx.strategy.active, Some(strongest));
    assert_eq!(ctx.strategy.last_update, Some(NOW));

    // диагностика включена по умолчанию
    assert!(events.iter().any(|e| matches!(e, EngineEvent::LevelAccepted(_))));
    assert!(events.iter().any(|e| matches!(e, EngineEvent::LevelRejected(_))));
}

#[test]
fn diagnostics_can_be_muted() {
    let bars = double_top(260);
    let cfg = EngineConfig {
        show_diagnostics: false,
        ..EngineConfig::default()
    };
    let mut ctx = EngineCtx::new(&cfg);

    let events = tick(&mut ctx, h1(NOW, &bars));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, EngineEvent::LevelAccepted(_) | EngineEvent::LevelRejected(_)))
    );
    assert!(ctx.result().has_active_level);
}

#[test]
fn noop_tick_leaves_state_unchanged() {
    let bars = double_top(260);
    let mut ctx = EngineCtx::new(&EngineConfig::default());
    tick(&mut ctx, h1(NOW, &bars));

    let before = ctx.result();
    let strategy = ctx.strategy;

    let events = tick(&mut ctx, h1(TimestampMs(NOW.0 + 1_000), &bars));

    assert!(events.is_empty(), "{:?}", events);
    assert_eq!(ctx.result(), before);
    assert_eq!(ctx.strategy, strategy);
    assert_eq!(ctx.last_rescan(), Some(NOW));
}

#[test]
fn timer_rescan_refreshes_same_level_without_transition() {
    let bars = double_top(260);
    let mut ctx = EngineCtx::new(&EngineConfig::default());
    tick(&mut ctx, h1(NOW, &bars));

    // ровно интервал: ещё рано
    let at_interval = TimestampMs(NOW.0 + 300_000);
    let events = tick(&mut ctx, h1(at_interval, &bars));
    assert!(!events.iter().any(|e| matches!(e, EngineEvent::RescanTriggered { .. })));

    let later = TimestampMs(NOW.0 + 300_001);
    let events = tick(&mut ctx, h1(later, &bars));
    assert!(events.contains(&EngineEvent::RescanTriggered {
        reason: RescanReason::Timer
    }));
    assert!(transitions(&events).is_empty());
    assert!(ctx.result().has_active_level);
    assert_eq!(ctx.strategy.last_update, Some(NOW));
}

#[test]
fn rescan_replaces_level_at_new_price() {
    let mut ctx = EngineCtx::new(&EngineConfig::default());
    tick(&mut ctx, h1(NOW, &double_top(260)));

    let later = TimestampMs(NOW.0 + 400_000);
    let bottom = double_bottom(260);
    let events = tick(&mut ctx, h1(later, &bottom));

    assert_eq!(
        transitions(&events),
        vec![(DetectorState::Active, TransitionCause::LevelReplaced, DetectorState::Active)]
    );

    let active = ctx.strategy.active.unwrap();
    assert_eq!(active.kind, LevelKind::Support);
    assert!((active.price.0 - 1.1830).abs() < 1e-12);
    assert_eq!(ctx.strategy.last_update, Some(later));
}

#[test]
fn stale_level_is_invalidated() {
    let bars = double_top(260);
    let mut ctx = EngineCtx::new(&slow_rescan());
    tick(&mut ctx, h1(NOW, &bars));
    assert!(ctx.result().has_active_level);

    // последнее касание 150 баров назад; +100 часов = 250 > 240
    let later = TimestampMs(NOW.0 + 100 * H);
    let events = tick(&mut ctx, h1(later, &bars));

    assert_eq!(
        transitions(&events),
        vec![(DetectorState::Active, TransitionCause::LevelInvalidated, DetectorState::Idle)]
    );
    assert!(!ctx.result().has_active_level);
    assert_eq!(ctx.strategy.active, None);

    // store живёт до следующего rescan
    assert_eq!(ctx.result().all_levels.len(), 1);
}

#[test]
fn fresh_level_survives_validation() {
    let bars = double_top(260);
    let mut ctx = EngineCtx::new(&slow_rescan());
    tick(&mut ctx, h1(NOW, &bars));

    let events = tick(&mut ctx, h1(TimestampMs(NOW.0 + 80 * H), &bars));
    assert!(transitions(&events).is_empty());
    assert!(ctx.result().has_active_level);
}

#[test]
fn timeframe_change_clears_store_and_forces_rescan() {
    let bars = double_top(260);
    let mut ctx = EngineCtx::new(&EngineConfig::default());
    tick(&mut ctx, h1(NOW, &bars));
    assert!(ctx.result().has_active_level);

    // сразу после rescan: таймер не истёк, но смена таймфрейма важнее
    let events = tick(
        &mut ctx,
        TickInput {
            now: TimestampMs(NOW.0 + 1_000),
            timeframe: Timeframe::Min15,
            bars: &bars,
        },
    );

    assert_eq!(
        transitions(&events),
        vec![(DetectorState::Active, TransitionCause::TimeframeChanged, DetectorState::Idle)]
    );
    assert!(events.contains(&EngineEvent::RescanTriggered {
        reason: RescanReason::TimeframeChange
    }));
    assert!(events.contains(&EngineEvent::InsufficientData { have: 260, need: 310 }));

    let result = ctx.result();
    assert!(!result.has_active_level);
    assert!(result.all_levels.is_empty());
    assert_eq!(ctx.settings.timeframe, Timeframe::Min15);
    assert_eq!(ctx.profile.timeframe, Timeframe::Min15);
}

#[test]
fn short_window_keeps_active_level_until_bars_return() {
    let bars = double_top(260);
    let mut ctx = EngineCtx::new(&EngineConfig::default());
    tick(&mut ctx, h1(NOW, &bars));
    let acquired = ctx.strategy.active.unwrap();

    let t1 = TimestampMs(NOW.0 + 400_000);
    let events = tick(&mut ctx, h1(t1, &bars[..200]));

    assert!(events.contains(&EngineEvent::RescanTriggered {
        reason: RescanReason::Timer
    }));
    assert!(events.contains(&EngineEvent::InsufficientData { have: 200, need: 248 }));
    assert!(transitions(&events).is_empty());

    let result = ctx.result();
    assert!(result.all_levels.is_empty());
    assert!(result.strongest.is_none());
    assert!(result.has_active_level);
    assert_eq!(ctx.strategy.active, Some(acquired));

    // следующий таймер: баров снова хватает
    let t2 = TimestampMs(t1.0 + 400_000);
    let events = tick(&mut ctx, h1(t2, &bars));

    assert!(events.contains(&EngineEvent::RescanTriggered {
        reason: RescanReason::Timer
    }));
    assert!(transitions(&events).is_empty());
    assert_eq!(ctx.result().all_levels.len(), 1);
    assert!(ctx.result().has_active_level);
    assert_eq!(ctx.strategy.active, ctx.result().strongest);
}

#[test]
fn first_run_without_history_acquires_once_bars_arrive() {
    let bars = double_top(260);
    let mut ctx = EngineCtx::new(&EngineConfig::default());

    let events = tick(&mut ctx, h1(NOW, &bars[..100]));
    assert!(events.contains(&EngineEvent::InsufficientData { have: 100, need: 248 }));
    assert!(!ctx.result().has_active_level);

    let later = TimestampMs(NOW.0 + 300_001);
    let events = tick(&mut ctx, h1(later, &bars));
    assert_eq!(
        transitions(&events),
        vec![(DetectorState::Idle, TransitionCause::LevelAcquired, DetectorState::Active)]
    );
    assert!((ctx.strategy.active.unwrap().price.0 - 1.2050).abs() < 1e-12);
    assert_eq!(ctx.strategy.last_update, Some(later));
}

#[test]
fn reconfigure_resets_and_rescans() {
    let bars = double_top(260);
    let mut ctx = EngineCtx::new(&EngineConfig::default());
    tick(&mut ctx, h1(NOW, &bars));

    let cfg = EngineConfig {
        min_strength_override: Some(0.9),
        ..EngineConfig::default()
    };
    let events = ctx.reconfigure(&cfg);
    assert_eq!(
        transitions(&events),
        vec![(DetectorState::Active, TransitionCause::ConfigChanged, DetectorState::Idle)]
    );
    assert!(ctx.result().all_levels.is_empty());

    let events = tick(&mut ctx, h1(TimestampMs(NOW.0 + 1_000), &bars));
    assert!(events.contains(&EngineEvent::RescanTriggered {
        reason: RescanReason::ConfigChange
    }));

    // 0.9 недостижимо для двух касаний
    assert!(!ctx.result().has_active_level);
    assert!(ctx.result().all_levels.is_empty());
}

#[test]
fn approach_alerts_are_throttled_per_level() {
    let mut bars = double_top(260);
    let mut ctx = EngineCtx::new(&slow_rescan());
    tick(&mut ctx, h1(NOW, &bars));

    // цена подошла к 1.2050 на 0.0010 (< 2 зон)
    bars[0].close = Price(1.2040);

    let alerts = |events: &[EngineEvent]| {
        events
            .iter()
            .filter(|e| matches!(e, EngineEvent::ApproachAlert { .. }))
            .count()
    };

    let t1 = TimestampMs(NOW.0 + 1_000);
    let events = tick(&mut ctx, h1(t1, &bars));
    assert_eq!(alerts(&events), 1);
    match &events[0] {
        EngineEvent::ApproachAlert { level, price, distance } => {
            assert!((level.price.0 - 1.2050).abs() < 1e-12);
            assert_eq!(*price, Price(1.2040));
            assert!((distance - 0.0010).abs() < 1e-9);
        }
        other => panic!("unexpected {:?}", other),
    }

    let events = tick(&mut ctx, h1(TimestampMs(t1.0 + 60_000), &bars));
    assert_eq!(alerts(&events), 0);

    let events = tick(&mut ctx, h1(TimestampMs(t1.0 + 900_000), &bars));
    assert_eq!(alerts(&events), 1);

    // цена ушла, тишина
    bars[0].close = Price(1.1940);
    let events = tick(&mut ctx, h1(TimestampMs(t1.0 + 2_000_000), &bars));
    assert_eq!(alerts(&events), 0);
}

#[test]
fn hourly_stats_are_emitted_on_rollover() {
    let bars = double_top(260);
    let mut ctx = EngineCtx::new(&EngineConfig::default());
    tick(&mut ctx, h1(NOW, &bars));

    let events = tick(&mut ctx, h1(TimestampMs(NOW.0 + H), &bars));
    assert_eq!(
        events[0],
        EngineEvent::HourlyStats {
            hour: 1_000,
            accepted: 1,
            rejected: 1
        }
    );
    assert_eq!(ctx.counters().hour, Some(1_001));
    assert_eq!(ctx.counters().accepted, 1);
}

#[test]
fn instances_are_independent() {
    let top = double_top(260);
    let bottom = double_bottom(260);
    let mut a = EngineCtx::new(&EngineConfig::default());
    let mut b = EngineCtx::new(&EngineConfig::default());

    tick(&mut a, h1(NOW, &top));
    tick(&mut b, h1(NOW, &bottom));

    assert_eq!(a.result().strongest.unwrap().kind, LevelKind::Resistance);
    assert_eq!(b.result().strongest.unwrap().kind, LevelKind::Support);
}

use std::collections::HashMap;

use primitives::types::TimestampMs;

use levels::detect::detect_levels;
use levels::error::DetectError;
use levels::key_level::KeyLevel;
use levels::store::LevelStore;
use policy::profile::ParameterProfile;
use state_machine::cause::TransitionCause;
use state_machine::state::DetectorState;
use state_machine::transition::transition;
use structure::candle::{Candle, Timeframe};

use crate::config::{ConfigError, EngineConfig, Settings};
use crate::event::{EngineEvent, RescanReason};

/// Алерт о приближении: цена ближе 2 зон к уровню
const APPROACH_ZONES: f64 = 2.0;

/// Состояние стратегии: единственный активный уровень
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StrategyState {
    pub state: DetectorState,
    pub active: Option<KeyLevel>,
    pub last_update: Option<TimestampMs>,
}

impl StrategyState {
    pub fn new() -> Self {
        Self {
            state: DetectorState::Idle,
            active: None,
            last_update: None,
        }
    }

    pub fn has_active_level(&self) -> bool {
        self.state == DetectorState::Active && self.active.is_some()
    }
}

impl Default for StrategyState {
    fn default() -> Self {
        Self::new()
    }
}

/// Почасовые счётчики принятых/отброшенных уровней (на инстанс)
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct HourlyCounters {
    pub hour: Option<i64>,
    pub accepted: u32,
    pub rejected: u32,
}

/// Результат для внешних потребителей (риск/ордера, отрисовка)
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub strongest: Option<KeyLevel>,
    pub all_levels: Vec<KeyLevel>,
    pub has_active_level: bool,
}

/// Engine runtime context (живёт между тиками).
/// Один инстанс на пару (инструмент, таймфрейм), без общего состояния.
pub struct EngineCtx {
    pub settings: Settings,
    pub profile: ParameterProfile,

    pub store: LevelStore,
    pub strategy: StrategyState,

    last_rescan: Option<TimestampMs>,
    forced_rescan: Option<RescanReason>,
    last_validation: Option<TimestampMs>,
    /// price bits -> время последнего алерта
    alerts: HashMap<u64, TimestampMs>,
    counters: HourlyCounters,
    pending_config_errors: Vec<ConfigError>,
}

impl EngineCtx {
    pub fn new(config: &EngineConfig) -> Self {
        let (settings, errors) = config.validated();
        Self::from_settings(settings, errors)
    }

    pub fn from_settings(settings: Settings, config_errors: Vec<ConfigError>) -> Self {
        let profile = settings.profile();

        Self {
            settings,
            profile,
            store: LevelStore::new(settings.detect.max_levels_per_kind, profile.proximity_zone()),
            strategy: StrategyState::new(),
            last_rescan: None,
            forced_rescan: None,
            last_validation: None,
            alerts: HashMap::new(),
            counters: HourlyCounters::default(),
            pending_config_errors: config_errors,
        }
    }

    pub fn counters(&self) -> HourlyCounters {
        self.counters
    }

    pub fn last_rescan(&self) -> Option<TimestampMs> {
        self.last_rescan
    }

    pub fn result(&self) -> DetectionResult {
        DetectionResult {
            strongest: self.store.strongest().copied(),
            all_levels: self.store.iter().copied().collect(),
            has_active_level: self.strategy.has_active_level(),
        }
    }

    /// Явная смена конфигурации: сброс состояния, rescan на следующем тике
    pub fn reconfigure(&mut self, config: &EngineConfig) -> Vec<EngineEvent> {
        let (settings, errors) = config.validated();
        let mut events: Vec<EngineEvent> = errors.into_iter().map(EngineEvent::ConfigSubstituted).collect();

        self.settings = settings;
        self.reset_context();
        self.apply(TransitionCause::ConfigChanged, None, None, &mut events);
        self.forced_rescan = Some(RescanReason::ConfigChange);
        events
    }

    fn reset_context(&mut self) {
        self.profile = self.settings.profile();
        self.store = LevelStore::new(
            self.settings.detect.max_levels_per_kind,
            self.profile.proximity_zone(),
        );
        self.alerts.clear();
        self.last_validation = None;
    }

    /// Применить переход state machine; нелегальные переходы игнорируются
    fn apply(
        &mut self,
        cause: TransitionCause,
        active: Option<KeyLevel>,
        now: Option<TimestampMs>,
        events: &mut Vec<EngineEvent>,
    ) {
        let from = self.strategy.state;
        let Ok(to) = transition(from, cause) else {
            return;
        };

        self.strategy.state = to;
        self.strategy.active = active;
        if now.is_some() {
            self.strategy.last_update = now;
        }

        events.push(EngineEvent::Transition { from, cause, to });
    }
}

/// Вход тика. `bars` newest-first, `now` это часы драйвера.
#[derive(Debug, Copy, Clone)]
pub struct TickInput<'a> {
    pub now: TimestampMs,
    pub timeframe: Timeframe,
    pub bars: &'a [Candle],
}

/// Один тик оркестратора.
/// Возвращает события (для логов/диагностики).
pub fn tick(ctx: &mut EngineCtx, input: TickInput<'_>) -> Vec<EngineEvent> {
    let mut events: Vec<EngineEvent> = ctx
        .pending_config_errors
        .drain(..)
        .map(EngineEvent::ConfigSubstituted)
        .collect();

    roll_hourly_counters(ctx, input.now, &mut events);

    // --- 1) нужен ли rescan ---
    let reason = if input.timeframe != ctx.settings.timeframe {
        ctx.settings.timeframe = input.timeframe;
        ctx.forced_rescan = None;
        ctx.reset_context();
        ctx.apply(TransitionCause::TimeframeChanged, None, Some(input.now), &mut events);
        Some(RescanReason::TimeframeChange)
    } else if let Some(forced) = ctx.forced_rescan.take() {
        Some(forced)
    } else {
        match ctx.last_rescan {
            None => Some(RescanReason::FirstRun),
            Some(last) if input.now.millis_since(last) > ctx.settings.rescan_interval_ms => {
                Some(RescanReason::Timer)
            }
            Some(_) => None,
        }
    };

    // --- 2) rescan или проверка/алерты между rescan-ами ---
    match reason {
        Some(reason) => rescan(ctx, input, reason, &mut events),
        None => {
            validate_active(ctx, input.now, &mut events);
            approach_alerts(ctx, input, &mut events);
        }
    }

    events
}

fn roll_hourly_counters(ctx: &mut EngineCtx, now: TimestampMs, events: &mut Vec<EngineEvent>) {
    let hour = now.hour_bucket();

    match ctx.counters.hour {
        Some(h) if h == hour => {}
        Some(h) => {
            events.push(EngineEvent::HourlyStats {
                hour: h,
                accepted: ctx.counters.accepted,
                rejected: ctx.counters.rejected,
            });
            ctx.counters = HourlyCounters {
                hour: Some(hour),
                accepted: 0,
                rejected: 0,
            };
        }
        None => ctx.counters.hour = Some(hour),
    }
}

fn rescan(ctx: &mut EngineCtx, input: TickInput<'_>, reason: RescanReason, events: &mut Vec<EngineEvent>) {
    events.push(EngineEvent::RescanTriggered { reason });
    ctx.last_rescan = Some(input.now);

    let detection = match detect_levels(input.bars, &ctx.profile, ctx.settings.detect) {
        Ok(d) => d,
        Err(DetectError::InsufficientData { have, need }) => {
            ctx.store.clear();
            ctx.alerts.clear();
            events.push(EngineEvent::InsufficientData { have, need });
            return;
        }
    };

    ctx.counters.accepted += detection.store.len() as u32;
    ctx.counters.rejected += detection.rejected.len() as u32;

    if ctx.settings.show_diagnostics {
        events.extend(detection.store.iter().copied().map(EngineEvent::LevelAccepted));
        events.extend(detection.rejected.iter().copied().map(EngineEvent::LevelRejected));
    }

    // store подменяется целиком: читатели не видят полусобранного
    ctx.store = detection.store;
    let store = &ctx.store;
    ctx.alerts
        .retain(|bits, _| store.iter().any(|l| l.price.0.to_bits() == *bits));

    let Some(candidate) = ctx.store.strongest().copied() else {
        return;
    };

    match ctx.strategy.active {
        None => ctx.apply(TransitionCause::LevelAcquired, Some(candidate), Some(input.now), events),
        Some(active) if active.price.distance(candidate.price) > ctx.profile.touch_zone => {
            ctx.apply(TransitionCause::LevelReplaced, Some(candidate), Some(input.now), events)
        }
        // тот же уровень найден снова: обновляем снимок без перехода
        Some(_) => ctx.strategy.active = Some(candidate),
    }
}

fn is_still_valid(level: &KeyLevel, profile: &ParameterProfile, now: TimestampMs) -> bool {
    level.touch_count >= profile.min_touches
        && level.strength >= profile.min_strength
        && now.millis_since(level.last_touch) <= profile.stale_after_ms()
}

fn validate_active(ctx: &mut EngineCtx, now: TimestampMs, events: &mut Vec<EngineEvent>) {
    if let Some(last) = ctx.last_validation {
        if now.millis_since(last) < ctx.settings.validation_interval_ms {
            return;
        }
    }
    ctx.last_validation = Some(now);

    let Some(active) = ctx.strategy.active else {
        return;
    };

    if !is_still_valid(&active, &ctx.profile, now) {
        ctx.apply(TransitionCause::LevelInvalidated, None, Some(now), events);
    }
}

fn approach_alerts(ctx: &mut EngineCtx, input: TickInput<'_>, events: &mut Vec<EngineEvent>) {
    let Some(price) = input.bars.first().map(|c| c.close) else {
        return;
    };

    let radius = ctx.profile.touch_zone * APPROACH_ZONES;
    let interval = ctx.settings.alert_interval_ms;

    for level in ctx.store.iter() {
        let distance = level.price.distance(price);
        if distance > radius {
            continue;
        }

        let key = level.price.0.to_bits();
        let due = ctx
            .alerts
            .get(&key)
            .is_none_or(|last| input.now.millis_since(*last) >= interval);

        if due {
            ctx.alerts.insert(key, input.now);
            events.push(EngineEvent::ApproachAlert {
                level: *level,
                price,
                distance,
            });
        }
    }
}

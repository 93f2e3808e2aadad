use serde::Deserialize;
use thiserror::Error;

use levels::detect::DetectParams;
use policy::profile::{InstrumentClass, ParameterProfile, resolve_profile};
use structure::candle::Timeframe;
use structure::volume::VolumeParams;

pub const DEFAULT_RESCAN_INTERVAL_SECS: i64 = 300;
pub const DEFAULT_VALIDATION_INTERVAL_SECS: i64 = 60;
pub const DEFAULT_ALERT_INTERVAL_SECS: i64 = 900;
pub const DEFAULT_MAX_LEVELS: usize = 10;
pub const DEFAULT_VOLUME_AVG_PERIOD: usize = 20;
pub const DEFAULT_VOLUME_SPIKE_MULT: f64 = 2.0;
/// Интервалы хранятся в мс, больше этого не переводится без переполнения
pub const MAX_INTERVAL_SECS: i64 = i64::MAX / 1000;

/// Ошибка конфигурации. Никогда не фатальна: движок подставляет
/// безопасное значение и сообщает об этом один раз.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown instrument class '{0}', using currency_pair")]
    UnknownInstrument(String),

    #[error("unknown timeframe '{0}', using H1")]
    UnknownTimeframe(String),

    #[error("{field} must be positive, got {value}; using {fallback}")]
    NonPositivePeriod {
        field: &'static str,
        value: i64,
        fallback: i64,
    },

    #[error("{field} = {value}s does not fit in milliseconds; using {fallback}")]
    IntervalTooLarge {
        field: &'static str,
        value: i64,
        fallback: i64,
    },

    #[error("min strength override {0} is outside (0, 1]; ignored")]
    StrengthOutOfRange(f64),

    #[error("{field} must be a positive price distance, got {value}; ignored")]
    NonPositiveDistance { field: &'static str, value: f64 },

    #[error("min touches override must be >= 1; ignored")]
    ZeroTouches,

    #[error("volume spike multiplier {0} must be > 1; using 2.0")]
    SpikeMultOutOfRange(f64),

    #[error("validation interval {fast}s must be shorter than rescan interval {slow}s; using {fallback}s")]
    InvertedIntervals { fast: i64, slow: i64, fallback: i64 },
}

/// Конфигурация как её пишет пользователь (TOML / CLI)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub instrument: String,
    pub timeframe: String,
    pub point_size: Option<f64>,

    pub min_strength_override: Option<f64>,
    pub touch_zone_override: Option<f64>,
    pub min_touches_override: Option<i64>,

    pub show_diagnostics: bool,

    pub rescan_interval_secs: i64,
    pub validation_interval_secs: i64,
    pub alert_interval_secs: i64,

    pub max_levels_per_kind: i64,
    pub volume_avg_period: i64,
    pub volume_spike_mult: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            instrument: "currency_pair".to_string(),
            timeframe: "H1".to_string(),
            point_size: None,
            min_strength_override: None,
            touch_zone_override: None,
            min_touches_override: None,
            show_diagnostics: true,
            rescan_interval_secs: DEFAULT_RESCAN_INTERVAL_SECS,
            validation_interval_secs: DEFAULT_VALIDATION_INTERVAL_SECS,
            alert_interval_secs: DEFAULT_ALERT_INTERVAL_SECS,
            max_levels_per_kind: DEFAULT_MAX_LEVELS as i64,
            volume_avg_period: DEFAULT_VOLUME_AVG_PERIOD as i64,
            volume_spike_mult: DEFAULT_VOLUME_SPIKE_MULT,
        }
    }
}

/// Переопределения профиля, уже провалидированные
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Overrides {
    pub min_strength: Option<f64>,
    pub touch_zone: Option<f64>,
    pub min_touches: Option<usize>,
}

impl Overrides {
    pub fn apply(self, mut profile: ParameterProfile) -> ParameterProfile {
        if let Some(v) = self.min_strength {
            profile.min_strength = v;
        }
        if let Some(v) = self.touch_zone {
            profile.touch_zone = v;
        }
        if let Some(v) = self.min_touches {
            profile.min_touches = v;
        }
        profile
    }
}

/// Провалидированные настройки, с которыми работает движок
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Settings {
    pub instrument: InstrumentClass,
    pub timeframe: Timeframe,
    pub point: f64,
    pub overrides: Overrides,
    pub show_diagnostics: bool,
    pub rescan_interval_ms: i64,
    pub validation_interval_ms: i64,
    pub alert_interval_ms: i64,
    pub detect: DetectParams,
}

impl Settings {
    /// Профиль для текущего (инструмент, таймфрейм) с учётом overrides
    pub fn profile(&self) -> ParameterProfile {
        self.overrides
            .apply(resolve_profile(self.instrument, self.timeframe, self.point))
    }
}

fn positive(field: &'static str, value: i64, fallback: i64, errors: &mut Vec<ConfigError>) -> i64 {
    if value > 0 {
        value
    } else {
        errors.push(ConfigError::NonPositivePeriod {
            field,
            value,
            fallback,
        });
        fallback
    }
}

/// Положительный интервал в секундах, который переводится в мс
fn interval_secs(field: &'static str, value: i64, fallback: i64, errors: &mut Vec<ConfigError>) -> i64 {
    if value > MAX_INTERVAL_SECS {
        errors.push(ConfigError::IntervalTooLarge {
            field,
            value,
            fallback,
        });
        return fallback;
    }
    positive(field, value, fallback, errors)
}

fn positive_distance(field: &'static str, value: Option<f64>, errors: &mut Vec<ConfigError>) -> Option<f64> {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => Some(v),
        Some(v) => {
            errors.push(ConfigError::NonPositiveDistance { field, value: v });
            None
        }
        None => None,
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Валидация с подстановкой безопасных значений
    pub fn validated(&self) -> (Settings, Vec<ConfigError>) {
        let mut errors = Vec::new();

        let instrument = InstrumentClass::parse(&self.instrument).unwrap_or_else(|| {
            errors.push(ConfigError::UnknownInstrument(self.instrument.clone()));
            InstrumentClass::CurrencyPair
        });

        let timeframe = Timeframe::parse(&self.timeframe).unwrap_or_else(|| {
            errors.push(ConfigError::UnknownTimeframe(self.timeframe.clone()));
            Timeframe::DEFAULT
        });

        let point = positive_distance("point_size", self.point_size, &mut errors)
            .unwrap_or_else(|| instrument.default_point());

        let min_strength = match self.min_strength_override {
            Some(v) if v > 0.0 && v <= 1.0 => Some(v),
            Some(v) => {
                errors.push(ConfigError::StrengthOutOfRange(v));
                None
            }
            None => None,
        };

        let touch_zone = positive_distance("touch_zone_override", self.touch_zone_override, &mut errors);

        let min_touches = match self.min_touches_override {
            Some(v) if v >= 1 => Some(v as usize),
            Some(_) => {
                errors.push(ConfigError::ZeroTouches);
                None
            }
            None => None,
        };

        let rescan = interval_secs(
            "rescan_interval_secs",
            self.rescan_interval_secs,
            DEFAULT_RESCAN_INTERVAL_SECS,
            &mut errors,
        );
        let mut validation = interval_secs(
            "validation_interval_secs",
            self.validation_interval_secs,
            DEFAULT_VALIDATION_INTERVAL_SECS,
            &mut errors,
        );
        if validation >= rescan {
            let fallback = (rescan / 2).max(1);
            errors.push(ConfigError::InvertedIntervals {
                fast: validation,
                slow: rescan,
                fallback,
            });
            validation = fallback;
        }

        let alert = interval_secs(
            "alert_interval_secs",
            self.alert_interval_secs,
            DEFAULT_ALERT_INTERVAL_SECS,
            &mut errors,
        );
        let max_levels = positive(
            "max_levels_per_kind",
            self.max_levels_per_kind,
            DEFAULT_MAX_LEVELS as i64,
            &mut errors,
        );
        let avg_period = positive(
            "volume_avg_period",
            self.volume_avg_period,
            DEFAULT_VOLUME_AVG_PERIOD as i64,
            &mut errors,
        );

        let spike_mult = if self.volume_spike_mult.is_finite() && self.volume_spike_mult > 1.0 {
            self.volume_spike_mult
        } else {
            errors.push(ConfigError::SpikeMultOutOfRange(self.volume_spike_mult));
            DEFAULT_VOLUME_SPIKE_MULT
        };

        let settings = Settings {
            instrument,
            timeframe,
            point,
            overrides: Overrides {
                min_strength,
                touch_zone,
                min_touches,
            },
            show_diagnostics: self.show_diagnostics,
            rescan_interval_ms: rescan * 1000,
            validation_interval_ms: validation * 1000,
            alert_interval_ms: alert * 1000,
            detect: DetectParams {
                volume: VolumeParams {
                    avg_period: avg_period as usize,
                    spike_mult,
                },
                max_levels_per_kind: max_levels as usize,
            },
        };

        (settings, errors)
    }
}

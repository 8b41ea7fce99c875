use anyhow::{Context, Result};
use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Префикс переменных окружения, например `KEEPACTIVE_ACTIVATION__POLLING_INTERVAL_MS=250`
pub const ENV_PREFIX: &str = "KEEPACTIVE_";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub activation: ActivationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActivationConfig {
    pub polling_interval_ms: u64,
}

/// Параметры командной строки, перекрывающие окружение
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub log_level: Option<String>,
    pub polling_interval_ms: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            activation: ActivationConfig {
                polling_interval_ms: 100,
            },
        }
    }
}

impl Config {
    /// Собирает конфигурацию: значения по умолчанию -> окружение -> командная строка.
    /// Файл конфигурации не читается.
    pub fn load(overrides: &CliOverrides) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(figment, overrides)
    }

    fn from_figment(figment: Figment, overrides: &CliOverrides) -> Result<Self> {
        let mut config: Config = figment
            .extract()
            .context("Не удалось собрать конфигурацию из окружения")?;

        if let Some(level) = &overrides.log_level {
            config.logging.level = level.clone();
        }
        if let Some(interval) = overrides.polling_interval_ms {
            config.activation.polling_interval_ms = interval;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if !(10..=10_000).contains(&self.activation.polling_interval_ms) {
            anyhow::bail!(
                "polling_interval_ms должно быть в диапазоне 10..=10000, получено {}",
                self.activation.polling_interval_ms
            );
        }

        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_millis(self.activation.polling_interval_ms)
    }
}

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub window: WindowConfig,
    pub freeze: FreezeConfig,
    // Оптимизационные индексы - не сериализуются, строятся после загрузки
    #[serde(skip)]
    target_set_lower: HashSet<String>, // O(1) lookup для целевых процессов
    #[serde(skip)]
    ignored_set_lower: HashSet<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub polling_interval_ms: u64,
    /// Учитывать только окна текущего рабочего стола
    pub current_desktop_only: bool,
    /// Дополнение к встроенному denylist исполняемых файлов
    #[serde(default)]
    pub ignored_executables: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FreezeConfig {
    /// Исполняемые файлы, процессы которых приостанавливаются в фоне.
    /// Пустой список означает "ничего не замораживать".
    #[serde(default)]
    pub target_executables: Vec<String>,
    pub minimize_on_freeze: bool,
    pub resume_on_exit: bool,
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
                filter: "bgfreeze_rust=info".to_string(),
            },
            window: WindowConfig {
                polling_interval_ms: 1000,
                current_desktop_only: true,
                ignored_executables: Vec::new(),
            },
            freeze: FreezeConfig {
                target_executables: Vec::new(),
                minimize_on_freeze: true,
                resume_on_exit: true,
            },
            target_set_lower: HashSet::new(),
            ignored_set_lower: HashSet::new(),
        };
        config.build_optimization_indexes();
        config
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("BGFREEZE_"));

        let mut config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;
        config.build_optimization_indexes();

        Ok(config)
    }

    /// Строит оптимизационные индексы для быстрого поиска
    pub fn build_optimization_indexes(&mut self) {
        self.target_set_lower = self
            .freeze
            .target_executables
            .iter()
            .map(|name| name.to_lowercase())
            .collect();

        self.ignored_set_lower = self
            .window
            .ignored_executables
            .iter()
            .map(|name| name.to_lowercase())
            .collect();
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация настроек окон
        if self.window.polling_interval_ms < 100 {
            anyhow::bail!("polling_interval_ms должно быть минимум 100");
        }

        // Валидация целей заморозки
        for (i, name) in self.freeze.target_executables.iter().enumerate() {
            if name.trim().is_empty() {
                anyhow::bail!("Пустое имя исполняемого файла в target_executables #{}", i + 1);
            }
            if name.contains('/') {
                anyhow::bail!(
                    "target_executables принимает имена без пути, получено: '{}'",
                    name
                );
            }
        }

        Ok(())
    }

    /// Является ли исполняемый файл целью заморозки (O(1))
    pub fn is_freeze_target(&self, executable_name: &str) -> bool {
        self.target_set_lower
            .contains(&executable_name.to_lowercase())
    }

    /// Игнорируется ли исполняемый файл при перечислении окон (O(1)),
    /// в дополнение к встроенному denylist
    pub fn is_ignored_executable(&self, executable_name: &str) -> bool {
        self.ignored_set_lower
            .contains(&executable_name.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_is_freeze_target() {
        let mut config = Config::default();
        config.freeze.target_executables = vec!["steam".to_string(), "Firefox".to_string()];
        config.build_optimization_indexes();

        assert!(config.is_freeze_target("steam"));
        assert!(config.is_freeze_target("firefox"));
        assert!(!config.is_freeze_target("vlc"));
    }

    #[test]
    fn test_empty_targets_freeze_nothing() {
        let config = Config::default();
        assert!(!config.is_freeze_target("steam"));
    }

    #[test]
    fn test_validate_rejects_path_in_target() {
        let mut config = Config::default();
        config.freeze.target_executables = vec!["/usr/bin/steam".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_polling_interval() {
        let mut config = Config::default();
        config.window.polling_interval_ms = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ignored_executables() {
        let mut config = Config::default();
        config.window.ignored_executables = vec!["albert".to_string()];
        config.build_optimization_indexes();

        assert!(config.is_ignored_executable("albert"));
        assert!(!config.is_ignored_executable("firefox"));
    }
}

use crate::error::KeepActiveError;
use crate::events::{ProcessEntry, WindowHandle};
use crate::services::window_system::WindowSystem;
use crate::{debug_if_enabled, trace_if_enabled};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Заголовок окна по умолчанию, если `-w` не задан
pub const DEFAULT_WINDOW_TITLE: &str = "CounterSide";

/// Встроенный список исполняемых файлов поддерживаемых игр (по порядку приоритета)
pub const DEFAULT_PROCESS_NAMES: &[&str] = &["CounterSide.exe"];

/// Описание цели: подсказки пользователя + встроенный список процессов.
/// Строится один раз при запуске и дальше не меняется.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    window_title_hints: Vec<String>,
    process_name_hints: Vec<String>,
    default_process_names: Vec<String>,
}

impl TargetSpec {
    /// Строит спецификацию из повторяемых флагов `-w` и `-e`.
    /// Любая заданная подсказка отключает встроенный список процессов.
    pub fn from_hints(window_titles: Vec<String>, process_names: Vec<String>) -> Self {
        let mut window_title_hints = normalize_list(window_titles);
        let process_name_hints = normalize_list(process_names);

        let user_specified = !window_title_hints.is_empty() || !process_name_hints.is_empty();
        let default_process_names = if user_specified {
            Vec::new()
        } else {
            DEFAULT_PROCESS_NAMES.iter().map(|s| s.to_string()).collect()
        };

        if window_title_hints.is_empty() {
            window_title_hints.push(DEFAULT_WINDOW_TITLE.to_string());
        }

        Self {
            window_title_hints,
            process_name_hints,
            default_process_names,
        }
    }

    pub fn window_title_hints(&self) -> &[String] {
        &self.window_title_hints
    }

    pub fn process_name_hints(&self) -> &[String] {
        &self.process_name_hints
    }

    pub fn default_process_names(&self) -> &[String] {
        &self.default_process_names
    }
}

#[cfg(test)]
impl TargetSpec {
    pub fn new(window_title_hint: impl Into<String>) -> Self {
        Self {
            window_title_hints: vec![window_title_hint.into()],
            process_name_hints: Vec::new(),
            default_process_names: Vec::new(),
        }
    }

    pub fn with_window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title_hints.push(title.into());
        self
    }

    pub fn with_process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name_hints.push(name.into());
        self
    }

    pub fn with_default_process_names(mut self, names: &[&str]) -> Self {
        self.default_process_names = names.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "окна [{}]", self.window_title_hints.join(", "))?;
        if !self.process_name_hints.is_empty() {
            write!(f, ", процессы [{}]", self.process_name_hints.join(", "))?;
        }
        if !self.default_process_names.is_empty() {
            write!(f, ", встроенный список [{}]", self.default_process_names.join(", "))?;
        }
        Ok(())
    }
}

/// Обрезает пробелы, выбрасывает пустые значения и повторы (без учёта регистра),
/// сохраняя порядок первого появления
fn normalize_list(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.to_lowercase()))
        .collect()
}

/// Превращает TargetSpec в ноль или одно окно на текущий момент.
///
/// Порядок (первое совпадение побеждает):
/// 1. процессы из `-e` по порядку -> первое видимое окно с непустым заголовком;
/// 2. встроенный список процессов, по порядку;
/// 3. заголовки из `-w` по порядку, точное совпадение.
///
/// Ошибки ОС не пробрасываются: для вызывающего они выглядят как "окно не найдено".
pub struct TargetResolver {
    system: Arc<dyn WindowSystem>,
}

impl TargetResolver {
    pub fn new(system: Arc<dyn WindowSystem>) -> Self {
        Self { system }
    }

    pub fn resolve(&self, spec: &TargetSpec) -> Option<WindowHandle> {
        let process_names = spec
            .process_name_hints()
            .iter()
            .chain(spec.default_process_names());

        for name in process_names {
            if let Some(window) = self.find_window_for_process(name) {
                return Some(window);
            }
        }

        for title in spec.window_title_hints() {
            if let Some(window) = self.system.find_window_by_title(title) {
                trace_if_enabled!("Окно {} найдено по заголовку \"{}\"", window, title);
                return Some(window);
            }
        }

        trace_if_enabled!("Цель не найдена: {}", spec);
        None
    }

    fn find_window_for_process(&self, name: &str) -> Option<WindowHandle> {
        let process = self.find_process(name)?;
        let window = self.find_window_by_pid(process.pid);
        if let Some(window) = window {
            trace_if_enabled!("Окно {} найдено по процессу {}", window, process);
        }
        window
    }

    fn find_process(&self, name: &str) -> Option<ProcessEntry> {
        match self.system.list_processes() {
            Ok(processes) => processes.into_iter().find(|p| p.matches_name(name)),
            Err(e) => {
                Self::log_absorbed(&e);
                None
            }
        }
    }

    fn find_window_by_pid(&self, pid: u32) -> Option<WindowHandle> {
        let windows = match self.system.enumerate_top_level_windows() {
            Ok(windows) => windows,
            Err(e) => {
                Self::log_absorbed(&e);
                return None;
            }
        };

        windows.into_iter().find(|&window| {
            self.system.window_owner_process(window) == Some(pid)
                && self.system.is_window_visible(window)
                && self.system.window_title_length(window) > 0
        })
    }

    fn log_absorbed(error: &KeepActiveError) {
        if error.is_transient() {
            debug_if_enabled!("Сбой запроса к ОС, повтор на следующем цикле: {}", error);
        } else {
            warn!("Неожиданная ошибка при поиске окна: {}", error);
        }
    }
}

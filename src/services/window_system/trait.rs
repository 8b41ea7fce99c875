use crate::error::Result;
use crate::events::{ProcessEntry, WindowHandle};
use std::sync::Arc;

/// Список запущенных процессов (снимок на момент вызова)
pub trait ProcessDirectory: Send + Sync {
    fn list_processes(&self) -> Result<Vec<ProcessEntry>>;
}

/// Окна верхнего уровня и их свойства
pub trait WindowDirectory: Send + Sync {
    /// Порядок определяется ОС
    fn enumerate_top_level_windows(&self) -> Result<Vec<WindowHandle>>;
    fn window_owner_process(&self, window: WindowHandle) -> Option<u32>;
    fn is_window_visible(&self, window: WindowHandle) -> bool;
    fn window_title_length(&self, window: WindowHandle) -> usize;
    /// Точное совпадение заголовка
    fn find_window_by_title(&self, title: &str) -> Option<WindowHandle>;
}

/// Доставка сигнала активации. Результат только логируется.
pub trait Activator: Send + Sync {
    fn activate(&self, window: WindowHandle) -> Result<()>;
}

pub trait WindowSystem: ProcessDirectory + WindowDirectory + Activator {
    fn name(&self) -> &'static str;
}

/// Factory function to create the window system backend based on the dry_run flag
pub fn create_window_system(dry_run: bool) -> Result<Arc<dyn WindowSystem>> {
    if dry_run {
        return Ok(Arc::new(super::dry_run::DryRunWindowSystem::new()));
    }

    #[cfg(windows)]
    {
        Ok(Arc::new(super::win32::Win32WindowSystem::new()))
    }

    #[cfg(not(windows))]
    {
        Err(crate::keep_active_error!(
            service_unavailable,
            "Win32 API доступен только на Windows, используйте --dry-run"
        ))
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeepActiveError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Не удалось получить снимок процессов/окон: {0}")]
    Snapshot(String),

    #[error("Не удалось запустить фоновую задачу: {0}")]
    TaskSpawn(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl KeepActiveError {
    /// Ошибки, которые не мешают следующему циклу опроса
    pub fn is_transient(&self) -> bool {
        matches!(self, KeepActiveError::Snapshot(_) | KeepActiveError::Internal(_))
    }
}

pub type Result<T> = std::result::Result<T, KeepActiveError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! keep_active_error {
    (snapshot, $($arg:tt)*) => {
        $crate::error::KeepActiveError::Snapshot(format!($($arg)*))
    };
    (task_spawn, $($arg:tt)*) => {
        $crate::error::KeepActiveError::TaskSpawn(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::KeepActiveError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::KeepActiveError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::KeepActiveError::Internal(format!($($arg)*))
    };
}

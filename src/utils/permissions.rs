use crate::error::Result;
use tracing::{info, warn};

/// Уровень прав текущего процесса
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Elevation {
    Elevated,
    Limited,
    Unsupported,
}

/// Проверить права доступа.
///
/// Игры, запущенные от администратора, молча игнорируют сообщения окон
/// от процессов с обычными правами (UIPI), поэтому без повышения прав
/// активация может не работать. Это только предупреждение.
pub fn check_permissions() -> Result<Elevation> {
    info!("Проверка прав доступа...");

    let elevation = current_elevation()?;
    match elevation {
        Elevation::Elevated => info!("Процесс запущен с правами администратора"),
        Elevation::Limited => {
            warn!("⚠️  Процесс запущен без прав администратора!");
            for line in setup_hints() {
                warn!("   {}", line);
            }
        }
        Elevation::Unsupported => info!("Проверка прав пропущена: доступна только на Windows"),
    }

    Ok(elevation)
}

#[cfg(windows)]
fn current_elevation() -> Result<Elevation> {
    use crate::keep_active_error;
    use std::ffi::c_void;
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY};
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    unsafe {
        let mut token = HANDLE::default();
        OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token)
            .map_err(|e| keep_active_error!(permission, "OpenProcessToken: {}", e))?;

        let mut elevation = TOKEN_ELEVATION::default();
        let mut size = std::mem::size_of::<TOKEN_ELEVATION>() as u32;
        let result = GetTokenInformation(
            token,
            TokenElevation,
            Some((&mut elevation as *mut TOKEN_ELEVATION).cast::<c_void>()),
            size,
            &mut size,
        );
        let _ = CloseHandle(token);

        result.map_err(|e| keep_active_error!(permission, "GetTokenInformation: {}", e))?;

        if elevation.TokenIsElevated != 0 {
            Ok(Elevation::Elevated)
        } else {
            Ok(Elevation::Limited)
        }
    }
}

#[cfg(not(windows))]
fn current_elevation() -> Result<Elevation> {
    Ok(Elevation::Unsupported)
}

/// Подсказки пользователю, как запустить утилиту с нужными правами
pub fn setup_hints() -> Vec<String> {
    vec![
        "Если игра запущена от имени администратора, запустите KeepActive так же:".to_string(),
        "ПКМ по keep-active.exe -> \"Запуск от имени администратора\"".to_string(),
        "или из терминала, открытого от имени администратора.".to_string(),
    ]
}

use crate::error::Result;
use crate::events::{ProcessEntry, WindowHandle};
use crate::keep_active_error;
use std::ffi::{c_void, OsStr};
use std::os::windows::ffi::OsStrExt;
use tracing::info;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, BOOL, HWND, LPARAM, WPARAM};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, FindWindowW, GetWindowTextLengthW, GetWindowThreadProcessId, IsWindowVisible,
    SendMessageTimeoutW, SMTO_ABORTIFHUNG, WM_ACTIVATE,
};

use super::r#trait::{Activator, ProcessDirectory, WindowDirectory, WindowSystem};

/// Окно активировано щелчком мыши: игры реагируют на него так же, как на реальный фокус
const WA_CLICKACTIVE: usize = 2;

/// Сколько ждать обработки WM_ACTIVATE, прежде чем считать окно зависшим
const ACTIVATE_TIMEOUT_MS: u32 = 500;

pub struct Win32WindowSystem;

impl Win32WindowSystem {
    pub fn new() -> Self {
        info!("Инициализация Win32WindowSystem");
        Self
    }
}

fn to_hwnd(window: WindowHandle) -> HWND {
    HWND(window.raw() as *mut c_void)
}

fn to_wide(value: &str) -> Vec<u16> {
    OsStr::new(value)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

fn wide_to_string(buffer: &[u16]) -> String {
    let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..len])
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let handles = &mut *(lparam.0 as *mut Vec<WindowHandle>);
    handles.push(WindowHandle::from_raw(hwnd.0 as isize));
    BOOL(1)
}

impl ProcessDirectory for Win32WindowSystem {
    fn list_processes(&self) -> Result<Vec<ProcessEntry>> {
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
            .map_err(|e| keep_active_error!(snapshot, "CreateToolhelp32Snapshot: {}", e))?;

        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut processes = Vec::new();
        unsafe {
            if Process32FirstW(snapshot, &mut entry).is_ok() {
                loop {
                    processes.push(ProcessEntry::new(
                        entry.th32ProcessID,
                        wide_to_string(&entry.szExeFile),
                    ));

                    if Process32NextW(snapshot, &mut entry).is_err() {
                        break;
                    }
                }
            }
            let _ = CloseHandle(snapshot);
        }

        Ok(processes)
    }
}

impl WindowDirectory for Win32WindowSystem {
    fn enumerate_top_level_windows(&self) -> Result<Vec<WindowHandle>> {
        let mut handles: Vec<WindowHandle> = Vec::new();
        let param = LPARAM(&mut handles as *mut Vec<WindowHandle> as isize);

        unsafe { EnumWindows(Some(collect_window), param) }
            .map_err(|e| keep_active_error!(snapshot, "EnumWindows: {}", e))?;

        Ok(handles)
    }

    fn window_owner_process(&self, window: WindowHandle) -> Option<u32> {
        let mut pid = 0u32;
        let thread_id = unsafe { GetWindowThreadProcessId(to_hwnd(window), Some(&mut pid)) };
        if thread_id == 0 {
            None
        } else {
            Some(pid)
        }
    }

    fn is_window_visible(&self, window: WindowHandle) -> bool {
        unsafe { IsWindowVisible(to_hwnd(window)) }.as_bool()
    }

    fn window_title_length(&self, window: WindowHandle) -> usize {
        let len = unsafe { GetWindowTextLengthW(to_hwnd(window)) };
        len.max(0) as usize
    }

    fn find_window_by_title(&self, title: &str) -> Option<WindowHandle> {
        let wide = to_wide(title);
        match unsafe { FindWindowW(PCWSTR::null(), PCWSTR(wide.as_ptr())) } {
            Ok(hwnd) if !hwnd.0.is_null() => Some(WindowHandle::from_raw(hwnd.0 as isize)),
            _ => None,
        }
    }
}

impl Activator for Win32WindowSystem {
    fn activate(&self, window: WindowHandle) -> Result<()> {
        // Зависшее окно не должно держать рабочий поток дольше таймаута
        let sent = unsafe {
            SendMessageTimeoutW(
                to_hwnd(window),
                WM_ACTIVATE,
                WPARAM(WA_CLICKACTIVE),
                LPARAM::default(),
                SMTO_ABORTIFHUNG,
                ACTIVATE_TIMEOUT_MS,
                None,
            )
        };

        if sent.0 == 0 {
            return Err(keep_active_error!(
                internal,
                "WM_ACTIVATE не доставлено окну {} за {}мс",
                window,
                ACTIVATE_TIMEOUT_MS
            ));
        }
        Ok(())
    }
}

impl WindowSystem for Win32WindowSystem {
    fn name(&self) -> &'static str {
        "win32"
    }
}

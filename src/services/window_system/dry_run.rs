use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{ProcessEntry, WindowHandle};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use super::r#trait::{Activator, ProcessDirectory, WindowDirectory, WindowSystem};

struct SimulatedWindow {
    handle: WindowHandle,
    owner_pid: u32,
    visible: bool,
    title: &'static str,
}

/// Эмуляция рабочего стола: фиксированный набор процессов и окон,
/// активация только пишется в лог.
pub struct DryRunWindowSystem {
    processes: Vec<ProcessEntry>,
    windows: Vec<SimulatedWindow>,
    last_activated: Mutex<Option<WindowHandle>>,
    activations: AtomicU64,
}

impl DryRunWindowSystem {
    pub fn new() -> Self {
        info!("Dry-run режим - WindowSystem работает в режиме эмуляции");

        let processes = vec![
            ProcessEntry::new(4, "explorer.exe"),
            ProcessEntry::new(1337, "CounterSide.exe"),
        ];

        // Скрытое окно-заставка идёт первым, как у настоящих игр
        let windows = vec![
            SimulatedWindow {
                handle: WindowHandle::from_raw(0x10),
                owner_pid: 4,
                visible: true,
                title: "Program Manager",
            },
            SimulatedWindow {
                handle: WindowHandle::from_raw(0x20),
                owner_pid: 1337,
                visible: false,
                title: "",
            },
            SimulatedWindow {
                handle: WindowHandle::from_raw(0x21),
                owner_pid: 1337,
                visible: true,
                title: "CounterSide",
            },
        ];

        Self {
            processes,
            windows,
            last_activated: Mutex::new(None),
            activations: AtomicU64::new(0),
        }
    }

    fn window(&self, handle: WindowHandle) -> Option<&SimulatedWindow> {
        self.windows.iter().find(|w| w.handle == handle)
    }
}

impl ProcessDirectory for DryRunWindowSystem {
    fn list_processes(&self) -> Result<Vec<ProcessEntry>> {
        Ok(self.processes.clone())
    }
}

impl WindowDirectory for DryRunWindowSystem {
    fn enumerate_top_level_windows(&self) -> Result<Vec<WindowHandle>> {
        Ok(self.windows.iter().map(|w| w.handle).collect())
    }

    fn window_owner_process(&self, window: WindowHandle) -> Option<u32> {
        self.window(window).map(|w| w.owner_pid)
    }

    fn is_window_visible(&self, window: WindowHandle) -> bool {
        self.window(window).map(|w| w.visible).unwrap_or(false)
    }

    fn window_title_length(&self, window: WindowHandle) -> usize {
        self.window(window).map(|w| w.title.len()).unwrap_or(0)
    }

    fn find_window_by_title(&self, title: &str) -> Option<WindowHandle> {
        self.windows
            .iter()
            .find(|w| !w.title.is_empty() && w.title == title)
            .map(|w| w.handle)
    }
}

impl Activator for DryRunWindowSystem {
    fn activate(&self, window: WindowHandle) -> Result<()> {
        let count = self.activations.fetch_add(1, Ordering::Relaxed) + 1;

        let mut last = self.last_activated.lock();
        if *last != Some(window) {
            info!("[DRY RUN] WM_ACTIVATE -> {}", window);
            *last = Some(window);
        } else {
            debug_if_enabled!("[DRY RUN] WM_ACTIVATE #{} -> {}", count, window);
        }
        Ok(())
    }
}

impl WindowSystem for DryRunWindowSystem {
    fn name(&self) -> &'static str {
        "dry-run"
    }
}

//! Test double for the OS capabilities.

use crate::error::Result;
use crate::events::{ProcessEntry, WindowHandle};
use crate::keep_active_error;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::r#trait::{Activator, ProcessDirectory, WindowDirectory, WindowSystem};

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub handle: WindowHandle,
    pub owner_pid: u32,
    pub visible: bool,
    pub title: String,
}

/// Настраиваемая таблица процессов и окон с журналом вызовов
#[derive(Default)]
pub struct FakeWindowSystem {
    processes: Mutex<Vec<ProcessEntry>>,
    windows: Mutex<Vec<FakeWindow>>,
    activations: Mutex<Vec<WindowHandle>>,
    title_lookups: Mutex<Vec<String>>,
    process_lookups: AtomicUsize,
    snapshot_fails: AtomicBool,
    activation_fails: AtomicBool,
    activation_panics: AtomicBool,
}

impl FakeWindowSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(self, pid: u32, name: &str) -> Self {
        self.processes.lock().push(ProcessEntry::new(pid, name));
        self
    }

    pub fn with_window(self, raw: isize, owner_pid: u32, visible: bool, title: &str) -> Self {
        self.windows.lock().push(FakeWindow {
            handle: WindowHandle::from_raw(raw),
            owner_pid,
            visible,
            title: title.to_string(),
        });
        self
    }

    pub fn fail_snapshots(&self, fail: bool) {
        self.snapshot_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_activations(&self, fail: bool) {
        self.activation_fails.store(fail, Ordering::SeqCst);
    }

    /// Следующие вызовы `activate` паникуют, имитируя падение рабочей задачи
    pub fn panic_on_activate(&self, panic: bool) {
        self.activation_panics.store(panic, Ordering::SeqCst);
    }

    pub fn activations(&self) -> Vec<WindowHandle> {
        self.activations.lock().clone()
    }

    pub fn activation_count(&self) -> usize {
        self.activations.lock().len()
    }

    pub fn title_lookups(&self) -> Vec<String> {
        self.title_lookups.lock().clone()
    }

    pub fn process_lookups(&self) -> usize {
        self.process_lookups.load(Ordering::SeqCst)
    }

    fn with_fake<T>(&self, handle: WindowHandle, f: impl FnOnce(&FakeWindow) -> T) -> Option<T> {
        self.windows.lock().iter().find(|w| w.handle == handle).map(f)
    }
}

impl ProcessDirectory for FakeWindowSystem {
    fn list_processes(&self) -> Result<Vec<ProcessEntry>> {
        self.process_lookups.fetch_add(1, Ordering::SeqCst);
        if self.snapshot_fails.load(Ordering::SeqCst) {
            return Err(keep_active_error!(snapshot, "fake snapshot failure"));
        }
        Ok(self.processes.lock().clone())
    }
}

impl WindowDirectory for FakeWindowSystem {
    fn enumerate_top_level_windows(&self) -> Result<Vec<WindowHandle>> {
        if self.snapshot_fails.load(Ordering::SeqCst) {
            return Err(keep_active_error!(snapshot, "fake enumeration failure"));
        }
        Ok(self.windows.lock().iter().map(|w| w.handle).collect())
    }

    fn window_owner_process(&self, window: WindowHandle) -> Option<u32> {
        self.with_fake(window, |w| w.owner_pid)
    }

    fn is_window_visible(&self, window: WindowHandle) -> bool {
        self.with_fake(window, |w| w.visible).unwrap_or(false)
    }

    fn window_title_length(&self, window: WindowHandle) -> usize {
        self.with_fake(window, |w| w.title.len()).unwrap_or(0)
    }

    fn find_window_by_title(&self, title: &str) -> Option<WindowHandle> {
        self.title_lookups.lock().push(title.to_string());
        self.windows
            .lock()
            .iter()
            .find(|w| w.title == title)
            .map(|w| w.handle)
    }
}

impl Activator for FakeWindowSystem {
    fn activate(&self, window: WindowHandle) -> Result<()> {
        if self.activation_panics.load(Ordering::SeqCst) {
            panic!("fake activation panic for {}", window);
        }
        self.activations.lock().push(window);
        if self.activation_fails.load(Ordering::SeqCst) {
            return Err(keep_active_error!(internal, "SendMessageW ignored"));
        }
        Ok(())
    }
}

impl WindowSystem for FakeWindowSystem {
    fn name(&self) -> &'static str {
        "fake"
    }
}

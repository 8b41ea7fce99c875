use std::fmt;

/// Непрозрачный дескриптор окна верхнего уровня.
///
/// Значение действительно только в рамках вызова ОС, который его вернул:
/// дескриптор не кэшируется и заново разрешается на каждом цикле опроса.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(isize);

impl WindowHandle {
    pub fn from_raw(raw: isize) -> Self {
        Self(raw)
    }

    #[cfg(any(windows, test))]
    pub fn raw(&self) -> isize {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HWND(0x{:X})", self.0)
    }
}

/// Строка снимка процессов
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub executable_name: String,
}

impl ProcessEntry {
    pub fn new(pid: u32, executable_name: impl Into<String>) -> Self {
        Self {
            pid,
            executable_name: executable_name.into(),
        }
    }

    /// Сравнение имени исполняемого файла без учёта регистра
    pub fn matches_name(&self, name: &str) -> bool {
        self.executable_name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for ProcessEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pid {})", self.executable_name, self.pid)
    }
}

use std::fmt;

/// Команда интерактивной консоли: один символ на строку
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Quit,
    Unknown(String),
}

impl ControlCommand {
    /// Разбор строки, введённой пользователем (пробелы по краям игнорируются)
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "1" => ControlCommand::Start,
            "0" => ControlCommand::Stop,
            "q" | "Q" => ControlCommand::Quit,
            other => ControlCommand::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::Start => write!(f, "start"),
            ControlCommand::Stop => write!(f, "stop"),
            ControlCommand::Quit => write!(f, "quit"),
            ControlCommand::Unknown(raw) => write!(f, "unknown({:?})", raw),
        }
    }
}

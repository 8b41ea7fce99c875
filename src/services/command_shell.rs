use crate::debug_if_enabled;
use crate::error::{KeepActiveError, Result};
use crate::events::ControlCommand;
use crate::services::activation_controller::{ActivationController, Transition};
use std::future::Future;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info};

/// Итог интерактивной сессии
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub spawn_failures: u32,
}

impl SessionOutcome {
    /// 0 - обычный выход, 1 - хотя бы одна фоновая задача не смогла запуститься
    pub fn exit_code(&self) -> i32 {
        if self.spawn_failures == 0 {
            0
        } else {
            1
        }
    }
}

/// Интерактивная консоль: `1` - старт, `0` - стоп, `q` - стоп и выход.
///
/// `shutdown` завершает сессию так же, как `q` (Ctrl+C в main).
/// Конец ввода тоже считается выходом.
pub struct CommandShell<R, W> {
    input: R,
    output: W,
}

impl<R, W> CommandShell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn print_banner(&mut self, controller: &ActivationController) -> Result<()> {
        let spec = controller.spec();
        writeln!(self.output, "KeepActive v{}", env!("CARGO_PKG_VERSION"))?;
        if spec.process_name_hints().is_empty() {
            writeln!(self.output, "Исполняемый файл: не задан")?;
        } else {
            writeln!(
                self.output,
                "Исполняемый файл: {}",
                spec.process_name_hints().join(", ")
            )?;
        }
        if !spec.default_process_names().is_empty() {
            writeln!(
                self.output,
                "Встроенный список: {}",
                spec.default_process_names().join(", ")
            )?;
        }
        writeln!(
            self.output,
            "Заголовок окна: {}",
            spec.window_title_hints().join(", ")
        )?;
        writeln!(self.output, "----------------------------------------")?;
        writeln!(self.output, "Команды: 1 = старт, 0 = стоп, q = выход")?;
        Ok(())
    }

    pub async fn run<F>(
        &mut self,
        controller: &mut ActivationController,
        shutdown: F,
    ) -> Result<SessionOutcome>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut outcome = SessionOutcome { spawn_failures: 0 };
        let mut line = String::new();

        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;

            line.clear();
            let read = tokio::select! {
                read = self.input.read_line(&mut line) => read?,
                _ = &mut shutdown => {
                    info!("Получен сигнал завершения");
                    writeln!(self.output)?;
                    break;
                }
            };

            if read == 0 {
                info!("Ввод закрыт, завершаем работу");
                writeln!(self.output)?;
                break;
            }

            let command = ControlCommand::parse(&line);
            debug_if_enabled!("Команда: {}", command);

            match command {
                ControlCommand::Start => match controller.start() {
                    Ok(Transition::AlreadyRunning) => writeln!(self.output, "Уже запущено.")?,
                    Ok(Transition::StopPending) => writeln!(
                        self.output,
                        "Остановка ещё не завершена, повторите команду 0."
                    )?,
                    Ok(_) => writeln!(self.output, "Активация запущена.")?,
                    Err(e @ KeepActiveError::TaskSpawn(_)) => {
                        error!("{}", e);
                        outcome.spawn_failures += 1;
                        writeln!(self.output, "Ошибка: {}", e)?;
                    }
                    Err(e) => return Err(e),
                },
                ControlCommand::Stop => match controller.stop().await {
                    Transition::AlreadyStopped => writeln!(self.output, "Не запущено.")?,
                    _ => writeln!(self.output, "Активация остановлена.")?,
                },
                ControlCommand::Quit => break,
                ControlCommand::Unknown(raw) => {
                    writeln!(self.output, "Неизвестная команда: {}", raw)?
                }
            }
        }

        controller.shutdown().await;
        writeln!(self.output, "Выход.")?;
        Ok(outcome)
    }
}

#[cfg(test)]
impl<R, W> CommandShell<R, W> {
    pub fn into_output(self) -> W {
        self.output
    }
}

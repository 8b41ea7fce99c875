use anyhow::Result;
use clap::{ArgAction, Parser};
use tokio::io::BufReader;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::{CliOverrides, Config};
use services::{create_window_system, ActivationController, CommandShell, TargetSpec};

#[derive(Parser, Debug)]
#[command(name = "keep-active")]
#[command(version, about = "Периодически активирует окно игры, чтобы она не замирала в фоне")]
struct Args {
    /// Заголовок окна (точное совпадение, запасной вариант), можно повторять
    #[arg(short = 'w', long = "window", value_name = "TITLE", action = ArgAction::Append)]
    window: Vec<String>,

    /// Имя исполняемого файла, например game.exe, можно повторять
    #[arg(short = 'e', long = "exe", value_name = "NAME", action = ArgAction::Append)]
    exe: Vec<String>,

    /// Режим сухого запуска (эмуляция окон, без реальных сообщений)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long)]
    log_level: Option<String>,

    /// Период опроса в миллисекундах
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Конфигурация: значения по умолчанию -> KEEPACTIVE_* -> командная строка
    let config = Config::load(&CliOverrides {
        log_level: args.log_level.clone(),
        polling_interval_ms: args.interval_ms,
    })?;

    init_tracing(&config)?;

    info!("Запуск KeepActive v{}", env!("CARGO_PKG_VERSION"));

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    // Предупреждение, если права ниже, чем могут быть у игры
    if let Err(e) = utils::permissions::check_permissions() {
        warn!("Не удалось проверить права доступа: {}", e);
    }

    let spec = TargetSpec::from_hints(args.window, args.exe);
    info!("Цель: {}", spec);

    let system = create_window_system(args.dry_run)?;
    let mut controller = ActivationController::new(spec, system, config.polling_interval());

    let mut shell = CommandShell::new(BufReader::new(tokio::io::stdin()), std::io::stdout());
    shell.print_banner(&controller)?;

    let shutdown = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
            std::future::pending::<()>().await;
        }
    };

    let outcome = shell.run(&mut controller, shutdown).await?;

    info!("KeepActive завершил работу");

    let code = outcome.exit_code();
    if code != 0 {
        error!("Фоновую задачу не удалось запустить ({} раз)", outcome.spawn_failures);
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(config: &Config) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))?;

    // Логи в stderr, чтобы не мешать приглашению консоли в stdout
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match config.logging.format.as_str() {
        "pretty" => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.pretty())
            .init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.compact())
            .init(),
    }

    Ok(())
}

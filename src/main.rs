use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use services::{create_window_manager, Freezer};

#[derive(Parser, Debug)]
#[command(name = "bgfreeze-rust")]
#[command(about = "Утилита для приостановки фоновых процессов")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "bgfreeze.toml")]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Инициализация системы логирования
    init_tracing(&args.log_level)?;

    info!("Запуск BgFreeze Rust v{}", env!("CARGO_PKG_VERSION"));

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config)?);
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    if config.freeze.target_executables.is_empty() {
        warn!("target_executables пуст - ни один процесс не будет заморожен");
    }

    // Проверка наличия внешних утилит
    if !args.dry_run {
        utils::tools::check_required_tools()?;
    }

    // Инициализация компонентов
    let window_manager = create_window_manager(config.clone(), args.dry_run).await?;
    let freezer = Arc::new(Freezer::new(config.clone(), Arc::from(window_manager), args.dry_run));

    info!("Все компоненты инициализированы");

    // Запуск сервиса опроса окон
    let freezer_task = freezer.clone();
    let freezer_handle = tokio::spawn(async move {
        if let Err(e) = freezer_task.run().await {
            error!("Ошибка в Freezer: {}", e);
        }
    });

    info!("Сервис запущен");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Останавливаем цикл опроса и дожидаемся его завершения (с таймаутом):
    // abort прерывает задачу только на точке await, а внутри tick есть
    // длинные синхронные участки (Command::output). Недожатый tick мог бы
    // заморозить процесс уже после разморозки.
    freezer_handle.abort();

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = freezer_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Сервис завершил работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервиса"),
    }

    // Гарантируем отсутствие замороженных процессов после выхода
    freezer.thaw_all_gracefully().await;

    info!("BgFreeze Rust завершил работу");
    Ok(())
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    Ok(())
}

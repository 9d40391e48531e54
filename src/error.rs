use thiserror::Error;

#[derive(Error, Debug)]
pub enum FreezeError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Внешняя утилита не найдена: {0}")]
    ToolNotFound(String),

    #[error("Внешняя утилита завершилась с ошибкой: {0}")]
    ToolFailed(String),

    #[error("Не удалось разобрать вывод утилиты: {0}")]
    Parse(String),

    #[error("Не удалось отправить сигнал процессу: {0}")]
    Signal(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl FreezeError {
    pub fn tool_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(FreezeError::ToolNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, FreezeError>;

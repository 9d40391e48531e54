use crate::error::{FreezeError, Result};
use std::io::ErrorKind;
use std::process::Command;
use tracing::{debug, info};

const REQUIRED_TOOLS: &[&str] = &["wmctrl", "xdotool", "readlink"];

/// Проверить наличие внешних утилит до запуска сервисов
///
/// Нас интересует только присутствие бинарника в PATH; код возврата
/// не проверяется (wmctrl без аргументов завершается с ошибкой).
pub fn check_required_tools() -> Result<()> {
    for tool in REQUIRED_TOOLS {
        match Command::new(tool).output() {
            Ok(_) => debug!("Утилита {} найдена", tool),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return FreezeError::tool_not_found(format!(
                    "{} не найден в PATH. Установите пакет {}",
                    tool, tool
                ));
            }
            Err(e) => return Err(FreezeError::Io(e)),
        }
    }

    info!("Все внешние утилиты найдены: {}", REQUIRED_TOOLS.join(", "));
    Ok(())
}

//! WindowManager service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for desktop-environment
//! introspection: listing windows, identifying the active window and
//! minimizing/restoring windows through the mechanism the current session
//! provides (X11 tools or the KWin scripting engine). It MUST NOT contain any
//! business logic about which processes get frozen. All freeze decisions are
//! made exclusively by Freezer, using Config::is_freeze_target().

mod dry_run;
mod kwin;
mod x11;

pub use dry_run::DryRunWindowManager;
pub use kwin::KWinWindowManager;
pub use x11::X11WindowManager;

use crate::config::Config;
use crate::error::Result;
use crate::events::Window;
use crate::services::session::{DesktopFlavor, DisplayProtocol, SessionType};
use std::sync::Arc;
use tracing::{info, warn};

/// Trait for window managers that can run in different sessions
#[async_trait::async_trait]
pub trait WindowManagerTrait: Send + Sync {
    /// Перечислить окна приложений (после фильтрации оболочки рабочего стола)
    async fn list_windows(&self) -> Result<Vec<Window>>;

    /// Текущее активное окно
    async fn active_window(&self) -> Result<Window>;

    /// Свернуть окно
    async fn minimize(&self, window: &Window) -> Result<()>;

    /// Восстановить (развернуть и активировать) окно
    async fn restore(&self, window: &Window) -> Result<()>;
}

/// Factory function to create an appropriate window manager based on the
/// detected session type and the dry_run flag
pub async fn create_window_manager(
    config: Arc<Config>,
    dry_run: bool,
) -> Result<Box<dyn WindowManagerTrait>> {
    if dry_run {
        return Ok(Box::new(DryRunWindowManager::new()));
    }

    let session = SessionType::detect()?;

    match (session.protocol, session.flavor) {
        (DisplayProtocol::Wayland, DesktopFlavor::Kde) => {
            info!("Сессия {}: используем KWin scripting через D-Bus", session);
            Ok(Box::new(KWinWindowManager::new(config).await?))
        }
        (DisplayProtocol::Wayland, _) => {
            warn!(
                "Сессия {}: KWin недоступен, откатываемся на X11 утилиты через XWayland",
                session
            );
            Ok(Box::new(X11WindowManager::new(config)))
        }
        (DisplayProtocol::X11, _) => {
            info!("Сессия {}: используем wmctrl/xdotool", session);
            Ok(Box::new(X11WindowManager::new(config)))
        }
    }
}

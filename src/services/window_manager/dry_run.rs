use crate::error::Result;
use crate::events::Window;
use tracing::info;

use super::WindowManagerTrait;

/// Менеджер окон для dry-run режима: эмулирует рабочий стол с
/// фиксированным набором окон и только логирует действия
pub struct DryRunWindowManager;

impl DryRunWindowManager {
    pub fn new() -> Self {
        info!("Dry-run режим - WindowManager работает в режиме эмуляции");
        Self
    }

    fn fake_windows() -> Vec<Window> {
        vec![
            Window::new("0x00000001".to_string(), "Terminal - dry_run".to_string())
                .with_pid(1001)
                .with_executable("/usr/bin/bash".to_string()),
            Window::new("0x00000002".to_string(), "Browser - dry_run".to_string())
                .with_pid(1002)
                .with_executable("/usr/lib/firefox/firefox".to_string()),
            Window::new("0x00000003".to_string(), "Game - dry_run".to_string())
                .with_pid(1003)
                .with_executable("/usr/bin/steam".to_string()),
        ]
    }
}

#[async_trait::async_trait]
impl WindowManagerTrait for DryRunWindowManager {
    async fn list_windows(&self) -> Result<Vec<Window>> {
        Ok(Self::fake_windows())
    }

    async fn active_window(&self) -> Result<Window> {
        // Активным всегда считается терминал
        Ok(Self::fake_windows().remove(0))
    }

    async fn minimize(&self, window: &Window) -> Result<()> {
        info!("Dry-run: эмулируем сворачивание окна {}", window);
        Ok(())
    }

    async fn restore(&self, window: &Window) -> Result<()> {
        info!("Dry-run: эмулируем восстановление окна {}", window);
        Ok(())
    }
}

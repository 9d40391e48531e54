use crate::config::Config;
use crate::error::{FreezeError, Result};
use crate::events::Window;
use crate::services::window_manager::WindowManagerTrait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

/// Freezer: приостановка фоновых процессов
///
/// Опрашивает менеджер окон по интервалу. Окна целевых процессов
/// (Config::target_executables), не являющиеся активным окном,
/// сворачиваются, а их процессы получают SIGSTOP. Когда замороженное
/// окно снова становится активным, процесс получает SIGCONT.
pub struct Freezer {
    config: Arc<Config>,
    window_manager: Arc<dyn WindowManagerTrait>,
    // PID -> окно на момент заморозки (нужно для restore при завершении)
    frozen: Mutex<HashMap<u32, Window>>,
    dry_run: bool,
}

impl Freezer {
    pub fn new(
        config: Arc<Config>,
        window_manager: Arc<dyn WindowManagerTrait>,
        dry_run: bool,
    ) -> Self {
        Self {
            config,
            window_manager,
            frozen: Mutex::new(HashMap::new()),
            dry_run,
        }
    }

    pub async fn run(&self) -> Result<()> {
        info!(
            "Freezer запущен, интервал опроса {} мс, целей: {}",
            self.config.window.polling_interval_ms,
            self.config.freeze.target_executables.len()
        );

        let mut interval = interval(Duration::from_millis(self.config.window.polling_interval_ms));

        loop {
            interval.tick().await;

            if let Err(e) = self.tick().await {
                warn!("Цикл заморозки завершился с ошибкой: {}", e);
            }
        }
    }

    async fn tick(&self) -> Result<()> {
        let windows = self.window_manager.list_windows().await?;
        let active = self.window_manager.active_window().await?;

        // Активное окно целевого процесса размораживаем первым
        if let Some(pid) = active.pid {
            let was_frozen = self.frozen.lock().contains_key(&pid);
            if was_frozen {
                self.thaw(pid)?;
                info!("Разморожен активный процесс {} (PID {})", active, pid);
            }
        }

        for window in freeze_candidates(&windows, &active, &self.config) {
            let pid = match window.pid {
                Some(pid) => pid,
                None => continue,
            };

            if self.frozen.lock().contains_key(&pid) {
                continue;
            }

            if self.config.freeze.minimize_on_freeze {
                self.window_manager.minimize(window).await?;
            }
            self.send_signal(pid, Signal::SIGSTOP)?;
            self.frozen.lock().insert(pid, window.clone());
            info!("Заморожен фоновый процесс {} (PID {})", window, pid);
        }

        Ok(())
    }

    fn thaw(&self, pid: u32) -> Result<()> {
        let removed = self.frozen.lock().remove(&pid);
        let result = self.send_signal(pid, Signal::SIGCONT);
        if result.is_err() {
            if let Some(window) = removed {
                warn!("SIGCONT не доставлен окну {}", window);
            }
        }
        result
    }

    /// Разморозить все процессы и восстановить их окна (вызывается при завершении)
    pub async fn thaw_all_gracefully(&self) {
        if !self.config.freeze.resume_on_exit {
            debug!("resume_on_exit выключен - оставляем процессы замороженными");
            return;
        }

        let frozen: Vec<(u32, Window)> = self.frozen.lock().drain().collect();
        if frozen.is_empty() {
            return;
        }

        info!("Размораживаем {} процессов перед завершением", frozen.len());

        for (pid, window) in frozen {
            if let Err(e) = self.send_signal(pid, Signal::SIGCONT) {
                warn!("Не удалось разморозить PID {}: {}", pid, e);
                continue;
            }
            if let Err(e) = self.window_manager.restore(&window).await {
                warn!("Не удалось восстановить окно {}: {}", window, e);
            }
            info!("Разморожен {} (PID {})", window, pid);
        }
    }

    fn send_signal(&self, pid: u32, signal: Signal) -> Result<()> {
        if self.dry_run {
            info!("Dry-run: эмулируем {} для PID {}", signal, pid);
            return Ok(());
        }

        kill(Pid::from_raw(pid as i32), signal)
            .map_err(|e| FreezeError::Signal(format!("{} PID {}: {}", signal, pid, e)))
    }
}

/// Выбрать окна целевых процессов, находящиеся в фоне
fn freeze_candidates<'a>(
    windows: &'a [Window],
    active: &Window,
    config: &Config,
) -> Vec<&'a Window> {
    windows
        .iter()
        .filter(|w| config.is_freeze_target(w.executable_name()))
        .filter(|w| w.id != active.id && (w.pid.is_none() || w.pid != active.pid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(id: &str, pid: u32, executable: &str) -> Window {
        Window::new(id.to_string(), format!("{} window", executable))
            .with_pid(pid)
            .with_executable(format!("/usr/bin/{}", executable))
    }

    fn config_with_targets(targets: &[&str]) -> Config {
        let mut config = Config::default();
        config.freeze.target_executables = targets.iter().map(|s| s.to_string()).collect();
        config.build_optimization_indexes();
        config
    }

    #[test]
    fn test_freeze_candidates_skip_non_targets() {
        let config = config_with_targets(&["steam"]);
        let windows = vec![
            window("0x01", 100, "steam"),
            window("0x02", 200, "firefox"),
        ];
        let active = window("0x03", 300, "bash");

        let candidates = freeze_candidates(&windows, &active, &config);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "0x01");
    }

    #[test]
    fn test_freeze_candidates_skip_active_window() {
        let config = config_with_targets(&["steam"]);
        let windows = vec![window("0x01", 100, "steam")];
        let active = window("0x01", 100, "steam");

        assert!(freeze_candidates(&windows, &active, &config).is_empty());
    }

    #[test]
    fn test_freeze_candidates_skip_active_pid_other_window() {
        // Второе окно того же процесса, что и активное - не замораживаем
        let config = config_with_targets(&["steam"]);
        let windows = vec![window("0x02", 100, "steam")];
        let active = window("0x01", 100, "steam");

        assert!(freeze_candidates(&windows, &active, &config).is_empty());
    }

    #[test]
    fn test_freeze_candidates_empty_targets() {
        let config = config_with_targets(&[]);
        let windows = vec![window("0x01", 100, "steam")];
        let active = window("0x03", 300, "bash");

        assert!(freeze_candidates(&windows, &active, &config).is_empty());
    }

    /// Менеджер окон с синхронным хвостом в active_window - как у реальных
    /// backend'ов, где каждый вызов Command::output блокирует без точек await
    struct SlowWindowManager;

    #[async_trait::async_trait]
    impl WindowManagerTrait for SlowWindowManager {
        async fn list_windows(&self) -> crate::error::Result<Vec<Window>> {
            Ok(vec![window("0x01", 100, "steam")])
        }

        async fn active_window(&self) -> crate::error::Result<Window> {
            std::thread::sleep(std::time::Duration::from_millis(200));
            Ok(window("0x02", 200, "bash"))
        }

        async fn minimize(&self, _window: &Window) -> crate::error::Result<()> {
            Ok(())
        }

        async fn restore(&self, _window: &Window) -> crate::error::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_mid_tick_leaves_no_frozen_processes() {
        let mut config = config_with_targets(&["steam"]);
        config.window.polling_interval_ms = 100;
        config.freeze.minimize_on_freeze = false;
        config.build_optimization_indexes();
        let config = Arc::new(config);

        let window_manager: Arc<dyn WindowManagerTrait> = Arc::new(SlowWindowManager);
        let freezer = Arc::new(Freezer::new(config, window_manager, true));

        let freezer_task = freezer.clone();
        let handle = tokio::spawn(async move {
            let _ = freezer_task.run().await;
        });

        // Даём циклу войти в синхронный участок tick
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Порядок завершения как в main: abort, дождаться задачи, потом thaw.
        // Недожатый tick ещё успеет вставить PID 100 в frozen - thaw обязан
        // выполниться после этого
        handle.abort();
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        freezer.thaw_all_gracefully().await;

        assert!(
            freezer.frozen.lock().is_empty(),
            "после thaw_all_gracefully не должно остаться замороженных процессов"
        );
    }
}

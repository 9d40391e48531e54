use crate::config::Config;
use crate::error::{FreezeError, Result};
use crate::events::Window;
use once_cell::sync::OnceCell;
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

use super::WindowManagerTrait;

/// Встроенный denylist: исполняемые файлы оболочки рабочего стола,
/// чьи окна никогда не считаются окнами приложений
const SHELL_EXECUTABLE_DENYLIST: &[&str] = &[
    "plasmashell",
    "krunner",
    "kwin_x11",
    "kwin_wayland",
    "gnome-shell",
    "mutter",
    "xfwm4",
    "xfdesktop",
    "polybar",
    "waybar",
    "latte-dock",
    "plank",
];

/// Менеджер окон для X11 сессий (и Wayland через XWayland)
///
/// Прямое делегирование внешним утилитам: wmctrl для перечисления,
/// xdotool для активного окна и minimize/restore, readlink для
/// определения исполняемого файла процесса.
pub struct X11WindowManager {
    config: Arc<Config>,
    // Мемоизированный номер текущего рабочего стола
    current_desktop: OnceCell<i32>,
}

impl X11WindowManager {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            current_desktop: OnceCell::new(),
        }
    }

    fn run_tool(tool: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(tool)
            .args(args)
            .output()
            .map_err(|e| FreezeError::ToolNotFound(format!("{} не найден: {}", tool, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FreezeError::ToolFailed(format!(
                "{} {}: {}",
                tool,
                args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Номер текущего рабочего стола (мемоизировано на процесс)
    fn current_desktop(&self) -> Result<i32> {
        self.current_desktop
            .get_or_try_init(|| {
                let stdout = Self::run_tool("wmctrl", &["-d"])?;
                parse_current_desktop(&stdout)
            })
            .copied()
    }

    /// Полный путь к исполняемому файлу процесса через readlink /proc/<pid>/exe
    fn resolve_executable(pid: u32) -> String {
        match Self::run_tool("readlink", &["-f", &format!("/proc/{}/exe", pid)]) {
            Ok(path) => path.trim().to_string(),
            Err(e) => {
                debug!("Не удалось определить исполняемый файл PID {}: {}", pid, e);
                String::new()
            }
        }
    }
}

#[async_trait::async_trait]
impl WindowManagerTrait for X11WindowManager {
    async fn list_windows(&self) -> Result<Vec<Window>> {
        let stdout = Self::run_tool("wmctrl", &["-lp"])?;
        let mut windows = parse_window_list(&stdout);

        // Липкие окна (desktop -1) - панели и доки, пропускаем всегда
        windows.retain(|w| w.desktop >= 0);

        if self.config.window.current_desktop_only {
            let current = self.current_desktop()?;
            windows.retain(|w| w.desktop == current);
        }

        let windows = windows
            .into_iter()
            .map(|w| match w.pid {
                Some(pid) => {
                    let executable = Self::resolve_executable(pid);
                    w.with_executable(executable)
                }
                None => w,
            })
            .filter(|w| !is_denylisted(w.executable_name(), &self.config))
            .collect();

        Ok(windows)
    }

    async fn active_window(&self) -> Result<Window> {
        let raw_id = Self::run_tool("xdotool", &["getactivewindow"])?;
        let raw_id = raw_id.trim();
        let numeric_id: u64 = raw_id
            .parse()
            .map_err(|_| FreezeError::Parse(format!("xdotool вернул не-числовой id окна: '{}'", raw_id)))?;

        let title = Self::run_tool("xdotool", &["getwindowname", raw_id])?
            .trim()
            .to_string();

        let mut window = Window::new(normalize_window_id(numeric_id), title);

        if let Ok(pid_out) = Self::run_tool("xdotool", &["getwindowpid", raw_id]) {
            if let Ok(pid) = pid_out.trim().parse::<u32>() {
                window = window
                    .with_pid(pid)
                    .with_executable(Self::resolve_executable(pid));
            }
        }

        Ok(window)
    }

    async fn minimize(&self, window: &Window) -> Result<()> {
        debug!("Сворачиваем окно {} через xdotool", window);
        Self::run_tool("xdotool", &["windowminimize", &window.id])?;
        Ok(())
    }

    async fn restore(&self, window: &Window) -> Result<()> {
        debug!("Восстанавливаем окно {} через xdotool", window);
        Self::run_tool("xdotool", &["windowactivate", &window.id])?;
        Ok(())
    }
}

/// Разобрать вывод `wmctrl -lp` в список окон
///
/// Формат строки: `0x03000007  0 1423   hostname Mozilla Firefox`
/// (id, рабочий стол, pid, хост, заголовок до конца строки)
fn parse_window_list(stdout: &str) -> Vec<Window> {
    let mut windows = Vec::new();

    for line in stdout.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        // Окно без заголовка даёт ровно 4 колонки
        if parts.len() < 4 {
            continue;
        }

        let Ok(desktop) = parts[1].parse::<i32>() else {
            continue;
        };

        let title = if parts.len() > 4 {
            parts[4..].join(" ")
        } else {
            String::new()
        };
        let mut window = Window::new(parts[0].to_string(), title).with_desktop(desktop);

        if let Ok(pid) = parts[2].parse::<u32>() {
            window = window.with_pid(pid);
        }

        windows.push(window);
    }

    windows
}

/// Найти номер активного рабочего стола в выводе `wmctrl -d`
/// (строка, помеченная звёздочкой во второй колонке)
fn parse_current_desktop(stdout: &str) -> Result<i32> {
    for line in stdout.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() >= 2 && parts[1] == "*" {
            return parts[0].parse().map_err(|_| {
                FreezeError::Parse(format!("Неверный номер рабочего стола в строке: '{}'", line))
            });
        }
    }

    Err(FreezeError::Parse(
        "Активный рабочий стол не найден в выводе wmctrl -d".to_string(),
    ))
}

/// Привести числовой id окна (десятичный вывод xdotool) к той же форме
/// `0x%08x`, в которой wmctrl печатает идентификаторы. Сопоставление
/// активного окна со списком окон опирается на это совпадение форм.
fn normalize_window_id(id: u64) -> String {
    format!("0x{:08x}", id)
}

fn is_denylisted(executable_name: &str, config: &Config) -> bool {
    SHELL_EXECUTABLE_DENYLIST
        .iter()
        .any(|name| executable_name.eq_ignore_ascii_case(name))
        || config.is_ignored_executable(executable_name)
}

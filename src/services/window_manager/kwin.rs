use crate::config::Config;
use crate::error::{FreezeError, Result};
use crate::events::Window;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use zbus::zvariant::ObjectPath;
use zbus::Connection;

use super::x11::X11WindowManager;
use super::WindowManagerTrait;

const KWIN_SERVICE: &str = "org.kde.KWin";
const SCRIPTING_PATH: &str = "/Scripting";
const SCRIPTING_INTERFACE: &str = "org.kde.kwin.Scripting";
const SCRIPT_INTERFACE: &str = "org.kde.kwin.Script";

/// Менеджер окон для Wayland/KDE сессий
///
/// Перечисление окон делегируется X11 утилитам (работает через XWayland),
/// а minimize/restore выполняются скриптовым движком KWin: параметризованный
/// JS-шаблон записывается во временный файл, путь и имя плагина передаются
/// в org.kde.kwin.Scripting через D-Bus session bus.
pub struct KWinWindowManager {
    x11: X11WindowManager,
    connection: Connection,
}

impl KWinWindowManager {
    pub async fn new(config: Arc<Config>) -> Result<Self> {
        let connection = Connection::session().await?;
        Ok(Self {
            x11: X11WindowManager::new(config),
            connection,
        })
    }

    /// Отрендерить скрипт, меняющий состояние minimized у окна.
    ///
    /// Шаблон пробует API KDE 6 (workspace.windowList) с откатом на KDE 5.
    fn render_script(window: &Window, minimized: bool) -> String {
        format!(
            r#"(function() {{
    var windows = typeof workspace.windowList === 'function'
        ? workspace.windowList()
        : workspace.clientList();
    for (var i = 0; i < windows.length; i++) {{
        var w = windows[i];
        var title = w.caption || '';
        if (w.pid === {pid} && title === "{title}") {{
            w.minimized = {minimized};
            break;
        }}
    }}
}})();
"#,
            pid = window.pid.unwrap_or(0),
            title = escape_js(&window.title),
            minimized = minimized,
        )
    }

    async fn run_script(&self, window: &Window, minimized: bool) -> Result<()> {
        let script = Self::render_script(window, minimized);
        let plugin_name = format!("bgfreeze_{}", std::process::id());
        let script_path = std::env::temp_dir().join(format!("{}.js", plugin_name));

        tokio::fs::write(&script_path, &script).await?;

        let result = self.load_and_run(&script_path, &plugin_name).await;

        // Выгружаем скрипт и убираем временный файл независимо от результата
        let _ = self
            .connection
            .call_method(
                Some(KWIN_SERVICE),
                SCRIPTING_PATH,
                Some(SCRIPTING_INTERFACE),
                "unloadScript",
                &(plugin_name.as_str(),),
            )
            .await;
        let _ = tokio::fs::remove_file(&script_path).await;

        result
    }

    async fn load_and_run(&self, script_path: &Path, plugin_name: &str) -> Result<()> {
        let path_str = script_path.to_string_lossy().into_owned();

        let reply = self
            .connection
            .call_method(
                Some(KWIN_SERVICE),
                SCRIPTING_PATH,
                Some(SCRIPTING_INTERFACE),
                "loadScript",
                &(path_str.as_str(), plugin_name),
            )
            .await?;

        let script_id: i32 = reply.body().deserialize()?;
        if script_id < 0 {
            return Err(FreezeError::ServiceUnavailable(format!(
                "KWin отказался загрузить скрипт {}",
                plugin_name
            )));
        }

        let object_path = ObjectPath::try_from(format!("/{}", script_id)).map_err(|e| {
            FreezeError::Internal(format!("Неверный путь объекта скрипта: {}", e))
        })?;

        self.connection
            .call_method(
                Some(KWIN_SERVICE),
                object_path.clone(),
                Some(SCRIPT_INTERFACE),
                "run",
                &(),
            )
            .await?;

        // Даём скрипту время выполниться до выгрузки
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let _ = self
            .connection
            .call_method(
                Some(KWIN_SERVICE),
                object_path,
                Some(SCRIPT_INTERFACE),
                "stop",
                &(),
            )
            .await;

        Ok(())
    }
}

#[async_trait::async_trait]
impl WindowManagerTrait for KWinWindowManager {
    async fn list_windows(&self) -> Result<Vec<Window>> {
        // Работает через XWayland
        self.x11.list_windows().await
    }

    async fn active_window(&self) -> Result<Window> {
        self.x11.active_window().await
    }

    async fn minimize(&self, window: &Window) -> Result<()> {
        debug!("Сворачиваем окно {} через KWin scripting", window);
        self.run_script(window, true).await
    }

    async fn restore(&self, window: &Window) -> Result<()> {
        debug!("Восстанавливаем окно {} через KWin scripting", window);
        self.run_script(window, false).await
    }
}

/// Экранировать строку для подстановки в JS-литерал с двойными кавычками
fn escape_js(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_js() {
        assert_eq!(escape_js("plain"), "plain");
        assert_eq!(escape_js(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_js(r"C:\path"), r"C:\\path");
        assert_eq!(escape_js("a\nb"), "a\\nb");
        // Перевод каретки тоже разорвал бы JS-литерал
        assert_eq!(escape_js("a\rb"), "a\\rb");
        assert_eq!(escape_js("a\r\nb"), "a\\r\\nb");
    }

    #[test]
    fn test_render_minimize_script() {
        let window = Window::new("0x03000007".to_string(), "Mozilla \"Firefox\"".to_string())
            .with_pid(1423);

        let script = KWinWindowManager::render_script(&window, true);

        assert!(script.contains("w.pid === 1423"));
        assert!(script.contains(r#"title === "Mozilla \"Firefox\"""#));
        assert!(script.contains("w.minimized = true"));
        assert!(script.contains("workspace.windowList"));
    }

    #[test]
    fn test_render_restore_script() {
        let window = Window::new("0x01".to_string(), "Steam".to_string()).with_pid(2811);

        let script = KWinWindowManager::render_script(&window, false);

        assert!(script.contains("w.minimized = false"));
    }

    #[test]
    fn test_render_script_without_pid() {
        let window = Window::new("0x01".to_string(), "t".to_string());
        let script = KWinWindowManager::render_script(&window, true);
        assert!(script.contains("w.pid === 0"));
    }
}

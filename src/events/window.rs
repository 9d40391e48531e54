use serde::{Deserialize, Serialize};
use std::fmt;

/// Информация об окне
///
/// Неизменяемая запись, создаваемая один раз из распарсенного вывода
/// внешних утилит (wmctrl/xdotool).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    /// Непрозрачный идентификатор окна в форме `0x%08x` (как печатает wmctrl)
    pub id: String,
    /// Номер рабочего стола (виртуального десктопа)
    pub desktop: i32,
    /// PID процесса-владельца
    pub pid: Option<u32>,
    /// Полный путь к исполняемому файлу владельца (из readlink /proc/<pid>/exe)
    pub executable: String,
    pub title: String,
}

impl Window {
    pub fn new(id: String, title: String) -> Self {
        Self {
            id,
            desktop: 0,
            pid: None,
            executable: String::new(),
            title,
        }
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    pub fn with_executable(mut self, executable: String) -> Self {
        self.executable = executable;
        self
    }

    pub fn with_desktop(mut self, desktop: i32) -> Self {
        self.desktop = desktop;
        self
    }

    /// Имя исполняемого файла без пути (последний компонент)
    pub fn executable_name(&self) -> &str {
        self.executable
            .rsplit('/')
            .next()
            .unwrap_or(self.executable.as_str())
    }

    /// Проверить, совпадает ли имя исполняемого файла (регистронезависимо)
    #[allow(dead_code)]
    pub fn matches_executable(&self, name: &str) -> bool {
        self.executable_name().eq_ignore_ascii_case(name)
    }

    /// Проверить, совпадает ли исполняемый файл с любым из списка
    #[allow(dead_code)]
    pub fn matches_any_executable(&self, names: &[String]) -> bool {
        names.iter().any(|name| self.matches_executable(name))
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.executable.is_empty() {
            write!(f, "\"{}\" [{}]", self.title, self.id)
        } else {
            write!(f, "\"{}\" [{}] ({})", self.title, self.id, self.executable_name())
        }
    }
}

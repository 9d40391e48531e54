use crate::error::{FreezeError, Result};
use once_cell::sync::OnceCell;
use std::fmt;
use tracing::debug;

/// Протокол дисплея из XDG_SESSION_TYPE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayProtocol {
    X11,
    Wayland,
}

/// Разновидность окружения рабочего стола из XDG_CURRENT_DESKTOP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesktopFlavor {
    Kde,
    Gnome,
    Other,
}

/// Тип сессии: протокол дисплея + окружение рабочего стола
///
/// Определяется один раз из переменных окружения и кэшируется
/// на всё время жизни процесса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionType {
    pub protocol: DisplayProtocol,
    pub flavor: DesktopFlavor,
}

static SESSION_TYPE: OnceCell<SessionType> = OnceCell::new();

impl SessionType {
    /// Определить тип сессии (мемоизировано на процесс)
    pub fn detect() -> Result<SessionType> {
        SESSION_TYPE
            .get_or_try_init(|| {
                let session = std::env::var("XDG_SESSION_TYPE").map_err(|_| {
                    FreezeError::Internal(
                        "Переменная окружения XDG_SESSION_TYPE не установлена".to_string(),
                    )
                })?;
                let desktop = std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default();

                let session_type = Self::from_env_values(&session, &desktop)?;
                debug!("Определён тип сессии: {}", session_type);
                Ok(session_type)
            })
            .copied()
    }

    /// Разобрать тип сессии из значений переменных окружения
    pub fn from_env_values(session: &str, desktop: &str) -> Result<SessionType> {
        let protocol = match session.trim().to_lowercase().as_str() {
            "x11" => DisplayProtocol::X11,
            "wayland" => DisplayProtocol::Wayland,
            other => {
                return Err(FreezeError::Internal(format!(
                    "Неизвестное значение XDG_SESSION_TYPE: '{}'",
                    other
                )))
            }
        };

        let desktop_lower = desktop.to_lowercase();
        let flavor = if desktop_lower.contains("kde") {
            DesktopFlavor::Kde
        } else if desktop_lower.contains("gnome") {
            DesktopFlavor::Gnome
        } else {
            DesktopFlavor::Other
        };

        Ok(SessionType { protocol, flavor })
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let protocol = match self.protocol {
            DisplayProtocol::X11 => "x11",
            DisplayProtocol::Wayland => "wayland",
        };
        let flavor = match self.flavor {
            DesktopFlavor::Kde => "kde",
            DesktopFlavor::Gnome => "gnome",
            DesktopFlavor::Other => "other",
        };
        write!(f, "{}/{}", protocol, flavor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x11_kde() {
        let session = SessionType::from_env_values("x11", "KDE").unwrap();
        assert_eq!(session.protocol, DisplayProtocol::X11);
        assert_eq!(session.flavor, DesktopFlavor::Kde);
    }

    #[test]
    fn test_wayland_gnome_composite_value() {
        // XDG_CURRENT_DESKTOP часто составной: "ubuntu:GNOME"
        let session = SessionType::from_env_values("wayland", "ubuntu:GNOME").unwrap();
        assert_eq!(session.protocol, DisplayProtocol::Wayland);
        assert_eq!(session.flavor, DesktopFlavor::Gnome);
    }

    #[test]
    fn test_unknown_desktop_is_other() {
        let session = SessionType::from_env_values("x11", "XFCE").unwrap();
        assert_eq!(session.flavor, DesktopFlavor::Other);

        let empty = SessionType::from_env_values("x11", "").unwrap();
        assert_eq!(empty.flavor, DesktopFlavor::Other);
    }

    #[test]
    fn test_invalid_session_type_fails() {
        assert!(SessionType::from_env_values("tty", "KDE").is_err());
        assert!(SessionType::from_env_values("", "KDE").is_err());
    }

    #[test]
    fn test_display_format() {
        let session = SessionType::from_env_values("wayland", "KDE").unwrap();
        assert_eq!(session.to_string(), "wayland/kde");
    }
}

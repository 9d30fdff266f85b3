use std::fmt;

/// Severity attached to a driver debug message.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverSeverity {
    /// Undefined behavior or a crash is likely.
    High,
    Medium,
    Low,
    Notification,
}

impl DriverSeverity {
    /// Log level for this severity. Each severity maps to exactly one level.
    pub fn level(self) -> log::Level {
        match self {
            DriverSeverity::High => log::Level::Error,
            DriverSeverity::Medium => log::Level::Error,
            DriverSeverity::Low => log::Level::Warn,
            DriverSeverity::Notification => log::Level::Info,
        }
    }
}

impl fmt::Display for DriverSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriverSeverity::High => "HIGH",
            DriverSeverity::Medium => "MEDIUM",
            DriverSeverity::Low => "LOW",
            DriverSeverity::Notification => "NOTE",
        })
    }
}

/// Subsystem that produced a driver debug message.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DriverSource {
    Api,
    ShaderCompiler,
    WindowSystem,
    ThirdParty,
    Application,
    Other,
}

impl fmt::Display for DriverSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DriverSource::Api => "API",
            DriverSource::ShaderCompiler => "SHADER",
            DriverSource::WindowSystem => "WINDOW",
            DriverSource::ThirdParty => "3RD PARTY",
            DriverSource::Application => "APP",
            DriverSource::Other => "OTHER",
        })
    }
}

/// One message emitted by the graphics driver's debug output.
#[derive(Debug, Clone)]
pub struct DriverMessage<'a> {
    pub source: DriverSource,
    pub severity: DriverSeverity,
    pub id: u32,
    pub text: &'a str,
}

impl DriverMessage<'_> {
    /// Emits the message through the `log` facade under the `gl` target.
    pub fn report(&self) {
        log::log!(
            target: "gl",
            self.severity.level(),
            "GL {} : {} : [{}] {}",
            self.severity,
            self.source,
            self.id,
            self.text
        );
    }
}

/// Level of a diagnostic raised by the windowing collaborator.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PlatformLevel {
    Info,
    Warning,
    Error,
}

/// Condition reported by the windowing collaborator.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PlatformCode {
    OutOfMemory,
    GlContext,
    EglContext,
    DirectXContext,
    FailedFunctionLoad,
    Wayland,
    X11,
    IoKit,
    Clipboard,
    Buffer,
    EventQueue,
    Window,
    Other(u32),
}

impl PlatformCode {
    /// Conditions after which the rendering context cannot be trusted.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            PlatformCode::OutOfMemory
                | PlatformCode::GlContext
                | PlatformCode::EglContext
                | PlatformCode::DirectXContext
                | PlatformCode::FailedFunctionLoad
        )
    }
}

impl fmt::Display for PlatformCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformCode::Other(code) => write!(f, "Other({code})"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Diagnostic forwarded from the windowing collaborator.
#[derive(Debug, Clone)]
pub struct PlatformMessage<'a> {
    pub level: PlatformLevel,
    pub code: PlatformCode,
    pub text: &'a str,
}

impl PlatformMessage<'_> {
    /// Fatal when an error-level message carries a fatal code.
    pub fn is_fatal(&self) -> bool {
        self.level == PlatformLevel::Error && self.code.is_fatal()
    }

    /// Logs the message and returns whether the host should stop.
    pub fn report(&self) -> bool {
        match self.level {
            PlatformLevel::Info => log::info!(target: "platform", "[{}] {}", self.code, self.text),
            PlatformLevel::Warning => {
                log::warn!(target: "platform", "[{}] {}", self.code, self.text)
            }
            PlatformLevel::Error => {
                log::error!(target: "platform", "[{}] {}", self.code, self.text)
            }
        }
        self.is_fatal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_do_not_overlap() {
        let levels = [
            DriverSeverity::High.level(),
            DriverSeverity::Medium.level(),
            DriverSeverity::Low.level(),
            DriverSeverity::Notification.level(),
        ];
        assert_eq!(
            levels,
            [log::Level::Error, log::Level::Error, log::Level::Warn, log::Level::Info]
        );
    }

    #[test]
    fn only_error_level_context_failures_are_fatal() {
        let fatal = PlatformMessage {
            level: PlatformLevel::Error,
            code: PlatformCode::GlContext,
            text: "context lost",
        };
        assert!(fatal.is_fatal());

        let warning = PlatformMessage {
            level: PlatformLevel::Warning,
            code: PlatformCode::GlContext,
            text: "fallback profile",
        };
        assert!(!warning.is_fatal());

        let clipboard = PlatformMessage {
            level: PlatformLevel::Error,
            code: PlatformCode::Clipboard,
            text: "no owner",
        };
        assert!(!clipboard.report());
    }
}

use crate::error::TelemetryError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Which side of the system emitted the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stack {
    Frontend,
    Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// The fixed set of package tags the collector accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Package {
    Api,
    Component,
    Hook,
    Page,
    State,
    Style,
    Auth,
    Config,
    Middleware,
    Utils,
}

macro_rules! string_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = TelemetryError;

            /// Case-insensitive; surrounding whitespace is ignored.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(TelemetryError::InvalidField {
                        field: $field,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(Stack, "stack", {
    Frontend => "frontend",
    Backend => "backend",
});

string_enum!(Level, "level", {
    Debug => "debug",
    Info => "info",
    Warn => "warn",
    Error => "error",
    Fatal => "fatal",
});

string_enum!(Package, "package", {
    Api => "api",
    Component => "component",
    Hook => "hook",
    Page => "page",
    State => "state",
    Style => "style",
    Auth => "auth",
    Config => "config",
    Middleware => "middleware",
    Utils => "utils",
});

/// A leveled event for the remote collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub stack: Stack,
    pub level: Level,
    pub message: String,
    pub package: Package,
}

impl LogEvent {
    pub fn new(stack: Stack, level: Level, message: impl AsRef<str>, package: Package) -> Self {
        Self {
            stack,
            level,
            message: message.as_ref().trim().to_string(),
            package,
        }
    }

    /// Builds an event from loosely typed strings, rejecting anything
    /// outside the allow-lists.
    pub fn parse(
        stack: &str,
        level: &str,
        message: &str,
        package: &str,
    ) -> Result<Self, TelemetryError> {
        Ok(Self::new(
            stack.parse()?,
            level.parse()?,
            message,
            package.parse()?,
        ))
    }

    /// Shorthand for backend events, which is everything this workspace emits.
    pub fn backend(level: Level, package: Package, message: impl AsRef<str>) -> Self {
        Self::new(Stack::Backend, level, message, package)
    }

    pub fn to_json(&self) -> Result<String, TelemetryError> {
        serde_json::to_string(self).map_err(|e| TelemetryError::Delivery(e.to_string()))
    }
}

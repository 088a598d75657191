/// The level at which a provider logs the notification passes it
/// forwards from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Warn,
    Info,
}

impl LogLevel {
    pub fn level(&self) -> log::Level {
        match self {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Trace
    }
}

/// Options for [provide_redux_with()](crate::provide_redux_with()).
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    log_level: LogLevel,
}

impl ProviderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the level at which notification passes are logged.
    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn get_log_level(&self) -> LogLevel {
        self.log_level
    }
}

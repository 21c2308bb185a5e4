#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// What to do when a checkpoint from an earlier run is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeMode {
    /// Prompt on a terminal; resume when running non-interactively.
    Ask,
    Resume,
    Fresh,
}

impl ResumeMode {
    pub fn from_flags(resume: bool, fresh: bool) -> Self {
        match (resume, fresh) {
            (true, _) => ResumeMode::Resume,
            (false, true) => ResumeMode::Fresh,
            (false, false) => ResumeMode::Ask,
        }
    }
}

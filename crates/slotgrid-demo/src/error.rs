use slotgrid_layout::LayoutError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("invalid step on line {line}: {message}")]
    InvalidStep { line: usize, message: String },

    #[error("step on line {line} rejected: {source}")]
    Rejected {
        line: usize,
        #[source]
        source: LayoutError,
    },

    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidStep { .. } => 2,
            Self::Rejected { .. } => 3,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid_step(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidStep {
            line,
            message: message.into(),
        }
    }
}

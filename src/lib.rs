pub mod cli;
pub mod config;
pub mod email;
pub mod group;
pub mod http;
pub mod i18n;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod storage;
pub mod summarize;
pub mod task;
pub mod todoist;
pub mod week;

#[derive(Debug)]
pub enum TdigestError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Http(String),
    Config(String),
    Llm(String),
    Email(String),
}

impl std::fmt::Display for TdigestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TdigestError::Io(e) => write!(f, "io: {e}"),
            TdigestError::Json(e) => write!(f, "json: {e}"),
            TdigestError::Http(msg) => write!(f, "http: {msg}"),
            TdigestError::Config(msg) => write!(f, "config: {msg}"),
            TdigestError::Llm(msg) => write!(f, "llm: {msg}"),
            TdigestError::Email(msg) => write!(f, "email: {msg}"),
        }
    }
}

impl std::error::Error for TdigestError {}

impl From<std::io::Error> for TdigestError {
    fn from(e: std::io::Error) -> Self {
        TdigestError::Io(e)
    }
}

impl From<serde_json::Error> for TdigestError {
    fn from(e: serde_json::Error) -> Self {
        TdigestError::Json(e)
    }
}

impl From<lettre::error::Error> for TdigestError {
    fn from(e: lettre::error::Error) -> Self {
        TdigestError::Email(format!("build message: {e}"))
    }
}

impl From<lettre::transport::smtp::Error> for TdigestError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        TdigestError::Email(format!("smtp: {e}"))
    }
}

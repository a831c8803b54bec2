#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },
    #[error("response did not contain an array of people/nodes")]
    MalformedResponse,
    #[error("family data JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

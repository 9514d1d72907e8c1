#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("user not found")]
    UserNotFound,

    #[error("topic not found")]
    TopicNotFound,

    #[error("email already registered")]
    AlreadyExists,

    #[error("invalid email or password")]
    Unauthorized,

    #[error("{0}")]
    InvalidInput(String),

    #[error("no search output for topic '{0}'")]
    ArtifactMissing(String),

    #[error("csv error: {0:?}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),

    #[error("malformed search output: {0:?}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}

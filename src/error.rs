#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Pattern error at byte {position}: {message}")]
    Compile { position: usize, message: String },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T = ()> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for the only error kind the pattern compiler produces.
    pub fn compile(position: usize, message: impl Into<String>) -> Self {
        Error::Compile {
            position,
            message: message.into(),
        }
    }
}

impl From<pg_query::Error> for Error {
    fn from(value: pg_query::Error) -> Self {
        Error::InvalidQuery(value.to_string())
    }
}

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("malformed template: unterminated token at byte {position}")]
    MalformedTemplate { position: usize },

    #[error("missing template parameter: {name}")]
    MissingParameter { name: String },

    #[error("{owner}: missing required configuration parameter: {option}")]
    MissingOption { owner: String, option: String },

    #[error("{owner}: unexpected configuration parameter: {option}")]
    UnexpectedOption { owner: String, option: String },

    #[error("malformed specification {spec:?}: {what}")]
    MalformedSpec { spec: String, what: &'static str },

    #[error("command failed: {program} (exit status {status})")]
    CommandFailed { program: String, status: i32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

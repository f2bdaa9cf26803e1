#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("empty input")]
    EmptyInput,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

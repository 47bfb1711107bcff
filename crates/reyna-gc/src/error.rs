use thiserror::Error;

#[derive(Debug, Error)]
pub enum GcError {
    #[error("heap exhausted: {requested} bytes requested, hard limit is {limit} bytes")]
    HeapExhausted { requested: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, GcError>;

use thiserror::Error;

/// Errors from worksheet name resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Every suffixed candidate up to the attempt limit is already taken.
    #[error("no free worksheet name for {desired:?} after {attempts} attempts")]
    NameSpaceExhausted { desired: String, attempts: u32 },
}

pub type NameResult<T> = Result<T, NameError>;

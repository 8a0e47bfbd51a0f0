use thiserror::Error;

#[derive(Debug, Error)]
pub enum TwinSemError {
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    #[error("unsupported model family: {0}")]
    UnsupportedFamily(String),

    #[error("insufficient groups for {family}: {reason}")]
    InsufficientGroups { family: String, reason: String },

    #[error("group order mismatch: specification has [{expected}], data has [{found}]")]
    GroupOrderMismatch { expected: String, found: String },

    #[error("duplicate group {0} with conflicting relatedness")]
    DuplicateGroup(String),

    #[error("invalid category count {0}: ordinal models need at least 2 categories")]
    InvalidCategories(usize),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, TwinSemError>;

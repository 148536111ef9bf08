#[derive(Debug, thiserror::Error)]
pub enum Error {
    // request errors

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("failed precondition: {message}")]
    FailedPrecondition { message: String },

    #[error("already exists: {message}")]
    AlreadyExists { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    // scheduling errors

    #[error("unavailable: {message}")]
    Unavailable { message: String },

    #[error("resource exhausted: {message}")]
    ResourceExhausted { message: String },

    // auth errors

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("unauthenticated: {message}")]
    Unauthenticated { message: String },

    // lifecycle errors

    #[error("canceled: {message}")]
    Canceled { message: String },

    #[error("data loss: {message}")]
    DataLoss { message: String },

    #[error("internal: {message}")]
    Internal { message: String },

    // unknown errors
    #[error("encountered unknown error")]
    Unknown {
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Error::FailedPrecondition {
            message: message.into(),
        }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Error::AlreadyExists {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Error::Unavailable {
            message: message.into(),
        }
    }

    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        Error::ResourceExhausted {
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Error::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Error::Unauthenticated {
            message: message.into(),
        }
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Error::Canceled {
            message: message.into(),
        }
    }

    pub fn data_loss(message: impl Into<String>) -> Self {
        Error::DataLoss {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    pub fn unknown(source: impl Into<anyhow::Error>) -> Self {
        Error::Unknown {
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied { .. })
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Error::Unauthenticated { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    pub fn is_resource_exhausted(&self) -> bool {
        matches!(self, Error::ResourceExhausted { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Unavailable { .. })
    }
}

pub trait ToUnknownErrorResult<T> {
    fn to_unknown_err_result(self) -> crate::types::Result<T>;
}

impl<T, E> ToUnknownErrorResult<T> for core::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn to_unknown_err_result(self) -> crate::types::Result<T> {
        self.map_err(|e| Error::Unknown { source: e.into() })
    }
}

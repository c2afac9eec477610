use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrismaError {
    #[error(transparent)]
    Api(#[from] crate::prismacloud::ApiError),

    #[error(transparent)]
    Resource(#[from] crate::resources::ResourceError),

    #[error(transparent)]
    Id(#[from] crate::resource_id::IdError),

    #[error(transparent)]
    Policy(#[from] crate::backoff::PolicyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_error_display() {
        let err = PrismaError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "configuration error: missing field");
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: PrismaError = io_err.into();
        assert!(matches!(err, PrismaError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_api_error_from_conversion() {
        let api_err = crate::prismacloud::ApiError::NotFound {
            what: "user role 'x'".to_string(),
        };
        let err: PrismaError = api_err.into();
        assert!(matches!(err, PrismaError::Api(_)));
        assert_eq!(err.to_string(), "object not found: user role 'x'");
    }

    #[test]
    fn test_id_error_from_conversion() {
        let err: PrismaError = crate::resource_id::decode("???").unwrap_err().into();
        assert!(matches!(err, PrismaError::Id(_)));
        assert!(err.to_string().starts_with("malformed resource identifier"));
    }
}

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HydroShareError>;

#[derive(Error, Debug)]
pub enum HydroShareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Field {0} is not present")]
    MissingField(String),
    #[error("Field {0} is internal to the entity")]
    InternalAccess(String),
    #[error(
        "resource_file object of resource {} has no key {}",
        display_id(.id),
        .key
    )]
    MalformedResource { id: Option<i64>, key: &'static str },
    #[error("Service error on resource {}: {}", display_id(.id), .message)]
    Service { id: Option<i64>, message: String },
    #[error("Resource {0} not found")]
    NotFound(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Request to {url} failed with status {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("Parsing error: {0}")]
    Parse(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HydroShareError {
    pub(crate) fn service<S: Into<String>>(id: Option<i64>, message: S) -> Self {
        Self::Service {
            id,
            message: message.into(),
        }
    }

    /// True for errors meaning the resource does not exist on the service.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Status { status, .. } => {
                *status == reqwest::StatusCode::NOT_FOUND
            }
            _ => false,
        }
    }
}

fn display_id(id: &Option<i64>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "<unsaved>".to_owned(),
    }
}

impl From<serde_json::Error> for HydroShareError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<base64::DecodeError> for HydroShareError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Parse(format!("invalid base64 payload: {e}"))
    }
}

impl From<url::ParseError> for HydroShareError {
    fn from(e: url::ParseError) -> Self {
        Self::Parse(format!("invalid URL: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_resource_names_id_and_key() {
        let err = HydroShareError::MalformedResource {
            id: Some(42),
            key: "content-type",
        };
        assert_eq!(
            err.to_string(),
            "resource_file object of resource 42 has no key content-type"
        );

        let err = HydroShareError::MalformedResource {
            id: None,
            key: "name",
        };
        assert_eq!(
            err.to_string(),
            "resource_file object of resource <unsaved> has no key name"
        );
    }

    #[test]
    fn not_found_detection() {
        assert!(HydroShareError::NotFound("7".into()).is_not_found());
        assert!(!HydroShareError::service(Some(7), "boom").is_not_found());
    }
}

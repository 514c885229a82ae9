//! Unified error type for the talent scanner.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Auth error: {0}")]
    Auth(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to get \"{url}\" (status={status}): {body}")]
    Api { status: u16, url: String, body: String },

    #[error("Unexpected payload for {resource}: {message}")]
    Decode { resource: String, message: String },

    #[error("Failed to build {class_name} - {spec_name} tree: {message}")]
    Tree {
        class_name: String,
        spec_name: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Decode a JSON value into a typed payload, tagging failures with the resource.
    pub fn decode<T: serde::de::DeserializeOwned>(
        resource: &str,
        value: serde_json::Value,
    ) -> Result<T, Error> {
        serde_json::from_value(value).map_err(|e| Error::Decode {
            resource: resource.to_string(),
            message: e.to_string(),
        })
    }

    /// Attach the class/spec under construction to an error.
    pub fn in_tree(self, class_name: &str, spec_name: &str) -> Error {
        match self {
            Error::Tree { .. } => self,
            other => Error::Tree {
                class_name: class_name.to_string(),
                spec_name: spec_name.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// True for the HTTP status upstream uses when a character does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api { status: 404, .. })
    }
}

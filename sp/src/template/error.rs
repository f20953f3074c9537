//! Template error types

use thiserror::Error;

/// Errors raised while loading, checking or rendering templates
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to read template {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render template {name}: {message}")]
    Render { name: String, message: String },

    #[error("Template is missing tokens: {}", .0.join(", "))]
    MissingTokens(Vec<String>),

    #[error("Template contains unknown tokens: {}", .0.join(", "))]
    UnknownTokens(Vec<String>),

    #[error("Invalid slide id '{0}': use letters, digits, '-' or '_'")]
    InvalidSlideId(String),

    #[error("Duplicate slide id: {0}")]
    DuplicateId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tokens_message_lists_names() {
        let err = TemplateError::MissingTokens(vec!["SLIDE_TITLE".to_string(), "SLIDE_ID".to_string()]);
        assert_eq!(err.to_string(), "Template is missing tokens: SLIDE_TITLE, SLIDE_ID");
    }
}

//! Error types shared across the workspace.

use thiserror::Error;

/// Why an inbound frame could not be read as a coordinate report.
///
/// Always fatal to the session that sent it, never to anyone else.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The frame was not a JSON object with numeric `lat` and `lng`.
    #[error("malformed coordinate report: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The frame was valid JSON but not an object.
    #[error("coordinate report must be a JSON object")]
    NotAnObject,
    /// A binary frame did not hold UTF-8 text.
    #[error("coordinate report is not valid UTF-8")]
    NotUtf8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let err = ReportError::from(json_err);
        assert!(err.to_string().starts_with("malformed coordinate report"));
    }

    #[test]
    fn not_utf8_display() {
        assert_eq!(
            ReportError::NotUtf8.to_string(),
            "coordinate report is not valid UTF-8"
        );
    }
}

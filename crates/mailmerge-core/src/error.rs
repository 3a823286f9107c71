use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Missing required argument '{name}'")]
    MissingArgument { name: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("File already exists: {path}")]
    OutputExists { path: String },

    #[error("Missing required part '{part_path}' in docx package")]
    MissingPart { part_path: String },

    #[error("XML parsing error at {location}: {message}")]
    XmlParse { message: String, location: String },

    #[error("XML serialization error: {0}")]
    XmlWrite(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

impl MergeError {
    pub fn missing_argument(name: &str) -> Self {
        Self::MissingArgument {
            name: name.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MergeError>;

/// Outcome of one merge call: a payload when the merge produced output, plus
/// every error collected along the way. Validation failures are collected
/// here rather than surfaced through `Result`, so a batch caller can keep
/// going after one bad input/output pair.
#[derive(Debug)]
pub struct MergeOutcome {
    pub output: Option<Vec<u8>>,
    pub errors: Vec<MergeError>,
}

impl MergeOutcome {
    pub fn success(output: Vec<u8>) -> Self {
        Self {
            output: Some(output),
            errors: Vec::new(),
        }
    }

    pub fn failure(errors: Vec<MergeError>) -> Self {
        Self {
            output: None,
            errors,
        }
    }

    pub fn is_success(&self) -> bool {
        self.output.is_some() && self.errors.is_empty()
    }

    /// Collapse into a `Result`, surfacing the first collected error.
    pub fn into_result(mut self) -> Result<Vec<u8>> {
        if let Some(err) = self.errors.drain(..).next() {
            return Err(err);
        }
        self.output
            .ok_or_else(|| MergeError::missing_argument("output"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        let err = MergeError::FileNotFound {
            path: "missing.docx".to_string(),
        };
        assert_eq!(err.to_string(), "File not found: missing.docx");
    }

    #[test]
    fn outcome_into_result_surfaces_first_error() {
        let outcome = MergeOutcome::failure(vec![
            MergeError::missing_argument("input"),
            MergeError::missing_argument("fields"),
        ]);
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.to_string(), "Missing required argument 'input'");
    }

    #[test]
    fn successful_outcome_yields_payload() {
        let outcome = MergeOutcome::success(vec![1, 2, 3]);
        assert!(outcome.is_success());
        assert_eq!(outcome.into_result().unwrap(), vec![1, 2, 3]);
    }
}

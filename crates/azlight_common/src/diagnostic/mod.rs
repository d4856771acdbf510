use std::fmt;

/// A unique machine-readable code (e.g., "FS_IO_ERROR").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticCode(pub &'static str);

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A trait for errors that provide a diagnostic code and a suggestion for resolution.
pub trait Diagnosable: std::error::Error {
    fn code(&self) -> DiagnosticCode;

    fn severity(&self) -> Severity {
        Severity::Error
    }

    /// A human-readable suggestion for how to fix the error.
    fn suggestion(&self) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
#[error("{message} (Code: {code})")]
pub struct Error {
    message: String,
    code: DiagnosticCode,
    severity: Severity,
    suggestion: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new<E>(error: E) -> Self
    where
        E: Diagnosable + Send + Sync + 'static,
    {
        Self {
            message: error.to_string(),
            code: error.code(),
            severity: error.severity(),
            suggestion: error.suggestion(),
            source: Some(Box::new(error)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> DiagnosticCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref()
    }

    /// Returns true when the error carries the given code.
    pub fn is(&self, code: &str) -> bool {
        self.code.0 == code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("disk is full")]
    struct DiskFull;

    impl Diagnosable for DiskFull {
        fn code(&self) -> DiagnosticCode {
            DiagnosticCode("FS_DISK_FULL")
        }

        fn suggestion(&self) -> Option<String> {
            Some("Free some space".to_string())
        }
    }

    #[test]
    fn test_error_keeps_diagnostics() {
        let err = Error::new(DiskFull);
        assert!(err.is("FS_DISK_FULL"));
        assert_eq!(err.message(), "disk is full");
        assert_eq!(err.severity(), Severity::Error);
        assert_eq!(err.suggestion(), Some("Free some space"));
        assert_eq!(err.to_string(), "disk is full (Code: FS_DISK_FULL)");
        assert!(std::error::Error::source(&err).is_some());
    }
}

//! Error types for gluectl
//!
//! Defines structured error types using thiserror for better error handling and user experience.

use colored::Colorize;
use gluectl_core::{CoreError, TransportError};
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: GetBlueprint failed: EntityNotFoundException: Blueprint b9 not found (HTTP 400)
///
///   tip: check the name or identifier passed to the command
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the gluectl application
#[derive(Error, Debug)]
pub enum GlueCtlError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No service endpoint configured")]
    NoEndpoint,

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("{message}")]
    NameResolution { message: String, endpoint: String },

    #[error("{message}")]
    ServiceError { code: String, message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Interrupted: {message}")]
    Cancelled { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for gluectl operations
pub type Result<T> = std::result::Result<T, GlueCtlError>;

impl GlueCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            GlueCtlError::ProfileNotFound { name } => vec![
                "List available profiles: gluectl profile list".to_string(),
                format!(
                    "Create profile '{}': gluectl profile set {} --region <region>",
                    name, name
                ),
            ],
            GlueCtlError::NoEndpoint => vec![
                "Pass a region: gluectl --region us-east-1 <command>".to_string(),
                "Set AWS_REGION, or GLUECTL_ENDPOINT_URL for a custom endpoint".to_string(),
                "Create a profile: gluectl profile set default --region us-east-1".to_string(),
            ],
            GlueCtlError::NameResolution { endpoint, .. } => vec![
                format!("Check that '{}' is the endpoint you intended", endpoint),
                "Verify the region name: gluectl profile show <profile>".to_string(),
                "Check DNS and network connectivity".to_string(),
            ],
            GlueCtlError::AuthenticationFailed { .. } => vec![
                "Requests are not signed by gluectl; point --endpoint-url at a signing proxy"
                    .to_string(),
                "Check the headers configured for the profile: gluectl profile show <profile>"
                    .to_string(),
            ],
            GlueCtlError::ServiceError { code, .. } if code == "EntityNotFoundException" => vec![
                "Check the name or identifier passed to the command".to_string(),
                "List existing resources with the matching get-*-list command".to_string(),
            ],
            GlueCtlError::ServiceError { code, .. } if code == "ThrottlingException" => {
                vec!["Wait a moment and retry, or lower --max-result".to_string()]
            }
            GlueCtlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the endpoint URL: gluectl profile show <profile>".to_string(),
            ],
            GlueCtlError::Timeout { .. } => vec![
                "Increase the profile timeout: gluectl profile set <name> --timeout-secs 120"
                    .to_string(),
            ],
            GlueCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: gluectl <command> --help".to_string(),
                "List parameters of an operation: gluectl operations describe <command>"
                    .to_string(),
            ],
            GlueCtlError::FileError { path, .. } => vec![
                format!("Check that file exists: {}", path),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            GlueCtlError::Cancelled { .. } => 130,
            _ => 1,
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        if let GlueCtlError::ServiceError { code, .. } = self {
            diag = diag.detail(&format!("service error code: {}", code));
        }

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<CoreError> for GlueCtlError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::InvalidArgument { .. }
            | CoreError::InvalidSelect { .. }
            | CoreError::UnknownOperation(_) => GlueCtlError::InvalidInput { message },
            CoreError::NameResolution { endpoint, .. } => {
                GlueCtlError::NameResolution { message, endpoint }
            }
            CoreError::Cancelled { .. } => GlueCtlError::Cancelled { message },
            CoreError::Remote { source, .. } if source.is_unauthorized() => {
                GlueCtlError::AuthenticationFailed { message }
            }
            CoreError::Remote { source, .. } => match source {
                TransportError::Timeout(_) => GlueCtlError::Timeout { message },
                TransportError::Connection(_) | TransportError::NameResolution { .. } => {
                    GlueCtlError::ConnectionError { message }
                }
                TransportError::Service { code, .. } => GlueCtlError::ServiceError { code, message },
                TransportError::InvalidResponse(_) | TransportError::Configuration(_) => {
                    GlueCtlError::ServiceError {
                        code: "InvalidResponse".to_string(),
                        message,
                    }
                }
            },
        }
    }
}

impl From<TransportError> for GlueCtlError {
    fn from(err: TransportError) -> Self {
        GlueCtlError::Configuration(err.to_string())
    }
}

impl From<gluectl_core::ConfigError> for GlueCtlError {
    fn from(err: gluectl_core::ConfigError) -> Self {
        match err {
            gluectl_core::ConfigError::ProfileNotFound { name } => {
                GlueCtlError::ProfileNotFound { name }
            }
            other => GlueCtlError::Configuration(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GlueCtlError {
    fn from(err: serde_json::Error) -> Self {
        GlueCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for GlueCtlError {
    fn from(err: std::io::Error) -> Self {
        GlueCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for GlueCtlError {
    fn from(err: anyhow::Error) -> Self {
        let message = format!("{:#}", err);
        if err.chain().any(|cause| cause.is::<gluectl_core::ConfigError>()) {
            GlueCtlError::Configuration(message)
        } else if err.chain().any(|cause| cause.is::<jpx_core::JmespathError>()) {
            GlueCtlError::InvalidInput { message }
        } else {
            GlueCtlError::OutputError { message }
        }
    }
}

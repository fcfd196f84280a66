//! Azure client error types

use rgsweep_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("az not found. Please install the Azure CLI: https://aka.ms/installazurecli")]
    CliNotFound,

    #[error("Not logged in. Run: az login")]
    NotLoggedIn,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Throttled: {0}")]
    Throttled(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("az rejected the arguments: {0}")]
    InvalidArguments(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("az command failed: {0}")]
    CommandFailed(String),

    #[error("Unexpected az output: {0}")]
    UnexpectedOutput(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AzureError>;

/// Markers checked in order; the first hit decides the class
const NOT_FOUND: &[&str] = &[
    "resourcenotfound",
    "resourcegroupnotfound",
    "notfound",
    "could not be found",
    "was not found",
    "does not exist",
];
const AUTHORIZATION: &[&str] = &[
    "authorizationfailed",
    "does not have authorization",
    "linkedauthorizationfailed",
    "forbidden",
];
const THROTTLED: &[&str] = &["toomanyrequests", "throttl", "retry after", "(429)"];
const TIMEOUT: &[&str] = &["gatewaytimeout", "timed out", "operation timeout"];
const SHAPE: &[&str] = &[
    "unrecognized arguments",
    "the following arguments are required",
    "is misspelled or not recognized",
    "invalid choice",
    "noregisteredproviderfound",
    "invalidapiversionparameter",
];
const CONFLICT: &[&str] = &[
    "scopelocked",
    "conflict",
    "inuse",
    "in use",
    "anotheroperationinprogress",
    "cannotdelete",
    "(409)",
];

/// Classify az stderr into an error class
pub fn classify_stderr(stderr: &str) -> AzureError {
    let message = stderr.trim().to_string();
    let lowered = message.to_ascii_lowercase();
    let hit = |markers: &[&str]| markers.iter().any(|m| lowered.contains(m));

    if lowered.contains("az login") || lowered.contains("please run 'az login'") {
        AzureError::NotLoggedIn
    } else if hit(AUTHORIZATION) {
        AzureError::AuthorizationFailed(message)
    } else if hit(THROTTLED) {
        AzureError::Throttled(message)
    } else if hit(SHAPE) {
        AzureError::InvalidArguments(message)
    } else if hit(CONFLICT) {
        AzureError::Conflict(message)
    } else if hit(NOT_FOUND) {
        AzureError::NotFound(message)
    } else if hit(TIMEOUT) {
        AzureError::Timeout(message)
    } else {
        AzureError::CommandFailed(message)
    }
}

impl From<AzureError> for CloudError {
    fn from(error: AzureError) -> Self {
        match error {
            AzureError::NotFound(m) => CloudError::NotFound(m),
            AzureError::Conflict(m) => CloudError::Conflict(m),
            AzureError::Throttled(m) => CloudError::Throttled(m),
            AzureError::Timeout(m) => CloudError::Timeout(m),
            AzureError::InvalidArguments(m) => CloudError::ShapeMismatch(m),
            AzureError::AuthorizationFailed(m) => CloudError::PermissionDenied(m),
            AzureError::NotLoggedIn => {
                CloudError::PermissionDenied(AzureError::NotLoggedIn.to_string())
            }
            AzureError::JsonError(e) => CloudError::Json(e),
            AzureError::IoError(e) => CloudError::Io(e),
            other => CloudError::Api(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let stderr = "ERROR: (ResourceNotFound) The Resource 'Microsoft.Network/virtualNetworks/vnet1' under resource group 'rg' was not found.";
        assert!(matches!(classify_stderr(stderr), AzureError::NotFound(_)));

        let stderr = "ERROR: (ResourceGroupNotFound) Resource group 'rg-gone' could not be found.";
        assert!(matches!(classify_stderr(stderr), AzureError::NotFound(_)));
    }

    #[test]
    fn test_classify_conflict() {
        let stderr = "ERROR: (ScopeLocked) The scope '/subscriptions/x/resourceGroups/rg' cannot perform delete operation because following scope(s) are locked";
        assert!(matches!(classify_stderr(stderr), AzureError::Conflict(_)));

        let stderr = "ERROR: (InUseSubnetCannotBeDeleted) Subnet default is in use by /subscriptions/x/.../ipConfigurations/ipconfig1";
        assert!(matches!(classify_stderr(stderr), AzureError::Conflict(_)));
    }

    #[test]
    fn test_classify_throttled_and_permission() {
        let stderr = "ERROR: (TooManyRequests) Too many requests. Retry after 30 seconds.";
        assert!(matches!(classify_stderr(stderr), AzureError::Throttled(_)));

        let stderr = "ERROR: (AuthorizationFailed) The client 'me' does not have authorization to perform action";
        assert!(matches!(
            classify_stderr(stderr),
            AzureError::AuthorizationFailed(_)
        ));
    }

    #[test]
    fn test_classify_shape_mismatch() {
        let stderr = "ERROR: unrecognized arguments: --rule-name dcr1";
        let error = classify_stderr(stderr);
        assert!(matches!(error, AzureError::InvalidArguments(_)));
        assert!(CloudError::from(error).is_shape_mismatch());
    }

    #[test]
    fn test_classify_unknown_is_api_error() {
        let error = classify_stderr("ERROR: something odd happened");
        assert!(matches!(error, AzureError::CommandFailed(_)));
        assert!(matches!(CloudError::from(error), CloudError::Api(_)));
    }

    #[test]
    fn test_not_logged_in_is_permanent() {
        let error = classify_stderr("ERROR: Please run 'az login' to setup account.");
        assert!(matches!(error, AzureError::NotLoggedIn));
        assert!(CloudError::from(error).is_permanent());
    }
}

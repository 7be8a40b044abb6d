use thiserror::Error;

use crate::domain::service_kind::ServiceKind;

/// Error kinds the core distinguishes.
///
/// Gateway and worker code return this everywhere internally; only the
/// `interfaces::http` boundary renders it to an HTTP status and a
/// `{error: {code, message, timestamp, path}}` body.
#[derive(Debug, Error)]
pub enum FabricError {
    #[error("transport error calling {service}: {detail}")]
    Transport { service: ServiceKind, detail: String },

    #[error("upstream {service} returned client error {status}")]
    Upstream4xx { service: ServiceKind, status: u16 },

    #[error("upstream {service} returned server error {status}")]
    Upstream5xx { service: ServiceKind, status: u16 },

    #[error("deadline exceeded calling {service}")]
    Timeout { service: ServiceKind },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("service {0} is disabled")]
    ServiceDisabled(ServiceKind),

    #[error("no healthy instance for {0}")]
    ServiceUnavailable(ServiceKind),

    #[error("adapter failure ({kind}): {detail}")]
    AdapterFailure { kind: String, detail: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl FabricError {
    /// Stable machine-readable code used in the `{error: {code, ...}}` body.
    pub fn code(&self) -> &'static str {
        match self {
            FabricError::Transport { .. } => "transport_error",
            FabricError::Upstream4xx { .. } => "upstream_client_error",
            FabricError::Upstream5xx { .. } => "upstream_server_error",
            FabricError::Timeout { .. } => "timeout",
            FabricError::NotFound(_) => "not_found",
            FabricError::AlreadyExists(_) => "already_exists",
            FabricError::Invalid(_) => "invalid",
            FabricError::ServiceDisabled(_) => "service_disabled",
            FabricError::ServiceUnavailable(_) => "service_unavailable",
            FabricError::AdapterFailure { .. } => "adapter_failure",
            FabricError::Internal(_) => "internal",
        }
    }

    /// HTTP status this error maps to at the gateway/worker HTTP boundary.
    pub fn http_status(&self) -> u16 {
        match self {
            FabricError::NotFound(_) => 404,
            FabricError::AlreadyExists(_) => 409,
            FabricError::Invalid(_) => 400,
            FabricError::ServiceDisabled(_) | FabricError::ServiceUnavailable(_) => 503,
            FabricError::Upstream4xx { status, .. } => *status,
            FabricError::Upstream5xx { status, .. } => *status,
            FabricError::Transport { .. } | FabricError::Timeout { .. } => 503,
            FabricError::AdapterFailure { .. } => 502,
            FabricError::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_unavailable_maps_to_503() {
        let err = FabricError::ServiceUnavailable(ServiceKind::Chart);
        assert_eq!(err.http_status(), 503);
        assert_eq!(err.code(), "service_unavailable");
    }

    #[test]
    fn upstream_5xx_maps_to_its_own_status() {
        let err = FabricError::Upstream5xx {
            service: ServiceKind::Chart,
            status: 502,
        };
        assert_eq!(err.http_status(), 502);
        assert_eq!(err.code(), "upstream_server_error");
    }
}

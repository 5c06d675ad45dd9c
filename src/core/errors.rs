use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Exchange codes that mean the credentials or the signature were rejected.
const AUTH_REJECTION_CODES: [i32; 4] = [-1002, -1022, -2014, -2015];

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API error: {code} - {message}")]
    ApiError {
        code: i32,
        message: String,
        body: Value,
    },

    #[error("Authentication rejected: {code} - {message}")]
    Unauthorized {
        code: i32,
        message: String,
        body: Value,
    },

    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Authentication required: no API credentials configured")]
    AuthenticationRequired,

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

/// Error body returned by the exchange on rejected requests
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i32,
    #[serde(alias = "message")]
    msg: String,
}

impl ExchangeError {
    /// Build an error from a non-2xx response.
    #[cold]
    #[inline(never)]
    pub fn from_response(status: u16, body: &str) -> Self {
        let Ok(raw) = serde_json::from_str::<Value>(body) else {
            return Self::HttpStatus {
                status,
                body: body.to_string(),
            };
        };

        match ErrorBody::deserialize(&raw) {
            Ok(ErrorBody { code, msg }) if AUTH_REJECTION_CODES.contains(&code) => {
                Self::Unauthorized {
                    code,
                    message: msg,
                    body: raw,
                }
            }
            Ok(ErrorBody { code, msg }) => Self::ApiError {
                code,
                message: msg,
                body: raw,
            },
            Err(_) => Self::HttpStatus {
                status,
                body: body.to_string(),
            },
        }
    }

    /// Exchange error code, when the exchange answered with one
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::ApiError { code, .. } | Self::Unauthorized { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Exchange error message, when the exchange answered with one
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::ApiError { message, .. } | Self::Unauthorized { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Raw error body as returned by the exchange
    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::ApiError { body, .. } | Self::Unauthorized { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::HttpError(e) if e.is_timeout())
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationRequired | Self::Unauthorized { .. } | Self::AuthError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_order_maps_to_api_error() {
        let err = ExchangeError::from_response(400, r#"{"code":-2011,"msg":"Unknown order sent."}"#);
        assert_eq!(err.code(), Some(-2011));
        assert_eq!(err.message(), Some("Unknown order sent."));
        assert_eq!(
            err.body(),
            Some(&json!({"code": -2011, "msg": "Unknown order sent."}))
        );
        assert!(!err.is_auth_error());
    }

    #[test]
    fn test_signature_rejection_maps_to_unauthorized() {
        let err = ExchangeError::from_response(
            400,
            r#"{"code":-1022,"msg":"Signature for this request is not valid."}"#,
        );
        assert!(matches!(err, ExchangeError::Unauthorized { code: -1022, .. }));
        assert!(err.is_auth_error());
    }

    #[test]
    fn test_message_key_is_accepted() {
        let err = ExchangeError::from_response(400, r#"{"code":-1125,"message":"gone"}"#);
        assert_eq!(err.message(), Some("gone"));
    }

    #[test]
    fn test_unparseable_body_keeps_status() {
        let err = ExchangeError::from_response(502, "<html>Bad Gateway</html>");
        match err {
            ExchangeError::HttpStatus { status, body } => {
                assert_eq!(status, 502);
                assert!(body.contains("Bad Gateway"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

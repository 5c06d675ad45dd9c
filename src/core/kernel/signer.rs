use crate::core::errors::ExchangeError;
use crate::core::types::Security;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the API key on every authenticated route
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Result type for signing operations: (headers, extra query params)
pub type SignatureResult = Result<(HashMap<String, String>, Vec<(String, String)>), ExchangeError>;

/// Signer trait for request authentication
///
/// The core hands over the canonical query string (timestamp and
/// `recvWindow` already merged) and appends whatever the signer returns.
pub trait Signer: Send + Sync {
    /// Sign a request and return headers and query parameters to append
    ///
    /// # Arguments
    /// * `security` - Authentication level required by the route
    /// * `query_string` - Canonical query string (without leading '?')
    fn sign_request(&self, security: Security, query_string: &str) -> SignatureResult;
}

/// HMAC-SHA256 signer over the canonical query string
pub struct HmacSigner {
    api_key: Secret<String>,
    secret_key: Secret<String>,
}

impl HmacSigner {
    pub fn new(api_key: String, secret_key: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            secret_key: Secret::new(secret_key),
        }
    }

    /// Hex-encoded HMAC-SHA256 of `payload` keyed with the secret
    pub fn signature(&self, payload: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.expose_secret().as_bytes())
            .map_err(|e| ExchangeError::AuthError(format!("Invalid secret key: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSigner").finish_non_exhaustive()
    }
}

impl Signer for HmacSigner {
    fn sign_request(&self, security: Security, query_string: &str) -> SignatureResult {
        let mut headers = HashMap::new();
        let mut params = Vec::new();

        if security.requires_credentials() {
            headers.insert(
                API_KEY_HEADER.to_string(),
                self.api_key.expose_secret().clone(),
            );
        }

        if security == Security::Signed {
            params.push(("signature".to_string(), self.signature(query_string)?));
        }

        Ok((headers, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Worked example from the exchange's signed-endpoint documentation
    const DOC_SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
    const DOC_QUERY: &str = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
    const DOC_SIGNATURE: &str = "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71";

    #[test]
    fn test_signature_matches_documented_vector() {
        let signer = HmacSigner::new("key".to_string(), DOC_SECRET.to_string());
        assert_eq!(signer.signature(DOC_QUERY).unwrap(), DOC_SIGNATURE);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let signer = HmacSigner::new("key".to_string(), "secret".to_string());
        let query = "symbol=BTCUSD_PERP&orderId=123456&timestamp=1700000000000";
        let (_, first) = signer.sign_request(Security::Signed, query).unwrap();
        let (_, second) = signer.sign_request(Security::Signed, query).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].0, "signature");
    }

    #[test]
    fn test_api_key_routes_are_not_signed() {
        let signer = HmacSigner::new("my-key".to_string(), "secret".to_string());
        let (headers, params) = signer.sign_request(Security::ApiKey, "").unwrap();
        assert_eq!(headers.get(API_KEY_HEADER).map(String::as_str), Some("my-key"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_public_routes_get_nothing() {
        let signer = HmacSigner::new("my-key".to_string(), "secret".to_string());
        let (headers, params) = signer.sign_request(Security::None, "symbol=BTCUSDT").unwrap();
        assert!(headers.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn test_debug_hides_credentials() {
        let signer = HmacSigner::new("my-key".to_string(), "top-secret".to_string());
        let debug = format!("{:?}", signer);
        assert!(!debug.contains("my-key"));
        assert!(!debug.contains("top-secret"));
    }
}

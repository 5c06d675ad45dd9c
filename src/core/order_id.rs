//! Client order id issuance and attribution checks.
//!
//! Ids look like `x-<prefix><time><random>`: the prefix attributes the order
//! to an API category, the base-36 millisecond time and ten random
//! alphanumerics keep concurrent calls from colliding without shared state.

use crate::core::config::BaseUrlKey;
use crate::core::types::Params;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::warn;

/// Longest client order id the exchange accepts
pub const MAX_ORDER_ID_LEN: usize = 36;

const RANDOM_SUFFIX_LEN: usize = 10;

/// Outcome of [`validate_order_id`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderIdCheck {
    /// The field was missing and a fresh id was written into the params
    Generated(String),
    /// A supplied id carries the expected prefix
    Valid,
    /// A supplied id lacks the expected prefix; it was left untouched
    Advisory { expected_prefix: String },
    /// No id was supplied and none was generated
    Absent,
}

/// `x-<prefix>` expected at the start of ids for `category`
pub fn expected_order_id_prefix(category: BaseUrlKey) -> String {
    format!("x-{}", category.order_id_prefix())
}

/// Issue a fresh client order id for `category`
pub fn generate_new_order_id(category: BaseUrlKey) -> String {
    let mut id = expected_order_id_prefix(category);
    id.push_str(&to_base36(chrono::Utc::now().timestamp_millis().unsigned_abs()));
    id.extend(
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(RANDOM_SUFFIX_LEN)
            .map(char::from),
    );
    id.truncate(MAX_ORDER_ID_LEN);
    id
}

/// Make sure `params[field]` carries an attributable order id.
///
/// A missing (or empty) id is generated in place. A supplied id without the
/// category prefix is kept as-is and only logged.
pub fn validate_order_id(params: &mut Params, field: &str, category: BaseUrlKey) -> OrderIdCheck {
    match params.get(field) {
        Some(id) if !id.is_empty() => check_order_id(id, field, category),
        _ => {
            let id = generate_new_order_id(category);
            params.insert(field, &id);
            OrderIdCheck::Generated(id)
        }
    }
}

/// Prefix check without generation, for routes that reference existing orders
pub fn check_order_id_prefix(params: &Params, field: &str, category: BaseUrlKey) -> OrderIdCheck {
    match params.get(field) {
        Some(id) if !id.is_empty() => check_order_id(id, field, category),
        _ => OrderIdCheck::Absent,
    }
}

/// Advisory prefix check of a single id; logs a warning on mismatch
pub fn check_order_id(id: &str, field: &str, category: BaseUrlKey) -> OrderIdCheck {
    let expected_prefix = expected_order_id_prefix(category);
    if id.starts_with(&expected_prefix) {
        return OrderIdCheck::Valid;
    }

    warn!(
        field,
        order_id = id,
        expected_prefix = %expected_prefix,
        category = %category,
        "client order id does not carry the expected prefix"
    );
    OrderIdCheck::Advisory { expected_prefix }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(13);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Network, Product};
    use std::collections::HashSet;

    const COINM: BaseUrlKey = BaseUrlKey::new(Product::CoinM, Network::Mainnet);

    #[test]
    fn test_generated_id_has_prefix_and_fits() {
        let id = generate_new_order_id(COINM);
        assert!(id.starts_with("x-15PC4ZJy"), "{}", id);
        assert!(id.len() <= MAX_ORDER_ID_LEN);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn test_concurrent_generation_is_unique() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..500)
                        .map(|_| generate_new_order_id(COINM))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate order id");
            }
        }
        assert_eq!(seen.len(), 4000);
    }

    #[test]
    fn test_missing_id_is_generated() {
        let mut params = Params::new().with("symbol", "BTCUSD_PERP");
        let check = validate_order_id(&mut params, "newClientOrderId", COINM);

        let OrderIdCheck::Generated(id) = check else {
            panic!("expected a generated id, got {check:?}");
        };
        assert_eq!(params.get("newClientOrderId"), Some(id.as_str()));
        assert!(id.starts_with(&expected_order_id_prefix(COINM)));
    }

    #[test]
    fn test_empty_id_is_replaced() {
        let mut params = Params::new().with("newClientOrderId", "");
        let check = validate_order_id(&mut params, "newClientOrderId", COINM);
        assert!(matches!(check, OrderIdCheck::Generated(_)));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_foreign_id_is_preserved() {
        let mut params = Params::new().with("newClientOrderId", "my-own-id");
        let check = validate_order_id(&mut params, "newClientOrderId", COINM);

        assert_eq!(
            check,
            OrderIdCheck::Advisory {
                expected_prefix: "x-15PC4ZJy".to_string()
            }
        );
        assert_eq!(params.get("newClientOrderId"), Some("my-own-id"));
    }

    #[test]
    fn test_prefixed_id_is_valid() {
        let mut params = Params::new().with("newClientOrderId", "x-15PC4ZJy-mine");
        assert_eq!(
            validate_order_id(&mut params, "newClientOrderId", COINM),
            OrderIdCheck::Valid
        );
    }

    #[test]
    fn test_prefix_check_never_generates() {
        let params = Params::new().with("orderId", 123_456);
        assert_eq!(
            check_order_id_prefix(&params, "origClientOrderId", COINM),
            OrderIdCheck::Absent
        );
        assert!(!params.contains_key("origClientOrderId"));
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}

use crate::core::config::BaseUrlKey;
use crate::core::errors::ExchangeError;
use crate::core::order_id::{check_order_id, validate_order_id};
use crate::core::types::Params;
use crate::exchanges::futures::types::{CancelMultipleOrdersRequest, NewOrderRequest};
use serde_json::Value;

/// Most orders the exchange accepts in one batch call
pub const MAX_BATCH_ORDERS: usize = 5;

/// Build the `batchOrders` parameter.
///
/// Every order gets an attributable `newClientOrderId` before the list is
/// JSON-encoded into the single field the route expects.
pub fn batch_orders_params(
    orders: &[NewOrderRequest],
    category: BaseUrlKey,
) -> Result<Params, ExchangeError> {
    if orders.is_empty() || orders.len() > MAX_BATCH_ORDERS {
        return Err(ExchangeError::InvalidParameters(format!(
            "batch orders take 1 to {} orders, got {}",
            MAX_BATCH_ORDERS,
            orders.len()
        )));
    }

    let mut encoded = Vec::with_capacity(orders.len());
    for order in orders {
        let mut params = Params::from_serialize(order)?;
        validate_order_id(&mut params, "newClientOrderId", category);
        encoded.push(params.to_json_object());
    }

    Ok(Params::new().with("batchOrders", Value::Array(encoded)))
}

/// Build the parameters of a batch cancel; client ids only get the advisory check
pub fn cancel_multiple_params(
    request: &CancelMultipleOrdersRequest,
    category: BaseUrlKey,
) -> Result<Params, ExchangeError> {
    let mut params = Params::new().with("symbol", &request.symbol);

    match (&request.order_id_list, &request.orig_client_order_id_list) {
        (Some(ids), _) if !ids.is_empty() => {
            params.insert("orderIdList", serde_json::to_string(ids)?);
        }
        (_, Some(ids)) if !ids.is_empty() => {
            for id in ids {
                check_order_id(id, "origClientOrderIdList", category);
            }
            params.insert("origClientOrderIdList", serde_json::to_string(ids)?);
        }
        _ => {
            return Err(ExchangeError::InvalidParameters(
                "either orderIdList or origClientOrderIdList is required".to_string(),
            ));
        }
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Network, Product};
    use crate::exchanges::futures::types::OrderSide;
    use rust_decimal::Decimal;

    const COINM: BaseUrlKey = BaseUrlKey::new(Product::CoinM, Network::Mainnet);

    fn order(client_id: Option<&str>) -> NewOrderRequest {
        let order = NewOrderRequest::market("BTCUSD_PERP", OrderSide::Buy, Decimal::ONE);
        match client_id {
            Some(id) => order.with_client_order_id(id),
            None => order,
        }
    }

    #[test]
    fn test_batch_orders_get_ids_and_are_json_encoded() {
        let params = batch_orders_params(&[order(None), order(Some("mine"))], COINM).unwrap();
        let raw = params.get("batchOrders").unwrap();
        let decoded: Vec<serde_json::Map<String, Value>> = serde_json::from_str(raw).unwrap();

        assert_eq!(decoded.len(), 2);
        assert!(decoded[0]["newClientOrderId"]
            .as_str()
            .unwrap()
            .starts_with("x-15PC4ZJy"));
        assert_eq!(decoded[1]["newClientOrderId"], "mine");
        assert_eq!(decoded[0]["quantity"], "1");
    }

    #[test]
    fn test_batch_size_is_bounded() {
        let orders = vec![order(None); MAX_BATCH_ORDERS + 1];
        assert!(matches!(
            batch_orders_params(&orders, COINM),
            Err(ExchangeError::InvalidParameters(_))
        ));
        assert!(batch_orders_params(&[], COINM).is_err());
    }

    #[test]
    fn test_cancel_multiple_encodes_id_list() {
        let request = CancelMultipleOrdersRequest {
            symbol: "BTCUSD_PERP".to_string(),
            order_id_list: Some(vec![1, 2, 3]),
            orig_client_order_id_list: None,
        };
        let params = cancel_multiple_params(&request, COINM).unwrap();
        assert_eq!(
            params.to_query_string(),
            "symbol=BTCUSD_PERP&orderIdList=%5B1%2C2%2C3%5D"
        );
    }

    #[test]
    fn test_cancel_multiple_requires_ids() {
        let request = CancelMultipleOrdersRequest {
            symbol: "BTCUSD_PERP".to_string(),
            ..Default::default()
        };
        assert!(cancel_multiple_params(&request, COINM).is_err());
    }
}

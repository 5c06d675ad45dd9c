mod common;

use common::{now_ms, query_value, TestConfig, ValidSignature, TEST_API_KEY};
use futures_connector::core::kernel::{RateLimitBucket, RateLimitInterval, RateLimitType};
use futures_connector::exchanges::coinm::build_client;
use futures_connector::exchanges::futures::{
    BrokerFuturesType, BrokerVolumeRequest, CancelMultipleOrdersRequest, NewOrderRequest,
    OrderQuery, OrderSide, MAX_BATCH_ORDERS,
};
use futures_connector::ExchangeError;
use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn balance_body() -> serde_json::Value {
    json!([{
        "accountAlias": "SgsR",
        "asset": "BTC",
        "balance": "0.00250000",
        "withdrawAvailable": "0.00250000",
        "crossWalletBalance": "0.00241969",
        "crossUnPnl": "0.00000000",
        "availableBalance": "0.00241969",
        "updateTime": 1_592_468_353_979_i64
    }])
}

fn order_body(client_order_id: &str) -> serde_json::Value {
    json!({
        "symbol": "BTCUSD_PERP",
        "pair": "BTCUSD",
        "orderId": 22542179,
        "clientOrderId": client_order_id,
        "side": "BUY",
        "positionSide": "BOTH",
        "type": "LIMIT",
        "status": "NEW",
        "timeInForce": "GTC",
        "price": "30000",
        "origQty": "1",
        "executedQty": "0",
        "cumBase": "0",
        "updateTime": 1_566_818_724_722_i64
    })
}

#[tokio::test]
async fn test_private_call_without_credentials_sends_nothing() {
    let server = MockServer::start().await;
    let client = build_client(&TestConfig::mock_read_only_config(&server.uri())).unwrap();

    let result = client.get_balance().await;
    assert!(matches!(result, Err(ExchangeError::AuthenticationRequired)));

    let result = client.create_listen_key().await;
    assert!(matches!(result, Err(ExchangeError::AuthenticationRequired)));

    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_ping_returns_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_read_only_config(&server.uri())).unwrap();
    client.test_connectivity().await.unwrap();
}

#[tokio::test]
async fn test_signed_request_carries_key_and_valid_signature() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/balance"))
        .and(header("X-MBX-APIKEY", TEST_API_KEY))
        .and(query_param("recvWindow", "5000"))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(balance_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = TestConfig::mock_config_without_sync(&server.uri()).recv_window(5000);
    let client = build_client(&config).unwrap();

    let balance = client.get_balance_by_asset("BTC").await.unwrap().unwrap();
    assert_eq!(balance.available_balance, "0.00241969");

    let received = server.received_requests().await.unwrap();
    let query = received[0].url.query().unwrap().to_string();
    // timestamp, then recvWindow, then the signature
    assert!(query.starts_with("timestamp="), "{}", query);
    let window = query.find("recvWindow=").unwrap();
    let signature = query.find("signature=").unwrap();
    assert!(window < signature);
}

#[tokio::test]
async fn test_time_sync_offsets_timestamp() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/time"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "serverTime": now_ms() + 5_000 })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/balance"))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(balance_body()))
        .expect(2)
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_config(&server.uri())).unwrap();

    let before = now_ms();
    client.get_balance().await.unwrap();
    client.get_balance().await.unwrap();
    let after = now_ms();

    let offset = client.get_time_offset();
    assert!((4_000..=5_000).contains(&offset), "offset {}", offset);

    let received = server.received_requests().await.unwrap();
    let stamped: Vec<i64> = received
        .iter()
        .filter(|request| request.url.path() == "/dapi/v1/balance")
        .map(|request| query_value(request, "timestamp").unwrap().parse().unwrap())
        .collect();
    assert_eq!(stamped.len(), 2);
    for timestamp in stamped {
        assert!(timestamp >= before + offset && timestamp <= after + offset);
    }
}

#[tokio::test]
async fn test_concurrent_signed_calls_sync_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "serverTime": now_ms() })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(balance_body()))
        .expect(5)
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_config(&server.uri())).unwrap();
    let calls = (0..5).map(|_| client.get_balance());
    let results = futures::future::join_all(calls).await;
    assert!(results.iter().all(Result::is_ok));
}

#[tokio::test]
async fn test_disabled_sync_never_calls_time_route() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/time"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "serverTime": 1 })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(balance_body()))
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_config_without_sync(&server.uri())).unwrap();
    client.get_balance().await.unwrap();
    assert_eq!(client.sync_time().await.unwrap(), 0);
    assert_eq!(client.get_time_offset(), 0);
}

#[tokio::test]
async fn test_failed_sync_falls_back_to_local_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/time"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(balance_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_config(&server.uri())).unwrap();
    let balances = client.get_balance().await.unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(client.get_time_offset(), 0);

    let err = client.sync_time().await.unwrap_err();
    assert!(matches!(err, ExchangeError::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn test_sync_retries_after_failure_and_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/time"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/time"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "serverTime": now_ms() + 60_000 })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/balance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(balance_body()))
        .expect(2)
        .mount(&server)
        .await;

    // Back-off after a failure is capped by the resync interval
    let config = TestConfig::mock_config(&server.uri()).time_sync_interval(1);
    let client = build_client(&config).unwrap();

    client.get_balance().await.unwrap();
    assert_eq!(client.get_time_offset(), 0);

    tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;

    let before = now_ms();
    client.get_balance().await.unwrap();
    let offset = client.get_time_offset();
    assert!((57_000..=60_000).contains(&offset), "offset {}", offset);

    let received = server.received_requests().await.unwrap();
    let time_calls = received
        .iter()
        .filter(|request| request.url.path() == "/dapi/v1/time")
        .count();
    assert_eq!(time_calls, 2);

    let last_balance = received
        .iter()
        .rev()
        .find(|request| request.url.path() == "/dapi/v1/balance")
        .unwrap();
    let timestamp: i64 = query_value(last_balance, "timestamp").unwrap().parse().unwrap();
    assert!(timestamp >= before + offset);
}

#[tokio::test]
async fn test_cancel_unknown_order_surfaces_exchange_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/dapi/v1/order"))
        .and(query_param("symbol", "BTCUSD_PERP"))
        .and(query_param("orderId", "123456"))
        .and(ValidSignature)
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "code": -2011, "msg": "Unknown order sent." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_config_without_sync(&server.uri())).unwrap();
    let query = OrderQuery::by_order_id("BTCUSD_PERP", 123_456);
    let err = client.cancel_order(&query).await.unwrap_err();

    assert_eq!(err.code(), Some(-2011));
    assert_eq!(err.message(), Some("Unknown order sent."));
    assert_eq!(
        err.body(),
        Some(&json!({ "code": -2011, "msg": "Unknown order sent." }))
    );
    assert!(!err.is_auth_error());
}

#[tokio::test]
async fn test_new_order_gets_generated_client_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dapi/v1/order"))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(order_body("x-15PC4ZJy-echo")))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_config_without_sync(&server.uri())).unwrap();
    let order = NewOrderRequest::limit(
        "BTCUSD_PERP",
        OrderSide::Buy,
        Decimal::ONE,
        Decimal::new(30_000, 0),
    );
    let result = client.submit_new_order(&order).await.unwrap();
    assert_eq!(result.order_id, 22542179);

    let received = server.received_requests().await.unwrap();
    let id = query_value(&received[0], "newClientOrderId").unwrap();
    assert!(id.starts_with("x-15PC4ZJy"), "{}", id);
    assert!(id.len() <= 36);
    assert_eq!(query_value(&received[0], "price").as_deref(), Some("30000"));
}

#[tokio::test]
async fn test_batch_orders_encode_generated_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dapi/v1/batchOrders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            order_body("x-15PC4ZJy-a"),
            { "code": -2022, "msg": "ReduceOnly Order is rejected." }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_config_without_sync(&server.uri())).unwrap();
    let orders = vec![
        NewOrderRequest::market("BTCUSD_PERP", OrderSide::Buy, Decimal::ONE),
        NewOrderRequest::market("BTCUSD_PERP", OrderSide::Sell, Decimal::ONE).reduce_only(true),
    ];
    let results = client.submit_multiple_orders(&orders).await.unwrap();
    assert!(results[0].order().is_some());
    assert_eq!(results[1].error().map(|e| e.code), Some(-2022));

    let received = server.received_requests().await.unwrap();
    let encoded = query_value(&received[0], "batchOrders").unwrap();
    let batch: Vec<serde_json::Value> = serde_json::from_str(&encoded).unwrap();
    assert_eq!(batch.len(), 2);
    for entry in batch {
        let id = entry["newClientOrderId"].as_str().unwrap();
        assert!(id.starts_with("x-15PC4ZJy"));
    }
}

#[tokio::test]
async fn test_oversized_batch_is_rejected_locally() {
    let server = MockServer::start().await;
    let client = build_client(&TestConfig::mock_config_without_sync(&server.uri())).unwrap();

    let orders: Vec<_> = (0..=MAX_BATCH_ORDERS)
        .map(|_| NewOrderRequest::market("BTCUSD_PERP", OrderSide::Buy, Decimal::ONE))
        .collect();
    let err = client.submit_multiple_orders(&orders).await.unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidParameters(_)));

    let err = client
        .cancel_multiple_orders(&CancelMultipleOrdersRequest {
            symbol: "BTCUSD_PERP".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidParameters(_)));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_listen_key_lifecycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/dapi/v1/listenKey"))
        .and(header("X-MBX-APIKEY", TEST_API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "listenKey": "abc123" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/dapi/v1/listenKey"))
        .and(query_param("listenKey", "abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/dapi/v1/listenKey"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "code": -1125, "msg": "This listenKey does not exist." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_config(&server.uri())).unwrap();
    let key = client.create_listen_key().await.unwrap();
    assert_eq!(key.listen_key, "abc123");
    client.close_listen_key(&key.listen_key).await.unwrap();

    let err = client.keep_alive_listen_key(&key.listen_key).await.unwrap_err();
    assert_eq!(err.code(), Some(-1125));

    // Keyed routes are neither signed nor time-stamped
    let received = server.received_requests().await.unwrap();
    assert!(received.iter().all(|request| request.url.path() != "/dapi/v1/time"));
    assert!(received
        .iter()
        .all(|request| query_value(request, "signature").is_none()));
}

#[tokio::test]
async fn test_rate_limit_headers_and_exchange_info_limits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/exchangeInfo"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-MBX-USED-WEIGHT-1M", "12")
                .set_body_json(json!({
                    "timezone": "UTC",
                    "serverTime": 1_565_613_908_500_i64,
                    "rateLimits": [
                        { "rateLimitType": "REQUEST_WEIGHT", "interval": "MINUTE", "intervalNum": 1, "limit": 2400 },
                        { "rateLimitType": "ORDERS", "interval": "MINUTE", "intervalNum": 1, "limit": 1200 }
                    ],
                    "symbols": []
                })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/ping"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("X-MBX-USED-WEIGHT-1M", "2401")
                .set_body_json(json!({ "code": -1003, "msg": "Too many requests." })),
        )
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_read_only_config(&server.uri())).unwrap();
    let info = client.get_exchange_info().await.unwrap();
    assert_eq!(info.rate_limits.len(), 2);

    let weight = RateLimitBucket::new(RateLimitType::RequestWeight, 1, RateLimitInterval::Minute);
    let orders = RateLimitBucket::new(RateLimitType::Orders, 1, RateLimitInterval::Minute);

    let states = client.get_rate_limit_states();
    assert_eq!(states[&weight].used, 12);
    assert_eq!(states[&weight].remaining(), Some(2388));
    assert_eq!(states[&orders].limit, Some(1200));

    // Error responses still report usage
    let err = client.test_connectivity().await.unwrap_err();
    assert_eq!(err.code(), Some(-1003));
    assert_eq!(client.get_rate_limit_states()[&weight].used, 2401);
}

#[tokio::test]
async fn test_broker_routes_use_dapi_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/apiReferral/ifNewUser"))
        .and(query_param("brokerId", "ABCD1234"))
        .and(query_param("type", "2"))
        .and(ValidSignature)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "brokerId": "ABCD1234",
            "rebateWorking": false,
            "ifNewUser": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/dapi/v1/apiReferral/tradeVol"))
        .and(query_param("type", "2"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "unit": "BTC", "tradeVol": "31.47", "time": 1_597_708_800_000_i64 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&TestConfig::mock_config_without_sync(&server.uri())).unwrap();
    let status = client
        .get_broker_if_new_futures_user("ABCD1234", BrokerFuturesType::CoinMargined)
        .await
        .unwrap();
    assert!(status.if_new_user);

    let volumes = client
        .get_broker_user_trade_volume(&BrokerVolumeRequest {
            futures_type: BrokerFuturesType::CoinMargined,
            limit: Some(10),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(volumes[0].trade_vol, "31.47");
}

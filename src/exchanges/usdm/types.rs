use crate::exchanges::futures::{
    OrderSide, PositionSide, SelfTradePreventionMode, TimeInForce, WorkingType,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Algo service

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgoType {
    Conditional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionalOrderType {
    StopMarket,
    TakeProfitMarket,
    Stop,
    TakeProfit,
    TrailingStopMarket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlgoStatus {
    New,
    Canceled,
    Triggering,
    Triggered,
    Finished,
    Rejected,
    Expired,
}

/// Conditional order held by the algo service until its trigger fires
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlgoOrderRequest {
    pub algo_type: AlgoType,
    pub symbol: String,
    pub side: OrderSide,
    pub position_side: Option<PositionSide>,
    #[serde(rename = "type")]
    pub order_type: ConditionalOrderType,
    pub time_in_force: Option<TimeInForce>,
    /// Omitted when `close_position` is set
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub trigger_price: Option<Decimal>,
    pub working_type: Option<WorkingType>,
    pub close_position: Option<bool>,
    pub reduce_only: Option<bool>,
    pub activate_price: Option<Decimal>,
    pub callback_rate: Option<Decimal>,
    pub client_algo_id: Option<String>,
    pub price_protect: Option<bool>,
    pub self_trade_prevention_mode: Option<SelfTradePreventionMode>,
}

impl NewAlgoOrderRequest {
    pub fn conditional(
        symbol: impl Into<String>,
        side: OrderSide,
        order_type: ConditionalOrderType,
    ) -> Self {
        Self {
            algo_type: AlgoType::Conditional,
            symbol: symbol.into(),
            side,
            position_side: None,
            order_type,
            time_in_force: None,
            quantity: None,
            price: None,
            trigger_price: None,
            working_type: None,
            close_position: None,
            reduce_only: None,
            activate_price: None,
            callback_rate: None,
            client_algo_id: None,
            price_protect: None,
            self_trade_prevention_mode: None,
        }
    }

    #[must_use]
    pub fn with_trigger_price(mut self, trigger_price: Decimal) -> Self {
        self.trigger_price = Some(trigger_price);
        self
    }

    #[must_use]
    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = Some(quantity);
        self
    }

    #[must_use]
    pub fn with_position_side(mut self, position_side: PositionSide) -> Self {
        self.position_side = Some(position_side);
        self
    }

    #[must_use]
    pub fn with_client_algo_id(mut self, client_algo_id: impl Into<String>) -> Self {
        self.client_algo_id = Some(client_algo_id.into());
        self
    }

    #[must_use]
    pub fn close_position(mut self, close_position: bool) -> Self {
        self.close_position = Some(close_position);
        self
    }
}

/// Identifies one algo order; also used for cancellation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgoOrderQuery {
    pub symbol: Option<String>,
    pub algo_id: Option<u64>,
    pub client_algo_id: Option<String>,
}

impl AlgoOrderQuery {
    pub fn by_algo_id(algo_id: u64) -> Self {
        Self {
            algo_id: Some(algo_id),
            ..Self::default()
        }
    }

    pub fn by_client_algo_id(client_algo_id: impl Into<String>) -> Self {
        Self {
            client_algo_id: Some(client_algo_id.into()),
            ..Self::default()
        }
    }
}

/// History query; the exchange serves at most seven days
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllAlgoOrdersRequest {
    pub symbol: String,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgoOrderResult {
    pub algo_id: u64,
    pub client_algo_id: String,
    pub symbol: String,
    pub side: OrderSide,
    #[serde(default)]
    pub position_side: Option<PositionSide>,
    #[serde(default)]
    pub time_in_force: Option<TimeInForce>,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub trigger_price: String,
    #[serde(default)]
    pub price: Option<String>,
    pub algo_status: AlgoStatus,
    #[serde(default)]
    pub algo_type: String,
    #[serde(default)]
    pub order_type: String,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub update_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlgoOrderResult {
    pub algo_id: u64,
    pub client_algo_id: String,
    pub symbol: String,
    pub side: OrderSide,
    #[serde(default)]
    pub position_side: Option<PositionSide>,
    #[serde(default)]
    pub time_in_force: Option<TimeInForce>,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub trigger_price: String,
    #[serde(default)]
    pub price: Option<String>,
    pub algo_status: AlgoStatus,
    pub algo_type: AlgoType,
    pub order_type: ConditionalOrderType,
    #[serde(default)]
    pub close_position: bool,
    #[serde(default)]
    pub reduce_only: bool,
    #[serde(default)]
    pub price_protect: bool,
    #[serde(default)]
    pub working_type: Option<WorkingType>,
    #[serde(default)]
    pub self_trade_prevention_mode: Option<SelfTradePreventionMode>,
    #[serde(default)]
    pub activate_price: Option<String>,
    #[serde(default)]
    pub callback_rate: Option<String>,
    #[serde(default)]
    pub trigger_time: i64,
    #[serde(default)]
    pub good_till_date: i64,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub update_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAlgoOrderResult {
    pub algo_id: u64,
    pub client_algo_id: String,
    #[serde(deserialize_with = "crate::exchanges::futures::types::string_or_number")]
    pub code: String,
    pub msg: String,
}

// Market data only served on USDⓈ-M

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiAssetsMode {
    pub multi_assets_margin: bool,
}

/// Composite index and its constituents
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    pub symbol: String,
    pub time: i64,
    pub component: String,
    pub base_asset_list: Vec<IndexComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexComponent {
    pub base_asset: String,
    pub quote_asset: String,
    pub weight_in_quantity: String,
    pub weight_in_percentage: String,
}

/// Entry of `futures/data/takerlongshortRatio`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakerLongShortRatio {
    pub buy_sell_ratio: String,
    pub buy_vol: String,
    pub sell_vol: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTradingStatus {
    /// Keyed by symbol, or `ACCOUNT` for account-wide indicators
    #[serde(default)]
    pub indicators: HashMap<String, Vec<TradingIndicator>>,
    pub update_time: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingIndicator {
    pub is_locked: bool,
    pub planned_recover_time: i64,
    pub indicator: String,
    pub value: f64,
    pub trigger_value: f64,
}

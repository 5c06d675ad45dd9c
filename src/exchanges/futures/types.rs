use rust_decimal::Decimal;
use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// Enumerations shared by both futures products

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    Both,
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Limit,
    Market,
    Stop,
    StopMarket,
    TakeProfit,
    TakeProfitMarket,
    TrailingStopMarket,
    Liquidation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
    /// Post only
    Gtx,
    Gtd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkingType {
    MarkPrice,
    ContractPrice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderResponseType {
    Ack,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelfTradePreventionMode {
    None,
    ExpireTaker,
    ExpireMaker,
    ExpireBoth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarginType {
    Isolated,
    Crossed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractType {
    Perpetual,
    CurrentMonth,
    NextMonth,
    CurrentQuarter,
    NextQuarter,
    PerpetualDelivering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutoCloseType {
    Liquidation,
    Adl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KlineInterval {
    #[serde(rename = "1m")]
    Minutes1,
    #[serde(rename = "3m")]
    Minutes3,
    #[serde(rename = "5m")]
    Minutes5,
    #[serde(rename = "15m")]
    Minutes15,
    #[serde(rename = "30m")]
    Minutes30,
    #[serde(rename = "1h")]
    Hours1,
    #[serde(rename = "2h")]
    Hours2,
    #[serde(rename = "4h")]
    Hours4,
    #[serde(rename = "6h")]
    Hours6,
    #[serde(rename = "8h")]
    Hours8,
    #[serde(rename = "12h")]
    Hours12,
    #[serde(rename = "1d")]
    Days1,
    #[serde(rename = "3d")]
    Days3,
    #[serde(rename = "1w")]
    Weeks1,
    #[serde(rename = "1M")]
    Months1,
}

impl KlineInterval {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minutes1 => "1m",
            Self::Minutes3 => "3m",
            Self::Minutes5 => "5m",
            Self::Minutes15 => "15m",
            Self::Minutes30 => "30m",
            Self::Hours1 => "1h",
            Self::Hours2 => "2h",
            Self::Hours4 => "4h",
            Self::Hours6 => "6h",
            Self::Hours8 => "8h",
            Self::Hours12 => "12h",
            Self::Days1 => "1d",
            Self::Days3 => "3d",
            Self::Weeks1 => "1w",
            Self::Months1 => "1M",
        }
    }
}

impl fmt::Display for KlineInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Period of the `futures/data` statistics routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatisticsPeriod {
    #[serde(rename = "5m")]
    Minutes5,
    #[serde(rename = "15m")]
    Minutes15,
    #[serde(rename = "30m")]
    Minutes30,
    #[serde(rename = "1h")]
    Hours1,
    #[serde(rename = "2h")]
    Hours2,
    #[serde(rename = "4h")]
    Hours4,
    #[serde(rename = "6h")]
    Hours6,
    #[serde(rename = "12h")]
    Hours12,
    #[serde(rename = "1d")]
    Days1,
}

/// Direction of an isolated margin adjustment, sent as `1` or `2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionMarginChange {
    Add,
    Reduce,
}

impl PositionMarginChange {
    pub const fn code(self) -> u8 {
        match self {
            Self::Add => 1,
            Self::Reduce => 2,
        }
    }
}

impl Serialize for PositionMarginChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

// Request parameters

/// New order parameters for `POST /order` and `POST /batchOrders`.
///
/// Field order is the order of the signed query string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub position_side: Option<PositionSide>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub time_in_force: Option<TimeInForce>,
    pub quantity: Option<Decimal>,
    pub reduce_only: Option<bool>,
    pub price: Option<Decimal>,
    pub new_client_order_id: Option<String>,
    pub stop_price: Option<Decimal>,
    pub close_position: Option<bool>,
    pub activation_price: Option<Decimal>,
    pub callback_rate: Option<Decimal>,
    pub working_type: Option<WorkingType>,
    pub price_protect: Option<bool>,
    pub new_order_resp_type: Option<OrderResponseType>,
    pub self_trade_prevention_mode: Option<SelfTradePreventionMode>,
    pub good_till_date: Option<i64>,
}

impl NewOrderRequest {
    pub fn new(symbol: impl Into<String>, side: OrderSide, order_type: OrderType) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            position_side: None,
            order_type,
            time_in_force: None,
            quantity: None,
            reduce_only: None,
            price: None,
            new_client_order_id: None,
            stop_price: None,
            close_position: None,
            activation_price: None,
            callback_rate: None,
            working_type: None,
            price_protect: None,
            new_order_resp_type: None,
            self_trade_prevention_mode: None,
            good_till_date: None,
        }
    }

    /// Good-till-cancel limit order
    pub fn limit(symbol: impl Into<String>, side: OrderSide, quantity: Decimal, price: Decimal) -> Self {
        let mut order = Self::new(symbol, side, OrderType::Limit);
        order.quantity = Some(quantity);
        order.price = Some(price);
        order.time_in_force = Some(TimeInForce::Gtc);
        order
    }

    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: Decimal) -> Self {
        let mut order = Self::new(symbol, side, OrderType::Market);
        order.quantity = Some(quantity);
        order
    }

    #[must_use]
    pub fn with_client_order_id(mut self, client_order_id: impl Into<String>) -> Self {
        self.new_client_order_id = Some(client_order_id.into());
        self
    }

    #[must_use]
    pub fn with_position_side(mut self, position_side: PositionSide) -> Self {
        self.position_side = Some(position_side);
        self
    }

    #[must_use]
    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }

    #[must_use]
    pub fn with_stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    #[must_use]
    pub fn reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = Some(reduce_only);
        self
    }
}

/// Identifies one order by exchange id or client id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub symbol: String,
    pub order_id: Option<u64>,
    pub orig_client_order_id: Option<String>,
}

impl OrderQuery {
    pub fn by_order_id(symbol: impl Into<String>, order_id: u64) -> Self {
        Self {
            symbol: symbol.into(),
            order_id: Some(order_id),
            orig_client_order_id: None,
        }
    }

    pub fn by_client_order_id(symbol: impl Into<String>, client_order_id: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            order_id: None,
            orig_client_order_id: Some(client_order_id.into()),
        }
    }
}

/// Batch cancel by id lists; the lists are sent JSON-encoded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelMultipleOrdersRequest {
    pub symbol: String,
    pub order_id_list: Option<Vec<u64>>,
    pub orig_client_order_id_list: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownCancelAllRequest {
    pub symbol: String,
    /// Milliseconds; `0` cancels the countdown
    pub countdown_time: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllOrdersRequest {
    pub symbol: Option<String>,
    pub pair: Option<String>,
    pub order_id: Option<u64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KlinesRequest {
    pub symbol: String,
    pub interval: KlineInterval,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

impl KlinesRequest {
    pub fn new(symbol: impl Into<String>, interval: KlineInterval) -> Self {
        Self {
            symbol: symbol.into(),
            interval,
            start_time: None,
            end_time: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuousKlinesRequest {
    pub pair: String,
    pub contract_type: ContractType,
    pub interval: KlineInterval,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPriceKlinesRequest {
    pub pair: String,
    pub interval: KlineInterval,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggTradesRequest {
    pub symbol: String,
    pub from_id: Option<u64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateRequest {
    pub symbol: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

/// Parameters of the `futures/data` statistics routes.
///
/// COIN-M keys these by `pair` (plus `contractType` where required), USDⓈ-M
/// by `symbol`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsRequest {
    pub symbol: Option<String>,
    pub pair: Option<String>,
    pub contract_type: Option<ContractType>,
    pub period: StatisticsPeriod,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

impl StatisticsRequest {
    pub fn for_symbol(symbol: impl Into<String>, period: StatisticsPeriod) -> Self {
        Self {
            symbol: Some(symbol.into()),
            pair: None,
            contract_type: None,
            period,
            start_time: None,
            end_time: None,
            limit: None,
        }
    }

    pub fn for_pair(pair: impl Into<String>, period: StatisticsPeriod) -> Self {
        Self {
            symbol: None,
            pair: Some(pair.into()),
            contract_type: None,
            period,
            start_time: None,
            end_time: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_contract_type(mut self, contract_type: ContractType) -> Self {
        self.contract_type = Some(contract_type);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionMarginRequest {
    pub symbol: String,
    pub position_side: Option<PositionSide>,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub change: PositionMarginChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionMarginHistoryRequest {
    pub symbol: String,
    #[serde(rename = "type")]
    pub change: Option<PositionMarginChange>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTradesRequest {
    pub symbol: Option<String>,
    pub pair: Option<String>,
    pub order_id: Option<u64>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub from_id: Option<u64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRequest {
    pub symbol: Option<String>,
    pub income_type: Option<String>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceOrdersRequest {
    pub symbol: Option<String>,
    pub auto_close_type: Option<AutoCloseType>,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

// Responses

/// Success body without content, e.g. `{}` from ping
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EmptyResponse {}

/// `{ "code": .., "msg": .. }` acknowledgement or per-item batch error
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CodeMsg {
    pub code: i32,
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenKey {
    pub listen_key: String,
}

/// Response that is an object for a single symbol and an array otherwise
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfo {
    pub timezone: String,
    pub server_time: i64,
    pub rate_limits: Vec<crate::core::kernel::RateLimitRule>,
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub pair: String,
    pub contract_type: String,
    pub delivery_date: i64,
    pub onboard_date: i64,
    /// `status` on USDⓈ-M, `contractStatus` on COIN-M
    #[serde(alias = "contractStatus")]
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub margin_asset: String,
    pub price_precision: u32,
    pub quantity_precision: u32,
    #[serde(default)]
    pub contract_size: Option<u64>,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
    #[serde(default)]
    pub order_types: Vec<OrderType>,
    #[serde(default)]
    pub time_in_force: Vec<TimeInForce>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFilter {
    pub filter_type: String,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub tick_size: Option<String>,
    pub min_qty: Option<String>,
    pub max_qty: Option<String>,
    pub step_size: Option<String>,
    pub limit: Option<u32>,
    pub notional: Option<String>,
}

/// `[price, quantity]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriceLevel(pub String, pub String);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    pub last_update_id: u64,
    #[serde(rename = "E")]
    pub message_time: Option<i64>,
    #[serde(rename = "T")]
    pub transaction_time: Option<i64>,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: u64,
    pub price: String,
    pub qty: String,
    /// USDⓈ-M only
    pub quote_qty: Option<String>,
    /// COIN-M only
    pub base_qty: Option<String>,
    pub time: i64,
    pub is_buyer_maker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AggTrade {
    #[serde(rename = "a")]
    pub agg_trade_id: u64,
    #[serde(rename = "p")]
    pub price: String,
    #[serde(rename = "q")]
    pub quantity: String,
    #[serde(rename = "f")]
    pub first_trade_id: u64,
    #[serde(rename = "l")]
    pub last_trade_id: u64,
    #[serde(rename = "T")]
    pub time: i64,
    #[serde(rename = "m")]
    pub is_buyer_maker: bool,
}

type KlineRow = (
    i64,
    String,
    String,
    String,
    String,
    String,
    i64,
    String,
    u64,
    String,
    String,
    IgnoredAny,
);

/// Candle decoded from the exchange's positional array
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "KlineRow")]
pub struct Kline {
    pub open_time: i64,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    /// Contracts on COIN-M, base asset on USDⓈ-M
    pub volume: String,
    pub close_time: i64,
    /// Base asset volume on COIN-M, quote asset volume on USDⓈ-M
    pub secondary_volume: String,
    pub number_of_trades: u64,
    pub taker_buy_volume: String,
    pub taker_buy_secondary_volume: String,
}

impl From<KlineRow> for Kline {
    fn from(row: KlineRow) -> Self {
        let (
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time,
            secondary_volume,
            number_of_trades,
            taker_buy_volume,
            taker_buy_secondary_volume,
            _,
        ) = row;
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time,
            secondary_volume,
            number_of_trades,
            taker_buy_volume,
            taker_buy_secondary_volume,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPrice {
    pub symbol: String,
    /// COIN-M only
    pub pair: Option<String>,
    pub mark_price: String,
    pub index_price: String,
    pub estimated_settle_price: String,
    pub last_funding_rate: String,
    pub interest_rate: String,
    pub next_funding_time: i64,
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRate {
    pub symbol: String,
    pub funding_time: i64,
    pub funding_rate: String,
    pub mark_price: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hr {
    pub symbol: String,
    pub pair: Option<String>,
    pub price_change: String,
    pub price_change_percent: String,
    pub weighted_avg_price: String,
    pub last_price: String,
    pub last_qty: String,
    pub open_price: String,
    pub high_price: String,
    pub low_price: String,
    pub volume: String,
    /// COIN-M only
    pub base_volume: Option<String>,
    /// USDⓈ-M only
    pub quote_volume: Option<String>,
    pub open_time: i64,
    pub close_time: i64,
    pub first_id: i64,
    pub last_id: i64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTicker {
    pub symbol: String,
    /// Pair, COIN-M only
    pub ps: Option<String>,
    pub price: String,
    pub time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookTicker {
    pub symbol: String,
    pub pair: Option<String>,
    pub bid_price: String,
    pub bid_qty: String,
    pub ask_price: String,
    pub ask_qty: String,
    pub time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterest {
    pub symbol: String,
    pub pair: Option<String>,
    pub open_interest: String,
    pub contract_type: Option<String>,
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInterestHist {
    pub symbol: Option<String>,
    pub pair: Option<String>,
    pub contract_type: Option<String>,
    pub sum_open_interest: String,
    pub sum_open_interest_value: String,
    pub timestamp: i64,
}

/// Entry of the long/short ratio statistics routes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongShortRatio {
    pub symbol: Option<String>,
    pub pair: Option<String>,
    pub long_short_ratio: String,
    #[serde(alias = "longPosition")]
    pub long_account: String,
    #[serde(alias = "shortPosition")]
    pub short_account: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionModeResponse {
    pub dual_side_position: bool,
}

/// Order record as returned by the order routes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    pub symbol: String,
    pub order_id: u64,
    pub client_order_id: String,
    #[serde(default)]
    pub pair: Option<String>,
    pub side: OrderSide,
    #[serde(default)]
    pub position_side: Option<PositionSide>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub orig_type: Option<OrderType>,
    pub status: String,
    #[serde(default)]
    pub time_in_force: Option<TimeInForce>,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub avg_price: Option<String>,
    #[serde(default)]
    pub orig_qty: String,
    #[serde(default)]
    pub executed_qty: String,
    #[serde(default)]
    pub cum_qty: Option<String>,
    /// COIN-M only
    #[serde(default)]
    pub cum_base: Option<String>,
    /// USDⓈ-M only
    #[serde(default)]
    pub cum_quote: Option<String>,
    #[serde(default)]
    pub stop_price: Option<String>,
    #[serde(default)]
    pub reduce_only: Option<bool>,
    #[serde(default)]
    pub close_position: Option<bool>,
    #[serde(default)]
    pub working_type: Option<WorkingType>,
    #[serde(default)]
    pub price_protect: Option<bool>,
    #[serde(default)]
    pub activate_price: Option<String>,
    #[serde(default)]
    pub price_rate: Option<String>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub update_time: Option<i64>,
}

/// One entry of a batch response: the order, or the reason it failed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BatchOrderResult {
    Order(Box<OrderResult>),
    Error(CodeMsg),
}

impl BatchOrderResult {
    pub fn order(&self) -> Option<&OrderResult> {
        match self {
            Self::Order(order) => Some(order.as_ref()),
            Self::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&CodeMsg> {
        match self {
            Self::Order(_) => None,
            Self::Error(error) => Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownCancelAllResult {
    pub symbol: String,
    #[serde(deserialize_with = "string_or_number")]
    pub countdown_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub account_alias: String,
    pub asset: String,
    pub balance: String,
    #[serde(default)]
    pub cross_wallet_balance: Option<String>,
    #[serde(default)]
    pub cross_un_pnl: Option<String>,
    pub available_balance: String,
    #[serde(default)]
    pub max_withdraw_amount: Option<String>,
    /// COIN-M only
    #[serde(default)]
    pub withdraw_available: Option<String>,
    #[serde(default)]
    pub margin_available: Option<bool>,
    pub update_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default)]
    pub fee_tier: Option<u32>,
    #[serde(default)]
    pub can_trade: Option<bool>,
    #[serde(default)]
    pub can_deposit: Option<bool>,
    #[serde(default)]
    pub can_withdraw: Option<bool>,
    #[serde(default)]
    pub total_wallet_balance: Option<String>,
    #[serde(default)]
    pub total_unrealized_profit: Option<String>,
    #[serde(default)]
    pub total_margin_balance: Option<String>,
    #[serde(default)]
    pub available_balance: Option<String>,
    #[serde(default)]
    pub max_withdraw_amount: Option<String>,
    pub assets: Vec<AccountAsset>,
    pub positions: Vec<AccountPosition>,
    #[serde(default)]
    pub update_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountAsset {
    pub asset: String,
    pub wallet_balance: String,
    pub unrealized_profit: String,
    pub margin_balance: String,
    pub maint_margin: String,
    pub initial_margin: String,
    pub position_initial_margin: String,
    pub open_order_initial_margin: String,
    pub max_withdraw_amount: String,
    #[serde(default)]
    pub cross_wallet_balance: Option<String>,
    #[serde(default)]
    pub cross_un_pnl: Option<String>,
    #[serde(default)]
    pub available_balance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPosition {
    pub symbol: String,
    pub initial_margin: String,
    pub maint_margin: String,
    pub unrealized_profit: String,
    pub position_initial_margin: String,
    pub open_order_initial_margin: String,
    #[serde(deserialize_with = "string_or_number")]
    pub leverage: String,
    pub isolated: bool,
    pub position_side: PositionSide,
    pub entry_price: String,
    #[serde(default)]
    pub position_amt: Option<String>,
    #[serde(default)]
    pub update_time: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageResult {
    pub symbol: String,
    pub leverage: u32,
    /// COIN-M only
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub max_qty: Option<String>,
    /// USDⓈ-M only
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub max_notional_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionMarginResult {
    pub amount: f64,
    pub code: i32,
    pub msg: String,
    #[serde(rename = "type")]
    pub change: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionMarginHistory {
    pub symbol: String,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    pub asset: String,
    pub time: i64,
    #[serde(rename = "type")]
    pub change: u8,
    pub position_side: PositionSide,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRisk {
    pub symbol: String,
    pub position_amt: String,
    pub entry_price: String,
    pub mark_price: String,
    pub un_realized_profit: String,
    pub liquidation_price: String,
    pub leverage: String,
    pub margin_type: String,
    pub isolated_margin: String,
    #[serde(deserialize_with = "string_or_bool")]
    pub is_auto_add_margin: bool,
    pub position_side: PositionSide,
    /// COIN-M only
    #[serde(default)]
    pub max_qty: Option<String>,
    /// USDⓈ-M only
    #[serde(default)]
    pub max_notional_value: Option<String>,
    #[serde(default)]
    pub notional_value: Option<String>,
    #[serde(default)]
    pub update_time: Option<i64>,
}

impl PositionRisk {
    /// Whether the position holds a non-zero amount
    pub fn has_position(&self) -> bool {
        Decimal::from_str(&self.position_amt).map_or(false, |amount| !amount.is_zero())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTrade {
    pub symbol: String,
    pub id: u64,
    pub order_id: u64,
    #[serde(default)]
    pub pair: Option<String>,
    pub side: OrderSide,
    pub price: String,
    pub qty: String,
    pub realized_pnl: String,
    #[serde(default)]
    pub margin_asset: Option<String>,
    #[serde(default)]
    pub base_qty: Option<String>,
    #[serde(default)]
    pub quote_qty: Option<String>,
    pub commission: String,
    pub commission_asset: String,
    pub time: i64,
    pub position_side: PositionSide,
    pub buyer: bool,
    pub maker: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Income {
    pub symbol: String,
    pub income_type: String,
    pub income: String,
    pub asset: String,
    pub info: String,
    pub time: i64,
    #[serde(deserialize_with = "string_or_number")]
    pub tran_id: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub trade_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageBrackets {
    /// USDⓈ-M keys brackets by symbol, COIN-M by pair
    #[serde(alias = "pair")]
    pub symbol: String,
    #[serde(default)]
    pub notional_coef: Option<f64>,
    pub brackets: Vec<LeverageBracket>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageBracket {
    pub bracket: u32,
    pub initial_leverage: u32,
    #[serde(alias = "qtyCap")]
    pub notional_cap: f64,
    #[serde(alias = "qtylFloor", alias = "qtyFloor")]
    pub notional_floor: f64,
    pub maint_margin_ratio: f64,
    pub cum: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdlQuantile {
    pub symbol: String,
    pub adl_quantile: AdlQuantileLevels,
}

/// Quantiles per position side; `both` in one-way mode, `long`/`short`/`hedge` otherwise
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct AdlQuantileLevels {
    pub long: Option<u8>,
    pub short: Option<u8>,
    pub both: Option<u8>,
    pub hedge: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRate {
    pub symbol: String,
    pub maker_commission_rate: String,
    pub taker_commission_rate: String,
}

// Broker referral

/// Which futures book a broker query refers to, sent as `1` or `2`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BrokerFuturesType {
    #[default]
    UsdMargined,
    CoinMargined,
}

impl BrokerFuturesType {
    pub const fn code(self) -> u8 {
        match self {
            Self::UsdMargined => 1,
            Self::CoinMargined => 2,
        }
    }
}

impl Serialize for BrokerFuturesType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerVolumeRequest {
    #[serde(rename = "type")]
    pub futures_type: BrokerFuturesType,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerCustomIdsRequest {
    pub customer_id: Option<String>,
    pub email: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerIfNewUser {
    pub broker_id: String,
    pub rebate_working: bool,
    pub if_new_user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerCustomId {
    pub customer_id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerUserCustomization {
    #[serde(default)]
    pub broker_id: Option<String>,
    pub customer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerRebateOverview {
    pub broker_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub new_trader_rebate_commission: String,
    #[serde(deserialize_with = "string_or_number")]
    pub old_trader_rebate_commission: String,
    pub total_trade_user: u64,
    pub unit: String,
    #[serde(deserialize_with = "string_or_number")]
    pub total_trade_vol: String,
    #[serde(deserialize_with = "string_or_number")]
    pub total_rebate_vol: String,
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerTradeVolume {
    pub unit: String,
    #[serde(deserialize_with = "string_or_number")]
    pub trade_vol: String,
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerRebateVolume {
    pub unit: String,
    #[serde(deserialize_with = "string_or_number")]
    pub rebate_vol: String,
    pub time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerTraderSummary {
    pub customer_id: String,
    pub unit: String,
    #[serde(deserialize_with = "string_or_number")]
    pub trade_vol: String,
    #[serde(deserialize_with = "string_or_number")]
    pub rebate_vol: String,
    pub time: i64,
}

/// Accept an id or amount the exchange sends either as a string or a number
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        String(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::String(s) => s,
        Raw::Integer(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}

pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(s)| s))
}

fn string_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        String(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => Ok(b),
        Raw::String(s) => s.parse().map_err(de::Error::custom),
    }
}

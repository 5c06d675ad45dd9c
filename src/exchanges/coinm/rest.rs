use crate::core::config::BaseUrlKey;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{RateLimitBucket, RateLimitUsage, RestClient, ServerTime};
use crate::core::order_id::{check_order_id_prefix, validate_order_id};
use crate::core::types::Params;
use crate::exchanges::coinm::types::{Basis, TakerBuySellVolume};
use crate::exchanges::futures::{
    batch_orders_params, cancel_multiple_params, AccountInfo, AdlQuantile, AggTrade,
    AggTradesRequest, AllOrdersRequest, Balance, BatchOrderResult, BookTicker, BrokerCustomId,
    BrokerCustomIdsRequest, BrokerFuturesType, BrokerIfNewUser, BrokerRebateOverview,
    BrokerRebateVolume, BrokerTradeVolume, BrokerTraderSummary, BrokerUserCustomization,
    BrokerVolumeRequest, CancelMultipleOrdersRequest, CodeMsg, CommissionRate,
    ContinuousKlinesRequest,
    CountdownCancelAllRequest, CountdownCancelAllResult, EmptyResponse, ExchangeInfo,
    ForceOrdersRequest, FundingRate, FundingRateRequest, Income, IncomeRequest,
    IndexPriceKlinesRequest, Kline, KlinesRequest, LeverageBrackets, LeverageResult, ListenKey,
    LongShortRatio, MarginType, MarkPrice, NewOrderRequest, OneOrMany, OpenInterest,
    OpenInterestHist, OrderBook, OrderQuery, OrderResult, PositionMarginHistory,
    PositionMarginHistoryRequest, PositionMarginRequest, PositionMarginResult,
    PositionModeResponse, PositionRisk, PriceTicker, StatisticsRequest, Ticker24hr, Trade,
    UserTrade, UserTradesRequest,
};
use reqwest::Method;
use std::collections::HashMap;
use tracing::instrument;

/// Typed routes of the coin-margined futures API (`/dapi`)
pub struct CoinmRestClient<R: RestClient> {
    rest: R,
    category: BaseUrlKey,
}

impl<R: RestClient> CoinmRestClient<R> {
    /// Create a new façade over a request core
    pub fn new(rest: R, category: BaseUrlKey) -> Self {
        Self { rest, category }
    }

    /// API category used for order-id attribution
    pub const fn category(&self) -> BaseUrlKey {
        self.category
    }

    /// Underlying request core
    pub fn rest(&self) -> &R {
        &self.rest
    }

    // Clock and quota state

    /// Exchange clock in epoch milliseconds
    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_server_time(&self) -> Result<i64, ExchangeError> {
        let time: ServerTime = self.rest.get("/dapi/v1/time", Params::new()).await?;
        Ok(time.server_time)
    }

    /// Re-sync the clock now and return the new offset
    pub async fn sync_time(&self) -> Result<i64, ExchangeError> {
        self.rest.sync_time().await
    }

    pub fn get_time_offset(&self) -> i64 {
        self.rest.time_offset()
    }

    pub fn get_rate_limit_states(&self) -> HashMap<RateLimitBucket, RateLimitUsage> {
        self.rest.rate_limit_states()
    }

    // Market data

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn test_connectivity(&self) -> Result<EmptyResponse, ExchangeError> {
        self.rest.get("/dapi/v1/ping", Params::new()).await
    }

    /// Exchange rules; the published rate limits are recorded on the core
    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_exchange_info(&self) -> Result<ExchangeInfo, ExchangeError> {
        let info: ExchangeInfo = self.rest.get("/dapi/v1/exchangeInfo", Params::new()).await?;
        self.rest.apply_rate_limit_rules(&info.rate_limits);
        Ok(info)
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %symbol))]
    pub async fn get_order_book(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<OrderBook, ExchangeError> {
        let params = Params::new().with("symbol", symbol).with_opt("limit", limit);
        self.rest.get("/dapi/v1/depth", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %symbol))]
    pub async fn get_recent_trades(
        &self,
        symbol: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let params = Params::new().with("symbol", symbol).with_opt("limit", limit);
        self.rest.get("/dapi/v1/trades", params).await
    }

    /// Older trades; needs the API key
    #[instrument(skip(self), fields(exchange = "coinm", symbol = %symbol))]
    pub async fn get_historical_trades(
        &self,
        symbol: &str,
        limit: Option<u32>,
        from_id: Option<u64>,
    ) -> Result<Vec<Trade>, ExchangeError> {
        let params = Params::new()
            .with("symbol", symbol)
            .with_opt("limit", limit)
            .with_opt("fromId", from_id);
        self.rest
            .keyed(Method::GET, "/dapi/v1/historicalTrades", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_aggregate_trades(
        &self,
        request: &AggTradesRequest,
    ) -> Result<Vec<AggTrade>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get("/dapi/v1/aggTrades", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_klines(&self, request: &KlinesRequest) -> Result<Vec<Kline>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get("/dapi/v1/klines", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_continuous_contract_klines(
        &self,
        request: &ContinuousKlinesRequest,
    ) -> Result<Vec<Kline>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get("/dapi/v1/continuousKlines", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_index_price_klines(
        &self,
        request: &IndexPriceKlinesRequest,
    ) -> Result<Vec<Kline>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get("/dapi/v1/indexPriceKlines", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_mark_price_klines(
        &self,
        request: &KlinesRequest,
    ) -> Result<Vec<Kline>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get("/dapi/v1/markPriceKlines", params).await
    }

    /// Mark price and funding for every symbol, or those of one symbol or pair
    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_mark_price(
        &self,
        symbol: Option<&str>,
        pair: Option<&str>,
    ) -> Result<Vec<MarkPrice>, ExchangeError> {
        let params = Params::new().with_opt("symbol", symbol).with_opt("pair", pair);
        self.rest.get("/dapi/v1/premiumIndex", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %symbol))]
    pub async fn get_mark_price_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Option<MarkPrice>, ExchangeError> {
        Ok(self.get_mark_price(Some(symbol), None).await?.pop())
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_funding_rate_history(
        &self,
        request: &FundingRateRequest,
    ) -> Result<Vec<FundingRate>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get("/dapi/v1/fundingRate", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_24hr_ticker(
        &self,
        symbol: Option<&str>,
        pair: Option<&str>,
    ) -> Result<Vec<Ticker24hr>, ExchangeError> {
        let params = Params::new().with_opt("symbol", symbol).with_opt("pair", pair);
        self.rest.get("/dapi/v1/ticker/24hr", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_price_ticker(
        &self,
        symbol: Option<&str>,
        pair: Option<&str>,
    ) -> Result<Vec<PriceTicker>, ExchangeError> {
        let params = Params::new().with_opt("symbol", symbol).with_opt("pair", pair);
        self.rest.get("/dapi/v1/ticker/price", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_book_ticker(
        &self,
        symbol: Option<&str>,
        pair: Option<&str>,
    ) -> Result<Vec<BookTicker>, ExchangeError> {
        let params = Params::new().with_opt("symbol", symbol).with_opt("pair", pair);
        self.rest.get("/dapi/v1/ticker/bookTicker", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %symbol))]
    pub async fn get_open_interest(&self, symbol: &str) -> Result<OpenInterest, ExchangeError> {
        let params = Params::new().with("symbol", symbol);
        self.rest.get("/dapi/v1/openInterest", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_open_interest_statistics(
        &self,
        request: &StatisticsRequest,
    ) -> Result<Vec<OpenInterestHist>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get("/futures/data/openInterestHist", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_top_long_short_account_ratio(
        &self,
        request: &StatisticsRequest,
    ) -> Result<Vec<LongShortRatio>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest
            .get("/futures/data/topLongShortAccountRatio", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_top_long_short_position_ratio(
        &self,
        request: &StatisticsRequest,
    ) -> Result<Vec<LongShortRatio>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest
            .get("/futures/data/topLongShortPositionRatio", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_global_long_short_account_ratio(
        &self,
        request: &StatisticsRequest,
    ) -> Result<Vec<LongShortRatio>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest
            .get("/futures/data/globalLongShortAccountRatio", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_taker_buy_sell_volume(
        &self,
        request: &StatisticsRequest,
    ) -> Result<Vec<TakerBuySellVolume>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get("/futures/data/takerBuySellVol", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_basis(&self, request: &StatisticsRequest) -> Result<Vec<Basis>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get("/futures/data/basis", params).await
    }

    // Account and trade

    /// Switch between hedge mode (`true`) and one-way mode
    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn set_position_mode(&self, dual_side_position: bool) -> Result<CodeMsg, ExchangeError> {
        let params = Params::new().with("dualSidePosition", dual_side_position);
        self.rest
            .post_private("/dapi/v1/positionSide/dual", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_position_mode(&self) -> Result<PositionModeResponse, ExchangeError> {
        self.rest
            .get_private("/dapi/v1/positionSide/dual", Params::new())
            .await
    }

    /// Place an order; a missing `newClientOrderId` is issued here
    #[instrument(skip(self), fields(exchange = "coinm", symbol = %order.symbol))]
    pub async fn submit_new_order(&self, order: &NewOrderRequest) -> Result<OrderResult, ExchangeError> {
        let mut params = Params::from_serialize(order)?;
        validate_order_id(&mut params, "newClientOrderId", self.category);
        self.rest.post_private("/dapi/v1/order", params).await
    }

    /// Place up to five orders in one call
    #[instrument(skip(self, orders), fields(exchange = "coinm", count = orders.len()))]
    pub async fn submit_multiple_orders(
        &self,
        orders: &[NewOrderRequest],
    ) -> Result<Vec<BatchOrderResult>, ExchangeError> {
        let params = batch_orders_params(orders, self.category)?;
        self.rest.post_private("/dapi/v1/batchOrders", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %query.symbol))]
    pub async fn get_order(&self, query: &OrderQuery) -> Result<OrderResult, ExchangeError> {
        let params = Params::from_serialize(query)?;
        self.rest.get_private("/dapi/v1/order", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %query.symbol))]
    pub async fn cancel_order(&self, query: &OrderQuery) -> Result<OrderResult, ExchangeError> {
        let params = Params::from_serialize(query)?;
        check_order_id_prefix(&params, "origClientOrderId", self.category);
        self.rest.delete_private("/dapi/v1/order", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %symbol))]
    pub async fn cancel_all_open_orders(&self, symbol: &str) -> Result<CodeMsg, ExchangeError> {
        let params = Params::new().with("symbol", symbol);
        self.rest
            .delete_private("/dapi/v1/allOpenOrders", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %request.symbol))]
    pub async fn cancel_multiple_orders(
        &self,
        request: &CancelMultipleOrdersRequest,
    ) -> Result<Vec<BatchOrderResult>, ExchangeError> {
        let params = cancel_multiple_params(request, self.category)?;
        self.rest.delete_private("/dapi/v1/batchOrders", params).await
    }

    /// Arm (or with `0`, disarm) the auto-cancel countdown
    #[instrument(skip(self), fields(exchange = "coinm", symbol = %request.symbol))]
    pub async fn set_cancel_orders_on_timeout(
        &self,
        request: &CountdownCancelAllRequest,
    ) -> Result<CountdownCancelAllResult, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest
            .post_private("/dapi/v1/countdownCancelAll", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %query.symbol))]
    pub async fn get_current_open_order(&self, query: &OrderQuery) -> Result<OrderResult, ExchangeError> {
        let params = Params::from_serialize(query)?;
        self.rest.get_private("/dapi/v1/openOrder", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_all_open_orders(
        &self,
        symbol: Option<&str>,
        pair: Option<&str>,
    ) -> Result<Vec<OrderResult>, ExchangeError> {
        let params = Params::new().with_opt("symbol", symbol).with_opt("pair", pair);
        self.rest.get_private("/dapi/v1/openOrders", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_all_orders(
        &self,
        request: &AllOrdersRequest,
    ) -> Result<Vec<OrderResult>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get_private("/dapi/v1/allOrders", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_balance(&self) -> Result<Vec<Balance>, ExchangeError> {
        self.rest.get_private("/dapi/v1/balance", Params::new()).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", asset = %asset))]
    pub async fn get_balance_by_asset(&self, asset: &str) -> Result<Option<Balance>, ExchangeError> {
        Ok(self
            .get_balance()
            .await?
            .into_iter()
            .rfind(|balance| balance.asset == asset))
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_account_information(&self) -> Result<AccountInfo, ExchangeError> {
        self.rest.get_private("/dapi/v1/account", Params::new()).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %symbol))]
    pub async fn set_leverage(&self, symbol: &str, leverage: u32) -> Result<LeverageResult, ExchangeError> {
        let params = Params::new().with("symbol", symbol).with("leverage", leverage);
        self.rest.post_private("/dapi/v1/leverage", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %symbol))]
    pub async fn set_margin_type(
        &self,
        symbol: &str,
        margin_type: MarginType,
    ) -> Result<CodeMsg, ExchangeError> {
        let mut params = Params::new().with("symbol", symbol);
        params.insert(
            "marginType",
            match margin_type {
                MarginType::Isolated => "ISOLATED",
                MarginType::Crossed => "CROSSED",
            },
        );
        self.rest.post_private("/dapi/v1/marginType", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %request.symbol))]
    pub async fn set_isolated_position_margin(
        &self,
        request: &PositionMarginRequest,
    ) -> Result<PositionMarginResult, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.post_private("/dapi/v1/positionMargin", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %request.symbol))]
    pub async fn get_position_margin_change_history(
        &self,
        request: &PositionMarginHistoryRequest,
    ) -> Result<Vec<PositionMarginHistory>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest
            .get_private("/dapi/v1/positionMargin/history", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_positions(&self) -> Result<Vec<PositionRisk>, ExchangeError> {
        self.rest
            .get_private("/dapi/v1/positionRisk", Params::new())
            .await
    }

    /// Positions holding a non-zero amount
    pub async fn get_positions_with_amount(&self) -> Result<Vec<PositionRisk>, ExchangeError> {
        let mut positions = self.get_positions().await?;
        positions.retain(PositionRisk::has_position);
        Ok(positions)
    }

    pub async fn get_positions_by_symbol(&self, symbol: &str) -> Result<Vec<PositionRisk>, ExchangeError> {
        let mut positions = self.get_positions().await?;
        positions.retain(|position| position.symbol == symbol);
        Ok(positions)
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_account_trades(
        &self,
        request: &UserTradesRequest,
    ) -> Result<Vec<UserTrade>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get_private("/dapi/v1/userTrades", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_income_history(
        &self,
        request: &IncomeRequest,
    ) -> Result<Vec<Income>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get_private("/dapi/v1/income", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_leverage_brackets(
        &self,
        pair: Option<&str>,
    ) -> Result<Vec<LeverageBrackets>, ExchangeError> {
        let params = Params::new().with_opt("pair", pair);
        let brackets: OneOrMany<LeverageBrackets> = self
            .rest
            .get_private("/dapi/v1/leverageBracket", params)
            .await?;
        Ok(brackets.into_vec())
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_adl_quantile(&self, symbol: Option<&str>) -> Result<Vec<AdlQuantile>, ExchangeError> {
        let params = Params::new().with_opt("symbol", symbol);
        self.rest.get_private("/dapi/v1/adlQuantile", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_force_orders(
        &self,
        request: &ForceOrdersRequest,
    ) -> Result<Vec<OrderResult>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest.get_private("/dapi/v1/forceOrders", params).await
    }

    #[instrument(skip(self), fields(exchange = "coinm", symbol = %symbol))]
    pub async fn get_commission_rate(&self, symbol: &str) -> Result<CommissionRate, ExchangeError> {
        let params = Params::new().with("symbol", symbol);
        self.rest.get_private("/dapi/v1/commissionRate", params).await
    }

    // Broker referral

    /// `futures_type` picks the book the referral applies to
    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_broker_if_new_futures_user(
        &self,
        broker_id: &str,
        futures_type: BrokerFuturesType,
    ) -> Result<BrokerIfNewUser, ExchangeError> {
        let params = Params::new()
            .with("brokerId", broker_id)
            .with("type", futures_type.code());
        self.rest
            .get_private("/dapi/v1/apiReferral/ifNewUser", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn set_broker_custom_id_for_client(
        &self,
        customer_id: &str,
        email: &str,
    ) -> Result<BrokerCustomId, ExchangeError> {
        let params = Params::new()
            .with("customerId", customer_id)
            .with("email", email);
        self.rest
            .post_private("/dapi/v1/apiReferral/customization", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_broker_client_custom_ids(
        &self,
        request: &BrokerCustomIdsRequest,
    ) -> Result<Vec<BrokerCustomId>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest
            .get_private("/dapi/v1/apiReferral/customization", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_broker_user_custom_id(
        &self,
        broker_id: &str,
    ) -> Result<BrokerUserCustomization, ExchangeError> {
        let params = Params::new().with("brokerId", broker_id);
        self.rest
            .get_private("/dapi/v1/apiReferral/userCustomization", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_broker_rebate_data_overview(
        &self,
        futures_type: BrokerFuturesType,
    ) -> Result<BrokerRebateOverview, ExchangeError> {
        let params = Params::new().with("type", futures_type.code());
        self.rest
            .get_private("/dapi/v1/apiReferral/overview", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_broker_user_trade_volume(
        &self,
        request: &BrokerVolumeRequest,
    ) -> Result<Vec<BrokerTradeVolume>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest
            .get_private("/dapi/v1/apiReferral/tradeVol", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_broker_rebate_volume(
        &self,
        request: &BrokerVolumeRequest,
    ) -> Result<Vec<BrokerRebateVolume>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest
            .get_private("/dapi/v1/apiReferral/rebateVol", params)
            .await
    }

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn get_broker_trade_detail(
        &self,
        request: &BrokerVolumeRequest,
    ) -> Result<Vec<BrokerTraderSummary>, ExchangeError> {
        let params = Params::from_serialize(request)?;
        self.rest
            .get_private("/dapi/v1/apiReferral/traderSummary", params)
            .await
    }

    // User data stream session

    #[instrument(skip(self), fields(exchange = "coinm"))]
    pub async fn create_listen_key(&self) -> Result<ListenKey, ExchangeError> {
        self.rest
            .keyed(Method::POST, "/dapi/v1/listenKey", Params::new())
            .await
    }

    #[instrument(skip(self, listen_key), fields(exchange = "coinm"))]
    pub async fn keep_alive_listen_key(&self, listen_key: &str) -> Result<EmptyResponse, ExchangeError> {
        let params = Params::new().with("listenKey", listen_key);
        self.rest
            .keyed(Method::PUT, "/dapi/v1/listenKey", params)
            .await
    }

    #[instrument(skip(self, listen_key), fields(exchange = "coinm"))]
    pub async fn close_listen_key(&self, listen_key: &str) -> Result<EmptyResponse, ExchangeError> {
        let params = Params::new().with("listenKey", listen_key);
        self.rest
            .keyed(Method::DELETE, "/dapi/v1/listenKey", params)
            .await
    }
}

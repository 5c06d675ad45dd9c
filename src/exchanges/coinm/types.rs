use crate::exchanges::futures::ContractType;
use serde::Deserialize;

/// Entry of `futures/data/takerBuySellVol`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TakerBuySellVolume {
    pub pair: String,
    pub contract_type: ContractType,
    pub taker_buy_vol: String,
    pub taker_sell_vol: String,
    pub taker_buy_vol_value: String,
    pub taker_sell_vol_value: String,
    pub timestamp: i64,
}

/// Entry of `futures/data/basis`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basis {
    pub pair: String,
    pub contract_type: ContractType,
    pub futures_price: String,
    pub index_price: String,
    pub basis: String,
    pub basis_rate: String,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basis_decodes() {
        let basis: Basis = serde_json::from_value(json!({
            "indexPrice": "29269.93972727",
            "contractType": "CURRENT_QUARTER",
            "basisRate": "0.0024",
            "futuresPrice": "29341.3",
            "basis": "71.36027273",
            "pair": "BTCUSD",
            "timestamp": 1653381600000i64
        }))
        .unwrap();
        assert_eq!(basis.contract_type, ContractType::CurrentQuarter);
        assert_eq!(basis.basis, "71.36027273");
    }
}

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::trace;

const USED_WEIGHT_HEADER: &str = "x-mbx-used-weight";
const USED_WEIGHT_HEADER_PREFIX: &str = "x-mbx-used-weight-";
const ORDER_COUNT_HEADER_PREFIX: &str = "x-mbx-order-count-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateLimitType {
    RequestWeight,
    Orders,
    RawRequests,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateLimitInterval {
    Second,
    Minute,
    Hour,
    Day,
}

impl RateLimitInterval {
    fn from_unit(unit: char) -> Option<Self> {
        match unit.to_ascii_lowercase() {
            's' => Some(Self::Second),
            'm' => Some(Self::Minute),
            'h' => Some(Self::Hour),
            'd' => Some(Self::Day),
            _ => None,
        }
    }

    const fn unit(self) -> char {
        match self {
            Self::Second => 's',
            Self::Minute => 'm',
            Self::Hour => 'h',
            Self::Day => 'd',
        }
    }
}

/// One exchange quota, e.g. request weight per 1 minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitBucket {
    pub rate_limit_type: RateLimitType,
    pub interval: RateLimitInterval,
    pub interval_num: u32,
}

impl RateLimitBucket {
    pub const fn new(
        rate_limit_type: RateLimitType,
        interval_num: u32,
        interval: RateLimitInterval,
    ) -> Self {
        Self {
            rate_limit_type,
            interval,
            interval_num,
        }
    }

    /// Parse a usage header name such as `x-mbx-used-weight-1m`
    pub fn from_header(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        // Legacy header without a window counts against the one-minute weight
        if name == USED_WEIGHT_HEADER {
            return Some(Self::new(RateLimitType::RequestWeight, 1, RateLimitInterval::Minute));
        }
        let (rate_limit_type, window) = if let Some(window) = name.strip_prefix(USED_WEIGHT_HEADER_PREFIX) {
            (RateLimitType::RequestWeight, window)
        } else if let Some(window) = name.strip_prefix(ORDER_COUNT_HEADER_PREFIX) {
            (RateLimitType::Orders, window)
        } else {
            return None;
        };

        let unit = window.chars().last()?;
        let interval = RateLimitInterval::from_unit(unit)?;
        let interval_num = window[..window.len() - unit.len_utf8()].parse().ok()?;
        Some(Self::new(rate_limit_type, interval_num, interval))
    }
}

impl fmt::Display for RateLimitBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.rate_limit_type {
            RateLimitType::RequestWeight => "REQUEST_WEIGHT",
            RateLimitType::Orders => "ORDERS",
            RateLimitType::RawRequests => "RAW_REQUESTS",
        };
        write!(f, "{}:{}{}", kind, self.interval_num, self.interval.unit())
    }
}

/// Quota rule as published in exchange info
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRule {
    pub rate_limit_type: RateLimitType,
    pub interval: RateLimitInterval,
    pub interval_num: u32,
    pub limit: u64,
}

impl RateLimitRule {
    pub const fn bucket(&self) -> RateLimitBucket {
        RateLimitBucket::new(self.rate_limit_type, self.interval_num, self.interval)
    }
}

/// Last observed usage of a bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitUsage {
    pub used: u64,
    pub limit: Option<u64>,
}

impl RateLimitUsage {
    /// Remaining quota, when the limit is known
    pub fn remaining(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.used))
    }
}

/// Observational record of exchange-reported quota usage.
///
/// Every response overwrites the usage of the buckets it reports. Nothing
/// here throttles or retries; admission control is left to the caller.
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    states: RwLock<HashMap<RateLimitBucket, RateLimitUsage>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update usage from the rate-limit headers of a response
    pub fn record_response(&self, headers: &HeaderMap) {
        let observed: Vec<(RateLimitBucket, u64)> = headers
            .iter()
            .filter_map(|(name, value)| {
                let bucket = RateLimitBucket::from_header(name.as_str())?;
                let used = value.to_str().ok()?.trim().parse().ok()?;
                Some((bucket, used))
            })
            .collect();

        if observed.is_empty() {
            return;
        }

        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        for (bucket, used) in observed {
            trace!(bucket = %bucket, used, "rate limit usage");
            states.entry(bucket).or_default().used = used;
        }
    }

    /// Record published limits so snapshots can report remaining quota
    pub fn apply_rules(&self, rules: &[RateLimitRule]) {
        let mut states = self.states.write().unwrap_or_else(PoisonError::into_inner);
        for rule in rules {
            states.entry(rule.bucket()).or_default().limit = Some(rule.limit);
        }
    }

    pub fn usage(&self, bucket: &RateLimitBucket) -> Option<RateLimitUsage> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(bucket)
            .copied()
    }

    /// Snapshot of every bucket seen so far
    pub fn snapshot(&self) -> HashMap<RateLimitBucket, RateLimitUsage> {
        self.states
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn weight_1m() -> RateLimitBucket {
        RateLimitBucket::new(RateLimitType::RequestWeight, 1, RateLimitInterval::Minute)
    }

    #[test]
    fn test_parse_usage_headers() {
        assert_eq!(
            RateLimitBucket::from_header("X-MBX-USED-WEIGHT-1M"),
            Some(weight_1m())
        );
        assert_eq!(
            RateLimitBucket::from_header("x-mbx-order-count-10s"),
            Some(RateLimitBucket::new(
                RateLimitType::Orders,
                10,
                RateLimitInterval::Second
            ))
        );
        assert_eq!(
            RateLimitBucket::from_header("X-MBX-USED-WEIGHT"),
            Some(weight_1m())
        );
        assert_eq!(RateLimitBucket::from_header("x-mbx-used-weight-1w"), None);
        assert_eq!(RateLimitBucket::from_header("content-type"), None);
    }

    #[test]
    fn test_usage_is_overwritten_not_accumulated() {
        let tracker = RateLimitTracker::new();

        let mut headers = HeaderMap::new();
        headers.insert("x-mbx-used-weight-1m", HeaderValue::from_static("10"));
        tracker.record_response(&headers);

        headers.insert("x-mbx-used-weight-1m", HeaderValue::from_static("7"));
        tracker.record_response(&headers);

        assert_eq!(tracker.usage(&weight_1m()).map(|u| u.used), Some(7));
    }

    #[test]
    fn test_unsuffixed_weight_header_is_recorded() {
        let tracker = RateLimitTracker::new();
        let mut headers = HeaderMap::new();
        headers.insert("x-mbx-used-weight", HeaderValue::from_static("33"));
        tracker.record_response(&headers);
        assert_eq!(tracker.usage(&weight_1m()).map(|u| u.used), Some(33));
    }

    #[test]
    fn test_rules_fill_limits() {
        let tracker = RateLimitTracker::new();
        tracker.apply_rules(&[RateLimitRule {
            rate_limit_type: RateLimitType::RequestWeight,
            interval: RateLimitInterval::Minute,
            interval_num: 1,
            limit: 2400,
        }]);

        let mut headers = HeaderMap::new();
        headers.insert("x-mbx-used-weight-1m", HeaderValue::from_static("400"));
        tracker.record_response(&headers);

        let usage = tracker.usage(&weight_1m()).unwrap();
        assert_eq!(usage.limit, Some(2400));
        assert_eq!(usage.remaining(), Some(2000));
    }

    #[test]
    fn test_garbage_values_are_ignored() {
        let tracker = RateLimitTracker::new();
        let mut headers = HeaderMap::new();
        headers.insert("x-mbx-used-weight-1m", HeaderValue::from_static("lots"));
        tracker.record_response(&headers);
        assert!(tracker.snapshot().is_empty());
    }

    #[test]
    fn test_bucket_display() {
        assert_eq!(weight_1m().to_string(), "REQUEST_WEIGHT:1m");
    }
}

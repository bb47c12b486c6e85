use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use futures_util::future::join_all;
use tokio::time;

use crate::{
    error::AlarmError,
    models::{InstrumentKey, Watch},
    services::binance::PriceOracle,
};

pub type ResolvedPrices = BTreeMap<InstrumentKey, Result<f64, AlarmError>>;

/// Resolves one price per distinct (symbol, market) among `watches`.
///
/// Groups are fetched concurrently and joined before returning. Each fetch is
/// bounded by `timeout`; a failed, timed-out or nonsensical price is recorded
/// against its group only.
pub async fn resolve_prices(
    oracle: &dyn PriceOracle,
    watches: &[Watch],
    timeout: Duration,
) -> ResolvedPrices {
    let keys: BTreeSet<InstrumentKey> = watches.iter().map(Watch::group_key).collect();

    let fetches = keys.into_iter().map(|key| async move {
        let res = match time::timeout(timeout, oracle.get_price(&key.symbol, key.market)).await {
            Ok(Ok(price)) if price.is_finite() && price > 0.0 => Ok(price),
            Ok(Ok(price)) => Err(AlarmError::PriceResolution(format!(
                "invalid price {price}"
            ))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AlarmError::PriceResolution(format!(
                "timed out after {}ms",
                timeout.as_millis()
            ))),
        };

        match &res {
            Ok(price) => tracing::debug!(group = %key, price, "price resolved"),
            Err(e) => tracing::warn!(group = %key, "price unavailable: {e}"),
        }

        (key, res)
    });

    join_all(fetches).await.into_iter().collect()
}

//! Waiting for a transaction to reach a confirmation depth.
//!
//! Each tick reads the chain tip and the transaction's inclusion block. A
//! transaction not yet in a block is polled again after the interval; a
//! failed node call ends the wait with that error. The wait is bounded by
//! [`PollPolicy::max_ticks`] and [`PollPolicy::timeout`]; dropping the future
//! cancels it, and no timer outlives it.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use node_rpc::{NodeApi, RawTransaction, RpcClient};
use tokio::time::{sleep, timeout, Instant};

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::WalletError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub required_confirmations: u64,
    pub interval: Duration,
    /// Give up after this many ticks.
    pub max_ticks: Option<u32>,
    /// Give up after this much wall time, including time spent in node calls.
    pub timeout: Option<Duration>,
}

impl PollPolicy {
    pub fn new(required_confirmations: u64) -> Self {
        Self {
            required_confirmations,
            interval: DEFAULT_POLL_INTERVAL,
            max_ticks: None,
            timeout: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: u32) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Terminal value of a successful wait.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationResult {
    pub txid: String,
    pub confirmations: u64,
    pub transaction: RawTransaction,
}

/// What one tick observed.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Not in a block yet.
    Unconfirmed,
    /// Included, but shallower than required.
    Shallow { confirmations: u64 },
    Satisfied(ConfirmationResult),
}

/// Depth of a transaction included at `inclusion_height` when the tip is at
/// `tip_height`. Zero if the tip is behind the inclusion block.
pub fn confirmations(tip_height: u64, inclusion_height: u64) -> u64 {
    if tip_height < inclusion_height {
        return 0;
    }
    tip_height - inclusion_height + 1
}

/// Classify a transaction given the tip height and its inclusion height.
pub fn evaluate(
    transaction: RawTransaction,
    tip_height: u64,
    inclusion_height: Option<u64>,
    required_confirmations: u64,
) -> TickOutcome {
    let Some(inclusion_height) = inclusion_height else {
        return TickOutcome::Unconfirmed;
    };
    let depth = confirmations(tip_height, inclusion_height);
    if depth >= required_confirmations {
        TickOutcome::Satisfied(ConfirmationResult {
            txid: transaction.txid.clone(),
            confirmations: depth,
            transaction,
        })
    } else {
        TickOutcome::Shallow {
            confirmations: depth,
        }
    }
}

/// Run a single poll against the node.
pub async fn poll_once<C>(
    client: &C,
    txid: &str,
    required_confirmations: u64,
) -> Result<TickOutcome, WalletError>
where
    C: RpcClient + ?Sized,
{
    let tip_hash = client.get_best_block_hash().await?;
    let tip_height = client.get_block(&tip_hash).await?.height;

    let transaction = client.get_raw_transaction(txid).await?;
    let inclusion_height = match transaction.blockhash.as_deref() {
        Some(hash) => Some(client.get_block(hash).await?.height),
        None => None,
    };

    Ok(evaluate(
        transaction,
        tip_height,
        inclusion_height,
        required_confirmations,
    ))
}

/// Poll until `txid` has `policy.required_confirmations` confirmations.
pub async fn wait_for_confirmation<C>(
    client: &C,
    txid: &str,
    policy: PollPolicy,
) -> Result<ConfirmationResult, WalletError>
where
    C: RpcClient + ?Sized,
{
    let started = Instant::now();
    let ticks = AtomicU32::new(0);
    let polling = poll_until_satisfied(client, txid, policy, &ticks, started);

    match policy.timeout {
        Some(limit) => match timeout(limit, polling).await {
            Ok(result) => result,
            Err(_) => Err(timed_out(txid, &ticks, started)),
        },
        None => polling.await,
    }
}

async fn poll_until_satisfied<C>(
    client: &C,
    txid: &str,
    policy: PollPolicy,
    ticks: &AtomicU32,
    started: Instant,
) -> Result<ConfirmationResult, WalletError>
where
    C: RpcClient + ?Sized,
{
    loop {
        let tick = ticks.fetch_add(1, Ordering::Relaxed) + 1;

        match poll_once(client, txid, policy.required_confirmations).await? {
            TickOutcome::Satisfied(result) => {
                log::info!(
                    "transaction {txid} confirmed ({} confirmations)",
                    result.confirmations
                );
                return Ok(result);
            }
            TickOutcome::Shallow { confirmations } => log::debug!(
                "transaction {txid}: {confirmations}/{} confirmations",
                policy.required_confirmations
            ),
            TickOutcome::Unconfirmed => log::debug!("transaction {txid} not yet in a block"),
        }

        if policy.max_ticks.is_some_and(|max| tick >= max) {
            return Err(timed_out(txid, ticks, started));
        }

        sleep(policy.interval).await;
    }
}

fn timed_out(txid: &str, ticks: &AtomicU32, started: Instant) -> WalletError {
    let ticks = ticks.load(Ordering::Relaxed);
    log::warn!("gave up waiting for {txid} after {ticks} polls");
    WalletError::Timeout {
        txid: txid.to_string(),
        ticks,
        elapsed: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;

    fn tx(blockhash: Option<&str>) -> RawTransaction {
        RawTransaction {
            txid: "feed".into(),
            hex: String::new(),
            blockhash: blockhash.map(str::to_string),
            confirmations: None,
            time: None,
            blocktime: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn confirmation_arithmetic() {
        assert_eq!(confirmations(100, 100), 1);
        assert_eq!(confirmations(105, 100), 6);
        assert_eq!(confirmations(99, 100), 0);
    }

    #[test]
    fn never_satisfied_below_target() {
        for tip in 100..110 {
            let outcome = evaluate(tx(Some("b")), tip, Some(100), 6);
            let depth = tip - 100 + 1;
            match outcome {
                TickOutcome::Satisfied(result) => {
                    assert!(depth >= 6);
                    assert_eq!(result.confirmations, depth);
                }
                TickOutcome::Shallow { confirmations } => {
                    assert!(depth < 6);
                    assert_eq!(confirmations, depth);
                }
                TickOutcome::Unconfirmed => panic!("transaction was included"),
            }
        }
    }

    #[test]
    fn unincluded_transaction_keeps_polling() {
        assert_eq!(evaluate(tx(None), 500, None, 1), TickOutcome::Unconfirmed);
    }

    #[test]
    fn policy_builders() {
        let policy = PollPolicy::new(3)
            .with_interval(Duration::from_millis(10))
            .with_max_ticks(5)
            .with_timeout(Duration::from_secs(1));
        assert_eq!(policy.required_confirmations, 3);
        assert_eq!(policy.max_ticks, Some(5));
        assert_eq!(policy.timeout, Some(Duration::from_secs(1)));
        assert_eq!(PollPolicy::default().interval, DEFAULT_POLL_INTERVAL);
    }
}

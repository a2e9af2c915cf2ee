use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use futures::future::join_all;
use rayon::prelude::*;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, ScanError};
use crate::expiration::days_to_expiration;
use crate::generator::{generate_option_symbols, CandidateSymbols, PriceBand};
use crate::models::{OptionPair, PairFailure, ScanContext, ScanReport, SpreadEvaluation};
use crate::provider::{MarketData, QuoteSource};
use crate::symbol::{self, OptionIdentifier, OptionType};
use crate::valuator;

/// Progress of a scan, reported in debug logs. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Matching,
    Dispatched,
    Collecting,
    Done,
}

/// Progress of one pair's unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    Pending,
    Fetching,
    Evaluated,
    Failed,
}

impl fmt::Display for PairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PairState::Pending => "pending",
            PairState::Fetching => "fetching",
            PairState::Evaluated => "evaluated",
            PairState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a pair's task reports back to the collector
enum PairOutcome {
    Evaluated(SpreadEvaluation),
    /// Quote problem confined to this pair
    Failed(PairFailure),
    /// Anything else aborts the scan
    Fatal(ScanError),
}

/// Scans one underlying for conversion/reversal mispricings
pub struct SpreadScanner<M, Q> {
    market_data: Arc<M>,
    quotes: Arc<Q>,
    config: Config,
}

impl<M, Q> SpreadScanner<M, Q>
where
    M: MarketData + 'static,
    Q: QuoteSource + 'static,
{
    /// Creates a new scanner over the given collaborators
    pub fn new(market_data: M, quotes: Q, config: Config) -> Self {
        Self {
            market_data: Arc::new(market_data),
            quotes: Arc::new(quotes),
            config,
        }
    }

    /// Runs a single scan of the configured underlying as of today
    pub async fn scan(&self) -> Result<ScanReport> {
        self.scan_on(Local::now().date_naive()).await
    }

    /// Runs a single scan, counting days to expiration from `today`.
    ///
    /// Setup failures (expiration, spot, chain, symbol errors) abort the scan.
    /// Quote failures only drop the affected pair and are listed in the report;
    /// any other error from the quote source aborts the scan.
    pub async fn scan_on(&self, today: NaiveDate) -> Result<ScanReport> {
        let underlying = self.config.underlying.as_str();
        debug!(underlying, phase = ?ScanPhase::Matching, "Scan starting");

        let expirations = self.market_data.expirations(underlying).await?;
        let expiration = self
            .config
            .expiration
            .select(&expirations, today)
            .ok_or_else(|| ScanError::NoExpiration {
                underlying: underlying.to_string(),
                reason: format!(
                    "{:?} matched none of {} listed expirations",
                    self.config.expiration,
                    expirations.len()
                ),
            })?;

        let price = self.quotes.latest_trade(underlying).await?;
        let band = PriceBand::around(price, self.config.band_width)?;
        let chain = self.market_data.option_chain(underlying, expiration).await?;
        let candidates = generate_option_symbols(underlying, expiration, band, &chain)?;
        let pairs = match_pairs(&candidates)?;

        let context = ScanContext {
            price,
            risk_free_rate: self.config.risk_free_rate,
            days_to_expiration: days_to_expiration(expiration, today),
        };
        info!(
            underlying,
            %expiration,
            price,
            days = context.days_to_expiration,
            pairs = pairs.len(),
            "Matched call/put pairs"
        );

        let total = pairs.len();
        let (tx, mut rx) = mpsc::channel::<PairOutcome>(total.max(1));
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_requests));
        let mut handles = Vec::with_capacity(total);

        for pair in pairs {
            let quotes = Arc::clone(&self.quotes);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            let symbols = (pair.call.token(), pair.put.token());
            debug!(call = %pair.call, state = %PairState::Pending, "Pair queued");

            handles.push((symbols, tokio::spawn(async move {
                // Semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = evaluate_pair(quotes.as_ref(), &pair, &context).await;
                // Receiver outlives every task
                let _ = tx.send(outcome).await;
            })));
        }
        drop(tx);
        debug!(underlying, phase = ?ScanPhase::Dispatched, tasks = total, "Pairs dispatched");

        debug!(underlying, phase = ?ScanPhase::Collecting, "Collecting outcomes");
        let mut evaluations = Vec::with_capacity(total);
        let mut failures = Vec::new();
        while let Some(outcome) = rx.recv().await {
            match outcome {
                PairOutcome::Evaluated(evaluation) => evaluations.push(evaluation),
                PairOutcome::Failed(failure) => failures.push(failure),
                PairOutcome::Fatal(e) => {
                    for (_, task) in &handles {
                        task.abort();
                    }
                    return Err(e);
                }
            }
        }

        let (symbols, tasks): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        for ((call_symbol, put_symbol), joined) in symbols.into_iter().zip(join_all(tasks).await) {
            if let Err(e) = joined {
                warn!(call = %call_symbol, error = %e, "Pair task did not complete");
                failures.push(PairFailure {
                    call_symbol,
                    put_symbol,
                    reason: format!("task failed: {}", e),
                });
            }
        }

        rank(&mut evaluations);
        debug!(underlying, phase = ?ScanPhase::Done, "Scan finished");

        info!(
            underlying,
            evaluated = evaluations.len(),
            failed = failures.len(),
            "Scan completed"
        );

        Ok(ScanReport {
            underlying: underlying.to_string(),
            expiration,
            price,
            days_to_expiration: context.days_to_expiration,
            evaluations,
            failures,
        })
    }
}

/// Sorts ascending by profit; ties fall back to strike, then call symbol,
/// so completion order never shows through.
pub fn rank(evaluations: &mut [SpreadEvaluation]) {
    evaluations.sort_by(|a, b| {
        a.profit
            .total_cmp(&b.profit)
            .then_with(|| a.strike.total_cmp(&b.strike))
            .then_with(|| a.call_symbol.cmp(&b.call_symbol))
    });
}

/// Pairs every call with the put at the same strike.
///
/// Calls without a put in the candidate set are dropped.
pub fn match_pairs(candidates: &CandidateSymbols) -> Result<Vec<OptionPair>> {
    let calls: Vec<OptionIdentifier> = candidates
        .calls
        .par_iter()
        .map(|token| symbol::decode(token))
        .collect::<Result<_>>()?;

    let puts: HashSet<&str> = candidates.puts.iter().map(String::as_str).collect();

    let pairs = calls
        .into_par_iter()
        .filter_map(|call| {
            let put = call.with_type(OptionType::Put);
            if puts.contains(put.token().as_str()) {
                Some(OptionPair { call, put })
            } else {
                debug!(call = %call, "No put at this strike");
                None
            }
        })
        .collect();

    Ok(pairs)
}

/// Fetches both asks and values the pair
async fn evaluate_pair<Q: QuoteSource>(
    quotes: &Q,
    pair: &OptionPair,
    context: &ScanContext,
) -> PairOutcome {
    debug!(call = %pair.call, state = %PairState::Fetching, "Fetching quotes");

    let fetched = tokio::try_join!(quotes.latest_ask(&pair.call), quotes.latest_ask(&pair.put));

    match fetched {
        Ok((call_ask, put_ask)) => {
            let evaluation = valuator::evaluate(pair, call_ask, put_ask, context);
            debug!(
                call = %pair.call,
                state = %PairState::Evaluated,
                profit = evaluation.profit,
                "Pair evaluated"
            );
            PairOutcome::Evaluated(evaluation)
        }
        Err(e) if !e.is_pair_local() => {
            warn!(call = %pair.call, put = %pair.put, error = %e, "Aborting scan");
            PairOutcome::Fatal(e)
        }
        Err(e) => {
            warn!(call = %pair.call, put = %pair.put, state = %PairState::Failed, error = %e, "Skipping pair");
            PairOutcome::Failed(PairFailure {
                call_symbol: pair.call.token(),
                put_symbol: pair.put.token(),
                reason: e.to_string(),
            })
        }
    }
}

use serde::Serialize;
use slide_common::Slide;

use crate::config::InsertionConfig;
use crate::error::InsertError;
use crate::host::HostSession;
use crate::operation_log::{Operation, OperationLog};
use crate::probe::probe;
use crate::strategy::{
    default_strategies, InsertionContext, InsertionStrategy, StrategyOutcome, StrategySuccess,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyReport {
    pub method: &'static str,
    pub outcome: StrategyOutcome,
}

/// What happened during one successful insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionReport {
    pub host: String,
    /// Every configured strategy in priority order, including the ones never
    /// reached.
    pub strategies: Vec<StrategyReport>,
}

impl InsertionReport {
    pub fn winner(&self) -> Option<(&'static str, StrategySuccess)> {
        self.strategies.iter().find_map(|r| match r.outcome {
            StrategyOutcome::Succeeded(success) => Some((r.method, success)),
            _ => None,
        })
    }
}

/// Runs the strategy chain, stopping at the first success.
///
/// Not idempotent: every successful run appends to the document again.
pub struct InsertionOrchestrator {
    strategies: Vec<Box<dyn InsertionStrategy>>,
}

impl Default for InsertionOrchestrator {
    fn default() -> Self {
        Self::new(default_strategies())
    }
}

impl InsertionOrchestrator {
    pub fn new(strategies: Vec<Box<dyn InsertionStrategy>>) -> Self {
        Self { strategies }
    }

    pub async fn insert(
        &self,
        host: &dyn HostSession,
        log: &OperationLog,
        config: &InsertionConfig,
        deck: &[Slide],
    ) -> Result<InsertionReport, InsertError> {
        if deck.is_empty() {
            return Err(InsertError::EmptyDeck);
        }

        let capabilities = probe(host, log)?;
        let ctx = InsertionContext {
            host,
            log,
            capabilities: &capabilities,
            config,
        };

        let mut reports: Vec<StrategyReport> = self
            .strategies
            .iter()
            .map(|s| StrategyReport {
                method: s.name(),
                outcome: StrategyOutcome::NotAttempted,
            })
            .collect();

        for (position, strategy) in self.strategies.iter().enumerate() {
            let method = serde_json::json!({ "method": strategy.name() });
            log.ok(Operation::AttemptMethod, None, Some(method.clone()));

            match strategy.attempt(&ctx, deck).await {
                Ok(success) => {
                    log.ok(Operation::MethodSuccess, None, Some(method));
                    reports[position].outcome = StrategyOutcome::Succeeded(success);
                    tracing::info!(
                        "Inserted {} slides via {} ({} skipped)",
                        success.slides_written,
                        strategy.name(),
                        success.slides_failed
                    );
                    return Ok(InsertionReport {
                        host: capabilities.identity.name.clone(),
                        strategies: reports,
                    });
                }
                Err(e) => {
                    log.fail(Operation::MethodFailed, None, &e, Some(method));
                    reports[position].outcome = StrategyOutcome::Failed {
                        error: e.to_string(),
                    };
                }
            }
        }

        Err(InsertError::AllStrategiesExhausted { trail: log.trail() })
    }
}

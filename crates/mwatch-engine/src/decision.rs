//! Trigger evaluation and the gated bet action.
//!
//! For every novel sample:
//! 1. Log the sample.
//! 2. `value > threshold` → count the trigger (broadcast) and log it.
//! 3. If armed and the cooldown permits, read the balance and bet all of it.
//!
//! The trigger is counted and broadcast before any action is attempted, so
//! observers see it even when the action then fails.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mwatch_core::{parse_balance, Sample, SharedState};
use mwatch_persistence::LogSink;
use mwatch_telemetry::Metrics;
use tracing::{debug, info};

use crate::collaborator::Collaborator;
use crate::config::EngineConfig;
use crate::cooldown::CooldownGate;
use crate::error::EngineResult;

/// What happened after a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Auto-bet is not armed.
    Disabled,
    /// A previous bet is too recent.
    CoolingDown { remaining: Duration },
    /// Nothing to stake.
    ZeroBalance,
    /// Bet submitted with this stake.
    Placed { stake: String },
}

impl ActionOutcome {
    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::CoolingDown { .. } => "cooldown",
            Self::ZeroBalance => "zero_balance",
            Self::Placed { .. } => "placed",
        }
    }
}

/// Result of evaluating one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    BelowThreshold,
    Triggered {
        trigger_count: u64,
        action: ActionOutcome,
    },
}

/// Evaluates samples against the trigger threshold.
pub struct DecisionEngine {
    threshold: f64,
    currency: String,
    state: SharedState,
    log: Arc<LogSink>,
    cooldown: Arc<CooldownGate>,
}

impl DecisionEngine {
    pub fn new(
        config: &EngineConfig,
        state: SharedState,
        log: Arc<LogSink>,
        cooldown: Arc<CooldownGate>,
    ) -> Self {
        Self {
            threshold: config.trigger_threshold,
            currency: config.currency.clone(),
            state,
            log,
            cooldown,
        }
    }

    /// Whether a value counts as a trigger.
    #[inline]
    pub fn is_trigger(&self, value: f64) -> bool {
        value > self.threshold
    }

    /// Evaluate one novel sample.
    ///
    /// Errors are collaborator failures during the bet action and end the
    /// session.
    pub async fn on_sample(
        &self,
        sample: &Sample,
        collaborator: &dyn Collaborator,
        now: Instant,
    ) -> EngineResult<Decision> {
        Metrics::sample_observed(sample.parsed);
        self.log.append(format!("New result: {:.2}x", sample.value));

        if !self.is_trigger(sample.value) {
            return Ok(Decision::BelowThreshold);
        }

        let trigger_count = self.state.record_trigger();
        Metrics::triggered();
        info!(
            raw = %sample.raw,
            value = sample.value,
            threshold = self.threshold,
            trigger_count,
            "Trigger condition met"
        );
        self.log.append(format!(
            "[!!] CONDITION MET ({} times): Last result was {:.2}x!",
            trigger_count, sample.value
        ));

        let action = self.act(collaborator, now).await?;
        Metrics::action_outcome(action.as_str());

        Ok(Decision::Triggered {
            trigger_count,
            action,
        })
    }

    async fn act(
        &self,
        collaborator: &dyn Collaborator,
        now: Instant,
    ) -> EngineResult<ActionOutcome> {
        if !self.state.get().auto_action_enabled {
            self.log.append("[--] Auto-Bet is DISABLED. No action taken.");
            return Ok(ActionOutcome::Disabled);
        }

        if !self.cooldown.permitted(now) {
            let remaining = self.cooldown.remaining(now);
            self.log.append(format!(
                "[--] In cooldown ({}s left).",
                remaining.as_secs_f64().ceil() as u64
            ));
            return Ok(ActionOutcome::CoolingDown { remaining });
        }

        self.log.append("[$$] Placing bet...");
        let balance_text = collaborator.read_balance_text().await?;
        let balance = parse_balance(&balance_text);
        debug!(raw = %balance_text, stake = %balance.stake, "Balance read");

        if !balance.is_positive() {
            self.log.append("[!!] Balance is zero. Cannot bet.");
            return Ok(ActionOutcome::ZeroBalance);
        }

        collaborator.place_bet(&balance.stake).await?;
        self.cooldown.record(now);
        info!(stake = %balance.stake, currency = %self.currency, "Bet placed");
        self.log.append(format!(
            "[>>] AUTO-BET PLACED for {} {}!",
            balance.stake, self.currency
        ));

        Ok(ActionOutcome::Placed {
            stake: balance.stake,
        })
    }
}

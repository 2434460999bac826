//! Page-automation collaborator.
//!
//! The engine never touches the remote page itself. It reads and acts
//! through this trait, which allows for:
//! - an out-of-process automation driver in production
//! - a scripted mock in tests

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Failure talking to the page. Every variant is fatal for the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The page (or the driver in front of it) cannot be reached.
    #[error("page unreachable: {0}")]
    Unreachable(String),

    /// An expected element never appeared.
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// The driver answered but refused or failed the request.
    #[error("driver request failed: {0}")]
    Driver(String),
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

/// Capabilities the engine needs from the page.
pub trait Collaborator: Send + Sync {
    /// Bring the page into a state where sampling can start.
    fn prepare(&self) -> BoxFuture<'_, CollaboratorResult<()>> {
        Box::pin(async { Ok(()) })
    }

    /// Text of the most recent multiplier (e.g. `"1.52x"`).
    fn read_sample_text(&self) -> BoxFuture<'_, CollaboratorResult<String>>;

    /// Text of the account balance (e.g. `"1,000.00"`).
    fn read_balance_text(&self) -> BoxFuture<'_, CollaboratorResult<String>>;

    /// Enter `stake` and submit the bet.
    fn place_bet<'a>(&'a self, stake: &'a str) -> BoxFuture<'a, CollaboratorResult<()>>;
}

/// Arc wrapper for Collaborator trait objects.
pub type DynCollaborator = Arc<dyn Collaborator>;

/// Scripted collaborator for tests.
///
/// Samples are served from a queue; once it runs dry the last served text is
/// repeated, like a page that stopped updating.
#[derive(Debug)]
pub struct MockCollaborator {
    samples: parking_lot::Mutex<VecDeque<CollaboratorResult<String>>>,
    last_sample: parking_lot::Mutex<String>,
    balance: parking_lot::Mutex<CollaboratorResult<String>>,
    prepare_result: parking_lot::Mutex<CollaboratorResult<()>>,
    bet_result: parking_lot::Mutex<CollaboratorResult<()>>,
    bets: parking_lot::Mutex<Vec<String>>,
    sample_reads: AtomicUsize,
}

impl Default for MockCollaborator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCollaborator {
    pub fn new() -> Self {
        Self {
            samples: parking_lot::Mutex::new(VecDeque::new()),
            last_sample: parking_lot::Mutex::new(String::new()),
            balance: parking_lot::Mutex::new(Ok("0".to_string())),
            prepare_result: parking_lot::Mutex::new(Ok(())),
            bet_result: parking_lot::Mutex::new(Ok(())),
            bets: parking_lot::Mutex::new(Vec::new()),
            sample_reads: AtomicUsize::new(0),
        }
    }

    /// Mock serving the given samples in order.
    pub fn with_samples<I, S>(samples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        for s in samples {
            mock.push_sample(s);
        }
        mock
    }

    pub fn push_sample(&self, text: impl Into<String>) {
        self.samples.lock().push_back(Ok(text.into()));
    }

    /// Queue a failing sample read.
    pub fn push_failure(&self, error: CollaboratorError) {
        self.samples.lock().push_back(Err(error));
    }

    pub fn set_balance(&self, text: impl Into<String>) {
        *self.balance.lock() = Ok(text.into());
    }

    pub fn set_balance_error(&self, error: CollaboratorError) {
        *self.balance.lock() = Err(error);
    }

    pub fn set_prepare_result(&self, result: CollaboratorResult<()>) {
        *self.prepare_result.lock() = result;
    }

    pub fn set_bet_result(&self, result: CollaboratorResult<()>) {
        *self.bet_result.lock() = result;
    }

    /// Stakes of every bet placed so far.
    pub fn bets(&self) -> Vec<String> {
        self.bets.lock().clone()
    }

    /// Number of sample reads served.
    pub fn sample_reads(&self) -> usize {
        self.sample_reads.load(Ordering::SeqCst)
    }

    /// Whether every queued sample has been served.
    pub fn is_drained(&self) -> bool {
        self.samples.lock().is_empty()
    }
}

impl Collaborator for MockCollaborator {
    fn prepare(&self) -> BoxFuture<'_, CollaboratorResult<()>> {
        Box::pin(async move { self.prepare_result.lock().clone() })
    }

    fn read_sample_text(&self) -> BoxFuture<'_, CollaboratorResult<String>> {
        Box::pin(async move {
            let next = self.samples.lock().pop_front();
            let result = match next {
                Some(Ok(text)) => {
                    *self.last_sample.lock() = text.clone();
                    Ok(text)
                }
                Some(Err(e)) => Err(e),
                None => Ok(self.last_sample.lock().clone()),
            };
            self.sample_reads.fetch_add(1, Ordering::SeqCst);
            result
        })
    }

    fn read_balance_text(&self) -> BoxFuture<'_, CollaboratorResult<String>> {
        Box::pin(async move { self.balance.lock().clone() })
    }

    fn place_bet<'a>(&'a self, stake: &'a str) -> BoxFuture<'a, CollaboratorResult<()>> {
        Box::pin(async move {
            let result = self.bet_result.lock().clone();
            if result.is_ok() {
                self.bets.lock().push(stake.to_string());
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_repeats_last_sample_when_drained() {
        let mock = MockCollaborator::with_samples(["1.2x", "3.4x"]);
        assert_eq!(mock.read_sample_text().await.unwrap(), "1.2x");
        assert_eq!(mock.read_sample_text().await.unwrap(), "3.4x");
        assert!(mock.is_drained());
        assert_eq!(mock.read_sample_text().await.unwrap(), "3.4x");
        assert_eq!(mock.sample_reads(), 3);
    }

    #[tokio::test]
    async fn test_mock_records_bets() {
        let mock = MockCollaborator::new();
        mock.place_bet("100").await.unwrap();

        mock.set_bet_result(Err(CollaboratorError::Driver("button disabled".into())));
        assert!(mock.place_bet("200").await.is_err());

        assert_eq!(mock.bets(), vec!["100".to_string()]);
    }

    #[tokio::test]
    async fn test_default_prepare_is_noop() {
        struct Minimal;
        impl Collaborator for Minimal {
            fn read_sample_text(&self) -> BoxFuture<'_, CollaboratorResult<String>> {
                Box::pin(async { Ok(String::new()) })
            }
            fn read_balance_text(&self) -> BoxFuture<'_, CollaboratorResult<String>> {
                Box::pin(async { Ok(String::new()) })
            }
            fn place_bet<'a>(&'a self, _stake: &'a str) -> BoxFuture<'a, CollaboratorResult<()>> {
                Box::pin(async { Ok(()) })
            }
        }

        assert!(Minimal.prepare().await.is_ok());
    }
}

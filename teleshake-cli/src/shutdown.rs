//! Ctrl+C latch
//!
//! The handler is installed before the port is opened, so an interrupt at
//! any point of a run reaches the sequencer instead of killing the process
//! with the device still shaking.

use std::future;

use tokio::sync::watch;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Shutdown {
    requested: watch::Receiver<bool>,
}

impl Shutdown {
    /// Start listening for Ctrl+C
    pub async fn install() -> Self {
        let (tx, shutdown) = Self::latch();

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    let _ = tx.send(true);
                    // keep the latch set for every receiver
                    tx.closed().await;
                }
                Err(e) => warn!("Cannot listen for Ctrl+C: {}", e),
            }
        });
        // first poll of ctrl_c() registers the handler
        tokio::task::yield_now().await;

        shutdown
    }

    fn latch() -> (watch::Sender<bool>, Self) {
        let (tx, requested) = watch::channel(false);
        (tx, Self { requested })
    }

    pub fn is_requested(&self) -> bool {
        *self.requested.borrow()
    }

    /// Resolves once Ctrl+C was pressed; never resolves without a handler
    pub async fn requested(mut self) {
        if self.requested.wait_for(|&hit| hit).await.is_err() {
            future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tokio::time::timeout;

    #[tokio::test]
    async fn test_latch_stays_set() {
        let (tx, shutdown) = Shutdown::latch();
        assert!(!shutdown.is_requested());

        tx.send(true).unwrap();

        assert!(shutdown.is_requested());
        // a signal that fired before the sequence started still ends it
        timeout(Duration::from_secs(1), shutdown.clone().requested())
            .await
            .unwrap();
        timeout(Duration::from_secs(1), shutdown.requested()).await.unwrap();
    }

    #[tokio::test]
    async fn test_pending_until_signalled() {
        let (_tx, shutdown) = Shutdown::latch();
        assert!(
            timeout(Duration::from_millis(20), shutdown.requested())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_lost_handler_never_fires() {
        let (tx, shutdown) = Shutdown::latch();
        drop(tx);
        assert!(
            timeout(Duration::from_millis(20), shutdown.requested())
                .await
                .is_err()
        );
    }
}

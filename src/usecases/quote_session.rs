//! Quote Session - Debounced, Last-Write-Wins Quoting
//!
//! Form edits are pushed into a `watch` channel; a background task
//! waits for the quiet period, quotes the latest input and emits the
//! outcome on an `mpsc` channel. An edit that lands while a quote is
//! in flight cancels it, so a stale result is never emitted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use super::quote_orchestrator::{QuoteInput, QuoteOrchestrator};
use crate::domain::quote::QuoteOutcome;
use crate::domain::units::is_positive_amount;

/// Handle to a running quote session.
pub struct QuoteSession {
  edits: watch::Sender<Option<QuoteInput>>,
  task: JoinHandle<()>,
}

impl QuoteSession {
  /// Start a session; outcomes arrive on the returned receiver.
  pub fn spawn(
    orchestrator: Arc<QuoteOrchestrator>,
    debounce: Duration,
  ) -> (Self, mpsc::Receiver<QuoteOutcome>) {
    let (edits, edits_rx) = watch::channel(None);
    let (outcomes_tx, outcomes) = mpsc::channel(16);
    let task = tokio::spawn(run(orchestrator, debounce, edits_rx, outcomes_tx));
    (Self { edits, task }, outcomes)
  }

  /// Record a form edit; supersedes any pending or in-flight quote.
  pub fn edit(&self, input: QuoteInput) {
    self.edits.send_replace(Some(input));
  }

  /// Stop accepting edits and wait for the task to wind down.
  ///
  /// A pending or in-flight edit is still quoted; its outcome stays
  /// readable on the receiver until the channel ends.
  pub async fn close(self) {
    drop(self.edits);
    let _ = self.task.await;
  }
}

async fn run(
  orchestrator: Arc<QuoteOrchestrator>,
  debounce: Duration,
  mut edits: watch::Receiver<Option<QuoteInput>>,
  outcomes: mpsc::Sender<QuoteOutcome>,
) {
  'edits: loop {
    if edits.changed().await.is_err() {
      return;
    }

    'latest: loop {
      let latest = edits.borrow_and_update().clone();
      let Some(input) = latest else {
        continue 'edits;
      };

      // Cleared amount: reset right away, nothing to debounce.
      if !is_positive_amount(&input.amount_in, input.token_in.decimals) {
        if outcomes.send(QuoteOutcome::Idle).await.is_err() {
          return;
        }
        continue 'edits;
      }

      tokio::select! {
        changed = edits.changed() => {
          if changed.is_ok() {
            continue 'latest;
          }
          // Closed while debouncing: the last edit is still quoted.
          let _ = outcomes.send(orchestrator.quote(&input).await).await;
          return;
        }
        () = sleep(debounce) => {}
      }

      let quote = orchestrator.quote(&input);
      tokio::pin!(quote);
      tokio::select! {
        outcome = &mut quote => {
          if outcomes.send(outcome).await.is_err() {
            return;
          }
          continue 'edits;
        }
        changed = edits.changed() => {
          if changed.is_err() {
            let _ = outcomes.send(quote.await).await;
            return;
          }
          debug!("Quote superseded by a newer edit");
          continue 'latest;
        }
      }
    }
  }
}

//! Refresh scheduler
//!
//! Each view context runs in its own task: refresh, publish, sleep, repeat.
//! The delay is measured from the end of a cycle, so cycles of one context
//! never overlap. A failed cycle is reported and the timer re-arms anyway;
//! only a terminal failure (unknown account) ends the loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::FetchError;
use crate::policy::{self, Disposition, ErrorReporter};

/// One fetch + aggregate pass for a view
#[async_trait]
pub trait RefreshContext: Send + 'static {
    type View: Send + 'static;

    /// Used in log lines and error reports
    fn name(&self) -> &str;

    async fn refresh(&mut self) -> Result<Self::View, FetchError>;
}

#[derive(Debug)]
pub enum RefreshEvent<V> {
    /// A cycle succeeded; replaces whatever was shown before
    Updated(V),
    /// The resource does not exist. The context has stopped refreshing.
    NotFound { context: String, message: String },
}

#[derive(Clone)]
pub struct Scheduler {
    interval: Duration,
    reporter: Arc<dyn ErrorReporter>,
}

impl Scheduler {
    pub fn new(interval: Duration, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self { interval, reporter }
    }

    /// Start refreshing `context` immediately. Events arrive on the returned
    /// receiver until the handle is stopped or dropped.
    pub fn spawn<C: RefreshContext>(
        &self,
        context: C,
    ) -> (RefreshHandle, mpsc::UnboundedReceiver<RefreshEvent<C::View>>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        let name = context.name().to_string();

        let task = tokio::spawn(run(
            context,
            self.interval,
            self.reporter.clone(),
            events_tx,
            stop_rx,
        ));

        (
            RefreshHandle {
                name,
                stop: stop_tx,
                task,
            },
            events_rx,
        )
    }
}

/// Owner of a running refresh task. Dropping it cancels the task too.
#[derive(Debug)]
pub struct RefreshHandle {
    name: String,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Cancel the pending timer (or in-flight fetch) and wait for the task
    /// to exit. No fetch is issued after this returns.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(context = %self.name, "refresh task panicked: {}", e);
        }
    }
}

async fn run<C: RefreshContext>(
    mut context: C,
    interval: Duration,
    reporter: Arc<dyn ErrorReporter>,
    events: mpsc::UnboundedSender<RefreshEvent<C::View>>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let outcome = tokio::select! {
            biased;
            _ = stop.changed() => break,
            outcome = context.refresh() => outcome,
        };

        match outcome {
            Ok(view) => {
                tracing::debug!(context = context.name(), "refresh ok");
                if events.send(RefreshEvent::Updated(view)).is_err() {
                    break;
                }
            }
            Err(error) => match policy::classify(&error) {
                Disposition::Terminal => {
                    tracing::info!(context = context.name(), "{}", error);
                    let _ = events.send(RefreshEvent::NotFound {
                        context: context.name().to_string(),
                        message: error.to_string(),
                    });
                    break;
                }
                Disposition::Retry => reporter.report(context.name(), &error),
            },
        }

        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::debug!(context = context.name(), "refresh stopped");
}

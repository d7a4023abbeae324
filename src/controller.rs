//! Selection controller: selected label -> load -> bind.
//!
//! Loads are asynchronous; binding happens on the caller's side once a load
//! completes (`deliver`). Loads are never cancelled. If several are in flight,
//! each completed one is bound in completion order, so the last to finish is
//! what stays on screen.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::chart::{ChartBinder, Surface};
use crate::domain::{TimestampEncoding, resource_name};
use crate::error::AppError;
use crate::io::ingest::{SeriesStats, compute_stats, transform};
use crate::load::{Loader, ResourceSource};

/// A finished retrieval, ready to be bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub label: String,
    pub resource: String,
    /// `None` when the retrieval did not succeed.
    pub text: Option<String>,
}

/// What a load-and-bind cycle did to the chart.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A new chart replaced the previous one.
    Bound {
        resource: String,
        points: usize,
        /// `None` for an empty series.
        stats: Option<SeriesStats>,
    },
    /// Nothing was delivered; the previous chart is unchanged.
    NotDelivered { resource: String },
}

pub struct SelectionController<S, F: Surface> {
    loader: Arc<Loader<S>>,
    binder: ChartBinder<F>,
    encoding: TimestampEncoding,
    started: bool,
}

impl<S, F> SelectionController<S, F>
where
    S: ResourceSource + 'static,
    F: Surface,
{
    pub fn new(loader: Loader<S>, binder: ChartBinder<F>, encoding: TimestampEncoding) -> Self {
        Self {
            loader: Arc::new(loader),
            binder,
            encoding,
            started: false,
        }
    }

    /// Select the default label once; later calls return `Ok(None)`.
    pub async fn start(&mut self, default_label: &str) -> Result<Option<Outcome>, AppError> {
        if !self.mark_started() {
            return Ok(None);
        }
        self.select(default_label).await.map(Some)
    }

    /// Flip the started flag; `true` only on the first call.
    pub fn mark_started(&mut self) -> bool {
        !std::mem::replace(&mut self.started, true)
    }

    /// Run a full cycle for `label` and wait for it.
    pub async fn select(&mut self, label: &str) -> Result<Outcome, AppError> {
        let delivery = fetch_delivery(&self.loader, label).await;
        self.deliver(delivery)
    }

    /// Start a load for `label` in the background; the result is sent to `tx`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_select(&self, label: &str, tx: UnboundedSender<Delivery>) -> JoinHandle<()> {
        let loader = Arc::clone(&self.loader);
        let label = label.to_string();
        tokio::spawn(async move {
            let delivery = fetch_delivery(&loader, &label).await;
            // The receiver is gone only when the UI is shutting down.
            let _ = tx.send(delivery);
        })
    }

    /// Bind a completed retrieval.
    ///
    /// Malformed CSV is rejected with an error and the chart is left as is.
    pub fn deliver(&mut self, delivery: Delivery) -> Result<Outcome, AppError> {
        let Delivery { resource, text, .. } = delivery;
        let Some(text) = text else {
            return Ok(Outcome::NotDelivered { resource });
        };

        let points = transform(&text, self.encoding).map_err(|e| {
            tracing::warn!(resource = %resource, error = %e, "rejected malformed metric data");
            AppError::new(2, format!("{resource}: {e}"))
        })?;

        self.binder.bind(&points)?;
        Ok(Outcome::Bound {
            resource,
            points: points.len(),
            stats: compute_stats(&points),
        })
    }

    pub fn loader(&self) -> &Loader<S> {
        &self.loader
    }

    pub fn binder(&self) -> &ChartBinder<F> {
        &self.binder
    }

    pub fn binder_mut(&mut self) -> &mut ChartBinder<F> {
        &mut self.binder
    }

    pub fn into_binder(self) -> ChartBinder<F> {
        self.binder
    }
}

async fn fetch_delivery<S: ResourceSource>(loader: &Loader<S>, label: &str) -> Delivery {
    let resource = resource_name(label);
    tracing::info!(label, resource = %resource, "metric selected");
    let text = loader.load(&resource).await;
    Delivery {
        label: label.to_string(),
        resource,
        text,
    }
}

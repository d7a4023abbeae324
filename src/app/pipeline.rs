//! Shared "load and bind" logic used by the headless front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! source -> loader -> selection controller -> chart binder -> surface
//!
//! The caller only picks the surface and prints the result.

use crate::chart::{ChartBinder, Surface};
use crate::controller::{Outcome, SelectionController};
use crate::domain::{ChartConfig, TimestampEncoding};
use crate::error::AppError;
use crate::load::{Loader, ResourceSource};

/// All outputs of a single `vibe render` run.
#[derive(Debug)]
pub struct RenderOutput<I> {
    pub label: String,
    pub outcome: Outcome,
    /// The chart left on the surface, if one was bound.
    pub chart: Option<I>,
}

/// Select `label` once and bind it to `surface`.
pub async fn render_metric<S, F>(
    source: S,
    surface: F,
    config: ChartConfig,
    encoding: TimestampEncoding,
    label: &str,
) -> Result<RenderOutput<F::Instance>, AppError>
where
    S: ResourceSource + 'static,
    F: Surface,
{
    let mut controller = SelectionController::new(Loader::new(source), ChartBinder::new(surface, config), encoding);

    let outcome = controller
        .start(label)
        .await?
        .ok_or_else(|| AppError::new(4, "Initial selection already consumed."))?;

    Ok(RenderOutput {
        label: label.to_string(),
        outcome,
        chart: controller.into_binder().into_current(),
    })
}

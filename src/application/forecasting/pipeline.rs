//! The forecast pipeline: series builder -> trainer/validator -> projector
//! -> chart. Strictly sequential per request; the two targets run side by
//! side with no shared features.

use super::projection::{ProjectedStep, Projection, round_to_cents};
use super::series_builder::SeriesBuilder;
use crate::application::ml::trainer::{ModelTrainer, TrainingOutcome};
use crate::config::{ChartOutputMode, ForecastConfig};
use crate::domain::errors::ForecastError;
use crate::domain::forecasting::{
    ChartArtifact, FeatureSet, ForecastResult, ForecastRow, HistoryBatch, RegularSeries, Target,
    TargetReport,
};
use crate::domain::ports::{ChartPanel, ChartRenderer};
use crate::infrastructure::rendering::store_chart;
use rayon::prelude::*;
use std::num::NonZeroU32;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Checks a caller-supplied horizon against `1..=max_horizon` and converts
/// it to a period count.
pub fn validate_period(period: i64, max_horizon: u32) -> Result<NonZeroU32, ForecastError> {
    u32::try_from(period)
        .ok()
        .filter(|p| *p <= max_horizon)
        .and_then(NonZeroU32::new)
        .ok_or(ForecastError::InvalidPeriod { period })
}

/// Per-request state.
///
/// Created for one forecast, owns every model fitted for it, and is consumed
/// when the result is produced. Nothing here outlives the request.
pub struct ForecastContext {
    pub request_id: Uuid,
    pub produto: String,
    pub horizon: NonZeroU32,
    forecasts: Vec<TargetForecast>,
}

impl ForecastContext {
    pub fn new(produto: impl Into<String>, horizon: NonZeroU32) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            produto: produto.into(),
            horizon,
            forecasts: Vec::new(),
        }
    }
}

/// Trained model and projection for one target
struct TargetForecast {
    target: Target,
    training: TrainingOutcome,
    steps: Vec<ProjectedStep>,
}

pub struct ForecastPipeline<'a> {
    config: &'a ForecastConfig,
    renderer: &'a dyn ChartRenderer,
}

impl<'a> ForecastPipeline<'a> {
    pub fn new(config: &'a ForecastConfig, renderer: &'a dyn ChartRenderer) -> Self {
        Self { config, renderer }
    }

    /// Runs the whole pipeline for one request. Either the full result
    /// (table, error metrics, chart) comes back, or an error does.
    pub fn run(
        &self,
        mut ctx: ForecastContext,
        batch: &HistoryBatch,
    ) -> Result<ForecastResult, ForecastError> {
        info!(
            "Forecasting {} ({} rows, {} {} ahead, {:?})",
            ctx.produto,
            batch.rows.len(),
            ctx.horizon,
            self.config.granularity.unit(),
            self.config.targets
        );

        let builder = SeriesBuilder::new(self.config.granularity, self.config.targets);
        let series = builder.build(&ctx.produto, batch)?;
        let sets = builder.feature_sets(&series)?;
        debug!(
            "Built {} periods ending {:?}",
            series.len(),
            series.last_label()
        );

        // The last forecast date must exist before any model is fitted
        let horizon = ctx.horizon.get();
        if let Some(last) = series.last_label()
            && self.config.granularity.advance(last, horizon).is_err()
        {
            warn!(
                "Horizon of {} {} runs past the calendar from {}",
                horizon,
                self.config.granularity.unit(),
                last
            );
            return Err(ForecastError::InvalidPeriod {
                period: i64::from(horizon),
            });
        }

        let trainer = ModelTrainer::from_config(self.config);
        ctx.forecasts = sets
            .par_iter()
            .map(|set| Self::forecast_target(&trainer, set, horizon))
            .collect::<Result<Vec<_>, ForecastError>>()?;

        let rows = Self::assemble_rows(&ctx)?;
        let chart = self.render(&ctx, &series)?;

        let reports = ctx
            .forecasts
            .iter()
            .map(|f| TargetReport {
                target: f.target,
                mae: round_to_cents(f.training.mae),
                folds: f.training.folds(),
            })
            .collect::<Vec<_>>();

        for report in &reports {
            info!(
                "{} forecast for {}: MAE={:.2} over {} folds",
                report.target, ctx.produto, report.mae, report.folds
            );
        }

        Ok(ForecastResult {
            produto: ctx.produto,
            granularity: self.config.granularity,
            rows,
            reports,
            chart,
        })
    }

    fn forecast_target(
        trainer: &ModelTrainer,
        set: &FeatureSet,
        horizon: u32,
    ) -> Result<TargetForecast, ForecastError> {
        let training = trainer.train(set)?;
        let steps = Projection::from_feature_set(&training.model, set, horizon).run()?;

        Ok(TargetForecast {
            target: set.target,
            training,
            steps,
        })
    }

    fn assemble_rows(ctx: &ForecastContext) -> Result<Vec<ForecastRow>, ForecastError> {
        let steps_for = |target: Target| {
            ctx.forecasts
                .iter()
                .find(|f| f.target == target)
                .map(|f| f.steps.as_slice())
        };

        let price = steps_for(Target::Price)
            .ok_or_else(|| ForecastError::Model("price forecast missing".to_string()))?;
        let quantity = steps_for(Target::Quantity);

        Ok(price
            .iter()
            .enumerate()
            .map(|(i, step)| ForecastRow {
                date: step.date,
                price: step.value,
                quantity: quantity.and_then(|q| q.get(i)).map(|s| s.value),
            })
            .collect())
    }

    fn render(
        &self,
        ctx: &ForecastContext,
        series: &RegularSeries,
    ) -> Result<ChartArtifact, ForecastError> {
        let panels: Vec<ChartPanel> = ctx
            .forecasts
            .iter()
            .map(|f| ChartPanel {
                target: f.target,
                history: series.history(f.target),
                forecast: f.steps.iter().map(|s| (s.date, s.value)).collect(),
            })
            .collect();

        let png = self.renderer.render_png(&panels)?;

        match &self.config.chart_output {
            ChartOutputMode::InMemory => Ok(ChartArtifact::Png(png)),
            ChartOutputMode::File { directory } => Ok(ChartArtifact::File(store_chart(
                directory,
                &ctx.produto,
                ctx.request_id,
                &png,
            )?)),
        }
    }
}

/// Validates `period`, then runs a fresh pipeline over `batch`.
pub fn perform_forecast(
    config: &ForecastConfig,
    renderer: &dyn ChartRenderer,
    produto: &str,
    batch: &HistoryBatch,
    period: i64,
) -> Result<ForecastResult, ForecastError> {
    let horizon = validate_period(period, config.max_horizon)?;
    ForecastPipeline::new(config, renderer).run(ForecastContext::new(produto, horizon), batch)
}

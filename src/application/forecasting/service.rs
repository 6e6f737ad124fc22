use super::pipeline::{ForecastContext, ForecastPipeline, validate_period};
use crate::config::ForecastConfig;
use crate::domain::errors::ForecastError;
use crate::domain::forecasting::ForecastResult;
use crate::domain::ports::ChartRenderer;
use crate::domain::repositories::ProductHistoryRepository;
use std::sync::Arc;
use tracing::{Instrument, Span, error, info, info_span};

/// Entry point for callers: loads a product's history, runs the pipeline on
/// a blocking worker and bounds the whole request by the configured timeout.
///
/// Cloning is cheap; clones share the repository and renderer. Requests are
/// independent, so any number may run at once.
#[derive(Clone)]
pub struct ForecastService {
    repository: Arc<dyn ProductHistoryRepository>,
    renderer: Arc<dyn ChartRenderer>,
    config: Arc<ForecastConfig>,
}

impl ForecastService {
    pub fn new(
        repository: Arc<dyn ProductHistoryRepository>,
        renderer: Arc<dyn ChartRenderer>,
        config: ForecastConfig,
    ) -> Self {
        Self {
            repository,
            renderer,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Forecasts `period` future periods for `produto`.
    ///
    /// The period is checked before the history source is touched. Fitting
    /// and rendering run on the blocking pool; if they exceed
    /// `timeout_secs` the caller gets `Timeout` and the worker's result is
    /// discarded.
    pub async fn forecast(
        &self,
        produto: &str,
        period: i64,
    ) -> Result<ForecastResult, ForecastError> {
        let horizon = validate_period(period, self.config.max_horizon)?;
        let ctx = ForecastContext::new(produto, horizon);

        let span = info_span!(
            "forecast",
            produto = %produto,
            period,
            request_id = %ctx.request_id
        );

        self.run(ctx).instrument(span).await
    }

    async fn run(&self, ctx: ForecastContext) -> Result<ForecastResult, ForecastError> {
        let batch = self
            .repository
            .load_history(&ctx.produto)
            .await
            .map_err(ForecastError::Source)?;
        info!("Loaded {} stored rows", batch.rows.len());

        let config = Arc::clone(&self.config);
        let renderer = Arc::clone(&self.renderer);
        let span = Span::current();
        let worker = tokio::task::spawn_blocking(move || {
            span.in_scope(|| ForecastPipeline::new(&config, renderer.as_ref()).run(ctx, &batch))
        });

        let secs = self.config.timeout_secs;
        match tokio::time::timeout(self.config.timeout(), worker).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                error!("Forecast worker failed: {}", join_err);
                Err(ForecastError::Worker(join_err.to_string()))
            }
            Err(_) => {
                error!("Forecast exceeded {}s", secs);
                Err(ForecastError::Timeout { secs })
            }
        }
    }

    /// Distinct product keys known to the history source.
    pub async fn list_products(&self) -> Result<Vec<String>, ForecastError> {
        self.repository
            .list_products()
            .await
            .map_err(ForecastError::Source)
    }
}

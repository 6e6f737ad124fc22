//! Headless PNG rendering of history + forecast panels.
//!
//! Every call draws into its own RGB buffer and encodes it, so concurrent
//! requests never touch a shared surface or file path. No text is drawn,
//! which keeps the renderer free of system font dependencies.

use crate::domain::errors::ForecastError;
use crate::domain::ports::{ChartPanel, ChartRenderer};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use std::io::Cursor;

const HISTORY_COLOR: RGBColor = RGBColor(31, 119, 180);
const FORECAST_COLOR: RGBColor = RGBColor(255, 127, 14);
const DIVIDER_COLOR: RGBColor = RGBColor(200, 200, 200);
const PANEL_MARGIN: u32 = 24;
const DASH_SIZE: u32 = 8;
const DASH_SPACING: u32 = 6;

fn render_err<E: std::fmt::Display>(e: E) -> ForecastError {
    ForecastError::Render(e.to_string())
}

#[derive(Debug, Clone, Copy)]
pub struct PlottersChartRenderer {
    width: u32,
    height: u32,
}

impl PlottersChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn draw_panel(
        area: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
        panel: &ChartPanel,
    ) -> Result<(), ForecastError> {
        let n_hist = panel.history.len();
        let n_total = n_hist + panel.forecast.len();
        if n_hist == 0 {
            return Err(ForecastError::Render(format!(
                "no history to plot for {}",
                panel.target
            )));
        }

        let (y_min, y_max) = value_bounds(panel);
        let x_max = (n_total.max(2) - 1) as f64;

        let mut chart = ChartBuilder::on(area)
            .margin(PANEL_MARGIN)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)
            .map_err(render_err)?;

        let history: Vec<(f64, f64)> = panel
            .history
            .iter()
            .enumerate()
            .map(|(i, (_, v))| (i as f64, *v))
            .collect();

        chart
            .draw_series(LineSeries::new(history, HISTORY_COLOR.stroke_width(2)))
            .map_err(render_err)?;

        if !panel.forecast.is_empty() {
            let split_x = (n_hist - 1) as f64;
            let last_hist = panel.history[n_hist - 1].1;

            chart
                .draw_series(LineSeries::new(
                    vec![(split_x, y_min), (split_x, y_max)],
                    DIVIDER_COLOR.stroke_width(1),
                ))
                .map_err(render_err)?;

            // Dashed segment starts on the last observed point so the two
            // lines join on the shared axis.
            let forecast: Vec<(f64, f64)> = std::iter::once((split_x, last_hist))
                .chain(
                    panel
                        .forecast
                        .iter()
                        .enumerate()
                        .map(|(j, (_, v))| ((n_hist + j) as f64, *v)),
                )
                .collect();

            chart
                .draw_series(DashedLineSeries::new(
                    forecast,
                    DASH_SIZE,
                    DASH_SPACING,
                    FORECAST_COLOR.stroke_width(2),
                ))
                .map_err(render_err)?;
        }

        Ok(())
    }
}

impl ChartRenderer for PlottersChartRenderer {
    fn render_png(&self, panels: &[ChartPanel]) -> Result<Vec<u8>, ForecastError> {
        if panels.is_empty() {
            return Err(ForecastError::Render("no panels to render".to_string()));
        }

        let mut buffer = vec![0u8; buffer_len(self.width, self.height)?];
        {
            let root =
                BitMapBackend::with_buffer(&mut buffer, (self.width, self.height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_err)?;

            let areas = root.split_evenly((panels.len(), 1));
            for (area, panel) in areas.iter().zip(panels) {
                Self::draw_panel(area, panel)?;
            }

            root.present().map_err(render_err)?;
        }

        encode_png(buffer, self.width, self.height)
    }
}

/// Bytes needed for an RGB buffer of the given size.
fn buffer_len(width: u32, height: u32) -> Result<usize, ForecastError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| ForecastError::Render(format!("chart size {}x{} is too large", width, height)))
}

/// Y bounds over history and forecast, padded so flat lines stay visible.
fn value_bounds(panel: &ChartPanel) -> (f64, f64) {
    let (min, max) = panel
        .history
        .iter()
        .chain(&panel.forecast)
        .map(|(_, v)| *v)
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }

    let pad = if max > min {
        (max - min) * 0.05
    } else {
        min.abs().max(1.0) * 0.05
    };
    (min - pad, max + pad)
}

fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, ForecastError> {
    let image = RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| ForecastError::Render("pixel buffer size mismatch".to_string()))?;

    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).map_err(render_err)?;
    Ok(out.into_inner())
}

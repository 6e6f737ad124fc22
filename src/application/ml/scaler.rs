use statrs::statistics::Statistics;

/// Per-column standardisation to zero mean and unit variance.
///
/// Fit only on training rows; the same instance then transforms test rows and
/// projection rows. Columns with zero variance (a single year, say) keep a
/// scale of 1.0 so they pass through centred instead of dividing by zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let mut means = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);

        for col in 0..width {
            let column: Vec<f64> = rows.iter().map(|r| r[col]).collect();
            let mean = column.iter().mean();
            let std = column.iter().population_std_dev();

            means.push(mean);
            scales.push(if std.is_finite() && std > f64::EPSILON {
                std
            } else {
                1.0
            });
        }

        Self { means, scales }
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    pub fn width(&self) -> usize {
        self.means.len()
    }
}

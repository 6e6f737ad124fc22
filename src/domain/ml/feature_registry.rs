use crate::domain::forecasting::granularity::Granularity;
use chrono::NaiveDate;

/// Ordered feature names for monthly series.
/// The series builder and the projector both assemble rows through
/// [`feature_row`], so the order here is the order the model sees.
pub const MONTHLY_FEATURE_NAMES: &[&str] = &["year", "month", "lag_1", "lag_2"];

/// Ordered feature names for daily series.
pub const DAILY_FEATURE_NAMES: &[&str] = &["year", "month", "day_of_week", "lag_1", "lag_2"];

/// Number of lagged values each row carries
pub const LAG_DEPTH: usize = 2;

pub fn feature_names(granularity: Granularity) -> &'static [&'static str] {
    match granularity {
        Granularity::Monthly => MONTHLY_FEATURE_NAMES,
        Granularity::Daily => DAILY_FEATURE_NAMES,
    }
}

/// Calendar attributes of `label` followed by the two lagged target values.
pub fn feature_row(granularity: Granularity, label: NaiveDate, lag_1: f64, lag_2: f64) -> Vec<f64> {
    let mut row = granularity.calendar_features(label);
    row.push(lag_1);
    row.push(lag_2);
    row
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_length() {
        let label = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        for g in [Granularity::Monthly, Granularity::Daily] {
            let row = feature_row(g, label, 1.0, 2.0);
            assert_eq!(row.len(), feature_names(g).len());
        }
    }

    #[test]
    fn test_lags_follow_calendar() {
        let label = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let row = feature_row(Granularity::Monthly, label, 10.5, 9.25);
        assert_eq!(row, vec![2024.0, 6.0, 10.5, 9.25]);
    }
}

use chrono::NaiveDate;
use price_forecast::application::forecasting::perform_forecast;
use price_forecast::config::ForecastConfig;
use price_forecast::domain::errors::ForecastError;
use price_forecast::domain::forecasting::{
    ColumnPresence, Granularity, HistoryBatch, RawObservation, Target, TargetSelection,
};
use price_forecast::infrastructure::PlottersChartRenderer;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

fn config() -> ForecastConfig {
    ForecastConfig {
        n_trees: 30,
        chart_width: 320,
        chart_height: 240,
        ..ForecastConfig::default()
    }
}

fn renderer(cfg: &ForecastConfig) -> PlottersChartRenderer {
    PlottersChartRenderer::new(cfg.chart_width, cfg.chart_height)
}

fn row(data: &str, preco: &str, qty: i64) -> RawObservation {
    RawObservation {
        data: data.to_string(),
        preco: Some(preco.to_string()),
        quantidade_vendida: Some(qty),
    }
}

/// Two observations per month for `months` months starting January 2022
fn seasonal_history(months: u32) -> HistoryBatch {
    let mut rows = Vec::new();
    for i in 0..months {
        let (year, month) = (2022 + i / 12, i % 12 + 1);
        let base = 1_000 + (i % 6) * 37;
        rows.push(row(
            &format!("{}-{:02}-03 10:15:00", year, month),
            &format!("{}.{:03},{:02}", base / 1000, base % 1000, i % 100),
            40 + (i % 4) as i64,
        ));
        rows.push(row(
            &format!("{}-{:02}-21", year, month),
            &format!("R$ {}.{:03},50", base / 1000, base % 1000),
            25,
        ));
    }
    HistoryBatch::new(ColumnPresence::all(), rows)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_forecast_has_one_row_per_future_month() {
    let cfg = config();
    let result = perform_forecast(&cfg, &renderer(&cfg), "Kit", &seasonal_history(24), 5).unwrap();

    assert_eq!(result.rows.len(), 5);
    let dates: Vec<NaiveDate> = result.rows.iter().map(|r| r.date).collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 1, 31),
            date(2024, 2, 29),
            date(2024, 3, 31),
            date(2024, 4, 30),
            date(2024, 5, 31),
        ]
    );
    assert!(result.rows.iter().all(|r| r.quantity.is_some()));
}

#[test]
fn test_error_metrics_are_finite_and_rounded() {
    let cfg = config();
    let result = perform_forecast(&cfg, &renderer(&cfg), "Kit", &seasonal_history(30), 3).unwrap();

    for target in [Target::Price, Target::Quantity] {
        let mae = result.mae(target).unwrap();
        assert!(mae.is_finite());
        assert!(mae >= 0.0);
        assert!(((mae * 100.0).round() - mae * 100.0).abs() < 1e-6);
    }
    assert!(result.reports.iter().all(|r| r.folds == 5));
}

#[test]
fn test_chart_is_png_in_memory() {
    let cfg = config();
    let result = perform_forecast(&cfg, &renderer(&cfg), "Kit", &seasonal_history(18), 4).unwrap();
    let png = result.chart.png_bytes().unwrap();
    assert_eq!(&png[..8], &PNG_SIGNATURE);
}

#[test]
fn test_constant_history_forecasts_the_constant() {
    let rows = (1..=12)
        .map(|m| row(&format!("2023-{:02}-15", m), "19,90", 8))
        .collect();
    let batch = HistoryBatch::new(ColumnPresence::all(), rows);
    let cfg = config();

    let result = perform_forecast(&cfg, &renderer(&cfg), "Sabonete", &batch, 6).unwrap();
    assert!(result.rows.iter().all(|r| (r.price - 19.90).abs() < 1e-9));
    assert!(result.rows.iter().all(|r| r.quantity == Some(8.0)));
    assert_eq!(result.mae(Target::Price), Some(0.0));
}

#[test]
fn test_identical_inputs_give_identical_outputs() {
    let cfg = config();
    let batch = seasonal_history(26);
    let a = perform_forecast(&cfg, &renderer(&cfg), "Kit", &batch, 8).unwrap();
    let b = perform_forecast(&cfg, &renderer(&cfg), "Kit", &batch, 8).unwrap();

    assert_eq!(a.rows, b.rows);
    assert_eq!(a.reports, b.reports);
}

#[test]
fn test_missing_months_are_interpolated() {
    // March and April have no sales; the series still spans every month
    let rows = vec![
        row("2023-01-10", "10,00", 10),
        row("2023-02-10", "11,00", 11),
        row("2023-05-10", "14,00", 14),
        row("2023-06-10", "15,00", 15),
        row("2023-07-10", "16,00", 16),
        row("2023-08-10", "17,00", 17),
        row("2023-09-10", "18,00", 18),
    ];
    let batch = HistoryBatch::new(ColumnPresence::all(), rows);
    let cfg = config();

    let result = perform_forecast(&cfg, &renderer(&cfg), "Copo", &batch, 2).unwrap();
    assert_eq!(result.rows[0].date, date(2023, 10, 31));
}

#[test]
fn test_daily_granularity_steps_one_day() {
    let rows = (1..=20)
        .map(|d| row(&format!("2024-03-{:02}", d), &format!("{},00", 5 + d % 3), d))
        .collect();
    let batch = HistoryBatch::new(ColumnPresence::all(), rows);
    let cfg = ForecastConfig {
        granularity: Granularity::Daily,
        ..config()
    };

    let result = perform_forecast(&cfg, &renderer(&cfg), "Copo", &batch, 3).unwrap();
    let dates: Vec<NaiveDate> = result.rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![date(2024, 3, 21), date(2024, 3, 22), date(2024, 3, 23)]);
}

#[test]
fn test_unknown_product_is_no_data() {
    let cfg = config();
    let empty = HistoryBatch::new(ColumnPresence::all(), vec![]);
    let result = perform_forecast(&cfg, &renderer(&cfg), "Nada", &empty, 12);
    assert!(matches!(result, Err(ForecastError::NoData { produto }) if produto == "Nada"));
}

#[test]
fn test_non_positive_period_is_rejected() {
    let cfg = config();
    for period in [0, -1] {
        let result = perform_forecast(&cfg, &renderer(&cfg), "Kit", &seasonal_history(24), period);
        assert!(matches!(result, Err(ForecastError::InvalidPeriod { .. })));
    }
}

#[test]
fn test_oversized_period_returns_error() {
    let cfg = config();
    let result = perform_forecast(
        &cfg,
        &renderer(&cfg),
        "Kit",
        &seasonal_history(24),
        u32::MAX as i64,
    );
    assert!(matches!(result, Err(ForecastError::InvalidPeriod { .. })));

    let uncapped = ForecastConfig {
        max_horizon: u32::MAX,
        ..config()
    };
    let result = perform_forecast(
        &uncapped,
        &renderer(&uncapped),
        "Kit",
        &seasonal_history(24),
        u32::MAX as i64,
    );
    assert!(matches!(result, Err(ForecastError::InvalidPeriod { .. })));
}

#[test]
fn test_two_months_is_insufficient() {
    let batch = HistoryBatch::new(
        ColumnPresence::all(),
        vec![row("2024-01-05", "1,00", 1), row("2024-02-05", "1,10", 2)],
    );
    let cfg = config();
    let result = perform_forecast(&cfg, &renderer(&cfg), "Kit", &batch, 3);
    assert!(matches!(
        result,
        Err(ForecastError::InsufficientHistory { needed: 3, got: 2, .. })
    ));
}

#[test]
fn test_malformed_price_is_rejected() {
    let mut batch = seasonal_history(12);
    batch.rows[3].preco = Some("12.5".to_string());
    let cfg = config();
    let result = perform_forecast(&cfg, &renderer(&cfg), "Kit", &batch, 3);
    assert!(matches!(result, Err(ForecastError::MalformedPrice { raw }) if raw == "12.5"));
}

#[test]
fn test_quantity_column_required_only_when_requested() {
    let without_quantity = ColumnPresence {
        date: true,
        price: true,
        quantity: false,
    };
    let rows = seasonal_history(14)
        .rows
        .into_iter()
        .map(|r| RawObservation {
            quantidade_vendida: None,
            ..r
        })
        .collect();
    let batch = HistoryBatch::new(without_quantity, rows);

    let both = config();
    let result = perform_forecast(&both, &renderer(&both), "Kit", &batch, 2);
    assert!(matches!(
        result,
        Err(ForecastError::Schema { column }) if column == "quantidade_vendida"
    ));

    let price_only = ForecastConfig {
        targets: TargetSelection::Price,
        ..config()
    };
    let result = perform_forecast(&price_only, &renderer(&price_only), "Kit", &batch, 2).unwrap();
    assert_eq!(result.rows.len(), 2);
    assert!(result.rows.iter().all(|r| r.quantity.is_none()));
}

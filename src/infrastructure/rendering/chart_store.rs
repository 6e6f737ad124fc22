use crate::domain::errors::ForecastError;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Writes chart bytes under `directory` with a per-request file name.
///
/// The name carries the product and the request id, so two concurrent
/// requests for the same product never collide.
pub fn store_chart(
    directory: &Path,
    produto: &str,
    request_id: Uuid,
    png: &[u8],
) -> Result<PathBuf, ForecastError> {
    std::fs::create_dir_all(directory).map_err(|e| {
        ForecastError::Render(format!("failed to create chart directory {:?}: {}", directory, e))
    })?;

    let file_name = format!("forecast_{}_{}.png", file_slug(produto), request_id.simple());
    let path = directory.join(file_name);

    std::fs::write(&path, png)
        .map_err(|e| ForecastError::Render(format!("failed to write chart {:?}: {}", path, e)))?;

    info!("Chart written to {:?}", path);
    Ok(path)
}

/// Product keys are free text; keep file names to `[A-Za-z0-9_-]`.
fn file_slug(produto: &str) -> String {
    let slug: String = produto
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if slug.is_empty() { "produto".to_string() } else { slug }
}

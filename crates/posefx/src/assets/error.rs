use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid asset json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("vector asset has no drawable paths")]
    Empty,
    #[error("invalid fill color '{0}'")]
    InvalidColor(String),
    #[error("tessellation failed: {0}")]
    Tessellation(String),
    #[error("asset load failed: {0}")]
    LoadFailed(String),
}

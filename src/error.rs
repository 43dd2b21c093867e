use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum FxError {
    #[error("invalid color `{0}` (expected #RRGGBB or #RGB)")]
    InvalidColor(String),
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("dom error: {0}")]
    Dom(String),
}

impl From<JsValue> for FxError {
    fn from(value: JsValue) -> Self {
        FxError::Dom(format!("{:?}", value))
    }
}

pub type Result<T> = std::result::Result<T, FxError>;

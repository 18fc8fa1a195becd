// ====================================================================================
// src/error.rs - 自定义错误类型
// ====================================================================================
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Send rejected: {}", .0.as_deref().unwrap_or("unknown error"))]
    Rejected(Option<String>),
}

// 入站帧解析失败，只记录日志，不影响连接
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("frame has no recognizable `type` field")]
    MissingType,
    #[error("`data` of `{kind}` frame is not an object")]
    DataNotAnObject { kind: String },
    #[error("invalid `{kind}` payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

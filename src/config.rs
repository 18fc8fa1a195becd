// ====================================================================================
// src/config.rs - 配置管理
// ====================================================================================
use crate::error::AppError;
use reqwest::Url;
use std::str::FromStr;
use std::time::Duration;

// 常见浏览器 User-Agent，部分直播服务端会拒绝默认 UA
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_origin: Url,

    // 重连配置
    pub max_reconnect_attempts: u32,
    pub reconnect_delay: Duration,

    // HTTP 配置
    pub http_timeout: Duration,
    pub user_agent: String,

    // 终端显示
    pub show_timestamp: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_origin: Url::parse("http://127.0.0.1:8080").expect("static origin is valid"),
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_millis(3000),
            http_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            show_timestamp: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        // 尝试加载 .env 文件，如果失败则忽略（可能文件不存在）
        if let Err(e) = dotenvy::dotenv() {
            tracing::warn!("Failed to load .env file: {}", e);
        }

        let defaults = Self::default();
        let server_origin = match std::env::var("SERVER_ORIGIN") {
            Ok(raw) => Url::parse(&raw)
                .map_err(|e| AppError::Config(format!("SERVER_ORIGIN is not a valid URL: {}", e)))?,
            Err(_) => defaults.server_origin,
        };

        Ok(Self {
            server_origin,
            max_reconnect_attempts: env_or("MAX_RECONNECT_ATTEMPTS", defaults.max_reconnect_attempts)?,
            reconnect_delay: Duration::from_millis(env_or(
                "RECONNECT_DELAY_MS",
                defaults.reconnect_delay.as_millis() as u64,
            )?),
            http_timeout: Duration::from_secs(env_or(
                "HTTP_TIMEOUT_SECONDS",
                defaults.http_timeout.as_secs(),
            )?),
            user_agent: std::env::var("USER_AGENT").unwrap_or(defaults.user_agent),
            show_timestamp: env_or("SHOW_TIMESTAMP", defaults.show_timestamp)?,
        })
    }

    // 由页面 origin 推导流地址，https 页面升级为 wss
    pub fn stream_url(&self) -> Result<Url, AppError> {
        let scheme = if self.server_origin.scheme() == "https" { "wss" } else { "ws" };
        let host = self
            .server_origin
            .host_str()
            .ok_or_else(|| AppError::Config("SERVER_ORIGIN has no host".to_string()))?;
        let raw = match self.server_origin.port() {
            Some(port) => format!("{}://{}:{}/ws", scheme, host, port),
            None => format!("{}://{}/ws", scheme, host),
        };
        Url::parse(&raw).map_err(|e| AppError::Config(format!("invalid stream URL {}: {}", raw, e)))
    }

    pub fn api_url(&self, path: &str) -> Result<Url, AppError> {
        self.server_origin
            .join(path)
            .map_err(|e| AppError::Config(format!("invalid API path {}: {}", path, e)))
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a valid value, got {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}

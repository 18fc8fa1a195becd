// ====================================================================================
// src/api.rs - HTTP 接口: 发送弹幕与初始房间信息
// ====================================================================================
use crate::{
    config::Config,
    error::AppError,
    models::{FeedEntry, PartialRoomState, SendRequest, SendResponse},
    sink::FeedSink,
};
use reqwest::{Client, Url, header};
use std::future::Future;

/// 服务端 HTTP 接口。发送只返回成功与否，消息本身会从推送流回来。
pub trait RoomApi {
    fn send_message(&self, message: String) -> impl Future<Output = Result<(), AppError>> + Send;
    fn fetch_room_info(&self) -> impl Future<Output = Result<PartialRoomState, AppError>> + Send;
}

#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    send_url: Url,
    room_info_url: Url,
}

impl HttpApi {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
                headers
            })
            .build()?;

        Ok(Self {
            client,
            send_url: config.api_url("/api/send")?,
            room_info_url: config.api_url("/api/room_info")?,
        })
    }
}

impl RoomApi for HttpApi {
    async fn send_message(&self, message: String) -> Result<(), AppError> {
        let response: SendResponse = self
            .client
            .post(self.send_url.clone())
            .json(&SendRequest { message: &message })
            .send()
            .await?
            .json()
            .await?;

        if response.is_success() {
            tracing::info!("Sent danmu: {}", message);
            Ok(())
        } else {
            tracing::warn!("Server rejected danmu {:?}: {:?}", message, response.error);
            Err(AppError::Rejected(response.error))
        }
    }

    async fn fetch_room_info(&self) -> Result<PartialRoomState, AppError> {
        let snapshot = self
            .client
            .get(self.room_info_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(snapshot)
    }
}

// 一次发送的结果，回到驱动循环里处理
#[derive(Debug)]
pub struct SubmitOutcome {
    pub message: String,
    pub result: Result<(), AppError>,
}

/// 输入框。只在服务端确认成功后清空，失败时保留内容供重试；
/// 不在本地回显，消息以推送流为准。每次提交都各自发出请求。
#[derive(Debug, Default)]
pub struct Composer {
    draft: String,
    in_flight: usize,
}

impl Composer {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight > 0
    }

    /// 取出待发送的消息，空白输入返回 `None`。
    pub fn take_submission(&mut self) -> Option<String> {
        let message = self.draft.trim();
        if message.is_empty() {
            return None;
        }
        self.in_flight += 1;
        Some(message.to_string())
    }

    pub fn on_outcome(&mut self, outcome: SubmitOutcome, feed: &mut impl FeedSink) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome.result {
            Ok(()) => {
                // 用户可能在请求期间改了输入，只清掉已发送的那份
                if self.draft.trim() == outcome.message {
                    self.draft.clear();
                }
            }
            Err(AppError::Rejected(error)) => {
                let reason = error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| "unknown error".to_string());
                feed.append(FeedEntry::system(format!("send failed: {}", reason)));
            }
            Err(e) => {
                tracing::error!("Send request failed: {}", e);
                feed.append(FeedEntry::system("send failed, please retry"));
            }
        }
    }
}

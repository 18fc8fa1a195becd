// ====================================================================================
// src/models.rs - 数据模型定义
// ====================================================================================
use serde::{Deserialize, Serialize};
use serde_json::Value;

// 解码后的入站消息
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Danmu(DanmuPayload),
    RoomInfo(PartialRoomState),
    Gift(GiftPayload),
    SuperChat(SuperChatPayload),
    StatsUpdate(PartialRoomState),
    // 未识别的类型，保留原始 tag 以便诊断
    Unknown { kind: String, payload: Value },
}

impl Envelope {
    pub fn kind(&self) -> &str {
        match self {
            Envelope::Danmu(_) => "danmu",
            Envelope::RoomInfo(_) => "room_info",
            Envelope::Gift(_) => "gift",
            Envelope::SuperChat(_) => "super_chat",
            Envelope::StatsUpdate(_) => "stats_update",
            Envelope::Unknown { kind, .. } => kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DanmuPayload {
    pub user_name: Option<String>,
    pub user_level: Option<u32>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftPayload {
    pub user_name: Option<String>,
    pub gift_name: Option<String>,
    pub gift_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperChatPayload {
    pub user_name: Option<String>,
    pub price: Option<f64>,
    pub content: Option<String>,
}

// room_info / stats_update / 初始快照共用的部分更新
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRoomState {
    pub title: Option<String>,
    pub streamer_name: Option<String>,
    pub online_count: Option<u64>,
    pub popularity: Option<u64>,
    pub likes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomField {
    Title,
    StreamerName,
    OnlineCount,
    Popularity,
    Likes,
}

// 信息流条目，按到达顺序追加
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEntry {
    Danmu {
        user_name: String,
        user_level: Option<u32>,
        content: String,
    },
    Gift {
        user_name: String,
        gift_name: Option<String>,
        gift_count: Option<u64>,
    },
    SuperChat {
        user_name: String,
        price: Option<f64>,
        content: String,
    },
    System {
        message: String,
    },
}

impl FeedEntry {
    pub fn system(message: impl Into<String>) -> Self {
        FeedEntry::System { message: message.into() }
    }
}

// API请求/响应模型
#[derive(Debug, Serialize)]
pub struct SendRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SendResponse {
    pub status: Option<String>,
    pub error: Option<String>,
}

impl SendResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}

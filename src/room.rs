// ====================================================================================
// src/room.rs - 房间状态聚合
// ====================================================================================
use crate::{
    models::{PartialRoomState, RoomField},
    sink::PresentationSink,
};

// 当前房间快照，字段只能经由 RoomStateAggregator::merge 写入
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomState {
    title: Option<String>,
    streamer_name: Option<String>,
    online_count: Option<u64>,
    popularity: Option<u64>,
    likes: Option<u64>,
}

impl RoomState {
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn streamer_name(&self) -> Option<&str> {
        self.streamer_name.as_deref()
    }

    pub fn online_count(&self) -> Option<u64> {
        self.online_count
    }

    pub fn popularity(&self) -> Option<u64> {
        self.popularity
    }

    pub fn likes(&self) -> Option<u64> {
        self.likes
    }
}

#[derive(Debug, Default)]
pub struct RoomStateAggregator {
    state: RoomState,
}

impl RoomStateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    /// 逐字段合并：`update` 中存在的字段覆盖旧值，缺失的字段保持不变。
    /// 每个被写入的字段单独推送给展示目标。
    pub fn merge(&mut self, update: PartialRoomState, sink: &mut impl PresentationSink) {
        if let Some(title) = update.title {
            sink.set_field(RoomField::Title, title.clone());
            self.state.title = Some(title);
        }
        if let Some(name) = update.streamer_name {
            sink.set_field(RoomField::StreamerName, format!("Streamer: {}", name));
            self.state.streamer_name = Some(name);
        }
        if let Some(count) = update.online_count {
            self.state.online_count = Some(count);
            sink.set_field(RoomField::OnlineCount, format_number(count));
        }
        if let Some(popularity) = update.popularity {
            self.state.popularity = Some(popularity);
            sink.set_field(RoomField::Popularity, format_number(popularity));
        }
        if let Some(likes) = update.likes {
            self.state.likes = Some(likes);
            sink.set_field(RoomField::Likes, format_number(likes));
        }
    }
}

/// 千分位格式化，与区域设置无关: 1234567 -> "1,234,567"
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

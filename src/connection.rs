// ====================================================================================
// src/connection.rs - 连接生命周期状态机
// ====================================================================================
use crate::{models::FeedEntry, sink::FeedSink};
use std::time::Duration;
use uuid::Uuid;

pub const MSG_CONNECTED: &str = "connected";
pub const MSG_DISCONNECTED: &str = "disconnected";
pub const MSG_CONNECTION_ERROR: &str = "connection error";
pub const MSG_GAVE_UP: &str = "unable to reconnect";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    ReconnectWait,
    // 终态，只有手动重连才能离开
    Failed,
}

/// 有界线性重连策略。状态迁移与重连计数都在这里，实际的网络 I/O 与计时器由
/// `client` 驱动；每次 `begin_connect` 都对应一条全新的连接。
#[derive(Debug)]
pub struct ConnectionManager {
    state: ConnectionState,
    attempts: u32,
    max_attempts: u32,
    delay: Duration,
    conn_id: Option<Uuid>,
}

impl ConnectionManager {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            state: ConnectionState::Closed,
            attempts: 0,
            max_attempts,
            delay,
            conn_id: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn conn_id(&self) -> Option<Uuid> {
        self.conn_id
    }

    // 只有 Open 状态下的入站帧才交给解码器
    pub fn accepts_frames(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// 进入 Connecting 并分配新连接 id。已在连接中、已连接或已放弃时返回 `None`。
    pub fn begin_connect(&mut self) -> Option<Uuid> {
        match self.state {
            ConnectionState::Closed | ConnectionState::ReconnectWait => {
                let conn_id = Uuid::new_v4();
                self.state = ConnectionState::Connecting;
                self.conn_id = Some(conn_id);
                tracing::debug!("Connection {} connecting (attempt {}/{})", conn_id, self.attempts, self.max_attempts);
                Some(conn_id)
            }
            ConnectionState::Connecting | ConnectionState::Open | ConnectionState::Failed => {
                tracing::debug!("Ignoring connect request in state {:?}", self.state);
                None
            }
        }
    }

    pub fn on_open(&mut self, feed: &mut impl FeedSink) {
        if self.state != ConnectionState::Connecting {
            return;
        }
        self.state = ConnectionState::Open;
        self.attempts = 0;
        tracing::info!("Connection {:?} established", self.conn_id);
        feed.append(FeedEntry::system(MSG_CONNECTED));
    }

    // 传输错误之后总会跟着一次 on_close
    pub fn on_error(&mut self, feed: &mut impl FeedSink) {
        if !matches!(self.state, ConnectionState::Connecting | ConnectionState::Open) {
            return;
        }
        tracing::warn!("Connection {:?} hit a transport error", self.conn_id);
        feed.append(FeedEntry::system(MSG_CONNECTION_ERROR));
    }

    /// 处理连接关闭。还有重试次数时进入 ReconnectWait 并返回等待时长，
    /// 否则进入 Failed 并返回 `None`。
    pub fn on_close(&mut self, feed: &mut impl FeedSink) -> Option<Duration> {
        if !matches!(self.state, ConnectionState::Connecting | ConnectionState::Open) {
            return None;
        }
        self.state = ConnectionState::Closed;
        self.conn_id = None;
        feed.append(FeedEntry::system(MSG_DISCONNECTED));

        if self.attempts < self.max_attempts {
            self.attempts += 1;
            self.state = ConnectionState::ReconnectWait;
            let message = format!(
                "retrying in {}s ({}/{})",
                self.delay.as_secs_f64(),
                self.attempts,
                self.max_attempts
            );
            tracing::info!("{}", message);
            feed.append(FeedEntry::system(message));
            Some(self.delay)
        } else {
            self.state = ConnectionState::Failed;
            tracing::error!("Giving up after {} reconnect attempts", self.max_attempts);
            feed.append(FeedEntry::system(MSG_GAVE_UP));
            None
        }
    }

    // 手动重连（相当于刷新页面），清空计数并离开 Failed
    pub fn reset(&mut self) {
        if matches!(self.state, ConnectionState::Connecting | ConnectionState::Open) {
            return;
        }
        self.state = ConnectionState::Closed;
        self.attempts = 0;
    }
}

// ====================================================================================
// src/client.rs - 推送流客户端主循环
// ====================================================================================
use crate::{
    api::{Composer, RoomApi, SubmitOutcome},
    config::Config,
    connection::{ConnectionManager, ConnectionState},
    dispatch::Session,
    error::AppError,
    models::PartialRoomState,
    sink::{FeedSink, PresentationSink},
};
use futures_util::{StreamExt, stream::BoxStream};
use reqwest::Url;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// 一条连接上的入站文本帧；流结束即连接关闭。
pub type FrameStream = BoxStream<'static, Result<String, AppError>>;

pub trait Connector {
    fn connect(&mut self, url: &Url) -> impl Future<Output = Result<FrameStream, AppError>>;
}

pub struct WsConnector;

impl Connector for WsConnector {
    async fn connect(&mut self, url: &Url) -> Result<FrameStream, AppError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        let frames = ws_stream.filter_map(|msg| async move {
            match msg {
                Ok(Message::Text(text)) => Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => Some(Ok(text)),
                    Err(_) => {
                        tracing::warn!("Dropping non UTF-8 binary frame");
                        None
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Server closed the stream: {:?}", frame);
                    None
                }
                Ok(_) => None,
                Err(e) => Some(Err(AppError::from(e))),
            }
        });
        Ok(frames.boxed())
    }
}

// 用户侧命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(String),
    // 重新提交输入框里保留的内容
    Retry,
    Reconnect,
    Shutdown,
}

// 后台任务的结果，统一回到主循环里处理
#[derive(Debug)]
enum Reply {
    Submit(SubmitOutcome),
    Snapshot(Result<PartialRoomState, AppError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Reconnect,
    Shutdown,
}

pub struct LiveClient<F, P, A> {
    stream_url: Url,
    manager: ConnectionManager,
    session: Session<F, P>,
    composer: Composer,
    api: A,
    commands: mpsc::Receiver<Command>,
    commands_open: bool,
    reply_tx: mpsc::Sender<Reply>,
    reply_rx: mpsc::Receiver<Reply>,
}

impl<F, P, A> LiveClient<F, P, A>
where
    F: FeedSink,
    P: PresentationSink,
    A: RoomApi + Clone + Send + Sync + 'static,
{
    pub fn new(
        config: &Config,
        session: Session<F, P>,
        api: A,
        commands: mpsc::Receiver<Command>,
    ) -> Result<Self, AppError> {
        let (reply_tx, reply_rx) = mpsc::channel(16);
        Ok(Self {
            stream_url: config.stream_url()?,
            manager: ConnectionManager::new(config.max_reconnect_attempts, config.reconnect_delay),
            session,
            composer: Composer::default(),
            api,
            commands,
            commands_open: true,
            reply_tx,
            reply_rx,
        })
    }

    pub fn session(&self) -> &Session<F, P> {
        &self.session
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// 在后台拉取初始快照，同时进入连接循环，直到收到 `Shutdown`，
    /// 或者连接已放弃且命令通道已关闭。
    pub async fn run<C: Connector>(&mut self, connector: &mut C) {
        self.spawn_snapshot();

        loop {
            let Some(conn_id) = self.manager.begin_connect() else {
                // Failed: 只等待手动重连
                match self.wait(None).await {
                    Flow::Reconnect => {
                        tracing::info!("Manual reconnect requested");
                        self.manager.reset();
                        continue;
                    }
                    _ => return,
                }
            };

            tracing::info!("Connection {} connecting to {}", conn_id, self.stream_url);
            let flow = match connector.connect(&self.stream_url).await {
                Ok(stream) => {
                    self.manager.on_open(self.session.feed_mut());
                    self.pump(stream).await
                }
                Err(e) => {
                    tracing::warn!("Connection {} failed: {}", conn_id, e);
                    self.manager.on_error(self.session.feed_mut());
                    Flow::Continue
                }
            };
            if flow == Flow::Shutdown {
                tracing::info!("Shutting down connection {}", conn_id);
                return;
            }

            if let Some(delay) = self.manager.on_close(self.session.feed_mut()) {
                if self.wait(Some(delay)).await == Flow::Shutdown {
                    return;
                }
            }
        }
    }

    // 快照晚于推送到达时照常合并，和 room_info 一样按字段覆盖
    fn spawn_snapshot(&self) {
        let api = self.api.clone();
        let reply_tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_room_info().await;
            if reply_tx.send(Reply::Snapshot(result)).await.is_err() {
                tracing::debug!("Client loop gone before room info arrived");
            }
        });
    }

    fn on_reply(&mut self, reply: Reply) {
        match reply {
            Reply::Submit(outcome) => self.composer.on_outcome(outcome, self.session.feed_mut()),
            Reply::Snapshot(Ok(snapshot)) => self.session.apply_snapshot(snapshot),
            Reply::Snapshot(Err(e)) => tracing::error!("Failed to fetch room info: {}", e),
        }
    }

    // 连接存活期间：按到达顺序处理帧，同时处理命令与后台结果。
    // 连接关闭后流随之丢弃，旧连接的帧不会再进入解码
    async fn pump(&mut self, mut stream: FrameStream) -> Flow {
        debug_assert!(self.manager.accepts_frames());
        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(text)) => self.session.handle_frame(&text),
                    Some(Err(e)) => {
                        tracing::warn!("Stream error on {:?}: {}", self.manager.conn_id(), e);
                        self.manager.on_error(self.session.feed_mut());
                        return Flow::Continue;
                    }
                    None => return Flow::Continue,
                },
                Some(reply) = self.reply_rx.recv() => self.on_reply(reply),
                cmd = self.commands.recv(), if self.commands_open => match self.handle_command(cmd) {
                    Flow::Shutdown => return Flow::Shutdown,
                    Flow::Reconnect => tracing::debug!("Already connected, ignoring reconnect"),
                    Flow::Continue => {}
                },
            }
        }
    }

    // 重连等待（delay 为 Some）或放弃后的空闲（None）
    async fn wait(&mut self, delay: Option<Duration>) -> Flow {
        let timer = tokio::time::sleep(delay.unwrap_or(Duration::MAX));
        tokio::pin!(timer);

        loop {
            if delay.is_none() && !self.commands_open {
                return Flow::Shutdown;
            }
            tokio::select! {
                _ = &mut timer, if delay.is_some() => return Flow::Continue,
                Some(reply) = self.reply_rx.recv() => self.on_reply(reply),
                cmd = self.commands.recv(), if self.commands_open => match self.handle_command(cmd) {
                    Flow::Continue => {}
                    flow => return flow,
                },
            }
        }
    }

    fn handle_command(&mut self, cmd: Option<Command>) -> Flow {
        match cmd {
            Some(Command::Send(text)) => {
                self.composer.set_draft(text);
                self.submit();
                Flow::Continue
            }
            Some(Command::Retry) => {
                self.submit();
                Flow::Continue
            }
            Some(Command::Reconnect) => Flow::Reconnect,
            Some(Command::Shutdown) => Flow::Shutdown,
            None => {
                tracing::debug!("Command channel closed");
                self.commands_open = false;
                Flow::Continue
            }
        }
    }

    // 发送不阻塞主循环，结果经 reply 通道回来
    fn submit(&mut self) {
        let Some(message) = self.composer.take_submission() else {
            tracing::debug!("Nothing to send");
            return;
        };

        let api = self.api.clone();
        let reply_tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let result = api.send_message(message.clone()).await;
            if reply_tx.send(Reply::Submit(SubmitOutcome { message, result })).await.is_err() {
                tracing::debug!("Client loop gone before send outcome arrived");
            }
        });
    }
}

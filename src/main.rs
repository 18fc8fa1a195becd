// ====================================================================================
// src/main.rs - 应用入口
// ====================================================================================
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use live_danmu_client::{
    api::HttpApi,
    client::{Command, LiveClient, WsConnector},
    config::Config,
    dispatch::Session,
    sink::TerminalSink,
};

// 所有事件处理都在同一个单线程执行上下文里
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志记录，输出到 stderr 以免和信息流混在一起
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "live_danmu_client=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // 加载配置
    let config = Config::from_env()?;
    tracing::info!("Live room origin: {}", config.server_origin);

    let api = HttpApi::new(&config)?;
    let session = Session::new(
        TerminalSink::stdout(config.show_timestamp),
        TerminalSink::stdout(config.show_timestamp),
    );

    let (command_tx, command_rx) = mpsc::channel(32);
    tokio::spawn(read_commands(command_tx));

    let mut client = LiveClient::new(&config, session, api, command_rx)?;
    client.run(&mut WsConnector).await;

    tracing::info!("Client stopped");
    Ok(())
}

// 逐行读取标准输入: 普通文本发送弹幕，空行或 /retry 重发上次失败的内容，
// /reconnect 手动重连，/quit 或 EOF 退出
async fn read_commands(tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let command = match lines.next_line().await {
            Ok(Some(line)) => parse_command(line),
            Ok(None) => Command::Shutdown,
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                Command::Shutdown
            }
        };

        let shutdown = command == Command::Shutdown;
        if tx.send(command).await.is_err() || shutdown {
            break;
        }
    }
}

fn parse_command(line: String) -> Command {
    match line.trim() {
        "" | "/retry" => Command::Retry,
        "/quit" => Command::Shutdown,
        "/reconnect" => Command::Reconnect,
        _ => Command::Send(line),
    }
}

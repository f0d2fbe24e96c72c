mod audio;
mod channel;
mod config;
mod num_client;
mod protocol;
mod state_machine;
mod stats;

use audio::{AudioConfig, AudioSystem, CaptureEvent, create_sink};
use channel::{ChannelCommand, ChannelEvent, ChannelLink};
use config::Config;
use protocol::ChannelMessage;
use state_machine::SystemState;
use stats::LinkStats;
use tokio::signal;
use tokio::sync::mpsc;
use uuid::Uuid;

const CLIENT_ID_FILE: &str = "voicelink_client_id.txt";
const PLAYBACK_QUEUE_DEPTH: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    // 加载配置
    let mut config = Config::new().unwrap_or_default();

    // 客户端UUID，先从本地文件读取以保持重启间身份一致，如果不存在则生成新的并保存
    if config.client_id == "unknown-client" {
        if let Ok(content) = std::fs::read_to_string(CLIENT_ID_FILE) {
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                config.client_id = trimmed.to_string();
                log::info!("Loaded Client ID from file: {}", config.client_id);
            }
        }
    }

    // 生成新的UUID并保存
    if config.client_id == "unknown-client" {
        config.client_id = Uuid::new_v4().to_string();
        log::info!("Generated new Client ID: {}", config.client_id);
        if let Err(e) = std::fs::write(CLIENT_ID_FILE, &config.client_id) {
            log::warn!("Failed to save Client ID to file: {}", e);
        } else {
            log::info!("Saved Client ID to {}", CLIENT_ID_FILE);
        }
    }

    // 启动时获取服务器发布的数字，成功和失败分别记录
    let user_agent = format!("{}/{}", config.app_name, config.app_version);
    match num_client::fetch_num(config.num_url, &user_agent).await {
        Ok(n) => log::info!("Got number: {}", n),
        Err(e) => log::warn!("Number fetch failed: {:#}", e),
    }

    // 创建通道，用于组件间通信
    // 事件通道
    let (tx_channel_event, mut rx_channel_event) = mpsc::channel::<ChannelEvent>(100);

    // 命令通道
    let (tx_channel_cmd, rx_channel_cmd) = mpsc::channel::<ChannelCommand>(100);

    // 音频采集通道
    let (tx_capture, mut rx_capture) = mpsc::channel::<CaptureEvent>(100);

    // 接收端 sink，按配置选择
    let (sink, playback_rx) = create_sink(config.stream_sink, PLAYBACK_QUEUE_DEPTH)?;

    // 启动网络链接
    let link = ChannelLink::new(
        config.channel_url.to_string(),
        config.client_id.clone(),
        tx_channel_event,
        rx_channel_cmd,
    );
    tokio::spawn(link.run());

    // 启动音频系统
    let audio_config = AudioConfig {
        capture_device: config.capture_device.to_string(),
        playback_device: config.playback_device.to_string(),
        sample_rate: config.sample_rate,
        frame_size: config.frame_size,
        playback_period_size: config.playback_period_size,
    };
    let mut audio_system = AudioSystem::start(audio_config, tx_capture, playback_rx)?;

    // 主事件循环，单写者：所有发往服务器的消息都从这里出去
    let stats = LinkStats::new();
    let mut connected = false;
    let mut current_state = SystemState::Idle;
    log::info!("Voicelink started. State: {:?}", current_state);

    loop {
        tokio::select! {
            // 监听 Ctrl+C 信号
            _ = signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down...");
                break;
            }

            // 监听与服务器的网络事件
            Some(event) = rx_channel_event.recv() => {
                match event {
                    ChannelEvent::Connected => {
                        connected = true;
                        current_state = SystemState::Idle;
                        log::info!("Channel connected. State: {:?}", current_state);
                    }
                    ChannelEvent::Disconnected => {
                        connected = false;
                        current_state = SystemState::NetworkError;
                        log::warn!(
                            "Channel disconnected; outbound frames will be dropped ({} dropped so far)",
                            stats.frames_dropped(),
                        );
                    }
                    ChannelEvent::Message(message) => {
                        render_message(message);
                    }
                    ChannelEvent::Frame(frame) => {
                        if current_state != SystemState::Receiving {
                            current_state = SystemState::Receiving;
                            log::debug!("State: {:?}", current_state);
                        }
                        if let Err(e) = sink.deliver(frame).await {
                            log::warn!("Sink rejected frame: {}", e);
                        }
                    }
                }
            }

            // 监听来自采集线程的音频事件
            Some(event) = rx_capture.recv() => {
                match event {
                    CaptureEvent::Frame(frame) => {
                        // 连接状态检查：断开时丢帧并计数，而不是静默丢失
                        if !connected {
                            stats.record_dropped();
                            log::debug!(
                                "Channel not connected, dropping frame ({} dropped)",
                                stats.frames_dropped(),
                            );
                            continue;
                        }
                        if current_state != SystemState::Streaming {
                            current_state = SystemState::Streaming;
                            log::debug!("State: {:?}", current_state);
                        }
                        if let Err(e) = tx_channel_cmd.send(ChannelCommand::SendFrame(frame)).await {
                            log::warn!("Failed to send frame to channel: {}", e);
                        } else {
                            stats.record_sent();
                        }
                    }
                    CaptureEvent::Ended => {
                        // 采集流结束是显式事件，不是静默停顿
                        log::warn!("Capture stream ended; no further microphone frames will be sent");
                    }
                }
            }
        }
    }

    log::info!(
        "Shutting down: {} frames sent, {} dropped while disconnected",
        stats.frames_sent(),
        stats.frames_dropped(),
    );

    // Unblock the capture thread before joining it.
    drop(rx_capture);
    audio_system.stop();
    Ok(())
}

/// Render inbound control messages to the process log, in the same line
/// format the stream viewer uses.
fn render_message(message: ChannelMessage) {
    match message {
        ChannelMessage::Log {
            level,
            message,
            time,
            name,
            function,
            line,
        } => {
            log::info!(
                "[{}] [{}] {} (Logger: {}, Function: {}, Line: {})",
                time,
                level,
                message,
                name,
                function,
                line,
            );
        }
        ChannelMessage::StreamData { data } => {
            log::info!("Received data: {}", data);
        }
        ChannelMessage::StartStream => {
            // Client-originated signal; nothing to do if the server echoes it
            log::debug!("Ignoring start_stream from server");
        }
    }
}

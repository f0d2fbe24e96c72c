use crate::protocol::{AudioFrame, ChannelMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

#[derive(Debug)]
pub enum ChannelEvent {
    /// A validated JSON control message from the server
    Message(ChannelMessage),
    /// A decoded inbound audio frame
    Frame(AudioFrame),
    Connected,
    Disconnected,
}

#[derive(Debug)]
pub enum ChannelCommand {
    SendMessage(ChannelMessage),
    SendFrame(AudioFrame),
}

/// The one bidirectional link to the server. Owns the WebSocket; everything
/// else talks to it through the event/command channels handed to `new`.
pub struct ChannelLink {
    url: String,
    client_id: String,
    tx: mpsc::Sender<ChannelEvent>,
    rx_cmd: mpsc::Receiver<ChannelCommand>,
}

impl ChannelLink {
    pub fn new(
        url: String,
        client_id: String,
        tx: mpsc::Sender<ChannelEvent>,
        rx_cmd: mpsc::Receiver<ChannelCommand>,
    ) -> Self {
        Self {
            url,
            client_id,
            tx,
            rx_cmd,
        }
    }

    // 如果发生错误断开连接，退避后重连
    pub async fn run(mut self) {
        // 重试机制，指数退避
        let mut retry_delay = 1;
        loop {
            if let Err(e) = self.connect_and_loop().await {
                log::warn!("Channel error: {}. Retrying in {}s...", e, retry_delay);
                let _ = self.tx.send(ChannelEvent::Disconnected).await;
                tokio::time::sleep(tokio::time::Duration::from_secs(retry_delay)).await;
                retry_delay = std::cmp::min(retry_delay * 2, 60);
            } else {
                // connect_and_loop returns Ok only when the command side has
                // been dropped, i.e. we are shutting down.
                break;
            }
        }
    }

    async fn connect_and_loop(&mut self) -> anyhow::Result<()> {
        let url = Url::parse(&self.url)?;
        let host = url.host_str().unwrap_or("127.0.0.1");

        let request = tokio_tungstenite::tungstenite::http::Request::builder()
            .method("GET")
            .uri(self.url.as_str())
            .header("Host", host)
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Sec-WebSocket-Version", "13")
            .header(
                "Sec-WebSocket-Key",
                tokio_tungstenite::tungstenite::handshake::client::generate_key(),
            )
            .header("Client-Id", &self.client_id)
            .body(())?;

        log::info!("Connecting to {}...", self.url);
        let (ws_stream, _) = connect_async(request).await?;
        log::info!("Connected");

        let (mut write, mut read) = ws_stream.split();

        self.tx.send(ChannelEvent::Connected).await?;

        // 连接后立即请求服务器开始推流
        let start = serde_json::to_string(&ChannelMessage::StartStream)?;
        write.send(Message::Text(start.into())).await?;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(msg)) => {
                            match msg {
                                Message::Text(text) => {
                                    // 校验消息格式，不合法的消息丢弃
                                    match serde_json::from_str::<ChannelMessage>(&text) {
                                        Ok(message) => {
                                            self.tx.send(ChannelEvent::Message(message)).await?;
                                        }
                                        Err(e) => {
                                            log::warn!("Dropping malformed channel message: {}", e);
                                        }
                                    }
                                }
                                Message::Binary(data) => {
                                    match AudioFrame::from_bytes(&data) {
                                        Ok(frame) => {
                                            self.tx.send(ChannelEvent::Frame(frame)).await?;
                                        }
                                        Err(e) => {
                                            log::warn!("Dropping malformed audio frame: {}", e);
                                        }
                                    }
                                }
                                Message::Close(frame) => {
                                    log::info!("Server closed connection: {:?}", frame);
                                    return Err(anyhow::anyhow!("Connection closed"));
                                }
                                _ => {}
                            }
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => return Err(anyhow::anyhow!("Connection closed")),
                    }
                }
                cmd = self.rx_cmd.recv() => {
                    match cmd {
                        Some(ChannelCommand::SendMessage(message)) => {
                            let json = serde_json::to_string(&message)?;
                            write.send(Message::Text(json.into())).await?;
                        }
                        Some(ChannelCommand::SendFrame(frame)) => {
                            write.send(Message::Binary(frame.to_bytes())).await?;
                        }
                        // Command side dropped: clean shutdown
                        None => return Ok(()),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Accept one WebSocket connection and hand back its message stream.
    async fn ws_server_once() -> (
        String,
        tokio::task::JoinHandle<Vec<Message>>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            let mut received = Vec::new();
            while let Some(Ok(msg)) = ws.next().await {
                if msg.is_close() {
                    break;
                }
                received.push(msg);
            }
            received
        });
        (format!("ws://{}", addr), handle)
    }

    #[tokio::test]
    async fn frames_arrive_in_emission_order() {
        let (url, server) = ws_server_once().await;

        let (tx_event, mut rx_event) = mpsc::channel(100);
        let (tx_cmd, rx_cmd) = mpsc::channel(100);
        let link = ChannelLink::new(url, "test-client".to_string(), tx_event, rx_cmd);
        let link_handle = tokio::spawn(link.run());

        assert!(matches!(
            rx_event.recv().await,
            Some(ChannelEvent::Connected)
        ));

        let n = 8;
        for i in 0..n {
            let frame = AudioFrame::new(vec![i as i16; 4]);
            tx_cmd.send(ChannelCommand::SendFrame(frame)).await.unwrap();
        }

        // Dropping the command sender shuts the link down cleanly.
        drop(tx_cmd);
        link_handle.await.unwrap();

        let received = server.await.unwrap();
        // First message is the start_stream signal, then the frames in order.
        assert!(matches!(&received[0], Message::Text(t)
            if t.as_str() == r#"{"type":"start_stream"}"#));
        let frames: Vec<AudioFrame> = received[1..]
            .iter()
            .map(|m| match m {
                Message::Binary(data) => AudioFrame::from_bytes(data).unwrap(),
                other => panic!("expected binary frame, got {:?}", other),
            })
            .collect();
        assert_eq!(frames.len(), n);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.samples(), &[i as i16; 4]);
        }
    }

    #[tokio::test]
    async fn malformed_inbound_traffic_is_dropped_not_fatal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            // Unknown kind, invalid JSON, odd-length binary, then one good frame
            ws.send(Message::Text(r#"{"type":"bogus"}"#.into()))
                .await
                .unwrap();
            ws.send(Message::Text("not json".into())).await.unwrap();
            ws.send(Message::Binary(vec![1u8, 2, 3].into())).await.unwrap();
            ws.send(Message::Binary(
                AudioFrame::new(vec![7, -7]).to_bytes(),
            ))
            .await
            .unwrap();
            // Keep the socket open until the client is done reading
            let _ = ws.next().await;
        });

        let (tx_event, mut rx_event) = mpsc::channel(100);
        let (tx_cmd, rx_cmd) = mpsc::channel::<ChannelCommand>(100);
        let link = ChannelLink::new(
            format!("ws://{}", addr),
            "test-client".to_string(),
            tx_event,
            rx_cmd,
        );
        tokio::spawn(link.run());

        assert!(matches!(
            rx_event.recv().await,
            Some(ChannelEvent::Connected)
        ));
        // The only event after the garbage is the valid frame.
        match rx_event.recv().await {
            Some(ChannelEvent::Frame(frame)) => assert_eq!(frame.samples(), &[7, -7]),
            other => panic!("expected the valid frame, got {:?}", other),
        }

        drop(tx_cmd);
        server.abort();
    }
}

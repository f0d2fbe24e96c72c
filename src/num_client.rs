//! Startup fetch of the server's published number.

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde_json::Value;

/// GET the configured endpoint and return the JSON-encoded number it
/// publishes.
///
/// Failure is an explicit `Err`, never a number-shaped placeholder, so the
/// caller can log "failed" and "zero" as different things. The server has
/// historically wrapped the value in a one-element array; both shapes are
/// accepted.
pub async fn fetch_num(url: &str, user_agent: &str) -> Result<i64> {
    let client = Client::new();

    let response = client
        .get(url)
        .header("User-Agent", user_agent)
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    if !response.status().is_success() {
        bail!("HTTP error: {}", response.status());
    }

    let value: Value = response
        .json()
        .await
        .context("response body is not valid JSON")?;

    match &value {
        Value::Number(n) => n
            .as_i64()
            .with_context(|| format!("not an integer: {}", n)),
        Value::Array(items) if items.len() == 1 => items[0]
            .as_i64()
            .with_context(|| format!("not an integer: {}", items[0])),
        other => bail!("endpoint did not return a number: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            // Drain the request head before replying
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
        });
        format!("http://{}/num", addr)
    }

    #[tokio::test]
    async fn fetches_a_bare_number() {
        let url = serve_once("3").await;
        assert_eq!(fetch_num(&url, "test").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn fetches_a_wrapped_number() {
        let url = serve_once("[2]").await;
        assert_eq!(fetch_num(&url, "test").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn non_numeric_body_is_an_error() {
        let url = serve_once("\"three\"").await;
        assert!(fetch_num(&url, "test").await.is_err());
    }

    #[tokio::test]
    async fn network_failure_is_an_error_not_a_value() {
        // Bind then drop to get a port nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = fetch_num(&format!("http://{}/num", addr), "test").await;
        assert!(result.is_err());
    }
}

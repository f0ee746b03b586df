// Loopback TCP client used to drive the target
use bytes::{Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Failure, Outcome};

const READ_CHUNK: usize = 1024;

pub struct TestClient {
    stream: Option<TcpStream>,
    timeout: Duration,
    peer: String,
    /// Every byte read on this connection, including reads that later
    /// failed or timed out.
    received: BytesMut,
}

impl TestClient {
    /// Connect to `127.0.0.1:port`. The same `timeout` bounds every later
    /// read and write on this client.
    pub async fn connect(port: u16, timeout: Duration) -> Outcome<Self> {
        Self::connect_addr("127.0.0.1", port, timeout).await
    }

    pub async fn connect_addr(host: &str, port: u16, timeout: Duration) -> Outcome<Self> {
        let peer = format!("{host}:{port}");
        let stream = match tokio::time::timeout(timeout, TcpStream::connect(peer.as_str())).await {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => return Err(Failure::from_io(&format!("connect {peer}"), &e)),
            Err(_) => return Err(Failure::connection(format!("connect {peer}: timed out after {timeout:?}"))),
        };
        let _ = stream.set_nodelay(true);
        Ok(TestClient { stream: Some(stream), timeout, peer, received: BytesMut::new() })
    }

    fn stream(&mut self) -> Outcome<&mut TcpStream> {
        let peer = &self.peer;
        self.stream
            .as_mut()
            .ok_or_else(|| Failure::connection(format!("{peer}: client already closed")))
    }

    pub async fn send(&mut self, data: &[u8]) -> Outcome {
        let timeout = self.timeout;
        let peer = self.peer.clone();
        let s = self.stream()?;
        match tokio::time::timeout(timeout, async {
            s.write_all(data).await?;
            s.flush().await
        })
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Failure::from_io(&format!("send to {peer}"), &e)),
            Err(_) => Err(Failure::connection(format!("send to {peer}: stalled for {timeout:?}"))),
        }
    }

    /// Send each part after sleeping `delay`, so the target sees the request
    /// arrive across several reads.
    pub async fn send_fragments(&mut self, parts: &[&[u8]], delay: Duration) -> Outcome {
        for part in parts {
            tokio::time::sleep(delay).await;
            self.send(part).await?;
        }
        Ok(())
    }

    /// Read until the peer closes the connection. The timeout bounds the
    /// whole exchange, not each individual read. On failure the bytes read so
    /// far stay available through `received`.
    pub async fn receive_all(&mut self) -> Outcome<Bytes> {
        let timeout = self.timeout;
        let peer = self.peer.as_str();
        let Some(s) = self.stream.as_mut() else {
            return Err(Failure::connection(format!("{peer}: client already closed")));
        };
        let start = self.received.len();
        let d = &mut self.received;
        let read = async {
            let mut b = [0u8; READ_CHUNK];
            loop {
                let n = s.read(&mut b).await?;
                if n == 0 { break; }
                d.extend_from_slice(&b[..n]);
            }
            Ok::<(), std::io::Error>(())
        };
        let r = tokio::time::timeout(timeout, read).await;
        let got = self.received.len() - start;
        match r {
            Ok(Ok(())) => Ok(Bytes::copy_from_slice(&self.received[start..])),
            Ok(Err(e)) => Err(Failure::from_io(&format!("read from {peer}"), &e)),
            Err(_) => Err(Failure::read_timeout(format!(
                "{peer} did not close within {timeout:?} ({got} bytes received)"
            ))),
        }
    }

    pub fn received(&self) -> &[u8] {
        &self.received
    }

    pub async fn close(&mut self) {
        if let Some(mut s) = self.stream.take() {
            let _ = s.shutdown().await;
        }
    }
}

pub async fn close_all(clients: &mut [TestClient]) {
    for c in clients.iter_mut() {
        c.close().await;
    }
}

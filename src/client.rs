use std::io;
use std::time::Duration;

use bytes::BytesMut;
use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{LlrpError, Result};
use crate::messages::{LlrpMessage, Message};
use crate::report::TagReportData;
use crate::types::ConnectionAttemptStatus;

/// Async LLRP client session: frames the codec over a TCP stream and
/// assigns message ids. All protocol semantics live in the codec; this
/// type only moves bytes.
pub struct LlrpClient {
  stream           : TcpStream,
  buf              : BytesMut,
  message_id       : u32,
  response_timeout : Duration,
}

impl LlrpClient {

  /// Connects to a reader and waits for its connection-attempt
  /// greeting.
  pub async fn connect(addr: &str, response_timeout_ms: u64) -> Result<Self> {
    let stream = TcpStream::connect(addr).await?;
    info!("connected to LLRP reader: {}", addr);

    let mut client = LlrpClient {
      stream,
      buf: BytesMut::with_capacity(4096),
      message_id: 1001,
      response_timeout: Duration::from_millis(response_timeout_ms),
    };
    client.await_connection_greeting().await?;
    Ok(client)
  }

  async fn await_connection_greeting(&mut self) -> Result<()> {
    let message = self.receive_timed().await?;
    match &message.message {
      Message::ReaderEventNotification(event) => {
        match event.data.connection_attempt_event {
          Some(attempt) if attempt.status == ConnectionAttemptStatus::Success => {
            debug!("reader accepted the connection");
            Ok(())
          }
          Some(attempt) => Err(LlrpError::Io(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            format!("reader refused the connection: {}", attempt.status),
          ))),
          None => {
            warn!("greeting notification carried no ConnectionAttemptEvent");
            Ok(())
          }
        }
      }
      other => {
        warn!("unexpected greeting message type {}", other.message_type());
        Ok(())
      }
    }
  }

  pub fn next_message_id(&mut self) -> u32 {
    let current_id = self.message_id;
    self.message_id += 1;
    current_id
  }

  /// Encodes and writes one message, returning the message id used.
  pub async fn send(&mut self, message: Message) -> Result<u32> {
    let message_id = self.next_message_id();
    debug!("sending {} (id {})", message.message_type(), message_id);
    let frame = LlrpMessage::new(message_id, message).encode()?;
    self.stream.write_all(&frame).await?;
    Ok(message_id)
  }

  /// Reads one complete frame, re-driving the socket until the codec
  /// stops asking for more data.
  pub async fn receive(&mut self) -> Result<LlrpMessage> {
    loop {
      match LlrpMessage::decode(&self.buf) {
        Ok((message, consumed)) => {
          let _ = self.buf.split_to(consumed);
          debug!("received {} (id {})", message.message.message_type(), message.message_id);
          return Ok(message);
        }
        Err(LlrpError::NeedMoreData(_)) => {
          let n = self.stream.read_buf(&mut self.buf).await?;
          if n == 0 {
            return Err(LlrpError::Io(io::Error::new(
              io::ErrorKind::UnexpectedEof,
              "connection closed by the reader",
            )));
          }
        }
        Err(e) => return Err(e),
      }
    }
  }

  async fn receive_timed(&mut self) -> Result<LlrpMessage> {
    match timeout(self.response_timeout, self.receive()).await {
      Ok(result) => result,
      Err(_) => Err(LlrpError::Io(io::Error::new(
        io::ErrorKind::TimedOut,
        "timed out awaiting a reader message",
      ))),
    }
  }

  /// Sends a request and awaits the next message under the configured
  /// response timeout.
  pub async fn transact(&mut self, message: Message) -> Result<LlrpMessage> {
    self.send(message).await?;
    self.receive_timed().await
  }

  /// Awaits `report_count` RO_ACCESS_REPORT messages, handing every tag
  /// report to the callback. Keepalives arriving in between are
  /// acknowledged; other messages are ignored.
  pub async fn await_reports<F>(&mut self, mut report_count: usize, mut on_tag: F) -> Result<()>
  where
    F: FnMut(&TagReportData),
  {
    while report_count > 0 {
      let message = self.receive().await?;
      match message.message {
        Message::ROAccessReport(report) => {
          for tag in &report.tag_reports {
            on_tag(tag);
          }
          report_count -= 1;
        }
        Message::Keepalive => {
          self.send(Message::KeepaliveAck).await?;
        }
        other => {
          debug!("ignoring {} while awaiting reports", other.message_type());
        }
      }
    }
    Ok(())
  }

  /// Sends CLOSE_CONNECTION and drops the session.
  pub async fn disconnect(mut self) -> Result<()> {
    self.send(Message::CloseConnection).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use bytes::BufMut;
  use tokio::net::TcpListener;

  use super::*;
  use crate::buffer::encode_tlv;
  use crate::frame;
  use crate::types::{MessageType, ParamType};

  fn greeting_frame() -> BytesMut {
    let mut body = BytesMut::new();
    encode_tlv(&mut body, ParamType::ReaderEventNotificationData, |buf| {
      encode_tlv(buf, ParamType::UTCTimestamp, |buf| buf.put_u64(1));
      encode_tlv(buf, ParamType::ConnectionAttemptEvent, |buf| buf.put_u16(0));
    });
    frame::encode_frame(MessageType::ReaderEventNotification as u16, 0, &body)
  }

  #[tokio::test]
  async fn connects_and_exchanges_a_keepalive() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      socket.write_all(&greeting_frame()).await.unwrap();

      // Expect the client's KEEPALIVE, answer with KEEPALIVE_ACK.
      let mut header = [0u8; 10];
      socket.read_exact(&mut header).await.unwrap();
      let (frame_header, _) = frame::decode_frame(&header).unwrap();
      assert_eq!(frame_header.message_type, MessageType::Keepalive as u16);

      let ack = frame::encode_frame(MessageType::KeepaliveAck as u16, frame_header.message_id, &[]);
      socket.write_all(&ack).await.unwrap();
    });

    let mut client = LlrpClient::connect(&addr.to_string(), 2500).await.unwrap();
    let response = client.transact(Message::Keepalive).await.unwrap();
    assert!(matches!(response.message, Message::KeepaliveAck));

    server.await.unwrap();
  }
}

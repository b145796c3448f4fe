use bytes::{BufMut, BytesMut};
use log::debug;

use crate::accessspec::AccessSpec;
use crate::buffer::{flag, flag_bit, Reader};
use crate::capabilities::ReaderCapabilities;
use crate::error::{LlrpError, Result};
use crate::events::ReaderEventNotification;
use crate::frame::{self, VER_PROTO_V1};
use crate::params::{EventsAndReports, LLRPStatus, ReaderConfig};
use crate::report::ROAccessReport;
use crate::rospec::ROSpec;
use crate::types::{tlv_param_name, CapabilityRequest, MessageType};

const RESTORE_FACTORY_SETTINGS_BIT: u8 = 7;

/// Body of GET_READER_CAPABILITIES (9.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetReaderCapabilities {
  pub requested_data: CapabilityRequest,
}

impl GetReaderCapabilities {

  pub fn all() -> Self {
    GetReaderCapabilities { requested_data: CapabilityRequest::All }
  }

  fn encode(&self, buf: &mut BytesMut) {
    buf.put_u8(self.requested_data as u8);
  }

  fn decode(r: &mut Reader) -> Result<Self> {
    let raw = r.get_u8()?;
    let requested_data = CapabilityRequest::from_repr(raw).ok_or_else(|| {
      LlrpError::malformed("GET_READER_CAPABILITIES", format!("unknown request {}", raw))
    })?;
    Ok(GetReaderCapabilities { requested_data })
  }
}

/// Body of GET_READER_CONFIG (12.1.1). Zero in an id field means "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetReaderConfig {
  pub antenna_id     : u16,
  pub requested_data : u8,
  pub gpi_port_num   : u16,
  pub gpo_port_num   : u16,
}

impl GetReaderConfig {

  fn encode(&self, buf: &mut BytesMut) {
    buf.put_u16(self.antenna_id);
    buf.put_u8(self.requested_data);
    buf.put_u16(self.gpi_port_num);
    buf.put_u16(self.gpo_port_num);
  }

  fn decode(r: &mut Reader) -> Result<Self> {
    let antenna_id = r.get_u16()?;
    let requested_data = r.get_u8()?;
    let gpi_port_num = r.get_u16()?;
    let gpo_port_num = r.get_u16()?;
    Ok(GetReaderConfig { antenna_id, requested_data, gpi_port_num, gpo_port_num })
  }
}

/// Body of SET_READER_CONFIG (12.1.3): the restore flag plus one
/// embedded configuration parameter. Only EventsAndReports is carried
/// here; any other embedded parameter is refused rather than corrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetReaderConfig {
  pub restore_factory_settings : bool,
  pub events_and_reports       : Option<EventsAndReports>,
}

impl SetReaderConfig {

  pub fn hold_events_and_reports(hold: bool) -> Self {
    SetReaderConfig {
      restore_factory_settings: false,
      events_and_reports: Some(EventsAndReports {
        hold_events_and_reports_upon_reconnect: hold,
      }),
    }
  }

  fn encode(&self, buf: &mut BytesMut) {
    buf.put_u8(flag_bit(self.restore_factory_settings, RESTORE_FACTORY_SETTINGS_BIT));
    if let Some(events) = &self.events_and_reports {
      events.encode(buf);
    }
  }

  fn decode(r: &mut Reader) -> Result<Self> {
    let restore_factory_settings = flag(r.get_u8()?, RESTORE_FACTORY_SETTINGS_BIT);
    let events_and_reports = EventsAndReports::decode(r)?;
    if !r.is_empty() {
      let feature = match r.peek_tlv_type() {
        Some(code) => format!("SET_READER_CONFIG parameter {}", tlv_param_name(code)),
        None => "SET_READER_CONFIG parameter".to_string(),
      };
      return Err(LlrpError::Unsupported(feature));
    }
    Ok(SetReaderConfig { restore_factory_settings, events_and_reports })
  }
}

/// Shared body of every response that carries only an LLRPStatus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResponse {
  pub status: LLRPStatus,
}

impl StatusResponse {

  fn encode(&self, buf: &mut BytesMut) {
    self.status.encode(buf);
  }

  fn decode(r: &mut Reader) -> Result<Self> {
    let status = LLRPStatus::decode_required(r)?;
    r.expect_consumed()?;
    Ok(StatusResponse { status })
  }
}

/// Every LLRP message this codec speaks, decoded to its typed body.
#[derive(Debug, Clone)]
pub enum Message {
  GetReaderCapabilities(GetReaderCapabilities),
  GetReaderCapabilitiesResponse(ReaderCapabilities),
  GetReaderConfig(GetReaderConfig),
  GetReaderConfigResponse(ReaderConfig),
  SetReaderConfig(SetReaderConfig),
  SetReaderConfigResponse(StatusResponse),
  CloseConnection,
  CloseConnectionResponse(StatusResponse),
  AddROSpec(ROSpec),
  AddROSpecResponse(StatusResponse),
  DeleteROSpec { rospec_id: u32 },
  DeleteROSpecResponse(StatusResponse),
  StartROSpec { rospec_id: u32 },
  StartROSpecResponse(StatusResponse),
  StopROSpec { rospec_id: u32 },
  StopROSpecResponse(StatusResponse),
  EnableROSpec { rospec_id: u32 },
  EnableROSpecResponse(StatusResponse),
  DisableROSpec { rospec_id: u32 },
  DisableROSpecResponse(StatusResponse),
  AddAccessSpec(AccessSpec),
  AddAccessSpecResponse(StatusResponse),
  DeleteAccessSpec { access_spec_id: u32 },
  DeleteAccessSpecResponse(StatusResponse),
  EnableAccessSpec { access_spec_id: u32 },
  EnableAccessSpecResponse(StatusResponse),
  DisableAccessSpec { access_spec_id: u32 },
  DisableAccessSpecResponse(StatusResponse),
  ROAccessReport(ROAccessReport),
  Keepalive,
  KeepaliveAck,
  ReaderEventNotification(ReaderEventNotification),
  EnableEventsAndReports,
  ErrorMessage(StatusResponse),
}

impl Message {

  pub fn message_type(&self) -> MessageType {
    match self {
      Message::GetReaderCapabilities(_) => MessageType::GetReaderCapabilities,
      Message::GetReaderCapabilitiesResponse(_) => MessageType::GetReaderCapabilitiesResponse,
      Message::GetReaderConfig(_) => MessageType::GetReaderConfig,
      Message::GetReaderConfigResponse(_) => MessageType::GetReaderConfigResponse,
      Message::SetReaderConfig(_) => MessageType::SetReaderConfig,
      Message::SetReaderConfigResponse(_) => MessageType::SetReaderConfigResponse,
      Message::CloseConnection => MessageType::CloseConnection,
      Message::CloseConnectionResponse(_) => MessageType::CloseConnectionResponse,
      Message::AddROSpec(_) => MessageType::AddROSpec,
      Message::AddROSpecResponse(_) => MessageType::AddROSpecResponse,
      Message::DeleteROSpec { .. } => MessageType::DeleteROSpec,
      Message::DeleteROSpecResponse(_) => MessageType::DeleteROSpecResponse,
      Message::StartROSpec { .. } => MessageType::StartROSpec,
      Message::StartROSpecResponse(_) => MessageType::StartROSpecResponse,
      Message::StopROSpec { .. } => MessageType::StopROSpec,
      Message::StopROSpecResponse(_) => MessageType::StopROSpecResponse,
      Message::EnableROSpec { .. } => MessageType::EnableROSpec,
      Message::EnableROSpecResponse(_) => MessageType::EnableROSpecResponse,
      Message::DisableROSpec { .. } => MessageType::DisableROSpec,
      Message::DisableROSpecResponse(_) => MessageType::DisableROSpecResponse,
      Message::AddAccessSpec(_) => MessageType::AddAccessSpec,
      Message::AddAccessSpecResponse(_) => MessageType::AddAccessSpecResponse,
      Message::DeleteAccessSpec { .. } => MessageType::DeleteAccessSpec,
      Message::DeleteAccessSpecResponse(_) => MessageType::DeleteAccessSpecResponse,
      Message::EnableAccessSpec { .. } => MessageType::EnableAccessSpec,
      Message::EnableAccessSpecResponse(_) => MessageType::EnableAccessSpecResponse,
      Message::DisableAccessSpec { .. } => MessageType::DisableAccessSpec,
      Message::DisableAccessSpecResponse(_) => MessageType::DisableAccessSpecResponse,
      Message::ROAccessReport(_) => MessageType::ROAccessReport,
      Message::Keepalive => MessageType::Keepalive,
      Message::KeepaliveAck => MessageType::KeepaliveAck,
      Message::ReaderEventNotification(_) => MessageType::ReaderEventNotification,
      Message::EnableEventsAndReports => MessageType::EnableEventsAndReports,
      Message::ErrorMessage(_) => MessageType::ErrorMessage,
    }
  }

  /// Emits the message body. Reader-originated capability, config and
  /// event payloads are decode-only, as in any client-side codec.
  pub fn encode_body(&self, buf: &mut BytesMut) -> Result<()> {
    match self {
      Message::GetReaderCapabilities(body) => body.encode(buf),
      Message::GetReaderConfig(body) => body.encode(buf),
      Message::SetReaderConfig(body) => body.encode(buf),
      Message::AddROSpec(rospec) => rospec.encode(buf),
      Message::AddAccessSpec(spec) => spec.encode(buf),
      Message::DeleteROSpec { rospec_id }
      | Message::StartROSpec { rospec_id }
      | Message::StopROSpec { rospec_id }
      | Message::EnableROSpec { rospec_id }
      | Message::DisableROSpec { rospec_id } => buf.put_u32(*rospec_id),
      Message::DeleteAccessSpec { access_spec_id }
      | Message::EnableAccessSpec { access_spec_id }
      | Message::DisableAccessSpec { access_spec_id } => buf.put_u32(*access_spec_id),
      Message::Keepalive
      | Message::KeepaliveAck
      | Message::CloseConnection
      | Message::EnableEventsAndReports => {}
      Message::SetReaderConfigResponse(body)
      | Message::CloseConnectionResponse(body)
      | Message::AddROSpecResponse(body)
      | Message::DeleteROSpecResponse(body)
      | Message::StartROSpecResponse(body)
      | Message::StopROSpecResponse(body)
      | Message::EnableROSpecResponse(body)
      | Message::DisableROSpecResponse(body)
      | Message::AddAccessSpecResponse(body)
      | Message::DeleteAccessSpecResponse(body)
      | Message::EnableAccessSpecResponse(body)
      | Message::DisableAccessSpecResponse(body)
      | Message::ErrorMessage(body) => body.encode(buf),
      Message::ROAccessReport(report) => report.encode(buf),
      Message::GetReaderCapabilitiesResponse(_)
      | Message::GetReaderConfigResponse(_)
      | Message::ReaderEventNotification(_) => {
        return Err(LlrpError::Unsupported(format!(
          "encoding {} messages",
          self.message_type()
        )));
      }
    }
    Ok(())
  }

  /// Decodes a message body against its frame type code.
  pub fn decode(message_type: u16, body: &[u8]) -> Result<Message> {
    let mtype = MessageType::from_repr(message_type)
      .ok_or(LlrpError::UnknownMessageType(message_type))?;
    let mut r = Reader::new(body);

    let message = match mtype {
      MessageType::GetReaderCapabilities => {
        let body = GetReaderCapabilities::decode(&mut r)?;
        r.expect_end()?;
        Message::GetReaderCapabilities(body)
      }
      MessageType::GetReaderCapabilitiesResponse => {
        Message::GetReaderCapabilitiesResponse(ReaderCapabilities::decode(&mut r)?)
      }
      MessageType::GetReaderConfig => {
        let body = GetReaderConfig::decode(&mut r)?;
        r.expect_end()?;
        Message::GetReaderConfig(body)
      }
      MessageType::GetReaderConfigResponse => {
        Message::GetReaderConfigResponse(ReaderConfig::decode(&mut r)?)
      }
      MessageType::SetReaderConfig => {
        Message::SetReaderConfig(SetReaderConfig::decode(&mut r)?)
      }
      MessageType::SetReaderConfigResponse => {
        Message::SetReaderConfigResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::CloseConnection => {
        r.expect_end()?;
        Message::CloseConnection
      }
      MessageType::CloseConnectionResponse => {
        Message::CloseConnectionResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::AddROSpec => {
        let rospec = ROSpec::decode_required(&mut r)?;
        r.expect_end()?;
        Message::AddROSpec(rospec)
      }
      MessageType::AddROSpecResponse => {
        Message::AddROSpecResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::DeleteROSpec => {
        let rospec_id = r.get_u32()?;
        r.expect_end()?;
        Message::DeleteROSpec { rospec_id }
      }
      MessageType::DeleteROSpecResponse => {
        Message::DeleteROSpecResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::StartROSpec => {
        let rospec_id = r.get_u32()?;
        r.expect_end()?;
        Message::StartROSpec { rospec_id }
      }
      MessageType::StartROSpecResponse => {
        Message::StartROSpecResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::StopROSpec => {
        let rospec_id = r.get_u32()?;
        r.expect_end()?;
        Message::StopROSpec { rospec_id }
      }
      MessageType::StopROSpecResponse => {
        Message::StopROSpecResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::EnableROSpec => {
        let rospec_id = r.get_u32()?;
        r.expect_end()?;
        Message::EnableROSpec { rospec_id }
      }
      MessageType::EnableROSpecResponse => {
        Message::EnableROSpecResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::DisableROSpec => {
        let rospec_id = r.get_u32()?;
        r.expect_end()?;
        Message::DisableROSpec { rospec_id }
      }
      MessageType::DisableROSpecResponse => {
        Message::DisableROSpecResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::AddAccessSpec => {
        let spec = AccessSpec::decode_required(&mut r)?;
        r.expect_end()?;
        Message::AddAccessSpec(spec)
      }
      MessageType::AddAccessSpecResponse => {
        Message::AddAccessSpecResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::DeleteAccessSpec => {
        let access_spec_id = r.get_u32()?;
        r.expect_end()?;
        Message::DeleteAccessSpec { access_spec_id }
      }
      MessageType::DeleteAccessSpecResponse => {
        Message::DeleteAccessSpecResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::EnableAccessSpec => {
        let access_spec_id = r.get_u32()?;
        r.expect_end()?;
        Message::EnableAccessSpec { access_spec_id }
      }
      MessageType::EnableAccessSpecResponse => {
        Message::EnableAccessSpecResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::DisableAccessSpec => {
        let access_spec_id = r.get_u32()?;
        r.expect_end()?;
        Message::DisableAccessSpec { access_spec_id }
      }
      MessageType::DisableAccessSpecResponse => {
        Message::DisableAccessSpecResponse(StatusResponse::decode(&mut r)?)
      }
      MessageType::ROAccessReport => {
        Message::ROAccessReport(ROAccessReport::decode(&mut r)?)
      }
      MessageType::Keepalive => {
        r.expect_end()?;
        Message::Keepalive
      }
      MessageType::KeepaliveAck => {
        r.expect_end()?;
        Message::KeepaliveAck
      }
      MessageType::ReaderEventNotification => {
        Message::ReaderEventNotification(ReaderEventNotification::decode(&mut r)?)
      }
      MessageType::EnableEventsAndReports => {
        r.expect_end()?;
        Message::EnableEventsAndReports
      }
      MessageType::ErrorMessage => Message::ErrorMessage(StatusResponse::decode(&mut r)?),
    };

    Ok(message)
  }
}

/// An LLRP message paired with its envelope fields.
#[derive(Debug, Clone)]
pub struct LlrpMessage {
  pub version    : u8,
  pub message_id : u32,
  pub message    : Message,
}

impl LlrpMessage {

  pub fn new(message_id: u32, message: Message) -> Self {
    LlrpMessage { version: VER_PROTO_V1, message_id, message }
  }

  /// Encodes the complete frame: envelope plus body.
  pub fn encode(&self) -> Result<BytesMut> {
    let mut body = BytesMut::new();
    self.message.encode_body(&mut body)?;
    Ok(frame::encode_frame_versioned(
      self.version,
      self.message.message_type() as u16,
      self.message_id,
      &body,
    ))
  }

  /// Decodes exactly one frame off the front of `buf`, returning the
  /// message and the frame length consumed. Incomplete buffers yield
  /// `NeedMoreData`.
  pub fn decode(buf: &[u8]) -> Result<(Self, usize)> {
    let (header, body) = frame::decode_frame(buf)?;
    debug!(
      "frame: type={} len={} id={}",
      header.message_type, header.message_length, header.message_id
    );
    let message = Message::decode(header.message_type, body)?;
    Ok((
      LlrpMessage {
        version: header.version,
        message_id: header.message_id,
        message,
      },
      header.message_length as usize,
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::capabilities::ReaderMode;

  fn hex(buf: &[u8]) -> String {
    buf.iter().map(|b| format!("{:02x}", b)).collect()
  }

  #[test]
  fn keepalive_ack_encodes_to_the_bare_envelope() {
    let frame = LlrpMessage::new(0, Message::KeepaliveAck).encode().unwrap();
    assert_eq!(hex(&frame), "04480000000a00000000");
  }

  #[test]
  fn close_connection_encodes_to_the_bare_envelope() {
    let frame = LlrpMessage::new(7, Message::CloseConnection).encode().unwrap();
    assert_eq!(hex(&frame), "040e0000000a00000007");
  }

  #[test]
  fn enable_rospec_carries_the_rospec_id() {
    let frame = LlrpMessage::new(3, Message::EnableROSpec { rospec_id: 1234 })
      .encode()
      .unwrap();
    assert_eq!(hex(&frame), "04180000000e00000003000004d2");
  }

  #[test]
  fn add_rospec_round_trips_byte_for_byte() {
    let rospec = ROSpec::builder(1, ReaderMode { mode_identifier: 1000, max_tari: 6250 })
      .duration_ms(2000)
      .build()
      .unwrap();
    let frame = LlrpMessage::new(1001, Message::AddROSpec(rospec)).encode().unwrap();

    let (decoded, consumed) = LlrpMessage::decode(&frame).unwrap();
    assert_eq!(consumed, frame.len());
    assert_eq!(decoded.message_id, 1001);
    let again = decoded.encode().unwrap();
    assert_eq!(frame, again);
  }

  #[test]
  fn status_only_responses_share_one_decoder() {
    let status = StatusResponse { status: LLRPStatus::success() };
    for mtype in [
      MessageType::AddROSpecResponse,
      MessageType::DeleteAccessSpecResponse,
      MessageType::CloseConnectionResponse,
      MessageType::ErrorMessage,
    ] {
      let mut body = BytesMut::new();
      status.encode(&mut body);
      let decoded = Message::decode(mtype as u16, &body).unwrap();
      assert_eq!(decoded.message_type(), mtype);
    }
  }

  #[test]
  fn status_response_with_trailing_junk_is_rejected() {
    let mut body = BytesMut::new();
    LLRPStatus::success().encode(&mut body);
    body.extend_from_slice(&[0x00]);
    assert!(matches!(
      Message::decode(MessageType::AddROSpecResponse as u16, &body),
      Err(LlrpError::TrailingBytes(1))
    ));
  }

  #[test]
  fn unknown_message_types_are_reported_by_code() {
    assert!(matches!(
      Message::decode(999, &[]),
      Err(LlrpError::UnknownMessageType(999))
    ));
  }

  #[test]
  fn set_reader_config_round_trips() {
    let message = Message::SetReaderConfig(SetReaderConfig::hold_events_and_reports(false));
    let frame = LlrpMessage::new(5, message).encode().unwrap();
    let (decoded, _) = LlrpMessage::decode(&frame).unwrap();
    match decoded.message {
      Message::SetReaderConfig(config) => {
        assert!(!config.restore_factory_settings);
        assert_eq!(
          config.events_and_reports,
          Some(EventsAndReports { hold_events_and_reports_upon_reconnect: false })
        );
      }
      other => panic!("unexpected message {:?}", other),
    }
    let again = decoded.encode().unwrap();
    assert_eq!(frame, again);
  }

  #[test]
  fn set_reader_config_refuses_other_embedded_parameters() {
    let mut body = BytesMut::new();
    body.put_u8(0x00);
    // A KeepaliveSpec where only EventsAndReports is understood.
    crate::buffer::encode_tlv(&mut body, crate::types::ParamType::KeepaliveSpec, |buf| {
      buf.put_u8(1);
      buf.put_u32(10_000);
    });
    match Message::decode(MessageType::SetReaderConfig as u16, &body) {
      Err(LlrpError::Unsupported(feature)) => {
        assert!(feature.contains("KeepaliveSpec"));
      }
      other => panic!("expected Unsupported, got {:?}", other),
    }
  }

  #[test]
  fn keepalive_decodes_and_acks() {
    let frame = frame::encode_frame(MessageType::Keepalive as u16, 42, &[]);
    let (decoded, _) = LlrpMessage::decode(&frame).unwrap();
    assert!(matches!(decoded.message, Message::Keepalive));
  }
}

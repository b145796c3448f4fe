use log::debug;
use strum_macros::{Display, FromRepr};

use crate::buffer::{flag, Reader};
use crate::error::{LlrpError, Result};
use crate::params::{UTCTimestamp, Uptime};
use crate::types::{ConnectionAttemptStatus, ParamType};

const GPI_EVENT_BIT: u8 = 7;

/// The mandatory timestamp leading every event notification: exactly
/// one of the UTC or uptime forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTimestamp {
  Utc(UTCTimestamp),
  Uptime(Uptime),
}

impl EventTimestamp {

  pub fn microseconds(&self) -> u64 {
    match self {
      EventTimestamp::Utc(ts) => ts.microseconds,
      EventTimestamp::Uptime(ts) => ts.microseconds,
    }
  }
}

/// 13.2.6 ReaderEventNotificationData parameter with its full optional
/// child set, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderEventNotificationData {
  pub timestamp                    : EventTimestamp,
  pub hopping_event                : Option<HoppingEvent>,
  pub gpi_event                    : Option<GPIEvent>,
  pub rospec_event                 : Option<ROSpecEvent>,
  pub buffer_level_warning_event   : Option<ReportBufferLevelWarningEvent>,
  pub buffer_overflow_error_event  : Option<ReportBufferOverflowErrorEvent>,
  pub reader_exception_event       : Option<ReaderExceptionEvent>,
  pub rf_survey_event              : Option<RFSurveyEvent>,
  pub ai_spec_event                : Option<AISpecEvent>,
  pub antenna_event                : Option<AntennaEvent>,
  pub connection_attempt_event     : Option<ConnectionAttemptEvent>,
  pub connection_close_event       : Option<ConnectionCloseEvent>,
}

impl ReaderEventNotificationData {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ReaderEventNotificationData)? else {
      return Ok(None);
    };

    // Exactly one of the two timestamp forms must be present.
    let timestamp = if let Some(utc) = UTCTimestamp::decode(&mut body)? {
      EventTimestamp::Utc(utc)
    } else if let Some(uptime) = Uptime::decode(&mut body)? {
      EventTimestamp::Uptime(uptime)
    } else {
      return Err(LlrpError::MissingRequired("UTCTimestamp or Uptime"));
    };

    let hopping_event = HoppingEvent::decode(&mut body)?;
    let gpi_event = GPIEvent::decode(&mut body)?;
    let rospec_event = ROSpecEvent::decode(&mut body)?;
    let buffer_level_warning_event = ReportBufferLevelWarningEvent::decode(&mut body)?;
    let buffer_overflow_error_event = ReportBufferOverflowErrorEvent::decode(&mut body)?;
    let reader_exception_event = ReaderExceptionEvent::decode(&mut body)?;
    let rf_survey_event = RFSurveyEvent::decode(&mut body)?;
    let ai_spec_event = AISpecEvent::decode(&mut body)?;
    let antenna_event = AntennaEvent::decode(&mut body)?;
    let connection_attempt_event = ConnectionAttemptEvent::decode(&mut body)?;
    let connection_close_event = ConnectionCloseEvent::decode(&mut body)?;
    body.expect_end()?;

    Ok(Some(ReaderEventNotificationData {
      timestamp,
      hopping_event,
      gpi_event,
      rospec_event,
      buffer_level_warning_event,
      buffer_overflow_error_event,
      reader_exception_event,
      rf_survey_event,
      ai_spec_event,
      antenna_event,
      connection_attempt_event,
      connection_close_event,
    }))
  }

  pub fn decode_required(r: &mut Reader) -> Result<Self> {
    Self::decode(r)?.ok_or(LlrpError::MissingRequired("ReaderEventNotificationData"))
  }
}

/// 13.2.6.1 HoppingEvent parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoppingEvent {
  pub hop_table_id       : u16,
  pub next_channel_index : u16,
}

impl HoppingEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::HoppingEvent)? else {
      return Ok(None);
    };
    let hop_table_id = body.get_u16()?;
    let next_channel_index = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(HoppingEvent { hop_table_id, next_channel_index }))
  }
}

/// 13.2.6.2 GPIEvent parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GPIEvent {
  pub gpi_port_number : u16,
  pub gpi_event       : bool,
}

impl GPIEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::GPIEvent)? else {
      return Ok(None);
    };
    let gpi_port_number = body.get_u16()?;
    let gpi_event = flag(body.get_u8()?, GPI_EVENT_BIT);
    body.expect_end()?;
    Ok(Some(GPIEvent { gpi_port_number, gpi_event }))
  }
}

// 13.2.6.3 ROSpecEvent event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum ROSpecEventType {
  Start     = 0,
  End       = 1,
  Preempted = 2,
}

/// 13.2.6.3 ROSpecEvent parameter. The preempting id is meaningful only
/// for the Preempted event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ROSpecEvent {
  pub event_type           : ROSpecEventType,
  pub rospec_id            : u32,
  pub preempting_rospec_id : u32,
}

impl ROSpecEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ROSpecEvent)? else {
      return Ok(None);
    };
    let raw = body.get_u8()?;
    let event_type = ROSpecEventType::from_repr(raw).ok_or_else(|| {
      LlrpError::malformed("ROSpecEvent", format!("unknown event type {}", raw))
    })?;
    let rospec_id = body.get_u32()?;
    let preempting_rospec_id = body.get_u32()?;
    body.expect_end()?;
    Ok(Some(ROSpecEvent { event_type, rospec_id, preempting_rospec_id }))
  }
}

/// 13.2.6.4 ReportBufferLevelWarningEvent parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportBufferLevelWarningEvent {
  pub report_buffer_percentage_full: u8,
}

impl ReportBufferLevelWarningEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ReportBufferLevelWarningEvent)? else {
      return Ok(None);
    };
    let report_buffer_percentage_full = body.get_u8()?;
    body.expect_end()?;
    Ok(Some(ReportBufferLevelWarningEvent { report_buffer_percentage_full }))
  }
}

/// 13.2.6.5 ReportBufferOverflowErrorEvent parameter (empty body).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportBufferOverflowErrorEvent;

impl ReportBufferOverflowErrorEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(body) = r.try_tlv(ParamType::ReportBufferOverflowErrorEvent)? else {
      return Ok(None);
    };
    body.expect_end()?;
    Ok(Some(ReportBufferOverflowErrorEvent))
  }
}

/// 13.2.6.6 ReaderExceptionEvent parameter: a UTF-8 message from the
/// reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderExceptionEvent {
  pub message: String,
}

impl ReaderExceptionEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ReaderExceptionEvent)? else {
      return Ok(None);
    };
    let byte_count = body.get_u16()? as usize;
    let message = String::from_utf8_lossy(body.get_bytes(byte_count)?).into_owned();
    body.expect_end()?;
    debug!("ReaderExceptionEvent: {}", message);
    Ok(Some(ReaderExceptionEvent { message }))
  }
}

/// 13.2.6.7 RFSurveyEvent parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RFSurveyEvent {
  pub event_type : u8,
  pub rospec_id  : u32,
  pub spec_index : u16,
}

impl RFSurveyEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::RFSurveyEvent)? else {
      return Ok(None);
    };
    let event_type = body.get_u8()?;
    let rospec_id = body.get_u32()?;
    let spec_index = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(RFSurveyEvent { event_type, rospec_id, spec_index }))
  }
}

/// 13.2.6.8 AISpecEvent parameter (event type 0 = end of AISpec).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AISpecEvent {
  pub event_type : u8,
  pub rospec_id  : u32,
  pub spec_index : u16,
}

impl AISpecEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::AISpecEvent)? else {
      return Ok(None);
    };
    let event_type = body.get_u8()?;
    let rospec_id = body.get_u32()?;
    let spec_index = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(AISpecEvent { event_type, rospec_id, spec_index }))
  }
}

// 13.2.6.9 AntennaEvent event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum AntennaEventType {
  Disconnected = 0,
  Connected    = 1,
}

/// 13.2.6.9 AntennaEvent parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AntennaEvent {
  pub event_type : AntennaEventType,
  pub antenna_id : u16,
}

impl AntennaEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::AntennaEvent)? else {
      return Ok(None);
    };
    let raw = body.get_u8()?;
    let event_type = AntennaEventType::from_repr(raw).ok_or_else(|| {
      LlrpError::malformed("AntennaEvent", format!("unknown event type {}", raw))
    })?;
    let antenna_id = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(AntennaEvent { event_type, antenna_id }))
  }
}

/// 13.2.6.11 ConnectionAttemptEvent parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionAttemptEvent {
  pub status: ConnectionAttemptStatus,
}

impl ConnectionAttemptEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ConnectionAttemptEvent)? else {
      return Ok(None);
    };
    let raw = body.get_u16()?;
    let status = ConnectionAttemptStatus::from_repr(raw).ok_or_else(|| {
      LlrpError::malformed("ConnectionAttemptEvent", format!("unknown status {}", raw))
    })?;
    body.expect_end()?;
    Ok(Some(ConnectionAttemptEvent { status }))
  }
}

/// 13.2.6.12 ConnectionCloseEvent parameter (empty body).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionCloseEvent;

impl ConnectionCloseEvent {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(body) = r.try_tlv(ParamType::ConnectionCloseEvent)? else {
      return Ok(None);
    };
    body.expect_end()?;
    Ok(Some(ConnectionCloseEvent))
  }
}

/// Decoded body of READER_EVENT_NOTIFICATION (13.1.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderEventNotification {
  pub data: ReaderEventNotificationData,
}

impl ReaderEventNotification {

  pub fn decode(r: &mut Reader) -> Result<Self> {
    let data = ReaderEventNotificationData::decode_required(r)?;
    r.expect_consumed()?;
    Ok(ReaderEventNotification { data })
  }
}

#[cfg(test)]
mod tests {
  use bytes::{BufMut, BytesMut};

  use super::*;
  use crate::buffer::encode_tlv;

  fn utc(buf: &mut BytesMut, microseconds: u64) {
    encode_tlv(buf, ParamType::UTCTimestamp, |buf| buf.put_u64(microseconds));
  }

  #[test]
  fn decodes_the_connection_greeting() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::ReaderEventNotificationData, |buf| {
      utc(buf, 1_700_000_000_000_000);
      encode_tlv(buf, ParamType::ConnectionAttemptEvent, |buf| buf.put_u16(0));
    });

    let mut r = Reader::new(&buf);
    let event = ReaderEventNotification::decode(&mut r).unwrap();
    assert_eq!(event.data.timestamp.microseconds(), 1_700_000_000_000_000);
    assert_eq!(
      event.data.connection_attempt_event,
      Some(ConnectionAttemptEvent { status: ConnectionAttemptStatus::Success })
    );
    assert!(event.data.antenna_event.is_none());
  }

  #[test]
  fn uptime_substitutes_for_a_missing_utc_clock() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::ReaderEventNotificationData, |buf| {
      encode_tlv(buf, ParamType::Uptime, |buf| buf.put_u64(55));
      encode_tlv(buf, ParamType::AntennaEvent, |buf| {
        buf.put_u8(1);
        buf.put_u16(4);
      });
    });

    let data = ReaderEventNotificationData::decode(&mut Reader::new(&buf))
      .unwrap()
      .unwrap();
    assert_eq!(data.timestamp, EventTimestamp::Uptime(Uptime { microseconds: 55 }));
    assert_eq!(
      data.antenna_event,
      Some(AntennaEvent { event_type: AntennaEventType::Connected, antenna_id: 4 })
    );
  }

  #[test]
  fn a_timestamp_is_mandatory() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::ReaderEventNotificationData, |buf| {
      encode_tlv(buf, ParamType::ConnectionCloseEvent, |_| {});
    });
    assert!(matches!(
      ReaderEventNotificationData::decode(&mut Reader::new(&buf)),
      Err(LlrpError::MissingRequired("UTCTimestamp or Uptime"))
    ));
  }

  #[test]
  fn trailing_bytes_after_the_last_event_are_rejected() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::ReaderEventNotificationData, |buf| {
      utc(buf, 1);
      buf.put_u8(0x00); // junk the original decoder let slip through
    });
    assert!(matches!(
      ReaderEventNotificationData::decode(&mut Reader::new(&buf)),
      Err(LlrpError::TrailingBytes(1))
    ));
  }

  #[test]
  fn rospec_event_decodes_its_type() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::ROSpecEvent, |buf| {
      buf.put_u8(1);
      buf.put_u32(7);
      buf.put_u32(0);
    });
    let event = ROSpecEvent::decode(&mut Reader::new(&buf)).unwrap().unwrap();
    assert_eq!(event.event_type, ROSpecEventType::End);
    assert_eq!(event.rospec_id, 7);
  }
}

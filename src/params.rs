use std::fmt;

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};
use log::debug;

use crate::buffer::{encode_tlv, flag, flag_bit, Reader};
use crate::error::{LlrpError, Result};
use crate::rospec::{AntennaConfiguration, ROReportSpec};
use crate::types::{ParamType, StatusCode};

const HOLD_EVENTS_BIT: u8 = 7;
const CONNECTED_BIT: u8 = 7;
const GPO_DATA_BIT: u8 = 7;
const GPI_CONFIG_BIT: u8 = 7;
const NOTIFICATION_STATE_BIT: u8 = 7;

/// 14.2.1 LLRPStatus parameter.
///
/// Carried by every response-style message. A non-`Success` code is a
/// reader-side verdict, not a codec failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LLRPStatus {
  pub status_code       : StatusCode,
  pub error_description : String,
  pub field_error       : Option<FieldError>,
  pub parameter_error   : Option<ParameterError>,
}

impl LLRPStatus {

  pub fn success() -> Self {
    LLRPStatus {
      status_code: StatusCode::Success,
      error_description: String::new(),
      field_error: None,
      parameter_error: None,
    }
  }

  pub fn is_success(&self) -> bool {
    self.status_code == StatusCode::Success
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::LLRPStatus)? else {
      return Ok(None);
    };

    let code = body.get_u16()?;
    let status_code = StatusCode::from_repr(code).ok_or_else(|| {
      LlrpError::malformed("LLRPStatus", format!("unknown status code {}", code))
    })?;

    let desc_len = body.get_u16()? as usize;
    let error_description =
      String::from_utf8_lossy(body.get_bytes(desc_len)?).into_owned();

    let field_error = FieldError::decode(&mut body)?;
    let parameter_error = ParameterError::decode(&mut body)?;
    body.expect_end()?;

    debug!("LLRPStatus: {} \"{}\"", status_code, error_description);

    Ok(Some(LLRPStatus {
      status_code,
      error_description,
      field_error,
      parameter_error,
    }))
  }

  pub fn decode_required(r: &mut Reader) -> Result<Self> {
    Self::decode(r)?.ok_or(LlrpError::MissingRequired("LLRPStatus"))
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::LLRPStatus, |buf| {
      buf.put_u16(self.status_code as u16);
      buf.put_u16(self.error_description.len() as u16);
      buf.extend_from_slice(self.error_description.as_bytes());
      if let Some(fe) = &self.field_error {
        fe.encode(buf);
      }
      if let Some(pe) = &self.parameter_error {
        pe.encode(buf);
      }
    });
  }
}

/// 14.2.1.1 FieldError parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
  pub field_num  : u16,
  pub error_code : u16,
}

impl FieldError {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::FieldError)? else {
      return Ok(None);
    };
    let field_num = body.get_u16()?;
    let error_code = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(FieldError { field_num, error_code }))
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::FieldError, |buf| {
      buf.put_u16(self.field_num);
      buf.put_u16(self.error_code);
    });
  }
}

/// 14.2.1.2 ParameterError parameter; self-recursive through the boxed
/// inner error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterError {
  pub parameter_type  : u16,
  pub error_code      : u16,
  pub field_error     : Option<FieldError>,
  pub parameter_error : Option<Box<ParameterError>>,
}

impl ParameterError {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ParameterError)? else {
      return Ok(None);
    };
    let parameter_type = body.get_u16()?;
    let error_code = body.get_u16()?;
    let field_error = FieldError::decode(&mut body)?;
    let parameter_error = ParameterError::decode(&mut body)?.map(Box::new);
    body.expect_end()?;
    Ok(Some(ParameterError {
      parameter_type,
      error_code,
      field_error,
      parameter_error,
    }))
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::ParameterError, |buf| {
      buf.put_u16(self.parameter_type);
      buf.put_u16(self.error_code);
      if let Some(fe) = &self.field_error {
        fe.encode(buf);
      }
      if let Some(pe) = &self.parameter_error {
        pe.encode(buf);
      }
    });
  }
}

/// 7.1.3.1.1.1 UTCTimestamp: microseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UTCTimestamp {
  pub microseconds: u64,
}

impl UTCTimestamp {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::UTCTimestamp)? else {
      return Ok(None);
    };
    let microseconds = body.get_u64()?;
    body.expect_end()?;
    Ok(Some(UTCTimestamp { microseconds }))
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::UTCTimestamp, |buf| buf.put_u64(self.microseconds));
  }

  pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(self.microseconds as i64)
  }
}

impl fmt::Display for UTCTimestamp {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.as_datetime() {
      Some(dt) => write!(f, "{}", dt),
      None => write!(f, "{}us", self.microseconds),
    }
  }
}

/// 7.1.3.1.1.2 Uptime: microseconds since reader boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uptime {
  pub microseconds: u64,
}

impl Uptime {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::Uptime)? else {
      return Ok(None);
    };
    let microseconds = body.get_u64()?;
    body.expect_end()?;
    Ok(Some(Uptime { microseconds }))
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::Uptime, |buf| buf.put_u64(self.microseconds));
  }
}

/// 17.2.6.2 Identification parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
  pub id_type   : u8,
  pub reader_id : Vec<u8>,
}

impl Identification {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::Identification)? else {
      return Ok(None);
    };
    let id_type = body.get_u8()?;
    let byte_count = body.get_u16()? as usize;
    let reader_id = body.get_bytes(byte_count)?.to_vec();
    body.expect_end()?;
    Ok(Some(Identification { id_type, reader_id }))
  }
}

/// 17.2.6.3 GPOWriteData parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GPOWriteData {
  pub gpo_port_number : u16,
  pub gpo_data        : bool,
}

impl GPOWriteData {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::GPOWriteData)? else {
      return Ok(None);
    };
    let gpo_port_number = body.get_u16()?;
    let gpo_data = flag(body.get_u8()?, GPO_DATA_BIT);
    body.expect_end()?;
    Ok(Some(GPOWriteData { gpo_port_number, gpo_data }))
  }
}

/// 17.2.6.4 KeepaliveSpec parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveSpec {
  pub trigger_type     : u8,
  pub time_interval_ms : u32,
}

impl KeepaliveSpec {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::KeepaliveSpec)? else {
      return Ok(None);
    };
    let trigger_type = body.get_u8()?;
    let time_interval_ms = body.get_u32()?;
    body.expect_end()?;
    Ok(Some(KeepaliveSpec { trigger_type, time_interval_ms }))
  }
}

/// 17.2.6.5 AntennaProperties parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AntennaProperties {
  pub connected    : bool,
  pub antenna_id   : u16,
  pub antenna_gain : i16,
}

impl AntennaProperties {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::AntennaProperties)? else {
      return Ok(None);
    };
    let connected = flag(body.get_u8()?, CONNECTED_BIT);
    let antenna_id = body.get_u16()?;
    let antenna_gain = body.get_u16()? as i16;
    body.expect_end()?;
    Ok(Some(AntennaProperties { connected, antenna_id, antenna_gain }))
  }
}

/// 17.2.6.9 GPIPortCurrentState parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GPIPortCurrentState {
  pub gpi_port_num : u16,
  pub gpi_config   : bool,
  pub gpi_state    : u8,
}

impl GPIPortCurrentState {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::GPIPortCurrentState)? else {
      return Ok(None);
    };
    let gpi_port_num = body.get_u16()?;
    let gpi_config = flag(body.get_u8()?, GPI_CONFIG_BIT);
    let gpi_state = body.get_u8()?;
    body.expect_end()?;
    Ok(Some(GPIPortCurrentState { gpi_port_num, gpi_config, gpi_state }))
  }
}

/// 17.2.6.10 EventsAndReports parameter; the one SET_READER_CONFIG
/// payload this codec emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventsAndReports {
  pub hold_events_and_reports_upon_reconnect: bool,
}

impl EventsAndReports {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::EventsAndReports)? else {
      return Ok(None);
    };
    let hold = flag(body.get_u8()?, HOLD_EVENTS_BIT);
    body.expect_end()?;
    Ok(Some(EventsAndReports { hold_events_and_reports_upon_reconnect: hold }))
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::EventsAndReports, |buf| {
      buf.put_u8(flag_bit(self.hold_events_and_reports_upon_reconnect, HOLD_EVENTS_BIT));
    });
  }
}

/// 17.2.6.1 LLRPConfigurationStateValue parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LLRPConfigurationStateValue {
  pub state_value: u32,
}

impl LLRPConfigurationStateValue {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::LLRPConfigurationStateValue)? else {
      return Ok(None);
    };
    let state_value = body.get_u32()?;
    body.expect_end()?;
    Ok(Some(LLRPConfigurationStateValue { state_value }))
  }
}

/// 17.2.7.5.1 EventNotificationState parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventNotificationState {
  pub event_type         : u16,
  pub notification_state : bool,
}

impl EventNotificationState {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::EventNotificationState)? else {
      return Ok(None);
    };
    let event_type = body.get_u16()?;
    let notification_state = flag(body.get_u8()?, NOTIFICATION_STATE_BIT);
    body.expect_end()?;
    Ok(Some(EventNotificationState { event_type, notification_state }))
  }
}

/// 17.2.7.5 ReaderEventNotificationSpec parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderEventNotificationSpec {
  pub states: Vec<EventNotificationState>,
}

impl ReaderEventNotificationSpec {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ReaderEventNotificationSpec)? else {
      return Ok(None);
    };
    let mut states = Vec::new();
    while let Some(state) = EventNotificationState::decode(&mut body)? {
      states.push(state);
    }
    body.expect_end()?;
    Ok(Some(ReaderEventNotificationSpec { states }))
  }
}

/// 14.2.3 AccessReportSpec parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessReportSpec {
  pub access_report_trigger: u8,
}

impl AccessReportSpec {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::AccessReportSpec)? else {
      return Ok(None);
    };
    let access_report_trigger = body.get_u8()?;
    body.expect_end()?;
    Ok(Some(AccessReportSpec { access_report_trigger }))
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::AccessReportSpec, |buf| {
      buf.put_u8(self.access_report_trigger);
    });
  }
}

/// Decoded body of GET_READER_CONFIG_RESPONSE (17.1.41): status plus the
/// reader's current configuration parameters in their mandated order.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
  pub status                         : LLRPStatus,
  pub identification                 : Option<Identification>,
  pub antenna_properties             : Vec<AntennaProperties>,
  pub antenna_configurations         : Vec<AntennaConfiguration>,
  pub reader_event_notification_spec : Option<ReaderEventNotificationSpec>,
  pub ro_report_spec                 : Option<ROReportSpec>,
  pub access_report_spec             : Option<AccessReportSpec>,
  pub configuration_state            : Option<LLRPConfigurationStateValue>,
  pub keepalive_spec                 : Option<KeepaliveSpec>,
  pub gpi_port_states                : Vec<GPIPortCurrentState>,
  pub gpo_write_data                 : Vec<GPOWriteData>,
  pub events_and_reports             : Option<EventsAndReports>,
}

impl ReaderConfig {

  pub fn decode(r: &mut Reader) -> Result<Self> {
    let status = LLRPStatus::decode_required(r)?;

    let identification = Identification::decode(r)?;

    let mut antenna_properties = Vec::new();
    while let Some(props) = AntennaProperties::decode(r)? {
      antenna_properties.push(props);
    }

    let mut antenna_configurations = Vec::new();
    while let Some(conf) = AntennaConfiguration::decode(r)? {
      antenna_configurations.push(conf);
    }

    let reader_event_notification_spec = ReaderEventNotificationSpec::decode(r)?;
    let ro_report_spec = ROReportSpec::decode(r)?;
    let access_report_spec = AccessReportSpec::decode(r)?;
    let configuration_state = LLRPConfigurationStateValue::decode(r)?;
    let keepalive_spec = KeepaliveSpec::decode(r)?;

    let mut gpi_port_states = Vec::new();
    while let Some(state) = GPIPortCurrentState::decode(r)? {
      gpi_port_states.push(state);
    }

    let mut gpo_write_data = Vec::new();
    while let Some(data) = GPOWriteData::decode(r)? {
      gpo_write_data.push(data);
    }

    let events_and_reports = EventsAndReports::decode(r)?;
    r.expect_consumed()?;

    Ok(ReaderConfig {
      status,
      identification,
      antenna_properties,
      antenna_configurations,
      reader_event_notification_spec,
      ro_report_spec,
      access_report_spec,
      configuration_state,
      keepalive_spec,
      gpi_port_states,
      gpo_write_data,
      events_and_reports,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // "011f 0008 0000 0000": Success, empty description, no sub-errors.
  const STATUS_SUCCESS: [u8; 8] = [0x01, 0x1f, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00];

  #[test]
  fn decodes_a_success_status() {
    let mut r = Reader::new(&STATUS_SUCCESS);
    let status = LLRPStatus::decode_required(&mut r).unwrap();
    assert_eq!(status.status_code, StatusCode::Success);
    assert!(status.error_description.is_empty());
    assert!(status.field_error.is_none());
    assert!(status.parameter_error.is_none());
    assert!(r.is_empty());
  }

  #[test]
  fn status_round_trips() {
    let status = LLRPStatus {
      status_code: StatusCode::FieldError,
      error_description: "bad Tari".to_string(),
      field_error: Some(FieldError { field_num: 4, error_code: 101 }),
      parameter_error: None,
    };
    let mut buf = BytesMut::new();
    status.encode(&mut buf);

    let mut r = Reader::new(&buf);
    let decoded = LLRPStatus::decode_required(&mut r).unwrap();
    assert_eq!(decoded, status);

    let mut again = BytesMut::new();
    decoded.encode(&mut again);
    assert_eq!(buf, again);
  }

  #[test]
  fn status_rejects_trailing_bytes() {
    let mut data = STATUS_SUCCESS.to_vec();
    data[3] = 0x09; // grow the declared length past the known children
    data.push(0xff);
    let mut r = Reader::new(&data);
    assert!(matches!(
      LLRPStatus::decode(&mut r),
      Err(LlrpError::TrailingBytes(1))
    ));
  }

  #[test]
  fn nested_parameter_error_decodes() {
    let status = LLRPStatus {
      status_code: StatusCode::PParameterError,
      error_description: String::new(),
      field_error: None,
      parameter_error: Some(ParameterError {
        parameter_type: 177,
        error_code: 200,
        field_error: None,
        parameter_error: Some(Box::new(ParameterError {
          parameter_type: 183,
          error_code: 207,
          field_error: None,
          parameter_error: None,
        })),
      }),
    };
    let mut buf = BytesMut::new();
    status.encode(&mut buf);
    let decoded = LLRPStatus::decode_required(&mut Reader::new(&buf)).unwrap();
    assert_eq!(decoded, status);
  }

  #[test]
  fn events_and_reports_round_trips() {
    let param = EventsAndReports { hold_events_and_reports_upon_reconnect: true };
    let mut buf = BytesMut::new();
    param.encode(&mut buf);
    assert_eq!(&buf[..], &[0x00, 0xe2, 0x00, 0x05, 0x80]);
    let decoded = EventsAndReports::decode(&mut Reader::new(&buf)).unwrap().unwrap();
    assert_eq!(decoded, param);
  }

  #[test]
  fn utc_timestamp_converts_to_datetime() {
    let ts = UTCTimestamp { microseconds: 1_700_000_000_000_000 };
    let dt = ts.as_datetime().unwrap();
    assert_eq!(dt.timestamp(), 1_700_000_000);
  }
}

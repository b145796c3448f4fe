use bytes::{BufMut, BytesMut};
use log::debug;

use crate::buffer::{encode_tlv, flag, flag_bit, put_bitstring, Reader};
use crate::capabilities::ReaderMode;
use crate::error::{LlrpError, Result};
use crate::params::UTCTimestamp;
use crate::types::{
  AirProtocol, ParamType, ROReportTrigger, ROSpecState, StartTriggerType, StopTriggerType,
};

const PRIORITY_MASK: u8 = 0x7F;
const STATE_AWARE_BIT: u8 = 7;
const SESSION_SHIFT: u8 = 6;
const GPI_EVENT_BIT: u8 = 7;
const MB_SHIFT: u8 = 6;
const TRUNCATE_SHIFT: u8 = 6;

// TagReportContentSelector enable bits, MSB first (14.2.1.1).
const ENABLE_ROSPEC_ID_BIT: u8 = 15;
const ENABLE_SPEC_INDEX_BIT: u8 = 14;
const ENABLE_INVENTORY_PARAMETER_SPEC_ID_BIT: u8 = 13;
const ENABLE_ANTENNA_ID_BIT: u8 = 12;
const ENABLE_CHANNEL_INDEX_BIT: u8 = 11;
const ENABLE_PEAK_RSSI_BIT: u8 = 10;
const ENABLE_FIRST_SEEN_TIMESTAMP_BIT: u8 = 9;
const ENABLE_LAST_SEEN_TIMESTAMP_BIT: u8 = 8;
const ENABLE_TAG_SEEN_COUNT_BIT: u8 = 7;
const ENABLE_ACCESS_SPEC_ID_BIT: u8 = 6;

/// 10.2.1 ROSpec parameter: one reader operation, bounded by start/stop
/// triggers, running one or more antenna-inventory specs and reporting
/// per its report spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ROSpec {
  pub rospec_id     : u32,
  pub priority      : u8,
  pub current_state : ROSpecState,
  pub boundary_spec : ROBoundarySpec,
  pub ai_specs      : Vec<AISpec>,
  pub report_spec   : Option<ROReportSpec>,
}

impl ROSpec {

  pub fn builder(rospec_id: u32, reader_mode: ReaderMode) -> ROSpecBuilder {
    ROSpecBuilder::new(rospec_id, reader_mode)
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::ROSpec, |buf| {
      buf.put_u32(self.rospec_id);
      buf.put_u8(self.priority & PRIORITY_MASK);
      buf.put_u8(self.current_state as u8);
      self.boundary_spec.encode(buf);
      for ai_spec in &self.ai_specs {
        ai_spec.encode(buf);
      }
      if let Some(report_spec) = &self.report_spec {
        report_spec.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ROSpec)? else {
      return Ok(None);
    };

    let rospec_id = body.get_u32()?;
    let priority = body.get_u8()? & PRIORITY_MASK;
    let state = body.get_u8()?;
    let current_state = ROSpecState::from_repr(state).ok_or_else(|| {
      LlrpError::malformed("ROSpec", format!("unknown state {}", state))
    })?;

    let boundary_spec = ROBoundarySpec::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("ROBoundarySpec"))?;

    let mut ai_specs = Vec::new();
    while let Some(ai_spec) = AISpec::decode(&mut body)? {
      ai_specs.push(ai_spec);
    }
    if ai_specs.is_empty() {
      return Err(LlrpError::MissingRequired("AISpec"));
    }
    if body.peek_tlv_type() == Some(ParamType::RFSurveySpec as u16) {
      return Err(LlrpError::Unsupported("RFSurveySpec".to_string()));
    }

    let report_spec = ROReportSpec::decode(&mut body)?;
    body.expect_end()?;

    debug!("decoded ROSpec {} ({:?})", rospec_id, current_state);

    Ok(Some(ROSpec {
      rospec_id,
      priority,
      current_state,
      boundary_spec,
      ai_specs,
      report_spec,
    }))
  }

  pub fn decode_required(r: &mut Reader) -> Result<Self> {
    Self::decode(r)?.ok_or(LlrpError::MissingRequired("ROSpec"))
  }
}

/// 10.2.1.1 ROBoundarySpec parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ROBoundarySpec {
  pub start_trigger : ROSpecStartTrigger,
  pub stop_trigger  : ROSpecStopTrigger,
}

impl ROBoundarySpec {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::ROBoundarySpec, |buf| {
      self.start_trigger.encode(buf);
      self.stop_trigger.encode(buf);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ROBoundarySpec)? else {
      return Ok(None);
    };
    let start_trigger = ROSpecStartTrigger::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("ROSpecStartTrigger"))?;
    let stop_trigger = ROSpecStopTrigger::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("ROSpecStopTrigger"))?;
    body.expect_end()?;
    Ok(Some(ROBoundarySpec { start_trigger, stop_trigger }))
  }
}

/// 10.2.1.1.1 ROSpecStartTrigger parameter. The periodic and GPI value
/// parameters ride along only for their respective trigger types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ROSpecStartTrigger {
  pub trigger_type : StartTriggerType,
  pub periodic     : Option<PeriodicTriggerValue>,
  pub gpi          : Option<GPITriggerValue>,
}

impl ROSpecStartTrigger {

  pub fn immediate() -> Self {
    ROSpecStartTrigger {
      trigger_type: StartTriggerType::Immediate,
      periodic: None,
      gpi: None,
    }
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::ROSpecStartTrigger, |buf| {
      buf.put_u8(self.trigger_type as u8);
      if let Some(periodic) = &self.periodic {
        periodic.encode(buf);
      }
      if let Some(gpi) = &self.gpi {
        gpi.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ROSpecStartTrigger)? else {
      return Ok(None);
    };
    let raw = body.get_u8()?;
    let trigger_type = StartTriggerType::from_repr(raw).ok_or_else(|| {
      LlrpError::malformed("ROSpecStartTrigger", format!("unknown trigger type {}", raw))
    })?;
    let periodic = PeriodicTriggerValue::decode(&mut body)?;
    let gpi = GPITriggerValue::decode(&mut body)?;
    body.expect_end()?;
    Ok(Some(ROSpecStartTrigger { trigger_type, periodic, gpi }))
  }
}

/// 10.2.1.1.1.1 PeriodicTriggerValue parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodicTriggerValue {
  pub offset_ms     : u32,
  pub period_ms     : u32,
  pub utc_timestamp : Option<UTCTimestamp>,
}

impl PeriodicTriggerValue {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::PeriodicTriggerValue, |buf| {
      buf.put_u32(self.offset_ms);
      buf.put_u32(self.period_ms);
      if let Some(ts) = &self.utc_timestamp {
        ts.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::PeriodicTriggerValue)? else {
      return Ok(None);
    };
    let offset_ms = body.get_u32()?;
    let period_ms = body.get_u32()?;
    let utc_timestamp = UTCTimestamp::decode(&mut body)?;
    body.expect_end()?;
    Ok(Some(PeriodicTriggerValue { offset_ms, period_ms, utc_timestamp }))
  }
}

/// 10.2.1.1.1.2 GPITriggerValue parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GPITriggerValue {
  pub gpi_port_num : u16,
  pub gpi_event    : bool,
  pub timeout_ms   : u32,
}

impl GPITriggerValue {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::GPITriggerValue, |buf| {
      buf.put_u16(self.gpi_port_num);
      buf.put_u8(flag_bit(self.gpi_event, GPI_EVENT_BIT));
      buf.put_u32(self.timeout_ms);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::GPITriggerValue)? else {
      return Ok(None);
    };
    let gpi_port_num = body.get_u16()?;
    let gpi_event = flag(body.get_u8()?, GPI_EVENT_BIT);
    let timeout_ms = body.get_u32()?;
    body.expect_end()?;
    Ok(Some(GPITriggerValue { gpi_port_num, gpi_event, timeout_ms }))
  }
}

/// 10.2.1.1.2 ROSpecStopTrigger parameter. The duration field is
/// meaningful only for the Duration trigger type but always occupies its
/// four bytes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ROSpecStopTrigger {
  pub trigger_type : StopTriggerType,
  pub duration_ms  : u32,
  pub gpi          : Option<GPITriggerValue>,
}

impl ROSpecStopTrigger {

  pub fn null() -> Self {
    ROSpecStopTrigger {
      trigger_type: StopTriggerType::Null,
      duration_ms: 0,
      gpi: None,
    }
  }

  pub fn duration(ms: u32) -> Self {
    ROSpecStopTrigger {
      trigger_type: StopTriggerType::Duration,
      duration_ms: ms,
      gpi: None,
    }
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::ROSpecStopTrigger, |buf| {
      buf.put_u8(self.trigger_type as u8);
      buf.put_u32(self.duration_ms);
      if let Some(gpi) = &self.gpi {
        gpi.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ROSpecStopTrigger)? else {
      return Ok(None);
    };
    let raw = body.get_u8()?;
    let trigger_type = StopTriggerType::from_repr(raw).ok_or_else(|| {
      LlrpError::malformed("ROSpecStopTrigger", format!("unknown trigger type {}", raw))
    })?;
    let duration_ms = body.get_u32()?;
    let gpi = GPITriggerValue::decode(&mut body)?;
    body.expect_end()?;
    Ok(Some(ROSpecStopTrigger { trigger_type, duration_ms, gpi }))
  }
}

/// 10.2.2 AISpec parameter. Antenna id zero means "all antennas".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AISpec {
  pub antenna_ids    : Vec<u16>,
  pub stop_trigger   : AISpecStopTrigger,
  pub inventory_spec : InventoryParameterSpec,
}

impl AISpec {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::AISpec, |buf| {
      buf.put_u16(self.antenna_ids.len() as u16);
      for antenna_id in &self.antenna_ids {
        buf.put_u16(*antenna_id);
      }
      self.stop_trigger.encode(buf);
      self.inventory_spec.encode(buf);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::AISpec)? else {
      return Ok(None);
    };
    let antenna_count = body.get_u16()? as usize;
    let mut antenna_ids = Vec::with_capacity(antenna_count);
    for _ in 0..antenna_count {
      antenna_ids.push(body.get_u16()?);
    }
    let stop_trigger = AISpecStopTrigger::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("AISpecStopTrigger"))?;
    let inventory_spec = InventoryParameterSpec::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("InventoryParameterSpec"))?;
    body.expect_end()?;
    Ok(Some(AISpec { antenna_ids, stop_trigger, inventory_spec }))
  }
}

/// 10.2.2.1 AISpecStopTrigger parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AISpecStopTrigger {
  pub trigger_type : StopTriggerType,
  pub duration_ms  : u32,
}

impl AISpecStopTrigger {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::AISpecStopTrigger, |buf| {
      buf.put_u8(self.trigger_type as u8);
      buf.put_u32(self.duration_ms);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::AISpecStopTrigger)? else {
      return Ok(None);
    };
    let raw = body.get_u8()?;
    let trigger_type = StopTriggerType::from_repr(raw).ok_or_else(|| {
      LlrpError::malformed("AISpecStopTrigger", format!("unknown trigger type {}", raw))
    })?;
    let duration_ms = body.get_u32()?;
    body.expect_end()?;
    Ok(Some(AISpecStopTrigger { trigger_type, duration_ms }))
  }
}

/// 10.2.2.2 InventoryParameterSpec parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryParameterSpec {
  pub spec_id                : u16,
  pub protocol_id            : AirProtocol,
  pub antenna_configurations : Vec<AntennaConfiguration>,
}

impl InventoryParameterSpec {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::InventoryParameterSpec, |buf| {
      buf.put_u16(self.spec_id);
      buf.put_u8(self.protocol_id as u8);
      for conf in &self.antenna_configurations {
        conf.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::InventoryParameterSpec)? else {
      return Ok(None);
    };
    let spec_id = body.get_u16()?;
    let raw = body.get_u8()?;
    let protocol_id = AirProtocol::from_repr(raw).ok_or_else(|| {
      LlrpError::malformed("InventoryParameterSpec", format!("unknown protocol {}", raw))
    })?;
    let mut antenna_configurations = Vec::new();
    while let Some(conf) = AntennaConfiguration::decode(&mut body)? {
      antenna_configurations.push(conf);
    }
    body.expect_end()?;
    Ok(Some(InventoryParameterSpec { spec_id, protocol_id, antenna_configurations }))
  }
}

/// 13.2.6 AntennaConfiguration parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntennaConfiguration {
  pub antenna_id        : u16,
  pub rf_receiver       : Option<RFReceiver>,
  pub rf_transmitter    : Option<RFTransmitter>,
  pub inventory_command : Option<C1G2InventoryCommand>,
}

impl AntennaConfiguration {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::AntennaConfiguration, |buf| {
      buf.put_u16(self.antenna_id);
      if let Some(receiver) = &self.rf_receiver {
        receiver.encode(buf);
      }
      if let Some(transmitter) = &self.rf_transmitter {
        transmitter.encode(buf);
      }
      if let Some(command) = &self.inventory_command {
        command.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::AntennaConfiguration)? else {
      return Ok(None);
    };
    let antenna_id = body.get_u16()?;
    let rf_receiver = RFReceiver::decode(&mut body)?;
    let rf_transmitter = RFTransmitter::decode(&mut body)?;
    let inventory_command = C1G2InventoryCommand::decode(&mut body)?;
    body.expect_end()?;
    Ok(Some(AntennaConfiguration {
      antenna_id,
      rf_receiver,
      rf_transmitter,
      inventory_command,
    }))
  }
}

/// 13.2.6.1 RFReceiver parameter: index into the receive sensitivity
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RFReceiver {
  pub receiver_sensitivity: u16,
}

impl RFReceiver {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::RFReceiver, |buf| {
      buf.put_u16(self.receiver_sensitivity);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::RFReceiver)? else {
      return Ok(None);
    };
    let receiver_sensitivity = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(RFReceiver { receiver_sensitivity }))
  }
}

/// 13.2.6.2 RFTransmitter parameter: hop table, channel, and an index
/// into the transmit power table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RFTransmitter {
  pub hop_table_id   : u16,
  pub channel_index  : u16,
  pub transmit_power : u16,
}

impl RFTransmitter {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::RFTransmitter, |buf| {
      buf.put_u16(self.hop_table_id);
      buf.put_u16(self.channel_index);
      buf.put_u16(self.transmit_power);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::RFTransmitter)? else {
      return Ok(None);
    };
    let hop_table_id = body.get_u16()?;
    let channel_index = body.get_u16()?;
    let transmit_power = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(RFTransmitter { hop_table_id, channel_index, transmit_power }))
  }
}

/// 16.3.1.2.1 C1G2InventoryCommand parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1G2InventoryCommand {
  pub tag_inventory_state_aware : bool,
  pub filter                    : Option<C1G2Filter>,
  pub rf_control                : Option<C1G2RFControl>,
  pub singulation_control       : Option<C1G2SingulationControl>,
}

impl C1G2InventoryCommand {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2InventoryCommand, |buf| {
      buf.put_u8(flag_bit(self.tag_inventory_state_aware, STATE_AWARE_BIT));
      if let Some(filter) = &self.filter {
        filter.encode(buf);
      }
      if let Some(rf_control) = &self.rf_control {
        rf_control.encode(buf);
      }
      if let Some(singulation) = &self.singulation_control {
        singulation.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2InventoryCommand)? else {
      return Ok(None);
    };
    let tag_inventory_state_aware = flag(body.get_u8()?, STATE_AWARE_BIT);
    let filter = C1G2Filter::decode(&mut body)?;
    let rf_control = C1G2RFControl::decode(&mut body)?;
    let singulation_control = C1G2SingulationControl::decode(&mut body)?;
    body.expect_end()?;
    Ok(Some(C1G2InventoryCommand {
      tag_inventory_state_aware,
      filter,
      rf_control,
      singulation_control,
    }))
  }
}

/// 16.3.1.2.1.1 C1G2Filter parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1G2Filter {
  pub truncate_action      : u8,
  pub mask                 : C1G2TagInventoryMask,
  pub state_aware_action   : Option<C1G2TagInventoryStateAwareFilterAction>,
  pub state_unaware_action : Option<C1G2TagInventoryStateUnawareFilterAction>,
}

impl C1G2Filter {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2Filter, |buf| {
      buf.put_u8((self.truncate_action & 0x3) << TRUNCATE_SHIFT);
      self.mask.encode(buf);
      if let Some(action) = &self.state_aware_action {
        action.encode(buf);
      }
      if let Some(action) = &self.state_unaware_action {
        action.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2Filter)? else {
      return Ok(None);
    };
    let truncate_action = body.get_u8()? >> TRUNCATE_SHIFT;
    let mask = C1G2TagInventoryMask::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("C1G2TagInventoryMask"))?;
    let state_aware_action = C1G2TagInventoryStateAwareFilterAction::decode(&mut body)?;
    let state_unaware_action = C1G2TagInventoryStateUnawareFilterAction::decode(&mut body)?;
    body.expect_end()?;
    Ok(Some(C1G2Filter {
      truncate_action,
      mask,
      state_aware_action,
      state_unaware_action,
    }))
  }
}

/// 16.3.1.2.1.1.1 C1G2TagInventoryMask parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1G2TagInventoryMask {
  pub mb             : u8,
  pub pointer        : u16,
  pub mask_bit_count : u16,
  pub tag_mask       : Vec<u8>,
}

impl C1G2TagInventoryMask {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2TagInventoryMask, |buf| {
      buf.put_u8((self.mb & 0x3) << MB_SHIFT);
      buf.put_u16(self.pointer);
      buf.put_u16(self.mask_bit_count);
      put_bitstring(buf, &self.tag_mask, self.mask_bit_count as usize);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2TagInventoryMask)? else {
      return Ok(None);
    };
    let mb = body.get_u8()? >> MB_SHIFT;
    let pointer = body.get_u16()?;
    let mask_bit_count = body.get_u16()?;
    let tag_mask = body.get_bits(mask_bit_count as usize)?.to_vec();
    body.expect_end()?;
    Ok(Some(C1G2TagInventoryMask { mb, pointer, mask_bit_count, tag_mask }))
  }
}

/// 16.3.1.2.1.1.2 state-aware filter action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct C1G2TagInventoryStateAwareFilterAction {
  pub target : u8,
  pub action : u8,
}

impl C1G2TagInventoryStateAwareFilterAction {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2TagInventoryStateAwareFilterAction, |buf| {
      buf.put_u8(self.target);
      buf.put_u8(self.action);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2TagInventoryStateAwareFilterAction)? else {
      return Ok(None);
    };
    let target = body.get_u8()?;
    let action = body.get_u8()?;
    body.expect_end()?;
    Ok(Some(C1G2TagInventoryStateAwareFilterAction { target, action }))
  }
}

/// 16.3.1.2.1.1.3 state-unaware filter action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct C1G2TagInventoryStateUnawareFilterAction {
  pub action: u8,
}

impl C1G2TagInventoryStateUnawareFilterAction {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2TagInventoryStateUnawareFilterAction, |buf| {
      buf.put_u8(self.action);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2TagInventoryStateUnawareFilterAction)? else {
      return Ok(None);
    };
    let action = body.get_u8()?;
    body.expect_end()?;
    Ok(Some(C1G2TagInventoryStateUnawareFilterAction { action }))
  }
}

/// 16.3.1.2.1.2 C1G2RFControl parameter: mode-table index plus Tari in
/// nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct C1G2RFControl {
  pub mode_index : u16,
  pub tari       : u16,
}

impl C1G2RFControl {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2RFControl, |buf| {
      buf.put_u16(self.mode_index);
      buf.put_u16(self.tari);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2RFControl)? else {
      return Ok(None);
    };
    let mode_index = body.get_u16()?;
    let tari = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(C1G2RFControl { mode_index, tari }))
  }
}

/// 16.3.1.2.1.3 C1G2SingulationControl parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct C1G2SingulationControl {
  pub session          : u8,
  pub tag_population   : u16,
  pub tag_transit_time : u32,
}

impl C1G2SingulationControl {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2SingulationControl, |buf| {
      buf.put_u8((self.session & 0x3) << SESSION_SHIFT);
      buf.put_u16(self.tag_population);
      buf.put_u32(self.tag_transit_time);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2SingulationControl)? else {
      return Ok(None);
    };
    let session = body.get_u8()? >> SESSION_SHIFT;
    let tag_population = body.get_u16()?;
    let tag_transit_time = body.get_u32()?;
    body.expect_end()?;
    Ok(Some(C1G2SingulationControl { session, tag_population, tag_transit_time }))
  }
}

/// 14.2.1 ROReportSpec parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ROReportSpec {
  pub ro_report_trigger : ROReportTrigger,
  pub n                 : u16,
  pub content_selector  : TagReportContentSelector,
}

impl ROReportSpec {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::ROReportSpec, |buf| {
      buf.put_u8(self.ro_report_trigger as u8);
      buf.put_u16(self.n);
      self.content_selector.encode(buf);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ROReportSpec)? else {
      return Ok(None);
    };
    let raw = body.get_u8()?;
    let ro_report_trigger = ROReportTrigger::from_repr(raw).ok_or_else(|| {
      LlrpError::malformed("ROReportSpec", format!("unknown report trigger {}", raw))
    })?;
    let n = body.get_u16()?;
    let content_selector = TagReportContentSelector::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("TagReportContentSelector"))?;
    body.expect_end()?;
    Ok(Some(ROReportSpec { ro_report_trigger, n, content_selector }))
  }
}

/// 14.2.1.1 TagReportContentSelector parameter: ten enable bits packed
/// into a 16-bit word, MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TagReportContentSelector {
  pub enable_rospec_id                   : bool,
  pub enable_spec_index                  : bool,
  pub enable_inventory_parameter_spec_id : bool,
  pub enable_antenna_id                  : bool,
  pub enable_channel_index               : bool,
  pub enable_peak_rssi                   : bool,
  pub enable_first_seen_timestamp        : bool,
  pub enable_last_seen_timestamp         : bool,
  pub enable_tag_seen_count              : bool,
  pub enable_access_spec_id              : bool,
}

impl TagReportContentSelector {

  fn to_flags(self) -> u16 {
    let mut flags = 0u16;
    for (enabled, bit) in [
      (self.enable_rospec_id, ENABLE_ROSPEC_ID_BIT),
      (self.enable_spec_index, ENABLE_SPEC_INDEX_BIT),
      (self.enable_inventory_parameter_spec_id, ENABLE_INVENTORY_PARAMETER_SPEC_ID_BIT),
      (self.enable_antenna_id, ENABLE_ANTENNA_ID_BIT),
      (self.enable_channel_index, ENABLE_CHANNEL_INDEX_BIT),
      (self.enable_peak_rssi, ENABLE_PEAK_RSSI_BIT),
      (self.enable_first_seen_timestamp, ENABLE_FIRST_SEEN_TIMESTAMP_BIT),
      (self.enable_last_seen_timestamp, ENABLE_LAST_SEEN_TIMESTAMP_BIT),
      (self.enable_tag_seen_count, ENABLE_TAG_SEEN_COUNT_BIT),
      (self.enable_access_spec_id, ENABLE_ACCESS_SPEC_ID_BIT),
    ] {
      if enabled {
        flags |= 1 << bit;
      }
    }
    flags
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::TagReportContentSelector, |buf| {
      buf.put_u16(self.to_flags());
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    use crate::buffer::flag16;

    let Some(mut body) = r.try_tlv(ParamType::TagReportContentSelector)? else {
      return Ok(None);
    };
    let flags = body.get_u16()?;
    if !body.is_empty() {
      return Err(LlrpError::Unsupported(
        "AirProtocolSpecificEPCMemorySelector".to_string(),
      ));
    }
    Ok(Some(TagReportContentSelector {
      enable_rospec_id: flag16(flags, ENABLE_ROSPEC_ID_BIT),
      enable_spec_index: flag16(flags, ENABLE_SPEC_INDEX_BIT),
      enable_inventory_parameter_spec_id: flag16(flags, ENABLE_INVENTORY_PARAMETER_SPEC_ID_BIT),
      enable_antenna_id: flag16(flags, ENABLE_ANTENNA_ID_BIT),
      enable_channel_index: flag16(flags, ENABLE_CHANNEL_INDEX_BIT),
      enable_peak_rssi: flag16(flags, ENABLE_PEAK_RSSI_BIT),
      enable_first_seen_timestamp: flag16(flags, ENABLE_FIRST_SEEN_TIMESTAMP_BIT),
      enable_last_seen_timestamp: flag16(flags, ENABLE_LAST_SEEN_TIMESTAMP_BIT),
      enable_tag_seen_count: flag16(flags, ENABLE_TAG_SEEN_COUNT_BIT),
      enable_access_spec_id: flag16(flags, ENABLE_ACCESS_SPEC_ID_BIT),
    }))
  }
}

/// Fluent construction of a fully populated ROSpec from ergonomic
/// arguments.
///
/// The air-interface mode comes from a `ReaderMode` looked up in the
/// capability-derived `ReaderModeTable`; the builder never consults
/// global state.
#[derive(Debug, Clone)]
pub struct ROSpecBuilder {
  rospec_id           : u32,
  priority            : u8,
  state               : ROSpecState,
  antennas            : Vec<u16>,
  tx_power            : u16,
  reader_mode         : ReaderMode,
  duration_ms         : Option<u32>,
  report_every_n_tags : Option<u16>,
  session             : u8,
  tag_population      : u16,
  content_selector    : TagReportContentSelector,
}

impl ROSpecBuilder {

  pub fn new(rospec_id: u32, reader_mode: ReaderMode) -> Self {
    ROSpecBuilder {
      rospec_id,
      priority: 0,
      state: ROSpecState::Disabled,
      antennas: vec![1],
      tx_power: 91,
      reader_mode,
      duration_ms: None,
      report_every_n_tags: None,
      session: 2,
      tag_population: 4,
      content_selector: TagReportContentSelector {
        enable_antenna_id: true,
        enable_peak_rssi: true,
        enable_last_seen_timestamp: true,
        enable_tag_seen_count: true,
        ..TagReportContentSelector::default()
      },
    }
  }

  pub fn priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }

  pub fn state(mut self, state: ROSpecState) -> Self {
    self.state = state;
    self
  }

  pub fn antennas(mut self, antennas: &[u16]) -> Self {
    self.antennas = antennas.to_vec();
    self
  }

  /// Index into the reader's transmit power table.
  pub fn tx_power(mut self, tx_power: u16) -> Self {
    self.tx_power = tx_power;
    self
  }

  /// Switches the ROSpec stop trigger from Null to Duration.
  pub fn duration_ms(mut self, duration_ms: u32) -> Self {
    self.duration_ms = Some(duration_ms);
    self
  }

  pub fn report_every_n_tags(mut self, n: u16) -> Self {
    self.report_every_n_tags = Some(n);
    self
  }

  pub fn session(mut self, session: u8) -> Self {
    self.session = session;
    self
  }

  pub fn tag_population(mut self, tag_population: u16) -> Self {
    self.tag_population = tag_population;
    self
  }

  /// Merges overrides onto the default tag content selector
  /// ({AntennaID, PeakRSSI, LastSeenTimestamp, TagSeenCount}).
  pub fn tag_content<F>(mut self, overrides: F) -> Self
  where
    F: FnOnce(&mut TagReportContentSelector),
  {
    overrides(&mut self.content_selector);
    self
  }

  pub fn build(self) -> Result<ROSpec> {
    if self.rospec_id == 0 {
      return Err(LlrpError::InvalidArgument(
        "ROSpecID must be non-zero".to_string(),
      ));
    }
    if self.priority > 7 {
      return Err(LlrpError::InvalidArgument(format!(
        "priority {} out of range [0..7]",
        self.priority
      )));
    }
    if self.session > 3 {
      return Err(LlrpError::InvalidArgument(format!(
        "session {} out of range [0..3]",
        self.session
      )));
    }
    if self.antennas.is_empty() {
      return Err(LlrpError::InvalidArgument(
        "at least one antenna id required".to_string(),
      ));
    }
    let mode_index = u16::try_from(self.reader_mode.mode_identifier).map_err(|_| {
      LlrpError::InvalidArgument(format!(
        "mode identifier {} exceeds the 16-bit ModeIndex field",
        self.reader_mode.mode_identifier
      ))
    })?;
    let tari = u16::try_from(self.reader_mode.max_tari).map_err(|_| {
      LlrpError::InvalidArgument(format!(
        "Tari {} exceeds the 16-bit Tari field",
        self.reader_mode.max_tari
      ))
    })?;

    let stop_trigger = match self.duration_ms {
      Some(ms) => ROSpecStopTrigger::duration(ms),
      None => ROSpecStopTrigger::null(),
    };

    let antenna_configurations = self
      .antennas
      .iter()
      .map(|antenna_id| AntennaConfiguration {
        antenna_id: *antenna_id,
        rf_receiver: None,
        rf_transmitter: Some(RFTransmitter {
          hop_table_id: 1,
          channel_index: 1,
          transmit_power: self.tx_power,
        }),
        inventory_command: Some(C1G2InventoryCommand {
          tag_inventory_state_aware: false,
          filter: None,
          rf_control: Some(C1G2RFControl { mode_index, tari }),
          singulation_control: Some(C1G2SingulationControl {
            session: self.session,
            tag_population: self.tag_population,
            tag_transit_time: 0,
          }),
        }),
      })
      .collect();

    Ok(ROSpec {
      rospec_id: self.rospec_id,
      priority: self.priority,
      current_state: self.state,
      boundary_spec: ROBoundarySpec {
        start_trigger: ROSpecStartTrigger::immediate(),
        stop_trigger,
      },
      ai_specs: vec![AISpec {
        antenna_ids: self.antennas,
        stop_trigger: AISpecStopTrigger {
          trigger_type: StopTriggerType::Duration,
          duration_ms: 500,
        },
        inventory_spec: InventoryParameterSpec {
          spec_id: 1,
          protocol_id: AirProtocol::EPCGlobalClass1Gen2,
          antenna_configurations,
        },
      }],
      report_spec: Some(ROReportSpec {
        ro_report_trigger: ROReportTrigger::UponNTagsOrEndOfAISpec,
        n: self.report_every_n_tags.unwrap_or(1),
        content_selector: self.content_selector,
      }),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn test_mode() -> ReaderMode {
    ReaderMode { mode_identifier: 1000, max_tari: 6250 }
  }

  #[test]
  fn built_rospec_round_trips_through_the_wire_format() {
    let rospec = ROSpec::builder(1, test_mode())
      .antennas(&[1])
      .tx_power(91)
      .duration_ms(2000)
      .session(2)
      .tag_population(4)
      .build()
      .unwrap();

    let mut buf = BytesMut::new();
    rospec.encode(&mut buf);

    let mut r = Reader::new(&buf);
    let decoded = ROSpec::decode_required(&mut r).unwrap();
    assert!(r.is_empty());
    assert_eq!(decoded, rospec);

    let mut again = BytesMut::new();
    decoded.encode(&mut again);
    assert_eq!(buf, again);

    // One antenna, one antenna configuration with the requested mode.
    let ai_spec = &decoded.ai_specs[0];
    assert_eq!(ai_spec.antenna_ids, vec![1]);
    assert_eq!(ai_spec.inventory_spec.antenna_configurations.len(), 1);
    let command = ai_spec.inventory_spec.antenna_configurations[0]
      .inventory_command
      .as_ref()
      .unwrap();
    let rf_control = command.rf_control.unwrap();
    assert_eq!(rf_control.mode_index, 1000);
    assert_eq!(rf_control.tari, 6250);
    let singulation = command.singulation_control.unwrap();
    assert_eq!(singulation.session, 2);
    assert_eq!(singulation.tag_population, 4);

    // Duration stop trigger from duration_ms.
    assert_eq!(
      decoded.boundary_spec.stop_trigger,
      ROSpecStopTrigger::duration(2000)
    );
    assert_eq!(
      decoded.boundary_spec.start_trigger.trigger_type,
      StartTriggerType::Immediate
    );
  }

  #[test]
  fn single_antenna_ai_spec_encodes_count_and_one_id() {
    let ai_spec = AISpec {
      antenna_ids: vec![3],
      stop_trigger: AISpecStopTrigger {
        trigger_type: StopTriggerType::Null,
        duration_ms: 0,
      },
      inventory_spec: InventoryParameterSpec {
        spec_id: 1,
        protocol_id: AirProtocol::EPCGlobalClass1Gen2,
        antenna_configurations: vec![],
      },
    };
    let mut buf = BytesMut::new();
    ai_spec.encode(&mut buf);
    // count=1, then exactly two bytes of antenna-id list
    assert_eq!(&buf[4..8], &[0x00, 0x01, 0x00, 0x03]);
  }

  #[test]
  fn default_content_selector_enables_the_reporting_quartet() {
    let rospec = ROSpec::builder(7, test_mode()).build().unwrap();
    let selector = rospec.report_spec.unwrap().content_selector;
    assert!(selector.enable_antenna_id);
    assert!(selector.enable_peak_rssi);
    assert!(selector.enable_last_seen_timestamp);
    assert!(selector.enable_tag_seen_count);
    assert!(!selector.enable_rospec_id);
    assert!(!selector.enable_first_seen_timestamp);
  }

  #[test]
  fn content_selector_overrides_merge_on_top_of_defaults() {
    let rospec = ROSpec::builder(7, test_mode())
      .tag_content(|selector| {
        selector.enable_first_seen_timestamp = true;
        selector.enable_peak_rssi = false;
      })
      .build()
      .unwrap();
    let selector = rospec.report_spec.unwrap().content_selector;
    assert!(selector.enable_first_seen_timestamp);
    assert!(!selector.enable_peak_rssi);
    assert!(selector.enable_antenna_id);
  }

  #[test]
  fn builder_validates_its_inputs() {
    assert!(matches!(
      ROSpec::builder(0, test_mode()).build(),
      Err(LlrpError::InvalidArgument(_))
    ));
    assert!(matches!(
      ROSpec::builder(1, test_mode()).priority(8).build(),
      Err(LlrpError::InvalidArgument(_))
    ));
    assert!(matches!(
      ROSpec::builder(1, test_mode()).session(4).build(),
      Err(LlrpError::InvalidArgument(_))
    ));
    assert!(matches!(
      ROSpec::builder(1, test_mode()).antennas(&[]).build(),
      Err(LlrpError::InvalidArgument(_))
    ));
    let wide_mode = ReaderMode { mode_identifier: 70_000, max_tari: 6250 };
    assert!(matches!(
      ROSpec::builder(1, wide_mode).build(),
      Err(LlrpError::InvalidArgument(_))
    ));
  }

  #[test]
  fn filter_round_trips_inside_an_inventory_command() {
    let command = C1G2InventoryCommand {
      tag_inventory_state_aware: false,
      filter: Some(C1G2Filter {
        truncate_action: 0,
        mask: C1G2TagInventoryMask {
          mb: 1,
          pointer: 32,
          mask_bit_count: 12,
          tag_mask: vec![0xab, 0xc0],
        },
        state_aware_action: None,
        state_unaware_action: Some(C1G2TagInventoryStateUnawareFilterAction { action: 1 }),
      }),
      rf_control: None,
      singulation_control: None,
    };
    let mut buf = BytesMut::new();
    command.encode(&mut buf);
    let decoded = C1G2InventoryCommand::decode(&mut Reader::new(&buf)).unwrap().unwrap();
    assert_eq!(decoded, command);
  }

  #[test]
  fn content_selector_flags_use_the_documented_bit_positions() {
    let selector = TagReportContentSelector {
      enable_rospec_id: true,
      enable_access_spec_id: true,
      ..TagReportContentSelector::default()
    };
    let mut buf = BytesMut::new();
    selector.encode(&mut buf);
    assert_eq!(&buf[4..6], &[0x80, 0x40]);
  }
}

use log::debug;

use crate::buffer::{flag, flag16, Reader};
use crate::error::Result;
use crate::params::LLRPStatus;
use crate::types::{Modulation, ParamType};

const CAN_SET_ANTENNA_PROPERTIES_BIT: u8 = 15;
const HAS_UTC_CLOCK_BIT: u8 = 14;
const HOPPING_BIT: u8 = 7;
const DR_BIT: u8 = 7;
const EPC_HAG_CONFORMANCE_BIT: u8 = 6;

/// Decoded body of GET_READER_CAPABILITIES_RESPONSE (9.1.2).
#[derive(Debug, Clone)]
pub struct ReaderCapabilities {
  pub status                      : LLRPStatus,
  pub general_device_capabilities : Option<GeneralDeviceCapabilities>,
  pub llrp_capabilities           : Option<LLRPCapabilities>,
  pub regulatory_capabilities     : Option<RegulatoryCapabilities>,
  pub c1g2_llrp_capabilities      : Option<C1G2LLRPCapabilities>,
}

impl ReaderCapabilities {

  pub fn decode(r: &mut Reader) -> Result<Self> {
    let status = LLRPStatus::decode_required(r)?;
    let general_device_capabilities = GeneralDeviceCapabilities::decode(r)?;
    let llrp_capabilities = LLRPCapabilities::decode(r)?;
    let regulatory_capabilities = RegulatoryCapabilities::decode(r)?;
    let c1g2_llrp_capabilities = C1G2LLRPCapabilities::decode(r)?;
    r.expect_consumed()?;

    Ok(ReaderCapabilities {
      status,
      general_device_capabilities,
      llrp_capabilities,
      regulatory_capabilities,
      c1g2_llrp_capabilities,
    })
  }

  /// Air-interface modes advertised by the reader, for feeding the
  /// ROSpec builder.
  pub fn reader_mode_table(&self) -> ReaderModeTable {
    let entries = self
      .regulatory_capabilities
      .as_ref()
      .and_then(|reg| reg.uhf_band_capabilities.as_ref())
      .and_then(|uhf| uhf.rf_mode_table.as_ref())
      .map(|table| table.entries.as_slice())
      .unwrap_or(&[]);

    ReaderModeTable {
      modes: entries
        .iter()
        .map(|e| ReaderMode {
          mode_identifier: e.mode_identifier,
          max_tari: e.max_tari,
        })
        .collect(),
    }
  }
}

/// 9.2.2 GeneralDeviceCapabilities parameter.
#[derive(Debug, Clone)]
pub struct GeneralDeviceCapabilities {
  pub max_antennas_supported        : u16,
  pub can_set_antenna_properties    : bool,
  pub has_utc_clock_capability      : bool,
  pub device_manufacturer_name      : u32,
  pub model_name                    : u32,
  pub reader_firmware_version       : String,
  pub receive_sensitivity_table     : Vec<ReceiveSensitivityTableEntry>,
  pub per_antenna_sensitivity_range : Vec<PerAntennaReceiveSensitivityRange>,
  pub gpio_capabilities             : Option<GPIOCapabilities>,
  pub per_antenna_air_protocols     : Vec<PerAntennaAirProtocol>,
  pub maximum_receive_sensitivity   : Option<MaximumReceiveSensitivity>,
}

impl GeneralDeviceCapabilities {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::GeneralDeviceCapabilities)? else {
      return Ok(None);
    };

    let max_antennas_supported = body.get_u16()?;
    let flags = body.get_u16()?;
    let can_set_antenna_properties = flag16(flags, CAN_SET_ANTENNA_PROPERTIES_BIT);
    let has_utc_clock_capability = flag16(flags, HAS_UTC_CLOCK_BIT);
    let device_manufacturer_name = body.get_u32()?;
    let model_name = body.get_u32()?;

    let firmware_len = body.get_u16()? as usize;
    let reader_firmware_version =
      String::from_utf8_lossy(body.get_bytes(firmware_len)?).into_owned();

    let mut receive_sensitivity_table = Vec::new();
    while let Some(entry) = ReceiveSensitivityTableEntry::decode(&mut body)? {
      receive_sensitivity_table.push(entry);
    }

    let mut per_antenna_sensitivity_range = Vec::new();
    while let Some(range) = PerAntennaReceiveSensitivityRange::decode(&mut body)? {
      per_antenna_sensitivity_range.push(range);
    }

    let gpio_capabilities = GPIOCapabilities::decode(&mut body)?;

    let mut per_antenna_air_protocols = Vec::new();
    while let Some(proto) = PerAntennaAirProtocol::decode(&mut body)? {
      per_antenna_air_protocols.push(proto);
    }

    let maximum_receive_sensitivity = MaximumReceiveSensitivity::decode(&mut body)?;
    body.expect_end()?;

    debug!(
      "GeneralDeviceCapabilities: manufacturer={} model={} firmware={}",
      device_manufacturer_name, model_name, reader_firmware_version
    );

    Ok(Some(GeneralDeviceCapabilities {
      max_antennas_supported,
      can_set_antenna_properties,
      has_utc_clock_capability,
      device_manufacturer_name,
      model_name,
      reader_firmware_version,
      receive_sensitivity_table,
      per_antenna_sensitivity_range,
      gpio_capabilities,
      per_antenna_air_protocols,
      maximum_receive_sensitivity,
    }))
  }
}

/// 9.2.2.1 ReceiveSensitivityTableEntry parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveSensitivityTableEntry {
  pub index                     : u16,
  pub receive_sensitivity_value : i16,
}

impl ReceiveSensitivityTableEntry {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::ReceiveSensitivityTableEntry)? else {
      return Ok(None);
    };
    let index = body.get_u16()?;
    let receive_sensitivity_value = body.get_u16()? as i16;
    body.expect_end()?;
    Ok(Some(ReceiveSensitivityTableEntry { index, receive_sensitivity_value }))
  }
}

/// 9.2.2.3 PerAntennaReceiveSensitivityRange parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerAntennaReceiveSensitivityRange {
  pub antenna_id                    : u16,
  pub receive_sensitivity_index_min : u16,
  pub receive_sensitivity_index_max : u16,
}

impl PerAntennaReceiveSensitivityRange {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::PerAntennaReceiveSensitivityRange)? else {
      return Ok(None);
    };
    let antenna_id = body.get_u16()?;
    let receive_sensitivity_index_min = body.get_u16()?;
    let receive_sensitivity_index_max = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(PerAntennaReceiveSensitivityRange {
      antenna_id,
      receive_sensitivity_index_min,
      receive_sensitivity_index_max,
    }))
  }
}

/// 9.2.2.2 GPIOCapabilities parameter. The GPI and GPO counts are two
/// distinct 16-bit fields on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GPIOCapabilities {
  pub num_gpis : u16,
  pub num_gpos : u16,
}

impl GPIOCapabilities {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::GPIOCapabilities)? else {
      return Ok(None);
    };
    let num_gpis = body.get_u16()?;
    let num_gpos = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(GPIOCapabilities { num_gpis, num_gpos }))
  }
}

/// 9.2.2.4 PerAntennaAirProtocol parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerAntennaAirProtocol {
  pub antenna_id   : u16,
  pub protocol_ids : Vec<u8>,
}

impl PerAntennaAirProtocol {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::PerAntennaAirProtocol)? else {
      return Ok(None);
    };
    let antenna_id = body.get_u16()?;
    let num_protocols = body.get_u16()? as usize;
    let protocol_ids = body.get_bytes(num_protocols)?.to_vec();
    body.expect_end()?;
    Ok(Some(PerAntennaAirProtocol { antenna_id, protocol_ids }))
  }
}

/// 9.2.2.5 MaximumReceiveSensitivity parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaximumReceiveSensitivity {
  pub maximum_sensitivity_value: u16,
}

impl MaximumReceiveSensitivity {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::MaximumReceiveSensitivity)? else {
      return Ok(None);
    };
    let maximum_sensitivity_value = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(MaximumReceiveSensitivity { maximum_sensitivity_value }))
  }
}

/// 9.2.3 LLRPCapabilities parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LLRPCapabilities {
  pub can_do_rf_survey                              : bool,
  pub can_report_buffer_fill_warning                : bool,
  pub supports_client_request_op_spec               : bool,
  pub can_do_tag_inventory_state_aware_singulation  : bool,
  pub supports_event_and_report_holding             : bool,
  pub max_priority_level_supported                  : u8,
  pub client_request_op_spec_timeout                : u16,
  pub max_num_ro_specs                              : u32,
  pub max_num_specs_per_ro_spec                     : u32,
  pub max_num_inventory_parameter_specs_per_ai_spec : u32,
  pub max_num_access_specs                          : u32,
  pub max_num_op_specs_per_access_spec              : u32,
}

impl LLRPCapabilities {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::LLRPCapabilities)? else {
      return Ok(None);
    };

    let flags = body.get_u8()?;
    let max_priority_level_supported = body.get_u8()?;
    let client_request_op_spec_timeout = body.get_u16()?;
    let max_num_ro_specs = body.get_u32()?;
    let max_num_specs_per_ro_spec = body.get_u32()?;
    let max_num_inventory_parameter_specs_per_ai_spec = body.get_u32()?;
    let max_num_access_specs = body.get_u32()?;
    let max_num_op_specs_per_access_spec = body.get_u32()?;
    body.expect_end()?;

    Ok(Some(LLRPCapabilities {
      can_do_rf_survey: flag(flags, 7),
      can_report_buffer_fill_warning: flag(flags, 6),
      supports_client_request_op_spec: flag(flags, 5),
      can_do_tag_inventory_state_aware_singulation: flag(flags, 4),
      supports_event_and_report_holding: flag(flags, 3),
      max_priority_level_supported,
      client_request_op_spec_timeout,
      max_num_ro_specs,
      max_num_specs_per_ro_spec,
      max_num_inventory_parameter_specs_per_ai_spec,
      max_num_access_specs,
      max_num_op_specs_per_access_spec,
    }))
  }
}

/// 9.2.4 RegulatoryCapabilities parameter.
#[derive(Debug, Clone)]
pub struct RegulatoryCapabilities {
  pub country_code            : u16,
  pub communications_standard : u16,
  pub uhf_band_capabilities   : Option<UHFBandCapabilities>,
}

impl RegulatoryCapabilities {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::RegulatoryCapabilities)? else {
      return Ok(None);
    };
    let country_code = body.get_u16()?;
    let communications_standard = body.get_u16()?;
    let uhf_band_capabilities = UHFBandCapabilities::decode(&mut body)?;
    body.expect_end()?;
    Ok(Some(RegulatoryCapabilities {
      country_code,
      communications_standard,
      uhf_band_capabilities,
    }))
  }
}

/// 9.2.4.1 UHFBandCapabilities parameter.
#[derive(Debug, Clone)]
pub struct UHFBandCapabilities {
  pub transmit_power_levels             : Vec<TransmitPowerLevelTableEntry>,
  pub frequency_information             : Option<FrequencyInformation>,
  pub rf_mode_table                     : Option<UHFRFModeTable>,
  pub rf_survey_frequency_capabilities  : Option<RFSurveyFrequencyCapabilities>,
}

impl UHFBandCapabilities {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::UHFBandCapabilities)? else {
      return Ok(None);
    };

    let mut transmit_power_levels = Vec::new();
    while let Some(entry) = TransmitPowerLevelTableEntry::decode(&mut body)? {
      transmit_power_levels.push(entry);
    }

    let frequency_information = FrequencyInformation::decode(&mut body)?;
    let rf_mode_table = UHFRFModeTable::decode(&mut body)?;
    let rf_survey_frequency_capabilities = RFSurveyFrequencyCapabilities::decode(&mut body)?;
    body.expect_end()?;

    Ok(Some(UHFBandCapabilities {
      transmit_power_levels,
      frequency_information,
      rf_mode_table,
      rf_survey_frequency_capabilities,
    }))
  }
}

/// 9.2.4.1.1 TransmitPowerLevelTableEntry parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmitPowerLevelTableEntry {
  pub index                : u16,
  pub transmit_power_value : u16,
}

impl TransmitPowerLevelTableEntry {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::TransmitPowerLevelTableEntry)? else {
      return Ok(None);
    };
    let index = body.get_u16()?;
    let transmit_power_value = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(TransmitPowerLevelTableEntry { index, transmit_power_value }))
  }
}

/// 9.2.4.1.2 FrequencyInformation parameter: either one or more hop
/// tables (frequency-hopping regions) or a single fixed table.
#[derive(Debug, Clone)]
pub struct FrequencyInformation {
  pub hopping               : bool,
  pub frequency_hop_tables  : Vec<FrequencyHopTable>,
  pub fixed_frequency_table : Option<FixedFrequencyTable>,
}

impl FrequencyInformation {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::FrequencyInformation)? else {
      return Ok(None);
    };

    let hopping = flag(body.get_u8()?, HOPPING_BIT);

    let mut frequency_hop_tables = Vec::new();
    while let Some(table) = FrequencyHopTable::decode(&mut body)? {
      frequency_hop_tables.push(table);
    }

    let fixed_frequency_table = FixedFrequencyTable::decode(&mut body)?;
    body.expect_end()?;

    Ok(Some(FrequencyInformation {
      hopping,
      frequency_hop_tables,
      fixed_frequency_table,
    }))
  }
}

/// 9.2.4.1.2.1 FrequencyHopTable parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyHopTable {
  pub hop_table_id : u8,
  pub frequencies  : Vec<u32>,
}

impl FrequencyHopTable {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::FrequencyHopTable)? else {
      return Ok(None);
    };
    let hop_table_id = body.get_u8()?;
    body.skip(1)?; // reserved
    let num_hops = body.get_u16()? as usize;
    let mut frequencies = Vec::with_capacity(num_hops);
    for _ in 0..num_hops {
      frequencies.push(body.get_u32()?);
    }
    body.expect_end()?;
    Ok(Some(FrequencyHopTable { hop_table_id, frequencies }))
  }
}

/// 9.2.4.1.2.2 FixedFrequencyTable parameter. Both the count and the
/// frequency list are decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedFrequencyTable {
  pub frequencies: Vec<u32>,
}

impl FixedFrequencyTable {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::FixedFrequencyTable)? else {
      return Ok(None);
    };
    let num_frequencies = body.get_u16()? as usize;
    let mut frequencies = Vec::with_capacity(num_frequencies);
    for _ in 0..num_frequencies {
      frequencies.push(body.get_u32()?);
    }
    body.expect_end()?;
    Ok(Some(FixedFrequencyTable { frequencies }))
  }
}

/// 16.2.1.1.2 UHFRFModeTable parameter.
#[derive(Debug, Clone)]
pub struct UHFRFModeTable {
  pub entries: Vec<UHFC1G2RFModeTableEntry>,
}

impl UHFRFModeTable {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::UHFRFModeTable)? else {
      return Ok(None);
    };
    let mut entries = Vec::new();
    while let Some(entry) = UHFC1G2RFModeTableEntry::decode(&mut body)? {
      entries.push(entry);
    }
    body.expect_end()?;
    Ok(Some(UHFRFModeTable { entries }))
  }
}

/// 16.2.1.1.2.1 UHFC1G2RFModeTableEntry parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UHFC1G2RFModeTableEntry {
  pub mode_identifier         : u32,
  pub dr                      : bool,
  pub epc_hag_conformance     : bool,
  pub modulation              : u8,
  pub forward_link_modulation : u8,
  pub spectral_mask_indicator : u8,
  pub bdr                     : u32,
  pub pie                     : u32,
  pub min_tari                : u32,
  pub max_tari                : u32,
  pub step_tari               : u32,
}

impl UHFC1G2RFModeTableEntry {

  /// The forward-link modulation, when the raw field names one of the
  /// published values.
  pub fn modulation_type(&self) -> Option<Modulation> {
    Modulation::from_repr(self.modulation)
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::UHFC1G2RFModeTableEntry)? else {
      return Ok(None);
    };

    let mode_identifier = body.get_u32()?;
    let rc = body.get_u8()?;
    let modulation = body.get_u8()?;
    let forward_link_modulation = body.get_u8()?;
    let spectral_mask_indicator = body.get_u8()?;
    let bdr = body.get_u32()?;
    let pie = body.get_u32()?;
    let min_tari = body.get_u32()?;
    let max_tari = body.get_u32()?;
    let step_tari = body.get_u32()?;
    body.expect_end()?;

    Ok(Some(UHFC1G2RFModeTableEntry {
      mode_identifier,
      dr: flag(rc, DR_BIT),
      epc_hag_conformance: flag(rc, EPC_HAG_CONFORMANCE_BIT),
      modulation,
      forward_link_modulation,
      spectral_mask_indicator,
      bdr,
      pie,
      min_tari,
      max_tari,
      step_tari,
    }))
  }
}

/// 9.2.4.1.3 RFSurveyFrequencyCapabilities parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RFSurveyFrequencyCapabilities {
  pub minimum_frequency : u32,
  pub maximum_frequency : u32,
}

impl RFSurveyFrequencyCapabilities {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::RFSurveyFrequencyCapabilities)? else {
      return Ok(None);
    };
    let minimum_frequency = body.get_u32()?;
    let maximum_frequency = body.get_u32()?;
    body.expect_end()?;
    Ok(Some(RFSurveyFrequencyCapabilities { minimum_frequency, maximum_frequency }))
  }
}

/// 16.3.1.1.1 C1G2LLRPCapabilities parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct C1G2LLRPCapabilities {
  pub supports_block_erase           : bool,
  pub supports_block_write           : bool,
  pub supports_block_permalock       : bool,
  pub supports_tag_recommissioning   : bool,
  pub supports_umi_method_2          : bool,
  pub supports_xpc                   : bool,
  pub max_select_filters_per_query   : u16,
}

impl C1G2LLRPCapabilities {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2LLRPCapabilities)? else {
      return Ok(None);
    };
    let flags = body.get_u8()?;
    let max_select_filters_per_query = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(C1G2LLRPCapabilities {
      supports_block_erase: flag(flags, 7),
      supports_block_write: flag(flags, 6),
      supports_block_permalock: flag(flags, 5),
      supports_tag_recommissioning: flag(flags, 4),
      supports_umi_method_2: flag(flags, 3),
      supports_xpc: flag(flags, 2),
      max_select_filters_per_query,
    }))
  }
}

/// Immutable air-interface mode table distilled from decoded
/// capabilities and threaded explicitly into the ROSpec builder.
#[derive(Debug, Clone, Default)]
pub struct ReaderModeTable {
  pub modes: Vec<ReaderMode>,
}

impl ReaderModeTable {

  pub fn mode(&self, mode_identifier: u32) -> Option<ReaderMode> {
    self.modes.iter().copied().find(|m| m.mode_identifier == mode_identifier)
  }

  pub fn first(&self) -> Option<ReaderMode> {
    self.modes.first().copied()
  }
}

/// One usable air-interface mode: its identifier and the widest Tari the
/// reader accepts for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderMode {
  pub mode_identifier : u32,
  pub max_tari        : u32,
}

#[cfg(test)]
mod tests {
  use bytes::{BufMut, BytesMut};

  use super::*;
  use crate::buffer::encode_tlv;

  fn mode_entry(buf: &mut BytesMut, identifier: u32, max_tari: u32) {
    encode_tlv(buf, ParamType::UHFC1G2RFModeTableEntry, |buf| {
      buf.put_u32(identifier);
      buf.put_u8(0x80); // DR=1, conformance=0
      buf.put_u8(2); // M4
      buf.put_u8(0);
      buf.put_u8(0);
      buf.put_u32(640_000);
      buf.put_u32(1500);
      buf.put_u32(6250);
      buf.put_u32(max_tari);
      buf.put_u32(0);
    });
  }

  #[test]
  fn decodes_a_general_device_capabilities_tree() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::GeneralDeviceCapabilities, |buf| {
      buf.put_u16(4); // antennas
      buf.put_u16(0xC000); // CanSetAntennaProperties | HasUTCClockCapability
      buf.put_u32(25882); // manufacturer
      buf.put_u32(2001); // model
      buf.put_u16(5);
      buf.extend_from_slice(b"7.1.2");
      encode_tlv(buf, ParamType::ReceiveSensitivityTableEntry, |buf| {
        buf.put_u16(1);
        buf.put_u16(0);
      });
      encode_tlv(buf, ParamType::ReceiveSensitivityTableEntry, |buf| {
        buf.put_u16(2);
        buf.put_u16(10);
      });
      encode_tlv(buf, ParamType::GPIOCapabilities, |buf| {
        buf.put_u16(4);
        buf.put_u16(8);
      });
      encode_tlv(buf, ParamType::PerAntennaAirProtocol, |buf| {
        buf.put_u16(1);
        buf.put_u16(1);
        buf.put_u8(1); // EPCGlobalClass1Gen2
      });
    });

    let mut r = Reader::new(&buf);
    let caps = GeneralDeviceCapabilities::decode(&mut r).unwrap().unwrap();
    assert!(r.is_empty());
    assert_eq!(caps.max_antennas_supported, 4);
    assert!(caps.can_set_antenna_properties);
    assert!(caps.has_utc_clock_capability);
    assert_eq!(caps.reader_firmware_version, "7.1.2");
    assert_eq!(caps.receive_sensitivity_table.len(), 2);
    let gpio = caps.gpio_capabilities.unwrap();
    assert_eq!((gpio.num_gpis, gpio.num_gpos), (4, 8));
    assert_eq!(caps.per_antenna_air_protocols[0].protocol_ids, vec![1]);
  }

  #[test]
  fn decodes_uhf_band_capabilities_and_builds_a_mode_table() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::UHFBandCapabilities, |buf| {
      encode_tlv(buf, ParamType::TransmitPowerLevelTableEntry, |buf| {
        buf.put_u16(1);
        buf.put_u16(1000);
      });
      encode_tlv(buf, ParamType::TransmitPowerLevelTableEntry, |buf| {
        buf.put_u16(91);
        buf.put_u16(3000);
      });
      encode_tlv(buf, ParamType::FrequencyInformation, |buf| {
        buf.put_u8(0x00); // fixed-frequency region
        encode_tlv(buf, ParamType::FixedFrequencyTable, |buf| {
          buf.put_u16(2);
          buf.put_u32(865_700);
          buf.put_u32(866_300);
        });
      });
      encode_tlv(buf, ParamType::UHFRFModeTable, |buf| {
        mode_entry(buf, 1000, 6250);
        mode_entry(buf, 1002, 25000);
      });
    });

    let mut r = Reader::new(&buf);
    let uhf = UHFBandCapabilities::decode(&mut r).unwrap().unwrap();
    assert_eq!(uhf.transmit_power_levels.len(), 2);
    let freq = uhf.frequency_information.clone().unwrap();
    assert!(!freq.hopping);
    assert_eq!(
      freq.fixed_frequency_table.unwrap().frequencies,
      vec![865_700, 866_300]
    );

    let caps = ReaderCapabilities {
      status: LLRPStatus::success(),
      general_device_capabilities: None,
      llrp_capabilities: None,
      regulatory_capabilities: Some(RegulatoryCapabilities {
        country_code: 840,
        communications_standard: 1,
        uhf_band_capabilities: Some(uhf),
      }),
      c1g2_llrp_capabilities: None,
    };
    let table = caps.reader_mode_table();
    assert_eq!(table.modes.len(), 2);
    assert_eq!(
      table.mode(1000),
      Some(ReaderMode { mode_identifier: 1000, max_tari: 6250 })
    );
    assert_eq!(table.mode(9), None);
  }

  #[test]
  fn mode_entries_expose_their_modulation() {
    let mut buf = BytesMut::new();
    mode_entry(&mut buf, 1000, 6250);
    let entry = UHFC1G2RFModeTableEntry::decode(&mut Reader::new(&buf)).unwrap().unwrap();
    assert_eq!(entry.modulation_type(), Some(Modulation::M4));
    assert!(entry.dr);
  }

  #[test]
  fn decodes_a_frequency_hop_table() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::FrequencyHopTable, |buf| {
      buf.put_u8(1);
      buf.put_u8(0);
      buf.put_u16(3);
      buf.put_u32(902_750);
      buf.put_u32(903_250);
      buf.put_u32(903_750);
    });
    let table = FrequencyHopTable::decode(&mut Reader::new(&buf)).unwrap().unwrap();
    assert_eq!(table.hop_table_id, 1);
    assert_eq!(table.frequencies.len(), 3);
  }
}

use std::fmt;

use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};
use log::debug;

use crate::buffer::{encode_tlv, Reader};
use crate::error::{LlrpError, Result};
use crate::types::{ParamType, TvType};

const TV_MARKER: u8 = 0x80;

/// The EPC carried at the head of every TagReportData: either the
/// general variable-length form or the fixed 96-bit legacy form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Epc {
  Data(EPCData),
  EPC96([u8; 12]),
}

impl Epc {

  pub fn as_hex(&self) -> String {
    let bytes: &[u8] = match self {
      Epc::Data(data) => &data.epc,
      Epc::EPC96(bytes) => bytes,
    };
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
  }
}

impl fmt::Display for Epc {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_hex())
  }
}

/// 13.2.3.1 EPCData parameter: bit length plus the EPC padded to whole
/// bytes. A zero bit length is a legal, empty EPC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EPCData {
  pub epc_length_bits : u16,
  pub epc             : Vec<u8>,
}

impl EPCData {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::EPCData)? else {
      return Ok(None);
    };
    let epc_length_bits = body.get_u16()?;
    let epc = body.get_bits(epc_length_bits as usize)?.to_vec();
    body.expect_end()?;
    Ok(Some(EPCData { epc_length_bits, epc }))
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::EPCData, |buf| {
      buf.put_u16(self.epc_length_bits);
      buf.extend_from_slice(&self.epc);
    });
  }
}

fn put_tv_header(buf: &mut BytesMut, tv: TvType) {
  buf.put_u8(TV_MARKER | tv as u8);
}

fn put_tv_u16(buf: &mut BytesMut, tv: TvType, value: u16) {
  put_tv_header(buf, tv);
  buf.put_u16(value);
}

fn put_tv_u32(buf: &mut BytesMut, tv: TvType, value: u32) {
  put_tv_header(buf, tv);
  buf.put_u32(value);
}

fn put_tv_u64(buf: &mut BytesMut, tv: TvType, value: u64) {
  put_tv_header(buf, tv);
  buf.put_u64(value);
}

fn put_tv_i8(buf: &mut BytesMut, tv: TvType, value: i8) {
  put_tv_header(buf, tv);
  buf.put_i8(value);
}

/// 13.2.3 TagReportData parameter: the EPC, a run of TV-encoded report
/// fields, and optionally the result of an access operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagReportData {
  pub epc                         : Option<Epc>,
  pub rospec_id                   : Option<u32>,
  pub spec_index                  : Option<u16>,
  pub inventory_parameter_spec_id : Option<u16>,
  pub antenna_id                  : Option<u16>,
  pub peak_rssi                   : Option<i8>,
  pub channel_index               : Option<u16>,
  pub first_seen_timestamp_utc    : Option<u64>,
  pub first_seen_timestamp_uptime : Option<u64>,
  pub last_seen_timestamp_utc     : Option<u64>,
  pub last_seen_timestamp_uptime  : Option<u64>,
  pub tag_seen_count              : Option<u16>,
  pub c1g2_pc                     : Option<u16>,
  pub c1g2_crc                    : Option<u16>,
  pub access_spec_id              : Option<u32>,
  pub op_spec_result              : Option<OpSpecResult>,
}

impl TagReportData {

  pub fn epc_hex(&self) -> String {
    self.epc.as_ref().map(|epc| epc.as_hex()).unwrap_or_default()
  }

  pub fn last_seen_utc(&self) -> Option<DateTime<Utc>> {
    self
      .last_seen_timestamp_utc
      .and_then(|us| DateTime::from_timestamp_micros(us as i64))
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::TagReportData)? else {
      return Ok(None);
    };

    let mut report = TagReportData::default();

    // EPCData first, then the TV fallback; one of the two is mandatory.
    if let Some(data) = EPCData::decode(&mut body)? {
      report.epc = Some(Epc::Data(data));
    } else if body.peek_u8() == Some(TV_MARKER | TvType::EPC96 as u8) {
      body.skip(1)?;
      let mut epc = [0u8; 12];
      epc.copy_from_slice(body.get_bytes(12)?);
      report.epc = Some(Epc::EPC96(epc));
    } else {
      return Err(LlrpError::MissingRequired("EPCData or EPC-96"));
    }

    report.decode_tv_fields(&mut body)?;
    report.op_spec_result = OpSpecResult::decode(&mut body)?;
    body.expect_end()?;

    debug!("TagReportData: EPC {}", report.epc_hex());

    Ok(Some(report))
  }

  /// Generic TV walker: consumes one TV parameter per step while the
  /// next byte carries the marker bit and a registered 7-bit type, then
  /// hands control back to the container.
  fn decode_tv_fields(&mut self, body: &mut Reader) -> Result<()> {
    loop {
      let Some(lead) = body.peek_u8() else {
        return Ok(());
      };
      if lead & TV_MARKER == 0 {
        return Ok(());
      }
      let Some(tv) = TvType::from_repr(lead & 0x7F) else {
        return Ok(());
      };
      body.skip(1)?;
      match tv {
        TvType::ROSpecID => self.rospec_id = Some(body.get_u32()?),
        TvType::SpecIndex => self.spec_index = Some(body.get_u16()?),
        TvType::InventoryParameterSpecID => {
          self.inventory_parameter_spec_id = Some(body.get_u16()?)
        }
        TvType::AntennaID => self.antenna_id = Some(body.get_u16()?),
        TvType::PeakRSSI => self.peak_rssi = Some(body.get_i8()?),
        TvType::ChannelIndex => self.channel_index = Some(body.get_u16()?),
        TvType::FirstSeenTimestampUTC => {
          self.first_seen_timestamp_utc = Some(body.get_u64()?)
        }
        TvType::FirstSeenTimestampUptime => {
          self.first_seen_timestamp_uptime = Some(body.get_u64()?)
        }
        TvType::LastSeenTimestampUTC => {
          self.last_seen_timestamp_utc = Some(body.get_u64()?)
        }
        TvType::LastSeenTimestampUptime => {
          self.last_seen_timestamp_uptime = Some(body.get_u64()?)
        }
        TvType::TagSeenCount => self.tag_seen_count = Some(body.get_u16()?),
        TvType::C1G2PC => self.c1g2_pc = Some(body.get_u16()?),
        TvType::C1G2CRC => self.c1g2_crc = Some(body.get_u16()?),
        TvType::AccessSpecID => self.access_spec_id = Some(body.get_u32()?),
        TvType::EPC96 => {
          return Err(LlrpError::malformed(
            "TagReportData",
            "duplicate EPC-96 after the EPC field",
          ));
        }
      }
    }
  }

  /// Emits the report in the canonical field order; re-encoding a
  /// decoded report that used this order is byte-identical.
  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::TagReportData, |buf| {
      match &self.epc {
        Some(Epc::Data(data)) => data.encode(buf),
        Some(Epc::EPC96(bytes)) => {
          put_tv_header(buf, TvType::EPC96);
          buf.extend_from_slice(bytes);
        }
        None => {}
      }
      if let Some(v) = self.rospec_id {
        put_tv_u32(buf, TvType::ROSpecID, v);
      }
      if let Some(v) = self.spec_index {
        put_tv_u16(buf, TvType::SpecIndex, v);
      }
      if let Some(v) = self.inventory_parameter_spec_id {
        put_tv_u16(buf, TvType::InventoryParameterSpecID, v);
      }
      if let Some(v) = self.antenna_id {
        put_tv_u16(buf, TvType::AntennaID, v);
      }
      if let Some(v) = self.peak_rssi {
        put_tv_i8(buf, TvType::PeakRSSI, v);
      }
      if let Some(v) = self.channel_index {
        put_tv_u16(buf, TvType::ChannelIndex, v);
      }
      if let Some(v) = self.first_seen_timestamp_utc {
        put_tv_u64(buf, TvType::FirstSeenTimestampUTC, v);
      }
      if let Some(v) = self.first_seen_timestamp_uptime {
        put_tv_u64(buf, TvType::FirstSeenTimestampUptime, v);
      }
      if let Some(v) = self.last_seen_timestamp_utc {
        put_tv_u64(buf, TvType::LastSeenTimestampUTC, v);
      }
      if let Some(v) = self.last_seen_timestamp_uptime {
        put_tv_u64(buf, TvType::LastSeenTimestampUptime, v);
      }
      if let Some(v) = self.tag_seen_count {
        put_tv_u16(buf, TvType::TagSeenCount, v);
      }
      if let Some(v) = self.c1g2_pc {
        put_tv_u16(buf, TvType::C1G2PC, v);
      }
      if let Some(v) = self.c1g2_crc {
        put_tv_u16(buf, TvType::C1G2CRC, v);
      }
      if let Some(v) = self.access_spec_id {
        put_tv_u32(buf, TvType::AccessSpecID, v);
      }
      if let Some(result) = &self.op_spec_result {
        result.encode(buf);
      }
    });
  }
}

impl fmt::Display for TagReportData {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.epc_hex())
  }
}

/// One of the nine C1G2 access-operation results trailing a tag report.
/// All variants lead with the result code and the OpSpecID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpSpecResult {
  Read { result: u8, op_spec_id: u16, read_data: Vec<u8> },
  Write { result: u8, op_spec_id: u16, num_words_written: u16 },
  Kill { result: u8, op_spec_id: u16 },
  Recommission { result: u8, op_spec_id: u16 },
  Lock { result: u8, op_spec_id: u16 },
  BlockErase { result: u8, op_spec_id: u16 },
  BlockWrite { result: u8, op_spec_id: u16, num_words_written: u16 },
  BlockPermalock { result: u8, op_spec_id: u16 },
  GetBlockPermalockStatus { result: u8, op_spec_id: u16, permalock_status: Vec<u8> },
}

impl OpSpecResult {

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(code) = r.peek_tlv_type() else {
      return Ok(None);
    };
    let Some(ptype) = ParamType::from_repr(code) else {
      return Ok(None);
    };
    let result = match ptype {
      ParamType::C1G2ReadOpSpecResult => {
        let mut body = r.expect_tlv(ptype)?;
        let result = body.get_u8()?;
        let op_spec_id = body.get_u16()?;
        let word_count = body.get_u16()? as usize;
        let read_data = body.get_bytes(word_count * 2)?.to_vec();
        body.expect_end()?;
        OpSpecResult::Read { result, op_spec_id, read_data }
      }
      ParamType::C1G2WriteOpSpecResult | ParamType::C1G2BlockWriteOpSpecResult => {
        let mut body = r.expect_tlv(ptype)?;
        let result = body.get_u8()?;
        let op_spec_id = body.get_u16()?;
        let num_words_written = body.get_u16()?;
        body.expect_end()?;
        if ptype == ParamType::C1G2WriteOpSpecResult {
          OpSpecResult::Write { result, op_spec_id, num_words_written }
        } else {
          OpSpecResult::BlockWrite { result, op_spec_id, num_words_written }
        }
      }
      ParamType::C1G2KillOpSpecResult
      | ParamType::C1G2RecommissionOpSpecResult
      | ParamType::C1G2LockOpSpecResult
      | ParamType::C1G2BlockEraseOpSpecResult
      | ParamType::C1G2BlockPermalockOpSpecResult => {
        let mut body = r.expect_tlv(ptype)?;
        let result = body.get_u8()?;
        let op_spec_id = body.get_u16()?;
        body.expect_end()?;
        match ptype {
          ParamType::C1G2KillOpSpecResult => OpSpecResult::Kill { result, op_spec_id },
          ParamType::C1G2RecommissionOpSpecResult => {
            OpSpecResult::Recommission { result, op_spec_id }
          }
          ParamType::C1G2LockOpSpecResult => OpSpecResult::Lock { result, op_spec_id },
          ParamType::C1G2BlockEraseOpSpecResult => {
            OpSpecResult::BlockErase { result, op_spec_id }
          }
          _ => OpSpecResult::BlockPermalock { result, op_spec_id },
        }
      }
      ParamType::C1G2GetBlockPermalockStatusOpSpecResult => {
        let mut body = r.expect_tlv(ptype)?;
        let result = body.get_u8()?;
        let op_spec_id = body.get_u16()?;
        let word_count = body.get_u16()? as usize;
        let permalock_status = body.get_bytes(word_count * 2)?.to_vec();
        body.expect_end()?;
        OpSpecResult::GetBlockPermalockStatus { result, op_spec_id, permalock_status }
      }
      _ => return Ok(None),
    };
    Ok(Some(result))
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    match self {
      OpSpecResult::Read { result, op_spec_id, read_data } => {
        encode_tlv(buf, ParamType::C1G2ReadOpSpecResult, |buf| {
          buf.put_u8(*result);
          buf.put_u16(*op_spec_id);
          buf.put_u16((read_data.len() / 2) as u16);
          buf.extend_from_slice(read_data);
        });
      }
      OpSpecResult::Write { result, op_spec_id, num_words_written } => {
        encode_tlv(buf, ParamType::C1G2WriteOpSpecResult, |buf| {
          buf.put_u8(*result);
          buf.put_u16(*op_spec_id);
          buf.put_u16(*num_words_written);
        });
      }
      OpSpecResult::BlockWrite { result, op_spec_id, num_words_written } => {
        encode_tlv(buf, ParamType::C1G2BlockWriteOpSpecResult, |buf| {
          buf.put_u8(*result);
          buf.put_u16(*op_spec_id);
          buf.put_u16(*num_words_written);
        });
      }
      OpSpecResult::Kill { result, op_spec_id } => {
        Self::encode_bare(buf, ParamType::C1G2KillOpSpecResult, *result, *op_spec_id);
      }
      OpSpecResult::Recommission { result, op_spec_id } => {
        Self::encode_bare(buf, ParamType::C1G2RecommissionOpSpecResult, *result, *op_spec_id);
      }
      OpSpecResult::Lock { result, op_spec_id } => {
        Self::encode_bare(buf, ParamType::C1G2LockOpSpecResult, *result, *op_spec_id);
      }
      OpSpecResult::BlockErase { result, op_spec_id } => {
        Self::encode_bare(buf, ParamType::C1G2BlockEraseOpSpecResult, *result, *op_spec_id);
      }
      OpSpecResult::BlockPermalock { result, op_spec_id } => {
        Self::encode_bare(buf, ParamType::C1G2BlockPermalockOpSpecResult, *result, *op_spec_id);
      }
      OpSpecResult::GetBlockPermalockStatus { result, op_spec_id, permalock_status } => {
        encode_tlv(buf, ParamType::C1G2GetBlockPermalockStatusOpSpecResult, |buf| {
          buf.put_u8(*result);
          buf.put_u16(*op_spec_id);
          buf.put_u16((permalock_status.len() / 2) as u16);
          buf.extend_from_slice(permalock_status);
        });
      }
    }
  }

  fn encode_bare(buf: &mut BytesMut, ptype: ParamType, result: u8, op_spec_id: u16) {
    encode_tlv(buf, ptype, |buf| {
      buf.put_u8(result);
      buf.put_u16(op_spec_id);
    });
  }
}

/// Decoded body of RO_ACCESS_REPORT (13.1.1): zero or more tag reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ROAccessReport {
  pub tag_reports: Vec<TagReportData>,
}

impl ROAccessReport {

  pub fn decode(r: &mut Reader) -> Result<Self> {
    let mut tag_reports = Vec::new();
    while let Some(report) = TagReportData::decode(r)? {
      tag_reports.push(report);
    }
    r.expect_consumed()?;
    Ok(ROAccessReport { tag_reports })
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    for report in &self.tag_reports {
      report.encode(buf);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_an_epc96_report_with_tv_trailer() {
    // One TagReportData: EPC-96 of ...1234, then AntennaID 1.
    let mut inner = BytesMut::new();
    encode_tlv(&mut inner, ParamType::TagReportData, |buf| {
      buf.put_u8(0x8d);
      buf.extend_from_slice(&[
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x12, 0x34,
      ]);
      buf.put_u8(0x81);
      buf.put_u16(0x0001);
    });

    let mut r = Reader::new(&inner);
    let report = ROAccessReport::decode(&mut r).unwrap();
    assert_eq!(report.tag_reports.len(), 1);
    let tag = &report.tag_reports[0];
    assert_eq!(tag.epc_hex(), "000000000000000000001234");
    assert_eq!(tag.antenna_id, Some(1));
    assert_eq!(tag.peak_rssi, None);
  }

  #[test]
  fn report_round_trips_in_canonical_order() {
    let tag = TagReportData {
      epc: Some(Epc::EPC96([0xe2; 12])),
      antenna_id: Some(2),
      peak_rssi: Some(-61),
      last_seen_timestamp_utc: Some(1_700_000_000_000_000),
      tag_seen_count: Some(5),
      ..TagReportData::default()
    };
    let mut buf = BytesMut::new();
    tag.encode(&mut buf);

    let decoded = TagReportData::decode(&mut Reader::new(&buf)).unwrap().unwrap();
    assert_eq!(decoded, tag);

    let mut again = BytesMut::new();
    decoded.encode(&mut again);
    assert_eq!(buf, again);
  }

  #[test]
  fn empty_epc_data_decodes_to_empty_epc() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::TagReportData, |buf| {
      EPCData { epc_length_bits: 0, epc: vec![] }.encode(buf);
    });
    let tag = TagReportData::decode(&mut Reader::new(&buf)).unwrap().unwrap();
    assert_eq!(tag.epc, Some(Epc::Data(EPCData { epc_length_bits: 0, epc: vec![] })));
    assert_eq!(tag.epc_hex(), "");
  }

  #[test]
  fn missing_epc_is_rejected() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::TagReportData, |buf| {
      buf.put_u8(0x81);
      buf.put_u16(1);
    });
    assert!(matches!(
      TagReportData::decode(&mut Reader::new(&buf)),
      Err(LlrpError::MissingRequired("EPCData or EPC-96"))
    ));
  }

  #[test]
  fn read_op_spec_result_rides_the_report() {
    let tag = TagReportData {
      epc: Some(Epc::Data(EPCData {
        epc_length_bits: 16,
        epc: vec![0x12, 0x34],
      })),
      op_spec_result: Some(OpSpecResult::Read {
        result: 0,
        op_spec_id: 1,
        read_data: vec![0xca, 0xfe, 0xba, 0xbe],
      }),
      ..TagReportData::default()
    };
    let mut buf = BytesMut::new();
    tag.encode(&mut buf);
    let decoded = TagReportData::decode(&mut Reader::new(&buf)).unwrap().unwrap();
    assert_eq!(decoded, tag);
  }

  #[test]
  fn unknown_tv_code_stops_the_walker_and_trips_trailing_bytes() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::TagReportData, |buf| {
      buf.put_u8(0x8d);
      buf.extend_from_slice(&[0u8; 12]);
      buf.put_u8(0x80 | 0x7e); // unregistered TV type 126
      buf.put_u16(0);
    });
    assert!(matches!(
      TagReportData::decode(&mut Reader::new(&buf)),
      Err(LlrpError::TrailingBytes(3))
    ));
  }
}

use bytes::{BufMut, BytesMut};

use crate::buffer::{encode_tlv, flag, flag_bit, put_bitstring, Reader};
use crate::error::{LlrpError, Result};
use crate::params::AccessReportSpec;
use crate::types::{AirProtocol, ParamType};

const CURRENT_STATE_BIT: u8 = 7;
const MB_SHIFT: u8 = 6;
const MATCH_BIT: u8 = 5;

/// 11.2.1 AccessSpec parameter: a conditional tag-memory operation
/// bound to an ROSpec (zero means any) and an antenna (zero means any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessSpec {
  pub access_spec_id     : u32,
  pub antenna_id         : u16,
  pub protocol_id        : AirProtocol,
  pub current_state      : bool,
  pub rospec_id          : u32,
  pub stop_trigger       : AccessSpecStopTrigger,
  pub access_command     : AccessCommand,
  pub access_report_spec : Option<AccessReportSpec>,
}

impl AccessSpec {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::AccessSpec, |buf| {
      buf.put_u32(self.access_spec_id);
      buf.put_u16(self.antenna_id);
      buf.put_u8(self.protocol_id as u8);
      buf.put_u8(flag_bit(self.current_state, CURRENT_STATE_BIT));
      buf.put_u32(self.rospec_id);
      self.stop_trigger.encode(buf);
      self.access_command.encode(buf);
      if let Some(report_spec) = &self.access_report_spec {
        report_spec.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::AccessSpec)? else {
      return Ok(None);
    };
    let access_spec_id = body.get_u32()?;
    let antenna_id = body.get_u16()?;
    let raw = body.get_u8()?;
    let protocol_id = AirProtocol::from_repr(raw).ok_or_else(|| {
      LlrpError::malformed("AccessSpec", format!("unknown protocol {}", raw))
    })?;
    let current_state = flag(body.get_u8()?, CURRENT_STATE_BIT);
    let rospec_id = body.get_u32()?;
    let stop_trigger = AccessSpecStopTrigger::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("AccessSpecStopTrigger"))?;
    let access_command = AccessCommand::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("AccessCommand"))?;
    let access_report_spec = AccessReportSpec::decode(&mut body)?;
    body.expect_end()?;
    Ok(Some(AccessSpec {
      access_spec_id,
      antenna_id,
      protocol_id,
      current_state,
      rospec_id,
      stop_trigger,
      access_command,
      access_report_spec,
    }))
  }

  pub fn decode_required(r: &mut Reader) -> Result<Self> {
    Self::decode(r)?.ok_or(LlrpError::MissingRequired("AccessSpec"))
  }
}

/// 11.2.1.1 AccessSpecStopTrigger parameter: trigger type 0 (none) or 1
/// (operation count), with the count in the second field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessSpecStopTrigger {
  pub trigger_type          : u8,
  pub operation_count_value : u16,
}

impl AccessSpecStopTrigger {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::AccessSpecStopTrigger, |buf| {
      buf.put_u8(self.trigger_type);
      buf.put_u16(self.operation_count_value);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::AccessSpecStopTrigger)? else {
      return Ok(None);
    };
    let trigger_type = body.get_u8()?;
    let operation_count_value = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(AccessSpecStopTrigger { trigger_type, operation_count_value }))
  }
}

/// 11.2.1.2 AccessCommand parameter: a tag pattern plus exactly one air
/// operation to perform on each matching tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCommand {
  pub tag_spec : C1G2TagSpec,
  pub op_spec  : C1G2OpSpec,
}

impl AccessCommand {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::AccessCommand, |buf| {
      self.tag_spec.encode(buf);
      self.op_spec.encode(buf);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::AccessCommand)? else {
      return Ok(None);
    };
    let tag_spec = C1G2TagSpec::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("C1G2TagSpec"))?;
    let op_spec = C1G2OpSpec::decode(&mut body)?
      .ok_or(LlrpError::MissingRequired("C1G2 OpSpec"))?;
    body.expect_end()?;
    Ok(Some(AccessCommand { tag_spec, op_spec }))
  }
}

/// 16.3.1.3.1 C1G2TagSpec parameter: one or more target-tag patterns,
/// all of which must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1G2TagSpec {
  pub target_tags: Vec<C1G2TargetTag>,
}

impl C1G2TagSpec {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2TagSpec, |buf| {
      for target in &self.target_tags {
        target.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2TagSpec)? else {
      return Ok(None);
    };
    let mut target_tags = Vec::new();
    while let Some(target) = C1G2TargetTag::decode(&mut body)? {
      target_tags.push(target);
    }
    if target_tags.is_empty() {
      return Err(LlrpError::MissingRequired("C1G2TargetTag"));
    }
    body.expect_end()?;
    Ok(Some(C1G2TagSpec { target_tags }))
  }
}

/// 16.3.1.3.1.1 C1G2TargetTag parameter. Mask and data bit-strings are
/// padded to whole bytes on the wire; the bit counts are authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1G2TargetTag {
  pub mb             : u8,
  pub match_flag     : bool,
  pub pointer        : u16,
  pub mask_bit_count : u16,
  pub tag_mask       : Vec<u8>,
  pub data_bit_count : u16,
  pub tag_data       : Vec<u8>,
}

impl C1G2TargetTag {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2TargetTag, |buf| {
      buf.put_u8(((self.mb & 0x3) << MB_SHIFT) | flag_bit(self.match_flag, MATCH_BIT));
      buf.put_u16(self.pointer);
      buf.put_u16(self.mask_bit_count);
      put_bitstring(buf, &self.tag_mask, self.mask_bit_count as usize);
      buf.put_u16(self.data_bit_count);
      put_bitstring(buf, &self.tag_data, self.data_bit_count as usize);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2TargetTag)? else {
      return Ok(None);
    };
    let packed = body.get_u8()?;
    let mb = packed >> MB_SHIFT;
    let match_flag = flag(packed, MATCH_BIT);
    let pointer = body.get_u16()?;
    let mask_bit_count = body.get_u16()?;
    let tag_mask = body.get_bits(mask_bit_count as usize)?.to_vec();
    let data_bit_count = body.get_u16()?;
    let tag_data = body.get_bits(data_bit_count as usize)?.to_vec();
    body.expect_end()?;
    Ok(Some(C1G2TargetTag {
      mb,
      match_flag,
      pointer,
      mask_bit_count,
      tag_mask,
      data_bit_count,
      tag_data,
    }))
  }
}

/// The one air operation an AccessCommand carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum C1G2OpSpec {
  Read(C1G2Read),
  Write(C1G2Write),
  BlockWrite(C1G2BlockWrite),
  Lock(C1G2Lock),
}

impl C1G2OpSpec {

  /// Builds the write variant appropriate for the payload size: a plain
  /// C1G2Write for a single word, C1G2BlockWrite for more.
  pub fn write(
    op_spec_id: u16,
    access_password: u32,
    mb: u8,
    word_ptr: u16,
    write_data: Vec<u8>,
  ) -> Result<Self> {
    if write_data.is_empty() || write_data.len() % 2 != 0 {
      return Err(LlrpError::InvalidArgument(format!(
        "write data must be a non-empty whole number of 16-bit words, got {} bytes",
        write_data.len()
      )));
    }
    let op = if write_data.len() / 2 > 1 {
      C1G2OpSpec::BlockWrite(C1G2BlockWrite {
        op_spec_id,
        access_password,
        mb,
        word_ptr,
        write_data,
      })
    } else {
      C1G2OpSpec::Write(C1G2Write {
        op_spec_id,
        access_password,
        mb,
        word_ptr,
        write_data,
      })
    };
    Ok(op)
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    match self {
      C1G2OpSpec::Read(op) => op.encode(buf),
      C1G2OpSpec::Write(op) => op.encode(buf),
      C1G2OpSpec::BlockWrite(op) => op.encode(buf),
      C1G2OpSpec::Lock(op) => op.encode(buf),
    }
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    if let Some(op) = C1G2Read::decode(r)? {
      return Ok(Some(C1G2OpSpec::Read(op)));
    }
    if let Some(op) = C1G2Write::decode(r)? {
      return Ok(Some(C1G2OpSpec::Write(op)));
    }
    if let Some(op) = C1G2BlockWrite::decode(r)? {
      return Ok(Some(C1G2OpSpec::BlockWrite(op)));
    }
    if let Some(op) = C1G2Lock::decode(r)? {
      return Ok(Some(C1G2OpSpec::Lock(op)));
    }
    Ok(None)
  }
}

/// 16.3.1.3.2.2 C1G2Read parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct C1G2Read {
  pub op_spec_id      : u16,
  pub access_password : u32,
  pub mb              : u8,
  pub word_ptr        : u16,
  pub word_count      : u16,
}

impl C1G2Read {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2Read, |buf| {
      buf.put_u16(self.op_spec_id);
      buf.put_u32(self.access_password);
      buf.put_u8((self.mb & 0x3) << MB_SHIFT);
      buf.put_u16(self.word_ptr);
      buf.put_u16(self.word_count);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2Read)? else {
      return Ok(None);
    };
    let op_spec_id = body.get_u16()?;
    let access_password = body.get_u32()?;
    let mb = body.get_u8()? >> MB_SHIFT;
    let word_ptr = body.get_u16()?;
    let word_count = body.get_u16()?;
    body.expect_end()?;
    Ok(Some(C1G2Read { op_spec_id, access_password, mb, word_ptr, word_count }))
  }
}

/// 16.3.1.3.2.3 C1G2Write parameter. The AccessPassword and the
/// WriteDataWordCount are separate fields in that wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1G2Write {
  pub op_spec_id      : u16,
  pub access_password : u32,
  pub mb              : u8,
  pub word_ptr        : u16,
  pub write_data      : Vec<u8>,
}

impl C1G2Write {

  pub fn word_count(&self) -> u16 {
    (self.write_data.len() / 2) as u16
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2Write, |buf| {
      buf.put_u16(self.op_spec_id);
      buf.put_u32(self.access_password);
      buf.put_u8((self.mb & 0x3) << MB_SHIFT);
      buf.put_u16(self.word_ptr);
      buf.put_u16(self.word_count());
      buf.extend_from_slice(&self.write_data);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2Write)? else {
      return Ok(None);
    };
    let op_spec_id = body.get_u16()?;
    let access_password = body.get_u32()?;
    let mb = body.get_u8()? >> MB_SHIFT;
    let word_ptr = body.get_u16()?;
    let word_count = body.get_u16()? as usize;
    let write_data = body.get_bytes(word_count * 2)?.to_vec();
    body.expect_end()?;
    Ok(Some(C1G2Write { op_spec_id, access_password, mb, word_ptr, write_data }))
  }
}

/// 16.3.1.3.2.7 C1G2BlockWrite parameter; same field layout as
/// C1G2Write under its own type code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1G2BlockWrite {
  pub op_spec_id      : u16,
  pub access_password : u32,
  pub mb              : u8,
  pub word_ptr        : u16,
  pub write_data      : Vec<u8>,
}

impl C1G2BlockWrite {

  pub fn word_count(&self) -> u16 {
    (self.write_data.len() / 2) as u16
  }

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2BlockWrite, |buf| {
      buf.put_u16(self.op_spec_id);
      buf.put_u32(self.access_password);
      buf.put_u8((self.mb & 0x3) << MB_SHIFT);
      buf.put_u16(self.word_ptr);
      buf.put_u16(self.word_count());
      buf.extend_from_slice(&self.write_data);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2BlockWrite)? else {
      return Ok(None);
    };
    let op_spec_id = body.get_u16()?;
    let access_password = body.get_u32()?;
    let mb = body.get_u8()? >> MB_SHIFT;
    let word_ptr = body.get_u16()?;
    let word_count = body.get_u16()? as usize;
    let write_data = body.get_bytes(word_count * 2)?.to_vec();
    body.expect_end()?;
    Ok(Some(C1G2BlockWrite { op_spec_id, access_password, mb, word_ptr, write_data }))
  }
}

/// 16.3.1.3.2.5 C1G2Lock parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct C1G2Lock {
  pub op_spec_id      : u16,
  pub access_password : u32,
  pub payloads        : Vec<C1G2LockPayload>,
}

impl C1G2Lock {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2Lock, |buf| {
      buf.put_u16(self.op_spec_id);
      buf.put_u32(self.access_password);
      for payload in &self.payloads {
        payload.encode(buf);
      }
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2Lock)? else {
      return Ok(None);
    };
    let op_spec_id = body.get_u16()?;
    let access_password = body.get_u32()?;
    let mut payloads = Vec::new();
    while let Some(payload) = C1G2LockPayload::decode(&mut body)? {
      payloads.push(payload);
    }
    if payloads.is_empty() {
      return Err(LlrpError::MissingRequired("C1G2LockPayload"));
    }
    body.expect_end()?;
    Ok(Some(C1G2Lock { op_spec_id, access_password, payloads }))
  }
}

/// 16.3.1.3.2.5.1 C1G2LockPayload parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct C1G2LockPayload {
  pub privilege  : u8,
  pub data_field : i8,
}

impl C1G2LockPayload {

  pub fn encode(&self, buf: &mut BytesMut) {
    encode_tlv(buf, ParamType::C1G2LockPayload, |buf| {
      buf.put_u8(self.privilege);
      buf.put_i8(self.data_field);
    });
  }

  pub fn decode(r: &mut Reader) -> Result<Option<Self>> {
    let Some(mut body) = r.try_tlv(ParamType::C1G2LockPayload)? else {
      return Ok(None);
    };
    let privilege = body.get_u8()?;
    let data_field = body.get_i8()?;
    body.expect_end()?;
    Ok(Some(C1G2LockPayload { privilege, data_field }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn any_tag() -> C1G2TagSpec {
    C1G2TagSpec {
      target_tags: vec![C1G2TargetTag {
        mb: 1,
        match_flag: true,
        pointer: 32,
        mask_bit_count: 0,
        tag_mask: vec![],
        data_bit_count: 0,
        tag_data: vec![],
      }],
    }
  }

  fn spec_with(op_spec: C1G2OpSpec) -> AccessSpec {
    AccessSpec {
      access_spec_id: 44,
      antenna_id: 0,
      protocol_id: AirProtocol::EPCGlobalClass1Gen2,
      current_state: false,
      rospec_id: 0,
      stop_trigger: AccessSpecStopTrigger {
        trigger_type: 1,
        operation_count_value: 1,
      },
      access_command: AccessCommand { tag_spec: any_tag(), op_spec },
      access_report_spec: None,
    }
  }

  #[test]
  fn read_access_spec_round_trips() {
    let spec = spec_with(C1G2OpSpec::Read(C1G2Read {
      op_spec_id: 1,
      access_password: 0,
      mb: 3,
      word_ptr: 0,
      word_count: 2,
    }));

    let mut buf = BytesMut::new();
    spec.encode(&mut buf);
    let mut r = Reader::new(&buf);
    let decoded = AccessSpec::decode_required(&mut r).unwrap();
    assert!(r.is_empty());
    assert_eq!(decoded, spec);

    let mut again = BytesMut::new();
    decoded.encode(&mut again);
    assert_eq!(buf, again);
  }

  #[test]
  fn single_word_writes_stay_plain_writes() {
    let op = C1G2OpSpec::write(1, 0, 3, 2, vec![0xbe, 0xef]).unwrap();
    assert!(matches!(op, C1G2OpSpec::Write(_)));
  }

  #[test]
  fn multi_word_writes_become_block_writes() {
    let op = C1G2OpSpec::write(1, 0, 3, 2, vec![0xde, 0xad, 0xbe, 0xef]).unwrap();
    match &op {
      C1G2OpSpec::BlockWrite(block) => assert_eq!(block.word_count(), 2),
      other => panic!("expected BlockWrite, got {:?}", other),
    }

    let spec = spec_with(op);
    let mut buf = BytesMut::new();
    spec.encode(&mut buf);
    let decoded = AccessSpec::decode_required(&mut Reader::new(&buf)).unwrap();
    assert_eq!(decoded, spec);
  }

  #[test]
  fn odd_write_payloads_are_rejected() {
    assert!(matches!(
      C1G2OpSpec::write(1, 0, 3, 2, vec![0xff]),
      Err(LlrpError::InvalidArgument(_))
    ));
    assert!(matches!(
      C1G2OpSpec::write(1, 0, 3, 2, vec![]),
      Err(LlrpError::InvalidArgument(_))
    ));
  }

  #[test]
  fn target_tag_bitstrings_pad_to_whole_bytes() {
    let target = C1G2TargetTag {
      mb: 1,
      match_flag: false,
      pointer: 16,
      mask_bit_count: 12,
      tag_mask: vec![0xff, 0xf0],
      data_bit_count: 12,
      tag_data: vec![0x12, 0x30],
    };
    let mut buf = BytesMut::new();
    target.encode(&mut buf);
    // header + packed byte + pointer + (count + 2 bytes) * 2
    assert_eq!(buf.len(), 4 + 1 + 2 + 2 + 2 + 2 + 2);
    let decoded = C1G2TargetTag::decode(&mut Reader::new(&buf)).unwrap().unwrap();
    assert_eq!(decoded, target);
  }

  #[test]
  fn lock_op_round_trips_with_payload_list() {
    let spec = spec_with(C1G2OpSpec::Lock(C1G2Lock {
      op_spec_id: 9,
      access_password: 0xdead_beef,
      payloads: vec![
        C1G2LockPayload { privilege: 2, data_field: 1 },
        C1G2LockPayload { privilege: 0, data_field: -1 },
      ],
    }));
    let mut buf = BytesMut::new();
    spec.encode(&mut buf);
    let decoded = AccessSpec::decode_required(&mut Reader::new(&buf)).unwrap();
    assert_eq!(decoded, spec);
  }

  #[test]
  fn tag_spec_requires_at_least_one_target() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::C1G2TagSpec, |_| {});
    assert!(matches!(
      C1G2TagSpec::decode(&mut Reader::new(&buf)),
      Err(LlrpError::MissingRequired("C1G2TargetTag"))
    ));
  }
}

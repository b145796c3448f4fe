use bytes::{BufMut, BytesMut};

use crate::error::{LlrpError, Result};
use crate::types::ParamType;

pub const TLV_HEADER_LEN: usize = 4;

/// Mask isolating the 10-bit parameter type in a TLV header word.
pub const TLV_TYPE_MASK: u16 = 0x03FF;

/// High bit of the leading byte distinguishing TV from TLV encoding.
pub const TV_MARKER_BIT: u8 = 7;

/// Checked big-endian cursor over a borrowed byte slice.
///
/// Every fixed-width read verifies the remaining length first and fails
/// with `Truncated` instead of panicking, mirroring the per-read length
/// guards the decoders need throughout.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
  buf: &'a [u8],
  pos: usize,
}

impl<'a> Reader<'a> {

  pub fn new(buf: &'a [u8]) -> Self {
    Reader { buf, pos: 0 }
  }

  pub fn remaining(&self) -> usize {
    self.buf.len() - self.pos
  }

  pub fn is_empty(&self) -> bool {
    self.pos == self.buf.len()
  }

  pub fn peek_u8(&self) -> Option<u8> {
    self.buf.get(self.pos).copied()
  }

  fn take(&mut self, n: usize) -> Result<&'a [u8]> {
    if self.remaining() < n {
      return Err(LlrpError::Truncated(n - self.remaining()));
    }
    let slice = &self.buf[self.pos..self.pos + n];
    self.pos += n;
    Ok(slice)
  }

  pub fn get_u8(&mut self) -> Result<u8> {
    Ok(self.take(1)?[0])
  }

  pub fn get_i8(&mut self) -> Result<i8> {
    Ok(self.take(1)?[0] as i8)
  }

  pub fn get_u16(&mut self) -> Result<u16> {
    let b = self.take(2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
  }

  pub fn get_u32(&mut self) -> Result<u32> {
    let b = self.take(4)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
  }

  pub fn get_u64(&mut self) -> Result<u64> {
    let b = self.take(8)?;
    Ok(u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
  }

  pub fn get_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
    self.take(n)
  }

  /// Reads a bit-string of `bit_count` bits, padded on the wire to whole
  /// bytes; unused trailing bits are zero by contract.
  pub fn get_bits(&mut self, bit_count: usize) -> Result<&'a [u8]> {
    self.take((bit_count + 7) / 8)
  }

  pub fn skip(&mut self, n: usize) -> Result<()> {
    self.take(n).map(|_| ())
  }

  /// 10-bit type of the next TLV parameter, without consuming it.
  /// `None` when fewer than two bytes remain or the next parameter is
  /// TV-encoded.
  pub fn peek_tlv_type(&self) -> Option<u16> {
    if self.remaining() < 2 {
      return None;
    }
    let word = u16::from_be_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
    if word & 0x8000 != 0 {
      return None;
    }
    Some(word & TLV_TYPE_MASK)
  }

  /// Probes for a TLV parameter of the given type. On a match the whole
  /// parameter is consumed and a cursor over its body is returned; on a
  /// type mismatch (or a TV parameter, or end of input) the cursor is
  /// left untouched and `None` is returned, so optional parameters can
  /// be tried in sequence.
  pub fn try_tlv(&mut self, ptype: ParamType) -> Result<Option<Reader<'a>>> {
    match self.peek_tlv_type() {
      Some(code) if code == ptype as u16 => {}
      _ => return Ok(None),
    }
    if self.remaining() < TLV_HEADER_LEN {
      return Err(LlrpError::Truncated(TLV_HEADER_LEN - self.remaining()));
    }
    let length = u16::from_be_bytes([self.buf[self.pos + 2], self.buf[self.pos + 3]]) as usize;
    if length < TLV_HEADER_LEN {
      return Err(LlrpError::malformed(
        ptype.into(),
        format!("TLV length {} below the {}-byte header", length, TLV_HEADER_LEN),
      ));
    }
    if length > self.remaining() {
      return Err(LlrpError::Truncated(length - self.remaining()));
    }
    let body = &self.buf[self.pos + TLV_HEADER_LEN..self.pos + length];
    self.pos += length;
    Ok(Some(Reader::new(body)))
  }

  /// Like `try_tlv` but the parameter is mandatory.
  pub fn expect_tlv(&mut self, ptype: ParamType) -> Result<Reader<'a>> {
    self
      .try_tlv(ptype)?
      .ok_or(LlrpError::MissingRequired(ptype.into()))
  }

  /// Rejects unconsumed bytes at the end of a parameter body.
  pub fn expect_end(&self) -> Result<()> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(LlrpError::TrailingBytes(self.remaining()))
    }
  }

  /// End-of-container check for top-level message bodies: leftover bytes
  /// that form a plausible TLV header are reported as an unknown
  /// parameter rather than anonymous trailing junk.
  pub fn expect_consumed(&self) -> Result<()> {
    if self.is_empty() {
      return Ok(());
    }
    if self.remaining() >= TLV_HEADER_LEN {
      if let Some(code) = self.peek_tlv_type() {
        if code >= 128 {
          return Err(LlrpError::UnknownParameterType(code));
        }
      }
    }
    Err(LlrpError::TrailingBytes(self.remaining()))
  }
}

/// Emits a TLV parameter: reserved bits zero, 10-bit type, 16-bit length
/// backpatched once the body closure has run.
pub fn encode_tlv<F>(buf: &mut BytesMut, ptype: ParamType, body: F)
where
  F: FnOnce(&mut BytesMut),
{
  let start = buf.len();
  buf.put_u16(ptype as u16);
  buf.put_u16(0); // Length placeholder, rewritten below.
  body(buf);
  let length = (buf.len() - start) as u16;
  buf[start + 2..start + 4].copy_from_slice(&length.to_be_bytes());
}

/// Emits a bit-string padded with zero bits to `ceil(bit_count / 8)`
/// bytes. `bits` may be shorter than the padded width.
pub fn put_bitstring(buf: &mut BytesMut, bits: &[u8], bit_count: usize) {
  let width = (bit_count + 7) / 8;
  let copied = bits.len().min(width);
  buf.extend_from_slice(&bits[..copied]);
  for _ in copied..width {
    buf.put_u8(0);
  }
}

pub fn flag(byte: u8, bit: u8) -> bool {
  byte & (1 << bit) != 0
}

pub fn flag16(word: u16, bit: u8) -> bool {
  word & (1 << bit) != 0
}

pub fn flag_bit(value: bool, bit: u8) -> u8 {
  (value as u8) << bit
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncated_read_reports_missing_bytes() {
    let mut r = Reader::new(&[0x01, 0x02]);
    match r.get_u32() {
      Err(LlrpError::Truncated(n)) => assert_eq!(n, 2),
      other => panic!("expected Truncated, got {:?}", other),
    }
  }

  #[test]
  fn tlv_probe_leaves_reader_untouched_on_mismatch() {
    // An LLRPStatus header (type 287 = 0x011f, length 8).
    let data = [0x01, 0x1f, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00];
    let mut r = Reader::new(&data);
    assert!(r.try_tlv(ParamType::ROSpec).unwrap().is_none());
    assert_eq!(r.remaining(), data.len());
    let body = r.try_tlv(ParamType::LLRPStatus).unwrap().unwrap();
    assert_eq!(body.remaining(), 4);
    assert!(r.is_empty());
  }

  #[test]
  fn tlv_probe_declines_tv_parameters() {
    let data = [0x8d, 0x00, 0x00, 0x00];
    let mut r = Reader::new(&data);
    assert!(r.try_tlv(ParamType::EPCData).unwrap().is_none());
    assert_eq!(r.remaining(), 4);
  }

  #[test]
  fn encode_tlv_backpatches_length() {
    let mut buf = BytesMut::new();
    encode_tlv(&mut buf, ParamType::RFReceiver, |buf| buf.put_u16(7));
    assert_eq!(&buf[..], &[0x00, 0xdf, 0x00, 0x06, 0x00, 0x07]);
  }

  #[test]
  fn bitstring_pads_to_whole_bytes() {
    let mut buf = BytesMut::new();
    put_bitstring(&mut buf, &[0xab], 12);
    assert_eq!(&buf[..], &[0xab, 0x00]);
  }

  #[test]
  fn tlv_length_below_header_is_malformed() {
    let data = [0x01, 0x1f, 0x00, 0x03];
    let mut r = Reader::new(&data);
    assert!(matches!(
      r.try_tlv(ParamType::LLRPStatus),
      Err(LlrpError::Malformed { .. })
    ));
  }
}

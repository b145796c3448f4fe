use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, FromRepr, IntoStaticStr};

// Message type enumerators for LLRP operations.
// See "Table 5: Message Listing" for the full registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u16)]
pub enum MessageType {
  GetReaderCapabilities         = 1,
  GetReaderConfig               = 2,
  SetReaderConfig               = 3,
  CloseConnectionResponse       = 4,
  GetReaderCapabilitiesResponse = 11,
  GetReaderConfigResponse       = 12,
  SetReaderConfigResponse       = 13,
  CloseConnection               = 14,
  AddROSpec                     = 20,
  DeleteROSpec                  = 21,
  StartROSpec                   = 22,
  StopROSpec                    = 23,
  EnableROSpec                  = 24,
  DisableROSpec                 = 25,
  AddROSpecResponse             = 30,
  DeleteROSpecResponse          = 31,
  StartROSpecResponse           = 32,
  StopROSpecResponse            = 33,
  EnableROSpecResponse          = 34,
  DisableROSpecResponse         = 35,
  AddAccessSpec                 = 40,
  DeleteAccessSpec              = 41,
  EnableAccessSpec              = 42,
  DisableAccessSpec             = 43,
  AddAccessSpecResponse         = 50,
  DeleteAccessSpecResponse      = 51,
  EnableAccessSpecResponse      = 52,
  DisableAccessSpecResponse     = 53,
  ROAccessReport                = 61,
  Keepalive                     = 62,
  ReaderEventNotification       = 63,
  EnableEventsAndReports        = 64,
  KeepaliveAck                  = 72,
  ErrorMessage                  = 100,
}

// Parameter type enumerators for TLV-encoded parameters (10-bit type,
// always >= 128). See "Table 6: Parameter Listing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u16)]
pub enum ParamType {
  UTCTimestamp                            = 128,
  Uptime                                  = 129,
  GeneralDeviceCapabilities               = 137,
  ReceiveSensitivityTableEntry            = 139,
  PerAntennaAirProtocol                   = 140,
  GPIOCapabilities                        = 141,
  LLRPCapabilities                        = 142,
  RegulatoryCapabilities                  = 143,
  UHFBandCapabilities                     = 144,
  TransmitPowerLevelTableEntry            = 145,
  FrequencyInformation                    = 146,
  FrequencyHopTable                       = 147,
  FixedFrequencyTable                     = 148,
  PerAntennaReceiveSensitivityRange       = 149,
  ROSpec                                  = 177,
  ROBoundarySpec                          = 178,
  ROSpecStartTrigger                      = 179,
  PeriodicTriggerValue                    = 180,
  GPITriggerValue                         = 181,
  ROSpecStopTrigger                       = 182,
  AISpec                                  = 183,
  AISpecStopTrigger                       = 184,
  TagObservationTrigger                   = 185,
  InventoryParameterSpec                  = 186,
  RFSurveySpec                            = 187,
  AccessSpec                              = 207,
  AccessSpecStopTrigger                   = 208,
  AccessCommand                           = 209,
  LLRPConfigurationStateValue             = 217,
  Identification                          = 218,
  GPOWriteData                            = 219,
  KeepaliveSpec                           = 220,
  AntennaProperties                       = 221,
  AntennaConfiguration                    = 222,
  RFReceiver                              = 223,
  RFTransmitter                           = 224,
  GPIPortCurrentState                     = 225,
  EventsAndReports                        = 226,
  ROReportSpec                            = 237,
  TagReportContentSelector                = 238,
  AccessReportSpec                        = 239,
  TagReportData                           = 240,
  EPCData                                 = 241,
  ReaderEventNotificationSpec             = 244,
  EventNotificationState                  = 245,
  ReaderEventNotificationData             = 246,
  HoppingEvent                            = 247,
  GPIEvent                                = 248,
  ROSpecEvent                             = 249,
  ReportBufferLevelWarningEvent           = 250,
  ReportBufferOverflowErrorEvent          = 251,
  ReaderExceptionEvent                    = 252,
  RFSurveyEvent                           = 253,
  AISpecEvent                             = 254,
  AntennaEvent                            = 255,
  ConnectionAttemptEvent                  = 256,
  ConnectionCloseEvent                    = 257,
  LLRPStatus                              = 287,
  FieldError                              = 288,
  ParameterError                          = 289,
  C1G2LLRPCapabilities                    = 327,
  UHFRFModeTable                          = 328,
  UHFC1G2RFModeTableEntry                 = 329,
  C1G2InventoryCommand                    = 330,
  C1G2Filter                              = 331,
  C1G2TagInventoryMask                    = 332,
  C1G2TagInventoryStateAwareFilterAction  = 333,
  C1G2TagInventoryStateUnawareFilterAction = 334,
  C1G2RFControl                           = 335,
  C1G2SingulationControl                  = 336,
  C1G2TagSpec                             = 338,
  C1G2TargetTag                           = 339,
  C1G2Read                                = 341,
  C1G2Write                               = 342,
  C1G2Lock                                = 344,
  C1G2LockPayload                         = 345,
  C1G2BlockWrite                          = 347,
  C1G2ReadOpSpecResult                    = 349,
  C1G2WriteOpSpecResult                   = 350,
  C1G2KillOpSpecResult                    = 351,
  C1G2LockOpSpecResult                    = 352,
  C1G2BlockEraseOpSpecResult              = 353,
  C1G2BlockWriteOpSpecResult              = 354,
  C1G2RecommissionOpSpecResult            = 360,
  C1G2BlockPermalockOpSpecResult          = 361,
  C1G2GetBlockPermalockStatusOpSpecResult = 362,
  MaximumReceiveSensitivity               = 363,
  RFSurveyFrequencyCapabilities           = 365,
}

// Parameter type enumerators for TV-encoded parameters (7-bit type,
// always < 128, high bit set on the wire). Body widths are implicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u8)]
pub enum TvType {
  AntennaID                = 1,
  FirstSeenTimestampUTC    = 2,
  FirstSeenTimestampUptime = 3,
  LastSeenTimestampUTC     = 4,
  LastSeenTimestampUptime  = 5,
  PeakRSSI                 = 6,
  ChannelIndex             = 7,
  TagSeenCount             = 8,
  ROSpecID                 = 9,
  InventoryParameterSpecID = 10,
  #[strum(serialize = "C1G2_CRC")]
  C1G2CRC                  = 11,
  #[strum(serialize = "C1G2_PC")]
  C1G2PC                   = 12,
  #[strum(serialize = "EPC-96")]
  EPC96                    = 13,
  SpecIndex                = 14,
  AccessSpecID             = 16,
}

impl TvType {

  /// Fixed body width in bytes for the TV encoding of this parameter.
  pub fn value_len(self) -> usize {
    match self {
      TvType::PeakRSSI => 1,
      TvType::AntennaID
      | TvType::ChannelIndex
      | TvType::TagSeenCount
      | TvType::InventoryParameterSpecID
      | TvType::C1G2CRC
      | TvType::C1G2PC
      | TvType::SpecIndex => 2,
      TvType::ROSpecID | TvType::AccessSpecID => 4,
      TvType::FirstSeenTimestampUTC
      | TvType::FirstSeenTimestampUptime
      | TvType::LastSeenTimestampUTC
      | TvType::LastSeenTimestampUptime => 8,
      TvType::EPC96 => 12,
    }
  }
}

// 14.1.1 Error message status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u16)]
pub enum StatusCode {
  Success                = 0,
  ParameterError         = 100,
  FieldError             = 101,
  UnexpectedParameter    = 102,
  MissingParameter       = 103,
  DuplicateParameter     = 104,
  OverflowParameter      = 105,
  OverflowField          = 106,
  UnknownParameter       = 107,
  UnknownField           = 108,
  UnsupportedMessage     = 109,
  UnsupportedVersion     = 110,
  UnsupportedParameter   = 111,
  #[strum(serialize = "P_ParameterError")]
  PParameterError        = 200,
  #[strum(serialize = "P_FieldError")]
  PFieldError            = 201,
  #[strum(serialize = "P_UnexpectedParameter")]
  PUnexpectedParameter   = 202,
  #[strum(serialize = "P_MissingParameter")]
  PMissingParameter      = 203,
  #[strum(serialize = "P_DuplicateParameter")]
  PDuplicateParameter    = 204,
  #[strum(serialize = "P_OverflowParameter")]
  POverflowParameter     = 205,
  #[strum(serialize = "P_OverflowField")]
  POverflowField         = 206,
  #[strum(serialize = "P_UnknownParameter")]
  PUnknownParameter      = 207,
  #[strum(serialize = "P_UnknownField")]
  PUnknownField          = 208,
  #[strum(serialize = "P_UnsupportedParameter")]
  PUnsupportedParameter  = 209,
  #[strum(serialize = "A_Invalid")]
  AInvalid               = 300,
  #[strum(serialize = "A_OutOfRange")]
  AOutOfRange            = 301,
  DeviceError            = 401,
}

// 10.2.1 ROSpec states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum ROSpecState {
  Disabled = 0,
  Inactive = 1,
  Active   = 2,
}

// 10.2.1.1.1 ROSpec start triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum StartTriggerType {
  Null      = 0,
  Immediate = 1,
  Periodic  = 2,
  GPI       = 3,
}

// 10.2.1.1.2 ROSpec / AISpec stop triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum StopTriggerType {
  Null           = 0,
  Duration       = 1,
  GPIWithTimeout = 2,
  TagObservation = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum AirProtocol {
  UnspecifiedAirProtocol = 0,
  EPCGlobalClass1Gen2    = 1,
}

// 13.2.1 ROReportTrigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum ROReportTrigger {
  None                     = 0,
  #[strum(serialize = "Upon_N_Tags_Or_End_Of_AISpec")]
  UponNTagsOrEndOfAISpec   = 1,
  #[strum(serialize = "Upon_N_Tags_Or_End_Of_ROSpec")]
  UponNTagsOrEndOfROSpec   = 2,
}

// 16.2.1.1.2.1 forward-link modulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr, Default)]
#[repr(u8)]
pub enum Modulation {
  FM0 = 0,
  M2  = 1,
  #[default]
  M4  = 2,
  M8  = 3,
}

// 13.2.6.11 Connection attempt events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u16)]
pub enum ConnectionAttemptStatus {
  Success                = 0,
  ReaderInitiatedExists  = 1,
  ClientInitiatedExists  = 2,
  OtherFailure           = 3,
  AnotherAttempted       = 4,
}

// 9.1.1 Capabilities requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum CapabilityRequest {
  All                          = 0,
  GeneralDeviceCapabilities    = 1,
  LLRPCapabilities             = 2,
  RegulatoryCapabilities       = 3,
  AirProtocolLLRPCapabilities  = 4,
}

/// Reverse registry: TLV type code to canonical parameter name.
pub static TLV_PARAM_NAMES: Lazy<BTreeMap<u16, &'static str>> =
  Lazy::new(|| ParamType::iter().map(|p| (p as u16, p.into())).collect());

/// Reverse registry: TV type code to canonical parameter name.
pub static TV_PARAM_NAMES: Lazy<BTreeMap<u8, &'static str>> =
  Lazy::new(|| TvType::iter().map(|p| (p as u8, p.into())).collect());

/// Canonical name for a TLV type code, for diagnostics.
pub fn tlv_param_name(code: u16) -> &'static str {
  TLV_PARAM_NAMES.get(&code).copied().unwrap_or("UnknownParameter")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn registries_are_disjoint() {
    // TLV codes occupy the 10-bit space at and above 128, TV codes the
    // 7-bit space below it.
    for code in TLV_PARAM_NAMES.keys() {
      assert!(*code >= 128);
    }
    for code in TV_PARAM_NAMES.keys() {
      assert!(*code < 128);
    }
  }

  #[test]
  fn status_codes_round_trip_names() {
    assert_eq!(StatusCode::from_repr(0), Some(StatusCode::Success));
    assert_eq!(StatusCode::from_repr(111), Some(StatusCode::UnsupportedParameter));
    assert_eq!(StatusCode::PParameterError.to_string(), "P_ParameterError");
    assert_eq!(StatusCode::AOutOfRange.to_string(), "A_OutOfRange");
    assert_eq!(StatusCode::from_repr(42), None);
  }

  #[test]
  fn tv_widths_match_llrp_table() {
    assert_eq!(TvType::EPC96.value_len(), 12);
    assert_eq!(TvType::PeakRSSI.value_len(), 1);
    assert_eq!(TvType::ROSpecID.value_len(), 4);
    assert_eq!(TvType::LastSeenTimestampUTC.value_len(), 8);
  }
}

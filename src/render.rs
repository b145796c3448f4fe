//! Hierarchical textual rendering of decoded values for logs, in the
//! same XML-ish shape readers are usually debugged with. Output is
//! write-only; nothing ever parses it back.

use std::fmt;

use crate::accessspec::{
  AccessCommand, AccessSpec, AccessSpecStopTrigger, C1G2Lock, C1G2OpSpec, C1G2TagSpec,
  C1G2TargetTag,
};
use crate::capabilities::{
  C1G2LLRPCapabilities, FixedFrequencyTable, FrequencyHopTable, FrequencyInformation,
  GeneralDeviceCapabilities, GPIOCapabilities, LLRPCapabilities, ReaderCapabilities,
  RegulatoryCapabilities, UHFBandCapabilities, UHFC1G2RFModeTableEntry, UHFRFModeTable,
};
use crate::events::{ReaderEventNotificationData, EventTimestamp};
use crate::messages::{LlrpMessage, Message, StatusResponse};
use crate::params::{LLRPStatus, ParameterError, ReaderConfig};
use crate::report::{Epc, OpSpecResult, ROAccessReport, TagReportData};
use crate::rospec::{
  AISpec, AntennaConfiguration, C1G2InventoryCommand, InventoryParameterSpec, ROBoundarySpec,
  ROReportSpec, ROSpec, TagReportContentSelector,
};

/// One rendered element: a name, leaf fields in declaration order, and
/// nested children.
#[derive(Debug, Clone)]
pub struct Node {
  name     : &'static str,
  fields   : Vec<(&'static str, String)>,
  children : Vec<Node>,
}

impl Node {

  pub fn new(name: &'static str) -> Self {
    Node { name, fields: Vec::new(), children: Vec::new() }
  }

  pub fn field(mut self, name: &'static str, value: impl fmt::Display) -> Self {
    self.fields.push((name, value.to_string()));
    self
  }

  pub fn opt_field(self, name: &'static str, value: Option<impl fmt::Display>) -> Self {
    match value {
      Some(value) => self.field(name, value),
      None => self,
    }
  }

  pub fn child(mut self, node: Node) -> Self {
    self.children.push(node);
    self
  }

  pub fn opt_child(self, node: Option<Node>) -> Self {
    match node {
      Some(node) => self.child(node),
      None => self,
    }
  }

  pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
    self.children.extend(nodes);
    self
  }

  fn write(&self, out: &mut String, level: usize) {
    let tabs = "\t".repeat(level);
    out.push_str(&format!("{}<{}>\n", tabs, self.name));
    for (name, value) in &self.fields {
      out.push_str(&format!("{}\t<{}>{}</{}>\n", tabs, name, value, name));
    }
    for child in &self.children {
      child.write(out, level + 1);
    }
    out.push_str(&format!("{}</{}>\n", tabs, self.name));
  }

  pub fn render(&self) -> String {
    let mut out = String::new();
    self.write(&mut out, 0);
    out
  }
}

/// Structured-value to render-tree conversion.
pub trait ToNode {
  fn to_node(&self) -> Node;
}

fn hex_str(bytes: &[u8]) -> String {
  bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl ToNode for LLRPStatus {
  fn to_node(&self) -> Node {
    let mut node = Node::new("LLRPStatus")
      .field("StatusCode", self.status_code)
      .field("ErrorDescription", &self.error_description);
    if let Some(fe) = &self.field_error {
      node = node.child(
        Node::new("FieldError")
          .field("FieldNum", fe.field_num)
          .field("ErrorCode", fe.error_code),
      );
    }
    node.opt_child(self.parameter_error.as_ref().map(ToNode::to_node))
  }
}

impl ToNode for ParameterError {
  fn to_node(&self) -> Node {
    let mut node = Node::new("ParameterError")
      .field("ParameterType", self.parameter_type)
      .field("ErrorCode", self.error_code);
    if let Some(fe) = &self.field_error {
      node = node.child(
        Node::new("FieldError")
          .field("FieldNum", fe.field_num)
          .field("ErrorCode", fe.error_code),
      );
    }
    node.opt_child(self.parameter_error.as_ref().map(|pe| pe.to_node()))
  }
}

impl ToNode for StatusResponse {
  fn to_node(&self) -> Node {
    self.status.to_node()
  }
}

// ===== capabilities =====

impl ToNode for ReaderCapabilities {
  fn to_node(&self) -> Node {
    Node::new("GET_READER_CAPABILITIES_RESPONSE")
      .child(self.status.to_node())
      .opt_child(self.general_device_capabilities.as_ref().map(ToNode::to_node))
      .opt_child(self.llrp_capabilities.as_ref().map(ToNode::to_node))
      .opt_child(self.regulatory_capabilities.as_ref().map(ToNode::to_node))
      .opt_child(self.c1g2_llrp_capabilities.as_ref().map(ToNode::to_node))
  }
}

impl ToNode for GeneralDeviceCapabilities {
  fn to_node(&self) -> Node {
    let mut node = Node::new("GeneralDeviceCapabilities")
      .field("MaxNumberOfAntennaSupported", self.max_antennas_supported)
      .field("CanSetAntennaProperties", self.can_set_antenna_properties)
      .field("HasUTCClockCapability", self.has_utc_clock_capability)
      .field("DeviceManufacturerName", self.device_manufacturer_name)
      .field("ModelName", self.model_name)
      .field("ReaderFirmwareVersion", &self.reader_firmware_version);
    for entry in &self.receive_sensitivity_table {
      node = node.child(
        Node::new("ReceiveSensitivityTableEntry")
          .field("Index", entry.index)
          .field("ReceiveSensitivityValue", entry.receive_sensitivity_value),
      );
    }
    if let Some(gpio) = &self.gpio_capabilities {
      node = node.child(gpio.to_node());
    }
    for proto in &self.per_antenna_air_protocols {
      node = node.child(
        Node::new("PerAntennaAirProtocol")
          .field("AntennaID", proto.antenna_id)
          .field("ProtocolIDs", hex_str(&proto.protocol_ids)),
      );
    }
    node
  }
}

impl ToNode for GPIOCapabilities {
  fn to_node(&self) -> Node {
    Node::new("GPIOCapabilities")
      .field("NumGPIs", self.num_gpis)
      .field("NumGPOs", self.num_gpos)
  }
}

impl ToNode for LLRPCapabilities {
  fn to_node(&self) -> Node {
    Node::new("LLRPCapabilities")
      .field("CanDoRFSurvey", self.can_do_rf_survey)
      .field("CanReportBufferFillWarning", self.can_report_buffer_fill_warning)
      .field("SupportsClientRequestOpSpec", self.supports_client_request_op_spec)
      .field(
        "CanDoTagInventoryStateAwareSingulation",
        self.can_do_tag_inventory_state_aware_singulation,
      )
      .field("SupportsEventAndReportHolding", self.supports_event_and_report_holding)
      .field("MaxPriorityLevelSupported", self.max_priority_level_supported)
      .field("MaxNumROSpec", self.max_num_ro_specs)
      .field("MaxNumAccessSpec", self.max_num_access_specs)
  }
}

impl ToNode for RegulatoryCapabilities {
  fn to_node(&self) -> Node {
    Node::new("RegulatoryCapabilities")
      .field("CountryCode", self.country_code)
      .field("CommunicationsStandard", self.communications_standard)
      .opt_child(self.uhf_band_capabilities.as_ref().map(ToNode::to_node))
  }
}

impl ToNode for UHFBandCapabilities {
  fn to_node(&self) -> Node {
    let mut node = Node::new("UHFBandCapabilities");
    for entry in &self.transmit_power_levels {
      node = node.child(
        Node::new("TransmitPowerLevelTableEntry")
          .field("Index", entry.index)
          .field("TransmitPowerValue", entry.transmit_power_value),
      );
    }
    node
      .opt_child(self.frequency_information.as_ref().map(ToNode::to_node))
      .opt_child(self.rf_mode_table.as_ref().map(ToNode::to_node))
  }
}

impl ToNode for FrequencyInformation {
  fn to_node(&self) -> Node {
    Node::new("FrequencyInformation")
      .field("Hopping", self.hopping)
      .children(self.frequency_hop_tables.iter().map(ToNode::to_node))
      .opt_child(self.fixed_frequency_table.as_ref().map(ToNode::to_node))
  }
}

impl ToNode for FrequencyHopTable {
  fn to_node(&self) -> Node {
    Node::new("FrequencyHopTable")
      .field("HopTableId", self.hop_table_id)
      .field("NumHops", self.frequencies.len())
      .field(
        "Frequencies",
        self
          .frequencies
          .iter()
          .map(u32::to_string)
          .collect::<Vec<_>>()
          .join(" "),
      )
  }
}

impl ToNode for FixedFrequencyTable {
  fn to_node(&self) -> Node {
    Node::new("FixedFrequencyTable")
      .field("NumFrequencies", self.frequencies.len())
      .field(
        "Frequencies",
        self
          .frequencies
          .iter()
          .map(u32::to_string)
          .collect::<Vec<_>>()
          .join(" "),
      )
  }
}

impl ToNode for UHFRFModeTable {
  fn to_node(&self) -> Node {
    Node::new("UHFRFModeTable").children(self.entries.iter().map(ToNode::to_node))
  }
}

impl ToNode for UHFC1G2RFModeTableEntry {
  fn to_node(&self) -> Node {
    Node::new("UHFC1G2RFModeTableEntry")
      .field("ModeIdentifier", self.mode_identifier)
      .field("Mod", self.modulation)
      .field("BDR", self.bdr)
      .field("MinTari", self.min_tari)
      .field("MaxTari", self.max_tari)
      .field("StepTari", self.step_tari)
  }
}

impl ToNode for C1G2LLRPCapabilities {
  fn to_node(&self) -> Node {
    Node::new("C1G2LLRPCapabilities")
      .field("SupportsBlockErase", self.supports_block_erase)
      .field("SupportsBlockWrite", self.supports_block_write)
      .field("MaxNumSelectFiltersPerQuery", self.max_select_filters_per_query)
  }
}

// ===== ROSpec tree =====

impl ToNode for ROSpec {
  fn to_node(&self) -> Node {
    Node::new("ROSpec")
      .field("ROSpecID", self.rospec_id)
      .field("Priority", self.priority)
      .field("CurrentState", self.current_state)
      .child(self.boundary_spec.to_node())
      .children(self.ai_specs.iter().map(ToNode::to_node))
      .opt_child(self.report_spec.as_ref().map(ToNode::to_node))
  }
}

impl ToNode for ROBoundarySpec {
  fn to_node(&self) -> Node {
    let start = Node::new("ROSpecStartTrigger")
      .field("ROSpecStartTriggerType", self.start_trigger.trigger_type);
    let stop = Node::new("ROSpecStopTrigger")
      .field("ROSpecStopTriggerType", self.stop_trigger.trigger_type)
      .field("DurationTriggerValue", self.stop_trigger.duration_ms);
    Node::new("ROBoundarySpec").child(start).child(stop)
  }
}

impl ToNode for AISpec {
  fn to_node(&self) -> Node {
    Node::new("AISpec")
      .field("AntennaCount", self.antenna_ids.len())
      .field(
        "AntennaIDs",
        self
          .antenna_ids
          .iter()
          .map(u16::to_string)
          .collect::<Vec<_>>()
          .join(" "),
      )
      .child(
        Node::new("AISpecStopTrigger")
          .field("AISpecStopTriggerType", self.stop_trigger.trigger_type)
          .field("DurationTriggerValue", self.stop_trigger.duration_ms),
      )
      .child(self.inventory_spec.to_node())
  }
}

impl ToNode for InventoryParameterSpec {
  fn to_node(&self) -> Node {
    Node::new("InventoryParameterSpec")
      .field("InventoryParameterSpecID", self.spec_id)
      .field("ProtocolID", self.protocol_id)
      .children(self.antenna_configurations.iter().map(ToNode::to_node))
  }
}

impl ToNode for AntennaConfiguration {
  fn to_node(&self) -> Node {
    let mut node = Node::new("AntennaConfiguration").field("AntennaID", self.antenna_id);
    if let Some(receiver) = &self.rf_receiver {
      node = node.child(
        Node::new("RFReceiver").field("ReceiverSensitivity", receiver.receiver_sensitivity),
      );
    }
    if let Some(transmitter) = &self.rf_transmitter {
      node = node.child(
        Node::new("RFTransmitter")
          .field("HopTableId", transmitter.hop_table_id)
          .field("ChannelIndex", transmitter.channel_index)
          .field("TransmitPower", transmitter.transmit_power),
      );
    }
    node.opt_child(self.inventory_command.as_ref().map(ToNode::to_node))
  }
}

impl ToNode for C1G2InventoryCommand {
  fn to_node(&self) -> Node {
    let mut node = Node::new("C1G2InventoryCommand")
      .field("TagInventoryStateAware", self.tag_inventory_state_aware);
    if let Some(rf_control) = &self.rf_control {
      node = node.child(
        Node::new("C1G2RFControl")
          .field("ModeIndex", rf_control.mode_index)
          .field("Tari", rf_control.tari),
      );
    }
    if let Some(singulation) = &self.singulation_control {
      node = node.child(
        Node::new("C1G2SingulationControl")
          .field("Session", singulation.session)
          .field("TagPopulation", singulation.tag_population)
          .field("TagTransitTime", singulation.tag_transit_time),
      );
    }
    node
  }
}

impl ToNode for ROReportSpec {
  fn to_node(&self) -> Node {
    Node::new("ROReportSpec")
      .field("ROReportTrigger", self.ro_report_trigger)
      .field("N", self.n)
      .child(self.content_selector.to_node())
  }
}

impl ToNode for TagReportContentSelector {
  fn to_node(&self) -> Node {
    Node::new("TagReportContentSelector")
      .field("EnableROSpecID", self.enable_rospec_id)
      .field("EnableSpecIndex", self.enable_spec_index)
      .field("EnableInventoryParameterSpecID", self.enable_inventory_parameter_spec_id)
      .field("EnableAntennaID", self.enable_antenna_id)
      .field("EnableChannelIndex", self.enable_channel_index)
      .field("EnablePeakRSSI", self.enable_peak_rssi)
      .field("EnableFirstSeenTimestamp", self.enable_first_seen_timestamp)
      .field("EnableLastSeenTimestamp", self.enable_last_seen_timestamp)
      .field("EnableTagSeenCount", self.enable_tag_seen_count)
      .field("EnableAccessSpecID", self.enable_access_spec_id)
  }
}

// ===== AccessSpec tree =====

impl ToNode for AccessSpec {
  fn to_node(&self) -> Node {
    Node::new("AccessSpec")
      .field("AccessSpecID", self.access_spec_id)
      .field("AntennaID", self.antenna_id)
      .field("ProtocolID", self.protocol_id)
      .field("C", self.current_state)
      .field("ROSpecID", self.rospec_id)
      .child(self.stop_trigger.to_node())
      .child(self.access_command.to_node())
  }
}

impl ToNode for AccessSpecStopTrigger {
  fn to_node(&self) -> Node {
    Node::new("AccessSpecStopTrigger")
      .field("AccessSpecStopTriggerType", self.trigger_type)
      .field("OperationCountValue", self.operation_count_value)
  }
}

impl ToNode for AccessCommand {
  fn to_node(&self) -> Node {
    Node::new("AccessCommand")
      .child(self.tag_spec.to_node())
      .child(self.op_spec.to_node())
  }
}

impl ToNode for C1G2TagSpec {
  fn to_node(&self) -> Node {
    Node::new("C1G2TagSpec").children(self.target_tags.iter().map(ToNode::to_node))
  }
}

impl ToNode for C1G2TargetTag {
  fn to_node(&self) -> Node {
    Node::new("C1G2TargetTag")
      .field("MB", self.mb)
      .field("M", self.match_flag)
      .field("Pointer", self.pointer)
      .field("MaskBitCount", self.mask_bit_count)
      .field("TagMask", hex_str(&self.tag_mask))
      .field("DataBitCount", self.data_bit_count)
      .field("TagData", hex_str(&self.tag_data))
  }
}

impl ToNode for C1G2OpSpec {
  fn to_node(&self) -> Node {
    match self {
      C1G2OpSpec::Read(op) => Node::new("C1G2Read")
        .field("OpSpecID", op.op_spec_id)
        .field("AccessPassword", op.access_password)
        .field("MB", op.mb)
        .field("WordPtr", op.word_ptr)
        .field("WordCount", op.word_count),
      C1G2OpSpec::Write(op) => Node::new("C1G2Write")
        .field("OpSpecID", op.op_spec_id)
        .field("AccessPassword", op.access_password)
        .field("MB", op.mb)
        .field("WordPtr", op.word_ptr)
        .field("WriteDataWordCount", op.word_count())
        .field("WriteData", hex_str(&op.write_data)),
      C1G2OpSpec::BlockWrite(op) => Node::new("C1G2BlockWrite")
        .field("OpSpecID", op.op_spec_id)
        .field("AccessPassword", op.access_password)
        .field("MB", op.mb)
        .field("WordPtr", op.word_ptr)
        .field("WriteDataWordCount", op.word_count())
        .field("WriteData", hex_str(&op.write_data)),
      C1G2OpSpec::Lock(op) => lock_node(op),
    }
  }
}

fn lock_node(op: &C1G2Lock) -> Node {
  let mut node = Node::new("C1G2Lock")
    .field("OpSpecID", op.op_spec_id)
    .field("AccessPassword", op.access_password);
  for payload in &op.payloads {
    node = node.child(
      Node::new("C1G2LockPayload")
        .field("Privilege", payload.privilege)
        .field("DataField", payload.data_field),
    );
  }
  node
}

// ===== reports =====

impl ToNode for ROAccessReport {
  fn to_node(&self) -> Node {
    Node::new("RO_ACCESS_REPORT").children(self.tag_reports.iter().map(ToNode::to_node))
  }
}

impl ToNode for TagReportData {
  fn to_node(&self) -> Node {
    let mut node = Node::new("TagReportData");
    match &self.epc {
      Some(Epc::Data(data)) => {
        node = node.child(
          Node::new("EPCData")
            .field("EPCLengthBits", data.epc_length_bits)
            .field("EPC", hex_str(&data.epc)),
        );
      }
      Some(epc @ Epc::EPC96(_)) => {
        node = node.field("EPC-96", epc.as_hex());
      }
      None => {}
    }
    node
      .opt_field("ROSpecID", self.rospec_id)
      .opt_field("SpecIndex", self.spec_index)
      .opt_field("InventoryParameterSpecID", self.inventory_parameter_spec_id)
      .opt_field("AntennaID", self.antenna_id)
      .opt_field("PeakRSSI", self.peak_rssi)
      .opt_field("ChannelIndex", self.channel_index)
      .opt_field("FirstSeenTimestampUTC", self.first_seen_timestamp_utc)
      .opt_field("FirstSeenTimestampUptime", self.first_seen_timestamp_uptime)
      .opt_field("LastSeenTimestampUTC", self.last_seen_timestamp_utc)
      .opt_field("LastSeenTimestampUptime", self.last_seen_timestamp_uptime)
      .opt_field("TagSeenCount", self.tag_seen_count)
      .opt_field("C1G2_PC", self.c1g2_pc)
      .opt_field("C1G2_CRC", self.c1g2_crc)
      .opt_field("AccessSpecID", self.access_spec_id)
      .opt_child(self.op_spec_result.as_ref().map(ToNode::to_node))
  }
}

impl ToNode for OpSpecResult {
  fn to_node(&self) -> Node {
    match self {
      OpSpecResult::Read { result, op_spec_id, read_data } => Node::new("C1G2ReadOpSpecResult")
        .field("Result", result)
        .field("OpSpecID", op_spec_id)
        .field("ReadDataWordCount", read_data.len() / 2)
        .field("ReadData", hex_str(read_data)),
      OpSpecResult::Write { result, op_spec_id, num_words_written } => {
        Node::new("C1G2WriteOpSpecResult")
          .field("Result", result)
          .field("OpSpecID", op_spec_id)
          .field("NumWordsWritten", num_words_written)
      }
      OpSpecResult::Kill { result, op_spec_id } => Node::new("C1G2KillOpSpecResult")
        .field("Result", result)
        .field("OpSpecID", op_spec_id),
      OpSpecResult::Recommission { result, op_spec_id } => {
        Node::new("C1G2RecommissionOpSpecResult")
          .field("Result", result)
          .field("OpSpecID", op_spec_id)
      }
      OpSpecResult::Lock { result, op_spec_id } => Node::new("C1G2LockOpSpecResult")
        .field("Result", result)
        .field("OpSpecID", op_spec_id),
      OpSpecResult::BlockErase { result, op_spec_id } => Node::new("C1G2BlockEraseOpSpecResult")
        .field("Result", result)
        .field("OpSpecID", op_spec_id),
      OpSpecResult::BlockWrite { result, op_spec_id, num_words_written } => {
        Node::new("C1G2BlockWriteOpSpecResult")
          .field("Result", result)
          .field("OpSpecID", op_spec_id)
          .field("NumWordsWritten", num_words_written)
      }
      OpSpecResult::BlockPermalock { result, op_spec_id } => {
        Node::new("C1G2BlockPermalockOpSpecResult")
          .field("Result", result)
          .field("OpSpecID", op_spec_id)
      }
      OpSpecResult::GetBlockPermalockStatus { result, op_spec_id, permalock_status } => {
        Node::new("C1G2GetBlockPermalockStatusOpSpecResult")
          .field("Result", result)
          .field("OpSpecID", op_spec_id)
          .field("StatusWordCount", permalock_status.len() / 2)
          .field("PermalockStatus", hex_str(permalock_status))
      }
    }
  }
}

// ===== events and config =====

impl ToNode for ReaderEventNotificationData {
  fn to_node(&self) -> Node {
    let mut node = Node::new("ReaderEventNotificationData");
    node = match &self.timestamp {
      EventTimestamp::Utc(ts) => {
        node.child(Node::new("UTCTimestamp").field("Microseconds", ts.microseconds))
      }
      EventTimestamp::Uptime(ts) => {
        node.child(Node::new("Uptime").field("Microseconds", ts.microseconds))
      }
    };
    if let Some(event) = &self.rospec_event {
      node = node.child(
        Node::new("ROSpecEvent")
          .field("EventType", event.event_type)
          .field("ROSpecID", event.rospec_id),
      );
    }
    if let Some(event) = &self.reader_exception_event {
      node = node.child(Node::new("ReaderExceptionEvent").field("Message", &event.message));
    }
    if let Some(event) = &self.antenna_event {
      node = node.child(
        Node::new("AntennaEvent")
          .field("EventType", event.event_type)
          .field("AntennaID", event.antenna_id),
      );
    }
    if let Some(event) = &self.connection_attempt_event {
      node = node.child(Node::new("ConnectionAttemptEvent").field("Status", event.status));
    }
    if self.connection_close_event.is_some() {
      node = node.child(Node::new("ConnectionCloseEvent"));
    }
    node
  }
}

impl ToNode for ReaderConfig {
  fn to_node(&self) -> Node {
    let mut node = Node::new("GET_READER_CONFIG_RESPONSE").child(self.status.to_node());
    if let Some(ident) = &self.identification {
      node = node.child(
        Node::new("Identification")
          .field("IDType", ident.id_type)
          .field("ReaderID", hex_str(&ident.reader_id)),
      );
    }
    for props in &self.antenna_properties {
      node = node.child(
        Node::new("AntennaProperties")
          .field("Connected", props.connected)
          .field("AntennaID", props.antenna_id)
          .field("AntennaGain", props.antenna_gain),
      );
    }
    for conf in &self.antenna_configurations {
      node = node.child(conf.to_node());
    }
    if let Some(spec) = &self.keepalive_spec {
      node = node.child(
        Node::new("KeepaliveSpec")
          .field("KeepaliveTriggerType", spec.trigger_type)
          .field("TimeInterval", spec.time_interval_ms),
      );
    }
    if let Some(events) = &self.events_and_reports {
      node = node.child(
        Node::new("EventsAndReports").field(
          "HoldEventsAndReportsUponReconnect",
          events.hold_events_and_reports_upon_reconnect,
        ),
      );
    }
    node
  }
}

// ===== messages =====

impl ToNode for Message {
  fn to_node(&self) -> Node {
    match self {
      Message::GetReaderCapabilities(body) => {
        Node::new("GET_READER_CAPABILITIES").field("RequestedData", body.requested_data)
      }
      Message::GetReaderCapabilitiesResponse(body) => body.to_node(),
      Message::GetReaderConfig(body) => Node::new("GET_READER_CONFIG")
        .field("Antenna", body.antenna_id)
        .field("RequestedData", body.requested_data)
        .field("GPI", body.gpi_port_num)
        .field("GPO", body.gpo_port_num),
      Message::GetReaderConfigResponse(body) => body.to_node(),
      Message::SetReaderConfig(body) => {
        let mut node =
          Node::new("SET_READER_CONFIG").field("R", body.restore_factory_settings);
        if let Some(events) = &body.events_and_reports {
          node = node.child(Node::new("EventsAndReports").field(
            "HoldEventsAndReportsUponReconnect",
            events.hold_events_and_reports_upon_reconnect,
          ));
        }
        node
      }
      Message::SetReaderConfigResponse(body) => {
        Node::new("SET_READER_CONFIG_RESPONSE").child(body.to_node())
      }
      Message::CloseConnection => Node::new("CLOSE_CONNECTION"),
      Message::CloseConnectionResponse(body) => {
        Node::new("CLOSE_CONNECTION_RESPONSE").child(body.to_node())
      }
      Message::AddROSpec(rospec) => Node::new("ADD_ROSPEC").child(rospec.to_node()),
      Message::AddROSpecResponse(body) => {
        Node::new("ADD_ROSPEC_RESPONSE").child(body.to_node())
      }
      Message::DeleteROSpec { rospec_id } => {
        Node::new("DELETE_ROSPEC").field("ROSpecID", rospec_id)
      }
      Message::DeleteROSpecResponse(body) => {
        Node::new("DELETE_ROSPEC_RESPONSE").child(body.to_node())
      }
      Message::StartROSpec { rospec_id } => {
        Node::new("START_ROSPEC").field("ROSpecID", rospec_id)
      }
      Message::StartROSpecResponse(body) => {
        Node::new("START_ROSPEC_RESPONSE").child(body.to_node())
      }
      Message::StopROSpec { rospec_id } => {
        Node::new("STOP_ROSPEC").field("ROSpecID", rospec_id)
      }
      Message::StopROSpecResponse(body) => {
        Node::new("STOP_ROSPEC_RESPONSE").child(body.to_node())
      }
      Message::EnableROSpec { rospec_id } => {
        Node::new("ENABLE_ROSPEC").field("ROSpecID", rospec_id)
      }
      Message::EnableROSpecResponse(body) => {
        Node::new("ENABLE_ROSPEC_RESPONSE").child(body.to_node())
      }
      Message::DisableROSpec { rospec_id } => {
        Node::new("DISABLE_ROSPEC").field("ROSpecID", rospec_id)
      }
      Message::DisableROSpecResponse(body) => {
        Node::new("DISABLE_ROSPEC_RESPONSE").child(body.to_node())
      }
      Message::AddAccessSpec(spec) => Node::new("ADD_ACCESSSPEC").child(spec.to_node()),
      Message::AddAccessSpecResponse(body) => {
        Node::new("ADD_ACCESSSPEC_RESPONSE").child(body.to_node())
      }
      Message::DeleteAccessSpec { access_spec_id } => {
        Node::new("DELETE_ACCESSSPEC").field("AccessSpecID", access_spec_id)
      }
      Message::DeleteAccessSpecResponse(body) => {
        Node::new("DELETE_ACCESSSPEC_RESPONSE").child(body.to_node())
      }
      Message::EnableAccessSpec { access_spec_id } => {
        Node::new("ENABLE_ACCESSSPEC").field("AccessSpecID", access_spec_id)
      }
      Message::EnableAccessSpecResponse(body) => {
        Node::new("ENABLE_ACCESSSPEC_RESPONSE").child(body.to_node())
      }
      Message::DisableAccessSpec { access_spec_id } => {
        Node::new("DISABLE_ACCESSSPEC").field("AccessSpecID", access_spec_id)
      }
      Message::DisableAccessSpecResponse(body) => {
        Node::new("DISABLE_ACCESSSPEC_RESPONSE").child(body.to_node())
      }
      Message::ROAccessReport(report) => report.to_node(),
      Message::Keepalive => Node::new("KEEPALIVE"),
      Message::KeepaliveAck => Node::new("KEEPALIVE_ACK"),
      Message::ReaderEventNotification(event) => {
        Node::new("READER_EVENT_NOTIFICATION").child(event.data.to_node())
      }
      Message::EnableEventsAndReports => Node::new("ENABLE_EVENTS_AND_REPORTS"),
      Message::ErrorMessage(body) => Node::new("ERROR_MESSAGE").child(body.to_node()),
    }
  }
}

impl fmt::Display for LlrpMessage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let node = self.message.to_node().field("ID", self.message_id);
    write!(f, "{}", node.render())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::EPCData;

  #[test]
  fn renders_a_tag_report_hierarchically() {
    let tag = TagReportData {
      epc: Some(Epc::Data(EPCData {
        epc_length_bits: 16,
        epc: vec![0x12, 0x34],
      })),
      antenna_id: Some(1),
      peak_rssi: Some(-60),
      ..TagReportData::default()
    };
    let text = tag.to_node().render();
    assert!(text.starts_with("<TagReportData>\n"));
    assert!(text.contains("\t<EPCData>\n"));
    assert!(text.contains("<EPC>1234</EPC>"));
    assert!(text.contains("<AntennaID>1</AntennaID>"));
    assert!(text.contains("<PeakRSSI>-60</PeakRSSI>"));
    assert!(text.ends_with("</TagReportData>\n"));
  }

  #[test]
  fn field_order_is_deterministic() {
    let status = LLRPStatus::success();
    assert_eq!(status.to_node().render(), status.to_node().render());
    let text = status.to_node().render();
    let code_at = text.find("StatusCode").unwrap();
    let desc_at = text.find("ErrorDescription").unwrap();
    assert!(code_at < desc_at);
  }
}

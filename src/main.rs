use std::env;
use std::process;

use log::{info, warn};

use llrp_codec::client::LlrpClient;
use llrp_codec::config::{self, Config};
use llrp_codec::messages::{GetReaderCapabilities, LlrpMessage, Message, SetReaderConfig};
use llrp_codec::Result;

#[tokio::main]
async fn main() {
  env_logger::init();

  let config_path = env::args().nth(1).unwrap_or_else(|| "llrp.json".to_string());
  let config = match config::load_config(&config_path) {
    Ok(config) => config,
    Err(e) => {
      eprintln!("failed to load {}: {}", config_path, e);
      process::exit(1);
    }
  };

  if let Err(e) = run_inventory(config).await {
    eprintln!("inventory failed: {}", e);
    process::exit(1);
  }
}

async fn run_inventory(config: Config) -> Result<()> {
  let mut client = LlrpClient::connect(&config.host, config.response_timeout_ms).await?;

  let response = client
    .transact(Message::GetReaderCapabilities(GetReaderCapabilities::all()))
    .await?;
  if let Message::GetReaderCapabilitiesResponse(caps) = &response.message {
    if let Some(device) = &caps.general_device_capabilities {
      info!(
        "reader firmware {} ({} antennas)",
        device.reader_firmware_version, device.max_antennas_supported
      );
    }
    let modes = caps.reader_mode_table();
    if !modes.modes.is_empty() && modes.mode(config.rospec.mode_identifier).is_none() {
      warn!(
        "reader does not advertise mode {}; proceeding anyway",
        config.rospec.mode_identifier
      );
    }
  }

  // Clear anything a previous session left behind (ROSpec id 0 = all).
  check_status(client.transact(Message::DeleteROSpec { rospec_id: 0 }).await?);

  check_status(
    client
      .transact(Message::SetReaderConfig(SetReaderConfig::hold_events_and_reports(false)))
      .await?,
  );
  client.send(Message::EnableEventsAndReports).await?;

  let rospec = config.rospec.to_rospec()?;
  let rospec_id = rospec.rospec_id;
  check_status(client.transact(Message::AddROSpec(rospec)).await?);
  check_status(client.transact(Message::EnableROSpec { rospec_id }).await?);
  check_status(client.transact(Message::StartROSpec { rospec_id }).await?);

  client
    .await_reports(5, |tag| {
      let last_seen = tag
        .last_seen_utc()
        .map(|dt| dt.to_string())
        .unwrap_or_else(|| "-".to_string());
      info!(
        "tag {} antenna={:?} rssi={:?} seen={} last_seen={}",
        tag,
        tag.antenna_id,
        tag.peak_rssi,
        tag.tag_seen_count.unwrap_or(0),
        last_seen
      );
    })
    .await?;

  check_status(client.transact(Message::StopROSpec { rospec_id }).await?);
  client.disconnect().await?;

  Ok(())
}

/// Logs the reader's verdict on the last request; a non-success status
/// is the reader's call, not a session-fatal error.
fn check_status(response: LlrpMessage) {
  match &response.message {
    Message::AddROSpecResponse(body)
    | Message::DeleteROSpecResponse(body)
    | Message::StartROSpecResponse(body)
    | Message::StopROSpecResponse(body)
    | Message::EnableROSpecResponse(body)
    | Message::DisableROSpecResponse(body)
    | Message::SetReaderConfigResponse(body)
    | Message::CloseConnectionResponse(body)
    | Message::AddAccessSpecResponse(body)
    | Message::DeleteAccessSpecResponse(body)
    | Message::EnableAccessSpecResponse(body)
    | Message::DisableAccessSpecResponse(body)
    | Message::ErrorMessage(body) => {
      if body.status.is_success() {
        info!("{} ok", response.message.message_type());
      } else {
        warn!(
          "{}: {} {}",
          response.message.message_type(),
          body.status.status_code,
          body.status.error_description
        );
      }
    }
    other => {
      warn!("unexpected response: {}", other.message_type());
    }
  }
}

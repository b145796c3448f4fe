use std::fs;

use serde::{Deserialize, Serialize};

use crate::capabilities::ReaderMode;
use crate::error::Result;
use crate::rospec::ROSpec;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
  pub host                : String,
  pub response_timeout_ms : u64,
  pub rospec              : ROSpecSettings,
}

/// ROSpec-builder inputs, straight from the config file.
#[derive(Debug, Deserialize, Serialize)]
pub struct ROSpecSettings {
  pub rospec_id           : u32,
  pub priority            : u8,
  pub antennas            : Vec<u16>,
  pub tx_power_index      : u16,
  pub mode_identifier     : u32,
  pub tari                : u32,
  pub duration_ms         : Option<u32>,
  pub report_every_n_tags : Option<u16>,
  pub session             : u8,
  pub tag_population      : u16,
}

impl ROSpecSettings {

  pub fn to_rospec(&self) -> Result<ROSpec> {
    let mode = ReaderMode {
      mode_identifier: self.mode_identifier,
      max_tari: self.tari,
    };
    let mut builder = ROSpec::builder(self.rospec_id, mode)
      .priority(self.priority)
      .antennas(&self.antennas)
      .tx_power(self.tx_power_index)
      .session(self.session)
      .tag_population(self.tag_population);
    if let Some(ms) = self.duration_ms {
      builder = builder.duration_ms(ms);
    }
    if let Some(n) = self.report_every_n_tags {
      builder = builder.report_every_n_tags(n);
    }
    builder.build()
  }
}

pub fn load_config(file_path: &str) -> std::result::Result<Config, Box<dyn std::error::Error>> {
  let config_data = fs::read_to_string(file_path)?;
  let config: Config = serde_json::from_str(&config_data)?;
  Ok(config)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_config_and_builds_its_rospec() {
    let raw = r#"{
      "host": "192.168.1.102:5084",
      "response_timeout_ms": 2500,
      "rospec": {
        "rospec_id": 1,
        "priority": 0,
        "antennas": [1, 2],
        "tx_power_index": 91,
        "mode_identifier": 1000,
        "tari": 6250,
        "duration_ms": 2000,
        "report_every_n_tags": null,
        "session": 2,
        "tag_population": 4
      }
    }"#;
    let config: Config = serde_json::from_str(raw).unwrap();
    assert_eq!(config.host, "192.168.1.102:5084");

    let rospec = config.rospec.to_rospec().unwrap();
    assert_eq!(rospec.rospec_id, 1);
    assert_eq!(rospec.ai_specs[0].antenna_ids, vec![1, 2]);
    assert_eq!(
      rospec.ai_specs[0].inventory_spec.antenna_configurations.len(),
      2
    );
  }
}

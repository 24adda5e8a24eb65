//! WiFi cell scanning module.
//!
//! Cells are the access points an interface can currently see. They are
//! produced fresh by every scan and never stored.
//!
//! # Scanning Process
//!
//! 1. Runs `iwlist <interface> scan`
//! 2. Splits the output into one block per `Cell NN - Address: ...` header
//! 3. Reads the ESSID, channel, quality, encryption and bit rate lines of each block
//!
//! Cells are returned in the order `iwlist` prints them. Several cells may
//! share an SSID; nothing is de-duplicated or re-sorted here.
//!
//! # Example
//!
//! ```no_run
//! use roam::scan::scan_cells;
//!
//! let cells = scan_cells("wlan0").expect("Scan failed");
//! for cell in &cells {
//!     println!("{} {:?}", cell.ssid, cell.quality);
//! }
//! ```

use serde::Serialize;
use std::process::Command;

use crate::error::{Result, RoamError};

/// Encryption family advertised by a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionType {
    Wep,
    Wpa,
    Wpa2,
}

impl EncryptionType {
    pub fn is_wpa(self) -> bool {
        matches!(self, EncryptionType::Wpa | EncryptionType::Wpa2)
    }
}

/// A scanned access point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cell {
    /// The advertised network name. Empty for hidden networks.
    pub ssid: String,

    /// BSSID of the access point (e.g., "00:11:22:33:44:55").
    pub address: String,

    pub channel: Option<u32>,

    /// Frequency as printed by iwlist (e.g., "2.437 GHz").
    pub frequency: Option<String>,

    /// Link quality as a ratio string (e.g., "70/70").
    pub quality: Option<String>,

    /// Signal level, in dBm when the driver reports it that way.
    pub signal: Option<i32>,

    /// Whether the cell requires a key.
    pub encrypted: bool,

    /// `None` for open cells.
    pub encryption_type: Option<EncryptionType>,

    pub mode: Option<String>,

    pub bitrates: Vec<String>,
}

/// Scans for cells visible to the specified interface.
///
/// # Arguments
/// * `interface` - The name of the WiFi interface to scan with (e.g., "wlan0")
///
/// # Returns
/// - `Ok(Vec<Cell>)` in scan order
/// - `Err(RoamError::CommandExecution)` if `iwlist` cannot be started
/// - `Err(RoamError::ScanFailed)` if the scan itself fails
///
/// # Command Executed
/// ```bash
/// iwlist <interface> scan
/// ```
pub fn scan_cells(interface: &str) -> Result<Vec<Cell>> {
    let output = Command::new("iwlist")
        .args([interface, "scan"])
        .output()
        .map_err(|source| RoamError::CommandExecution {
            program: "iwlist",
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() || stdout.contains("Interface doesn't support scanning") {
        let message = if stderr.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(RoamError::ScanFailed {
            interface: interface.to_string(),
            message,
        });
    }

    Ok(parse_iwlist(&stdout))
}

/// Cell under construction, with the IE flags needed to settle its encryption type.
#[derive(Default)]
struct PartialCell {
    cell: Cell,
    wpa: bool,
    wpa2: bool,
    in_bitrates: bool,
}

impl PartialCell {
    fn finish(mut self) -> Cell {
        self.cell.encryption_type = if !self.cell.encrypted {
            None
        } else if self.wpa2 {
            Some(EncryptionType::Wpa2)
        } else if self.wpa {
            Some(EncryptionType::Wpa)
        } else {
            Some(EncryptionType::Wep)
        };
        self.cell
    }

    fn read_line(&mut self, line: &str) {
        if let Some(value) = line.strip_prefix("ESSID:") {
            self.cell.ssid = unquote(value.trim()).to_string();
        } else if let Some(value) = line.strip_prefix("Channel:") {
            self.cell.channel = value.trim().parse().ok();
        } else if let Some(value) = line.strip_prefix("Frequency:") {
            // "2.437 GHz (Channel 6)"
            let (frequency, rest) = match value.split_once('(') {
                Some((frequency, rest)) => (frequency.trim(), Some(rest)),
                None => (value.trim(), None),
            };
            self.cell.frequency = Some(frequency.to_string());
            if self.cell.channel.is_none() {
                self.cell.channel = rest
                    .and_then(|r| r.trim_end_matches(')').strip_prefix("Channel "))
                    .and_then(|c| c.trim().parse().ok());
            }
        } else if line.starts_with("Quality") || line.starts_with("Signal level") {
            self.cell.quality = field_after(line, "Quality").map(String::from);
            self.cell.signal = field_after(line, "Signal level").and_then(parse_signal);
        } else if let Some(value) = line.strip_prefix("Encryption key:") {
            self.cell.encrypted = value.trim() == "on";
        } else if let Some(value) = line.strip_prefix("Mode:") {
            self.cell.mode = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Bit Rates:") {
            self.push_bitrates(value);
            self.in_bitrates = true;
            return;
        } else if let Some(value) = line.strip_prefix("IE:") {
            if value.contains("WPA2") {
                self.wpa2 = true;
            } else if value.contains("WPA Version") {
                self.wpa = true;
            }
        } else if self.in_bitrates && !line.contains(':') {
            // Continuation of a wrapped "Bit Rates:" line.
            self.push_bitrates(line);
            return;
        }
        self.in_bitrates = false;
    }

    fn push_bitrates(&mut self, value: &str) {
        self.cell.bitrates.extend(
            value
                .split(';')
                .map(str::trim)
                .filter(|rate| !rate.is_empty())
                .map(String::from),
        );
    }
}

/// Parses the output of `iwlist <interface> scan` into cells.
///
/// Lines before the first `Cell` header (the "Scan completed" banner) are ignored.
pub fn parse_iwlist(output: &str) -> Vec<Cell> {
    let mut cells = Vec::new();
    let mut current: Option<PartialCell> = None;

    for line in output.lines() {
        let line = line.trim();

        if line.starts_with("Cell ") {
            if let Some(done) = current.take() {
                cells.push(done.finish());
            }
            let mut partial = PartialCell::default();
            if let Some((_, address)) = line.split_once("Address:") {
                partial.cell.address = address.trim().to_string();
            }
            current = Some(partial);
            continue;
        }

        if let Some(partial) = current.as_mut() {
            partial.read_line(line);
        }
    }

    if let Some(done) = current {
        cells.push(done.finish());
    }

    cells
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Value following `key=` or `key:` up to the next whitespace.
fn field_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    line[start..]
        .strip_prefix(['=', ':'])?
        .split_whitespace()
        .next()
}

/// "-35" (dBm) or "60/100" (relative level, numerator kept).
fn parse_signal(value: &str) -> Option<i32> {
    value.split('/').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN: &str = r#"wlan0     Scan completed :
          Cell 01 - Address: 00:11:22:33:44:55
                    Channel:6
                    Frequency:2.437 GHz (Channel 6)
                    Quality=70/70  Signal level=-35 dBm
                    Encryption key:on
                    ESSID:"Home"
                    Bit Rates:1 Mb/s; 2 Mb/s; 5.5 Mb/s; 11 Mb/s; 6 Mb/s
                              9 Mb/s; 12 Mb/s; 18 Mb/s
                    Bit Rates:24 Mb/s; 36 Mb/s; 48 Mb/s; 54 Mb/s
                    Mode:Master
                    Extra:tsf=0000000000000000
                    IE: IEEE 802.11i/WPA2 Version 1
                        Group Cipher : CCMP
                    IE: WPA Version 1
          Cell 02 - Address: 66:77:88:99:AA:BB
                    Frequency:5.18 GHz (Channel 36)
                    Quality=40/70  Signal level=-70 dBm
                    Encryption key:off
                    ESSID:"Cafe"
                    Mode:Master
          Cell 03 - Address: CC:DD:EE:FF:00:11
                    Channel:11
                    Quality:30/100  Signal level:60/100
                    Encryption key:on
                    ESSID:"Old"
                    IE: WPA Version 1
          Cell 04 - Address: 12:34:56:78:9A:BC
                    Channel:1
                    Encryption key:on
                    ESSID:"Legacy"
"#;

    #[test]
    fn parses_cells_in_scan_order() {
        let cells = parse_iwlist(SCAN);
        let ssids: Vec<&str> = cells.iter().map(|c| c.ssid.as_str()).collect();
        assert_eq!(ssids, ["Home", "Cafe", "Old", "Legacy"]);
    }

    #[test]
    fn reads_wpa2_cell_fields() {
        let home = &parse_iwlist(SCAN)[0];
        assert_eq!(home.address, "00:11:22:33:44:55");
        assert_eq!(home.channel, Some(6));
        assert_eq!(home.frequency.as_deref(), Some("2.437 GHz"));
        assert_eq!(home.quality.as_deref(), Some("70/70"));
        assert_eq!(home.signal, Some(-35));
        assert!(home.encrypted);
        assert_eq!(home.encryption_type, Some(EncryptionType::Wpa2));
        assert_eq!(home.mode.as_deref(), Some("Master"));
        assert_eq!(home.bitrates.len(), 12);
        assert_eq!(home.bitrates.last().map(String::as_str), Some("54 Mb/s"));
    }

    #[test]
    fn channel_falls_back_to_frequency_line() {
        let cafe = &parse_iwlist(SCAN)[1];
        assert_eq!(cafe.channel, Some(36));
        assert!(!cafe.encrypted);
        assert_eq!(cafe.encryption_type, None);
    }

    #[test]
    fn settles_wpa_and_wep() {
        let cells = parse_iwlist(SCAN);
        assert_eq!(cells[2].encryption_type, Some(EncryptionType::Wpa));
        assert_eq!(cells[2].quality.as_deref(), Some("30/100"));
        assert_eq!(cells[2].signal, Some(60));
        assert_eq!(cells[3].encryption_type, Some(EncryptionType::Wep));
    }

    #[test]
    fn keeps_cells_sharing_an_ssid() {
        let output = r#"wlan0     Scan completed :
          Cell 01 - Address: 00:00:00:00:00:01
                    Quality=60/70  Signal level=-50 dBm
                    ESSID:"Guest"
          Cell 02 - Address: 00:00:00:00:00:02
                    Quality=20/70  Signal level=-90 dBm
                    ESSID:"Guest"
"#;
        let cells = parse_iwlist(output);
        assert_eq!(cells.len(), 2);
        assert!(cells.iter().all(|c| c.ssid == "Guest"));
        assert_ne!(cells[0].signal, cells[1].signal);
    }

    #[test]
    fn no_cells_in_empty_scan() {
        assert!(parse_iwlist("wlan0     No scan results\n").is_empty());
    }
}

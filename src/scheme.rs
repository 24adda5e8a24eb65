//! Saved connection schemes.
//!
//! A scheme is a named `interfaces(5)` stanza for one interface, keyed by
//! the SSID it connects to:
//!
//! ```text
//! iface wlan1-Home inet dhcp
//!     wireless-channel auto
//!     wpa-psk 0d4a...
//!     wpa-ssid Home
//! ```
//!
//! Schemes are activated with `ifup wlan1=wlan1-Home`, which hands the
//! options to the wireless and DHCP hooks of ifupdown.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{Result, RoamError};
use crate::scan::{Cell, EncryptionType};

/// A persisted connection configuration for one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scheme {
    pub interface: String,
    pub name: String,
    pub options: BTreeMap<String, String>,
}

impl Scheme {
    pub fn new(
        interface: impl Into<String>,
        name: impl Into<String>,
        options: BTreeMap<String, String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(RoamError::InvalidSchemeName(name));
        }
        Ok(Scheme {
            interface: interface.into(),
            name,
            options,
        })
    }

    /// Builds the scheme that connects `interface` to `cell`.
    ///
    /// # Arguments
    /// * `interface` - Interface the scheme belongs to (e.g., "wlan1")
    /// * `name` - Scheme name, the SSID
    /// * `cell` - Scanned cell supplying the SSID and encryption type
    /// * `passkey` - Key for encrypted cells; ignored for open ones
    ///
    /// # Options Produced
    /// - open: `wireless-essid`, `wireless-channel auto`
    /// - WPA/WPA2: `wpa-ssid`, `wpa-psk` (hex PSK), `wireless-channel auto`
    /// - WEP: `wireless-essid`, `wireless-key` (`s:` prefixed for ASCII keys)
    pub fn for_cell(
        interface: &str,
        name: &str,
        cell: &Cell,
        passkey: Option<&str>,
    ) -> Result<Self> {
        let mut options = BTreeMap::new();

        match cell.encryption_type.filter(|_| cell.encrypted) {
            None => {
                options.insert("wireless-essid".to_string(), cell.ssid.clone());
                options.insert("wireless-channel".to_string(), "auto".to_string());
            }
            Some(kind) => {
                let passkey = passkey.ok_or_else(|| RoamError::MissingPasskey(cell.ssid.clone()))?;
                if kind.is_wpa() {
                    options.insert("wpa-ssid".to_string(), cell.ssid.clone());
                    options.insert("wpa-psk".to_string(), wpa_psk(&cell.ssid, passkey)?);
                    options.insert("wireless-channel".to_string(), "auto".to_string());
                } else {
                    debug_assert_eq!(kind, EncryptionType::Wep);
                    options.insert("wireless-essid".to_string(), cell.ssid.clone());
                    options.insert("wireless-key".to_string(), wep_key(passkey));
                }
            }
        }

        Scheme::new(interface, name, options)
    }

    /// The logical interface name used in the stanza and by `ifup`.
    pub fn iface(&self) -> String {
        format!("{}-{}", self.interface, self.name)
    }

    /// Renders the `interfaces(5)` stanza for this scheme.
    pub fn stanza(&self) -> String {
        let mut out = format!("iface {} inet dhcp\n", self.iface());
        for (key, value) in &self.options {
            out.push_str(&format!("    {} {}\n", key, value));
        }
        out
    }

    /// Brings the interface up with this scheme.
    ///
    /// # Returns
    /// - `Ok(ip)` with the address leased by the DHCP client
    /// - `Err(RoamError::ConnectionFailed)` if `ifup` fails or no lease is reported
    ///
    /// # Commands Executed
    /// ```bash
    /// ifdown <interface>
    /// ifup <interface>=<interface>-<name>
    /// ```
    pub fn activate(&self) -> Result<String> {
        // A failed ifdown only means the interface was already down
        let down = Command::new("ifdown")
            .arg(&self.interface)
            .output()
            .map_err(|source| RoamError::CommandExecution {
                program: "ifdown",
                source,
            })?;
        if !down.status.success() {
            debug!(
                interface = %self.interface,
                stderr = %String::from_utf8_lossy(&down.stderr).trim(),
                "ifdown reported failure"
            );
        }

        let mapping = format!("{}={}", self.interface, self.iface());
        let up = Command::new("ifup")
            .arg(&mapping)
            .output()
            .map_err(|source| RoamError::CommandExecution {
                program: "ifup",
                source,
            })?;

        let stdout = String::from_utf8_lossy(&up.stdout);
        let stderr = String::from_utf8_lossy(&up.stderr);

        if !up.status.success() {
            return Err(RoamError::ConnectionFailed {
                scheme: self.iface(),
                message: stderr.trim().to_string(),
            });
        }

        // dhclient logs to stderr, udhcpc to stdout
        let combined = format!("{}\n{}", stdout, stderr);
        match parse_bound_ip(&combined) {
            Some(ip) => {
                info!(scheme = %self.iface(), ip = %ip, "interface bound");
                Ok(ip)
            }
            None => Err(RoamError::ConnectionFailed {
                scheme: self.iface(),
                message: "no DHCP lease reported".to_string(),
            }),
        }
    }
}

/// The address from a DHCP client's `bound to <ip>` line.
fn parse_bound_ip(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        line.trim()
            .strip_prefix("bound to ")
            .and_then(|rest| rest.split_whitespace().next())
            .map(|ip| ip.trim_end_matches(['.', ',']).to_string())
    })
}

/// WEP keys of ASCII length get the `s:` prefix iwconfig expects.
fn wep_key(passkey: &str) -> String {
    match passkey.len() {
        5 | 13 | 16 | 29 => format!("s:{}", passkey),
        _ => passkey.to_string(),
    }
}

/// Hex PSK for a WPA network, derived with `wpa_passphrase` unless the
/// passkey already is one.
fn wpa_psk(ssid: &str, passkey: &str) -> Result<String> {
    if passkey.len() == 64 && passkey.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(passkey.to_string());
    }
    if !(8..=63).contains(&passkey.len()) {
        return Err(RoamError::InvalidPasskey(
            "WPA passphrase must be 8 to 63 characters".to_string(),
        ));
    }

    let output = Command::new("wpa_passphrase")
        .args([ssid, passkey])
        .output()
        .map_err(|source| RoamError::CommandExecution {
            program: "wpa_passphrase",
            source,
        })?;

    if !output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        return Err(RoamError::PassphraseFailed(stdout.trim().to_string()));
    }

    parse_psk(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| RoamError::PassphraseFailed("no psk in output".to_string()))
}

/// Uncommented `psk=` line of a `wpa_passphrase` network block.
fn parse_psk(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("psk="))
        .map(String::from)
}

/// Schemes stored in an `interfaces(5)` file.
#[derive(Debug, Clone)]
pub struct SchemeStore {
    path: PathBuf,
}

impl SchemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SchemeStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, source: std::io::Error) -> RoamError {
        RoamError::SchemeStore {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read(&self) -> Result<String> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(self.store_error(e)),
        }
    }

    /// Every named scheme in the file, in file order.
    pub fn all(&self) -> Result<Vec<Scheme>> {
        Ok(parse_schemes(&self.read()?))
    }

    pub fn find(&self, interface: &str, name: &str) -> Result<Option<Scheme>> {
        Ok(self
            .all()?
            .into_iter()
            .find(|s| s.interface == interface && s.name == name))
    }

    /// Appends the scheme's stanza. Fails if a scheme with the same
    /// interface and name is already stored.
    pub fn save(&self, scheme: &Scheme) -> Result<()> {
        if self.find(&scheme.interface, &scheme.name)?.is_some() {
            return Err(RoamError::SchemeExists(scheme.iface()));
        }

        // One blank line between stanzas
        let content = self.read()?;
        let separator = if content.is_empty() || content.ends_with("\n\n") {
            ""
        } else if content.ends_with('\n') {
            "\n"
        } else {
            "\n\n"
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.store_error(e))?;

        write!(file, "{}{}", separator, scheme.stanza()).map_err(|e| self.store_error(e))?;
        debug!(scheme = %scheme.iface(), path = %self.path.display(), "scheme saved");
        Ok(())
    }

    /// Rewrites the file without the scheme's stanza.
    pub fn delete(&self, scheme: &Scheme) -> Result<()> {
        let content = self.read()?;
        let header = format!("iface {} ", scheme.iface());

        let mut kept = String::with_capacity(content.len());
        let mut skipping = false;
        for line in content.lines() {
            let indented = line.starts_with(char::is_whitespace);
            if line.trim().is_empty() || !indented {
                skipping = false;
            }
            if line.starts_with(&header) {
                skipping = true;
                // The blank line before the stanza goes with it
                while kept.ends_with("\n\n") || kept == "\n" {
                    kept.pop();
                }
            }
            if !skipping {
                kept.push_str(line);
                kept.push('\n');
            }
        }

        fs::write(&self.path, kept).map_err(|e| self.store_error(e))?;
        debug!(scheme = %scheme.iface(), path = %self.path.display(), "scheme deleted");
        Ok(())
    }
}

/// Named `iface <interface>-<name> ...` stanzas and their indented options.
fn parse_schemes(content: &str) -> Vec<Scheme> {
    let mut schemes = Vec::new();
    let mut current: Option<Scheme> = None;

    for line in content.lines() {
        let indented = line.starts_with(char::is_whitespace);
        let trimmed = line.trim();

        if indented && !trimmed.is_empty() {
            if let Some(scheme) = current.as_mut() {
                if let Some((key, value)) = trimmed.split_once(char::is_whitespace) {
                    scheme.options.insert(key.to_string(), value.trim().to_string());
                }
            }
            continue;
        }

        if let Some(done) = current.take() {
            schemes.push(done);
        }

        let mut words = trimmed.split_whitespace();
        if words.next() == Some("iface") {
            if let Some((interface, name)) = words.next().and_then(|w| w.split_once('-')) {
                current = Some(Scheme {
                    interface: interface.to_string(),
                    name: name.to_string(),
                    options: BTreeMap::new(),
                });
            }
        }
    }

    if let Some(done) = current {
        schemes.push(done);
    }

    schemes
}

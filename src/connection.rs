//! WiFi connection management module.
//!
//! [`ConnectionManager`] decides which saved scheme to use for an SSID,
//! replaces schemes when a network is saved again, and activates them.
//! The operating system side is reached through a [`WifiBackend`].
//!
//! Failures are logged here and handed back as [`RoamError`] values; the
//! HTTP layer turns any of them into a plain `false`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use roam::backend::SystemBackend;
//! use roam::connection::ConnectionManager;
//! use roam::scheme::SchemeStore;
//!
//! let backend = SystemBackend::new(SchemeStore::new("/etc/network/interfaces"));
//! let manager = ConnectionManager::new(Arc::new(backend));
//!
//! // Reconnect wlan1 to any visible network it has a scheme for
//! manager.auto_connect("wlan1");
//! ```

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::backend::WifiBackend;
use crate::error::{Result, RoamError};
use crate::scan::Cell;
use crate::scheme::Scheme;

#[derive(Clone)]
pub struct ConnectionManager {
    backend: Arc<dyn WifiBackend>,
}

impl ConnectionManager {
    pub fn new(backend: Arc<dyn WifiBackend>) -> Self {
        ConnectionManager { backend }
    }

    /// SSID currently associated on `interface`.
    pub fn active(&self, interface: &str) -> Option<String> {
        self.backend.active(interface)
    }

    /// Looks up the saved scheme for `ssid`, or for the active SSID when
    /// none is given.
    ///
    /// # Returns
    /// - `Some(Scheme)` when an SSID is known and a scheme is stored for it
    /// - `None` otherwise, including when the store cannot be read
    pub fn resolve_scheme(&self, interface: &str, ssid: Option<&str>) -> Option<Scheme> {
        let ssid = match ssid {
            Some(ssid) => ssid.to_string(),
            None => self.backend.active(interface)?,
        };
        if ssid.is_empty() {
            return None;
        }

        match self.backend.find_scheme(interface, &ssid) {
            Ok(scheme) => scheme,
            Err(e) => {
                warn!(interface, ssid = %ssid, error = %e, "scheme lookup failed");
                None
            }
        }
    }

    /// One scan pass on `interface`.
    pub fn list_networks(&self, interface: &str) -> Result<Vec<Cell>> {
        self.backend.scan(interface)
    }

    /// Saves a scheme for `ssid` built from the first visible cell that
    /// advertises it, replacing any scheme already stored under that SSID.
    ///
    /// # Arguments
    /// * `interface` - Interface the scheme is for (e.g., "wlan1")
    /// * `ssid` - Network to save; must be visible in a fresh scan
    /// * `passkey` - Key for encrypted networks, `None` for open ones
    ///
    /// # Returns
    /// - `Ok(Scheme)` - the newly stored scheme
    /// - `Err(RoamError::NoMatchingCell)` if no scanned cell has that SSID
    /// - any scan, key or store error otherwise
    pub fn save_and_replace(
        &self,
        interface: &str,
        ssid: &str,
        passkey: Option<&str>,
    ) -> Result<Scheme> {
        let result = self.try_save(interface, ssid, passkey);
        if let Err(e) = &result {
            warn!(interface, ssid, error = %e, "scheme could not be saved");
        }
        result
    }

    fn try_save(&self, interface: &str, ssid: &str, passkey: Option<&str>) -> Result<Scheme> {
        if ssid.is_empty() {
            return Err(RoamError::NoMatchingCell(String::new()));
        }

        // First matching cell wins, whatever its signal
        let cell = self
            .backend
            .scan(interface)?
            .into_iter()
            .find(|c| c.ssid == ssid)
            .ok_or_else(|| RoamError::NoMatchingCell(ssid.to_string()))?;

        // Key and name problems surface before the stored scheme is touched
        let scheme = self.backend.build_scheme(interface, ssid, &cell, passkey)?;

        if let Some(previous) = self.backend.find_scheme(interface, ssid)? {
            info!(interface, ssid, "deleting previous duplicate scheme");
            self.backend.delete_scheme(&previous)?;
        }

        self.backend.save_scheme(&scheme)?;
        info!(interface, ssid, "saved WiFi scheme");
        Ok(scheme)
    }

    /// Activates `scheme`.
    ///
    /// # Returns
    /// - `Ok(scheme)` unchanged on success
    /// - `Err(RoamError::NoScheme)` for `None`, without touching the interface
    /// - `Err(RoamError::ConnectionFailed)` (or a command error) if activation fails
    pub fn connect(&self, scheme: Option<Scheme>) -> Result<Scheme> {
        let Some(scheme) = scheme else {
            debug!("nothing to connect to");
            return Err(RoamError::NoScheme);
        };

        info!(scheme = %scheme.iface(), "attempting connection");
        match self.backend.activate(&scheme) {
            Ok(ip) => {
                info!(scheme = %scheme.iface(), ip = %ip, "connected to WiFi");
                Ok(scheme)
            }
            Err(e) => {
                warn!(scheme = %scheme.iface(), error = %e, "connection error");
                Err(e)
            }
        }
    }

    /// Startup policy: when `interface` is not associated, activate the
    /// first visible cell (in scan order) that has a stored scheme.
    ///
    /// Leaves an associated interface alone. Returns the activated scheme,
    /// or `None` if the interface stays as it was.
    pub fn auto_connect(&self, interface: &str) -> Option<Scheme> {
        if let Some(ssid) = self.backend.active(interface) {
            info!(interface, ssid = %ssid, "already connected, skipping auto-connect");
            return None;
        }

        let cells = match self.backend.scan(interface) {
            Ok(cells) => cells,
            Err(e) => {
                error!(interface, error = %e, "auto-connect scan failed");
                return None;
            }
        };

        for cell in cells {
            let scheme = self.resolve_scheme(interface, Some(cell.ssid.as_str()));
            if scheme.is_none() {
                continue;
            }
            if let Ok(scheme) = self.connect(scheme) {
                return Some(scheme);
            }
        }

        info!(interface, "no known network could be joined");
        None
    }
}

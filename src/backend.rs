use crate::error::Result;
use crate::interface;
use crate::scan::{self, Cell};
use crate::scheme::{Scheme, SchemeStore};

#[cfg(test)]
pub mod mock;

/// The operating system's WiFi machinery, as seen by the connection manager.
///
/// Everything here blocks on external tools. Swapping the implementation
/// lets the connection policy be exercised without a radio.
pub trait WifiBackend: Send + Sync {
    /// SSID the interface is associated with, if any.
    fn active(&self, interface: &str) -> Option<String>;

    /// One scan pass, in the order the tool reports cells.
    fn scan(&self, interface: &str) -> Result<Vec<Cell>>;

    fn find_scheme(&self, interface: &str, ssid: &str) -> Result<Option<Scheme>>;

    /// Builds the scheme that would connect to `cell`, without storing it.
    fn build_scheme(
        &self,
        interface: &str,
        ssid: &str,
        cell: &Cell,
        passkey: Option<&str>,
    ) -> Result<Scheme>;

    fn save_scheme(&self, scheme: &Scheme) -> Result<()>;

    fn delete_scheme(&self, scheme: &Scheme) -> Result<()>;

    /// Brings the scheme's interface up; returns the leased address.
    fn activate(&self, scheme: &Scheme) -> Result<String>;
}

/// `iwgetid`, `iwlist`, an `interfaces(5)` scheme store and ifupdown.
#[derive(Debug, Clone)]
pub struct SystemBackend {
    store: SchemeStore,
}

impl SystemBackend {
    pub fn new(store: SchemeStore) -> Self {
        SystemBackend { store }
    }
}

impl WifiBackend for SystemBackend {
    fn active(&self, interface: &str) -> Option<String> {
        interface::active_ssid(interface)
    }

    fn scan(&self, interface: &str) -> Result<Vec<Cell>> {
        scan::scan_cells(interface)
    }

    fn find_scheme(&self, interface: &str, ssid: &str) -> Result<Option<Scheme>> {
        self.store.find(interface, ssid)
    }

    fn build_scheme(
        &self,
        interface: &str,
        ssid: &str,
        cell: &Cell,
        passkey: Option<&str>,
    ) -> Result<Scheme> {
        Scheme::for_cell(interface, ssid, cell, passkey)
    }

    fn save_scheme(&self, scheme: &Scheme) -> Result<()> {
        self.store.save(scheme)
    }

    fn delete_scheme(&self, scheme: &Scheme) -> Result<()> {
        self.store.delete(scheme)
    }

    fn activate(&self, scheme: &Scheme) -> Result<String> {
        scheme.activate()
    }
}

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use super::WifiBackend;
use crate::error::{Result, RoamError};
use crate::scan::Cell;
use crate::scheme::Scheme;

/// In-memory backend that records what the manager asked of it.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    active: HashMap<String, String>,
    cells: HashMap<String, Vec<Cell>>,
    scan_fails: bool,
    schemes: Vec<Scheme>,
    refuse_saves: bool,
    failing: HashSet<String>,
    activations: Vec<String>,
    deletions: Vec<String>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, interface: &str, ssid: &str) {
        let mut state = self.state.lock().unwrap();
        state.active.insert(interface.to_string(), ssid.to_string());
    }

    pub fn set_cells(&self, interface: &str, ssids: &[&str]) {
        let cells = ssids
            .iter()
            .map(|ssid| Cell {
                ssid: ssid.to_string(),
                ..Cell::default()
            })
            .collect();
        self.set_cell_list(interface, cells);
    }

    pub fn set_cell_list(&self, interface: &str, cells: Vec<Cell>) {
        let mut state = self.state.lock().unwrap();
        state.cells.insert(interface.to_string(), cells);
    }

    pub fn fail_scans(&self) {
        self.state.lock().unwrap().scan_fails = true;
    }

    pub fn refuse_saves(&self) {
        self.state.lock().unwrap().refuse_saves = true;
    }

    pub fn store_scheme(&self, interface: &str, ssid: &str) -> Scheme {
        let scheme = mock_scheme(interface, ssid, None);
        self.state.lock().unwrap().schemes.push(scheme.clone());
        scheme
    }

    pub fn fail_activation(&self, ssid: &str) {
        self.state.lock().unwrap().failing.insert(ssid.to_string());
    }

    /// SSIDs passed to `activate`, in call order.
    pub fn activations(&self) -> Vec<String> {
        self.state.lock().unwrap().activations.clone()
    }

    pub fn deletions(&self) -> Vec<String> {
        self.state.lock().unwrap().deletions.clone()
    }

    pub fn schemes_for(&self, interface: &str, ssid: &str) -> Vec<Scheme> {
        self.state
            .lock()
            .unwrap()
            .schemes
            .iter()
            .filter(|s| s.interface == interface && s.name == ssid)
            .cloned()
            .collect()
    }
}

fn mock_scheme(interface: &str, ssid: &str, passkey: Option<&str>) -> Scheme {
    let mut options = BTreeMap::new();
    options.insert("wpa-ssid".to_string(), ssid.to_string());
    if let Some(passkey) = passkey {
        options.insert("wpa-psk".to_string(), passkey.to_string());
    }
    Scheme {
        interface: interface.to_string(),
        name: ssid.to_string(),
        options,
    }
}

impl WifiBackend for MockBackend {
    fn active(&self, interface: &str) -> Option<String> {
        self.state.lock().unwrap().active.get(interface).cloned()
    }

    fn scan(&self, interface: &str) -> Result<Vec<Cell>> {
        let state = self.state.lock().unwrap();
        if state.scan_fails {
            return Err(RoamError::ScanFailed {
                interface: interface.to_string(),
                message: "Interface doesn't support scanning".to_string(),
            });
        }
        Ok(state.cells.get(interface).cloned().unwrap_or_default())
    }

    fn find_scheme(&self, interface: &str, ssid: &str) -> Result<Option<Scheme>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .schemes
            .iter()
            .find(|s| s.interface == interface && s.name == ssid)
            .cloned())
    }

    fn build_scheme(
        &self,
        interface: &str,
        ssid: &str,
        _cell: &Cell,
        passkey: Option<&str>,
    ) -> Result<Scheme> {
        if passkey.is_some_and(|p| p.len() < 8) {
            return Err(RoamError::InvalidPasskey(
                "WPA passphrase must be 8 to 63 characters".to_string(),
            ));
        }
        Ok(mock_scheme(interface, ssid, passkey))
    }

    fn save_scheme(&self, scheme: &Scheme) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.refuse_saves {
            return Err(RoamError::SchemeStore {
                path: "/mock/interfaces".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            });
        }
        if state
            .schemes
            .iter()
            .any(|s| s.interface == scheme.interface && s.name == scheme.name)
        {
            return Err(RoamError::SchemeExists(scheme.iface()));
        }
        state.schemes.push(scheme.clone());
        Ok(())
    }

    fn delete_scheme(&self, scheme: &Scheme) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.schemes.retain(|s| s != scheme);
        state.deletions.push(scheme.name.clone());
        Ok(())
    }

    fn activate(&self, scheme: &Scheme) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.activations.push(scheme.name.clone());
        if state.failing.contains(&scheme.name) {
            return Err(RoamError::ConnectionFailed {
                scheme: scheme.iface(),
                message: "no DHCP lease reported".to_string(),
            });
        }
        state
            .active
            .insert(scheme.interface.clone(), scheme.name.clone());
        Ok("192.168.1.20".to_string())
    }
}

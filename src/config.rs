use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_NAME: &str = "Raspberry Pi";
pub const DEFAULT_AP: &str = "wlan0";
pub const DEFAULT_ADAPTER: &str = "wlan1";
pub const DEFAULT_INTERFACES_FILE: &str = "/etc/network/interfaces";

/// Process-wide settings, fixed at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port the HTTP surface listens on.
    pub port: u16,
    /// Display name shown on the index page.
    pub name: String,
    /// Interface whose scan is listed on `/networks` and the index page.
    pub ap: String,
    /// Client interface used for the active SSID, schemes and connecting.
    pub adapter: String,
    /// `interfaces(5)` file holding saved schemes.
    pub interfaces_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: DEFAULT_PORT,
            name: DEFAULT_NAME.to_string(),
            ap: DEFAULT_AP.to_string(),
            adapter: DEFAULT_ADAPTER.to_string(),
            interfaces_file: PathBuf::from(DEFAULT_INTERFACES_FILE),
        }
    }
}

impl AppConfig {
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

//! Roam: a small HTTP control surface for a Linux WiFi adapter.
//!
//! This library lists the access points an interface can see, keeps one
//! saved connection scheme per SSID, activates schemes, and reconnects a
//! client adapter to a known network at startup.
//!
//! # Modules
//!
//! - [`backend`] - The OS WiFi collaborator trait and its system implementation
//! - [`config`] - Immutable process configuration
//! - [`connection`] - Scheme selection, replacement and activation policy
//! - [`error`] - Custom error types for the library
//! - [`interface`] - Active SSID probe
//! - [`scan`] - WiFi cell scanning and `iwlist` parsing
//! - [`scheme`] - Saved schemes in an `interfaces(5)` file
//! - [`server`] - HTTP routes and the index page
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use roam::{ConnectionManager, SchemeStore, SystemBackend};
//!
//! let backend = SystemBackend::new(SchemeStore::new("/etc/network/interfaces"));
//! let manager = ConnectionManager::new(Arc::new(backend));
//!
//! // Save the visible "Home" network and join it
//! let scheme = manager.save_and_replace("wlan1", "Home", Some("secret123")).ok();
//! manager.connect(scheme).expect("Connection failed");
//! ```

/// The `WifiBackend` seam between connection policy and the OS tools.
/// `SystemBackend` drives iwgetid, iwlist, the scheme store and ifupdown.
pub mod backend;

/// Startup settings: port, display name, the two interfaces and the scheme file.
pub mod config;

/// Connection policy: scheme lookup, replace-on-save, activation and auto-connect.
pub mod connection;

/// `RoamError`, one variant per failure kind, built with `thiserror`.
pub mod error;

/// Active SSID probe backed by `iwgetid`.
pub mod interface;

/// Access point scanning with `iwlist` and parsing of its cell blocks.
pub mod scan;

/// Saved schemes as `interfaces(5)` stanzas, and their activation.
pub mod scheme;

/// Server module exposing the connection manager over HTTP.
/// Uses Axum for routing and Tera for the index page.
pub mod server;

pub use backend::{SystemBackend, WifiBackend};
pub use config::AppConfig;
pub use connection::ConnectionManager;
pub use error::RoamError;
pub use interface::active_ssid;
pub use scan::{scan_cells, Cell, EncryptionType};
pub use scheme::{Scheme, SchemeStore};

use std::process::Command;

use tracing::debug;

/// Return the SSID the interface is currently associated with.
///
/// Runs `iwgetid <interface> -r`. An unassociated interface, an unknown
/// interface or a missing `iwgetid` all read as `None`.
pub fn active_ssid(interface: &str) -> Option<String> {
    let output = match Command::new("iwgetid").args([interface, "-r"]).output() {
        Ok(output) => output,
        Err(e) => {
            debug!(interface, error = %e, "iwgetid could not be run");
            return None;
        }
    };

    if !output.status.success() {
        debug!(interface, status = %output.status, "no active SSID");
        return None;
    }

    parse_iwgetid_output(&output.stdout)
}

/// Trim `iwgetid -r` output; empty output means no association.
fn parse_iwgetid_output(stdout: &[u8]) -> Option<String> {
    let ssid = String::from_utf8_lossy(stdout).trim().to_string();
    if ssid.is_empty() { None } else { Some(ssid) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_reported_ssid() {
        assert_eq!(parse_iwgetid_output(b"  Home\n"), Some("Home".to_string()));
    }

    #[test]
    fn blank_output_is_no_ssid() {
        assert_eq!(parse_iwgetid_output(b"\n"), None);
        assert_eq!(parse_iwgetid_output(b""), None);
    }

    #[test]
    fn unknown_interface_has_no_active_ssid() {
        assert_eq!(active_ssid("roam-test-nonexistent0"), None);
    }
}

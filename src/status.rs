// Status reconciliation: platform state in, display model out

use strum::Display;

pub const NOT_CONNECTED: &str = "not connected";
pub const NO_NETWORKS_FOUND: &str = "no networks found";
pub const MAX_LISTED_NETWORKS: usize = 5;

/// SSID values some drivers report while no network is really associated
const SENTINEL_SSIDS: [&str; 2] = ["<unknown ssid>", "0x"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum WifiStatus {
    Active,
    Inactive,
}

/// Three-way view of the WiFi status as seen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WifiState {
    Inactive,
    ActiveConnected(String),
    ActiveDisconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Green,
    Red,
}

/// A nearby network as reported by the last scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub network_name: String,
    /// dBm, closer to zero is stronger
    pub signal_level: i32,
}

impl ScanResult {
    pub fn new(network_name: impl Into<String>, signal_level: i32) -> Self {
        Self {
            network_name: network_name.into(),
            signal_level,
        }
    }
}

/// Content of the "available networks" section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkList {
    Hidden,
    /// Section is shown but nothing is listed (scan permission missing)
    Empty,
    Placeholder,
    Entries(Vec<ScanResult>),
}

impl NetworkList {
    pub fn is_visible(&self) -> bool {
        !matches!(self, NetworkList::Hidden)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayModel {
    pub permission_granted: bool,
    pub status: WifiStatus,
    pub status_color: StatusColor,
    pub ssid_text: String,
    pub networks_visible: bool,
    pub networks: NetworkList,
}

impl DisplayModel {
    pub fn wifi_state(&self) -> WifiState {
        match self.status {
            WifiStatus::Inactive => WifiState::Inactive,
            WifiStatus::Active if self.networks_visible => WifiState::ActiveDisconnected,
            WifiStatus::Active => WifiState::ActiveConnected(self.ssid_text.clone()),
        }
    }

    pub fn permission_text(&self) -> (&'static str, StatusColor) {
        permission_text(self.permission_granted)
    }
}

pub fn permission_text(granted: bool) -> (&'static str, StatusColor) {
    if granted {
        ("granted", StatusColor::Green)
    } else {
        ("denied", StatusColor::Red)
    }
}

/// Strip quotes and reject the placeholder SSIDs reported while unassociated.
pub fn usable_ssid(raw: &str) -> Option<String> {
    let ssid = raw.replace('"', "");
    if ssid.is_empty() || SENTINEL_SSIDS.contains(&ssid.as_str()) {
        None
    } else {
        Some(ssid)
    }
}

/// Strongest networks first, platform order kept for equal levels.
pub fn strongest_networks(scan_results: &[ScanResult]) -> Vec<ScanResult> {
    let mut networks = scan_results.to_vec();
    networks.sort_by(|a, b| b.signal_level.cmp(&a.signal_level));
    networks.truncate(MAX_LISTED_NETWORKS);
    networks
}

pub fn reconcile(
    permission_granted: bool,
    wifi_enabled: bool,
    connected_ssid: Option<&str>,
    scan_results: &[ScanResult],
) -> DisplayModel {
    if !wifi_enabled {
        return DisplayModel {
            permission_granted,
            status: WifiStatus::Inactive,
            status_color: StatusColor::Red,
            ssid_text: NOT_CONNECTED.to_string(),
            networks_visible: false,
            networks: NetworkList::Hidden,
        };
    }

    let (ssid_text, networks) = match connected_ssid.and_then(usable_ssid) {
        Some(ssid) => (ssid, NetworkList::Hidden),
        None => {
            let networks = if !permission_granted {
                NetworkList::Empty
            } else if scan_results.is_empty() {
                NetworkList::Placeholder
            } else {
                NetworkList::Entries(strongest_networks(scan_results))
            };
            (NOT_CONNECTED.to_string(), networks)
        }
    };

    DisplayModel {
        permission_granted,
        status: WifiStatus::Active,
        status_color: StatusColor::Green,
        ssid_text,
        networks_visible: networks.is_visible(),
        networks,
    }
}

// NetworkManager types and enums

use std::fmt;

/// NetworkManager device state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Unknown,
    Unmanaged,
    Unavailable,
    Disconnected,
    Prepare,
    Config,
    NeedAuth,
    IpConfig,
    IpCheck,
    Secondaries,
    Activated,
    Deactivating,
    Failed,
}

impl From<u32> for DeviceState {
    fn from(value: u32) -> Self {
        match value {
            10 => DeviceState::Unmanaged,
            20 => DeviceState::Unavailable,
            30 => DeviceState::Disconnected,
            40 => DeviceState::Prepare,
            50 => DeviceState::Config,
            60 => DeviceState::NeedAuth,
            70 => DeviceState::IpConfig,
            80 => DeviceState::IpCheck,
            90 => DeviceState::Secondaries,
            100 => DeviceState::Activated,
            110 => DeviceState::Deactivating,
            120 => DeviceState::Failed,
            _ => DeviceState::Unknown,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Unknown => write!(f, "unknown"),
            DeviceState::Unmanaged => write!(f, "unmanaged"),
            DeviceState::Unavailable => write!(f, "unavailable"),
            DeviceState::Disconnected => write!(f, "disconnected"),
            DeviceState::Prepare => write!(f, "connecting"),
            DeviceState::Config => write!(f, "configuring"),
            DeviceState::NeedAuth => write!(f, "authenticating"),
            DeviceState::IpConfig => write!(f, "getting IP"),
            DeviceState::IpCheck => write!(f, "checking IP"),
            DeviceState::Secondaries => write!(f, "waiting"),
            DeviceState::Activated => write!(f, "connected"),
            DeviceState::Deactivating => write!(f, "disconnecting"),
            DeviceState::Failed => write!(f, "failed"),
        }
    }
}

/// Answer to a `GetPermissions` query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionResult {
    Yes,
    /// Allowed after interactive polkit authorization
    Auth,
    No,
}

impl From<&str> for PermissionResult {
    fn from(value: &str) -> Self {
        match value {
            "yes" => PermissionResult::Yes,
            "auth" => PermissionResult::Auth,
            _ => PermissionResult::No,
        }
    }
}

/// Scanned access point information
#[derive(Debug, Clone)]
pub struct AccessPointInfo {
    pub path: String,
    pub ssid: String,
    /// Percent, 0..=100
    pub strength: u8,
}

impl AccessPointInfo {
    /// Approximate dBm for the NetworkManager strength percentage
    pub fn signal_dbm(&self) -> i32 {
        i32::from(self.strength.min(100)) / 2 - 100
    }
}

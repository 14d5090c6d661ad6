use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashMap;
use strum::{Display, EnumIter};

use crate::status::ScanResult;

/// Permission required to read scan results
pub const SCAN_PERMISSION: &str = "org.freedesktop.NetworkManager.wifi.scan";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum WifiStateEvent {
    Enabled,
    Disabled,
    Unknown,
}

impl From<Option<bool>> for WifiStateEvent {
    fn from(enabled: Option<bool>) -> Self {
        match enabled {
            Some(true) => WifiStateEvent::Enabled,
            Some(false) => WifiStateEvent::Disabled,
            None => WifiStateEvent::Unknown,
        }
    }
}

/// Change on a WiFi-transport network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConnectivityEvent {
    Available,
    Lost,
    CapabilitiesChanged,
}

pub type EventStream<T> = BoxStream<'static, T>;

#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn is_granted(&self, permission: &str) -> Result<bool>;

    /// Ask for the permissions, possibly interactively. Resolves once every
    /// permission has an answer.
    async fn request_permissions(&self, permissions: &[&str]) -> Result<HashMap<String, bool>>;
}

#[async_trait]
pub trait WifiStateSource: Send + Sync {
    async fn is_wifi_enabled(&self) -> Result<bool>;

    async fn wifi_state_events(&self) -> Result<EventStream<WifiStateEvent>>;
}

#[async_trait]
pub trait ConnectivitySource: Send + Sync {
    /// Raw SSID of the active WiFi network, as the platform reports it
    async fn active_network_ssid(&self) -> Result<Option<String>>;

    async fn connectivity_events(&self) -> Result<EventStream<ConnectivityEvent>>;
}

#[async_trait]
pub trait ScanResultSource: Send + Sync {
    /// Last scan results, in platform order
    async fn current_scan_results(&self) -> Result<Vec<ScanResult>>;

    async fn request_scan(&self) -> Result<()>;
}

pub trait Platform: PermissionProvider + WifiStateSource + ConnectivitySource + ScanResultSource {}

impl<T> Platform for T where
    T: PermissionProvider + WifiStateSource + ConnectivitySource + ScanResultSource
{
}

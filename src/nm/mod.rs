// NetworkManager D-Bus abstraction layer

use anyhow::{Context, Result};
use std::collections::HashMap;
use zbus::proxy::MethodFlags;
use zbus::zvariant::{OwnedObjectPath, Value};
use zbus::{Connection, Proxy};

pub mod types;
pub mod wifi;

pub use types::*;

const NM_BUS_NAME: &str = "org.freedesktop.NetworkManager";
const NM_PATH: &str = "/org/freedesktop/NetworkManager";
const NM_INTERFACE: &str = "org.freedesktop.NetworkManager";
const DEVICE_INTERFACE: &str = "org.freedesktop.NetworkManager.Device";
const WIRELESS_INTERFACE: &str = "org.freedesktop.NetworkManager.Device.Wireless";
const AP_INTERFACE: &str = "org.freedesktop.NetworkManager.AccessPoint";

/// Main NetworkManager client
#[derive(Clone, Debug)]
pub struct NMClient {
    connection: Connection,
}

impl NMClient {
    /// Create a new NetworkManager client
    pub async fn new() -> Result<Self> {
        let connection = Connection::system()
            .await
            .context("Failed to connect to system D-Bus")?;

        let client = Self::from_connection(connection);

        let version: String = client.nm_proxy().await?.get_property("Version").await.context(
            "NetworkManager is not running or not accessible. Please ensure NetworkManager service is active.",
        )?;
        log::info!("connected to NetworkManager {}", version);

        Ok(client)
    }

    pub(crate) fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }

    async fn nm_proxy(&self) -> Result<Proxy<'static>> {
        Ok(Proxy::new(&self.connection, NM_BUS_NAME, NM_PATH, NM_INTERFACE).await?)
    }

    /// Proxy on a device object. The path is owned so the proxy can outlive
    /// the borrow, which signal streams need.
    async fn device_proxy(&self, device_path: &str, interface: &'static str) -> Result<Proxy<'static>> {
        Ok(Proxy::new(
            &self.connection,
            NM_BUS_NAME,
            device_path.to_string(),
            interface,
        )
        .await?)
    }

    /// Get all WiFi devices
    pub async fn get_wifi_devices(&self) -> Result<Vec<OwnedObjectPath>> {
        let proxy = self.nm_proxy().await?;

        let devices: Vec<OwnedObjectPath> = proxy.call("GetDevices", &()).await?;

        let mut wifi_devices = Vec::new();
        for device_path in devices {
            let device_proxy = self.device_proxy(device_path.as_str(), DEVICE_INTERFACE).await?;

            // DeviceType 2 = WiFi
            let device_type: u32 = device_proxy.get_property("DeviceType").await?;
            if device_type == 2 {
                wifi_devices.push(device_path);
            }
        }

        Ok(wifi_devices)
    }

    /// Get the first WiFi device
    pub async fn get_wifi_device(&self) -> Result<OwnedObjectPath> {
        let devices = self.get_wifi_devices().await?;
        devices.into_iter().next().context("No WiFi device found")
    }

    /// Get device interface name
    pub async fn get_device_interface(&self, device_path: &str) -> Result<String> {
        let proxy = self.device_proxy(device_path, DEVICE_INTERFACE).await?;
        Ok(proxy.get_property("Interface").await?)
    }

    pub async fn is_wireless_enabled(&self) -> Result<bool> {
        let proxy = self.nm_proxy().await?;
        Ok(proxy.get_property("WirelessEnabled").await?)
    }

    pub async fn get_device_state(&self, device_path: &str) -> Result<DeviceState> {
        let proxy = self.device_proxy(device_path, DEVICE_INTERFACE).await?;
        let state: u32 = proxy.get_property("State").await?;
        Ok(DeviceState::from(state))
    }

    /// Polkit verdict for each NetworkManager permission of the caller
    pub async fn get_permissions(&self) -> Result<HashMap<String, PermissionResult>> {
        let proxy = self.nm_proxy().await?;
        let permissions: HashMap<String, String> = proxy
            .call("GetPermissions", &())
            .await
            .context("Failed to query NetworkManager permissions")?;

        Ok(permissions
            .into_iter()
            .map(|(name, result)| {
                let result = PermissionResult::from(result.as_str());
                (name, result)
            })
            .collect())
    }

    /// Request a WiFi scan on a device
    pub async fn request_scan(&self, device_path: &str) -> Result<()> {
        let proxy = self.device_proxy(device_path, WIRELESS_INTERFACE).await?;

        let options: HashMap<&str, Value> = HashMap::new();
        let _: () = proxy.call("RequestScan", &(options,)).await?;
        Ok(())
    }

    /// Same as `request_scan` but lets polkit prompt the user for authorization
    pub async fn request_scan_interactive(&self, device_path: &str) -> Result<()> {
        let proxy = self.device_proxy(device_path, WIRELESS_INTERFACE).await?;

        let options: HashMap<&str, Value> = HashMap::new();
        let _: Option<()> = proxy
            .call_with_flags(
                "RequestScan",
                MethodFlags::AllowInteractiveAuth.into(),
                &(options,),
            )
            .await?;
        Ok(())
    }

    /// Get all access points (scanned networks)
    pub async fn get_access_points(&self, device_path: &str) -> Result<Vec<OwnedObjectPath>> {
        let proxy = self.device_proxy(device_path, WIRELESS_INTERFACE).await?;
        Ok(proxy.call("GetAllAccessPoints", &()).await?)
    }

    /// Get current active access point
    pub async fn get_active_access_point(
        &self,
        device_path: &str,
    ) -> Result<Option<OwnedObjectPath>> {
        let proxy = self.device_proxy(device_path, WIRELESS_INTERFACE).await?;

        let ap_path: OwnedObjectPath = proxy.get_property("ActiveAccessPoint").await?;
        if ap_path.as_str() == "/" {
            Ok(None)
        } else {
            Ok(Some(ap_path))
        }
    }

    /// Get access point details
    pub async fn get_access_point_info(&self, ap_path: &str) -> Result<AccessPointInfo> {
        let proxy = Proxy::new(&self.connection, NM_BUS_NAME, ap_path, AP_INTERFACE).await?;

        let ssid_bytes: Vec<u8> = proxy.get_property("Ssid").await?;
        let ssid = String::from_utf8_lossy(&ssid_bytes).to_string();
        let strength: u8 = proxy.get_property("Strength").await?;

        Ok(AccessPointInfo {
            path: ap_path.to_string(),
            ssid,
            strength,
        })
    }
}

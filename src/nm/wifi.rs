// NetworkManager implementation of the platform sources

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{Stream, StreamExt, future, stream};
use std::collections::HashMap;
use std::sync::Arc;
use zbus::zvariant::OwnedObjectPath;

use super::{DEVICE_INTERFACE, DeviceState, NMClient, PermissionResult, WIRELESS_INTERFACE};
use crate::platform::{
    ConnectivityEvent, ConnectivitySource, EventStream, PermissionProvider, SCAN_PERMISSION,
    ScanResultSource, WifiStateEvent, WifiStateSource,
};
use crate::status::ScanResult;

/// Map a device `StateChanged` transition to a connectivity event
pub fn connectivity_transition(
    new_state: DeviceState,
    old_state: DeviceState,
) -> Option<ConnectivityEvent> {
    match (new_state, old_state) {
        (DeviceState::Activated, DeviceState::Activated) => None,
        (DeviceState::Activated, _) => Some(ConnectivityEvent::Available),
        (_, DeviceState::Activated) => Some(ConnectivityEvent::Lost),
        _ => None,
    }
}

/// Values that differ from the last one seen, starting from `current`.
/// A zbus property stream yields the cached value first, which is not a change.
fn changed_values<T>(values: impl Stream<Item = T>, mut last: T) -> impl Stream<Item = T>
where
    T: PartialEq + Clone,
{
    values.filter_map(move |value| {
        let changed = value != last;
        if changed {
            last = value.clone();
        }
        future::ready(changed.then_some(value))
    })
}

/// WiFi platform backed by the first NetworkManager WiFi device
#[derive(Clone, Debug)]
pub struct NMWifi {
    client: Arc<NMClient>,
    pub device_path: String,
    pub interface: String,
}

impl NMWifi {
    pub async fn new(client: Arc<NMClient>) -> Result<Self> {
        let device_path = client
            .get_wifi_device()
            .await
            .context("No WiFi device found")?
            .as_str()
            .to_string();
        let interface = client.get_device_interface(&device_path).await?;
        let state = client.get_device_state(&device_path).await?;
        log::info!("using WiFi device {} ({}), {}", interface, device_path, state);

        Ok(Self::with_device(client, device_path, interface))
    }

    pub(crate) fn with_device(client: Arc<NMClient>, device_path: String, interface: String) -> Self {
        Self {
            client,
            device_path,
            interface,
        }
    }

    /// Ask NetworkManager to perform the action guarded by the permission,
    /// allowing polkit to prompt. Success means the permission was granted.
    async fn authorize(&self, permission: &str) -> bool {
        if permission != SCAN_PERMISSION {
            return false;
        }
        match self.client.request_scan_interactive(&self.device_path).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("interactive authorization for {} failed: {}", permission, e);
                false
            }
        }
    }
}

#[async_trait]
impl PermissionProvider for NMWifi {
    async fn is_granted(&self, permission: &str) -> Result<bool> {
        let permissions = self.client.get_permissions().await?;
        Ok(permissions.get(permission) == Some(&PermissionResult::Yes))
    }

    async fn request_permissions(&self, permissions: &[&str]) -> Result<HashMap<String, bool>> {
        let current = self.client.get_permissions().await?;
        let mut granted = HashMap::new();

        for &permission in permissions {
            let answer = match current.get(permission) {
                Some(PermissionResult::Yes) => true,
                Some(PermissionResult::Auth) => self.authorize(permission).await,
                Some(PermissionResult::No) | None => false,
            };
            log::debug!("permission {} granted: {}", permission, answer);
            granted.insert(permission.to_string(), answer);
        }

        Ok(granted)
    }
}

#[async_trait]
impl WifiStateSource for NMWifi {
    async fn is_wifi_enabled(&self) -> Result<bool> {
        self.client.is_wireless_enabled().await
    }

    async fn wifi_state_events(&self) -> Result<EventStream<WifiStateEvent>> {
        let proxy = self.client.nm_proxy().await?;
        let current = proxy.get_property::<bool>("WirelessEnabled").await.ok();
        let values = proxy
            .receive_property_changed::<bool>("WirelessEnabled")
            .await
            .then(|change| async move { change.get().await.ok() });

        Ok(changed_values(values, current)
            .map(WifiStateEvent::from)
            .boxed())
    }
}

#[async_trait]
impl ConnectivitySource for NMWifi {
    async fn active_network_ssid(&self) -> Result<Option<String>> {
        match self.client.get_active_access_point(&self.device_path).await? {
            Some(ap_path) => {
                let ap_info = self.client.get_access_point_info(ap_path.as_str()).await?;
                Ok(Some(ap_info.ssid))
            }
            None => Ok(None),
        }
    }

    async fn connectivity_events(&self) -> Result<EventStream<ConnectivityEvent>> {
        let device = self.client.device_proxy(&self.device_path, DEVICE_INTERFACE).await?;
        let transitions = device
            .receive_signal("StateChanged")
            .await?
            .filter_map(|message| async move {
                let (new_state, old_state, _reason): (u32, u32, u32) =
                    message.body().deserialize().ok()?;
                let (new_state, old_state) = (DeviceState::from(new_state), DeviceState::from(old_state));
                log::debug!("WiFi device {} -> {}", old_state, new_state);
                connectivity_transition(new_state, old_state)
            });

        // Roaming to another access point keeps the device activated
        let wireless = self
            .client
            .device_proxy(&self.device_path, WIRELESS_INTERFACE)
            .await?;
        let current = wireless
            .get_property::<OwnedObjectPath>("ActiveAccessPoint")
            .await
            .ok();
        let access_points = wireless
            .receive_property_changed::<OwnedObjectPath>("ActiveAccessPoint")
            .await
            .then(|change| async move { change.get().await.ok() });
        let roams = changed_values(access_points, current).filter_map(|ap_path| async move {
            let ap_path = ap_path?;
            (ap_path.as_str() != "/").then_some(ConnectivityEvent::CapabilitiesChanged)
        });

        Ok(stream::select(transitions.boxed(), roams.boxed()).boxed())
    }
}

#[async_trait]
impl ScanResultSource for NMWifi {
    async fn current_scan_results(&self) -> Result<Vec<ScanResult>> {
        let aps = self.client.get_access_points(&self.device_path).await?;
        let mut results = Vec::with_capacity(aps.len());

        for ap_path in aps {
            match self.client.get_access_point_info(ap_path.as_str()).await {
                // Hidden networks show up with an empty SSID
                Ok(ap_info) if ap_info.ssid.is_empty() => {}
                Ok(ap_info) => results.push(ScanResult::new(ap_info.ssid.clone(), ap_info.signal_dbm())),
                Err(e) => log::debug!("skipping access point {}: {}", ap_path.as_str(), e),
            }
        }

        Ok(results)
    }

    async fn request_scan(&self) -> Result<()> {
        self.client.request_scan(&self.device_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::UnixStream;
    use tokio::time::timeout;
    use zbus::object_server::SignalEmitter;
    use zbus::{Guid, connection};

    use super::super::NM_PATH;

    const DEVICE_PATH: &str = "/org/freedesktop/NetworkManager/Devices/3";
    const HOME_AP: &str = "/org/freedesktop/NetworkManager/AccessPoint/7";
    const OFFICE_AP: &str = "/org/freedesktop/NetworkManager/AccessPoint/9";
    const QUIET: Duration = Duration::from_millis(300);
    const WAIT: Duration = Duration::from_secs(5);

    struct FakeManager {
        wireless_enabled: bool,
    }

    #[zbus::interface(name = "org.freedesktop.NetworkManager")]
    impl FakeManager {
        #[zbus(property)]
        fn wireless_enabled(&self) -> bool {
            self.wireless_enabled
        }
    }

    struct FakeDevice;

    #[zbus::interface(name = "org.freedesktop.NetworkManager.Device")]
    impl FakeDevice {
        #[zbus(property)]
        fn state(&self) -> u32 {
            100
        }

        #[zbus(signal, name = "StateChanged")]
        async fn state_changed_signal(
            emitter: &SignalEmitter<'_>,
            new_state: u32,
            old_state: u32,
            reason: u32,
        ) -> zbus::Result<()>;
    }

    struct FakeWireless {
        active_access_point: OwnedObjectPath,
    }

    #[zbus::interface(name = "org.freedesktop.NetworkManager.Device.Wireless")]
    impl FakeWireless {
        #[zbus(property)]
        fn active_access_point(&self) -> OwnedObjectPath {
            self.active_access_point.clone()
        }
    }

    fn object_path(path: &str) -> OwnedObjectPath {
        OwnedObjectPath::try_from(path).unwrap()
    }

    /// NetworkManager stand-in served over a private peer-to-peer connection.
    /// The server connection must be kept alive for the duration of the test.
    async fn fake_network_manager() -> (zbus::Connection, NMWifi) {
        let (server, client) = UnixStream::pair().unwrap();
        let server = connection::Builder::unix_stream(server)
            .server(Guid::generate())
            .unwrap()
            .p2p()
            .serve_at(
                NM_PATH,
                FakeManager {
                    wireless_enabled: true,
                },
            )
            .unwrap()
            .serve_at(DEVICE_PATH, FakeDevice)
            .unwrap()
            .serve_at(
                DEVICE_PATH,
                FakeWireless {
                    active_access_point: object_path(HOME_AP),
                },
            )
            .unwrap()
            .build();
        let client = connection::Builder::unix_stream(client).p2p().build();
        let (server, client) = tokio::try_join!(server, client).unwrap();

        let client = Arc::new(NMClient::from_connection(client));
        let wifi = NMWifi::with_device(client, DEVICE_PATH.to_string(), "wlan0".to_string());
        (server, wifi)
    }

    async fn set_wireless_enabled(server: &zbus::Connection, enabled: bool) {
        let manager = server
            .object_server()
            .interface::<_, FakeManager>(NM_PATH)
            .await
            .unwrap();
        manager.get_mut().await.wireless_enabled = enabled;
        manager
            .get()
            .await
            .wireless_enabled_changed(manager.signal_emitter())
            .await
            .unwrap();
    }

    async fn set_active_access_point(server: &zbus::Connection, path: &str) {
        let wireless = server
            .object_server()
            .interface::<_, FakeWireless>(DEVICE_PATH)
            .await
            .unwrap();
        wireless.get_mut().await.active_access_point = object_path(path);
        wireless
            .get()
            .await
            .active_access_point_changed(wireless.signal_emitter())
            .await
            .unwrap();
    }

    async fn emit_state_changed(server: &zbus::Connection, new_state: u32, old_state: u32) {
        let device = server
            .object_server()
            .interface::<_, FakeDevice>(DEVICE_PATH)
            .await
            .unwrap();
        FakeDevice::state_changed_signal(device.signal_emitter(), new_state, old_state, 0)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wifi_state_stream_is_silent_until_a_change() {
        let (server, wifi) = fake_network_manager().await;
        assert!(wifi.is_wifi_enabled().await.unwrap());

        let mut events = wifi.wifi_state_events().await.unwrap();
        assert!(timeout(QUIET, events.next()).await.is_err());

        set_wireless_enabled(&server, false).await;
        assert_eq!(
            timeout(WAIT, events.next()).await.unwrap(),
            Some(WifiStateEvent::Disabled)
        );

        set_wireless_enabled(&server, true).await;
        assert_eq!(
            timeout(WAIT, events.next()).await.unwrap(),
            Some(WifiStateEvent::Enabled)
        );
    }

    #[tokio::test]
    async fn resubscribing_does_not_replay_the_current_state() {
        let (server, wifi) = fake_network_manager().await;

        let first = wifi.wifi_state_events().await.unwrap();
        drop(first);
        let mut events = wifi.wifi_state_events().await.unwrap();
        assert!(timeout(QUIET, events.next()).await.is_err());

        set_wireless_enabled(&server, false).await;
        assert_eq!(
            timeout(WAIT, events.next()).await.unwrap(),
            Some(WifiStateEvent::Disabled)
        );
    }

    #[tokio::test]
    async fn connectivity_stream_follows_device_and_access_point() {
        let (server, wifi) = fake_network_manager().await;
        let mut events = wifi.connectivity_events().await.unwrap();
        assert!(timeout(QUIET, events.next()).await.is_err());

        emit_state_changed(&server, 30, 100).await;
        assert_eq!(
            timeout(WAIT, events.next()).await.unwrap(),
            Some(ConnectivityEvent::Lost)
        );

        emit_state_changed(&server, 100, 80).await;
        assert_eq!(
            timeout(WAIT, events.next()).await.unwrap(),
            Some(ConnectivityEvent::Available)
        );

        set_active_access_point(&server, OFFICE_AP).await;
        assert_eq!(
            timeout(WAIT, events.next()).await.unwrap(),
            Some(ConnectivityEvent::CapabilitiesChanged)
        );

        // Losing the access point is reported through the device state
        set_active_access_point(&server, "/").await;
        emit_state_changed(&server, 30, 100).await;
        assert_eq!(
            timeout(WAIT, events.next()).await.unwrap(),
            Some(ConnectivityEvent::Lost)
        );
    }

    #[tokio::test]
    async fn repeated_values_are_not_changes() {
        let values = stream::iter([Some(true), Some(true), Some(false), Some(false), None]);
        let changes: Vec<_> = changed_values(values, Some(true)).collect().await;
        assert_eq!(changes, vec![Some(false), None]);
    }

    #[test]
    fn activation_is_available() {
        assert_eq!(
            connectivity_transition(DeviceState::Activated, DeviceState::IpCheck),
            Some(ConnectivityEvent::Available)
        );
    }

    #[test]
    fn leaving_activated_is_lost() {
        for new_state in [
            DeviceState::Deactivating,
            DeviceState::Disconnected,
            DeviceState::Failed,
        ] {
            assert_eq!(
                connectivity_transition(new_state, DeviceState::Activated),
                Some(ConnectivityEvent::Lost)
            );
        }
    }

    #[test]
    fn intermediate_states_are_ignored() {
        assert_eq!(
            connectivity_transition(DeviceState::Config, DeviceState::Prepare),
            None
        );
        assert_eq!(
            connectivity_transition(DeviceState::Activated, DeviceState::Activated),
            None
        );
    }
}

use anyhow::Result;
use async_channel::Sender;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::platform::{
    ConnectivityEvent, ConnectivitySource, EventStream, PermissionProvider, SCAN_PERMISSION,
    ScanResultSource, WifiStateEvent, WifiStateSource,
};
use crate::status::ScanResult;

#[derive(Debug, Clone)]
pub struct DemoState {
    pub permission_granted: bool,
    /// Answer given when the permission is requested
    pub grant_on_request: bool,
    pub wifi_enabled: bool,
    pub connected_ssid: Option<String>,
    pub scan_results: Vec<ScanResult>,
}

impl Default for DemoState {
    fn default() -> Self {
        Self {
            permission_granted: false,
            grant_on_request: true,
            wifi_enabled: true,
            connected_ssid: None,
            scan_results: vec![
                ScanResult::new("Home_Fiber_5G", -48),
                ScanResult::new("Office_Main", -61),
                ScanResult::new("Coffee_Shop_Free", -74),
                ScanResult::new("Guest_Network", -55),
                ScanResult::new("Linksys_502", -88),
                ScanResult::new("DIRECT-printer", -81),
            ],
        }
    }
}

/// In-memory platform, used by `--demo` and in tests
#[derive(Debug, Default)]
pub struct DemoWifi {
    state: Mutex<DemoState>,
    wifi_listeners: Mutex<Vec<Sender<WifiStateEvent>>>,
    connectivity_listeners: Mutex<Vec<Sender<ConnectivityEvent>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn broadcast<T: Copy>(listeners: &Mutex<Vec<Sender<T>>>, event: T) {
    // Closed receivers belong to released subscriptions
    lock(listeners).retain(|tx| tx.try_send(event).is_ok());
}

impl DemoWifi {
    pub fn new(state: DemoState) -> Self {
        Self {
            state: Mutex::new(state),
            ..Default::default()
        }
    }

    pub fn state(&self) -> DemoState {
        lock(&self.state).clone()
    }

    pub fn set_wifi_enabled(&self, enabled: bool) {
        {
            let mut state = lock(&self.state);
            state.wifi_enabled = enabled;
            if !enabled {
                state.connected_ssid = None;
            }
        }
        broadcast(&self.wifi_listeners, WifiStateEvent::from(Some(enabled)));
    }

    pub fn connect(&self, ssid: &str) {
        lock(&self.state).connected_ssid = Some(ssid.to_string());
        broadcast(&self.connectivity_listeners, ConnectivityEvent::Available);
    }

    pub fn disconnect(&self) {
        lock(&self.state).connected_ssid = None;
        broadcast(&self.connectivity_listeners, ConnectivityEvent::Lost);
    }

    pub fn set_scan_results(&self, scan_results: Vec<ScanResult>) {
        lock(&self.state).scan_results = scan_results;
    }

    /// Live listeners across both event sources
    pub fn listener_count(&self) -> usize {
        let wifi = lock(&self.wifi_listeners)
            .iter()
            .filter(|tx| !tx.is_closed())
            .count();
        let connectivity = lock(&self.connectivity_listeners)
            .iter()
            .filter(|tx| !tx.is_closed())
            .count();
        wifi + connectivity
    }
}

#[async_trait]
impl PermissionProvider for DemoWifi {
    async fn is_granted(&self, permission: &str) -> Result<bool> {
        Ok(permission == SCAN_PERMISSION && lock(&self.state).permission_granted)
    }

    async fn request_permissions(&self, permissions: &[&str]) -> Result<HashMap<String, bool>> {
        let mut state = lock(&self.state);
        if state.grant_on_request {
            state.permission_granted = true;
        }
        Ok(permissions
            .iter()
            .map(|&p| (p.to_string(), p == SCAN_PERMISSION && state.permission_granted))
            .collect())
    }
}

#[async_trait]
impl WifiStateSource for DemoWifi {
    async fn is_wifi_enabled(&self) -> Result<bool> {
        Ok(lock(&self.state).wifi_enabled)
    }

    async fn wifi_state_events(&self) -> Result<EventStream<WifiStateEvent>> {
        let (tx, rx) = async_channel::unbounded();
        lock(&self.wifi_listeners).push(tx);
        Ok(rx.boxed())
    }
}

#[async_trait]
impl ConnectivitySource for DemoWifi {
    async fn active_network_ssid(&self) -> Result<Option<String>> {
        Ok(lock(&self.state).connected_ssid.clone())
    }

    async fn connectivity_events(&self) -> Result<EventStream<ConnectivityEvent>> {
        let (tx, rx) = async_channel::unbounded();
        lock(&self.connectivity_listeners).push(tx);
        Ok(rx.boxed())
    }
}

#[async_trait]
impl ScanResultSource for DemoWifi {
    async fn current_scan_results(&self) -> Result<Vec<ScanResult>> {
        Ok(lock(&self.state).scan_results.clone())
    }

    async fn request_scan(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_grants_when_configured() {
        let demo = DemoWifi::new(DemoState::default());
        assert!(!demo.is_granted(SCAN_PERMISSION).await.unwrap());

        let answers = demo.request_permissions(&[SCAN_PERMISSION]).await.unwrap();
        assert_eq!(answers.get(SCAN_PERMISSION), Some(&true));
        assert!(demo.is_granted(SCAN_PERMISSION).await.unwrap());
    }

    #[tokio::test]
    async fn request_can_be_refused() {
        let demo = DemoWifi::new(DemoState {
            grant_on_request: false,
            ..Default::default()
        });
        let answers = demo.request_permissions(&[SCAN_PERMISSION]).await.unwrap();
        assert_eq!(answers.get(SCAN_PERMISSION), Some(&false));
    }

    #[tokio::test]
    async fn events_reach_subscribers() {
        let demo = DemoWifi::default();
        let mut wifi = demo.wifi_state_events().await.unwrap();
        let mut connectivity = demo.connectivity_events().await.unwrap();

        demo.set_wifi_enabled(false);
        demo.connect("HomeNet");

        assert_eq!(wifi.next().await, Some(WifiStateEvent::Disabled));
        assert_eq!(connectivity.next().await, Some(ConnectivityEvent::Available));
        assert_eq!(
            demo.active_network_ssid().await.unwrap().as_deref(),
            Some("HomeNet")
        );
    }

    #[tokio::test]
    async fn dropped_streams_stop_listening() {
        let demo = DemoWifi::default();
        let stream = demo.wifi_state_events().await.unwrap();
        assert_eq!(demo.listener_count(), 1);

        drop(stream);
        assert_eq!(demo.listener_count(), 0);
        demo.set_wifi_enabled(true);
        assert!(lock(&demo.wifi_listeners).is_empty());
    }
}

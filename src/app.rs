use anyhow::Result;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    config::Config,
    event::Event,
    listener::{self, Subscription},
    notification::{Notification, NotificationLevel},
    platform::{ConnectivityEvent, Platform, SCAN_PERMISSION, WifiStateEvent},
    status::{DisplayModel, ScanResult, reconcile, usable_ssid},
};

pub struct App {
    pub running: bool,
    pub platform: Arc<dyn Platform>,
    pub config: Arc<Config>,
    pub sender: UnboundedSender<Event>,
    pub permission_granted: bool,
    pub display: DisplayModel,
    pub notifications: Vec<Notification>,
    pub last_refresh: Option<DateTime<Local>>,
    subscription: Option<Subscription>,
}

impl App {
    pub async fn new(
        platform: Arc<dyn Platform>,
        config: Arc<Config>,
        sender: UnboundedSender<Event>,
    ) -> Result<Self> {
        let permission_granted = match platform.is_granted(SCAN_PERMISSION).await {
            Ok(granted) => granted,
            Err(e) => {
                log::warn!("Can not check the scan permission: {}", e);
                false
            }
        };

        if !permission_granted {
            listener::request_permission(platform.clone(), sender.clone(), config.notification_ttl);
        }

        Ok(Self {
            running: true,
            platform,
            config,
            sender,
            permission_granted,
            display: reconcile(permission_granted, false, None, &[]),
            notifications: Vec::new(),
            last_refresh: None,
            subscription: None,
        })
    }

    /// Query the platform afresh and reconcile the display.
    pub async fn refresh(&mut self) {
        let wifi_enabled = match self.platform.is_wifi_enabled().await {
            Ok(enabled) => enabled,
            Err(e) => {
                log::warn!("Can not read the WiFi state: {}", e);
                false
            }
        };

        let connected_ssid = if wifi_enabled {
            self.platform
                .active_network_ssid()
                .await
                .unwrap_or_else(|e| {
                    log::warn!("Can not read the active network: {}", e);
                    None
                })
        } else {
            None
        };

        // Scan results only matter when they can be listed
        let listed = wifi_enabled
            && self.permission_granted
            && connected_ssid.as_deref().and_then(usable_ssid).is_none();
        let scan_results: Vec<ScanResult> = if listed {
            self.platform
                .current_scan_results()
                .await
                .unwrap_or_else(|e| {
                    log::warn!("Can not read scan results: {}", e);
                    Vec::new()
                })
        } else {
            Vec::new()
        };

        self.display = reconcile(
            self.permission_granted,
            wifi_enabled,
            connected_ssid.as_deref(),
            &scan_results,
        );
        self.last_refresh = Some(Local::now());
        log::debug!("display reconciled: {:?}", self.display);
    }

    /// Screen became visible: register listeners and catch up.
    /// Without listeners the display still refreshes; the next show retries.
    pub async fn show(&mut self) {
        if self.subscription.is_none() {
            match Subscription::acquire(self.platform.clone(), self.sender.clone()).await {
                Ok(subscription) => self.subscription = Some(subscription),
                Err(e) => {
                    log::warn!("Can not listen for WiFi changes: {}", e);
                    self.notify(
                        format!("Can not listen for WiFi changes: {}", e),
                        NotificationLevel::Error,
                    );
                }
            }
        }
        self.refresh().await;
    }

    /// Screen got hidden: unregister listeners.
    pub async fn hide(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.release().await;
        }
    }

    pub fn is_listening(&self) -> bool {
        self.subscription.is_some()
    }

    pub async fn on_permission_result(&mut self, granted: bool) {
        log::info!("scan permission granted: {}", granted);
        self.permission_granted = granted;
        self.refresh().await;
    }

    pub async fn on_wifi_state(&mut self, event: WifiStateEvent) {
        log::info!("WiFi state changed: {}", event);
        self.refresh().await;
        if let Some(message) = Notification::wifi_state_message(event) {
            self.notify(message, NotificationLevel::Info);
        }
    }

    pub async fn on_connectivity(&mut self, event: ConnectivityEvent) {
        log::info!("WiFi connectivity changed: {}", event);
        self.refresh().await;
        if let Some(message) = Notification::connectivity_message(event, &self.display.wifi_state())
        {
            self.notify(message, NotificationLevel::Info);
        }
    }

    pub fn request_permission(&self) {
        listener::request_permission(
            self.platform.clone(),
            self.sender.clone(),
            self.config.notification_ttl,
        );
    }

    pub async fn request_scan(&mut self) {
        match self.platform.request_scan().await {
            Ok(()) => self.notify("Start Scanning".to_string(), NotificationLevel::Info),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("Scanning not allowed") {
                    self.notify("Scanning in progress".to_string(), NotificationLevel::Info);
                } else {
                    self.notify(msg, NotificationLevel::Error);
                }
            }
        }
    }

    pub fn notify(&mut self, message: String, level: NotificationLevel) {
        self.notifications
            .push(Notification::new(message, level, self.config.notification_ttl));
    }

    pub fn tick(&mut self) {
        self.notifications.retain(|n| n.ttl > 0);
        self.notifications.iter_mut().for_each(|n| n.ttl -= 1);
    }

    pub fn quit(&mut self) {
        self.running = false;
    }
}

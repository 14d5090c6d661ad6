use anyhow::Result;
use async_channel::{Receiver, Sender};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::event::Event;
use crate::notification::{Notification, NotificationLevel};
use crate::platform::{EventStream, Platform, SCAN_PERMISSION};

/// Registered platform listeners. Held while the screen is visible;
/// dropping it unregisters them.
#[derive(Debug)]
pub struct Subscription {
    tx_cancel: Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub async fn acquire(
        platform: Arc<dyn Platform>,
        sender: UnboundedSender<Event>,
    ) -> Result<Self> {
        let (tx_cancel, rx_cancel) = async_channel::bounded(1);

        let wifi_events = platform.wifi_state_events().await?;
        let connectivity_events = platform.connectivity_events().await?;

        let tasks = vec![
            tokio::spawn(forward(
                wifi_events,
                rx_cancel.clone(),
                sender.clone(),
                Event::WifiState,
            )),
            tokio::spawn(forward(
                connectivity_events,
                rx_cancel,
                sender,
                Event::Connectivity,
            )),
        ];
        log::debug!("platform listeners registered");

        Ok(Self { tx_cancel, tasks })
    }

    /// Unregister and wait until the listeners are gone
    pub async fn release(mut self) {
        self.tx_cancel.close();
        for task in self.tasks.drain(..) {
            let _ = task.await;
        }
        log::debug!("platform listeners released");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.tx_cancel.close();
        self.tasks.iter().for_each(|task| task.abort());
    }
}

async fn forward<T>(
    mut events: EventStream<T>,
    rx_cancel: Receiver<()>,
    sender: UnboundedSender<Event>,
    wrap: fn(T) -> Event,
) {
    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => {
                    if sender.send(wrap(event)).is_err() {
                        break;
                    }
                }
                None => break,
            },
            _ = rx_cancel.recv() => break,
        }
    }
}

/// Ask for the scan permission and report the answer once, as
/// `Event::PermissionResult`.
pub fn request_permission(
    platform: Arc<dyn Platform>,
    sender: UnboundedSender<Event>,
    notification_ttl: u16,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let granted = match platform.request_permissions(&[SCAN_PERMISSION]).await {
            Ok(answers) => answers.get(SCAN_PERMISSION).copied().unwrap_or(false),
            Err(e) => {
                log::warn!("permission request failed: {}", e);
                let _ = Notification::send(
                    format!("Permission request failed: {}", e),
                    NotificationLevel::Error,
                    notification_ttl,
                    &sender,
                );
                false
            }
        };
        let _ = sender.send(Event::PermissionResult(granted));
    })
}

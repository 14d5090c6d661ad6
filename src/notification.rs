use anyhow::Result;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Text},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};
use tokio::sync::mpsc::UnboundedSender;

use crate::event::Event;
use crate::platform::{ConnectivityEvent, WifiStateEvent};
use crate::status::WifiState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    /// Remaining lifetime in ticks
    pub ttl: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Error,
    Warning,
    Info,
}

impl Notification {
    pub fn new(message: String, level: NotificationLevel, ttl: u16) -> Self {
        Self {
            message,
            level,
            ttl,
        }
    }

    pub fn send(
        message: String,
        level: NotificationLevel,
        ttl: u16,
        sender: &UnboundedSender<Event>,
    ) -> Result<()> {
        sender.send(Event::Notification(Self::new(message, level, ttl)))?;
        Ok(())
    }

    /// Toast for a WiFi radio change, if it deserves one
    pub fn wifi_state_message(event: WifiStateEvent) -> Option<String> {
        match event {
            WifiStateEvent::Enabled => Some("WiFi is On".to_string()),
            WifiStateEvent::Disabled => Some("WiFi is Off".to_string()),
            WifiStateEvent::Unknown => None,
        }
    }

    /// Toast for a connectivity change, given the state after refreshing
    pub fn connectivity_message(event: ConnectivityEvent, state: &WifiState) -> Option<String> {
        match (event, state) {
            (ConnectivityEvent::Available, WifiState::ActiveConnected(ssid)) => {
                Some(format!("Connected to WiFi: {}", ssid))
            }
            (ConnectivityEvent::Lost, _) => Some("WiFi Disconnected".to_string()),
            _ => None,
        }
    }

    pub fn render(&self, index: usize, frame: &mut Frame) {
        let (color, title) = match self.level {
            NotificationLevel::Info => (Color::Green, "Info"),
            NotificationLevel::Warning => (Color::Yellow, "Warning"),
            NotificationLevel::Error => (Color::Red, "Error"),
        };

        let mut text = Text::from(vec![
            Line::from(title).style(Style::new().fg(color).add_modifier(Modifier::BOLD)),
        ]);
        text.extend(Text::from(self.message.as_str()));

        let notification_height = text.height() as u16 + 2;
        let notification_width = text.width() as u16 + 4;

        let block = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Thick)
                    .border_style(Style::default().fg(color)),
            );

        let area = notification_rect(
            index as u16,
            notification_height,
            notification_width,
            frame.area(),
        );

        frame.render_widget(Clear, area);
        frame.render_widget(block, area);
    }
}

/// Stack toasts in the top right corner
fn notification_rect(offset: u16, height: u16, width: u16, r: Rect) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(height * offset),
            Constraint::Length(height),
            Constraint::Min(1),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(width),
            Constraint::Length(2),
        ])
        .split(rows[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn radio_toasts() {
        let messages: Vec<Option<String>> = WifiStateEvent::iter()
            .map(Notification::wifi_state_message)
            .collect();
        assert_eq!(
            messages,
            vec![
                Some("WiFi is On".to_string()),
                Some("WiFi is Off".to_string()),
                None
            ]
        );
    }

    #[test]
    fn connected_toast_names_the_network() {
        let state = WifiState::ActiveConnected("HomeNet".to_string());
        assert_eq!(
            Notification::connectivity_message(ConnectivityEvent::Available, &state).as_deref(),
            Some("Connected to WiFi: HomeNet")
        );
    }

    #[test]
    fn available_without_ssid_is_silent() {
        assert_eq!(
            Notification::connectivity_message(
                ConnectivityEvent::Available,
                &WifiState::ActiveDisconnected
            ),
            None
        );
    }

    #[test]
    fn capability_changes_are_silent() {
        for state in [
            WifiState::Inactive,
            WifiState::ActiveDisconnected,
            WifiState::ActiveConnected("HomeNet".to_string()),
        ] {
            assert_eq!(
                Notification::connectivity_message(ConnectivityEvent::CapabilitiesChanged, &state),
                None
            );
        }
    }

    #[test]
    fn lost_always_toasts() {
        for state in [WifiState::Inactive, WifiState::ActiveDisconnected] {
            assert_eq!(
                Notification::connectivity_message(ConnectivityEvent::Lost, &state).as_deref(),
                Some("WiFi Disconnected")
            );
        }
    }

    #[test]
    fn send_goes_through_the_event_channel() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        Notification::send("hello".to_string(), NotificationLevel::Info, 3, &tx).unwrap();
        match rx.try_recv() {
            Ok(Event::Notification(n)) => {
                assert_eq!(n.message, "hello");
                assert_eq!(n.ttl, 3);
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }
}

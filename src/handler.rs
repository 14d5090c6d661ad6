use anyhow::Result;

use crate::app::App;
use crate::notification::NotificationLevel;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub async fn handle_key_events(key_event: KeyEvent, app: &mut App) -> Result<()> {
    let keys = app.config.keys.clone();

    match key_event.code {
        KeyCode::Char('q') => {
            app.quit();
        }
        KeyCode::Esc if app.config.esc_quit => {
            app.quit();
        }
        KeyCode::Char('c' | 'C') if key_event.modifiers == KeyModifiers::CONTROL => {
            app.quit();
        }
        KeyCode::Char(c) if c == keys.refresh => {
            app.refresh().await;
        }
        KeyCode::Char(c) if c == keys.scan => {
            app.request_scan().await;
        }
        KeyCode::Char(c) if c == keys.permission => {
            if app.permission_granted {
                app.notify(
                    "Scan permission already granted".to_string(),
                    NotificationLevel::Info,
                );
            } else {
                app.request_permission();
            }
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::demo::{DemoState, DemoWifi};
    use crate::event::Event;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn app_with(config: Config) -> (App, mpsc::UnboundedReceiver<Event>) {
        let demo = Arc::new(DemoWifi::new(DemoState {
            permission_granted: true,
            ..Default::default()
        }));
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(demo, Arc::new(config), tx).await.unwrap();
        (app, rx)
    }

    async fn app_default() -> (App, mpsc::UnboundedReceiver<Event>) {
        app_with(Config::default()).await
    }

    #[tokio::test]
    async fn q_and_ctrl_c_quit() {
        let (mut app, _rx) = app_default().await;
        handle_key_events(key(KeyCode::Char('q')), &mut app).await.unwrap();
        assert!(!app.running);

        let (mut app, _rx) = app_default().await;
        handle_key_events(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &mut app,
        )
        .await
        .unwrap();
        assert!(!app.running);
    }

    #[tokio::test]
    async fn esc_quits_only_when_configured() {
        let (mut app_a, _rx) = app_default().await;
        handle_key_events(key(KeyCode::Esc), &mut app_a).await.unwrap();
        assert!(app_a.running);

        let (mut app_b, _rx) = app_with(Config {
            esc_quit: true,
            ..Default::default()
        })
        .await;
        handle_key_events(key(KeyCode::Esc), &mut app_b).await.unwrap();
        assert!(!app_b.running);
    }

    #[tokio::test]
    async fn refresh_key_reconciles() {
        let (mut app, _rx) = app_default().await;
        assert!(app.last_refresh.is_none());
        handle_key_events(key(KeyCode::Char('r')), &mut app).await.unwrap();
        assert!(app.last_refresh.is_some());
        assert!(app.display.networks_visible);
    }

    #[tokio::test]
    async fn scan_key_toasts() {
        let (mut app, _rx) = app_default().await;
        handle_key_events(key(KeyCode::Char('s')), &mut app).await.unwrap();
        assert_eq!(app.notifications.last().unwrap().message, "Start Scanning");
    }

    #[tokio::test]
    async fn permission_key_when_granted_only_informs() {
        let (mut app, _rx) = app_default().await;
        handle_key_events(key(KeyCode::Char('p')), &mut app).await.unwrap();
        let toast = app.notifications.last().unwrap();
        assert_eq!(toast.message, "Scan permission already granted");
        assert_eq!(toast.level, NotificationLevel::Info);
    }
}

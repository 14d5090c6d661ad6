use anyhow::{Context, Result, anyhow};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::sync::Arc;

use wifimon::app::App;
use wifimon::cli;
use wifimon::config::Config;
use wifimon::demo::{DemoState, DemoWifi};
use wifimon::event::{Event, EventHandler};
use wifimon::handler::handle_key_events;
use wifimon::nm::{NMClient, wifi::NMWifi};
use wifimon::platform::Platform;
use wifimon::tui::Tui;

fn init_logging(path: &str) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Can not create the log file {}", path))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

async fn platform(demo: bool) -> Result<Arc<dyn Platform>> {
    if demo {
        return Ok(Arc::new(DemoWifi::new(DemoState::default())));
    }

    let client = match NMClient::new().await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            return Err(anyhow!(
                "Can not access the NetworkManager service.\nError: {}",
                e
            ));
        }
    };
    Ok(Arc::new(NMWifi::new(client).await?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::cli().get_matches();

    if let Some(path) = args.get_one::<String>("log") {
        init_logging(path)?;
    }

    let config = Arc::new(Config::new()?);
    let platform = platform(args.get_flag("demo")).await?;

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;
    let events = EventHandler::new(config.tick_rate_ms);
    let mut app = App::new(platform, config.clone(), events.sender.clone()).await?;
    let mut tui = Tui::new(terminal, events);
    tui.init()?;

    app.show().await;

    while app.running {
        tui.draw(&mut app)?;
        match tui.events.next().await? {
            Event::Tick => app.tick(),
            Event::Key(key_event) => handle_key_events(key_event, &mut app).await?,
            Event::Resize(_, _) => {}
            Event::FocusGained => app.show().await,
            Event::FocusLost => app.hide().await,
            Event::Notification(notification) => app.notifications.push(notification),
            Event::PermissionResult(granted) => app.on_permission_result(granted).await,
            Event::WifiState(event) => app.on_wifi_state(event).await,
            Event::Connectivity(event) => app.on_connectivity(event).await,
        }
    }

    app.hide().await;
    tui.exit()?;
    Ok(())
}

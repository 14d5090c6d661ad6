use ratatui::{
    Frame,
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Row, Table},
};

use crate::app::App;
use crate::status::{DisplayModel, NO_NETWORKS_FOUND, NetworkList, StatusColor};

fn color(status_color: StatusColor) -> Color {
    match status_color {
        StatusColor::Green => Color::Green,
        StatusColor::Red => Color::Red,
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let (status_block, networks_block, help_block) = {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .margin(1)
            .split(frame.area());
        (chunks[0], chunks[1], chunks[2])
    };

    render_status(&app.display, frame, status_block);

    if app.display.networks_visible {
        render_networks(&app.display.networks, frame, networks_block);
    }

    let updated = app
        .last_refresh
        .map(|at| at.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let keys = &app.config.keys;
    let help_message = Line::from(vec![
        Span::from(keys.refresh.to_string()).bold(),
        Span::from(" Refresh"),
        Span::from(" | "),
        Span::from(keys.scan.to_string()).bold(),
        Span::from(" Scan"),
        Span::from(" | "),
        Span::from(keys.permission.to_string()).bold(),
        Span::from(" Permission"),
        Span::from(" | "),
        Span::from("q").bold(),
        Span::from(" Quit"),
        Span::from(format!("   updated {}", updated)),
    ])
    .centered()
    .blue();
    frame.render_widget(help_message, help_block);

    for (index, notification) in app.notifications.iter().enumerate() {
        notification.render(index, frame);
    }
}

fn render_status(display: &DisplayModel, frame: &mut Frame, area: Rect) {
    let (permission, permission_color) = display.permission_text();

    let rows = vec![
        Row::new(vec![
            Line::from("Permission").yellow(),
            Line::from(permission).fg(color(permission_color)),
        ]),
        Row::new(vec![
            Line::from("Status").yellow(),
            Line::from(display.status.to_string()).fg(color(display.status_color)),
        ]),
        Row::new(vec![
            Line::from("Current WiFi").yellow(),
            Line::from(display.ssid_text.clone()),
        ]),
    ];

    let widths = [Constraint::Length(14), Constraint::Fill(1)];

    let table = Table::new(rows, widths)
        .block(
            Block::default()
                .title(" WiFi Monitor ")
                .title_style(Style::default().bold())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green))
                .border_type(BorderType::Thick)
                .padding(Padding::uniform(1)),
        )
        .column_spacing(2);

    frame.render_widget(table, area);
}

fn render_networks(networks: &NetworkList, frame: &mut Frame, area: Rect) {
    let rows: Vec<Row> = match networks {
        NetworkList::Hidden | NetworkList::Empty => Vec::new(),
        NetworkList::Placeholder => {
            vec![Row::new(vec![Line::from(NO_NETWORKS_FOUND).fg(Color::DarkGray)])]
        }
        NetworkList::Entries(entries) => entries
            .iter()
            .map(|network| {
                Row::new(vec![
                    Line::from(network.network_name.clone()),
                    Line::from(format!("{} dBm", network.signal_level)).centered(),
                ])
            })
            .collect(),
    };

    let widths = [Constraint::Length(32), Constraint::Length(10)];

    let table = Table::new(rows, widths)
        .header(
            Row::new(vec![
                Line::from("Name").yellow(),
                Line::from("Signal").yellow().centered(),
            ])
            .style(Style::new().bold())
            .bottom_margin(1),
        )
        .block(
            Block::default()
                .title(" Available Networks ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .padding(Padding::horizontal(1)),
        )
        .column_spacing(1)
        .flex(Flex::Start);

    frame.render_widget(table, area);
}

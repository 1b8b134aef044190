use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, Borders, Cell, Paragraph, Row, Table,
    },
    Terminal,
};

use crate::app::{App, SharedReadings};
use crate::constants::{UI_TICK_RATE_MS, VALUE_ERROR_TEXT, WINDOW_SIZE};

pub fn run(
    shared: Arc<Mutex<SharedReadings>>,
    running: Arc<AtomicBool>,
    source_desc: &str,
) -> io::Result<()> {
    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new();
    let res = run_app_loop(&mut terminal, app, shared, running, source_desc);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err)
    }
    Ok(())
}

fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    shared: Arc<Mutex<SharedReadings>>,
    running: Arc<AtomicBool>,
    source_desc: &str,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(UI_TICK_RATE_MS);

    while running.load(Ordering::SeqCst) {
        terminal.draw(|f| {
            // ============= whole screen layout ============
            let main_chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(0)
                .constraints([
                    Constraint::Length(14), // Upside Waveform Box
                    Constraint::Min(8),     // Middle Table
                    Constraint::Length(1),  // Bottom Status Bar
                ].as_ref())
                .split(f.size());

            // ============= Top Waveform Box ============
            let monitor_block = Block::default()
                .borders(Borders::ALL)
                .title(format!(" ECG Monitor [{}] ", source_desc))
                .border_type(ratatui::widgets::BorderType::Rounded)
                .border_style(Style::default().fg(Color::Cyan));
            f.render_widget(monitor_block.clone(), main_chunks[0]);

            let inner_area = monitor_block.inner(main_chunks[0]);
            let graph_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)].as_ref())
                .split(inner_area);

            // ======== Left Graph (rolling waveform) ========
            let y_max = crate::util::axis_max(app.window.values());
            let x_limit = (WINDOW_SIZE - 1) as f64;

            let span_title = match (app.window.first_label(), app.window.last_label()) {
                (Some(first), Some(last)) => format!(" ECG Waveform  {} - {} ", first, last),
                _ => " ECG Waveform ".to_string(),
            };

            let waveform_canvas = Canvas::default()
                .block(Block::default().title(span_title).title_style(Style::default().fg(Color::Cyan)))
                .marker(Marker::Braille)
                .x_bounds([0.0, x_limit])
                .y_bounds([0.0, y_max])
                .paint(|ctx| {
                    let values = app.window.values();
                    for i in 1..values.len() {
                        ctx.draw(&CanvasLine {
                            x1: (i - 1) as f64,
                            y1: values[i - 1],
                            x2: i as f64,
                            y2: values[i],
                            color: Color::Cyan,
                        });
                    }
                });
            f.render_widget(waveform_canvas, graph_chunks[0]);

            // textual readout on the right
            let errored = app.display.value_text == VALUE_ERROR_TEXT;
            let value_color = if errored { Color::Red } else { Color::White };
            let status_color = if errored { Color::Red } else { Color::Green };

            let peak_line = match &app.peak {
                Some((peak, at)) => format!("{} @ {}", peak, at),
                None => "-".to_string(),
            };

            let readout = vec![
                Line::from(vec![
                    Span::styled("♥ ", Style::default().fg(Color::Red)),
                    Span::styled(
                        app.display.value_text.clone(),
                        Style::default().fg(value_color).add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(vec![
                    Span::styled("  Status:  ", Style::default().fg(Color::DarkGray)),
                    Span::styled(app.display.status_text.clone(), Style::default().fg(status_color)),
                ]),
                Line::from(vec![
                    Span::styled("  Peak:    ", Style::default().fg(Color::DarkGray)),
                    Span::raw(peak_line),
                ]),
                Line::from(vec![
                    Span::styled("  Samples: ", Style::default().fg(Color::DarkGray)),
                    Span::raw(app.samples_seen.to_string()),
                ]),
                Line::from(vec![
                    Span::styled("  Failed:  ", Style::default().fg(Color::DarkGray)),
                    Span::raw(app.failed_ticks.to_string()),
                ]),
            ];
            f.render_widget(Paragraph::new(readout), graph_chunks[1]);

            // ============= Middle Recent Samples Table ============
            let header_cells = ["Time", "ECG Value"]
                .iter()
                .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
            let header = Row::new(header_cells)
                .style(Style::default().bg(Color::Rgb(40, 40, 40)))
                .height(1)
                .bottom_margin(0);

            let rows = app.window.iter().rev().map(|(label, value)| {
                Row::new(vec![
                    Cell::from(label.clone()).style(Style::default().fg(Color::DarkGray)),
                    Cell::from(value.to_string()).style(Style::default().fg(Color::Green)),
                ]).height(1)
            });

            let table = Table::new(
                rows,
                [
                    Constraint::Percentage(50),
                    Constraint::Percentage(50),
                ]
            )
            .header(header)
            .block(Block::default().title(" Recent Samples ").borders(Borders::ALL).border_type(ratatui::widgets::BorderType::Rounded));
            f.render_widget(table, main_chunks[1]);

            // ============ Bottom Status Bar ============
            let status_content = Line::from(vec![
                Span::styled(" ECG MONITOR ", Style::default().bg(Color::White).fg(Color::Black).add_modifier(Modifier::BOLD)),
                Span::raw(" | "),
                Span::styled("Source: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(source_desc.to_string()),
                Span::raw(" | "),
                Span::styled("Samples: ", Style::default().fg(Color::Green)),
                Span::raw(app.samples_seen.to_string()),
                Span::raw(" | "),
                Span::styled("Failed: ", Style::default().fg(Color::Red)),
                Span::raw(app.failed_ticks.to_string()),
                Span::raw(" | Press 'q' to quit"),
            ]);

            let status_bar = Paragraph::new(status_content)
                .style(Style::default().bg(Color::Rgb(20, 20, 20)));
            f.render_widget(status_bar, main_chunks[2]);
        })?;

        // Handle input
        let timeout = tick_rate.checked_sub(app.last_tick.elapsed()).unwrap_or_else(|| Duration::from_secs(0));
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q') || key.code == KeyCode::Char('c') || key.code == KeyCode::Esc {
                    running.store(false, Ordering::SeqCst);
                    return Ok(());
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.on_tick(&shared);
            app.last_tick = std::time::Instant::now();
        }
    }
    Ok(())
}

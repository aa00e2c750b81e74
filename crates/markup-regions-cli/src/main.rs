mod load;
mod render;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use markup_regions_config::Config;
use markup_regions_engine::{RegionId, Session, records_to_json};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

struct App {
    session: Session,
    region_ids: Vec<RegionId>,
    list_state: ListState,
    records_path: Option<PathBuf>,
    status: String,
}

impl App {
    fn new(session: Session, records_path: Option<PathBuf>, status: String) -> Self {
        let region_ids = session.regions().ids();
        let mut app = Self {
            session,
            region_ids,
            list_state: ListState::default(),
            records_path,
            status,
        };
        if !app.region_ids.is_empty() {
            app.select(0);
        }
        app
    }

    fn select(&mut self, index: usize) {
        self.list_state.select(Some(index));
        if let Some(&id) = self.region_ids.get(index)
            && let Err(e) = self.session.select_region(id)
        {
            self.status = format!("Cannot select region: {e}");
        }
    }

    fn next_region(&mut self) {
        if self.region_ids.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % self.region_ids.len(),
            None => 0,
        };
        self.select(i);
    }

    fn previous_region(&mut self) {
        if self.region_ids.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.region_ids.len() - 1,
            Some(i) => i - 1,
        };
        self.select(i);
    }

    fn remove_selected(&mut self) {
        let Some(index) = self.list_state.selected() else {
            return;
        };
        let Some(&id) = self.region_ids.get(index) else {
            return;
        };
        match self.session.remove_region(id) {
            Ok(region) => {
                self.status = format!("Removed region {}", region.pid);
                self.region_ids = self.session.regions().ids();
                if self.region_ids.is_empty() {
                    self.list_state.select(None);
                } else {
                    self.select(index.min(self.region_ids.len() - 1));
                }
            }
            Err(e) => self.status = format!("Cannot remove region: {e}"),
        }
    }

    fn write_records(&mut self) {
        let Some(path) = self.records_path.clone() else {
            self.status = "No records file to write to".to_string();
            return;
        };
        let records: Vec<_> = self.session.to_records().collect();
        let written = records_to_json(&records)
            .map_err(anyhow::Error::from)
            .and_then(|json| std::fs::write(&path, json).map_err(anyhow::Error::from));
        self.status = match written {
            Ok(()) => format!("Wrote {} records to {}", records.len(), path.display()),
            Err(e) => format!("Failed to write {}: {e}", path.display()),
        };
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <document.html|document.md> [records.json]", args[0]);
        process::exit(1);
    }
    let document_path = PathBuf::from(&args[1]);
    let records_path = args.get(2).map(PathBuf::from);

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => Config::default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let (session, status) = load::open_session(&config, &document_path, records_path.as_deref())
        .with_context(|| format!("Failed to open {}", document_path.display()))?;
    let mut app = App::new(session, records_path, status);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Markers are unwrapped before the document is dropped
    app.session.unmount();

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_region(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_region(),
                KeyCode::Char('d') => app.remove_selected(),
                KeyCode::Char('w') => app.write_records(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(rows[0]);

    // Region list panel
    let items: Vec<ListItem> = app
        .region_ids
        .iter()
        .filter_map(|&id| app.session.region(id))
        .map(|region| {
            let labels: Vec<&str> = region
                .label_states
                .iter()
                .flat_map(|s| s.selected.iter().map(String::as_str))
                .collect();
            let text = if region.is_bound() {
                Span::raw(format!("{} {}", labels.join(","), region.text))
            } else {
                Span::styled(
                    format!("{} (unresolved)", labels.join(",")),
                    Style::default().fg(Color::DarkGray),
                )
            };
            ListItem::new(Line::from(text))
        })
        .collect();

    let regions = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Regions"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(regions, columns[0], &mut app.list_state);

    // Document panel
    let content = Paragraph::new(render::document_lines(&app.session))
        .block(Block::default().borders(Borders::ALL).title("Document"))
        .wrap(Wrap { trim: true });
    f.render_widget(content, columns[1]);

    let help = Paragraph::new(vec![
        Line::from("q: Quit | ↑/k: Previous | ↓/j: Next | d: Remove | w: Write records"),
        Line::from(app.status.as_str()),
    ])
    .block(Block::default());
    f.render_widget(help, rows[1]);
}

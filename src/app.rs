use crate::event::{AppEvent, Event, EventHandler};
use color_eyre::Result;
use property_table::component::{ComponentKind, ComponentRef, ComponentSnapshot};
use property_table::config::ConsoleConfig;
use property_table::descriptor::HistoryMap;
use property_table::host::{ConsoleHost, PropertyTableHost};
use property_table::request;
use property_table::service::client::{ConsoleApi, ConsoleClient};
use property_table::table::{PropertyTable, TableEvent};
use ratatui::{
    crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    pub running: bool,
    config: ConsoleConfig,
    client: Arc<ConsoleClient>,
    /// Bound to the component currently shown.
    host: Arc<ConsoleHost>,
    snapshot: Option<ComponentSnapshot>,
    table: PropertyTable,
    /// Last status message for the bottom line.
    status: String,
    /// Event handler.
    pub events: EventHandler,
}

impl App {
    /// Constructs a new instance of [`App`] and starts loading the configured component.
    pub fn new(config: ConsoleConfig) -> Result<Self> {
        let client = Arc::new(ConsoleClient::new(&config.base_url, config.request_timeout())?);
        let host = Arc::new(ConsoleHost::new(
            client.clone(),
            config.component.clone(),
            config.unsaved_changes,
        ));
        let table = PropertyTable::new(config.table.clone());

        let mut app = Self {
            running: true,
            client,
            host,
            snapshot: None,
            table,
            status: String::new(),
            events: EventHandler::new(),
            config,
        };
        app.load(app.config.component.clone());
        Ok(app)
    }

    /// Run the application's main loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let mut needs_redraw = true;

        while self.running {
            if needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                needs_redraw = false;
            }

            match self.events.next().await? {
                Event::Tick => {}
                Event::Crossterm(event) => match event {
                    CrosstermEvent::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                        self.handle_key_events(key_event);
                        needs_redraw = true;
                    }
                    CrosstermEvent::Resize(_, _) => needs_redraw = true,
                    _ => {}
                },
                Event::App(app_event) => {
                    self.handle_app_event(app_event);
                    needs_redraw = true;
                }
            }

            self.dispatch_table_requests();
            self.drain_table_events();
        }

        self.table.destroy();
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [table_area, status_area] =
            Layout::vertical([Constraint::Min(5), Constraint::Length(1)]).areas(frame.area());

        if self.table.grid().area() != table_area {
            self.table.reset_table_size(table_area);
        }
        frame.render_widget(&self.table, table_area);
        self.render_status(status_area, frame);
    }

    fn render_status(&self, area: Rect, frame: &mut Frame) {
        let name = self.snapshot.as_ref().map_or("loading", |s| s.name.as_str());
        let modified = if self.table.is_save_required() { " *" } else { "" };
        let keys = if self.table.config().read_only { "r: Reload | q: Quit" } else { "s: Save | r: Reload | q: Quit" };
        let line = format!(" {}{} | {} | {}", name, modified, keys, self.status);
        frame.render_widget(Paragraph::new(line).style(Style::default().fg(Color::DarkGray)), area);
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) {
        if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
            self.events.send(AppEvent::Quit);
            return;
        }

        if self.table.handle_key(key_event) {
            return;
        }

        match key_event.code {
            KeyCode::Char('s') => self.save(),
            KeyCode::Char('r') => {
                if let Some(component) = self.snapshot.as_ref().map(|s| s.component.clone()) {
                    self.load(component);
                }
            }
            KeyCode::Char('q') | KeyCode::Esc => self.events.send(AppEvent::Quit),
            _ => {}
        }
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::TableResponse(response) => self.table.complete(response),
            AppEvent::Loaded(result) => match *result {
                Ok((snapshot, history)) => self.show(snapshot, history),
                Err(e) => {
                    error!("failed to load component: {}", e);
                    self.status = format!("Load failed: {}", e);
                }
            },
            AppEvent::Saved(result) => match *result {
                Ok(snapshot) => {
                    self.status = "Saved".to_string();
                    self.load(snapshot.component);
                }
                Err(e) => {
                    error!("failed to save properties: {}", e);
                    self.status = format!("Save failed: {}", e);
                }
            },
            AppEvent::Quit => self.quit(),
        }
    }

    /// Fetch `component` and its history on a background task.
    fn load(&mut self, component: ComponentRef) {
        self.status = format!("Loading {}", component);
        let client = self.client.clone();
        let sender = self.events.sender();

        tokio::spawn(async move {
            let result = fetch(&client, &component).await;
            let _ = sender.send(Event::App(AppEvent::Loaded(Box::new(result))));
        });
    }

    fn show(&mut self, snapshot: ComponentSnapshot, history: HistoryMap) {
        info!(component = %snapshot.component, properties = snapshot.properties.len(), "showing component");

        if *self.host.component() != snapshot.component {
            self.host = Arc::new(ConsoleHost::new(
                self.client.clone(),
                snapshot.component.clone(),
                self.config.unsaved_changes,
            ));
        }

        let loaded = self.table.load_properties(
            snapshot.properties.clone(),
            snapshot.descriptors.clone(),
            history,
        );
        if let Err(e) = loaded {
            error!("failed to load properties: {}", e);
            self.status = format!("Load failed: {}", e);
            return;
        }

        self.table.set_group_id(snapshot.parent_group_id.clone());
        self.status = format!("{} properties", self.table.visible_rows().count());
        self.snapshot = Some(snapshot);
    }

    fn save(&mut self) {
        if self.table.config().read_only {
            return;
        }
        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };
        if !self.table.is_save_required() {
            self.status = "No changes to save".to_string();
            return;
        }

        let changes = self.table.marshal_properties();
        debug!(changed = changes.len(), "saving");
        self.status = "Saving".to_string();

        let client = self.client.clone();
        let sender = self.events.sender();
        tokio::spawn(async move {
            let result = client.update_properties(&snapshot, &changes).await;
            let _ = sender.send(Event::App(AppEvent::Saved(Box::new(result))));
        });
    }

    /// Hand every queued table request to a worker task.
    fn dispatch_table_requests(&mut self) {
        for table_request in self.table.take_requests() {
            let host: Arc<dyn PropertyTableHost> = self.host.clone();
            let api: Arc<dyn ConsoleApi> = self.client.clone();
            let sender = self.events.sender();
            request::spawn(table_request, host, api, move |response| {
                let _ = sender.send(Event::App(AppEvent::TableResponse(response)));
            });
        }
    }

    fn drain_table_events(&mut self) {
        for event in self.table.take_events() {
            match event {
                TableEvent::Notice(notice) => debug!(title = %notice.title, "table notice"),
                TableEvent::NavigateToService { service_id, parent_group_id } => {
                    debug!(service_id = %service_id, ?parent_group_id, "navigating to service");
                    self.load(ComponentRef::new(ComponentKind::ControllerService, &service_id));
                }
            }
        }
    }

    /// Set running to false to quit the application.
    pub fn quit(&mut self) {
        if self.table.is_save_required() {
            warn!("quitting with unsaved changes");
        }
        self.table.cancel_edit();
        self.running = false;
    }
}

async fn fetch(client: &ConsoleClient, component: &ComponentRef) -> property_table::Result<(ComponentSnapshot, HistoryMap)> {
    let snapshot = client.component(component).await?;
    // history only feeds tooltips
    let history = match client.history(&component.id).await {
        Ok(history) => history,
        Err(e) => {
            warn!(component = %component, "history unavailable: {}", e);
            HistoryMap::new()
        }
    };
    Ok((snapshot, history))
}

use iced::futures::future::{abortable, AbortHandle};
use iced::widget::{button, column, container, row, text, Row};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

// Declare the application modules
mod config;
mod net;
mod state;
mod ui;

use config::{AppConfig, ConfigSource};
use net::catalog::LoadError;
use net::prefetch::ImageOutcome;
use state::catalog::CatalogKind;
use state::data::{CatalogItem, Generation, ImageSlotKey};
use state::session::SessionState;
use state::view::{CatalogView, PrefetchRequest, RowAction};
use ui::catalog_list::CategoryChoice;

/// Length of one spinner pulse
const SPINNER_PERIOD: Duration = Duration::from_millis(1200);

/// Main application state
struct CatalogViewer {
    config: AppConfig,
    /// Shared HTTP client for catalog and image requests
    client: reqwest::Client,
    /// The only state carried across navigations
    session: SessionState,
    /// Generation of the active view; bumped on every activation
    generation: Generation,
    /// The active catalog view
    view: CatalogView,
    /// Spinner animation clock
    started: Instant,
    phase: f32,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User picked a catalog in the navigation bar
    Navigate(CatalogKind),
    /// The catalog fetch of an activation finished
    CatalogLoaded(Generation, Result<Vec<CatalogItem>, LoadError>),
    /// An image slot finished loading (or failed)
    ImageFinished(Generation, ImageSlotKey, ImageOutcome),
    /// An image slot's timeout fired
    ImageTimedOut(Generation, ImageSlotKey),
    /// Search text changed
    QueryChanged(String),
    /// Category pick list changed
    CategorySelected(CategoryChoice),
    /// Row action control pressed
    ActionPressed(RowAction),
    /// Drop the cross-view selection and show the full list
    ClearSelection,
    /// Spinner animation tick
    Tick(Instant),
}

impl CatalogViewer {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let (config, source) = AppConfig::load();
        match &source {
            ConfigSource::File(path) => info!(path = %path.display(), "📁 Loaded config"),
            ConfigSource::Defaults => info!("📁 Using built-in catalogs"),
        }
        match config.to_json() {
            Ok(json) => trace!(%json, "Effective config"),
            Err(e) => warn!(error = %e, "⚠️  Could not serialize config"),
        }

        let client = net::catalog::build_client(config.request_timeout());
        let first = config.kinds()[0];
        let generation = Generation::default().next();
        let schema = config.schema(first);
        let view = CatalogView::activate(schema, generation, None);

        let app = CatalogViewer {
            config,
            client,
            session: SessionState::new(),
            generation,
            view,
            started: Instant::now(),
            phase: 0.0,
        };
        let task = app.fetch_active();

        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Navigate(kind) => self.activate(kind),
            Message::CatalogLoaded(generation, result) => {
                let requests = self.view.finish_load(generation, result);
                self.prefetch(requests)
            }
            Message::ImageFinished(generation, key, outcome) => {
                self.view.image_finished(generation, &key, outcome);
                Task::none()
            }
            Message::ImageTimedOut(generation, key) => {
                self.view.image_timed_out(generation, &key);
                Task::none()
            }
            Message::QueryChanged(query) => {
                self.view.set_query(query);
                Task::none()
            }
            Message::CategorySelected(choice) => {
                self.view.set_category(choice.into_filter());
                Task::none()
            }
            Message::ActionPressed(action) => self.run_action(action),
            Message::ClearSelection => {
                self.session.clear();
                self.activate(self.view.kind())
            }
            Message::Tick(now) => {
                let elapsed = now.duration_since(self.started).as_secs_f32();
                self.phase = (elapsed % SPINNER_PERIOD.as_secs_f32()) / SPINNER_PERIOD.as_secs_f32();
                Task::none()
            }
        }
    }

    /// Tear down the active view and start a new activation of `kind`
    fn activate(&mut self, kind: CatalogKind) -> Task<Message> {
        self.view.deactivate();
        self.generation = self.generation.next();

        let schema = self.config.schema(kind);
        self.view = CatalogView::activate(schema, self.generation, self.session.selection());
        self.fetch_active()
    }

    /// The one catalog fetch of the active view
    fn fetch_active(&self) -> Task<Message> {
        let generation = self.generation;
        Task::perform(
            net::catalog::fetch_catalog(self.client.clone(), self.view.schema().clone()),
            move |result| Message::CatalogLoaded(generation, result),
        )
    }

    /// Kick off every image load together with its timeout timer
    fn prefetch(&mut self, requests: Vec<PrefetchRequest>) -> Task<Message> {
        if requests.is_empty() {
            return Task::none();
        }

        let timeout = self.config.image_timeout();
        let mut tasks = Vec::with_capacity(requests.len() * 2);

        for PrefetchRequest { generation, key, url } in requests {
            let load_key = key.clone();
            tasks.push(Task::perform(
                net::prefetch::load_image(self.client.clone(), url),
                move |outcome| Message::ImageFinished(generation, load_key.clone(), outcome),
            ));

            let (timer, handle) = timeout_timer(generation, key.clone(), timeout);
            self.view.arm_timer(key, handle);
            tasks.push(Task::future(timer).and_then(Task::done));
        }

        debug!(tasks = tasks.len(), "Scheduled image loads and timers");
        Task::batch(tasks)
    }

    fn run_action(&mut self, action: RowAction) -> Task<Message> {
        match action {
            RowAction::Open { url, .. } => {
                open_link(&url);
                Task::none()
            }
            RowAction::Select {
                value,
                link,
                navigate_to,
                ..
            } => {
                self.session.set_selection(value);
                open_link(&link);
                self.activate(navigate_to)
            }
            RowAction::Disabled { .. } => Task::none(),
        }
    }

    /// Keep ticking only while a spinner is visible
    fn subscription(&self) -> Subscription<Message> {
        if self.view.is_animating() {
            iced::time::every(Duration::from_millis(50)).map(Message::Tick)
        } else {
            Subscription::none()
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let active = self.view.kind();
        let nav: Row<Message> = self
            .config
            .kinds()
            .into_iter()
            .fold(row![].spacing(8), |nav, kind| {
                let style: fn(&Theme, button::Status) -> button::Style = if kind == active {
                    button::primary
                } else {
                    button::secondary
                };
                nav.push(
                    button(text(kind.label()).size(14))
                        .on_press_maybe((kind != active).then_some(Message::Navigate(kind)))
                        .style(style)
                        .padding([6, 14]),
                )
            });

        let content = column![nav, ui::catalog_list::view(&self.view, self.phase)]
            .spacing(12)
            .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .padding(12)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

/// Timeout timer of one image slot
///
/// Resolves to `ImageTimedOut` once `timeout` has elapsed, or to `None` if
/// the handle was aborted first.
fn timeout_timer(
    generation: Generation,
    key: ImageSlotKey,
    timeout: Duration,
) -> (impl Future<Output = Option<Message>>, AbortHandle) {
    let (timer, handle) = abortable(async move {
        tokio::time::sleep(timeout).await;
        Message::ImageTimedOut(generation, key)
    });
    (async move { timer.await.ok() }, handle)
}

/// Hand an action URL to the system browser
fn open_link(url: &str) {
    match open::that_detached(url) {
        Ok(()) => info!(%url, "🔗 Opened link"),
        Err(e) => warn!(%url, error = %e, "⚠️  Failed to open link"),
    }
}

/// Log to stderr; `RUST_LOG` overrides the default filter
fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,catalog_viewer=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn main() -> iced::Result {
    init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "🎨 Catalog Viewer starting");

    iced::application(
        "Catalog Viewer",
        CatalogViewer::update,
        CatalogViewer::view,
    )
    .subscription(CatalogViewer::subscription)
    .theme(CatalogViewer::theme)
    .centered()
    .run_with(CatalogViewer::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use state::catalog::CatalogSchema;
    use state::readiness::DEFAULT_IMAGE_TIMEOUT_MS;

    const ONE_ITEM: &[u8] = br#"[{"id":"7","name":"Nova","img1":"https://x/n1.png","img2":"https://x/n2.png","url":"https://x/go"}]"#;

    fn loaded_view() -> (CatalogView, Vec<PrefetchRequest>) {
        let generation = Generation(1);
        let mut view = CatalogView::activate(CatalogSchema::builtin(CatalogKind::Eliminations), generation, None);
        let items = net::catalog::parse_catalog(view.schema(), ONE_ITEM);
        let requests = view.finish_load(generation, items);
        (view, requests)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_timer_settles_slot_after_image_timeout() {
        let (mut view, requests) = loaded_view();
        let request = requests[0].clone();
        let timeout = Duration::from_millis(DEFAULT_IMAGE_TIMEOUT_MS);

        let (timer, handle) = timeout_timer(request.generation, request.key.clone(), timeout);
        view.arm_timer(request.key.clone(), handle);
        let pending = tokio::spawn(timer);
        // Let the timer start its sleep before moving the clock
        tokio::task::yield_now().await;

        tokio::time::advance(timeout - Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());
        assert!(!view.is_ready(&request.key));

        tokio::time::advance(Duration::from_millis(1)).await;
        let message = pending.await.unwrap();
        let Some(Message::ImageTimedOut(generation, key)) = message else {
            panic!("expected a timeout message, got {message:?}");
        };
        assert_eq!(key, request.key);

        assert!(view.image_timed_out(generation, &key));
        assert!(view.is_ready(&request.key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_slot_aborts_its_timer() {
        let (mut view, requests) = loaded_view();
        let request = requests[0].clone();
        let timeout = Duration::from_millis(DEFAULT_IMAGE_TIMEOUT_MS);

        let (timer, handle) = timeout_timer(request.generation, request.key.clone(), timeout);
        view.arm_timer(request.key.clone(), handle);
        let pending = tokio::spawn(timer);

        view.image_finished(request.generation, &request.key, ImageOutcome::Failed("404".to_string()));

        tokio::time::advance(timeout * 2).await;
        assert!(pending.await.unwrap().is_none());
        assert!(view.is_ready(&request.key));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivation_aborts_pending_timers() {
        let (mut view, requests) = loaded_view();
        let timeout = Duration::from_millis(DEFAULT_IMAGE_TIMEOUT_MS);

        let mut pending = Vec::new();
        for request in &requests {
            let (timer, handle) = timeout_timer(request.generation, request.key.clone(), timeout);
            view.arm_timer(request.key.clone(), handle);
            pending.push(tokio::spawn(timer));
        }

        assert_eq!(view.deactivate(), requests.len());
        tokio::time::advance(timeout * 2).await;
        for timer in pending {
            assert!(timer.await.unwrap().is_none());
        }
    }
}

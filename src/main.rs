use iced::widget::image::Handle;
use iced::widget::{button, checkbox, column, container, horizontal_space, row, scrollable, text, Column};
use iced::{Alignment, Element, Length, Task, Theme};
use rfd::FileDialog;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod catalog;
mod config;
mod covers;
mod error;
mod present;
mod ui;

use catalog::{facets, filter, sort, BookRecord, Catalog, CatalogCache};
use config::AppConfig;
use covers::probe::looks_like_cover;
use covers::{CoverResolver, CoverSettings};
use present::{present, BookCard, Page};
use ui::card::RemoteImage;
use ui::filters::{Choice, FilterForm, FilterMessage, FilterOptions};

/// File types offered by the open dialog
const CATALOG_EXTENSIONS: [&str; 7] = ["xlsx", "xlsm", "xlsb", "xls", "ods", "csv", "tsv"];

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);

/// Main application state
struct BookCatalog {
    config: AppConfig,
    resolver: Arc<CoverResolver>,
    /// The snapshot being browsed
    catalog: Option<Arc<Catalog>>,
    form: FilterForm,
    options: FilterOptions,
    genre_counts: Vec<(String, usize)>,
    /// Requested page; clamped by `refresh`
    page: usize,
    page_info: Page,
    /// Records passing the current filters
    matches: usize,
    cards: Vec<BookCard>,
    /// Bumped on every refresh so late page results can be dropped
    generation: u64,
    /// Bumped on every load request so an older load cannot replace a newer one
    load_generation: u64,
    remote_images: HashMap<String, RemoteImage>,
    http: reqwest::Client,
    show_stats: bool,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    /// User clicked "Open Catalog"
    OpenCatalog,
    /// User clicked "Reload"
    Reload,
    /// Background load number `generation` finished
    CatalogLoaded {
        generation: u64,
        result: Result<Arc<Catalog>, String>,
    },
    /// Covers directory rescanned
    ResolverReady(Arc<CoverResolver>),
    Filter(FilterMessage),
    /// Cards for the page requested by refresh number `generation`
    PageReady { generation: u64, cards: Vec<BookCard> },
    RemoteCoverFetched { url: String, bytes: Option<Vec<u8>> },
    NextPage,
    PreviousPage,
    ToggleStats(bool),
}

impl BookCatalog {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        Self::with_config(AppConfig::load())
    }

    fn with_config(config: AppConfig) -> (Self, Task<Message>) {
        let resolver = Arc::new(CoverResolver::new(config.cover_settings()));

        let http = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to a default HTTP client: {}", e);
                reqwest::Client::new()
            });

        let page_info = Page::of(0, config.page_size(), 0);
        let mut app = BookCatalog {
            config,
            resolver,
            catalog: None,
            form: FilterForm::default(),
            options: FilterOptions::default(),
            genre_counts: Vec::new(),
            page: 0,
            page_info,
            matches: 0,
            cards: Vec::new(),
            generation: 0,
            load_generation: 0,
            remote_images: HashMap::new(),
            http,
            show_stats: false,
            status: "Open a catalog file to start browsing.".to_string(),
        };

        let task = match app.config.catalog_path.clone() {
            Some(path) => app.start_load(path),
            None => Task::none(),
        };
        (app, task)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenCatalog => {
                let file = FileDialog::new()
                    .set_title("Open Book Catalog")
                    .add_filter("Book catalogs", &CATALOG_EXTENSIONS[..])
                    .pick_file();

                if let Some(path) = file {
                    // Only one catalog is browsed at a time
                    if self.config.catalog_path.as_ref() != Some(&path) {
                        CatalogCache::global().clear();
                    }
                    return self.start_load(path);
                }

                Task::none()
            }
            Message::Reload => {
                let mut tasks = vec![Task::perform(
                    rebuild_resolver(self.config.cover_settings()),
                    Message::ResolverReady,
                )];

                if let Some(path) = self.config.catalog_path.clone() {
                    CatalogCache::global().invalidate(&path);
                    tasks.push(self.start_load(path));
                }

                Task::batch(tasks)
            }
            Message::CatalogLoaded { generation, .. } if generation != self.load_generation => {
                debug!("Dropping superseded catalog load {}", generation);
                Task::none()
            }
            Message::CatalogLoaded { result: Ok(catalog), .. } => {
                self.options = FilterOptions::from_records(&catalog.records);
                self.genre_counts = facets::genre_counts(&catalog.records);

                // Drop pick list choices the new catalog no longer has
                if !self.options.genres.contains(&self.form.genre) {
                    self.form.genre = Choice::All;
                }
                if !self.options.formats.contains(&self.form.format) {
                    self.form.format = Choice::All;
                }
                if !self.options.categories.contains(&self.form.category) {
                    self.form.category = Choice::All;
                }

                self.status = load_summary(&catalog);

                self.catalog = Some(catalog);
                self.page = 0;
                self.refresh()
            }
            Message::CatalogLoaded { result: Err(e), .. } => {
                warn!("Catalog load failed: {}", e);
                self.status = format!("⚠️ {}", e);
                Task::none()
            }
            Message::ResolverReady(resolver) => {
                self.resolver = resolver;
                self.remote_images.clear();
                self.refresh()
            }
            Message::Filter(message) => {
                self.form.update(message);
                self.page = 0;
                self.refresh()
            }
            Message::PageReady { generation, cards } => {
                if generation != self.generation {
                    debug!("Dropping stale page from refresh {}", generation);
                    return Task::none();
                }

                self.cards = cards;
                self.fetch_remote_covers()
            }
            Message::RemoteCoverFetched { url, bytes } => {
                let image = match bytes {
                    Some(bytes) => RemoteImage::Ready(Handle::from_bytes(bytes)),
                    None => RemoteImage::Failed,
                };
                self.remote_images.insert(url, image);
                Task::none()
            }
            Message::NextPage => {
                self.page = self.page_info.number + 1;
                self.refresh()
            }
            Message::PreviousPage => {
                self.page = self.page_info.number.saturating_sub(1);
                self.refresh()
            }
            Message::ToggleStats(show) => {
                self.show_stats = show;
                Task::none()
            }
        }
    }

    /// Load `path` in the background as the catalog to browse
    fn start_load(&mut self, path: PathBuf) -> Task<Message> {
        self.load_generation += 1;
        let generation = self.load_generation;

        self.status = format!("Loading {}...", path.display());
        self.config.catalog_path = Some(path.clone());

        Task::perform(load_catalog(path), move |result| Message::CatalogLoaded {
            generation,
            result,
        })
    }

    /// Re-run filter, sort and pagination, then build the page's cards off the UI thread
    fn refresh(&mut self) -> Task<Message> {
        self.generation += 1;

        let Some(catalog) = self.catalog.clone() else {
            self.matches = 0;
            self.page_info = Page::of(0, self.config.page_size(), 0);
            self.cards.clear();
            return Task::none();
        };

        let mut matched = filter::apply(&catalog.records, &self.form.criteria());
        if let Some(spec) = self.form.sort_spec() {
            matched = sort::order(matched, spec);
        }

        self.matches = matched.len();
        self.page_info = Page::of(matched.len(), self.config.page_size(), self.page);
        self.page = self.page_info.number;

        let records: Vec<BookRecord> = matched[self.page_info.range.clone()]
            .iter()
            .map(|record| (*record).clone())
            .collect();

        let generation = self.generation;
        let resolver = Arc::clone(&self.resolver);
        let currency = self.config.currency.clone();

        Task::perform(
            build_cards(records, resolver, currency),
            move |cards| Message::PageReady { generation, cards },
        )
    }

    /// Start downloads for remote covers on the current page not seen before
    fn fetch_remote_covers(&mut self) -> Task<Message> {
        let mut tasks = Vec::new();

        for card in &self.cards {
            for url in card.remote_urls() {
                if self.remote_images.contains_key(url) {
                    continue;
                }
                self.remote_images.insert(url.to_string(), RemoteImage::Pending);
                tasks.push(Task::perform(
                    fetch_cover(self.http.clone(), url.to_string()),
                    |(url, bytes)| Message::RemoteCoverFetched { url, bytes },
                ));
            }
        }

        Task::batch(tasks)
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let toolbar = row![
            text("📚 Book Catalog").size(28),
            horizontal_space(),
            checkbox("Show genre stats", self.show_stats).on_toggle(Message::ToggleStats),
            button("Open Catalog")
                .on_press(Message::OpenCatalog)
                .padding(10),
            button("Reload").on_press(Message::Reload).padding(10),
        ]
        .spacing(16)
        .align_y(Alignment::Center);

        let mut content: Column<Message> = column![toolbar].spacing(16);

        if let Some(catalog) = &self.catalog {
            content = content.push(self.form.view(&self.options).map(Message::Filter));

            if self.show_stats {
                content = content.push(text("Books per genre").size(18));
                content = content.push(ui::stats::view(&self.genre_counts));
            }

            let pager = row![
                text(format!("Showing {} of {} books", self.matches, catalog.len())),
                horizontal_space(),
                button("← Previous").on_press_maybe(
                    self.page_info.has_previous().then_some(Message::PreviousPage)
                ),
                text(format!(
                    "Page {} of {}",
                    self.page_info.number + 1,
                    self.page_info.total
                )),
                button("Next →")
                    .on_press_maybe(self.page_info.has_next().then_some(Message::NextPage)),
            ]
            .spacing(12)
            .align_y(Alignment::Center);

            content = content.push(pager).push(
                scrollable(ui::card::grid(&self.cards, &self.remote_images))
                    .height(Length::Fill),
            );
        }

        content = content.push(text(&self.status).size(14));

        container(content.padding(24))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("book_catalog=info")),
        )
        .init();

    info!("📚 Book Catalog v{} starting", env!("CARGO_PKG_VERSION"));

    iced::application("Book Catalog", BookCatalog::update, BookCatalog::view)
        .theme(BookCatalog::theme)
        .centered()
        .run_with(BookCatalog::new)
}

/// Status line after a successful load
fn load_summary(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return format!("⚠️ No books found in {}", catalog.path.display());
    }

    let mut status = format!(
        "✅ {} books loaded from {}",
        catalog.len(),
        catalog.path.display()
    );
    if !catalog.warnings.is_empty() {
        status.push_str(&format!(
            "; {} values could not be read",
            catalog.warnings.len()
        ));
    }
    if !catalog.columns.synthesized.is_empty() {
        let missing: Vec<&str> = catalog
            .columns
            .synthesized
            .iter()
            .map(|field| field.name())
            .collect();
        status.push_str(&format!("; no column for {}", missing.join(", ")));
    }
    status
}

/// Load a catalog through the shared cache
/// Runs in a background thread to avoid blocking the UI
async fn load_catalog(path: PathBuf) -> Result<Arc<Catalog>, String> {
    tokio::task::spawn_blocking(move || CatalogCache::global().get(&path))
        .await
        .map_err(|e| format!("Task join error: {}", e))?
        .map_err(|e| e.to_string())
}

/// Build a fresh resolver, rescanning the covers directory
async fn rebuild_resolver(settings: CoverSettings) -> Arc<CoverResolver> {
    let fallback = settings.clone();
    tokio::task::spawn_blocking(move || Arc::new(CoverResolver::new(settings)))
        .await
        .unwrap_or_else(|e| {
            warn!("Cover rescan failed: {}", e);
            Arc::new(CoverResolver::new(fallback))
        })
}

/// Resolve covers for one page of records
/// Blocking because the probe policy may hit the network
async fn build_cards(
    records: Vec<BookRecord>,
    resolver: Arc<CoverResolver>,
    currency: String,
) -> Vec<BookCard> {
    tokio::task::spawn_blocking(move || present(&records, &resolver, &currency))
        .await
        .unwrap_or_else(|e| {
            warn!("Building cards failed: {}", e);
            Vec::new()
        })
}

/// Download a remote cover for display
///
/// Anything that is not a decodable image larger than one pixel counts as a
/// failed download.
async fn fetch_cover(client: reqwest::Client, url: String) -> (String, Option<Vec<u8>>) {
    let response = match client.get(&url).send().await.and_then(|r| r.error_for_status()) {
        Ok(response) => response,
        Err(e) => {
            debug!("Cover download failed for {}: {}", url, e);
            return (url, None);
        }
    };

    match response.bytes().await {
        Ok(body) if looks_like_cover(&body, 0) => (url, Some(body.to_vec())),
        Ok(_) => {
            debug!("Cover download for {} is not a usable image", url);
            (url, None)
        }
        Err(e) => {
            debug!("Cover download for {} could not be read: {}", url, e);
            (url, None)
        }
    }
}

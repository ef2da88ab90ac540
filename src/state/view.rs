/// Catalog view
///
/// One activation of one catalog: the loaded items, the derived filtered
/// sequence, the readiness tracker for every image slot and the decoded
/// images. All async completions come back tagged with the generation of
/// the activation that started them; anything from another generation is
/// dropped on the floor.

use std::collections::HashMap;

use iced::futures::future::AbortHandle;
use iced::widget::image::Handle as ImageHandle;
use tracing::{debug, error, info, trace};

use super::catalog::{ActionSpec, CatalogKind, CatalogSchema};
use super::data::{CatalogItem, Generation, ImageSlotKey, ViewState};
use super::filter::{self, FilterCriteria};
use super::readiness::{ReadinessTracker, Settlement, TimerHandle};
use crate::net::catalog::LoadError;
use crate::net::prefetch::ImageOutcome;

/// One image load to start after the catalog arrived
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchRequest {
    pub generation: Generation,
    pub key: ImageSlotKey,
    pub url: String,
}

/// What a view should show instead of (or above) its rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Loading,
    Failed(String),
    Empty(String),
    Ready,
}

/// Presentation of one image slot
#[derive(Debug, Clone)]
pub enum SlotView {
    /// Still waiting: draw a spinner
    Placeholder,
    /// Settled and decoded
    Image(ImageHandle),
    /// Settled without usable bytes (failed, or timed out and still missing)
    Unavailable,
}

/// What the row's action control does when pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowAction {
    Open {
        label: String,
        url: String,
    },
    Select {
        label: String,
        value: String,
        link: String,
        navigate_to: CatalogKind,
    },
    /// The item carries no URL for its action
    Disabled { label: String },
}

impl RowAction {
    pub fn label(&self) -> &str {
        match self {
            RowAction::Open { label, .. }
            | RowAction::Select { label, .. }
            | RowAction::Disabled { label } => label,
        }
    }
}

/// Render model of one row
#[derive(Debug, Clone)]
pub struct RowModel {
    /// Position of the item in the loaded set; one per identity key
    pub key: usize,
    pub title: String,
    pub slots: Vec<SlotView>,
    pub action: RowAction,
}

pub struct CatalogView<H: TimerHandle = AbortHandle> {
    schema: CatalogSchema,
    generation: Generation,
    state: ViewState,
    criteria: FilterCriteria,
    tracker: ReadinessTracker<H>,
    /// Normalized URL of every tracked slot
    slot_urls: HashMap<ImageSlotKey, String>,
    /// Decoded images by normalized URL
    images: HashMap<String, ImageHandle>,
}

impl<H: TimerHandle> CatalogView<H> {
    /// Start a fresh activation, waiting for its single catalog fetch
    ///
    /// The selection key only applies to catalogs with a link field.
    pub fn activate(schema: CatalogSchema, generation: Generation, selection: Option<&str>) -> Self {
        let selection = schema
            .link_field
            .as_ref()
            .and(selection)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        debug!(catalog = %schema.kind, %generation, ?selection, "View activated");

        Self {
            schema,
            generation,
            state: ViewState {
                loading: true,
                ..ViewState::default()
            },
            criteria: FilterCriteria {
                selection,
                ..FilterCriteria::default()
            },
            tracker: ReadinessTracker::new(generation),
            slot_urls: HashMap::new(),
            images: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &CatalogSchema {
        &self.schema
    }

    pub fn kind(&self) -> CatalogKind {
        self.schema.kind
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Apply the result of the catalog fetch
    ///
    /// On success returns one prefetch request per image slot. The fetch
    /// is accepted once per activation; repeats and stale results are
    /// ignored.
    pub fn finish_load(
        &mut self,
        generation: Generation,
        result: Result<Vec<CatalogItem>, LoadError>,
    ) -> Vec<PrefetchRequest> {
        if generation != self.generation || !self.state.loading {
            trace!(%generation, current = %self.generation, "Ignoring stale catalog result");
            return Vec::new();
        }
        self.state.loading = false;

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                error!(catalog = %self.schema.kind, error = %e, validation = e.is_validation(), "❌ Catalog load failed");
                self.state.error_message = Some(format!("Failed to fetch {}: {}", self.schema.noun, e));
                self.state.items.clear();
                self.state.filtered.clear();
                return Vec::new();
            }
        };

        self.tracker.reset(generation);
        self.slot_urls.clear();
        self.images.clear();

        let mut requests = Vec::new();
        for item in &items {
            for slot in &item.slots {
                let key = item.slot_key(slot);
                if self.tracker.track(key.clone()) {
                    self.slot_urls.insert(key.clone(), slot.url.clone());
                    requests.push(PrefetchRequest {
                        generation,
                        key,
                        url: slot.url.clone(),
                    });
                }
            }
        }

        self.state.items = items;
        self.refilter();

        info!(
            catalog = %self.schema.kind,
            items = self.state.items.len(),
            slots = requests.len(),
            "🖼️  Prefetching images"
        );
        requests
    }

    /// Hand the tracker the timeout timer of a slot
    pub fn arm_timer(&mut self, key: ImageSlotKey, handle: H) {
        self.tracker.arm(key, handle);
    }

    /// An image load finished, successfully or not
    ///
    /// Decoded bytes are kept even when the timeout already settled the
    /// slot, so a late image still shows up.
    pub fn image_finished(&mut self, generation: Generation, key: &ImageSlotKey, outcome: ImageOutcome) -> bool {
        if generation != self.generation {
            trace!(%generation, slot = %key, "Ignoring stale image result");
            return false;
        }

        let settlement = match outcome {
            ImageOutcome::Loaded(bytes) => {
                if let Some(url) = self.slot_urls.get(key) {
                    self.images
                        .entry(url.clone())
                        .or_insert_with(|| ImageHandle::from_bytes(bytes));
                }
                Settlement::Loaded
            }
            ImageOutcome::Failed(reason) => {
                debug!(slot = %key, %reason, "Image failed to load");
                Settlement::Failed
            }
        };

        let settled = self.tracker.settle(generation, key, settlement);
        if settled {
            trace!(
                settled = self.tracker.settled_count(),
                tracked = self.tracker.tracked_count(),
                pending_timers = self.tracker.pending_timers(),
                "Readiness progress"
            );
        }
        settled
    }

    /// The timeout of a slot fired
    pub fn image_timed_out(&mut self, generation: Generation, key: &ImageSlotKey) -> bool {
        let settled = self.tracker.settle(generation, key, Settlement::TimedOut);
        if settled {
            debug!(slot = %key, "⏱️  Image timed out, dismissing spinner");
        }
        settled
    }

    pub fn is_ready(&self, key: &ImageSlotKey) -> bool {
        self.tracker.is_ready(key)
    }

    pub fn set_query(&mut self, query: String) {
        if self.criteria.query != query {
            self.criteria.query = query;
            self.refilter();
        }
    }

    pub fn set_category(&mut self, category: Option<String>) {
        let category = category.filter(|value| !value.is_empty());
        if self.criteria.category != category {
            self.criteria.category = category;
            self.refilter();
        }
    }

    fn refilter(&mut self) {
        self.state.filtered = filter::apply(&self.schema, &self.state.items, &self.criteria);
    }

    /// Heading of the page, mentioning the selection when there is one
    pub fn heading(&self) -> String {
        match &self.criteria.selection {
            Some(selection) => format!("{} for {}", self.schema.title, selection),
            None => self.schema.title.clone(),
        }
    }

    pub fn status(&self) -> ListStatus {
        if self.state.loading {
            return ListStatus::Loading;
        }
        if let Some(message) = &self.state.error_message {
            return ListStatus::Failed(message.clone());
        }
        if self.state.filtered.is_empty() {
            let message = match &self.criteria.selection {
                Some(selection) => format!("No {} found for {}.", self.schema.noun, selection),
                None => format!("No {} found.", self.schema.noun),
            };
            return ListStatus::Empty(message);
        }
        ListStatus::Ready
    }

    /// True while a spinner is on screen
    pub fn is_animating(&self) -> bool {
        self.state.loading
            || self.state.filtered_items().any(|item| {
                item.slots
                    .iter()
                    .any(|slot| !self.is_ready(&item.slot_key(slot)))
            })
    }

    /// Build the render model of the displayed rows
    pub fn rows(&self) -> Vec<RowModel> {
        self.state
            .filtered
            .iter()
            .map(|&index| (index, &self.state.items[index]))
            .map(|(index, item)| RowModel {
                key: index,
                title: self.row_title(item),
                slots: item
                    .slots
                    .iter()
                    .map(|slot| self.slot_view(&item.slot_key(slot), &slot.url))
                    .collect(),
                action: self.row_action(item),
            })
            .collect()
    }

    fn slot_view(&self, key: &ImageSlotKey, url: &str) -> SlotView {
        if !self.is_ready(key) {
            return SlotView::Placeholder;
        }
        match self.images.get(url) {
            Some(handle) => SlotView::Image(handle.clone()),
            None => SlotView::Unavailable,
        }
    }

    fn row_title(&self, item: &CatalogItem) -> String {
        match &self.schema.title_rule {
            Some(rule) if item.text(&rule.field) == Some(rule.equals.as_str()) => {
                format!("{}{}", rule.prefix, item.name)
            }
            _ => item.name.clone(),
        }
    }

    fn row_action(&self, item: &CatalogItem) -> RowAction {
        let label = self.schema.action.label().to_string();
        match &self.schema.action {
            ActionSpec::OpenItemUrl { field, .. } => match item.text(field) {
                Some(url) if !url.is_empty() => RowAction::Open {
                    label,
                    url: url.to_string(),
                },
                _ => RowAction::Disabled { label },
            },
            ActionSpec::SelectAndOpen {
                link, navigate_to, ..
            } => RowAction::Select {
                label,
                value: item.name.clone(),
                link: link.clone(),
                navigate_to: *navigate_to,
            },
        }
    }

    /// Tear the activation down: cancel pending timers, drop all state.
    /// Returns the number of timers cancelled.
    pub fn deactivate(&mut self) -> usize {
        let cancelled = self.tracker.teardown();
        self.state = ViewState::default();
        self.slot_urls.clear();
        self.images.clear();
        info!(catalog = %self.schema.kind, generation = %self.generation, cancelled, "View deactivated");
        cancelled
    }
}

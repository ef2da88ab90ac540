/// Catalog list renderer
///
/// Turns a `CatalogView` into widgets: heading, search and category
/// controls, error banner, and the rows. Every decision about what a slot
/// shows is made by `CatalogView::rows`; this module only draws it.
use std::fmt;

use iced::widget::{
    button, canvas, column, container, horizontal_space, keyed_column, pick_list, row,
    scrollable, text, text_input, Column, Image, Row,
};
use iced::{Alignment, Color, Element, Length};

use super::spinner::{Spinner, ACCENT};
use crate::state::view::{CatalogView, ListStatus, RowAction, RowModel, SlotView};
use crate::Message;

/// Edge length of one image slot
const SLOT_SIZE: f32 = 40.0;

const ERROR_TEXT: Color = Color {
    r: 0.996,
    g: 0.792,
    b: 0.792,
    a: 1.0,
};

const MUTED_TEXT: Color = Color {
    r: 0.576,
    g: 0.773,
    b: 0.992,
    a: 1.0,
};

/// Entry of the category pick list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryChoice {
    All,
    Only(String),
}

impl CategoryChoice {
    pub fn into_filter(self) -> Option<String> {
        match self {
            CategoryChoice::All => None,
            CategoryChoice::Only(value) => Some(value),
        }
    }
}

impl fmt::Display for CategoryChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryChoice::All => f.write_str("All Roles"),
            CategoryChoice::Only(value) => f.write_str(value),
        }
    }
}

/// Build the whole page of the active catalog
pub fn view<'a>(catalog: &'a CatalogView, phase: f32) -> Element<'a, Message> {
    let mut page: Column<'a, Message> = column![text(catalog.heading()).size(32).color(ACCENT)]
        .spacing(16)
        .align_x(Alignment::Center);

    if catalog.criteria().selection.is_some() {
        page = page.push(button(text("Show all").size(14)).on_press(Message::ClearSelection).style(button::secondary));
    }

    if let Some(controls) = controls(catalog) {
        page = page.push(controls);
    }

    let body: Element<'a, Message> = match catalog.status() {
        ListStatus::Loading => column![spinner(phase), text("Loading...").size(14)]
            .spacing(8)
            .align_x(Alignment::Center)
            .into(),
        ListStatus::Failed(message) => container(text(message).size(14).color(ERROR_TEXT))
            .padding(12)
            .width(Length::Fill)
            .style(container::rounded_box)
            .into(),
        ListStatus::Empty(message) => text(message).size(14).color(MUTED_TEXT).into(),
        ListStatus::Ready => {
            let rows = keyed_column(
                catalog
                    .rows()
                    .into_iter()
                    .map(|model| (model.key, row_view(model, phase))),
            )
            .spacing(8);
            scrollable(rows).height(Length::Fill).into()
        }
    };

    container(page.push(body))
        .padding(16)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Search box and category pick list, when the catalog has them
fn controls<'a>(catalog: &'a CatalogView) -> Option<Element<'a, Message>> {
    let schema = catalog.schema();
    let criteria = catalog.criteria();
    let mut controls = Column::new().spacing(12);
    let mut any = false;

    if !schema.search_fields.is_empty() {
        controls = controls.push(
            text_input(&schema.search_placeholder, &criteria.query)
                .on_input(Message::QueryChanged)
                .padding(8),
        );
        any = true;
    }

    if schema.category_field.is_some() {
        let options: Vec<CategoryChoice> = std::iter::once(CategoryChoice::All)
            .chain(schema.category_options.iter().cloned().map(CategoryChoice::Only))
            .collect();
        let selected = match &criteria.category {
            Some(value) => CategoryChoice::Only(value.clone()),
            None => CategoryChoice::All,
        };
        controls = controls.push(
            pick_list(options, Some(selected), Message::CategorySelected)
                .width(Length::Fill)
                .padding(8),
        );
        any = true;
    }

    any.then(|| controls.into())
}

fn row_view<'a>(model: RowModel, phase: f32) -> Element<'a, Message> {
    let slot_count = model.slots.len();
    let mut media: Row<'a, Message> = Row::new().spacing(8).align_y(Alignment::Center);

    for (index, slot) in model.slots.into_iter().enumerate() {
        media = media.push(slot_view(slot, phase));
        if index + 1 < slot_count {
            media = media.push(text("»").color(MUTED_TEXT));
        }
    }

    let mut action = button(text(model.action.label().to_string()).size(14)).padding([4, 12]);
    if !matches!(model.action, RowAction::Disabled { .. }) {
        action = action.on_press(Message::ActionPressed(model.action.clone()));
    }

    let content = row![
        media,
        text(model.title).size(14).color(MUTED_TEXT),
        horizontal_space(),
        action,
    ]
    .spacing(12)
    .align_y(Alignment::Center);

    container(content)
        .padding(10)
        .width(Length::Fill)
        .style(container::bordered_box)
        .into()
}

fn slot_view<'a>(slot: SlotView, phase: f32) -> Element<'a, Message> {
    match slot {
        SlotView::Placeholder => spinner(phase),
        SlotView::Image(handle) => Image::new(handle)
            .width(Length::Fixed(SLOT_SIZE))
            .height(Length::Fixed(SLOT_SIZE))
            .into(),
        // Same affordance as a broken image: a muted tile
        SlotView::Unavailable => container(text("✕").size(14).color(MUTED_TEXT))
            .center(Length::Fixed(SLOT_SIZE))
            .style(container::bordered_box)
            .into(),
    }
}

fn spinner<'a>(phase: f32) -> Element<'a, Message> {
    canvas(Spinner { phase })
        .width(Length::Fixed(SLOT_SIZE))
        .height(Length::Fixed(SLOT_SIZE))
        .into()
}

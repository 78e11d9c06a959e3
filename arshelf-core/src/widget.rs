//! Widget building blocks
//!
//! [`Visibility`] carries the show/hide/remove bookkeeping so widget types only
//! implement what they render. [`ErrorDisplay`] and [`Overview`] are the two
//! stock widgets every admin screen uses.

use crate::events::EventHandler;
use crate::view::Widget;

/// Show/hide/remove state shared by widget implementations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Visibility {
    visible: bool,
    removed: bool,
}

impl Visibility {
    pub fn show(&mut self) {
        if !self.removed {
            self.visible = true;
        }
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Removal is final: a removed widget never becomes visible again.
    pub fn remove(&mut self) {
        self.visible = false;
        self.removed = true;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// Shows the last failure as a single line of text
#[derive(Debug, Default)]
pub struct ErrorDisplay {
    state: Visibility,
    message: Option<String>,
}

impl ErrorDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the message and make the widget visible.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.state.show();
    }

    pub fn clear(&mut self) {
        self.message = None;
        self.state.hide();
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl Widget for ErrorDisplay {
    fn show(&mut self) {
        self.state.show();
    }

    fn hide(&mut self) {
        self.state.hide();
    }

    fn remove(&mut self) {
        self.message = None;
        self.state.remove();
    }

    fn is_visible(&self) -> bool {
        self.state.is_visible() && self.message.is_some()
    }
}

/// Event payload for [`Overview`] selections
#[derive(Debug, Clone, PartialEq)]
pub struct Selected<T> {
    pub index: usize,
    pub item: T,
}

/// Selectable list of records (apps, models, products)
pub struct Overview<T> {
    state: Visibility,
    items: Vec<T>,
    selected: Option<usize>,
    events: EventHandler<Selected<T>>,
}

impl<T: Clone> Overview<T> {
    pub const SELECT: &'static str = "select";

    pub fn new(items: Vec<T>) -> Self {
        Self {
            state: Visibility::default(),
            items,
            selected: None,
            events: EventHandler::new(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Replace the list contents, dropping a selection that fell off the end.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        if self.selected.is_some_and(|i| i >= self.items.len()) {
            self.selected = None;
        }
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.selected?)
    }

    /// Select the item at `index` and trigger `select`. Out of range is a no-op.
    pub fn select(&mut self, index: usize) -> bool {
        let Some(item) = self.items.get(index).cloned() else {
            return false;
        };
        self.selected = Some(index);
        self.events.trigger(Self::SELECT, &Selected { index, item });
        true
    }

    pub fn events(&self) -> &EventHandler<Selected<T>> {
        &self.events
    }
}

impl<T: Clone> Widget for Overview<T> {
    fn show(&mut self) {
        self.state.show();
    }

    fn hide(&mut self) {
        self.state.hide();
    }

    fn remove(&mut self) {
        self.items.clear();
        self.selected = None;
        self.state.remove();
    }

    fn is_visible(&self) -> bool {
        self.state.is_visible()
    }
}

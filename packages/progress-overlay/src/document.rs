use crate::element::{AnyElement, ContainerClass, Display, Element, ElementId, Elements};
use std::sync::{Arc, Mutex, MutexGuard};
use unicode_width::UnicodeWidthStr;

/// Horizontal padding around the count text inside the tooltip.
const TOOLTIP_PADDING: usize = 2;

#[derive(Default)]
struct Nodes {
    container_display: Display,
    classes: ContainerClass,
    track_width: usize,
    bar_width_percent: f64,
    tooltip_left: f64,
    count_text: String,
    label_text: String,
    label_display: Display,
}

impl Nodes {
    fn tooltip_width(&self) -> usize {
        self.count_text.width() + TOOLTIP_PADDING
    }
}

/// A plain copy of what a [`Document`] currently shows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Whether the container is displayed.
    pub visible: bool,
    /// The container's terminal-state classes.
    pub classes: ContainerClass,
    /// The track width, in cells.
    pub track_width: usize,
    /// The bar width, as a percentage of the track.
    pub bar_width_percent: f64,
    /// The tooltip's center offset from the track's left edge, in cells.
    pub tooltip_left: f64,
    /// The tooltip width, in cells.
    pub tooltip_width: usize,
    /// The count text, e.g. `"42%"`.
    pub count_text: String,
    /// The label text, if the label is displayed.
    pub label: Option<String>,
}

/// An in-memory overlay document implementing the element contract.
///
/// Cloning a document yields another handle to the same nodes, so a renderer can observe what a
/// controller writes.
#[derive(Clone, Default)]
pub struct Document {
    nodes: Arc<Mutex<Nodes>>,
}

impl Document {
    /// Creates a hidden document whose track is `track_width` cells wide.
    pub fn new(track_width: usize) -> Self {
        let doc = Self::default();
        doc.set_track_width(track_width);
        doc
    }

    /// Resizes the track.
    pub fn set_track_width(&self, track_width: usize) {
        self.lock().track_width = track_width;
    }

    /// Returns a handle to a single element.
    pub fn get_element_by_id(&self, id: ElementId) -> AnyElement {
        Box::new(Node {
            nodes: self.nodes.clone(),
            id,
        })
    }

    /// Binds every element of the document.
    pub fn elements(&self) -> Elements {
        Elements::bind(|id| Some(self.get_element_by_id(id)))
    }

    /// Copies out the current state.
    pub fn snapshot(&self) -> Snapshot {
        let nodes = self.lock();
        Snapshot {
            visible: nodes.container_display.is_visible(),
            classes: nodes.classes,
            track_width: nodes.track_width,
            bar_width_percent: nodes.bar_width_percent,
            tooltip_left: nodes.tooltip_left,
            tooltip_width: nodes.tooltip_width(),
            count_text: nodes.count_text.clone(),
            label: nodes
                .label_display
                .is_visible()
                .then(|| nodes.label_text.clone()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Nodes> {
        // Nodes hold plain values, so a poisoned lock is still usable.
        self.nodes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct Node {
    nodes: Arc<Mutex<Nodes>>,
    id: ElementId,
}

impl Node {
    fn lock(&self) -> MutexGuard<'_, Nodes> {
        self.nodes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Element for Node {
    fn set_text(&mut self, text: &str) {
        let mut nodes = self.lock();
        match self.id {
            ElementId::Count => nodes.count_text = text.to_string(),
            ElementId::Label => nodes.label_text = text.to_string(),
            _ => {}
        }
    }

    fn set_display(&mut self, display: Display) {
        let mut nodes = self.lock();
        match self.id {
            ElementId::Container => nodes.container_display = display,
            ElementId::Label => nodes.label_display = display,
            _ => {}
        }
    }

    fn set_width_percent(&mut self, percent: f64) {
        if self.id == ElementId::Bar {
            self.lock().bar_width_percent = percent;
        }
    }

    fn set_left_px(&mut self, left: f64) {
        if self.id == ElementId::Tooltip {
            self.lock().tooltip_left = left;
        }
    }

    fn add_class(&mut self, class: ContainerClass) {
        if self.id == ElementId::Container {
            self.lock().classes.insert(class);
        }
    }

    fn remove_class(&mut self, class: ContainerClass) {
        if self.id == ElementId::Container {
            self.lock().classes.remove(class);
        }
    }

    fn client_width(&self) -> f64 {
        match self.id {
            ElementId::Track => self.lock().track_width as f64,
            _ => 0.0,
        }
    }

    fn offset_width(&self) -> f64 {
        let nodes = self.lock();
        match self.id {
            ElementId::Track => nodes.track_width as f64,
            ElementId::Tooltip => nodes.tooltip_width() as f64,
            ElementId::Count => nodes.count_text.width() as f64,
            ElementId::Label => nodes.label_text.width() as f64,
            _ => 0.0,
        }
    }
}

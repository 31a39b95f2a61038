use bitflags::bitflags;
use std::fmt;

/// The identifiers the overlay expects its host markup to provide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementId {
    /// The outer container, shown while a run is visible.
    Container,
    /// The track the bar fills. Its width drives tooltip placement.
    Track,
    /// The filled portion of the track.
    Bar,
    /// The floating tooltip that follows the bar's leading edge.
    Tooltip,
    /// The percentage text inside the tooltip.
    Count,
    /// The optional caption above the track.
    Label,
}

impl ElementId {
    /// All identifiers, in markup order.
    pub const ALL: [ElementId; 6] = [
        ElementId::Container,
        ElementId::Track,
        ElementId::Bar,
        ElementId::Tooltip,
        ElementId::Count,
        ElementId::Label,
    ];

    /// Returns the identifier as it appears in the host markup.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementId::Container => "progress-container",
            ElementId::Track => "progress-track",
            ElementId::Bar => "progress-bar",
            ElementId::Tooltip => "progress-tooltip",
            ElementId::Count => "progress-count",
            ElementId::Label => "progress-label",
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The display mode of an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Display {
    /// The element is hidden.
    #[default]
    None,
    /// The element is shown as a flex container.
    Flex,
    /// The element is shown as a block.
    Block,
}

impl Display {
    /// Returns `true` unless the element is hidden.
    pub fn is_visible(&self) -> bool {
        *self != Display::None
    }
}

bitflags! {
    /// Terminal-state classes applied to the container.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ContainerClass: u8 {
        /// The run reached 100%.
        const COMPLETE = 0b01;
        /// The run was interrupted.
        const CANCELLED = 0b10;
    }
}

/// The subset of element behavior the overlay relies on.
///
/// Every method defaults to a no-op so an implementation only has to handle what its element
/// actually supports.
pub trait Element {
    /// Replaces the element's text content.
    fn set_text(&mut self, _text: &str) {}

    /// Changes whether and how the element is displayed.
    fn set_display(&mut self, _display: Display) {}

    /// Sets the element's width as a percentage of its parent.
    fn set_width_percent(&mut self, _percent: f64) {}

    /// Sets the element's horizontal offset in pixels (or cells).
    fn set_left_px(&mut self, _left: f64) {}

    /// Adds terminal-state classes.
    fn add_class(&mut self, _class: ContainerClass) {}

    /// Removes terminal-state classes.
    fn remove_class(&mut self, _class: ContainerClass) {}

    /// The element's inner width. Zero when unknown.
    fn client_width(&self) -> f64 {
        0.0
    }

    /// The element's rendered width including padding. Zero when unknown.
    fn offset_width(&self) -> f64 {
        0.0
    }
}

/// A boxed element handle.
pub type AnyElement = Box<dyn Element + Send>;

/// The element handles injected into a [`ProgressBar`](crate::ProgressBar).
///
/// Any handle may be absent, in which case the operations that need it are skipped.
#[derive(Default)]
pub struct Elements {
    /// `progress-container`
    pub container: Option<AnyElement>,
    /// `progress-track`
    pub track: Option<AnyElement>,
    /// `progress-bar`
    pub bar: Option<AnyElement>,
    /// `progress-tooltip`
    pub tooltip: Option<AnyElement>,
    /// `progress-count`
    pub count: Option<AnyElement>,
    /// `progress-label`
    pub label: Option<AnyElement>,
}

impl Elements {
    /// Binds each identifier through the given lookup, like querying a document by id.
    pub fn bind<F>(mut lookup: F) -> Self
    where
        F: FnMut(ElementId) -> Option<AnyElement>,
    {
        Self {
            container: lookup(ElementId::Container),
            track: lookup(ElementId::Track),
            bar: lookup(ElementId::Bar),
            tooltip: lookup(ElementId::Tooltip),
            count: lookup(ElementId::Count),
            label: lookup(ElementId::Label),
        }
    }

    /// Drops the handle for `id`, leaving that element unbound.
    pub fn unbind(mut self, id: ElementId) -> Self {
        *self.slot_mut(id) = None;
        self
    }

    /// Returns `true` if a handle is bound for `id`.
    pub fn is_bound(&self, id: ElementId) -> bool {
        match id {
            ElementId::Container => self.container.is_some(),
            ElementId::Track => self.track.is_some(),
            ElementId::Bar => self.bar.is_some(),
            ElementId::Tooltip => self.tooltip.is_some(),
            ElementId::Count => self.count.is_some(),
            ElementId::Label => self.label.is_some(),
        }
    }

    fn slot_mut(&mut self, id: ElementId) -> &mut Option<AnyElement> {
        match id {
            ElementId::Container => &mut self.container,
            ElementId::Track => &mut self.track,
            ElementId::Bar => &mut self.bar,
            ElementId::Tooltip => &mut self.tooltip,
            ElementId::Count => &mut self.count,
            ElementId::Label => &mut self.label,
        }
    }
}

impl fmt::Debug for Elements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for id in ElementId::ALL {
            if self.is_bound(id) {
                list.entry(&id.as_str());
            }
        }
        list.finish()
    }
}

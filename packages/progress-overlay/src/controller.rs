use crate::{
    config::Config,
    element::{AnyElement, ContainerClass, Display, Elements},
    message::{HostMessage, ProgressRequest},
    notifier::{HostAction, HostNotifier},
};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, trace};

/// Where a run is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Nothing is running.
    #[default]
    Idle,
    /// The bar is animating toward 100%.
    Running,
    /// The bar was interrupted and is holding before it's hidden.
    Cancelling,
    /// The bar reached 100% and is holding before it's hidden.
    Complete,
}

/// The transient state of the current run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProgressState {
    /// The displayed percentage, always within `[0, 100]`.
    pub percent: f64,
    /// The run's duration in milliseconds.
    pub duration_ms: u64,
    /// When the run started.
    pub started_at: Option<Instant>,
    /// The label given with the run.
    pub label: String,
    /// The run's phase.
    pub phase: Phase,
}

/// What a pending timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// Hide and reset after the completion hold.
    HideAfterComplete,
    /// Hide and reset after the cancel hold.
    HideAfterCancel,
}

/// The single timer the controller may have outstanding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingTimer {
    /// When the timer fires.
    pub deadline: Instant,
    /// What happens when it fires.
    pub kind: TimerKind,
}

/// Clamps `value` into `[min, max]`. Unlike [`f64::clamp`], this doesn't panic when `min > max`;
/// the upper bound wins.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Computes the tooltip's left offset for `percent`, keeping it inside the track.
pub fn tooltip_left(percent: f64, track_width: f64, tooltip_width: f64) -> f64 {
    let raw = percent / 100.0 * track_width;
    clamp(raw, tooltip_width / 2.0, track_width - tooltip_width / 2.0)
}

fn format_percent(percent: f64) -> String {
    format!("{}%", percent.round())
}

/// Drives the overlay's elements in response to host messages.
///
/// The controller never reads the clock or sleeps itself. Every transition takes the current
/// [`Instant`], and the caller is responsible for invoking [`tick`](Self::tick) while
/// [`frame_requested`](Self::frame_requested) is `true` and [`fire_timers`](Self::fire_timers)
/// once [`next_deadline`](Self::next_deadline) passes. [`run`](crate::run) does exactly that.
pub struct ProgressBar {
    elements: Elements,
    notifier: Box<dyn HostNotifier>,
    config: Config,
    state: ProgressState,
    frame_requested: bool,
    timer: Option<PendingTimer>,
}

impl ProgressBar {
    /// Creates a controller with the default [`Config`].
    pub fn new<N>(elements: Elements, notifier: N) -> Self
    where
        N: HostNotifier + 'static,
    {
        Self::with_config(elements, notifier, Config::default())
    }

    /// Creates a controller with the given config.
    pub fn with_config<N>(elements: Elements, notifier: N, config: Config) -> Self
    where
        N: HostNotifier + 'static,
    {
        Self {
            elements,
            notifier: Box::new(notifier),
            config,
            state: ProgressState::default(),
            frame_requested: false,
            timer: None,
        }
    }

    /// The current run's state.
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// The controller's config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the controller is waiting for an animation frame.
    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    /// The outstanding timer, if any.
    pub fn pending_timer(&self) -> Option<PendingTimer> {
        self.timer
    }

    /// When the outstanding timer fires, if there is one.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.map(|timer| timer.deadline)
    }

    /// Returns `true` if neither a frame nor a timer is outstanding.
    pub fn is_settled(&self) -> bool {
        !self.frame_requested && self.timer.is_none()
    }

    /// Decodes a raw host payload and routes it. Unrecognized payloads are ignored.
    pub fn dispatch(&mut self, value: &Value, now: Instant) {
        match HostMessage::from_value(value) {
            Some(message) => self.handle(message, now),
            None => debug!(%value, "ignoring unrecognized host message"),
        }
    }

    /// Routes a decoded host message.
    pub fn handle(&mut self, message: HostMessage, now: Instant) {
        match message {
            HostMessage::Progress(request) => self.update(&request, now),
            HostMessage::Cancel => self.cancel(now),
        }
    }

    /// Cancels any outstanding frame and timer and returns every element to its initial look.
    pub fn reset(&mut self) {
        self.cancel_scheduled();

        self.state.percent = 0.0;
        self.state.phase = Phase::Idle;
        if let Some(container) = &mut self.elements.container {
            container.remove_class(ContainerClass::COMPLETE | ContainerClass::CANCELLED);
        }
        if let Some(bar) = &mut self.elements.bar {
            bar.set_width_percent(0.0);
        }
        if let Some(count) = &mut self.elements.count {
            count.set_text("0%");
        }
        self.position_tooltip(0.0);
        self.show_label("");
    }

    /// Resets, then starts a new run.
    ///
    /// The container, bar and count must be bound; otherwise nothing starts. A zero duration
    /// completes immediately.
    pub fn update(&mut self, request: &ProgressRequest, now: Instant) {
        self.reset();
        let Some((container, bar, count)) = self.required() else {
            return;
        };
        container.set_display(Display::Flex);
        bar.set_width_percent(0.0);
        count.set_text("0%");

        self.state = ProgressState {
            percent: 0.0,
            duration_ms: request.duration_ms,
            started_at: Some(now),
            label: request.label.clone(),
            phase: Phase::Running,
        };
        self.show_label(&request.label);
        self.position_tooltip(0.0);
        debug!(
            duration_ms = request.duration_ms,
            label = %request.label,
            "progress started"
        );

        if request.duration_ms == 0 {
            self.complete(now);
        } else {
            self.frame_requested = true;
        }
    }

    /// Runs one animation frame. Does nothing unless a frame was requested.
    pub fn tick(&mut self, now: Instant) {
        if !self.frame_requested {
            return;
        }
        self.frame_requested = false;
        let Some(started_at) = self.state.started_at else {
            return;
        };

        let duration_ms = self.state.duration_ms as f64;
        let elapsed_ms = (now.saturating_duration_since(started_at).as_secs_f64() * 1000.0)
            .min(duration_ms);
        let progress = elapsed_ms / duration_ms;
        let percent = clamp(progress * 100.0, 0.0, 100.0);

        self.state.percent = percent;
        if let Some((_, bar, count)) = self.required() {
            bar.set_width_percent(percent);
            count.set_text(&format_percent(percent));
        }
        self.position_tooltip(percent);
        trace!(percent, "tick");

        if progress < 1.0 {
            self.frame_requested = true;
        } else {
            self.complete(now);
        }
    }

    /// Fills the bar, notifies the host and schedules the completion hold.
    pub fn complete(&mut self, now: Instant) {
        let Some((container, bar, count)) = self.required() else {
            return;
        };
        container.add_class(ContainerClass::COMPLETE);
        bar.set_width_percent(100.0);
        count.set_text("100%");

        self.cancel_scheduled();
        self.state.percent = 100.0;
        self.state.phase = Phase::Complete;
        self.position_tooltip(100.0);
        debug!(label = %self.state.label, "progress complete");

        self.notifier.post_action(HostAction::Finish);
        self.timer = Some(PendingTimer {
            deadline: now + self.config.complete_hold(),
            kind: TimerKind::HideAfterComplete,
        });
    }

    /// Interrupts the current run, freezing the bar where it is, and schedules the cancel hold.
    pub fn cancel(&mut self, now: Instant) {
        let cancelled_label = self.config.cancelled_label.clone();
        let percent = self.state.percent.round();
        let Some((container, bar, count)) = self.required() else {
            return;
        };
        container.remove_class(ContainerClass::COMPLETE);
        container.add_class(ContainerClass::CANCELLED);
        container.set_display(Display::Flex);
        bar.set_width_percent(percent);
        count.set_text(&format_percent(percent));

        self.cancel_scheduled();
        self.state.percent = percent;
        self.state.phase = Phase::Cancelling;
        self.show_label(&cancelled_label);
        self.position_tooltip(percent);
        debug!(percent, "progress cancelled");

        self.timer = Some(PendingTimer {
            deadline: now + self.config.cancel_hold(),
            kind: TimerKind::HideAfterCancel,
        });
    }

    /// Hides the overlay after a cancel and resets its visuals. The host isn't notified.
    pub fn finish_cancel(&mut self) {
        self.hide(ContainerClass::CANCELLED);
    }

    /// Fires the outstanding timer if its deadline has passed.
    pub fn fire_timers(&mut self, now: Instant) {
        let Some(timer) = self.timer.filter(|timer| timer.deadline <= now) else {
            return;
        };
        self.timer = None;
        match timer.kind {
            TimerKind::HideAfterComplete => self.hide(ContainerClass::COMPLETE),
            TimerKind::HideAfterCancel => self.finish_cancel(),
        }
    }

    fn hide(&mut self, class: ContainerClass) {
        let Some((container, bar, count)) = self.required() else {
            return;
        };
        container.set_display(Display::None);
        container.remove_class(class);
        bar.set_width_percent(0.0);
        count.set_text("0%");

        self.state.percent = 0.0;
        self.state.phase = Phase::Idle;
        self.position_tooltip(0.0);
        self.show_label("");
        debug!("progress hidden");
    }

    fn cancel_scheduled(&mut self) {
        self.frame_requested = false;
        self.timer = None;
    }

    /// The elements a run can't do without.
    fn required(&mut self) -> Option<(&mut AnyElement, &mut AnyElement, &mut AnyElement)> {
        match (
            &mut self.elements.container,
            &mut self.elements.bar,
            &mut self.elements.count,
        ) {
            (Some(container), Some(bar), Some(count)) => Some((container, bar, count)),
            _ => None,
        }
    }

    fn show_label(&mut self, text: &str) {
        let Some(label) = &mut self.elements.label else {
            return;
        };
        let text = text.trim();
        label.set_text(text);
        label.set_display(if text.is_empty() {
            Display::None
        } else {
            Display::Block
        });
    }

    fn position_tooltip(&mut self, percent: f64) {
        let (Some(track), Some(tooltip)) = (&self.elements.track, &mut self.elements.tooltip)
        else {
            return;
        };
        let track_width = track.client_width();
        if track_width <= 0.0 {
            return;
        }
        let left = tooltip_left(percent, track_width, tooltip.offset_width());
        tooltip.set_left_px(left);
    }
}

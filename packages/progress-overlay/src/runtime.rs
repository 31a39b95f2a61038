use crate::controller::ProgressBar;
use futures::stream::{Stream, StreamExt};
use serde_json::Value;
use smol::{future, Timer};
use std::{pin::pin, time::Instant};

enum Wakeup {
    Message(Option<Value>),
    Frame,
    Timer,
}

/// Drives a [`ProgressBar`] from a stream of raw host messages.
///
/// Animation frames are paced by the controller's configured frame interval, and only while it
/// has a frame requested. Timers fire at their deadlines. After every transition, `on_change` is
/// invoked so the caller can redraw.
///
/// Once `messages` ends, the loop keeps running until the controller has nothing outstanding,
/// then returns it.
pub async fn run<S, F>(mut bar: ProgressBar, messages: S, mut on_change: F) -> ProgressBar
where
    S: Stream<Item = Value>,
    F: FnMut(&ProgressBar),
{
    let mut messages = pin!(messages);
    let mut messages_done = false;
    let frame_interval = bar.config().frame_interval();
    // Held across wakeups. Only a fired frame or a dropped request clears it.
    let mut next_frame: Option<Instant> = None;

    while !(messages_done && bar.is_settled()) {
        if bar.frame_requested() {
            next_frame.get_or_insert_with(|| Instant::now() + frame_interval);
        } else {
            next_frame = None;
        }
        let deadline = bar.next_deadline();

        let message = async {
            if messages_done {
                future::pending().await
            } else {
                Wakeup::Message(messages.next().await)
            }
        };
        let frame = async {
            match next_frame {
                Some(at) => {
                    Timer::at(at).await;
                    Wakeup::Frame
                }
                None => future::pending().await,
            }
        };
        let timer = async {
            match deadline {
                Some(deadline) => {
                    Timer::at(deadline).await;
                    Wakeup::Timer
                }
                None => future::pending().await,
            }
        };

        let wakeup = future::or(message, future::or(frame, timer)).await;
        let now = Instant::now();
        match wakeup {
            Wakeup::Message(Some(value)) => bar.dispatch(&value, now),
            Wakeup::Message(None) => {
                messages_done = true;
                continue;
            }
            Wakeup::Frame => {
                next_frame = None;
                bar.tick(now);
            }
            Wakeup::Timer => bar.fire_timers(now),
        }
        on_change(&bar);
    }

    bar
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        controller::Phase,
        document::Document,
        element::ContainerClass,
        notifier::{HostAction, HostNotifier},
    };
    use futures::stream;
    use macro_rules_attribute::apply;
    use serde_json::json;
    use smol_macros::test;
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    fn recorder() -> (Arc<Mutex<Vec<HostAction>>>, impl HostNotifier + 'static) {
        let actions = Arc::new(Mutex::new(Vec::new()));
        let notifier = {
            let actions = actions.clone();
            move |action: HostAction| actions.lock().unwrap().push(action)
        };
        (actions, notifier)
    }

    fn fast_config() -> Config {
        Config {
            complete_hold_ms: 30,
            cancel_hold_ms: 20,
            frame_interval_ms: 2,
            ..Default::default()
        }
    }

    #[apply(test!)]
    async fn test_run_to_completion() {
        let doc = Document::new(40);
        let (actions, notifier) = recorder();
        let bar = ProgressBar::with_config(doc.elements(), notifier, fast_config());

        let messages = stream::iter(vec![
            json!({"action": "progress", "duration": 60, "label": "Loading"}),
        ]);
        let mut percents = Vec::new();
        let mut saw_complete = false;
        let bar = run(bar, messages, |bar| {
            if bar.state().phase == Phase::Complete {
                saw_complete = true;
            } else if !saw_complete {
                percents.push(bar.state().percent);
            }
        })
        .await;

        assert!(saw_complete);
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{:?}", percents);
        assert!(percents.iter().all(|p| (0.0..=100.0).contains(p)));
        assert_eq!(*actions.lock().unwrap(), vec![HostAction::Finish]);
        assert!(bar.is_settled());
        assert_eq!(bar.state().phase, Phase::Idle);
        assert!(!doc.snapshot().visible);
    }

    #[apply(test!)]
    async fn test_run_with_cancel() {
        let doc = Document::new(40);
        let (actions, notifier) = recorder();
        let bar = ProgressBar::with_config(doc.elements(), notifier, fast_config());

        let messages = stream::once(async {
            json!({"action": "progress", "duration": 10_000, "label": "Crafting"})
        })
        .chain(stream::once(async {
            Timer::after(Duration::from_millis(30)).await;
            json!({"action": "cancel"})
        }));
        let mut cancelled = Vec::new();
        let bar = run(bar, messages, |bar| {
            if bar.state().phase == Phase::Cancelling {
                cancelled.push(doc.snapshot());
            }
        })
        .await;

        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].classes, ContainerClass::CANCELLED);
        assert_eq!(cancelled[0].label.as_deref(), Some("Cancelled"));
        assert_ne!(cancelled[0].count_text, "100%");
        assert!(actions.lock().unwrap().is_empty());
        assert!(bar.is_settled());
        assert!(!doc.snapshot().visible);
    }

    #[apply(test!)]
    async fn test_frames_keep_pace_with_busy_host() {
        let doc = Document::new(40);
        let (actions, notifier) = recorder();
        let config = Config {
            frame_interval_ms: 10,
            ..fast_config()
        };
        let bar = ProgressBar::with_config(doc.elements(), notifier, config);

        // Unrecognized messages arrive faster than the frame interval for well past the run's
        // duration.
        let observed = Arc::new(Mutex::new(Vec::new()));
        let noise = stream::iter(0..80).then({
            let doc = doc.clone();
            let observed = observed.clone();
            move |_| {
                let doc = doc.clone();
                let observed = observed.clone();
                async move {
                    Timer::after(Duration::from_millis(3)).await;
                    observed.lock().unwrap().push(doc.snapshot().count_text);
                    json!({"action": "noop"})
                }
            }
        });
        let messages = stream::once(async {
            json!({"action": "progress", "duration": 100})
        })
        .chain(noise);
        let bar = run(bar, messages, |_| {}).await;

        let observed = observed.lock().unwrap();
        assert!(
            observed.iter().any(|count| count != "0%" && count != "100%"),
            "{:?}",
            observed
        );
        assert!(observed.iter().any(|count| count == "100%"), "{:?}", observed);
        assert_eq!(*actions.lock().unwrap(), vec![HostAction::Finish]);
        assert!(bar.is_settled());
    }

    #[apply(test!)]
    async fn test_run_ignores_garbage() {
        let doc = Document::new(40);
        let (actions, notifier) = recorder();
        let bar = ProgressBar::with_config(doc.elements(), notifier, fast_config());

        let messages = stream::iter(vec![json!(null), json!({"action": "launch"})]);
        let mut changes = 0;
        let bar = run(bar, messages, |_| changes += 1).await;

        assert_eq!(changes, 2);
        assert!(bar.is_settled());
        assert!(actions.lock().unwrap().is_empty());
        assert!(!doc.snapshot().visible);
    }
}

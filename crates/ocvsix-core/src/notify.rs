//! Notification surface: the single sink for user-facing error messages.

use std::time::Duration;

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

/// Message shown when an error renders as blank text.
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred.";

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3_000);

/// Delay before `show` is added, so the fade-in transition triggers.
pub const TOAST_SHOW_DELAY: Duration = Duration::from_millis(10);

/// Fade-out transition length; the element is discarded after it.
pub const TOAST_FADE: Duration = Duration::from_millis(300);

pub const TOAST_CLASS: &str = "toast-notification";
pub const TOAST_SHOW_CLASS: &str = "show";

pub trait Notifier: Send + Sync {
    fn report(&self, message: &str);
}

/// The user-facing text for `err`.
pub fn error_message(err: &Error) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        message
    }
}

pub fn report_error(notifier: &dyn Notifier, err: &Error) {
    tracing::warn!(error = %err, "reporting failure");
    notifier.report(&error_message(err));
}

/// Transient toast element appended to the page body.
#[derive(Debug, Clone)]
pub struct ToastNotifier {
    document: Document,
    duration: Duration,
}

impl ToastNotifier {
    pub fn new(document: Document) -> Self {
        Self::with_duration(document, DEFAULT_TOAST_DURATION)
    }

    pub fn with_duration(document: Document, duration: Duration) -> Self {
        Self { document, duration }
    }

    /// Inserts the toast and returns its node. Requires a tokio runtime for the
    /// show/dismiss timers; without one the toast stays in place.
    pub fn show(&self, message: &str) -> Result<NodeId> {
        let doc = &self.document;
        let toast = doc.create_element("div");
        doc.set_attribute(toast, "class", TOAST_CLASS)?;
        doc.set_text(toast, message)?;
        doc.append_child(doc.body(), toast)?;

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no runtime, toast will not auto-dismiss");
            return Ok(toast);
        };
        let doc = doc.clone();
        let duration = self.duration;
        runtime.spawn(async move {
            tokio::time::sleep(TOAST_SHOW_DELAY).await;
            log_step("show", doc.add_class(toast, TOAST_SHOW_CLASS));
            tokio::time::sleep(duration.saturating_sub(TOAST_SHOW_DELAY)).await;
            log_step("hide", doc.remove_class(toast, TOAST_SHOW_CLASS));
            tokio::time::sleep(TOAST_FADE).await;
            log_step("dismiss", doc.discard(toast));
        });
        Ok(toast)
    }
}

/// The page may have removed the toast already; that is not worth more than a debug line.
fn log_step(step: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::debug!(step, error = %e, "toast step skipped");
    }
}

impl Notifier for ToastNotifier {
    fn report(&self, message: &str) {
        if let Err(e) = self.show(message) {
            tracing::warn!(error = %e, "could not show toast");
        }
    }
}

/// Reports to stderr and the log. Used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn report(&self, message: &str) {
        tracing::warn!("{}", message);
        eprintln!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Notifier for Recorder {
        fn report(&self, message: &str) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    #[test]
    fn error_message_uses_display_text() {
        let e = Error::NotFound("Extension ID not found in the URL.".into());
        assert_eq!(error_message(&e), "Extension ID not found in the URL.");
    }

    #[test]
    fn blank_message_falls_back() {
        let e = Error::NotFound("  ".into());
        assert_eq!(error_message(&e), FALLBACK_MESSAGE);
        let r = Recorder::default();
        report_error(&r, &Error::AssetMissing(String::new()));
        assert_eq!(r.0.lock().unwrap().as_slice(), [FALLBACK_MESSAGE]);
    }

    #[tokio::test(start_paused = true)]
    async fn toast_lifecycle() {
        let doc = Document::new();
        let notifier = ToastNotifier::with_duration(doc.clone(), Duration::from_millis(1_000));
        let toast = notifier.show("boom").unwrap();

        assert_eq!(doc.parent(toast), Some(doc.body()));
        assert_eq!(doc.text(toast).as_deref(), Some("boom"));
        assert!(!doc.has_class(toast, TOAST_SHOW_CLASS));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(doc.has_class(toast, TOAST_SHOW_CLASS));

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(!doc.has_class(toast, TOAST_SHOW_CLASS));
        assert!(doc.is_connected(toast));

        tokio::time::sleep(TOAST_FADE).await;
        assert!(!doc.is_connected(toast));
        assert!(!doc.is_element_present(".toast-notification").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_toasts_reuse_slots() {
        let doc = Document::new();
        let notifier = ToastNotifier::with_duration(doc.clone(), Duration::from_millis(100));
        notifier.report("first");
        tokio::time::sleep(Duration::from_millis(500)).await;
        let slots = doc.slot_count();

        for i in 0..20 {
            notifier.report(&format!("failure {i}"));
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert_eq!(doc.slot_count(), slots);
        assert!(!doc.is_element_present(".toast-notification").unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn toast_removed_by_page_leaves_reused_slot_alone() {
        let doc = Document::new();
        let notifier = ToastNotifier::with_duration(doc.clone(), Duration::from_millis(100));
        let toast = notifier.show("gone early").unwrap();
        doc.discard(toast).unwrap();

        // Takes over the toast's slot before the lifecycle timers fire.
        let banner = doc.create_element("div");
        doc.append_child(doc.body(), banner).unwrap();

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(doc.is_connected(banner));
        assert!(!doc.has_class(banner, TOAST_SHOW_CLASS));
    }

    #[test]
    fn toast_without_runtime_stays() {
        let doc = Document::new();
        ToastNotifier::new(doc.clone()).report("no timers");
        assert!(doc.is_element_present("body > .toast-notification").unwrap());
    }
}

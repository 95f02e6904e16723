//! Page integration controller.
//!
//! `Idle` until the anchor element appears, then `Ready` with the download
//! button inserted right after it. A click moves to `Resolving` while the
//! pipeline runs and back to `Ready` when it finishes, successfully or not.
//! Clicks are not serialized: a second click while resolving starts a second
//! run, and the state returns to `Ready` once the last one finishes.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::OcvsixConfig;
use crate::dom::{InsertPosition, NodeId};
use crate::error::Result;
use crate::notify::{report_error, Notifier};
use crate::page::Page;
use crate::pipeline::Downloader;
use crate::watcher::{on_element_ready, WatchOptions};

pub const BUTTON_LABEL: &str = "Download Extension";
pub const BUTTON_CLASS: &str = "ms-Button ux-button download ms-Button--default root-39";
pub const BUTTON_STYLE: &str = "margin-top: 10px";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Ready,
    Resolving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    pub anchor_selector: String,
    pub watch: WatchOptions,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            anchor_selector: crate::config::DEFAULT_ANCHOR_SELECTOR.to_string(),
            watch: WatchOptions::default(),
        }
    }
}

impl ControllerOptions {
    pub fn from_config(cfg: &OcvsixConfig) -> Self {
        Self {
            anchor_selector: cfg.anchor_selector.clone(),
            watch: WatchOptions::default()
                .with_timeout(cfg.watch_timeout())
                .silent(cfg.silent_watch),
        }
    }
}

/// What a click led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The package was saved here. Nothing is reported on success.
    Saved(PathBuf),
    /// A failure was sent to the notifier.
    Reported,
    /// The button is not mounted yet; nothing happened.
    NotMounted,
}

struct Inner {
    state: ControllerState,
    button: Option<NodeId>,
    in_flight: usize,
}

pub struct PageController {
    page: Page,
    downloader: Downloader,
    notifier: Arc<dyn Notifier>,
    options: ControllerOptions,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for PageController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageController")
            .field("location", &self.page.location().as_str())
            .field("state", &self.state())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PageController {
    pub fn new(
        page: Page,
        downloader: Downloader,
        notifier: Arc<dyn Notifier>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            page,
            downloader,
            notifier,
            options,
            inner: Mutex::new(Inner {
                state: ControllerState::Idle,
                button: None,
                in_flight: 0,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ControllerState {
        self.inner().state
    }

    pub fn button(&self) -> Option<NodeId> {
        self.inner().button
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Waits for the anchor and inserts the button after it.
    ///
    /// Returns the button, or `None` when the anchor never appeared (reported
    /// through the notifier unless the watch is silent). Calling it again once
    /// mounted returns the existing button.
    pub async fn mount(&self) -> Option<NodeId> {
        if let Some(button) = self.button() {
            return Some(button);
        }
        let document = self.page.document();
        let anchor = match on_element_ready(document, &self.options.anchor_selector, self.options.watch).await {
            Ok(Some(anchor)) => anchor,
            Ok(None) => {
                tracing::debug!(selector = %self.options.anchor_selector, "anchor absent, page left unchanged");
                return None;
            }
            Err(e) => {
                report_error(self.notifier.as_ref(), &e);
                return None;
            }
        };

        let mut inner = self.inner();
        if let Some(button) = inner.button {
            return Some(button);
        }
        match self.insert_button(anchor) {
            Ok(button) => {
                inner.button = Some(button);
                inner.state = ControllerState::Ready;
                tracing::debug!("download button mounted");
                Some(button)
            }
            Err(e) => {
                report_error(self.notifier.as_ref(), &e);
                None
            }
        }
    }

    fn insert_button(&self, anchor: NodeId) -> Result<NodeId> {
        let doc = self.page.document();
        let button = doc.create_element("button");
        doc.set_text(button, BUTTON_LABEL)?;
        doc.set_attribute(button, "type", "button")?;
        doc.set_attribute(button, "class", BUTTON_CLASS)?;
        doc.set_attribute(button, "style", BUTTON_STYLE)?;
        doc.insert(anchor, button, InsertPosition::After)?;
        Ok(button)
    }

    /// Handles a click on the download button.
    pub async fn handle_click(&self) -> ClickOutcome {
        if self.state() == ControllerState::Idle {
            return ClickOutcome::NotMounted;
        }
        let id = match self.page.package_identifier() {
            Ok(id) => id,
            Err(e) => {
                report_error(self.notifier.as_ref(), &e);
                return ClickOutcome::Reported;
            }
        };

        let _resolving = ResolvingGuard::enter(self);
        tracing::debug!(package = %id, "download requested");
        match self.downloader.download(&id).await {
            Ok(path) => ClickOutcome::Saved(path),
            Err(e) => {
                report_error(self.notifier.as_ref(), &e);
                ClickOutcome::Reported
            }
        }
    }
}

/// Keeps the controller in `Resolving` while at least one click is in flight,
/// including when the click future is dropped early.
struct ResolvingGuard<'a> {
    controller: &'a PageController,
}

impl<'a> ResolvingGuard<'a> {
    fn enter(controller: &'a PageController) -> Self {
        let mut inner = controller.inner();
        inner.in_flight += 1;
        inner.state = ControllerState::Resolving;
        Self { controller }
    }
}

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.controller.inner();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.in_flight == 0 {
            inner.state = ControllerState::Ready;
        }
    }
}

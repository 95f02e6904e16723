//! `ocvsix page <url>` – run the page integration against a marketplace page model.
//!
//! The page body is filled in after the controller starts watching, the way the
//! real marketplace renders its action bar after load.

use anyhow::{bail, Context, Result};
use ocvsix_core::config::OcvsixConfig;
use ocvsix_core::controller::{ClickOutcome, ControllerOptions, PageController};
use ocvsix_core::dom::Document;
use ocvsix_core::notify::{Notifier, StderrNotifier, ToastNotifier};
use ocvsix_core::page::Page;
use std::path::Path;
use std::sync::Arc;

use super::build_downloader;

pub async fn run_page(cfg: &OcvsixConfig, url: &str, dir: &Path) -> Result<()> {
    let page = Page::parse(url)?;
    if !page.is_extension_detail_page() {
        bail!("{} is not a package detail page (missing itemName)", url);
    }

    let doc = page.document().clone();
    let anchor_selector = cfg.anchor_selector.clone();
    tokio::spawn(async move {
        tokio::task::yield_now().await;
        if let Err(e) = render_item_header(&doc, &anchor_selector) {
            tracing::warn!(error = %e, "could not render page");
        }
    });

    let notifier = PageNotifier {
        toast: ToastNotifier::with_duration(page.document().clone(), cfg.toast_duration()),
        stderr: StderrNotifier,
    };
    let controller = PageController::new(
        page,
        build_downloader(cfg, dir),
        Arc::new(notifier),
        ControllerOptions::from_config(cfg),
    );

    controller
        .mount()
        .await
        .context("download button was not mounted")?;

    match controller.handle_click().await {
        ClickOutcome::Saved(path) => {
            println!("Saved {}", path.display());
            Ok(())
        }
        ClickOutcome::Reported => bail!("download failed"),
        ClickOutcome::NotMounted => bail!("download button was not mounted"),
    }
}

/// Toast on the page model plus a copy on stderr, since nobody sees the page.
struct PageNotifier {
    toast: ToastNotifier,
    stderr: StderrNotifier,
}

impl Notifier for PageNotifier {
    fn report(&self, message: &str) {
        self.toast.report(message);
        self.stderr.report(message);
    }
}

/// `<div class="ux-item-header"><div class="ux-item-action"></div></div>`, using the
/// configured anchor class when it is a plain class selector.
fn render_item_header(doc: &Document, anchor_selector: &str) -> ocvsix_core::Result<()> {
    let header = doc.create_element("div");
    doc.set_attribute(header, "class", "ux-item-header")?;
    let action = doc.create_element("div");
    let class = anchor_selector
        .strip_prefix('.')
        .filter(|c| !c.contains(|ch: char| ch.is_whitespace() || ".#[>,".contains(ch)))
        .unwrap_or("ux-item-action");
    doc.set_attribute(action, "class", class)?;
    doc.append_child(header, action)?;
    doc.append_child(doc.body(), header)
}

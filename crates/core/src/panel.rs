//! Search panel controller: open/close state and the suggestion rail lifecycle.
//!
//! The controller is the single writer of a [`PanelSurface`], the host-provided view of
//! the panel's elements (results container, suggestion title, rail, input, height).
//! State lives in [`PanelState`]; the applied height is a side effect issued after each
//! transition, never read back to decide whether the panel is open.
//!
//! ```text
//!   Closed --Toggle/Open--> Open --QueryChanged--> Open
//!   Open --Toggle/Close/Escape--> Closed
//!   Open --Resize--> Open (height recomputed)
//! ```

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::catalog::CatalogLoader;
use crate::render::{RenderOutcome, RenderTarget, RendererChain};
use crate::suggest::SuggestionBuilder;
use crate::types::{BoostSet, SuggestConfig, SuggestionItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanelState {
    #[default]
    Closed,
    Open,
}

impl PanelState {
    pub fn is_open(self) -> bool {
        self == PanelState::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Other,
}

impl Key {
    /// Map a DOM-style key name (`"Escape"`, `"Enter"`, ...).
    pub fn from_name(name: &str) -> Self {
        match name {
            "Escape" | "Esc" => Key::Escape,
            "Enter" => Key::Enter,
            _ => Key::Other,
        }
    }
}

/// Input signals routed to the controller by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// Toggle control clicked.
    Toggle,
    Open,
    /// Close control clicked.
    Close,
    /// Key pressed anywhere in the document.
    KeyDown(Key),
    /// Text in the query input changed.
    QueryChanged,
    /// Viewport resized.
    Resize,
}

/// UI work scheduled for after the next layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    FocusInput,
}

/// The panel's elements as seen by the controller.
pub trait PanelSurface {
    /// Empty the free-text results container.
    fn clear_results(&mut self);
    fn set_suggest_title_visible(&mut self, visible: bool);
    fn rail(&mut self) -> &mut dyn RenderTarget;
    fn input_text(&self) -> String;
    fn set_input_text(&mut self, text: &str);
    fn focus_input(&mut self);
    /// Height the panel's content needs when fully expanded.
    fn natural_height(&self) -> u32;
    fn set_height(&mut self, px: u32);
    /// Toggle the "search open" marker on the enclosing header.
    fn set_open_marker(&mut self, open: bool);
}

pub struct SearchPanelController<S: PanelSurface> {
    surface: S,
    loader: Arc<CatalogLoader>,
    builder: SuggestionBuilder,
    renderers: RendererChain,
    limit: usize,
    state: PanelState,
    deferred: Vec<DeferredAction>,
}

impl<S: PanelSurface> SearchPanelController<S> {
    pub fn new(
        surface: S,
        loader: Arc<CatalogLoader>,
        renderers: RendererChain,
        config: &SuggestConfig,
    ) -> Self {
        Self {
            surface,
            loader,
            builder: SuggestionBuilder::from_config(config),
            renderers,
            limit: config.limit,
            state: PanelState::Closed,
            deferred: Vec::new(),
        }
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn loader(&self) -> &Arc<CatalogLoader> {
        &self.loader
    }

    pub fn pending(&self) -> &[DeferredAction] {
        &self.deferred
    }

    /// Dispatch a host event. Returns the background catalog load when the event opened
    /// the panel and the catalog was not yet loaded.
    pub fn handle(&mut self, event: PanelEvent) -> Option<JoinHandle<()>> {
        match event {
            PanelEvent::Toggle => return self.toggle(),
            PanelEvent::Open => return self.open(),
            PanelEvent::Close | PanelEvent::KeyDown(Key::Escape) => self.close(),
            PanelEvent::KeyDown(_) => {}
            PanelEvent::QueryChanged => {
                self.query_changed(&BoostSet::new());
            }
            PanelEvent::Resize => self.resize(),
        }
        None
    }

    pub fn toggle(&mut self) -> Option<JoinHandle<()>> {
        if self.is_open() {
            self.close();
            None
        } else {
            self.open()
        }
    }

    /// Reset and expand the panel, queue input focus, and start loading the catalog
    /// without waiting for it.
    pub fn open(&mut self) -> Option<JoinHandle<()>> {
        self.surface.clear_results();
        self.clear_rail();
        self.surface.set_input_text("");

        self.transition(PanelState::Open);
        let height = self.surface.natural_height();
        self.surface.set_height(height);
        self.surface.set_open_marker(true);
        self.deferred.push(DeferredAction::FocusInput);

        self.spawn_load()
    }

    pub fn close(&mut self) {
        self.transition(PanelState::Closed);
        self.surface.set_height(0);
        self.surface.set_open_marker(false);
    }

    /// Recompute the rail for the current input. Ignored while closed.
    pub fn query_changed(&mut self, boost: &BoostSet) -> Option<RenderOutcome> {
        if !self.is_open() {
            return None;
        }
        let query = self.surface.input_text();
        let catalog = self.loader.snapshot();
        let items = self.builder.build(&catalog, &query, boost, self.limit);
        Some(self.render_rail(&items))
    }

    pub fn resize(&mut self) {
        if self.is_open() {
            self.fit_height();
        }
    }

    /// Run UI work queued by the last transitions. Hosts call this once layout settles.
    pub fn after_layout(&mut self) {
        for action in std::mem::take(&mut self.deferred) {
            match action {
                // Focusing a collapsed panel would scroll to a hidden input.
                DeferredAction::FocusInput if self.is_open() => self.surface.focus_input(),
                DeferredAction::FocusInput => {}
            }
        }
    }

    fn render_rail(&mut self, items: &[SuggestionItem]) -> RenderOutcome {
        self.surface.set_suggest_title_visible(!items.is_empty());
        let outcome = self.renderers.render(self.surface.rail(), items);
        if self.is_open() {
            self.fit_height();
        }
        outcome
    }

    fn clear_rail(&mut self) {
        self.surface.set_suggest_title_visible(false);
        self.surface.rail().clear();
    }

    fn fit_height(&mut self) {
        let height = self.surface.natural_height();
        self.surface.set_height(height);
    }

    fn transition(&mut self, next: PanelState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Search panel transition");
        }
        self.state = next;
    }

    fn spawn_load(&self) -> Option<JoinHandle<()>> {
        if self.loader.is_loaded() {
            return None;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let loader = Arc::clone(&self.loader);
                Some(handle.spawn(async move {
                    loader.ensure_loaded().await;
                }))
            }
            Err(_) => {
                warn!(
                    source = self.loader.source_name(),
                    "No async runtime; catalog load left to the host"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSource, StaticCatalogSource};
    use crate::error::{CatalogError, Result};
    use crate::render::HtmlBuffer;
    use crate::types::ContentRecord;
    use async_trait::async_trait;

    #[derive(Default)]
    struct FakeSurface {
        results_cleared: usize,
        title_visible: bool,
        rail: HtmlBuffer,
        input: String,
        focused: usize,
        natural: u32,
        height: u32,
        marker: bool,
    }

    impl PanelSurface for FakeSurface {
        fn clear_results(&mut self) {
            self.results_cleared += 1;
        }
        fn set_suggest_title_visible(&mut self, visible: bool) {
            self.title_visible = visible;
        }
        fn rail(&mut self) -> &mut dyn RenderTarget {
            &mut self.rail
        }
        fn input_text(&self) -> String {
            self.input.clone()
        }
        fn set_input_text(&mut self, text: &str) {
            self.input = text.to_string();
        }
        fn focus_input(&mut self) {
            self.focused += 1;
        }
        fn natural_height(&self) -> u32 {
            // Content grows with the rail.
            self.natural + if self.rail.markup().is_empty() { 0 } else { 120 }
        }
        fn set_height(&mut self, px: u32) {
            self.height = px;
        }
        fn set_open_marker(&mut self, open: bool) {
            self.marker = open;
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CatalogSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }
        async fn fetch_records(&self) -> Result<Vec<ContentRecord>> {
            Err(CatalogError::Fetch("connection refused".into()))
        }
    }

    fn controller(source: Arc<dyn CatalogSource>) -> SearchPanelController<FakeSurface> {
        let surface = FakeSurface { natural: 64, rail: HtmlBuffer::new("rail"), ..Default::default() };
        SearchPanelController::new(
            surface,
            Arc::new(CatalogLoader::new(source)),
            RendererChain::default(),
            &SuggestConfig::default(),
        )
    }

    fn drama_source() -> Arc<dyn CatalogSource> {
        Arc::new(StaticCatalogSource::from_contents([
            "Drama", "Drama", "Drama", "Drama", "Drama", "Music", "Music", "K-drama",
        ]))
    }

    #[test]
    fn toggle_alternates_without_runtime() {
        let mut c = controller(drama_source());
        let mut expected = PanelState::Closed;
        for _ in 0..5 {
            c.handle(PanelEvent::Toggle);
            expected = if expected.is_open() { PanelState::Closed } else { PanelState::Open };
            assert_eq!(c.state(), expected);
            assert_eq!(c.surface().marker, expected.is_open());
        }
        // no runtime: nothing fetched
        assert_eq!(c.loader().fetch_count(), 0);
    }

    #[test]
    fn escape_closes_and_other_keys_do_not() {
        let mut c = controller(drama_source());
        c.handle(PanelEvent::Open);
        c.handle(PanelEvent::KeyDown(Key::from_name("a")));
        assert!(c.is_open());
        c.handle(PanelEvent::KeyDown(Key::from_name("Escape")));
        assert_eq!(c.state(), PanelState::Closed);
        assert_eq!(c.surface().height, 0);
        // Escape while closed stays closed
        c.handle(PanelEvent::KeyDown(Key::Escape));
        assert_eq!(c.state(), PanelState::Closed);
    }

    #[test]
    fn open_resets_panel_and_defers_focus() {
        let mut c = controller(drama_source());
        c.surface_mut().input = "old".into();
        c.surface_mut().rail.set_markup("old".into());
        c.surface_mut().title_visible = true;

        c.open();
        let s = c.surface();
        assert_eq!(s.input, "");
        assert_eq!(s.rail.markup(), "");
        assert!(!s.title_visible);
        assert_eq!(s.results_cleared, 1);
        assert_eq!(s.height, 64);
        assert_eq!(s.focused, 0);
        assert_eq!(c.pending(), &[DeferredAction::FocusInput]);

        c.after_layout();
        assert_eq!(c.surface().focused, 1);
        assert!(c.pending().is_empty());
    }

    #[test]
    fn deferred_focus_dropped_after_close() {
        let mut c = controller(drama_source());
        c.open();
        c.close();
        c.after_layout();
        assert_eq!(c.surface().focused, 0);
    }

    #[tokio::test]
    async fn query_renders_rail_and_fits_height() {
        let mut c = controller(drama_source());
        let load = c.handle(PanelEvent::Open).expect("load spawned");
        load.await.unwrap();

        c.surface_mut().input = "dra".into();
        let outcome = c.query_changed(&BoostSet::new());
        assert_eq!(outcome, Some(RenderOutcome::Fallback));
        let s = c.surface();
        assert!(s.title_visible);
        let drama = s.rail.markup().find("Drama").unwrap();
        let k_drama = s.rail.markup().find("K-drama").unwrap();
        assert!(drama < k_drama);
        assert!(!s.rail.markup().contains("Music"));
        assert_eq!(s.height, 64 + 120);

        c.surface_mut().input = "zzz".into();
        c.handle(PanelEvent::QueryChanged);
        assert!(!c.surface().title_visible);
        assert_eq!(c.surface().height, 64);
    }

    #[tokio::test]
    async fn reopening_does_not_refetch() {
        let mut c = controller(drama_source());
        if let Some(load) = c.open() {
            load.await.unwrap();
        }
        c.close();
        assert!(c.open().is_none());
        assert_eq!(c.loader().fetch_count(), 1);
    }

    #[tokio::test]
    async fn load_failure_leaves_panel_usable() {
        let mut c = controller(Arc::new(FailingSource));
        if let Some(load) = c.open() {
            load.await.unwrap();
        }
        c.surface_mut().input = "dra".into();
        assert_eq!(c.query_changed(&BoostSet::new()), Some(RenderOutcome::Empty));
        assert!(c.surface().rail.markup().is_empty());
        assert!(c.is_open());
    }

    #[test]
    fn query_and_resize_ignored_while_closed() {
        let mut c = controller(drama_source());
        c.surface_mut().input = "dra".into();
        assert_eq!(c.query_changed(&BoostSet::new()), None);
        c.surface_mut().height = 7;
        c.handle(PanelEvent::Resize);
        assert_eq!(c.surface().height, 7);
    }

    #[test]
    fn resize_while_open_refits() {
        let mut c = controller(drama_source());
        c.open();
        c.surface_mut().natural = 300;
        c.handle(PanelEvent::Resize);
        assert_eq!(c.surface().height, 300);
        assert!(c.is_open());
    }
}

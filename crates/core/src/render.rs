//! Suggestion rail rendering.
//!
//! A [`RendererChain`] holds an ordered list of optional render capabilities. On each
//! render it probes them in order and invokes the first one that is present; if none is,
//! the built-in [`FallbackRenderer`] writes one minimal block per item. The chain knows
//! nothing about concrete renderers, only the [`RenderCapability`] interface.
//!
//! Host pages register their own card renderers by name in a [`CapabilityRegistry`];
//! [`RegistryCapability`] looks its name up on every probe, so hooks may come and go.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::types::SuggestionItem;

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// A container that receives rendered markup (the suggestion rail).
pub trait RenderTarget {
    /// Stable identifier of the container, for renderers addressed by id.
    fn id(&self) -> &str;
    fn clear(&mut self);
    fn set_markup(&mut self, markup: String);
    fn markup(&self) -> &str;
}

/// In-memory render target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlBuffer {
    id: String,
    html: String,
}

impl HtmlBuffer {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), html: String::new() }
    }

    pub fn into_markup(self) -> String {
        self.html
    }
}

impl RenderTarget for HtmlBuffer {
    fn id(&self) -> &str {
        &self.id
    }

    fn clear(&mut self) {
        self.html.clear();
    }

    fn set_markup(&mut self, markup: String) {
        self.html = markup;
    }

    fn markup(&self) -> &str {
        &self.html
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// An optional renderer: probe with [`is_present`](Self::is_present), then
/// [`invoke`](Self::invoke).
pub trait RenderCapability: Send + Sync {
    fn name(&self) -> &str;
    fn is_present(&self) -> bool;
    /// Render `items` into `target`. Returns false if the capability vanished between the
    /// probe and the call, in which case the chain moves on.
    fn invoke(&self, target: &mut dyn RenderTarget, items: &[SuggestionItem]) -> bool;
}

/// Object-style renderer exposing a `render` operation.
pub trait CardRenderer: Send + Sync {
    fn render(&self, target: &mut dyn RenderTarget, items: &[SuggestionItem]);
}

type RenderFn = dyn Fn(&mut dyn RenderTarget, &[SuggestionItem]) + Send + Sync;

/// A hook registered in the [`CapabilityRegistry`]: either a plain function or an object.
#[derive(Clone)]
pub enum RenderHook {
    Function(Arc<RenderFn>),
    Object(Arc<dyn CardRenderer>),
}

impl RenderHook {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut dyn RenderTarget, &[SuggestionItem]) + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    pub fn object(renderer: impl CardRenderer + 'static) -> Self {
        Self::Object(Arc::new(renderer))
    }

    fn call(&self, target: &mut dyn RenderTarget, items: &[SuggestionItem]) {
        match self {
            Self::Function(f) => f(target, items),
            Self::Object(o) => o.render(target, items),
        }
    }
}

impl std::fmt::Debug for RenderHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function(_) => f.write_str("RenderHook::Function"),
            Self::Object(_) => f.write_str("RenderHook::Object"),
        }
    }
}

/// Shared namespace of named render hooks.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    hooks: DashMap<String, RenderHook>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a hook under `name`.
    pub fn register(&self, name: impl Into<String>, hook: RenderHook) {
        self.hooks.insert(name.into(), hook);
    }

    pub fn unregister(&self, name: &str) -> Option<RenderHook> {
        self.hooks.remove(name).map(|(_, hook)| hook)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    /// Clone of the hook, so no map guard is held while it runs.
    pub fn get(&self, name: &str) -> Option<RenderHook> {
        self.hooks.get(name).map(|h| h.value().clone())
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

/// Capability backed by a named registry entry, probed on every call.
#[derive(Debug, Clone)]
pub struct RegistryCapability {
    name: String,
    registry: Arc<CapabilityRegistry>,
}

impl RegistryCapability {
    pub fn new(name: impl Into<String>, registry: Arc<CapabilityRegistry>) -> Self {
        Self { name: name.into(), registry }
    }
}

impl RenderCapability for RegistryCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_present(&self) -> bool {
        self.registry.contains(&self.name)
    }

    fn invoke(&self, target: &mut dyn RenderTarget, items: &[SuggestionItem]) -> bool {
        match self.registry.get(&self.name) {
            Some(hook) => {
                hook.call(target, items);
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Built-in renderer: one block per item with the title and, if any, the subtitle.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackRenderer;

impl FallbackRenderer {
    pub fn markup(items: &[SuggestionItem]) -> String {
        let mut out = String::new();
        for item in items {
            out.push_str("<div class=\"search-item\">");
            out.push_str("<div class=\"search-item-title\">");
            out.push_str(&html_escape(&item.title));
            out.push_str("</div>");
            if let Some(sub) = &item.subtitle {
                out.push_str("<div class=\"search-item-subtitle\">");
                out.push_str(&html_escape(sub));
                out.push_str("</div>");
            }
            out.push_str("</div>");
        }
        out
    }
}

impl CardRenderer for FallbackRenderer {
    fn render(&self, target: &mut dyn RenderTarget, items: &[SuggestionItem]) {
        target.set_markup(Self::markup(items));
    }
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// What rendered the rail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// No items: the container was cleared and nothing rendered.
    Empty,
    /// A registered capability, by name.
    Capability(String),
    Fallback,
}

pub struct RendererChain {
    capabilities: Vec<Box<dyn RenderCapability>>,
    fallback: Box<dyn CardRenderer>,
}

impl Default for RendererChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RendererChain {
    pub fn new(capabilities: Vec<Box<dyn RenderCapability>>) -> Self {
        Self { capabilities, fallback: Box::new(FallbackRenderer) }
    }

    /// Chain probing `names` in `registry`, in order.
    pub fn from_registry<S: AsRef<str>>(registry: &Arc<CapabilityRegistry>, names: &[S]) -> Self {
        let capabilities = names
            .iter()
            .map(|n| {
                Box::new(RegistryCapability::new(n.as_ref(), Arc::clone(registry)))
                    as Box<dyn RenderCapability>
            })
            .collect();
        Self::new(capabilities)
    }

    /// Replace the built-in fallback.
    pub fn with_fallback(mut self, fallback: impl CardRenderer + 'static) -> Self {
        self.fallback = Box::new(fallback);
        self
    }

    pub fn capability_names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    /// Clear `target` and render `items` into it.
    pub fn render(&self, target: &mut dyn RenderTarget, items: &[SuggestionItem]) -> RenderOutcome {
        target.clear();
        if items.is_empty() {
            return RenderOutcome::Empty;
        }
        for cap in &self.capabilities {
            if cap.is_present() && cap.invoke(target, items) {
                debug!(capability = cap.name(), items = items.len(), "Rendered suggestion rail");
                return RenderOutcome::Capability(cap.name().to_string());
            }
        }
        self.fallback.render(target, items);
        debug!(items = items.len(), "Rendered suggestion rail with fallback");
        RenderOutcome::Fallback
    }
}

impl std::fmt::Debug for RendererChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererChain").field("capabilities", &self.capability_names()).finish()
    }
}

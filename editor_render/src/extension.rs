//! Extension bundles: everything a plugin can contribute to the pipeline.
//!
//! An [`Extension`] is a plain bag of contributions. The pipeline builder
//! merges the bags in registration order; an extension never talks to
//! another extension directly.

use crate::icons::Icon;
use crate::pipeline::MarkdownEditor;
use duet_md_core::editor::ChangeListener;
use duet_md_core::prefixes::LinePrefix;
use duet_md_core::shortcuts::KeyboardShortcut;
use duet_md_core::tabouts::TabOut;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Where in the pipeline a transformer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStage {
    /// Runs on the markdown source before conversion.
    PreRender,
    /// Runs on the produced HTML after conversion.
    PostRender,
}

/// How a transformer executes. Derived from the function variant, never
/// declared separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    Sync,
    Async,
}

/// A synchronous text-to-text transform.
pub type SyncTransform = Arc<dyn Fn(String) -> String + Send + Sync>;

/// An asynchronous text-to-text transform.
pub type AsyncTransform = Arc<dyn Fn(String) -> BoxFuture<'static, String> + Send + Sync>;

/// The transform function itself, in either execution flavor.
#[derive(Clone)]
pub enum TransformFn {
    Sync(SyncTransform),
    Async(AsyncTransform),
}

/// A content transformer contributed by an extension.
#[derive(Clone)]
pub struct Transformer {
    pub stage: TransformStage,
    pub apply: TransformFn,
}

impl Transformer {
    /// Creates a synchronous transformer.
    pub fn sync<F>(stage: TransformStage, f: F) -> Self
    where
        F: Fn(String) -> String + Send + Sync + 'static,
    {
        Self {
            stage,
            apply: TransformFn::Sync(Arc::new(f)),
        }
    }

    /// Creates an asynchronous transformer.
    pub fn asynchronous<F>(stage: TransformStage, f: F) -> Self
    where
        F: Fn(String) -> BoxFuture<'static, String> + Send + Sync + 'static,
    {
        Self {
            stage,
            apply: TransformFn::Async(Arc::new(f)),
        }
    }

    pub fn execution(&self) -> Execution {
        match self.apply {
            TransformFn::Sync(_) => Execution::Sync,
            TransformFn::Async(_) => Execution::Async,
        }
    }
}

impl fmt::Debug for Transformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("stage", &self.stage)
            .field("execution", &self.execution())
            .finish_non_exhaustive()
    }
}

/// Listener invoked with the produced HTML after a render pass.
pub type RenderListener = Arc<dyn Fn(&str) + Send + Sync>;

/// An event listener contributed by an extension.
///
/// Render-lifecycle listeners are dispatched by the pipeline itself; every
/// other named event is forwarded to the editors the pipeline creates.
#[derive(Clone)]
pub enum Listener {
    /// Fires after a full (async) render completes.
    Render(RenderListener),
    /// Fires after a synchronous first-pass render completes.
    FirstPassRender(RenderListener),
    /// Any other named event, forwarded to created editors.
    Input(String, ChangeListener),
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listener::Render(_) => f.write_str("Listener::Render"),
            Listener::FirstPassRender(_) => f.write_str("Listener::FirstPassRender"),
            Listener::Input(name, _) => write!(f, "Listener::Input({name:?})"),
        }
    }
}

/// A custom language grammar, in sublime-syntax source form.
#[derive(Debug, Clone)]
pub struct GrammarRule {
    /// The fence token the grammar answers to ("rust", "mylang").
    pub language: String,
    /// The grammar definition source.
    pub definition: String,
}

/// A custom highlighting theme, in tmTheme source form.
#[derive(Debug, Clone)]
pub struct HighlightingRule {
    pub name: String,
    pub tm_theme: String,
}

/// An auxiliary UI component slot the host should mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Unique identifier, used by disable lists.
    pub id: String,
}

impl Component {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

/// Hook run once after the pipeline is fully constructed.
pub type LoadHook = Arc<dyn Fn(&mut MarkdownEditor) + Send + Sync>;

/// A bundle of contributions registered with the pipeline builder.
///
/// Construct with struct-update syntax; every field defaults to empty:
///
/// ```
/// use duet_md_render::extension::{Extension, Transformer, TransformStage};
///
/// let ext = Extension {
///     transformers: vec![Transformer::sync(TransformStage::PreRender, |s| {
///         s.replace(":)", "\u{1F642}")
///     })],
///     ..Extension::default()
/// };
/// # let _ = ext;
/// ```
#[derive(Default, Clone)]
pub struct Extension {
    pub shortcuts: Vec<KeyboardShortcut>,
    pub icons: Vec<Icon>,
    pub prefixes: Vec<LinePrefix>,
    pub tab_outs: Vec<TabOut>,
    pub components: Vec<Component>,
    pub transformers: Vec<Transformer>,
    pub listeners: Vec<Listener>,
    pub grammar_rules: Vec<GrammarRule>,
    pub highlighting_rules: Vec<HighlightingRule>,
    pub on_load: Option<LoadHook>,
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("shortcuts", &self.shortcuts.len())
            .field("icons", &self.icons.len())
            .field("prefixes", &self.prefixes.len())
            .field("tab_outs", &self.tab_outs.len())
            .field("components", &self.components.len())
            .field("transformers", &self.transformers.len())
            .field("listeners", &self.listeners.len())
            .field("grammar_rules", &self.grammar_rules.len())
            .field("highlighting_rules", &self.highlighting_rules.len())
            .field("on_load", &self.on_load.is_some())
            .finish()
    }
}

//! Pipeline builder: merges extensions into a configured markdown editor.
//!
//! [`MarkdownEditor`] is the long-lived pipeline object. It owns the merged
//! contribution tables, the markdown conversion options, and the memoized
//! highlighter, and it stamps out [`Editor`] instances wired to the merged
//! configuration. It is cheap to share behind an [`Arc`] and every render
//! entry point takes `&self`.

use crate::error::ConfigError;
use crate::extension::{
    Component, Extension, GrammarRule, HighlightingRule, Listener, LoadHook, RenderListener,
    TransformFn, TransformStage, Transformer,
};
#[cfg(feature = "highlight")]
use crate::highlight::Highlighter;
use crate::icons::{default_icons, Icon};
use crate::scheduler::RenderScheduler;
use duet_md_core::buffer::TextBuffer;
use duet_md_core::caret::{BindingId, CaretBinder, PositionCallback, ViewportMetrics};
use duet_md_core::editor::{ChangeListener, Editor, EditorConfig};
use duet_md_core::history::HistoryOptions;
use duet_md_core::prefixes::{default_prefixes, LinePrefix};
use duet_md_core::selection::Selection;
use duet_md_core::shortcuts::{default_shortcuts, KeyboardShortcut};
use duet_md_core::tabouts::{default_tab_outs, TabOut};
use std::sync::{Arc, Mutex};
use std::time::Duration;
#[cfg(feature = "highlight")]
use tokio::sync::OnceCell;

/// Post-render HTML sanitizer supplied by the host.
pub type Sanitizer = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Which built-in contributions of a category to drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Disable {
    /// Keep every built-in.
    #[default]
    None,
    /// Drop every built-in; extensions still contribute.
    All,
    /// Drop the built-ins with these ids.
    Ids(Vec<String>),
}

impl Disable {
    fn keeps(&self, id: &str) -> bool {
        match self {
            Disable::None => true,
            Disable::All => false,
            Disable::Ids(ids) => !ids.iter().any(|disabled| disabled == id),
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Clone)]
pub struct EditorOptions {
    pub extensions: Vec<Extension>,
    pub history: HistoryOptions,
    /// Idle delay before a scheduled render runs.
    pub renderer_debounce: Duration,
    /// Sanitizer applied to every produced HTML string. `None` means the
    /// host trusts the markdown source.
    pub sanitizer: Option<Sanitizer>,
    /// Enables the GitHub-flavored markdown extensions.
    pub gfm: bool,
    pub disable_shortcuts: Disable,
    pub disable_icons: Disable,
    pub disable_prefixes: Disable,
    pub disable_tab_outs: Disable,
}

impl EditorOptions {
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
            history: HistoryOptions::default(),
            renderer_debounce: Duration::from_millis(300),
            sanitizer: None,
            gfm: true,
            disable_shortcuts: Disable::None,
            disable_icons: Disable::None,
            disable_prefixes: Disable::None,
            disable_tab_outs: Disable::None,
        }
    }
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// The configured pipeline.
pub struct MarkdownEditor {
    shortcuts: Vec<KeyboardShortcut>,
    icons: Vec<Icon>,
    prefixes: Vec<LinePrefix>,
    tab_outs: Vec<TabOut>,
    components: Vec<Component>,
    transformers: Vec<Transformer>,
    #[cfg_attr(not(feature = "highlight"), allow(dead_code))]
    grammar_rules: Vec<GrammarRule>,
    #[cfg_attr(not(feature = "highlight"), allow(dead_code))]
    highlighting_rules: Vec<HighlightingRule>,
    render_listeners: Vec<RenderListener>,
    first_pass_listeners: Vec<RenderListener>,
    input_listeners: Vec<(String, ChangeListener)>,
    sanitizer: Option<Sanitizer>,
    history: HistoryOptions,
    renderer_debounce: Duration,
    comrak_options: comrak::Options,
    #[cfg(feature = "highlight")]
    highlighter: OnceCell<Option<Arc<Highlighter>>>,
    caret: Mutex<CaretBinder>,
}

impl std::fmt::Debug for MarkdownEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownEditor").finish_non_exhaustive()
    }
}

impl MarkdownEditor {
    /// Merges the extensions with the built-in tables and validates the
    /// result. Extension contributions come first in each dispatch table so
    /// an extension can shadow a built-in; built-in icons instead lead the
    /// toolbar so custom buttons append after them.
    pub fn new(options: EditorOptions) -> Result<Self, ConfigError> {
        let EditorOptions {
            extensions,
            history,
            renderer_debounce,
            sanitizer,
            gfm,
            disable_shortcuts,
            disable_icons,
            disable_prefixes,
            disable_tab_outs,
        } = options;

        let mut shortcuts: Vec<KeyboardShortcut> = Vec::new();
        let mut icons: Vec<Icon> = Vec::new();
        let mut prefixes: Vec<LinePrefix> = Vec::new();
        let mut tab_outs: Vec<TabOut> = Vec::new();
        let mut components: Vec<Component> = Vec::new();
        let mut transformers: Vec<Transformer> = Vec::new();
        let mut grammar_rules: Vec<GrammarRule> = Vec::new();
        let mut highlighting_rules: Vec<HighlightingRule> = Vec::new();
        let mut render_listeners: Vec<RenderListener> = Vec::new();
        let mut first_pass_listeners: Vec<RenderListener> = Vec::new();
        let mut input_listeners: Vec<(String, ChangeListener)> = Vec::new();
        let mut load_hooks: Vec<LoadHook> = Vec::new();

        for extension in extensions {
            shortcuts.extend(extension.shortcuts);
            icons.extend(extension.icons);
            prefixes.extend(extension.prefixes);
            tab_outs.extend(extension.tab_outs);
            components.extend(extension.components);
            transformers.extend(extension.transformers);
            grammar_rules.extend(extension.grammar_rules);
            highlighting_rules.extend(extension.highlighting_rules);
            for listener in extension.listeners {
                match listener {
                    Listener::Render(l) => render_listeners.push(l),
                    Listener::FirstPassRender(l) => first_pass_listeners.push(l),
                    Listener::Input(name, l) => input_listeners.push((name, l)),
                }
            }
            if let Some(hook) = extension.on_load {
                load_hooks.push(hook);
            }
        }

        validate_ids("shortcut", shortcuts.iter().map(|s| s.id.as_str()))?;
        validate_ids("icon", icons.iter().map(|i| i.id.as_str()))?;
        validate_ids("prefix", prefixes.iter().map(|p| p.id.as_str()))?;
        validate_ids("tab-out", tab_outs.iter().map(|t| t.id.as_str()))?;
        validate_ids("component", components.iter().map(|c| c.id.as_str()))?;
        for tab_out in &tab_outs {
            if tab_out.delimiter.is_empty() {
                return Err(ConfigError::EmptyDelimiter {
                    id: tab_out.id.clone(),
                });
            }
        }
        for shortcut in &shortcuts {
            if shortcut.combo.key.is_empty() {
                return Err(ConfigError::EmptyKey {
                    id: shortcut.id.clone(),
                });
            }
        }

        shortcuts.extend(
            default_shortcuts()
                .into_iter()
                .filter(|s| disable_shortcuts.keeps(&s.id)),
        );
        prefixes.extend(
            default_prefixes()
                .into_iter()
                .filter(|p| disable_prefixes.keeps(&p.id)),
        );
        tab_outs.extend(
            default_tab_outs()
                .into_iter()
                .filter(|t| disable_tab_outs.keeps(&t.id)),
        );
        let mut toolbar: Vec<Icon> = default_icons()
            .into_iter()
            .filter(|i| disable_icons.keeps(&i.id))
            .collect();
        toolbar.append(&mut icons);

        let mut editor = Self {
            shortcuts,
            icons: toolbar,
            prefixes,
            tab_outs,
            components,
            transformers,
            grammar_rules,
            highlighting_rules,
            render_listeners,
            first_pass_listeners,
            input_listeners,
            sanitizer,
            history,
            renderer_debounce,
            comrak_options: conversion_options(gfm),
            #[cfg(feature = "highlight")]
            highlighter: OnceCell::new(),
            caret: Mutex::new(CaretBinder::new()),
        };

        for hook in load_hooks {
            hook(&mut editor);
        }
        Ok(editor)
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn shortcuts(&self) -> &[KeyboardShortcut] {
        &self.shortcuts
    }

    pub fn prefixes(&self) -> &[LinePrefix] {
        &self.prefixes
    }

    pub fn tab_outs(&self) -> &[TabOut] {
        &self.tab_outs
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn renderer_debounce(&self) -> Duration {
        self.renderer_debounce
    }

    /// Creates an editing engine wired to the merged tables and the
    /// forwarded input listeners.
    pub fn create_editor(&self) -> Editor {
        let mut editor = Editor::with_config(EditorConfig {
            shortcuts: self.shortcuts.clone(),
            prefixes: self.prefixes.clone(),
            tab_outs: self.tab_outs.clone(),
            history: self.history,
        });
        for (name, listener) in &self.input_listeners {
            editor.add_event_listener(name, listener.clone());
        }
        editor
    }

    /// Creates a debounced scheduler for this pipeline's renders.
    pub fn scheduler(&self) -> RenderScheduler {
        RenderScheduler::new(self.renderer_debounce)
    }

    /// Schedules a debounced full render on the given scheduler. `apply`
    /// runs with the produced HTML unless a newer edit supersedes it.
    pub fn schedule_render<A>(
        self: &Arc<Self>,
        scheduler: &RenderScheduler,
        markdown: String,
        apply: A,
    ) where
        A: FnOnce(String) + Send + 'static,
    {
        let pipeline = Arc::clone(self);
        scheduler.schedule(move || async move { pipeline.render(&markdown).await }, apply);
    }

    /// The full render: async transformers included, code blocks
    /// highlighted, output sanitized, render listeners notified.
    pub async fn render(&self, markdown: &str) -> String {
        #[cfg(feature = "highlight")]
        let highlighter = self.highlighter().await;
        #[cfg(feature = "highlight")]
        if let Some(highlighter) = &highlighter {
            for language in highlighter.missing_languages(markdown) {
                log::warn!("no grammar answers to fence language `{language}`");
            }
        }

        let mut text = markdown.to_string();
        for transformer in self.stage(TransformStage::PreRender) {
            text = apply_transform(transformer, text).await;
        }

        let mut html = comrak::markdown_to_html(&text, &self.comrak_options);
        #[cfg(feature = "highlight")]
        if let Some(highlighter) = &highlighter {
            html = highlighter.highlight_html(&html);
        }

        for transformer in self.stage(TransformStage::PostRender) {
            html = apply_transform(transformer, html).await;
        }

        let html = self.sanitize(html);
        for listener in &self.render_listeners {
            listener(&html);
        }
        html
    }

    /// The synchronous first pass: async transformers and highlighting are
    /// skipped so the preview can show something immediately.
    pub fn render_first_pass(&self, markdown: &str) -> String {
        let mut text = markdown.to_string();
        for transformer in self.stage(TransformStage::PreRender) {
            if let TransformFn::Sync(apply) = &transformer.apply {
                text = apply(text);
            }
        }

        let mut html = comrak::markdown_to_html(&text, &self.comrak_options);
        for transformer in self.stage(TransformStage::PostRender) {
            if let TransformFn::Sync(apply) = &transformer.apply {
                html = apply(html);
            }
        }

        let html = self.sanitize(html);
        for listener in &self.first_pass_listeners {
            listener(&html);
        }
        html
    }

    fn stage(&self, stage: TransformStage) -> impl Iterator<Item = &Transformer> {
        self.transformers.iter().filter(move |t| t.stage == stage)
    }

    fn sanitize(&self, html: String) -> String {
        match &self.sanitizer {
            Some(sanitizer) => sanitizer(html),
            None => html,
        }
    }

    /// Builds the highlighter on first use, off the async runtime. A failed
    /// build is memoized too, so the pipeline degrades to unhighlighted
    /// output instead of retrying forever.
    #[cfg(feature = "highlight")]
    async fn highlighter(&self) -> Option<Arc<Highlighter>> {
        self.highlighter
            .get_or_init(|| async {
                let grammar_rules = self.grammar_rules.clone();
                let highlighting_rules = self.highlighting_rules.clone();
                let built = tokio::task::spawn_blocking(move || {
                    Highlighter::new(&grammar_rules, &highlighting_rules)
                })
                .await;
                match built {
                    Ok(highlighter) => Some(Arc::new(highlighter)),
                    Err(err) => {
                        log::warn!("highlighter construction failed: {err}");
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Queues a caret binding. Callbacks start firing once the input
    /// surface attaches.
    pub fn bind_to_caret(&self, callback: PositionCallback) -> BindingId {
        self.caret.lock().unwrap().bind(callback)
    }

    pub fn unbind_from_caret(&self, id: BindingId) {
        self.caret.lock().unwrap().unbind(id);
    }

    /// Marks the input surface as attached and flushes queued bindings.
    pub fn attach_input(&self, metrics: ViewportMetrics) {
        self.caret.lock().unwrap().attach(metrics);
    }

    pub fn set_viewport_metrics(&self, metrics: ViewportMetrics) {
        self.caret.lock().unwrap().set_metrics(metrics);
    }

    pub fn input_attached(&self) -> bool {
        self.caret.lock().unwrap().is_attached()
    }

    /// Repositions every caret binding from the current selection.
    pub fn update_caret(&self, buffer: &TextBuffer, selection: Selection) {
        self.caret.lock().unwrap().update(buffer, selection);
    }
}

fn validate_ids<'a>(
    category: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen: Vec<&str> = Vec::new();
    for id in ids {
        if id.is_empty() {
            return Err(ConfigError::EmptyId { category });
        }
        if seen.contains(&id) {
            return Err(ConfigError::DuplicateId {
                category,
                id: id.to_string(),
            });
        }
        seen.push(id);
    }
    Ok(())
}

async fn apply_transform(transformer: &Transformer, input: String) -> String {
    match &transformer.apply {
        TransformFn::Sync(apply) => apply(input),
        TransformFn::Async(apply) => apply(input).await,
    }
}

fn conversion_options(gfm: bool) -> comrak::Options {
    let mut options = comrak::Options::default();
    if gfm {
        options.extension.strikethrough = true;
        options.extension.table = true;
        options.extension.tasklist = true;
        options.extension.autolink = true;
    }
    // Raw HTML passes through; the sanitizer is the trust boundary.
    options.render.unsafe_ = true;
    options
}

//! Fenced code block highlighting with syntect.
//!
//! The highlighter is built once from the merged grammar and theme rules
//! and then rewrites `<pre><code class="language-..">` blocks in the HTML
//! produced by the markdown conversion. A bad rule degrades to a warning;
//! an unknown fence language leaves the block untouched.

use crate::extension::{GrammarRule, HighlightingRule};
use std::io::Cursor;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::syntax_definition::SyntaxDefinition;
use syntect::parsing::SyntaxSet;

const DEFAULT_THEME: &str = "InspiredGitHub";

/// Compiled grammars and themes for fenced code blocks.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme: String,
}

impl Highlighter {
    /// Compiles the bundled languages plus the custom rules. Rules that
    /// fail to parse are skipped with a warning; the last theme rule that
    /// loads becomes the active theme.
    pub fn new(grammar_rules: &[GrammarRule], highlighting_rules: &[HighlightingRule]) -> Self {
        let syntax_set = if grammar_rules.is_empty() {
            SyntaxSet::load_defaults_newlines()
        } else {
            let mut builder = SyntaxSet::load_defaults_newlines().into_builder();
            for rule in grammar_rules {
                match SyntaxDefinition::load_from_str(&rule.definition, true, Some(&rule.language))
                {
                    Ok(definition) => builder.add(definition),
                    Err(err) => log::warn!("skipping grammar rule `{}`: {err}", rule.language),
                }
            }
            builder.build()
        };

        let mut theme_set = ThemeSet::load_defaults();
        let mut theme = DEFAULT_THEME.to_string();
        for rule in highlighting_rules {
            let mut reader = Cursor::new(rule.tm_theme.as_bytes());
            match ThemeSet::load_from_reader(&mut reader) {
                Ok(loaded) => {
                    theme_set.themes.insert(rule.name.clone(), loaded);
                    theme = rule.name.clone();
                }
                Err(err) => log::warn!("skipping highlighting rule `{}`: {err}", rule.name),
            }
        }

        Self {
            syntax_set,
            theme_set,
            theme,
        }
    }

    /// Name of the active theme.
    pub fn theme(&self) -> &str {
        &self.theme
    }

    /// Scans the markdown for fence languages no grammar answers to.
    /// Returns each unknown language once, in order of first appearance.
    pub fn missing_languages(&self, markdown: &str) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        let mut in_fence = false;
        for line in markdown.lines() {
            let trimmed = line.trim_start();
            if !trimmed.starts_with("```") {
                continue;
            }
            if in_fence {
                in_fence = false;
                continue;
            }
            in_fence = true;
            let token = trimmed.trim_start_matches('`').trim();
            if token.is_empty() {
                continue;
            }
            if self.syntax_set.find_syntax_by_token(token).is_none()
                && !missing.iter().any(|m| m == token)
            {
                missing.push(token.to_string());
            }
        }
        missing
    }

    /// Rewrites every fenced code block in the HTML whose language has a
    /// grammar. Blocks with unknown languages, and blocks that fail to
    /// highlight, pass through unchanged.
    pub fn highlight_html(&self, html: &str) -> String {
        const OPEN: &str = "<pre><code class=\"language-";
        const CLOSE: &str = "</code></pre>";

        let mut output = String::with_capacity(html.len());
        let mut rest = html;
        while let Some(start) = rest.find(OPEN) {
            let after_open = &rest[start + OPEN.len()..];
            let Some(lang_end) = after_open.find('"') else {
                break;
            };
            let language = &after_open[..lang_end];
            let Some(tag_end) = after_open[lang_end..].find('>') else {
                break;
            };
            let body = &after_open[lang_end + tag_end + 1..];
            let Some(body_end) = body.find(CLOSE) else {
                break;
            };
            let block_len =
                start + OPEN.len() + lang_end + tag_end + 1 + body_end + CLOSE.len();

            output.push_str(&rest[..start]);
            match self.highlight_block(language, &body[..body_end]) {
                Some(highlighted) => output.push_str(&highlighted),
                None => output.push_str(&rest[start..block_len]),
            }
            rest = &rest[block_len..];
        }
        output.push_str(rest);
        output
    }

    fn highlight_block(&self, language: &str, escaped_code: &str) -> Option<String> {
        let syntax = self.syntax_set.find_syntax_by_token(language)?;
        let theme = self.theme_set.themes.get(&self.theme)?;
        let code = unescape_entities(escaped_code);
        match highlighted_html_for_string(&code, &self.syntax_set, syntax, theme) {
            Ok(highlighted) => Some(highlighted),
            Err(err) => {
                log::warn!("highlighting `{language}` block failed: {err}");
                None
            }
        }
    }
}

/// Reverses the entity escaping the markdown converter applies inside
/// code blocks. `&amp;` goes last so double-escaped input stays stable.
fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

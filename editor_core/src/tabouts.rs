//! Tab-out rules: closing delimiters the caret can tab past.

/// A registered closing delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabOut {
    /// Unique identifier, used by disable lists.
    pub id: String,
    /// The literal delimiter sitting after the caret.
    pub delimiter: String,
}

impl TabOut {
    pub fn new(id: &str, delimiter: &str) -> Self {
        Self {
            id: id.to_string(),
            delimiter: delimiter.to_string(),
        }
    }
}

/// The built-in tab-out table.
pub fn default_tab_outs() -> Vec<TabOut> {
    vec![
        TabOut::new("paren", ")"),
        TabOut::new("bracket", "]"),
        TabOut::new("brace", "}"),
        TabOut::new("double-quote", "\""),
        TabOut::new("single-quote", "'"),
        TabOut::new("backtick", "`"),
        TabOut::new("bold", "**"),
        TabOut::new("italic", "*"),
        TabOut::new("strikethrough", "~~"),
        TabOut::new("math", "$"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ids_are_unique() {
        let tab_outs = default_tab_outs();
        let mut ids: Vec<_> = tab_outs.iter().map(|t| t.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), tab_outs.len());
    }
}

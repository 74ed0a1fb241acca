use crate::engine::Directive;
use std::fmt;

/// Prefix rewrite rule for paths embedded in debug information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMapRule {
    pub from: String,
    pub to: String,
}

impl SourceMapRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for SourceMapRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Local model of the engine's `target.source-map` list. Rules are evaluated in order,
/// the first matching prefix wins.
#[derive(Debug, Default, Clone)]
pub struct SourceMap {
    rules: Vec<SourceMapRule>,
}

impl SourceMap {
    pub fn new(rules: Vec<SourceMapRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[SourceMapRule] {
        &self.rules
    }

    /// Insert a rule before position `index`, an index past the end appends.
    pub fn insert_before(&mut self, index: usize, rule: SourceMapRule) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
    }

    pub fn append(&mut self, rule: SourceMapRule) {
        self.rules.push(rule);
    }

    /// Apply a source-map directive, return false for directives of other kinds.
    pub fn apply(&mut self, directive: &Directive) -> bool {
        match directive {
            Directive::SourceMapInsertBefore { index, rule } => {
                self.insert_before(*index, rule.clone());
                true
            }
            Directive::SourceMapAppend(rule) => {
                self.append(rule.clone());
                true
            }
            _ => false,
        }
    }

    /// Rewrite a path with the first matching rule, [`None`] if no rule matches.
    pub fn remap(&self, path: &str) -> Option<String> {
        let normalized = Self::norm_path(path);
        self.rules.iter().find_map(|rule| {
            let from = Self::norm_prefix(&rule.from);
            normalized
                .strip_prefix(from.as_str())
                .map(|suffix| Self::join_with_style(&rule.to, suffix))
        })
    }

    fn join_with_style(prefix: &str, suffix_norm: &str) -> String {
        if suffix_norm.is_empty() {
            return prefix.to_string();
        }
        let mut out = prefix.to_string();

        // Avoid double separators.
        let need_sep = !out.ends_with('/') && !out.ends_with('\\');
        if need_sep {
            out.push(if out.contains('\\') { '\\' } else { '/' });
        }

        if out.contains('\\') {
            out.push_str(&suffix_norm.replace('/', "\\"));
        } else {
            out.push_str(suffix_norm);
        }
        out
    }

    fn norm_prefix(s: &str) -> String {
        let mut out = Self::norm_path(s);
        if !out.ends_with('/') {
            out.push('/');
        }
        out
    }

    fn norm_path(s: &str) -> String {
        s.replace('\\', "/")
    }
}

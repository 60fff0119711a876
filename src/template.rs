//! Route template compilation and matching.
//!
//! This module provides [`CompiledTemplate`], the compiled form of one
//! brace-delimited URL template. Compilation extracts named variables,
//! assembles an anchored regular expression for matching, builds a reverse
//! template for URL construction, and compiles per-variable validators
//! used to report precise reverse-build errors.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as _;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use crate::error::{PatternError, PatternResult};

/// Which URL component a template applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Matches the URL host; a bare `{name}` defaults to `[^.]+`.
    Host,
    /// Matches the full URL path; a bare `{name}` defaults to `[^/]+`.
    Path,
    /// Matches a prefix of the URL path; the compiled regex is not
    /// right-anchored.
    PathPrefix,
    /// Matches a single `key=value` query parameter; a bare `{name}`
    /// defaults to `[^?&]*`.
    Query,
}

impl TemplateKind {
    /// Returns the pattern a bare `{name}` variable expands to.
    const fn default_pattern(self) -> &'static str {
        match self {
            Self::Host => "[^.]+",
            Self::Path | Self::PathPrefix => "[^/]+",
            Self::Query => "[^?&]*",
        }
    }
}

/// The compiled, immutable form of one URL template.
///
/// A `CompiledTemplate` stores the anchored regex used for matching, the
/// reverse template used to rebuild a URL fragment from variable values,
/// the ordered variable names, and one fully-anchored validator regex per
/// variable. Instances are created by [`compile`](Self::compile) and never
/// mutated, so they can be shared freely across threads.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use urlpattern::{CompiledTemplate, TemplateKind};
///
/// let tpl = CompiledTemplate::compile(
///     "/articles/{category}/{id:[0-9]+}",
///     TemplateKind::Path,
///     false,
///     false,
/// )
/// .unwrap();
///
/// let url = Url::parse("http://example.com/articles/tech/42").unwrap();
/// assert!(tpl.matches(&url));
/// assert_eq!(tpl.var_names(), ["category", "id"]);
/// ```
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    /// The unmodified template string.
    template: String,
    /// The URL component this template applies to.
    kind: TemplateKind,
    /// The effective strict-slash flag (gated off for every kind but
    /// [`TemplateKind::Path`]).
    strict_slash: bool,
    /// Whether path matching uses the percent-encoded path form.
    use_encoded_path: bool,
    /// The expanded, anchored regex.
    regex: Regex,
    /// Reverse template as literal chunks; variable values are interleaved
    /// between them, so `reverse.len() == var_names.len() + 1`.
    reverse: Vec<String>,
    /// Variable names, in declaration order.
    var_names: Vec<String>,
    /// Fully-anchored per-variable validators, parallel to `var_names`.
    var_validators: Vec<Regex>,
}

impl CompiledTemplate {
    /// Compiles a route template for the given URL component.
    ///
    /// `strict_slash` makes a trailing slash on a [`TemplateKind::Path`]
    /// template optional at match time while restoring it on reverse
    /// builds; it is ignored for every other kind. `use_encoded_path`
    /// matches against the percent-encoded path form instead of the
    /// decoded one.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::MalformedTemplate`] for unbalanced braces,
    /// an empty variable name or pattern, or a query template that is not
    /// a `key=value` pair; [`PatternError::InvalidPattern`] when a regex
    /// fails to compile; and [`PatternError::CapturingGroup`] when a
    /// variable's pattern contains its own capturing group.
    pub fn compile(
        template: &str,
        kind: TemplateKind,
        strict_slash: bool,
        use_encoded_path: bool,
    ) -> PatternResult<Self> {
        let spans = brace_spans(template)?;
        if kind == TemplateKind::Query && !template.contains('=') {
            return Err(PatternError::MalformedTemplate(format!(
                "query template must be a key=value pair, got {template:?}"
            )));
        }
        let default_pattern = kind.default_pattern();
        // Only a plain path template can be strict about its trailing slash.
        let strict_slash = strict_slash && kind == TemplateKind::Path;
        let mut tpl = template;
        let mut end_slash = false;
        if strict_slash && tpl.ends_with('/') {
            tpl = &tpl[..tpl.len() - 1];
            end_slash = true;
        }

        let mut pattern = String::from("^");
        let mut reverse = Vec::with_capacity(spans.len() + 1);
        let mut var_names = Vec::with_capacity(spans.len());
        let mut var_validators = Vec::with_capacity(spans.len());
        let mut end = 0;
        for (i, &(start, stop)) in spans.iter().enumerate() {
            let raw = &tpl[end..start];
            end = stop;
            let inner = &tpl[start + 1..stop - 1];
            let (name, patt) = match inner.split_once(':') {
                Some((name, patt)) => (name, patt),
                None => (inner, default_pattern),
            };
            if name.is_empty() || patt.is_empty() {
                return Err(PatternError::MalformedTemplate(format!(
                    "missing name or pattern in {:?}",
                    &tpl[start..stop]
                )));
            }
            write!(
                pattern,
                "{}(?P<{}>{})",
                regex::escape(raw),
                var_group_name(i),
                patt
            )
            .ok();
            reverse.push(raw.to_owned());
            var_names.push(name.to_owned());
            let validator =
                Regex::new(&format!("^{patt}$")).map_err(|source| PatternError::InvalidPattern {
                    template: template.to_owned(),
                    source,
                })?;
            var_validators.push(validator);
        }
        let raw = &tpl[end..];
        pattern.push_str(&regex::escape(raw));
        if strict_slash {
            pattern.push_str("[/]?");
        }
        if kind == TemplateKind::Query {
            // An empty value side accepts any value as long as the key is
            // present.
            let value_empty = template
                .split_once('=')
                .is_some_and(|(_, value)| value.is_empty());
            if value_empty {
                pattern.push_str(default_pattern);
            }
        }
        if kind != TemplateKind::PathPrefix {
            pattern.push('$');
        }
        let mut last = raw.to_owned();
        if end_slash {
            last.push('/');
        }
        reverse.push(last);

        let regex = Regex::new(&pattern).map_err(|source| PatternError::InvalidPattern {
            template: template.to_owned(),
            source,
        })?;
        // A count mismatch means a variable pattern smuggled in its own
        // capturing group; extraction indexes would be off by one or more.
        if regex.captures_len() - 1 != var_names.len() {
            return Err(PatternError::CapturingGroup {
                template: template.to_owned(),
            });
        }
        tracing::trace!(template, pattern = %pattern, "compiled route template");

        Ok(Self {
            template: template.to_owned(),
            kind,
            strict_slash,
            use_encoded_path,
            regex,
            reverse,
            var_names,
            var_validators,
        })
    }

    /// Returns the original template string.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the URL component this template applies to.
    pub const fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Returns the declared variable names, in order.
    pub fn var_names(&self) -> &[String] {
        &self.var_names
    }

    /// Returns the compiled matching regex.
    pub const fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Tests this template against the relevant component of `url`.
    ///
    /// Host templates match the URL host (port-free), path templates match
    /// the decoded path (or the percent-encoded form when the template was
    /// compiled with `use_encoded_path`), and query templates match the
    /// single `key=value` parameter named by the template's key.
    pub fn matches(&self, url: &Url) -> bool {
        self.regex.is_match(&self.match_input(url))
    }

    /// Builds a URL fragment from variable values.
    ///
    /// Values are substituted into the reverse template in declaration
    /// order. The result is validated against the full matching regex; on
    /// mismatch each value is re-checked against its own validator so the
    /// error can name the first offending value and its expected pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::MissingVariable`] when `values` lacks a
    /// declared variable, and [`PatternError::VariableMismatch`] when a
    /// value fails its variable's pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use urlpattern::{CompiledTemplate, TemplateKind};
    ///
    /// let tpl = CompiledTemplate::compile(
    ///     "/articles/{id:[0-9]+}",
    ///     TemplateKind::Path,
    ///     false,
    ///     false,
    /// )
    /// .unwrap();
    ///
    /// let mut values = HashMap::new();
    /// values.insert("id".to_string(), "42".to_string());
    /// assert_eq!(tpl.build(&values).unwrap(), "/articles/42");
    /// ```
    pub fn build(&self, values: &HashMap<String, String>) -> PatternResult<String> {
        let mut out = String::with_capacity(self.template.len());
        for (i, chunk) in self.reverse.iter().enumerate() {
            out.push_str(chunk);
            if let Some(name) = self.var_names.get(i) {
                let value = values
                    .get(name)
                    .ok_or_else(|| PatternError::MissingVariable(name.clone()))?;
                out.push_str(value);
            }
        }
        // The candidate is checked against the full regexp instead of
        // validating each variable; the per-variable pass below only runs
        // to produce an actionable error message.
        if !self.regex.is_match(&out) {
            for (name, validator) in self.var_names.iter().zip(&self.var_validators) {
                let value = &values[name];
                if !validator.is_match(value) {
                    return Err(PatternError::VariableMismatch {
                        value: value.clone(),
                        pattern: validator.as_str().to_owned(),
                    });
                }
            }
        }
        Ok(out)
    }

    /// Copies each matched variable into `vars`, keyed by its declared
    /// name. A non-matching input contributes no entries. When a name is
    /// declared more than once in the template, the last occurrence wins.
    pub(crate) fn extract_into(&self, url: &Url, vars: &mut HashMap<String, String>) {
        let input = self.match_input(url);
        if let Some(caps) = self.regex.captures(&input) {
            for (i, name) in self.var_names.iter().enumerate() {
                if let Some(found) = caps.get(i + 1) {
                    vars.insert(name.clone(), found.as_str().to_owned());
                }
            }
        }
    }

    /// Returns the URL component this template inspects.
    fn match_input<'u>(&self, url: &'u Url) -> Cow<'u, str> {
        match self.kind {
            TemplateKind::Host => Cow::Borrowed(host_of(url)),
            TemplateKind::Path | TemplateKind::PathPrefix => {
                if self.use_encoded_path {
                    Cow::Borrowed(url.path())
                } else {
                    percent_decode_str(url.path()).decode_utf8_lossy()
                }
            }
            TemplateKind::Query => Cow::Owned(self.query_input(url).unwrap_or_default()),
        }
    }

    /// Returns the `key=value` string for this template's query key, using
    /// the first value if the key repeats, or `None` when the key is
    /// absent.
    fn query_input(&self, url: &Url) -> Option<String> {
        let key = self
            .template
            .split_once('=')
            .map_or(self.template.as_str(), |(key, _)| key);
        url.query_pairs()
            .find(|(k, _)| *k == key)
            .map(|(k, v)| format!("{k}={v}"))
    }
}

/// Returns the URL host. `Url::host_str` already excludes any port.
fn host_of(url: &Url) -> &str {
    url.host_str().unwrap_or("")
}

/// Builds the synthetic capture-group label for the indexed variable.
///
/// Labels are internal to the compiled regex; extraction maps positions
/// back to user-facing names. They also keep the regex valid when a user
/// declares the same name twice, since the engine rejects duplicate group
/// names.
fn var_group_name(idx: usize) -> String {
    format!("v{idx}")
}

/// Returns the byte ranges of the top-level `{...}` spans in `s`.
///
/// Nested braces inside a variable's pattern (e.g. `{id:[0-9]{3}}`) are
/// part of the enclosing span.
fn brace_spans(s: &str) -> PatternResult<Vec<(usize, usize)>> {
    let mut level = 0usize;
    let mut start = 0;
    let mut spans = Vec::new();
    for (i, byte) in s.bytes().enumerate() {
        match byte {
            b'{' => {
                level += 1;
                if level == 1 {
                    start = i;
                }
            }
            b'}' => {
                if level == 0 {
                    return Err(unbalanced(s));
                }
                level -= 1;
                if level == 0 {
                    spans.push((start, i + 1));
                }
            }
            _ => {}
        }
    }
    if level != 0 {
        return Err(unbalanced(s));
    }
    Ok(spans)
}

fn unbalanced(template: &str) -> PatternError {
    PatternError::MalformedTemplate(format!("unbalanced braces in {template:?}"))
}

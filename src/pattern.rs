//! Pattern construction and one-shot URL matching.
//!
//! This module provides [`Pattern`], a chainable builder that combines
//! host, path, path-prefix, and query matchers into one unit and matches
//! them against a URL in a single call.

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use crate::error::{PatternError, PatternResult};
use crate::group::MatcherGroup;
use crate::template::{CompiledTemplate, TemplateKind};

/// A compiled set of URL matchers built from route templates.
///
/// A `Pattern` is built by chaining [`host`](Self::host),
/// [`path`](Self::path), [`path_prefix`](Self::path_prefix), and
/// [`queries`](Self::queries) calls; each call moves the builder through
/// by value, so construction is single-owner by type. The first failing
/// call parks its error on the pattern: every later build call is a no-op
/// preserving that error, and [`match_url`](Self::match_url) reports no
/// match. Once built, a `Pattern` is immutable and safe to share across
/// threads.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use urlpattern::Pattern;
///
/// let pattern = Pattern::new()
///     .host("{subdomain}.example.com")
///     .path_prefix("/api")
///     .path("/events/{id:[0-9]+}");
///
/// let url = Url::parse("http://foo.example.com/api/events/12345").unwrap();
/// let vars = pattern.match_url(&url).unwrap();
/// assert_eq!(vars.get("subdomain").unwrap(), "foo");
/// assert_eq!(vars.get("id").unwrap(), "12345");
/// ```
#[derive(Debug)]
pub struct Pattern {
    strict_slash: bool,
    use_encoded_path: bool,
    group: MatcherGroup,
    /// Every matcher added so far, in add order; `match_url` runs them in
    /// this order.
    matchers: Vec<Arc<CompiledTemplate>>,
    /// The first build error, if any. Sticky: never cleared.
    err: Option<PatternError>,
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new()
    }
}

impl Pattern {
    /// Creates a pattern with the default options: strict slash enabled,
    /// encoded-path matching disabled.
    pub fn new() -> Self {
        Self::with_options(true, false)
    }

    /// Creates a pattern with explicit options.
    ///
    /// `strict_slash` makes a trailing slash on a [`path`](Self::path)
    /// template optional at match time; `use_encoded_path` matches path
    /// templates against the percent-encoded path form instead of the
    /// decoded one. Both apply to every matcher added afterwards.
    pub fn with_options(strict_slash: bool, use_encoded_path: bool) -> Self {
        Self {
            strict_slash,
            use_encoded_path,
            group: MatcherGroup::default(),
            matchers: Vec::new(),
            err: None,
        }
    }

    /// Adds a matcher for the URL host.
    ///
    /// The template may contain variables enclosed by `{}`: `{name}`
    /// matches anything until the next dot, `{name:pattern}` matches the
    /// given regexp pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use urlpattern::Pattern;
    ///
    /// let pattern = Pattern::new().host("{subdomain:[a-z]+}.example.com");
    /// let url = Url::parse("http://foo.example.com/").unwrap();
    /// assert_eq!(pattern.match_url(&url).unwrap().get("subdomain").unwrap(), "foo");
    /// ```
    pub fn host(self, template: &str) -> Self {
        self.add_matcher(template, TemplateKind::Host)
    }

    /// Adds a matcher for the URL path. The template must start with `/`.
    ///
    /// `{name}` matches anything until the next slash; `{name:pattern}`
    /// matches the given regexp pattern. If a path or path-prefix matcher
    /// was added before, the new template is appended to it (trailing
    /// slashes on the existing template are trimmed first), which is how
    /// subrouters build paths incrementally.
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use urlpattern::Pattern;
    ///
    /// let pattern = Pattern::new().path("/articles/{category}/{id:[0-9]+}");
    /// let url = Url::parse("http://example.com/articles/tech/42").unwrap();
    /// let vars = pattern.match_url(&url).unwrap();
    /// assert_eq!(vars.get("category").unwrap(), "tech");
    /// assert_eq!(vars.get("id").unwrap(), "42");
    /// ```
    pub fn path(self, template: &str) -> Self {
        self.add_matcher(template, TemplateKind::Path)
    }

    /// Adds a matcher for the URL path prefix. This matches if the
    /// template is a prefix of the full URL path.
    ///
    /// Slashes are not treated specially (`/foobar/` is matched by the
    /// prefix `/foo`), so a trailing slash is usually wanted. Strict-slash
    /// handling never applies to prefix matchers.
    pub fn path_prefix(self, template: &str) -> Self {
        self.add_matcher(template, TemplateKind::PathPrefix)
    }

    /// Adds matchers for URL query values from alternating key/value
    /// template pairs.
    ///
    /// Each pair only matches URLs whose query string carries that key
    /// with a matching value; an empty value template matches any value
    /// as long as the key is present. An odd number of strings is a
    /// build error.
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use urlpattern::Pattern;
    ///
    /// let pattern = Pattern::new().queries(&["foo", "bar", "id", "{id:[0-9]+}"]);
    /// let url = Url::parse("http://example.com/?foo=bar&id=42").unwrap();
    /// assert_eq!(pattern.match_url(&url).unwrap().get("id").unwrap(), "42");
    /// ```
    pub fn queries(mut self, pairs: &[&str]) -> Self {
        if self.err.is_some() {
            return self;
        }
        if pairs.len() % 2 != 0 {
            self.err = Some(PatternError::MalformedTemplate(format!(
                "number of query parameters must be a multiple of 2, got {}",
                pairs.len()
            )));
            return self;
        }
        for pair in pairs.chunks(2) {
            let template = format!("{}={}", pair[0], pair[1]);
            self = self.add_matcher(&template, TemplateKind::Query);
            if self.err.is_some() {
                return self;
            }
        }
        self
    }

    /// Returns the first error encountered while building, if any.
    pub fn error(&self) -> Option<&PatternError> {
        self.err.as_ref()
    }

    /// Matches the pattern against `url`.
    ///
    /// Every matcher runs in the order it was added, short-circuiting on
    /// the first failure. On success the extracted variables of all
    /// matchers are returned as one map. A pattern carrying a build error
    /// never matches.
    pub fn match_url(&self, url: &Url) -> Option<HashMap<String, String>> {
        if self.err.is_some() {
            return None;
        }
        if self.matchers.iter().all(|matcher| matcher.matches(url)) {
            Some(self.group.extract(url))
        } else {
            None
        }
    }

    /// Builds the host component from variable values using the host
    /// template's reverse form.
    ///
    /// # Errors
    ///
    /// Returns the pattern's sticky build error if there is one,
    /// [`PatternError::MissingTemplate`] if no host template was added,
    /// and the reverse-build errors of
    /// [`CompiledTemplate::build`](crate::CompiledTemplate::build)
    /// otherwise.
    pub fn url_host(&self, values: &HashMap<String, String>) -> PatternResult<String> {
        self.component_url(self.group.host(), "host", values)
    }

    /// Builds the path component from variable values using the path
    /// template's reverse form.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use urlpattern::Pattern;
    ///
    /// let pattern = Pattern::new().path("/articles/{id:[0-9]+}");
    /// let mut values = HashMap::new();
    /// values.insert("id".to_string(), "42".to_string());
    /// assert_eq!(pattern.url_path(&values).unwrap(), "/articles/42");
    /// ```
    pub fn url_path(&self, values: &HashMap<String, String>) -> PatternResult<String> {
        self.component_url(self.group.path(), "path", values)
    }

    fn component_url(
        &self,
        matcher: Option<&Arc<CompiledTemplate>>,
        which: &'static str,
        values: &HashMap<String, String>,
    ) -> PatternResult<String> {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }
        matcher
            .ok_or(PatternError::MissingTemplate(which))?
            .build(values)
    }

    /// Compiles one template and registers it, parking any failure as the
    /// sticky error.
    fn add_matcher(mut self, template: &str, kind: TemplateKind) -> Self {
        if self.err.is_some() {
            return self;
        }
        if let Err(err) = self.try_add(template, kind) {
            tracing::debug!(template, error = %err, "rejected route template");
            self.err = Some(err);
        }
        self
    }

    fn try_add(&mut self, template: &str, kind: TemplateKind) -> PatternResult<()> {
        let template = if matches!(kind, TemplateKind::Path | TemplateKind::PathPrefix) {
            if !template.is_empty() && !template.starts_with('/') {
                return Err(PatternError::MalformedTemplate(format!(
                    "path template must start with a slash, got {template:?}"
                )));
            }
            match self.group.path() {
                Some(existing) => {
                    format!("{}{template}", existing.template().trim_end_matches('/'))
                }
                None => template.to_owned(),
            }
        } else {
            template.to_owned()
        };
        let matcher = Arc::new(CompiledTemplate::compile(
            &template,
            kind,
            self.strict_slash,
            self.use_encoded_path,
        )?);
        self.group.insert(Arc::clone(&matcher))?;
        self.matchers.push(matcher);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_must_start_with_slash() {
        let pattern = Pattern::new().path("articles/{id}");
        assert!(matches!(
            pattern.error(),
            Some(PatternError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn test_odd_query_pairs() {
        let pattern = Pattern::new().queries(&["foo", "bar", "baz"]);
        assert!(matches!(
            pattern.error(),
            Some(PatternError::MalformedTemplate(_))
        ));
    }

    #[test]
    fn test_error_is_sticky() {
        let pattern = Pattern::new()
            .path("no-slash")
            .path("/valid/{id}")
            .queries(&["x", "{y}"]);
        // The original slash error survives the later, valid calls.
        assert!(matches!(
            pattern.error(),
            Some(PatternError::MalformedTemplate(msg)) if msg.contains("no-slash")
        ));
        let url = Url::parse("http://example.com/valid/1?x=2").unwrap();
        assert!(pattern.match_url(&url).is_none());
    }

    #[test]
    fn test_queries_abort_on_first_failure() {
        let pattern = Pattern::new().queries(&["a", "{v:[}", "b", "{v2}"]);
        assert!(matches!(
            pattern.error(),
            Some(PatternError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_path_concatenation_after_prefix() {
        let pattern = Pattern::new()
            .path_prefix("/api/")
            .path("/events/{id:[0-9]+}");
        assert!(pattern.error().is_none());
        // The path template was appended to the trimmed prefix template.
        let url = Url::parse("http://example.com/api/events/7").unwrap();
        assert_eq!(pattern.match_url(&url).unwrap().get("id").unwrap(), "7");

        let mut values = HashMap::new();
        values.insert("id".to_string(), "7".to_string());
        assert_eq!(pattern.url_path(&values).unwrap(), "/api/events/7");
    }

    #[test]
    fn test_strict_slash_default() {
        let pattern = Pattern::new().path("/products/");
        assert!(pattern
            .match_url(&Url::parse("http://example.com/products").unwrap())
            .is_some());
        assert!(pattern
            .match_url(&Url::parse("http://example.com/products/").unwrap())
            .is_some());
    }

    #[test]
    fn test_strict_slash_disabled() {
        let pattern = Pattern::with_options(false, false).path("/products/");
        assert!(pattern
            .match_url(&Url::parse("http://example.com/products").unwrap())
            .is_none());
        assert!(pattern
            .match_url(&Url::parse("http://example.com/products/").unwrap())
            .is_some());
    }

    #[test]
    fn test_url_host_and_path() {
        let pattern = Pattern::new()
            .host("{sub}.example.com")
            .path("/users/{name}");
        let mut values = HashMap::new();
        values.insert("sub".to_string(), "api".to_string());
        values.insert("name".to_string(), "alice".to_string());
        assert_eq!(pattern.url_host(&values).unwrap(), "api.example.com");
        assert_eq!(pattern.url_path(&values).unwrap(), "/users/alice");
    }

    #[test]
    fn test_url_path_without_path_template() {
        let pattern = Pattern::new().host("example.com");
        let err = pattern.url_path(&HashMap::new()).unwrap_err();
        assert!(matches!(err, PatternError::MissingTemplate("path")));
    }

    #[test]
    fn test_url_path_on_errored_pattern() {
        let pattern = Pattern::new().path("no-slash");
        let err = pattern.url_path(&HashMap::new()).unwrap_err();
        assert!(matches!(err, PatternError::MalformedTemplate(_)));
    }

    #[test]
    fn test_match_order_short_circuits() {
        let pattern = Pattern::new().host("example.com").path("/a");
        // Host fails first; path is never consulted.
        let url = Url::parse("http://other.com/a").unwrap();
        assert!(pattern.match_url(&url).is_none());
    }

    #[test]
    fn test_default_is_new() {
        let pattern = Pattern::default().path("/x/{v}");
        let url = Url::parse("http://example.com/x/1").unwrap();
        assert!(pattern.match_url(&url).is_some());
    }
}

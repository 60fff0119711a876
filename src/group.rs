//! Aggregation of the host, path, and query matchers attached to one
//! pattern.
//!
//! [`MatcherGroup`] owns the matchers that carry variables: at most one
//! host matcher, at most one path matcher, and any number of query
//! matchers. It enforces variable-name uniqueness at insertion time and
//! extracts the union of all matched variables once every matcher has
//! accepted a URL.

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use crate::error::{PatternError, PatternResult};
use crate::template::{CompiledTemplate, TemplateKind};

/// The variable-carrying matchers of one pattern, grouped by URL
/// component.
#[derive(Debug, Default)]
pub(crate) struct MatcherGroup {
    host: Option<Arc<CompiledTemplate>>,
    path: Option<Arc<CompiledTemplate>>,
    queries: Vec<Arc<CompiledTemplate>>,
}

impl MatcherGroup {
    /// Returns the host matcher, if one was added.
    pub(crate) fn host(&self) -> Option<&Arc<CompiledTemplate>> {
        self.host.as_ref()
    }

    /// Returns the path matcher, if one was added.
    pub(crate) fn path(&self) -> Option<&Arc<CompiledTemplate>> {
        self.path.as_ref()
    }

    /// Stores `matcher` in the slot for its kind.
    ///
    /// Variable names must be unique across the whole group. A
    /// path-kind insert skips the check against the existing path slot:
    /// path templates concatenate, so the incoming matcher already
    /// contains the slot's variables and replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::DuplicateVariable`] naming the first
    /// variable that already appears elsewhere in the group.
    pub(crate) fn insert(&mut self, matcher: Arc<CompiledTemplate>) -> PatternResult<()> {
        for query in &self.queries {
            unique_vars(matcher.var_names(), query.var_names())?;
        }
        match matcher.kind() {
            TemplateKind::Host => {
                if let Some(path) = &self.path {
                    unique_vars(matcher.var_names(), path.var_names())?;
                }
                self.host = Some(matcher);
            }
            TemplateKind::Query => {
                if let Some(host) = &self.host {
                    unique_vars(matcher.var_names(), host.var_names())?;
                }
                if let Some(path) = &self.path {
                    unique_vars(matcher.var_names(), path.var_names())?;
                }
                self.queries.push(matcher);
            }
            TemplateKind::Path | TemplateKind::PathPrefix => {
                if let Some(host) = &self.host {
                    unique_vars(matcher.var_names(), host.var_names())?;
                }
                self.path = Some(matcher);
            }
        }
        Ok(())
    }

    /// Extracts the variables from `url` once every matcher has accepted
    /// it.
    ///
    /// Each stored matcher's regex re-runs against its URL component; a
    /// defensively-empty sub-match contributes no entries.
    pub(crate) fn extract(&self, url: &Url) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        if let Some(host) = &self.host {
            host.extract_into(url, &mut vars);
        }
        if let Some(path) = &self.path {
            path.extract_into(url, &mut vars);
        }
        for query in &self.queries {
            query.extract_into(url, &mut vars);
        }
        vars
    }
}

/// Fails if the two name lists share an entry.
fn unique_vars(left: &[String], right: &[String]) -> PatternResult<()> {
    for name in left {
        if right.contains(name) {
            return Err(PatternError::DuplicateVariable(name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(template: &str, kind: TemplateKind) -> Arc<CompiledTemplate> {
        Arc::new(CompiledTemplate::compile(template, kind, false, false).unwrap())
    }

    #[test]
    fn test_insert_fills_slots() {
        let mut group = MatcherGroup::default();
        group
            .insert(compiled("{sub}.example.com", TemplateKind::Host))
            .unwrap();
        group.insert(compiled("/x/{a}", TemplateKind::Path)).unwrap();
        group
            .insert(compiled("k={b}", TemplateKind::Query))
            .unwrap();
        group
            .insert(compiled("j={c}", TemplateKind::Query))
            .unwrap();
        assert!(group.host().is_some());
        assert!(group.path().is_some());
        assert_eq!(group.queries.len(), 2);
    }

    #[test]
    fn test_duplicate_between_host_and_path() {
        let mut group = MatcherGroup::default();
        group
            .insert(compiled("{id}.example.com", TemplateKind::Host))
            .unwrap();
        let err = group
            .insert(compiled("/x/{id}", TemplateKind::Path))
            .unwrap_err();
        assert!(matches!(err, PatternError::DuplicateVariable(name) if name == "id"));
    }

    #[test]
    fn test_duplicate_between_path_and_query() {
        let mut group = MatcherGroup::default();
        group.insert(compiled("/{id}", TemplateKind::Path)).unwrap();
        let err = group
            .insert(compiled("x={id}", TemplateKind::Query))
            .unwrap_err();
        assert!(matches!(err, PatternError::DuplicateVariable(_)));
    }

    #[test]
    fn test_duplicate_between_queries() {
        let mut group = MatcherGroup::default();
        group
            .insert(compiled("x={v}", TemplateKind::Query))
            .unwrap();
        let err = group
            .insert(compiled("y={v}", TemplateKind::Query))
            .unwrap_err();
        assert!(matches!(err, PatternError::DuplicateVariable(_)));
    }

    #[test]
    fn test_path_replacement_skips_path_check() {
        let mut group = MatcherGroup::default();
        group
            .insert(compiled("/a/{x}", TemplateKind::Path))
            .unwrap();
        // A concatenated path template carries the slot's variables.
        group
            .insert(compiled("/a/{x}/b/{y}", TemplateKind::Path))
            .unwrap();
        assert_eq!(group.path().unwrap().var_names(), ["x", "y"]);
    }

    #[test]
    fn test_extract_combines_components() {
        let mut group = MatcherGroup::default();
        group
            .insert(compiled("{sub}.example.com", TemplateKind::Host))
            .unwrap();
        group
            .insert(compiled("/api/{id:[0-9]+}", TemplateKind::Path))
            .unwrap();
        group
            .insert(compiled("page={page:[0-9]+}", TemplateKind::Query))
            .unwrap();

        let url = Url::parse("http://foo.example.com/api/42?page=3").unwrap();
        let vars = group.extract(&url);
        assert_eq!(vars.len(), 3);
        assert_eq!(vars.get("sub").unwrap(), "foo");
        assert_eq!(vars.get("id").unwrap(), "42");
        assert_eq!(vars.get("page").unwrap(), "3");
    }
}

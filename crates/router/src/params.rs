//! Parameters resolved from pattern captures.

/// Parameters resolved by a route match, as name/value pairs.
///
/// Comes in two shapes so that the common no-parameter match never
/// allocates: a constant empty set, and a resolved list in declaration
/// order. Nested routing merges parent and child sets; on a duplicate name
/// the innermost value wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParams {
    kind: ParamsKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParamsKind {
    Empty,
    Resolved(Vec<(String, String)>),
}

impl RouteParams {
    /// The empty parameter set.
    pub const fn empty() -> Self {
        Self { kind: ParamsKind::Empty }
    }

    pub(crate) fn resolved(pairs: Vec<(String, String)>) -> Self {
        if pairs.is_empty() {
            Self::empty()
        } else {
            Self { kind: ParamsKind::Resolved(pairs) }
        }
    }

    /// Value of the parameter named `name`, if it was resolved.
    ///
    /// Searches from the innermost match outward, so a child route shadows a
    /// parent parameter of the same name.
    pub fn get(&self, name: &str) -> Option<&str> {
        match &self.kind {
            ParamsKind::Empty => None,
            ParamsKind::Resolved(pairs) => pairs
                .iter()
                .rev()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.kind, ParamsKind::Empty)
    }

    pub fn len(&self) -> usize {
        match &self.kind {
            ParamsKind::Empty => 0,
            ParamsKind::Resolved(pairs) => pairs.len(),
        }
    }

    /// Iterates over the pairs in resolution order, outermost first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let pairs = match &self.kind {
            ParamsKind::Empty => &[][..],
            ParamsKind::Resolved(pairs) => pairs.as_slice(),
        };
        pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Combines an outer set with an inner one resolved later.
    ///
    /// Either side being empty short-circuits to a clone of the other.
    pub(crate) fn merged_with(&self, inner: &Self) -> Self {
        match (&self.kind, &inner.kind) {
            (ParamsKind::Empty, _) => inner.clone(),
            (_, ParamsKind::Empty) => self.clone(),
            (ParamsKind::Resolved(outer), ParamsKind::Resolved(inner)) => {
                let mut pairs = Vec::with_capacity(outer.len() + inner.len());
                pairs.extend_from_slice(outer);
                pairs.extend_from_slice(inner);
                Self::resolved(pairs)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> RouteParams {
        RouteParams::resolved(
            items
                .iter()
                .map(|(n, v)| ((*n).to_owned(), (*v).to_owned()))
                .collect(),
        )
    }

    #[test]
    fn empty_set_resolves_nothing() {
        let params = RouteParams::empty();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
        assert_eq!(params.get("id"), None);
        assert_eq!(params.iter().count(), 0);
    }

    #[test]
    fn resolved_set_exposes_pairs() {
        let params = pairs(&[("id", "42"), ("name", "x")]);
        assert!(!params.is_empty());
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("name"), Some("x"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn resolved_with_no_pairs_collapses_to_empty() {
        assert!(RouteParams::resolved(Vec::new()).is_empty());
    }

    #[test]
    fn innermost_value_shadows_on_duplicate_name() {
        let outer = pairs(&[("id", "outer")]);
        let inner = pairs(&[("id", "inner")]);
        let merged = outer.merged_with(&inner);
        assert_eq!(merged.get("id"), Some("inner"));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_short_circuits_on_empty_sides() {
        let some = pairs(&[("id", "42")]);
        assert_eq!(RouteParams::empty().merged_with(&some), some);
        assert_eq!(some.merged_with(&RouteParams::empty()), some);
        assert!(RouteParams::empty().merged_with(&RouteParams::empty()).is_empty());
    }

    #[test]
    fn iteration_preserves_resolution_order() {
        let merged = pairs(&[("a", "1")]).merged_with(&pairs(&[("b", "2")]));
        let collected: Vec<_> = merged.iter().collect();
        assert_eq!(collected, vec![("a", "1"), ("b", "2")]);
    }
}

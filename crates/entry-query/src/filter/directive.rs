//! Directive parser.
//!
//! Request parameters encode filters in their names:
//!
//! ```text
//! f-{namespace}-{slug}-{field}-{constraint}                 = value
//! f-{namespace}-{slug}-{relation[|nested…]}-{col[|col…]}-{constraint} = value
//! ```
//!
//! Filtering only runs when `filter-{namespace}-{slug}` is set. Ordering is
//! read from `order-{namespace}-{slug}` and `sort-{namespace}-{slug}`.
//! Everything is parsed here into structured directives; nothing downstream
//! looks at raw parameter names.

use std::collections::HashMap;

use tracing::debug;

use super::constraint::ConstraintType;
use crate::query::SortDirection;
use crate::schema::Stream;

/// Request parameters in request order.
///
/// Repeated names keep their first position and their last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw `a=b&c=d` query string, with or without a leading `?`.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Set a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.pairs.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

/// Map parameters carry no order; names are sorted for a stable pass.
impl From<HashMap<String, String>> for QueryParams {
    fn from(map: HashMap<String, String>) -> Self {
        let mut pairs: Vec<(String, String)> = map.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Self { pairs }
    }
}

/// A parsed `f-…` filter parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDirective {
    pub namespace: String,
    pub slug: String,
    /// Base field or relation slug, followed by nested relation slugs.
    pub field_path: Vec<String>,
    /// Columns on the terminal related table. Empty for direct fields.
    pub columns: Vec<String>,
    pub constraint: ConstraintType,
    pub value: String,
}

impl FilterDirective {
    /// Parse one parameter. Returns `None` for anything that is not a
    /// well-formed filter directive.
    pub fn parse(name: &str, value: &str) -> Option<Self> {
        let segments: Vec<&str> = name.split('-').collect();
        if !(5..=6).contains(&segments.len()) || segments[0] != "f" {
            return None;
        }

        let field_path: Vec<String> = segments[3].split('|').map(str::to_string).collect();
        if field_path.first().is_none_or(|base| base.is_empty()) {
            return None;
        }

        let (columns, keyword) = if segments.len() == 6 {
            let columns = segments[4]
                .split('|')
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            (columns, segments[5])
        } else {
            (Vec::new(), segments[4])
        };

        Some(Self {
            namespace: segments[1].to_string(),
            slug: segments[2].to_string(),
            field_path,
            columns,
            constraint: ConstraintType::parse(keyword),
            value: value.to_string(),
        })
    }

    /// Base field or relation slug. `None` when the field path is empty.
    pub fn base(&self) -> Option<&str> {
        self.field_path
            .first()
            .map(String::as_str)
            .filter(|base| !base.is_empty())
    }

    /// Nested relation slugs after the base.
    pub fn nested(&self) -> &[String] {
        self.field_path.get(1..).unwrap_or_default()
    }

    /// Whether this directive is addressed to `stream`.
    pub fn targets(&self, stream: &Stream) -> bool {
        stream.matches(&self.namespace, &self.slug)
    }
}

/// A parsed `order-…`/`sort-…` parameter pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDirective {
    pub namespace: String,
    pub slug: String,
    /// Field or relation name to order by.
    pub order_by: String,
    pub direction: SortDirection,
}

impl OrderDirective {
    /// Read the order directive for `stream`, if one is present.
    pub fn parse(params: &QueryParams, stream: &Stream) -> Option<Self> {
        let order_by = params
            .get(&stream.param("order"))
            .map(str::trim)
            .filter(|v| !v.is_empty())?;

        let direction = match params.get(&stream.param("sort")) {
            None => SortDirection::default(),
            Some(raw) => SortDirection::parse(raw).unwrap_or_else(|| {
                debug!(sort = raw, "unrecognised sort direction; using ASC");
                SortDirection::default()
            }),
        };

        Some(Self {
            namespace: stream.namespace.clone(),
            slug: stream.slug.clone(),
            order_by: order_by.to_string(),
            direction,
        })
    }
}

/// All directives addressed to one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directives {
    pub filters: Vec<FilterDirective>,
    pub order: Option<OrderDirective>,
}

impl Directives {
    /// Parse the filter and order directives for `stream`.
    pub fn parse(params: &QueryParams, stream: &Stream) -> Self {
        Self {
            filters: parse_filters(params, stream),
            order: OrderDirective::parse(params, stream),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.order.is_none()
    }
}

/// Whether `filter-{namespace}-{slug}` switches filtering on.
///
/// Any value other than empty or `0` enables it.
pub fn filtering_enabled(params: &QueryParams, stream: &Stream) -> bool {
    params
        .get(&stream.param("filter"))
        .is_some_and(|v| !v.is_empty() && v != "0")
}

fn parse_filters(params: &QueryParams, stream: &Stream) -> Vec<FilterDirective> {
    if !filtering_enabled(params, stream) {
        return Vec::new();
    }

    params
        .iter()
        .filter(|(name, _)| name.starts_with("f-"))
        .filter_map(|(name, value)| {
            let Some(directive) = FilterDirective::parse(name, value) else {
                debug!(param = name, "malformed filter directive skipped");
                return None;
            };
            if !directive.targets(stream) {
                debug!(param = name, "filter directive for another stream skipped");
                return None;
            }
            Some(directive)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn posts() -> Stream {
        Stream::new("blog", "posts")
    }

    #[test]
    fn parse_direct_field_directive() {
        let d = FilterDirective::parse("f-blog-posts-title-contains", "rust").unwrap();
        assert_eq!(d.namespace, "blog");
        assert_eq!(d.slug, "posts");
        assert_eq!(d.base(), Some("title"));
        assert!(d.nested().is_empty());
        assert!(d.columns.is_empty());
        assert_eq!(d.constraint, ConstraintType::Contains);
        assert_eq!(d.value, "rust");
    }

    #[test]
    fn parse_relation_directive_with_columns() {
        let d = FilterDirective::parse("f-blog-posts-author-name|email-is", "Jane").unwrap();
        assert_eq!(d.field_path, vec!["author"]);
        assert_eq!(d.columns, vec!["name", "email"]);
        assert_eq!(d.constraint, ConstraintType::Is);
    }

    #[test]
    fn parse_nested_relation_directive() {
        let d =
            FilterDirective::parse("f-blog-posts-author|profile-bio-contains", "engineer").unwrap();
        assert_eq!(d.base(), Some("author"));
        assert_eq!(d.nested(), ["profile".to_string()]);
        assert_eq!(d.columns, vec!["bio"]);
    }

    #[test]
    fn malformed_directives_rejected() {
        assert!(FilterDirective::parse("f-blog-posts-title", "x").is_none());
        assert!(FilterDirective::parse("g-blog-posts-title-is", "x").is_none());
        assert!(FilterDirective::parse("f-blog-posts-a-b-c-is", "x").is_none());
        assert!(FilterDirective::parse("f-blog-posts--is", "x").is_none());
    }

    #[test]
    fn targets_checks_namespace_and_slug() {
        let d = FilterDirective::parse("f-blog-pages-title-is", "x").unwrap();
        assert!(!d.targets(&posts()));
        assert!(d.targets(&Stream::new("blog", "pages")));
    }

    #[test]
    fn filters_require_sentinel() {
        let params: QueryParams = [("f-blog-posts-title-is", "Hello")].into_iter().collect();
        assert!(Directives::parse(&params, &posts()).filters.is_empty());

        let params: QueryParams = [("filter-blog-posts", ""), ("f-blog-posts-title-is", "Hello")]
            .into_iter()
            .collect();
        assert!(Directives::parse(&params, &posts()).filters.is_empty());

        let params: QueryParams = [("filter-blog-posts", "1"), ("f-blog-posts-title-is", "Hello")]
            .into_iter()
            .collect();
        assert_eq!(Directives::parse(&params, &posts()).filters.len(), 1);
    }

    #[test]
    fn zero_sentinel_disables_filtering() {
        let params: QueryParams = [("filter-blog-posts", "0"), ("f-blog-posts-title-is", "Hello")]
            .into_iter()
            .collect();
        assert!(!filtering_enabled(&params, &posts()));
        assert!(Directives::parse(&params, &posts()).filters.is_empty());

        let params: QueryParams = [("filter-blog-posts", "yes")].into_iter().collect();
        assert!(filtering_enabled(&params, &posts()));
    }

    #[test]
    fn hand_built_directive_with_empty_path() {
        let d = FilterDirective {
            namespace: "blog".to_string(),
            slug: "posts".to_string(),
            field_path: Vec::new(),
            columns: Vec::new(),
            constraint: ConstraintType::Is,
            value: "x".to_string(),
        };
        assert_eq!(d.base(), None);
        assert!(d.nested().is_empty());
    }

    #[test]
    fn filters_for_other_streams_skipped() {
        let params: QueryParams = [
            ("filter-blog-posts", "1"),
            ("f-blog-pages-title-is", "About"),
            ("f-shop-posts-title-is", "Sale"),
            ("f-blog-posts-title-is", "Hello"),
        ]
        .into_iter()
        .collect();

        let directives = Directives::parse(&params, &posts());
        assert_eq!(directives.filters.len(), 1);
        assert_eq!(directives.filters[0].value, "Hello");
    }

    #[test]
    fn order_defaults_to_asc() {
        let params: QueryParams = [("order-blog-posts", "title")].into_iter().collect();
        let order = OrderDirective::parse(&params, &posts()).unwrap();
        assert_eq!(order.order_by, "title");
        assert_eq!(order.direction, SortDirection::Asc);
    }

    #[test]
    fn order_reads_sort_direction() {
        let params: QueryParams = [("order-blog-posts", "author"), ("sort-blog-posts", "DESC")]
            .into_iter()
            .collect();
        let order = OrderDirective::parse(&params, &posts()).unwrap();
        assert_eq!(order.direction, SortDirection::Desc);

        let params: QueryParams = [("order-blog-posts", "author"), ("sort-blog-posts", "up")]
            .into_iter()
            .collect();
        let order = OrderDirective::parse(&params, &posts()).unwrap();
        assert_eq!(order.direction, SortDirection::Asc);
    }

    #[test]
    fn order_independent_of_filter_sentinel() {
        let params: QueryParams = [("order-blog-posts", "title"), ("order-blog-pages", "slug")]
            .into_iter()
            .collect();
        let directives = Directives::parse(&params, &posts());
        assert!(directives.filters.is_empty());
        assert_eq!(directives.order.unwrap().order_by, "title");
    }

    #[test]
    fn empty_order_ignored() {
        let params: QueryParams = [("order-blog-posts", "")].into_iter().collect();
        assert!(OrderDirective::parse(&params, &posts()).is_none());
        assert!(Directives::parse(&QueryParams::new(), &posts()).is_empty());
    }

    #[test]
    fn query_string_decoding() {
        let params = QueryParams::parse(
            "?filter-blog-posts=1&f-blog-posts-title-contains=hello+world&f-blog-posts-slug-is=a%26b",
        );
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("f-blog-posts-title-contains"), Some("hello world"));
        assert_eq!(params.get("f-blog-posts-slug-is"), Some("a&b"));
    }

    #[test]
    fn from_map_sorts_names() {
        let map = HashMap::from([
            ("order-blog-posts".to_string(), "title".to_string()),
            ("filter-blog-posts".to_string(), "1".to_string()),
        ]);
        let params = QueryParams::from(map);
        assert_eq!(params.iter().next(), Some(("filter-blog-posts", "1")));
        assert_eq!(params.get("order-blog-posts"), Some("title"));
    }

    #[test]
    fn repeated_params_keep_last_value() {
        let params = QueryParams::parse("a=1&b=2&a=3");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("a"), Some("3"));
        assert_eq!(params.iter().next(), Some(("a", "3")));
    }
}

//! Query string helpers shared by the paginators and the ordering filter.

use std::collections::BTreeMap;

/// Query parameters in the order they appeared on the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parse a raw query string (without the leading `?`).
    ///
    /// A malformed query string yields no parameters rather than an error,
    /// so a bad link degrades to the defaults.
    pub fn parse(query: Option<&str>) -> Self {
        let Some(query) = query.filter(|q| !q.is_empty()) else {
            return Self::default();
        };
        match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(pairs) => Self(pairs),
            Err(err) => {
                tracing::debug!(error = %err, "Ignoring malformed query string");
                Self::default()
            }
        }
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// The last value given for `key`, matching how repeated parameters
    /// resolve everywhere else in the API.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// Group values by key, with keys sorted.
    fn grouped(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (k, v) in &self.0 {
            grouped.entry(k.as_str()).or_default().push(v.as_str());
        }
        grouped
    }
}

/// An absolute request URL split into its base (scheme, host, path) and its
/// query parameters. Used to build pagination links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrl {
    base: String,
    query: QueryParams,
}

impl RequestUrl {
    pub fn new(base: impl Into<String>, query: QueryParams) -> Self {
        Self {
            base: base.into(),
            query,
        }
    }

    /// Split a full URL. Any fragment is dropped.
    pub fn parse(url: &str) -> Self {
        let url = url.split('#').next().unwrap_or_default();
        match url.split_once('?') {
            Some((base, query)) => Self::new(base, QueryParams::parse(Some(query))),
            None => Self::new(url, QueryParams::default()),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// This URL with `key` set to the single value `value`. The resulting
    /// query string is sorted by key.
    pub fn with_param(&self, key: &str, value: &str) -> String {
        let mut grouped = self.query.grouped();
        grouped.insert(key, vec![value]);
        self.render(grouped)
    }

    /// This URL with every value of `key` removed.
    pub fn without_param(&self, key: &str) -> String {
        let mut grouped = self.query.grouped();
        grouped.remove(key);
        self.render(grouped)
    }

    fn render(&self, grouped: BTreeMap<&str, Vec<&str>>) -> String {
        let pairs: Vec<(&str, &str)> = grouped
            .into_iter()
            .flat_map(|(k, values)| values.into_iter().map(move |v| (k, v)))
            .collect();
        if pairs.is_empty() {
            return self.base.clone();
        }
        let encoded = serde_urlencoded::to_string(&pairs).unwrap_or_default();
        format!("{}?{}", self.base, encoded)
    }
}

/// Parse a non-negative integer query value.
///
/// With `strict`, zero is rejected too. With a `cutoff`, larger values are
/// clamped to it.
pub fn positive_int(raw: &str, strict: bool, cutoff: Option<u64>) -> Option<u64> {
    let parsed: i64 = raw.trim().parse().ok()?;
    if parsed < 0 || (parsed == 0 && strict) {
        return None;
    }
    let value = parsed.unsigned_abs();
    Some(match cutoff {
        Some(max) => value.min(max),
        None => value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_order_and_repeats() {
        let params = QueryParams::parse(Some("b=2&a=1&b=3"));
        assert_eq!(params.get("b"), Some("3"));
        assert_eq!(params.get_all("b").collect::<Vec<_>>(), vec!["2", "3"]);
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn parse_decodes_values() {
        let params = QueryParams::parse(Some("q=hello%20world&plus=a+b"));
        assert_eq!(params.get("q"), Some("hello world"));
        assert_eq!(params.get("plus"), Some("a b"));
    }

    #[test]
    fn parse_empty_query() {
        assert!(QueryParams::parse(None).is_empty());
        assert!(QueryParams::parse(Some("")).is_empty());
    }

    #[test]
    fn with_param_replaces_and_sorts() {
        let url = RequestUrl::parse("http://api.test/items/?page=2&b=x&a=y");
        assert_eq!(
            url.with_param("page", "3"),
            "http://api.test/items/?a=y&b=x&page=3"
        );
    }

    #[test]
    fn with_param_adds_missing_key() {
        let url = RequestUrl::parse("http://api.test/items/");
        assert_eq!(url.with_param("page", "2"), "http://api.test/items/?page=2");
    }

    #[test]
    fn without_param_drops_every_value() {
        let url = RequestUrl::parse("http://api.test/items/?page=2&page=4&size=10");
        assert_eq!(url.without_param("page"), "http://api.test/items/?size=10");
        let bare = RequestUrl::parse("http://api.test/items/?page=2");
        assert_eq!(bare.without_param("page"), "http://api.test/items/");
    }

    #[test]
    fn with_param_encodes_values() {
        let url = RequestUrl::parse("http://api.test/items/");
        assert_eq!(
            url.with_param("cursor", "bz0xJnI9MQ=="),
            "http://api.test/items/?cursor=bz0xJnI9MQ%3D%3D"
        );
    }

    #[test]
    fn positive_int_rules() {
        assert_eq!(positive_int("15", true, None), Some(15));
        assert_eq!(positive_int(" 7 ", true, None), Some(7));
        assert_eq!(positive_int("0", true, None), None);
        assert_eq!(positive_int("0", false, None), Some(0));
        assert_eq!(positive_int("-3", false, None), None);
        assert_eq!(positive_int("abc", false, None), None);
        assert_eq!(positive_int("500", true, Some(250)), Some(250));
    }
}

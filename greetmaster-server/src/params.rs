//! Ordered, multi-valued query string access.

use axum::http::Uri;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query: &str) -> Self {
        let pairs = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    pub fn from_uri(uri: &Uri) -> Self {
        Self::parse(uri.query().unwrap_or(""))
    }

    /// First value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Leading integer of `value`, ignoring leading whitespace and trailing garbage
/// (`"12abc"` is 12). `None` when there are no digits.
pub fn parse_int(value: &str) -> Option<i64> {
    let s = value.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let n: i64 = digits[..end].parse().ok()?;
    Some(if negative { -n } else { n })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_keep_order() {
        let params = QueryParams::parse("field=titles&id=3&field=type&search=a+b%21");
        assert_eq!(params.get("id"), Some("3"));
        assert_eq!(params.get_all("field").collect::<Vec<_>>(), vec!["titles", "type"]);
        assert_eq!(params.get("search"), Some("a b!"));
        assert!(params.get("field").is_some());
        assert_eq!(params.get("count"), None);
    }

    #[test]
    fn values_outlive_the_lookup_key() {
        let params = QueryParams::parse("id=3");
        let value = {
            let key = String::from("id");
            params.get(&key)
        };
        assert_eq!(value, Some("3"));
    }

    #[test]
    fn empty_query() {
        assert!(QueryParams::parse("").is_empty());
        assert!(QueryParams::from_uri(&Uri::from_static("/about")).is_empty());
        assert!(!QueryParams::from_uri(&Uri::from_static("/?embed=true")).is_empty());
    }

    #[test]
    fn lenient_integers() {
        assert_eq!(parse_int("12"), Some(12));
        assert_eq!(parse_int(" 7px"), Some(7));
        assert_eq!(parse_int("-3"), Some(-3));
        assert_eq!(parse_int("abc"), None);
        assert_eq!(parse_int(""), None);
    }
}

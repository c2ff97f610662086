//! Raw request parameters as seen by factories and the list engine.

use std::collections::HashMap;

/// Query string parameters; every key keeps all of its values in arrival order.
pub type QueryMap = HashMap<String, Vec<String>>;

/// Captured path segments by name.
pub type PathParams = HashMap<String, String>;

/// Fold decoded `key=value` pairs into a [`QueryMap`].
pub fn query_from_pairs<I, K, V>(pairs: I) -> QueryMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut out = QueryMap::new();
    for (k, v) in pairs {
        out.entry(k.into()).or_default().push(v.into());
    }
    out
}

/// First value of a parameter, if any.
pub fn first<'a>(query: &'a QueryMap, name: &str) -> Option<&'a str> {
    query.get(name).and_then(|vs| vs.first()).map(|s| s.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_accumulate_in_order() {
        let q = query_from_pairs(vec![("member", "alice"), ("id", "r1"), ("member", "bob")]);
        assert_eq!(q.get("member").unwrap(), &vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(first(&q, "id"), Some("r1"));
        assert_eq!(first(&q, "subject"), None);
    }
}

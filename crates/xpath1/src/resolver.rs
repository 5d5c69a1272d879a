//! Prefix to namespace URI resolution for qualified name tests.

use std::collections::{BTreeMap, HashMap};

/// Maps a namespace prefix, as written in an expression, to a namespace URI.
pub trait NamespaceResolver {
    fn lookup_namespace_uri(&self, prefix: &str) -> Option<String>;
}

impl NamespaceResolver for HashMap<String, String> {
    fn lookup_namespace_uri(&self, prefix: &str) -> Option<String> {
        self.get(prefix).cloned()
    }
}

impl NamespaceResolver for BTreeMap<String, String> {
    fn lookup_namespace_uri(&self, prefix: &str) -> Option<String> {
        self.get(prefix).cloned()
    }
}

impl<F> NamespaceResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup_namespace_uri(&self, prefix: &str) -> Option<String> {
        self(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_resolvers() {
        let mut map = HashMap::new();
        map.insert("h".to_string(), "http://www.w3.org/1999/xhtml".to_string());
        assert_eq!(
            map.lookup_namespace_uri("h").as_deref(),
            Some("http://www.w3.org/1999/xhtml")
        );
        assert_eq!(map.lookup_namespace_uri("x"), None);

        let tree: BTreeMap<String, String> = map.into_iter().collect();
        assert!(tree.lookup_namespace_uri("h").is_some());
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |prefix: &str| (prefix == "svg").then(|| "http://www.w3.org/2000/svg".to_string());
        let dynamic: &dyn NamespaceResolver = &resolver;
        assert!(dynamic.lookup_namespace_uri("svg").is_some());
        assert!(dynamic.lookup_namespace_uri("h").is_none());
    }
}

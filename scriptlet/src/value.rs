//! Values and namespaces
//!
//! Every run gets a fresh [`Namespace`], so top-level bindings made by one
//! script are never visible to another.

use std::{
    collections::{BTreeMap, HashMap},
    fmt::Display,
    sync::atomic::{AtomicU64, Ordering},
};

/// A value bound to a sigil-qualified name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// `$name`
    Scalar(String),
    /// `@name`
    List(Vec<String>),
    /// `%name`
    Map(BTreeMap<String, String>),
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Scalar(value) => f.write_str(value),
            Value::List(items) => f.write_str(&items.join(" ")),
            Value::Map(entries) => {
                let mut glue = "";
                for (key, value) in entries {
                    write!(f, "{}{}={}", glue, key, value)?;
                    glue = " ";
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Scalar(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Value::Map(entries)
    }
}

static NEXT_NAMESPACE: AtomicU64 = AtomicU64::new(1);

/// Process-wide unique namespace identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespaceId(u64);

impl NamespaceId {
    /// Allocates an id no other call in this process will return
    pub fn fresh() -> Self {
        Self(NEXT_NAMESPACE.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for NamespaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ns{}", self.0)
    }
}

/// Isolated bindings for one script run
#[derive(Debug)]
pub struct Namespace {
    id: NamespaceId,
    bindings: HashMap<String, Value>,
}

impl Namespace {
    pub fn new(id: NamespaceId) -> Self {
        Self {
            id,
            bindings: HashMap::new(),
        }
    }

    pub fn id(&self) -> NamespaceId {
        self.id
    }

    /// Looks up a sigil-qualified name such as `$name`
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_joins_lists_and_maps() {
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::from(vec!["a".to_string(), "b".to_string()]).to_string(), "a b");
        let map: BTreeMap<String, String> =
            [("b", "2"), ("a", "1")].into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        assert_eq!(Value::from(map).to_string(), "a=1 b=2");
    }

    #[test]
    fn fresh_ids_are_unique() {
        let first = NamespaceId::fresh();
        let second = NamespaceId::fresh();
        assert_ne!(first, second);
        assert_ne!(Namespace::new(first).id(), Namespace::new(second).id());
    }

    #[test]
    fn bindings() {
        let mut namespace = Namespace::new(NamespaceId::fresh());
        assert!(!namespace.is_bound("$name"));
        namespace.set("$name", "Tom");
        assert_eq!(namespace.get("$name"), Some(&Value::from("Tom")));
        assert_eq!(namespace.get("@name"), None);
    }
}

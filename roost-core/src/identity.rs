use crate::{Value, separated_by};
use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

/// Values of the identity properties of an instance, taken when it was computed.
///
/// Two identities are equal when their ordered values are equal.
#[derive(Debug, Clone)]
pub struct Identity {
    parts: Vec<(String, Value)>,
}

impl Identity {
    pub fn new(parts: Vec<(String, Value)>) -> Self {
        Self { parts }
    }

    /// An identity is assigned when it has at least one property and none of them is null.
    pub fn is_assigned(&self) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(|(_, v)| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn parts(&self) -> &[(String, Value)] {
        &self.parts
    }

    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> {
        self.parts.iter().map(|(n, _)| n.as_str())
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = &Value> {
        self.parts.iter().map(|(_, v)| v)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parts.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.values().eq(other.values())
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in self.values() {
            value.hash(state);
        }
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        separated_by(
            &mut out,
            &self.parts,
            |out, (name, value)| {
                out.push_str(name);
                out.push('=');
                out.push_str(&value.to_string());
            },
            ", ",
        );
        f.write_str(&out)
    }
}

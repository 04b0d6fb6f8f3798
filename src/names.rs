//! Ordered, duplicate-free list of names.

use indexmap::IndexSet;
use serde::Serialize;
use std::fmt;

/// Names in the order they were first seen, each at most once.
///
/// The order is part of the output: it follows the traversal, not the
/// alphabet or the schema.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NameList {
    names: IndexSet<String>,
}

impl NameList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` unless it is already present. Returns true if it was added.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names.into_iter().collect()
    }
}

// IndexSet equality ignores order, ours does not.
impl PartialEq for NameList {
    fn eq(&self, other: &Self) -> bool {
        self.names.iter().eq(other.names.iter())
    }
}

impl Eq for NameList {}

impl<'a> IntoIterator for &'a NameList {
    type Item = &'a String;
    type IntoIter = indexmap::set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

impl<S: AsRef<str>> FromIterator<S> for NameList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = NameList::new();
        for name in iter {
            list.insert(name.as_ref());
        }
        list
    }
}

impl fmt::Display for NameList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", name)?;
        }
        write!(f, "]")
    }
}

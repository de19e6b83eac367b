use indexmap::IndexMap;
use std::collections::HashMap;

/// Label -> offset within one section, with the inverse used for listings.
/// When several labels share an offset, the first one names it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels {
    labels: IndexMap<String, u32>,
    back: HashMap<u32, String>,
}

impl Labels {
    pub fn new() -> Self {
        Labels::default()
    }

    /// Returns the previous offset, leaving it in place, when `name` is
    /// already defined.
    pub fn insert(&mut self, name: &str, offset: u32) -> Option<u32> {
        if let Some(prev) = self.labels.get(name) {
            return Some(*prev);
        }
        self.labels.insert(name.to_string(), offset);
        self.back.entry(offset).or_insert_with(|| name.to_string());
        None
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.labels.get(name).copied()
    }

    pub fn name_at(&self, offset: u32) -> Option<&str> {
        self.back.get(&offset).map(|s| s.as_str())
    }

    /// Every label at `offset`, in definition order.
    pub fn names_at(&self, offset: u32) -> impl Iterator<Item = &str> + '_ {
        self.iter()
            .filter(move |(_, at)| *at == offset)
            .map(|(name, _)| name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.labels.iter().map(|(name, offset)| (name.as_str(), *offset))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

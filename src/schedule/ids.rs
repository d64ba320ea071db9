//! Duplicate-aware node id minting

use std::collections::HashMap;

use indexmap::IndexMap;

use super::NodeId;

/// Mints unique node ids and remembers the canonical name behind each
///
/// The first id minted for a canonical name is the name itself; later ones
/// get a `~N` suffix. Every schedule owns one generator, and an extracted
/// schedule carries a copy of its source's generator so ids minted afterwards
/// never collide with existing ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DuplicateIds {
    counts: HashMap<String, usize>,
    canonical: IndexMap<NodeId, String>,
}

impl DuplicateIds {
    /// Create an empty generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh id for `canonical`
    pub fn mint(&mut self, canonical: &str) -> NodeId {
        let count = self.counts.entry(canonical.to_string()).or_insert(0);
        let mut id = if *count == 0 {
            canonical.to_string()
        } else {
            format!("{}~{}", canonical, count)
        };
        // A canonical name may itself look like a minted duplicate
        while self.canonical.contains_key(&id) {
            *count += 1;
            id = format!("{}~{}", canonical, count);
        }
        *count += 1;
        self.canonical.insert(id.clone(), canonical.to_string());
        id
    }

    /// Canonical name behind a minted id
    pub fn canonical_name(&self, id: &str) -> Option<&str> {
        self.canonical.get(id).map(String::as_str)
    }

    /// Number of ids minted for `canonical`
    pub fn minted(&self, canonical: &str) -> usize {
        self.counts.get(canonical).copied().unwrap_or(0)
    }

    /// Ids minted for `canonical`, in minting order
    pub fn ids_of<'a>(&'a self, canonical: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.canonical
            .iter()
            .filter(move |(_, c)| c.as_str() == canonical)
            .map(|(id, _)| id.as_str())
    }

    /// Total number of minted ids
    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    /// Whether no id has been minted
    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}

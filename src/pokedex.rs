//! Registry of caught pokemon
//!
//! Holds the raw API payload of every pokemon the user has caught. Unlike the
//! response cache, entries never expire.

use std::collections::HashMap;

/// Caught pokemon keyed by name
#[derive(Debug, Default)]
pub struct Pokedex {
    caught: HashMap<String, Vec<u8>>,
}

impl Pokedex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a caught pokemon, replacing any earlier payload for the same name
    pub fn add(&mut self, name: impl Into<String>, payload: Vec<u8>) {
        self.caught.insert(name.into(), payload);
    }

    /// Returns the stored payload for `name`, if it has been caught
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.caught.get(name).map(Vec::as_slice)
    }

    /// Names of all caught pokemon in alphabetical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.caught.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.caught.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caught.is_empty()
    }
}

// Page-identifier registry consulted when validating `page` links

use std::collections::HashSet;

pub trait PageRegistry {
    fn contains(&self, page: &str) -> bool;
}

/// In-memory registry, usually a snapshot of the `pages` table.
#[derive(Debug, Clone, Default)]
pub struct PageSet {
    slugs: HashSet<String>,
}

impl PageSet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: AsRef<str>> FromIterator<S> for PageSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            slugs: iter.into_iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }
}

impl PageRegistry for PageSet {
    fn contains(&self, page: &str) -> bool {
        self.slugs.contains(page)
    }
}

//! Parent/child bookkeeping for one menu, kept as an id-keyed arena.
//!
//! Items never own each other: the map only records `id -> parent_id`, so a
//! proposed state can be built by overwriting entries and then walked
//! without touching storage.

use crate::model::MenuItem;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct Ancestry {
    parents: HashMap<i64, Option<i64>>,
}

impl Ancestry {
    pub fn from_items(items: &[MenuItem]) -> Self {
        Self {
            parents: items.iter().map(|item| (item.id, item.parent_id)).collect(),
        }
    }

    pub fn from_pairs<I: IntoIterator<Item = (i64, Option<i64>)>>(pairs: I) -> Self {
        Self {
            parents: pairs.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.parents.contains_key(&id)
    }

    pub fn parent_of(&self, id: i64) -> Option<i64> {
        self.parents.get(&id).copied().flatten()
    }

    pub fn set_parent(&mut self, id: i64, parent_id: Option<i64>) {
        self.parents.insert(id, parent_id);
    }

    /// True when `candidate_parent_id` is `item_id` itself or sits anywhere
    /// below it, i.e. when making it the parent of `item_id` would close a cycle.
    ///
    /// Walks up from the candidate until a root, an unknown id, or `item_id`.
    /// A loop that does not pass through `item_id` ends the walk (false).
    pub fn is_descendant_or_self(&self, candidate_parent_id: i64, item_id: i64) -> bool {
        let mut visited = HashSet::new();
        let mut current = Some(candidate_parent_id);

        while let Some(id) = current {
            if id == item_id {
                return true;
            }
            if !visited.insert(id) {
                warn!(
                    item_id = id,
                    "parent chain loops without reaching item {}", item_id
                );
                return false;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Returns the lowest id lying on a parent cycle, if any exists.
    pub fn find_cycle(&self) -> Option<i64> {
        let mut ids: Vec<i64> = self.parents.keys().copied().collect();
        ids.sort_unstable();

        let mut settled: HashSet<i64> = HashSet::new();
        let mut first: Option<i64> = None;

        for start in ids {
            if settled.contains(&start) {
                continue;
            }
            let mut path: Vec<i64> = Vec::new();
            let mut on_path: HashSet<i64> = HashSet::new();
            let mut current = Some(start);

            while let Some(id) = current {
                if settled.contains(&id) || !self.contains(id) {
                    break;
                }
                if !on_path.insert(id) {
                    // `id` closes the loop; everything from its first visit on is the cycle
                    let begin = path.iter().position(|p| *p == id).unwrap_or(0);
                    let lowest = path[begin..].iter().copied().min().unwrap_or(id);
                    first = Some(first.map_or(lowest, |f| f.min(lowest)));
                    break;
                }
                path.push(id);
                current = self.parent_of(id);
            }
            settled.extend(path);
        }
        first
    }

    /// Every item below `item_id`, breadth first (parents before children).
    pub fn descendants(&self, item_id: i64) -> Vec<i64> {
        let mut children: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for (&id, parent) in &self.parents {
            if let Some(parent) = parent {
                children.entry(*parent).or_default().push(id);
            }
        }
        for kids in children.values_mut() {
            kids.sort_unstable();
        }

        let mut seen = HashSet::from([item_id]);
        let mut out = Vec::new();
        let mut queue = VecDeque::from([item_id]);
        while let Some(id) = queue.pop_front() {
            for &child in children.get(&id).into_iter().flatten() {
                if seen.insert(child) {
                    out.push(child);
                    queue.push_back(child);
                }
            }
        }
        out
    }
}

use lovecast_api::{Contestant, Side};
use std::collections::HashMap;

/// Contestants of the current episode cycle. Replaced wholesale on every
/// snapshot; never edited in place.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    contestants: Vec<Contestant>,
    by_id: HashMap<u32, usize>,
}

impl Roster {
    pub fn new(contestants: Vec<Contestant>) -> Self {
        let mut by_id = HashMap::with_capacity(contestants.len());
        for (index, c) in contestants.iter().enumerate() {
            // First occurrence wins on duplicate ids.
            by_id.entry(c.id).or_insert(index);
        }
        Self { contestants, by_id }
    }

    pub fn get(&self, id: u32) -> Option<&Contestant> {
        self.by_id.get(&id).map(|&i| &self.contestants[i])
    }

    pub fn name_of(&self, id: u32) -> Option<&str> {
        self.get(id).map(|c| c.name.as_str())
    }

    pub fn side(&self, side: Side) -> impl Iterator<Item = &Contestant> {
        self.contestants.iter().filter(move |c| c.side == side)
    }

    pub fn is_empty(&self) -> bool {
        self.contestants.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn contestant(id: u32, name: &str, side: Side) -> Contestant {
    Contestant {
        id,
        name: name.to_owned(),
        side,
        is_newcomer: false,
        portrait_ref: None,
    }
}

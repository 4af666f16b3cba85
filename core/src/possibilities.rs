//! Dense bitset of tile identifiers tracked per grid cell.

use serde::{Deserialize, Serialize};

use crate::TileId;

const WORD_BITS: usize = 64;

/// Set of tiles still permitted in a cell.
///
/// Backed by one bit per tile of the owning tile set; `capacity` is the tile
/// count and bits at or beyond it are always clear.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Possibilities {
    words: Vec<u64>,
    capacity: usize,
}

impl Possibilities {
    /// Creates an empty set able to hold `capacity` tiles.
    #[must_use]
    pub fn empty(capacity: usize) -> Self {
        Self {
            words: vec![0; word_count(capacity)],
            capacity,
        }
    }

    /// Creates a set containing every tile below `capacity`.
    #[must_use]
    pub fn full(capacity: usize) -> Self {
        let mut set = Self {
            words: vec![u64::MAX; word_count(capacity)],
            capacity,
        };
        set.clear_tail();
        set
    }

    /// Creates a set holding exactly `tile`.
    #[must_use]
    pub fn single(capacity: usize, tile: TileId) -> Self {
        let mut set = Self::empty(capacity);
        let _ = set.insert(tile);
        set
    }

    /// Builds a set from an iterator of tiles, ignoring identifiers beyond `capacity`.
    #[must_use]
    pub fn from_tiles(capacity: usize, tiles: impl IntoIterator<Item = TileId>) -> Self {
        let mut set = Self::empty(capacity);
        for tile in tiles {
            let _ = set.insert(tile);
        }
        set
    }

    /// Number of tiles the set can describe.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reports whether `tile` is present.
    #[must_use]
    pub fn contains(&self, tile: TileId) -> bool {
        let index = tile.index();
        if index >= self.capacity {
            return false;
        }
        self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    /// Adds `tile`, returning whether it was newly inserted.
    pub fn insert(&mut self, tile: TileId) -> bool {
        let index = tile.index();
        if index >= self.capacity {
            return false;
        }
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1 << (index % WORD_BITS);
        let inserted = *word & mask == 0;
        *word |= mask;
        inserted
    }

    /// Removes `tile`, returning whether it was present.
    pub fn remove(&mut self, tile: TileId) -> bool {
        let index = tile.index();
        if index >= self.capacity {
            return false;
        }
        let word = &mut self.words[index / WORD_BITS];
        let mask = 1 << (index % WORD_BITS);
        let removed = *word & mask != 0;
        *word &= !mask;
        removed
    }

    /// Number of tiles present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }

    /// Reports whether no tile is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// Lowest tile present, if any.
    #[must_use]
    pub fn first(&self) -> Option<TileId> {
        self.iter().next()
    }

    /// Adds every tile of `other`.
    pub fn union_with(&mut self, other: &Possibilities) {
        for (word, incoming) in self.words.iter_mut().zip(&other.words) {
            *word |= *incoming;
        }
        self.clear_tail();
    }

    /// Keeps only tiles also present in `other`, returning whether anything was removed.
    pub fn intersect_with(&mut self, other: &Possibilities) -> bool {
        let mut changed = false;
        for (index, word) in self.words.iter_mut().enumerate() {
            let incoming = other.words.get(index).copied().unwrap_or(0);
            let narrowed = *word & incoming;
            changed |= narrowed != *word;
            *word = narrowed;
        }
        changed
    }

    /// Reports whether every tile of `self` is also in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Possibilities) -> bool {
        self.words.iter().enumerate().all(|(index, word)| {
            let outer = other.words.get(index).copied().unwrap_or(0);
            word & !outer == 0
        })
    }

    /// Iterates the present tiles in ascending identifier order.
    #[must_use]
    pub fn iter(&self) -> PossibilitiesIter<'_> {
        PossibilitiesIter {
            words: &self.words,
            word_index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    fn clear_tail(&mut self) {
        let tail = self.capacity % WORD_BITS;
        if tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
    }
}

impl<'a> IntoIterator for &'a Possibilities {
    type Item = TileId;
    type IntoIter = PossibilitiesIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the tiles held by a [`Possibilities`] set.
#[derive(Clone, Debug)]
pub struct PossibilitiesIter<'a> {
    words: &'a [u64],
    word_index: usize,
    current: u64,
}

impl Iterator for PossibilitiesIter<'_> {
    type Item = TileId;

    fn next(&mut self) -> Option<TileId> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                let index = self.word_index * WORD_BITS + bit;
                return u32::try_from(index).ok().map(TileId::new);
            }
            self.word_index += 1;
            self.current = *self.words.get(self.word_index)?;
        }
    }
}

fn word_count(capacity: usize) -> usize {
    capacity.div_ceil(WORD_BITS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles(ids: &[u32]) -> Vec<TileId> {
        ids.iter().copied().map(TileId::new).collect()
    }

    #[test]
    fn full_set_respects_capacity() {
        let set = Possibilities::full(70);
        assert_eq!(set.len(), 70);
        assert!(set.contains(TileId::new(69)));
        assert!(!set.contains(TileId::new(70)));
    }

    #[test]
    fn iteration_is_ascending_across_words() {
        let set = Possibilities::from_tiles(130, tiles(&[129, 3, 64, 0]));
        let collected: Vec<_> = set.iter().collect();
        assert_eq!(collected, tiles(&[0, 3, 64, 129]));
    }

    #[test]
    fn intersection_reports_shrinkage() {
        let mut set = Possibilities::from_tiles(8, tiles(&[1, 2, 3]));
        let unchanged = set.intersect_with(&Possibilities::full(8));
        assert!(!unchanged);

        let changed = set.intersect_with(&Possibilities::from_tiles(8, tiles(&[2, 5])));
        assert!(changed);
        assert_eq!(set.iter().collect::<Vec<_>>(), tiles(&[2]));
    }

    #[test]
    fn union_accumulates_tiles() {
        let mut set = Possibilities::empty(8);
        set.union_with(&Possibilities::single(8, TileId::new(4)));
        set.union_with(&Possibilities::single(8, TileId::new(6)));
        assert_eq!(set.len(), 2);
        assert!(set.is_subset(&Possibilities::full(8)));
        assert!(!Possibilities::full(8).is_subset(&set));
    }

    #[test]
    fn out_of_range_tiles_are_ignored() {
        let mut set = Possibilities::empty(4);
        assert!(!set.insert(TileId::new(9)));
        assert!(set.is_empty());
        assert_eq!(set.first(), None);
    }
}

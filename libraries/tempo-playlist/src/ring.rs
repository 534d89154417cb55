//! Circular doubly linked ring
//!
//! Nodes live in an arena and link to each other by slot index, so splices
//! stay O(1) without self-referential pointers:
//!
//! ```text
//!        head                          tail = head.prev
//!         │                               │
//!   ┌──► [A] ◄──► [B] ◄──► [C] ◄──► [D] ◄─┘
//!   └─────────────────────────────────────┘
//! ```
//!
//! Positions are 1-based and always resolved by walking `next` from head.

use crate::error::{PlaylistError, Result};
use crate::types::Song;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// Stable handle to a node in a [`Ring`]
///
/// Handles carry a generation, so a handle to a removed node never resolves
/// again, even after its slot has been reused by a later insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// Arena slot
///
/// Links are only meaningful while `song` is `Some`.
#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    song: Option<Song>,
    next: usize,
    prev: usize,
}

/// Circular doubly linked list of songs
#[derive(Debug, Clone, Default)]
pub struct Ring {
    slots: Vec<Slot>,

    /// Vacant slot indices available for reuse
    free: Vec<usize>,

    /// Position 1, `None` iff the ring is empty
    head: Option<usize>,

    len: usize,
}

impl Ring {
    /// Create an empty ring
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of songs in the ring
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the ring is empty
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Handle of the node at position 1
    pub fn head(&self) -> Option<NodeId> {
        self.head.map(|index| self.id_of(index))
    }

    /// Handle of the node at position `len`
    pub fn tail(&self) -> Option<NodeId> {
        self.head.map(|index| self.id_of(self.slots[index].prev))
    }

    /// Whether the handle refers to a node currently in the ring
    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_some()
    }

    /// Song stored at a node
    pub fn get(&self, id: NodeId) -> Option<&Song> {
        self.resolve(id).and_then(|index| self.slots[index].song.as_ref())
    }

    /// Successor of a node (wraps from tail to head)
    pub fn next_id(&self, id: NodeId) -> Option<NodeId> {
        self.resolve(id).map(|index| self.id_of(self.slots[index].next))
    }

    /// Predecessor of a node (wraps from head to tail)
    pub fn prev_id(&self, id: NodeId) -> Option<NodeId> {
        self.resolve(id).map(|index| self.id_of(self.slots[index].prev))
    }

    /// Handle of the node at a 1-based position
    pub fn id_at(&self, position: usize) -> Option<NodeId> {
        self.index_at(position).map(|index| self.id_of(index))
    }

    /// Song at a 1-based position
    pub fn song_at(&self, position: usize) -> Option<&Song> {
        self.index_at(position)
            .and_then(|index| self.slots[index].song.as_ref())
    }

    /// 1-based position of a node, found by walking from head
    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        let target = self.resolve(id)?;
        self.indices()
            .position(|index| index == target)
            .map(|offset| offset + 1)
    }

    /// Songs in ring order, exactly one rotation starting at head
    pub fn iter(&self) -> impl Iterator<Item = &Song> + '_ {
        self.indices()
            .filter_map(move |index| self.slots[index].song.as_ref())
    }

    /// Node handles in ring order, exactly one rotation starting at head
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.indices().map(move |index| self.id_of(index))
    }

    /// Sum of all song durations, saturating at `Duration::MAX`
    pub fn total_duration(&self) -> Duration {
        self.iter()
            .fold(Duration::ZERO, |total, song| total.saturating_add(song.duration))
    }

    // ===== Editing =====

    /// Append a song after the current tail
    pub fn push_back(&mut self, song: Song) -> NodeId {
        let index = self.alloc(song);

        match self.head {
            None => self.head = Some(index),
            // Inserting before head on a ring lands the node at the tail
            Some(head) => self.link_before(index, head),
        }
        self.len += 1;

        debug!(len = self.len, "Appended song at tail");
        self.id_of(index)
    }

    /// Insert a song so that it ends up at `position` (1-based)
    ///
    /// Valid positions are `1..=len + 1`; `len + 1` appends.
    pub fn insert_at(&mut self, position: usize, song: Song) -> Result<NodeId> {
        if position < 1 || position > self.len + 1 {
            return Err(PlaylistError::PositionOutOfBounds {
                position,
                len: self.len,
            });
        }

        if position == self.len + 1 {
            return Ok(self.push_back(song));
        }

        let index = self.alloc(song);
        match self.head {
            Some(head) if position == 1 => {
                self.link_before(index, head);
                self.head = Some(index);
            }
            Some(head) => {
                let predecessor = self.walk(head, position - 2);
                let successor = self.slots[predecessor].next;
                self.link_before(index, successor);
            }
            // Empty ring only accepts position 1 == len + 1, handled above
            None => self.head = Some(index),
        }
        self.len += 1;

        debug!(position, len = self.len, "Inserted song");
        Ok(self.id_of(index))
    }

    /// Remove the song at `position` (1-based)
    ///
    /// Returns the handle the node had, so callers holding it can drop it,
    /// together with the removed song.
    pub fn remove_at(&mut self, position: usize) -> Result<(NodeId, Song)> {
        let Some(head) = self.head else {
            return Err(PlaylistError::EmptyPlaylist);
        };

        if position < 1 || position > self.len {
            return Err(PlaylistError::PositionOutOfBounds {
                position,
                len: self.len,
            });
        }

        let target = if position == 1 {
            head
        } else if position == self.len {
            self.slots[head].prev
        } else {
            let predecessor = self.walk(head, position - 2);
            self.slots[predecessor].next
        };

        let id = self.id_of(target);
        let len = self.len;
        let song = self
            .unlink(target)
            .ok_or(PlaylistError::PositionOutOfBounds { position, len })?;

        debug!(position, len = self.len, "Removed song");
        Ok((id, song))
    }

    /// Remove the node behind a handle
    pub fn remove(&mut self, id: NodeId) -> Option<Song> {
        let index = self.resolve(id)?;
        self.unlink(index)
    }

    /// Shuffle with the thread-local RNG
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    /// Fisher-Yates shuffle of the ring order
    ///
    /// Node identities survive: only links and head change, so every
    /// outstanding [`NodeId`] still refers to the same song afterwards.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.len < 2 {
            return;
        }

        let mut order: Vec<usize> = self.indices().collect();
        order.shuffle(rng);

        let n = order.len();
        for (i, &index) in order.iter().enumerate() {
            self.slots[index].next = order[(i + 1) % n];
            self.slots[index].prev = order[(i + n - 1) % n];
        }
        self.head = Some(order[0]);

        debug!(len = n, "Shuffled ring");
    }

    // ===== Validation =====

    /// Check every structural invariant of the ring
    ///
    /// - `n.next.prev == n` and `n.prev.next == n` for every node
    /// - head is set iff the ring holds songs
    /// - walking `next` (and `prev`) `len` times from head visits `len`
    ///   distinct live nodes and returns to head
    /// - no live node exists outside the rotation
    pub fn is_consistent(&self) -> bool {
        let live = self.slots.iter().filter(|slot| slot.song.is_some()).count();
        if live != self.len {
            return false;
        }

        let Some(head) = self.head else {
            return self.len == 0;
        };
        if self.len == 0 {
            return false;
        }

        let mut seen = HashSet::with_capacity(self.len);
        let mut index = head;
        for _ in 0..self.len {
            let slot = &self.slots[index];
            if slot.song.is_none() || !seen.insert(index) {
                return false;
            }
            if self.slots[slot.next].prev != index || self.slots[slot.prev].next != index {
                return false;
            }
            index = slot.next;
        }
        if index != head {
            return false;
        }

        let mut backwards = head;
        for _ in 0..self.len {
            backwards = self.slots[backwards].prev;
        }
        backwards == head
    }

    // ===== Internals =====

    fn id_of(&self, index: usize) -> NodeId {
        NodeId {
            index,
            generation: self.slots[index].generation,
        }
    }

    fn resolve(&self, id: NodeId) -> Option<usize> {
        let slot = self.slots.get(id.index)?;
        (slot.generation == id.generation && slot.song.is_some()).then_some(id.index)
    }

    fn index_at(&self, position: usize) -> Option<usize> {
        if position < 1 || position > self.len {
            return None;
        }
        self.head.map(|head| self.walk(head, position - 1))
    }

    /// Follow `next` from `start` for `steps` hops
    fn walk(&self, start: usize, steps: usize) -> usize {
        (0..steps).fold(start, |index, _| self.slots[index].next)
    }

    /// Slot indices for one rotation from head
    fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        let mut cursor = self.head;
        (0..self.len).map_while(move |_| {
            let index = cursor?;
            cursor = Some(self.slots[index].next);
            Some(index)
        })
    }

    /// Place a song in a self-linked slot
    fn alloc(&mut self, song: Song) -> usize {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.song = Some(song);
            slot.next = index;
            slot.prev = index;
            index
        } else {
            let index = self.slots.len();
            self.slots.push(Slot {
                generation: 0,
                song: Some(song),
                next: index,
                prev: index,
            });
            index
        }
    }

    /// Splice a detached node in front of `at`
    fn link_before(&mut self, index: usize, at: usize) {
        let before = self.slots[at].prev;
        self.slots[index].next = at;
        self.slots[index].prev = before;
        self.slots[before].next = index;
        self.slots[at].prev = index;
    }

    /// Splice a live node out, free its slot and hand back its song
    fn unlink(&mut self, index: usize) -> Option<Song> {
        let song = self.slots[index].song.take()?;

        if self.len == 1 {
            self.head = None;
        } else {
            let prev = self.slots[index].prev;
            let next = self.slots[index].next;
            self.slots[prev].next = next;
            self.slots[next].prev = prev;
            if self.head == Some(index) {
                self.head = Some(next);
            }
        }
        self.len -= 1;

        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        slot.next = index;
        slot.prev = index;
        self.free.push(index);
        Some(song)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ring_of(titles: &[&str]) -> Ring {
        let mut ring = Ring::new();
        for title in titles {
            ring.push_back(Song::new(*title, "Test Artist", 10));
        }
        ring
    }

    fn titles(ring: &Ring) -> Vec<String> {
        ring.iter().map(|song| song.title.clone()).collect()
    }

    #[test]
    fn empty_ring() {
        let ring = Ring::new();
        assert_eq!(ring.len(), 0);
        assert!(ring.is_empty());
        assert!(ring.head().is_none());
        assert!(ring.tail().is_none());
        assert_eq!(ring.iter().count(), 0);
        assert!(ring.is_consistent());
    }

    #[test]
    fn single_node_links_to_itself() {
        let ring = ring_of(&["A"]);
        let head = ring.head().unwrap();
        assert_eq!(ring.tail(), Some(head));
        assert_eq!(ring.next_id(head), Some(head));
        assert_eq!(ring.prev_id(head), Some(head));
        assert!(ring.is_consistent());
    }

    #[test]
    fn push_back_keeps_order() {
        let ring = ring_of(&["A", "B", "C"]);
        assert_eq!(titles(&ring), vec!["A", "B", "C"]);
        assert_eq!(ring.get(ring.tail().unwrap()).unwrap().title, "C");
        assert!(ring.is_consistent());
    }

    #[test]
    fn insert_at_front_moves_head() {
        let mut ring = ring_of(&["B", "C"]);
        let id = ring.insert_at(1, Song::new("A", "X", 1)).unwrap();
        assert_eq!(ring.head(), Some(id));
        assert_eq!(titles(&ring), vec!["A", "B", "C"]);
        assert_eq!(ring.get(ring.tail().unwrap()).unwrap().title, "C");
        assert!(ring.is_consistent());
    }

    #[test]
    fn insert_at_front_of_empty_ring() {
        let mut ring = Ring::new();
        let id = ring.insert_at(1, Song::new("A", "X", 1)).unwrap();
        assert_eq!(ring.head(), Some(id));
        assert_eq!(ring.tail(), Some(id));
        assert!(ring.is_consistent());
    }

    #[test]
    fn insert_in_middle() {
        let mut ring = ring_of(&["A", "B", "D"]);
        ring.insert_at(3, Song::new("C", "X", 1)).unwrap();
        assert_eq!(titles(&ring), vec!["A", "B", "C", "D"]);
        assert!(ring.is_consistent());
    }

    #[test]
    fn insert_at_len_plus_one_appends() {
        let mut ring = ring_of(&["A", "B"]);
        let id = ring.insert_at(3, Song::new("C", "X", 1)).unwrap();
        assert_eq!(ring.tail(), Some(id));
        assert_eq!(titles(&ring), vec!["A", "B", "C"]);
        assert!(ring.is_consistent());
    }

    #[test]
    fn insert_out_of_bounds_is_rejected_without_mutation() {
        let mut ring = ring_of(&["A", "B"]);
        for position in [0, 4, 100] {
            let err = ring.insert_at(position, Song::new("Z", "X", 1)).unwrap_err();
            assert_eq!(err, PlaylistError::PositionOutOfBounds { position, len: 2 });
        }
        assert_eq!(titles(&ring), vec!["A", "B"]);
        assert!(ring.is_consistent());
    }

    #[test]
    fn remove_head_tail_and_middle() {
        let mut ring = ring_of(&["A", "B", "C", "D", "E"]);

        let (_, song) = ring.remove_at(1).unwrap();
        assert_eq!(song.title, "A");
        assert_eq!(titles(&ring), vec!["B", "C", "D", "E"]);

        let (_, song) = ring.remove_at(4).unwrap();
        assert_eq!(song.title, "E");
        assert_eq!(titles(&ring), vec!["B", "C", "D"]);

        let (_, song) = ring.remove_at(2).unwrap();
        assert_eq!(song.title, "C");
        assert_eq!(titles(&ring), vec!["B", "D"]);

        assert!(ring.is_consistent());
    }

    #[test]
    fn remove_only_node_empties_ring() {
        let mut ring = ring_of(&["A"]);
        ring.remove_at(1).unwrap();
        assert!(ring.is_empty());
        assert!(ring.head().is_none());
        assert!(ring.is_consistent());
    }

    #[test]
    fn remove_from_empty_ring() {
        let mut ring = Ring::new();
        assert_eq!(ring.remove_at(1).unwrap_err(), PlaylistError::EmptyPlaylist);
    }

    #[test]
    fn remove_out_of_bounds() {
        let mut ring = ring_of(&["A", "B"]);
        for position in [0, 3] {
            assert_eq!(
                ring.remove_at(position).unwrap_err(),
                PlaylistError::PositionOutOfBounds { position, len: 2 }
            );
        }
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn removed_handle_never_resolves_again() {
        let mut ring = ring_of(&["A", "B"]);
        let (old, _) = ring.remove_at(2).unwrap();
        assert!(!ring.contains(old));

        // Reuses the freed slot with a new generation
        let new = ring.push_back(Song::new("C", "X", 1));
        assert_ne!(old, new);
        assert!(ring.get(old).is_none());
        assert_eq!(ring.get(new).unwrap().title, "C");
    }

    #[test]
    fn remove_by_handle() {
        let mut ring = ring_of(&["A", "B", "C"]);
        let b = ring.id_at(2).unwrap();
        assert_eq!(ring.remove(b).unwrap().title, "B");
        assert!(ring.remove(b).is_none());
        assert_eq!(titles(&ring), vec!["A", "C"]);
        assert!(ring.is_consistent());
    }

    #[test]
    fn position_lookup() {
        let ring = ring_of(&["A", "B", "C"]);
        let c = ring.id_at(3).unwrap();
        assert_eq!(ring.position_of(c), Some(3));
        assert_eq!(ring.song_at(2).unwrap().title, "B");
        assert!(ring.song_at(0).is_none());
        assert!(ring.song_at(4).is_none());
    }

    #[test]
    fn total_duration_sums_all_songs() {
        let mut ring = Ring::new();
        assert_eq!(ring.total_duration(), Duration::ZERO);
        ring.push_back(Song::new("A", "X", 10));
        ring.push_back(Song::new("B", "Y", 20));
        assert_eq!(ring.total_duration(), Duration::from_secs(30));
    }

    #[test]
    fn total_duration_saturates_instead_of_overflowing() {
        let mut ring = Ring::new();
        ring.push_back(Song::new("A", "X", u64::MAX));
        ring.push_back(Song::new("B", "Y", 1));
        assert_eq!(ring.total_duration(), Duration::MAX);
        assert_eq!(ring.total_duration().as_secs(), u64::MAX);
    }

    #[test]
    fn shuffle_preserves_songs_and_identity() {
        let mut ring = ring_of(&["A", "B", "C", "D", "E", "F"]);
        let ids: Vec<NodeId> = ring.ids().collect();

        let mut rng = StdRng::seed_from_u64(7);
        ring.shuffle_with(&mut rng);

        assert!(ring.is_consistent());
        assert_eq!(ring.len(), 6);

        let mut shuffled = titles(&ring);
        shuffled.sort();
        assert_eq!(shuffled, vec!["A", "B", "C", "D", "E", "F"]);

        // Same handles, same songs
        for (id, title) in ids.iter().zip(["A", "B", "C", "D", "E", "F"]) {
            assert_eq!(ring.get(*id).unwrap().title, title);
        }
    }

    #[test]
    fn shuffle_small_rings_is_noop() {
        let mut empty = Ring::new();
        empty.shuffle();
        assert!(empty.is_empty());

        let mut single = ring_of(&["A"]);
        single.shuffle();
        assert_eq!(titles(&single), vec!["A"]);
        assert!(single.is_consistent());
    }
}

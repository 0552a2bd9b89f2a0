use bit_set::BitSet;

use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordId;

/// The candidate words still considered possible for each slot, as sets of `WordId`s. Iteration
/// is always in ascending word id order, which keeps fills reproducible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    by_slot: Vec<BitSet>,
}

impl Domains {
    /// Give every slot the words from the dictionary that have the slot's length. This is node
    /// consistency: the length of a word is the only unary constraint on a slot.
    pub fn initialize(config: &GridConfig) -> Domains {
        let word_count = config.word_list.len();

        let by_slot = config
            .slot_configs
            .iter()
            .map(|slot_config| {
                let mut domain = BitSet::with_capacity(word_count);
                for &word_id in config.word_list.ids_of_length(slot_config.length) {
                    domain.insert(word_id);
                }
                domain
            })
            .collect();

        Domains { by_slot }
    }

    /// Remove a word from a slot's domain, returning whether it was there.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.by_slot[slot_id].remove(word_id)
    }

    /// Narrow a slot's domain down to the single given word.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        let domain = &mut self.by_slot[slot_id];
        domain.clear();
        domain.insert(word_id);
    }

    pub fn contains(&self, slot_id: SlotId, word_id: WordId) -> bool {
        self.by_slot[slot_id].contains(word_id)
    }

    pub fn len(&self, slot_id: SlotId) -> usize {
        self.by_slot[slot_id].len()
    }

    pub fn is_empty(&self, slot_id: SlotId) -> bool {
        self.by_slot[slot_id].is_empty()
    }

    pub fn iter(&self, slot_id: SlotId) -> impl Iterator<Item = WordId> + '_ {
        self.by_slot[slot_id].iter()
    }

    /// The lowest-numbered slot with nothing left in its domain, if any.
    pub fn first_empty(&self) -> Option<SlotId> {
        self.by_slot.iter().position(|domain| domain.is_empty())
    }

    /// Total number of candidate words across all slots.
    pub fn total_len(&self) -> usize {
        self.by_slot.iter().map(|domain| domain.len()).sum()
    }
}

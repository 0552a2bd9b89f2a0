use std::collections::{BTreeSet, HashMap};
use std::fmt::{Debug, Formatter};

use smallvec::SmallVec;

use crate::MAX_SLOT_LENGTH;

/// An identifier for a given word, based on its index in the `WordList`'s `words` field.
pub type WordId = usize;

/// A struct representing a word that can be chosen for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub chars: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    /// Length in grid cells, i.e. in chars rather than bytes.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// The dictionary a puzzle is filled from. Words are stored once each, sorted, so that a given
/// input always produces the same `WordId`s.
pub struct WordList {
    pub words: Vec<Word>,
    ids_by_length: HashMap<usize, Vec<WordId>>,
}

impl Debug for WordList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordList")
            .field("words", &format!("({} entries)", self.words.len()))
            .finish()
    }
}

impl WordList {
    pub fn new<I, S>(words: I) -> WordList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> =
            words.into_iter().map(|word| word.as_ref().to_string()).collect();

        let words: Vec<Word> = distinct
            .into_iter()
            .map(|string| Word { chars: string.chars().collect(), string })
            .collect();

        let mut ids_by_length: HashMap<usize, Vec<WordId>> = HashMap::new();
        for (word_id, word) in words.iter().enumerate() {
            ids_by_length.entry(word.len()).or_default().push(word_id);
        }

        WordList { words, ids_by_length }
    }

    /// All ids of words with exactly `length` chars, in ascending order.
    pub fn ids_of_length(&self, length: usize) -> &[WordId] {
        self.ids_by_length.get(&length).map(|ids| ids.as_slice()).unwrap_or(&[])
    }

    pub fn get(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }

    pub fn find(&self, string: &str) -> Option<WordId> {
        self.words.binary_search_by(|word| word.string.as_str().cmp(string)).ok()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

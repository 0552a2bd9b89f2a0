//! Grid filling by chronological backtracking. Domains are made arc consistent once before search
//! starts; after that, slots are chosen by fewest remaining candidates (ties going to the slot
//! with more crossings) and words are tried least-constraining first.

use std::cmp::Reverse;
use std::collections::HashMap;

use bit_set::BitSet;
use instant::{Duration, Instant};
use log::{debug, info, trace};

use crate::arc_consistency::{
    arcs_into, establish_arc_consistency, establish_arc_consistency_for_arcs, ArcConsistencyFailure,
};
use crate::domains::Domains;
use crate::error::FillFailure;
use crate::grid_config::{GridConfig, SlotId};
use crate::word_list::WordId;

/// The order in which a slot's candidate words are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueOrdering {
    /// Words that rule out the fewest options for crossing unfilled slots go first.
    #[default]
    LeastConstraining,

    /// Dictionary order.
    Natural,
}

/// Settings for a fill attempt.
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    pub value_ordering: ValueOrdering,

    /// Re-establish arc consistency around each tentative choice, on a copy of the domains, and
    /// reject the choice if that wipes out a crossing slot.
    pub inference: bool,

    /// Give up with `FillFailure::StateLimitExceeded` after this many search states.
    pub max_states: Option<u64>,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    /// Words removed by the initial arc consistency pass.
    pub eliminations: usize,
    pub duration: Duration,
}

/// A struct recording a slot assignment made during the filling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

#[derive(Debug, Clone)]
pub struct FillSuccess {
    pub statistics: Statistics,

    /// One choice per slot, in slot order.
    pub choices: Vec<Choice>,
}

/// A partial mapping from slots to words. No word is ever assigned to two slots at once.
#[derive(Debug, Clone)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    used_words: BitSet,
    assigned_count: usize,
}

impl Assignment {
    pub fn new(slot_count: usize) -> Assignment {
        Assignment { words: vec![None; slot_count], used_words: BitSet::new(), assigned_count: 0 }
    }

    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words[slot_id].is_some()
    }

    pub fn is_word_used(&self, word_id: WordId) -> bool {
        self.used_words.contains(word_id)
    }

    /// Complete iff every slot has a word.
    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.words.len()
    }

    pub fn len(&self) -> usize {
        self.assigned_count
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        debug_assert!(self.words[slot_id].is_none(), "slot {} is already assigned", slot_id);
        debug_assert!(!self.used_words.contains(word_id), "word {} is already used", word_id);

        self.words[slot_id] = Some(word_id);
        self.used_words.insert(word_id);
        self.assigned_count += 1;
    }

    /// Undo the assignment of a slot, returning the word it held.
    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        let word_id = self.words[slot_id].take()?;
        self.used_words.remove(word_id);
        self.assigned_count -= 1;
        Some(word_id)
    }

    pub fn choices(&self) -> Vec<Choice> {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| Choice { slot_id, word_id }))
            .collect()
    }
}

/// Pick the unassigned slot with the fewest remaining candidates, breaking ties by the number of
/// crossings (more first) and then by slot id. Returns `None` once every slot is assigned.
pub fn select_unassigned_slot(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<SlotId> {
    (0..config.slot_count())
        .filter(|&slot_id| !assignment.is_assigned(slot_id))
        .min_by_key(|&slot_id| {
            (domains.len(slot_id), Reverse(config.slot_configs[slot_id].degree()), slot_id)
        })
}

/// Return the candidates for `slot_id` in the order they should be tried. Nothing is removed from
/// any domain here; only the order changes.
pub fn order_domain_values(
    config: &GridConfig,
    domains: &Domains,
    assignment: &Assignment,
    slot_id: SlotId,
    ordering: ValueOrdering,
) -> Vec<WordId> {
    let mut word_ids: Vec<WordId> = domains.iter(slot_id).collect();

    if ordering == ValueOrdering::Natural {
        return word_ids;
    }

    // For each crossing into an unassigned slot, count how many of that slot's options place each
    // letter in the shared cell.
    let crossing_letter_counts: Vec<(usize, SlotId, usize, HashMap<char, usize>)> = config
        .slot_configs[slot_id]
        .crossings
        .iter()
        .enumerate()
        .filter_map(|(cell_idx, crossing)| {
            let crossing = crossing.as_ref()?;
            if assignment.is_assigned(crossing.other_slot_id) {
                return None;
            }

            let mut counts: HashMap<char, usize> = HashMap::new();
            for other_word_id in domains.iter(crossing.other_slot_id) {
                *counts
                    .entry(config.word(other_word_id).chars[crossing.other_slot_cell])
                    .or_default() += 1;
            }

            Some((cell_idx, crossing.other_slot_id, crossing.other_slot_cell, counts))
        })
        .collect();

    word_ids.sort_by_cached_key(|&word_id| {
        let word = config.word(word_id);

        let ruled_out: usize = crossing_letter_counts
            .iter()
            .map(|(cell_idx, other_slot_id, other_slot_cell, counts)| {
                let letter = word.chars[*cell_idx];
                let compatible = counts.get(&letter).copied().unwrap_or(0);

                // The word itself can't be reused in the crossing slot, even if the letters agree.
                let reused = domains.contains(*other_slot_id, word_id)
                    && word.chars[*other_slot_cell] == letter;

                domains.len(*other_slot_id) - compatible + usize::from(reused)
            })
            .sum();

        (ruled_out, word_id)
    });

    word_ids
}

/// Can `word_id` go in `slot_id` given everything already assigned? The word must not be in use
/// elsewhere, and must agree with every assigned crossing slot at the shared cell.
pub fn is_consistent(
    config: &GridConfig,
    assignment: &Assignment,
    slot_id: SlotId,
    word_id: WordId,
) -> bool {
    if assignment.is_word_used(word_id) {
        return false;
    }

    let word = config.word(word_id);
    let slot_config = &config.slot_configs[slot_id];
    if word.len() != slot_config.length {
        return false;
    }

    slot_config.crossings.iter().enumerate().all(|(cell_idx, crossing)| match crossing {
        Some(crossing) => match assignment.get(crossing.other_slot_id) {
            Some(other_word_id) => {
                config.word(other_word_id).chars[crossing.other_slot_cell] == word.chars[cell_idx]
            }
            None => true,
        },
        None => true,
    })
}

struct Search<'a> {
    config: &'a GridConfig,
    options: &'a FillOptions,
    statistics: Statistics,
}

impl<'a> Search<'a> {
    /// Extend `assignment` until it's complete, returning `Ok(false)` if no extension works. On
    /// `Ok(false)` the assignment is left as it was passed in.
    fn backtrack(
        &mut self,
        domains: &Domains,
        assignment: &mut Assignment,
    ) -> Result<bool, FillFailure> {
        if assignment.is_complete() {
            return Ok(true);
        }

        let Some(slot_id) = select_unassigned_slot(self.config, domains, assignment) else {
            return Ok(true);
        };

        let word_ids = order_domain_values(
            self.config,
            domains,
            assignment,
            slot_id,
            self.options.value_ordering,
        );

        for word_id in word_ids {
            if !is_consistent(self.config, assignment, slot_id, word_id) {
                continue;
            }

            self.statistics.states += 1;
            if let Some(limit) = self.options.max_states {
                if self.statistics.states > limit {
                    return Err(FillFailure::StateLimitExceeded { limit });
                }
            }

            trace!(
                "trying {} in slot {} ({} of {} slots assigned)",
                self.config.word(word_id).string,
                slot_id,
                assignment.len(),
                self.config.slot_count(),
            );
            assignment.assign(slot_id, word_id);

            let filled = if self.options.inference {
                let mut narrowed = domains.clone();
                narrowed.assign(slot_id, word_id);

                match establish_arc_consistency_for_arcs(
                    self.config,
                    &mut narrowed,
                    arcs_into(self.config, slot_id),
                ) {
                    Ok(_) => self.backtrack(&narrowed, assignment)?,
                    Err(ArcConsistencyFailure { slot_id: emptied_slot_id }) => {
                        trace!("choice for slot {} empties slot {}", slot_id, emptied_slot_id);
                        false
                    }
                }
            } else {
                self.backtrack(domains, assignment)?
            };

            if filled {
                return Ok(true);
            }

            assignment.unassign(slot_id);
            self.statistics.backtracks += 1;
            debug!("backtracking from {} in slot {}", self.config.word(word_id).string, slot_id);
        }

        Ok(false)
    }
}

/// Build the domains search starts from: node consistency followed by a full arc consistency
/// pass. Fails if either leaves a slot with no candidates.
pub fn prepare_domains(config: &GridConfig) -> Result<(Domains, usize), FillFailure> {
    let mut domains = Domains::initialize(config);

    if let Some(slot_id) = domains.first_empty() {
        info!("slot {} has no words of length {}", slot_id, config.slot_configs[slot_id].length);
        return Err(FillFailure::DomainWipeout { slot_id });
    }

    match establish_arc_consistency(config, &mut domains) {
        Ok(success) => {
            info!(
                "arc consistency removed {} candidates in {} revisions, {} remain",
                success.eliminations,
                success.revisions,
                domains.total_len(),
            );
            Ok((domains, success.eliminations))
        }
        Err(ArcConsistencyFailure { slot_id }) => {
            info!("arc consistency left slot {} without candidates", slot_id);
            Err(FillFailure::DomainWipeout { slot_id })
        }
    }
}

/// Search for a valid fill for the given grid using the default options.
pub fn find_fill(config: &GridConfig) -> Result<FillSuccess, FillFailure> {
    find_fill_with_options(config, &FillOptions::default())
}

/// Search for a valid fill for the given grid.
pub fn find_fill_with_options(
    config: &GridConfig,
    options: &FillOptions,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();
    info!(
        "filling {} slots from {} words with {:?}",
        config.slot_count(),
        config.word_list.len(),
        options,
    );

    let (domains, eliminations) = prepare_domains(config)?;

    let mut search = Search {
        config,
        options,
        statistics: Statistics { eliminations, ..Statistics::default() },
    };
    let mut assignment = Assignment::new(config.slot_count());

    let filled = search.backtrack(&domains, &mut assignment)?;

    let mut statistics = search.statistics;
    statistics.duration = start.elapsed();

    if !filled {
        info!("search exhausted: {:?}", statistics);
        return Err(FillFailure::SearchExhausted { states: statistics.states });
    }

    info!("found a fill: {:?}", statistics);

    Ok(FillSuccess { statistics, choices: assignment.choices() })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::backtracking_search::{
        find_fill, find_fill_with_options, is_consistent, order_domain_values, prepare_domains,
        select_unassigned_slot, Assignment, Choice, FillOptions, ValueOrdering,
    };
    use crate::domains::Domains;
    use crate::error::FillFailure;
    use crate::grid_config::GridConfig;
    use crate::load::parse_structure;
    use crate::solution::render_grid;
    use crate::word_list::WordList;

    fn config(template: &str, words: &[&str]) -> GridConfig {
        GridConfig::from_fillable(WordList::new(words), parse_structure(template)).unwrap()
    }

    fn fill_strings(config: &GridConfig, choices: &[Choice]) -> Vec<String> {
        choices.iter().map(|choice| config.word(choice.word_id).string.clone()).collect()
    }

    fn all_options() -> Vec<FillOptions> {
        let mut result = vec![];
        for value_ordering in [ValueOrdering::LeastConstraining, ValueOrdering::Natural] {
            for inference in [false, true] {
                result.push(FillOptions { value_ordering, inference, max_states: None });
            }
        }
        result
    }

    /// Every slot is filled exactly once, with a distinct word of the right length, and crossing
    /// slots agree on their shared letters.
    fn assert_valid_fill(config: &GridConfig, choices: &[Choice]) {
        assert_eq!(choices.len(), config.slot_count());

        let slot_ids: HashSet<_> = choices.iter().map(|choice| choice.slot_id).collect();
        assert_eq!(slot_ids.len(), config.slot_count());

        let word_ids: HashSet<_> = choices.iter().map(|choice| choice.word_id).collect();
        assert_eq!(word_ids.len(), choices.len(), "words are not distinct");

        let word_for_slot = |slot_id| {
            let choice = choices.iter().find(|choice| choice.slot_id == slot_id).unwrap();
            config.word(choice.word_id)
        };

        for slot_config in &config.slot_configs {
            let word = word_for_slot(slot_config.id);
            assert_eq!(word.len(), slot_config.length);

            for other_slot_id in slot_config.neighbors() {
                let (i, j) = config.overlap(slot_config.id, other_slot_id).unwrap();
                assert_eq!(word.chars[i], word_for_slot(other_slot_id).chars[j]);
            }
        }
    }

    #[test]
    fn test_two_crossing_slots_without_matching_letters() {
        // Across needs a middle letter that the down word starts with; none of these fit.
        let config = config("___\n#_#\n#_#", &["CAT", "DOG", "TAB"]);

        let failure = find_fill(&config).unwrap_err();

        assert!(matches!(failure, FillFailure::DomainWipeout { .. }));
        assert!(failure.is_no_solution());
    }

    #[test]
    fn test_two_crossing_slots_with_matching_letters() {
        let config = config("___\n#_#\n#_#", &["CAT", "DOG", "TAB", "ACE"]);

        let result = find_fill(&config).unwrap();

        assert_valid_fill(&config, &result.choices);
        assert_eq!(fill_strings(&config, &result.choices), vec!["CAT", "ACE"]);
    }

    #[test]
    fn test_isolated_slot() {
        let config = config("____", &["WORD", "PLAY"]);

        let result = find_fill(&config).unwrap();

        assert_eq!(result.choices.len(), 1);
        let word = &config.word(result.choices[0].word_id).string;
        assert!(word == "WORD" || word == "PLAY");
    }

    #[test]
    fn test_node_consistency_wipeout_skips_search() {
        let config = config("____", &["CAT", "DOG", "HOUSE"]);

        assert_eq!(find_fill(&config).unwrap_err(), FillFailure::DomainWipeout { slot_id: 0 });
        assert!(prepare_domains(&config).is_err());
    }

    #[test]
    fn test_duplicate_words_are_rejected() {
        // 3 across and 3 down sharing their first cell. The only word fits both slots.
        let config = config("___\n_##\n_##", &["AAA"]);

        let failure = find_fill(&config).unwrap_err();

        assert_eq!(failure, FillFailure::SearchExhausted { states: 1 });
        assert!(failure.is_no_solution());
    }

    #[test]
    fn test_duplicate_words_with_an_alternative() {
        let config = config("___\n_##\n_##", &["AAA", "ABC"]);

        let result = find_fill(&config).unwrap();

        assert_valid_fill(&config, &result.choices);
    }

    #[test]
    fn test_recovers_from_dead_end() {
        // In dictionary order ANT goes into the across slot first, but nothing else starts with A.
        let config = config("___\n_##\n_##", &["ANT", "BIT", "BOX"]);
        let options =
            FillOptions { value_ordering: ValueOrdering::Natural, ..FillOptions::default() };

        let result = find_fill_with_options(&config, &options).unwrap();

        assert_valid_fill(&config, &result.choices);
        assert_eq!(fill_strings(&config, &result.choices), vec!["BIT", "BOX"]);
        assert_eq!(result.statistics.backtracks, 1);
        assert_eq!(result.statistics.states, 3);
    }

    #[test]
    fn test_least_constraining_value_avoids_dead_end() {
        let config = config("___\n_##\n_##", &["ANT", "BIT", "BOX"]);

        let result = find_fill(&config).unwrap();

        assert_eq!(fill_strings(&config, &result.choices), vec!["BIT", "BOX"]);
        assert_eq!(result.statistics.backtracks, 0);
    }

    #[test]
    fn test_order_domain_values() {
        let config = config("___\n_##\n_##", &["ANT", "BIT", "BOX"]);
        let domains = Domains::initialize(&config);
        let assignment = Assignment::new(config.slot_count());

        let natural =
            order_domain_values(&config, &domains, &assignment, 0, ValueOrdering::Natural);
        let least_constraining = order_domain_values(
            &config,
            &domains,
            &assignment,
            0,
            ValueOrdering::LeastConstraining,
        );

        let strings = |word_ids: Vec<usize>| -> Vec<String> {
            word_ids.into_iter().map(|word_id| config.word(word_id).string.clone()).collect()
        };
        assert_eq!(strings(natural), vec!["ANT", "BIT", "BOX"]);
        assert_eq!(strings(least_constraining), vec!["BIT", "BOX", "ANT"]);

        // Domains are untouched by ordering.
        assert_eq!(domains, Domains::initialize(&config));
    }

    #[test]
    fn test_order_domain_values_ignores_assigned_crossings() {
        // ___
        // _#_
        // _#_
        // Slot 0 crosses slot 1 at its first cell and slot 2 at its last cell.
        let config = config("___\n_#_\n_#_", &["CAT", "TAC", "COD"]);
        let domains = Domains::initialize(&config);
        let cod = config.word_list.find("COD").unwrap();

        let lcv_strings = |assignment: &Assignment| -> Vec<String> {
            order_domain_values(
                &config,
                &domains,
                assignment,
                0,
                ValueOrdering::LeastConstraining,
            )
            .into_iter()
            .map(|word_id| config.word(word_id).string.clone())
            .collect()
        };

        // Both crossings count.
        let assignment = Assignment::new(config.slot_count());
        assert_eq!(lcv_strings(&assignment), vec!["CAT", "TAC", "COD"]);

        // Only slot 1 counts: C is the most common first letter.
        let mut assignment = Assignment::new(config.slot_count());
        assignment.assign(2, cod);
        assert_eq!(lcv_strings(&assignment), vec!["CAT", "COD", "TAC"]);

        // Only slot 2 counts: a word ending in C leaves it the most options.
        let mut assignment = Assignment::new(config.slot_count());
        assignment.assign(1, cod);
        assert_eq!(lcv_strings(&assignment), vec!["TAC", "CAT", "COD"]);
    }

    #[test]
    fn test_select_unassigned_slot_prefers_small_domains() {
        // Slot 0 is 4 across, slot 1 is 3 down.
        let config = config("____\n_###\n_###", &["WORD", "WOKE", "WAX"]);
        let domains = Domains::initialize(&config);
        let mut assignment = Assignment::new(config.slot_count());

        assert_eq!(select_unassigned_slot(&config, &domains, &assignment), Some(1));

        assignment.assign(1, config.word_list.find("WAX").unwrap());
        assert_eq!(select_unassigned_slot(&config, &domains, &assignment), Some(0));

        assignment.assign(0, config.word_list.find("WORD").unwrap());
        assert!(assignment.is_complete());
        assert_eq!(select_unassigned_slot(&config, &domains, &assignment), None);
    }

    #[test]
    fn test_select_unassigned_slot_breaks_ties_by_degree() {
        // ___
        // #_#
        // ___
        // Both across slots cross only the down slot, which crosses both.
        let config = config("___\n#_#\n___", &["ABC", "DEF", "GHI"]);
        let domains = Domains::initialize(&config);
        let assignment = Assignment::new(config.slot_count());

        assert_eq!(select_unassigned_slot(&config, &domains, &assignment), Some(2));
    }

    #[test]
    fn test_is_consistent() {
        let config = config("___\n#_#\n#_#", &["ACE", "CAT", "TAB"]);
        let ace = config.word_list.find("ACE").unwrap();
        let cat = config.word_list.find("CAT").unwrap();
        let tab = config.word_list.find("TAB").unwrap();

        let mut assignment = Assignment::new(config.slot_count());
        assignment.assign(1, ace);

        assert!(is_consistent(&config, &assignment, 0, cat));
        assert!(is_consistent(&config, &assignment, 0, tab));
        assert!(!is_consistent(&config, &assignment, 0, ace));

        assert_eq!(assignment.unassign(1), Some(ace));
        assert_eq!(assignment.unassign(1), None);
        assert!(assignment.is_empty());
        assert!(is_consistent(&config, &assignment, 0, ace));
    }

    #[test]
    fn test_state_limit() {
        let config = config("___\n_##\n_##", &["ANT", "BIT", "BOX"]);
        let options = FillOptions {
            value_ordering: ValueOrdering::Natural,
            inference: false,
            max_states: Some(1),
        };

        let failure = find_fill_with_options(&config, &options).unwrap_err();

        assert_eq!(failure, FillFailure::StateLimitExceeded { limit: 1 });
        assert!(!failure.is_no_solution());
    }

    #[test]
    fn test_grid_without_slots() {
        let config = config("#_#\n_#_", &["CAT"]);

        let result = find_fill(&config).unwrap();

        assert!(result.choices.is_empty());
    }

    #[test]
    fn test_word_square_with_every_option_combination() {
        // CAT / ORE / WED across, COW / ARE / TED down (or the transpose).
        let config = config(
            "___\n___\n___",
            &["CAT", "ORE", "WED", "COW", "ARE", "TED", "DOG", "CAR", "TEA", "ODE", "WAR"],
        );

        for options in all_options() {
            let result = find_fill_with_options(&config, &options).unwrap();

            println!("{:?}", result.statistics);
            println!("{}", render_grid(&config, &result.choices));

            assert_valid_fill(&config, &result.choices);
        }
    }

    #[test]
    fn test_unique_fill_is_independent_of_options() {
        // ____
        // _##_
        // ____
        let config = config(
            "____\n_##_\n____",
            &["ABCD", "GHIJ", "AXYZ", "AEG", "DFJ", "ZQG"],
        );

        for options in all_options() {
            let result = find_fill_with_options(&config, &options).unwrap();
            assert_eq!(
                fill_strings(&config, &result.choices),
                vec!["ABCD", "GHIJ", "AEG", "DFJ"],
                "{:?}",
                options,
            );
        }
    }

    #[test]
    fn test_unsatisfiable_for_every_option_combination() {
        let config = config("___\n_##\n_##", &["AAA", "BBB"]);

        for options in all_options() {
            assert!(find_fill_with_options(&config, &options).unwrap_err().is_no_solution());
        }
    }
}

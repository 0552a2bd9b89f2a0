//! Constraint propagation using AC-3. Each arc `(x, y)` says "every word left in `x`'s domain must
//! agree with at least one word left in `y`'s domain at the cell they share".

use std::collections::{HashSet, VecDeque};

use log::{debug, trace};

use crate::domains::Domains;
use crate::grid_config::{GridConfig, SlotId};

/// A directed binary constraint between two crossing slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintArc {
    pub x: SlotId,
    pub y: SlotId,
}

/// FIFO queue of arcs waiting to be revised. An arc already waiting in the queue isn't added a
/// second time.
#[derive(Debug)]
struct ConsistencyQueue {
    queue: VecDeque<ConstraintArc>,
    queued: HashSet<ConstraintArc>,
}

impl ConsistencyQueue {
    fn new() -> ConsistencyQueue {
        ConsistencyQueue { queue: VecDeque::new(), queued: HashSet::new() }
    }

    fn pop_front(&mut self) -> Option<ConstraintArc> {
        let arc = self.queue.pop_front()?;
        self.queued.remove(&arc);
        Some(arc)
    }

    fn enqueue(&mut self, arc: ConstraintArc) {
        if self.queued.insert(arc) {
            self.queue.push_back(arc);
        }
    }
}

/// Results from a call to `establish_arc_consistency`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many words were removed from domains in total.
    pub eliminations: usize,

    /// How many arcs were revised.
    pub revisions: usize,
}

/// Propagation emptied a slot's domain, so there's no way to fill the grid from these domains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Every ordered pair of distinct slots that cross. Pairs that don't share a cell carry no
/// constraint, so they're left out entirely.
pub fn all_arcs(config: &GridConfig) -> Vec<ConstraintArc> {
    config
        .slot_configs
        .iter()
        .flat_map(|slot_config| {
            slot_config.neighbors().map(move |y| ConstraintArc { x: slot_config.id, y })
        })
        .collect()
}

/// The arcs pointing at `slot_id` from each of its neighbors, i.e. the arcs whose support may have
/// been lost when `slot_id`'s domain shrank.
pub fn arcs_into(config: &GridConfig, slot_id: SlotId) -> impl Iterator<Item = ConstraintArc> + '_ {
    config.neighbors(slot_id).map(move |z| ConstraintArc { x: z, y: slot_id })
}

/// Remove every word from `x`'s domain that has no compatible word in `y`'s domain. Returns the
/// number of words removed.
pub fn revise(config: &GridConfig, domains: &mut Domains, arc: ConstraintArc) -> usize {
    let Some((i, j)) = config.overlap(arc.x, arc.y) else {
        return 0;
    };

    // The letters `y` can still put in the shared cell.
    let supported: HashSet<char> =
        domains.iter(arc.y).map(|word_id| config.word(word_id).chars[j]).collect();

    let unsupported: Vec<_> = domains
        .iter(arc.x)
        .filter(|&word_id| !supported.contains(&config.word(word_id).chars[i]))
        .collect();

    for &word_id in &unsupported {
        domains.remove(arc.x, word_id);
    }

    unsupported.len()
}

/// Make every domain arc consistent with respect to every crossing in the grid.
pub fn establish_arc_consistency(
    config: &GridConfig,
    domains: &mut Domains,
) -> ArcConsistencyResult {
    establish_arc_consistency_for_arcs(config, domains, all_arcs(config))
}

/// Run AC-3 starting from the given arcs only. This is how the consequences of narrowing a few
/// domains get propagated without revisiting the whole grid. Self-arcs and arcs between slots
/// that don't cross are ignored.
pub fn establish_arc_consistency_for_arcs<Arcs>(
    config: &GridConfig,
    domains: &mut Domains,
    arcs: Arcs,
) -> ArcConsistencyResult
where
    Arcs: IntoIterator<Item = ConstraintArc>,
{
    let mut queue = ConsistencyQueue::new();
    for arc in arcs {
        if arc.x != arc.y && config.overlap(arc.x, arc.y).is_some() {
            queue.enqueue(arc);
        }
    }

    let mut success = ArcConsistencySuccess::default();

    while let Some(arc) = queue.pop_front() {
        success.revisions += 1;

        let removed = revise(config, domains, arc);
        if removed == 0 {
            continue;
        }

        success.eliminations += removed;
        trace!("revising {:?} removed {} words from slot {}", arc, removed, arc.x);

        if domains.is_empty(arc.x) {
            debug!("arc consistency emptied the domain of slot {}", arc.x);
            return Err(ArcConsistencyFailure { slot_id: arc.x });
        }

        // `x` lost words, so anything that relied on them for support has to be checked again.
        for neighbor_arc in arcs_into(config, arc.x) {
            queue.enqueue(neighbor_arc);
        }
    }

    Ok(success)
}

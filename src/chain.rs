// wavechain -- a generator for composite periodic test signals
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A wave chain is an ordered list of stages that together describe a composite signal.
//!
//! The stages live in an arena and are linked to their neighbours by handles,
//! so that inserting, deleting and swapping stages are constant time operations.
//! One stage may be selected; all editing operations act relative to the selection.

use log::trace;
use snafu::Snafu;

use crate::stage::WaveStage;
use crate::wave::SampleGrid;

/// Inconsistencies found by [`WaveChain::check_links`].
#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum LinkError {
    #[snafu(display("Stage {:?} is linked but not in the chain", id))]
    Dangling { id: StageId },
    #[snafu(display(
        "Stage {:?} links back to {:?} instead of {:?}",
        id,
        found,
        expected
    ))]
    BrokenBackLink {
        id: StageId,
        found: Option<StageId>,
        expected: Option<StageId>,
    },
    #[snafu(display("The walk from the head does not terminate"))]
    Cycle,
    #[snafu(display("The walk ended at {:?} but the tail is {:?}", end, tail))]
    WrongTail {
        end: Option<StageId>,
        tail: Option<StageId>,
    },
    #[snafu(display(
        "Visited {} and stored {} stages, but the chain has {}",
        visited,
        occupied,
        len
    ))]
    WrongLength {
        visited: usize,
        occupied: usize,
        len: usize,
    },
    #[snafu(display("The selection {:?} is not in the chain", id))]
    StaleSelection { id: StageId },
    #[snafu(display("A non-empty chain has no selection"))]
    MissingSelection,
}

/// Stable handle to a stage in a chain.
///
/// Handles of deleted stages are never resolved again, even when their slot is reused.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub struct StageId {
    index: usize,
    generation: u32,
}

struct Slot {
    generation: u32,
    link: Option<Link>,
}

struct Link {
    stage: WaveStage,
    previous: Option<StageId>,
    next: Option<StageId>,
}

/// The ordered stages of a composite signal, together with how the signal is sampled.
pub struct WaveChain {
    slots: Vec<Slot>,
    free: Vec<usize>,
    head: Option<StageId>,
    tail: Option<StageId>,
    selected: Option<StageId>,
    len: usize,
    grid: SampleGrid,
}

impl Default for WaveChain {
    fn default() -> Self {
        Self::new(SampleGrid::default())
    }
}

impl WaveChain {
    pub fn new(grid: SampleGrid) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            selected: None,
            len: 0,
            grid,
        }
    }

    pub fn grid(&self) -> SampleGrid {
        self.grid
    }

    pub fn set_grid(&mut self, grid: SampleGrid) {
        self.grid = grid;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The first stage, which is combined last.
    pub fn head(&self) -> Option<StageId> {
        self.head
    }

    /// The last stage, which seeds the signal.
    pub fn tail(&self) -> Option<StageId> {
        self.tail
    }

    pub fn selected_id(&self) -> Option<StageId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&WaveStage> {
        self.selected.and_then(move |id| self.get(id))
    }

    pub fn selected_mut(&mut self) -> Option<&mut WaveStage> {
        match self.selected {
            Some(id) => self.get_mut(id),
            None => None,
        }
    }

    /// Select a stage by its handle. Returns `false` if the handle is stale.
    pub fn select(&mut self, id: StageId) -> bool {
        if self.link(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: StageId) -> Option<&WaveStage> {
        self.link(id).map(|link| &link.stage)
    }

    pub fn get_mut(&mut self, id: StageId) -> Option<&mut WaveStage> {
        self.link_mut(id).map(|link| &mut link.stage)
    }

    pub fn previous(&self, id: StageId) -> Option<StageId> {
        self.link(id).and_then(|link| link.previous)
    }

    pub fn next(&self, id: StageId) -> Option<StageId> {
        self.link(id).and_then(|link| link.next)
    }

    /// Iterate over the stages from head to tail. Use `.rev()` for folding order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            chain: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    /// Insert a default stage right after the selected one (or as the only stage
    /// of an empty chain) and select it.
    pub fn add(&mut self) -> StageId {
        self.insert(WaveStage::default())
    }

    /// Like [`add`](Self::add), but with the given stage parameters.
    pub fn insert(&mut self, stage: WaveStage) -> StageId {
        let previous = self.selected;
        let next = previous.and_then(|id| self.next(id));
        let id = self.alloc(Link {
            stage,
            previous,
            next,
        });

        match previous {
            Some(p) => self.set_next(p, Some(id)),
            None => self.head = Some(id),
        }
        match next {
            Some(n) => self.set_previous(n, Some(id)),
            None => self.tail = Some(id),
        }

        self.selected = Some(id);
        self.len += 1;
        trace!("added stage {:?} after {:?}", id, previous);
        id
    }

    /// Remove the selected stage and return its parameters.
    ///
    /// Afterwards, the previous stage is selected if there is one, else the next one.
    pub fn delete(&mut self) -> Option<WaveStage> {
        let id = self.selected?;
        let link = self.release(id)?;

        match link.previous {
            Some(p) => self.set_next(p, link.next),
            None => self.head = link.next,
        }
        match link.next {
            Some(n) => self.set_previous(n, link.previous),
            None => self.tail = link.previous,
        }

        self.selected = link.previous.or(link.next);
        self.len -= 1;
        trace!("deleted stage {:?}, selected {:?}", id, self.selected);
        Some(link.stage)
    }

    /// Swap the selected stage with its previous neighbour.
    pub fn move_up(&mut self) {
        if let Some(id) = self.selected {
            if let Some(previous) = self.previous(id) {
                self.swap_adjacent(previous, id);
                trace!("moved stage {:?} up", id);
            }
        }
    }

    /// Swap the selected stage with its next neighbour.
    pub fn move_down(&mut self) {
        if let Some(id) = self.selected {
            if let Some(next) = self.next(id) {
                self.swap_adjacent(id, next);
                trace!("moved stage {:?} down", id);
            }
        }
    }

    /// Move the selection one stage toward the head.
    pub fn select_previous(&mut self) {
        if let Some(previous) = self.selected.and_then(|id| self.previous(id)) {
            self.selected = Some(previous);
        }
    }

    /// Move the selection one stage toward the tail.
    pub fn select_next(&mut self) {
        if let Some(next) = self.selected.and_then(|id| self.next(id)) {
            self.selected = Some(next);
        }
    }

    /// Verify that the links of the chain are mutually consistent:
    /// every stage is the previous stage of its successor and the next
    /// stage of its predecessor, and walking from head to tail visits each
    /// stage exactly once.
    pub fn check_links(&self) -> Result<(), LinkError> {
        let mut visited = 0;
        let mut previous = None;
        let mut current = self.head;

        while let Some(id) = current {
            let link = self.link(id).ok_or(LinkError::Dangling { id })?;
            if link.previous != previous {
                return Err(LinkError::BrokenBackLink {
                    id,
                    found: link.previous,
                    expected: previous,
                });
            }
            visited += 1;
            if visited > self.len {
                return Err(LinkError::Cycle);
            }
            previous = current;
            current = link.next;
        }

        if previous != self.tail {
            return Err(LinkError::WrongTail {
                end: previous,
                tail: self.tail,
            });
        }
        let occupied = self.slots.iter().filter(|s| s.link.is_some()).count();
        if visited != self.len || occupied != self.len {
            return Err(LinkError::WrongLength {
                visited,
                occupied,
                len: self.len,
            });
        }
        match self.selected {
            Some(id) if self.link(id).is_none() => Err(LinkError::StaleSelection { id }),
            None if self.len > 0 => Err(LinkError::MissingSelection),
            _ => Ok(()),
        }
    }

    /// Swap two neighbouring stages, `a` directly followed by `b`.
    fn swap_adjacent(&mut self, a: StageId, b: StageId) {
        let before = self.previous(a);
        let after = self.next(b);

        match before {
            Some(p) => self.set_next(p, Some(b)),
            None => self.head = Some(b),
        }
        match after {
            Some(n) => self.set_previous(n, Some(a)),
            None => self.tail = Some(a),
        }

        self.set_previous(b, before);
        self.set_next(b, Some(a));
        self.set_previous(a, Some(b));
        self.set_next(a, after);
    }

    fn link(&self, id: StageId) -> Option<&Link> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.link.as_ref())
    }

    fn link_mut(&mut self, id: StageId) -> Option<&mut Link> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.link.as_mut())
    }

    fn set_previous(&mut self, id: StageId, previous: Option<StageId>) {
        if let Some(link) = self.link_mut(id) {
            link.previous = previous;
        }
    }

    fn set_next(&mut self, id: StageId, next: Option<StageId>) {
        if let Some(link) = self.link_mut(id) {
            link.next = next;
        }
    }

    fn alloc(&mut self, link: Link) -> StageId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.link = Some(link);
                StageId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    link: Some(link),
                });
                StageId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn release(&mut self, id: StageId) -> Option<Link> {
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)?;
        let link = slot.link.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(link)
    }
}

/// Iterator over the stages of a chain, see [`WaveChain::iter`].
pub struct Iter<'a> {
    chain: &'a WaveChain,
    front: Option<StageId>,
    back: Option<StageId>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (StageId, &'a WaveStage);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        let link = self.chain.link(id)?;
        self.front = link.next;
        self.remaining -= 1;
        Some((id, &link.stage))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        let link = self.chain.link(id)?;
        self.back = link.previous;
        self.remaining -= 1;
        Some((id, &link.stage))
    }
}

impl<'a> ExactSizeIterator for Iter<'a> {}

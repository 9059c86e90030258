//! Cell pool with free-list recycling and growth by doubling.
//!
//! Every term node occupies one slot of a single growable vector. Released
//! slots are threaded onto a free list through the slot itself and handed out
//! again before the pool grows. Each slot carries a generation counter that is
//! bumped on release, which makes stale [`TermId`]s detectable.

use crate::error::{LexpError, Result};
use crate::term::{Node, TermId, Var};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Largest number of cells addressable by a [`TermId`].
pub const MAX_CELLS: usize = u32::MAX as usize;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub initial_capacity: usize,
    pub max_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            initial_capacity: 1024,
            max_capacity: MAX_CELLS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    node: Node,
    // Binding distance; only meaningful right after distance annotation.
    bdist: i64,
}

#[derive(Debug, Clone, Copy)]
enum Entry {
    Free { next: Option<u32> },
    Occupied(Cell),
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    entry: Entry,
}

impl Default for Slot {
    fn default() -> Self {
        Slot {
            generation: 0,
            entry: Entry::Free { next: None },
        }
    }
}

/// Summary of pool usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolInfo {
    pub capacity: usize,
    pub live: usize,
    pub free: usize,
    pub allocated: u64,
    pub freed: u64,
}

impl PoolInfo {
    /// Live cells not accounted for by the allocation counters.
    pub fn leaked(&self) -> i64 {
        self.live as i64 - (self.allocated as i64 - self.freed as i64)
    }
}

impl fmt::Display for PoolInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pool info: {} slots, {} used, {} free: cumulative {} allocated, {} freed, {} leaked",
            self.capacity,
            self.live,
            self.free,
            self.allocated,
            self.freed,
            self.leaked()
        )
    }
}

pub struct CellPool {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    max_capacity: usize,
    allocated: u64,
    freed: u64,
}

impl CellPool {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        let max_capacity = config.max_capacity.clamp(1, MAX_CELLS);
        let initial = config.initial_capacity.clamp(1, max_capacity);

        let mut pool = CellPool {
            slots: vec![Slot::default(); initial],
            free_head: None,
            max_capacity,
            allocated: 0,
            freed: 0,
        };
        pool.link_free(0, initial);
        debug!(cells = initial, "initialized cell pool");
        pool
    }

    /// Thread slots `from..to` onto the front of the free list.
    fn link_free(&mut self, from: usize, to: usize) {
        if from >= to {
            return;
        }
        for i in from..to - 1 {
            self.slots[i].entry = Entry::Free {
                next: Some((i + 1) as u32),
            };
        }
        self.slots[to - 1].entry = Entry::Free {
            next: self.free_head,
        };
        self.free_head = Some(from as u32);
    }

    /// Double the pool, saturating at the configured maximum.
    fn grow(&mut self) -> Result<()> {
        let old = self.slots.len();
        if old >= self.max_capacity {
            return Err(LexpError::PoolExhausted { capacity: old });
        }
        let new = if old >= self.max_capacity / 2 {
            self.max_capacity
        } else {
            old * 2
        };

        let additional = new - old;
        self.slots
            .try_reserve_exact(additional)
            .map_err(|_| LexpError::OutOfMemory {
                requested: additional,
            })?;
        self.slots.resize(new, Slot::default());
        self.link_free(old, new);

        debug!(from = old, to = new, "enlarged cell pool");
        Ok(())
    }

    /// Allocate a cell holding `node`.
    pub fn alloc(&mut self, node: Node) -> Result<TermId> {
        if self.free_head.is_none() {
            self.grow()?;
        }
        let index = match self.free_head {
            Some(index) => index,
            None => unreachable!("free list empty after pool growth"),
        };

        let slot = &mut self.slots[index as usize];
        self.free_head = match slot.entry {
            Entry::Free { next } => next,
            Entry::Occupied(_) => panic!("corrupt free list: cell {} is in use", index),
        };
        slot.entry = Entry::Occupied(Cell { node, bdist: 0 });
        self.allocated += 1;

        Ok(TermId::new(index, slot.generation))
    }

    #[inline]
    pub fn var(&mut self, v: Var) -> Result<TermId> {
        self.alloc(Node::Var(v))
    }

    #[inline]
    pub fn abs(&mut self, binder: Var, body: TermId) -> Result<TermId> {
        self.alloc(Node::Abs { binder, body })
    }

    #[inline]
    pub fn app(&mut self, func: TermId, arg: TermId) -> Result<TermId> {
        self.alloc(Node::App { func, arg })
    }

    fn cell(&self, id: TermId) -> Option<&Cell> {
        match self.slots.get(id.index()) {
            Some(Slot {
                generation,
                entry: Entry::Occupied(cell),
            }) if *generation == id.generation() => Some(cell),
            _ => None,
        }
    }

    fn cell_mut(&mut self, id: TermId) -> &mut Cell {
        match self.slots.get_mut(id.index()) {
            Some(Slot {
                generation,
                entry: Entry::Occupied(cell),
            }) if *generation == id.generation() => cell,
            _ => panic!("malformed term: {} does not refer to a live cell", id),
        }
    }

    #[inline]
    pub fn is_live(&self, id: TermId) -> bool {
        self.cell(id).is_some()
    }

    #[inline]
    pub fn get(&self, id: TermId) -> Option<&Node> {
        self.cell(id).map(|cell| &cell.node)
    }

    /// Payload of a live cell.
    ///
    /// # Panics
    ///
    /// Panics if `id` is stale: algorithms only follow handles owned by a
    /// live term, so this is an internal consistency failure.
    #[inline]
    pub fn node(&self, id: TermId) -> &Node {
        match self.cell(id) {
            Some(cell) => &cell.node,
            None => panic!("malformed term: {} does not refer to a live cell", id),
        }
    }

    /// Overwrite the payload of a live cell in place.
    #[inline]
    pub fn set(&mut self, id: TermId, node: Node) {
        self.cell_mut(id).node = node;
    }

    #[inline]
    pub(crate) fn bdist(&self, id: TermId) -> i64 {
        match self.cell(id) {
            Some(cell) => cell.bdist,
            None => panic!("malformed term: {} does not refer to a live cell", id),
        }
    }

    #[inline]
    pub(crate) fn set_bdist(&mut self, id: TermId, bdist: i64) {
        self.cell_mut(id).bdist = bdist;
    }

    /// Return one cell to the free list. Its children are left untouched.
    pub fn release(&mut self, id: TermId) -> Result<()> {
        let free_head = self.free_head;
        let slot = match self.slots.get_mut(id.index()) {
            Some(slot)
                if slot.generation == id.generation()
                    && matches!(slot.entry, Entry::Occupied(_)) =>
            {
                slot
            }
            _ => {
                return Err(LexpError::StaleHandle {
                    index: id.raw_index(),
                })
            }
        };

        slot.entry = Entry::Free { next: free_head };
        slot.generation = slot.generation.wrapping_add(1);
        self.free_head = Some(id.raw_index());
        self.freed += 1;
        Ok(())
    }

    /// Release a whole subtree.
    pub fn prune(&mut self, id: TermId) -> Result<()> {
        let node = match self.get(id) {
            Some(node) => *node,
            None => {
                warn!(cell = id.index(), "prune: cell is already free or the handle is stale");
                return Err(LexpError::StaleHandle {
                    index: id.raw_index(),
                });
            }
        };

        match node {
            Node::Var(_) => {}
            Node::Abs { body, .. } => self.prune(body)?,
            Node::App { func, arg } => {
                self.prune(func)?;
                self.prune(arg)?;
            }
        }
        self.release(id)
    }

    /// Deep-copy a subtree into fresh cells.
    pub fn copy(&mut self, id: TermId) -> Result<TermId> {
        match *self.node(id) {
            Node::Var(v) => self.var(v),
            Node::Abs { binder, body } => {
                let body = self.copy(body)?;
                self.abs(binder, body).map_err(|err| {
                    let _ = self.prune(body);
                    err
                })
            }
            Node::App { func, arg } => {
                let func = self.copy(func)?;
                let arg = match self.copy(arg) {
                    Ok(arg) => arg,
                    Err(err) => {
                        let _ = self.prune(func);
                        return Err(err);
                    }
                };
                self.app(func, arg).map_err(|err| {
                    let _ = self.prune(func);
                    let _ = self.prune(arg);
                    err
                })
            }
        }
    }

    /// Move the payload of `src` into `dst` and release `src`.
    ///
    /// Handles to `dst` stay valid; `src` is consumed.
    pub(crate) fn transplant(&mut self, src: TermId, dst: TermId) -> Result<()> {
        let node = *self.node(src);
        self.set(dst, node);
        self.release(src)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of cells currently in use
    pub fn live(&self) -> usize {
        (self.allocated - self.freed) as usize
    }

    pub fn info(&self) -> PoolInfo {
        let free = self
            .slots
            .iter()
            .filter(|slot| matches!(slot.entry, Entry::Free { .. }))
            .count();
        PoolInfo {
            capacity: self.slots.len(),
            live: self.slots.len() - free,
            free,
            allocated: self.allocated,
            freed: self.freed,
        }
    }
}

impl Default for CellPool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CellPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellPool")
            .field("capacity", &self.slots.len())
            .field("live", &self.live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_pool() -> CellPool {
        CellPool::with_config(PoolConfig {
            initial_capacity: 1,
            max_capacity: MAX_CELLS,
        })
    }

    #[test]
    fn test_alloc_and_read() {
        let mut pool = CellPool::new();
        let v = pool.var(1).unwrap();
        let abs = pool.abs(1, v).unwrap();

        assert_eq!(*pool.node(v), Node::Var(1));
        assert_eq!(*pool.node(abs), Node::Abs { binder: 1, body: v });
        assert_eq!(pool.live(), 2);
    }

    #[test]
    fn test_growth_by_doubling() {
        let mut pool = tiny_pool();
        assert_eq!(pool.capacity(), 1);

        pool.var(1).unwrap();
        assert_eq!(pool.capacity(), 1);
        pool.var(2).unwrap();
        assert_eq!(pool.capacity(), 2);
        pool.var(3).unwrap();
        assert_eq!(pool.capacity(), 4);
        pool.var(4).unwrap();
        pool.var(5).unwrap();
        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.live(), 5);
    }

    #[test]
    fn test_growth_saturates_then_exhausts() {
        let mut pool = CellPool::with_config(PoolConfig {
            initial_capacity: 2,
            max_capacity: 3,
        });
        pool.var(1).unwrap();
        pool.var(2).unwrap();
        pool.var(3).unwrap();
        assert_eq!(pool.capacity(), 3);

        let err = pool.var(4).unwrap_err();
        assert_eq!(err, LexpError::PoolExhausted { capacity: 3 });
        assert!(err.is_fatal());
    }

    #[test]
    fn test_release_recycles_slot() {
        let mut pool = tiny_pool();
        let a = pool.var(1).unwrap();
        pool.release(a).unwrap();

        let b = pool.var(2).unwrap();
        assert_eq!(a.index(), b.index());
        assert_ne!(a.generation(), b.generation());
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn test_stale_handle_detected() {
        let mut pool = CellPool::new();
        let a = pool.var(1).unwrap();
        pool.release(a).unwrap();

        assert!(!pool.is_live(a));
        assert!(pool.get(a).is_none());
        assert_eq!(
            pool.release(a),
            Err(LexpError::StaleHandle { index: a.index() as u32 })
        );

        // The recycled slot does not answer to the old handle.
        let b = pool.var(9).unwrap();
        assert_eq!(a.index(), b.index());
        assert!(pool.get(a).is_none());
        assert!(pool.prune(a).is_err());
        assert!(pool.is_live(b));
    }

    #[test]
    #[should_panic(expected = "malformed term")]
    fn test_reading_stale_handle_panics() {
        let mut pool = CellPool::new();
        let a = pool.var(1).unwrap();
        pool.release(a).unwrap();
        let _ = pool.node(a);
    }

    #[test]
    fn test_prune_frees_subtree() {
        let mut pool = CellPool::new();
        let x = pool.var(1).unwrap();
        let y = pool.var(2).unwrap();
        let app = pool.app(x, y).unwrap();
        let abs = pool.abs(1, app).unwrap();
        assert_eq!(pool.live(), 4);

        pool.prune(abs).unwrap();
        assert_eq!(pool.live(), 0);
        assert!(!pool.is_live(x));
        assert!(pool.prune(abs).is_err());
    }

    #[test]
    fn test_copy_does_not_alias() {
        let mut pool = CellPool::new();
        let x = pool.var(1).unwrap();
        let abs = pool.abs(1, x).unwrap();
        let copy = pool.copy(abs).unwrap();

        assert_ne!(copy, abs);
        let copy_body = match *pool.node(copy) {
            Node::Abs { body, .. } => body,
            other => panic!("expected abstraction, got {:?}", other),
        };
        assert_ne!(copy_body, x);

        pool.set(x, Node::Var(5));
        assert_eq!(*pool.node(copy_body), Node::Var(1));
    }

    #[test]
    fn test_failed_copy_releases_partial_cells() {
        let mut pool = CellPool::with_config(PoolConfig {
            initial_capacity: 5,
            max_capacity: 5,
        });
        let x = pool.var(1).unwrap();
        let abs = pool.abs(1, x).unwrap();
        let y = pool.var(2).unwrap();
        let z = pool.var(3).unwrap();
        let app = pool.app(y, z).unwrap();
        assert_eq!(pool.live(), 5);
        pool.release(app).unwrap();
        pool.release(z).unwrap();
        assert_eq!(pool.live(), 3);

        // one free cell short for the abstraction
        let _spare = pool.var(4).unwrap();
        assert!(pool.copy(abs).unwrap_err().is_fatal());
        assert_eq!(pool.live(), 4);

        // room for both variables but not the application
        let mut pool = CellPool::with_config(PoolConfig {
            initial_capacity: 5,
            max_capacity: 5,
        });
        let x = pool.var(1).unwrap();
        let y = pool.var(2).unwrap();
        let app = pool.app(x, y).unwrap();
        assert!(pool.copy(app).is_err());
        assert_eq!(pool.live(), 3);
        assert_eq!(pool.info().leaked(), 0);
    }

    #[test]
    fn test_transplant_keeps_destination_handle() {
        let mut pool = CellPool::new();
        let dst = pool.var(1).unwrap();
        let src = pool.var(2).unwrap();
        pool.transplant(src, dst).unwrap();

        assert_eq!(*pool.node(dst), Node::Var(2));
        assert!(!pool.is_live(src));
    }

    #[test]
    fn test_info() {
        let mut pool = CellPool::with_config(PoolConfig {
            initial_capacity: 4,
            max_capacity: MAX_CELLS,
        });
        let a = pool.var(1).unwrap();
        pool.var(2).unwrap();
        pool.release(a).unwrap();

        let info = pool.info();
        assert_eq!(info.capacity, 4);
        assert_eq!(info.live, 1);
        assert_eq!(info.free, 3);
        assert_eq!(info.allocated, 2);
        assert_eq!(info.freed, 1);
        assert_eq!(info.leaked(), 0);
        assert!(info.to_string().starts_with("pool info: 4 slots, 1 used"));
    }
}

//! The disassembly-level block tree (§3 "Block"): an index range with a
//! syntactic role tag, nested inside its parent. Built by pass 2 of the
//! disassembler; later promoted to semantic `Scope`s by the control-flow
//! reconstructor.
//!
//! Grounded on `examples/original_source/blocks.cpp`'s block hierarchy,
//! re-expressed as a `Vec`-backed arena of indices rather than a tree of
//! owning raw pointers — the Rust idiom for a parent-child graph built
//! bottom-up in one pass and never mutated after.

use jclass_core::error::FormatError;
use jclass_core::pos::IndexRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Root,
    If,
    Else,
    Try,
    Catch,
    InfiniteLoop,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub range: IndexRange,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Arena of blocks, indexed by position in `nodes`. Index 0 is always the
/// root, spanning the whole instruction list.
#[derive(Debug)]
pub struct BlockTree {
    nodes: Vec<Block>,
}

impl BlockTree {
    pub const ROOT: usize = 0;

    pub fn new(last_index: u32) -> Self {
        BlockTree {
            nodes: vec![Block {
                kind: BlockKind::Root,
                range: IndexRange::new(0, last_index),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn get(&self, id: usize) -> &Block {
        &self.nodes[id]
    }

    pub fn root(&self) -> &Block {
        &self.nodes[Self::ROOT]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Append a new block under `parent`, rejecting one that would spill
    /// past its parent's bounds.
    pub fn push_child(&mut self, parent: usize, kind: BlockKind, range: IndexRange) -> Result<usize, FormatError> {
        let parent_range = self.nodes[parent].range;
        if !parent_range.contains_range(range) {
            return Err(FormatError::BlockOutOfBounds {
                start: range.start,
                end: range.end,
                parent_start: parent_range.start,
                parent_end: parent_range.end,
            });
        }
        let id = self.nodes.len();
        self.nodes.push(Block { kind, range, parent: Some(parent), children: Vec::new() });
        self.nodes[parent].children.push(id);
        Ok(id)
    }

    /// Widen an existing block's end, e.g. extending an infinite-loop
    /// block when a later back-edge turns out to span more of it.
    pub fn extend_end(&mut self, id: usize, new_end: u32) -> Result<(), FormatError> {
        if let Some(parent) = self.nodes[id].parent {
            let parent_range = self.nodes[parent].range;
            if new_end > parent_range.end {
                return Err(FormatError::BlockOutOfBounds {
                    start: self.nodes[id].range.start,
                    end: new_end,
                    parent_start: parent_range.start,
                    parent_end: parent_range.end,
                });
            }
        }
        self.nodes[id].range = IndexRange::new(self.nodes[id].range.start, new_end);
        Ok(())
    }

    /// Innermost block whose range contains `index`, walking down from the
    /// root through children.
    pub fn innermost_containing(&self, index: u32) -> usize {
        let mut current = Self::ROOT;
        loop {
            let next = self.nodes[current]
                .children
                .iter()
                .copied()
                .find(|&c| self.nodes[c].range.contains_index(index));
            match next {
                Some(c) => current = c,
                None => return current,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_spans_whole_method() {
        let tree = BlockTree::new(10);
        assert_eq!(tree.root().range, IndexRange::new(0, 10));
        assert_eq!(tree.root().kind, BlockKind::Root);
    }

    #[test]
    fn rejects_child_exceeding_parent_bounds() {
        let mut tree = BlockTree::new(5);
        let err = tree.push_child(BlockTree::ROOT, BlockKind::If, IndexRange::new(2, 9)).unwrap_err();
        assert!(matches!(err, FormatError::BlockOutOfBounds { .. }));
    }

    #[test]
    fn innermost_containing_descends_nesting() {
        let mut tree = BlockTree::new(20);
        let outer = tree.push_child(BlockTree::ROOT, BlockKind::If, IndexRange::new(0, 15)).unwrap();
        let inner = tree.push_child(outer, BlockKind::InfiniteLoop, IndexRange::new(3, 10)).unwrap();
        assert_eq!(tree.innermost_containing(5), inner);
        assert_eq!(tree.innermost_containing(13), outer);
        assert_eq!(tree.innermost_containing(18), BlockTree::ROOT);
    }
}

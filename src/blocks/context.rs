// src/blocks/context.rs
//! Immutable recursion state for one tree walk.

use crate::types::BlockId;

/// Where a walk currently is: how deep, and which blocks it came through.
///
/// Cloned for every branch; the ancestor set is persistent so clones share
/// structure.
#[derive(Debug, Clone)]
pub struct TreeContext {
    ancestors: im::HashSet<BlockId>,
    depth: usize,
    max_depth: usize,
}

/// Outcome of trying to step into a block's children.
#[derive(Debug)]
pub enum Descent {
    Into(TreeContext),
    /// The depth guard stops here.
    TooDeep,
    /// The children source is already on the path (a synced block pointing
    /// back at an ancestor).
    Cycle,
}

impl TreeContext {
    pub fn root(root: &BlockId, max_depth: usize) -> Self {
        let mut ancestors = im::HashSet::new();
        ancestors.insert(root.clone());
        Self {
            ancestors,
            depth: 0,
            max_depth,
        }
    }

    /// Levels already materialized above the list being fetched.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn descend(&self, source: &BlockId) -> Descent {
        if self.depth + 1 >= self.max_depth {
            return Descent::TooDeep;
        }
        if self.ancestors.contains(source) {
            return Descent::Cycle;
        }

        let mut ancestors = self.ancestors.clone();
        ancestors.insert(source.clone());
        Descent::Into(Self {
            ancestors,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_guard() {
        let root = BlockId::new_v4();
        let mut context = TreeContext::root(&root, 3);

        for _ in 0..2 {
            context = match context.descend(&BlockId::new_v4()) {
                Descent::Into(next) => next,
                other => panic!("stopped early: {other:?}"),
            };
        }
        assert_eq!(context.depth(), 2);
        assert!(matches!(
            context.descend(&BlockId::new_v4()),
            Descent::TooDeep
        ));
    }

    #[test]
    fn test_cycle_detection() {
        let root = BlockId::new_v4();
        let context = TreeContext::root(&root, 10);
        assert!(matches!(context.descend(&root), Descent::Cycle));
    }
}

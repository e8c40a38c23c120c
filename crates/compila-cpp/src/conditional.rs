/// One frame of the `#if`/`#elif`/`#else`/`#endif` stack (spec §3
/// "Conditional block").
///
/// Invariant: at most one branch per block has `satisfied := true` for the
/// rest of the block's lifetime; once a branch is satisfied, later branches
/// have `currently_active := false`.
#[derive(Debug, Clone, Copy)]
pub struct ConditionalBlock {
    pub parent_active: bool,
    pub satisfied: bool,
    pub currently_active: bool,
}

impl ConditionalBlock {
    pub fn opening(parent_active: bool, condition: bool) -> Self {
        let satisfied = parent_active && condition;
        Self {
            parent_active,
            satisfied,
            currently_active: satisfied,
        }
    }
}

/// The stack of nested conditional blocks for one preprocess invocation
/// (and, transitively, its recursive `#include`s per spec §5).
#[derive(Debug, Clone, Default)]
pub struct ConditionalStack {
    blocks: Vec<ConditionalBlock>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// `active := condStack is empty OR every block.currently_active`
    /// (spec §4.F "Scanning").
    pub fn active(&self) -> bool {
        self.blocks.iter().all(|b| b.currently_active)
    }

    pub fn push(&mut self, block: ConditionalBlock) {
        self.blocks.push(block);
    }

    pub fn current(&self) -> Option<&ConditionalBlock> {
        self.blocks.last()
    }

    pub fn current_mut(&mut self) -> Option<&mut ConditionalBlock> {
        self.blocks.last_mut()
    }

    /// Pop the innermost block. Returns `false` if the stack was already
    /// empty (an unmatched `#endif`, spec §7 "without matching #if").
    pub fn pop(&mut self) -> bool {
        self.blocks.pop().is_some()
    }

    /// Apply `#elif`/`#elifdef`/`#elifndef` semantics: require a current
    /// block (caller checks); if `parent_active` is false or the branch is
    /// already satisfied, make the branch inactive; otherwise evaluate
    /// `condition` and update `satisfied` when taken.
    ///
    /// Per spec §9 "Open question": when `parent_active` is false, only
    /// `currently_active` is reset — `satisfied` is left untouched, exactly
    /// as the reference preprocessor does.
    pub fn elif(&mut self, condition: impl FnOnce() -> bool) {
        let Some(block) = self.blocks.last_mut() else {
            return;
        };
        if !block.parent_active || block.satisfied {
            block.currently_active = false;
            return;
        }
        let taken = condition();
        block.currently_active = taken;
        if taken {
            block.satisfied = true;
        }
    }

    /// Apply `#else` semantics.
    pub fn else_branch(&mut self) {
        let Some(block) = self.blocks.last_mut() else {
            return;
        };
        if !block.parent_active {
            block.currently_active = false;
        } else {
            block.currently_active = !block.satisfied;
            block.satisfied = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn if_else_endif_round_trips_to_empty_stack() {
        let mut stack = ConditionalStack::new();
        stack.push(ConditionalBlock::opening(true, false));
        assert!(!stack.active());
        stack.else_branch();
        assert!(stack.active());
        assert!(stack.pop());
        assert!(stack.is_empty());
    }

    #[test]
    fn only_one_branch_in_an_if_elif_else_chain_is_active() {
        let mut stack = ConditionalStack::new();
        stack.push(ConditionalBlock::opening(true, false));
        stack.elif(|| true);
        assert!(stack.active());
        stack.elif(|| true); // already satisfied: stays inactive regardless
        assert!(!stack.active());
        stack.else_branch();
        assert!(!stack.active());
    }

    #[test]
    fn elifdef_under_an_inactive_parent_leaves_satisfied_untouched() {
        let mut stack = ConditionalStack::new();
        // Outer block is false so everything nested has parent_active=false.
        stack.push(ConditionalBlock::opening(false, true));
        let before = stack.current().unwrap().satisfied;
        stack.elif(|| true);
        assert_eq!(stack.current().unwrap().satisfied, before);
        assert!(!stack.current().unwrap().currently_active);
    }

    #[test]
    fn nested_blocks_are_only_active_when_every_ancestor_is() {
        let mut stack = ConditionalStack::new();
        stack.push(ConditionalBlock::opening(true, true));
        assert!(stack.active());
        stack.push(ConditionalBlock::opening(stack.active(), false));
        assert!(!stack.active());
    }
}

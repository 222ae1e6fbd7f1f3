pub const MAX_LOCALS: usize = 200;

#[derive(Debug)]
pub struct Local {
    name: String,
    depth: usize,
    slot: usize,
    captured: bool,
    debug_index: Option<usize>,
}

impl Local {
    pub fn slot(&self) -> usize { self.slot }
    pub fn captured(&self) -> bool { self.captured }
    pub fn debug_index(&self) -> Option<usize> { self.debug_index }
}

/// Locals of one function, slot 0 included.
#[derive(Debug)]
pub struct Locals {
    stack: Vec<Local>,
    scope_depth: usize,
}

impl Locals {
    pub fn new() -> Locals {
        Locals {
            stack: vec![],
            scope_depth: 0,
        }
    }

    pub fn scope_depth(&self) -> usize { self.scope_depth }

    pub fn len(&self) -> usize { self.stack.len() }

    /// Slot 0 holds the closure and does not count against the limit.
    pub fn is_full(&self) -> bool {
        self.stack.len() > MAX_LOCALS
    }

    pub fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    pub fn end_scope(&mut self) -> Vec<Local> {
        self.scope_depth -= 1;
        let index = self.stack.iter()
            .position(|l| l.depth > self.scope_depth)
            .unwrap_or(self.stack.len());
        self.stack.split_off(index)
    }

    /// Locals declared deeper than `depth`, innermost first.
    pub fn above(&self, depth: usize) -> impl Iterator<Item = &Local> {
        self.stack.iter().rev().take_while(move |l| l.depth > depth)
    }

    pub fn get(&self, identifier: &str) -> Option<&Local> {
        self.stack.iter().rev().find(|l| l.name == identifier)
    }

    pub fn mark_captured(&mut self, slot: usize) {
        if let Some(local) = self.stack.get_mut(slot) {
            local.captured = true;
        }
    }

    pub fn insert(&mut self, identifier: &str, debug_index: Option<usize>) -> usize {
        let slot = self.stack.len();
        self.stack.push(Local {
            name: identifier.to_string(),
            depth: self.scope_depth,
            slot,
            captured: false,
            debug_index,
        });
        slot
    }

    pub fn iter(&self) -> impl Iterator<Item = &Local> {
        self.stack.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadowing_and_scopes() {
        let mut locals = Locals::new();
        locals.insert("", None);
        locals.insert("a", None);
        locals.begin_scope();
        locals.insert("a", None);
        locals.insert("b", None);
        assert_eq!(locals.get("a").map(Local::slot), Some(2));
        assert_eq!(locals.above(0).map(Local::slot).collect::<Vec<_>>(), vec![3, 2]);

        let dropped = locals.end_scope();
        assert_eq!(dropped.len(), 2);
        assert_eq!(locals.get("a").map(Local::slot), Some(1));
        assert!(locals.get("b").is_none());
    }

    #[test]
    fn limit_excludes_closure_slot() {
        let mut locals = Locals::new();
        locals.insert("", None);
        for i in 0..MAX_LOCALS {
            assert!(!locals.is_full());
            locals.insert(&format!("l{}", i), None);
        }
        assert!(locals.is_full());
    }
}

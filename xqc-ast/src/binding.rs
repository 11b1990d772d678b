use xqc_name::Name;

use crate::location::LocationMap;
use crate::types::{ItemType, SequenceType};

/// A binding's position in the evaluation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// for/let/some/every
    Range,
    /// Declared by the host before parsing, such as a function parameter.
    Parameter,
    /// Introduced by the optimizer.
    Hoisted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Name,
    pub kind: BindingKind,
    pub declared: Option<SequenceType>,
    /// Starts out as the declared type, or exactly one item for range
    /// variables; type checking refines it from the bound expression.
    pub inferred: SequenceType,
}

/// All range-variable bindings of one compile unit, indexed by slot.
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: Vec<Binding>,
}

impl BindingTable {
    pub fn allocate(
        &mut self,
        name: Name,
        kind: BindingKind,
        declared: Option<SequenceType>,
    ) -> Slot {
        let inferred = declared
            .clone()
            .unwrap_or_else(|| SequenceType::one(ItemType::Item));
        self.bindings.push(Binding {
            name,
            kind,
            declared,
            inferred,
        });
        Slot(self.bindings.len() - 1)
    }

    pub fn get(&self, slot: Slot) -> &Binding {
        &self.bindings[slot.0]
    }

    pub fn get_mut(&mut self, slot: Slot) -> &mut Binding {
        &mut self.bindings[slot.0]
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &Binding)> {
        self.bindings
            .iter()
            .enumerate()
            .map(|(i, binding)| (Slot(i), binding))
    }
}

/// A saved depth of the range-variable stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMark(usize);

/// The lexical scope stack used while parsing. Innermost bindings are at
/// the end; lookup scans from there so inner bindings shadow outer ones.
#[derive(Debug, Clone, Default)]
pub struct RangeVariables {
    stack: Vec<(Name, Slot)>,
}

impl RangeVariables {
    pub fn push(&mut self, name: Name, slot: Slot) {
        self.stack.push((name, slot));
    }

    pub fn pop(&mut self) -> Option<Slot> {
        self.stack.pop().map(|(_, slot)| slot)
    }

    pub fn lookup(&self, name: &Name) -> Option<Slot> {
        self.stack
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| *slot)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn mark(&self) -> RangeMark {
        RangeMark(self.stack.len())
    }

    /// Unwind to a mark, dropping anything pushed since.
    pub fn restore(&mut self, mark: RangeMark) {
        self.stack.truncate(mark.0);
    }
}

/// State shared by every parse belonging to one compile unit: the
/// location arena, the binding table, and the range-variable stack.
#[derive(Debug, Clone, Default)]
pub struct CompileUnit {
    pub locations: LocationMap,
    pub bindings: BindingTable,
    pub ranges: RangeVariables,
}

impl CompileUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring a host-declared variable (a function parameter, say) into
    /// scope for the expressions parsed after this.
    pub fn declare_parameter(&mut self, name: Name, declared: Option<SequenceType>) -> Slot {
        let inferred = declared.clone().unwrap_or_else(SequenceType::any);
        let slot = self
            .bindings
            .allocate(name.clone(), BindingKind::Parameter, declared);
        // nothing is known about an undeclared parameter's value
        self.bindings.get_mut(slot).inferred = inferred;
        self.ranges.push(name, slot);
        slot
    }

    /// Number of frame slots an evaluation of this unit needs.
    pub fn frame_size(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing() {
        let mut unit = CompileUnit::new();
        let x = Name::unprefixed("x");
        let outer = unit.bindings.allocate(x.clone(), BindingKind::Range, None);
        unit.ranges.push(x.clone(), outer);
        let inner = unit.bindings.allocate(x.clone(), BindingKind::Range, None);
        unit.ranges.push(x.clone(), inner);
        assert_eq!(unit.ranges.lookup(&x), Some(inner));
        unit.ranges.pop();
        assert_eq!(unit.ranges.lookup(&x), Some(outer));
    }

    #[test]
    fn test_mark_restore() {
        let mut ranges = RangeVariables::default();
        ranges.push(Name::unprefixed("a"), Slot(0));
        let mark = ranges.mark();
        ranges.push(Name::unprefixed("b"), Slot(1));
        ranges.push(Name::unprefixed("c"), Slot(2));
        ranges.restore(mark);
        assert_eq!(ranges.depth(), 1);
        assert_eq!(ranges.lookup(&Name::unprefixed("b")), None);
    }
}

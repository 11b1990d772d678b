use std::collections::BTreeSet;

use bitflags::bitflags;

use crate::binding::Slot;
use crate::expr::{Axis, Expr, ExprKind, VarRef};
use crate::types::{Cardinality, ItemType, SequenceType};

bitflags! {
    /// Parts of the dynamic context an expression reads without binding
    /// them itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Dependencies: u8 {
        const CONTEXT_ITEM = 1;
        const POSITION = 1 << 1;
        const LAST = 1 << 2;
        const CURRENT_GROUP = 1 << 3;
        const MATCHED_GROUP = 1 << 4;

        const FOCUS = Self::CONTEXT_ITEM.bits() | Self::POSITION.bits() | Self::LAST.bits();
    }
}

bitflags! {
    /// Evaluation methods a node implements natively. The interpreter
    /// adapts any of these to whatever the caller asks for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Methods: u8 {
        /// produce at most one item
        const ITEM = 1;
        /// produce a lazily pulled sequence
        const ITERATE = 1 << 1;
        /// push items into a receiver
        const PROCESS = 1 << 2;
    }
}

/// Cached static analysis of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticInfo {
    pub cardinality: Cardinality,
    pub item_type: ItemType,
    pub dependencies: Dependencies,
    /// The subtree constructs new nodes; each evaluation yields fresh node
    /// identities.
    pub creates_nodes: bool,
}

impl Default for StaticInfo {
    fn default() -> Self {
        StaticInfo {
            cardinality: Cardinality::ZeroOrMore,
            item_type: ItemType::Item,
            dependencies: Dependencies::empty(),
            creates_nodes: false,
        }
    }
}

impl StaticInfo {
    pub fn sequence_type(&self) -> SequenceType {
        SequenceType::new(self.item_type.clone(), self.cardinality)
    }

    pub fn depends_on_focus(&self) -> bool {
        self.dependencies.intersects(Dependencies::FOCUS)
    }
}

/// Strategy used when a node's value is requested as a value, for
/// instance to bind a variable or pass an argument.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    /// The node is a constant; use it as is.
    AlreadyValue,
    /// Look the variable up in the frame, deferred value and all.
    EvaluateVariable,
    /// Look the variable up and force it to a materialized sequence.
    MaterializeVariable,
    /// Defer with a closure that is evaluated at most once and then
    /// discarded.
    OneShotClosure(Box<[Slot]>),
    /// Defer with a closure that caches its first materialization.
    MemoClosure(Box<[Slot]>),
    /// Statically known to be empty.
    ReturnEmpty,
    /// Evaluate now via the single-item method.
    SingleItem,
    /// Evaluate now, iterating into a sequence.
    #[default]
    IterateAndMaterialize,
    /// Evaluate now by pushing into a buffer.
    PushProduction,
    /// Drop leading items of a variable's value without copying.
    LazyTail,
    /// Append to a variable's value, in place when its buffer allows it.
    SharedAppend,
}

/// How far an expression's node results are known to be in document
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Ordering {
    Unknown,
    /// In document order without duplicates.
    Ordered,
    /// Ordered, and no node is an ancestor of another.
    OrderedPeer,
}

impl Expr {
    pub fn methods(&self) -> Methods {
        use ExprKind::*;
        match &self.kind {
            Literal(_) | FunctionCall { .. } => Methods::ITEM | Methods::ITERATE,
            ContextItem
            | Root
            | Arithmetic(..)
            | Negate(_)
            | Plus(_)
            | ValueComparison(..)
            | GeneralComparison(..)
            | NodeComparison(..)
            | And(..)
            | Or(..)
            | Quantified { .. }
            | Cast { .. }
            | Castable { .. }
            | InstanceOf { .. }
            | FirstItem(_)
            | LastItem(_)
            | ItemAt { .. } => Methods::ITEM,
            Block(_) => Methods::ITERATE | Methods::PROCESS,
            ElementConstructor { .. } | TextConstructor(_) => Methods::PROCESS,
            VarRef(_)
            | Range(..)
            | SetOperation(..)
            | If { .. }
            | For { .. }
            | Let { .. }
            | Path(..)
            | DocumentSort(_)
            | AxisStep(..)
            | Reverse(_)
            | Filter { .. }
            | Slice { .. }
            | IndexedFilter { .. }
            | Treat { .. } => Methods::ITERATE,
        }
    }

    /// Range variable slots referenced but not bound inside this subtree.
    pub fn free_slots(&self) -> BTreeSet<Slot> {
        let mut referenced = BTreeSet::new();
        let mut bound = BTreeSet::new();
        self.walk(&mut |e| match &e.kind {
            ExprKind::VarRef(VarRef::Range(slot)) => {
                referenced.insert(*slot);
            }
            ExprKind::For { slot, .. }
            | ExprKind::Let { slot, .. }
            | ExprKind::Quantified { slot, .. } => {
                bound.insert(*slot);
            }
            _ => {}
        });
        referenced.difference(&bound).copied().collect()
    }

    pub fn references_slot(&self, slot: Slot) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if let ExprKind::VarRef(VarRef::Range(s)) = &e.kind {
                found |= *s == slot;
            }
        });
        found
    }

    /// Number of references to `slot` in this subtree; a reference inside
    /// a loop or predicate counts as many.
    pub fn slot_uses(&self, slot: Slot) -> usize {
        fn count(e: &Expr, slot: Slot, weight: usize) -> usize {
            match &e.kind {
                ExprKind::VarRef(VarRef::Range(s)) if *s == slot => weight,
                ExprKind::For { source, action, .. }
                | ExprKind::Quantified {
                    source,
                    satisfies: action,
                    ..
                } => count(source, slot, weight) + count(action, slot, 2),
                ExprKind::Path(a, b) => count(a, slot, weight) + count(b, slot, 2),
                ExprKind::Filter {
                    base, predicate, ..
                } => count(base, slot, weight) + count(predicate, slot, 2),
                _ => e.children().iter().map(|c| count(c, slot, weight)).sum(),
            }
        }
        count(self, slot, 1)
    }

    pub fn ordering(&self) -> Ordering {
        use ExprKind::*;
        match &self.kind {
            ContextItem | Root => Ordering::OrderedPeer,
            VarRef(_) | Literal(_) => {
                if self.info.cardinality.at_most_one() {
                    Ordering::OrderedPeer
                } else {
                    Ordering::Unknown
                }
            }
            AxisStep(axis, _) => match axis {
                Axis::Child | Axis::Attribute | Axis::Self_ | Axis::Parent => {
                    Ordering::OrderedPeer
                }
                Axis::Descendant
                | Axis::DescendantOrSelf
                | Axis::FollowingSibling
                | Axis::Following => Ordering::Ordered,
                _ => Ordering::Unknown,
            },
            // a reverse-axis step, possibly filtered, in axis order
            Reverse(inner) => match &inner.kind {
                AxisStep(..)
                | Filter { .. }
                | FirstItem(_)
                | LastItem(_)
                | ItemAt { .. }
                | Slice { .. } => Ordering::Ordered,
                _ => Ordering::Unknown,
            },
            Path(a, b) => {
                let right = b.ordering();
                if a.info.cardinality.at_most_one() {
                    return right;
                }
                match (a.ordering(), &b.kind) {
                    (Ordering::OrderedPeer, AxisStep(Axis::Child | Axis::Attribute | Axis::Self_, _)) => {
                        Ordering::OrderedPeer
                    }
                    (
                        Ordering::OrderedPeer,
                        AxisStep(Axis::Descendant | Axis::DescendantOrSelf, _),
                    ) => Ordering::Ordered,
                    (
                        Ordering::OrderedPeer,
                        Filter { base, .. }
                        | FirstItem(base)
                        | LastItem(base)
                        | ItemAt { base, .. }
                        | Slice { base, .. },
                    ) if matches!(base.kind, AxisStep(Axis::Child | Axis::Attribute, _)) =>
                    {
                        Ordering::OrderedPeer
                    }
                    _ => Ordering::Unknown,
                }
            }
            DocumentSort(inner) => inner.ordering().max(Ordering::Ordered),
            Filter { base, .. }
            | FirstItem(base)
            | LastItem(base)
            | ItemAt { base, .. }
            | Slice { base, .. }
            | IndexedFilter { base, .. } => base.ordering(),
            _ => {
                if self.info.cardinality.at_most_one() {
                    Ordering::OrderedPeer
                } else {
                    Ordering::Unknown
                }
            }
        }
    }
}

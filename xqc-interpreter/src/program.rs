use xqc_ast::{Expr, Location, LocationMap, Slot};
use xqc_name::Name;

use crate::error::SpannedError;
use crate::frame::Frame;
use crate::sequence::{Item, Sequence};
use crate::value::Value;

/// An executable expression: the optimized tree plus what the runtime
/// needs around it.
#[derive(Debug, Clone)]
pub struct Program {
    pub expr: Expr,
    /// Number of range variable slots an evaluation frame needs.
    pub frame_size: usize,
    /// Host-declared parameters, bound by the caller before evaluation.
    pub parameters: Vec<(Name, Slot)>,
    pub locations: LocationMap,
}

impl Program {
    pub fn new(expr: Expr, frame_size: usize, locations: LocationMap) -> Self {
        Program {
            expr,
            frame_size,
            parameters: Vec::new(),
            locations,
        }
    }

    /// Where an error was raised, if it carries a location.
    pub fn location(&self, error: &SpannedError) -> Option<&Location> {
        error.location.and_then(|id| self.locations.get(id))
    }

    /// A fresh frame with the parameters bound and the focus set to the
    /// context item, if there is one. Parameters without a value are left
    /// unbound and raise an error when read.
    pub fn frame<'e>(
        &self,
        context_item: Option<Item>,
        mut parameter_value: impl FnMut(&Name) -> Option<Sequence>,
    ) -> Frame<'e> {
        let mut frame = Frame::new(self.frame_size);
        for (name, slot) in &self.parameters {
            if let Some(value) = parameter_value(name) {
                frame.set(*slot, Value::from(value));
            }
        }
        if let Some(item) = context_item {
            frame = frame.with_focus(item, 1, Some(1));
        }
        frame
    }

    pub fn parameter(&self, name: &Name) -> Option<Slot> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| *slot)
    }
}

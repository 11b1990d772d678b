use xqc_ast::{LocationMap, Pattern};
use xqc_interpreter::{DynamicContext, Frame, Interpreter};

use crate::documents::Documents;
use crate::error::{Error, Result};

/// A compiled match pattern, such as `item[@kind = 'x'] | group`.
#[derive(Debug, Clone)]
pub struct MatchPattern {
    pub(crate) pattern: Pattern,
    pub(crate) frame_size: usize,
    pub(crate) locations: LocationMap,
}

static_assertions::assert_impl_all!(MatchPattern: Send, Sync);

impl MatchPattern {
    /// Whether `node` matches any alternative of the pattern.
    pub fn matches(&self, documents: &mut Documents, node: xot::Node) -> Result<bool> {
        let context = DynamicContext::default();
        let frame = Frame::new(self.frame_size);
        let interpreter = Interpreter::new(&context, &mut documents.xot);
        interpreter
            .matches_pattern(&self.pattern, node, &frame)
            .map_err(|error| Error::Dynamic {
                location: error
                    .location
                    .and_then(|id| self.locations.get(id))
                    .cloned(),
                error,
            })
    }

    /// The default priority of each alternative, in order.
    pub fn priorities(&self) -> Vec<rust_decimal::Decimal> {
        self.pattern
            .alternatives
            .iter()
            .map(|alternative| alternative.default_priority())
            .collect()
    }
}

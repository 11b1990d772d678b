use xqc_ast::{CompileUnit, StaticContextBuilder};
use xqc_name::Name;

use crate::error::Result;
use crate::pattern::MatchPattern;
use crate::query::Query;

/// Compiles queries against one static context.
#[derive(Debug, Default)]
pub struct Queries {
    static_context_builder: StaticContextBuilder,
}

impl Queries {
    /// The builder supplies the namespaces, variables and optimizer
    /// settings every query is compiled with.
    pub fn new(static_context_builder: StaticContextBuilder) -> Self {
        Self {
            static_context_builder,
        }
    }

    /// Compile a query that produces a [`Sequence`](crate::Sequence).
    pub fn sequence(&self, text: &str) -> Result<Query> {
        self.sequence_with_parameters(text, [])
    }

    /// Compile a query that can refer to the given parameters as range
    /// variables, like the body of a function.
    pub fn sequence_with_parameters(
        &self,
        text: &str,
        parameters: impl IntoIterator<Item = Name>,
    ) -> Result<Query> {
        let context = self.static_context_builder.build();
        let mut unit = CompileUnit::new();
        for name in parameters {
            unit.declare_parameter(name, None);
        }
        let program = xqc_compiler::compile(text, &context, unit)?;
        tracing::debug!(query = text, frame_size = program.frame_size, "compiled");
        Ok(Query { program })
    }

    /// Compile an XSLT-style match pattern.
    pub fn pattern(&self, text: &str) -> Result<MatchPattern> {
        let context = self.static_context_builder.build();
        let mut unit = CompileUnit::new();
        let pattern = xqc_compiler::compile_pattern(text, &context, &mut unit)?;
        tracing::debug!(pattern = text, alternatives = pattern.alternatives.len(), "compiled");
        Ok(MatchPattern {
            pattern,
            frame_size: unit.frame_size(),
            locations: unit.locations,
        })
    }
}

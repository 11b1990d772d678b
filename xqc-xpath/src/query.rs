use xqc_interpreter::{DynamicContext, DynamicContextBuilder, Interpreter, Item, Program, Sequence};
use xqc_name::Name;

use crate::documents::{Documents, Itemable};
use crate::error::{Error, Result};

/// A compiled query.
///
/// A query is immutable once compiled. Everything an evaluation changes
/// lives in a frame created per call, so one query can run many times, and
/// from several threads at once.
#[derive(Debug, Clone)]
pub struct Query {
    pub(crate) program: Program,
}

static_assertions::assert_impl_all!(Query: Send, Sync);

impl Query {
    /// Run the query with `item` as the context item.
    pub fn execute(&self, documents: &mut Documents, item: impl Itemable) -> Result<Sequence> {
        let item = item.to_item(documents)?;
        self.run(documents, Some(item), &DynamicContext::default())
    }

    /// Run the query without a context item.
    pub fn execute_without_context(&self, documents: &mut Documents) -> Result<Sequence> {
        self.run(documents, None, &DynamicContext::default())
    }

    /// Run the query with variable values. A value binds the context
    /// variable and the parameter of the same name, whichever the query
    /// declares.
    pub fn execute_with_variables(
        &self,
        documents: &mut Documents,
        item: impl Itemable,
        variables: impl IntoIterator<Item = (Name, Sequence)>,
    ) -> Result<Sequence> {
        let item = item.to_item(documents)?;
        let context = DynamicContextBuilder::new().variables(variables).build();
        self.run(documents, Some(item), &context)
    }

    /// Run the query against a dynamic context built by the caller, for
    /// instance one with a [`KeyResolver`](crate::KeyResolver).
    pub fn execute_with_context(
        &self,
        documents: &mut Documents,
        item: impl Itemable,
        context: &DynamicContext,
    ) -> Result<Sequence> {
        let item = item.to_item(documents)?;
        self.run(documents, Some(item), context)
    }

    /// The optimized expression tree.
    pub fn program(&self) -> &Program {
        &self.program
    }

    fn run(
        &self,
        documents: &mut Documents,
        item: Option<Item>,
        context: &DynamicContext,
    ) -> Result<Sequence> {
        let frame = self
            .program
            .frame(item, |name| context.variable(name).cloned());
        let interpreter = Interpreter::new(context, &mut documents.xot);
        interpreter
            .run(&self.program, &frame)
            .map_err(|error| Error::Dynamic {
                location: self.program.location(&error).cloned(),
                error,
            })
    }
}

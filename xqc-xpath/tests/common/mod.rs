// each test binary uses a different subset of these helpers
#![allow(dead_code)]

use xqc_xpath::{
    Documents, Name, OptimizerConfig, Queries, Result, Sequence, StaticContextBuilder,
};

fn queries(optimizer: OptimizerConfig) -> Queries {
    let mut builder = StaticContextBuilder::default();
    builder.optimizer(optimizer);
    Queries::new(builder)
}

/// Evaluate without a context item and render the result.
pub(crate) fn run(xpath: &str) -> Result<String> {
    let mut documents = Documents::new();
    let query = Queries::default().sequence(xpath)?;
    let result = query.execute_without_context(&mut documents)?;
    Ok(documents.display(&result))
}

pub(crate) fn run_xml_with(xml: &str, xpath: &str, optimizer: OptimizerConfig) -> Result<String> {
    let mut documents = Documents::new();
    let doc = documents.add_string(xml)?;
    let query = queries(optimizer).sequence(xpath)?;
    let result = query.execute(&mut documents, doc)?;
    Ok(documents.display(&result))
}

/// Evaluate with the document as context item and render the result.
pub(crate) fn run_xml(xml: &str, xpath: &str) -> Result<String> {
    run_xml_with(xml, xpath, OptimizerConfig::default())
}

/// Evaluate with context variables bound.
pub(crate) fn run_with_variables(
    xpath: &str,
    variables: Vec<(Name, Sequence)>,
) -> Result<String> {
    let mut documents = Documents::new();
    let doc = documents.add_string("<doc/>")?;
    let mut builder = StaticContextBuilder::default();
    builder.variable_names(variables.iter().map(|(name, _)| name.clone()));
    let query = Queries::new(builder).sequence(xpath)?;
    let result = query.execute_with_variables(&mut documents, doc, variables)?;
    Ok(documents.display(&result))
}

/// The result with and without optimization must agree.
pub(crate) fn assert_same_as_unoptimized(xml: &str, xpath: &str) {
    let optimized = run_xml(xml, xpath).map_err(|e| e.code());
    let unoptimized =
        run_xml_with(xml, xpath, OptimizerConfig::disabled()).map_err(|e| e.code());
    assert_eq!(optimized, unoptimized, "{xpath}");
}

/// The optimized tree, rendered.
pub(crate) fn explain(xpath: &str) -> String {
    let query = Queries::default().sequence(xpath).unwrap();
    query.program().expr.to_string()
}

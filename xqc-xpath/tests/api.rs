
use std::sync::{Arc, Mutex};

use rust_decimal_macros::dec;
use xot::Xot;
use xqc_xpath::{
    Diagnostic, DiagnosticSink, Documents, DynamicContextBuilder, Error, ErrorCode, Item,
    KeyResolver, Name, Queries, Result, Sequence, StaticContextBuilder,
};

#[test]
fn test_syntax_error_names_expected_token() {
    let error = Queries::default().sequence("(1 + 2").unwrap_err();
    match error {
        Error::Static(error) => {
            assert_eq!(error.error, ErrorCode::XPST0003);
            assert!(error.message.contains("')'"), "{}", error.message);
            assert_eq!(error.line, 1);
        }
        error => panic!("expected a static error, got {error:?}"),
    }
}

#[test]
fn test_static_type_error() {
    let error = Queries::default().sequence("'a' + 1").unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::XPTY0004));
    assert_eq!(error.span(), Some(0..3));
}

#[test]
fn test_dynamic_error_location() -> Result<()> {
    let mut documents = Documents::new();
    let query = Queries::default().sequence("1,\n2 idiv 0")?;
    match query.execute_without_context(&mut documents).unwrap_err() {
        Error::Dynamic { error, location } => {
            assert_eq!(error.error, ErrorCode::FOAR0001);
            assert_eq!(location.map(|l| l.line), Some(2));
        }
        error => panic!("expected a dynamic error, got {error:?}"),
    }
    Ok(())
}

#[test]
fn test_query_runs_many_times() -> Result<()> {
    let queries = Queries::default();
    let query = queries.sequence("r/string()")?;
    let mut documents = Documents::new();
    let one = documents.add_string("<r>one</r>")?;
    let two = documents.add_string("<r>two</r>")?;
    let first = query.execute(&mut documents, one)?;
    let second = query.execute(&mut documents, two)?;
    assert_eq!(documents.display(&first), "one");
    assert_eq!(documents.display(&second), "two");
    Ok(())
}

#[test]
fn test_query_shared_across_threads() -> Result<()> {
    let query = Queries::default().sequence("for $i in 1 to count(//a) return $i * 10")?;
    let results = std::thread::scope(|scope| {
        let handles = (1..=3)
            .map(|n| {
                let query = &query;
                scope.spawn(move || {
                    let mut documents = Documents::new();
                    let xml = format!("<r>{}</r>", "<a/>".repeat(n));
                    let doc = documents.add_string(&xml).unwrap();
                    let result = query.execute(&mut documents, doc).unwrap();
                    documents.display(&result)
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    });
    assert_eq!(results, vec!["10", "10\n20", "10\n20\n30"]);
    Ok(())
}

#[test]
fn test_parameters() -> Result<()> {
    let queries = Queries::default();
    let query = queries.sequence_with_parameters(
        "for $i in $items return $i + $offset",
        [Name::unprefixed("items"), Name::unprefixed("offset")],
    )?;
    let mut documents = Documents::new();
    let doc = documents.add_string("<r/>")?;
    let items: Sequence = (1..=3i64).map(Item::from).collect();
    let result = query.execute_with_variables(
        &mut documents,
        doc,
        [
            (Name::unprefixed("items"), items),
            (Name::unprefixed("offset"), Item::from(100i64).into()),
        ],
    )?;
    assert_eq!(documents.display(&result), "101\n102\n103");
    Ok(())
}

#[test]
fn test_unbound_parameter_is_an_error() -> Result<()> {
    let query =
        Queries::default().sequence_with_parameters("$p + 1", [Name::unprefixed("p")])?;
    let mut documents = Documents::new();
    let error = query.execute_without_context(&mut documents).unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::XPDY0002));
    Ok(())
}

#[test]
fn test_namespaces() -> Result<()> {
    let mut builder = StaticContextBuilder::default();
    builder.namespaces([("p", "urn:p")]);
    let queries = Queries::new(builder);
    let query = queries.sequence("count(//p:a)")?;
    let mut documents = Documents::new();
    let doc = documents.add_string(r#"<r xmlns:q="urn:p"><q:a/><a/></r>"#)?;
    let result = query.execute(&mut documents, doc)?;
    assert_eq!(documents.display(&result), "1");
    Ok(())
}

#[test]
fn test_unknown_document() {
    let mut other = Documents::new();
    let handle = other.add_string("<r/>").unwrap();
    let mut documents = Documents::new();
    let query = Queries::default().sequence(".").unwrap();
    assert!(matches!(
        query.execute(&mut documents, handle),
        Err(Error::UnknownDocument)
    ));
}

const ITEMS: &str = r#"<r><item id="1" kind="x"/><item id="2" kind="y"/><group/></r>"#;

fn select_node(documents: &mut Documents, doc: xqc_xpath::DocumentHandle, path: &str) -> xot::Node {
    let sequence = Queries::default()
        .sequence(path)
        .unwrap()
        .execute(documents, doc)
        .unwrap();
    match sequence.iter().next() {
        Some(Item::Node(node)) => node,
        other => panic!("{path} selected {other:?}"),
    }
}

#[test]
fn test_match_pattern() -> Result<()> {
    let mut documents = Documents::new();
    let doc = documents.add_string(ITEMS)?;
    let pattern = Queries::default().pattern("item[@kind = 'x'] | group")?;
    assert_eq!(pattern.priorities(), vec![dec!(0.5), dec!(0)]);

    let first = select_node(&mut documents, doc, "/r/item[1]");
    let second = select_node(&mut documents, doc, "/r/item[2]");
    let group = select_node(&mut documents, doc, "/r/group");
    assert!(pattern.matches(&mut documents, first)?);
    assert!(!pattern.matches(&mut documents, second)?);
    assert!(pattern.matches(&mut documents, group)?);
    assert!(Queries::default().pattern("item")?.matches(&mut documents, first)?);
    assert!(!Queries::default().pattern("@kind")?.matches(&mut documents, first)?);

    let root = documents.document_node(doc).unwrap();
    assert!(Queries::default().pattern("/")?.matches(&mut documents, root)?);
    assert!(!Queries::default().pattern("/")?.matches(&mut documents, group)?);
    Ok(())
}

#[test]
fn test_pattern_syntax_error() {
    let error = Queries::default().pattern("parent::a").unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::XTSE0340));
}

/// Keys every element by its `id` attribute.
#[derive(Debug)]
struct ById;

impl KeyResolver for ById {
    fn resolve(
        &self,
        xot: &Xot,
        _name: &Name,
        key: &str,
        root: xot::Node,
    ) -> std::result::Result<Vec<xot::Node>, ErrorCode> {
        Ok(xot
            .descendants(root)
            .filter(|node| xot.is_element(*node))
            .filter(|node| {
                xot.axis(xot::Axis::Attribute, *node).any(|attribute| {
                    let xot::Value::Attribute(attribute) = xot.value(attribute) else {
                        return false;
                    };
                    xot.local_name_str(attribute.name()) == "id" && attribute.value() == key
                })
            })
            .collect())
    }
}

#[test]
fn test_key_with_resolver() -> Result<()> {
    let mut documents = Documents::new();
    let doc = documents.add_string(ITEMS)?;
    let query = Queries::default().sequence("key('by-id', ('2', '1'))/@kind/string()")?;
    let context = DynamicContextBuilder::new()
        .key_resolver(Box::new(ById))
        .build();
    let result = query.execute_with_context(&mut documents, doc, &context)?;
    assert_eq!(documents.display(&result), "x\ny");
    Ok(())
}

#[test]
fn test_key_without_resolver() {
    let mut documents = Documents::new();
    let doc = documents.add_string(ITEMS).unwrap();
    let query = Queries::default().sequence("key('by-id', '1')").unwrap();
    let error = query.execute(&mut documents, doc).unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::XTDE1260));
}

#[derive(Debug, Default)]
struct Collect(Mutex<Vec<Diagnostic>>);

impl DiagnosticSink for Collect {
    fn warning(&self, diagnostic: &Diagnostic) {
        self.0.lock().unwrap().push(diagnostic.clone());
    }
}

#[test]
fn test_backwards_compatible_defers_unknown_functions() -> Result<()> {
    let sink = Arc::new(Collect::default());
    let mut builder = StaticContextBuilder::default();
    builder.backwards_compatible(true).diagnostic_sink(sink.clone());
    let queries = Queries::new(builder);
    let mut documents = Documents::new();

    let query = queries.sequence("if (count((1, 2)) = 2) then 'ok' else foo(1)")?;
    let result = query.execute_without_context(&mut documents)?;
    assert_eq!(documents.display(&result), "ok");

    let query = queries.sequence("foo(1)")?;
    let error = query.execute_without_context(&mut documents).unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::XPST0017));

    assert_eq!(sink.0.lock().unwrap().len(), 2);
    Ok(())
}

#[test]
fn test_unknown_function_is_static_by_default() {
    let error = Queries::default().sequence("foo(1)").unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::XPST0017));
}

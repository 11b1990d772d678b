mod common;

use common::{run, run_with_variables, run_xml, run_xml_with};
use ibig::ibig;
use rust_decimal_macros::dec;
use xqc_xpath::{
    Atomic, Documents, ErrorCode, Item, Name, OptimizerConfig, Queries, Result, Sequence,
};

#[test]
fn test_operator_precedence() -> Result<()> {
    assert_eq!(run("1 + 2 * 3")?, "7");
    assert_eq!(run("2 + 3 * 4")?, "14");
    assert_eq!(run("(2 + 3) * 4")?, "20");
    Ok(())
}

#[test]
fn test_for() -> Result<()> {
    assert_eq!(run("for $x in (1, 2, 3) return $x * 2")?, "2\n4\n6");
    Ok(())
}

#[test]
fn test_shadowing() -> Result<()> {
    assert_eq!(
        run("for $x in (1, 2) return for $x in (10, 20) return $x")?,
        "10\n20\n10\n20"
    );
    assert_eq!(
        run("for $x in (1, 2) return ((for $x in (10, 11) return $x), $x)")?,
        "10\n11\n1\n10\n11\n2"
    );
    Ok(())
}

#[test]
fn test_let() -> Result<()> {
    assert_eq!(run("let $x := (1, 2, 3) return sum($x) + count($x)")?, "9");
    assert_eq!(run("let $x as xs:integer* := (1, 2) return $x[2]")?, "2");
    Ok(())
}

#[test]
fn test_quantified() -> Result<()> {
    assert_eq!(run("some $x in (1, 2, 3) satisfies $x > 2")?, "true");
    assert_eq!(run("every $x in (1, 2, 3) satisfies $x > 2")?, "false");
    assert_eq!(run("every $x in () satisfies $x > 2")?, "true");
    Ok(())
}

#[test]
fn test_first_child() -> Result<()> {
    let xml = "<r><a><b>1</b><b>2</b></a></r>";
    assert_eq!(run_xml(xml, "r/a/b[1]")?, "<b>1</b>");
    assert_eq!(run_xml(xml, "r/a/b[last()]")?, "<b>2</b>");
    assert_eq!(run_xml(xml, "r/a/b[3]")?, "");
    Ok(())
}

#[test]
fn test_positional_filters() -> Result<()> {
    assert_eq!(run("(1 to 5)[position() > 2]")?, "3\n4\n5");
    assert_eq!(run("(1 to 5)[position() = 2 to 3]")?, "2\n3");
    assert_eq!(run("(1 to 5)[position() < 3 and . > 1]")?, "2");
    assert_eq!(run("(1 to 5)[0]")?, "");
    assert_eq!(run("(1 to 5)[6]")?, "");
    assert_eq!(run("(1 to 5)[5]")?, "5");
    Ok(())
}

#[test]
fn test_positional_filter_on_variable() -> Result<()> {
    let x = Name::unprefixed("x");
    let items: Sequence = (1..=5i64).map(Item::from).collect();
    assert_eq!(
        run_with_variables("$x[position() > 2]", vec![(x.clone(), items.clone())])?,
        "3\n4\n5"
    );
    assert_eq!(run_with_variables("$x[4]", vec![(x, items)])?, "4");
    Ok(())
}

#[test]
fn test_effective_boolean_value() -> Result<()> {
    assert_eq!(run("boolean(())")?, "false");
    assert_eq!(run_xml("<r/>", "boolean((/r, 1))")?, "true");
    assert_eq!(run_xml("<r/>", "boolean((/r, 'a', 'b'))")?, "true");
    assert_eq!(run("boolean(false())")?, "false");
    assert_eq!(run("boolean('')")?, "false");
    assert_eq!(run("boolean('a')")?, "true");
    assert_eq!(run("boolean(0)")?, "false");
    assert_eq!(run("boolean(number('x'))")?, "false");
    assert_eq!(run("boolean(5)")?, "true");
    let error = run("boolean((true(), 1))").unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::FORG0006));
    Ok(())
}

#[test]
fn test_conditional_union_of_branches() -> Result<()> {
    assert_eq!(run("if (true()) then 1 else (1, 2)")?, "1");
    assert_eq!(run_xml("<r/>", "if (r) then 'yes' else 'no'")?, "yes");
    Ok(())
}

#[test]
fn test_paths() -> Result<()> {
    let xml = r#"<r><a id="1"><b/></a><a id="2"><b/><b/></a></r>"#;
    assert_eq!(run_xml(xml, "count(//b)")?, "3");
    assert_eq!(run_xml(xml, "count(r/a/b/..)")?, "2");
    assert_eq!(run_xml(xml, "r/a[b[2]]/@id/string()")?, "2");
    assert_eq!(run_xml(xml, "r/a[2]/preceding-sibling::a[1]/@id/string()")?, "1");
    Ok(())
}

#[test]
fn test_unary_signs() -> Result<()> {
    assert_eq!(run("--1")?, "1");
    assert_eq!(run("string(+(-0e0))")?, "-0");
    assert_eq!(run_xml("<r>2</r>", "+r + 1")?, "3");
    assert_eq!(run_xml("<r>2</r>", "--r")?, "2");
    let error = run_xml("<r>x</r>", "+r").unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::FORG0001));
    let error = run("+'1'").unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::XPTY0004));
    Ok(())
}

#[test]
fn test_casts_from_strings() -> Result<()> {
    assert_eq!(run("xs:integer('5') + 1")?, "6");
    assert_eq!(run("('1' cast as xs:double) * 2")?, "2");
    assert_eq!(run("xs:boolean('true')")?, "true");
    assert_eq!(run("xs:untypedAtomic('a') instance of xs:untypedAtomic")?, "true");
    assert_eq!(run("xs:double('NaN')")?, "NaN");
    assert_eq!(run("(1, 2, 3)[xs:double('NaN')]")?, "");
    assert_eq!(run("'7' castable as xs:integer")?, "true");
    let error = run("xs:integer('x')").unwrap_err();
    assert_eq!(error.code(), Some(ErrorCode::FORG0001));
    Ok(())
}

#[test]
fn test_each_step_sees_distinct_nodes() -> Result<()> {
    let xml = "<r><a>1</a><b>2</b><c>3</c><d>4</d></r>";
    for optimizer in [OptimizerConfig::default(), OptimizerConfig::disabled()] {
        assert_eq!(run_xml_with(xml, "r/*/../name()", optimizer)?, "r");
        assert_eq!(run_xml_with(xml, "r/*/../count(a)", optimizer)?, "1");
        assert_eq!(run_xml_with(xml, "r/*/../a/string()", optimizer)?, "1");
        assert_eq!(run_xml_with(xml, "r//*/..//a/string()", optimizer)?, "1");
    }
    Ok(())
}

#[test]
fn test_constructed_nodes_are_distinct() -> Result<()> {
    assert_eq!(
        run("count((for $i in (1, 2) return element e { $i }) | ())")?,
        "2"
    );
    assert_eq!(
        run("count((for $i in (1, 2) return element e { 1 }) | ())")?,
        "2"
    );
    Ok(())
}

#[test]
fn test_typed_results() -> Result<()> {
    let queries = Queries::default();
    let mut documents = Documents::new();
    let first = |text: &str, documents: &mut Documents| -> Result<Option<Item>> {
        let sequence = queries.sequence(text)?.execute_without_context(documents)?;
        Ok(sequence.iter().next())
    };
    assert_eq!(
        first("2 * 3", &mut documents)?,
        Some(Item::Atomic(Atomic::from(ibig!(6))))
    );
    assert_eq!(
        first("1.5 + 1", &mut documents)?,
        Some(Item::Atomic(Atomic::from(dec!(2.5))))
    );
    assert_eq!(first("()", &mut documents)?, None);
    Ok(())
}

use xqc_xpath::Error;

/// Print a query error against the expression text it came from.
pub(crate) fn render_error(src: &str, e: &Error) -> anyhow::Result<()> {
    let red = ariadne::Color::Red;
    let Some(code) = e.code() else {
        eprintln!("{e}");
        return Ok(());
    };
    let message = match e {
        Error::Static(error) => error.message.clone(),
        _ => e.to_string(),
    };

    let mut report =
        ariadne::Report::build(ariadne::ReportKind::Error, ("source", 0..0)).with_code(code.code());

    if let Some(span) = e.span() {
        report = report.with_label(
            ariadne::Label::new(("source", span))
                .with_message(message)
                .with_color(red),
        )
    }
    report
        .finish()
        .eprint(("source", ariadne::Source::from(src)))?;
    let note = code.note();
    if !note.is_empty() {
        eprintln!("{note}");
    }
    Ok(())
}

pub(crate) fn render_parse_error(src: &str, e: &xot::ParseError) -> anyhow::Result<()> {
    let red = ariadne::Color::Red;
    let mut report = ariadne::Report::build(ariadne::ReportKind::Error, ("input", 0..0));

    report = report.with_label(
        ariadne::Label::new(("input", e.span().range()))
            .with_message(e)
            .with_color(red),
    );

    report
        .finish()
        .eprint(("input", ariadne::Source::from(src)))?;
    Ok(())
}

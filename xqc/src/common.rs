use std::io;
use std::path::Path;

use anyhow::Context;

/// The XML to query: the named file, or stdin.
pub(crate) fn input_xml(infile: Option<&Path>) -> anyhow::Result<String> {
    match infile {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display())),
        None => io::read_to_string(io::stdin()).context("cannot read XML from stdin"),
    }
}

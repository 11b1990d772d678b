use std::path::PathBuf;

use clap::Parser;
use xqc_xpath::{Documents, Error, Queries, StaticContextBuilder};

use crate::common::input_xml;
use crate::error::{render_error, render_parse_error};

#[derive(Debug, Parser)]
pub(crate) struct XPath {
    /// xpath expression
    pub(crate) xpath: String,
    /// input xml file (default stdin)
    pub(crate) infile: Option<PathBuf>,
    /// Namespace URI to use in XPath for element names without a namespace
    /// prefix.
    ///
    /// If omitted, the default namespace is the empty string (i.e. the
    /// names are not in a namespace).
    #[arg(long)]
    pub(crate) default_namespace_uri: Option<String>,
    /// Namespace declaration to make available in XPath (can be repeated)
    /// The format is prefix=uri.
    #[arg(long)]
    pub(crate) namespace: Vec<String>,
    /// Print the compiled expression tree instead of running it.
    #[arg(long)]
    pub(crate) explain: bool,
}

impl XPath {
    pub(crate) fn run(&self) -> anyhow::Result<()> {
        let static_context_builder = make_static_context_builder(
            self.default_namespace_uri.as_deref(),
            self.namespace.as_slice(),
        )?;
        let queries = Queries::new(static_context_builder);
        let query = match queries.sequence(&self.xpath) {
            Ok(query) => query,
            Err(e) => return render_error(&self.xpath, &e),
        };
        if self.explain {
            println!("{}", query.program().expr);
            return Ok(());
        }

        let input_xml = input_xml(self.infile.as_deref())?;
        tracing::debug!(bytes = input_xml.len(), "read input");
        let mut documents = Documents::new();
        let doc = match documents.add_string(&input_xml) {
            Ok(doc) => doc,
            Err(Error::Parse(e)) => return render_parse_error(&input_xml, &e),
            Err(e) => return Err(e.into()),
        };

        match query.execute(&mut documents, doc) {
            Ok(sequence) => {
                println!("{}", documents.display(&sequence));
                Ok(())
            }
            Err(e) => render_error(&self.xpath, &e),
        }
    }
}

pub(crate) fn make_static_context_builder(
    default_namespace_uri: Option<&str>,
    namespaces: &[String],
) -> anyhow::Result<StaticContextBuilder> {
    let mut static_context_builder = StaticContextBuilder::default();
    if let Some(default_namespace_uri) = default_namespace_uri {
        static_context_builder.default_element_namespace(default_namespace_uri);
    }
    let namespaces = namespaces
        .iter()
        .map(|declaration| {
            let (prefix, uri) = declaration
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("namespace {declaration:?} is not prefix=uri"))?;
            Ok((prefix, uri))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    static_context_builder.namespaces(namespaces);
    Ok(static_context_builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_declarations() {
        let namespaces = vec!["ex=http://example.com".to_string()];
        let builder = make_static_context_builder(None, &namespaces).unwrap();
        let query = Queries::new(builder).sequence("count(ex:a)").unwrap();
        let mut documents = Documents::new();
        let doc = documents
            .add_string(r#"<a xmlns="http://example.com"/>"#)
            .unwrap();
        let result = query.execute(&mut documents, doc).unwrap();
        assert_eq!(documents.display(&result), "1");
    }

    #[test]
    fn test_default_namespace_uri() {
        let builder = make_static_context_builder(Some("http://example.com"), &[]).unwrap();
        let query = Queries::new(builder).sequence("count(a)").unwrap();
        let mut documents = Documents::new();
        let doc = documents
            .add_string(r#"<a xmlns="http://example.com"/>"#)
            .unwrap();
        let result = query.execute(&mut documents, doc).unwrap();
        assert_eq!(documents.display(&result), "1");
    }

    #[test]
    fn test_malformed_namespace_declaration() {
        let namespaces = vec!["ex".to_string()];
        assert!(make_static_context_builder(None, &namespaces).is_err());
    }
}

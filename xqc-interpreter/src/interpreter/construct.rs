use xot::Xot;
use xqc_ast::{Expr, ExprKind};

use crate::error::SpannedResult;
use crate::frame::Frame;
use crate::sequence::{Item, Sequence};

use super::{Interpreter, Receiver};

impl<'e, 'x> Interpreter<'e, 'x> {
    pub(crate) fn process_native(
        &self,
        expr: &'e Expr,
        frame: &Frame<'e>,
        receiver: &mut dyn Receiver,
    ) -> SpannedResult<()> {
        match &expr.kind {
            ExprKind::Block(items) => {
                for item in items {
                    self.process(item, frame, receiver)?;
                }
                Ok(())
            }
            ExprKind::ElementConstructor { name, content } => {
                // content first: it may construct nodes of its own
                let content = self.evaluate(content, frame)?;
                let element = {
                    let mut xot = self.xot.borrow_mut();
                    let name_id = name.add_name_id(&mut xot);
                    let element = xot.new_element(name_id);
                    append_content(&mut xot, element, &content)?;
                    element
                };
                receiver.item(Item::Node(element))
            }
            ExprKind::TextConstructor(content) => {
                let text = self
                    .atomize(content, frame)
                    .map(|atomic| Ok(atomic?.string_value()))
                    .collect::<SpannedResult<Vec<_>>>()?
                    .join(" ");
                if text.is_empty() {
                    return Ok(());
                }
                let node = self.xot.borrow_mut().new_text(&text);
                receiver.item(Item::Node(node))
            }
            _ => self
                .iterate(expr, frame)
                .try_for_each(|item| receiver.item(item?)),
        }
    }
}

/// Add constructed content to a new element. Adjacent atomic values
/// become one text node, separated by spaces; nodes that already live in
/// a tree are copied.
fn append_content(xot: &mut Xot, parent: xot::Node, content: &Sequence) -> SpannedResult<()> {
    let mut strings: Vec<String> = Vec::new();
    for item in content.iter() {
        match item {
            Item::Atomic(atomic) => strings.push(atomic.string_value()),
            Item::Node(node) => {
                append_strings(xot, parent, &mut strings)?;
                match xot.value(node) {
                    xot::Value::Document => {
                        let children: Vec<xot::Node> = xot.children(node).collect();
                        for child in children {
                            let copy = xot.clone_node(child);
                            xot.any_append(parent, copy)?;
                        }
                        continue;
                    }
                    xot::Value::Text(text) if text.get().is_empty() => continue,
                    _ => {}
                }
                let node = if xot.parent(node).is_some() {
                    xot.clone_node(node)
                } else {
                    node
                };
                xot.any_append(parent, node)?;
            }
        }
    }
    append_strings(xot, parent, &mut strings)
}

fn append_strings(xot: &mut Xot, parent: xot::Node, strings: &mut Vec<String>) -> SpannedResult<()> {
    if strings.is_empty() {
        return Ok(());
    }
    let text = strings.join(" ");
    strings.clear();
    if !text.is_empty() {
        let node = xot.new_text(&text);
        xot.append(parent, node)?;
    }
    Ok(())
}

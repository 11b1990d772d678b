use ahash::{HashSet, HashSetExt};
use xqc_ast::{ArithmeticOp, BuiltinFunction, ComparisonOp, Expr, FunctionRef};
use xqc_name::{Name, XML_NAMESPACE};

use crate::atomic::{
    arithmetic, cast_to_double, cast_untyped_arithmetic, compare_values, Atomic,
};
use crate::error::{Error, SpannedResult};
use crate::frame::Frame;
use crate::sequence::{Item, Sequence};

use super::Interpreter;

fn one(item: impl Into<Item>) -> Sequence {
    Sequence::from(item.into())
}

fn optional(item: Option<impl Into<Item>>) -> Sequence {
    item.map(one).unwrap_or_else(Sequence::empty)
}

/// XPath rounding: halves round towards positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Whether the 1-based `position` lies in the window `substring()` and
/// `subsequence()` select.
fn in_window(position: usize, start: f64, length: Option<f64>) -> bool {
    let position = position as f64;
    let start = round_half_up(start);
    match length {
        Some(length) => position >= start && position < start + round_half_up(length),
        None => position >= start,
    }
}

impl<'e, 'x> Interpreter<'e, 'x> {
    /// Call a built-in function.
    pub(crate) fn call(
        &self,
        function: &'e FunctionRef,
        args: &'e [Expr],
        frame: &Frame<'e>,
    ) -> SpannedResult<Sequence> {
        let builtin = match function {
            FunctionRef::Builtin(builtin) => *builtin,
            FunctionRef::Unresolved(_) => return Err(Error::XPST0017.into()),
        };
        // the optional argument that defaults to the context item
        let implicit = builtin.uses_context_when_omitted(args.len());
        use BuiltinFunction as F;
        let result = match builtin {
            F::True => one(true),
            F::False => one(false),
            F::Boolean => one(self.effective_boolean_value(&args[0], frame)?),
            F::Not => one(!self.effective_boolean_value(&args[0], frame)?),
            F::Position => {
                let focus = frame.focus().ok_or(Error::XPDY0002)?;
                one(focus.position)
            }
            F::Last => {
                let size = frame.focus().and_then(|focus| focus.size);
                one(size.ok_or(Error::XPDY0002)?)
            }
            F::Count => {
                let mut count = 0usize;
                for item in self.iterate(&args[0], frame) {
                    item?;
                    count += 1;
                }
                one(count)
            }
            F::Empty => one(self.iterate(&args[0], frame).next().transpose()?.is_none()),
            F::Exists => one(self.iterate(&args[0], frame).next().transpose()?.is_some()),
            F::String => {
                let item = self.optional_arg(args, implicit, frame)?;
                let xot = self.xot.borrow();
                one(item.map(|item| item.string_value(&xot)).unwrap_or_default())
            }
            F::Data => {
                if implicit {
                    let item = self.context_item(frame)?;
                    one(item.atomized(&self.xot.borrow()))
                } else {
                    self.atomize(&args[0], frame)
                        .map(|atomic| atomic.map(Item::Atomic))
                        .collect::<SpannedResult<Sequence>>()?
                }
            }
            F::Number => {
                let item = self.optional_arg(args, implicit, frame)?;
                let atomic = item.map(|item| item.atomized(&self.xot.borrow()));
                let number = atomic
                    .and_then(|atomic| cast_to_double(atomic).ok())
                    .unwrap_or(Atomic::from(f64::NAN));
                one(number)
            }
            F::Sum => self.sum(args, frame)?,
            F::Avg => {
                let values = self.numeric_values(&args[0], frame)?;
                let count = values.len();
                let mut values = values.into_iter();
                match values.next() {
                    Some(first) => {
                        let total = values.try_fold(first, |total, value| {
                            arithmetic(ArithmeticOp::Add, total, value)
                        })?;
                        one(arithmetic(ArithmeticOp::Divide, total, Atomic::from(count))?)
                    }
                    None => Sequence::empty(),
                }
            }
            F::Min => optional(self.extreme(&args[0], frame, ComparisonOp::Lt)?),
            F::Max => optional(self.extreme(&args[0], frame, ComparisonOp::Gt)?),
            F::Concat => {
                let mut result = String::new();
                for arg in args {
                    result.push_str(&self.string_arg(arg, frame)?);
                }
                one(result)
            }
            F::StringLength => {
                let item = self.optional_arg(args, implicit, frame)?;
                let xot = self.xot.borrow();
                let length = item.map_or(0, |item| item.string_value(&xot).chars().count());
                one(length)
            }
            F::Contains => {
                let (a, b) = (self.string_arg(&args[0], frame)?, self.string_arg(&args[1], frame)?);
                one(a.contains(b.as_str()))
            }
            F::StartsWith => {
                let (a, b) = (self.string_arg(&args[0], frame)?, self.string_arg(&args[1], frame)?);
                one(a.starts_with(b.as_str()))
            }
            F::EndsWith => {
                let (a, b) = (self.string_arg(&args[0], frame)?, self.string_arg(&args[1], frame)?);
                one(a.ends_with(b.as_str()))
            }
            F::StringJoin => {
                let separator = match args.get(1) {
                    Some(arg) => self.string_arg(arg, frame)?,
                    None => String::new(),
                };
                let strings = self
                    .atomize(&args[0], frame)
                    .map(|atomic| Ok(atomic?.string_value()))
                    .collect::<SpannedResult<Vec<_>>>()?;
                one(strings.join(&separator))
            }
            F::Substring => {
                let s = self.string_arg(&args[0], frame)?;
                let start = self.double_arg(&args[1], frame)?;
                let length = match args.get(2) {
                    Some(arg) => Some(self.double_arg(arg, frame)?),
                    None => None,
                };
                let result: String = s
                    .chars()
                    .enumerate()
                    .filter(|(i, _)| in_window(i + 1, start, length))
                    .map(|(_, c)| c)
                    .collect();
                one(result)
            }
            F::UpperCase => one(self.string_arg(&args[0], frame)?.to_uppercase()),
            F::LowerCase => one(self.string_arg(&args[0], frame)?.to_lowercase()),
            F::NormalizeSpace => {
                let item = self.optional_arg(args, implicit, frame)?;
                let xot = self.xot.borrow();
                let s = item.map(|item| item.string_value(&xot)).unwrap_or_default();
                one(s.split_whitespace().collect::<Vec<_>>().join(" "))
            }
            F::Name => {
                let node = self.optional_node_arg(args, implicit, frame)?;
                let xot = self.xot.borrow();
                let name = match node.and_then(|node| Some((node, xot.node_name(node)?))) {
                    Some((node, name)) => xot.full_name(node, name)?,
                    None => String::new(),
                };
                one(name)
            }
            F::LocalName => {
                let node = self.optional_node_arg(args, implicit, frame)?;
                let xot = self.xot.borrow();
                let name = node
                    .and_then(|node| xot.node_name(node))
                    .map(|name| xot.name_ns_str(name).0.to_string())
                    .unwrap_or_default();
                one(name)
            }
            F::Root => {
                let node = self.optional_node_arg(args, implicit, frame)?;
                optional(node.map(|node| Item::Node(self.xot.borrow().root(node))))
            }
            F::Subsequence => {
                let start = self.double_arg(&args[1], frame)?;
                let length = match args.get(2) {
                    Some(arg) => Some(self.double_arg(arg, frame)?),
                    None => None,
                };
                let mut items = Vec::new();
                for (i, item) in self.iterate(&args[0], frame).enumerate() {
                    let item = item?;
                    if in_window(i + 1, start, length) {
                        items.push(item);
                    } else if i as f64 + 1.0 >= round_half_up(start) {
                        // past the window
                        break;
                    }
                }
                items.into()
            }
            F::Reverse => {
                let mut items = self.evaluate(&args[0], frame)?.items();
                items.reverse();
                items.into()
            }
            F::DistinctValues => {
                let mut distinct: Vec<Atomic> = Vec::new();
                for atomic in self.atomize(&args[0], frame) {
                    let atomic = atomic?;
                    let seen = distinct.iter().any(|existing| {
                        (existing.is_nan() && atomic.is_nan())
                            || compare_values(ComparisonOp::Eq, existing.clone(), atomic.clone())
                                .unwrap_or(false)
                    });
                    if !seen {
                        distinct.push(atomic);
                    }
                }
                distinct.into_iter().map(Item::Atomic).collect()
            }
            F::Head => optional(self.iterate(&args[0], frame).next().transpose()?),
            F::Tail => self.evaluate(&args[0], frame)?.skip(1),
            F::ExactlyOne => {
                let sequence = self.evaluate(&args[0], frame)?;
                if sequence.len() != 1 {
                    return Err(Error::FORG0005.into());
                }
                sequence
            }
            F::ZeroOrOne => {
                let sequence = self.evaluate(&args[0], frame)?;
                if sequence.len() > 1 {
                    return Err(Error::FORG0003.into());
                }
                sequence
            }
            F::Id => self.id(args, implicit, frame)?,
            F::Key => self.key(args, implicit, frame)?,
            F::CurrentGroup => return Err(Error::XPDY0002.into()),
            F::RegexGroup => one(""),
            F::Error => return Err(Error::FOER0000.into()),
        };
        Ok(result)
    }

    /// The single optional argument, or the context item when it was left
    /// out.
    fn optional_arg(
        &self,
        args: &'e [Expr],
        implicit: bool,
        frame: &Frame<'e>,
    ) -> SpannedResult<Option<Item>> {
        if implicit {
            return self.context_item(frame).map(Some);
        }
        match args.last() {
            Some(arg) => self.evaluate_item(arg, frame),
            None => Ok(None),
        }
    }

    fn optional_node_arg(
        &self,
        args: &'e [Expr],
        implicit: bool,
        frame: &Frame<'e>,
    ) -> SpannedResult<Option<xot::Node>> {
        if implicit {
            return self.context_node(frame).map(Some);
        }
        match self.optional_arg(args, false, frame)? {
            Some(item) => item.to_node().map(Some).ok_or_else(|| Error::XPTY0004.into()),
            None => Ok(None),
        }
    }

    /// A string argument; empty when the argument is.
    fn string_arg(&self, arg: &'e Expr, frame: &Frame<'e>) -> SpannedResult<String> {
        Ok(self
            .atomize_optional(arg, frame)?
            .map(|atomic| atomic.string_value())
            .unwrap_or_default())
    }

    fn double_arg(&self, arg: &'e Expr, frame: &Frame<'e>) -> SpannedResult<f64> {
        let atomic = self.atomize_optional(arg, frame)?.ok_or(Error::XPTY0004)?;
        let atomic = if atomic.is_untyped() {
            cast_to_double(atomic)?
        } else {
            atomic
        };
        atomic.to_f64().ok_or_else(|| Error::XPTY0004.into())
    }

    /// Atomized values for aggregation: untyped values count as doubles,
    /// anything non-numeric is an error.
    fn numeric_values(&self, arg: &'e Expr, frame: &Frame<'e>) -> SpannedResult<Vec<Atomic>> {
        self.atomize(arg, frame)
            .map(|atomic| {
                let atomic = cast_untyped_arithmetic(atomic?)?;
                if atomic.is_numeric() {
                    Ok(atomic)
                } else {
                    Err(Error::FORG0006.into())
                }
            })
            .collect()
    }

    fn sum(&self, args: &'e [Expr], frame: &Frame<'e>) -> SpannedResult<Sequence> {
        let mut values = self.numeric_values(&args[0], frame)?.into_iter();
        let Some(first) = values.next() else {
            return match args.get(1) {
                Some(zero) => self.evaluate(zero, frame),
                None => Ok(one(0i64)),
            };
        };
        let total = values.try_fold(first, |total, value| arithmetic(ArithmeticOp::Add, total, value))?;
        Ok(one(total))
    }

    /// The minimum (`Lt`) or maximum (`Gt`) of the atomized argument. NaN
    /// anywhere makes the result NaN.
    fn extreme(
        &self,
        arg: &'e Expr,
        frame: &Frame<'e>,
        op: ComparisonOp,
    ) -> SpannedResult<Option<Atomic>> {
        let mut best: Option<Atomic> = None;
        for atomic in self.atomize(arg, frame) {
            let atomic = atomic?;
            let atomic = if atomic.is_untyped() {
                cast_to_double(atomic)?
            } else {
                atomic
            };
            if atomic.is_nan() {
                return Ok(Some(atomic));
            }
            best = match best {
                Some(current) if !compare_values(op, atomic.clone(), current.clone())? => {
                    Some(current)
                }
                _ => Some(atomic),
            };
        }
        Ok(best)
    }

    /// Elements under the root of the target node whose `xml:id` or `id`
    /// attribute is one of the given IDs, in document order.
    fn id(&self, args: &'e [Expr], implicit: bool, frame: &Frame<'e>) -> SpannedResult<Sequence> {
        let mut ids: HashSet<String> = HashSet::new();
        for atomic in self.atomize(&args[0], frame) {
            let value = atomic?.string_value();
            ids.extend(value.split_whitespace().map(str::to_string));
        }
        let node = match args.get(1) {
            Some(arg) if !implicit => self.evaluate_item(arg, frame)?.and_then(|item| item.to_node()),
            _ => Some(self.context_node(frame)?),
        }
        .ok_or(Error::XPTY0004)?;
        let xot = self.xot.borrow();
        let root = xot.root(node);
        if !xot.is_document(root) {
            return Err(Error::FODC0001.into());
        }
        if ids.is_empty() {
            return Ok(Sequence::empty());
        }
        let mut found = Vec::new();
        for element in xot.descendants(root).filter(|n| xot.is_element(*n)) {
            let matches = xot.axis(xot::Axis::Attribute, element).any(|attribute| {
                let xot::Value::Attribute(attribute) = xot.value(attribute) else {
                    return false;
                };
                let (local, namespace) = xot.name_ns_str(attribute.name());
                local == "id"
                    && (namespace.is_empty() || namespace == XML_NAMESPACE)
                    && ids.contains(attribute.value().trim())
            });
            if matches {
                found.push(Item::Node(element));
            }
        }
        Ok(found.into())
    }

    fn key(&self, args: &'e [Expr], implicit: bool, frame: &Frame<'e>) -> SpannedResult<Sequence> {
        let name = self.string_arg(&args[0], frame)?;
        let name = parse_key_name(&name).ok_or(Error::XTDE1260)?;
        let resolver = self.context.key_resolver().ok_or(Error::XTDE1260)?;
        let node = match args.get(2) {
            Some(arg) if !implicit => self.evaluate_item(arg, frame)?.and_then(|item| item.to_node()),
            _ => Some(self.context_node(frame)?),
        }
        .ok_or(Error::XPTY0004)?;
        let values = self
            .atomize(&args[1], frame)
            .map(|atomic| Ok(atomic?.string_value()))
            .collect::<SpannedResult<Vec<_>>>()?;
        let xot = self.xot.borrow();
        let root = xot.root(node);
        let mut nodes = Vec::new();
        for value in values {
            nodes.extend(resolver.resolve(&xot, &name, &value, root)?);
        }
        self.order.sort_nodes(&mut nodes, &xot);
        Ok(nodes.into_iter().map(Item::Node).collect())
    }
}

/// A key name is a plain local name or an URI-qualified `Q{uri}local`.
fn parse_key_name(name: &str) -> Option<Name> {
    let name = name.trim();
    if let Some(rest) = name.strip_prefix("Q{") {
        let (uri, local) = rest.split_once('}')?;
        return (!local.is_empty()).then(|| Name::uri_qualified(uri, local));
    }
    (!name.is_empty() && !name.contains(':')).then(|| Name::unprefixed(name))
}

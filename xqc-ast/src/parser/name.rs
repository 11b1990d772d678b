use xqc_lexer::{Lexeme, Token};
use xqc_name::{Name, XS_NAMESPACE};
use xqc_schema_type::Xs;

use crate::error::{Error, StaticResult};
use crate::types::{ItemType, FOREIGN_NAMESPACE};

use super::Parser;

/// Which namespace an unprefixed name lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameDefault {
    /// Element and type names: the default element/type namespace.
    Element,
    /// Function names: the default function namespace.
    Function,
    /// Variables and attributes: no namespace.
    None,
}

pub(crate) fn is_eqname(token: &Token) -> bool {
    matches!(
        token,
        Token::NCName(_) | Token::PrefixedQName(_) | Token::URIQualifiedName(_)
    )
}

impl<'a, 'c> Parser<'a, 'c> {
    pub(crate) fn check_eqname(&mut self) -> bool {
        self.peek().is_some_and(is_eqname)
    }

    pub(crate) fn check_nth_eqname(&mut self, n: usize) -> bool {
        self.peek_nth(n).is_some_and(is_eqname)
    }

    /// Consume an `EQName` and resolve it to an expanded name.
    pub(crate) fn parse_eqname(&mut self, default: NameDefault) -> StaticResult<(Name, Lexeme<'a>)> {
        if !self.check_eqname() {
            return Err(self.expected("a name"));
        }
        let lexeme = self.advance_required("a name")?;
        let name = self.resolve_name(&lexeme, default)?;
        Ok((name, lexeme))
    }

    pub(crate) fn resolve_name(&self, lexeme: &Lexeme, default: NameDefault) -> StaticResult<Name> {
        let namespaces = self.context.namespaces();
        match &lexeme.token {
            Token::NCName(local_name) => {
                let default_namespace = match default {
                    NameDefault::Element => namespaces.default_element_namespace(),
                    NameDefault::Function => namespaces.default_function_namespace(),
                    NameDefault::None => None,
                };
                Ok(Name::unprefixed(local_name).with_default_namespace(default_namespace))
            }
            Token::PrefixedQName(qname) => {
                Name::prefixed(qname.prefix, qname.local_name, namespaces).ok_or_else(|| {
                    self.error_at(
                        Error::XPST0081,
                        &format!("namespace prefix '{}' is not declared", qname.prefix),
                        lexeme,
                    )
                })
            }
            Token::URIQualifiedName(qname) => Ok(Name::uri_qualified(qname.uri, qname.local_name)),
            _ => Err(self.error_at(Error::XPST0003, "expected a name", lexeme)),
        }
    }

    /// Resolve an atomic type name through the three tiers: built-in
    /// schema types allowed by the type profile, foreign object types, and
    /// types from imported schemas.
    pub(crate) fn resolve_atomic_type(&self, name: &Name, lexeme: &Lexeme) -> StaticResult<ItemType> {
        match name.namespace() {
            Some(XS_NAMESPACE) => {
                let xs = self.resolve_xs(name, lexeme)?;
                if xs.is_atomic() {
                    Ok(ItemType::Atomic(xs))
                } else {
                    Err(self.error_at(
                        Error::XPST0051,
                        &format!("{name} is not an atomic type"),
                        lexeme,
                    ))
                }
            }
            Some(FOREIGN_NAMESPACE) => Ok(ItemType::Foreign(name.local_name().to_string())),
            Some(namespace) if self.context.is_schema_imported(namespace) => {
                Ok(ItemType::Imported(name.clone()))
            }
            Some(_) => Err(self.error_at(
                Error::XPST0051,
                &format!("type {name} is not defined; its schema has not been imported"),
                lexeme,
            )),
            None => Err(self.error_at(
                Error::XPST0051,
                &format!("type {name} is not defined"),
                lexeme,
            )),
        }
    }

    /// Resolve a built-in schema type name, enforcing the type profile.
    pub(crate) fn resolve_xs(&self, name: &Name, lexeme: &Lexeme) -> StaticResult<Xs> {
        let xs = Xs::by_name(name.namespace(), name.local_name()).ok_or_else(|| {
            self.error_at(
                Error::XPST0051,
                &format!("type {name} is not defined"),
                lexeme,
            )
        })?;
        if !self.context.profile().allows(xs) {
            return Err(self.error_at(
                Error::XPST0051,
                &format!("type {name} is not available in this type profile"),
                lexeme,
            ));
        }
        Ok(xs)
    }

    /// Resolve the target of `cast as` / `castable as`.
    pub(crate) fn resolve_cast_target(&self, name: &Name, lexeme: &Lexeme) -> StaticResult<Xs> {
        if name.namespace() != Some(XS_NAMESPACE) {
            // only built-in types have a cast table
            self.resolve_atomic_type(name, lexeme)?;
            return Err(self.error_at(
                Error::Unsupported,
                &format!("cannot cast to {name}"),
                lexeme,
            ));
        }
        let xs = self.resolve_xs(name, lexeme)?;
        if xs.is_abstract() {
            return Err(self.error_at(
                Error::XPST0080,
                &format!("cannot cast to abstract type {name}"),
                lexeme,
            ));
        }
        if !xs.is_atomic() {
            return Err(self.error_at(
                Error::XPST0051,
                &format!("{name} is not an atomic type"),
                lexeme,
            ));
        }
        Ok(xs)
    }
}

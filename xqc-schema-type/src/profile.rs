use strum::IntoEnumIterator;

use crate::Xs;

/// Which built-in types a compile unit may name.
///
/// A basic processor only knows the primitive types and `xs:integer`; the
/// derived integer types require the full profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeProfile {
    Basic,
    #[default]
    Full,
}

impl TypeProfile {
    pub fn allows(&self, xs: Xs) -> bool {
        match self {
            TypeProfile::Full => true,
            TypeProfile::Basic => matches!(
                xs,
                Xs::AnyType
                    | Xs::AnySimpleType
                    | Xs::Untyped
                    | Xs::AnyAtomicType
                    | Xs::String
                    | Xs::UntypedAtomic
                    | Xs::Boolean
                    | Xs::Decimal
                    | Xs::Integer
                    | Xs::Float
                    | Xs::Double
            ),
        }
    }

    pub fn allowed(&self) -> impl Iterator<Item = Xs> + '_ {
        Xs::iter().filter(move |xs| self.allows(*xs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_excludes_derived_integers() {
        assert!(TypeProfile::Basic.allows(Xs::Integer));
        assert!(!TypeProfile::Basic.allows(Xs::Short));
        assert!(TypeProfile::Full.allows(Xs::Short));
        assert_eq!(TypeProfile::Basic.allowed().count(), 11);
    }
}

/// A fixed table of C builtins the conditional-expression evaluator
/// consults when an identifier or call isn't found in the current macro
/// environment (spec §4.F step 5): type widths, an endianness hint, and
/// GCC/Clang feature-predicate calls stubbed to safe defaults.
///
/// None of these model a real target; they exist so that expressions like
/// `#if __SIZEOF_POINTER__ == 8` or `#if __has_attribute(deprecated)`
/// evaluate to *something* deterministic instead of failing, matching the
/// spirit of spec §9's "GCC feature predicates stubbed to safe defaults".
pub fn builtin_value(name: &str) -> Option<i128> {
    match name {
        "__SIZEOF_CHAR__" => Some(1),
        "__SIZEOF_SHORT__" => Some(2),
        "__SIZEOF_INT__" => Some(4),
        "__SIZEOF_LONG__" => Some(8),
        "__SIZEOF_LONG_LONG__" => Some(8),
        "__SIZEOF_POINTER__" => Some(8),
        "__SIZEOF_FLOAT__" => Some(4),
        "__SIZEOF_DOUBLE__" => Some(8),
        "__CHAR_BIT__" => Some(8),
        "__ORDER_LITTLE_ENDIAN__" => Some(1234),
        "__ORDER_BIG_ENDIAN__" => Some(4321),
        "__BYTE_ORDER__" => Some(1234),
        "__STDC__" => Some(1),
        "__STDC_VERSION__" => Some(201710),
        _ => None,
    }
}

/// Builtin predicate functions (`__has_feature(x)`, `__has_attribute(x)`,
/// `__has_builtin(x)`, `__has_include(x)`, `__has_include_next(x)`,
/// `__has_cpp_attribute(x)`). All are stubbed to `false`: a language-neutral
/// reimplementation has no real feature/attribute/include database to query.
pub fn is_builtin_predicate(name: &str) -> bool {
    matches!(
        name,
        "__has_feature"
            | "__has_attribute"
            | "__has_cpp_attribute"
            | "__has_builtin"
            | "__has_include"
            | "__has_include_next"
            | "__has_extension"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_builtins_resolve() {
        assert_eq!(builtin_value("__SIZEOF_INT__"), Some(4));
        assert_eq!(builtin_value("__ORDER_LITTLE_ENDIAN__"), Some(1234));
    }

    #[test]
    fn unknown_identifier_is_not_a_builtin() {
        assert_eq!(builtin_value("MY_FLAG"), None);
        assert!(!is_builtin_predicate("MY_FLAG"));
    }

    #[test]
    fn feature_predicates_are_recognized() {
        assert!(is_builtin_predicate("__has_attribute"));
        assert!(is_builtin_predicate("__has_include"));
    }
}

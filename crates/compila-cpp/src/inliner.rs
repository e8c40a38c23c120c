use crate::defines::Defines;
use crate::macro_expand::expand_text;

/// Inline every object-like and function-like macro reference in
/// already-preprocessed text (spec §4.G "Macro inlining").
///
/// This is a separate pass from directive processing: the preprocessor
/// (component F) only consults the macro environment for conditional
/// expressions and directive bodies, leaving ordinary source lines
/// untouched. A caller that wants `SQ(3+1)` rewritten to `((3+1)*(3+1))` in
/// its output runs this pass over the preprocessor's `text` afterward.
///
/// Unlike conditional evaluation, `defined` has no special meaning here, so
/// there is nothing to protect from expansion.
pub fn inline_macros(text: &str, defines: &Defines) -> String {
    expand_text(text, defines, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defines::Define;

    #[test]
    fn inlines_a_function_like_macro_call() {
        let mut defines = Defines::new();
        defines.insert(
            "SQ",
            Define::Function {
                params: vec!["x".to_string()],
                variadic: false,
                body: "((x)*(x))".to_string(),
            },
        );
        assert_eq!(inline_macros("SQ(3+1)", &defines), "((3+1)*(3+1))");
    }

    #[test]
    fn inlines_object_like_macros_across_a_whole_text_block() {
        let mut defines = Defines::new();
        defines.insert("MAX", Define::Object("100".to_string()));
        let text = "int a = MAX;\nint b = MAX + 1;\n";
        let inlined = inline_macros(text, &defines);
        assert_eq!(inlined, "int a = 100;\nint b = 100 + 1;\n");
    }

    #[test]
    fn leaves_text_with_no_macro_references_untouched() {
        let defines = Defines::new();
        assert_eq!(inline_macros("int a = 1;\n", &defines), "int a = 1;\n");
    }
}

use compila_parser::{DefinitionType, Grammar, Literal, NodeDefinition, Part, Pattern};

fn lit(name: &str, pattern: &str) -> Literal {
    Literal {
        name: name.to_string(),
        pattern: Pattern::compile(pattern, None)
            .unwrap_or_else(|e| panic!("bootstrap literal `{name}` failed to compile: {e}")),
    }
}

fn seq(name: &str, pattern: Vec<Part>) -> NodeDefinition {
    NodeDefinition {
        name: name.to_string(),
        def_type: DefinitionType::Sequence,
        pattern,
    }
}

fn alt(name: &str, pattern: Vec<Part>) -> NodeDefinition {
    NodeDefinition {
        name: name.to_string(),
        def_type: DefinitionType::Alternation,
        pattern,
    }
}

/// The bundled grammar for the BNF-like meta-language itself (spec §2: "a
/// bootstrap grammar model for BNF itself is bundled"). Running the
/// tokenizer and parser over a BNF source against this grammar yields the
/// CST that [`crate::lower`] consumes.
///
/// Concrete syntax, informally:
///
/// ```text
/// rule       := identifier "=" expression ";" attribute*
/// attribute  := "@" identifier (":" value)?
/// value      := string | number | identifier
/// expression := sequence ("|" sequence)*
/// sequence   := term+
/// term       := string | ident_term | group
/// ident_term := identifier ("?" | "*")?
/// group      := "[" expression "]" | "{" expression "}" | "(" expression ")"
/// directive  := "##" name args?
/// ```
pub fn bootstrap_grammar() -> Grammar {
    let literals = vec![
        lit("ws", r"[ \t\r\n]+"),
        lit("directive", r"##[^\n]*"),
        lit("string", r#""(?:[^"\\]|\\.)*""#),
        lit("number", r"[0-9]+(?:\.[0-9]+)?"),
        lit("identifier", r"[A-Za-z_][A-Za-z0-9_]*"),
        lit("qmark", r"\?"),
        lit("star", r"\*"),
        lit("pipe", r"\|"),
        lit("lbracket", r"\["),
        lit("rbracket", r"\]"),
        lit("lbrace", r"\{"),
        lit("rbrace", r"\}"),
        lit("lparen", r"\("),
        lit("rparen", r"\)"),
        lit("eq", r"="),
        lit("semi", r";"),
        lit("at", r"@"),
        lit("colon", r":"),
    ];

    let definitions = vec![
        alt("modifier", vec![Part::required("qmark"), Part::required("star")]),
        seq(
            "ident_term",
            vec![Part::required("identifier"), Part::optional("modifier")],
        ),
        alt(
            "group",
            vec![
                Part::required("bracket_group"),
                Part::required("brace_group"),
                Part::required("paren_group"),
            ],
        ),
        seq(
            "bracket_group",
            vec![
                Part::required("lbracket"),
                Part::required("expression"),
                Part::required("rbracket"),
            ],
        ),
        seq(
            "brace_group",
            vec![
                Part::required("lbrace"),
                Part::required("expression"),
                Part::required("rbrace"),
            ],
        ),
        seq(
            "paren_group",
            vec![
                Part::required("lparen"),
                Part::required("expression"),
                Part::required("rparen"),
            ],
        ),
        alt(
            "term",
            vec![
                Part::required("string"),
                Part::required("ident_term"),
                Part::required("group"),
            ],
        ),
        seq("sequence", vec![Part::repeated("term")]),
        seq("pipe_tail", vec![Part::required("pipe"), Part::required("sequence")]),
        seq(
            "expression",
            vec![Part::required("sequence"), Part::repeated("pipe_tail")],
        ),
        alt(
            "value",
            vec![
                Part::required("string"),
                Part::required("number"),
                Part::required("identifier"),
            ],
        ),
        seq(
            "attribute_value",
            vec![Part::required("colon"), Part::required("value")],
        ),
        seq(
            "attribute",
            vec![
                Part::required("at"),
                Part::required("identifier"),
                Part::optional("attribute_value"),
            ],
        ),
        seq(
            "rule",
            vec![
                Part::required("identifier"),
                Part::required("eq"),
                Part::required("expression"),
                Part::required("semi"),
                // `repeated` must trail a sequence (a repeated part ends the
                // match attempt for everything after it), so attributes are
                // written after the terminating `;` rather than before `=`.
                Part::repeated("attribute"),
            ],
        ),
    ];

    Grammar::new(
        literals,
        definitions,
        vec!["directive".to_string(), "rule".to_string()],
        vec!["ws".to_string()],
    )
}

//! spec.md §8 "BNF lowering round-trip": tokenizing and parsing the
//! bootstrap grammar's *own* source (written in its own BNF syntax) against
//! itself, then lowering the result, should yield a grammar equivalent to
//! the hand-built `bootstrap_grammar()` — same literals (modulo order),
//! same definitions (modulo `#n` group numbering, of which this source
//! introduces none, since every group here already names a rule directly).

use compila_bnf::{bootstrap_grammar, lower, NoIncludes};
use compila_issue::VecSink;
use compila_parser::{Parser, Tokenizer};

/// The bootstrap meta-grammar described in its own BNF-like syntax. Every
/// `NodeDefinition` in `bootstrap::bootstrap_grammar()` has a matching rule
/// here with the identical pattern shape, so lowering this source should
/// reproduce that table without needing any synthetic `<parent>#<n>`
/// sub-rule.
const BOOTSTRAP_BNF_SOURCE: &str = r##"
ws = "[ \t\r\n]+"; ##ignore ws
directive = "##[^\n]*";
string = "\"(?:[^\"\\\\]|\\\\.)*\"";
number = "[0-9]+(?:\.[0-9]+)?";
identifier = "[A-Za-z_][A-Za-z0-9_]*";
qmark = "\?";
star = "\*";
pipe = "\|";
lbracket = "\[";
rbracket = "\]";
lbrace = "\{";
rbrace = "\}";
lparen = "\(";
rparen = "\)";
eq = "=";
semi = ";";
at = "@";
colon = ":";

modifier = qmark | star;
ident_term = identifier modifier?;
bracket_group = lbracket expression rbracket;
brace_group = lbrace expression rbrace;
paren_group = lparen expression rparen;
group = bracket_group | brace_group | paren_group;
term = string | ident_term | group;
sequence = {term};
pipe_tail = pipe sequence;
expression = sequence {pipe_tail};
value = string | number | identifier;
attribute_value = colon value;
attribute = at identifier attribute_value?;
rule = identifier eq expression semi {attribute};

##root directive
##root rule
"##;

#[test]
fn bootstrap_grammar_can_parse_and_lower_its_own_description() {
    let bootstrap = bootstrap_grammar();
    let mut sink = VecSink::new();
    let tokens = Tokenizer::new(&bootstrap.literals)
        .tokenize(BOOTSTRAP_BNF_SOURCE, Some("bootstrap.bnf"), &mut sink)
        .expect("bootstrap source tokenizes against its own literal set");
    let outcome = Parser::new(&bootstrap, tokens).parse(&mut sink);
    assert!(
        !outcome.fatal,
        "bootstrap source failed to parse against its own grammar: {:?}",
        sink.issues()
    );

    let lowered = lower(&outcome.nodes, &mut NoIncludes, &mut sink);
    assert!(
        !sink.has_errors(),
        "lowering the bootstrap source raised errors: {:?}",
        sink.issues()
    );

    let mut lowered_literal_names: Vec<&str> =
        lowered.literals.iter().map(|l| l.name.as_str()).collect();
    let mut bootstrap_literal_names: Vec<&str> =
        bootstrap.literals.iter().map(|l| l.name.as_str()).collect();
    lowered_literal_names.sort_unstable();
    bootstrap_literal_names.sort_unstable();
    assert_eq!(lowered_literal_names, bootstrap_literal_names);

    for literal in &bootstrap.literals {
        let found = lowered
            .literal(&literal.name)
            .unwrap_or_else(|| panic!("lowered grammar is missing literal `{}`", literal.name));
        assert_eq!(found.pattern.source(), literal.pattern.source());
    }

    let mut lowered_def_names: Vec<&str> =
        lowered.definitions.iter().map(|d| d.name.as_str()).collect();
    let mut bootstrap_def_names: Vec<&str> =
        bootstrap.definitions.iter().map(|d| d.name.as_str()).collect();
    lowered_def_names.sort_unstable();
    bootstrap_def_names.sort_unstable();
    assert_eq!(
        lowered_def_names, bootstrap_def_names,
        "no synthetic #n sub-rules should appear: every group in this source names an existing rule"
    );

    for def in &bootstrap.definitions {
        let found = lowered
            .definition(&def.name)
            .unwrap_or_else(|| panic!("lowered grammar is missing definition `{}`", def.name));
        assert_eq!(found.def_type, def.def_type, "definition `{}` type mismatch", def.name);
        assert_eq!(found.pattern, def.pattern, "definition `{}` pattern mismatch", def.name);
    }

    assert!(lowered.is_ignored("ws"));
    let mut lowered_roots = lowered.root_nodes.clone();
    let mut bootstrap_roots = bootstrap.root_nodes.clone();
    lowered_roots.sort();
    bootstrap_roots.sort();
    assert_eq!(lowered_roots, bootstrap_roots);
}

#[test]
fn bootstrap_grammar_parses_a_real_target_grammar_description() {
    let bootstrap = bootstrap_grammar();
    let source = r#"
        ws = "[ \t]+"; ##ignore ws
        ident = "[a-zA-Z_][a-zA-Z0-9_]*";
        number = "[0-9]+";
        atom = ident | number;
        list = atom {atom};
        ##root list
    "#;
    let mut sink = VecSink::new();
    let tokens = Tokenizer::new(&bootstrap.literals)
        .tokenize(source, Some("target.bnf"), &mut sink)
        .expect("target grammar source tokenizes");
    let outcome = Parser::new(&bootstrap, tokens).parse(&mut sink);
    assert!(!outcome.fatal, "{:?}", sink.issues());

    let target = lower(&outcome.nodes, &mut NoIncludes, &mut sink);
    assert_eq!(target.root_nodes, vec!["list".to_string()]);
    assert!(target.is_ignored("ws"));
    assert!(target.definition("list").is_some());
    assert!(target.definition("atom").is_some());
}

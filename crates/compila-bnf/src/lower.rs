use compila_issue::{Issue, IssueSink, Location};
use compila_parser::{
    DefinitionType, Grammar, Literal, Node, NodeDefinition, Part, PartType, Parser, Pattern,
    Tokenizer,
};

use crate::bootstrap::bootstrap_grammar;

/// Resolves a `##include <path>` directive to the BNF source it names.
///
/// The lowering pass owns parsing the returned text against the bootstrap
/// grammar; a resolver only has to locate bytes.
pub trait IncludeResolver {
    fn resolve(&mut self, name: &str) -> Option<String>;
}

/// An `IncludeResolver` that never resolves anything, for callers with no
/// `##include` support (or for testing a source that doesn't use it).
pub struct NoIncludes;

impl IncludeResolver for NoIncludes {
    fn resolve(&mut self, _name: &str) -> Option<String> {
        None
    }
}

/// Result of lowering one expression: the definition shape it reduces to,
/// plus whether a lone part came from a quoted-string term (group elision
/// treats those differently from identifier/group references).
struct Lowered {
    def_type: DefinitionType,
    parts: Vec<Part>,
    single_is_string: bool,
}

/// Walks a BNF CST and accumulates a [`Grammar`] (spec §4.E).
struct Lowering<'r> {
    literals: Vec<Literal>,
    definitions: Vec<NodeDefinition>,
    root_nodes: Vec<String>,
    ignored_literals: Vec<String>,
    /// Counts synthetic `<parent>#<n>` sub-rules within the rule currently
    /// being lowered; reset at the start of every `rule` node.
    group_counter: u32,
    include: &'r mut dyn IncludeResolver,
}

/// Lower a BNF CST (as produced by parsing against [`bootstrap_grammar`])
/// into a runtime [`Grammar`].
pub fn lower(roots: &[Node], include: &mut dyn IncludeResolver, sink: &mut dyn IssueSink) -> Grammar {
    let mut lowering = Lowering {
        literals: Vec::new(),
        definitions: Vec::new(),
        root_nodes: Vec::new(),
        ignored_literals: Vec::new(),
        group_counter: 0,
        include,
    };
    for node in roots {
        lowering.walk_node(node, sink);
    }
    if lowering.root_nodes.is_empty() {
        sink.report(Issue::warning("No root nodes are defined"));
    }
    Grammar::new(
        lowering.literals,
        lowering.definitions,
        lowering.root_nodes,
        lowering.ignored_literals,
    )
}

impl<'r> Lowering<'r> {
    fn location(&self, node: &Node) -> Location {
        Location {
            line: node.line,
            column: node.column,
            position: node.position,
            unit: None,
        }
    }

    /// Only `directive` and `rule` nodes drive lowering; everything else is
    /// walked into looking for them (spec §4.E "Node walk").
    fn walk_node(&mut self, node: &Node, sink: &mut dyn IssueSink) {
        match node.kind.as_str() {
            "directive" => self.handle_directive(node, sink),
            "rule" => self.handle_rule(node, sink),
            _ => {
                for child in &node.children {
                    self.walk_node(child, sink);
                }
            }
        }
    }

    fn handle_directive(&mut self, node: &Node, sink: &mut dyn IssueSink) {
        let text = node.text.as_str().trim_start_matches('#').trim_start();
        let mut split = text.splitn(2, char::is_whitespace);
        let name = split.next().unwrap_or("");
        let args = split.next().unwrap_or("").trim();

        match name {
            "root" => self.root_nodes.extend(split_on_seps(args)),
            "ignore" => self.ignored_literals.extend(split_on_seps(args)),
            "include" => self.handle_include(args, node, sink),
            "flags" => self.handle_flags(args, node, sink),
            "groups" => self.handle_groups(args, node, sink),
            other => sink.report(
                Issue::note(format!("unknown directive `##{other}`")).at(self.location(node)),
            ),
        }
    }

    fn handle_include(&mut self, args: &str, node: &Node, sink: &mut dyn IssueSink) {
        let path = args.trim().trim_matches('"');
        match self.include.resolve(path) {
            None => sink.report(
                Issue::warning(format!("cannot resolve `##include {path}`")).at(self.location(node)),
            ),
            Some(source) => {
                let grammar = bootstrap_grammar();
                let tokenizer = Tokenizer::new(&grammar.literals);
                if let Some(tokens) = tokenizer.tokenize(&source, Some(path), sink) {
                    let outcome = Parser::new(&grammar, tokens).parse(sink);
                    for included in &outcome.nodes {
                        self.walk_node(included, sink);
                    }
                }
            }
        }
    }

    fn handle_flags(&mut self, args: &str, node: &Node, sink: &mut dyn IssueSink) {
        let mut split = args.splitn(2, char::is_whitespace);
        let name = split.next().unwrap_or("").trim();
        let flags = split.next().unwrap_or("").trim();
        let Some(literal) = self.literals.iter_mut().find(|l| l.name == name) else {
            sink.report(
                Issue::warning(format!("##flags: no such literal `{name}`")).at(self.location(node)),
            );
            return;
        };
        let source = literal.pattern.source().to_string();
        match Pattern::compile(&source, Some(flags).filter(|f| !f.is_empty())) {
            Ok(pattern) => literal.pattern = pattern,
            Err(cause) => sink.report(
                Issue::error(format!("##flags: invalid flags `{flags}` for `{name}`: {cause}"))
                    .at(self.location(node)),
            ),
        }
    }

    fn handle_groups(&mut self, args: &str, node: &Node, sink: &mut dyn IssueSink) {
        let mut tokens = args.split_whitespace();
        let Some(rule) = tokens.next() else {
            sink.report(Issue::warning("##groups: missing rule name").at(self.location(node)));
            return;
        };
        for (i, raw_name) in tokens.enumerate() {
            let new_name = raw_name.replace('%', rule);
            let old_name = format!("{rule}#{i}");
            for def in &mut self.definitions {
                if def.name == old_name {
                    def.name = new_name.clone();
                }
                for part in &mut def.pattern {
                    if part.kind == old_name {
                        part.kind = new_name.clone();
                    }
                }
            }
        }
    }

    fn handle_rule(&mut self, node: &Node, sink: &mut dyn IssueSink) {
        let name_node = node.children.iter().find(|c| c.kind.as_str() == "identifier");
        let Some(name_node) = name_node else {
            sink.report(Issue::error("rule is missing a name").at(self.location(node)));
            return;
        };
        let name = name_node.text.to_string();

        let expr_node = node.children.iter().find(|c| c.kind.as_str() == "expression");
        let Some(expr_node) = expr_node else {
            sink.report(
                Issue::error(format!("rule `{name}` is missing an expression"))
                    .at(self.location(node)),
            );
            return;
        };

        self.group_counter = 0;
        let lowered = self.lower_expression(&name, expr_node, sink);

        let mut is_root = false;
        let mut is_ignore = false;
        for attribute in node.children.iter().filter(|c| c.kind.as_str() == "attribute") {
            self.handle_attribute(&name, attribute, &mut is_root, &mut is_ignore, sink);
        }

        self.definitions.push(NodeDefinition {
            name: name.clone(),
            def_type: lowered.def_type,
            pattern: lowered.parts,
        });
        if is_root {
            self.root_nodes.push(name.clone());
        }

        self.try_inline_single_use_literal(&name, is_ignore);
    }

    fn handle_attribute(
        &mut self,
        rule: &str,
        node: &Node,
        is_root: &mut bool,
        is_ignore: &mut bool,
        sink: &mut dyn IssueSink,
    ) {
        let Some(ident) = node.children.iter().find(|c| c.kind.as_str() == "identifier") else {
            return;
        };
        match ident.text.as_str() {
            "root" => *is_root = true,
            "ignore" => *is_ignore = true,
            _ => {}
        }

        let Some(attribute_value) = node.children.iter().find(|c| c.kind.as_str() == "attribute_value")
        else {
            return;
        };
        let Some(value) = attribute_value.children.iter().find(|c| c.kind.as_str() == "value") else {
            return;
        };
        if let Some(inner) = value.children.first() {
            if inner.kind.as_str() == "identifier" {
                sink.report(
                    Issue::note(format!(
                        "attribute `@{}` on rule `{rule}` has an identifier value; treated as null",
                        ident.text
                    ))
                    .at(self.location(node)),
                );
            }
        }
    }

    /// Collapse `name = "<pattern>";` from a literal plus a one-part
    /// sequence referencing it into a single renamed literal (spec §4.E
    /// "Single-use-literal inlining").
    fn try_inline_single_use_literal(&mut self, name: &str, is_ignore: bool) {
        let Some(def) = self.definitions.last() else {
            return;
        };
        if def.name != name || def.pattern.len() != 1 || def.pattern[0].part_type != PartType::Required
        {
            return;
        }
        let literal_kind = def.pattern[0].kind.clone();
        let Some(pos) = self
            .literals
            .iter()
            .position(|l| l.name == literal_kind && l.pattern.source() == literal_kind)
        else {
            return;
        };

        self.literals[pos].name = name.to_string();
        self.definitions.pop();
        if is_ignore {
            self.ignored_literals.push(name.to_string());
        }
    }

    /// Lower an `expression` node: one or more `|`-separated sequences.
    fn lower_expression(&mut self, parent: &str, expr: &Node, sink: &mut dyn IssueSink) -> Lowered {
        let mut sequences: Vec<&Node> = Vec::new();
        for child in &expr.children {
            match child.kind.as_str() {
                "sequence" => sequences.push(child),
                "pipe_tail" => {
                    if let Some(seq) = child.children.iter().find(|c| c.kind.as_str() == "sequence") {
                        sequences.push(seq);
                    }
                }
                _ => {}
            }
        }

        if sequences.len() == 1 {
            let (parts, single_is_string) = self.lower_sequence_terms(parent, sequences[0], sink);
            return Lowered {
                def_type: DefinitionType::Sequence,
                parts,
                single_is_string,
            };
        }

        let parts = sequences
            .into_iter()
            .map(|seq| self.lower_alternative(parent, seq, sink))
            .collect();
        Lowered {
            def_type: DefinitionType::Alternation,
            parts,
            single_is_string: false,
        }
    }

    /// Lower one `|`-separated alternative of a top-level expression: it
    /// reduces to exactly one [`Part`], reusing a lone term directly or
    /// synthesizing a `<parent>#<n>` sequence sub-rule otherwise.
    fn lower_alternative(&mut self, parent: &str, seq: &Node, sink: &mut dyn IssueSink) -> Part {
        let (mut parts, _) = self.lower_sequence_terms(parent, seq, sink);
        if parts.len() == 1 {
            return parts.remove(0);
        }
        let sub_name = self.fresh_sub_rule(parent, DefinitionType::Sequence, parts);
        Part::required(sub_name)
    }

    fn lower_sequence_terms(
        &mut self,
        parent: &str,
        seq: &Node,
        sink: &mut dyn IssueSink,
    ) -> (Vec<Part>, bool) {
        let terms: Vec<&Node> = seq.children.iter().filter(|c| c.kind.as_str() == "term").collect();
        let mut parts = Vec::with_capacity(terms.len());
        let mut last_is_string = false;
        for term in terms {
            let (part, is_string) = self.lower_term(parent, term, sink);
            last_is_string = is_string;
            parts.push(part);
        }
        let single_is_string = parts.len() == 1 && last_is_string;
        (parts, single_is_string)
    }

    fn lower_term(&mut self, parent: &str, term: &Node, sink: &mut dyn IssueSink) -> (Part, bool) {
        let Some(inner) = term.children.first() else {
            return (Part::required(String::new()), false);
        };
        match inner.kind.as_str() {
            "string" => {
                let name = self.intern_string_literal(inner.text.as_str(), inner, sink);
                (Part::required(name), true)
            }
            "ident_term" => (self.lower_ident_term(inner), false),
            "group" => (self.lower_group(parent, inner, sink), false),
            _ => (Part::required(inner.kind.to_string()), false),
        }
    }

    fn lower_ident_term(&mut self, ident_term: &Node) -> Part {
        let kind = ident_term
            .children
            .iter()
            .find(|c| c.kind.as_str() == "identifier")
            .map(|c| c.text.to_string())
            .unwrap_or_default();
        let modifier = ident_term
            .children
            .iter()
            .find(|c| c.kind.as_str() == "modifier")
            .and_then(|m| m.children.first());
        match modifier.map(|m| m.kind.as_str()) {
            Some("star") => Part::repeated(kind),
            Some("qmark") => Part::optional(kind),
            _ => Part::required(kind),
        }
    }

    /// Lower a bracketed group: `[...]` → optional, `{...}` → repeated,
    /// `(...)` → required, around a recursively lowered inner expression
    /// (spec §4.E "Group lowering").
    fn lower_group(&mut self, parent: &str, group: &Node, sink: &mut dyn IssueSink) -> Part {
        let Some(inner) = group.children.first() else {
            return Part::required(String::new());
        };
        enum Bracket {
            Optional,
            Repeated,
            Required,
        }
        let (bracket, expr_node) = match inner.kind.as_str() {
            "bracket_group" => (Bracket::Optional, inner.children.get(1)),
            "brace_group" => (Bracket::Repeated, inner.children.get(1)),
            "paren_group" => (Bracket::Required, inner.children.get(1)),
            _ => return Part::required(String::new()),
        };
        let Some(expr_node) = expr_node else {
            return Part::required(String::new());
        };

        let lowered = self.lower_expression(parent, expr_node, sink);
        let name = if lowered.parts.len() == 1 && !lowered.single_is_string {
            lowered.parts.into_iter().next().unwrap().kind
        } else {
            self.fresh_sub_rule(parent, lowered.def_type, lowered.parts)
        };

        match bracket {
            Bracket::Optional => Part::optional(name),
            Bracket::Repeated => Part::repeated(name),
            Bracket::Required => Part::required(name),
        }
    }

    fn fresh_sub_rule(&mut self, parent: &str, def_type: DefinitionType, parts: Vec<Part>) -> String {
        let sub_name = format!("{parent}#{}", self.group_counter);
        self.group_counter += 1;
        self.definitions.push(NodeDefinition {
            name: sub_name.clone(),
            def_type,
            pattern: parts,
        });
        sub_name
    }

    /// Intern a quoted-string term as a literal named after its own
    /// unescaped text, deduplicating by that name (spec §4.E "String and
    /// identifier terms").
    fn intern_string_literal(&mut self, quoted: &str, node: &Node, sink: &mut dyn IssueSink) -> String {
        let text = unescape_string_text(quoted);
        if self.literals.iter().any(|l| l.name == text) {
            return text;
        }
        match Pattern::compile(&text, None) {
            Ok(pattern) => {
                self.literals.push(Literal {
                    name: text.clone(),
                    pattern,
                });
            }
            Err(cause) => sink.report(
                Issue::error(format!("invalid pattern in string term `{text}`: {cause}"))
                    .at(self.location(node)),
            ),
        }
        text
    }
}

/// Split directive arguments on space, comma, or semicolon (spec §4.E
/// "root"/"ignore" directive handling).
fn split_on_seps(args: &str) -> Vec<String> {
    args.split([' ', ',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strip the surrounding quotes from a string token and un-escape exactly
/// `\"` and `\\`; every other backslash sequence is left verbatim so regex
/// metacharacters like `\t` in a literal pattern pass through untouched.
fn unescape_string_text(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('"') => {
                    out.push('"');
                    chars.next();
                }
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                }
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

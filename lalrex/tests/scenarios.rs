//! End-to-end scenarios: realistic grammars driven through generation,
//! lexing and parsing.

use lalrex::{generate, LalrexError, ParseEvent, SymbolKind};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Action tags of the reductions of a parse, in order.
fn reduction_tags<'a>(tables: &lalrex::Tables<'a>, input: &str) -> Vec<&'a str> {
    tables
        .parse(input)
        .unwrap()
        .into_iter()
        .filter_map(|event| match event {
            ParseEvent::Reduce { action, .. } => action,
            _ => None,
        })
        .collect()
}

const XML: &str = r#"
    xml {
        %whitespace "[ \t\r\n]+";
        %left '<' '>';
        %left name;
        document: prolog elements [document];
        prolog: | '<?xml' attributes '?>' [prolog];
        elements: elements element [create_element] | ;
        element: '<' name attributes '/>' [short_element]
               | '<' name attributes '>' elements '</' name '>' [long_element];
        attributes: attributes attribute [create_attribute] | ;
        attribute: name '=' value [attribute];
        name: "[A-Za-z_][A-Za-z0-9_]*";
        value: "'[^']*'";
    }
"#;

#[test]
fn xml_short_element_reductions() {
    init_logger();
    let tables = generate(XML).unwrap();
    assert_eq!(
        reduction_tags(&tables, "<x y='1'/>"),
        vec![
            "attribute",
            "create_attribute",
            "short_element",
            "create_element",
            "document"
        ]
    );
}

#[test]
fn xml_long_element_nests() {
    let tables = generate(XML).unwrap();
    let tags = reduction_tags(&tables, "<a><b/></a>");
    assert_eq!(
        tags,
        vec![
            "short_element",
            "create_element",
            "long_element",
            "create_element",
            "document"
        ]
    );
}

#[test]
fn xml_prolog_is_recognized() {
    let tables = generate(XML).unwrap();
    let tags = reduction_tags(&tables, "<?xml version='1.0'?><a/>");
    assert_eq!(
        tags,
        vec![
            "attribute",
            "create_attribute",
            "prolog",
            "short_element",
            "create_element",
            "document"
        ]
    );
}

#[test]
fn xml_lexer_prefers_longest_delimiter() {
    let tables = generate(XML).unwrap();
    let open = tables.find_symbol("<", SymbolKind::Terminal).unwrap();
    let close = tables.find_symbol("</", SymbolKind::Terminal).unwrap();
    assert_eq!(tables.lex("<a").unwrap(), ("<", open));
    assert_eq!(tables.lex("</a").unwrap(), ("</", close));
}

#[test]
fn xml_rejects_mismatched_input() {
    let tables = generate(XML).unwrap();
    assert!(matches!(
        tables.parse("<x y=/>"),
        Err(LalrexError::UnexpectedToken { .. })
    ));
}

const JSON: &str = r#"
    json {
        %whitespace "[ \t\r\n]+";
        document: value [document];
        value: 'null' [null] | boolean | integer | real | string
             | object | array [array];
        boolean: 'true' | 'false';
        integer: "(\+|\-)?[0-9]+";
        real: "(\+|\-)?[0-9]+\.[0-9]+((e|E)(\+|\-)?[0-9]+)?";
        string: "\"[^\"]*\"";
        object: '{' members '}' [create_object];
        members: members ',' attribute | attribute | ;
        attribute: string ':' value [attribute];
        array: '[' elements ']' [create_array];
        elements: value ',' elements [value] | value | ;
    }
"#;

#[test]
fn json_object_with_array_reductions() {
    init_logger();
    let tables = generate(JSON).unwrap();
    assert_eq!(
        reduction_tags(&tables, r#"{"a": [1, true, null]}"#),
        vec![
            "null",
            "value",
            "value",
            "create_array",
            "array",
            "attribute",
            "create_object",
            "document"
        ]
    );
}

#[test]
fn json_aliases_collapse_to_terminals() {
    let tables = generate(JSON).unwrap();
    // integer, real and string are plain aliases and disappear into their
    // regex terminals during optimization.
    for i in 0..tables.n_symbols() {
        let s = tables.symbol(i);
        assert_ne!(s.name, "integer");
        assert_ne!(s.name, "real");
        assert_ne!(s.name, "string");
    }
    assert!(tables
        .find_symbol("(\\+|\\-)?[0-9]+", SymbolKind::Terminal)
        .is_some());
}

#[test]
fn json_numbers_lex_by_longest_match() {
    let tables = generate(JSON).unwrap();
    let integer = tables
        .find_symbol("(\\+|\\-)?[0-9]+", SymbolKind::Terminal)
        .unwrap();
    let real = tables
        .find_symbol(
            "(\\+|\\-)?[0-9]+\\.[0-9]+((e|E)(\\+|\\-)?[0-9]+)?",
            SymbolKind::Terminal,
        )
        .unwrap();
    assert_eq!(tables.lex("33").unwrap(), ("33", integer));
    assert_eq!(tables.lex("-332.235e-34").unwrap(), ("-332.235e-34", real));
}

#[test]
fn json_empty_containers() {
    let tables = generate(JSON).unwrap();
    assert_eq!(
        reduction_tags(&tables, "[]"),
        vec!["create_array", "array", "document"]
    );
    assert_eq!(
        reduction_tags(&tables, "{}"),
        vec!["create_object", "document"]
    );
}

const CALC: &str = r#"
    calc {
        %whitespace "[ \t]+";
        %left '+';
        %left '*';
        expr: expr '+' expr [add]
            | expr '*' expr [mul]
            | "[0-9]+" [int];
    }
"#;

#[test]
fn precedence_resolves_arithmetic_ambiguity() {
    init_logger();
    // '*' is declared after '+', so it binds tighter: 1+2*3 groups as
    // 1+(2*3), visible as mul reducing before add.
    let tables = generate(CALC).unwrap();
    assert_eq!(
        reduction_tags(&tables, "1 + 2 * 3"),
        vec!["int", "int", "int", "mul", "add"]
    );
    assert_eq!(
        reduction_tags(&tables, "1 * 2 + 3"),
        vec!["int", "int", "mul", "int", "add"]
    );
}

#[test]
fn left_associativity_groups_leftward() {
    let tables = generate(CALC).unwrap();
    // 1+2+3 reduces the left sum before consuming the second '+'.
    assert_eq!(
        reduction_tags(&tables, "1 + 2 + 3"),
        vec!["int", "int", "add", "int", "add"]
    );
}

#[test]
fn missing_precedence_aborts_construction() {
    let err = generate("calc { expr: expr '+' expr [add] | \"[0-9]+\" [int]; }")
        .unwrap_err();
    assert!(matches!(err, LalrexError::ShiftReduceConflict { .. }));
}

#[test]
fn whitespace_tokens_never_reach_the_parser() {
    let tables = generate(CALC).unwrap();
    let events = tables.parse("  1  +   2  ").unwrap();
    let shifts = events
        .iter()
        .filter(|e| matches!(e, ParseEvent::Shift { .. }))
        .count();
    assert_eq!(shifts, 3);
}

#[test]
fn lexemes_are_reported_verbatim() {
    let tables = generate(CALC).unwrap();
    let events = tables.parse("12 + 345").unwrap();
    let lexemes: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ParseEvent::Shift { lexeme, .. } => Some(*lexeme),
            _ => None,
        })
        .collect();
    assert_eq!(lexemes, vec!["12", "+", "345"]);
}

#[test]
fn generation_is_deterministic() {
    let a = generate(JSON).unwrap();
    let b = generate(JSON).unwrap();
    assert_eq!(a.n_symbols(), b.n_symbols());
    assert_eq!(a.n_productions(), b.n_productions());
    assert_eq!(a.n_states(), b.n_states());
    for i in 0..a.n_states() {
        assert_eq!(a.state(i).transitions(), b.state(i).transitions());
    }
}

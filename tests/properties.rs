use codemin::languages::default_registry;
use codemin::scanner::scan;
use codemin::{minify, Language};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Map, Value};

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[a-z /*#\"\\\\]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

const CODE_LANGUAGES: [Language; 7] = [
    Language::Css,
    Language::JavaScript,
    Language::Json,
    Language::Sql,
    Language::Php,
    Language::Python,
    Language::Universal,
];

/// One scanner pass with the language's default table.
fn scan_as(language: Language, source: &str) -> String {
    scan(source, default_registry().get(language).rules())
}

/// String content made of plain characters, escaped backslashes and
/// escaped double quotes.
fn escaped_content() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-z #/*-]".prop_map(String::from),
            Just("\\\\".to_string()),
            Just("\\\"".to_string()),
        ],
        0..10,
    )
    .prop_map(|parts| parts.concat())
}

fn css_rule() -> impl Strategy<Value = String> {
    (
        "[a-z]{1,6}",
        prop::collection::vec(("[a-z]{1,8}", "[a-z0-9]{1,6}"), 1..4),
        "[ \n\t]{0,3}",
    )
        .prop_map(|(selector, decls, ws)| {
            let body: String = decls
                .iter()
                .map(|(prop, value)| format!("{ws}{prop} :{ws}{value}{ws};"))
                .collect();
            format!("{selector}{ws}{{{body}{ws}}}\n")
        })
}

proptest! {
    #[test]
    fn json_matches_compact_serialization(value in json_value()) {
        let pretty = serde_json::to_string_pretty(&value).unwrap();
        let compact = serde_json::to_string(&value).unwrap();
        prop_assert_eq!(minify(Language::Json, &pretty), compact);
    }

    #[test]
    fn minifying_twice_changes_nothing(rules in prop::collection::vec(css_rule(), 1..5)) {
        let css = rules.concat();
        let once = minify(Language::Css, &css);
        prop_assert_eq!(minify(Language::Css, &once), once);
    }

    #[test]
    fn string_literals_survive(content in "[a-zA-Z0-9 /*#<>-]{0,20}") {
        let js = format!("var s  =  \"{content}\" ;\n// trailing\n");
        let out = minify(Language::JavaScript, &js);
        let quoted = format!("\"{}\"", content);
        prop_assert!(out.contains(&quoted), "{:?} lost {:?}", out, quoted);
    }

    #[test]
    fn comments_are_removed(
        stmts in prop::collection::vec(("[a-z]{1,6}", 0u32..1000, "[a-z ]{0,10}", any::<bool>()), 1..6)
    ) {
        let js: String = stmts
            .iter()
            .map(|(name, n, note, line)| {
                if *line {
                    format!("let {name} = {n}; // {note}\n")
                } else {
                    format!("let {name} = {n}; /* {note} */\n")
                }
            })
            .collect();
        let out = minify(Language::JavaScript, &js);
        prop_assert!(!out.contains("//"), "{:?}", out);
        prop_assert!(!out.contains("/*"), "{:?}", out);
    }

    #[test]
    fn words_never_fuse(
        words in prop::collection::vec("[a-z_][a-z0-9_]{0,5}", 1..8),
        gaps in prop::collection::vec("[ \t\n]{1,3}", 8),
    ) {
        let mut js = String::new();
        for (word, gap) in words.iter().zip(&gaps) {
            js.push_str(word);
            js.push_str(gap);
        }
        let out = minify(Language::JavaScript, &js);
        let tokens: Vec<&str> = out.split_whitespace().collect();
        prop_assert_eq!(tokens, words.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn scanning_code_twice_changes_nothing(source in "[ab \n\"'`\\\\#/*+-]{0,24}") {
        for language in CODE_LANGUAGES {
            let once = scan_as(language, &source);
            prop_assert_eq!(scan_as(language, &once), once, "{} on {:?}", language, source);
        }
    }

    #[test]
    fn scanning_markup_twice_changes_nothing(source in "[ab<>/=\"' \n]{0,24}") {
        for language in [Language::Html, Language::Xml] {
            let once = scan_as(language, &source);
            prop_assert_eq!(scan_as(language, &once), once, "{} on {:?}", language, source);
        }
    }

    #[test]
    fn escaped_strings_survive_every_code_language(content in escaped_content()) {
        let quoted = format!("\"{}\"", content);
        let sources = [
            (Language::JavaScript, format!("x  =  {quoted} ;\n// NOTE\n")),
            (Language::Python, format!("x = {quoted}  # NOTE\n")),
            (Language::Php, format!("<?php\n$x = {quoted} ; # NOTE\n")),
            (Language::Json, format!("{{ \"k\" : {quoted} }}")),
            (Language::Css, format!("a {{ content : {quoted} ; }} /* NOTE */")),
            (Language::Universal, format!("x = {quoted}  // NOTE\n")),
        ];
        for (language, source) in sources {
            let out = minify(language, &source);
            prop_assert!(out.contains(&quoted), "{} lost {:?} in {:?}", language, quoted, out);
            prop_assert!(!out.contains("NOTE"), "{} kept the comment: {:?}", language, out);
        }
    }

    #[test]
    fn attribute_values_survive_markup(content in "[a-z <>/=' #*-]{0,16}") {
        let quoted = format!("\"{}\"", content);
        let sources = [
            (Language::Html, format!("<p  title = {quoted} >\n  x  </p>")),
            (Language::Xml, format!("<r  a = {quoted}  />")),
        ];
        for (language, source) in sources {
            let out = minify(language, &source);
            prop_assert!(out.contains(&quoted), "{} lost {:?} in {:?}", language, quoted, out);
        }
    }

    #[test]
    fn preformatted_text_is_untouched(content in "[a-z \n]{0,30}") {
        let html = format!("<div>\n  <p> a  b </p>\n  <pre>{content}</pre>\n</div>\n");
        let out = minify(Language::Html, &html);
        let pre = format!("<pre>{}</pre>", content);
        prop_assert!(out.contains(&pre), "{:?} lost {:?}", out, pre);
    }
}

#[test]
fn css_sample_is_stable() {
    let css = "/* header */\nbody {\n  margin : 0 ;\n}\n\na > b {\n  color: red;\n}\n";
    let once = minify(Language::Css, css);
    assert_eq!(minify(Language::Css, &once), once);
    assert!(!once.contains("header"));
}

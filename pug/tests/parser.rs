use pug::node::{BranchKeyword, NodeKind};
use pug::{Attribute, Node, TemplateError};

fn parse(source: &str) -> Node {
    pug::parse(source).expect("parse failed")
}

fn parse_err(source: &str) -> TemplateError {
    match pug::parse(source) {
        Ok(root) => panic!("expected an error, got {:#?}", root),
        Err(e) => e,
    }
}

fn lex_message(source: &str) -> String {
    match parse_err(source) {
        TemplateError::Lex(e) => e.message,
        TemplateError::Parse(e) => panic!("expected a lexer error, got parser error: {}", e.message),
    }
}

fn parse_message(source: &str) -> String {
    match parse_err(source) {
        TemplateError::Parse(e) => e.message,
        TemplateError::Lex(e) => panic!("expected a parser error, got lexer error: {}", e.message),
    }
}

/// Values of every `class` attribute in pre-order.
fn class_values(node: &Node) -> Vec<String> {
    let mut out = Vec::new();
    collect_classes(node, &mut out);
    out
}

fn collect_classes(node: &Node, out: &mut Vec<String>) {
    for attribute in node.attributes() {
        if attribute.name == "class" {
            if let Some(value) = &attribute.value {
                out.push(value.clone());
            }
        }
    }
    for child in node.children() {
        collect_classes(child, out);
    }
}

fn tag(node: &Node) -> &str {
    match &node.kind {
        NodeKind::Tag(name) => name,
        other => panic!("expected a tag, got {:?}", other),
    }
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

#[test]
fn class_shorthand_becomes_quoted_attribute() {
    let root = parse("p.intro");
    let p = &root.children()[0];
    assert_eq!(tag(p), "p");
    assert_eq!(p.attributes(), &[Attribute::new("class", Some("'intro'".to_string()))]);
}

#[test]
fn implicit_div() {
    let root = parse(".card#main");
    let div = &root.children()[0];
    assert_eq!(tag(div), "div");
    assert_eq!(
        div.attributes(),
        &[
            Attribute::class_shorthand("card"),
            Attribute::id_shorthand("main"),
        ]
    );
}

#[test]
fn attribute_values_keep_their_quotes() {
    let root = parse("a.button(href=\"#\", class='x y' data-id=item.id disabled) Go");
    let a = &root.children()[0];
    assert_eq!(
        a.attributes(),
        &[
            Attribute::class_shorthand("button"),
            Attribute::new("href", Some("\"#\"".to_string())),
            Attribute::new("class", Some("'x y'".to_string())),
            Attribute::new("data-id", Some("item.id".to_string())),
            Attribute::new("disabled", None),
        ]
    );
    assert_eq!(a.children()[0].kind, NodeKind::Text("Go".to_string()));
}

#[test]
fn attributes_may_span_lines() {
    let source = "a(\n  href=\"/\"\n  class=\"nav__link\"\n) Home\nspan.after";
    let root = parse(source);
    assert_eq!(root.children().len(), 2);
    assert_eq!(class_values(&root), vec!["\"nav__link\"", "'after'"]);
}

#[test]
fn nesting_follows_indentation() {
    let source = "ul.list\n  li.list__item\n    a.link\n  li.list__item\nfooter.foot";
    let root = parse(source);
    assert_eq!(root.children().len(), 2);

    let ul = &root.children()[0];
    assert_eq!(ul.children().len(), 2);
    assert_eq!(tag(&ul.children()[0].children()[0]), "a");
    assert_eq!(
        class_values(&root),
        vec!["'list'", "'list__item'", "'link'", "'list__item'", "'foot'"]
    );
}

#[test]
fn tabs_are_accepted_for_indentation() {
    let root = parse("div.a\n\tdiv.b\n\t\tdiv.c");
    assert_eq!(class_values(&root), vec!["'a'", "'b'", "'c'"]);
}

#[test]
fn block_expansion_nests_the_element() {
    let root = parse("li.item: a.item__link(href=\"#\") Text");
    let li = &root.children()[0];
    assert_eq!(li.children().len(), 1);
    assert_eq!(tag(&li.children()[0]), "a");
    assert_eq!(class_values(&root), vec!["'item'", "'item__link'"]);
}

#[test]
fn mixin_calls_carry_attributes_and_children() {
    let root = parse("+card('Title')(class=\"card--wide\")\n  p.card__text");
    let call = &root.children()[0];
    assert_eq!(
        call.kind,
        NodeKind::MixinCall {
            name: "card".to_string(),
            args: Some("'Title'".to_string()),
        }
    );
    assert_eq!(class_values(&root), vec!["\"card--wide\"", "'card__text'"]);
}

#[test]
fn mixin_definitions_keep_their_body() {
    let root = parse("mixin card(title)\n  .card\n    h2.card__title= title");
    match &root.children()[0].kind {
        NodeKind::MixinDefinition { name, args } => {
            assert_eq!(name, "card");
            assert_eq!(args.as_deref(), Some("title"));
        }
        other => panic!("expected a mixin definition, got {:?}", other),
    }
    assert_eq!(class_values(&root), vec!["'card'", "'card__title'"]);
}

// ---------------------------------------------------------------------------
// Control flow
// ---------------------------------------------------------------------------

#[test]
fn conditional_branches_are_children() {
    let source = "if user\n  .profile\nelse if guest\n  .guest\nelse\n  .login";
    let root = parse(source);
    assert_eq!(root.children().len(), 1);

    let conditional = &root.children()[0];
    assert_eq!(conditional.kind, NodeKind::Conditional);
    let keywords: Vec<_> = conditional
        .children()
        .iter()
        .map(|branch| match &branch.kind {
            NodeKind::Branch { keyword, .. } => *keyword,
            other => panic!("expected a branch, got {:?}", other),
        })
        .collect();
    assert_eq!(
        keywords,
        vec![BranchKeyword::If, BranchKeyword::ElseIf, BranchKeyword::Else]
    );
    assert_eq!(class_values(&root), vec!["'profile'", "'guest'", "'login'"]);
}

#[test]
fn unless_starts_a_conditional() {
    let root = parse("unless done\n  .todo");
    assert_eq!(root.children()[0].kind, NodeKind::Conditional);
    assert_eq!(class_values(&root), vec!["'todo'"]);
}

#[test]
fn case_branches_are_children() {
    let source = "case kind\n  when 'a'\n    .alpha\n  when 'b': .beta\n  default\n    .other";
    let root = parse(source);
    let case = &root.children()[0];
    assert_eq!(case.kind, NodeKind::Case("kind".to_string()));
    assert_eq!(case.children().len(), 3);
    assert_eq!(class_values(&root), vec!["'alpha'", "'beta'", "'other'"]);
}

#[test]
fn each_with_else_fallback() {
    let source = "each item in items\n  li.item\nelse\n  li.empty";
    let root = parse(source);
    let each = &root.children()[0];
    assert_eq!(each.kind, NodeKind::Each("item in items".to_string()));
    assert_eq!(class_values(&root), vec!["'item'", "'empty'"]);
}

#[test]
fn for_is_an_each_loop() {
    let root = parse("for x in xs\n  .x");
    assert!(matches!(root.children()[0].kind, NodeKind::Each(_)));
}

#[test]
fn named_blocks_and_unbuffered_code_own_children() {
    let source = "extends layout\nblock append content\n  .page\n- if (true)\n  .code-child";
    let root = parse(source);
    assert_eq!(root.children()[0].kind, NodeKind::Extends("layout".to_string()));
    assert_eq!(
        root.children()[1].kind,
        NodeKind::NamedBlock {
            mode: pug::node::BlockMode::Append,
            name: "content".to_string(),
        }
    );
    assert_eq!(class_values(&root), vec!["'page'", "'code-child'"]);
}

// ---------------------------------------------------------------------------
// Raw content
// ---------------------------------------------------------------------------

#[test]
fn comments_swallow_nested_lines() {
    let source = "//- .hidden\n  .also-hidden\n// visible comment\n.shown";
    let root = parse(source);
    assert_eq!(root.children().len(), 3);
    assert_eq!(class_values(&root), vec!["'shown'"]);
    assert_eq!(
        root.children()[0].kind,
        NodeKind::Comment {
            buffered: false,
            text: ".hidden\n.also-hidden".to_string(),
        }
    );
}

#[test]
fn text_blocks_are_not_markup() {
    let source = "p.\n  Some .text with\n  #words\n.after";
    let root = parse(source);
    let p = &root.children()[0];
    assert_eq!(
        p.children()[0].kind,
        NodeKind::Text("Some .text with\n#words".to_string())
    );
    assert_eq!(class_values(&root), vec!["'after'"]);
}

#[test]
fn piped_text_and_inline_html() {
    let root = parse("p\n  | plain text\n  <b>bold</b>");
    let p = &root.children()[0];
    assert_eq!(p.children()[0].kind, NodeKind::Text("plain text".to_string()));
    assert_eq!(p.children()[1].kind, NodeKind::Text("<b>bold</b>".to_string()));
}

#[test]
fn tag_interpolation_in_inline_text() {
    let root = parse("p Click #[a.link(href='/') here] now");
    let p = &root.children()[0];
    assert_eq!(p.children().len(), 3);
    assert_eq!(p.children()[0].kind, NodeKind::Text("Click ".to_string()));
    assert_eq!(tag(&p.children()[1]), "a");
    assert_eq!(
        p.children()[1].children()[0].kind,
        NodeKind::Text("here".to_string())
    );
    assert_eq!(p.children()[2].kind, NodeKind::Text(" now".to_string()));
    assert_eq!(class_values(&root), vec!["'link'"]);
}

#[test]
fn tag_interpolation_in_piped_text_and_text_blocks() {
    let root = parse("p\n  | see #[span.note this]\ndiv.\n  a #[em.mark b] c\n  #[strong.last]");
    assert_eq!(class_values(&root), vec!["'note'", "'mark'", "'last'"]);

    let div = &root.children()[1];
    assert_eq!(div.children()[0].kind, NodeKind::Text("a ".to_string()));
    assert_eq!(tag(&div.children()[1]), "em");
    assert_eq!(div.children()[2].kind, NodeKind::Text(" c\n".to_string()));
    assert_eq!(tag(&div.children()[3]), "strong");
}

#[test]
fn nested_tag_interpolation() {
    let root = parse("p #[span.outer a #[b.inner c]] d");
    assert_eq!(class_values(&root), vec!["'outer'", "'inner'"]);
}

#[test]
fn escaped_tag_interpolation_stays_text() {
    let root = parse("p \\#[b.not-a-tag]");
    assert!(class_values(&root).is_empty());
}

#[test]
fn filters_keep_their_body_as_text() {
    let root = parse(":markdown-it(linkify)\n  # Title\n  .not-a-class\n.after");
    assert_eq!(root.children().len(), 2);
    assert_eq!(
        root.children()[0].kind,
        NodeKind::Filter {
            name: "markdown-it".to_string(),
            text: "# Title\n.not-a-class".to_string(),
        }
    );
    assert_eq!(class_values(&root), vec!["'after'"]);
}

#[test]
fn nested_filters_and_inline_filter_text() {
    let root = parse("div\n  :cdata:uglify-js var x = 1\n  span.s");
    let div = &root.children()[0];
    assert_eq!(
        div.children()[0].kind,
        NodeKind::Filter {
            name: "cdata:uglify-js".to_string(),
            text: "var x = 1".to_string(),
        }
    );
    assert_eq!(class_values(&root), vec!["'s'"]);
}

#[test]
fn interpolated_tag_names() {
    let root = parse("#{level}.heading Title\n  #{ inner }(class='x')");
    let heading = &root.children()[0];
    assert_eq!(heading.kind, NodeKind::InterpolatedTag("level".to_string()));
    assert_eq!(heading.children()[0].kind, NodeKind::Text("Title".to_string()));
    assert_eq!(
        heading.children()[1].kind,
        NodeKind::InterpolatedTag("inner".to_string())
    );
    assert_eq!(class_values(&root), vec!["'heading'", "'x'"]);
}

#[test]
fn blank_lines_are_ignored() {
    let root = parse("\n.a\n\n\n  .b\n\n.c\n");
    assert_eq!(root.children().len(), 2);
    assert_eq!(class_values(&root), vec!["'a'", "'b'", "'c'"]);
}

#[test]
fn empty_template() {
    let root = parse("");
    assert_eq!(root.kind, NodeKind::Document);
    assert!(root.children().is_empty());
}

// ---------------------------------------------------------------------------
// Lexer errors
// ---------------------------------------------------------------------------

#[test]
fn mixed_indentation_is_rejected() {
    assert_eq!(
        lex_message("div\n  p\n\tspan"),
        "Invalid indentation, you can use tabs or spaces but not both"
    );
}

#[test]
fn inconsistent_outdent_is_rejected() {
    assert_eq!(
        lex_message("div\n    p\n  span"),
        "Inconsistent indentation. Expecting either 0 or 4 spaces/tabs."
    );
}

#[test]
fn unterminated_string() {
    assert_eq!(
        lex_message("a(href=\"x"),
        "unterminated string in attribute value"
    );
}

#[test]
fn unclosed_attribute_list() {
    assert_eq!(
        lex_message("a(href=\"x\"\np.next"),
        "End of file was reached with no closing bracket for `(`."
    );
}

#[test]
fn unclosed_tag_interpolation() {
    assert_eq!(
        lex_message("p see #[a.link here"),
        "End of line was reached with no closing bracket for `#[`."
    );
}

#[test]
fn unclosed_interpolated_tag_name() {
    assert_eq!(
        lex_message("#{tag.w"),
        "End of file was reached with no closing bracket for `{`."
    );
}

#[test]
fn class_names_need_a_letter() {
    assert_eq!(
        lex_message(".123"),
        "Class names must contain at least one letter or underscore."
    );
}

#[test]
fn lexer_error_span_points_at_the_problem() {
    let source = "div\n  .ok\n  .42";
    let error = parse_err(source);
    assert_eq!(&source[error.span()], ".42");
}

// ---------------------------------------------------------------------------
// Parser errors
// ---------------------------------------------------------------------------

#[test]
fn leading_indentation_is_rejected() {
    assert_eq!(
        parse_message("  div"),
        "unexpected indentation at the start of the template"
    );
}

#[test]
fn else_without_if() {
    assert_eq!(
        parse_message("else\n  p.x"),
        "`else` must follow an `if`, `unless` or `each` block"
    );
}

#[test]
fn else_after_final_else() {
    assert_eq!(
        parse_message("if a\n  .a\nelse\n  .b\nelse\n  .c"),
        "unexpected `else` after the final `else` branch"
    );
}

#[test]
fn when_outside_case() {
    assert_eq!(
        parse_message("when 1\n  p"),
        "`when` is only allowed inside `case`"
    );
}

#[test]
fn expansion_without_element() {
    assert_eq!(parse_message("li:"), "expected an element after `:`");
}

#[test]
fn text_cannot_have_children() {
    assert_eq!(
        parse_message("| hello\n  p"),
        "text cannot have nested content"
    );
}

#[test]
fn empty_tag_interpolation() {
    assert_eq!(
        parse_message("p a #[] b"),
        "expected an element inside `#[...]`"
    );
}

#[test]
fn if_requires_an_expression() {
    assert_eq!(parse_message("if\n  p"), "`if` requires an expression");
}

#[test]
fn errors_render_as_diagnostics() {
    let diagnostic = parse_err("a(href=\"x").to_diagnostic();
    assert_eq!(
        diagnostic.message,
        "Pug lexer error: unterminated string in attribute value"
    );
    assert_eq!(diagnostic.labels.len(), 1);
}

use ecsstractor::{ClassTokenSet, CommentStyle, FormatConfig, classify, render, render_flat};
use pretty_assertions::assert_eq;

const BUTTON: &[&str] = &["btn", "btn--primary", "btn__icon", "btn__icon--large", "btn__text"];

fn tokens(names: &[&str]) -> ClassTokenSet {
    names.iter().collect()
}

fn bem(names: &[&str], config: &FormatConfig) -> String {
    let hierarchy = classify(
        &tokens(names),
        &config.element_separator,
        &config.modifier_separator,
    );
    render(&hierarchy, config)
}

fn braces_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}

// ---------------------------------------------------------------------------
// Nested BEM
// ---------------------------------------------------------------------------

#[test]
fn default_brackets_inline() {
    let text = bem(BUTTON, &FormatConfig::default());
    assert_eq!(
        text,
        "\
.btn {
  &--primary {}
  &__icon {
    &--large {}
  }
  &__text {}
}
"
    );
    assert!(braces_balanced(&text));
}

#[test]
fn element_modifier_selectors_are_present() {
    let text = bem(&["btn__icon--large"], &FormatConfig::default());
    assert!(text.contains(".btn {"));
    assert!(text.contains("&__icon {"));
    assert!(text.contains("&--large {}"));
    assert!(braces_balanced(&text));
}

#[test]
fn brackets_newline_after() {
    let config = FormatConfig {
        brackets_newline_after: true,
        ..FormatConfig::default()
    };
    let text = bem(BUTTON, &config);
    assert_eq!(
        text,
        "\
.btn {
  &--primary {
  }
  &__icon {
    &--large {
    }
  }
  &__text {
  }
}
"
    );
    assert!(braces_balanced(&text));
}

#[test]
fn block_comments() {
    let config = FormatConfig {
        add_comments: true,
        ..FormatConfig::default()
    };
    assert_eq!(
        bem(BUTTON, &config),
        "\
.btn {
  /* .btn--primary */
  &--primary {}
  /* .btn__icon */
  &__icon {
    /* .btn__icon--large */
    &--large {}
  }
  /* .btn__text */
  &__text {}
}
"
    );
}

#[test]
fn line_comments() {
    let config = FormatConfig {
        add_comments: true,
        comment_style: CommentStyle::Line,
        ..FormatConfig::default()
    };
    assert_eq!(
        bem(&["menu", "menu__item", "menu__item--active"], &config),
        "\
.menu {
  // .menu__item
  &__item {
    // .menu__item--active
    &--active {}
  }
}
"
    );
}

#[test]
fn empty_line_before_nested_selectors() {
    let config = FormatConfig {
        empty_line_before_nested_selector: true,
        ..FormatConfig::default()
    };
    assert_eq!(
        bem(&["btn--primary", "btn__icon--large"], &config),
        "\
.btn {

  &--primary {}

  &__icon {

    &--large {}
  }
}
"
    );
}

#[test]
fn empty_line_with_comments() {
    let config = FormatConfig {
        empty_line_before_nested_selector: true,
        add_comments: true,
        ..FormatConfig::default()
    };
    assert_eq!(
        bem(&["card__body"], &config),
        "\
.card {

  /* .card__body */

  &__body {}
}
"
    );
}

#[test]
fn without_brackets() {
    let config = FormatConfig {
        brackets: false,
        ..FormatConfig::default()
    };
    assert_eq!(
        bem(BUTTON, &config),
        "\
.btn
  &--primary

  &__icon

    &--large

  &__text

"
    );
}

#[test]
fn without_brackets_blank_runs_are_capped() {
    let config = FormatConfig {
        brackets: false,
        ..FormatConfig::default()
    };
    let text = bem(&["a__x--m", "b__y--n"], &config);
    assert!(!text.contains("\n\n\n"));
    assert_eq!(
        text,
        "\
.a
  &__x

    &--m

.b
  &__y

    &--n

"
    );
}

#[test]
fn without_brackets_with_comments_and_empty_lines() {
    let config = FormatConfig {
        brackets: false,
        add_comments: true,
        empty_line_before_nested_selector: true,
        ..FormatConfig::default()
    };
    assert_eq!(
        bem(&["b--m", "b__e--x"], &config),
        "\
.b
  /* .b--m */
  &--m

  /* .b__e */

  &__e

    /* .b__e--x */

    &--x

"
    );
}

#[test]
fn without_brackets_empty_lines_only() {
    let config = FormatConfig {
        brackets: false,
        empty_line_before_nested_selector: true,
        ..FormatConfig::default()
    };
    assert_eq!(
        bem(&["b--m", "b__e--x"], &config),
        "\
.b
  &--m

  &__e

    &--x

"
    );
}

#[test]
fn custom_symbols_and_indentation() {
    let config = FormatConfig {
        indent_unit: "\t".to_string(),
        element_separator: "-".to_string(),
        modifier_separator: "_".to_string(),
        parent_symbol: "$".to_string(),
        ..FormatConfig::default()
    };
    assert_eq!(
        bem(&["card-title_big"], &config),
        ".card {\n\t$-title {\n\t\t$_big {}\n\t}\n}\n"
    );
}

#[test]
fn several_blocks_in_order() {
    assert_eq!(
        bem(&["nav", "card", "nav__item"], &FormatConfig::default()),
        ".nav {\n  &__item {}\n}\n.card {\n}\n"
    );
}

#[test]
fn empty_hierarchy_renders_nothing() {
    assert_eq!(bem(&[], &FormatConfig::default()), "");
}

// ---------------------------------------------------------------------------
// Flat
// ---------------------------------------------------------------------------

fn flat_config(brackets: bool, newline_after: bool) -> FormatConfig {
    FormatConfig {
        bem_nesting: false,
        brackets,
        brackets_newline_after: newline_after,
        ..FormatConfig::default()
    }
}

#[test]
fn flat_without_brackets() {
    assert_eq!(render_flat(&tokens(&["a", "b"]), &flat_config(false, false)), ".a \n.b ");
}

#[test]
fn flat_with_brackets() {
    assert_eq!(
        render_flat(&tokens(&["a", "b__c"]), &flat_config(true, false)),
        ".a {}\n.b__c {}"
    );
    assert_eq!(
        render_flat(&tokens(&["a", "b__c"]), &flat_config(true, true)),
        ".a {\n}\n.b__c {\n}"
    );
}

#[test]
fn flat_without_brackets_newline_after() {
    assert_eq!(
        render_flat(&tokens(&["a", "b"]), &flat_config(false, true)),
        ".a \n\n.b \n"
    );
}

#[test]
fn flat_ignores_bem_structure() {
    assert_eq!(
        render_flat(&tokens(&["x--m", "x__e", "x"]), &flat_config(false, false)),
        ".x--m \n.x__e \n.x "
    );
}

#[test]
fn flat_empty() {
    assert_eq!(render_flat(&ClassTokenSet::default(), &flat_config(true, false)), "");
}

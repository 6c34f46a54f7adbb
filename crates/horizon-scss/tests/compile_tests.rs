//! End-to-end tests for the stylesheet compiler.

use horizon_scss::prelude::*;

fn rule(selectors: &[&str], properties: &[(&str, &str)]) -> Definition {
    Definition::Rule {
        selectors: selectors.iter().map(|s| s.to_string()).collect(),
        properties: properties
            .iter()
            .map(|(name, value)| Property::new(*name, *value))
            .collect(),
    }
}

/// Compile `lines` joined without separators, asserting no errors were logged.
fn definitions(lines: &[&str]) -> Vec<Definition> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let logger = CollectingLogger::new();
    let mut compiler = Compiler::default().with_logger(logger.clone());
    compiler.process(&lines.join(""), None).unwrap();
    assert!(logger.messages(LogLevel::Error).is_empty());
    compiler.definitions().to_vec()
}

#[test]
fn test_variables_and_color_functions() {
    let result = definitions(&[
        "$blue: #3bbfce;",
        "$margin: 16px;",
        ".content-navigation {",
        "  border-color: $blue;",
        "  color:",
        "    darken($blue, 9%);",
        "}",
        ".border {",
        "  padding: ceil($margin / 2);",
        "  margin: ceil($margin / 2);",
        "  border-color: $blue;",
        "}",
    ]);

    assert_eq!(
        result,
        vec![
            rule(
                &[".content-navigation"],
                &[("border-color", "#3bbfce"), ("color", "#24a8b7")]
            ),
            rule(
                &[".border"],
                &[
                    ("padding", "8px"),
                    ("margin", "8px"),
                    ("border-color", "#3bbfce")
                ]
            ),
        ]
    );
}

#[test]
fn test_nesting_and_nested_properties() {
    let result = definitions(&[
        "table.hl {",
        "  margin: 2em 0;",
        "  td.ln {",
        "    text-align: right;",
        "  }",
        "}",
        "li {",
        "  font: {",
        "    family: serif;",
        "    weight: bold;",
        "    size: 1.2em;",
        "  }",
        "}",
    ]);

    assert_eq!(
        result,
        vec![
            rule(&["table.hl"], &[("margin", "2em 0")]),
            rule(&["table.hl td.ln"], &[("text-align", "right")]),
            rule(
                &["li"],
                &[
                    ("font-family", "serif"),
                    ("font-weight", "bold"),
                    ("font-size", "1.2em")
                ]
            ),
        ]
    );
}

#[test]
fn test_mixins() {
    let result = definitions(&[
        "@mixin table-base {",
        "  th {",
        "    text-align: center;",
        "    font-weight: bold;",
        "  }",
        "  td, th {padding: 2px;}",
        "}",
        "@mixin left($dist) {",
        "  float: left;",
        "  margin-left: $dist;",
        "}",
        "#data {",
        "  @include left(10px);",
        "  @include table-base;",
        "}",
    ]);

    assert_eq!(
        result,
        vec![
            rule(&["#data"], &[("float", "left"), ("margin-left", "10px")]),
            rule(
                &["#data th"],
                &[("text-align", "center"), ("font-weight", "bold")]
            ),
            rule(&["#data td", "#data th"], &[("padding", "2px")]),
        ]
    );
}

#[test]
fn test_if_with_pixel_variable() {
    let result = definitions(&[
        "$margin: 8px;",
        ".selector {",
        "  @if $margin {",
        "    margin: $margin;",
        "  }",
        "  padding: 10px;",
        "}",
    ]);
    assert_eq!(
        result,
        vec![rule(
            &[".selector"],
            &[("margin", "8px"), ("padding", "10px")]
        )]
    );
}

#[test]
fn test_else_if_and_else() {
    let chain = |margin: &str, padding: &str| {
        definitions(&[
            &format!("$margin: {};", margin),
            &format!("$padding: {};", padding),
            ".selector {",
            "  @if $margin {",
            "    margin: $margin;",
            "  }",
            "  @else if $padding {",
            "    padding: $padding;",
            "  }",
            "  @else {",
            "    left: 10px;",
            "  }",
            "}",
        ])
    };

    assert_eq!(
        chain("false", "10px"),
        vec![rule(&[".selector"], &[("padding", "10px")])]
    );
    assert_eq!(
        chain("false", "false"),
        vec![rule(&[".selector"], &[("left", "10px")])]
    );
    assert_eq!(
        chain("1px", "10px"),
        vec![rule(&[".selector"], &[("margin", "1px")])]
    );
}

#[test]
fn test_default_assignment_inside_mixin() {
    let result = definitions(&[
        "@mixin color($color) {",
        "  $def: white !default;",
        "  @if $color {",
        "    $def: $color;",
        "  }",
        "  color: $def;",
        "}",
        ".black {",
        "  @include color(black);",
        "}",
        ".white {",
        "  @include color(false);",
        "}",
    ]);

    assert_eq!(
        result,
        vec![
            rule(&[".black"], &[("color", "black")]),
            rule(&[".white"], &[("color", "white")]),
        ]
    );
}

#[test]
fn test_default_does_not_override_plain_assignment() {
    let result = definitions(&["$x: 1;", "$x: 2 !default;", ".a { v: $x; }"]);
    assert_eq!(result, vec![rule(&[".a"], &[("v", "1")])]);

    let result = definitions(&["$x: 1 !default;", "$x: 2 !default;", ".a { v: $x; }"]);
    assert_eq!(result, vec![rule(&[".a"], &[("v", "2")])]);
}

#[test]
fn test_selectors_with_plus() {
    let result = definitions(&["h1 + h2{", "  color: red;", "}"]);
    assert_eq!(result, vec![rule(&["h1 + h2"], &[("color", "red")])]);
}

#[test]
fn test_division_outside_functions_is_kept() {
    let result = definitions(&[
        "$margin: 16px;",
        ".border {",
        "  padding: $margin / 2;",
        "}",
    ]);
    assert_eq!(result, vec![rule(&[".border"], &[("padding", "16px / 2")])]);
}

#[test]
fn test_parent_reference() {
    let result = definitions(&[".a { &:hover { x: 1; } .b & { y: 2; } }"]);
    assert_eq!(
        result,
        vec![
            rule(&[".a:hover"], &[("x", "1")]),
            rule(&[".b .a"], &[("y", "2")]),
        ]
    );

    let mut compiler = Compiler::default();
    let err = compiler.process(".a { & & { x: 1; } }", None).unwrap_err();
    assert!(matches!(err.root(), Error::InvalidAmpersandUsage { .. }));
}

#[test]
fn test_adjacent_rules_merge() {
    let result = definitions(&[".a { x: 1; }", ".a { y: 2; }", ".b { z: 3; }", ".a { w: 4; }"]);
    assert_eq!(
        result,
        vec![
            rule(&[".a"], &[("x", "1"), ("y", "2")]),
            rule(&[".b"], &[("z", "3")]),
            rule(&[".a"], &[("w", "4")]),
        ]
    );
}

#[test]
fn test_mixin_expansion_is_repeatable() {
    let result = definitions(&[
        "@mixin box($p) { padding: $p; border: 1px solid; }",
        ".a { @include box(2px); }",
        ".b { @include box(2px); }",
    ]);
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].properties(), result[1].properties());
}

#[test]
fn test_color_round_trip() {
    let result = definitions(&[".a { color: darken(lighten(#3bbfce, 10%), 10%); }"]);
    let value = &result[0].properties()[0].value;
    let color = Color::parse(value).unwrap();
    let original = Color::parse("#3bbfce").unwrap();
    assert!((color.red() - original.red()).abs() <= 1.0);
    assert!((color.green() - original.green()).abs() <= 1.0);
    assert!((color.blue() - original.blue()).abs() <= 1.0);
}

#[test]
fn test_comments_and_urls() {
    let result = definitions(&[
        "/* header */\n",
        ".a { // trailing\n",
        "  background: url(http://example.com/a.png) no-repeat;\n",
        "  content: '// not a comment';\n",
        "}\n",
    ]);
    assert_eq!(
        result,
        vec![rule(
            &[".a"],
            &[
                ("background", "url(http://example.com/a.png) no-repeat"),
                ("content", "'// not a comment'")
            ]
        )]
    );
}

#[test]
fn test_quoted_variable_values_are_unquoted() {
    let result = definitions(&["$font: \"Helvetica Neue\";", ".a { font-family: $font; }"]);
    assert_eq!(
        result,
        vec![rule(&[".a"], &[("font-family", "Helvetica Neue")])]
    );
}

#[test]
fn test_undefined_variable_has_location() {
    let logger = CollectingLogger::new();
    let mut compiler = Compiler::default().with_logger(logger.clone());
    let err = compiler
        .process(".a {\n  x: $missing;\n}", Some("style.scss"))
        .unwrap_err();

    assert!(matches!(err.root(), Error::UndefinedVariable { name } if name == "missing"));
    let location = err.location().unwrap();
    assert_eq!(location.file.as_deref(), Some("style.scss"));
    assert_eq!(location.line, 2);
    assert_eq!(logger.messages(LogLevel::Error).len(), 1);
}

#[test]
fn test_imports_through_loader() {
    let loader = MemoryLoader::new()
        .with_file("_vars.scss", "$gap: 4px;\n@mixin pad { padding: $gap; }")
        .with_file("theme/base.scss", "body { margin: 0; }");
    let mut compiler = Compiler::default().with_loader(loader);
    compiler
        .process(
            "@import 'vars';\n@import \"theme/base\";\n.a { @include pad; }",
            Some("app.scss"),
        )
        .unwrap();

    assert_eq!(
        compiler.render(),
        "body {\n\tmargin: 0;\n}\n.a {\n\tpadding: 4px;\n}\n"
    );
}

#[test]
fn test_missing_import_fails() {
    let mut compiler = Compiler::default().with_loader(MemoryLoader::new());
    let err = compiler.process("@import 'gone';", None).unwrap_err();
    assert!(matches!(err.root(), Error::ImportNotFound { path } if path == "gone"));
}

#[test]
fn test_debug_selectors() {
    let source = "#debug .a { x: 1; } .b { y: 2; } #debug, .c { z: 3; }";

    let mut compiler = Compiler::default();
    compiler.process(source, None).unwrap();
    assert_eq!(
        compiler.render(),
        ".b {\n\ty: 2;\n}\n.c {\n\tz: 3;\n}\n"
    );

    let mut compiler = Compiler::new(CompilerConfig::new().keep_debug_style(true));
    compiler.process(source, None).unwrap();
    assert_eq!(
        compiler.render(),
        ".a {\n\tx: 1;\n}\n.b {\n\ty: 2;\n}\n.c {\n\tz: 3;\n}\n"
    );
}

#[test]
fn test_debug_comments() {
    let loader = MemoryLoader::new().with_file("m.scss", "@mixin m($a) { w: $a; }");
    let config = CompilerConfig::new().debug_comments(true);
    let mut compiler = Compiler::new(config).with_loader(loader);
    compiler
        .process("@import 'm';\n.a { @include m(2px); }", Some("main.scss"))
        .unwrap();

    assert_eq!(
        compiler.render(),
        "/* source: main.scss */\n\
         /* import: m */\n\
         /* include mixin: m args: 2px */\n\
         .a {\n\tw: 2px;\n}\n"
    );
}

#[test]
fn test_unknown_function_policies() {
    let source = ".a { x: frob(1, $v); }";

    let mut keep = Compiler::default();
    keep.process(&format!("$v: 2;{}", source), None).unwrap();
    assert_eq!(keep.render(), ".a {\n\tx: frob(1, 2);\n}\n");

    let config = CompilerConfig::new()
        .keep_unknown_function(false)
        .unknown_function_warning(false);
    let logger = CollectingLogger::new();
    let mut drop = Compiler::new(config).with_logger(logger.clone());
    drop.process(&format!("$v: 2;{}", source), None).unwrap();
    assert_eq!(drop.render(), ".a {\n\tx: 1, 2;\n}\n");
    assert!(logger.warnings().is_empty());

    let mut strict = Compiler::new(CompilerConfig::new().unknown_function_error(true));
    let err = strict.process(&format!("$v: 2;{}", source), None).unwrap_err();
    assert!(matches!(err.root(), Error::UnknownFunction { name } if name == "frob"));
}

#[test]
fn test_unknown_function_error_policy_fails_compile() {
    let logger = CollectingLogger::new();
    let config = CompilerConfig::new().unknown_function_error(true);
    let mut compiler = Compiler::new(config).with_logger(logger.clone());
    let err = compiler
        .process(".a {\n  x: 1px;\n  y: frob(2px);\n}", Some("app.scss"))
        .unwrap_err();

    assert!(matches!(err.root(), Error::UnknownFunction { name } if name == "frob"));
    assert!(err.is_fatal());
    assert_eq!(err.location().unwrap().line, 3);
    assert_eq!(logger.messages(LogLevel::Error).len(), 1);

    // Known functions are unaffected by the policy.
    compiler.reset();
    compiler.process(".b { x: ceil(1.5px); }", None).unwrap();
    assert_eq!(compiler.render(), ".b {\n\tx: 2px;\n}\n");
}

#[test]
fn test_invalid_color_in_color_function() {
    let err = compile(".a { color: darken(nocolor, 5%); }").unwrap_err();
    assert!(matches!(err.root(), Error::InvalidColor { value } if value == "nocolor"));

    let err = compile("$c: #12; .a { color: mix($c, #fff, 50%); }").unwrap_err();
    assert!(matches!(err.root(), Error::InvalidColor { value } if value == "#12"));

    let logger = CollectingLogger::new();
    let mut compiler = Compiler::default().with_logger(logger.clone());
    let err = compiler
        .process(".a {\n  color: transparentize(nocolor, 0.5);\n}", Some("app.scss"))
        .unwrap_err();
    assert!(matches!(err.root(), Error::InvalidColor { .. }));
    assert_eq!(err.location().unwrap().line, 2);
    assert_eq!(logger.messages(LogLevel::Error).len(), 1);
}

#[test]
fn test_native_functions_pass_through() {
    let result = definitions(&[
        ".a {",
        "  background: linear-gradient(to right, rgba(0,0,0,0.5), #fff);",
        "  width: calc(100% - 10px);",
        "}",
    ]);
    assert_eq!(
        result,
        vec![rule(
            &[".a"],
            &[
                ("background", "linear-gradient(to right, rgba(0,0,0,0.5), #fff)"),
                ("width", "calc(100% - 10px)")
            ]
        )]
    );
}

#[test]
fn test_custom_functions() {
    let config = CompilerConfig::new().function("double", |args: &[String]| -> Result<String> {
        let n: f64 = args[0].trim_end_matches("px").parse().map_err(|_| {
            Error::InvalidArguments {
                function: "double".into(),
                message: "number expected".into(),
            }
        })?;
        Ok(format!("{}px", n * 2.0))
    });
    let mut compiler = Compiler::new(config);
    compiler
        .process("$w: 4px; .a { width: double($w); }", None)
        .unwrap();
    assert_eq!(compiler.render(), ".a {\n\twidth: 8px;\n}\n");
}

#[test]
fn test_diagnostics() {
    let logger = CollectingLogger::new();
    let mut compiler = Compiler::default().with_logger(logger.clone());
    compiler
        .process(
            "$used: 1; $spare: 2; @mixin once { a: $used; } @mixin never { b: 1; }",
            Some("lib.scss"),
        )
        .unwrap();
    compiler
        .process(".x { @include once; }", Some("app.scss"))
        .unwrap();

    let found = compiler.run_diagnostics();
    assert_eq!(
        found,
        vec![
            Diagnostic::UnderusedMixin {
                name: "once".into(),
                used: 1
            },
            Diagnostic::UnderusedMixin {
                name: "never".into(),
                used: 0
            },
            Diagnostic::UnusedVariable {
                name: "spare".into()
            },
        ]
    );
    assert_eq!(
        logger.warnings(),
        vec![
            "Usage count of mixin: once is only: 1".to_string(),
            "Usage count of mixin: never is only: 0".to_string(),
            "Unused variable: spare".to_string(),
        ]
    );
}

#[test]
fn test_compile_helper() {
    assert_eq!(
        compile("$c: #ff0000; .a { color: $c; }").unwrap(),
        ".a {\n\tcolor: #ff0000;\n}\n"
    );
    assert!(matches!(
        compile(".a { x: 1; }}").unwrap_err().root(),
        Error::UnbalancedBlock
    ));
}

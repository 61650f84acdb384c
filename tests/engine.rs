//! Engine behaviour across rules: traversal, dispatch, suppression and fixing

use pretty_assertions::assert_eq;
use rxlint::rule::{Listeners, RuleCategory, RuleContext, RuleDef, RuleMeta, RuleStability};
use rxlint::rules::just::Just;
use rxlint::rules::no_internal::NoInternal;
use rxlint::rules::Configurable;
use rxlint::tree::synth::*;
use rxlint::tree::{estree, Node};
use rxlint::{
    apply_fixes, Config, ConfigError, LintError, Linter, Report, Severity, SourceFile, Type,
};
use serde_json::{json, Value as Json};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const RECORDER_META: &RuleMeta = &RuleMeta {
    name: "recorder",
    description: "Reports every node its selector matches",
    category: RuleCategory::Pedantic,
    stability: RuleStability::Preview,
    requires_type_checking: false,
    fixable: false,
    has_suggestions: false,
    messages: &[("match", "{{text}}"), ("trace", "{{trace}}")],
    options: &[],
    replaced_by: None,
};

/// Reports the text of every node matching one selector
struct Recorder {
    listeners: Listeners<Self>,
}

impl Recorder {
    fn new(selector: &str) -> Self {
        Self {
            listeners: Listeners::new().on(selector, Self::record).unwrap(),
        }
    }

    fn record(&self, _: &mut (), node: Node<'_>, cx: &mut RuleContext<'_>) {
        cx.report(Report::new("match", node).with_data("text", node.text()));
    }
}

impl RuleDef for Recorder {
    type State = ();
    const META: &'static RuleMeta = RECORDER_META;

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}

/// Logs enter and exit visits, reporting the log once the root is left
struct Tracer {
    listeners: Listeners<Self>,
}

impl Tracer {
    fn new() -> Self {
        let listeners = Listeners::new()
            .on("*", Self::enter)
            .and_then(|l| l.on("*:exit", Self::exit))
            .unwrap();
        Self { listeners }
    }

    fn label(node: Node<'_>) -> String {
        match node.name() {
            Some(name) => format!("{}:{}", node.kind(), name),
            None => node.kind().to_string(),
        }
    }

    fn enter(&self, trace: &mut Vec<String>, node: Node<'_>, _: &mut RuleContext<'_>) {
        trace.push(format!("+{}", Self::label(node)));
    }

    fn exit(&self, trace: &mut Vec<String>, node: Node<'_>, cx: &mut RuleContext<'_>) {
        trace.push(format!("-{}", Self::label(node)));
        if node.parent().is_none() {
            cx.report(Report::new("trace", node).with_data("trace", trace.join(" ")));
        }
    }
}

impl RuleDef for Tracer {
    type State = Vec<String>;
    const META: &'static RuleMeta = &RuleMeta {
        name: "tracer",
        ..*RECORDER_META
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}

/// Panics on the first call it sees
struct Exploder {
    listeners: Listeners<Self>,
}

impl Exploder {
    fn boom(&self, _: &mut (), _: Node<'_>, _: &mut RuleContext<'_>) {
        panic!("listener failed");
    }
}

impl RuleDef for Exploder {
    type State = ();
    const META: &'static RuleMeta = &RuleMeta {
        name: "exploder",
        ..*RECORDER_META
    };

    fn listeners(&self) -> &Listeners<Self> {
        &self.listeners
    }
}

/// `source.pipe(map(project), filter(predicate));`
fn pipe_program() -> Js {
    program(vec![expr_stmt(method(
        ident("source"),
        "pipe",
        vec![
            call(ident("map"), vec![ident("project")]),
            call(ident("filter"), vec![ident("predicate")]),
        ],
    ))])
}

fn matched(selector: &str, program: Js) -> Vec<String> {
    init();
    let (tree, _) = program.build().unwrap();
    let result = Linter::new()
        .with_rule(Box::new(Recorder::new(selector)), Severity::Warning)
        .lint_file(&SourceFile::new("test.ts", tree));
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    result.diagnostics.into_iter().map(|d| d.message).collect()
}

#[test]
fn test_every_node_entered_and_left_once() {
    init();
    let (tree, _) = program(vec![expr_stmt(call(ident("f"), vec![ident("a")]))])
        .build()
        .unwrap();
    let result = Linter::new()
        .with_rule(Box::new(Tracer::new()), Severity::Info)
        .lint_file(&SourceFile::new("test.ts", tree));

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].message,
        "+Program +ExpressionStatement +CallExpression +Identifier:f -Identifier:f \
         +Identifier:a -Identifier:a -CallExpression -ExpressionStatement -Program"
    );
    let timing = &result.rule_timings["tracer"];
    assert_eq!(timing.match_count, 10);
}

#[test]
fn test_child_and_position_selectors() {
    let pipe_args = "CallExpression[callee.property.name='pipe'] > CallExpression";
    assert_eq!(
        matched(pipe_args, pipe_program()),
        vec!["map(project)", "filter(predicate)"]
    );
    assert_eq!(
        matched(&format!("{}:first-child", pipe_args), pipe_program()),
        vec!["map(project)"]
    );
    assert_eq!(
        matched(&format!("{}:last-child", pipe_args), pipe_program()),
        vec!["filter(predicate)"]
    );
    assert_eq!(
        matched("CallExpression ~ CallExpression", pipe_program()),
        vec!["filter(predicate)"]
    );
}

#[test]
fn test_attribute_selectors() {
    assert_eq!(
        matched("Identifier[name=/^pr/]", pipe_program()),
        vec!["project", "predicate"]
    );
    // A missing path never equals the value
    assert_eq!(
        matched("CallExpression[callee.property.name!='pipe']", pipe_program()),
        vec!["map(project)", "filter(predicate)"]
    );
    assert_eq!(
        matched("CallExpression[arguments.length > 1]", pipe_program()).len(),
        1
    );
    assert_eq!(
        matched("MemberExpression > Identifier.property", pipe_program()),
        vec!["pipe"]
    );
}

#[test]
fn test_has_and_not_selectors() {
    assert_eq!(
        matched(
            "CallExpression:has(> Identifier[name='predicate'])",
            pipe_program()
        ),
        vec!["filter(predicate)"]
    );
    assert_eq!(
        matched(
            "CallExpression:not([callee.type='MemberExpression'])",
            pipe_program()
        ),
        vec!["map(project)", "filter(predicate)"]
    );
    assert_eq!(
        matched("ExpressionStatement:has(Identifier[name='project'])", pipe_program()).len(),
        1
    );
}

#[test]
fn test_missing_types_skip_typed_rules() {
    init();
    let (tree, _) = program(vec![
        import_decl(vec![import_spec("of")], "rxjs"),
        expr_stmt(method(ident("source"), "subscribe", vec![])),
    ])
    .build()
    .unwrap();
    let config = Config::from_yaml("rules:\n  just: error\n  no-ignored-subscription: error\n")
        .unwrap();
    let linter = Linter::from_config(&config).unwrap();
    let result = linter.lint_file(&SourceFile::new("plain.js", tree));

    assert_eq!(
        result.errors,
        vec![LintError::TypeInformationRequired {
            rule: "no-ignored-subscription".to_string(),
            file: "plain.js".into(),
        }]
    );
    let rules: Vec<&str> = result.diagnostics.iter().map(|d| d.rule_id.as_str()).collect();
    assert_eq!(rules, vec!["just"]);
}

#[test]
fn test_untyped_nodes_are_not_reported() {
    init();
    // Only the first receiver has a type
    let (tree, types) = program(vec![
        expr_stmt(method(
            ident("typed").typed(Type::generic("Observable", vec![Type::primitive("number")])),
            "subscribe",
            vec![],
        )),
        expr_stmt(method(ident("untyped"), "subscribe", vec![])),
    ])
    .build()
    .unwrap();
    let config = Config::from_yaml("rules:\n  no-ignored-subscription: warn\n").unwrap();
    let result = Linter::from_config(&config)
        .unwrap()
        .lint_file(&SourceFile::new("test.ts", tree).with_types(types));

    assert!(result.errors.is_empty());
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].location.line, 1);
    assert_eq!(result.diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_panicking_rule_does_not_stop_others() {
    init();
    let (tree, _) = pipe_program().build().unwrap();
    let exploder = Exploder {
        listeners: Listeners::new()
            .on("CallExpression", Exploder::boom)
            .unwrap(),
    };
    let result = Linter::new()
        .with_rule(Box::new(exploder), Severity::Error)
        .with_rule(Box::new(Recorder::new("CallExpression")), Severity::Error)
        .lint_file(&SourceFile::new("test.ts", tree));

    assert_eq!(result.errors.len(), 1);
    match &result.errors[0] {
        LintError::RulePanicked { rule, message, .. } => {
            assert_eq!(rule, "exploder");
            assert_eq!(message, "listener failed");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(result.diagnostics.len(), 3);
}

fn literal_import(source: &str, specifier: &str) -> Json {
    let quoted = format!("\"{}\"", specifier);
    let start = source.find(&quoted).unwrap();
    let statement = source[..start].rfind("import").unwrap();
    json!({
        "type": "ImportDeclaration",
        "range": [statement, start + quoted.len() + 1],
        "specifiers": [],
        "source": {
            "type": "Literal",
            "range": [start, start + quoted.len()],
            "value": specifier,
            "raw": quoted,
        },
        "importKind": "value",
    })
}

#[test]
fn test_directives_suppress_diagnostics() {
    init();
    let source = "import \"rxjs/internal/Observable\";\n\
                  // rxlint-disable-next-line no-internal -- pending migration\n\
                  import \"rxjs/internal/Subject\";\n\
                  import \"rxjs/internal/Subscription\"; // rxlint-disable-line\n\
                  import \"rxjs/internal/operators/map\";\n";
    let program = json!({
        "type": "Program",
        "range": [0, source.len()],
        "sourceType": "module",
        "body": [
            literal_import(source, "rxjs/internal/Observable"),
            literal_import(source, "rxjs/internal/Subject"),
            literal_import(source, "rxjs/internal/Subscription"),
            literal_import(source, "rxjs/internal/operators/map"),
        ],
    });
    let tree = estree::from_value(&program, source).unwrap();
    let result = Linter::new()
        .with_rule(Box::new(NoInternal::from_options(&Json::Null).unwrap()), Severity::Error)
        .lint_file(&SourceFile::new("imports.ts", tree));

    let lines: Vec<usize> = result.diagnostics.iter().map(|d| d.location.line).collect();
    assert_eq!(lines, vec![1, 5]);
    assert_eq!(result.suppressed, 2);
    assert_eq!(
        apply_fixes(source, &result.diagnostics).output,
        "import \"rxjs\";\n\
         // rxlint-disable-next-line no-internal -- pending migration\n\
         import \"rxjs/internal/Subject\";\n\
         import \"rxjs/internal/Subscription\"; // rxlint-disable-line\n\
         import \"rxjs/operators\";\n"
    );
}

#[test]
fn test_fixes_from_several_rules_settle() {
    init();
    let linter = Linter::new()
        .with_rule(Box::new(Just::from_options(&Json::Null).unwrap()), Severity::Error)
        .with_rule(Box::new(NoInternal::from_options(&Json::Null).unwrap()), Severity::Error);

    let (tree, _) = program(vec![
        import_decl(vec![import_spec("of")], "rxjs"),
        import_decl(vec![import_spec("map")], "rxjs/internal/operators/map"),
        const_decl(ident("a"), method(call(ident("of"), vec![number(1.0)]), "pipe", vec![])),
    ])
    .build()
    .unwrap();
    let source = tree.source().to_string();
    let result = linter.lint_file(&SourceFile::new("test.ts", tree));
    assert_eq!(result.diagnostics.len(), 3);
    let starts: Vec<usize> = result.diagnostics.iter().map(|d| d.location.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);

    let expected = program(vec![
        import_decl(vec![import_spec_as("of", "just")], "rxjs"),
        import_decl(vec![import_spec("map")], "rxjs/operators"),
        const_decl(ident("a"), method(call(ident("just"), vec![number(1.0)]), "pipe", vec![])),
    ]);
    let fixed = apply_fixes(&source, &result.diagnostics);
    assert_eq!(fixed.output, expected.source());
    assert_eq!(fixed.skipped, 0);

    let (tree, _) = expected.build().unwrap();
    assert!(linter
        .lint_file(&SourceFile::new("test.ts", tree))
        .diagnostics
        .is_empty());
}

#[test]
fn test_config_errors_fail_fast() {
    init();
    let unknown = Config::from_yaml("rules:\n  no-such-rule: error\n").unwrap();
    assert!(matches!(
        Linter::from_config(&unknown),
        Err(ConfigError::UnknownRule(name)) if name == "no-such-rule"
    ));

    let bad_regex = Config::from_yaml("rules:\n  ban-observables: [error, { \"(\": true }]\n").unwrap();
    assert!(matches!(
        Linter::from_config(&bad_regex),
        Err(ConfigError::InvalidRegex { rule, .. }) if rule == "ban-observables"
    ));

    let bad_option = Config::from_yaml("rules:\n  no-sharereplay: [error, { allowConfig: 3 }]\n").unwrap();
    assert!(matches!(
        Linter::from_config(&bad_option),
        Err(ConfigError::InvalidOptions { rule, .. }) if rule == "no-sharereplay"
    ));

    let bad_level = Config::from_yaml("rules:\n  just: loud\n").unwrap();
    assert!(matches!(
        Linter::from_config(&bad_level),
        Err(ConfigError::InvalidSeverity { .. })
    ));
}

#[test]
fn test_config_file_with_preset() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rxlint.yaml");
    std::fs::write(
        &path,
        "extends: [recommended]\nengine:\n  jobs: 2\nrules:\n  just: warn\n  no-internal: off\n",
    )
    .unwrap();
    let config = Config::load(&path).unwrap();
    let linter = Linter::from_config(&config).unwrap();

    let names: Vec<&str> = linter.rule_names().collect();
    assert!(names.contains(&"just"));
    assert!(names.contains(&"no-index"));
    assert!(!names.contains(&"no-internal"));
    assert_eq!(config.rule_severity("just"), Some(Severity::Warning));
}

#[test]
fn test_parallel_matches_sequential() {
    init();
    let files = || -> Vec<SourceFile> {
        (0..8)
            .map(|i| {
                let mut body = vec![import_decl(vec![import_spec("of")], "rxjs")];
                for _ in 0..i {
                    body.push(expr_stmt(call(ident("of"), vec![number(i as f64)])));
                }
                let (tree, _) = program(body).build().unwrap();
                SourceFile::new(format!("file{}.ts", i), tree)
            })
            .collect()
    };
    let summary = |parallel: bool| {
        let mut config = Config::from_yaml("rules:\n  just: error\n").unwrap();
        config.engine.parallel = parallel;
        config.engine.jobs = 4;
        let result = Linter::from_config(&config).unwrap().lint(&files());
        let located: Vec<(String, usize, usize)> = result
            .diagnostics
            .iter()
            .map(|d| {
                (
                    d.location.file.display().to_string(),
                    d.location.line,
                    d.location.column,
                )
            })
            .collect();
        (result.files_processed, result.error_count, located)
    };

    let sequential = summary(false);
    assert_eq!(sequential.0, 8);
    // One import plus i references per file
    assert_eq!(sequential.1, (0..8).map(|i| 1 + i).sum::<usize>());
    assert_eq!(summary(true), sequential);
}

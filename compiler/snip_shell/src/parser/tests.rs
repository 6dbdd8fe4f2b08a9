use super::*;
use pretty_assertions::assert_eq;

fn parse(source: &str) -> Stmt {
    parse_snippet(source).unwrap_or_else(|err| panic!("{source:?}: {err}"))
}

fn parse_err(source: &str) -> String {
    match parse_snippet(source) {
        Ok(stmt) => panic!("{source:?} parsed as {stmt:?}"),
        Err(err) => err.message,
    }
}

fn expr_of(stmt: Stmt) -> ExprKind {
    match stmt {
        Stmt::Expr(expr) => expr.kind,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

#[test]
fn var_declaration() {
    let Stmt::VarDecl { ty, name, init, .. } = parse("var output = inputA;") else {
        panic!("not a declaration");
    };
    assert_eq!(ty, None);
    assert_eq!(name, "output");
    assert_eq!(init.and_then(|e| e.as_ident().map(str::to_string)), Some("inputA".to_string()));
}

#[test]
fn qualified_typed_declaration_with_cast() {
    let stmt = parse(r#"java.lang.Integer n = (java.lang.Integer) __channel.get("n");"#);
    let Stmt::VarDecl {
        ty: Some(ty),
        name,
        init: Some(init),
        ..
    } = stmt
    else {
        panic!("not a typed declaration");
    };
    assert_eq!(ty.name, "java.lang.Integer");
    assert_eq!(name, "n");
    let ExprKind::Cast { ty, operand } = init.kind else {
        panic!("initializer is not a cast");
    };
    assert_eq!(ty.name, "java.lang.Integer");
    assert!(matches!(operand.kind, ExprKind::Call { ref method, .. } if method == "get"));
}

#[test]
fn declaration_without_initializer() {
    assert!(matches!(
        parse("int count;"),
        Stmt::VarDecl { init: None, .. }
    ));
}

#[test]
fn missing_final_semicolon_is_accepted() {
    assert!(matches!(parse("1 + 2"), Stmt::Expr(_)));
}

#[test]
fn precedence_multiplication_binds_tighter() {
    let ExprKind::Binary { op, rhs, .. } = expr_of(parse("1 + 2 * 3;")) else {
        panic!("not binary");
    };
    assert_eq!(op, BinaryOp::Add);
    assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn subtraction_is_left_associative() {
    let ExprKind::Binary { op, lhs, .. } = expr_of(parse("5 - 2 - 1;")) else {
        panic!("not binary");
    };
    assert_eq!(op, BinaryOp::Sub);
    assert!(matches!(lhs.kind, ExprKind::Binary { op: BinaryOp::Sub, .. }));
}

#[test]
fn assignment_is_right_associative() {
    let ExprKind::Assign { target, value, op } = expr_of(parse("a = b = 3;")) else {
        panic!("not an assignment");
    };
    assert_eq!(target, "a");
    assert_eq!(op, None);
    assert!(matches!(value.kind, ExprKind::Assign { .. }));
}

#[test]
fn compound_assignment() {
    assert!(matches!(
        expr_of(parse("total += 4;")),
        ExprKind::Assign {
            op: Some(BinaryOp::Add),
            ..
        }
    ));
}

#[test]
fn field_assignment() {
    let ExprKind::FieldAssign { receiver, field, .. } = expr_of(parse("person.name = \"Bob\";"))
    else {
        panic!("not a field assignment");
    };
    assert_eq!(receiver.as_ident(), Some("person"));
    assert_eq!(field, "name");
}

#[test]
fn chained_method_call() {
    let ExprKind::Call {
        receiver,
        method,
        args,
    } = expr_of(parse("System.out.println(\"hi\");"))
    else {
        panic!("not a call");
    };
    assert_eq!(method, "println");
    assert_eq!(args.len(), 1);
    assert!(matches!(receiver.kind, ExprKind::Field { ref name, .. } if name == "out"));
}

#[test]
fn new_with_arguments() {
    let ExprKind::New { ty, args } = expr_of(parse("new IllegalStateException(\"x\");")) else {
        panic!("not new");
    };
    assert_eq!(ty.name, "IllegalStateException");
    assert_eq!(args.len(), 1);
}

#[test]
fn parenthesized_expression_is_not_a_cast() {
    let ExprKind::Binary { op, .. } = expr_of(parse("(a) + 1;")) else {
        panic!("not binary");
    };
    assert_eq!(op, BinaryOp::Add);
}

#[test]
fn primitive_cast_of_negative_operand() {
    assert!(matches!(
        expr_of(parse("(int) -3.5;")),
        ExprKind::Cast { .. }
    ));
}

#[test]
fn if_else_and_while() {
    assert!(matches!(
        parse("if (a > 1) { b = 1; } else b = 2;"),
        Stmt::If {
            else_branch: Some(_),
            ..
        }
    ));
    assert!(matches!(
        parse("while (i < 3) { i += 1; }"),
        Stmt::While { .. }
    ));
}

#[test]
fn imports() {
    assert!(matches!(
        parse("import com.example.Person;"),
        Stmt::Import { ref path, wildcard: false, .. } if path == "com.example.Person"
    ));
    assert!(matches!(
        parse("import com.example.*;"),
        Stmt::Import { ref path, wildcard: true, .. } if path == "com.example"
    ));
}

#[test]
fn throw_statement() {
    assert!(matches!(
        parse("throw new RuntimeException(\"bad\");"),
        Stmt::Throw(_)
    ));
}

#[test]
fn errors() {
    assert_eq!(parse_err("1 +;"), "illegal start of expression, found semi");
    assert_eq!(parse_err("\"abc"), "unclosed string literal");
    assert_eq!(parse_err("a # b;"), "illegal character: '#'");
    assert_eq!(parse_err("1 2;"), "';' expected, found 2");
    assert!(parse_err("var x;").starts_with("cannot infer type"));
    assert!(parse_err("3 = 4;").starts_with("unexpected type"));
}

#[test]
fn deeply_nested_parentheses_do_not_overflow() {
    let depth = 2_000;
    let source = format!("{}1{};", "(".repeat(depth), ")".repeat(depth));
    assert!(matches!(parse(&source), Stmt::Expr(_)));
}

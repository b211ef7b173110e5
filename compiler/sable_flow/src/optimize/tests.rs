use pretty_assertions::assert_eq;
use sable_ir::{Constant, Expr, Stmt, VariableKind, Version};

use crate::error::FlowError;
use crate::notify::ChangeTag;
use crate::root::RootKind;
use crate::test_helpers::Fixture;
use crate::trace::{TraceKey, TraceKind};

fn v(n: u32) -> Version {
    Version::new(n)
}

// Expressions

#[test]
fn builtin_constants_fold() {
    let mut fx = Fixture::new();
    let x = fx.local("x");
    let value = fx.builtin("True");
    let assign = fx.assign_expr(x, value);
    let body = fx.seq(vec![assign]);

    fx.with_root(RootKind::Module, |root, tree| root.optimize_body(tree, body))
        .unwrap();

    let Some(Stmt::Assign { value: folded, .. }) = fx.tree.stmt(assign) else {
        panic!("assignment is gone");
    };
    assert_ne!(*folded, value);
    assert_eq!(
        fx.tree.expr(*folded),
        Some(&Expr::Constant(Constant::Bool(true)))
    );
    assert_eq!(fx.tree.span(*folded), fx.tree.span(value));

    let entries = fx.log.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].tag, ChangeTag::NewConstant);
    assert_eq!(entries[0].message, "Built-in constant 'True' resolved.");
}

#[test]
fn debug_builtin_follows_config() {
    let mut fx = Fixture::new();
    fx.config.debug_enabled = false;
    let x = fx.local("x");
    let value = fx.builtin("__debug__");
    let assign = fx.assign_expr(x, value);
    let body = fx.seq(vec![assign]);

    fx.with_root(RootKind::Module, |root, tree| root.optimize_body(tree, body))
        .unwrap();

    let Some(Stmt::Assign { value: folded, .. }) = fx.tree.stmt(assign) else {
        panic!("assignment is gone");
    };
    assert_eq!(
        fx.tree.expr(*folded),
        Some(&Expr::Constant(Constant::Bool(false)))
    );
}

#[test]
fn other_builtins_are_left_alone() {
    let mut fx = Fixture::new();
    let callee = fx.builtin("len");
    let call = fx.call(callee, Vec::new());
    let stmt = fx.expr_stmt(call);
    let body = fx.seq(vec![stmt]);

    fx.with_root(RootKind::Module, |root, tree| root.optimize_body(tree, body))
        .unwrap();

    assert_eq!(fx.tree.sequence(body), Some(&[stmt][..]));
    assert!(fx.log.is_empty());
}

#[test]
fn reads_count_against_the_current_version() {
    let mut fx = Fixture::new();
    let x = fx.local("x");
    let first = fx.assign(x, 1);
    let second = fx.assign(x, 2);
    let callee = fx.builtin("print");
    let read = fx.read(x);
    let call = fx.call(callee, vec![read]);
    let stmt = fx.expr_stmt(call);
    let body = fx.seq(vec![first, second, stmt]);

    fx.with_root(RootKind::Module, |root, tree| {
        root.optimize_body(tree, body)?;
        let state = root.state();
        assert_eq!(state.trace(TraceKey::new(x, v(1)))?.usage_count(), 0);
        assert_eq!(state.trace(TraceKey::new(x, v(2)))?.usage_count(), 1);
        Ok(())
    })
    .unwrap();

    assert_eq!(
        fx.tree.expr(read),
        Some(&Expr::VarRef {
            var: x,
            version: Some(v(2))
        })
    );
    assert_eq!(
        fx.tree.stmt(second),
        Some(&Stmt::Assign {
            target: x,
            value: sable_ir::NodeId::new(2),
            version: Some(v(2)),
        })
    );
}

#[test]
fn maybe_local_read_also_counts_its_fallback() {
    let mut fx = Fixture::new();
    let g = fx.module_var("g");
    let n = fx
        .variables
        .add("n", VariableKind::MaybeLocal { fallback: Some(g) });
    let callee = fx.builtin("print");
    let read = fx.read(n);
    let call = fx.call(callee, vec![read]);
    let stmt = fx.expr_stmt(call);
    let body = fx.seq(vec![stmt]);

    fx.with_root(RootKind::Module, |root, tree| {
        root.optimize_body(tree, body)?;
        let state = root.state();
        assert_eq!(state.trace(TraceKey::new(n, Version::ENTRY))?.usage_count(), 1);
        assert_eq!(state.trace(TraceKey::new(g, Version::ENTRY))?.usage_count(), 1);
        // The call escaped the module variable afterwards.
        assert!(root.scope().active_version(g) != Some(Version::ENTRY));
        Ok(())
    })
    .unwrap();
}

#[test]
fn dynamic_eval_makes_locals_unclear() {
    let mut fx = Fixture::new();
    let g = fx.module_var("g");
    let x = fx.local("x");
    let set_g = fx.assign(g, 1);
    let set_x = fx.assign(x, 1);
    let source = fx.expr(Expr::Constant(Constant::Str("g = 2".to_owned())));
    let eval = fx.expr(Expr::DynamicEval { source });
    let stmt = fx.expr_stmt(eval);
    let body = fx.seq(vec![set_g, set_x, stmt]);

    fx.with_root(RootKind::Module, |root, tree| {
        root.optimize_body(tree, body)?;
        let state = root.state();
        assert!(state.has_unclear_locals());

        let g_now = root.scope().active_version(g).unwrap();
        assert!(state.trace(TraceKey::new(g, g_now))?.is_unknown());
        assert_eq!(root.scope().active_version(x), Some(v(1)));
        Ok(())
    })
    .unwrap();
}

// Statements

#[test]
fn constant_expression_statement_is_removed() {
    let mut fx = Fixture::new();
    let x = fx.local("x");
    let assign = fx.assign(x, 1);
    let five = fx.int(5);
    let useless = fx.expr_stmt(five);
    let body = fx.seq(vec![assign, useless]);

    fx.with_root(RootKind::Module, |root, tree| root.optimize_body(tree, body))
        .unwrap();

    assert_eq!(fx.tree.sequence(body), Some(&[assign][..]));
    assert_eq!(fx.messages(), vec!["Removed statement without effect."]);
    assert_eq!(fx.log.entries()[0].span, fx.tree.span(useless));
}

#[test]
fn sequence_of_nothing_is_removed() {
    let mut fx = Fixture::new();
    let five = fx.int(5);
    let useless = fx.expr_stmt(five);
    let body = fx.seq(vec![useless]);

    let result = fx
        .with_root(RootKind::Module, |root, tree| root.optimize_body(tree, body))
        .unwrap();

    assert_eq!(result, None);
    assert_eq!(
        fx.messages(),
        vec![
            "Removed statement without effect.",
            "Removed empty statement sequence."
        ]
    );
}

#[test]
fn statements_after_return_are_dead() {
    let mut fx = Fixture::new();
    let x = fx.local("x");
    let ret = fx.ret(None);
    let assign = fx.assign(x, 1);
    let body = fx.seq(vec![ret, assign]);

    fx.with_root(RootKind::Function, |root, tree| root.optimize_body(tree, body))
        .unwrap();

    assert_eq!(fx.tree.sequence(body), Some(&[ret][..]));
    assert_eq!(
        fx.messages(),
        vec!["Removed dead statements after aborting statement."]
    );
    assert_eq!(fx.log.entries()[0].span, fx.tree.span(assign));
}

#[test]
fn tolerant_delete_of_unbound_is_removed() {
    let mut fx = Fixture::new();
    let x = fx.local("x");
    let y = fx.local("y");
    let tolerant = fx.delete(x, true);
    let strict = fx.delete(y, false);
    let body = fx.seq(vec![tolerant, strict]);

    fx.with_root(RootKind::Module, |root, tree| root.optimize_body(tree, body))
        .unwrap();

    assert_eq!(fx.tree.sequence(body), Some(&[strict][..]));
    assert_eq!(
        fx.tree.stmt(strict),
        Some(&Stmt::Delete {
            target: y,
            tolerant: false,
            version: Some(v(1)),
        })
    );
}

#[test]
fn release_marks_the_trace() {
    let mut fx = Fixture::new();
    let x = fx.local("x");
    let assign = fx.assign(x, 1);
    let release = fx.stmt(Stmt::Release { target: x });
    let body = fx.seq(vec![assign, release]);

    fx.with_root(RootKind::Module, |root, tree| {
        root.optimize_body(tree, body)?;
        assert!(root.state().trace(TraceKey::new(x, v(1)))?.is_released());
        Ok(())
    })
    .unwrap();
}

#[test]
fn nested_sequences_are_spliced() {
    let mut fx = Fixture::new();
    let x = fx.local("x");
    let a = fx.assign(x, 1);
    let b = fx.assign(x, 2);
    let inner = fx.seq(vec![b]);
    let body = fx.seq(vec![a, inner]);

    fx.with_root(RootKind::Module, |root, tree| root.optimize_body(tree, body))
        .unwrap();

    assert_eq!(fx.tree.sequence(body), Some(&[a, b][..]));
}

// Conditionals

#[test]
fn constant_condition_selects_the_taken_arm() {
    let mut fx = Fixture::new();
    let x = fx.local("x");
    let cond = fx.builtin("False");
    let yes_assign = fx.assign(x, 1);
    let yes = fx.seq(vec![yes_assign]);
    let no_assign = fx.assign(x, 2);
    let no = fx.seq(vec![no_assign]);
    let branch = fx.if_(cond, Some(yes), Some(no));
    let body = fx.seq(vec![branch]);

    fx.with_root(RootKind::Module, |root, tree| {
        root.optimize_body(tree, body)?;
        let current = root.scope().active_version(x).unwrap();
        assert_eq!(
            root.state().trace(TraceKey::new(x, current))?.assign_node(),
            Some(no_assign)
        );
        // The untaken arm was never walked.
        assert_eq!(root.state().traces_of(x).len(), 2);
        Ok(())
    })
    .unwrap();

    assert_eq!(fx.tree.sequence(body), Some(&[no_assign][..]));
    assert_eq!(
        fx.messages(),
        vec![
            "Built-in constant 'False' resolved.",
            "Condition for branch statement was predicted to be always false.",
        ]
    );
}

#[test]
fn branches_merge_at_the_join() {
    let mut fx = Fixture::new();
    let p = fx.param("p");
    let x = fx.local("x");
    let cond = fx.read(p);
    let assign = fx.assign(x, 1);
    let yes = fx.seq(vec![assign]);
    let branch = fx.if_(cond, Some(yes), None);
    let body = fx.seq(vec![branch]);

    fx.with_root(RootKind::Function, |root, tree| {
        root.optimize_body(tree, body)?;
        let current = root.scope().active_version(x).unwrap();
        let trace = root.state().trace(TraceKey::new(x, current))?;
        assert_eq!(
            trace.kind(),
            &TraceKind::Merge {
                sources: smallvec::smallvec![Version::ENTRY, v(1)]
            }
        );
        Ok(())
    })
    .unwrap();
    assert!(fx.log.is_empty());
}

#[test]
fn aborting_arm_contributes_nothing() {
    let mut fx = Fixture::new();
    let p = fx.param("p");
    let x = fx.local("x");
    let cond = fx.read(p);
    let ret = fx.ret(None);
    let yes = fx.seq(vec![ret]);
    let assign = fx.assign(x, 1);
    let no = fx.seq(vec![assign]);
    let branch = fx.if_(cond, Some(yes), Some(no));
    let read = fx.read(x);
    let use_x = fx.expr_stmt(read);
    let body = fx.seq(vec![branch, use_x]);

    fx.with_root(RootKind::Function, |root, tree| {
        root.optimize_body(tree, body)?;
        assert_eq!(root.state().trace(TraceKey::new(x, v(1)))?.usage_count(), 1);
        Ok(())
    })
    .unwrap();
    assert_eq!(
        fx.tree.expr(read),
        Some(&Expr::VarRef {
            var: x,
            version: Some(v(1))
        })
    );
}

#[test]
fn empty_conditional_keeps_only_the_condition() {
    let mut fx = Fixture::new();
    let p = fx.param("p");
    let cond = fx.read(p);
    let five = fx.int(5);
    let useless = fx.expr_stmt(five);
    let yes = fx.seq(vec![useless]);
    let branch = fx.if_(cond, Some(yes), None);
    let body = fx.seq(vec![branch]);

    fx.with_root(RootKind::Function, |root, tree| root.optimize_body(tree, body))
        .unwrap();

    let [replacement] = fx.tree.sequence(body).unwrap() else {
        panic!("expected a single statement");
    };
    assert_ne!(*replacement, branch);
    assert_eq!(fx.tree.stmt(*replacement), Some(&Stmt::Expr { expr: cond }));
    assert_eq!(
        fx.messages().last().copied(),
        Some("Removed conditional statement without effect.")
    );
}

// Roots

#[test]
fn function_join_covers_returns_and_fall_through() {
    let mut fx = Fixture::new();
    let p = fx.param("p");
    let x = fx.local("x");
    let cond = fx.read(p);
    let early = fx.assign(x, 1);
    let ret = fx.ret(None);
    let yes = fx.seq(vec![early, ret]);
    let branch = fx.if_(cond, Some(yes), None);
    let late = fx.assign(x, 2);
    let body = fx.seq(vec![branch, late]);

    fx.with_root(RootKind::Function, |root, tree| {
        root.optimize_body(tree, body)?;
        let current = root.scope().active_version(x).unwrap();
        assert_eq!(
            root.state().trace(TraceKey::new(x, current))?.kind(),
            &TraceKind::Merge {
                sources: smallvec::smallvec![v(1), v(2)]
            }
        );
        Ok(())
    })
    .unwrap();
}

#[test]
fn function_ending_in_return_has_no_fall_through() {
    let mut fx = Fixture::new();
    let x = fx.local("x");
    let assign = fx.assign(x, 1);
    let ret = fx.ret(None);
    let body = fx.seq(vec![assign, ret]);

    fx.with_root(RootKind::Function, |root, tree| {
        root.optimize_body(tree, body)?;
        // A single path out: adopted, not merged.
        assert_eq!(root.scope().active_version(x), Some(v(1)));
        Ok(())
    })
    .unwrap();
}

#[test]
fn failures_carry_the_innermost_statement_span() {
    let mut fx = Fixture::new();
    let stray = fx.brk();
    let p = fx.param("p");
    let cond = fx.read(p);
    let yes = fx.seq(vec![stray]);
    let branch = fx.if_(cond, Some(yes), None);
    let body = fx.seq(vec![branch]);

    let err = fx
        .with_root(RootKind::Module, |root, tree| root.optimize_body(tree, body))
        .unwrap_err();

    assert_eq!(err.span(), Some(fx.tree.span(stray)));
    assert!(matches!(
        err.root_cause(),
        FlowError::ExitOutsideTracking { .. }
    ));
    assert!(err.to_string().starts_with("problem with statement at"));
}

#[test]
fn expression_where_a_statement_belongs_is_rejected() {
    let mut fx = Fixture::new();
    let five = fx.int(5);
    let body = fx.seq(vec![five]);

    let err = fx
        .with_root(RootKind::Module, |root, tree| root.optimize_body(tree, body))
        .unwrap_err();
    assert!(matches!(
        err.root_cause(),
        FlowError::NodeKindMismatch { expected: "a statement", .. }
    ));
}

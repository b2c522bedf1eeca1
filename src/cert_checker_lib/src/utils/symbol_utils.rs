//! Helper functions for common tasks utilizing function symbols,
//! e.g. searching for calls to a specific function.

use crate::intermediate_representation::*;

/// Find all calls to functions with one of the given (qualified) names in the given function.
///
/// Calls are searched for in all statements and jump conditions, including calls nested in other expressions.
/// Return a pair of (term ID of the statement or jump containing the call, call expression) for each call found.
pub fn get_calls_to_symbols<'a>(
    sub: &'a Term<Sub>,
    symbols: &[String],
) -> Vec<(&'a Tid, &'a Expression)> {
    let is_call_to_symbol = |expr: &&Expression| match expr {
        Expression::Call { target, .. } => symbols.iter().any(|symbol| symbol == target),
        _ => false,
    };
    let mut calls = Vec::new();
    for blk in sub.term.blocks.iter() {
        for stmt in blk.term.stmts.iter() {
            for expr in stmt.term.expressions() {
                calls.extend(
                    expr.get_calls()
                        .into_iter()
                        .filter(is_call_to_symbol)
                        .map(|call| (&stmt.tid, call)),
                );
            }
        }
        for jmp in blk.term.jmps.iter() {
            for expr in jmp.term.expressions() {
                calls.extend(
                    expr.get_calls()
                        .into_iter()
                        .filter(is_call_to_symbol)
                        .map(|call| (&jmp.tid, call)),
                );
            }
        }
    }
    calls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_nested_calls() {
        let memcmp = Expression::memcmp(
            Expression::var("a", Type::pointer(Type::int())),
            Expression::var("b", Type::pointer(Type::int())),
            Expression::IntLiteral(4),
        );
        let sub = Sub::mock(
            "main",
            Vec::new(),
            vec![Blk::mock(
                "entry",
                vec![
                    Stmt::expr("stmt_1", memcmp.clone()),
                    Stmt::expr("stmt_2", Expression::call("strcmp", Vec::new())),
                ],
                vec![Jmp::cbranch(
                    "jmp",
                    "entry",
                    Expression::call("check", vec![memcmp.clone()]),
                )],
            )],
        );
        let calls = get_calls_to_symbols(&sub, &["memcmp".to_string()]);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0.to_string(), "stmt_1");
        assert_eq!(calls[0].1, &memcmp);
        assert_eq!(calls[1].0.to_string(), "jmp");
        assert_eq!(calls[1].1, &memcmp);
    }
}

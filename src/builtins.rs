//! The `sys` native assertion: comparison, arithmetic, and string
//! predicates every rule file can reach as `:sys says ...`.
//!
//! Built entirely with the native bridge, so it doubles as a live
//! exercise of each return schema: boolean checks, single-value outputs,
//! nondeterministic enumeration, and optional results. Arithmetic is
//! checked — an overflowing `sum` or `product` simply has no answer.

use crate::db::NativeAssertion;
use crate::error::NativeError;
use crate::native::NativePred;
use crate::term::Value;

/// Assemble the `sys` assertion.
pub fn sys_assertion() -> Result<NativeAssertion, NativeError> {
    NativeAssertion::new(
        "sys",
        vec![
            NativePred::func2("eq", ["x", "y"], &[], |x: Value, y: Value| x == y)?,
            NativePred::func2("neq", ["x", "y"], &[], |x: Value, y: Value| x != y)?,
            NativePred::func2("lt", ["x", "y"], &[], |x: i64, y: i64| x < y)?,
            NativePred::func2("le", ["x", "y"], &[], |x: i64, y: i64| x <= y)?,
            NativePred::func2("sum", ["x", "y"], &["z"], |x: i64, y: i64| {
                x.checked_add(y).map(Value::Int)
            })?,
            NativePred::func2("product", ["x", "y"], &["z"], |x: i64, y: i64| {
                x.checked_mul(y).map(Value::Int)
            })?,
            NativePred::func2("concat", ["x", "y"], &["z"], |x: String, y: String| {
                Value::Str(x + &y)
            })?,
            NativePred::func2("range", ["lo", "hi"], &["n"], |lo: i64, hi: i64| {
                (lo..hi).map(Value::Int).collect::<Vec<_>>()
            })?,
            NativePred::func1("parse-int", ["s"], &["n"], |s: String| {
                s.parse::<i64>().ok().map(Value::Int)
            })?,
        ],
    )
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::db::Database;
    use crate::parse::parse_query;
    use crate::search::{run, Answers, Bounds};
    use crate::term::Term;

    fn ask(query: &str) -> Answers {
        let mut db = Database::new();
        db.install_native(sys_assertion().unwrap());
        let goal = parse_query(query).unwrap();
        run(&Bounds::new(1_000, 100), Rc::new(db), &goal)
    }

    #[test]
    fn eq_compares_any_values() {
        assert_eq!(ask(":sys says eq(alice, alice)").literals.len(), 1);
        assert!(ask(":sys says eq(alice, 3)").literals.is_empty());
        assert_eq!(ask(":sys says neq(alice, 3)").literals.len(), 1);
    }

    #[test]
    fn comparisons_are_integer_only() {
        assert_eq!(ask(":sys says lt(1, 2)").literals.len(), 1);
        assert!(ask(":sys says lt(a, b)").literals.is_empty());
        assert_eq!(ask(":sys says le(2, 2)").literals.len(), 1);
    }

    #[test]
    fn sum_grounds_its_output() {
        let answers = ask(":sys says sum(2, 40, ?z)");
        assert_eq!(answers.literals[0].args[2], Term::val(42));
    }

    #[test]
    fn overflowing_sum_has_no_answer() {
        let answers = ask(&format!(":sys says sum({}, 1, ?z)", i64::MAX));
        assert!(answers.literals.is_empty());
    }

    #[test]
    fn concat_joins_strings() {
        let answers = ask(":sys says concat(\"foo\", \"bar\", ?z)");
        assert_eq!(answers.literals[0].args[2], Term::val("foobar"));
    }

    #[test]
    fn range_enumerates() {
        let answers = ask(":sys says range(0, 4, ?n)");
        assert_eq!(answers.literals.len(), 4);
    }

    #[test]
    fn parse_int_round_trips() {
        let answers = ask(":sys says parse-int(\"42\", ?n)");
        assert_eq!(answers.literals[0].args[1], Term::val(42));
        assert!(ask(":sys says parse-int(nope, ?n)").literals.is_empty());
    }
}

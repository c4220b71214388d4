//! Static mode checking of submitted assertions.
//!
//! The runtime only ever *fails the branch* when a rule calls a native
//! predicate with an unbound input or dereferences an unground assertion
//! reference. This pass rejects such rules up front, before they are
//! installed, using the moded signatures native predicates advertise.
//!
//! The check is a left-to-right groundness dataflow per rule. Head
//! variables are assumed bound (the caller supplies or receives them), and
//! each body literal binds all of its variables once it succeeds: rule
//! predicates emit fully substituted answers, and the native bridge
//! guarantees every `Out` argument is ground on success.
//!
//! Rule-assertion references to principals that are not yet installed are
//! *not* errors — assertions arrive independently in a decentralized
//! setting — but a reference to a missing native assertion or predicate
//! is, because natives ship with the engine.

use std::collections::HashSet;

use crate::db::Database;
use crate::error::ModeError;
use crate::term::{AssertionRef, Literal, Mode, Rule, Term};

/// Check every rule of a prospective assertion against the database's
/// native signatures. Returns the first violation found.
pub fn check(db: &Database, rules: &[Rule]) -> Result<(), ModeError> {
    for rule in rules {
        check_rule(db, rule)?;
    }
    Ok(())
}

fn check_rule(db: &Database, rule: &Rule) -> Result<(), ModeError> {
    let mut bound: HashSet<&str> = HashSet::new();
    collect_vars(&rule.head, &mut bound);

    for body_lit in &rule.body {
        match &body_lit.assn {
            AssertionRef::Principal(Term::Val(_)) => {}
            AssertionRef::Principal(Term::Var(v)) => {
                if !bound.contains(v.name.as_str()) {
                    return Err(ModeError::UnboundAssertionRef {
                        rule: rule.head.to_string(),
                        var: v.name.clone(),
                    });
                }
            }
            AssertionRef::Native(name) => {
                let assertion = db.native_assertion(name).ok_or_else(|| {
                    ModeError::UnknownNativeAssertion {
                        rule: rule.head.to_string(),
                        name: name.clone(),
                    }
                })?;
                let sig = assertion.signature(&body_lit.lit.pred).ok_or_else(|| {
                    ModeError::UnknownNativePredicate {
                        rule: rule.head.to_string(),
                        assertion: name.clone(),
                        key: body_lit.lit.pred.to_string(),
                    }
                })?;
                for (arg, slot) in body_lit.lit.args.iter().zip(&sig.args) {
                    if slot.mode != Mode::In {
                        continue;
                    }
                    if let Term::Var(v) = arg {
                        if !bound.contains(v.name.as_str()) {
                            return Err(ModeError::UnboundInput {
                                rule: rule.head.to_string(),
                                pred: sig.pred.to_string(),
                                slot: slot.name.clone(),
                                var: v.name.clone(),
                            });
                        }
                    }
                }
            }
        }
        collect_vars(&body_lit.lit, &mut bound);
    }
    Ok(())
}

fn collect_vars<'a>(lit: &'a Literal, bound: &mut HashSet<&'a str>) {
    for arg in &lit.args {
        if let Term::Var(v) = arg {
            bound.insert(v.name.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::parse::parse_assertion;
    use crate::term::Value;

    fn db_with_sys() -> Database {
        let mut db = Database::new();
        db.install_native(builtins::sys_assertion().unwrap());
        db
    }

    fn rules(src: &str) -> Vec<Rule> {
        parse_assertion(&Value::from("app"), src).unwrap()
    }

    #[test]
    fn accepts_inputs_bound_by_head() {
        let db = db_with_sys();
        assert!(check(&db, &rules("big(?x) :- :sys says lt(10, ?x).")).is_ok());
    }

    #[test]
    fn accepts_inputs_bound_by_earlier_literal() {
        let db = db_with_sys();
        let src = "ok() :- item(?x), :sys says lt(?x, 100).";
        assert!(check(&db, &rules(src)).is_ok());
    }

    #[test]
    fn rejects_unbound_native_input() {
        let db = db_with_sys();
        let err = check(&db, &rules("bad() :- :sys says lt(?x, 100).")).unwrap_err();
        assert!(matches!(err, ModeError::UnboundInput { var, .. } if var == "x"));
    }

    #[test]
    fn output_positions_may_be_free() {
        let db = db_with_sys();
        assert!(check(&db, &rules("next(?x, ?y) :- :sys says sum(?x, 1, ?y).")).is_ok());
    }

    #[test]
    fn rejects_unbound_assertion_reference() {
        let db = db_with_sys();
        let err = check(&db, &rules("bad() :- ?who says flag().")).unwrap_err();
        assert!(matches!(err, ModeError::UnboundAssertionRef { var, .. } if var == "who"));
    }

    #[test]
    fn accepts_assertion_reference_bound_earlier() {
        let db = db_with_sys();
        let src = "ok() :- delegate(?who), ?who says flag().";
        assert!(check(&db, &rules(src)).is_ok());
    }

    #[test]
    fn unknown_native_assertion_is_rejected() {
        let db = db_with_sys();
        let err = check(&db, &rules("bad() :- :ldap says user(alice).")).unwrap_err();
        assert!(matches!(err, ModeError::UnknownNativeAssertion { name, .. } if name == "ldap"));
    }

    #[test]
    fn wrong_native_arity_is_rejected() {
        let db = db_with_sys();
        let err = check(&db, &rules("bad() :- :sys says lt(1, 2, 3).")).unwrap_err();
        assert!(
            matches!(err, ModeError::UnknownNativePredicate { key, .. } if key == "lt/3")
        );
    }

    #[test]
    fn unknown_principal_assertions_are_not_checked() {
        // Rule assertions arrive independently; referencing one that is
        // not installed yet is fine.
        let db = db_with_sys();
        assert!(check(&db, &rules("ok(?u) :- hr says employee(?u).")).is_ok());
    }
}

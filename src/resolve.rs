//! Goal resolution: dispatching `assn says lit` against the database.
//!
//! Resolution walks the assertion reference, selects the native or rule
//! table, looks up the predicate by `(name, arity)`, yields one scheduler
//! step, and invokes the compiled predicate on the call literal. A missing
//! assertion, missing predicate, or unground principal reference fails the
//! branch silently — the caller only ever observes fewer answers.

use std::rc::Rc;

use crate::search::{Goal, State, Stream, Thunk};
use crate::term::{AssertionRef, BodyLit, Literal, Rule, Term};

/// A predicate compiled to a search action: given the caller-side literal
/// (with caller-epoch variables) and a branch state, emit every successful
/// resolution. Produced from rule groups by [`compile_group`] and from
/// host functions by the native bridge.
#[derive(Clone)]
pub struct CompiledPred(Rc<dyn Fn(&Literal, State) -> Stream>);

impl CompiledPred {
    pub fn new(f: impl Fn(&Literal, State) -> Stream + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn invoke(&self, call: &Literal, st: State) -> Stream {
        (self.0)(call, st)
    }
}

/// Resolve one body literal.
///
/// The returned goal performs the assertion/predicate lookup against the
/// state it is eventually called with, so a principal reference that is a
/// variable resolves under the bindings made by earlier body literals.
pub fn solve(goal: &BodyLit) -> Goal {
    let goal = goal.clone();
    Goal::new(move |st: State| {
        let key = &goal.lit.pred;
        let pred = match &goal.assn {
            AssertionRef::Native(name) => st.db.native_pred(name, key),
            AssertionRef::Principal(term) => match st.env.walk(term) {
                Term::Val(principal) => st.db.rule_pred(&principal, key),
                // Unground assertion reference at resolve time: the mode
                // checker normally rejects such rules up front.
                Term::Var(_) => None,
            },
        };
        match pred {
            None => {
                tracing::trace!(goal = %goal, "no assertion or predicate; branch fails");
                Stream::Empty
            }
            // Suspend before dispatch: this is the scheduler step that
            // keeps recursive queries fair.
            Some(pred) => {
                let call = goal.lit.clone();
                Stream::Lazy(Thunk::new(move || pred.invoke(&call, st)))
            }
        }
    })
}

/// Compile all rules sharing one predicate key into a single predicate.
///
/// Each invocation allocates one fresh epoch for the whole group — head
/// and body variables of a rule instance share it — and branches over the
/// rules with fair disjunction: unify the renamed head against the call,
/// then resolve the body literals in order. A recursive call re-enters
/// through [`solve`], bumping the epoch again, so every instance gets
/// fresh variables.
pub(crate) fn compile_group(rules: Vec<Rule>) -> CompiledPred {
    CompiledPred::new(move |call: &Literal, mut st: State| {
        let epoch = st.fresh_epoch();
        let mut branches: Vec<Goal> = rules
            .iter()
            .map(|rule| {
                let rule = rule.at_epoch(epoch);
                let mut goal = Goal::unify_args(rule.head.args, call.args.clone());
                for body_lit in &rule.body {
                    goal = goal.and(solve(body_lit));
                }
                goal
            })
            .collect();
        // Right-nest the disjunction so branches are visited in rule order.
        match branches.pop() {
            None => Stream::Empty,
            Some(last) => branches
                .into_iter()
                .rev()
                .fold(last, |acc, goal| goal.or(acc))
                .call(st),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::search::{run, Answers, Bounds, Termination};
    use crate::term::Value;

    fn edge(a: i64, b: i64) -> Rule {
        Rule::fact(Literal::new("edge", vec![Term::val(a), Term::val(b)]))
    }

    fn query(assn: &str, name: &str, args: Vec<Term>) -> BodyLit {
        BodyLit::new(AssertionRef::principal(assn), Literal::new(name, args))
    }

    fn ask(db: &Database, goal: &BodyLit) -> Answers {
        run(&Bounds::new(10_000, 100), Rc::new(db.clone()), goal)
    }

    fn facts_db() -> Database {
        let mut db = Database::new();
        db.install(Value::from("app"), vec![edge(1, 2), edge(2, 3)]);
        db
    }

    #[test]
    fn ground_fact_succeeds_once() {
        let db = facts_db();
        let answers = ask(&db, &query("app", "edge", vec![Term::val(1), Term::val(2)]));
        assert_eq!(answers.literals.len(), 1);
        assert_eq!(answers.termination, Termination::Exhausted);
    }

    #[test]
    fn free_variable_enumerates_facts() {
        let db = facts_db();
        let answers = ask(&db, &query("app", "edge", vec![Term::var("x"), Term::var("y")]));
        assert_eq!(answers.literals.len(), 2);
        assert_eq!(
            answers.literals[0],
            Literal::new("edge", vec![Term::val(1), Term::val(2)])
        );
    }

    #[test]
    fn missing_assertion_fails_branch() {
        let db = facts_db();
        let answers = ask(&db, &query("nobody", "edge", vec![Term::var("x"), Term::var("y")]));
        assert!(answers.literals.is_empty());
        assert_eq!(answers.termination, Termination::Exhausted);
    }

    #[test]
    fn missing_predicate_fails_branch() {
        let db = facts_db();
        let answers = ask(&db, &query("app", "node", vec![Term::var("x")]));
        assert!(answers.literals.is_empty());
    }

    #[test]
    fn arity_mismatch_fails_not_crashes() {
        let db = facts_db();
        let answers = ask(&db, &query("app", "edge", vec![Term::var("x")]));
        assert!(answers.literals.is_empty());
        assert_eq!(answers.termination, Termination::Exhausted);
    }

    #[test]
    fn unground_assertion_reference_fails_branch() {
        let db = facts_db();
        let goal = BodyLit::new(
            AssertionRef::Principal(Term::var("who")),
            Literal::new("edge", vec![Term::val(1), Term::val(2)]),
        );
        let answers = ask(&db, &goal);
        assert!(answers.literals.is_empty());
    }

    #[test]
    fn assertion_reference_ground_by_earlier_literal() {
        // delegate(?a) names the assertion to consult; ?a says edge(...)
        // resolves only after delegate/1 binds it.
        let mut db = facts_db();
        let deleg = Rule::new(
            Literal::new("reach", vec![Term::var("x"), Term::var("y")]),
            vec![
                BodyLit::new(
                    AssertionRef::principal("router"),
                    Literal::new("delegate", vec![Term::var("a")]),
                ),
                BodyLit::new(
                    AssertionRef::Principal(Term::var("a")),
                    Literal::new("edge", vec![Term::var("x"), Term::var("y")]),
                ),
            ],
        );
        db.install(
            Value::from("router"),
            vec![
                Rule::fact(Literal::new("delegate", vec![Term::val("app")])),
                deleg,
            ],
        );
        let answers = ask(&db, &query("router", "reach", vec![Term::val(1), Term::var("y")]));
        assert_eq!(answers.literals.len(), 1);
        assert_eq!(
            answers.literals[0],
            Literal::new("reach", vec![Term::val(1), Term::val(2)])
        );
    }

    #[test]
    fn head_variables_get_fresh_epochs_per_invocation() {
        // same(?x, ?x) called twice in one body: the two instances must not
        // share variables, or the second call would be constrained by the
        // first.
        let mut db = Database::new();
        db.install(
            Value::from("app"),
            vec![
                Rule::fact(Literal::new("same", vec![Term::var("x"), Term::var("x")])),
                Rule::new(
                    Literal::new("pair", vec![Term::var("a"), Term::var("b")]),
                    vec![
                        query("app", "same", vec![Term::val(1), Term::var("a")]),
                        query("app", "same", vec![Term::val(2), Term::var("b")]),
                    ],
                ),
            ],
        );
        let answers = ask(&db, &query("app", "pair", vec![Term::var("a"), Term::var("b")]));
        assert_eq!(answers.literals.len(), 1);
        assert_eq!(
            answers.literals[0],
            Literal::new("pair", vec![Term::val(1), Term::val(2)])
        );
    }

    #[test]
    fn answer_is_call_literal_after_substitution() {
        let mut db = Database::new();
        // pass-through rule: out(?x) :- app says edge(1, ?x).
        db.install(Value::from("app"), vec![edge(1, 2)]);
        db.install(
            Value::from("wrap"),
            vec![Rule::new(
                Literal::new("out", vec![Term::var("x")]),
                vec![query("app", "edge", vec![Term::val(1), Term::var("x")])],
            )],
        );
        let answers = ask(&db, &query("wrap", "out", vec![Term::var("v")]));
        assert_eq!(answers.literals, vec![Literal::new("out", vec![Term::val(2)])]);
        // Emitted literal is walked to values; no epoch-tagged variables leak.
        assert!(answers.literals[0].args.iter().all(|t| !t.is_var()));
    }
}

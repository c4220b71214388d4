//! Substitution and first-order unification.
//!
//! The substitution is a partial map from variables to terms; the image of
//! a variable may itself be a variable. Bindings only ever point one way
//! (the representative found by [`Subst::walk`] binds to the other side),
//! so chasing bindings always terminates and no occurs check is needed —
//! there are no compound terms to smuggle a cycle through.
//!
//! Unification failure is not an error: it means "no solution on this
//! branch" and the search layer simply abandons the branch. Each branch
//! owns a snapshot of the substitution, so there is nothing to rewind.

use std::collections::HashMap;

use crate::term::{Literal, Term, Var};

/// A backtrackable variable binding environment.
#[derive(Debug, Clone, Default)]
pub struct Subst {
    bindings: HashMap<Var, Term>,
}

impl Subst {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Dereference a term to its current representative: values map to
    /// themselves, unbound variables to themselves, and bound variables
    /// through the chain of bindings.
    pub fn walk(&self, term: &Term) -> Term {
        let mut current = term;
        loop {
            match current {
                Term::Val(_) => return current.clone(),
                Term::Var(v) => match self.bindings.get(v) {
                    Some(next) => current = next,
                    None => return current.clone(),
                },
            }
        }
    }

    /// Unify two terms, extending the substitution on success.
    ///
    /// On failure the substitution may retain bindings made by earlier
    /// argument positions; callers discard the whole branch state, so
    /// partial extension is harmless.
    pub fn unify(&mut self, a: &Term, b: &Term) -> bool {
        let a = self.walk(a);
        let b = self.walk(b);
        if a == b {
            return true;
        }
        match (a, b) {
            (Term::Var(v), t) | (t, Term::Var(v)) => {
                self.bindings.insert(v, t);
                true
            }
            _ => false,
        }
    }

    /// Unify two argument vectors pairwise. A length mismatch is a plain
    /// failure, not a contract violation — arities are checked at lookup.
    pub fn unify_args(&mut self, xs: &[Term], ys: &[Term]) -> bool {
        xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.unify(x, y))
    }

    /// The literal after substitution: every argument walked to its
    /// representative. This is what the resolver emits as an answer.
    pub fn resolve_literal(&self, lit: &Literal) -> Literal {
        Literal {
            pred: lit.pred.clone(),
            args: lit.args.iter().map(|t| self.walk(t)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Value;

    fn v(name: &str) -> Term {
        Term::var(name)
    }

    #[test]
    fn walk_resolves_chains() {
        let mut s = Subst::new();
        assert!(s.unify(&v("x"), &v("y")));
        assert!(s.unify(&v("y"), &Term::val(5)));
        assert_eq!(s.walk(&v("x")), Term::Val(Value::Int(5)));
        assert_eq!(s.walk(&v("y")), Term::Val(Value::Int(5)));
    }

    #[test]
    fn walk_is_idempotent() {
        let mut s = Subst::new();
        assert!(s.unify(&v("x"), &v("y")));
        assert!(s.unify(&v("z"), &Term::val("a")));
        for t in [v("x"), v("y"), v("z"), Term::val(3)] {
            let once = s.walk(&t);
            assert_eq!(s.walk(&once), once);
        }
    }

    #[test]
    fn unify_is_symmetric_on_representatives() {
        let terms = [v("x"), v("y"), Term::val(1), Term::val("a")];
        for a in &terms {
            for b in &terms {
                let mut left = Subst::new();
                let mut right = Subst::new();
                assert_eq!(left.unify(a, b), right.unify(b, a));
                if left.unify(a, b) {
                    assert_eq!(left.walk(a), left.walk(b));
                    assert_eq!(right.walk(a), right.walk(b));
                }
            }
        }
    }

    #[test]
    fn distinct_values_fail() {
        let mut s = Subst::new();
        assert!(!s.unify(&Term::val(1), &Term::val(2)));
        assert!(!s.unify(&Term::val(1), &Term::val("1")));
        assert!(!s.unify(&Term::val(true), &Term::val(1)));
    }

    #[test]
    fn equal_terms_succeed_without_binding() {
        let mut s = Subst::new();
        assert!(s.unify(&v("x"), &v("x")));
        assert!(s.is_empty());
        assert!(s.unify(&Term::val("a"), &Term::val("a")));
        assert!(s.is_empty());
    }

    #[test]
    fn epoch_distinguishes_same_name() {
        let mut s = Subst::new();
        let x0 = Term::Var(crate::term::Var { epoch: 0, name: "x".into() });
        let x1 = Term::Var(crate::term::Var { epoch: 1, name: "x".into() });
        assert!(s.unify(&x0, &Term::val(1)));
        assert_eq!(s.walk(&x1), x1);
    }

    #[test]
    fn arg_length_mismatch_fails() {
        let mut s = Subst::new();
        assert!(!s.unify_args(&[v("x")], &[Term::val(1), Term::val(2)]));
        assert!(s.unify_args(&[v("x"), v("y")], &[Term::val(1), Term::val(2)]));
    }

    #[test]
    fn resolve_literal_walks_every_arg() {
        let mut s = Subst::new();
        assert!(s.unify(&v("x"), &Term::val(1)));
        let lit = Literal::new("edge", vec![v("x"), v("free")]);
        let resolved = s.resolve_literal(&lit);
        assert_eq!(resolved.args[0], Term::val(1));
        assert_eq!(resolved.args[1], v("free"));
    }
}

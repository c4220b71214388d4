//! Engine facade: the embedding API for the maat evaluator.
//!
//! An [`Engine`] owns a [`Database`] between queries and wires the parser,
//! mode checker, and resolver together. The core [`run`](crate::search::run)
//! stays a free function taking the database explicitly; the facade is
//! convenience for hosts that hold one database and query it repeatedly.

use std::rc::Rc;

use crate::builtins;
use crate::db::{Database, NativeAssertion};
use crate::error::MaatResult;
use crate::modecheck;
use crate::parse;
use crate::search::{run, Answers, Bounds};
use crate::term::{AssertionRef, BodyLit, Literal, Rule, Term, Value};

/// The maat evaluation engine: a database plus the operations to manage
/// and query it.
#[derive(Clone, Default)]
pub struct Engine {
    db: Database,
}

impl Engine {
    /// An engine with an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine with the `sys` builtin native assertion installed.
    pub fn with_builtins() -> MaatResult<Self> {
        let mut engine = Self::new();
        engine.install_native(builtins::sys_assertion()?);
        Ok(engine)
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Install a rule assertion without mode checking, replacing any
    /// assertion previously bound to this principal.
    pub fn install(&mut self, principal: Value, rules: Vec<Rule>) {
        self.db.install(principal, rules);
    }

    /// Mode-check a rule assertion against the installed native
    /// signatures, then install it.
    pub fn install_checked(&mut self, principal: Value, rules: Vec<Rule>) -> MaatResult<()> {
        modecheck::check(&self.db, &rules)?;
        self.db.install(principal, rules);
        Ok(())
    }

    /// Parse, mode-check, and install an assertion from source text.
    pub fn install_text(&mut self, principal: impl Into<Value>, source: &str) -> MaatResult<()> {
        let principal = principal.into();
        let rules = parse::parse_assertion(&principal, source)?;
        tracing::info!(principal = %principal, rules = rules.len(), "installing assertion from text");
        self.install_checked(principal, rules)
    }

    /// Remove the assertion bound to a principal.
    pub fn retract(&mut self, principal: &Value) -> bool {
        self.db.retract(principal)
    }

    /// Install a native assertion.
    pub fn install_native(&mut self, assertion: NativeAssertion) {
        self.db.install_native(assertion);
    }

    /// Construct a goal. An assertion name starting with `:` denotes the
    /// native assertion with the colon stripped, matching rule-file
    /// syntax; anything else is a principal string.
    pub fn compile_query(assn: &str, pred: &str, args: Vec<Term>) -> BodyLit {
        let assn = match assn.strip_prefix(':') {
            Some(native) => AssertionRef::native(native),
            None => AssertionRef::principal(assn),
        };
        BodyLit::new(assn, Literal::new(pred, args))
    }

    /// Evaluate a goal under the given bounds.
    pub fn query(&self, goal: &BodyLit, bounds: &Bounds) -> Answers {
        run(bounds, Rc::new(self.db.clone()), goal)
    }

    /// Parse and evaluate a query from source text.
    pub fn query_text(&self, source: &str, bounds: &Bounds) -> MaatResult<Answers> {
        let goal = parse::parse_query(source)?;
        Ok(self.query(&goal, bounds))
    }
}

//! Core term types for the maat engine.
//!
//! Everything the resolver manipulates is built from two atoms: ground
//! [`Value`]s and [`Var`]iables. Terms carry no function symbols, so
//! unification never needs an occurs check. Rules are stored with epoch-0
//! variables and renamed into a fresh epoch each time they are invoked.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An atomic ground datum.
///
/// Variants are totally ordered (booleans < integers < strings) with stable
/// equality, so values can key assertion maps and be compared by native
/// predicates.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl Value {
    /// Whether the string renders as a bare atom in rule syntax
    /// (no quoting needed).
    fn is_bare_atom(s: &str) -> bool {
        let mut chars = s.chars();
        let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        starts_ok
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(s, "true" | "false" | "says")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) if Value::is_bare_atom(s) => write!(f, "{s}"),
            Value::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

/// A variable identifier: a source name paired with an invocation epoch.
///
/// Freshness across rule invocations comes from the epoch alone — two
/// variables with different epochs never clash regardless of name. Rules
/// are stored at epoch 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Var {
    pub epoch: u64,
    pub name: String,
}

impl Var {
    /// A source-level (epoch 0) variable, as written in a rule.
    pub fn source(name: impl Into<String>) -> Self {
        Self {
            epoch: 0,
            name: name.into(),
        }
    }

    /// The same name annotated with a different epoch.
    pub fn at_epoch(&self, epoch: u64) -> Self {
        Self {
            epoch,
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch == 0 {
            write!(f, "?{}", self.name)
        } else {
            write!(f, "?{}#{}", self.name, self.epoch)
        }
    }
}

/// A term: either a ground value or a variable. Finite by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Val(Value),
    Var(Var),
}

impl Term {
    /// Shorthand for a source-level variable term.
    pub fn var(name: impl Into<String>) -> Self {
        Term::Var(Var::source(name))
    }

    /// Shorthand for a value term.
    pub fn val(v: impl Into<Value>) -> Self {
        Term::Val(v.into())
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    fn at_epoch(&self, epoch: u64) -> Term {
        match self {
            Term::Val(v) => Term::Val(v.clone()),
            Term::Var(v) => Term::Var(v.at_epoch(epoch)),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Val(v) => v.fmt(f),
            Term::Var(v) => v.fmt(f),
        }
    }
}

/// A predicate key: name plus arity. `p/2` and `p/3` are distinct predicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredKey {
    pub name: String,
    pub arity: usize,
}

impl PredKey {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

impl fmt::Display for PredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// A literal: a predicate applied to an ordered sequence of terms.
///
/// The arity of the key always equals `args.len()` — [`Literal::new`]
/// derives one from the other, so a mismatch cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub pred: PredKey,
    pub args: Vec<Term>,
}

impl Literal {
    pub fn new(name: impl Into<String>, args: Vec<Term>) -> Self {
        let pred = PredKey::new(name, args.len());
        Self { pred, args }
    }

    fn at_epoch(&self, epoch: u64) -> Literal {
        Literal {
            pred: self.pred.clone(),
            args: self.args.iter().map(|t| t.at_epoch(epoch)).collect(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return write!(f, "{}", self.pred.name);
        }
        write!(f, "{}(", self.pred.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            arg.fmt(f)?;
        }
        write!(f, ")")
    }
}

/// Argument direction for native predicates: `In` must be ground at call
/// time, `Out` may be free and is ground by the predicate on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    In,
    Out,
}

/// A named, moded argument slot in a native predicate signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModedArg {
    pub name: String,
    pub mode: Mode,
}

/// The moded literal a native predicate advertises: its key plus one
/// direction per argument. This is what the mode checker consults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub pred: PredKey,
    pub args: Vec<ModedArg>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.pred.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match arg.mode {
                Mode::In => write!(f, "+{}", arg.name)?,
                Mode::Out => write!(f, "-{}", arg.name)?,
            }
        }
        write!(f, ")")
    }
}

/// The `assn` part of `assn says lit`.
///
/// Principal references are terms (a variable is legal if earlier body
/// literals ground it before the call); native references are lexically
/// distinguished names and can never be variables. Keeping the two as
/// separate variants leaves the path open for signed native assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssertionRef {
    Principal(Term),
    Native(String),
}

impl AssertionRef {
    /// A principal reference to a concrete value.
    pub fn principal(v: impl Into<Value>) -> Self {
        AssertionRef::Principal(Term::Val(v.into()))
    }

    /// A native reference by bare name (no leading `:`).
    pub fn native(name: impl Into<String>) -> Self {
        AssertionRef::Native(name.into())
    }

    fn at_epoch(&self, epoch: u64) -> AssertionRef {
        match self {
            AssertionRef::Principal(t) => AssertionRef::Principal(t.at_epoch(epoch)),
            AssertionRef::Native(n) => AssertionRef::Native(n.clone()),
        }
    }
}

impl fmt::Display for AssertionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionRef::Principal(t) => t.fmt(f),
            AssertionRef::Native(n) => write!(f, ":{n}"),
        }
    }
}

/// A body literal, the unit of resolution: `assn says lit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyLit {
    pub assn: AssertionRef,
    pub lit: Literal,
}

impl BodyLit {
    pub fn new(assn: AssertionRef, lit: Literal) -> Self {
        Self { assn, lit }
    }

    pub(crate) fn at_epoch(&self, epoch: u64) -> BodyLit {
        BodyLit {
            assn: self.assn.at_epoch(epoch),
            lit: self.lit.at_epoch(epoch),
        }
    }
}

impl fmt::Display for BodyLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} says {}", self.assn, self.lit)
    }
}

/// A Horn clause: `head :- body`. A fact is a rule with an empty body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub head: Literal,
    pub body: Vec<BodyLit>,
}

impl Rule {
    pub fn new(head: Literal, body: Vec<BodyLit>) -> Self {
        Self { head, body }
    }

    /// A bodiless rule.
    pub fn fact(head: Literal) -> Self {
        Self { head, body: vec![] }
    }

    /// Rename every variable in the rule into the given epoch.
    ///
    /// Head and body share the epoch so a single invocation sees one
    /// consistent set of fresh variables.
    pub(crate) fn at_epoch(&self, epoch: u64) -> Rule {
        Rule {
            head: self.head.at_epoch(epoch),
            body: self.body.iter().map(|bl| bl.at_epoch(epoch)).collect(),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.head.fmt(f)?;
        for (i, bl) in self.body.iter().enumerate() {
            write!(f, "{} {}", if i == 0 { " :-" } else { "," }, bl)?;
        }
        write!(f, ".")
    }
}

//! # maat
//!
//! A trust-management / authorization logic engine in the style of Soutei:
//! assertions are named bundles of Horn-clause rules attributed to
//! principals, queries ask whether `assn says p(args)` holds, and answers
//! are enumerated lazily under mandatory step and answer bounds.
//!
//! ## Architecture
//!
//! - **Terms** (`term`): ground values, epoch-tagged variables, literals,
//!   rules, assertion references
//! - **Unification** (`unify`): path-chasing substitution over a
//!   variable→term map
//! - **Search** (`search`): fair interleaving of proof branches with
//!   snapshot-based backtracking and bounded execution
//! - **Resolution** (`resolve`): predicate dispatch, rename-apart epochs,
//!   rule-group compilation
//! - **Native bridge** (`native`): host functions as predicates with
//!   declared argument modes
//! - **Databases** (`db`): rule assertions keyed by principal, native
//!   assertions keyed by name, monoidal merge
//! - **Surface** (`parse`, `modecheck`, `builtins`, `engine`): the rule
//!   language, static mode checking, the `:sys` builtins, and the
//!   embedding facade
//!
//! ## Library usage
//!
//! ```
//! use maat::{Bounds, Engine};
//!
//! let mut engine = Engine::with_builtins().unwrap();
//! engine
//!     .install_text(
//!         "app",
//!         "edge(1, 2).\n\
//!          edge(2, 3).\n\
//!          path(?x, ?y) :- edge(?x, ?y).\n\
//!          path(?x, ?y) :- path(?x, ?z), edge(?z, ?y).",
//!     )
//!     .unwrap();
//!
//! let answers = engine
//!     .query_text("app says path(1, ?y)", &Bounds::new(10_000, 100))
//!     .unwrap();
//! assert_eq!(answers.literals.len(), 2); // path(1, 2) and path(1, 3)
//! ```
//!
//! The left-recursive `path` rule is fine: disjunction interleaves
//! fairly, so the base case is reached even though the recursive rule is
//! listed and explored too, and the bounds guarantee termination either
//! way.

pub mod builtins;
pub mod db;
pub mod engine;
pub mod error;
pub mod modecheck;
pub mod native;
pub mod parse;
pub mod resolve;
pub mod search;
pub mod term;
pub mod unify;

pub use db::{Assertion, Database, NativeAssertion};
pub use engine::Engine;
pub use error::{MaatError, MaatResult};
pub use native::{FromValue, NativePred, Outcome};
pub use search::{run, Answers, Bounds, Termination};
pub use term::{AssertionRef, BodyLit, Literal, Mode, PredKey, Rule, Signature, Term, Value, Var};

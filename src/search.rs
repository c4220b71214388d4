//! Fair, bounded search over alternative proof branches.
//!
//! A computation is a lazy [`Stream`] of solution [`State`]s. Disjunction
//! ([`Stream::Split`]) and conjunction ([`Stream::Chain`]) are data nodes,
//! and the driver reduces them with a round-robin queue: one node is taken
//! from the front, reduced by a single step, and its remainders are
//! re-enqueued at the back. Every branch therefore gets a productive turn
//! after finitely many steps — a left-recursive rule cannot starve its
//! siblings the way it would under left-biased depth-first search — and
//! the reduction loop itself uses constant host stack no matter how deep
//! a derivation grows.
//!
//! Backtracking is structural: every branch owns a snapshot of the
//! [`State`] as of the branch point, so bindings made on one branch never
//! leak into another and there is no trail to rewind.
//!
//! Execution is always bounded. [`run`] counts one step per forced
//! suspension ([`Stream::Lazy`] node — the resolver plants one at every
//! predicate dispatch) and stops at [`Bounds::step_limit`]; it stops
//! emitting after [`Bounds::answer_limit`] answers. The [`Termination`]
//! reason is reported alongside the answers.

use std::collections::VecDeque;
use std::rc::Rc;

use serde::Serialize;

use crate::db::Database;
use crate::resolve;
use crate::term::{BodyLit, Literal};
use crate::unify::Subst;

/// Runtime state threaded through one proof branch: the substitution, the
/// fresh-epoch counter, and the (read-only) database.
#[derive(Clone)]
pub struct State {
    pub env: Subst,
    epoch: u64,
    pub db: Rc<Database>,
}

impl State {
    pub fn new(db: Rc<Database>) -> Self {
        Self {
            env: Subst::new(),
            epoch: 0,
            db,
        }
    }

    /// Allocate the next epoch on this branch. Sibling branches each carry
    /// their own counter snapshot; their substitutions never meet, so
    /// epoch reuse across branches is harmless.
    pub(crate) fn fresh_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }
}

/// A suspended computation: the scheduler's unit of work.
pub struct Thunk(Box<dyn FnOnce() -> Stream>);

impl Thunk {
    pub fn new(f: impl FnOnce() -> Stream + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn force(self) -> Stream {
        (self.0)()
    }
}

/// A lazy stream of solution states.
///
/// `Lazy` nodes are suspension points — forcing one costs a scheduler
/// step. `Split` and `Chain` are reduced by the driver, one constructor
/// per turn, so building a stream never recurses.
pub enum Stream {
    Empty,
    Cons(State, Box<Stream>),
    Lazy(Thunk),
    /// Disjunction: both arms are explored, round-robin.
    Split(Box<Stream>, Box<Stream>),
    /// Conjunction: every solution of the inner stream is fed through the
    /// goal, and the resulting streams are explored round-robin.
    Chain(Box<Stream>, Goal),
}

impl Stream {
    /// A single-solution stream.
    pub fn unit(st: State) -> Stream {
        Stream::Cons(st, Box::new(Stream::Empty))
    }
}

/// A goal: a computation from a branch state to a stream of solutions.
///
/// Goals are cheaply cloneable closures that *construct* stream nodes
/// without reducing them; all actual work happens on the driver's queue.
#[derive(Clone)]
pub struct Goal(Rc<dyn Fn(State) -> Stream>);

impl Goal {
    pub fn new(f: impl Fn(State) -> Stream + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// The goal that succeeds once with the state unchanged.
    pub fn succeed() -> Self {
        Goal::new(Stream::unit)
    }

    /// The goal that fails.
    pub fn fail() -> Self {
        Goal::new(|_| Stream::Empty)
    }

    /// Unify two argument vectors.
    pub fn unify_args(xs: Vec<crate::term::Term>, ys: Vec<crate::term::Term>) -> Self {
        Goal::new(move |mut st: State| {
            if st.env.unify_args(&xs, &ys) {
                Stream::unit(st)
            } else {
                Stream::Empty
            }
        })
    }

    pub fn call(&self, st: State) -> Stream {
        (self.0)(st)
    }

    /// Conjunction: `then` runs in every solution state of `self`.
    pub fn and(self, then: Goal) -> Goal {
        Goal::new(move |st| Stream::Chain(Box::new(self.call(st)), then.clone()))
    }

    /// Fair disjunction: both goals run against the branch-point state.
    pub fn or(self, other: Goal) -> Goal {
        Goal::new(move |st: State| {
            Stream::Split(Box::new(self.call(st.clone())), Box::new(other.call(st)))
        })
    }
}

/// Mandatory execution bounds for a run. The engine has no unbounded mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Upper bound on scheduler steps (forced suspensions).
    pub step_limit: usize,
    /// Upper bound on answers produced.
    pub answer_limit: usize,
}

impl Bounds {
    pub fn new(step_limit: usize, answer_limit: usize) -> Self {
        Self {
            step_limit,
            answer_limit,
        }
    }
}

/// Which bound (or natural exhaustion) terminated a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// The stream ran out: every proof branch was explored.
    Exhausted,
    /// The step bound was hit; more answers may have been discoverable.
    StepLimit,
    /// The answer bound was hit.
    AnswerLimit,
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Exhausted => write!(f, "search exhausted"),
            Termination::StepLimit => write!(f, "step limit reached"),
            Termination::AnswerLimit => write!(f, "answer limit reached"),
        }
    }
}

/// The result of a run: the grounded call-site literals of every answer,
/// in scheduler order, plus the termination diagnostic.
#[derive(Debug, Clone)]
pub struct Answers {
    pub literals: Vec<Literal>,
    pub termination: Termination,
    /// Scheduler steps actually spent.
    pub steps: usize,
}

/// Evaluate a query against a database under the given bounds.
///
/// Emits at most `answer_limit` literals, spends at most `step_limit`
/// scheduler steps, and never blocks when both bounds are finite. An empty
/// answer list means "no proofs found within bounds"; [`Answers::termination`]
/// distinguishes exhaustion from a tripped bound.
pub fn run(bounds: &Bounds, db: Rc<Database>, query: &BodyLit) -> Answers {
    tracing::debug!(
        query = %query,
        step_limit = bounds.step_limit,
        answer_limit = bounds.answer_limit,
        "starting query"
    );

    let stream = resolve::solve(query).call(State::new(db));
    let (states, termination, steps) = pump(stream, bounds);
    let literals = states
        .iter()
        .map(|st| st.env.resolve_literal(&query.lit))
        .collect::<Vec<_>>();

    tracing::debug!(answers = literals.len(), steps, %termination, "query finished");
    Answers {
        literals,
        termination,
        steps,
    }
}

/// Drive a stream to completion or to a bound, collecting solution states.
///
/// The queue holds one entry per live branch. Each iteration pops the
/// front entry, reduces its head constructor once, and enqueues whatever
/// remains at the back, so exploration is round-robin and the host stack
/// stays flat regardless of derivation depth.
pub(crate) fn pump(root: Stream, bounds: &Bounds) -> (Vec<State>, Termination, usize) {
    let mut states = Vec::new();
    if bounds.answer_limit == 0 {
        return (states, Termination::AnswerLimit, 0);
    }

    let mut queue: VecDeque<Stream> = VecDeque::new();
    queue.push_back(root);
    let mut steps = 0;

    let termination = loop {
        let Some(node) = queue.pop_front() else {
            break Termination::Exhausted;
        };
        match node {
            Stream::Empty => {}
            Stream::Cons(st, rest) => {
                states.push(st);
                if states.len() >= bounds.answer_limit {
                    break Termination::AnswerLimit;
                }
                queue.push_back(*rest);
            }
            Stream::Lazy(thunk) => {
                if steps >= bounds.step_limit {
                    break Termination::StepLimit;
                }
                steps += 1;
                queue.push_back(thunk.force());
            }
            Stream::Split(a, b) => {
                queue.push_back(*a);
                queue.push_back(*b);
            }
            Stream::Chain(inner, goal) => match *inner {
                Stream::Empty => {}
                Stream::Cons(st, rest) => {
                    queue.push_back(Stream::Split(
                        Box::new(goal.call(st)),
                        Box::new(Stream::Chain(rest, goal)),
                    ));
                }
                Stream::Lazy(thunk) => {
                    if steps >= bounds.step_limit {
                        break Termination::StepLimit;
                    }
                    steps += 1;
                    queue.push_back(Stream::Chain(Box::new(thunk.force()), goal));
                }
                Stream::Split(x, y) => {
                    queue.push_back(Stream::Chain(x, goal.clone()));
                    queue.push_back(Stream::Chain(y, goal));
                }
                // Re-associate so the next turn reduces the innermost
                // stream directly instead of descending through nesting.
                Stream::Chain(inner2, first) => {
                    queue.push_back(Stream::Chain(inner2, first.and(goal)));
                }
            },
        }
    };
    (states, termination, steps)
}

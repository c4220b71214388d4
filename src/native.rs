//! The native bridge: host functions exposed as predicates.
//!
//! A [`NativePred`] bundles an evaluator (call literal → search action)
//! with the moded [`Signature`] the mode checker consults. Construction is
//! compositional: leading arguments are decoded from ground values via
//! [`FromValue`] and become `In` modes; the host function's return type
//! implements [`Outcome`], which contributes the `Out` modes and knows how
//! to unify what the call produced:
//!
//! - `bool`: zero outputs; `false` fails the branch
//! - `()`: zero outputs, always succeeds
//! - [`Value`]: one output
//! - `(Value, Value)`, `(Value, Value, Value)`: two / three outputs
//! - `Vec<T>`: nondeterministic choice over the elements
//! - `Option<T>`: zero or one solutions
//!
//! The evaluator walks every input position and fails the branch if it is
//! unbound or decodes to the wrong runtime type (the mode checker normally
//! rules both out statically). On success every `Out` argument is ground,
//! the guarantee the mode checker's soundness rests on. Host functions
//! may perform I/O in their bodies; effects happen when the scheduler
//! explores the branch, in visit order, and are never rolled back.

use crate::error::NativeError;
use crate::resolve::CompiledPred;
use crate::search::{State, Stream};
use crate::term::{Literal, Mode, ModedArg, PredKey, Signature, Term, Value};

// ---------------------------------------------------------------------------
// Input decoding
// ---------------------------------------------------------------------------

/// Partial decoder from a ground [`Value`] to a host type.
///
/// Returning `None` fails the proof branch (a wrong runtime type is not an
/// error, just "no solution here").
pub trait FromValue: Sized {
    fn from_value(v: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(v: &Value) -> Option<Self> {
        Some(v.clone())
    }
}

impl FromValue for i64 {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl FromValue for bool {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Return schemas
// ---------------------------------------------------------------------------

/// How a host return value maps onto output argument positions.
pub trait Outcome: 'static {
    /// Number of output positions this outcome fills.
    const ARITY: usize;

    /// Unify the produced value(s) against the output terms, emitting the
    /// resulting solution states.
    fn deliver(self, outs: &[Term], st: State) -> Stream;
}

impl Outcome for bool {
    const ARITY: usize = 0;

    fn deliver(self, _outs: &[Term], st: State) -> Stream {
        if self {
            Stream::unit(st)
        } else {
            Stream::Empty
        }
    }
}

impl Outcome for () {
    const ARITY: usize = 0;

    fn deliver(self, _outs: &[Term], st: State) -> Stream {
        Stream::unit(st)
    }
}

impl Outcome for Value {
    const ARITY: usize = 1;

    fn deliver(self, outs: &[Term], st: State) -> Stream {
        let mut st = st;
        if st.env.unify(&outs[0], &Term::Val(self)) {
            Stream::unit(st)
        } else {
            Stream::Empty
        }
    }
}

impl Outcome for (Value, Value) {
    const ARITY: usize = 2;

    fn deliver(self, outs: &[Term], st: State) -> Stream {
        let mut st = st;
        if st.env.unify(&outs[0], &Term::Val(self.0)) && st.env.unify(&outs[1], &Term::Val(self.1))
        {
            Stream::unit(st)
        } else {
            Stream::Empty
        }
    }
}

impl Outcome for (Value, Value, Value) {
    const ARITY: usize = 3;

    fn deliver(self, outs: &[Term], st: State) -> Stream {
        let mut st = st;
        if st.env.unify(&outs[0], &Term::Val(self.0))
            && st.env.unify(&outs[1], &Term::Val(self.1))
            && st.env.unify(&outs[2], &Term::Val(self.2))
        {
            Stream::unit(st)
        } else {
            Stream::Empty
        }
    }
}

impl<T: Outcome> Outcome for Option<T> {
    const ARITY: usize = T::ARITY;

    fn deliver(self, outs: &[Term], st: State) -> Stream {
        match self {
            Some(inner) => inner.deliver(outs, st),
            None => Stream::Empty,
        }
    }
}

impl<T: Outcome> Outcome for Vec<T> {
    const ARITY: usize = T::ARITY;

    fn deliver(self, outs: &[Term], st: State) -> Stream {
        let mut stream = Stream::Empty;
        for item in self.into_iter().rev() {
            stream = Stream::Split(Box::new(item.deliver(outs, st.clone())), Box::new(stream));
        }
        stream
    }
}

// ---------------------------------------------------------------------------
// Native predicates
// ---------------------------------------------------------------------------

/// A host function adapted into a goal-callable predicate, together with
/// the moded signature it advertises.
#[derive(Clone)]
pub struct NativePred {
    sig: Signature,
    eval: CompiledPred,
}

impl std::fmt::Debug for NativePred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativePred").field("sig", &self.sig).finish()
    }
}

macro_rules! define_func {
    ($(#[$doc:meta])* $fname:ident, $n:expr $(, $A:ident $a:ident $idx:tt)*) => {
        $(#[$doc])*
        pub fn $fname<$($A,)* R>(
            name: impl Into<String>,
            inputs: [&str; $n],
            outputs: &[&str],
            f: impl Fn($($A),*) -> R + 'static,
        ) -> Result<NativePred, NativeError>
        where
            $($A: FromValue + 'static,)*
            R: Outcome,
        {
            let name = name.into();
            if outputs.len() != R::ARITY {
                return Err(NativeError::SignatureArity {
                    pred: name,
                    declared: outputs.len(),
                    produced: R::ARITY,
                });
            }
            let mut args = Vec::with_capacity($n + R::ARITY);
            for slot in inputs {
                args.push(ModedArg { name: slot.to_string(), mode: Mode::In });
            }
            for slot in outputs {
                args.push(ModedArg { name: slot.to_string(), mode: Mode::Out });
            }
            let sig = Signature {
                pred: PredKey::new(name, args.len()),
                args,
            };
            let eval = CompiledPred::new(move |call: &Literal, st: State| {
                $(
                    let $a: $A = match st.env.walk(&call.args[$idx]) {
                        Term::Val(ref v) => match <$A as FromValue>::from_value(v) {
                            Some(decoded) => decoded,
                            None => return Stream::Empty,
                        },
                        Term::Var(_) => return Stream::Empty,
                    };
                )*
                f($($a),*).deliver(&call.args[$n..], st)
            });
            Ok(NativePred { sig, eval })
        }
    };
}

impl NativePred {
    define_func!(
        /// Adapt a zero-input host function.
        func0, 0
    );
    define_func!(
        /// Adapt a one-input host function; the input is decoded from a
        /// ground value at call time.
        func1, 1, A a 0
    );
    define_func!(
        /// Adapt a two-input host function.
        func2, 2, A a 0, B b 1
    );
    define_func!(
        /// Adapt a three-input host function.
        func3, 3, A a 0, B b 1, C c 2
    );

    /// A pre-built literal exposed as a predicate: no host call, the
    /// call's arguments are simply unified against the literal's. All
    /// argument positions are advertised `Out`.
    pub fn fact(lit: Literal) -> NativePred {
        let args = (0..lit.args.len())
            .map(|i| ModedArg {
                name: format!("a{}", i + 1),
                mode: Mode::Out,
            })
            .collect();
        let sig = Signature {
            pred: lit.pred.clone(),
            args,
        };
        let eval = CompiledPred::new(move |call: &Literal, st: State| {
            let mut st = st;
            if st.env.unify_args(&lit.args, &call.args) {
                Stream::unit(st)
            } else {
                Stream::Empty
            }
        });
        NativePred { sig, eval }
    }

    pub fn signature(&self) -> &Signature {
        &self.sig
    }

    pub fn key(&self) -> &PredKey {
        &self.sig.pred
    }

    pub(crate) fn compiled(&self) -> CompiledPred {
        self.eval.clone()
    }
}

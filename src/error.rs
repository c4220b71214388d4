//! Rich diagnostic error types for the maat engine.
//!
//! Only *construction-time* problems are errors: malformed source text,
//! rules that fail the mode check, native predicates whose signature and
//! evaluator disagree. A failed proof attempt is never an error — the
//! search layer recovers it silently by exploring the next branch, and
//! query evaluation reports nothing but answers.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the maat engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text, source spans) through to the
/// user.
#[derive(Debug, Error, Diagnostic)]
pub enum MaatError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] crate::parse::ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Mode(#[from] ModeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Native(#[from] NativeError),
}

/// Convenience alias for functions returning maat results.
pub type MaatResult<T> = std::result::Result<T, MaatError>;

// ---------------------------------------------------------------------------
// Native bridge errors
// ---------------------------------------------------------------------------

/// Construction errors from the native-predicate bridge. These surface at
/// database-build time and prevent the database from being used.
#[derive(Debug, Error, Diagnostic)]
pub enum NativeError {
    #[error(
        "native predicate {pred}: signature declares {declared} output(s) \
         but the evaluator produces {produced}"
    )]
    #[diagnostic(
        code(maat::native::signature_arity),
        help(
            "The number of output placeholder names must equal the arity of \
             the host function's return schema: 0 for bool/unit, 1 for a \
             single value, N for an N-tuple, and the element arity for \
             list/optional returns."
        )
    )]
    SignatureArity {
        pred: String,
        declared: usize,
        produced: usize,
    },

    #[error("duplicate native predicate {key} in assertion \"{assertion}\"")]
    #[diagnostic(
        code(maat::native::duplicate_pred),
        help(
            "Each (name, arity) key may appear once per native assertion. \
             Rename one of the predicates or change its arity."
        )
    )]
    DuplicatePredicate { assertion: String, key: String },
}

// ---------------------------------------------------------------------------
// Mode check errors
// ---------------------------------------------------------------------------

/// Violations found by the static mode check of a submitted assertion.
#[derive(Debug, Error, Diagnostic)]
pub enum ModeError {
    #[error("rule {rule}: assertion reference ?{var} is not bound at its call position")]
    #[diagnostic(
        code(maat::modecheck::unbound_assertion_ref),
        help(
            "A variable assertion reference must be ground by the time its \
             body literal is reached. Move a literal that binds ?{var} \
             earlier in the body, or name the assertion directly."
        )
    )]
    UnboundAssertionRef { rule: String, var: String },

    #[error(
        "rule {rule}: input argument {slot} of native predicate {pred} \
         is unbound variable ?{var}"
    )]
    #[diagnostic(
        code(maat::modecheck::unbound_input),
        help(
            "Every `In` position of a native predicate must be a value or a \
             variable bound by the head or an earlier body literal. Reorder \
             the body or supply a concrete value."
        )
    )]
    UnboundInput {
        rule: String,
        pred: String,
        slot: String,
        var: String,
    },

    #[error("rule {rule}: unknown native assertion :{name}")]
    #[diagnostic(
        code(maat::modecheck::unknown_native_assertion),
        help(
            "No native assertion with this name is installed. Install it \
             before mode-checking rules that reference it."
        )
    )]
    UnknownNativeAssertion { rule: String, name: String },

    #[error("rule {rule}: native assertion :{assertion} has no predicate {key}")]
    #[diagnostic(
        code(maat::modecheck::unknown_native_pred),
        help(
            "Predicates are keyed by name *and* arity, so calling a known \
             name with the wrong number of arguments also lands here. Check \
             the predicate's signature."
        )
    )]
    UnknownNativePredicate {
        rule: String,
        assertion: String,
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_error_converts_to_maat_error() {
        let err = NativeError::DuplicatePredicate {
            assertion: "sys".into(),
            key: "eq/2".into(),
        };
        let maat: MaatError = err.into();
        assert!(matches!(
            maat,
            MaatError::Native(NativeError::DuplicatePredicate { .. })
        ));
    }

    #[test]
    fn error_display_messages_are_descriptive() {
        let err = NativeError::SignatureArity {
            pred: "sum".into(),
            declared: 2,
            produced: 1,
        };
        let msg = format!("{err}");
        assert!(msg.contains("sum"));
        assert!(msg.contains('2'));
        assert!(msg.contains('1'));
    }
}

//! Rule and native assertion databases.
//!
//! A [`Database`] is value-like: a map from principal value to compiled
//! rule [`Assertion`], paired with a map from native assertion name to
//! [`NativeAssertion`]. The two namespaces never overlap — they use
//! different key types and are selected by the tag on the assertion
//! reference. Componentwise right-biased union makes the database a
//! monoid.
//!
//! Tables are insertion-ordered (`IndexMap`), so for a fixed database and
//! query the scheduler visits alternatives in a reproducible order.

use indexmap::IndexMap;

use crate::error::NativeError;
use crate::native::NativePred;
use crate::resolve::{compile_group, CompiledPred};
use crate::term::{PredKey, Rule, Signature, Value};

/// A compiled rule assertion: one compiled predicate per key.
#[derive(Clone, Default)]
pub struct Assertion {
    preds: IndexMap<PredKey, CompiledPred>,
}

impl Assertion {
    /// Compile a rule set: group by predicate key (in first-appearance
    /// order, preserving rule order within a group), then compile each
    /// group.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let mut groups: IndexMap<PredKey, Vec<Rule>> = IndexMap::new();
        for rule in rules {
            groups.entry(rule.head.pred.clone()).or_default().push(rule);
        }
        let preds = groups
            .into_iter()
            .map(|(key, group)| (key, compile_group(group)))
            .collect();
        Self { preds }
    }

    pub fn pred(&self, key: &PredKey) -> Option<&CompiledPred> {
        self.preds.get(key)
    }

    pub fn len(&self) -> usize {
        self.preds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }
}

/// A native assertion: host predicates keyed by `(name, arity)`.
#[derive(Clone)]
pub struct NativeAssertion {
    name: String,
    preds: IndexMap<PredKey, NativePred>,
}

impl std::fmt::Debug for NativeAssertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeAssertion")
            .field("name", &self.name)
            .field("preds", &self.preds)
            .finish()
    }
}

impl NativeAssertion {
    /// Assemble a native assertion, keyed by each predicate's advertised
    /// signature. Two predicates with the same key are a construction
    /// error.
    pub fn new(name: impl Into<String>, preds: Vec<NativePred>) -> Result<Self, NativeError> {
        let name = name.into();
        let mut table = IndexMap::with_capacity(preds.len());
        for pred in preds {
            let key = pred.key().clone();
            if table.insert(key.clone(), pred).is_some() {
                return Err(NativeError::DuplicatePredicate {
                    assertion: name,
                    key: key.to_string(),
                });
            }
        }
        Ok(Self { name, preds: table })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pred(&self, key: &PredKey) -> Option<&NativePred> {
        self.preds.get(key)
    }

    pub fn signature(&self, key: &PredKey) -> Option<&Signature> {
        self.preds.get(key).map(NativePred::signature)
    }

    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.preds.values().map(NativePred::signature)
    }
}

/// The full predicate database consulted during a query. Read-only while
/// a query runs; replaced or updated between queries.
#[derive(Clone, Default)]
pub struct Database {
    rules: IndexMap<Value, Assertion>,
    natives: IndexMap<String, NativeAssertion>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and install a rule assertion, replacing any assertion
    /// previously bound to this principal.
    pub fn install(&mut self, principal: Value, rules: Vec<Rule>) {
        tracing::debug!(principal = %principal, rules = rules.len(), "installing assertion");
        self.rules.insert(principal, Assertion::from_rules(rules));
    }

    /// Remove the assertion bound to a principal. Returns whether one was
    /// present.
    pub fn retract(&mut self, principal: &Value) -> bool {
        self.rules.shift_remove(principal).is_some()
    }

    /// Install a native assertion under its own name.
    pub fn install_native(&mut self, assertion: NativeAssertion) {
        self.natives.insert(assertion.name.clone(), assertion);
    }

    /// Componentwise union; on key collision the entry from `other` wins.
    pub fn merge(mut self, other: Database) -> Database {
        self.rules.extend(other.rules);
        self.natives.extend(other.natives);
        self
    }

    pub fn native_assertion(&self, name: &str) -> Option<&NativeAssertion> {
        self.natives.get(name)
    }

    pub(crate) fn rule_pred(&self, principal: &Value, key: &PredKey) -> Option<CompiledPred> {
        self.rules.get(principal)?.pred(key).cloned()
    }

    pub(crate) fn native_pred(&self, name: &str, key: &PredKey) -> Option<CompiledPred> {
        self.natives
            .get(name)?
            .pred(key)
            .map(NativePred::compiled)
    }
}

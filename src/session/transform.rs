//! Reversible session-name canonicalization
//!
//! tmux rejects `.` and `:` in session names, and project paths are full of
//! them. A `Transformer` is an ordered chain of forward/backward rule pairs:
//! `transform` runs the forward halves first to last, `revert` runs the
//! backward halves last to first.

use std::fmt;
use std::sync::Arc;

type RuleFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A pair of string functions where `backward` undoes `forward`
///
/// The inverse only has to hold on the characters the rule targets.
#[derive(Clone)]
pub struct TransformRule {
    forward: RuleFn,
    backward: RuleFn,
}

impl TransformRule {
    pub fn new<F, B>(forward: F, backward: B) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
        B: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            forward: Arc::new(forward),
            backward: Arc::new(backward),
        }
    }

    /// Substitute every `from` with `to`, and back
    pub fn replace(from: char, to: char) -> Self {
        Self::new(
            move |s| s.replace(from, &to.to_string()),
            move |s| s.replace(to, &from.to_string()),
        )
    }

    pub fn forward(&self, input: &str) -> String {
        (self.forward)(input)
    }

    pub fn backward(&self, input: &str) -> String {
        (self.backward)(input)
    }
}

impl fmt::Debug for TransformRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRule").finish_non_exhaustive()
    }
}

/// Ordered chain of transform rules
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    rules: Vec<TransformRule>,
}

impl Transformer {
    /// Create an empty transformer (identity)
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain tmux needs: `.` -> `_`, then `:` -> `;`
    pub fn tmux_safe() -> Self {
        Self::new()
            .with_rule(TransformRule::replace('.', '_'))
            .with_rule(TransformRule::replace(':', ';'))
    }

    /// Append a rule to the end of the chain
    pub fn with_rule(mut self, rule: TransformRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append several rules, keeping their order
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = TransformRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply forward rules in registration order
    pub fn transform(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |acc, rule| rule.forward(&acc))
    }

    /// Apply backward rules in reverse registration order
    pub fn revert(&self, input: &str) -> String {
        self.rules
            .iter()
            .rev()
            .fold(input.to_string(), |acc, rule| rule.backward(&acc))
    }
}

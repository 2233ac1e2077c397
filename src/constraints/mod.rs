pub mod matchers;

pub use matchers::ValueMatcher;

use crate::errors::{AutomationError, Result};
use std::fmt;
use std::sync::Arc;

/// Read side of an attribute bag: name → value lookups with lazy
/// population. Constraints evaluate against this seam so custom predicates
/// stay independent of the backend element type.
pub trait AttributeLookup {
    fn value(&self, name: &str) -> Result<Option<String>>;
}

type PredicateFn = Arc<dyn Fn(&dyn AttributeLookup) -> Result<bool> + Send + Sync>;

/// Composable, lazily-evaluated predicate over an element's attributes.
///
/// Constraints are pure: evaluating one twice against equivalent bags gives
/// the same answer. `And`/`Or` short-circuit left to right, so the right
/// operand's attribute lookups never run when the left side already decides.
#[derive(Clone)]
pub enum Constraint {
    /// Matches every element.
    Any,
    Attribute {
        name: String,
        matcher: ValueMatcher,
    },
    And(Box<Constraint>, Box<Constraint>),
    Or(Box<Constraint>, Box<Constraint>),
    Not(Box<Constraint>),
    /// Selects the 0-based n-th element among those matching `inner`. Only
    /// the finder interprets this variant, and only as the outermost
    /// wrapper; evaluating it directly is an error.
    Index {
        index: usize,
        inner: Box<Constraint>,
    },
    Predicate {
        label: String,
        test: PredicateFn,
    },
}

impl Constraint {
    pub fn any() -> Self {
        Constraint::Any
    }

    /// Constrain an arbitrary attribute. Names are normalized to lowercase.
    pub fn with_attribute(name: impl Into<String>, matcher: ValueMatcher) -> Self {
        Constraint::Attribute {
            name: name.into().to_ascii_lowercase(),
            matcher,
        }
    }

    pub fn id(value: impl Into<String>) -> Self {
        Self::with_attribute("id", ValueMatcher::exact(value))
    }

    pub fn id_matches(matcher: ValueMatcher) -> Self {
        Self::with_attribute("id", matcher)
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::with_attribute("name", ValueMatcher::exact(value))
    }

    pub fn name_matches(matcher: ValueMatcher) -> Self {
        Self::with_attribute("name", matcher)
    }

    pub fn class_name(value: impl Into<String>) -> Self {
        Self::with_attribute("class", ValueMatcher::exact(value))
    }

    pub fn value(value: impl Into<String>) -> Self {
        Self::with_attribute("value", ValueMatcher::exact(value))
    }

    pub fn title(value: impl Into<String>) -> Self {
        Self::with_attribute("title", ValueMatcher::exact(value))
    }

    pub fn alt(value: impl Into<String>) -> Self {
        Self::with_attribute("alt", ValueMatcher::exact(value))
    }

    /// Match on the element's visible text.
    pub fn text(value: impl Into<String>) -> Self {
        Self::with_attribute("text", ValueMatcher::exact(value))
    }

    pub fn text_matches(matcher: ValueMatcher) -> Self {
        Self::with_attribute("text", matcher)
    }

    /// Match a link target by parsed-URL equality.
    pub fn url(value: &str) -> Result<Self> {
        Ok(Self::with_attribute("href", ValueMatcher::url(value)?))
    }

    /// Arbitrary predicate over the attribute bag. The label shows up in
    /// diagnostics and `NoElementFound` messages.
    pub fn predicate(
        label: impl Into<String>,
        test: impl Fn(&dyn AttributeLookup) -> Result<bool> + Send + Sync + 'static,
    ) -> Self {
        Constraint::Predicate {
            label: label.into(),
            test: Arc::new(test),
        }
    }

    /// The n-th element of the collection (0-based), regardless of other
    /// attributes.
    pub fn nth(index: usize) -> Self {
        Constraint::Index {
            index,
            inner: Box::new(Constraint::Any),
        }
    }

    pub fn and(self, other: Constraint) -> Self {
        Constraint::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Constraint) -> Self {
        Constraint::Or(Box::new(self), Box::new(other))
    }

    pub fn not(self) -> Self {
        Constraint::Not(Box::new(self))
    }

    /// Wrap this constraint so that only its n-th match (0-based) is
    /// returned by a find.
    pub fn at_index(self, index: usize) -> Self {
        Constraint::Index {
            index,
            inner: Box::new(self),
        }
    }

    /// Evaluate against one element's attribute bag.
    ///
    /// A missing attribute matches no matcher and is never an error. An
    /// `Index` node anywhere in the evaluated tree fails with
    /// `InvalidConstraint`: index selection is an ordered-sequence concern
    /// that only the finder can interpret, so nesting it under a boolean
    /// operator is rejected rather than silently resolved.
    pub fn matches(&self, bag: &dyn AttributeLookup) -> Result<bool> {
        match self {
            Constraint::Any => Ok(true),
            Constraint::Attribute { name, matcher } => Ok(bag
                .value(name)?
                .map(|value| matcher.matches(&value))
                .unwrap_or(false)),
            Constraint::And(left, right) => Ok(left.matches(bag)? && right.matches(bag)?),
            Constraint::Or(left, right) => Ok(left.matches(bag)? || right.matches(bag)?),
            Constraint::Not(inner) => Ok(!inner.matches(bag)?),
            Constraint::Index { .. } => Err(AutomationError::InvalidConstraint(
                "an index constraint is only valid as the outermost wrapper of a find".to_string(),
            )),
            Constraint::Predicate { test, .. } => test(bag),
        }
    }

    /// Split off an outermost `Index` wrapper, if present.
    pub(crate) fn peel_index(&self) -> (Option<usize>, &Constraint) {
        match self {
            Constraint::Index { index, inner } => (Some(*index), inner.as_ref()),
            other => (None, other),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Any => write!(f, "any element"),
            Constraint::Attribute { name, matcher } => write!(f, "{} {}", name, matcher),
            Constraint::And(left, right) => write!(f, "({} and {})", left, right),
            Constraint::Or(left, right) => write!(f, "({} or {})", left, right),
            Constraint::Not(inner) => write!(f, "not {}", inner),
            Constraint::Index { index, inner } => write!(f, "match #{} of {}", index, inner),
            Constraint::Predicate { label, .. } => write!(f, "<{}>", label),
        }
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constraint({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MapBag(HashMap<String, String>);

    impl MapBag {
        fn of(pairs: &[(&str, &str)]) -> Self {
            Self(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            )
        }
    }

    impl AttributeLookup for MapBag {
        fn value(&self, name: &str) -> Result<Option<String>> {
            Ok(self.0.get(name).cloned())
        }
    }

    #[test]
    fn attribute_constraint_matches_value() {
        let bag = MapBag::of(&[("id", "login")]);
        assert!(Constraint::id("login").matches(&bag).unwrap());
        assert!(!Constraint::id("logout").matches(&bag).unwrap());
    }

    #[test]
    fn missing_attribute_is_no_match_not_an_error() {
        let bag = MapBag::of(&[]);
        assert!(!Constraint::id("login").matches(&bag).unwrap());
        // absence is distinguishable from the empty string
        assert!(!Constraint::with_attribute("id", ValueMatcher::exact(""))
            .matches(&bag)
            .unwrap());
    }

    #[test]
    fn and_equals_both_operands() {
        let bag = MapBag::of(&[("id", "login"), ("name", "user")]);
        let left = Constraint::id("login");
        let right = Constraint::name("user");
        let both = left.matches(&bag).unwrap() && right.matches(&bag).unwrap();
        assert_eq!(left.and(right).matches(&bag).unwrap(), both);
    }

    #[test]
    fn and_short_circuits_right_operand() {
        let bag = MapBag::of(&[]);
        let evaluations = Arc::new(AtomicUsize::new(0));
        let counter = evaluations.clone();
        let right = Constraint::predicate("counting", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        });
        let constraint = Constraint::id("absent").and(right);
        assert!(!constraint.matches(&bag).unwrap());
        assert_eq!(evaluations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn or_short_circuits_right_operand() {
        let bag = MapBag::of(&[("id", "login")]);
        let evaluations = Arc::new(AtomicUsize::new(0));
        let counter = evaluations.clone();
        let right = Constraint::predicate("counting", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        });
        let constraint = Constraint::id("login").or(right);
        assert!(constraint.matches(&bag).unwrap());
        assert_eq!(evaluations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn not_inverts() {
        let bag = MapBag::of(&[("id", "login")]);
        assert!(!Constraint::id("login").not().matches(&bag).unwrap());
        assert!(Constraint::id("logout").not().matches(&bag).unwrap());
    }

    #[test]
    fn evaluation_is_repeatable() {
        let bag = MapBag::of(&[("name", "q")]);
        let constraint = Constraint::name("q").or(Constraint::id("search"));
        assert_eq!(
            constraint.matches(&bag).unwrap(),
            constraint.matches(&bag).unwrap()
        );
    }

    #[test]
    fn index_outside_a_find_is_invalid() {
        let bag = MapBag::of(&[]);
        let err = Constraint::nth(2).matches(&bag).unwrap_err();
        assert!(matches!(err, AutomationError::InvalidConstraint(_)));
    }

    #[test]
    fn index_nested_under_or_is_invalid() {
        let bag = MapBag::of(&[("id", "login")]);
        let nested = Constraint::id("login").or(Constraint::nth(1));
        // the left side matches first, so the index is never reached
        assert!(nested.matches(&bag).unwrap());
        let reached = Constraint::id("absent").or(Constraint::nth(1));
        assert!(matches!(
            reached.matches(&bag).unwrap_err(),
            AutomationError::InvalidConstraint(_)
        ));
    }

    #[test]
    fn peel_index_strips_one_layer() {
        let constraint = Constraint::name("q").at_index(3);
        let (index, inner) = constraint.peel_index();
        assert_eq!(index, Some(3));
        assert!(matches!(inner, Constraint::Attribute { .. }));

        let plain = Constraint::name("q");
        assert_eq!(plain.peel_index().0, None);
    }

    #[test]
    fn display_describes_the_tree() {
        let constraint = Constraint::id("login").and(Constraint::name("user").not());
        assert_eq!(format!("{}", constraint), "(id = 'login' and not name = 'user')");
    }
}

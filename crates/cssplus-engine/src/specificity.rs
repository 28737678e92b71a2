//! [Selectors 4 § 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
//! and the declaration comparator used by the cascade.

use core::cmp::Ordering;

use cssplus_css::{Selector, SelectorComponent};

/// "A selector's specificity is calculated for a given element as follows:
///  - count the number of ID selectors in the selector (= A)
///  - count the number of class selectors, attributes selectors, and pseudo-classes in the selector (= B)
///  - count the number of type selectors and pseudo-elements in the selector (= C)
///
/// Specificities are compared by comparing the three components in order."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Walk the selector once. Custom pseudo-elements and pseudo-classes
    /// count like native ones.
    #[must_use]
    pub fn of(selector: &Selector) -> Self {
        selector
            .components
            .iter()
            .fold(Self::default(), |Self(a, b, c), component| match component {
                SelectorComponent::Id(_) => Self(a + 1, b, c),
                SelectorComponent::Class(_)
                | SelectorComponent::Attribute(_)
                | SelectorComponent::PseudoClass { .. } => Self(a, b + 1, c),
                SelectorComponent::Type(_) | SelectorComponent::PseudoElement { .. } => {
                    Self(a, b, c + 1)
                }
                SelectorComponent::Universal | SelectorComponent::Combinator(_) => Self(a, b, c),
            })
    }
}

/// The cascade-relevant part of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Precedence {
    /// Whether the declaration is `!important`.
    pub important: bool,
    /// Specificity of the selector that led to it.
    pub specificity: Specificity,
}

/// [CSS Cascade 4 § 6.1 Cascade Sorting Order](https://www.w3.org/TR/css-cascade-4/#cascade-sort)
///
/// Importance first, then specificity. Equal precedence compares equal, so
/// a stable ascending sort keeps source order among ties and the last
/// element is the winner.
#[must_use]
pub fn compare(a: &Precedence, b: &Precedence) -> Ordering {
    a.important
        .cmp(&b.important)
        .then_with(|| a.specificity.cmp(&b.specificity))
}

/// Stable-sort `items` by precedence and return them; the winner is last.
pub fn sort_by_precedence<T>(items: &mut [T], precedence: impl Fn(&T) -> Precedence) {
    items.sort_by(|a, b| compare(&precedence(a), &precedence(b)));
}

#[cfg(test)]
mod tests {
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use super::*;

    fn specificity_of(text: &str) -> Specificity {
        Selector::parse_str(text).map(|s| Specificity::of(&s)).unwrap_or_default()
    }

    #[test]
    fn test_specificity_counts() {
        assert_eq!(specificity_of("*"), Specificity(0, 0, 0));
        assert_eq!(specificity_of("li"), Specificity(0, 0, 1));
        assert_eq!(specificity_of("ul li"), Specificity(0, 0, 2));
        assert_eq!(specificity_of("#x .y[z]:first-child"), Specificity(1, 3, 0));
        assert_eq!(specificity_of("div::after(1)::before"), Specificity(0, 0, 3));
        assert_eq!(specificity_of("section::for-each(1, child, 'p'):has(.note)"), Specificity(0, 1, 2));
    }

    #[test]
    fn test_important_beats_specificity() {
        let weak_important = Precedence {
            important: true,
            specificity: Specificity(0, 0, 1),
        };
        let strong = Precedence {
            important: false,
            specificity: Specificity(5, 0, 0),
        };
        assert_eq!(compare(&weak_important, &strong), Ordering::Greater);
        assert_eq!(compare(&strong, &weak_important), Ordering::Less);
    }

    #[test]
    fn test_ties_keep_source_order() {
        let p = Precedence::default();
        let mut items = vec![(p, "first"), (p, "second")];
        sort_by_precedence(&mut items, |(p, _)| *p);
        assert_eq!(items.last().map(|(_, name)| *name), Some("second"));
    }

    #[derive(Debug, Clone, Copy)]
    struct Arb(Precedence);

    impl Arbitrary for Arb {
        fn arbitrary(g: &mut Gen) -> Self {
            // Small ranges so that ties actually happen.
            let small = |g: &mut Gen| u32::from(u8::arbitrary(g) % 3);
            Self(Precedence {
                important: bool::arbitrary(g),
                specificity: Specificity(small(g), small(g), small(g)),
            })
        }
    }

    #[quickcheck]
    fn prop_compare_is_antisymmetric(a: Arb, b: Arb) -> bool {
        compare(&a.0, &b.0) == compare(&b.0, &a.0).reverse()
    }

    #[quickcheck]
    fn prop_compare_is_transitive(a: Arb, b: Arb, c: Arb) -> bool {
        let (a, b, c) = (a.0, b.0, c.0);
        !(compare(&a, &b) != Ordering::Greater && compare(&b, &c) != Ordering::Greater)
            || compare(&a, &c) != Ordering::Greater
    }

    #[quickcheck]
    fn prop_sort_then_take_last_is_idempotent(items: Vec<Arb>) -> bool {
        let mut once: Vec<(usize, Precedence)> = items.iter().map(|a| a.0).enumerate().collect();
        sort_by_precedence(&mut once, |(_, p)| *p);
        let mut twice = once.clone();
        sort_by_precedence(&mut twice, |(_, p)| *p);
        once == twice && once.last() == twice.last()
    }

    #[quickcheck]
    fn prop_important_dominates(a: Arb, b: Arb) -> bool {
        let important = Precedence {
            important: true,
            ..a.0
        };
        let normal = Precedence {
            important: false,
            ..b.0
        };
        compare(&important, &normal) == Ordering::Greater
    }
}

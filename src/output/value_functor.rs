//! Ordering functors over [`OutputVector`]s.
//!
//! A [`ValueFunctor`] ranks vectors by a list of priorities first, then by a weighted sum.
//! A [`FoodAwareOrder`] wraps a value functor and makes food the dominant key,
//! which is the order the city optimiser sorts its plots by.

use std::cmp::Ordering;

use arrayvec::ArrayVec;

use super::OutputVector;

/// The maximum number of priorities in a [`ValueFunctor`], one per [`super::OutputType`].
pub const MAX_PRIORITIES: usize = 6;

/// An output dimension which must be compared before the weighted sum.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OutputPriority<K> {
    pub output: K,
    /// When `true`, less of this output is better.
    pub fewer_is_better: bool,
}

impl<K> OutputPriority<K> {
    pub const fn more(output: K) -> Self {
        Self {
            output,
            fewer_is_better: false,
        }
    }

    pub const fn fewer(output: K) -> Self {
        Self {
            output,
            fewer_is_better: true,
        }
    }
}

/// Ranks output vectors by priorities, then by a weighted sum.
///
/// [`ValueFunctor::compare`] returns [`Ordering::Greater`] when the first vector is the better one,
/// so sorting best-first is `sort_by(|a, b| functor.compare(b, a))`.
#[derive(Clone, PartialEq, Debug)]
pub struct ValueFunctor<T: OutputVector> {
    /// Compared most-significant-first. The first unequal dimension decides.
    pub priorities: ArrayVec<OutputPriority<T::Kind>, MAX_PRIORITIES>,
    /// Used to scalarize the vectors when the priorities do not decide.
    pub weights: T,
}

impl<T: OutputVector> ValueFunctor<T> {
    /// Creates a functor. Priorities beyond [`MAX_PRIORITIES`] are ignored.
    pub fn new(priorities: impl IntoIterator<Item = OutputPriority<T::Kind>>, weights: T) -> Self {
        Self {
            priorities: priorities.into_iter().take(MAX_PRIORITIES).collect(),
            weights,
        }
    }

    /// Creates a functor without priorities, only the weighted sum decides.
    pub fn weighted(weights: T) -> Self {
        Self::new([], weights)
    }

    /// Creates a functor which puts `output` first, then falls back to `weights`.
    pub fn emphasising(output: T::Kind, weights: T) -> Self {
        Self::new([OutputPriority::more(output)], weights)
    }

    /// Returns the weighted value of `output`.
    pub fn value(&self, output: &T) -> i64 {
        output.dot(&self.weights)
    }

    /// Compares two vectors, [`Ordering::Greater`] means `a` is better than `b`.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        for priority in &self.priorities {
            let ordering = a.get(priority.output).cmp(&b.get(priority.output));
            if ordering != Ordering::Equal {
                return if priority.fewer_is_better {
                    ordering.reverse()
                } else {
                    ordering
                };
            }
        }
        self.value(a).cmp(&self.value(b))
    }

    /// Returns `true` if `a` is strictly better than `b`. Ties are never better.
    pub fn is_better(&self, a: &T, b: &T) -> bool {
        self.compare(a, b) == Ordering::Greater
    }
}

/// Which end of the food scale a [`FoodAwareOrder`] prefers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FoodDirection {
    /// More food is better. Used for the initial assignment and deficit correction.
    MostFood,
    /// Less food is better. Used for excess trimming.
    LeastFood,
}

/// Wraps a [`ValueFunctor`] so that food becomes the dominant key.
///
/// When both vectors are below the subsistence threshold (the food one citizen eats) and
/// `ignore_below_subsistence` is set, their food difference is ignored and the value functor decides.
/// This keeps the sort from fixating on `0.5` food between two poor plots when their production
/// or commerce differs a lot more.
#[derive(Clone, Copy, Debug)]
pub struct FoodAwareOrder<'a, T: OutputVector> {
    pub value_functor: &'a ValueFunctor<T>,
    pub subsistence: i32,
    pub ignore_below_subsistence: bool,
    pub direction: FoodDirection,
}

impl<'a, T: OutputVector> FoodAwareOrder<'a, T> {
    pub fn new(value_functor: &'a ValueFunctor<T>, subsistence: i32, direction: FoodDirection) -> Self {
        Self {
            value_functor,
            subsistence,
            ignore_below_subsistence: true,
            direction,
        }
    }

    /// Returns a copy of this order which always respects food differences.
    pub fn relaxed(self) -> Self {
        Self {
            ignore_below_subsistence: false,
            ..self
        }
    }

    /// Returns `true` if a food difference between `a_food` and `b_food` must not influence the order.
    pub fn ignores_food_difference(&self, a_food: i32, b_food: i32) -> bool {
        self.ignore_below_subsistence && a_food < self.subsistence && b_food < self.subsistence
    }

    /// Compares two vectors, [`Ordering::Greater`] means `a` is better than `b`.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        let (a_food, b_food) = (a.food(), b.food());
        if a_food != b_food && !self.ignores_food_difference(a_food, b_food) {
            return match self.direction {
                FoodDirection::MostFood => a_food.cmp(&b_food),
                FoodDirection::LeastFood => b_food.cmp(&a_food),
            };
        }
        self.value_functor.compare(a, b)
    }
}

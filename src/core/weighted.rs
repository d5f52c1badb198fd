/// Weighted random selection over a fixed list of labelled members.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::ops::Add;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightedError {
    #[error("cannot sample from an empty weighted set")]
    Empty,
    #[error("invalid weights: {0}")]
    InvalidWeights(String),
}

/// A set in which every member carries a weight used for random selection.
///
/// Members and weights are kept in parallel, in insertion order. Labels need
/// not be unique; a duplicated label is simply more likely to be picked.
/// Sampling is with replacement and proportional to weight.
///
/// Serialized as a list of `(label, weight)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "Vec<(T, f64)>",
    into = "Vec<(T, f64)>",
    bound(serialize = "T: Serialize + Clone", deserialize = "T: Deserialize<'de>")
)]
pub struct WeightedSet<T> {
    members: Vec<T>,
    weights: Vec<f64>,
}

impl<T> Default for WeightedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WeightedSet<T> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            weights: Vec::new(),
        }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (T, f64)>) -> Self {
        let mut set = Self::new();
        for (member, weight) in pairs {
            set.push(member, weight);
        }
        set
    }

    pub fn push(&mut self, member: T, weight: f64) {
        self.members.push(member);
        self.weights.push(weight);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[T] {
        &self.members
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
        self.members.iter().zip(self.weights.iter().copied())
    }

    /// Pick one member with probability proportional to its weight.
    ///
    /// Sampling an empty set is a usage error and reported as
    /// [`WeightedError::Empty`]. Weights that are negative, non-finite or
    /// all zero are rejected by the underlying distribution.
    pub fn random(&self, rng: &mut StdRng) -> Result<&T, WeightedError> {
        if self.members.is_empty() {
            return Err(WeightedError::Empty);
        }
        let dist = WeightedIndex::new(&self.weights)
            .map_err(|e| WeightedError::InvalidWeights(e.to_string()))?;
        Ok(&self.members[dist.sample(rng)])
    }
}

impl<T> From<Vec<(T, f64)>> for WeightedSet<T> {
    fn from(pairs: Vec<(T, f64)>) -> Self {
        Self::from_pairs(pairs)
    }
}

impl<T> From<WeightedSet<T>> for Vec<(T, f64)> {
    fn from(set: WeightedSet<T>) -> Self {
        set.members.into_iter().zip(set.weights).collect()
    }
}

/// Concatenation: members of `rhs` follow members of `self`, duplicates kept.
impl<T> Add for WeightedSet<T> {
    type Output = WeightedSet<T>;

    fn add(mut self, rhs: WeightedSet<T>) -> WeightedSet<T> {
        self.members.extend(rhs.members);
        self.weights.extend(rhs.weights);
        self
    }
}

/// Build a set from plain terms sharing one weight.
///
/// With `blank`, an empty-string member of weight 1.0 is placed first, which
/// makes whatever slot samples this set optional.
pub fn equal_weights<S: Into<String>>(
    terms: impl IntoIterator<Item = S>,
    weight: f64,
    blank: bool,
) -> WeightedSet<String> {
    let set = WeightedSet::from_pairs(terms.into_iter().map(|t| (t.into(), weight)));
    if blank {
        WeightedSet::from_pairs([(String::new(), 1.0)]) + set
    } else {
        set
    }
}

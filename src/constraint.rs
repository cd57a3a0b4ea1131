//! Validation predicates attached to value sites.
//!
//! Constraints ride the `value_with` helpers of the packer protocol: writers
//! treat them as advisory, readers validate the decoded value and record a
//! `constraint violation` failure when it does not hold. Constraints are not
//! part of the schema token stream; they bind to visit sites.

use crate::impls::Binary;
use std::collections::{BTreeMap, HashMap};

/// A validation predicate for a single value site.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Inclusive numeric range.
    Range {
        /// Smallest permitted value.
        lower: f64,
        /// Largest permitted value.
        upper: f64,
    },
    /// Exact element count for containers and binaries.
    Length {
        /// Required number of elements.
        length: usize,
        /// Element size in bytes for binaries; zero or one for opaque bytes
        /// and ordinary containers.
        element_size: usize,
    },
    /// Declares that a map's entries are ascending by key.
    Ordered,
}

impl Constraint {
    /// Inclusive numeric range constraint.
    pub fn range(lower: f64, upper: f64) -> Self {
        Self::Range { lower, upper }
    }

    /// Exact-length constraint for a container of `length` elements.
    pub fn length(length: usize) -> Self {
        Self::Length {
            length,
            element_size: 0,
        }
    }

    /// Exact-length constraint for a packed binary of `length` elements of
    /// `element_size` bytes each.
    pub fn strided_length(length: usize, element_size: usize) -> Self {
        Self::Length {
            length,
            element_size,
        }
    }
}

/// Values that can check themselves against a [`Constraint`].
///
/// A constraint kind that does not apply to the implementing type validates
/// trivially.
pub trait Validate {
    /// Returns whether the value satisfies the constraint.
    fn validate(&self, constraint: &Constraint) -> bool;
}

macro_rules! validate_numeric {
    ($($t:ty),*) => {
        $(
            impl Validate for $t {
                fn validate(&self, constraint: &Constraint) -> bool {
                    match constraint {
                        Constraint::Range { lower, upper } => {
                            let v = *self as f64;
                            *lower <= v && v <= *upper
                        }
                        _ => true,
                    }
                }
            }
        )*
    };
}

validate_numeric!(i32, i64, u32, u64, f32, f64);

impl Validate for bool {
    fn validate(&self, _constraint: &Constraint) -> bool {
        true
    }
}

impl Validate for String {
    fn validate(&self, constraint: &Constraint) -> bool {
        match constraint {
            Constraint::Length { length, .. } => self.len() == *length,
            _ => true,
        }
    }
}

impl<T> Validate for Vec<T> {
    fn validate(&self, constraint: &Constraint) -> bool {
        match constraint {
            Constraint::Length { length, .. } => self.len() == *length,
            _ => true,
        }
    }
}

impl<T> Validate for Option<T>
where
    T: Validate,
{
    fn validate(&self, constraint: &Constraint) -> bool {
        match self {
            Some(value) => value.validate(constraint),
            None => true,
        }
    }
}

impl Validate for Binary {
    fn validate(&self, constraint: &Constraint) -> bool {
        match constraint {
            Constraint::Length {
                length,
                element_size,
            } => self.0.len() == *length * (*element_size).max(1),
            _ => true,
        }
    }
}

impl<K, V> Validate for HashMap<K, V> {
    fn validate(&self, constraint: &Constraint) -> bool {
        match constraint {
            Constraint::Length { length, .. } => self.len() == *length,
            _ => true,
        }
    }
}

impl<K, V> Validate for BTreeMap<K, V> {
    // Ordered holds by construction for a BTreeMap.
    fn validate(&self, constraint: &Constraint) -> bool {
        match constraint {
            Constraint::Length { length, .. } => self.len() == *length,
            _ => true,
        }
    }
}

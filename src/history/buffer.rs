//! Fixed-capacity, insertion-ordered, thread-safe buffer.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;

/// Errors returned by history queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The lower bound of a range query was above its upper bound.
    #[error("invalid range: lower bound {min} is greater than upper bound {max}")]
    InvalidRange { min: String, max: String },
}

/// Elements that can be selected by a range query.
///
/// Plain numbers key on themselves; probe samples key on their timestamp.
pub trait Keyed {
    type Key: PartialOrd + Copy + std::fmt::Debug;

    fn key(&self) -> Self::Key;
}

macro_rules! impl_keyed_for_numbers {
    ($($t:ty),*) => {
        $(
            impl Keyed for $t {
                type Key = $t;

                fn key(&self) -> $t {
                    *self
                }
            }
        )*
    };
}

impl_keyed_for_numbers!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

/// A bounded FIFO history.
///
/// When an element is added at capacity the oldest one is evicted. A buffer
/// of capacity zero stays empty forever.
#[derive(Debug)]
pub struct HistoryBuffer<T> {
    capacity: usize,
    inner: RwLock<Ring<T>>,
}

#[derive(Debug)]
struct Ring<T> {
    items: VecDeque<T>,
    /// Elements ever added; the sequence number of the newest element.
    added: u64,
}

impl<T: Clone> HistoryBuffer<T> {
    /// Create an empty buffer holding at most `capacity` elements.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: RwLock::new(Ring {
                items: VecDeque::with_capacity(capacity),
                added: 0,
            }),
        }
    }

    /// Maximum number of retained elements.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one element, evicting the oldest when full.
    pub fn add(&self, value: T) {
        if self.capacity == 0 {
            return;
        }

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.items.len() == self.capacity {
            inner.items.pop_front();
        }
        inner.items.push_back(value);
        inner.added += 1;
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recently added element.
    pub fn latest(&self) -> Option<T> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .back()
            .cloned()
    }

    /// Ordered copy of every stored element, oldest first.
    pub fn to_vec(&self) -> Vec<T> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .iter()
            .cloned()
            .collect()
    }

    /// Retained elements added after sequence number `seq`, oldest first,
    /// with the sequence number of the newest element.
    ///
    /// Sequence numbers count additions, so they keep growing regardless of
    /// element keys. Elements already evicted are not returned.
    pub fn since(&self, seq: u64) -> (u64, Vec<T>) {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let fresh = inner.added.saturating_sub(seq);
        let skip = (inner.items.len() as u64).saturating_sub(fresh) as usize;
        (inner.added, inner.items.iter().skip(skip).cloned().collect())
    }
}

impl<T: Clone + Keyed> HistoryBuffer<T> {
    /// Ordered copy of the elements whose key lies within `[min, max]`.
    ///
    /// Elements outside the bound are dropped. Fails when `min > max` or the
    /// bounds are not comparable.
    pub fn range(&self, min: T::Key, max: T::Key) -> Result<Vec<T>, HistoryError> {
        match min.partial_cmp(&max) {
            Some(Ordering::Less) | Some(Ordering::Equal) => {}
            _ => {
                return Err(HistoryError::InvalidRange {
                    min: format!("{:?}", min),
                    max: format!("{:?}", max),
                })
            }
        }

        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .items
            .iter()
            .filter(|item| {
                let key = item.key();
                key >= min && key <= max
            })
            .cloned()
            .collect())
    }
}

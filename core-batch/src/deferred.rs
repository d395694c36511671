//! Single-assignment result cells.
//!
//! A [`Deferred`] is created unsettled together with exactly one
//! [`Settler`]. Settling consumes the settler, so a cell can only ever be
//! settled once. Transformations attached with [`Deferred::map`],
//! [`Deferred::and_then`], [`Deferred::or_else`] and friends run at
//! settlement time, on the thread that settles the cell; if the cell is
//! already settled they run immediately.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::error;

use crate::error::BatchError;

type Continuation<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

enum Slot<T, E> {
    Pending(Option<Continuation<T, E>>),
    Settled(Result<T, E>),
    /// The result was handed on to a continuation or taken by the caller.
    Consumed,
}

/// Handle to a result that becomes available after a drain cycle.
pub struct Deferred<T, E = BatchError> {
    slot: Arc<Mutex<Slot<T, E>>>,
}

/// The write side of a [`Deferred`].
pub struct Settler<T, E = BatchError> {
    slot: Arc<Mutex<Slot<T, E>>>,
}

impl<T, E> Deferred<T, E> {
    /// Create an unsettled cell and the settler that completes it.
    pub fn pending() -> (Self, Settler<T, E>) {
        let slot = Arc::new(Mutex::new(Slot::Pending(None)));
        (
            Self {
                slot: Arc::clone(&slot),
            },
            Settler { slot },
        )
    }

    pub fn settled(result: Result<T, E>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Settled(result))),
        }
    }

    pub fn resolved(value: T) -> Self {
        Self::settled(Ok(value))
    }

    pub fn rejected(error: E) -> Self {
        Self::settled(Err(error))
    }

    pub fn is_settled(&self) -> bool {
        matches!(*self.slot.lock(), Slot::Settled(_))
    }

    /// Take the result if the cell has settled.
    pub fn try_take(self) -> Option<Result<T, E>> {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Consumed) {
            Slot::Settled(result) => Some(result),
            other => {
                *slot = other;
                None
            }
        }
    }
}

impl<T, E> Deferred<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Run `f` with the result once the cell settles.
    pub fn on_settle<F>(self, f: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Consumed) {
            Slot::Pending(None) => *slot = Slot::Pending(Some(Box::new(f))),
            Slot::Settled(result) => {
                drop(slot);
                f(result);
            }
            other => {
                *slot = other;
                error!("Continuation attached to a consumed deferred; dropping it");
            }
        }
    }

    /// Derive a new cell from the settled result.
    pub fn then<U, E2, F>(self, f: F) -> Deferred<U, E2>
    where
        U: Send + 'static,
        E2: Send + 'static,
        F: FnOnce(Result<T, E>) -> Result<U, E2> + Send + 'static,
    {
        let (next, settler) = Deferred::pending();
        self.on_settle(move |result| settler.settle(f(result)));
        next
    }

    pub fn map<U, F>(self, f: F) -> Deferred<U, E>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.then(move |result| result.map(f))
    }

    pub fn and_then<U, F>(self, f: F) -> Deferred<U, E>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        self.then(move |result| result.and_then(f))
    }

    pub fn map_err<E2, F>(self, f: F) -> Deferred<T, E2>
    where
        E2: Send + 'static,
        F: FnOnce(E) -> E2 + Send + 'static,
    {
        self.then(move |result| result.map_err(f))
    }

    /// Attach a recovery step; it may turn the error into a value or into a
    /// different error.
    pub fn or_else<F>(self, f: F) -> Deferred<T, E>
    where
        F: FnOnce(E) -> Result<T, E> + Send + 'static,
    {
        self.then(move |result| result.or_else(f))
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.slot.lock() {
            Slot::Pending(_) => "pending",
            Slot::Settled(Ok(_)) => "resolved",
            Slot::Settled(Err(_)) => "rejected",
            Slot::Consumed => "consumed",
        };
        f.debug_struct("Deferred").field("state", &state).finish()
    }
}

impl<T, E> Settler<T, E> {
    pub fn settle(self, result: Result<T, E>) {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Consumed) {
            Slot::Pending(Some(continuation)) => {
                drop(slot);
                continuation(result);
            }
            Slot::Pending(None) => *slot = Slot::Settled(result),
            other => {
                *slot = other;
                debug_assert!(false, "deferred settled twice");
                error!("Deferred settled twice; keeping the first result");
            }
        }
    }

    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    pub fn reject(self, error: E) {
        self.settle(Err(error));
    }
}

impl<T, E> fmt::Debug for Settler<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler").finish_non_exhaustive()
    }
}

/// Failure handler that forwards the error unchanged.
pub fn propagate<T, E>(error: E) -> Result<T, E> {
    Err(error)
}

/// A shape of outstanding cells that [`BatchCollector::flush`] can wait for.
///
/// The output mirrors the input: a `Vec` of cells yields a `Vec` of values,
/// a map of cells yields a map of values. The first rejection wins.
///
/// [`BatchCollector::flush`]: crate::BatchCollector::flush
pub trait Outstanding {
    type Output;
    type Error;

    fn collect(self) -> Result<Self::Output, Self::Error>;
}

impl Outstanding for () {
    type Output = ();
    type Error = BatchError;

    fn collect(self) -> Result<(), BatchError> {
        Ok(())
    }
}

impl<T, E> Outstanding for Deferred<T, E>
where
    E: From<BatchError>,
{
    type Output = T;
    type Error = E;

    fn collect(self) -> Result<T, E> {
        self.try_take()
            .unwrap_or_else(|| Err(E::from(BatchError::Unsettled)))
    }
}

impl<T, E> Outstanding for Vec<Deferred<T, E>>
where
    E: From<BatchError>,
{
    type Output = Vec<T>;
    type Error = E;

    fn collect(self) -> Result<Vec<T>, E> {
        self.into_iter().map(Outstanding::collect).collect()
    }
}

impl<K, T, E> Outstanding for HashMap<K, Deferred<T, E>>
where
    K: Eq + Hash,
    E: From<BatchError>,
{
    type Output = HashMap<K, T>;
    type Error = E;

    fn collect(self) -> Result<HashMap<K, T>, E> {
        self.into_iter()
            .map(|(key, deferred)| Outstanding::collect(deferred).map(|value| (key, value)))
            .collect()
    }
}

impl<K, T, E> Outstanding for BTreeMap<K, Deferred<T, E>>
where
    K: Ord,
    E: From<BatchError>,
{
    type Output = BTreeMap<K, T>;
    type Error = E;

    fn collect(self) -> Result<BTreeMap<K, T>, E> {
        self.into_iter()
            .map(|(key, deferred)| Outstanding::collect(deferred).map(|value| (key, value)))
            .collect()
    }
}

impl<A, B> Outstanding for (A, B)
where
    A: Outstanding,
    B: Outstanding<Error = A::Error>,
{
    type Output = (A::Output, B::Output);
    type Error = A::Error;

    fn collect(self) -> Result<Self::Output, Self::Error> {
        Ok((self.0.collect()?, self.1.collect()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_before_attaching() {
        let (deferred, settler) = Deferred::<u32>::pending();
        settler.resolve(20);

        let doubled = deferred.map(|v| v * 2);
        assert_eq!(doubled.try_take(), Some(Ok(40)));
    }

    #[test]
    fn test_attach_before_settling() {
        let (deferred, settler) = Deferred::<u32>::pending();
        let chained = deferred.map(|v| v + 1).and_then(|v| Ok(v.to_string()));
        assert!(!chained.is_settled());

        settler.resolve(41);
        assert_eq!(chained.try_take(), Some(Ok("42".to_string())));
    }

    #[test]
    fn test_or_else_recovers() {
        let recovered =
            Deferred::<u32>::rejected(BatchError::NotFound).or_else(|_| Ok(0));
        assert_eq!(recovered.try_take(), Some(Ok(0)));

        let remapped = Deferred::<u32>::rejected(BatchError::NotFound)
            .or_else(|_| Err(BatchError::Decode("remapped".to_string())));
        assert_eq!(
            remapped.try_take(),
            Some(Err(BatchError::Decode("remapped".to_string())))
        );
    }

    #[test]
    fn test_and_then_skips_on_rejection() {
        let deferred = Deferred::<u32>::rejected(BatchError::NotFound)
            .and_then(|_| -> Result<u32, BatchError> { panic!("must not run") });
        assert_eq!(deferred.try_take(), Some(Err(BatchError::NotFound)));
    }

    #[test]
    fn test_dropped_settler_is_unsettled() {
        let (deferred, settler) = Deferred::<u32>::pending();
        drop(settler);
        assert_eq!(deferred.collect(), Err(BatchError::Unsettled));
    }

    #[test]
    fn test_collect_shapes() {
        let list = vec![Deferred::<u32>::resolved(1), Deferred::resolved(2)];
        assert_eq!(Outstanding::collect(list), Ok(vec![1, 2]));

        let mut map = HashMap::new();
        map.insert("a", Deferred::<u32>::resolved(1));
        map.insert("b", Deferred::resolved(2));
        let values = Outstanding::collect(map).unwrap();
        assert_eq!(values.get("a"), Some(&1));
        assert_eq!(values.get("b"), Some(&2));

        let pair = (
            Deferred::<u8>::resolved(1),
            vec![Deferred::<&str>::resolved("x")],
        );
        assert_eq!(pair.collect(), Ok((1u8, vec!["x"])));
    }

    #[test]
    fn test_collect_short_circuits_on_rejection() {
        let list = vec![
            Deferred::<u32>::resolved(1),
            Deferred::rejected(BatchError::NotFound),
        ];
        assert_eq!(Outstanding::collect(list), Err(BatchError::NotFound));
    }

    #[test]
    fn test_debug_reports_state() {
        let (deferred, settler) = Deferred::<u32>::pending();
        assert_eq!(format!("{:?}", deferred), "Deferred { state: \"pending\" }");
        settler.resolve(1);
        assert_eq!(format!("{:?}", deferred), "Deferred { state: \"resolved\" }");
    }
}

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use foundation::ids::CellId;
use tracing::trace;

/// Change listener. Listeners are called synchronously after a write (or at
/// the end of the enclosing [`batch`]), on the writing thread, with no borrow
/// of the cell held.
pub type Listener = Rc<dyn Fn()>;

thread_local! {
    // Listeners deferred by an open `batch`, in first-notified order.
    static PENDING: RefCell<Option<Vec<Listener>>> = const { RefCell::new(None) };
}

/// Runs `f` with listener notification deferred until it returns.
///
/// Each distinct listener notified inside the batch runs once afterwards, in
/// the order it was first notified. Nested batches join the outermost one.
/// Derived cells share one listener across their sources, so writing several
/// sources in a batch recomputes them once.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    let outermost = PENDING.with(|p| {
        let mut p = p.borrow_mut();
        if p.is_some() {
            false
        } else {
            *p = Some(Vec::new());
            true
        }
    });
    let out = f();
    if outermost {
        let deferred = PENDING.with(|p| p.borrow_mut().take()).unwrap_or_default();
        for listener in deferred {
            listener();
        }
    }
    out
}

/// Observable single-value cell.
///
/// An `Atom` is a cheap handle: clones share the same value and subscriber
/// list. Identity is the cell, not the value (`ptr_eq`, `id`).
///
/// Ordering contract:
/// - `set` stores the value first, then notifies listeners in subscription order.
/// - Writing a value equal to the current one is a no-op and notifies nobody.
pub struct Atom<T> {
    inner: Rc<AtomInner<T>>,
}

struct AtomInner<T> {
    id: CellId,
    label: Option<&'static str>,
    value: RefCell<T>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_key: Cell<u64>,
    // Upstream subscriptions of derived cells; released with the cell.
    sources: RefCell<Vec<Subscription>>,
}

impl<T> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Atom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atom")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Atom<T> {
    pub fn new(value: T) -> Self {
        Self::build(None, value)
    }

    /// Creates a cell with a debug label used in traces.
    pub fn labeled(label: &'static str, value: T) -> Self {
        Self::build(Some(label), value)
    }

    fn build(label: Option<&'static str>, value: T) -> Self {
        Self {
            inner: Rc::new(AtomInner {
                id: CellId::next(),
                label,
                value: RefCell::new(value),
                listeners: RefCell::new(Vec::new()),
                next_key: Cell::new(0),
                sources: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrows the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Writes `value`. Returns `true` if the stored value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut slot = self.inner.value.borrow_mut();
            if *slot == value {
                return false;
            }
            *slot = value;
        }
        trace!(cell = self.inner.id.get(), label = self.inner.label, "cell write");
        self.notify();
        true
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = self.with(f);
        self.set(next)
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        self.add_listener(Rc::new(listener))
    }

    pub fn read_only(&self) -> ReadAtom<T> {
        ReadAtom { atom: self.clone() }
    }

    fn add_listener(&self, listener: Listener) -> Subscription {
        let key = self.inner.next_key.get();
        self.inner.next_key.set(key + 1);
        self.inner.listeners.borrow_mut().push((key, listener));

        let weak: Weak<AtomInner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(k, _)| *k != key);
            }
        })
    }

    fn notify(&self) {
        // Snapshot so listeners may subscribe, unsubscribe or write re-entrantly.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        let deferred = PENDING.with(|p| match p.borrow_mut().as_mut() {
            Some(pending) => {
                for l in &listeners {
                    if !pending.iter().any(|q| Rc::ptr_eq(q, l)) {
                        pending.push(Rc::clone(l));
                    }
                }
                true
            }
            None => false,
        });
        if deferred {
            return;
        }
        for listener in listeners {
            listener();
        }
    }
}

impl<T> Atom<T> {
    pub fn id(&self) -> CellId {
        self.inner.id
    }

    /// `true` if both handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

/// Read-only view of a cell, used for derived values.
pub struct ReadAtom<T> {
    atom: Atom<T>,
}

impl<T> Clone for ReadAtom<T> {
    fn clone(&self) -> Self {
        Self {
            atom: self.atom.clone(),
        }
    }
}

impl<T> fmt::Debug for ReadAtom<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadAtom").field(&self.atom).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadAtom<T> {
    pub fn get(&self) -> T {
        self.atom.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.atom.with(f)
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        self.atom.subscribe(listener)
    }
}

impl<T> ReadAtom<T> {
    pub fn id(&self) -> CellId {
        self.atom.id()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.atom.ptr_eq(&other.atom)
    }
}

/// Anything a derived cell can depend on.
pub trait Observable {
    fn cell_id(&self) -> CellId;
    fn observe(&self, listener: Listener) -> Subscription;
}

impl<T: Clone + PartialEq + 'static> Observable for Atom<T> {
    fn cell_id(&self) -> CellId {
        self.id()
    }

    fn observe(&self, listener: Listener) -> Subscription {
        self.add_listener(listener)
    }
}

impl<T: Clone + PartialEq + 'static> Observable for ReadAtom<T> {
    fn cell_id(&self) -> CellId {
        self.id()
    }

    fn observe(&self, listener: Listener) -> Subscription {
        self.atom.add_listener(listener)
    }
}

/// Creates a read-only cell whose value is `compute()`, recomputed whenever
/// one of `sources` is written.
///
/// `compute` typically captures the source handles; the derived cell only holds
/// weak back-references from its sources, so dropping it releases everything.
pub fn derive<T, F>(label: &'static str, sources: &[&dyn Observable], compute: F) -> ReadAtom<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn() -> T + 'static,
{
    let atom = Atom::labeled(label, compute());

    let weak = Rc::downgrade(&atom.inner);
    let recompute: Listener = Rc::new(move || {
        if let Some(inner) = weak.upgrade() {
            Atom { inner }.set(compute());
        }
    });
    let subs: Vec<Subscription> = sources
        .iter()
        .map(|source| source.observe(Rc::clone(&recompute)))
        .collect();
    *atom.inner.sources.borrow_mut() = subs;

    atom.read_only()
}

/// Handle returned by `subscribe`. Dropping it removes the listener.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::{Atom, batch, derive};

    #[test]
    fn set_stores_value_and_reports_change() {
        let a = Atom::new(1);
        assert!(a.set(2));
        assert_eq!(a.get(), 2);
        assert!(!a.set(2));
    }

    #[test]
    fn clones_share_the_cell() {
        let a = Atom::labeled("title", Some("x".to_string()));
        let b = a.clone();
        b.set(None);
        assert_eq!(a.get(), None);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
        assert!(!a.ptr_eq(&Atom::new(None)));
    }

    #[test]
    fn listeners_run_in_subscription_order_and_skip_equal_writes() {
        let a = Atom::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = Rc::clone(&log);
        let l2 = Rc::clone(&log);
        let _s1 = a.subscribe(move || l1.borrow_mut().push("first"));
        let _s2 = a.subscribe(move || l2.borrow_mut().push("second"));

        a.set(1);
        a.set(1);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn dropping_subscription_stops_notifications() {
        let a = Atom::new(false);
        let hits = Rc::new(RefCell::new(0));
        let h = Rc::clone(&hits);
        let sub = a.subscribe(move || *h.borrow_mut() += 1);
        a.set(true);
        drop(sub);
        a.set(false);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(a.listener_count(), 0);
    }

    #[test]
    fn listener_may_read_and_write_reentrantly() {
        let a = Atom::new(0);
        let b = Atom::new(0);
        let (a2, b2) = (a.clone(), b.clone());
        let _s = a.subscribe(move || {
            b2.set(a2.get() * 10);
        });
        a.set(3);
        assert_eq!(b.get(), 30);
    }

    #[test]
    fn derived_cell_tracks_its_sources() {
        let x = Atom::new(2);
        let y = Atom::new(3);
        let (cx, cy) = (x.clone(), y.clone());
        let sum = derive("sum", &[&x, &y], move || cx.get() + cy.get());
        assert_eq!(sum.get(), 5);

        x.set(10);
        assert_eq!(sum.get(), 13);
        y.update(|v| v + 1);
        assert_eq!(sum.get(), 14);
    }

    #[test]
    fn dropping_derived_cell_releases_source_listeners() {
        let x = Atom::new(1);
        let cx = x.clone();
        let doubled = derive("doubled", &[&x], move || cx.get() * 2);
        assert_eq!(x.listener_count(), 1);
        drop(doubled);
        assert_eq!(x.listener_count(), 0);
    }

    #[test]
    fn batch_defers_and_coalesces_notifications() {
        let x = Atom::new(1);
        let y = Atom::new(1);
        let runs = Rc::new(RefCell::new(0));
        let (cx, cy, r) = (x.clone(), y.clone(), Rc::clone(&runs));
        let product = derive("product", &[&x, &y], move || {
            *r.borrow_mut() += 1;
            cx.get() * cy.get()
        });
        *runs.borrow_mut() = 0;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let (p, s) = (product.clone(), Rc::clone(&seen));
        let _sub = product.subscribe(move || s.borrow_mut().push(p.get()));

        let inside = batch(|| {
            x.set(2);
            y.set(5);
            batch(|| x.set(3));
            product.get()
        });
        assert_eq!(inside, 1);
        assert_eq!(product.get(), 15);
        assert_eq!(*runs.borrow(), 1);
        assert_eq!(*seen.borrow(), vec![15]);
    }
}

//! Shared mutable cells for connection state and result sets.
//!
//! Every handle of a connection (statements, prepared statements, result
//! sets) holds a cell pointing at the same protocol object. The sharing mode
//! is picked once, as a type parameter, when the connection is created.
//!
//! Cells are always locked in the order protocol, then result set.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result, eyre};

pub trait Sharing: Sized + 'static {
    type Cell<T>: Clone;

    fn share<T>(value: T) -> Self::Cell<T>;

    /// Run `f` with exclusive access to the cell's value
    fn with<T, R>(cell: &Self::Cell<T>, f: impl FnOnce(&mut T) -> Result<R>) -> Result<R>;

    fn same<T>(a: &Self::Cell<T>, b: &Self::Cell<T>) -> bool;
}

/// Single-threaded sharing through `Rc<RefCell<_>>`
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsynchronized;

impl Sharing for Unsynchronized {
    type Cell<T> = Rc<RefCell<T>>;

    fn share<T>(value: T) -> Self::Cell<T> {
        Rc::new(RefCell::new(value))
    }

    fn with<T, R>(cell: &Self::Cell<T>, f: impl FnOnce(&mut T) -> Result<R>) -> Result<R> {
        let mut value = cell
            .try_borrow_mut()
            .map_err(|e| Error::LibraryBug(eyre!("re-entrant access to a shared cell: {}", e)))?;
        f(&mut value)
    }

    fn same<T>(a: &Self::Cell<T>, b: &Self::Cell<T>) -> bool {
        Rc::ptr_eq(a, b)
    }
}

/// Thread-safe sharing through `Arc<Mutex<_>>`; one lock per connection
#[derive(Debug, Clone, Copy, Default)]
pub struct Synchronized;

impl Sharing for Synchronized {
    type Cell<T> = Arc<Mutex<T>>;

    fn share<T>(value: T) -> Self::Cell<T> {
        Arc::new(Mutex::new(value))
    }

    fn with<T, R>(cell: &Self::Cell<T>, f: impl FnOnce(&mut T) -> Result<R>) -> Result<R> {
        f(&mut cell.lock())
    }

    fn same<T>(a: &Self::Cell<T>, b: &Self::Cell<T>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

//! Observable properties
//!
//! A [`Property`] holds one value. Writing it runs the optional `before_set`
//! hook (even when the value does not change), stores the new value and then,
//! if the value changed or the property always notifies, sends its refresh key.

use std::cell::RefCell;
use std::fmt;

use super::dispatcher::{Dispatcher, RefreshKey};

type BeforeSet<T> = Box<dyn Fn(&T, &T)>;

pub struct Property<T> {
    value: RefCell<T>,
    target: Option<(RefreshKey, Dispatcher)>,
    always_notify: bool,
    before_set: Option<BeforeSet<T>>,
}

impl<T: Clone + PartialEq> Property<T> {
    /// A property that sends `key` through `dispatcher` when it changes
    pub fn new(value: T, key: RefreshKey, dispatcher: &Dispatcher) -> Self {
        Self {
            value: RefCell::new(value),
            target: Some((key, dispatcher.clone())),
            always_notify: false,
            before_set: None,
        }
    }

    /// A property that never notifies anyone
    pub fn silent(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            target: None,
            always_notify: false,
            before_set: None,
        }
    }

    /// Notify on every write, even when the value is unchanged
    pub fn always_notify(mut self) -> Self {
        self.always_notify = true;
        self
    }

    /// Run `hook(current, incoming)` on every write attempt
    ///
    /// The hook must not write this same property.
    pub fn before_set(mut self, hook: impl Fn(&T, &T) + 'static) -> Self {
        self.before_set = Some(Box::new(hook));
        self
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Borrow the value without cloning it
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Write a value; returns whether it differed from the previous one
    pub fn set(&self, value: T) -> bool {
        if let Some(hook) = &self.before_set {
            let current = self.get();
            hook(&current, &value);
        }

        let changed = *self.value.borrow() != value;
        if changed {
            *self.value.borrow_mut() = value;
        }

        if changed || self.always_notify {
            if let Some((key, dispatcher)) = &self.target {
                dispatcher.send(*key);
            }
        }
        changed
    }

    /// Modify a copy of the value and write it back through [`Property::set`]
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut value = self.get();
        f(&mut value);
        self.set(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.value.borrow())
            .field("key", &self.target.as_ref().map(|(key, _)| *key))
            .field("always_notify", &self.always_notify)
            .finish()
    }
}

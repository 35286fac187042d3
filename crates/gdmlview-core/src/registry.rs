//! Name-keyed factory registry.
//!
//! A [`FactoryRegistry`] maps identifiers to constructor functions. It backs
//! every runtime-selectable variant in gdmlview: interactive sessions,
//! graphics drivers and primary generators.

use std::collections::HashMap;

/// A stored constructor: startup arguments in, owned product out.
pub type Creator<A, P> = Box<dyn Fn(&A) -> Box<P>>;

/// Registry mapping names to constructors of `P` taking arguments `A`.
///
/// Registration never overwrites: the first constructor registered under a
/// name stays associated with it for the lifetime of the registry.
pub struct FactoryRegistry<A: ?Sized, P: ?Sized> {
    creators: HashMap<String, Creator<A, P>>,
}

impl<A: ?Sized, P: ?Sized> Default for FactoryRegistry<A, P> {
    fn default() -> Self {
        Self {
            creators: HashMap::new(),
        }
    }
}

impl<A: ?Sized, P: ?Sized> FactoryRegistry<A, P> {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor under `id`.
    ///
    /// Returns `false` and leaves the registry untouched if `id` is already
    /// present.
    pub fn register<F>(&mut self, id: impl Into<String>, creator: F) -> bool
    where
        F: Fn(&A) -> Box<P> + 'static,
    {
        let id = id.into();
        if self.creators.contains_key(&id) {
            log::debug!("rejected duplicate registration of '{id}'");
            return false;
        }
        self.creators.insert(id, Box::new(creator));
        true
    }

    /// Constructs the product registered under `id`.
    ///
    /// Returns `None` if nothing is registered under `id`.
    pub fn create(&self, id: &str, args: &A) -> Option<Box<P>> {
        self.creators.get(id).map(|creator| creator(args))
    }

    /// Checks if a constructor is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.creators.contains_key(id)
    }

    /// Returns the registered identifiers in sorted order.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.creators.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of registered constructors.
    pub fn len(&self) -> usize {
        self.creators.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

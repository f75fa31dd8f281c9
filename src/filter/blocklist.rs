//! Static source-address blocklist.

use std::collections::HashSet;

/// Set of denied source addresses, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    addresses: HashSet<String>,
}

impl Blocklist {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }

    /// Check whether the address is blocked.
    pub fn contains(&self, address: &str) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

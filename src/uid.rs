// Copyright (c) 2024 Mike Tsao. All rights reserved.

use std::{hash::Hash, marker::PhantomData, sync::atomic::AtomicUsize};

/// Something that identifies an item in an arena.
pub trait IsUid: Eq + Hash + Clone + Copy + From<usize> {}

/// Generates unique uids.
#[derive(Debug)]
pub struct UidFactory<U: IsUid> {
    pub(crate) next_uid_value: AtomicUsize,
    pub(crate) _phantom: PhantomData<U>,
}
impl<U: IsUid> UidFactory<U> {
    /// Creates a new UidFactory starting with the given value.
    pub fn new(first_uid: usize) -> Self {
        Self {
            next_uid_value: AtomicUsize::new(first_uid),
            _phantom: Default::default(),
        }
    }

    /// Generates the next unique uid.
    pub fn mint_next(&self) -> U {
        let uid_value = self
            .next_uid_value
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        U::from(uid_value)
    }
}

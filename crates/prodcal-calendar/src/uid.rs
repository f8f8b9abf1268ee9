//! Event UID generation
//!
//! UIDs only need to be unique within one document. [`RandomUid`] is the
//! default; [`SequentialUid`] gives reproducible output.

use std::collections::HashSet;

use uuid::Uuid;

/// Length of every generated UID
pub const UID_LEN: usize = 32;

/// Source of per-event identifiers
pub trait UidGenerator {
    /// Produce the next identifier
    fn next_uid(&mut self) -> String;
}

/// Random 32-character lowercase hex UIDs
///
/// Values are drawn from UUID v4 in simple form. Issued values are
/// remembered and a repeat is redrawn, so one generator never yields the same
/// UID twice.
#[derive(Debug, Default)]
pub struct RandomUid {
    issued: HashSet<String>,
}

impl RandomUid {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UidGenerator for RandomUid {
    fn next_uid(&mut self) -> String {
        loop {
            let uid = Uuid::new_v4().simple().to_string();
            if self.issued.insert(uid.clone()) {
                return uid;
            }
            log::debug!("UID collision on {uid}, drawing again");
        }
    }
}

/// Deterministic hex counter UIDs, zero padded to [`UID_LEN`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequentialUid {
    next: u128,
}

impl SequentialUid {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Start counting at `first`
    #[must_use]
    pub const fn starting_at(first: u128) -> Self {
        Self { next: first }
    }
}

impl UidGenerator for SequentialUid {
    fn next_uid(&mut self) -> String {
        let uid = format!("{:0width$x}", self.next, width = UID_LEN);
        self.next = self.next.wrapping_add(1);
        uid
    }
}

impl<G: UidGenerator + ?Sized> UidGenerator for &mut G {
    fn next_uid(&mut self) -> String {
        (**self).next_uid()
    }
}

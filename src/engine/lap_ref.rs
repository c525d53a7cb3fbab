use std::ops::Deref;

use crate::types::{Lap, LapId, Participant};

/// Lap returned by a session query, together with the participant that drove it.
///
/// Dereferences to the [`Lap`].
#[derive(Debug, Clone, Copy)]
pub struct LapRef<'a> {
    pub id: LapId,
    pub participant: &'a Participant,
    pub lap: &'a Lap,
}

impl Deref for LapRef<'_> {
    type Target = Lap;

    fn deref(&self) -> &Lap {
        self.lap
    }
}

/// Two references are equal when they point at the same lap.
impl PartialEq for LapRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.lap, other.lap)
    }
}

impl Eq for LapRef<'_> {}

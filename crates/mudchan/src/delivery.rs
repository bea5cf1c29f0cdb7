//! What to do with a [`RecipientSet`] once it reaches the writer.
//!
//! A resolved set is a snapshot. By the time output goes out a recipient may have logged off or
//! been despawned, so the writer re-checks each one against the current world.

use std::collections::HashSet;

use crate::target::{Recipient, RecipientSet};
use crate::world::{SessionId, World};

/// Sessions to write to, in recipient order.
///
/// Skips recipients that are gone, characters with no controller, and room listeners (those have
/// no session). A session controlling several recipients gets one copy.
pub fn deliverable_sessions(world: &World, recipients: &RecipientSet) -> Vec<SessionId> {
    let mut seen = HashSet::<SessionId>::new();
    let mut out = Vec::new();
    for r in recipients.iter() {
        let Recipient::Character(cid) = r else {
            continue;
        };
        let Some(c) = world.character(*cid) else {
            continue;
        };
        let Some(controller) = c.controller else {
            continue;
        };
        if !seen.insert(controller) {
            continue;
        }
        out.push(controller);
    }
    out
}

/// Room listeners in the set that still exist.
pub fn listening_rooms<'a>(world: &World, recipients: &'a RecipientSet) -> Vec<&'a str> {
    recipients
        .iter()
        .filter_map(|r| match r {
            Recipient::Room(id) => Some(id.as_str()),
            _ => None,
        })
        .filter(|id| world.room(id).is_some_and(|room| room.listener))
        .collect()
}

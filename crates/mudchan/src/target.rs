use std::collections::BTreeSet;

use crate::world::{Area, Character, CharacterId, Party, PartyId, Room, World};

/// Identity of something a line can be delivered to.
///
/// Equality is by id only. Two characters that happen to share a name (or every other field)
/// are still two recipients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Recipient {
    Character(CharacterId),
    /// A room environment that listens to local speech.
    Room(String),
    // Relay identities. They name the path in trace output and never land in a resolved set.
    Area(String),
    Party(PartyId),
}

impl Recipient {
    pub fn character_id(&self) -> Option<CharacterId> {
        match self {
            Recipient::Character(cid) => Some(*cid),
            _ => None,
        }
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Character(cid) => write!(f, "char:{cid}"),
            Recipient::Room(id) => write!(f, "room:{id}"),
            Recipient::Area(id) => write!(f, "area:{id}"),
            Recipient::Party(pid) => write!(f, "party:{pid}"),
        }
    }
}

/// Deduplicated, ordered snapshot of recipients.
///
/// Nothing here is kept live: a character can leave between resolution and delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientSet {
    inner: BTreeSet<Recipient>,
}

impl RecipientSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `r` was already present.
    pub fn insert(&mut self, r: Recipient) -> bool {
        self.inner.insert(r)
    }

    pub fn remove(&mut self, r: &Recipient) -> bool {
        self.inner.remove(r)
    }

    pub fn contains(&self, r: &Recipient) -> bool {
        self.inner.contains(r)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recipient> {
        self.inner.iter()
    }

    pub fn character_ids(&self) -> Vec<CharacterId> {
        self.inner.iter().filter_map(Recipient::character_id).collect()
    }

    pub fn extend(&mut self, other: RecipientSet) {
        self.inner.extend(other.inner);
    }
}

impl FromIterator<Recipient> for RecipientSet {
    fn from_iter<I: IntoIterator<Item = Recipient>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RecipientSet {
    type Item = Recipient;
    type IntoIter = std::collections::btree_set::IntoIter<Recipient>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// Anything a broadcast can reach or relay through.
///
/// Leaves (characters) target themselves. Containers (rooms, areas, parties) own their occupant
/// graph and flatten it here; resolvers call this rather than walking the graph themselves.
pub trait Broadcastable {
    fn recipient(&self) -> Recipient;

    /// Everything reachable from `self` as a broadcast target, deduplicated.
    fn targets(&self, world: &World) -> RecipientSet;
}

impl Broadcastable for Character {
    fn recipient(&self) -> Recipient {
        Recipient::Character(self.id)
    }

    fn targets(&self, _world: &World) -> RecipientSet {
        std::iter::once(self.recipient()).collect()
    }
}

impl Broadcastable for Room {
    fn recipient(&self) -> Recipient {
        Recipient::Room(self.id.clone())
    }

    fn targets(&self, _world: &World) -> RecipientSet {
        let mut out = self
            .occupants()
            .map(Recipient::Character)
            .collect::<RecipientSet>();
        if self.listener {
            out.insert(self.recipient());
        }
        out
    }
}

impl Broadcastable for Area {
    fn recipient(&self) -> Recipient {
        Recipient::Area(self.id.clone())
    }

    fn targets(&self, world: &World) -> RecipientSet {
        let mut out = RecipientSet::new();
        for room_id in &self.rooms {
            let Some(room) = world.room(room_id) else {
                continue;
            };
            out.extend(room.occupants().map(Recipient::Character).collect());
        }
        out
    }
}

impl Broadcastable for Party {
    fn recipient(&self) -> Recipient {
        Recipient::Party(self.id)
    }

    fn targets(&self, _world: &World) -> RecipientSet {
        self.members
            .iter()
            .copied()
            .map(Recipient::Character)
            .collect()
    }
}

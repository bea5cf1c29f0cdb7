use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::error::{LookupError, WorldError};
use crate::registry::Registry;
use crate::roles::Role;

pub type CharacterId = u64;
pub type PartyId = u64;

/// A connected client. One session may control several characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{:x}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    // None for mobs.
    pub controller: Option<SessionId>,
    pub room_id: Option<String>,
    pub party: Option<PartyId>,
    pub role: Role,
}

impl Character {
    /// Connected player (has a controlling session), as opposed to a mob.
    pub fn is_player(&self) -> bool {
        self.controller.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub area_id: Option<String>,
    /// Room environment reacts to local speech and is addressable as a recipient.
    pub listener: bool,
    occupants: HashSet<CharacterId>,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            area_id: None,
            listener: false,
            occupants: HashSet::new(),
        }
    }

    pub fn in_area(mut self, area_id: impl Into<String>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }

    pub fn listening(mut self, listener: bool) -> Self {
        self.listener = listener;
        self
    }

    pub fn occupants(&self) -> impl Iterator<Item = CharacterId> + '_ {
        self.occupants.iter().copied()
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }
}

#[derive(Debug, Clone)]
pub struct Area {
    pub id: String,
    pub name: String,
    pub rooms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Party {
    pub id: PartyId,
    pub leader: CharacterId,
    pub members: HashSet<CharacterId>,
}

/// Live game state: characters and the room/area/party graph they hang off.
///
/// Audience resolution only ever takes `&World`. Everything that changes the graph goes through
/// the `&mut self` methods here, which keep both sides of each edge in sync
/// (`Character::room_id` <-> `Room` occupants, `Character::party` <-> `Party::members`).
#[derive(Debug, Clone)]
pub struct World {
    chars: HashMap<CharacterId, Character>,
    rooms: Registry<Room>,
    areas: Registry<Area>,
    parties: HashMap<PartyId, Party>,
    next_char_id: CharacterId,
    next_party_id: PartyId,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            chars: HashMap::new(),
            rooms: Registry::new("room"),
            areas: Registry::new("area"),
            parties: HashMap::new(),
            next_char_id: 1,
            next_party_id: 1,
        }
    }

    pub fn add_area(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        let rooms = self
            .areas
            .get(&id)
            .map(|a| a.rooms.clone())
            .unwrap_or_default();
        let area = Area {
            id: id.clone(),
            name: name.into(),
            rooms,
        };
        self.areas.insert(id, area);
    }

    /// Adds (or replaces) a room. A room naming an unknown area creates that area.
    pub fn add_room(&mut self, room: Room) {
        let mut room = room;
        let mut old_area = None;
        if let Some(old) = self.rooms.get(&room.id) {
            room.occupants = old.occupants.clone();
            if old.area_id != room.area_id {
                old_area = old.area_id.clone();
            }
        }
        // A re-homed room leaves its old area's list.
        if let Some(a) = old_area.and_then(|id| self.areas.get_mut(&id)) {
            a.rooms.retain(|r| r != &room.id);
        }
        if let Some(area_id) = room.area_id.clone() {
            if !self.areas.contains(&area_id) {
                self.add_area(area_id.clone(), area_id.clone());
            }
            if let Some(a) = self.areas.get_mut(&area_id) {
                if !a.rooms.iter().any(|r| r == &room.id) {
                    a.rooms.push(room.id.clone());
                }
            }
        }
        self.rooms.insert(room.id.clone(), room);
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn require_room(&self, room_id: &str) -> Result<&Room, LookupError> {
        self.rooms.require(room_id)
    }

    pub fn area(&self, area_id: &str) -> Option<&Area> {
        self.areas.get(area_id)
    }

    pub fn room_ids(&self) -> Vec<&str> {
        self.rooms.keys_sorted()
    }

    pub fn area_ids(&self) -> Vec<&str> {
        self.areas.keys_sorted()
    }

    pub fn party(&self, pid: PartyId) -> Option<&Party> {
        self.parties.get(&pid)
    }

    pub fn character(&self, cid: CharacterId) -> Option<&Character> {
        self.chars.get(&cid)
    }

    pub fn require_character(&self, cid: CharacterId) -> Result<&Character, LookupError> {
        self.chars.get(&cid).ok_or_else(|| LookupError::NotFound {
            kind: "character",
            key: cid.to_string(),
        })
    }

    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.chars.values()
    }

    /// The live population: every character with a controlling session.
    pub fn players(&self) -> impl Iterator<Item = &Character> {
        self.chars.values().filter(|c| c.is_player())
    }

    pub fn spawn_character(
        &mut self,
        name: impl Into<String>,
        controller: Option<SessionId>,
        role: Role,
        room_id: &str,
    ) -> Result<CharacterId, WorldError> {
        let room_id = self.rooms.require(room_id)?.id.clone();

        let cid = self.next_char_id;
        self.next_char_id = self.next_char_id.saturating_add(1);

        self.chars.insert(
            cid,
            Character {
                id: cid,
                name: name.into(),
                controller,
                room_id: Some(room_id.clone()),
                party: None,
                role,
            },
        );
        if let Some(r) = self.rooms.get_mut(&room_id) {
            r.occupants.insert(cid);
        }
        Ok(cid)
    }

    pub fn spawn_mob(
        &mut self,
        name: impl Into<String>,
        room_id: &str,
    ) -> Result<CharacterId, WorldError> {
        self.spawn_character(name, None, Role::Guest, room_id)
    }

    pub fn move_character(&mut self, cid: CharacterId, to_room: &str) -> Result<(), WorldError> {
        let to_room = self.rooms.require(to_room)?.id.clone();
        let from = self
            .chars
            .get(&cid)
            .ok_or_else(|| not_found("character", cid))?
            .room_id
            .clone();

        if let Some(from) = from {
            if let Some(r) = self.rooms.get_mut(&from) {
                r.occupants.remove(&cid);
            }
        }
        if let Some(r) = self.rooms.get_mut(&to_room) {
            r.occupants.insert(cid);
        }
        if let Some(c) = self.chars.get_mut(&cid) {
            c.room_id = Some(to_room);
        }
        Ok(())
    }

    /// Takes a character out of every room (limbo). It stays in its party.
    pub fn unplace_character(&mut self, cid: CharacterId) -> Result<(), WorldError> {
        let c = self
            .chars
            .get_mut(&cid)
            .ok_or_else(|| not_found("character", cid))?;
        if let Some(from) = c.room_id.take() {
            if let Some(r) = self.rooms.get_mut(&from) {
                r.occupants.remove(&cid);
            }
        }
        Ok(())
    }

    pub fn set_role(&mut self, cid: CharacterId, role: Role) -> Result<(), WorldError> {
        let c = self
            .chars
            .get_mut(&cid)
            .ok_or_else(|| not_found("character", cid))?;
        c.role = role;
        Ok(())
    }

    pub fn set_controller(
        &mut self,
        cid: CharacterId,
        controller: Option<SessionId>,
    ) -> Result<(), WorldError> {
        let c = self
            .chars
            .get_mut(&cid)
            .ok_or_else(|| not_found("character", cid))?;
        c.controller = controller;
        Ok(())
    }

    pub fn remove_char(&mut self, cid: CharacterId) -> Option<Character> {
        self.party_leave(cid);
        let c = self.chars.remove(&cid)?;
        if let Some(room_id) = &c.room_id {
            if let Some(r) = self.rooms.get_mut(room_id) {
                r.occupants.remove(&cid);
            }
        }
        Some(c)
    }

    /// Drops every character the session controls. Returns what was removed.
    pub fn detach_session(&mut self, session: SessionId) -> Vec<Character> {
        let mut cids = self
            .chars
            .values()
            .filter(|c| c.controller == Some(session))
            .map(|c| c.id)
            .collect::<Vec<_>>();
        cids.sort_unstable();

        let mut removed = Vec::new();
        for cid in cids {
            if let Some(c) = self.remove_char(cid) {
                removed.push(c);
            }
        }
        removed
    }

    pub fn party_create(&mut self, leader: CharacterId) -> Result<PartyId, WorldError> {
        let c = self
            .chars
            .get(&leader)
            .ok_or_else(|| not_found("character", leader))?;
        if c.party.is_some() {
            return Err(WorldError::AlreadyInParty(leader));
        }

        let pid = self.next_party_id;
        self.next_party_id = self.next_party_id.saturating_add(1);
        let mut members = HashSet::new();
        members.insert(leader);
        self.parties.insert(
            pid,
            Party {
                id: pid,
                leader,
                members,
            },
        );
        if let Some(c) = self.chars.get_mut(&leader) {
            c.party = Some(pid);
        }
        Ok(pid)
    }

    pub fn party_join(&mut self, cid: CharacterId, pid: PartyId) -> Result<(), WorldError> {
        let c = self
            .chars
            .get(&cid)
            .ok_or_else(|| not_found("character", cid))?;
        if c.party.is_some() {
            return Err(WorldError::AlreadyInParty(cid));
        }
        let p = self
            .parties
            .get_mut(&pid)
            .ok_or_else(|| not_found("party", pid))?;
        p.members.insert(cid);
        if let Some(c) = self.chars.get_mut(&cid) {
            c.party = Some(pid);
        }
        Ok(())
    }

    pub fn party_leave(&mut self, cid: CharacterId) {
        let Some(pid) = self.chars.get_mut(&cid).and_then(|c| c.party.take()) else {
            return;
        };
        let Some(p) = self.parties.get_mut(&pid) else {
            warn!(cid, pid, "character pointed at a missing party");
            return;
        };

        p.members.remove(&cid);

        if p.members.is_empty() {
            self.parties.remove(&pid);
            return;
        }

        // Leader left: promote the lowest remaining id so the choice is deterministic.
        if p.leader == cid {
            if let Some(&new_leader) = p.members.iter().min() {
                p.leader = new_leader;
            }
        }
    }

    pub fn party_disband(&mut self, pid: PartyId) {
        let Some(p) = self.parties.remove(&pid) else {
            return;
        };
        for mid in p.members {
            if let Some(c) = self.chars.get_mut(&mid) {
                if c.party == Some(pid) {
                    c.party = None;
                }
            }
        }
    }

    pub fn party_members_vec(&self, pid: PartyId) -> Vec<CharacterId> {
        let mut v = self
            .parties
            .get(&pid)
            .map(|p| p.members.iter().copied().collect::<Vec<_>>())
            .unwrap_or_default();
        v.sort_unstable();
        v
    }

    /// Case-insensitive lookup by exact name, falling back to a unique prefix.
    pub fn find_character(&self, token: &str) -> Option<CharacterId> {
        let t = token.trim().to_ascii_lowercase();
        if t.is_empty() {
            return None;
        }

        let mut exact: Option<CharacterId> = None;
        for c in self.chars.values() {
            if c.name.to_ascii_lowercase() == t {
                if exact.is_some() {
                    return None; // ambiguous exact match
                }
                exact = Some(c.id);
            }
        }
        if exact.is_some() {
            return exact;
        }

        let mut found: Option<CharacterId> = None;
        for c in self.chars.values() {
            if c.name.to_ascii_lowercase().starts_with(&t) {
                if found.is_some() {
                    return None; // ambiguous prefix
                }
                found = Some(c.id);
            }
        }
        found
    }
}

fn not_found(kind: &'static str, id: u64) -> WorldError {
    WorldError::Lookup(LookupError::NotFound {
        kind,
        key: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rooms() -> World {
        let mut w = World::new();
        w.add_area("town", "Town");
        w.add_room(Room::new("town.square", "Square").in_area("town"));
        w.add_room(Room::new("town.inn", "Inn").in_area("town"));
        w
    }

    #[test]
    fn move_keeps_occupants_in_sync() {
        let mut w = two_rooms();
        let a = w
            .spawn_character("Alice", Some(SessionId(1)), Role::Player, "town.square")
            .unwrap();
        assert_eq!(w.room("town.square").unwrap().occupant_count(), 1);

        w.move_character(a, "town.inn").unwrap();
        assert_eq!(w.room("town.square").unwrap().occupant_count(), 0);
        assert_eq!(w.room("town.inn").unwrap().occupants().collect::<Vec<_>>(), vec![a]);
        assert_eq!(w.character(a).unwrap().room_id.as_deref(), Some("town.inn"));
    }

    #[test]
    fn move_to_missing_room_is_room_not_found() {
        let mut w = two_rooms();
        let a = w
            .spawn_character("Alice", Some(SessionId(1)), Role::Player, "town.square")
            .unwrap();
        let err = w.move_character(a, "nowhere").unwrap_err();
        assert_eq!(err.to_string(), "room not found: nowhere");
        assert_eq!(w.character(a).unwrap().room_id.as_deref(), Some("town.square"));
    }

    #[test]
    fn add_room_registers_with_area() {
        let mut w = World::new();
        w.add_room(Room::new("sewers.junction", "Junction").in_area("sewers"));
        let a = w.area("sewers").unwrap();
        assert_eq!(a.rooms, vec!["sewers.junction".to_string()]);
        assert_eq!(w.area_ids(), vec!["sewers"]);
    }

    #[test]
    fn party_leave_promotes_and_empty_party_is_removed() {
        let mut w = two_rooms();
        let a = w.spawn_character("Alice", Some(SessionId(1)), Role::Player, "town.square").unwrap();
        let b = w.spawn_character("Bob", Some(SessionId(2)), Role::Player, "town.inn").unwrap();

        let pid = w.party_create(a).unwrap();
        w.party_join(b, pid).unwrap();
        assert_eq!(w.party_members_vec(pid), vec![a, b]);
        assert!(matches!(w.party_create(b), Err(WorldError::AlreadyInParty(_))));

        w.party_leave(a);
        assert_eq!(w.party(pid).unwrap().leader, b);
        assert!(w.character(a).unwrap().party.is_none());

        w.party_leave(b);
        assert!(w.party(pid).is_none());
    }

    #[test]
    fn disband_clears_member_links() {
        let mut w = two_rooms();
        let a = w.spawn_character("Alice", Some(SessionId(1)), Role::Player, "town.square").unwrap();
        let b = w.spawn_character("Bob", Some(SessionId(2)), Role::Player, "town.inn").unwrap();
        let pid = w.party_create(a).unwrap();
        w.party_join(b, pid).unwrap();

        w.party_disband(pid);
        assert!(w.party(pid).is_none());
        assert!(w.character(a).unwrap().party.is_none());
        assert!(w.character(b).unwrap().party.is_none());
    }

    #[test]
    fn detach_session_removes_controlled_characters() {
        let mut w = two_rooms();
        let a = w.spawn_character("Alice", Some(SessionId(7)), Role::Player, "town.square").unwrap();
        let alt = w.spawn_character("Alt", Some(SessionId(7)), Role::Player, "town.square").unwrap();
        let b = w.spawn_character("Bob", Some(SessionId(8)), Role::Player, "town.square").unwrap();
        let pid = w.party_create(a).unwrap();
        w.party_join(b, pid).unwrap();

        let removed = w.detach_session(SessionId(7));
        assert_eq!(removed.iter().map(|c| c.id).collect::<Vec<_>>(), vec![a, alt]);
        assert_eq!(w.room("town.square").unwrap().occupants().collect::<Vec<_>>(), vec![b]);
        assert_eq!(w.party_members_vec(pid), vec![b]);
    }

    #[test]
    fn find_character_prefers_exact_then_unique_prefix() {
        let mut w = two_rooms();
        let al = w.spawn_character("Al", Some(SessionId(1)), Role::Player, "town.square").unwrap();
        let alice = w.spawn_character("Alice", Some(SessionId(2)), Role::Player, "town.square").unwrap();
        let _ = w.spawn_character("Alina", Some(SessionId(3)), Role::Player, "town.square").unwrap();

        assert_eq!(w.find_character("al"), Some(al));
        assert_eq!(w.find_character("ALICE"), Some(alice));
        assert_eq!(w.find_character("ali"), None);
        assert_eq!(w.find_character("   "), None);
    }

    #[test]
    fn players_excludes_mobs() {
        let mut w = two_rooms();
        let a = w.spawn_character("Alice", Some(SessionId(1)), Role::Player, "town.square").unwrap();
        let _rat = w.spawn_mob("rat", "town.square").unwrap();
        assert_eq!(w.players().map(|c| c.id).collect::<Vec<_>>(), vec![a]);
        assert_eq!(w.characters().count(), 2);
    }

    #[test]
    fn rehomed_room_leaves_old_area() {
        use crate::audience::{AreaAudience, Resolver};
        use crate::context::SenderContext;

        let mut w = World::new();
        w.add_room(Room::new("r1", "R1").in_area("a"));
        w.add_room(Room::new("r2", "R2").in_area("a"));
        let x = w.spawn_character("X", Some(SessionId(2)), Role::Player, "r1").unwrap();
        w.add_room(Room::new("r1", "R1").in_area("b"));
        let s = w.spawn_character("S", Some(SessionId(1)), Role::Player, "r2").unwrap();

        assert_eq!(w.area("a").unwrap().rooms, vec!["r2".to_string()]);
        assert_eq!(w.area("b").unwrap().rooms, vec!["r1".to_string()]);
        assert_eq!(w.room("r1").unwrap().occupants().collect::<Vec<_>>(), vec![x]);

        let got = AreaAudience.resolve(&SenderContext::for_character(&w, s));
        assert!(got.is_empty());
        let got = AreaAudience.resolve(&SenderContext::for_character(&w, x));
        assert!(got.is_empty());

        // Dropping the area entirely also unlists it.
        w.add_room(Room::new("r2", "R2"));
        assert!(w.area("a").unwrap().rooms.is_empty());
    }
}

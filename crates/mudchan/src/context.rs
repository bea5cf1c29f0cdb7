use crate::target::Recipient;
use crate::world::{Area, Character, CharacterId, Party, Room, World};

/// Who is speaking, and against which world. Built per send, never mutated.
///
/// Both halves are optional. A missing sender or missing world makes every scope that needs it
/// resolve to nobody.
#[derive(Clone, Copy, Debug, Default)]
pub struct SenderContext<'w> {
    sender: Option<&'w Character>,
    state: Option<&'w World>,
}

impl<'w> SenderContext<'w> {
    pub fn new(sender: Option<&'w Character>, state: Option<&'w World>) -> Self {
        Self { sender, state }
    }

    /// Looks the sender up in `world`. An unknown id yields a sender-less context.
    pub fn for_character(world: &'w World, cid: CharacterId) -> Self {
        Self {
            sender: world.character(cid),
            state: Some(world),
        }
    }

    pub fn sender(&self) -> Option<&'w Character> {
        self.sender
    }

    pub fn state(&self) -> Option<&'w World> {
        self.state
    }

    pub fn sender_recipient(&self) -> Option<Recipient> {
        self.sender.map(|c| Recipient::Character(c.id))
    }

    pub fn room(&self) -> Option<&'w Room> {
        let world = self.state?;
        let room_id = self.sender?.room_id.as_deref()?;
        world.room(room_id)
    }

    pub fn area(&self) -> Option<&'w Area> {
        let world = self.state?;
        let area_id = self.room()?.area_id.as_deref()?;
        world.area(area_id)
    }

    pub fn party(&self) -> Option<&'w Party> {
        let world = self.state?;
        let pid = self.sender?.party?;
        world.party(pid)
    }
}

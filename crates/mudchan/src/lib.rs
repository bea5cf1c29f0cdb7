//! `mudchan`: audience targeting for chat channels.
//!
//! Given a sender and a named scope (world, area, party, room, role-gated), compute the set of
//! live recipients that should see a line. Resolution only reads the world graph:
//! - character -> room -> area
//! - character -> party
//!
//! Delivery (writing bytes to sessions) lives with the caller; see [`delivery`] for the
//! liveness re-check it should do first.

pub mod areas;
pub mod audience;
pub mod channels;
pub mod context;
pub mod delivery;
pub mod error;
pub mod registry;
pub mod roles;
pub mod scopes;
pub mod target;
pub mod world;

pub use audience::{
    AreaAudience, CombinedAudience, PartyAudience, Resolver, RoleGatedAudience, RoomAudience,
    WorldAudience,
};
pub use channels::{ChannelDef, ChannelFile, ChannelTable};
pub use context::SenderContext;
pub use error::{LookupError, ScopeError, WorldError};
pub use registry::Registry;
pub use roles::Role;
pub use scopes::{ScopeParams, ScopeRegistry};
pub use target::{Broadcastable, Recipient, RecipientSet};
pub use world::{Area, Character, CharacterId, Party, PartyId, Room, SessionId, World};

//! One resolver per scope.
//!
//! Every resolver follows the same rules:
//! - the sender never appears in its own result (matched by id),
//! - a missing prerequisite (no world, no room, no party) gives an empty set, not an error,
//! - nothing is mutated; resolving twice against the same world gives the same answer.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::SenderContext;
use crate::error::ScopeError;
use crate::roles::Role;
use crate::target::{Broadcastable, RecipientSet};

pub trait Resolver: Send + Sync + std::fmt::Debug {
    /// Scope name this resolver was registered under.
    fn scope(&self) -> &str;

    fn resolve(&self, ctx: &SenderContext<'_>) -> RecipientSet;
}

fn without_sender(mut out: RecipientSet, ctx: &SenderContext<'_>) -> RecipientSet {
    if let Some(me) = ctx.sender_recipient() {
        out.remove(&me);
    }
    out
}

fn nobody(scope: &str, reason: &'static str) -> RecipientSet {
    debug!(scope, reason, "empty audience");
    RecipientSet::new()
}

/// Every connected player.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorldAudience;

impl Resolver for WorldAudience {
    fn scope(&self) -> &str {
        "world"
    }

    fn resolve(&self, ctx: &SenderContext<'_>) -> RecipientSet {
        let Some(world) = ctx.state() else {
            return nobody(self.scope(), "no world");
        };
        let out = world.players().map(|c| c.recipient()).collect();
        without_sender(out, ctx)
    }
}

/// Everyone in the rooms of the sender's area.
#[derive(Debug, Default, Clone, Copy)]
pub struct AreaAudience;

impl Resolver for AreaAudience {
    fn scope(&self) -> &str {
        "area"
    }

    fn resolve(&self, ctx: &SenderContext<'_>) -> RecipientSet {
        let (Some(world), Some(sender)) = (ctx.state(), ctx.sender()) else {
            return nobody(self.scope(), "no sender or world");
        };
        let Some(room_id) = sender.room_id.as_deref() else {
            return nobody(self.scope(), "sender not in a room");
        };
        let Some(room) = world.room(room_id) else {
            warn!(cid = sender.id, room_id, "sender points at a missing room");
            return RecipientSet::new();
        };
        let Some(area) = room.area_id.as_deref().and_then(|a| world.area(a)) else {
            return nobody(self.scope(), "room has no area");
        };
        let out = without_sender(area.targets(world), ctx);
        debug!(via = %area.recipient(), n = out.len(), "area audience");
        out
    }
}

/// The sender's party.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartyAudience;

impl Resolver for PartyAudience {
    fn scope(&self) -> &str {
        "party"
    }

    fn resolve(&self, ctx: &SenderContext<'_>) -> RecipientSet {
        let (Some(world), Some(sender)) = (ctx.state(), ctx.sender()) else {
            return nobody(self.scope(), "no sender or world");
        };
        let Some(pid) = sender.party else {
            return nobody(self.scope(), "sender not in a party");
        };
        let Some(party) = world.party(pid) else {
            warn!(cid = sender.id, pid, "sender points at a missing party");
            return RecipientSet::new();
        };
        let out = without_sender(party.targets(world), ctx);
        debug!(via = %party.recipient(), n = out.len(), "party audience");
        out
    }
}

/// Occupants of the sender's room, plus the room itself when it listens.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoomAudience;

impl Resolver for RoomAudience {
    fn scope(&self) -> &str {
        "room"
    }

    fn resolve(&self, ctx: &SenderContext<'_>) -> RecipientSet {
        let (Some(world), Some(sender)) = (ctx.state(), ctx.sender()) else {
            return nobody(self.scope(), "no sender or world");
        };
        let Some(room_id) = sender.room_id.as_deref() else {
            return nobody(self.scope(), "sender not in a room");
        };
        let Some(room) = world.room(room_id) else {
            warn!(cid = sender.id, room_id, "sender points at a missing room");
            return RecipientSet::new();
        };
        without_sender(room.targets(world), ctx)
    }
}

/// Connected players whose role is at least `min_role`.
#[derive(Debug, Clone, Copy)]
pub struct RoleGatedAudience {
    min_role: Role,
}

impl RoleGatedAudience {
    /// Fails when no threshold is given; there is no default rank.
    pub fn new(min_role: Option<Role>) -> Result<Self, ScopeError> {
        let min_role = min_role.ok_or_else(|| ScopeError::MissingRoleThreshold {
            scope: "role".to_string(),
        })?;
        Ok(Self { min_role })
    }

    pub fn min_role(&self) -> Role {
        self.min_role
    }
}

impl Resolver for RoleGatedAudience {
    fn scope(&self) -> &str {
        "role"
    }

    fn resolve(&self, ctx: &SenderContext<'_>) -> RecipientSet {
        let Some(world) = ctx.state() else {
            return nobody(self.scope(), "no world");
        };
        let out = world
            .players()
            .filter(|c| c.role >= self.min_role)
            .map(|c| c.recipient())
            .collect();
        without_sender(out, ctx)
    }
}

/// Union of several scopes (`room+party`). A recipient reachable through more than one part
/// shows up once.
#[derive(Debug, Clone)]
pub struct CombinedAudience {
    name: String,
    parts: Vec<Arc<dyn Resolver>>,
}

impl CombinedAudience {
    pub fn new(parts: Vec<Arc<dyn Resolver>>) -> Self {
        let name = parts
            .iter()
            .map(|p| p.scope())
            .collect::<Vec<_>>()
            .join("+");
        Self { name, parts }
    }
}

impl Resolver for CombinedAudience {
    fn scope(&self) -> &str {
        &self.name
    }

    fn resolve(&self, ctx: &SenderContext<'_>) -> RecipientSet {
        let mut out = RecipientSet::new();
        for p in &self.parts {
            out.extend(p.resolve(ctx));
        }
        without_sender(out, ctx)
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::audience::Resolver;
use crate::context::SenderContext;
use crate::error::{LookupError, ScopeError};
use crate::roles::Role;
use crate::scopes::{ScopeParams, ScopeRegistry};
use crate::target::RecipientSet;
use crate::world::{CharacterId, World};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDef {
    pub name: String,
    pub scope: String,
    #[serde(default)]
    pub min_role: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// On-disk channel table:
///
/// ```yaml
/// channels:
///   - name: gossip
///     scope: world
///   - name: imm
///     scope: role
///     min_role: builder
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChannelFile {
    pub channels: Vec<ChannelDef>,
}

impl ChannelFile {
    pub fn parse(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }
}

#[derive(Clone, Debug)]
pub struct Channel {
    pub name: String,
    pub description: Option<String>,
    resolver: Arc<dyn Resolver>,
}

impl Channel {
    pub fn scope(&self) -> &str {
        self.resolver.scope()
    }

    pub fn resolve(&self, ctx: &SenderContext<'_>) -> RecipientSet {
        self.resolver.resolve(ctx)
    }
}

/// Every channel the game knows about, built and validated up front.
#[derive(Clone, Debug, Default)]
pub struct ChannelTable {
    channels: Vec<Channel>,
    by_name: HashMap<String, usize>, // lowercase name or alias -> index
}

impl ChannelTable {
    /// Builds every channel or none: the first bad definition fails the whole table.
    pub fn from_defs(defs: &[ChannelDef], scopes: &ScopeRegistry) -> Result<Self, ScopeError> {
        let mut t = Self::default();
        for d in defs {
            let channel = build_channel(d, scopes).map_err(|e| ScopeError::Channel {
                channel: d.name.clone(),
                source: Box::new(e),
            })?;

            let idx = t.channels.len();
            for key in std::iter::once(&d.name).chain(d.aliases.iter()) {
                let k = key.trim().to_ascii_lowercase();
                if k.is_empty() {
                    continue;
                }
                if t.by_name.insert(k.clone(), idx).is_some() {
                    return Err(ScopeError::DuplicateChannel(k));
                }
            }
            t.channels.push(channel);
        }
        info!(channels = t.channels.len(), "channel table loaded");
        Ok(t)
    }

    pub fn from_file(file: &ChannelFile, scopes: &ScopeRegistry) -> Result<Self, ScopeError> {
        Self::from_defs(&file.channels, scopes)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Channel> {
        let k = name.trim().to_ascii_lowercase();
        let idx = *self.by_name.get(&k)?;
        self.channels.get(idx)
    }

    pub fn require(&self, name: &str) -> Result<&Channel, LookupError> {
        self.get(name).ok_or_else(|| LookupError::NotFound {
            kind: "channel",
            key: name.trim().to_string(),
        })
    }

    /// Resolves the audience for `sender` speaking on channel `name`.
    ///
    /// An unknown channel is an error. An unknown sender is treated as no sender: room, area and
    /// party scopes come back empty.
    pub fn send(
        &self,
        name: &str,
        world: &World,
        sender: CharacterId,
    ) -> Result<RecipientSet, LookupError> {
        let channel = self.require(name)?;
        let ctx = SenderContext::for_character(world, sender);
        Ok(channel.resolve(&ctx))
    }
}

fn build_channel(d: &ChannelDef, scopes: &ScopeRegistry) -> Result<Channel, ScopeError> {
    let min_role = match d.min_role.as_deref() {
        Some(s) => Some(Role::parse(s).ok_or_else(|| ScopeError::UnknownRole(s.to_string()))?),
        None => None,
    };
    let resolver = scopes.build(&d.scope, &ScopeParams { min_role })?;
    Ok(Channel {
        name: d.name.trim().to_string(),
        description: d.description.clone(),
        resolver,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Room, SessionId};

    const YAML: &str = r#"
channels:
  - name: gossip
    scope: world
    aliases: [gos]
  - name: say
    scope: room
  - name: gtell
    scope: party
  - name: imm
    scope: role
    min_role: builder
    description: staff only
"#;

    fn table() -> ChannelTable {
        let f = ChannelFile::parse(YAML).unwrap();
        ChannelTable::from_file(&f, &ScopeRegistry::with_builtin()).unwrap()
    }

    #[test]
    fn parses_and_looks_up_by_alias() {
        let t = table();
        assert_eq!(t.len(), 4);
        assert_eq!(t.get("GOS").unwrap().name, "gossip");
        assert_eq!(t.get("imm").unwrap().scope(), "role");
        assert_eq!(
            t.get("imm").unwrap().description.as_deref(),
            Some("staff only")
        );
        assert_eq!(
            t.require("ooc").unwrap_err().to_string(),
            "channel not found: ooc"
        );
    }

    #[test]
    fn role_channel_without_threshold_fails_load() {
        let f = ChannelFile::parse(
            "channels:\n  - name: gossip\n    scope: world\n  - name: imm\n    scope: role\n",
        )
        .unwrap();
        let err = ChannelTable::from_file(&f, &ScopeRegistry::with_builtin()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "channel imm: scope \"role\" requires a role threshold"
        );
    }

    #[test]
    fn bad_role_and_duplicates_fail_load() {
        let scopes = ScopeRegistry::with_builtin();
        let bad_role = vec![ChannelDef {
            name: "imm".to_string(),
            scope: "role".to_string(),
            min_role: Some("wizard".to_string()),
            aliases: vec![],
            description: None,
        }];
        assert!(matches!(
            ChannelTable::from_defs(&bad_role, &scopes).unwrap_err(),
            ScopeError::Channel { .. }
        ));

        let dup = vec![
            ChannelDef {
                name: "ooc".to_string(),
                scope: "world".to_string(),
                min_role: None,
                aliases: vec![],
                description: None,
            },
            ChannelDef {
                name: "chat".to_string(),
                scope: "world".to_string(),
                min_role: None,
                aliases: vec!["OOC".to_string()],
                description: None,
            },
        ];
        assert_eq!(
            ChannelTable::from_defs(&dup, &scopes).unwrap_err(),
            ScopeError::DuplicateChannel("ooc".to_string())
        );
    }

    #[test]
    fn send_resolves_against_current_world() {
        let t = table();
        let mut w = World::new();
        w.add_room(Room::new("r1", "R1"));
        w.add_room(Room::new("r2", "R2"));
        let s = w
            .spawn_character("S", Some(SessionId(1)), Role::Player, "r1")
            .unwrap();
        let a = w
            .spawn_character("A", Some(SessionId(2)), Role::Builder, "r2")
            .unwrap();

        assert_eq!(t.send("gossip", &w, s).unwrap().character_ids(), vec![a]);
        assert!(t.send("say", &w, s).unwrap().is_empty());
        assert!(t.send("gtell", &w, s).unwrap().is_empty());
        assert_eq!(t.send("imm", &w, s).unwrap().character_ids(), vec![a]);

        w.move_character(a, "r1").unwrap();
        assert_eq!(t.send("say", &w, s).unwrap().character_ids(), vec![a]);

        w.set_role(a, Role::Player).unwrap();
        assert!(t.send("imm", &w, s).unwrap().is_empty());

        assert!(t.send("nope", &w, s).is_err());
        // Unknown sender: nobody to exclude.
        assert_eq!(t.send("gossip", &w, 404).unwrap().character_ids(), vec![s, a]);
    }
}

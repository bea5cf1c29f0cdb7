use anyhow::Context;
use mudchan::delivery::{deliverable_sessions, listening_rooms};
use mudchan::{CharacterId, ChannelTable, Recipient, RecipientSet, Role, SessionId, World};
use tracing::info;

/// Game-loop stand-in: owns the world, applies one command at a time.
pub struct Sim {
    pub world: World,
    pub channels: ChannelTable,
    next_session: u64,
}

impl Sim {
    pub fn new(world: World, channels: ChannelTable) -> Self {
        Self {
            world,
            channels,
            next_session: 1,
        }
    }

    fn char_id(&self, token: &str) -> anyhow::Result<CharacterId> {
        self.world
            .find_character(token)
            .with_context(|| format!("no such character: {token} (or ambiguous)"))
    }

    fn name_of(&self, r: &Recipient) -> String {
        match r {
            Recipient::Character(cid) => self
                .world
                .character(*cid)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("#{cid}")),
            other => other.to_string(),
        }
    }

    fn render_audience(&self, channel: &str, scope: &str, from: &str, got: &RecipientSet) -> String {
        let names = got.iter().map(|r| self.name_of(r)).collect::<Vec<_>>();
        let sessions = deliverable_sessions(&self.world, got)
            .into_iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        let rooms = listening_rooms(&self.world, got);

        let mut s = format!("[{channel}/{scope}] {from} -> ");
        if names.is_empty() {
            s.push_str("nobody");
        } else {
            s.push_str(&names.join(", "));
        }
        s.push_str(&format!(" (sessions: {})", sessions.len()));
        if !rooms.is_empty() {
            s.push_str(&format!(" (rooms: {})", rooms.join(", ")));
        }
        s
    }

    /// Runs one command line. `Ok(None)` means nothing to print.
    pub fn exec(&mut self, line: &str) -> anyhow::Result<Option<String>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let words = line.split_whitespace().collect::<Vec<_>>();

        match words.as_slice() {
            ["help"] => Ok(Some(HELP.to_string())),

            ["login", name, room, rest @ ..] => {
                let role = match rest.first() {
                    Some(r) => Role::parse(r).with_context(|| format!("unknown role: {r}"))?,
                    None => Role::Player,
                };
                let sid = SessionId(self.next_session);
                self.next_session += 1;
                let cid = self.world.spawn_character(*name, Some(sid), role, room)?;
                info!(cid, session = %sid, room = *room, "login");
                Ok(Some(format!("{name} logged in as #{cid} ({sid}, {role})")))
            }

            ["mob", name, room] => {
                let cid = self.world.spawn_mob(*name, room)?;
                Ok(Some(format!("mob {name} is #{cid}")))
            }

            ["logout", name] => {
                let cid = self.char_id(name)?;
                let sid = self
                    .world
                    .character(cid)
                    .and_then(|c| c.controller)
                    .with_context(|| format!("{name} is not a player"))?;
                let gone = self.world.detach_session(sid);
                Ok(Some(format!("{sid} detached ({} characters)", gone.len())))
            }

            ["go", name, room] => {
                let cid = self.char_id(name)?;
                self.world.move_character(cid, room)?;
                Ok(Some(format!("{name} -> {room}")))
            }

            ["limbo", name] => {
                let cid = self.char_id(name)?;
                self.world.unplace_character(cid)?;
                Ok(Some(format!("{name} is nowhere")))
            }

            ["role", name, role] => {
                let cid = self.char_id(name)?;
                let role = Role::parse(role).with_context(|| format!("unknown role: {role}"))?;
                self.world.set_role(cid, role)?;
                Ok(Some(format!("{name} is now {role}")))
            }

            ["party", "create", name] => {
                let cid = self.char_id(name)?;
                let pid = self.world.party_create(cid)?;
                Ok(Some(format!("party {pid} created")))
            }
            ["party", "join", name, leader] => {
                let cid = self.char_id(name)?;
                let lid = self.char_id(leader)?;
                let pid = self
                    .world
                    .character(lid)
                    .and_then(|c| c.party)
                    .with_context(|| format!("{leader} is not in a party"))?;
                self.world.party_join(cid, pid)?;
                Ok(Some(format!("{name} joined party {pid}")))
            }
            ["party", "leave", name] => {
                let cid = self.char_id(name)?;
                self.world.party_leave(cid);
                Ok(Some(format!("{name} left their party")))
            }
            ["party", "disband", name] => {
                let cid = self.char_id(name)?;
                let pid = self
                    .world
                    .character(cid)
                    .and_then(|c| c.party)
                    .with_context(|| format!("{name} is not in a party"))?;
                self.world.party_disband(pid);
                Ok(Some(format!("party {pid} disbanded")))
            }

            ["send", name, channel, ..] => {
                let cid = self.char_id(name)?;
                let ch = self.channels.require(channel)?;
                let got = self.channels.send(channel, &self.world, cid)?;
                Ok(Some(self.render_audience(&ch.name, ch.scope(), name, &got)))
            }

            ["who"] => {
                let mut xs = self
                    .world
                    .characters()
                    .map(|c| {
                        format!(
                            "{} #{} {} room={} party={}{}",
                            c.name,
                            c.id,
                            c.role,
                            c.room_id.as_deref().unwrap_or("-"),
                            c.party.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
                            if c.is_player() { "" } else { " (mob)" },
                        )
                    })
                    .collect::<Vec<_>>();
                xs.sort();
                if xs.is_empty() {
                    return Ok(Some("nobody online".to_string()));
                }
                Ok(Some(xs.join("\n")))
            }

            ["channels"] => {
                let xs = self
                    .channels
                    .iter()
                    .map(|c| format!("{} ({})", c.name, c.scope()))
                    .collect::<Vec<_>>();
                Ok(Some(xs.join("\n")))
            }

            ["rooms"] => Ok(Some(self.world.room_ids().join("\n"))),

            _ => anyhow::bail!("huh? (try: help)"),
        }
    }
}

const HELP: &str = "\
commands:
  login <name> <room> [role]    connect a player
  mob <name> <room>             spawn a mob
  logout <name>                 drop the player's session
  go <name> <room>              move
  limbo <name>                  remove from every room
  role <name> <role>            set role rank
  party create|leave|disband <name>
  party join <name> <leader>
  send <name> <channel> <msg>   resolve the channel's audience
  who | channels | rooms";

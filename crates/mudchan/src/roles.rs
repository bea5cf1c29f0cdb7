use serde::{Deserialize, Serialize};

/// Permission rank. Ordered: a gate at `Helper` admits `Helper`, `Builder` and `Admin`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    #[default]
    Player,
    Helper,
    Builder,
    Admin,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::Guest,
        Role::Player,
        Role::Helper,
        Role::Builder,
        Role::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Player => "player",
            Role::Helper => "helper",
            Role::Builder => "builder",
            Role::Admin => "admin",
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        Self::ALL.get(rank as usize).copied()
    }

    /// Accepts a role name (plus a few aliases) or a numeric rank.
    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim().to_ascii_lowercase();
        if let Ok(n) = t.parse::<u8>() {
            return Self::from_rank(n);
        }
        match t.as_str() {
            "guest" => Some(Role::Guest),
            "player" | "mortal" => Some(Role::Player),
            "helper" | "newbie_helper" => Some(Role::Helper),
            "builder" | "immortal" | "imm" => Some(Role::Builder),
            "admin" | "implementor" | "imp" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

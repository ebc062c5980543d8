//! System notices
//!
//! Team and channel housekeeping events (members added, team created, git
//! pushes, ...) are exported as records with rendered, human-readable text.

/// Team role attached to membership notices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeamRole {
    #[default]
    None,
    Reader,
    Writer,
    Admin,
    Owner,
    Bot,
    RestrictedBot,
    Unknown,
}

impl TeamRole {
    /// Decode the numeric role used on the wire
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Reader,
            2 => Self::Writer,
            3 => Self::Admin,
            4 => Self::Owner,
            5 => Self::Bot,
            6 => Self::RestrictedBot,
            _ => Self::Unknown,
        }
    }

    /// Suffix such as `" as admin"` (empty for `None`)
    fn as_suffix(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Reader => " as reader",
            Self::Writer => " as writer",
            Self::Admin => " as admin",
            Self::Owner => " as owner",
            Self::Bot => " as bot",
            Self::RestrictedBot => " as restricted bot",
            Self::Unknown => " as <unknown>",
        }
    }
}

/// Message retention policy announced by a retention change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Keep messages forever
    Retain,
    /// Expire messages after `age_secs`
    Expire { age_secs: u64 },
    /// Follow the team policy
    Inherit,
    /// Exploding messages after `age_secs`
    Ephemeral { age_secs: u64 },
}

/// A pushed git ref with its commit count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRef {
    pub name: String,
    pub commits: usize,
}

/// Structured system notice
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemNotice {
    AddedToTeam {
        team: String,
        adder: String,
        addee: String,
        role: TeamRole,
    },
    InviteAddedToTeam {
        team: String,
        adder: String,
        inviter: String,
        invitee: String,
        role: TeamRole,
    },
    ComplexTeam {
        team: String,
    },
    CreateTeam {
        team: String,
        creator: String,
    },
    GitPush {
        team: String,
        pusher: String,
        repo: String,
        refs: Vec<GitRef>,
    },
    ChangeAvatar {
        team: String,
        user: String,
    },
    ChangeRetention {
        user: String,
        is_team: bool,
        is_inherit: bool,
        policy: RetentionPolicy,
    },
    BulkAddToConv {
        usernames: Vec<String>,
    },
    NewChannel {
        creator: String,
        name: String,
        /// Number of channels created at once
        count: usize,
    },
    /// Any notice type this exporter does not render
    Other {
        system_type: i64,
    },
}

impl SystemNotice {
    /// Render the notice as a single line of text
    pub fn render(&self) -> String {
        match self {
            Self::AddedToTeam {
                team,
                adder,
                addee,
                role,
            } => format!("{adder} added {addee} to the team {team}{}", role.as_suffix()),
            Self::InviteAddedToTeam {
                team,
                adder,
                inviter,
                invitee,
                role,
            } => format!(
                "{adder} added {invitee} to the team {team}{} (invited by {inviter})",
                role.as_suffix()
            ),
            Self::ComplexTeam { team } => {
                format!("{team} is now a 'big' team with multiple channels")
            }
            Self::CreateTeam { team, creator } => format!("{creator} created the team {team}"),
            Self::GitPush {
                team: _,
                pusher,
                repo,
                refs,
            } => {
                let total: usize = refs.iter().map(|r| r.commits).sum();
                let names = refs
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("git ({repo}): {pusher} pushed {total} commits to {names}")
            }
            Self::ChangeAvatar { team, user } => format!("{user} changed team avatar of {team}"),
            Self::ChangeRetention {
                user,
                is_team,
                is_inherit,
                policy,
            } => {
                let applies_to = if *is_team { "team" } else { "channel" };
                let inherit = if *is_inherit {
                    " to inherit from the team policy"
                } else {
                    ""
                };
                let summary = match policy {
                    RetentionPolicy::Retain => " Messages will be retained indefinitely.".to_string(),
                    RetentionPolicy::Expire { age_secs } => {
                        format!(" Messages will expire after {}.", humanize_secs(*age_secs))
                    }
                    RetentionPolicy::Inherit => String::new(),
                    RetentionPolicy::Ephemeral { age_secs } => {
                        format!(" Messages will explode after {}.", humanize_secs(*age_secs))
                    }
                };
                format!("{user} changed the {applies_to} retention policy{inherit}.{summary}")
            }
            Self::BulkAddToConv { usernames } => {
                format!("added {} to the conversation", usernames.join(", "))
            }
            Self::NewChannel {
                creator,
                name,
                count,
            } => {
                if *count > 1 {
                    format!("{creator} created #{name} and {} other new channels", count - 1)
                } else {
                    format!("{creator} created a new channel #{name}")
                }
            }
            Self::Other { system_type } => format!("System message: unknown ({system_type})"),
        }
    }
}

/// Whole days or hours, otherwise seconds
fn humanize_secs(secs: u64) -> String {
    let plural = |n: u64| if n == 1 { "" } else { "s" };
    const HOUR: u64 = 60 * 60;
    const DAY: u64 = 24 * HOUR;

    if secs >= DAY && secs % DAY == 0 {
        let days = secs / DAY;
        format!("{days} day{}", plural(days))
    } else if secs >= HOUR && secs % HOUR == 0 {
        let hours = secs / HOUR;
        format!("{hours} hour{}", plural(hours))
    } else {
        format!("{secs} second{}", plural(secs))
    }
}

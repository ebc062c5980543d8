//! Tests for system notice rendering

use crate::system::{GitRef, RetentionPolicy, SystemNotice, TeamRole};

#[test]
fn test_added_to_team_with_role() {
    let notice = SystemNotice::AddedToTeam {
        team: "family".into(),
        adder: "alice".into(),
        addee: "bob".into(),
        role: TeamRole::from_code(3),
    };
    assert_eq!(notice.render(), "alice added bob to the team family as admin");
}

#[test]
fn test_added_to_team_without_role() {
    let notice = SystemNotice::AddedToTeam {
        team: "family".into(),
        adder: "alice".into(),
        addee: "bob".into(),
        role: TeamRole::None,
    };
    assert_eq!(notice.render(), "alice added bob to the team family");
}

#[test]
fn test_unknown_role_code() {
    assert_eq!(TeamRole::from_code(42), TeamRole::Unknown);
}

#[test]
fn test_git_push_counts_commits() {
    let notice = SystemNotice::GitPush {
        team: "family".into(),
        pusher: "alice".into(),
        repo: "dotfiles".into(),
        refs: vec![
            GitRef {
                name: "refs/heads/main".into(),
                commits: 2,
            },
            GitRef {
                name: "refs/heads/dev".into(),
                commits: 3,
            },
        ],
    };
    assert_eq!(
        notice.render(),
        "git (dotfiles): alice pushed 5 commits to refs/heads/main,refs/heads/dev"
    );
}

#[test]
fn test_retention_expire_humanizes_days() {
    let notice = SystemNotice::ChangeRetention {
        user: "alice".into(),
        is_team: false,
        is_inherit: false,
        policy: RetentionPolicy::Expire {
            age_secs: 7 * 24 * 3600,
        },
    };
    assert_eq!(
        notice.render(),
        "alice changed the channel retention policy. Messages will expire after 7 days."
    );
}

#[test]
fn test_retention_ephemeral_humanizes_single_hour() {
    let notice = SystemNotice::ChangeRetention {
        user: "alice".into(),
        is_team: true,
        is_inherit: false,
        policy: RetentionPolicy::Ephemeral { age_secs: 3600 },
    };
    assert_eq!(
        notice.render(),
        "alice changed the team retention policy. Messages will explode after 1 hour."
    );
}

#[test]
fn test_retention_inherit() {
    let notice = SystemNotice::ChangeRetention {
        user: "alice".into(),
        is_team: false,
        is_inherit: true,
        policy: RetentionPolicy::Inherit,
    };
    assert_eq!(
        notice.render(),
        "alice changed the channel retention policy to inherit from the team policy."
    );
}

#[test]
fn test_new_channel_batch() {
    let single = SystemNotice::NewChannel {
        creator: "alice".into(),
        name: "random".into(),
        count: 1,
    };
    assert_eq!(single.render(), "alice created a new channel #random");

    let many = SystemNotice::NewChannel {
        creator: "alice".into(),
        name: "random".into(),
        count: 3,
    };
    assert_eq!(many.render(), "alice created #random and 2 other new channels");
}

#[test]
fn test_other_notice() {
    let notice = SystemNotice::Other { system_type: 99 };
    assert_eq!(notice.render(), "System message: unknown (99)");
}

use std::fmt::Write;

use url::Url;

use crate::{
    bot::{message_builder::MessageBuilder, utils::shorten_content},
    users::Identities,
    webhooks::github::{
        GitHubEvent, GitHubUser, PullRequestEvent, PullRequestReviewEvent, PushEvent, RefEvent,
        RefType, Repository,
    },
};

const EMOJI_PUSH: &str = "🚀";
const EMOJI_PR: &str = "🔃";
const EMOJI_CREATE: &str = "✨";
const EMOJI_DELETE: &str = "🗑️";
const EMOJI_BRANCH: &str = "🌿";
const EMOJI_COMMIT: &str = "📝";
const EMOJI_AUTHOR: &str = "👤";
const EMOJI_LINK: &str = "📎";
const EMOJI_REVIEWERS: &str = "👀";
const EMOJI_PR_NUMBER: &str = "📌";
const EMOJI_TOOLS: &str = "🔧";

/// Renders the Markdown notification for an event. Display names go through `users`.
pub fn handle_github_event(event: &GitHubEvent, users: &Identities) -> String {
    match event {
        GitHubEvent::Push(event) => handle_push(event, users),
        GitHubEvent::PullRequest(event) => handle_pull_request(event, users),
        GitHubEvent::PullRequestReview(event) => handle_pull_request_review(event, users),
        GitHubEvent::Create(event) => handle_create(event, users),
        GitHubEvent::Delete(event) => handle_delete(event, users),
    }
}

fn handle_push(event: &PushEvent, users: &Identities) -> String {
    if event.creates_ref() || event.deletes_ref() {
        let change = if event.creates_ref() {
            RefChange::Created
        } else {
            RefChange::Deleted
        };
        return handle_ref_change(
            change,
            &event.ref_type(),
            event.ref_name(),
            &event.repository,
            &event.sender,
            users,
        );
    }

    let mut message = MessageBuilder::new();

    message.label(EMOJI_PUSH, "New push on");
    message.code_text(event.repository.full_name());
    message.newline();

    message.label(EMOJI_BRANCH, "Branch/Tag:");
    message.code_text(event.ref_name());
    message.newline();

    message.label(EMOJI_COMMIT, "Commits:");
    write!(message, "{}", event.commits.len()).unwrap();
    message.newline();

    message.label(EMOJI_TOOLS, "Last commit:");
    let commit_message = event.last_commit_message().unwrap_or("No message");
    write!(message, "{}", shorten_content(commit_message)).unwrap();
    message.newline();

    author_line(&mut message, &event.sender, users);
    link_line(&mut message, "View repository", event.repository.html_url().as_ref());

    message.build()
}

fn handle_pull_request(event: &PullRequestEvent, users: &Identities) -> String {
    let pr = &event.pull_request;
    let mut message = MessageBuilder::new();

    message.label(EMOJI_PR, "New pull request on");
    message.code_text(event.repository.full_name());
    message.newline();

    message.label(EMOJI_PR_NUMBER, &format!("PR #{}:", pr.number()));
    write!(message, "{}", shorten_content(pr.title())).unwrap();
    message.newline();

    message.label(EMOJI_BRANCH, "Branch:");
    message.code_text(pr.head.name());
    write!(message, " → ").unwrap();
    message.code_text(pr.base.name());
    message.newline();

    author_line(&mut message, &event.sender, users);

    let reviewers = pr
        .requested_reviewers
        .iter()
        .map(|reviewer| users.display_name(reviewer.login()))
        .collect::<Vec<_>>()
        .join(", ");
    message.label(EMOJI_REVIEWERS, "Reviewers:");
    write!(message, "{}", reviewers).unwrap();
    message.newline();

    link_line(&mut message, "View PR", pr.html_url().as_ref());

    message.build()
}

/// Emoji and wording for a review state.
fn review_state(state: &str) -> (&'static str, &'static str) {
    match state {
        "approved" => ("✅", "approved"),
        "changes_requested" => ("🛑", "requested changes on"),
        "commented" => ("💬", "commented on"),
        _ => ("🔔", "reviewed"),
    }
}

fn handle_pull_request_review(event: &PullRequestReviewEvent, users: &Identities) -> String {
    let pr = &event.pull_request;
    let review = &event.review;
    let (emoji, verb) = review_state(&review.state());

    let mut message = MessageBuilder::new();

    write!(
        message,
        "{} {} {} the PR of {}:",
        emoji,
        users.display_name(review.user.login()),
        verb,
        users.display_name(pr.user.login()),
    )
    .unwrap();
    message.newline();

    message.label(EMOJI_PR_NUMBER, &format!("PR #{}:", pr.number()));
    write!(message, "{}", shorten_content(pr.title())).unwrap();
    message.newline();

    let body = review.body().trim();
    if !body.is_empty() {
        message.bold();
        write!(message, "Comment:").unwrap();
        message.newline();
        write!(message, "{}", shorten_content(body)).unwrap();
        message.newline();
    }

    link_line(&mut message, "View PR", pr.html_url().as_ref());

    message.build()
}

fn handle_create(event: &RefEvent, users: &Identities) -> String {
    handle_ref_change(
        RefChange::Created,
        &event.ref_type(),
        event.ref_name(),
        &event.repository,
        &event.sender,
        users,
    )
}

fn handle_delete(event: &RefEvent, users: &Identities) -> String {
    handle_ref_change(
        RefChange::Deleted,
        &event.ref_type(),
        event.ref_name(),
        &event.repository,
        &event.sender,
        users,
    )
}

#[derive(Debug, Clone, Copy)]
enum RefChange {
    Created,
    Deleted,
}

fn ref_noun(ref_type: &RefType) -> String {
    match ref_type {
        RefType::Branch => "branch".to_owned(),
        RefType::Tag => "tag".to_owned(),
        RefType::Other(kind) => format!("object ({})", kind),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Shared by the `create`/`delete` events and by pushes creating or deleting a ref.
fn handle_ref_change(
    change: RefChange,
    ref_type: &RefType,
    ref_name: &str,
    repository: &Repository,
    sender: &GitHubUser,
    users: &Identities,
) -> String {
    let noun = ref_noun(ref_type);
    let (emoji, action) = match change {
        RefChange::Created => (EMOJI_CREATE, format!("New {} created:", noun)),
        RefChange::Deleted => (EMOJI_DELETE, format!("{} deleted:", capitalize(&noun))),
    };

    let mut message = MessageBuilder::new();

    message.label(emoji, &action);
    message.code_text(repository.full_name());
    message.newline();

    message.label(EMOJI_BRANCH, "Name:");
    message.code_text(ref_name);
    message.newline();

    author_line(&mut message, sender, users);
    link_line(&mut message, "View repository", repository.html_url().as_ref());

    message.build()
}

fn author_line(message: &mut MessageBuilder, sender: &GitHubUser, users: &Identities) {
    message.label(EMOJI_AUTHOR, "Author:");
    write!(message, "{}", users.display_name(sender.login())).unwrap();
    message.newline();
}

fn link_line(message: &mut MessageBuilder, text: &str, url: Option<&Url>) {
    write!(message, "{} ", EMOJI_LINK).unwrap();
    message.link(text, url);
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::webhooks::github::{EventKind, InboundEvent};

    use super::*;

    const NULL_SHA: &str = "0000000000000000000000000000000000000000";

    fn format(kind: &str, payload: Value, users: &Identities) -> String {
        let inbound =
            InboundEvent::parse(EventKind::from_header(kind), payload.to_string().as_bytes())
                .unwrap();
        let event = GitHubEvent::from_inbound(&inbound)
            .expect("payload should deserialize")
            .expect("kind should be announced");
        handle_github_event(&event, users)
    }

    fn users() -> Identities {
        Identities::from_iter([("octocat", "octo_cat"), ("hubot", "hubot_tg")])
    }

    fn repository() -> Value {
        json!({
            "full_name": "prologin/site",
            "html_url": "https://github.com/prologin/site",
        })
    }

    #[test]
    fn push() {
        let long_message = format!("{} [click](https://evil.example)", "a".repeat(250));
        let payload = json!({
            "ref": "refs/heads/main",
            "before": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
            "after": "0d1a26e67d8f5eaf1f6ba5c57fc3c7d91ac0fd1c",
            "created": false,
            "deleted": false,
            "commits": [{ "id": "0d1a26e6", "message": long_message }],
            "head_commit": { "id": "0d1a26e6", "message": long_message },
            "repository": repository(),
            "sender": { "login": "Octocat", "html_url": "https://github.com/octocat" },
        });

        let message = format("push", payload, &users());

        assert_eq!(
            message,
            format!(
                "🚀 *New push on* `prologin/site`\n\
                 🌿 *Branch/Tag:* `main`\n\
                 📝 *Commits:* 1\n\
                 🔧 *Last commit:* {}…\n\
                 👤 *Author:* @octo\\_cat\n\
                 📎 [View repository](https://github.com/prologin/site)",
                "a".repeat(200)
            )
        );
    }

    #[test]
    fn push_escapes_commit_message() {
        let payload = json!({
            "ref": "refs/heads/main",
            "commits": [{ "message": "fix *all* the [things](https://evil.example)" }],
            "head_commit": { "message": "fix *all* the [things](https://evil.example)" },
            "repository": repository(),
            "sender": { "login": "someone" },
        });

        let message = format("push", payload, &users());

        assert!(message.contains(r"fix \*all\* the \[things](https://evil.example)"));
        assert!(message.contains("👤 *Author:* someone\n"));
    }

    #[test]
    fn push_creating_a_branch() {
        let payload = json!({
            "ref": "refs/heads/feature",
            "before": NULL_SHA,
            "after": "0d1a26e67d8f5eaf1f6ba5c57fc3c7d91ac0fd1c",
            "created": true,
            "deleted": false,
            "commits": [],
            "head_commit": { "message": "initial" },
            "repository": repository(),
            "sender": { "login": "hubot" },
        });

        let message = format("push", payload, &users());

        assert_eq!(
            message,
            "✨ *New branch created:* `prologin/site`\n\
             🌿 *Name:* `feature`\n\
             👤 *Author:* @hubot\\_tg\n\
             📎 [View repository](https://github.com/prologin/site)"
        );
        assert!(!message.contains("New push"));
    }

    #[test]
    fn push_deleting_a_tag() {
        let payload = json!({
            "ref": "refs/tags/v1.2",
            "before": "0d1a26e67d8f5eaf1f6ba5c57fc3c7d91ac0fd1c",
            "after": NULL_SHA,
            "created": false,
            "deleted": true,
            "commits": [],
            "head_commit": null,
            "repository": repository(),
            "sender": { "login": "hubot" },
        });

        let message = format("push", payload, &users());

        assert!(message.starts_with("🗑️ *Tag deleted:* `prologin/site`\n🌿 *Name:* `v1.2`\n"));
    }

    #[test]
    fn push_with_empty_payload() {
        let message = format("push", json!({}), &Identities::default());

        assert_eq!(
            message,
            "🚀 *New push on* `Unknown`\n\
             🌿 *Branch/Tag:* \n\
             📝 *Commits:* 0\n\
             🔧 *Last commit:* No message\n\
             👤 *Author:* Unknown\n\
             📎 View repository"
        );
    }

    #[test]
    fn pull_request_opened() {
        let payload = json!({
            "action": "opened",
            "number": 42,
            "pull_request": {
                "number": 42,
                "html_url": "https://github.com/prologin/site/pull/42",
                "title": "Add *dark* mode",
                "user": { "login": "Octocat" },
                "requested_reviewers": [{ "login": "hubot" }, { "login": "stranger" }],
                "head": { "ref": "dark_mode" },
                "base": { "ref": "main" },
            },
            "repository": repository(),
            "sender": { "login": "Octocat" },
        });

        let message = format("pull_request", payload, &users());

        assert_eq!(
            message,
            "🔃 *New pull request on* `prologin/site`\n\
             📌 *PR #42:* Add \\*dark\\* mode\n\
             🌿 *Branch:* `dark_mode` → `main`\n\
             👤 *Author:* @octo\\_cat\n\
             👀 *Reviewers:* @hubot\\_tg, stranger\n\
             📎 [View PR](https://github.com/prologin/site/pull/42)"
        );
    }

    #[test]
    fn pull_request_with_bracketed_title_and_broken_link() {
        let payload = json!({
            "action": "opened",
            "pull_request": {
                "number": 1,
                "html_url": "",
                "title": "[WIP] dark mode",
            },
            "repository": { "full_name": "prologin/site", "html_url": "::" },
            "sender": { "login": "someone" },
        });

        let message = format("pull_request", payload, &users());

        assert!(message.contains("📌 *PR #1:* \\[WIP] dark mode\n"));
        assert!(message.ends_with("📎 View PR"));
    }

    #[test]
    fn pull_request_without_reviewers() {
        let payload = json!({
            "action": "reopened",
            "pull_request": { "requested_reviewers": [] },
            "sender": { "login": "someone" },
        });

        let message = format("pull_request", payload, &users());

        assert!(message.contains("📌 *PR #N/A:* No title\n"));
        assert!(message.contains("🌿 *Branch:* `Unknown` → `Unknown`\n"));
        assert!(message.contains("👀 *Reviewers:* \n"));
    }

    fn review_payload(state: Option<&str>, body: Option<&str>) -> Value {
        json!({
            "action": "submitted",
            "review": {
                "state": state,
                "body": body,
                "user": { "login": "hubot" },
            },
            "pull_request": {
                "number": 7,
                "html_url": "https://github.com/prologin/site/pull/7",
                "title": "Fix login",
                "user": { "login": "octocat" },
            },
            "repository": repository(),
            "sender": { "login": "hubot" },
        })
    }

    #[test]
    fn review_approved_without_body() {
        let message = format(
            "pull_request_review",
            review_payload(Some("approved"), Some("")),
            &users(),
        );

        assert_eq!(
            message,
            "✅ @hubot\\_tg approved the PR of @octo\\_cat:\n\
             📌 *PR #7:* Fix login\n\
             📎 [View PR](https://github.com/prologin/site/pull/7)"
        );
        assert!(!message.contains("Comment"));
    }

    #[test]
    fn review_with_body() {
        let message = format(
            "pull_request_review",
            review_payload(Some("CHANGES_REQUESTED"), Some("Please add _tests_")),
            &users(),
        );

        assert_eq!(
            message,
            "🛑 @hubot\\_tg requested changes on the PR of @octo\\_cat:\n\
             📌 *PR #7:* Fix login\n\
             *Comment:*\n\
             Please add \\_tests\\_\n\
             📎 [View PR](https://github.com/prologin/site/pull/7)"
        );
    }

    #[test]
    fn review_states() {
        let message = format(
            "pull_request_review",
            review_payload(None, None),
            &Identities::default(),
        );
        assert!(message.starts_with("💬 hubot commented on the PR of octocat:\n"));

        let message = format(
            "pull_request_review",
            review_payload(Some("dismissed"), None),
            &Identities::default(),
        );
        assert!(message.starts_with("🔔 hubot reviewed the PR of octocat:\n"));
    }

    #[test]
    fn create_and_delete_refs() {
        let payload = |ref_type: Option<&str>| {
            json!({
                "ref": "v2.0",
                "ref_type": ref_type,
                "repository": repository(),
                "sender": { "login": "octocat" },
            })
        };

        assert!(format("create", payload(Some("tag")), &users())
            .starts_with("✨ *New tag created:* `prologin/site`\n🌿 *Name:* `v2.0`\n👤 *Author:* @octo\\_cat\n"));
        assert!(format("create", payload(Some("branch")), &users())
            .starts_with("✨ *New branch created:*"));
        assert!(format("create", payload(Some("repository")), &users())
            .starts_with("✨ *New object (repository) created:*"));

        assert!(format("delete", payload(Some("branch")), &users())
            .starts_with("🗑️ *Branch deleted:* `prologin/site`"));
        assert!(format("delete", payload(None), &users())
            .starts_with("🗑️ *Object (Unknown) deleted:*"));
    }

    #[test]
    fn formatting_is_deterministic() {
        let payload = review_payload(Some("approved"), Some("LGTM"));
        let first = format("pull_request_review", payload.clone(), &users());
        let second = format("pull_request_review", payload, &users());
        assert_eq!(first, second);
    }
}

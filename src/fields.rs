//! Display fields for each watched event.
//!
//! Every watched type has a table keyed by its action (or ref type for
//! `create`/`delete`). A row names the action phrase and the function that
//! appends the detail fields. Keys missing from a table fall back to a
//! generic `"<TypeName> (<action>)"` action field so new GitHub actions are
//! still announced.

use std::fmt::Write as _;

use crate::attachment::Field;
use crate::event::{
    ChangeFrom, Changes, CommitCommentEvent, EventKind, InboundEvent, IssueCommentEvent, IssuesEvent,
    PullRequestEvent, PullRequestReviewCommentEvent, PullRequestReviewEvent, PushEvent, RefEvent,
    User,
};

pub const ACCOUNT: &str = "account";
pub const ACTION: &str = "action";
pub const LINK: &str = "link";
pub const COMMIT: &str = "Commit";

/// Ordered field accumulator. Values are inserted even when empty.
#[derive(Debug, Default)]
pub struct FieldList(Vec<Field>);

impl FieldList {
    fn for_sender(sender: &User) -> Self {
        let mut list = FieldList(Vec::new());
        list.push_short(ACCOUNT, sender.login.as_str());
        list
    }

    pub fn push(&mut self, title: &str, value: impl Into<String>) {
        self.0.push(Field::new(title, value, false));
    }

    pub fn push_short(&mut self, title: &str, value: impl Into<String>) {
        self.0.push(Field::new(title, value, true));
    }

    pub fn into_inner(self) -> Vec<Field> {
        self.0
    }
}

type Detail<E> = fn(&E, &mut FieldList);

/// `(key, action phrase, detail fields)`
type ActionTable<E> = &'static [(&'static str, &'static str, Detail<E>)];

/// Before/after pair for one edited attribute; nothing when GitHub reports no change.
fn push_change(
    change: Option<&ChangeFrom>,
    before: &str,
    after: &str,
    current: &str,
    out: &mut FieldList,
) {
    if let Some(change) = change {
        out.push(before, change.from.as_str());
        out.push(after, current);
    }
}

fn title_change(changes: &Option<Changes>) -> Option<&ChangeFrom> {
    changes.as_ref().and_then(|c| c.title.as_ref())
}

fn body_change(changes: &Option<Changes>) -> Option<&ChangeFrom> {
    changes.as_ref().and_then(|c| c.body.as_ref())
}

fn login(user: Option<&User>) -> &str {
    user.map(|u| u.login.as_str()).unwrap_or_default()
}

// commit_comment

fn commit_comment_created(e: &CommitCommentEvent, out: &mut FieldList) {
    out.push("comment", e.comment.body.as_str());
    out.push("commit id", e.comment.commit_id.as_str());
    out.push(LINK, e.comment.html_url.as_str());
}

const COMMIT_COMMENT: ActionTable<CommitCommentEvent> =
    &[("created", "commented on a commit", commit_comment_created)];

// create / delete

fn ref_branch(e: &RefEvent, out: &mut FieldList) {
    out.push("branch", e.r#ref.as_str());
    out.push(LINK, e.repository.html_url.as_str());
}

fn ref_tag(e: &RefEvent, out: &mut FieldList) {
    out.push("tag", e.r#ref.as_str());
    out.push(LINK, e.repository.html_url.as_str());
}

const CREATE: ActionTable<RefEvent> = &[
    ("branch", "branch created", ref_branch),
    ("tag", "tag created", ref_tag),
];

const DELETE: ActionTable<RefEvent> = &[
    ("branch", "branch deleted", ref_branch),
    ("tag", "tag deleted", ref_tag),
];

// issue_comment

fn issue_comment_body(e: &IssueCommentEvent, out: &mut FieldList) {
    out.push("comment", e.comment.body.as_str());
    out.push(LINK, e.comment.html_url.as_str());
}

fn issue_comment_edited(e: &IssueCommentEvent, out: &mut FieldList) {
    push_change(
        body_change(&e.changes),
        "comment (before)",
        "comment (after)",
        &e.comment.body,
        out,
    );
    out.push(LINK, e.comment.html_url.as_str());
}

const ISSUE_COMMENT: ActionTable<IssueCommentEvent> = &[
    ("created", "comment created", issue_comment_body),
    ("edited", "comment edited", issue_comment_edited),
    ("deleted", "comment deleted", issue_comment_body),
];

// issues

fn issue_title_body(e: &IssuesEvent, out: &mut FieldList) {
    out.push("title", e.issue.title.as_str());
    out.push("body", e.issue.body.as_str());
    out.push(LINK, e.issue.html_url.as_str());
}

fn issue_title(e: &IssuesEvent, out: &mut FieldList) {
    out.push("title", e.issue.title.as_str());
    out.push(LINK, e.issue.html_url.as_str());
}

fn issue_edited(e: &IssuesEvent, out: &mut FieldList) {
    push_change(
        title_change(&e.changes),
        "title (before)",
        "title (after)",
        &e.issue.title,
        out,
    );
    push_change(
        body_change(&e.changes),
        "body (before)",
        "body (after)",
        &e.issue.body,
        out,
    );
    out.push(LINK, e.issue.html_url.as_str());
}

fn issue_assignee(e: &IssuesEvent, out: &mut FieldList) {
    out.push("assignee", login(e.assignee.as_ref()));
    out.push(LINK, e.issue.html_url.as_str());
}

fn issue_label(e: &IssuesEvent, out: &mut FieldList) {
    out.push("label", e.label.as_ref().map(|l| l.name.as_str()).unwrap_or_default());
    out.push(LINK, e.issue.html_url.as_str());
}

fn issue_link(e: &IssuesEvent, out: &mut FieldList) {
    out.push(LINK, e.issue.html_url.as_str());
}

fn issue_transferred(e: &IssuesEvent, out: &mut FieldList) {
    out.push("link (before transfer)", e.issue.html_url.as_str());
}

fn issue_milestoned(e: &IssuesEvent, out: &mut FieldList) {
    let milestone = e
        .issue
        .milestone
        .as_ref()
        .map(|m| m.title.as_str())
        .unwrap_or_default();
    out.push("milestone", milestone);
    out.push(LINK, e.issue.html_url.as_str());
}

const ISSUES: ActionTable<IssuesEvent> = &[
    ("opened", "issue opened", issue_title_body),
    ("edited", "issue edited", issue_edited),
    ("deleted", "issue deleted", issue_title),
    ("closed", "issue closed", issue_title),
    ("reopened", "issue reopened", issue_title_body),
    ("assigned", "issue assigned", issue_assignee),
    ("unassigned", "issue unassigned", issue_assignee),
    ("labeled", "label added to issue", issue_label),
    ("unlabeled", "label removed from issue", issue_label),
    ("locked", "issue locked", issue_link),
    ("unlocked", "issue unlocked", issue_link),
    ("pinned", "issue pinned", issue_link),
    ("unpinned", "issue unpinned", issue_link),
    ("transferred", "issue transferred", issue_transferred),
    ("milestoned", "milestone set", issue_milestoned),
    ("demilestoned", "milestone removed", issue_link),
];

// pull_request / pull_request_target

fn pr_title_body(e: &PullRequestEvent, out: &mut FieldList) {
    out.push("title", e.pull_request.title.as_str());
    out.push("body", e.pull_request.body.as_str());
    out.push(LINK, e.pull_request.html_url.as_str());
}

fn pr_title(e: &PullRequestEvent, out: &mut FieldList) {
    out.push("title", e.pull_request.title.as_str());
    out.push(LINK, e.pull_request.html_url.as_str());
}

fn pr_edited(e: &PullRequestEvent, out: &mut FieldList) {
    push_change(
        title_change(&e.changes),
        "title (before)",
        "title (after)",
        &e.pull_request.title,
        out,
    );
    push_change(
        body_change(&e.changes),
        "body (before)",
        "body (after)",
        &e.pull_request.body,
        out,
    );
    out.push(LINK, e.pull_request.html_url.as_str());
}

fn pr_assignee(e: &PullRequestEvent, out: &mut FieldList) {
    out.push("assignee", login(e.assignee.as_ref()));
    out.push(LINK, e.pull_request.html_url.as_str());
}

fn pr_reviewer(e: &PullRequestEvent, out: &mut FieldList) {
    out.push("reviewer", login(e.requested_reviewer.as_ref()));
    out.push(LINK, e.pull_request.html_url.as_str());
}

fn pr_label(e: &PullRequestEvent, out: &mut FieldList) {
    out.push("label", e.label.as_ref().map(|l| l.name.as_str()).unwrap_or_default());
    out.push(LINK, e.pull_request.html_url.as_str());
}

fn pr_link(e: &PullRequestEvent, out: &mut FieldList) {
    out.push(LINK, e.pull_request.html_url.as_str());
}

const PULL_REQUEST: ActionTable<PullRequestEvent> = &[
    ("opened", "PR opened", pr_title_body),
    ("edited", "PR edited", pr_edited),
    ("closed", "PR closed", pr_title),
    ("reopened", "PR reopened", pr_title_body),
    ("assigned", "PR assigned", pr_assignee),
    ("unassigned", "PR unassigned", pr_assignee),
    ("review_requested", "PR review requested", pr_reviewer),
    ("review_request_removed", "PR review request removed", pr_reviewer),
    ("ready_for_review", "PR ready for review", pr_link),
    ("labeled", "label added to PR", pr_label),
    ("unlabeled", "label removed from PR", pr_label),
    ("locked", "PR locked", pr_link),
    ("unlocked", "PR unlocked", pr_link),
    ("synchronize", "new commits pushed to PR", pr_title),
];

// pull_request_review

fn review_submitted(e: &PullRequestReviewEvent, out: &mut FieldList) {
    out.push("title", e.pull_request.title.as_str());
    out.push("body", e.review.body.as_str());
    out.push(LINK, e.review.html_url.as_str());
}

const PULL_REQUEST_REVIEW: ActionTable<PullRequestReviewEvent> =
    &[("submitted", "PR reviewed", review_submitted)];

// pull_request_review_comment

fn review_comment_body(e: &PullRequestReviewCommentEvent, out: &mut FieldList) {
    out.push("comment", e.comment.body.as_str());
    out.push(LINK, e.comment.html_url.as_str());
}

fn review_comment_edited(e: &PullRequestReviewCommentEvent, out: &mut FieldList) {
    push_change(
        body_change(&e.changes),
        "comment (before)",
        "comment (after)",
        &e.comment.body,
        out,
    );
    out.push(LINK, e.comment.html_url.as_str());
}

const PULL_REQUEST_REVIEW_COMMENT: ActionTable<PullRequestReviewCommentEvent> = &[
    ("created", "PR comment created", review_comment_body),
    ("edited", "PR comment edited", review_comment_edited),
    ("deleted", "PR comment deleted", review_comment_body),
];

fn render<E>(kind: EventKind, sender: &User, key: &str, event: &E, table: ActionTable<E>) -> Vec<Field> {
    let mut fields = FieldList::for_sender(sender);
    match table.iter().find(|(k, _, _)| *k == key) {
        Some((_, phrase, detail)) => {
            fields.push_short(ACTION, *phrase);
            detail(event, &mut fields);
        }
        None => fields.push_short(ACTION, format!("{} ({})", kind.type_name(), key)),
    }
    fields.into_inner()
}

/// `<url|0123456> message\n` for every commit, in push order.
pub fn commit_lines(event: &PushEvent) -> String {
    let mut lines = String::new();
    for commit in &event.commits {
        // Writing to a String cannot fail
        let _ = writeln!(lines, "<{}|{}> {}", commit.url, commit.short_id(), commit.message);
    }
    lines
}

fn render_push(event: &PushEvent) -> Vec<Field> {
    let mut fields = FieldList::for_sender(&event.sender);
    fields.push_short(ACTION, "pushed");
    fields.push("target", event.r#ref.as_str());
    fields.push(COMMIT, commit_lines(event));
    fields.push(LINK, event.repository.html_url.as_str());
    fields.into_inner()
}

/// Fields announcing `event`. Empty for unwatched events.
pub fn extract(event: &InboundEvent) -> Vec<Field> {
    match event {
        InboundEvent::CommitComment(e) => {
            render(EventKind::CommitComment, &e.sender, &e.action, e, COMMIT_COMMENT)
        }
        InboundEvent::Create(e) => render(EventKind::Create, &e.sender, &e.ref_type, e, CREATE),
        InboundEvent::Delete(e) => render(EventKind::Delete, &e.sender, &e.ref_type, e, DELETE),
        InboundEvent::IssueComment(e) => {
            render(EventKind::IssueComment, &e.sender, &e.action, e, ISSUE_COMMENT)
        }
        InboundEvent::Issues(e) => render(EventKind::Issues, &e.sender, &e.action, e, ISSUES),
        InboundEvent::PullRequest(e) => {
            render(EventKind::PullRequest, &e.sender, &e.action, e, PULL_REQUEST)
        }
        InboundEvent::PullRequestReview(e) => render(
            EventKind::PullRequestReview,
            &e.sender,
            &e.action,
            e,
            PULL_REQUEST_REVIEW,
        ),
        InboundEvent::PullRequestReviewComment(e) => render(
            EventKind::PullRequestReviewComment,
            &e.sender,
            &e.action,
            e,
            PULL_REQUEST_REVIEW_COMMENT,
        ),
        InboundEvent::PullRequestTarget(e) => {
            render(EventKind::PullRequestTarget, &e.sender, &e.action, e, PULL_REQUEST)
        }
        InboundEvent::Push(e) => render_push(e),
        InboundEvent::Unwatched { .. } => Vec::new(),
    }
}

/// Keys with dedicated wording for `kind`. Push has a single shape and no key.
pub fn documented_actions(kind: EventKind) -> Vec<&'static str> {
    fn keys<E>(table: ActionTable<E>) -> Vec<&'static str> {
        table.iter().map(|(key, _, _)| *key).collect()
    }
    match kind {
        EventKind::CommitComment => keys(COMMIT_COMMENT),
        EventKind::Create => keys(CREATE),
        EventKind::Delete => keys(DELETE),
        EventKind::IssueComment => keys(ISSUE_COMMENT),
        EventKind::Issues => keys(ISSUES),
        EventKind::PullRequest | EventKind::PullRequestTarget => keys(PULL_REQUEST),
        EventKind::PullRequestReview => keys(PULL_REQUEST_REVIEW),
        EventKind::PullRequestReviewComment => keys(PULL_REQUEST_REVIEW_COMMENT),
        EventKind::Push => Vec::new(),
    }
}

//! Free-text task field extraction.
//!
//! Input is split into whitespace-delimited tokens and every token is matched
//! against an ordered tag grammar. Each tag kind is filled by the first token
//! that is recognized for it; later tokens of the same kind are left in the
//! title as ordinary text. A token that looks like a tag but does not
//! resolve (e.g. `due:someday`) is also ordinary text.
//!
//! ```text
//! [high]            priority, bracketed
//! priority:low p:x  priority, keyword
//! due:<date>        due date, see `task::dates`
//! project:<tag>     project, verbatim
//! ```

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use super::{dates, Priority, TaskDraft};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Priority,
    DueDate,
    Project,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Priority(Priority),
    DueDate(NaiveDate),
    Project(String),
}

impl TagValue {
    pub fn kind(&self) -> TagKind {
        match self {
            TagValue::Priority(_) => TagKind::Priority,
            TagValue::DueDate(_) => TagKind::DueDate,
            TagValue::Project(_) => TagKind::Project,
        }
    }
}

/// A tag token accepted by the grammar, with its byte span in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub value: TagValue,
    pub span: Range<usize>,
}

struct TagRule {
    kind: TagKind,
    pattern: Regex,
}

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("valid token regex"));

static GRAMMAR: Lazy<Vec<TagRule>> = Lazy::new(|| {
    vec![
        TagRule {
            kind: TagKind::Priority,
            pattern: Regex::new(r"(?i)^\[(low|normal|medium|high)\]$")
                .expect("valid bracket priority regex"),
        },
        TagRule {
            kind: TagKind::Priority,
            pattern: Regex::new(r"(?i)^(?:priority|p):(low|normal|medium|high)$")
                .expect("valid keyword priority regex"),
        },
        TagRule {
            kind: TagKind::DueDate,
            pattern: Regex::new(r"(?i)^due:(\S+)$").expect("valid due regex"),
        },
        TagRule {
            kind: TagKind::Project,
            pattern: Regex::new(r"(?i)^project:(\S+)$").expect("valid project regex"),
        },
    ]
});

/// Extract a [`TaskDraft`] from chat text.
///
/// Never fails on malformed tags; the only error is [`CoreError::EmptyTitle`]
/// when nothing is left once the accepted tags are removed.
pub fn extract(text: &str, today: NaiveDate) -> Result<TaskDraft> {
    let tags = scan(text, today);

    let mut draft = TaskDraft {
        title: strip_spans(text, tags.iter().map(|t| &t.span)),
        priority: Priority::default(),
        due_date: None,
        project: None,
    };
    for tag in tags {
        match tag.value {
            TagValue::Priority(p) => draft.priority = p,
            TagValue::DueDate(d) => draft.due_date = Some(d),
            TagValue::Project(p) => draft.project = Some(p),
        }
    }

    if draft.title.is_empty() {
        return Err(CoreError::EmptyTitle);
    }
    Ok(draft)
}

/// Return the accepted tags, at most one per kind, in input order.
pub fn scan(text: &str, today: NaiveDate) -> Vec<Tag> {
    let mut accepted: Vec<Tag> = Vec::new();
    for token in TOKEN_RE.find_iter(text) {
        let Some(value) = recognize(token.as_str(), today) else {
            continue;
        };
        if accepted.iter().any(|t| t.value.kind() == value.kind()) {
            continue;
        }
        accepted.push(Tag {
            value,
            span: token.range(),
        });
    }
    accepted
}

fn recognize(token: &str, today: NaiveDate) -> Option<TagValue> {
    GRAMMAR.iter().find_map(|rule| {
        let arg = rule.pattern.captures(token)?.get(1)?.as_str();
        match rule.kind {
            TagKind::Priority => arg.parse().ok().map(TagValue::Priority),
            TagKind::DueDate => dates::resolve(arg, today).map(TagValue::DueDate),
            TagKind::Project => Some(TagValue::Project(arg.to_string())),
        }
    })
}

/// Remove each span together with the whitespace right before it.
fn strip_spans<'a>(text: &str, spans: impl Iterator<Item = &'a Range<usize>>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in spans {
        out.push_str(text[cursor..span.start].trim_end());
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    #[test]
    fn full_example() {
        let draft = extract("Finish homework [high] due:tomorrow project:Math", today()).unwrap();
        assert_eq!(draft.title, "Finish homework");
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2026, 10, 15));
        assert_eq!(draft.project.as_deref(), Some("Math"));
    }

    #[test]
    fn blank_input_is_empty_title() {
        assert!(matches!(extract("   ", today()), Err(CoreError::EmptyTitle)));
        assert!(matches!(extract("", today()), Err(CoreError::EmptyTitle)));
    }

    #[test]
    fn only_tags_is_empty_title() {
        let err = extract("[low] due:today project:x", today()).unwrap_err();
        assert!(matches!(err, CoreError::EmptyTitle));
    }

    #[test]
    fn tags_anywhere_in_text() {
        let draft = extract("project:Home Call [LOW] the plumber due:2026-11-01", today()).unwrap();
        assert_eq!(draft.title, "Call the plumber");
        assert_eq!(draft.priority, Priority::Low);
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2026, 11, 1));
        assert_eq!(draft.project.as_deref(), Some("Home"));
    }

    #[test]
    fn keyword_priority_and_medium_alias() {
        let draft = extract("Water plants p:high", today()).unwrap();
        assert_eq!(draft.priority, Priority::High);
        let draft = extract("Water plants [Medium]", today()).unwrap();
        assert_eq!(draft.priority, Priority::Normal);
        assert_eq!(draft.title, "Water plants");
    }

    #[test]
    fn first_occurrence_wins_and_later_stays_in_title() {
        let draft = extract("Pay rent [high] [low] project:a project:b", today()).unwrap();
        assert_eq!(draft.priority, Priority::High);
        assert_eq!(draft.project.as_deref(), Some("a"));
        assert_eq!(draft.title, "Pay rent [low] project:b");
    }

    #[test]
    fn unrecognized_due_token_is_plain_text() {
        let draft = extract("Read book due:someday", today()).unwrap();
        assert_eq!(draft.due_date, None);
        assert_eq!(draft.title, "Read book due:someday");
    }

    #[test]
    fn unrecognized_due_does_not_block_a_later_valid_one() {
        let draft = extract("Read due:someday book due:friday", today()).unwrap();
        assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2026, 10, 16));
        assert_eq!(draft.title, "Read due:someday book");
    }

    #[test]
    fn tag_glued_to_word_is_not_a_tag() {
        let draft = extract("homework[high]", today()).unwrap();
        assert_eq!(draft.priority, Priority::Normal);
        assert_eq!(draft.title, "homework[high]");
    }

    #[test]
    fn inner_whitespace_is_preserved_without_tags() {
        let draft = extract("  two  spaces\there ", today()).unwrap();
        assert_eq!(draft.title, "two  spaces\there");
    }

    #[test]
    fn scan_reports_spans_in_input_order() {
        let text = "a due:today [high]";
        let tags = scan(text, today());
        assert_eq!(tags.len(), 2);
        assert_eq!(&text[tags[0].span.clone()], "due:today");
        assert_eq!(tags[1].value, TagValue::Priority(Priority::High));
    }

    proptest! {
        #[test]
        fn untagged_text_keeps_defaults(text in "[a-zA-Z0-9 ,.!?'-]{0,40}") {
            prop_assume!(!text.trim().is_empty());
            let draft = extract(&text, today()).unwrap();
            prop_assert_eq!(draft.title, text.trim());
            prop_assert_eq!(draft.priority, Priority::Normal);
            prop_assert_eq!(draft.due_date, None);
            prop_assert_eq!(draft.project, None);
        }

        #[test]
        fn tag_position_does_not_change_result(words in proptest::collection::vec("[a-z]{1,8}", 1..5), pos in 0usize..5) {
            let mut tokens = words.clone();
            let at = pos.min(tokens.len());
            tokens.insert(at, "[high]".to_string());
            let draft = extract(&tokens.join(" "), today()).unwrap();
            prop_assert_eq!(draft.title, words.join(" "));
            prop_assert_eq!(draft.priority, Priority::High);
        }
    }
}

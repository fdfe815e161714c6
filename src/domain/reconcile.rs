//! Diffing freshly generated scenarios against the test tickets created by
//! earlier runs.
//!
//! Matching is title based: both sides are reduced to a key by a
//! [`TitleMatcher`] and joined on that key. When two existing tickets share a
//! key, the later one wins and the earlier one can only end up obsolete.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::domain::gherkin::normalize_steps;
use crate::domain::scenario::Scenario;
use crate::domain::ticket::ExistingTestTicket;

const TITLE_DELIMITER: &str = " | ";

/// Reduces a title to the key used to pair generated and existing tests.
pub trait TitleMatcher {
    fn key(&self, title: &str) -> String;
}

/// Keeps the text after the last ` | `, trimmed and lower-cased.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizedTitleMatcher;

impl TitleMatcher for NormalizedTitleMatcher {
    fn key(&self, title: &str) -> String {
        display_title(title).to_lowercase()
    }
}

/// Strips the `TCnn | SOURCE | ` decoration from a composite title.
pub fn display_title(title: &str) -> &str {
    match title.rsplit_once(TITLE_DELIMITER) {
        Some((_, tail)) => tail.trim(),
        None => title.trim(),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub to_create: Vec<Scenario>,
    pub to_update: Vec<ExistingTestTicket>,
    pub obsolete: Vec<ExistingTestTicket>,
    pub unchanged: Vec<ExistingTestTicket>,
}

impl SyncPlan {
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.obsolete.is_empty()
    }
}

pub fn reconcile(existing: &[ExistingTestTicket], generated: &[Scenario]) -> SyncPlan {
    reconcile_with(&NormalizedTitleMatcher, existing, generated)
}

pub fn reconcile_with<M: TitleMatcher + ?Sized>(
    matcher: &M,
    existing: &[ExistingTestTicket],
    generated: &[Scenario],
) -> SyncPlan {
    let by_title: HashMap<String, &ExistingTestTicket> = existing
        .iter()
        .map(|ticket| (matcher.key(&ticket.title), ticket))
        .collect();

    let mut plan = SyncPlan::default();
    let mut matched: HashSet<&str> = HashSet::new();

    for scenario in generated {
        let Some(&ticket) = by_title.get(&matcher.key(&scenario.title)) else {
            plan.to_create.push(scenario.clone());
            continue;
        };

        matched.insert(ticket.key.as_str());
        let new_steps = normalize_steps(&scenario.steps);
        if normalize_steps(&ticket.steps) == new_steps {
            plan.unchanged.push(ticket.clone());
        } else {
            plan.to_update.push(ExistingTestTicket {
                steps: new_steps,
                ..ticket.clone()
            });
        }
    }

    plan.obsolete = existing
        .iter()
        .filter(|ticket| !matched.contains(ticket.key.as_str()))
        .cloned()
        .collect();

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gherkin::{build_feature, extract_steps};

    fn existing(key: &str, title: &str, steps: &str) -> ExistingTestTicket {
        ExistingTestTicket {
            key: key.to_string(),
            title: title.to_string(),
            steps: steps.to_string(),
            url: None,
        }
    }

    fn login_ticket() -> ExistingTestTicket {
        existing(
            "A1",
            "TC01 | PROJ-5 | Validate that login succeeds",
            "Given X\nWhen Y\nThen Z",
        )
    }

    #[test]
    fn identical_steps_are_unchanged() {
        let plan = reconcile(
            &[login_ticket()],
            &[Scenario::new(
                "Validate that login succeeds",
                "Given X\nWhen Y\nThen Z",
            )],
        );
        assert_eq!(plan.unchanged, vec![login_ticket()]);
        assert!(plan.to_create.is_empty());
        assert!(plan.to_update.is_empty());
        assert!(plan.obsolete.is_empty());
        assert!(plan.is_noop());
    }

    #[test]
    fn changed_steps_update_in_place() {
        let plan = reconcile(
            &[login_ticket()],
            &[Scenario::new(
                "Validate that login succeeds",
                "Given X\nWhen Y\nThen W",
            )],
        );
        assert_eq!(
            plan.to_update,
            vec![existing(
                "A1",
                "TC01 | PROJ-5 | Validate that login succeeds",
                "Given X\nWhen Y\nThen W"
            )]
        );
        assert!(plan.unchanged.is_empty());
        assert!(plan.to_create.is_empty());
        assert!(plan.obsolete.is_empty());
    }

    #[test]
    fn nothing_generated_marks_everything_obsolete() {
        let second = existing("A2", "TC02 | PROJ-5 | Validate that logout works", "Given");
        let plan = reconcile(&[login_ticket(), second.clone()], &[]);
        assert_eq!(plan.obsolete, vec![login_ticket(), second]);
        assert!(plan.to_create.is_empty());
        assert!(plan.to_update.is_empty());
        assert!(plan.unchanged.is_empty());
    }

    #[test]
    fn nothing_existing_creates_everything() {
        let generated = vec![
            Scenario::new("Validate that a", "Given a"),
            Scenario::new("Validate that b", "Given b"),
        ];
        let plan = reconcile(&[], &generated);
        assert_eq!(plan.to_create, generated);
        assert!(plan.to_update.is_empty());
        assert!(plan.unchanged.is_empty());
        assert!(plan.obsolete.is_empty());
    }

    #[test]
    fn matching_ignores_case_whitespace_and_decoration() {
        let plan = reconcile(
            &[login_ticket()],
            &[Scenario::new(
                "  VALIDATE THAT LOGIN SUCCEEDS ",
                "  Given X\nWhen Y\nThen Z\n",
            )],
        );
        assert_eq!(plan.unchanged.len(), 1);
    }

    #[test]
    fn composite_generated_titles_are_stripped_too() {
        let plan = reconcile(
            &[login_ticket()],
            &[Scenario::new(
                "TC09 | OTHER-1 | Validate that login succeeds",
                "Given X\nWhen Y\nThen Z",
            )],
        );
        assert_eq!(plan.unchanged.len(), 1);
    }

    #[test]
    fn splits_on_last_delimiter() {
        assert_eq!(
            display_title("TC01 | PROJ-5 | Validate that a | b"),
            "b"
        );
        assert_eq!(display_title("  plain title "), "plain title");
    }

    #[test]
    fn colliding_titles_keep_the_later_ticket() {
        let first = existing("A1", "TC01 | PROJ-5 | Validate that x", "Given 1");
        let second = existing("A2", "TC02 | PROJ-5 | validate that X", "Given 2");
        let plan = reconcile(
            &[first.clone(), second.clone()],
            &[Scenario::new("Validate that x", "Given 2")],
        );
        assert_eq!(plan.unchanged, vec![second]);
        assert_eq!(plan.obsolete, vec![first]);
    }

    #[test]
    fn every_existing_ticket_lands_in_exactly_one_bucket() {
        let tickets = vec![
            existing("A1", "TC01 | P-1 | Validate that a", "Given a"),
            existing("A2", "TC02 | P-1 | Validate that b", "Given b"),
            existing("A3", "TC03 | P-1 | Validate that c", "Given c"),
        ];
        let generated = vec![
            Scenario::new("Validate that a", "Given a"),
            Scenario::new("Validate that b", "Given b changed"),
            Scenario::new("Validate that d", "Given d"),
        ];
        let plan = reconcile(&tickets, &generated);

        for ticket in &tickets {
            let hits = plan
                .to_update
                .iter()
                .chain(&plan.unchanged)
                .chain(&plan.obsolete)
                .filter(|t| t.key == ticket.key)
                .count();
            assert_eq!(hits, 1, "ticket {}", ticket.key);
        }
        assert_eq!(plan.to_create, vec![Scenario::new("Validate that d", "Given d")]);
    }

    #[test]
    fn stored_feature_round_trip_is_unchanged() {
        let scenario = Scenario::new(
            "Validate that login succeeds",
            "Given a user\r\n  And a password\r\nWhen they sign in\n\tThen it works",
        );
        let feature = build_feature("Login", "PROJ-5", &scenario);
        let stored = existing(
            "A1",
            "TC01 | PROJ-5 | Validate that login succeeds",
            &extract_steps(&feature).unwrap(),
        );

        let plan = reconcile(&[stored.clone()], &[scenario]);
        assert_eq!(plan.unchanged, vec![stored]);
        assert!(plan.to_update.is_empty());
    }

    #[test]
    fn inner_indentation_alone_is_not_a_change() {
        let plan = reconcile(
            &[login_ticket()],
            &[Scenario::new(
                "Validate that login succeeds",
                "Given X\n    When Y\r\nThen Z",
            )],
        );
        assert_eq!(plan.unchanged, vec![login_ticket()]);
    }

    #[test]
    fn accepts_alternative_matchers() {
        struct ExactMatcher;
        impl TitleMatcher for ExactMatcher {
            fn key(&self, title: &str) -> String {
                title.to_string()
            }
        }

        let plan = reconcile_with(
            &ExactMatcher,
            &[login_ticket()],
            &[Scenario::new("Validate that login succeeds", "Given X\nWhen Y\nThen Z")],
        );
        assert_eq!(plan.to_create.len(), 1);
        assert_eq!(plan.obsolete, vec![login_ticket()]);
    }
}

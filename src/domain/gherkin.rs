use crate::domain::scenario::Scenario;

const SCENARIO_KEYWORD: &str = "Scenario:";

/// Renders one scenario as a standalone `.feature` document.
pub fn build_feature(feature_summary: &str, source_id: &str, scenario: &Scenario) -> String {
    let mut feature = String::new();
    feature.push_str(&format!("Feature: {}\n", feature_summary.trim()));
    feature.push_str(&format!("  # Source: {}\n\n", source_id.trim()));
    feature.push_str(&format!("  {SCENARIO_KEYWORD} {}\n", scenario.title.trim()));
    for line in normalize_steps(&scenario.steps).lines() {
        if line.is_empty() {
            feature.push('\n');
        } else {
            feature.push_str(&format!("    {line}\n"));
        }
    }
    feature
}

/// Recovers the step block from a feature produced by [`build_feature`].
pub fn extract_steps(feature: &str) -> Option<String> {
    let mut lines = feature.lines();
    lines.find(|line| line.trim_start().starts_with(SCENARIO_KEYWORD))?;
    Some(normalize_steps(&lines.collect::<Vec<_>>().join("\n")))
}

/// Canonical form of a step block: every line trimmed (which also drops
/// `\r` from CRLF input) and the block trimmed. This is the form written
/// into features and the form reconciliation compares.
pub fn normalize_steps(steps: &str) -> String {
    steps
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login() -> Scenario {
        Scenario::new(
            "Validate that login succeeds",
            "Given a registered user\n  When they sign in\nThen the dashboard opens",
        )
    }

    #[test]
    fn builds_feature_block() {
        let feature = build_feature("Login page", "PROJ-5", &login());
        assert_eq!(
            feature,
            "Feature: Login page\n\
             \x20 # Source: PROJ-5\n\
             \n\
             \x20 Scenario: Validate that login succeeds\n\
             \x20   Given a registered user\n\
             \x20   When they sign in\n\
             \x20   Then the dashboard opens\n"
        );
    }

    #[test]
    fn extracts_steps_back() {
        let feature = build_feature("Login page", "PROJ-5", &login());
        assert_eq!(
            extract_steps(&feature).as_deref(),
            Some("Given a registered user\nWhen they sign in\nThen the dashboard opens")
        );
    }

    #[test]
    fn extract_inverts_build_for_indented_crlf_steps() {
        let scenario = Scenario::new(
            "Validate that login succeeds",
            "Given a user\r\n  And a password\r\n\r\nWhen they sign in\r\n",
        );
        let feature = build_feature("Login page", "PROJ-5", &scenario);
        assert!(!feature.contains('\r'));
        assert_eq!(
            extract_steps(&feature),
            Some(normalize_steps(&scenario.steps))
        );
        assert_eq!(
            normalize_steps(&scenario.steps),
            "Given a user\nAnd a password\n\nWhen they sign in"
        );
    }

    #[test]
    fn no_scenario_line_means_no_steps() {
        assert_eq!(extract_steps("Auto-generated"), None);
    }
}

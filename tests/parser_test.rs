//! Tests for turning free-form model output into issue records

use skillscore::parser::{extract_structured_issues, issues_from_prediction, parse_issues};
use skillscore::Severity;

#[test]
fn test_heading_and_short_lines_skipped() {
    let text = "# Heading\n\nShort\nThis is a sufficiently long line describing a SQL Injection issue in detail";
    let issues = parse_issues(Some(text));

    assert_eq!(issues.len(), 1);
    assert_eq!(
        issues[0].description,
        "This is a sufficiently long line describing a SQL Injection issue in detail"
    );
}

#[test]
fn test_only_headings_and_blanks_is_empty() {
    let text = "## Critical Issues\n\n   \n### None\n\n";
    assert!(parse_issues(Some(text)).is_empty());
}

#[test]
fn test_one_record_per_line() {
    let text = "\
1. SQL injection in authenticate_user: the query concatenates user input
2. Passwords hashed with MD5 in create_user, use bcrypt instead
3. Command injection in run_backup allows arbitrary shell commands";
    let issues = parse_issues(Some(text));
    assert_eq!(issues.len(), 3);
    assert!(issues.iter().all(|i| i.signals.is_some()));
    assert!(issues.iter().all(|i| i.title.is_empty()));
}

#[test]
fn test_signals_on_parsed_lines() {
    let issues = parse_issues(Some(
        "Hardcoded credential at line 14 leads to full account takeover\n\
         Example: ```conn = connect(password=os.environ['DB_PASS'])```",
    ));
    assert_eq!(issues.len(), 2);

    let first = issues[0].signals.unwrap();
    assert!(first.has_detail);
    assert!(first.has_location);
    assert!(first.has_impact);
    assert!(!first.has_example);

    let second = issues[1].signals.unwrap();
    assert!(second.has_example);
}

#[test]
fn test_structured_issue_headers() {
    let review = r#"
**Issue #1**: SQL Injection in authenticate_user
- Severity: Critical
- Fix: use parameterized queries

**Issue #2**: MD5 used for password hashing
- Severity: High

Problem 3: No input validation on user_id
"#;
    let issues = extract_structured_issues(review);
    assert_eq!(issues.len(), 3);
    assert_eq!(issues[0].severity, Some(Severity::Critical));
    assert_eq!(issues[1].severity, Some(Severity::High));
    assert_eq!(issues[2].severity, Some(Severity::Medium));
    assert_eq!(issues[2].title, "No input validation on user_id");
}

#[test]
fn test_prediction_text_never_fails() {
    for raw in ["", "N/A", "{}", "[1, 2", "no problems found", "]["] {
        let _ = issues_from_prediction(raw);
    }
    assert!(issues_from_prediction("{}").is_empty());
}

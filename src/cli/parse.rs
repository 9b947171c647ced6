use anyhow::Result;
use tracing::info;

use crate::issue::IssueRecord;
use crate::parser::parse_issues;

/// Parse a text file the way the count profile does.
pub fn parse_file(path: &str) -> Result<Vec<IssueRecord>> {
    let text = super::read_input(path)?;
    let issues = parse_issues(Some(&text));
    info!("{}: {} issue line(s)", path, issues.len());
    Ok(issues)
}

pub fn run(path: &str) -> Result<()> {
    let issues = parse_file(path)?;
    println!("{}", serde_json::to_string_pretty(&issues)?);
    Ok(())
}

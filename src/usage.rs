//! Disk usage summary from `docker system df`.
//!
//! The command prints one row per resource category:
//!
//! ```text
//! TYPE            TOTAL     ACTIVE    SIZE      RECLAIMABLE
//! Images          5         2         1.2GB     300MB (25%)
//! Containers      3         1         12kB      4kB (33%)
//! Local Volumes   2         1         80MB      0B (0%)
//! Build Cache     0         0         0B        0B
//! ```
//!
//! Each row is tokenized on its own. A row that is missing or does not have
//! the `<count> <count> <size> <size>` shape yields [`UsageSummary::MISSING`]
//! for that category only.

use std::sync::Arc;

use crate::command::{CommandError, CommandRunner};
use crate::types::UsageSummary;

pub const DEFAULT_COMMAND: &str = "docker system df";

#[derive(Clone)]
pub struct UsageSummaryProvider {
    runner: Arc<dyn CommandRunner>,
    command: String,
}

impl UsageSummaryProvider {
    pub fn new(runner: Arc<dyn CommandRunner>, command: impl Into<String>) -> Self {
        Self {
            runner,
            command: command.into(),
        }
    }

    pub async fn summarize(&self) -> Result<UsageSummary, CommandError> {
        let output = self.runner.stdout(&self.command).await?;
        Ok(parse(&output))
    }
}

/// Parse the full command output.
pub fn parse(output: &str) -> UsageSummary {
    UsageSummary {
        images: describe(find_row(output, "Images")),
        containers: describe(find_row(output, "Containers")),
        volumes: describe(find_row(output, "Local Volumes")),
        cache: describe(find_row(output, "Build Cache")),
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Row<'a> {
    size: &'a str,
    reclaimable: &'a str,
}

fn describe(row: Option<Row<'_>>) -> String {
    match row {
        Some(row) => format!("Size: {}, Reclaimable: {}", row.size, row.reclaimable),
        None => UsageSummary::MISSING.to_string(),
    }
}

/// First well-formed row for `label`.
fn find_row<'a>(output: &'a str, label: &str) -> Option<Row<'a>> {
    output.lines().find_map(|line| parse_row(line, label))
}

fn parse_row<'a>(line: &'a str, label: &str) -> Option<Row<'a>> {
    let rest = line.trim_start().strip_prefix(label)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let mut tokens = rest.split_whitespace();
    let (total, active) = (tokens.next()?, tokens.next()?);
    if !is_count(total) || !is_count(active) {
        return None;
    }

    let (size, reclaimable) = (tokens.next()?, tokens.next()?);
    if !is_size(size) || !is_size(reclaimable) {
        return None;
    }

    Some(Row { size, reclaimable })
}

fn is_count(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// `<number><unit-letters>`, e.g. `1.2GB`, `0B`, `12kB`.
fn is_size(token: &str) -> bool {
    let split = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(token.len());
    let (number, unit) = token.split_at(split);
    number.bytes().any(|b| b.is_ascii_digit())
        && !unit.is_empty()
        && unit.bytes().all(|b| b.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::testing::ScriptedRunner;

    const SAMPLE: &str = "\
TYPE            TOTAL     ACTIVE    SIZE      RECLAIMABLE
Images          5         2         1.2GB     300MB (25%)
Containers      3         1         12kB      4kB (33%)
Local Volumes   2         1         80MB      0B (0%)
Build Cache     0         0         0B        0B
";

    #[test]
    fn parses_all_categories() {
        let summary = parse(SAMPLE);
        assert_eq!(summary.images, "Size: 1.2GB, Reclaimable: 300MB");
        assert_eq!(summary.containers, "Size: 12kB, Reclaimable: 4kB");
        assert_eq!(summary.volumes, "Size: 80MB, Reclaimable: 0B");
        assert_eq!(summary.cache, "Size: 0B, Reclaimable: 0B");
    }

    #[test]
    fn single_images_line() {
        let summary = parse("Images   5   2   1.2GB   300MB");
        assert_eq!(summary.images, "Size: 1.2GB, Reclaimable: 300MB");
        assert_eq!(summary.containers, "N/A");
        assert_eq!(summary.volumes, "N/A");
        assert_eq!(summary.cache, "N/A");
    }

    #[test]
    fn missing_build_cache_is_na() {
        let output = SAMPLE
            .lines()
            .filter(|l| !l.starts_with("Build Cache"))
            .collect::<Vec<_>>()
            .join("\n");
        let summary = parse(&output);
        assert_eq!(summary.cache, "N/A");
        assert_eq!(summary.images, "Size: 1.2GB, Reclaimable: 300MB");
    }

    #[test]
    fn malformed_rows_are_na() {
        let output = "\
Images          five      2         1.2GB     300MB
Containers      3         1         12kB
Local Volumes   2         1         80MB      lots
Build Cache     0         0         GB        0B
";
        let summary = parse(output);
        assert_eq!(summary.images, "N/A");
        assert_eq!(summary.containers, "N/A");
        assert_eq!(summary.volumes, "N/A");
        assert_eq!(summary.cache, "N/A");
    }

    #[test]
    fn header_is_not_a_row() {
        assert_eq!(parse_row("TYPE TOTAL ACTIVE SIZE RECLAIMABLE", "Images"), None);
        assert_eq!(parse_row("ImagesX 1 1 1B 1B", "Images"), None);
    }

    #[test]
    fn size_tokens() {
        assert!(is_size("1.2GB"));
        assert!(is_size("0B"));
        assert!(is_size("12kB"));
        assert!(!is_size("GB"));
        assert!(!is_size("12"));
        assert!(!is_size("."));
        assert!(!is_size("(25%)"));
    }

    #[tokio::test]
    async fn summarize_runs_command_once() {
        let runner = ScriptedRunner::default().with(DEFAULT_COMMAND, SAMPLE);
        let provider = UsageSummaryProvider::new(Arc::new(runner), DEFAULT_COMMAND);
        let summary = provider.summarize().await.unwrap();
        assert_eq!(summary.volumes, "Size: 80MB, Reclaimable: 0B");
    }

    #[tokio::test]
    async fn summarize_fails_when_command_fails() {
        let runner =
            ScriptedRunner::default().with_failure(DEFAULT_COMMAND, 1, "Cannot connect");
        let provider = UsageSummaryProvider::new(Arc::new(runner), DEFAULT_COMMAND);
        assert!(matches!(
            provider.summarize().await,
            Err(CommandError::Failed { .. })
        ));
    }
}

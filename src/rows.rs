//! Turns loaded repositories into display rows.

use chrono_tz::Tz;

use crate::data::{Repository, UNAVAILABLE};

/// Number of text cells in a row
pub const COLUMN_COUNT: usize = 6;

/// Column headers, in cell order
pub const COLUMN_TITLES: [&str; COLUMN_COUNT] =
    ["#", "Description", "Language", "Visibility", "Release", "Updated"];

pub const EMPTY_MESSAGE: &str = "No repositories found.";
pub const LOADING_MESSAGE: &str = "Fetching projects from GitHub...";

/// How rows derive their date and preview reference
#[derive(Debug, Clone)]
pub struct RowFormat {
    /// Base of preview image references, e.g. `https://raw.githubusercontent.com`
    pub raw_url: String,
    /// Zone the push date is shown in
    pub zone: Tz,
}

/// One rendered repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// number, description, language, visibility, release, date
    pub cells: [String; COLUMN_COUNT],
    pub link: String,
    /// Preview image reference; not fetched or validated here
    pub preview: Option<String>,
}

#[allow(dead_code)] // Used in tests
impl Row {
    pub fn number(&self) -> &str {
        &self.cells[0]
    }

    pub fn description(&self) -> &str {
        &self.cells[1]
    }
}

/// What the project table currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading,
    Failed(String),
    Empty,
    Rows(Vec<Row>),
}

impl ListView {
    pub fn rows(&self) -> &[Row] {
        match self {
            ListView::Rows(rows) => rows,
            _ => &[],
        }
    }

    /// Message shown in place of rows, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            ListView::Loading => Some(LOADING_MESSAGE),
            ListView::Failed(message) => Some(message.as_str()),
            ListView::Empty => Some(EMPTY_MESSAGE),
            ListView::Rows(_) => None,
        }
    }

    /// View for a failed load: a single error row, never partial rows
    pub fn failed(error: &impl std::fmt::Display) -> Self {
        ListView::Failed(format!("Failed to load projects: {error}"))
    }
}

/// Produce one row per repository, in input order
pub fn render_rows(repos: &[Repository], format: &RowFormat) -> ListView {
    if repos.is_empty() {
        return ListView::Empty;
    }

    let rows = repos
        .iter()
        .enumerate()
        .map(|(idx, repo)| render_row(idx, repo, format))
        .collect();
    ListView::Rows(rows)
}

fn render_row(idx: usize, repo: &Repository, format: &RowFormat) -> Row {
    let number = format!("{:02}", idx + 1);
    let description = match repo.description.as_deref().map(str::trim) {
        Some(desc) if !desc.is_empty() => desc.to_string(),
        _ => repo.name.clone(),
    };
    let language = repo
        .language
        .clone()
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    let visibility = if repo.private { "Private" } else { "Public" };
    let date = repo
        .pushed_at
        .map(|t| t.with_timezone(&format.zone).format("%Y/%m/%d").to_string())
        .unwrap_or_else(|| UNAVAILABLE.to_string());

    Row {
        cells: [
            number,
            description,
            language,
            visibility.to_string(),
            repo.release_tag().to_string(),
            date,
        ],
        link: repo.link().to_string(),
        preview: preview_reference(repo, &format.raw_url),
    }
}

/// `{raw}/{owner}/{name}/{branch}/preview.png`, when the branch is known
fn preview_reference(repo: &Repository, raw_url: &str) -> Option<String> {
    if repo.default_branch.is_empty() {
        return None;
    }
    Some(format!(
        "{}/{}/{}/{}/preview.png",
        raw_url.trim_end_matches('/'),
        repo.owner.login,
        repo.name,
        repo.default_branch
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{sample_repository, Release};
    use chrono::{TimeZone, Utc};

    fn format() -> RowFormat {
        RowFormat {
            raw_url: "https://raw.githubusercontent.com/".to_string(),
            zone: chrono_tz::Asia::Taipei,
        }
    }

    #[test]
    fn test_empty_list_renders_placeholder() {
        let view = render_rows(&[], &format());
        assert_eq!(view, ListView::Empty);
        assert_eq!(view.message(), Some(EMPTY_MESSAGE));
        assert!(view.rows().is_empty());
    }

    #[test]
    fn test_rows_numbered_in_input_order() {
        let repos: Vec<Repository> = (0..12)
            .map(|i| sample_repository(&format!("repo-{i}")))
            .collect();
        let view = render_rows(&repos, &format());
        let rows = view.rows();

        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].number(), "01");
        assert_eq!(rows[9].number(), "10");
        assert_eq!(rows[11].number(), "12");
        for (row, repo) in rows.iter().zip(&repos) {
            assert_eq!(row.description(), repo.name);
        }
    }

    #[test]
    fn test_fallbacks_and_labels() {
        let mut repo = sample_repository("folio");
        repo.private = true;
        let row = render_rows(&[repo], &format()).rows()[0].clone();

        assert_eq!(row.cells[1], "folio");
        assert_eq!(row.cells[2], "N/A");
        assert_eq!(row.cells[3], "Private");
        assert_eq!(row.cells[4], "N/A");
        assert_eq!(row.cells[5], "N/A");
    }

    #[test]
    fn test_populated_row() {
        let mut repo = sample_repository("folio");
        repo.description = Some("Portfolio page".to_string());
        repo.language = Some("Rust".to_string());
        repo.pushed_at = Some(Utc.with_ymd_and_hms(2024, 3, 7, 2, 30, 0).unwrap());
        repo.latest_release = Some(Release {
            tag_name: "v2.0.0".to_string(),
            name: None,
            html_url: None,
        });
        let row = render_rows(&[repo], &format()).rows()[0].clone();

        assert_eq!(
            row.cells,
            ["01", "Portfolio page", "Rust", "Public", "v2.0.0", "2024/03/07"].map(String::from)
        );
        assert_eq!(
            row.preview.as_deref(),
            Some("https://raw.githubusercontent.com/likahang/folio/main/preview.png")
        );
    }

    #[test]
    fn test_date_uses_display_zone() {
        let mut repo = sample_repository("folio");
        // 20:00 UTC on the 6th is already the 7th in Taipei
        repo.pushed_at = Some(Utc.with_ymd_and_hms(2024, 3, 6, 20, 0, 0).unwrap());
        let row = render_rows(&[repo], &format()).rows()[0].clone();
        assert_eq!(row.cells[5], "2024/03/07");
    }

    #[test]
    fn test_missing_branch_has_no_preview() {
        let mut repo = sample_repository("folio");
        repo.default_branch.clear();
        let row = render_rows(&[repo], &format()).rows()[0].clone();
        assert!(row.preview.is_none());
    }

    #[test]
    fn test_failed_view_is_single_message() {
        let view = ListView::failed(&"GitHub API request failed: 500 Internal Server Error");
        assert!(view.rows().is_empty());
        assert_eq!(
            view.message(),
            Some("Failed to load projects: GitHub API request failed: 500 Internal Server Error")
        );
    }
}

use crate::table::Dataset;

/// Semantic roles resolved from free-form uploaded column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Email,
    Name,
    PreScore,
    PostScore,
    Course,
}

/// Resolve a role to an actual column name by case-insensitive substring
/// match over the dataset's column order. First match wins and there is no
/// second-candidate fallback; this is a documented policy kept for
/// reproducible behavior, not an oversight.
pub fn detect_role(dataset: &Dataset, role: ColumnRole) -> Option<&str> {
    match role {
        ColumnRole::Email => first_matching(dataset, |c| c.contains("email")),
        ColumnRole::Name => first_matching(dataset, |c| c.contains("name") && !c.contains("user")),
        ColumnRole::PreScore => score_columns(dataset, "pre").into_iter().next(),
        ColumnRole::PostScore => score_columns(dataset, "post").into_iter().next(),
        ColumnRole::Course => {
            first_matching(dataset, |c| c.contains("course") || c.contains("program"))
        }
    }
}

/// All columns containing both the prefix ("pre" or "post") and "score", in
/// dataset column order. Consumers use only the first today; the full list
/// is computed for multiple post-test support.
pub fn score_columns<'a>(dataset: &'a Dataset, prefix: &str) -> Vec<&'a str> {
    dataset
        .columns()
        .iter()
        .filter(|c| {
            let lower = c.to_lowercase();
            lower.contains(prefix) && lower.contains("score")
        })
        .map(String::as_str)
        .collect()
}

fn first_matching<'a, F>(dataset: &'a Dataset, pred: F) -> Option<&'a str>
where
    F: Fn(&str) -> bool,
{
    dataset
        .columns()
        .iter()
        .find(|c| pred(&c.to_lowercase()))
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(header: &str) -> Dataset {
        Dataset::from_csv(&format!("{}\n", header)).expect("parse header")
    }

    #[test]
    fn detects_roles_case_insensitively() {
        let ds = dataset("StudentName,EMAIL Address,PreTestScore,PostTestScore,Course Code");
        assert_eq!(detect_role(&ds, ColumnRole::Email), Some("EMAILAddress"));
        assert_eq!(detect_role(&ds, ColumnRole::Name), Some("StudentName"));
        assert_eq!(detect_role(&ds, ColumnRole::PreScore), Some("PreTestScore"));
        assert_eq!(detect_role(&ds, ColumnRole::PostScore), Some("PostTestScore"));
        assert_eq!(detect_role(&ds, ColumnRole::Course), Some("CourseCode"));
    }

    #[test]
    fn name_role_skips_username_columns() {
        let ds = dataset("Username,FullName,Email");
        assert_eq!(detect_role(&ds, ColumnRole::Name), Some("FullName"));
    }

    #[test]
    fn first_match_wins_with_no_fallback() {
        let ds = dataset("PrimaryEmail,BackupEmail,PreScore1,PreScore2,PostScore");
        assert_eq!(detect_role(&ds, ColumnRole::Email), Some("PrimaryEmail"));
        assert_eq!(
            score_columns(&ds, "pre"),
            vec!["PreScore1", "PreScore2"]
        );
        assert_eq!(detect_role(&ds, ColumnRole::PreScore), Some("PreScore1"));
    }

    #[test]
    fn unresolved_roles_are_none() {
        let ds = dataset("A,B,C");
        assert_eq!(detect_role(&ds, ColumnRole::Email), None);
        assert_eq!(detect_role(&ds, ColumnRole::PreScore), None);
        assert!(score_columns(&ds, "post").is_empty());
    }

    #[test]
    fn program_column_satisfies_course_role() {
        let ds = dataset("Name,Email,ProgramName");
        // "ProgramName" also contains "name"; email/name resolution is
        // independent of the course probe.
        assert_eq!(detect_role(&ds, ColumnRole::Course), Some("ProgramName"));
    }
}

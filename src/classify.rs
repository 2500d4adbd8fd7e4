//! Label and path classification.
//!
//! Labels are mapped onto a closed set of [`LabelKind`]s by name prefix, and changed
//! files onto report categories by path prefix. Both tables follow the labelling
//! conventions of the OpenCV repository, the default report target.

use crate::model::PullRequest;
use serde::Serialize;
use std::collections::BTreeSet;

const CATEGORY_LABEL_PREFIX: &str = "category: ";

const CHANGES_TYPE_LABELS: &[&str] = &[
    "evolution",
    "feature",
    "bug",
    "optimization",
    "test",
    "confirmed",
    "future",
];

const PROBLEM_LABELS: &[&str] = &["community help requested", "incomplete"];

/// Module directory name to report category, for files under `modules/`.
const MODULE_CATEGORIES: &[(&str, &str)] = &[
    ("java", "java bindings"),
    ("js", "javascript (js)"),
    ("python", "python bindings"),
    ("ts", "t-api"),
    ("gapi", "g-api / gapi"),
];

/// Path prefix to report category for everything outside `modules/`.
const PATH_CATEGORIES: &[(&str, &str)] = &[
    ("doc", "documentation"),
    ("apps", "apps"),
    ("samples", "samples"),
    ("cmake", "build/install"),
    ("3rdparty", "3rdparty"),
];

const FALLBACK_CATEGORY: &str = "infrastructure";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LabelKind {
    Other,
    Category,
    Platform,
    EffortsEstimation,
    Priority,
    ChangesType,
    Problem,
    Reproducer,
}

impl LabelKind {
    pub fn classify(name: &str) -> Self {
        if name.starts_with("category") {
            LabelKind::Category
        } else if name.starts_with("platform") {
            LabelKind::Platform
        } else if name.starts_with("effort") {
            LabelKind::EffortsEstimation
        } else if name.starts_with("priority") {
            LabelKind::Priority
        } else if CHANGES_TYPE_LABELS.contains(&name) {
            LabelKind::ChangesType
        } else if name.starts_with("pr") {
            if name.contains("reproducer") {
                LabelKind::Reproducer
            } else {
                LabelKind::Problem
            }
        } else if PROBLEM_LABELS.contains(&name) {
            LabelKind::Problem
        } else {
            LabelKind::Other
        }
    }
}

/// Report category of a single changed file, derived from its path.
pub fn categorize_path(filename: &str) -> String {
    if filename.starts_with("module") {
        let module = filename.split('/').nth(1).unwrap_or_default();
        return MODULE_CATEGORIES
            .iter()
            .find(|(name, _)| *name == module)
            .map(|(_, category)| category.to_string())
            .unwrap_or_else(|| module.to_string());
    }

    PATH_CATEGORIES
        .iter()
        .find(|(prefix, _)| filename.starts_with(prefix))
        .map(|(_, category)| category.to_string())
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
}

/// Categories of a pull request and whether they were auto-assigned.
///
/// Explicit `category: ...` labels win. Without them the categories are derived from
/// the changed file paths, when those were loaded.
pub fn categorize(pull_request: &PullRequest) -> (Vec<String>, bool) {
    let labelled: Vec<String> = pull_request
        .labels
        .iter()
        .filter(|label| label.kind() == LabelKind::Category)
        .map(|label| {
            label
                .name
                .rsplit(CATEGORY_LABEL_PREFIX)
                .next()
                .unwrap_or(&label.name)
                .to_string()
        })
        .collect();

    if !labelled.is_empty() {
        return (labelled, false);
    }

    match pull_request.changed_files.as_deref() {
        Some(files) if !files.is_empty() => {
            let derived: BTreeSet<String> = files
                .iter()
                .map(|change| categorize_path(&change.filename))
                .collect();
            (derived.into_iter().collect(), true)
        }
        _ => (Vec::new(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{changed_file, label, pull_request};

    #[test]
    fn test_label_classification_table() {
        let cases = [
            ("category: core", LabelKind::Category),
            ("platform: win32", LabelKind::Platform),
            ("effort: few days", LabelKind::EffortsEstimation),
            ("priority: low", LabelKind::Priority),
            ("bug", LabelKind::ChangesType),
            ("feature", LabelKind::ChangesType),
            ("pr: needs test", LabelKind::Problem),
            ("pr: needs reproducer", LabelKind::Reproducer),
            ("incomplete", LabelKind::Problem),
            ("community help requested", LabelKind::Problem),
            ("RFC", LabelKind::Other),
            ("bugfix", LabelKind::Other),
        ];

        for (name, expected) in cases {
            assert_eq!(LabelKind::classify(name), expected, "label {name:?}");
        }
    }

    #[test]
    fn test_categorize_path() {
        assert_eq!(categorize_path("modules/python/src2/cv2.cpp"), "python bindings");
        assert_eq!(categorize_path("modules/imgproc/src/color.cpp"), "imgproc");
        assert_eq!(categorize_path("doc/tutorials/intro.markdown"), "documentation");
        assert_eq!(categorize_path("cmake/OpenCVUtils.cmake"), "build/install");
        assert_eq!(categorize_path("3rdparty/libpng/png.c"), "3rdparty");
        assert_eq!(categorize_path(".github/workflows/ci.yml"), "infrastructure");
        assert_eq!(categorize_path("CMakeLists.txt"), "infrastructure");
    }

    #[test]
    fn test_categories_from_labels_take_precedence() {
        let mut pr = pull_request(1);
        pr.labels = vec![label("category: imgproc"), label("bug")];
        pr.changed_files = Some(vec![changed_file("doc/readme.md", 1, 0)]);

        let (categories, auto_assigned) = categorize(&pr);
        assert_eq!(categories, vec!["imgproc".to_string()]);
        assert!(!auto_assigned);
    }

    #[test]
    fn test_categories_auto_assigned_from_paths() {
        let mut pr = pull_request(2);
        pr.changed_files = Some(vec![
            changed_file("modules/js/src/core.js", 10, 2),
            changed_file("modules/js/test/test.js", 3, 0),
            changed_file("samples/cpp/demo.cpp", 1, 1),
        ]);

        let (categories, auto_assigned) = categorize(&pr);
        assert_eq!(
            categories,
            vec!["javascript (js)".to_string(), "samples".to_string()]
        );
        assert!(auto_assigned);
    }

    #[test]
    fn test_no_categories_without_labels_or_files() {
        let pr = pull_request(3);
        assert_eq!(categorize(&pr), (Vec::new(), false));
    }
}

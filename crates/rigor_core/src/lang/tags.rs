//! Metadata tag vocabulary registry.
//!
//! Tags are the markers the introspection layer attaches to types and methods: `test_case` marks a runnable case,
//! the four lifecycle tags bind setup/teardown roles, `expected_error` turns a raise into a pass. The registration
//! macro recognises exactly the spellings listed here, and the engine maps them to lifecycle roles.
//!
//! ## Notes
//! - Matching is **case-sensitive**.
//! - Signature rules (static vs instance, zero parameters) are enforced by the engine at scan time, not here.

use crate::lang::registry::{Example, LangItemInfo, Stability};

/// Stable identifier for a metadata tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagId {
    /// Type-level: the type is a test class and is considered during discovery.
    TestClass,
    /// A runnable test case.
    TestCase,
    /// Instance method run before every test case.
    SetUp,
    /// Instance method run after every test case.
    TearDown,
    /// Static method run once before the first test case.
    OneTimeSetUp,
    /// Static method run once after the last test case.
    OneTimeTearDown,
    /// Test case passes only if it raises a failure of the given kind.
    ExpectedError,
}

impl TagId {
    /// Return `true` for the four setup/teardown tags.
    pub fn is_lifecycle(self) -> bool {
        matches!(
            self,
            TagId::SetUp | TagId::TearDown | TagId::OneTimeSetUp | TagId::OneTimeTearDown
        )
    }

    /// Return `true` for tags whose bound method must be static (class-level).
    pub fn requires_static(self) -> bool {
        matches!(self, TagId::OneTimeSetUp | TagId::OneTimeTearDown)
    }
}

/// Named argument for `#[expected_error(KIND, message = "...")]`.
pub const EXPECTED_ERROR_MESSAGE_ARG: &str = "message";

/// Named argument for `#[fixture(base = Type)]`.
pub const FIXTURE_BASE_ARG: &str = "base";

/// Named argument for `#[fixture(constructor = path)]`.
pub const FIXTURE_CONSTRUCTOR_ARG: &str = "constructor";

/// Flag for `#[fixture(no_constructor)]`.
pub const FIXTURE_NO_CONSTRUCTOR_ARG: &str = "no_constructor";

/// Flag for `#[fixture(support)]`: register the type without the `test_class` tag.
pub const FIXTURE_SUPPORT_ARG: &str = "support";

/// Metadata entry for a tag.
pub type TagInfo = LangItemInfo<TagId>;

/// Registry of supported tags.
pub const TAGS: &[TagInfo] = &[
    info(
        TagId::TestClass,
        "test_class",
        &[],
        "Mark a type as a test class. Implied by `#[rigor::fixture]` unless `support` is given.",
        &[],
    ),
    info(
        TagId::TestCase,
        "test_case",
        &["test"],
        "Mark a zero-parameter method as a test case.",
        &[Example {
            code: "#[test_case]\nfn add_ok(&mut self) -> TestResult {\n    check::equal(4, 2 + 2)\n}",
            note: None,
        }],
    ),
    info(
        TagId::SetUp,
        "setup",
        &["set_up"],
        "Instance method run on a fresh instance before each test case.",
        &[],
    ),
    info(
        TagId::TearDown,
        "teardown",
        &["tear_down"],
        "Instance method run on the same instance after each test case.",
        &[],
    ),
    info(
        TagId::OneTimeSetUp,
        "one_time_setup",
        &["before_all"],
        "Static method run once before any test case of the fixture.",
        &[Example {
            code: "#[one_time_setup]\nfn open_db() -> TestResult {\n    Ok(())\n}",
            note: Some("If this fails, every test case of the fixture is reported as not run."),
        }],
    ),
    info(
        TagId::OneTimeTearDown,
        "one_time_teardown",
        &["after_all"],
        "Static method run once after all test cases of the fixture.",
        &[],
    ),
    info(
        TagId::ExpectedError,
        "expected_error",
        &["expected_exception"],
        "Declare that a test case passes only if it raises the given kind (or a subkind).",
        &[Example {
            code: "#[test_case]\n#[expected_error(ZERO_DIVISION_ERROR, message = \"by zero\")]\nfn div_zero(&mut self) -> TestResult {\n    self.calc.div(1, 0).map(drop)\n}",
            note: Some("The optional `message` is a substring the raised message must contain."),
        }],
    ),
];

/// Resolve a tag spelling to its stable id.
pub fn from_str(name: &str) -> Option<TagId> {
    if let Some(info) = TAGS.iter().find(|t| t.canonical == name) {
        return Some(info.id);
    }
    TAGS.iter().find(|t| t.aliases.contains(&name)).map(|t| t.id)
}

/// Return the canonical spelling for a tag.
pub fn as_str(id: TagId) -> &'static str {
    info_for(id).canonical
}

/// Return the metadata entry for a tag.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (programming error).
pub fn info_for(id: TagId) -> &'static TagInfo {
    TAGS.iter().find(|t| t.id == id).expect("tag info missing")
}

const fn info(
    id: TagId,
    canonical: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    examples: &'static [Example],
) -> TagInfo {
    LangItemInfo {
        id,
        canonical,
        aliases,
        description,
        since_version: Some("0.1.0"),
        stability: Stability::Stable,
        examples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_round_trips_through_its_spelling() {
        for tag in TAGS {
            assert_eq!(from_str(tag.canonical), Some(tag.id));
            for alias in tag.aliases {
                assert_eq!(from_str(alias), Some(tag.id));
            }
        }
    }

    #[test]
    fn unknown_spelling_is_rejected() {
        assert_eq!(from_str("TestCase"), None);
        assert_eq!(from_str(""), None);
    }

    #[test]
    fn only_one_time_roles_require_static() {
        assert!(TagId::OneTimeSetUp.requires_static());
        assert!(TagId::OneTimeTearDown.requires_static());
        assert!(!TagId::SetUp.requires_static());
        assert!(!TagId::TestCase.requires_static());
        assert!(!TagId::TestCase.is_lifecycle());
        assert!(TagId::TearDown.is_lifecycle());
    }
}

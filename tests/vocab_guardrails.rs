//! Tag and failure-kind spellings live in `rigor_core::lang`; everything else goes through its registries.
//!
//! The checks are coarse on purpose. They catch a freshly added `== "ValueError"` or `"test_case" =>`, and a
//! registration macro that starts matching attribute names by hand.

use std::fs;
use std::path::{Path, PathBuf};

use rigor_core::lang::{kinds, tags};

fn root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

/// Every tag spelling (aliases included) and every builtin kind name.
fn spellings() -> Vec<&'static str> {
    let tag_spellings = tags::TAGS
        .iter()
        .flat_map(|t| std::iter::once(t.canonical).chain(t.aliases.iter().copied()));
    let kind_names = kinds::BUILTIN_KINDS.iter().map(|k| k.name());
    tag_spellings.chain(kind_names).collect()
}

/// Rust sources under `dir`, skipping the registries and the reference generator.
fn sources(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for path in entries.flatten().map(|e| e.path()) {
        let rel = path.strip_prefix(root()).unwrap_or(&path).to_string_lossy().replace('\\', "/");
        if rel.starts_with("crates/rigor_core/src/lang") || rel.ends_with("generate_vocab_reference.rs") {
            continue;
        }
        if path.is_dir() {
            sources(&path, out);
        } else if rel.ends_with(".rs") {
            out.push(path);
        }
    }
}

#[test]
fn vocabulary_is_not_matched_by_string() {
    let spellings = spellings();
    let mut files = Vec::new();
    sources(&root().join("src"), &mut files);
    sources(&root().join("crates"), &mut files);
    assert!(!files.is_empty());

    let mut offenders = Vec::new();
    for file in &files {
        let contents = fs::read_to_string(file).unwrap();
        for (idx, line) in contents.lines().enumerate() {
            if line.trim_start().starts_with("//") {
                continue;
            }
            let hit = spellings
                .iter()
                .any(|s| line.contains(&format!("== \"{s}\"")) || line.contains(&format!("\"{s}\" =>")));
            if hit {
                offenders.push(format!("{}:{}: {}", file.display(), idx + 1, line.trim()));
            }
        }
    }
    assert!(offenders.is_empty(), "compare against rigor_core registries instead:\n{}", offenders.join("\n"));
}

#[test]
fn fixture_macro_resolves_tags_through_the_registry() {
    let source = fs::read_to_string(root().join("crates/rigor_derive/src/lib.rs")).unwrap();

    assert!(source.contains("tags::from_str("), "attribute names must be resolved with tags::from_str");
    assert!(!source.contains("is_ident(\""), "fixture arguments must use the tags::FIXTURE_*_ARG constants");
    for spelling in spellings() {
        assert!(
            !source.contains(&format!("\"{spelling}\"")),
            "rigor_derive spells `{spelling}` literally"
        );
    }
}

#[test]
fn macro_arguments_are_distinct_from_tag_spellings() {
    let arguments = [
        tags::FIXTURE_BASE_ARG,
        tags::FIXTURE_CONSTRUCTOR_ARG,
        tags::FIXTURE_NO_CONSTRUCTOR_ARG,
        tags::FIXTURE_SUPPORT_ARG,
        tags::EXPECTED_ERROR_MESSAGE_ARG,
    ];
    for argument in arguments {
        assert_eq!(tags::from_str(argument), None, "`{argument}` would be read as a tag");
    }
}

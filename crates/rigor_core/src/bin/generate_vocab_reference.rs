//! Generate Markdown reference docs from `rigor_core::lang` registries.
//!
//! This binary renders the tag registry and the builtin failure-kind hierarchy into a Markdown file under
//! `docs/reference/`.
//!
//! ## Notes
//! - The generated file is a derived artifact; update the registries instead of editing it by hand.
//!
//! ## Examples
//! Run from the workspace root:
//! ```bash
//! cargo run -p rigor_core --bin generate_vocab_reference
//! ```
//!
//! ## Panics
//! - If the workspace root cannot be resolved.
//! - If the output file cannot be written.

use std::fs;
use std::path::{Path, PathBuf};

use rigor_core::lang::{kinds, tags};

fn main() {
    let root = workspace_root();

    let out_dir = root.join("docs/reference");
    fs::create_dir_all(&out_dir).expect("create docs/reference/");

    write_vocab_reference(&out_dir.join("vocabulary.md"));
}

fn write_vocab_reference(path: &Path) {
    let mut out = String::new();
    out.push_str("# rigor vocabulary reference\n\n");
    out.push_str("> Generated file. Regenerate with `cargo run -p rigor_core --bin generate_vocab_reference`.\n\n");

    render_tags_section(&mut out);
    render_kinds_section(&mut out);

    fs::write(path, out).expect("write vocabulary reference");
}

fn render_tags_section(out: &mut String) {
    out.push_str("## Tags\n\n");
    out.push_str("| Id | Canonical | Aliases | Description | Since | Stability |\n");
    out.push_str("|---|---|---|---|---|---|\n");

    for t in tags::TAGS {
        let aliases = t
            .aliases
            .iter()
            .map(|a| format!("`{a}`"))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "| {:?} | `{}` | {} | {} | {} | {:?} |\n",
            t.id,
            t.canonical,
            aliases,
            t.description,
            t.since_version.unwrap_or(""),
            t.stability
        ));
    }
    out.push('\n');

    for t in tags::TAGS.iter().filter(|t| !t.examples.is_empty()) {
        out.push_str(&format!("### `{}`\n\n", t.canonical));
        for ex in t.examples {
            out.push_str("```rust\n");
            out.push_str(ex.code);
            out.push_str("\n```\n\n");
            if let Some(note) = ex.note {
                out.push_str(note);
                out.push_str("\n\n");
            }
        }
    }
}

fn render_kinds_section(out: &mut String) {
    out.push_str("## Builtin failure kinds\n\n");
    out.push_str("| Kind | Lineage | Description |\n");
    out.push_str("|---|---|---|\n");

    for k in kinds::BUILTIN_KINDS {
        let lineage = k.lineage().skip(1).map(|p| p.name()).collect::<Vec<_>>().join(" < ");
        out.push_str(&format!("| `{}` | {} | {} |\n", k.name(), lineage, k.description()));
    }
    out.push('\n');
}

fn workspace_root() -> PathBuf {
    // crates/rigor_core -> crates -> workspace root
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())
        .expect("workspace root (two levels above crates/rigor_core)")
}

//! rigor CLI entry point, running the bundled sample modules

mod demo;

fn main() {
    rigor::cli::run(&demo::registry());
}

//! Scaling analysis: anchor import versus full import
//!
//! `!import.anchor` slices the event stream instead of constructing the whole
//! document. This benchmark times both paths on documents of growing size,
//! with the anchored section placed at the start of the document.
//!
//! Run with: cargo bench --bench anchor_extraction

use std::fs;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use yaml_extras::{EventStream, Loader, LoaderOptions, anchor, parser};

const ITERATIONS: u32 = 20;

struct ScalingResult {
    size: usize,
    full: Duration,
    anchored: Duration,
    extract_only: Duration,
}

/// Generate a document with one small anchored section followed by N sections
fn generate_document(n: usize) -> String {
    let mut yaml = String::from("target: &target\n  name: wanted\n  items: [1, 2, 3]\n");
    for i in 0..n {
        yaml.push_str(&format!(
            "section_{}:\n  title: \"Section {}\"\n  enabled: true\n  items:\n    - item1\n    - item2\n    - item3\n",
            i, i
        ));
    }
    yaml
}

fn time<F: FnMut()>(mut f: F) -> Duration {
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        f();
    }
    start.elapsed() / ITERATIONS
}

fn main() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let sizes = [100, 1_000, 10_000];

    println!("{}", "=".repeat(70));
    println!("Anchor extraction vs full import");
    println!("{}", "=".repeat(70));
    println!(
        "{:>7} {:>14} {:>14} {:>14}",
        "Size", "!import", "!import.anchor", "extract only"
    );
    println!("{}", "-".repeat(70));

    let mut results = Vec::new();
    for &size in &sizes {
        let content = generate_document(size);
        fs::write(temp.path().join("big.yml"), &content).expect("Failed to write document");

        let mut loader = Loader::with_options(LoaderOptions::default().with_base_dir(temp.path()));
        let full = time(|| {
            loader.load_str("v: !import big.yml").expect("full import failed");
        });
        let anchored = time(|| {
            loader
                .load_str("v: !import.anchor big.yml &target")
                .expect("anchor import failed");
        });
        let extract_only = time(|| {
            let stream = EventStream::parse(&content, None).expect("Failed to parse");
            let events = anchor::extract(stream.events(), "target").expect("anchor missing");
            parser::compose(events, None).expect("Failed to compose");
        });

        println!(
            "{:>7} {:>14.2?} {:>14.2?} {:>14.2?}",
            size, full, anchored, extract_only
        );
        results.push(ScalingResult {
            size,
            full,
            anchored,
            extract_only,
        });
    }

    println!("\nScaling Analysis:");
    if let (Some(first), Some(last)) = (results.first(), results.last()) {
        let size_ratio = last.size as f64 / first.size as f64;
        let full_ratio = last.full.as_secs_f64() / first.full.as_secs_f64();
        let anchored_ratio = last.anchored.as_secs_f64() / first.anchored.as_secs_f64();
        println!("  Size increased:            {:.1}x", size_ratio);
        println!("  Full import time:          {:.1}x", full_ratio);
        println!("  Anchor import time:        {:.1}x", anchored_ratio);
        println!(
            "  Anchor share of full (largest): {:.1}%",
            100.0 * last.anchored.as_secs_f64() / last.full.as_secs_f64()
        );
        println!(
            "  Extract share of anchor (largest): {:.1}%",
            100.0 * last.extract_only.as_secs_f64() / last.anchored.as_secs_f64()
        );
    }
}

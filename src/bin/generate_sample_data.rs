// Small dev utility: write sample input files for every table kind.
//
// Usage:
//   cargo run --bin generate_sample_data -- [out_dir]
//
// Default out_dir is ./sample_data. Files are named {kind}_sample.csv / {kind}_sample.json.

use equipment_metrics::importer::templates;
use equipment_metrics::logging;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    logging::init();

    let out_dir = std::env::args()
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));

    let written = templates::write_samples(&out_dir)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

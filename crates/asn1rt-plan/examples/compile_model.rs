use std::env;
use std::path::PathBuf;

use asn1rt_plan::{ValidationReport, load_model};
use serde_json::Value;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let model_path = args.next().map(PathBuf::from).ok_or("missing model path")?;
    let type_name = args.next();

    let contents = std::fs::read_to_string(&model_path)?;
    let model_json: Value = serde_json::from_str(&contents)?;

    let loaded = match load_model(&model_json) {
        Ok(loaded) => loaded,
        Err(report) => {
            eprintln!("model validation failed");
            print_report(&report);
            std::process::exit(1);
        }
    };

    if !loaded.warnings.is_empty() {
        eprintln!("model loaded with warnings:");
        print_report(&ValidationReport {
            errors: Vec::new(),
            warnings: loaded.warnings,
        });
    }

    let names: Vec<String> = match type_name {
        Some(name) => vec![name],
        None => loaded.compiled.type_names().map(str::to_string).collect(),
    };
    for name in names {
        let plan = loaded.compiled.require_plan(&name)?;
        println!("{}", serde_json::to_string_pretty(plan)?);
    }

    Ok(())
}

fn print_report(report: &ValidationReport) {
    for issue in report.errors.iter().chain(report.warnings.iter()) {
        eprintln!("{issue}");
    }
}

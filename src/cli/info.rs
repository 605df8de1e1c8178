use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use pico::classify::{classify_dir, function_type_name, Classification, FunctionInfo, Rule};

#[derive(Serialize)]
struct InfoReport<'a> {
    directory: String,
    classification: &'a Classification,
    inlet: &'a [(String, String)],
}

fn trace_text(trace: &[Rule]) -> String {
    if trace.is_empty() {
        return "-".to_string();
    }
    trace
        .iter()
        .map(|rule| format!("{:?}", rule))
        .collect::<Vec<_>>()
        .join(" > ")
}

fn function_line(f: &FunctionInfo) -> String {
    format!(
        "  {:>3}  {:<24} {:<24} {:>5}  {:<12} {}",
        f.number(),
        f.name,
        function_type_name(f.record.function_type),
        f.ms_level,
        f.role.to_string(),
        trace_text(&f.trace)
    )
}

/// Display how the functions of a Waters .raw directory were classified
pub fn run(input: PathBuf, json: bool) -> Result<()> {
    if !input.is_dir() {
        anyhow::bail!("Input is not a .raw directory: {}", input.display());
    }

    let metadata = classify_dir(&input)
        .with_context(|| format!("Failed to classify {}", input.display()))?;
    let classification = &metadata.classification;

    if json {
        let report = InfoReport {
            directory: input.display().to_string(),
            classification,
            inlet: &metadata.inlet,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
        return Ok(());
    }

    print_table(&input, classification);

    if !metadata.inlet.is_empty() {
        println!();
        println!("Inlet:");
        for (key, value) in &metadata.inlet {
            println!("  {}: {}", key, value);
        }
    }

    Ok(())
}

fn print_table(input: &Path, classification: &Classification) {
    println!("Waters Raw Function Classification");
    println!("==================================");
    println!("Directory: {}", input.display());
    println!(
        "Source: {}",
        if classification.from_functns {
            "_FUNCTNS.INF"
        } else {
            "_extern.inf"
        }
    );
    println!();

    println!(
        "  {:>3}  {:<24} {:<24} {:>5}  {:<12} Rules",
        "#", "Name", "Type", "Level", "Role"
    );
    for function in &classification.functions {
        println!("{}", function_line(function));
    }
    println!();

    match classification.mse {
        Some(rule) => println!("MSE: yes ({:?})", rule),
        None => println!("MSE: no"),
    }
    println!("Accurate mass: {}", classification.accurate);

    if !classification.cautions.is_empty() {
        println!();
        println!("Cautions:");
        for caution in &classification.cautions {
            println!("  - {}", caution);
        }
    }
}

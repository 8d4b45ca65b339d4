// Subcommand implementations for eplusctl

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use eplus_sub::{Config, Dispatch, SubstitutionOutput, SubstitutionRequest, Substitutor, Weather};

pub fn substitute(
    config: &Config,
    template: &Path,
    request: &SubstitutionRequest,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let results = Substitutor::from_config(config)
        .dispatch(template, None, request, verbose)
        .with_context(|| format!("Substitution into {} failed", template.display()))?;

    let batch = results.is_batch();
    for (i, result) in results.into_vec().into_iter().enumerate() {
        let Some(document) = result.as_document() else {
            bail!("Substitution returned simulation output without a weather file");
        };

        match output {
            Some(path) => {
                let path = if batch { indexed(path, i) } else { path.to_path_buf() };
                fs::write(&path, document)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!(path = %path.display(), "Wrote document");
            }
            None => {
                if batch {
                    println!("! ---- batch entry {} ----", i);
                }
                print!("{}", document);
            }
        }
    }

    Ok(())
}

pub fn run(
    config: &Config,
    template: &Path,
    weather: &Path,
    request: &SubstitutionRequest,
    output_dir: &Path,
    verbose: bool,
) -> Result<()> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let results = Substitutor::from_config(config)
        .dispatch(template, Some(weather), request, verbose)
        .context("Simulation failed")?;

    let base = output_dir.join("result.csv");
    let written: Vec<PathBuf> = match results {
        Dispatch::Single(result) => vec![write_result(&result, base)?],
        Dispatch::Batch(results) => results
            .iter()
            .enumerate()
            .map(|(i, result)| write_result(result, indexed(&base, i)))
            .collect::<Result<_>>()?,
    };

    for path in &written {
        println!("{}", path.display());
    }

    Ok(())
}

pub fn weather_summary(file: &Path, column: &str) -> Result<()> {
    let weather = Weather::read(file)
        .with_context(|| format!("Failed to read weather file {}", file.display()))?;

    println!("📍 {}", weather.location().unwrap_or("unknown location"));
    for key in weather.headers().keys() {
        println!("   {}", key);
    }
    println!("   {} records", weather.data().len());

    let values = weather.column_f64(column)?;
    if values.is_empty() {
        return Ok(());
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    println!("\n{}: min {:.2}, mean {:.2}, max {:.2}", column, min, mean, max);

    Ok(())
}

fn write_result(result: &SubstitutionOutput, path: PathBuf) -> Result<PathBuf> {
    let Some(table) = result.as_table() else {
        bail!("Expected simulation output for {}", path.display());
    };
    table
        .to_csv_path(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// `out/model.idf` -> `out/model_3.idf`
fn indexed(path: &Path, i: usize) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, i, ext.to_string_lossy()),
        None => format!("{}_{}", stem, i),
    };
    path.with_file_name(name)
}

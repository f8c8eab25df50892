//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::BatchFormat;
use crate::api::{self, BatchItem, BatchResponse, EvaluateResponse, MeasurementRequest};
use crate::config::Config;
use std::path::{Path, PathBuf};
use tumbuh_core::{
    Evaluation, GrowthError, IndicatorOutcome, Sex, Standard, primitives::MAX_BATCH_SIZE,
};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum batch file size (50 MB).
const MAX_BATCH_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), GrowthError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GrowthError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(GrowthError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and ensure it is a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, GrowthError> {
    let canonical = path.canonicalize().map_err(|e| {
        GrowthError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(GrowthError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), GrowthError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| GrowthError::IoError(format!("Serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Load reference data, then start the HTTP server.
pub async fn cmd_server(config: &Config) -> Result<(), GrowthError> {
    let evaluator = config.evaluator()?;
    let addr = config.bind_addr();

    println!("Tumbuh Growth Standard Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:        {}", addr);
    println!("  Reference:      {}", describe_source(config));
    println!("  Restrict tails: {}", config.evaluator.restrict_tails);
    println!();
    println!("Endpoints:");
    println!("  GET  /health                   - Health check");
    println!("  GET  /reference                - Loaded reference tables");
    println!("  POST /evaluate                 - Evaluate one measurement");
    println!("  POST /evaluate/batch           - Evaluate many measurements");
    println!("  GET  /curve/{{standard}}/{{sex}}?z= - SD line");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&addr, evaluator).await
}

fn describe_source(config: &Config) -> String {
    match &config.reference.dir {
        Some(dir) => format!("{}", dir.display()),
        None => "embedded WHO 2006".to_string(),
    }
}

// =============================================================================
// EVALUATE COMMAND
// =============================================================================

/// Evaluate one measurement.
pub fn cmd_evaluate(
    config: &Config,
    json_mode: bool,
    request: &MeasurementRequest,
) -> Result<(), GrowthError> {
    let evaluator = config.evaluator()?;
    let measurement = request.to_measurement()?;
    let evaluation = evaluator.evaluate(&measurement);
    let response = EvaluateResponse::new(&measurement, evaluation);

    if json_mode {
        return print_json(&response);
    }

    println!("Tumbuh Evaluation");
    println!("=================");
    println!(
        "Sex: {}    Age: {:.2} months",
        response.sex, response.age_in_months
    );
    println!();
    print_evaluation(&response.evaluation);
    if let Some(worst) = response.worst_status {
        println!();
        println!("Overall: {}", worst);
    }

    Ok(())
}

fn print_evaluation(evaluation: &Evaluation) {
    for (indicator, outcome) in evaluation.iter() {
        println!("  {:<28} {}", indicator.as_str(), describe_outcome(outcome));
    }
}

/// One-line human description of an indicator outcome.
pub fn describe_outcome(outcome: &IndicatorOutcome) -> String {
    match outcome {
        IndicatorOutcome::Computed(result) => {
            let mut line = format!(
                "z = {:>6.2}  {:<8} P{:<5.1} [{}]",
                result.z_score, result.status, result.percentile, result.standard
            );
            if let Some(label) = result.interpretation {
                line.push_str(&format!("  {}", label));
            }
            if result.implausible {
                line.push_str("  (implausible, check measurement)");
            }
            line
        }
        IndicatorOutcome::OutOfRange(range) => format!("out of range: {}", range),
        IndicatorOutcome::Invalid { error } => format!("invalid: {}", error),
        IndicatorOutcome::NotMeasured => "not measured".to_string(),
    }
}

// =============================================================================
// BATCH COMMAND
// =============================================================================

/// Evaluate every record of a JSON array or CSV file.
pub fn cmd_batch(
    config: &Config,
    json_mode: bool,
    file: &Path,
    format: BatchFormat,
) -> Result<(), GrowthError> {
    tracing::info!("Evaluating batch from {:?} (format: {:?})", file, format);

    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_BATCH_FILE_SIZE)?;
    let contents = std::fs::read(&validated_path)
        .map_err(|e| GrowthError::IoError(format!("Read file: {}", e)))?;

    let requests = parse_batch(&contents, format, &validated_path.display().to_string())?;
    if requests.len() > MAX_BATCH_SIZE {
        return Err(GrowthError::IoError(format!(
            "Record count {} exceeds maximum {}",
            requests.len(),
            MAX_BATCH_SIZE
        )));
    }

    let evaluator = config.evaluator()?;
    let response = BatchResponse::new(api::evaluate_requests(&evaluator, &requests));

    if json_mode {
        return print_json(&response);
    }

    println!(
        "Evaluated {} records ({} rejected)",
        response.count, response.rejected
    );
    for item in &response.results {
        print_batch_item(item);
    }
    Ok(())
}

/// Parse batch records. CSV headers match the JSON field names.
pub fn parse_batch(
    contents: &[u8],
    format: BatchFormat,
    source_name: &str,
) -> Result<Vec<MeasurementRequest>, GrowthError> {
    match format {
        BatchFormat::Json => serde_json::from_slice(contents)
            .map_err(|e| GrowthError::IoError(format!("Invalid JSON in {}: {}", source_name, e))),
        BatchFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(true)
                .trim(csv::Trim::All)
                .from_reader(contents);
            reader
                .deserialize::<MeasurementRequest>()
                .map(|record| {
                    record.map_err(|e| GrowthError::Csv {
                        source_name: source_name.to_string(),
                        message: e.to_string(),
                    })
                })
                .collect()
        }
    }
}

fn print_batch_item(item: &BatchItem) {
    match (&item.result, &item.error) {
        (Some(result), _) => {
            println!();
            println!(
                "#{} {} {:.2} months - {}",
                item.index,
                result.sex,
                result.age_in_months,
                result
                    .worst_status
                    .map_or("no z-score".to_string(), |s| s.to_string())
            );
            print_evaluation(&result.evaluation);
        }
        (None, Some(error)) => {
            println!();
            println!("#{} rejected: {}", item.index, error);
        }
        (None, None) => {}
    }
}

// =============================================================================
// TABLES COMMAND
// =============================================================================

/// List the loaded reference tables.
pub fn cmd_tables(config: &Config, json_mode: bool) -> Result<(), GrowthError> {
    let reference = config.load_reference()?;
    let summaries = reference.summaries();

    if json_mode {
        return print_json(&summaries);
    }

    println!("Tumbuh Reference Tables");
    println!("=======================");
    println!("Source: {}", describe_source(config));
    println!();
    println!(
        "  {:<6} {:<7} {:<20} {:>7} {:>7} {:>5} {:>5}",
        "code", "sex", "axis", "min", "max", "step", "rows"
    );
    for s in &summaries {
        println!(
            "  {:<6} {:<7} {:<20} {:>7.1} {:>7.1} {:>5.1} {:>5}",
            s.standard.code(),
            s.sex.as_str(),
            s.axis.to_string(),
            s.min,
            s.max,
            s.step,
            s.rows
        );
    }

    Ok(())
}

// =============================================================================
// CURVE COMMAND
// =============================================================================

/// Print the SD line of one table.
pub fn cmd_curve(
    config: &Config,
    json_mode: bool,
    standard: &str,
    sex: &str,
    z: f64,
) -> Result<(), GrowthError> {
    let standard: Standard = standard.parse()?;
    let sex: Sex = sex.parse()?;
    let evaluator = config.evaluator()?;
    let points = evaluator.sd_curve(standard, sex, z);

    if json_mode {
        let output = serde_json::json!({
            "standard": standard,
            "sex": sex,
            "axis": standard.axis(),
            "z": z,
            "points": points,
        });
        return print_json(&output);
    }

    println!("{} {} at z = {}", standard.name(), sex, z);
    println!("  axis: {}", standard.axis());
    for point in &points {
        println!("  {:>8.1}  {:>9.3}", point.key, point.value);
    }

    Ok(())
}

// =============================================================================
// VERIFY COMMAND
// =============================================================================

/// Load and validate reference data, then print its fingerprint.
pub fn cmd_verify(config: &Config, json_mode: bool) -> Result<(), GrowthError> {
    let reference = config.load_reference()?;
    let fingerprint = reference.fingerprint();
    let tables = reference.tables().count();

    if json_mode {
        let output = serde_json::json!({
            "valid": true,
            "source": reference.source(),
            "tables": tables,
            "fingerprint": fingerprint,
        });
        return print_json(&output);
    }

    println!("Reference data OK: {} tables", tables);
    println!("Source:      {}", describe_source(config));
    println!("Fingerprint: {}", fingerprint);

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_csv_batch_with_blank_fields() {
        let data = b"sex,age_in_months,weight_kg,height_cm,head_circumference_cm,position\n\
                     MALE,6,7.9,,,\n\
                     P,12,6.0,70.1,44.0,recumbent\n";
        let records = parse_batch(data, BatchFormat::Csv, "inline.csv").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].weight_kg, Some(7.9));
        assert_eq!(records[0].height_cm, None);
        assert_eq!(records[1].position.as_deref(), Some("recumbent"));
    }

    #[test]
    fn parses_json_batch() {
        let data = br#"[{"sex":"FEMALE","age_in_months":12,"weight_kg":6.0}]"#;
        let records = parse_batch(data, BatchFormat::Json, "inline.json").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sex, "FEMALE");
    }

    #[test]
    fn rejects_malformed_json_batch() {
        let result = parse_batch(b"{not json", BatchFormat::Json, "bad.json");
        assert!(matches!(result, Err(GrowthError::IoError(_))));
    }

    #[test]
    fn describes_not_measured() {
        assert_eq!(
            describe_outcome(&IndicatorOutcome::NotMeasured),
            "not measured"
        );
    }
}

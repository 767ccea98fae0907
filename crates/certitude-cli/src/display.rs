//! Human-readable cards for verification reports and classifier verdicts.

use std::path::Path;

use certitude_ai::Classification;
use certitude_core::TargetField;
use certitude_pipeline::{BatchSummary, VerificationReport};

/// Print one report as a vertical card grouped by section.
pub fn print_report_card(report: &VerificationReport) {
    println!("=== {} ===", report.doc_id);
    println!("{}", report.final_status);
    println!();

    println!("Fields");
    for field in TargetField::ALL {
        let value = report
            .fields
            .get(&field)
            .and_then(|v| v.as_deref())
            .unwrap_or("-");
        let confidence = report.confidence.get(&field).copied().unwrap_or(0.0);
        println!("  {:<20} {:<40} {:.2}", field.as_str(), value, confidence);
    }
    println!();

    println!("Validation");
    let v = &report.validation;
    println!("  {:<20} {}", "issued_date_valid", yes_no(v.issued_date_valid));
    println!("  {:<20} {}", "expiry_status", v.expiry_status);
    println!("  {:<20} {}", "dates_consistent", yes_no(v.dates_consistent));
    if let Some(err) = &v.error {
        println!("  {:<20} {}", "error", err);
    }
    println!();

    println!("Issuer");
    println!("  {:<20} {}", "status", report.issuer_validation.status);
    if let Some(ext) = &report.external_verification {
        println!("  {:<20} {}", "external", ext.status);
        println!("  {:<20} {}", "reason", ext.reason);
        if let Some(api) = &ext.api_used {
            println!("  {:<20} {}", "api_used", api);
        }
    }
    println!();

    if !report.confidence_flags.is_empty() {
        println!("Flags");
        for flag in &report.confidence_flags {
            println!("  {flag}");
        }
        println!();
    }

    if !report.diagnostics.is_empty() {
        println!("Diagnostics");
        for d in &report.diagnostics {
            println!("  {d}");
        }
        println!();
    }
}

/// Print the classifier's evidence for one file.
pub fn print_classification(path: &Path, file_type: &str, c: &Classification) {
    println!("=== {} ===", path.display());
    println!("  {:<20} {}", "file_type", file_type);
    println!("  {:<20} {}", "file_type_allowed", yes_no(c.file_type_allowed));
    println!("  {:<20} {}", "primary_count", c.signals.primary_count);
    println!("  {:<20} {}", "formal_count", c.signals.formal_count);
    println!(
        "  {:<20} {} ({} hits)",
        "date_found",
        yes_no(c.signals.date_found()),
        c.signals.date_hits
    );
    println!("  {:<20} {}", "field_count", c.signals.field_count);
    match c.rule {
        Some(rule) => println!("  {:<20} yes ({})", "certificate", rule.as_str()),
        None => println!("  {:<20} no", "certificate"),
    }
}

pub fn print_batch_summary(summary: &BatchSummary, output: &Path) {
    println!(
        "Processed {}/{} documents ({} skipped)",
        summary.processed, summary.listed, summary.skipped
    );
    println!("Results saved to {} (PII redacted)", output.display());
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

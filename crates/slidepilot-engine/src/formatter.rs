use crate::workflow::WorkflowReport;

/// Human-readable summary of a finished run.
pub fn format_report(report: &WorkflowReport) -> String {
    let mut output = format!("Finished in: {}", report.final_state);

    match &report.response {
        Some(response) => output.push_str(&format!(
            "\nResponse: {} chars via {}",
            response.text.chars().count(),
            response.provenance
        )),
        None => output.push_str("\nResponse: none"),
    }

    if let Some(url) = &report.presentation_url {
        output.push_str(&format!("\nPresentation: {}", url));
    }

    if !report.degraded.is_empty() {
        output.push_str("\n\nDegraded steps:");
        for step in &report.degraded {
            output.push_str(&format!("\n- {}: {}", step.state, step.reason));
        }
    }

    if !report.snapshots.is_empty() {
        output.push_str("\n\nSnapshots:");
        for path in &report.snapshots {
            output.push_str(&format!("\n- {}", path));
        }
    }

    output
}

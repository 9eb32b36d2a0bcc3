use crate::languages::{Analysis, Issue};
use crate::pipeline::MinifyResult;

fn human_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}

pub fn format_stats(label: &str, result: &MinifyResult) -> String {
    format!(
        "codemin: {} ({}): {} -> {} ({:.1}% smaller)",
        label,
        result.language,
        human_size(result.original_len),
        human_size(result.minified_len),
        result.reduction_pct()
    )
}

pub fn format_totals(results: &[&MinifyResult]) -> String {
    let original: usize = results.iter().map(|r| r.original_len).sum();
    let minified: usize = results.iter().map(|r| r.minified_len).sum();
    let pct = if original == 0 {
        0.0
    } else {
        (1.0 - minified as f64 / original as f64) * 100.0
    };
    format!(
        "codemin: {} files: {} -> {} ({:.1}% smaller)",
        results.len(),
        human_size(original),
        human_size(minified),
        pct
    )
}

pub fn format_analysis(label: &str, analysis: &Analysis) -> String {
    let mut line = format!(
        "codemin: {} ({}): {} lines, {} chars, {}",
        label,
        analysis.language,
        analysis.lines,
        analysis.characters,
        human_size(analysis.bytes)
    );
    if let Some(kind) = &analysis.kind {
        line.push_str(&format!(", {}", kind));
    }
    for (name, count) in &analysis.counts {
        line.push_str(&format!(", {} {}", count, name));
    }
    if let Some(error) = &analysis.error {
        line.push_str(&format!(" (invalid: {})", error));
    }
    line
}

pub fn format_issues(label: &str, issues: &[Issue]) -> String {
    if issues.is_empty() {
        return String::new();
    }

    let mut lines = vec![format!("CODEMIN: {} issues in {}", issues.len(), label)];

    for issue in issues {
        let location = match issue.line {
            Some(l) => format!("{}:{}", label, l),
            None => label.to_string(),
        };
        lines.push(format!("  - [{}] {} at {}", issue.check, issue.message, location));
    }

    lines.push(String::new());

    lines.join("\n")
}

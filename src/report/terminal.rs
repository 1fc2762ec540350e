use std::collections::HashMap;

use anyhow::Result;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use license_compat::models::{
    DependencyNode, EnhancedConflict, RiskLevel, ScanResult, Severity,
};

/// Render a colored terminal report.
pub fn render(result: &ScanResult, tree: &DependencyNode, verbose: bool, quiet: bool) -> Result<()> {
    let summary = &result.summary;
    let total_conflicts = summary.total_conflicts();

    if quiet {
        println!(
            "Risk: {}/100  Dependencies: {}  Critical: {}  High: {}  Medium: {}  Low: {}",
            score_colored(result.risk_score),
            summary.total_dependencies,
            summary.critical.to_string().red(),
            summary.high.to_string().yellow(),
            summary.medium.to_string().cyan(),
            summary.low.to_string().dimmed(),
        );
        return Ok(());
    }

    println!(
        "\n {} v{}",
        "license-compat".bold(),
        env!("CARGO_PKG_VERSION")
    );
    let ctx = &result.context;
    println!(
        " Scanning: {} {}  [{} / {} / {} linking]\n",
        tree.name,
        ctx.license.as_deref().unwrap_or("(no license declared)"),
        ctx.intent,
        ctx.distribution,
        ctx.linking,
    );

    // Summary box
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(
        " │  {:<48} │",
        format!("Total dependencies : {}", summary.total_dependencies)
    );
    println!(
        " │  {:<48} │",
        format!("Dev-only skipped   : {}", summary.dev_only_skipped)
    );
    println!(
        " │  {:<48} │",
        format!("Risk score         : {}/100", result.risk_score)
    );
    for severity in Severity::ALL {
        let count = match severity {
            Severity::Critical => summary.critical,
            Severity::High => summary.high,
            Severity::Medium => summary.medium,
            Severity::Low => summary.low,
        };
        println!(
            " │  {:<48} │",
            format!(
                "{:<9}: {:>4}  {}",
                severity.to_string(),
                count,
                summarize_licenses(&result.conflicts, severity)
            )
        );
    }
    println!(" └────────────────────────────────────────────────────┘\n");

    if total_conflicts == 0 {
        println!(" {} No license conflicts found.\n", "✓".green().bold());
        return Ok(());
    }

    println!(
        " {} Risk score {}\n",
        "[RISK]".bold(),
        score_colored(result.risk_score)
    );

    println!(" {} License conflicts:\n", "[CONFLICT]".red().bold());
    render_conflicts(&result.conflicts);
    println!();

    for enhanced in &result.conflicts {
        let conflict = &enhanced.conflict;
        if let Some(path) = result.paths.get(&conflict.id) {
            println!(" {} {}", conflict.id.bold(), path.explanation);
            if verbose {
                for obligation in &path.obligations {
                    println!("     {} {}", "•".dimmed(), obligation);
                }
            }
        }
        if verbose {
            println!(
                "     {} {} ({})",
                "context:".dimmed(),
                enhanced.dynamic_severity.explanation,
                enhanced.dynamic_severity.intent_impact
            );
            render_fixes(enhanced);
        }
    }
    println!();

    if verbose && !result.impacts.is_empty() {
        println!(" {} Removing a package would eliminate:\n", "[IMPACT]".cyan().bold());
        render_impacts(result);
        println!();
    }

    Ok(())
}

fn render_conflicts(conflicts: &[EnhancedConflict]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Severity").add_attribute(Attribute::Bold),
            Cell::new("Context").add_attribute(Attribute::Bold),
            Cell::new("Rule").add_attribute(Attribute::Bold),
        ]);

    for enhanced in conflicts {
        let conflict = &enhanced.conflict;
        let rule = if conflict.rule.is_heuristic {
            format!("{} (heuristic)", conflict.rule.id)
        } else {
            conflict.rule.id.clone()
        };

        table.add_row(vec![
            Cell::new(&conflict.id),
            Cell::new(&conflict.dependency.name),
            Cell::new(&conflict.dependency.version),
            Cell::new(&conflict.dependency.license),
            Cell::new(conflict.severity.to_string())
                .fg(severity_color(conflict.severity))
                .set_alignment(CellAlignment::Center),
            Cell::new(enhanced.dynamic_severity.level.to_string())
                .fg(level_color(enhanced.dynamic_severity.level))
                .set_alignment(CellAlignment::Center),
            Cell::new(rule),
        ]);
    }

    println!("{}", table);
}

fn render_fixes(enhanced: &EnhancedConflict) {
    for fix in &enhanced.fixes {
        println!(
            "     {} [{} effort, {}] {}",
            "→".cyan(),
            fix.effort,
            fix.time_estimate,
            fix.description
        );
    }
}

fn render_impacts(result: &ScanResult) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Contribution").add_attribute(Attribute::Bold),
            Cell::new("Conflicts").add_attribute(Attribute::Bold),
            Cell::new("Score without").add_attribute(Attribute::Bold),
        ]);

    for impact in &result.impacts {
        table.add_row(vec![
            Cell::new(&impact.package),
            Cell::new(format!("{:.1}%", impact.contribution_pct)).set_alignment(CellAlignment::Right),
            Cell::new(impact.conflicts_removed).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}/100", impact.risk_score_without))
                .set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}", table);
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Critical => Color::Red,
        Severity::High => Color::Magenta,
        Severity::Medium => Color::Yellow,
        Severity::Low => Color::DarkGrey,
    }
}

fn level_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Critical => Color::Red,
        RiskLevel::High => Color::Magenta,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::Low => Color::DarkGrey,
        RiskLevel::Safe => Color::Green,
    }
}

fn score_colored(score: u32) -> ColoredString {
    let text = score.to_string();
    match score {
        80..=100 => text.green(),
        50..=79 => text.yellow(),
        _ => text.red(),
    }
}

fn summarize_licenses(conflicts: &[EnhancedConflict], severity: Severity) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for enhanced in conflicts.iter().filter(|c| c.conflict.severity == severity) {
        *counts
            .entry(enhanced.conflict.dependency.license.as_str())
            .or_insert(0) += 1;
    }

    let mut pairs: Vec<(&str, usize)> = counts.into_iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let summary: Vec<String> = pairs
        .iter()
        .take(3)
        .map(|(lic, cnt)| format!("{} ({})", lic, cnt))
        .collect();

    if summary.is_empty() {
        String::new()
    } else {
        format!("[{}]", summary.join(", "))
    }
}

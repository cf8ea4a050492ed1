use chrono::NaiveDate;
use contracts_client::{
    AskResponse, BatchReport, Contract, EmptyState, ListingViewModel, SummaryCounts,
    UploadCandidate, format_file_size,
};
use std::fmt::Write;

const NAME_WIDTH: usize = 32;
const PARTIES_WIDTH: usize = 30;

pub fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => "—".to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

pub fn summary(counts: &SummaryCounts) -> String {
    format!(
        "Total Contracts: {}   Active: {}   Renewal Due: {}   High Risk: {}",
        counts.total, counts.active, counts.renewal_due, counts.high_risk
    )
}

pub fn listing(view: &ListingViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", summary(&view.summary()));

    if let Some(empty) = view.empty_state() {
        match empty {
            EmptyState::NoContracts => {
                out.push_str("No contracts yet. Upload one with `contracts upload <file>`.\n");
            }
            EmptyState::NoMatches { search: Some(term) } => {
                let _ = writeln!(
                    out,
                    "No contracts found matching \"{}\". Try a different search term.",
                    term
                );
            }
            EmptyState::NoMatches { search: None } => {
                out.push_str(
                    "No contracts match your current filters. Try adjusting your filter criteria.\n",
                );
            }
        }
        return out;
    }

    let _ = writeln!(
        out,
        "{:<NAME_WIDTH$}  {:<PARTIES_WIDTH$}  {:<13}  {:<11}  {:<6}  ID",
        "CONTRACT NAME", "PARTIES", "EXPIRY DATE", "STATUS", "RISK"
    );
    let page = view.page();
    for contract in &page.items {
        let _ = writeln!(
            out,
            "{:<NAME_WIDTH$}  {:<PARTIES_WIDTH$}  {:<13}  {:<11}  {:<6}  {}",
            truncate(&contract.name, NAME_WIDTH),
            truncate(&contract.parties, PARTIES_WIDTH),
            format_date(contract.expiry_date),
            contract.status,
            contract.risk,
            contract.id
        );
    }

    if page.total_pages > 1 {
        let _ = writeln!(
            out,
            "\nShowing {} to {} of {} results (page {} of {})",
            page.first_item(),
            page.last_item(),
            page.total_items,
            page.number,
            page.total_pages
        );
    }
    out
}

pub fn contract_detail(contract: &Contract) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", contract.name);
    let _ = writeln!(out, "{}", "=".repeat(contract.name.chars().count()));
    let _ = writeln!(out, "Parties:     {}", contract.parties);
    let _ = writeln!(out, "Start date:  {}", format_date(contract.start_date));
    let _ = writeln!(out, "Expiry date: {}", format_date(contract.expiry_date));
    let _ = writeln!(out, "Status:      {}", contract.status);
    let _ = writeln!(out, "Risk:        {}", contract.risk);

    if !contract.clauses.is_empty() {
        out.push_str("\nClauses\n");
        for clause in &contract.clauses {
            let _ = writeln!(
                out,
                "  - {} ({} confidence)\n    {}",
                clause.title,
                percent(clause.confidence),
                clause.summary
            );
        }
    }

    if !contract.insights.is_empty() {
        out.push_str("\nInsights\n");
        for insight in &contract.insights {
            let label = match (&insight.risk, &insight.category) {
                (Some(risk), _) => format!("[{} risk] ", risk),
                (None, Some(category)) => format!("[{}] ", category),
                (None, None) => String::new(),
            };
            let _ = writeln!(out, "  - {}{}", label, insight.message);
        }
    }

    if !contract.evidence.is_empty() {
        out.push_str("\nEvidence\n");
        for item in &contract.evidence {
            let _ = writeln!(
                out,
                "  - {} ({} relevant)\n    \"{}\"",
                item.source,
                percent(item.relevance),
                item.snippet
            );
        }
    }
    out
}

pub fn candidates(candidates: &[UploadCandidate]) -> String {
    let mut out = String::new();
    for candidate in candidates {
        let _ = writeln!(
            out,
            "  {}  {} • {}",
            candidate.name,
            format_file_size(candidate.size),
            candidate.status_text()
        );
    }
    out
}

pub fn batch_report(report: &BatchReport) -> String {
    let mut out = String::new();
    for name in &report.uploaded {
        let _ = writeln!(out, "  uploaded  {}", name);
    }
    for failure in &report.failed {
        let _ = writeln!(out, "  failed    {}: {}", failure.name, failure.message);
    }
    let _ = writeln!(
        out,
        "{} of {} uploaded",
        report.uploaded.len(),
        report.attempted()
    );
    out
}

pub fn answer(response: &AskResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", response.answer);

    if !response.chunks.is_empty() {
        out.push_str("\nRelevant contract excerpts\n");
        for chunk in &response.chunks {
            let location = match chunk.metadata.page {
                Some(page) => format!("{} • Page {}", chunk.metadata.contract_name, page),
                None => chunk.metadata.contract_name.clone(),
            };
            let _ = writeln!(
                out,
                "  - {} ({:.0}% relevant)\n    {}",
                location, chunk.relevance_score, chunk.text
            );
        }
    }
    out
}

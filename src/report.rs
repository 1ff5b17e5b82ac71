//! Check report module
//!
//! Aggregates page analyses into a summary, renders it as text or JSON and
//! decides the process exit status.

use serde::Serialize;
use std::fmt::Write as _;
use thiserror::Error;

use crate::cli::ExitCode;
use crate::margin::{MarginSide, MarginViolation, PageAnalysis, Severity, WhitespaceGap};
use crate::pipeline::PageFailure;

/// Report error types
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Document-level totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub pages_analyzed: usize,
    pub pages_with_issues: usize,
    pub margin_violations: usize,
    pub whitespace_gaps: usize,
    pub failed_pages: usize,
}

impl ReportSummary {
    pub fn total_issues(&self) -> usize {
        self.margin_violations + self.whitespace_gaps
    }
}

/// One line of the "pages requiring attention" list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSummary {
    pub page_num: usize,
    /// Affected margins, sorted and unique
    pub margins: Vec<MarginSide>,
    pub gap_count: usize,
    pub worst_severity: Severity,
}

/// Complete check report
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Name of the checked document
    pub source: String,
    pub summary: ReportSummary,
    /// Violations, high severity first, then by page
    pub violations: Vec<MarginViolation>,
    /// Gaps, high severity first, then by page
    pub whitespace_gaps: Vec<WhitespaceGap>,
    pub pages: Vec<PageSummary>,
    pub failures: Vec<PageFailure>,
    pub passed: bool,
}

impl CheckReport {
    pub fn new(source: impl Into<String>, analyses: &[PageAnalysis], failures: &[PageFailure]) -> Self {
        let mut violations: Vec<MarginViolation> = analyses
            .iter()
            .flat_map(|a| a.violations.iter().cloned())
            .collect();
        violations.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.page_num.cmp(&b.page_num)));

        let mut whitespace_gaps: Vec<WhitespaceGap> = analyses
            .iter()
            .flat_map(|a| a.whitespace_gaps.iter().cloned())
            .collect();
        whitespace_gaps
            .sort_by(|a, b| b.severity.cmp(&a.severity).then(a.page_num.cmp(&b.page_num)));

        let pages: Vec<PageSummary> = analyses
            .iter()
            .filter_map(|a| {
                Some(PageSummary {
                    page_num: a.page_num,
                    margins: a.affected_sides(),
                    gap_count: a.whitespace_gaps.len(),
                    worst_severity: a.worst_severity()?,
                })
            })
            .collect();

        let summary = ReportSummary {
            pages_analyzed: analyses.len(),
            pages_with_issues: pages.len(),
            margin_violations: violations.len(),
            whitespace_gaps: whitespace_gaps.len(),
            failed_pages: failures.len(),
        };

        let passed = !violations.iter().any(|v| v.severity == Severity::High)
            && !whitespace_gaps.iter().any(|g| g.severity == Severity::High);

        Self {
            source: source.into(),
            summary,
            violations,
            whitespace_gaps,
            pages,
            failures: failures.to_vec(),
            passed,
        }
    }

    /// True if any finding is high severity
    pub fn has_high_severity(&self) -> bool {
        !self.passed
    }

    /// Exit status: high-severity findings fail the check, unreadable pages
    /// are a processing error
    pub fn exit_code(&self) -> ExitCode {
        if self.has_high_severity() {
            ExitCode::CheckFailed
        } else if !self.failures.is_empty() {
            ExitCode::ProcessingError
        } else {
            ExitCode::Success
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable report
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let s = &self.summary;

        let title = if s.total_issues() == 0 {
            "Margin Analysis Complete"
        } else {
            "Margin Analysis Summary"
        };
        let _ = writeln!(out, "=== {} ===", title);
        let _ = writeln!(out, "File:              {}", self.source);
        let _ = writeln!(out, "Pages analyzed:    {}", s.pages_analyzed);
        let _ = writeln!(out, "Pages with issues: {}", s.pages_with_issues);
        let _ = writeln!(out, "Margin violations: {}", s.margin_violations);
        let _ = writeln!(out, "Whitespace gaps:   {}", s.whitespace_gaps);
        if s.failed_pages > 0 {
            let _ = writeln!(out, "Failed pages:      {}", s.failed_pages);
        }

        if s.total_issues() == 0 && self.failures.is_empty() {
            let _ = writeln!(out, "\nNo margin or whitespace issues found!");
            return out;
        }

        if !self.violations.is_empty() {
            let _ = writeln!(out, "\nMargin Violations");
            let _ = writeln!(
                out,
                "{:>6}  {:<6}  {:<8}  {:>8}  {:>8}  Location (x1,y1)-(x2,y2)",
                "Page", "Margin", "Severity", "Pixels", "Coverage"
            );
            for v in &self.violations {
                let _ = writeln!(
                    out,
                    "{:>6}  {:<6}  {:<8}  {:>8}  {:>7.2}%  {}",
                    v.page_num,
                    v.side.as_str().to_uppercase(),
                    v.severity.as_str().to_uppercase(),
                    format_count(u64::from(v.pixel_count)),
                    v.percentage,
                    v.bbox
                );
            }
        }

        if !self.whitespace_gaps.is_empty() {
            let _ = writeln!(out, "\nWhitespace Gaps");
            let _ = writeln!(
                out,
                "{:>6}  {:<8}  {:>11}  {:>11}  Location (x1,y1)-(x2,y2)",
                "Page", "Severity", "Height (in)", "Height (px)"
            );
            for g in &self.whitespace_gaps {
                let _ = writeln!(
                    out,
                    "{:>6}  {:<8}  {:>11.2}  {:>11}  {}",
                    g.page_num,
                    g.severity.as_str().to_uppercase(),
                    g.height_in,
                    format_count(u64::from(g.height_px)),
                    g.bbox
                );
            }
        }

        if !self.pages.is_empty() {
            let _ = writeln!(out, "\nPages requiring attention:");
            for page in &self.pages {
                let _ = writeln!(out, "  {}", page_line(page));
            }
        }

        if !self.failures.is_empty() {
            let _ = writeln!(out, "\nPages that could not be analyzed:");
            for failure in &self.failures {
                let _ = writeln!(out, "  Page {}: {}", failure.page_num, failure.error);
            }
        }

        out
    }
}

fn page_line(page: &PageSummary) -> String {
    let margins = if page.margins.is_empty() {
        "no margin issues".to_string()
    } else {
        let names: Vec<&str> = page.margins.iter().map(|m| m.as_str()).collect();
        format!("{} margin(s)", names.join(", "))
    };
    let gaps = if page.gap_count > 0 {
        format!("{} gap(s)", page.gap_count)
    } else {
        "no gaps".to_string()
    };
    format!(
        "Page {}: {}, {} - {}",
        page.page_num,
        margins,
        gaps,
        page.worst_severity.as_str().to_uppercase()
    )
}

/// Format an integer with thousands separators, e.g. `12,345`
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::margin::BoundingBox;

    fn violation(page_num: usize, side: MarginSide, severity: Severity) -> MarginViolation {
        MarginViolation {
            page_num,
            side,
            pixel_count: 1234,
            percentage: 2.5,
            bbox: BoundingBox::new(0, 10, 20, 30),
            severity,
        }
    }

    fn gap(page_num: usize, severity: Severity) -> WhitespaceGap {
        WhitespaceGap {
            page_num,
            height_px: 300,
            height_in: 2.0,
            bbox: BoundingBox::new(0, 600, 1275, 900),
            severity,
        }
    }

    fn sample_analyses() -> Vec<PageAnalysis> {
        let mut p1 = PageAnalysis::new(1, 1275, 1650);
        p1.violations.push(violation(1, MarginSide::Right, Severity::Low));

        let p2 = PageAnalysis::new(2, 1275, 1650);

        let mut p3 = PageAnalysis::new(3, 1275, 1650);
        p3.violations.push(violation(3, MarginSide::Left, Severity::Medium));
        p3.violations.push(violation(3, MarginSide::Bottom, Severity::Low));
        p3.violations.push(violation(3, MarginSide::Left, Severity::Low));
        p3.whitespace_gaps.push(gap(3, Severity::Medium));

        let mut p4 = PageAnalysis::new(4, 1275, 1650);
        p4.violations.push(violation(4, MarginSide::Top, Severity::Medium));

        vec![p1, p2, p3, p4]
    }

    #[test]
    fn test_summary_totals() {
        let report = CheckReport::new("book.pdf", &sample_analyses(), &[]);

        assert_eq!(report.summary.pages_analyzed, 4);
        assert_eq!(report.summary.pages_with_issues, 3);
        assert_eq!(report.summary.margin_violations, 5);
        assert_eq!(report.summary.whitespace_gaps, 1);
        assert_eq!(report.summary.total_issues(), 6);
    }

    #[test]
    fn test_violations_sorted_by_severity_then_page() {
        let report = CheckReport::new("book.pdf", &sample_analyses(), &[]);

        let order: Vec<(Severity, usize)> = report
            .violations
            .iter()
            .map(|v| (v.severity, v.page_num))
            .collect();
        assert_eq!(
            order,
            vec![
                (Severity::Medium, 3),
                (Severity::Medium, 4),
                (Severity::Low, 1),
                (Severity::Low, 3),
                (Severity::Low, 3),
            ]
        );
    }

    #[test]
    fn test_pages_requiring_attention() {
        let report = CheckReport::new("book.pdf", &sample_analyses(), &[]);

        assert_eq!(report.pages.len(), 3);
        let p3 = &report.pages[1];
        assert_eq!(p3.page_num, 3);
        assert_eq!(p3.margins, vec![MarginSide::Bottom, MarginSide::Left]);
        assert_eq!(p3.gap_count, 1);
        assert_eq!(p3.worst_severity, Severity::Medium);

        assert_eq!(
            page_line(p3),
            "Page 3: bottom, left margin(s), 1 gap(s) - MEDIUM"
        );
        assert_eq!(
            page_line(&report.pages[0]),
            "Page 1: right margin(s), no gaps - LOW"
        );
    }

    #[test]
    fn test_exit_code_without_high() {
        let report = CheckReport::new("book.pdf", &sample_analyses(), &[]);
        assert!(report.passed);
        assert_eq!(report.exit_code(), ExitCode::Success);
    }

    #[test]
    fn test_exit_code_high_violation() {
        let mut analyses = sample_analyses();
        analyses[1]
            .violations
            .push(violation(2, MarginSide::Left, Severity::High));

        let report = CheckReport::new("book.pdf", &analyses, &[]);
        assert!(report.has_high_severity());
        assert_eq!(report.exit_code(), ExitCode::CheckFailed);
        assert_eq!(report.violations[0].page_num, 2);
    }

    #[test]
    fn test_exit_code_high_gap() {
        let mut analyses = sample_analyses();
        analyses[0].whitespace_gaps.push(gap(1, Severity::High));

        let report = CheckReport::new("book.pdf", &analyses, &[]);
        assert_eq!(report.exit_code(), ExitCode::CheckFailed);
    }

    #[test]
    fn test_exit_code_failures() {
        let failures = vec![PageFailure {
            page_num: 2,
            error: "render failed".to_string(),
        }];
        let report = CheckReport::new("book.pdf", &[], &failures);

        assert_eq!(report.exit_code(), ExitCode::ProcessingError);
        assert!(report.render_text().contains("Page 2: render failed"));
    }

    #[test]
    fn test_clean_report_text() {
        let analyses = vec![PageAnalysis::new(1, 100, 100)];
        let report = CheckReport::new("clean.pdf", &analyses, &[]);

        let text = report.render_text();
        assert!(text.contains("Margin Analysis Complete"));
        assert!(text.contains("No margin or whitespace issues found!"));
        assert!(!text.contains("Pages requiring attention"));
    }

    #[test]
    fn test_report_text_tables() {
        let report = CheckReport::new("book.pdf", &sample_analyses(), &[]);
        let text = report.render_text();

        assert!(text.contains("Margin Violations"));
        assert!(text.contains("LEFT"));
        assert!(text.contains("1,234"));
        assert!(text.contains("2.50%"));
        assert!(text.contains("(0,10)-(20,30)"));
        assert!(text.contains("Whitespace Gaps"));
        assert!(text.contains("(0,600)-(1275,900)"));
        assert!(text.contains("Pages requiring attention:"));
    }

    #[test]
    fn test_to_json() {
        let report = CheckReport::new("book.pdf", &sample_analyses(), &[]);
        let json = report.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "book.pdf");
        assert_eq!(value["summary"]["margin_violations"], 5);
        assert_eq!(value["violations"][0]["severity"], "medium");
        assert_eq!(value["violations"][0]["side"], "left");
        assert_eq!(value["pages"][1]["margins"][0], "bottom");
        assert_eq!(value["passed"], true);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}

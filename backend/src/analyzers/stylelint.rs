// CSS rules modelled on stylelint-config-standard
use regex::Regex;
use std::sync::LazyLock;

use super::{line_col, AnalysisReport, AnalyzeOptions, Analyzer, Issue, PenaltyTable, Severity};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([0-9A-Za-z]+)\b").expect("hex pattern must compile"));

static IMPORTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\s*important\b").expect("important pattern must compile"));

static EMPTY_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*\}").expect("block pattern must compile"));

static ZERO_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s:,(])(0(?:\.0+)?(?:px|em|rem|pt|pc|cm|mm|in|ex|ch|vw|vh|vmin|vmax))\b")
        .expect("zero unit pattern must compile")
});

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\w-]+)\s*:\s*([^;{}]+)").expect("declaration pattern must compile")
});

static CSS_HINTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?m)^\s*[.#@:\[*]?[\w-][^{};]*\{[^}]*\}",
        r"(?m)^\s*@(?:media|import|keyframes|font-face|charset)\b",
        r"(?m)^\s*[\w-]+\s*:\s*[^;{}]+;",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("sniff pattern must compile"))
    .collect()
});

static NOT_CSS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<(?:!DOCTYPE|html|head|body|div|span|script)\b",
        r"(?m)^\s*(?:var|let|const|function|import|export|class)\s",
        r"=>|===|!==",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("sniff pattern must compile"))
    .collect()
});

pub fn is_css(code: &str) -> bool {
    if NOT_CSS.iter().any(|p| p.is_match(code)) {
        return false;
    }
    CSS_HINTS.iter().any(|p| p.is_match(code))
}

/// Blank out `/* ... */` comments, keeping byte offsets stable
fn blank_comments(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut rest = code;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        let end = rest[start + 2..]
            .find("*/")
            .map(|e| start + 2 + e + 2)
            .unwrap_or(rest.len());
        for c in rest[start..end].chars() {
            if c == '\n' {
                out.push('\n');
            } else {
                out.extend(std::iter::repeat(' ').take(c.len_utf8()));
            }
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

fn suggestion(rule_id: &str) -> &'static str {
    match rule_id {
        "color-no-invalid-hex" => "Use a 3, 4, 6 or 8 digit hexadecimal color",
        "declaration-no-important" => "Increase selector specificity instead of using !important",
        "block-no-empty" => "Remove the empty block or add declarations",
        "unit-zero-no-unit" => "Drop the unit from zero lengths",
        _ => "Follow stylelint recommendation",
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StylelintAnalyzer;

impl StylelintAnalyzer {
    fn lint(&self, code: &str) -> Vec<Issue> {
        let source = blank_comments(code);
        let mut issues = Vec::new();
        let issue_at = |rule: &str, kind: &str, severity: Severity, message: String, offset: usize| {
            let (line, column) = line_col(&source, offset);
            Issue::new(kind, severity, message, suggestion(rule))
                .at(line, Some(column))
                .rule(rule)
        };

        for decl in DECLARATION.captures_iter(&source) {
            let Some(value) = decl.get(2) else { continue };

            for hex in HEX_COLOR.captures_iter(value.as_str()) {
                let (Some(whole), Some(digits)) = (hex.get(0), hex.get(1)) else {
                    continue;
                };
                let valid_len = matches!(digits.as_str().len(), 3 | 4 | 6 | 8);
                let all_hex = digits.as_str().chars().all(|c| c.is_ascii_hexdigit());
                if !(valid_len && all_hex) {
                    issues.push(issue_at(
                        "color-no-invalid-hex",
                        "logic",
                        Severity::High,
                        format!("Unexpected invalid hex color \"{}\"", whole.as_str()),
                        value.start() + whole.start(),
                    ));
                }
            }

            if let Some(m) = IMPORTANT.find(value.as_str()) {
                issues.push(issue_at(
                    "declaration-no-important",
                    "maintainability",
                    Severity::Medium,
                    "Unexpected !important".to_string(),
                    value.start() + m.start(),
                ));
            }

            for zero in ZERO_WITH_UNIT.captures_iter(value.as_str()) {
                let Some(m) = zero.get(1) else { continue };
                issues.push(issue_at(
                    "unit-zero-no-unit",
                    "style",
                    Severity::Low,
                    format!("Unexpected unit on zero length \"{}\"", m.as_str()),
                    value.start() + m.start(),
                ));
            }
        }

        for m in EMPTY_BLOCK.find_iter(&source) {
            issues.push(issue_at(
                "block-no-empty",
                "quality",
                Severity::Medium,
                "Unexpected empty block".to_string(),
                m.start(),
            ));
        }

        issues.sort_by_key(|i| (i.line, i.column));
        issues
    }

    fn summary(issues: &[Issue]) -> String {
        if issues.is_empty() {
            return "Great! No stylelint issues found.".to_string();
        }
        let plural = |n: usize| if n > 1 { "s" } else { "" };
        let high = issues.iter().filter(|i| i.severity == Severity::High).count();
        if high > 0 {
            format!("Found {} invalid value{} that browsers will ignore.", high, plural(high))
        } else {
            format!("Found {} stylesheet issue{} to tidy up.", issues.len(), plural(issues.len()))
        }
    }

    fn recommendations(report: &AnalysisReport) -> Vec<String> {
        let count = |kind: &str| report.stats.by_type.get(kind).copied().unwrap_or(0);
        let mut recommendations = Vec::new();

        if count("logic") > 0 {
            recommendations.push("Fix invalid values so every declaration takes effect".to_string());
        }
        if count("maintainability") > 0 {
            recommendations.push("Reduce !important usage to keep the cascade predictable".to_string());
        }
        if count("style") > 5 {
            recommendations.push("Run stylelint --fix to clean up formatting issues".to_string());
        }
        if report.issues.is_empty() {
            recommendations.push("Stylesheet looks clean. Keep it consistent".to_string());
        }
        recommendations
    }
}

impl Analyzer for StylelintAnalyzer {
    fn name(&self) -> &str {
        "stylelint"
    }

    fn analyze(&self, code: &str, options: &AnalyzeOptions) -> AnalysisReport {
        let css = options
            .language_is(&["css", "scss", "less"])
            .unwrap_or_else(|| is_css(code));
        if !css {
            return AnalysisReport::not_applicable(self.name(), "CSS");
        }

        let issues = options.filter(self.lint(code));
        let summary = Self::summary(&issues);
        let report = AnalysisReport::new(self.name(), issues, PenaltyTable::STANDARD).with_summary(summary);
        let recommendations = Self::recommendations(&report);
        report.with_recommendations(recommendations)
    }
}

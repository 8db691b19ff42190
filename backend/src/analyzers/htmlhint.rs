// HTML validation rules in the spirit of HTMLHint
use regex::Regex;
use scraper::Html;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use super::dom::{attr, has_nonempty_attr, line_of, select, snippet, text};
use super::{line_col, AnalysisReport, AnalyzeOptions, Analyzer, Issue, PenaltyTable, Severity};

static HTML_HINTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<!DOCTYPE\s+html",
        r"(?i)<html[\s>]",
        r"(?i)<(?:head|body|div|span|p|a|img|script|style|meta|link)[\s>]",
        r"(?i)</\s*(?:html|head|body|div|span|p|a|script|style)\s*>",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("sniff pattern must compile"))
    .collect()
});

static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)([^<>]*)>").expect("tag pattern must compile")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:@][\w:.\-@]*)(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?"#)
        .expect("attribute pattern must compile")
});

struct StructureCheck {
    name: &'static str,
    patterns: &'static [&'static str],
}

const STRUCTURE_CHECKS: &[StructureCheck] = &[
    StructureCheck { name: "hasDoctype", patterns: &[r"(?i)<!DOCTYPE\s+html"] },
    StructureCheck { name: "hasHtml", patterns: &[r"(?i)<html[\s>]", r"(?i)</html>"] },
    StructureCheck { name: "hasHead", patterns: &[r"(?i)<head[\s>]", r"(?i)</head>"] },
    StructureCheck { name: "hasBody", patterns: &[r"(?i)<body[\s>]", r"(?i)</body>"] },
    StructureCheck { name: "hasTitle", patterns: &[r"(?i)<title[\s>].*</title>"] },
    StructureCheck { name: "hasCharset", patterns: &[r"(?i)<meta\s+charset="] },
    StructureCheck { name: "hasViewport", patterns: &[r#"(?i)<meta\s+name=["']viewport["']"#] },
    StructureCheck { name: "hasLang", patterns: &[r"(?i)<html[^>]+lang="] },
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureValidation {
    pub is_valid: bool,
    pub checks: std::collections::BTreeMap<&'static str, bool>,
}

impl StructureValidation {
    pub fn of(code: &str) -> Self {
        let checks: std::collections::BTreeMap<&'static str, bool> = STRUCTURE_CHECKS
            .iter()
            .map(|check| {
                let passed = check.patterns.iter().all(|p| {
                    Regex::new(p).map(|re| re.is_match(code)).unwrap_or(false)
                });
                (check.name, passed)
            })
            .collect();
        Self {
            is_valid: checks.values().all(|v| *v),
            checks,
        }
    }

    fn check(&self, name: &str) -> bool {
        self.checks.get(name).copied().unwrap_or(false)
    }
}

pub fn is_html(code: &str) -> bool {
    HTML_HINTS.iter().any(|p| p.is_match(code))
}

fn suggestion(rule_id: &str) -> &'static str {
    match rule_id {
        "tagname-lowercase" => "Use lowercase for all HTML tag names",
        "attr-no-duplication" => "Remove duplicate attributes",
        "alt-require" => "Add descriptive alt text for accessibility",
        "id-unique" => "Ensure all ID values are unique on the page",
        "doctype-first" => "Add <!DOCTYPE html> at the beginning",
        "html-lang-require" => "Add lang attribute to <html> tag",
        "title-require" => "Add <title> tag in <head> section",
        "src-not-empty" => "Add valid source URL or remove empty attribute",
        _ => "Follow HTML best practices",
    }
}

fn hint(rule_id: &str, kind: &str, severity: Severity, message: String) -> Issue {
    Issue::new(kind, severity, message, suggestion(rule_id)).rule(rule_id)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlHintAnalyzer;

impl HtmlHintAnalyzer {
    fn verify(&self, code: &str) -> Vec<Issue> {
        let doc = Html::parse_document(code);
        let mut issues = Vec::new();

        if !code.trim_start().to_lowercase().starts_with("<!doctype") {
            issues.push(
                hint("doctype-first", "structure", Severity::High, "Doctype must be declared first.".to_string())
                    .at(1, Some(1)),
            );
        }

        let has_title = select(&doc, "title").iter().any(|t| !text(t).is_empty());
        if !has_title {
            let line = super::dom::tag_lines(code, "head").first().copied().unwrap_or(1);
            issues.push(
                hint(
                    "title-require",
                    "seo",
                    Severity::High,
                    "<title></title> must be present in <head> tag.".to_string(),
                )
                .at(line, None),
            );
        }

        let html_in_source = super::dom::tag_lines(code, "html").first().copied();
        if let (Some(line), Some(html)) = (html_in_source, select(&doc, "html").first()) {
            if !has_nonempty_attr(html, "lang") {
                issues.push(
                    hint(
                        "html-lang-require",
                        "accessibility",
                        Severity::Medium,
                        "An lang attribute must be present on <html> elements.".to_string(),
                    )
                    .at(line, None),
                );
            }
        }

        for img in select(&doc, "img") {
            if attr(&img, "alt").is_none() {
                let mut issue = hint(
                    "alt-require",
                    "accessibility",
                    Severity::Medium,
                    "An alt attribute must be present on <img> elements.".to_string(),
                )
                .evidence(snippet(&img));
                if let Some(line) = line_of(&doc, code, &img) {
                    issue = issue.at(line, None);
                }
                issues.push(issue);
            }
        }

        let mut seen_ids: HashMap<String, usize> = HashMap::new();
        for el in select(&doc, "[id]") {
            let Some(id) = attr(&el, "id") else { continue };
            let count = seen_ids.entry(id.to_string()).or_insert(0);
            *count += 1;
            if *count > 1 {
                let mut issue = hint(
                    "id-unique",
                    "logic",
                    Severity::Medium,
                    format!("The id value [ {} ] must be unique.", id),
                )
                .evidence(snippet(&el));
                if let Some(line) = line_of(&doc, code, &el) {
                    issue = issue.at(line, None);
                }
                issues.push(issue);
            }
        }

        for (selector, attribute) in [
            ("img[src]", "src"),
            ("script[src]", "src"),
            ("iframe[src]", "src"),
            ("link[href]", "href"),
        ] {
            for el in select(&doc, selector) {
                if attr(&el, attribute).is_some_and(|v| v.trim().is_empty()) {
                    let mut issue = hint(
                        "src-not-empty",
                        "quality",
                        Severity::High,
                        format!(
                            "The attribute [ {} ] of the tag [ {} ] must have a value.",
                            attribute,
                            el.value().name()
                        ),
                    )
                    .evidence(snippet(&el));
                    if let Some(line) = line_of(&doc, code, &el) {
                        issue = issue.at(line, None);
                    }
                    issues.push(issue);
                }
            }
        }

        issues.extend(self.scan_tags(code));
        issues.sort_by_key(|i| i.line.unwrap_or(usize::MAX));
        issues
    }

    /// Rules the parser cannot see: tag-name case and duplicated attributes
    fn scan_tags(&self, code: &str) -> Vec<Issue> {
        let mut issues = Vec::new();

        for caps in OPEN_TAG.captures_iter(code) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            let (line, column) = line_col(code, whole.start());

            if name.as_str().chars().any(|c| c.is_ascii_uppercase()) {
                issues.push(
                    hint(
                        "tagname-lowercase",
                        "structure",
                        Severity::High,
                        format!("The html element name of [ {} ] must be in lowercase.", name.as_str()),
                    )
                    .at(line, Some(column))
                    .evidence(whole.as_str()),
                );
            }

            let is_closing = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let Some(attrs) = caps.get(3).filter(|_| !is_closing) else {
                continue;
            };
            let mut names = HashSet::new();
            for attr_caps in ATTRIBUTE.captures_iter(attrs.as_str()) {
                let Some(attr_name) = attr_caps.get(1) else { continue };
                let attr_name = attr_name.as_str().to_lowercase();
                if !names.insert(attr_name.clone()) {
                    issues.push(
                        hint(
                            "attr-no-duplication",
                            "logic",
                            Severity::High,
                            format!("Duplicate of attribute name [ {} ] was found.", attr_name),
                        )
                        .at(line, Some(column))
                        .evidence(whole.as_str()),
                    );
                }
            }
        }

        issues
    }

    fn summary(issues: &[Issue]) -> String {
        if issues.is_empty() {
            return "Perfect! Your HTML follows all best practices.".to_string();
        }
        let plural = |n: usize| if n > 1 { "s" } else { "" };
        let accessibility = issues.iter().filter(|i| i.kind == "accessibility").count();
        let structure = issues.iter().filter(|i| i.kind == "structure").count();

        if accessibility > 0 {
            format!(
                "Found {} accessibility issue{} that affect users with disabilities.",
                accessibility,
                plural(accessibility)
            )
        } else if structure > 0 {
            format!(
                "Found {} structural issue{} that may cause rendering problems.",
                structure,
                plural(structure)
            )
        } else {
            format!("Found {} issue{} to improve HTML quality.", issues.len(), plural(issues.len()))
        }
    }

    fn recommendations(report: &AnalysisReport, validation: &StructureValidation) -> Vec<String> {
        let count = |kind: &str| report.stats.by_type.get(kind).copied().unwrap_or(0);
        let mut recommendations = Vec::new();

        if !validation.check("hasDoctype") {
            recommendations.push("Critical: Add <!DOCTYPE html> declaration".to_string());
        }
        if !validation.check("hasViewport") {
            recommendations.push("Add viewport meta tag for mobile responsiveness".to_string());
        }
        if count("accessibility") > 0 {
            recommendations.push("Improve accessibility for users with disabilities".to_string());
        }
        if count("seo") > 0 {
            recommendations.push("Fix SEO issues to improve search engine visibility".to_string());
        }
        if report.issues.is_empty() && validation.is_valid {
            recommendations.push("Excellent HTML structure! Consider adding schema.org markup".to_string());
        }
        recommendations
    }
}

impl Analyzer for HtmlHintAnalyzer {
    fn name(&self) -> &str {
        "htmlhint"
    }

    fn analyze(&self, code: &str, options: &AnalyzeOptions) -> AnalysisReport {
        let html = options.language_is(&["html", "htm"]).unwrap_or_else(|| is_html(code));
        if !html {
            return AnalysisReport::not_applicable(self.name(), "HTML");
        }

        let issues = options.filter(self.verify(code));
        let validation = StructureValidation::of(code);
        let summary = Self::summary(&issues);
        let report = AnalysisReport::new(self.name(), issues, PenaltyTable::HTML).with_summary(summary);
        let recommendations = Self::recommendations(&report, &validation);
        let validation_json = serde_json::to_value(&validation).unwrap_or_default();

        report
            .with_recommendations(recommendations)
            .with_extra("validation", validation_json)
    }
}

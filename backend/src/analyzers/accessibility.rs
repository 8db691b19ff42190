// WCAG checks over the parsed document, following axe-core rule ids and impacts
use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use super::dom::{attr, has_nonempty_attr, line_of, select, snippet, text};
use super::{AnalysisReport, AnalyzeOptions, Analyzer, Issue, PenaltyTable, Severity};

static HTML_HINTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)<!DOCTYPE\s+html",
        r"(?i)<html[\s>]",
        r"(?i)<(?:head|body|div|span|p|a|img)[\s>]",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("sniff pattern must compile"))
    .collect()
});

static BLOCKED_ZOOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)user-scalable\s*=\s*(?:no|0)\b|maximum-scale\s*=\s*(?:1(?:\.0*)?|0?\.\d+)(?:[^\d.]|$)")
        .expect("viewport pattern must compile")
});

/// Rule metadata: category and severity mapped from the axe impact
struct RuleInfo {
    id: &'static str,
    category: &'static str,
    severity: Severity,
    description: &'static str,
    fix: &'static str,
}

const RULES: &[RuleInfo] = &[
    RuleInfo {
        id: "image-alt",
        category: "images",
        severity: Severity::Critical,
        description: "Images must have alternate text",
        fix: "Add descriptive alt text that conveys the meaning of the image",
    },
    RuleInfo {
        id: "input-image-alt",
        category: "images",
        severity: Severity::Critical,
        description: "Image buttons must have alternate text",
        fix: "Add an alt attribute describing the button's action",
    },
    RuleInfo {
        id: "button-name",
        category: "forms",
        severity: Severity::Critical,
        description: "Buttons must have discernible text",
        fix: "Add text content or aria-label to identify the button",
    },
    RuleInfo {
        id: "label",
        category: "forms",
        severity: Severity::Critical,
        description: "Form elements must have labels",
        fix: "Associate a label with this form control using for/id or aria-label",
    },
    RuleInfo {
        id: "meta-viewport",
        category: "mobile",
        severity: Severity::Critical,
        description: "Zooming and scaling must not be disabled",
        fix: "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
    },
    RuleInfo {
        id: "html-has-lang",
        category: "structure",
        severity: Severity::High,
        description: "<html> element must have a lang attribute",
        fix: "Add lang attribute to the <html> element (e.g., lang=\"en\")",
    },
    RuleInfo {
        id: "document-title",
        category: "structure",
        severity: Severity::High,
        description: "Documents must have <title> element to aid in navigation",
        fix: "Add a descriptive <title> element in the <head>",
    },
    RuleInfo {
        id: "link-name",
        category: "navigation",
        severity: Severity::High,
        description: "Links must have discernible text",
        fix: "Add meaningful link text that describes the destination",
    },
    RuleInfo {
        id: "frame-title",
        category: "navigation",
        severity: Severity::High,
        description: "Frames must have an accessible name",
        fix: "Add a title attribute describing the frame's content",
    },
    RuleInfo {
        id: "tabindex",
        category: "keyboard",
        severity: Severity::High,
        description: "Elements should not have tabindex greater than zero",
        fix: "Use tabindex=\"0\" or restructure the DOM order",
    },
    RuleInfo {
        id: "duplicate-id",
        category: "structure",
        severity: Severity::Low,
        description: "id attribute value must be unique",
        fix: "Change duplicate ID to ensure each ID is unique",
    },
    RuleInfo {
        id: "empty-heading",
        category: "structure",
        severity: Severity::Low,
        description: "Headings should not be empty",
        fix: "Add content to the heading or remove it if not needed",
    },
];

fn rule_info(id: &str) -> Option<&'static RuleInfo> {
    RULES.iter().find(|r| r.id == id)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WcagCompliance {
    pub level_a: bool,
    pub level_aa: bool,
    pub level_aaa: bool,
    pub score: u32,
}

impl WcagCompliance {
    pub fn assess(issues: &[Issue]) -> Self {
        let critical = issues.iter().filter(|i| i.severity == Severity::Critical).count();
        let high = issues.iter().filter(|i| i.severity == Severity::High).count();
        Self {
            level_a: critical == 0,
            level_aa: critical == 0 && high == 0,
            level_aaa: issues.is_empty(),
            score: PenaltyTable::ACCESSIBILITY.score(issues),
        }
    }
}

pub fn is_html(code: &str) -> bool {
    HTML_HINTS.iter().any(|p| p.is_match(code))
}

/// Name from aria-label, aria-labelledby or title
fn has_aria_name(el: &ElementRef) -> bool {
    has_nonempty_attr(el, "aria-label")
        || has_nonempty_attr(el, "aria-labelledby")
        || has_nonempty_attr(el, "title")
}

fn inside_label(el: &ElementRef) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| a.value().name() == "label")
}

fn has_img_with_alt(el: &ElementRef) -> bool {
    el.descendants()
        .filter_map(ElementRef::wrap)
        .any(|d| d.value().name() == "img" && has_nonempty_attr(&d, "alt"))
}

struct Audit<'a> {
    doc: &'a Html,
    source: &'a str,
    issues: Vec<Issue>,
}

impl<'a> Audit<'a> {
    fn flag(&mut self, rule_id: &str, el: Option<&ElementRef>) {
        let Some(info) = rule_info(rule_id) else { return };
        let mut issue = Issue::new(info.category, info.severity, info.description, info.fix).rule(info.id);
        if let Some(el) = el {
            issue = issue.evidence(snippet(el));
            if let Some(line) = line_of(self.doc, self.source, el) {
                issue = issue.at(line, None);
            }
        }
        self.issues.push(issue);
    }

    fn run(mut self) -> Vec<Issue> {
        let doc = self.doc;

        if let Some(html) = select(doc, "html").first() {
            if !has_nonempty_attr(html, "lang") {
                self.flag("html-has-lang", Some(html));
            }
        }

        if !select(doc, "title").iter().any(|t| !text(t).is_empty()) {
            self.flag("document-title", None);
        }

        for meta in select(doc, "meta[name=viewport]") {
            if attr(&meta, "content").is_some_and(|c| BLOCKED_ZOOM.is_match(c)) {
                self.flag("meta-viewport", Some(&meta));
            }
        }

        for img in select(doc, "img") {
            let decorative = matches!(attr(&img, "role"), Some("presentation") | Some("none"));
            if attr(&img, "alt").is_none() && !decorative && !has_aria_name(&img) {
                self.flag("image-alt", Some(&img));
            }
        }

        for input in select(doc, "input[type=image]") {
            if !has_nonempty_attr(&input, "alt") && !has_aria_name(&input) {
                self.flag("input-image-alt", Some(&input));
            }
        }

        for button in select(doc, "button") {
            if text(&button).is_empty() && !has_aria_name(&button) && !has_img_with_alt(&button) {
                self.flag("button-name", Some(&button));
            }
        }

        for link in select(doc, "a[href]") {
            if text(&link).is_empty() && !has_aria_name(&link) && !has_img_with_alt(&link) {
                self.flag("link-name", Some(&link));
            }
        }

        let labelled: HashSet<String> = select(doc, "label[for]")
            .iter()
            .filter_map(|l| attr(l, "for"))
            .map(str::to_string)
            .collect();
        for control in select(doc, "input, select, textarea") {
            let kind = attr(&control, "type").unwrap_or("text").to_lowercase();
            if matches!(kind.as_str(), "hidden" | "submit" | "button" | "reset" | "image") {
                continue;
            }
            let by_for = attr(&control, "id").is_some_and(|id| labelled.contains(id));
            if !by_for && !inside_label(&control) && !has_aria_name(&control) {
                self.flag("label", Some(&control));
            }
        }

        for frame in select(doc, "iframe, frame") {
            if !has_aria_name(&frame) {
                self.flag("frame-title", Some(&frame));
            }
        }

        for el in select(doc, "[tabindex]") {
            if attr(&el, "tabindex")
                .and_then(|v| v.trim().parse::<i32>().ok())
                .is_some_and(|v| v > 0)
            {
                self.flag("tabindex", Some(&el));
            }
        }

        let mut seen: HashMap<String, usize> = HashMap::new();
        for el in select(doc, "[id]") {
            let Some(id) = attr(&el, "id") else { continue };
            let count = seen.entry(id.to_string()).or_insert(0);
            *count += 1;
            if *count == 2 {
                self.flag("duplicate-id", Some(&el));
            }
        }

        for heading in select(doc, "h1, h2, h3, h4, h5, h6") {
            if text(&heading).is_empty() && !has_aria_name(&heading) {
                self.flag("empty-heading", Some(&heading));
            }
        }

        self.issues
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessibilityAnalyzer;

impl AccessibilityAnalyzer {
    fn summary(issues: &[Issue]) -> String {
        if issues.is_empty() {
            return "Excellent! Your content is fully accessible.".to_string();
        }
        let plural = |n: usize| if n > 1 { "s" } else { "" };
        let critical = issues.iter().filter(|i| i.severity == Severity::Critical).count();
        let high = issues.iter().filter(|i| i.severity == Severity::High).count();

        if critical > 0 {
            format!(
                "Found {} critical accessibility barrier{} that prevent access for users with disabilities.",
                critical,
                plural(critical)
            )
        } else if high > 0 {
            format!(
                "Found {} serious accessibility issue{} that significantly impact users.",
                high,
                plural(high)
            )
        } else {
            format!(
                "Found {} accessibility improvement{} to enhance user experience.",
                issues.len(),
                plural(issues.len())
            )
        }
    }

    fn recommendations(report: &AnalysisReport, wcag: &WcagCompliance) -> Vec<String> {
        let count = |kind: &str| report.stats.by_type.get(kind).copied().unwrap_or(0);
        let mut recommendations = Vec::new();

        if !wcag.level_a {
            recommendations.push("Critical: Fix Level A issues immediately for basic accessibility".to_string());
        }
        if !wcag.level_aa && wcag.level_a {
            recommendations.push("Important: Address Level AA issues for legal compliance".to_string());
        }
        if count("images") > 0 {
            recommendations.push("Add alternative text to all informative images".to_string());
        }
        if count("forms") > 0 {
            recommendations.push("Ensure all form controls have accessible labels".to_string());
        }
        if count("keyboard") > 0 {
            recommendations.push("Ensure all interactive elements are keyboard accessible".to_string());
        }
        if report.issues.is_empty() {
            recommendations.push("Great job! Consider usability testing with real users".to_string());
            recommendations.push("Add ARIA landmarks for better screen reader navigation".to_string());
        }
        recommendations
    }
}

impl Analyzer for AccessibilityAnalyzer {
    fn name(&self) -> &str {
        "accessibility"
    }

    fn analyze(&self, code: &str, options: &AnalyzeOptions) -> AnalysisReport {
        let html = options.language_is(&["html", "htm"]).unwrap_or_else(|| is_html(code));
        if !html {
            return AnalysisReport::not_applicable(self.name(), "HTML");
        }

        let doc = Html::parse_document(code);
        let audit = Audit {
            doc: &doc,
            source: code,
            issues: Vec::new(),
        };
        let issues = options.filter(audit.run());
        let wcag = WcagCompliance::assess(&issues);
        let summary = Self::summary(&issues);
        let report =
            AnalysisReport::new(self.name(), issues, PenaltyTable::ACCESSIBILITY).with_summary(summary);
        let recommendations = Self::recommendations(&report, &wcag);
        let wcag_json = serde_json::to_value(&wcag).unwrap_or_default();

        report
            .with_recommendations(recommendations)
            .with_extra("wcagCompliance", wcag_json)
    }
}

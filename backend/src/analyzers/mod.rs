// Analyzer adapters: normalized issues, penalty scoring and the registry
pub mod accessibility;
pub mod ai;
mod dom;
pub mod eslint;
pub mod htmlhint;
pub mod stylelint;

pub use accessibility::AccessibilityAnalyzer;
pub use ai::{AiAnalyzer, AiService};
pub use eslint::EslintAnalyzer;
pub use htmlhint::HtmlHintAnalyzer;
pub use stylelint::StylelintAnalyzer;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::AiSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

/// One finding, in the shape every analyzer reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub description: String,
    pub fix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

impl Issue {
    pub fn new(
        kind: impl Into<String>,
        severity: Severity,
        description: impl Into<String>,
        fix: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            severity,
            line: None,
            column: None,
            rule: None,
            description: description.into(),
            fix: fix.into(),
            evidence: None,
        }
    }

    pub fn at(mut self, line: usize, column: Option<usize>) -> Self {
        self.line = Some(line);
        self.column = column;
        self
    }

    pub fn rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    pub fn evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence = Some(evidence.into());
        self
    }
}

/// Points deducted per issue of each severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PenaltyTable {
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl PenaltyTable {
    /// Linters and AI reviewers
    pub const STANDARD: PenaltyTable = PenaltyTable {
        critical: 10,
        high: 10,
        medium: 5,
        low: 2,
    };
    pub const HTML: PenaltyTable = PenaltyTable {
        critical: 15,
        high: 15,
        medium: 7,
        low: 3,
    };
    pub const ACCESSIBILITY: PenaltyTable = PenaltyTable {
        critical: 25,
        high: 15,
        medium: 5,
        low: 2,
    };

    pub fn weight(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }

    /// `max(0, 100 - sum of weights)`
    pub fn score(&self, issues: &[Issue]) -> u32 {
        let penalty: u32 = issues.iter().map(|i| self.weight(i.severity)).sum();
        100u32.saturating_sub(penalty)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueStats {
    pub total_issues: usize,
    pub critical_issues: usize,
    pub high_severity: usize,
    pub medium_severity: usize,
    pub low_severity: usize,
    pub by_type: BTreeMap<String, usize>,
}

impl IssueStats {
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut stats = IssueStats {
            total_issues: issues.len(),
            ..Default::default()
        };
        for issue in issues {
            match issue.severity {
                Severity::Critical => stats.critical_issues += 1,
                Severity::High => stats.high_severity += 1,
                Severity::Medium => stats.medium_severity += 1,
                Severity::Low => stats.low_severity += 1,
            }
            *stats.by_type.entry(issue.kind.clone()).or_default() += 1;
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analyzer: String,
    pub score: u32,
    pub summary: String,
    pub issues: Vec<Issue>,
    pub stats: IssueStats,
    pub recommendations: Vec<String>,
    /// Analyzer-specific sections such as `validation` or `wcagCompliance`
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extras: serde_json::Map<String, serde_json::Value>,
}

impl AnalysisReport {
    pub fn new(analyzer: &str, issues: Vec<Issue>, table: PenaltyTable) -> Self {
        Self {
            analyzer: analyzer.to_string(),
            score: table.score(&issues),
            summary: String::new(),
            stats: IssueStats::from_issues(&issues),
            issues,
            recommendations: Vec::new(),
            extras: serde_json::Map::new(),
        }
    }

    /// Report for input that is not in the analyzer's language
    pub fn not_applicable(analyzer: &str, language: &str) -> Self {
        let mut report = Self::new(analyzer, Vec::new(), PenaltyTable::STANDARD);
        report.summary = format!("Not {} code", language);
        report.recommendations = vec![format!(
            "Submit {} code to get results from the {} analyzer",
            language, analyzer
        )];
        report
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.recommendations = recommendations;
        self
    }

    pub fn with_extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extras.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeOptions {
    /// Issue categories to keep. Empty keeps everything.
    #[serde(default)]
    pub analysis_types: Vec<String>,
    #[serde(default)]
    pub depth: Option<String>,
    /// Language hint; overrides content sniffing
    #[serde(default)]
    pub language: Option<String>,
}

impl AnalyzeOptions {
    pub fn wants(&self, kind: &str) -> bool {
        self.analysis_types.is_empty()
            || self.analysis_types.iter().any(|t| {
                t.eq_ignore_ascii_case(kind) || t.eq_ignore_ascii_case("all")
            })
    }

    /// Some(true/false) when an explicit language hint decides the question
    pub fn language_is(&self, names: &[&str]) -> Option<bool> {
        self.language
            .as_deref()
            .map(|lang| names.iter().any(|n| lang.eq_ignore_ascii_case(n)))
    }

    pub fn filter(&self, issues: Vec<Issue>) -> Vec<Issue> {
        issues.into_iter().filter(|i| self.wants(&i.kind)).collect()
    }
}

pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;
    fn analyze(&self, code: &str, options: &AnalyzeOptions) -> AnalysisReport;
}

/// 1-based line and column of a byte offset in `source`
pub(crate) fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let prefix = &source[..offset.min(source.len())];
    let line = prefix.matches('\n').count() + 1;
    let column = prefix
        .rfind('\n')
        .map(|nl| prefix[nl + 1..].chars().count())
        .unwrap_or_else(|| prefix.chars().count())
        + 1;
    (line, column)
}

/// Named analyzers available to `/analyze/:analyzer`
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: BTreeMap<String, Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// The rule-based analyzers that need no configuration
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(Arc::new(EslintAnalyzer));
        registry.register(Arc::new(HtmlHintAnalyzer));
        registry.register(Arc::new(StylelintAnalyzer));
        registry.register(Arc::new(AccessibilityAnalyzer));
        registry
    }

    /// Built-ins plus the AI reviewers that have a key and are enabled
    pub fn with_ai_services(keys: &BTreeMap<String, String>, settings: &AiSettings) -> Self {
        let mut registry = Self::builtin();
        for service in [AiService::Claude, AiService::ChatGpt] {
            let enabled = match service {
                AiService::Claude => settings.enable_claude,
                AiService::ChatGpt => settings.enable_chatgpt,
            };
            if enabled && keys.contains_key(service.key_name()) {
                registry.register(Arc::new(AiAnalyzer::new(service, settings)));
            }
        }
        registry
    }

    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) {
        self.analyzers
            .insert(analyzer.name().to_string(), analyzer);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Analyzer>> {
        self.analyzers.get(&name.to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.analyzers.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> Vec<String> {
        self.analyzers.keys().cloned().collect()
    }
}

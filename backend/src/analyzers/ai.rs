// AI review adapters. Provider calls are stubbed with a fixed review.
use serde_json::json;

use super::{AnalysisReport, AnalyzeOptions, Analyzer, Issue, PenaltyTable, Severity};
use crate::config::AiSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiService {
    Claude,
    ChatGpt,
}

impl AiService {
    /// Analyzer name and normalized key name
    pub fn key_name(&self) -> &'static str {
        match self {
            AiService::Claude => "claude",
            AiService::ChatGpt => "chatgpt",
        }
    }

    pub fn model(&self) -> &'static str {
        match self {
            AiService::Claude => "claude-3-sonnet",
            AiService::ChatGpt => "gpt-4",
        }
    }

    fn review(&self) -> (&'static str, Vec<Issue>, Vec<&'static str>) {
        match self {
            AiService::Claude => (
                "Code analysis complete. Several areas for improvement identified.",
                vec![
                    Issue::new(
                        "accessibility",
                        Severity::High,
                        "Missing alt attributes on images",
                        "Add descriptive alt text to all img elements",
                    ),
                    Issue::new(
                        "security",
                        Severity::Medium,
                        "Potential XSS vulnerability in user input handling",
                        "Sanitize user input before rendering",
                    ),
                ],
                vec![
                    "Implement proper error handling",
                    "Add input validation",
                    "Improve code documentation",
                ],
            ),
            AiService::ChatGpt => (
                "Analysis complete. Code follows most best practices with some improvements needed.",
                vec![
                    Issue::new(
                        "performance",
                        Severity::Medium,
                        "Inefficient loop structure detected",
                        "Consider using array methods like map() or filter()",
                    ),
                    Issue::new(
                        "accessibility",
                        Severity::Low,
                        "Color contrast could be improved",
                        "Increase contrast ratio to meet WCAG standards",
                    ),
                ],
                vec![
                    "Consider using modern ES6+ features",
                    "Add unit tests for critical functions",
                    "Optimize bundle size",
                ],
            ),
        }
    }
}

pub struct AiAnalyzer {
    service: AiService,
    max_tokens: u32,
    temperature: f32,
}

impl AiAnalyzer {
    pub fn new(service: AiService, settings: &AiSettings) -> Self {
        Self {
            service,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }
}

impl Analyzer for AiAnalyzer {
    fn name(&self) -> &str {
        self.service.key_name()
    }

    fn analyze(&self, _code: &str, options: &AnalyzeOptions) -> AnalysisReport {
        let (summary, issues, recommendations) = self.service.review();
        let issues = options.filter(issues);

        AnalysisReport::new(self.name(), issues, PenaltyTable::STANDARD)
            .with_summary(summary)
            .with_recommendations(recommendations.into_iter().map(str::to_string).collect())
            .with_extra(
                "model",
                json!({
                    "name": self.service.model(),
                    "maxTokens": self.max_tokens,
                    "temperature": self.temperature,
                    "depth": options.depth.as_deref().unwrap_or("thorough"),
                }),
            )
    }
}

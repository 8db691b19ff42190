// JavaScript lint rules modelled on eslint:recommended
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::{AnalysisReport, AnalyzeOptions, Analyzer, Issue, PenaltyTable, Severity};

struct Rule {
    id: &'static str,
    kind: &'static str,
    severity: Severity,
    pattern: Regex,
    message: &'static str,
}

fn rule(
    id: &'static str,
    kind: &'static str,
    severity: Severity,
    pattern: &str,
    message: &'static str,
) -> Rule {
    Rule {
        id,
        kind,
        severity,
        pattern: Regex::new(pattern).expect("lint rule pattern must compile"),
        message,
    }
}

static LINE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule("no-eval", "security", Severity::High, r"\beval\s*\(", "eval can be harmful."),
        rule(
            "no-implied-eval",
            "security",
            Severity::High,
            r#"\b(?:setTimeout|setInterval)\s*\(\s*["'`]"#,
            "Implied eval. Consider passing a function instead of a string.",
        ),
        rule("no-script-url", "security", Severity::High, r#"["'`]\s*javascript:"#, "Script URL is a form of eval."),
        rule("no-proto", "security", Severity::High, r"__proto__", "The '__proto__' property is deprecated."),
        rule("no-debugger", "quality", Severity::High, r"^\s*debugger\b", "Unexpected 'debugger' statement."),
        rule(
            "eqeqeq",
            "logic",
            Severity::High,
            r"(?:^|[^=!<>])(?:==|!=)(?:[^=]|$)",
            "Expected '===' and instead saw '=='.",
        ),
        rule("no-var", "modernization", Severity::Medium, r"\bvar\s+[A-Za-z_$]", "Unexpected var, use let or const instead."),
        rule(
            "no-console",
            "quality",
            Severity::Medium,
            r"\bconsole\.(?:log|warn|error|info|debug|trace)\s*\(",
            "Unexpected console statement.",
        ),
        rule("no-alert", "quality", Severity::Medium, r"\b(?:alert|confirm|prompt)\s*\(", "Unexpected alert."),
    ]
});

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(var|let|const)\s+([A-Za-z_$][\w$]*)\s*(=)?").expect("declaration pattern must compile")
});

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\w$]+").expect("word pattern must compile"));

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w$.])([A-Za-z_$][\w$]*)\s*(?:=[^=>]|\+\+|--|[-+*/%]=)|(?:\+\+|--)([A-Za-z_$][\w$]*)")
        .expect("assignment pattern must compile")
});

static STATEMENT_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:let|const|var|return|throw|break|continue)\b|^[\w$.\[\]]+\s*(?:=[^=>]|\+\+|--|\()")
        .expect("statement pattern must compile")
});

static CONTROL_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:if|else|for|while|do|switch|case|default|function|class|try|catch|finally|import|export\s+default\s+function)\b")
        .expect("control pattern must compile")
});

static NOT_JS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?mi)^\s*<(?:!DOCTYPE|html|head|body|div|span|p|a|img|script|style)\b",
        r"(?m)^\s*[.#][\w-]+\s*\{",
        r"(?m)^\s*@(?:media|import|keyframes|font-face)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("sniff pattern must compile"))
    .collect()
});

static JS_HINTS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?m)^\s*(?:var|let|const|function|class|import|export|if|for|while|do|switch)\b",
        r"(?m)^\s*(?://|/\*)",
        r"[;{}()\[\]]",
        r"=>|===|!==|&&|\|\|",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("sniff pattern must compile"))
    .collect()
});

pub fn is_javascript(code: &str) -> bool {
    if NOT_JS.iter().any(|p| p.is_match(code)) {
        return false;
    }
    JS_HINTS.iter().any(|p| p.is_match(code))
}

fn suggestion(rule_id: &str) -> &'static str {
    match rule_id {
        "no-unused-vars" => "Remove unused variable or use it in your code",
        "no-console" => "Remove console statements or use a proper logging library",
        "no-debugger" => "Remove debugger statement before production",
        "no-alert" => "Replace alert with a proper UI notification",
        "eqeqeq" => "Use === or !== for strict equality checks",
        "no-eval" | "no-implied-eval" => "Avoid eval() - use alternative approaches",
        "prefer-const" => "Use const for variables that are never reassigned",
        "no-var" => "Use let or const instead of var",
        "semi" => "Add or remove semicolon as per style guide",
        _ => "Follow ESLint recommendation",
    }
}

/// Drop a trailing `//` comment, ignoring `//` inside quotes
fn strip_line_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev = '\0';
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q && prev != '\\' => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' || c == '`' => quote = Some(c),
            None if c == '/' && prev == '/' => return &line[..i - 1],
            None => {}
        }
        prev = c;
    }
    line
}

fn missing_semicolon(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('}') || CONTROL_START.is_match(trimmed) {
        return false;
    }
    if !STATEMENT_START.is_match(trimmed) {
        return false;
    }
    trimmed
        .chars()
        .last()
        .is_some_and(|c| c.is_alphanumeric() || matches!(c, ')' | ']' | '"' | '\'' | '`' | '_' | '$'))
}

/// Count standalone uses of every identifier in one pass (member names excluded)
fn identifier_counts(code: &str) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for m in WORD.find_iter(code) {
        let word = m.as_str();
        let after_dot = code[..m.start()].ends_with('.');
        if after_dot || word.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }
    counts
}

/// Count assignment-like writes per identifier (the initializer counts as one)
fn assignment_counts(code: &str) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for caps in ASSIGNMENT.captures_iter(code) {
        if let Some(name) = caps.get(1).or_else(|| caps.get(2)) {
            *counts.entry(name.as_str()).or_insert(0) += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EslintAnalyzer;

impl EslintAnalyzer {
    fn lint(&self, code: &str) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut in_block_comment = false;
        // Source with comments blanked out, line numbering preserved
        let mut cleaned: Vec<&str> = Vec::new();

        for (index, raw_line) in code.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = raw_line.trim_start();

            if in_block_comment {
                if raw_line.contains("*/") {
                    in_block_comment = false;
                }
                cleaned.push("");
                continue;
            }
            if trimmed.starts_with("/*") {
                in_block_comment = !trimmed.contains("*/");
                cleaned.push("");
                continue;
            }
            if trimmed.starts_with("//") {
                cleaned.push("");
                continue;
            }

            let line = strip_line_comment(raw_line);
            cleaned.push(line);
            for rule in LINE_RULES.iter() {
                if let Some(m) = rule.pattern.find(line) {
                    issues.push(
                        Issue::new(rule.kind, rule.severity, rule.message, suggestion(rule.id))
                            .at(line_no, Some(m.start() + 1))
                            .rule(rule.id),
                    );
                }
            }

            if missing_semicolon(line) {
                issues.push(
                    Issue::new("style", Severity::High, "Missing semicolon.", suggestion("semi"))
                        .at(line_no, Some(line.trim_end().chars().count() + 1))
                        .rule("semi"),
                );
            }
        }

        let cleaned = cleaned.join("\n");
        let uses = identifier_counts(&cleaned);
        let writes = assignment_counts(&cleaned);
        // Declarations arrive in source order, so line tracking only moves forward
        let (mut line, mut line_start, mut scanned) = (1, 0, 0);
        for caps in DECLARATION.captures_iter(&cleaned) {
            let (Some(keyword), Some(name)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            for (offset, _) in cleaned[scanned..name.start()].match_indices('\n') {
                line += 1;
                line_start = scanned + offset + 1;
            }
            scanned = name.start();
            let column = cleaned[line_start..name.start()].chars().count() + 1;
            let name = name.as_str();

            if uses.get(name).copied().unwrap_or(0) <= 1 {
                issues.push(
                    Issue::new(
                        "quality",
                        Severity::Medium,
                        format!("'{}' is assigned a value but never used.", name),
                        suggestion("no-unused-vars"),
                    )
                    .at(line, Some(column))
                    .rule("no-unused-vars"),
                );
            } else if keyword.as_str() == "let" && caps.get(3).is_some() && writes.get(name).copied().unwrap_or(0) <= 1 {
                issues.push(
                    Issue::new(
                        "modernization",
                        Severity::Medium,
                        format!("'{}' is never reassigned. Use 'const' instead.", name),
                        suggestion("prefer-const"),
                    )
                    .at(line, Some(column))
                    .rule("prefer-const"),
                );
            }
        }

        issues.sort_by_key(|i| (i.line, i.column));
        issues
    }

    fn summary(issues: &[Issue]) -> String {
        if issues.is_empty() {
            return "Excellent! No ESLint issues found.".to_string();
        }
        let high = issues.iter().filter(|i| i.severity == Severity::High).count();
        let medium = issues.iter().filter(|i| i.severity == Severity::Medium).count();
        let plural = |n: usize| if n > 1 { "s" } else { "" };

        if high > 0 {
            format!("Found {} critical issue{} that should be fixed immediately.", high, plural(high))
        } else if medium > 0 {
            format!("Found {} issue{} that should be addressed.", medium, plural(medium))
        } else {
            format!("Found {} minor style issue{}.", issues.len(), plural(issues.len()))
        }
    }

    fn recommendations(report: &AnalysisReport) -> Vec<String> {
        let count = |kind: &str| report.stats.by_type.get(kind).copied().unwrap_or(0);
        let mut recommendations = Vec::new();

        if count("security") > 0 {
            recommendations.push("Priority: Fix security vulnerabilities immediately".to_string());
        }
        if count("logic") > 0 {
            recommendations.push("Review logic errors to prevent runtime issues".to_string());
        }
        if count("modernization") > 5 {
            recommendations.push("Consider modernizing your JavaScript syntax".to_string());
        }
        if count("style") > 10 {
            recommendations.push("Configure ESLint rules to match your team's style guide".to_string());
        }
        if report.issues.is_empty() {
            recommendations.push("Great job! Keep following best practices".to_string());
        }
        recommendations
    }
}

impl Analyzer for EslintAnalyzer {
    fn name(&self) -> &str {
        "eslint"
    }

    fn analyze(&self, code: &str, options: &AnalyzeOptions) -> AnalysisReport {
        let is_js = options
            .language_is(&["javascript", "js", "typescript", "ts", "jsx"])
            .unwrap_or_else(|| is_javascript(code));
        if !is_js {
            return AnalysisReport::not_applicable(self.name(), "JavaScript");
        }

        let issues = options.filter(self.lint(code));
        let summary = Self::summary(&issues);
        let report = AnalysisReport::new(self.name(), issues, PenaltyTable::STANDARD).with_summary(summary);
        let recommendations = Self::recommendations(&report);
        report.with_recommendations(recommendations)
    }
}

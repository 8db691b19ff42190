//! Keyword routing table that picks an LLM provider per query category.
//!
//! The table is persisted as JSON in the data directory and edited from the
//! admin panel. Routing is a static lookup: every keyword found in the query
//! adds the category's weight, and the best category wins if its confidence
//! (share of its keywords matched) reaches the category minimum.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::sync::RwLock;
use utoipa::ToSchema;

pub const FALLBACK_CATEGORY: &str = "general";
const FALLBACK_CONFIDENCE: f64 = 0.5;
const RECENT_QUERY_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LlmType {
  #[serde(rename = "openai_gpt4")]
  OpenAiGpt4,
  #[serde(rename = "openai_gpt35")]
  OpenAiGpt35,
  #[serde(rename = "claude_3")]
  Claude3,
  #[serde(rename = "claude_2")]
  Claude2,
  #[serde(rename = "llama_70b")]
  Llama70b,
  #[serde(rename = "llama_13b")]
  Llama13b,
  #[serde(rename = "cohere")]
  Cohere,
  #[serde(rename = "mistral")]
  Mistral,
}

impl LlmType {
  pub fn as_str(&self) -> &'static str {
    match self {
      LlmType::OpenAiGpt4 => "openai_gpt4",
      LlmType::OpenAiGpt35 => "openai_gpt35",
      LlmType::Claude3 => "claude_3",
      LlmType::Claude2 => "claude_2",
      LlmType::Llama70b => "llama_70b",
      LlmType::Llama13b => "llama_13b",
      LlmType::Cohere => "cohere",
      LlmType::Mistral => "mistral",
    }
  }

  /// Provider family as the admin panel shows it: `openai` or `claude`
  pub fn provider(&self) -> &'static str {
    match self {
      LlmType::OpenAiGpt4 | LlmType::OpenAiGpt35 => "openai",
      _ => "claude",
    }
  }

  fn from_provider(provider: &str) -> Self {
    if provider.eq_ignore_ascii_case("openai") {
      LlmType::OpenAiGpt4
    } else {
      LlmType::Claude3
    }
  }

  fn counterpart(&self) -> Self {
    if self.provider() == "openai" {
      LlmType::Claude3
    } else {
      LlmType::OpenAiGpt4
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
  #[serde(default)]
  pub keywords: Vec<String>,
  pub primary_llm: LlmType,
  #[serde(default)]
  pub secondary_llms: Vec<LlmType>,
  #[serde(default = "default_weight")]
  pub weight: f64,
  #[serde(default)]
  pub context_keywords: Vec<String>,
  #[serde(default = "default_min_confidence")]
  pub min_confidence: f64,
}

fn default_weight() -> f64 {
  1.0
}

fn default_min_confidence() -> f64 {
  0.7
}

fn rule(keywords: &[&str], primary: LlmType, secondary: LlmType, weight: f64, min: f64) -> RoutingRule {
  RoutingRule {
    keywords: keywords.iter().map(|k| k.to_string()).collect(),
    primary_llm: primary,
    secondary_llms: vec![secondary],
    weight,
    context_keywords: Vec::new(),
    min_confidence: min,
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingTable {
  pub routing_rules: BTreeMap<String, RoutingRule>,
  /// Category whose models serve the `general` fallback when no `general`
  /// category exists
  #[serde(default = "default_fallback_source")]
  pub default_category: String,
}

fn default_fallback_source() -> String {
  "unit_testing".to_string()
}

impl Default for RoutingTable {
  fn default() -> Self {
    use LlmType::*;
    let mut rules = BTreeMap::new();
    rules.insert(
      "unit_testing".to_string(),
      rule(&["unit test", "jest", "mock", "assert"], OpenAiGpt4, Claude3, 1.0, 0.8),
    );
    rules.insert(
      "integration_testing".to_string(),
      rule(&["integration", "api test", "endpoint", "database"], Claude3, OpenAiGpt4, 0.9, 0.75),
    );
    rules.insert(
      "e2e_testing".to_string(),
      rule(&["e2e", "end-to-end", "cypress", "playwright", "selenium"], OpenAiGpt4, Claude2, 0.95, 0.8),
    );
    rules.insert(
      "performance_testing".to_string(),
      rule(&["performance", "load test", "latency", "benchmark"], OpenAiGpt4, Llama70b, 0.85, 0.7),
    );
    rules.insert(
      "security_testing".to_string(),
      rule(&["security", "xss", "injection", "csrf", "vulnerability"], Claude3, OpenAiGpt4, 1.0, 0.9),
    );
    rules.insert(
      "accessibility_testing".to_string(),
      rule(&["accessibility", "a11y", "wcag", "screen reader", "aria"], Claude2, OpenAiGpt35, 0.8, 0.75),
    );
    rules.insert(
      "code_review".to_string(),
      rule(&["review", "refactor", "code quality", "best practice"], OpenAiGpt4, Claude3, 0.9, 0.8),
    );
    rules.insert(
      "debugging".to_string(),
      rule(&["debug", "error", "bug", "stack trace", "crash"], Claude3, OpenAiGpt4, 0.95, 0.85),
    );

    Self {
      routing_rules: rules,
      default_category: default_fallback_source(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteDecision {
  pub category: String,
  pub model: LlmType,
  pub confidence: f64,
  pub matched_keywords: Vec<String>,
}

/// A category as the admin panel edits it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
  #[serde(default)]
  pub keywords: Vec<String>,
  pub model: String,
  /// Minimum confidence as a percentage
  pub confidence: f64,
  #[serde(default)]
  pub secondary_enabled: bool,
}

impl RoutingTable {
  pub fn route(&self, query: &str, context: Option<&str>) -> RouteDecision {
    let query_lower = query.to_lowercase();
    let context_lower = context.map(str::to_lowercase);

    let mut best: Option<(&String, &RoutingRule, f64, Vec<String>)> = None;
    for (category, rule) in &self.routing_rules {
      let mut score = 0.0;
      let mut matched = Vec::new();

      for keyword in &rule.keywords {
        if query_lower.contains(&keyword.to_lowercase()) {
          score += rule.weight;
          matched.push(keyword.clone());
        }
      }
      if let Some(context) = &context_lower {
        for keyword in &rule.context_keywords {
          if context.contains(&keyword.to_lowercase()) {
            score += rule.weight * 0.5;
          }
        }
      }

      if best.as_ref().map_or(true, |(_, _, top, _)| score > *top) {
        best = Some((category, rule, score, matched));
      }
    }

    if let Some((category, rule, score, matched)) = best {
      let confidence = if rule.keywords.is_empty() || rule.weight <= 0.0 {
        FALLBACK_CONFIDENCE
      } else {
        score / (rule.keywords.len() as f64 * rule.weight)
      };
      if score > 0.0 && confidence >= rule.min_confidence {
        return RouteDecision {
          category: category.clone(),
          model: rule.primary_llm,
          confidence,
          matched_keywords: matched,
        };
      }
    }

    RouteDecision {
      category: FALLBACK_CATEGORY.to_string(),
      model: self.fallback_model(),
      confidence: FALLBACK_CONFIDENCE,
      matched_keywords: Vec::new(),
    }
  }

  fn fallback_model(&self) -> LlmType {
    self
      .routing_rules
      .get(FALLBACK_CATEGORY)
      .or_else(|| self.routing_rules.get(&self.default_category))
      .or_else(|| self.routing_rules.values().next())
      .map(|r| r.primary_llm)
      .unwrap_or(LlmType::OpenAiGpt4)
  }

  pub fn frontend_view(&self) -> BTreeMap<String, CategoryView> {
    self
      .routing_rules
      .iter()
      .map(|(category, rule)| {
        (
          category.clone(),
          CategoryView {
            keywords: rule.keywords.clone(),
            model: rule.primary_llm.provider().to_string(),
            confidence: (rule.min_confidence * 100.0).round(),
            secondary_enabled: !rule.secondary_llms.is_empty(),
          },
        )
      })
      .collect()
  }

  /// Apply admin edits to existing categories; unknown names are ignored.
  /// Returns how many categories changed.
  pub fn apply_view(&mut self, updates: &BTreeMap<String, CategoryView>) -> usize {
    let mut updated = 0;
    for (category, view) in updates {
      let Some(rule) = self.routing_rules.get_mut(category) else {
        continue;
      };
      rule.keywords = view.keywords.clone();
      rule.primary_llm = LlmType::from_provider(&view.model);
      rule.min_confidence = view.confidence / 100.0;
      rule.secondary_llms = if view.secondary_enabled {
        vec![rule.primary_llm.counterpart()]
      } else {
        Vec::new()
      };
      updated += 1;
    }
    updated
  }

  pub fn add_category(&mut self, name: &str, keywords: Vec<String>, provider: &str, confidence: f64) {
    let primary = LlmType::from_provider(provider);
    self.routing_rules.insert(
      name.to_string(),
      RoutingRule {
        keywords,
        primary_llm: primary,
        secondary_llms: vec![primary.counterpart()],
        weight: 1.0,
        context_keywords: Vec::new(),
        min_confidence: confidence / 100.0,
      },
    );
  }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentQuery {
  pub query: String,
  pub category: String,
  pub model: String,
  pub confidence: f64,
  pub routed_at: DateTime<Utc>,
}

/// Counters since process start
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutingStats {
  pub total_queries: u64,
  pub model_usage: BTreeMap<String, u64>,
  pub category_breakdown: BTreeMap<String, u64>,
  /// Mean confidence as a percentage
  pub average_confidence: f64,
  /// Newest first
  pub recent_queries: Vec<RecentQuery>,
  #[serde(skip)]
  confidence_total: f64,
}

impl RoutingStats {
  fn record(&mut self, query: &str, decision: &RouteDecision) {
    self.total_queries += 1;
    *self
      .model_usage
      .entry(decision.model.provider().to_string())
      .or_default() += 1;
    *self
      .category_breakdown
      .entry(decision.category.clone())
      .or_default() += 1;
    self.confidence_total += decision.confidence;
    self.average_confidence =
      (self.confidence_total / self.total_queries as f64 * 100.0).round();

    self.recent_queries.insert(
      0,
      RecentQuery {
        query: query.to_string(),
        category: decision.category.clone(),
        model: decision.model.as_str().to_string(),
        confidence: decision.confidence,
        routed_at: Utc::now(),
      },
    );
    self.recent_queries.truncate(RECENT_QUERY_LIMIT);
  }
}

/// The persisted table plus in-process statistics
pub struct RoutingService {
  path: PathBuf,
  table: RwLock<RoutingTable>,
  stats: Mutex<RoutingStats>,
}

impl RoutingService {
  pub const FILE_NAME: &'static str = "routing_config.json";

  /// Load the table from `dir`, seeding the defaults on first use
  pub async fn load(dir: &Path) -> anyhow::Result<Self> {
    let path = dir.join(Self::FILE_NAME);
    let table = match tokio::fs::read_to_string(&path).await {
      Ok(raw) => serde_json::from_str(&raw)
        .with_context(|| format!("Invalid routing config at {}", path.display()))?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        let table = RoutingTable::default();
        write_table(&path, &table).await?;
        tracing::info!(path = %path.display(), "Seeded default routing config");
        table
      }
      Err(e) => return Err(e).context("Failed to read routing config"),
    };

    Ok(Self {
      path,
      table: RwLock::new(table),
      stats: Mutex::new(RoutingStats::default()),
    })
  }

  pub async fn frontend_view(&self) -> BTreeMap<String, CategoryView> {
    self.table.read().await.frontend_view()
  }

  pub async fn apply_view(&self, updates: &BTreeMap<String, CategoryView>) -> anyhow::Result<usize> {
    let mut table = self.table.write().await;
    let updated = table.apply_view(updates);
    write_table(&self.path, &table).await?;
    Ok(updated)
  }

  pub async fn add_category(
    &self,
    name: &str,
    keywords: Vec<String>,
    provider: &str,
    confidence: f64,
  ) -> anyhow::Result<()> {
    let mut table = self.table.write().await;
    table.add_category(name, keywords, provider, confidence);
    write_table(&self.path, &table).await
  }

  pub async fn test_route(&self, query: &str, context: Option<&str>) -> RouteDecision {
    let decision = self.table.read().await.route(query, context);
    self
      .stats
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .record(query, &decision);
    decision
  }

  pub fn stats(&self) -> RoutingStats {
    self
      .stats
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}

async fn write_table(path: &Path, table: &RoutingTable) -> anyhow::Result<()> {
  if let Some(parent) = path.parent() {
    tokio::fs::create_dir_all(parent).await?;
  }
  let body = serde_json::to_string_pretty(table)?;
  tokio::fs::write(path, body)
    .await
    .with_context(|| format!("Failed to write routing config to {}", path.display()))
}

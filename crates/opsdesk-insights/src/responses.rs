// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned answer selection for the insights assistant.
//!
//! Input is normalized (trimmed, lowercased) and checked against an ordered
//! list of rules; the first rule whose pattern matches produces the answer.
//! Anything unmatched gets the help text.

use std::sync::LazyLock;

use regex::Regex;

use opsdesk_core::{
    AiContent, AiMessage, AnalysisKind, ChartData, ChartPoint, DeepDive, DeepDiveResult,
    DeepDiveStep, ProductRecommendation,
};

/// A matched answer and the name of the rule that produced it.
#[derive(Debug, Clone)]
pub struct Response {
    pub rule: &'static str,
    pub message: AiMessage,
}

/// One entry of the rule table.
pub struct ResponseRule {
    pub name: &'static str,
    pattern: Regex,
    build: fn() -> AiMessage,
}

impl ResponseRule {
    pub fn matches(&self, normalized: &str) -> bool {
        self.pattern.is_match(normalized)
    }
}

/// Ordered rules plus the mandatory fallback.
pub struct ResponseEngine {
    rules: Vec<ResponseRule>,
    fallback: fn() -> AiMessage,
}

static STANDARD: LazyLock<ResponseEngine> = LazyLock::new(|| ResponseEngine {
    rules: vec![
        rule("revenue", r"\b(revenue|sales|earnings|made today|how much did)\b", revenue),
        rule("comparison", r"\b(compare|comparison|versus|vs\.?|breakdown)\b", comparison),
        rule(
            "product-launch",
            r"\b(launch|tiktok|new product|what should i sell|trending)\b",
            product_launch,
        ),
        rule("sentiment", r"\b(sentiment|reviews?|feedback|customers (feel|think|say))\b", sentiment),
        rule("trend", r"\b(trend|over time|per day|order volume)\b", order_trend),
    ],
    fallback: help,
});

fn rule(name: &'static str, pattern: &str, build: fn() -> AiMessage) -> ResponseRule {
    ResponseRule {
        name,
        pattern: Regex::new(pattern).unwrap(),
        build,
    }
}

impl ResponseEngine {
    /// The built-in rule table.
    pub fn standard() -> &'static ResponseEngine {
        &STANDARD
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn respond(&self, input: &str) -> Response {
        let normalized = input.trim().to_lowercase();
        match self.rules.iter().find(|r| r.matches(&normalized)) {
            Some(rule) => Response {
                rule: rule.name,
                message: (rule.build)(),
            },
            None => Response {
                rule: "help",
                message: (self.fallback)(),
            },
        }
    }
}

fn revenue() -> AiMessage {
    AiMessage::new(
        "Today's revenue is $4,247.38 across all channels, up 12.4% on yesterday. \
         Shopify leads with $2,103.50, followed by TikTok Shop at $1,289.12 and \
         Instagram at $854.76.",
        AiContent::Simple,
    )
}

fn comparison() -> AiMessage {
    let bars = [
        ("Shopify", 14_820.40),
        ("TikTok Shop", 9_312.75),
        ("Instagram", 6_120.10),
        ("Amazon", 4_890.00),
    ]
    .into_iter()
    .map(|(label, value)| ChartPoint {
        label: label.to_string(),
        value,
    })
    .collect();

    AiMessage::new(
        "Here's how your channels compare over the last 7 days. Shopify is still \
         your largest channel, but TikTok Shop grew fastest at +38% week over week.",
        AiContent::Chart {
            chart: ChartData::Bar {
                title: "Revenue by channel (last 7 days)".to_string(),
                bars,
            },
        },
    )
}

fn order_trend() -> AiMessage {
    let points = [
        ("Mon", 142.0),
        ("Tue", 158.0),
        ("Wed", 131.0),
        ("Thu", 176.0),
        ("Fri", 203.0),
        ("Sat", 241.0),
        ("Sun", 189.0),
    ]
    .into_iter()
    .map(|(label, value)| ChartPoint {
        label: label.to_string(),
        value,
    })
    .collect();

    AiMessage::new(
        "Orders peaked on Saturday at 241, with weekend volume about 30% above the \
         weekday average.",
        AiContent::Chart {
            chart: ChartData::Line {
                title: "Orders per day (last 7 days)".to_string(),
                points,
            },
        },
    )
}

fn product_launch() -> AiMessage {
    AiMessage::new(
        "Great question. I'll research which products you could launch on TikTok Shop. \
         This takes a few seconds.",
        AiContent::DeepDive(DeepDive::new(
            AnalysisKind::ProductLaunch,
            vec![
                DeepDiveStep::pending("trends", "Scanning TikTok trend signals", 2.0),
                DeepDiveStep::pending("competitors", "Analyzing competitor catalogs", 2.5),
                DeepDiveStep::pending("suppliers", "Matching your supplier network", 2.0),
                DeepDiveStep::pending("margins", "Modeling demand and margins", 1.5),
                DeepDiveStep::pending("ranking", "Ranking product opportunities", 1.0),
            ],
        )),
    )
}

fn sentiment() -> AiMessage {
    AiMessage::new(
        "I'll analyze recent reviews and support conversations to gauge customer sentiment.",
        AiContent::DeepDive(DeepDive::new(
            AnalysisKind::Sentiment,
            vec![
                DeepDiveStep::pending("collect", "Collecting reviews and messages", 1.5),
                DeepDiveStep::pending("classify", "Classifying sentiment", 2.0),
                DeepDiveStep::pending("themes", "Extracting recurring themes", 1.5),
            ],
        )),
    )
}

fn help() -> AiMessage {
    AiMessage::new(
        "I can help you understand your store. Try asking about today's revenue, \
         comparing your sales channels, which products to launch on TikTok, how \
         customers feel about your brand, or your order trend.",
        AiContent::Simple,
    )
}

/// The result revealed when a deep dive of `kind` finishes.
pub fn analysis_result(kind: AnalysisKind) -> DeepDiveResult {
    match kind {
        AnalysisKind::ProductLaunch => DeepDiveResult::Table {
            title: "Top product opportunities for TikTok Shop".to_string(),
            products: vec![
                product(
                    "LED Sunset Lamp",
                    "LMP-204",
                    0.94,
                    8_400.0,
                    "Trending in home decor videos; fits your lighting category.",
                ),
                product(
                    "Magnetic Phone Mount",
                    "ACC-118",
                    0.89,
                    6_150.0,
                    "High impulse-buy rate and low return risk.",
                ),
                product(
                    "Reusable Ice Roller",
                    "SKN-032",
                    0.86,
                    5_320.0,
                    "Skincare creators drive steady demand; strong margin at $14.99.",
                ),
            ],
        },
        AnalysisKind::Sentiment => DeepDiveResult::Sentiment {
            score: 0.72,
            positive_pct: 68,
            neutral_pct: 22,
            negative_pct: 10,
            themes: vec![
                "Fast shipping".to_string(),
                "Product quality".to_string(),
                "Sizing confusion".to_string(),
            ],
        },
    }
}

fn product(
    name: &str,
    sku: &str,
    match_score: f64,
    projected_monthly_revenue: f64,
    rationale: &str,
) -> ProductRecommendation {
    ProductRecommendation {
        name: name.to_string(),
        sku: sku.to_string(),
        match_score,
        projected_monthly_revenue,
        rationale: rationale.to_string(),
    }
}

//! Narrative metrics: readability, emotional tone and SEO scoring of the
//! submitted copy.
//!
//! Two collaborators implement [`NarrativeMetrics`]: [`LexicalNarrative`]
//! scores locally with fixed formulas and a word lexicon, [`LlmNarrative`]
//! asks a chat-completions API for the same JSON shape. The orchestrator picks
//! one at startup and treats any error as a failed branch.

use async_trait::async_trait;
use copydeck_core::{ContentInsights, EmotionalMetrics, ReadabilityMetrics, SeoMetrics};
use serde::Serialize;

use crate::error::AnalyticsError;
use crate::retry::RetryPolicy;
use crate::sources::ProviderClient;

#[async_trait]
pub trait NarrativeMetrics: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score `content` against the request's `keywords`.
    ///
    /// # Errors
    ///
    /// Implementations return [`AnalyticsError`] when scoring cannot complete.
    async fn analyze(
        &self,
        content: &str,
        keywords: &[String],
    ) -> Result<ContentInsights, AnalyticsError>;
}

/// Average adult silent reading speed.
const WORDS_PER_MINUTE: usize = 238;

/// Sentences longer than this are reported as hotspots.
const HOTSPOT_WORDS: usize = 25;
const MAX_HOTSPOTS: usize = 5;

/// Copy shorter than this gets a length suggestion and a reduced SEO score.
const MIN_SEO_WORDS: usize = 300;

/// Keyword density range (per hundred words) considered healthy.
const IDEAL_DENSITY: (f64, f64) = (0.5, 2.5);
const STUFFED_DENSITY: f64 = 3.0;

/// Marketing-copy tone lexicon. Positive weights pull the tone up, negative
/// weights down; the sum is clamped to `[-1.0, 1.0]`.
const TONE_LEXICON: &[(&str, f64)] = &[
    ("amazing", 0.4),
    ("best", 0.3),
    ("boost", 0.3),
    ("delight", 0.4),
    ("discover", 0.2),
    ("easy", 0.2),
    ("exclusive", 0.3),
    ("free", 0.2),
    ("fresh", 0.2),
    ("guaranteed", 0.3),
    ("happy", 0.4),
    ("incredible", 0.4),
    ("love", 0.5),
    ("new", 0.1),
    ("proven", 0.3),
    ("save", 0.2),
    ("success", 0.4),
    ("transform", 0.3),
    ("trusted", 0.3),
    ("win", 0.3),
    ("afraid", -0.4),
    ("avoid", -0.2),
    ("crisis", -0.5),
    ("danger", -0.5),
    ("fail", -0.4),
    ("fear", -0.4),
    ("lose", -0.3),
    ("mistake", -0.3),
    ("pain", -0.4),
    ("problem", -0.3),
    ("risk", -0.3),
    ("struggle", -0.3),
    ("warning", -0.4),
    ("worst", -0.5),
];

/// Splits text into lowercase words with surrounding punctuation removed.
fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| s.chars().any(char::is_alphanumeric))
        .collect()
}

/// Vowel-group syllable estimate, at least one per word.
fn syllables(word: &str) -> usize {
    let mut count = 0;
    let mut prev_vowel = false;
    for c in word.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    if count > 1 && word.ends_with('e') && !word.ends_with("le") && !word.ends_with("ee") {
        count -= 1;
    }
    count.max(1)
}

/// Flesch reading ease clamped to `[0, 100]`.
#[allow(clippy::cast_precision_loss)]
fn flesch_reading_ease(word_count: usize, sentence_count: usize, syllable_count: usize) -> f64 {
    if word_count == 0 {
        return 0.0;
    }
    let words_per_sentence = word_count as f64 / sentence_count.max(1) as f64;
    let syllables_per_word = syllable_count as f64 / word_count as f64;
    (206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word).clamp(0.0, 100.0)
}

fn reading_level(score: f64) -> &'static str {
    match score {
        s if s >= 90.0 => "very easy",
        s if s >= 70.0 => "easy",
        s if s >= 60.0 => "standard",
        s if s >= 50.0 => "fairly difficult",
        s if s >= 30.0 => "difficult",
        _ => "very difficult",
    }
}

#[allow(clippy::cast_precision_loss)]
fn readability(content: &str, tokens: &[String]) -> ReadabilityMetrics {
    let sentence_list = sentences(content);
    let syllable_counts: Vec<usize> = tokens.iter().map(|w| syllables(w)).collect();
    let score = flesch_reading_ease(
        tokens.len(),
        sentence_list.len(),
        syllable_counts.iter().sum(),
    );

    let avg_sentence = tokens.len() as f64 / sentence_list.len().max(1) as f64;
    let complex_ratio = syllable_counts.iter().filter(|&&s| s >= 3).count() as f64
        / tokens.len().max(1) as f64;

    let mut improvements = Vec::new();
    if avg_sentence > 20.0 {
        improvements.push(format!(
            "Shorten sentences: average is {avg_sentence:.0} words, aim for under 20"
        ));
    }
    if complex_ratio > 0.15 {
        improvements.push("Swap long multi-syllable words for plain alternatives".to_owned());
    }
    if score < 60.0 && improvements.is_empty() {
        improvements.push("Use simpler vocabulary and more direct phrasing".to_owned());
    }

    let hotspots = sentence_list
        .iter()
        .filter(|s| s.split_whitespace().count() > HOTSPOT_WORDS)
        .take(MAX_HOTSPOTS)
        .map(|s| (*s).to_owned())
        .collect();

    let read_time_minutes = u32::try_from(tokens.len().div_ceil(WORDS_PER_MINUTE)).unwrap_or(u32::MAX);

    // Easier copy keeps readers; every minute past three loses some.
    let length_penalty = f64::from(read_time_minutes.saturating_sub(3)) * 0.05;
    let retention = if tokens.is_empty() {
        0.0
    } else {
        ((0.5 + score / 200.0) - length_penalty).clamp(0.2, 1.0)
    };

    ReadabilityMetrics {
        score,
        level: if tokens.is_empty() {
            String::new()
        } else {
            reading_level(score).to_owned()
        },
        improvements,
        read_time_minutes,
        hotspots,
        retention,
    }
}

fn emotional(tokens: &[String]) -> EmotionalMetrics {
    let mut score = 0.0;
    let mut triggers: Vec<String> = Vec::new();
    for token in tokens {
        if let Some(&(word, weight)) = TONE_LEXICON.iter().find(|(w, _)| *w == token.as_str()) {
            score += weight;
            if !triggers.iter().any(|t| t == word) {
                triggers.push(word.to_owned());
            }
        }
    }
    let score: f64 = f64::clamp(score, -1.0, 1.0);
    let tone = if tokens.is_empty() {
        ""
    } else if score > 0.25 {
        "positive"
    } else if score < -0.25 {
        "negative"
    } else {
        "neutral"
    };
    EmotionalMetrics {
        score,
        tone: tone.to_owned(),
        triggers,
    }
}

/// Occurrences of `phrase` as a whole-word sequence in `tokens`.
fn phrase_count(tokens: &[String], phrase: &[String]) -> usize {
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return 0;
    }
    tokens.windows(phrase.len()).filter(|w| *w == phrase).count()
}

#[allow(clippy::cast_precision_loss)]
fn seo(tokens: &[String], keywords: &[String]) -> SeoMetrics {
    let mut keyword_density = std::collections::BTreeMap::new();
    let mut suggestions = Vec::new();
    let mut healthy = 0usize;

    for keyword in keywords {
        let phrase = words(keyword);
        if phrase.is_empty() {
            continue;
        }
        let density = if tokens.is_empty() {
            0.0
        } else {
            phrase_count(tokens, &phrase) as f64 / tokens.len() as f64 * 100.0
        };
        if density == 0.0 {
            suggestions.push(format!("Include '{keyword}' in the copy"));
        } else if density > STUFFED_DENSITY {
            suggestions.push(format!("Reduce repetition of '{keyword}'"));
        }
        if (IDEAL_DENSITY.0..=IDEAL_DENSITY.1).contains(&density) {
            healthy += 1;
        }
        keyword_density.insert(keyword.clone(), density);
    }

    if keywords.is_empty() {
        suggestions.push("Add target keywords to the topic".to_owned());
    }
    if tokens.len() < MIN_SEO_WORDS {
        suggestions.push(format!("Expand the copy to at least {MIN_SEO_WORDS} words"));
    }

    let length_part = (tokens.len() as f64 / MIN_SEO_WORDS as f64).min(1.0) * 40.0;
    let keyword_part = if keyword_density.is_empty() {
        0.0
    } else {
        healthy as f64 / keyword_density.len() as f64 * 60.0
    };

    SeoMetrics {
        score: (length_part + keyword_part).clamp(0.0, 100.0),
        keyword_density,
        suggestions,
    }
}

/// Local scorer with no external dependencies.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalNarrative;

impl LexicalNarrative {
    /// Synchronous scoring used by the async trait impl.
    #[must_use]
    pub fn score(content: &str, keywords: &[String]) -> ContentInsights {
        let tokens = words(content);
        ContentInsights {
            readability: readability(content, &tokens),
            emotional: emotional(&tokens),
            seo: seo(&tokens, keywords),
        }
    }
}

#[async_trait]
impl NarrativeMetrics for LexicalNarrative {
    fn name(&self) -> &'static str {
        "lexical"
    }

    async fn analyze(
        &self,
        content: &str,
        keywords: &[String],
    ) -> Result<ContentInsights, AnalyticsError> {
        Ok(Self::score(content, keywords))
    }
}

const SYSTEM_PROMPT: &str = "You are a copy analyst. Reply with one JSON object shaped as \
{\"readability\":{\"score\":0-100,\"level\":string,\"improvements\":[string],\"read_time_minutes\":int,\
\"hotspots\":[string],\"retention\":0-1},\"emotional\":{\"score\":-1..1,\"tone\":string,\"triggers\":[string]},\
\"seo\":{\"score\":0-100,\"keyword_density\":{keyword:per-hundred-words},\"suggestions\":[string]}}. \
No prose outside the JSON.";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

/// Chat-completions backed scorer.
pub struct LlmNarrative {
    client: ProviderClient,
    model: String,
    retry: RetryPolicy,
}

impl LlmNarrative {
    pub fn new(client: ProviderClient, model: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            model: model.to_owned(),
            retry,
        }
    }

    async fn request(&self, content: &str, keywords: &[String]) -> Result<ContentInsights, AnalyticsError> {
        let user = format!(
            "Target keywords: {}\n\nCopy:\n{content}",
            if keywords.is_empty() {
                "(none)".to_owned()
            } else {
                keywords.join(", ")
            }
        );
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let reply = self
            .client
            .post_json(self.name(), "v1/chat/completions", &body)
            .await?;
        let text = reply
            .pointer("/choices/0/message/content")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| AnalyticsError::Narrative("completion has no message content".to_owned()))?;

        let insights: ContentInsights =
            serde_json::from_str(text).map_err(|e| AnalyticsError::Deserialize {
                context: "narrative completion content".to_owned(),
                source: e,
            })?;
        Ok(sanitise(insights))
    }
}

/// Pull model-reported scores back into their documented ranges.
fn sanitise(mut insights: ContentInsights) -> ContentInsights {
    let r = &mut insights.readability;
    r.score = finite_or_zero(r.score).clamp(0.0, 100.0);
    r.retention = finite_or_zero(r.retention).clamp(0.0, 1.0);
    r.hotspots.truncate(MAX_HOTSPOTS);
    insights.emotional.score = finite_or_zero(insights.emotional.score).clamp(-1.0, 1.0);
    insights.seo.score = finite_or_zero(insights.seo.score).clamp(0.0, 100.0);
    insights
        .seo
        .keyword_density
        .retain(|_, density| density.is_finite() && *density >= 0.0);
    insights
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[async_trait]
impl NarrativeMetrics for LlmNarrative {
    fn name(&self) -> &'static str {
        "narrative"
    }

    async fn analyze(
        &self,
        content: &str,
        keywords: &[String],
    ) -> Result<ContentInsights, AnalyticsError> {
        self.retry
            .execute(self.name(), || self.request(content, keywords))
            .await
    }
}

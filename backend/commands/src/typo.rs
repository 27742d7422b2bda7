/// Typo suggestions for unknown command names.
use async_trait::async_trait;
use tracing::debug;

use crate::context::CommandContext;

/// Default minimum similarity for a suggestion.
pub const MIN_SIMILARITY: f64 = 0.6;

/// Jaro score above which the common-prefix bonus applies.
const BOOST_THRESHOLD: f64 = 0.7;
const PREFIX_SCALE: f64 = 0.1;
const MAX_PREFIX: usize = 4;

/// Suggests a corrected command name. Purely advisory: implementations must
/// never invoke commands themselves.
#[async_trait]
pub trait TypoChecker: Send + Sync {
    async fn suggest(&self, ctx: &CommandContext, attempted: &str) -> Option<String>;
}

/// Suggests the registered name or alias most similar to the attempt.
#[derive(Debug, Clone)]
pub struct JaroWinklerTypoChecker {
    pub min_similarity: f64,
}

impl Default for JaroWinklerTypoChecker {
    fn default() -> Self {
        Self {
            min_similarity: MIN_SIMILARITY,
        }
    }
}

impl JaroWinklerTypoChecker {
    pub fn new(min_similarity: f64) -> Self {
        Self { min_similarity }
    }

    /// Best candidate at or above the threshold. Earlier candidates win ties.
    pub fn best_match<'a>(
        &self,
        attempted: &str,
        candidates: impl IntoIterator<Item = &'a str>,
    ) -> Option<(&'a str, f64)> {
        let mut best: Option<(&'a str, f64)> = None;
        for candidate in candidates {
            let score = jaro_winkler(attempted, candidate);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }
        best.filter(|(_, score)| *score >= self.min_similarity)
    }
}

#[async_trait]
impl TypoChecker for JaroWinklerTypoChecker {
    async fn suggest(&self, ctx: &CommandContext, attempted: &str) -> Option<String> {
        let found = self.best_match(attempted, ctx.registry.names());
        debug!(attempted, suggestion = ?found, "Typo check");
        found.map(|(name, _)| name.to_string())
    }
}

/// Jaro similarity in `[0, 1]`.
pub fn jaro(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let window = (a.len().max(b.len()) / 2).saturating_sub(1);
    let mut a_matched = vec![false; a.len()];
    let mut b_matched = vec![false; b.len()];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let lo = i.saturating_sub(window);
        let hi = (i + window + 1).min(b.len());
        for j in lo..hi {
            if !b_matched[j] && b[j] == *ca {
                a_matched[i] = true;
                b_matched[j] = true;
                matches += 1;
                break;
            }
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let a_seq = a.iter().zip(&a_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let b_seq = b.iter().zip(&b_matched).filter(|(_, m)| **m).map(|(c, _)| c);
    let half_transpositions = a_seq.zip(b_seq).filter(|(x, y)| x != y).count();

    let m = matches as f64;
    let t = half_transpositions as f64 / 2.0;
    (m / a.len() as f64 + m / b.len() as f64 + (m - t) / m) / 3.0
}

/// Jaro–Winkler similarity: Jaro with a bonus for a shared prefix.
pub fn jaro_winkler(a: &str, b: &str) -> f64 {
    let j = jaro(a, b);
    if j <= BOOST_THRESHOLD {
        return j;
    }
    let prefix = a
        .chars()
        .zip(b.chars())
        .take(MAX_PREFIX)
        .take_while(|(x, y)| x == y)
        .count();
    j + prefix as f64 * PREFIX_SCALE * (1.0 - j)
}

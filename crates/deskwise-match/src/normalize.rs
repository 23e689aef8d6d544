//! Question normalization shared by every matching tier and the cache key.
//!
//! Lowercase, fold French diacritics, strip punctuation, collapse
//! whitespace. The same text must normalize identically everywhere or the
//! cache and the matchers disagree on what "the same question" means.

/// Stopwords skipped when counting significant tokens (French + English).
const STOPWORDS: &[&str] = &[
    // fr
    "le", "la", "les", "un", "une", "des", "de", "du", "d", "l", "et", "ou",
    "a", "au", "aux", "en", "dans", "sur", "pour", "par", "avec", "sans",
    "ce", "cet", "cette", "ces", "mon", "ma", "mes", "son", "sa", "ses",
    "je", "tu", "il", "elle", "on", "nous", "vous", "ils", "elles", "que",
    "qui", "quoi", "dont", "est", "sont", "suis", "etes", "ai", "as", "ont",
    "ne", "pas", "plus", "tres", "y", "se", "c", "s", "qu", "n",
    "comment", "pourquoi", "puis", "peux", "peut",
    // en
    "the", "a", "an", "of", "to", "in", "on", "for", "and", "or", "is",
    "are", "do", "does", "how", "what", "can", "i", "my", "me", "it",
];

/// Fold common French accented characters to their ASCII base.
fn fold_diacritics(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' => 'i',
        'ô' | 'ö' => 'o',
        'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'œ' => 'o',
        other => other,
    }
}

/// Normalize a question: lowercase, fold accents, strip punctuation,
/// collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        let c = fold_diacritics(c.to_lowercase().next().unwrap_or(c));
        if c.is_alphanumeric() {
            out.push(c);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Tokenize normalized text and drop stopwords. Falls back to the full
/// token list when everything was a stopword ("est-ce que..." questions).
pub fn significant_tokens(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let all: Vec<String> = normalized.split_whitespace().map(String::from).collect();
    let significant: Vec<String> = all
        .iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .cloned()
        .collect();
    if significant.is_empty() { all } else { significant }
}

/// Shared-token ratio between two token sets, relative to the larger set.
/// 1.0 means identical significant vocabulary.
pub fn overlap_ratio(a: &[String], b: &[String]) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let set: std::collections::HashSet<&str> = a.iter().map(String::as_str).collect();
    let shared = b.iter().filter(|t| set.contains(t.as_str())).count();
    shared as f32 / a.len().max(b.len()) as f32
}

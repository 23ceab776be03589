/// Tokenize text into lowercase terms.
///
/// Commas and periods are treated as whitespace; no stemming or stopword
/// filtering is applied and repeated terms are kept.
pub fn tokenize(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.to_lowercase()
        .replace([',', '.'], " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

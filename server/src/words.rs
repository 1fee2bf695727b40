use rand::random_range;

const DEFAULT_WORDS: &[&str] = &[
    "apple", "house", "bicycle", "elephant", "guitar", "rainbow", "pizza", "rocket", "castle",
    "umbrella", "giraffe", "lighthouse", "snowman", "volcano", "butterfly", "dragon", "island",
    "penguin", "camera", "ladder", "octopus", "sandwich", "tornado", "anchor", "cactus",
];

/// Non-empty pool of secret words. Draws are uniform and may repeat.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl Default for WordList {
    fn default() -> Self {
        Self {
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl WordList {
    /// Blank entries are dropped; `None` if nothing is left.
    pub fn new<I, S>(words: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            None
        } else {
            Some(Self { words })
        }
    }

    pub fn choose(&self) -> &str {
        &self.words[random_range(0..self.words.len())]
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Exact match after trimming, ignoring case. No partial credit.
pub fn is_correct_guess(guess: &str, secret: &str) -> bool {
    let guess = guess.trim();
    let secret = secret.trim();
    !secret.is_empty() && guess.to_lowercase() == secret.to_lowercase()
}

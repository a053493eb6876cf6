use rand::seq::IndexedRandom;

pub const DEFAULT_WORDS: &[&str] = &[
    "apple", "banana", "car", "dog", "elephant", "fish", "guitar", "house", "ice", "jacket",
    "kite", "lion", "monkey", "nose", "orange", "pencil", "queen", "rocket", "sun", "tree",
    "umbrella", "violin", "water", "xylophone", "yacht", "zebra", "airplane", "beach", "cat",
    "dragon", "eagle", "fire", "ghost", "helicopter", "island", "jungle", "kangaroo", "lemon",
    "mountain", "ninja", "ocean", "pirate", "quilt", "rainbow", "snake", "train", "unicorn",
    "volcano", "whale", "x-ray", "yoyo", "zombie", "ice cream", "hot dog", "fire truck",
    "palm tree", "traffic light", "birthday cake", "roller coaster", "hot air balloon",
];

/// Candidate words for the drawer to pick from.
#[derive(Debug, Clone)]
pub struct WordBank {
    words: Vec<String>,
}

impl WordBank {
    /// Builds a bank from arbitrary input, dropping blanks and duplicates
    /// (compared case-insensitively) so samples are always distinct.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = std::collections::HashSet::new();
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty() && seen.insert(w.to_lowercase()))
            .collect();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Draws up to `count` distinct words in random order.
    pub fn sample(&self, count: usize) -> Vec<String> {
        self.words
            .choose_multiple(&mut rand::rng(), count)
            .cloned()
            .collect()
    }
}

impl Default for WordBank {
    fn default() -> Self {
        Self::new(DEFAULT_WORDS)
    }
}

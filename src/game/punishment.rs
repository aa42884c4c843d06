//! Punishment catalog - speech distortion effects

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Speech distortion applied to a punished player's chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunishmentKind {
    /// Text is reversed
    Backward,
    /// Words start with a stutter
    Stutterstep,
    /// Vowels are stretched out
    Elongate,
    Uppercase,
    Lowercase,
    /// Shouted machine speech
    Robotic,
    /// aLtErNaTiNg case
    Alternating,
    Uwu,
    Pirate,
    /// Articles and filler words dropped
    Caveman,
    /// Random letters doubled
    Drunk,
    /// Random *hic* between words
    Hiccup,
    /// Word order shuffled
    Confused,
    /// Nervous aside appended
    Paranoid,
    /// Consonants only, muffled
    Mumble,
    /// Wrapped as unreliable subtitles
    Subtitles,
}

impl PunishmentKind {
    pub const ALL: [PunishmentKind; 16] = [
        PunishmentKind::Backward,
        PunishmentKind::Stutterstep,
        PunishmentKind::Elongate,
        PunishmentKind::Uppercase,
        PunishmentKind::Lowercase,
        PunishmentKind::Robotic,
        PunishmentKind::Alternating,
        PunishmentKind::Uwu,
        PunishmentKind::Pirate,
        PunishmentKind::Caveman,
        PunishmentKind::Drunk,
        PunishmentKind::Hiccup,
        PunishmentKind::Confused,
        PunishmentKind::Paranoid,
        PunishmentKind::Mumble,
        PunishmentKind::Subtitles,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PunishmentKind::Backward => "backward",
            PunishmentKind::Stutterstep => "stutterstep",
            PunishmentKind::Elongate => "elongate",
            PunishmentKind::Uppercase => "uppercase",
            PunishmentKind::Lowercase => "lowercase",
            PunishmentKind::Robotic => "robotic",
            PunishmentKind::Alternating => "alternating",
            PunishmentKind::Uwu => "uwu",
            PunishmentKind::Pirate => "pirate",
            PunishmentKind::Caveman => "caveman",
            PunishmentKind::Drunk => "drunk",
            PunishmentKind::Hiccup => "hiccup",
            PunishmentKind::Confused => "confused",
            PunishmentKind::Paranoid => "paranoid",
            PunishmentKind::Mumble => "mumble",
            PunishmentKind::Subtitles => "subtitles",
        }
    }

    /// Distort a chat line
    pub fn apply<R: Rng + ?Sized>(self, text: &str, rng: &mut R) -> String {
        match self {
            PunishmentKind::Backward => text.chars().rev().collect(),
            PunishmentKind::Stutterstep => map_words(text, |word| {
                match word.chars().next() {
                    Some(first) if first.is_alphabetic() => format!("{first}-{first}-{word}"),
                    _ => word.to_string(),
                }
            }),
            PunishmentKind::Elongate => text
                .chars()
                .flat_map(|c| {
                    let n = if is_vowel(c) { 3 } else { 1 };
                    std::iter::repeat(c).take(n)
                })
                .collect(),
            PunishmentKind::Uppercase => text.to_uppercase(),
            PunishmentKind::Lowercase => text.to_lowercase(),
            PunishmentKind::Robotic => {
                let body = map_words(text, |word| word.to_uppercase()).replace(' ', " - ");
                format!("[BEEP] {body} [BOOP]")
            }
            PunishmentKind::Alternating => text
                .chars()
                .enumerate()
                .map(|(i, c)| {
                    if i % 2 == 0 {
                        c.to_lowercase().next().unwrap_or(c)
                    } else {
                        c.to_uppercase().next().unwrap_or(c)
                    }
                })
                .collect(),
            PunishmentKind::Uwu => {
                let body: String = text
                    .chars()
                    .map(|c| match c {
                        'r' | 'l' => 'w',
                        'R' | 'L' => 'W',
                        other => other,
                    })
                    .collect();
                format!("{body} uwu")
            }
            PunishmentKind::Pirate => {
                let body = map_words(text, |word| {
                    match word.to_lowercase().as_str() {
                        "you" => "ye".to_string(),
                        "your" => "yer".to_string(),
                        "my" => "me".to_string(),
                        "hello" | "hi" => "ahoy".to_string(),
                        "is" | "are" => "be".to_string(),
                        "friend" => "matey".to_string(),
                        _ => word.to_string(),
                    }
                });
                format!("{body}, arr!")
            }
            PunishmentKind::Caveman => {
                const FILLER: [&str; 8] = ["the", "a", "an", "is", "are", "was", "were", "of"];
                let kept: Vec<&str> = text
                    .split_whitespace()
                    .filter(|w| !FILLER.contains(&w.to_lowercase().as_str()))
                    .collect();
                format!("{} ugh.", kept.join(" "))
            }
            PunishmentKind::Drunk => text
                .chars()
                .flat_map(|c| {
                    let n = if c.is_alphabetic() && rng.gen_bool(0.15) { 2 } else { 1 };
                    std::iter::repeat(c).take(n)
                })
                .collect(),
            PunishmentKind::Hiccup => {
                let mut out = Vec::new();
                for (i, word) in text.split_whitespace().enumerate() {
                    if i > 0 && rng.gen_bool(0.3) {
                        out.push("*hic*");
                    }
                    out.push(word);
                }
                out.join(" ")
            }
            PunishmentKind::Confused => {
                let mut words: Vec<&str> = text.split_whitespace().collect();
                words.shuffle(rng);
                words.join(" ")
            }
            PunishmentKind::Paranoid => {
                const ASIDES: [&str; 5] = [
                    "...did anyone else hear that?",
                    "...they're watching, aren't they?",
                    "...why is everyone looking at me?",
                    "...I know what you did.",
                    "...don't trust the potato.",
                ];
                let aside = ASIDES.choose(rng).copied().unwrap_or(ASIDES[0]);
                format!("{text} {aside}")
            }
            PunishmentKind::Mumble => {
                let body: String = text.chars().filter(|c| !is_vowel(*c)).collect();
                format!("*mumbles* {body}")
            }
            PunishmentKind::Subtitles => format!("[{text}] (subtitles may be inaccurate)"),
        }
    }
}

impl fmt::Display for PunishmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform draw with replacement over the whole catalog
pub fn random_punishment<R: Rng + ?Sized>(rng: &mut R) -> PunishmentKind {
    PunishmentKind::ALL[rng.gen_range(0..PunishmentKind::ALL.len())]
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

fn map_words(text: &str, f: impl Fn(&str) -> String) -> String {
    text.split_whitespace().map(f).collect::<Vec<_>>().join(" ")
}

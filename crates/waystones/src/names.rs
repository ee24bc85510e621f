//! Display names for newly created waystones.

use std::collections::HashSet;
use std::sync::Mutex;

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::waystone::Waystone;

/// Name generator contract consumed by waystone bindings.
///
/// `rng` is the level's random source, so the same draw over the same
/// generator state always yields the same name.
pub trait NameGenerator: Send + Sync {
    fn generate(&self, waystone: &Waystone, rng: &mut dyn RngCore) -> String;

    /// The waystone was destroyed; its name may be handed out again.
    fn release(&self, waystone: &Waystone);
}

/// Where generated names come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameGenerationMode {
    /// Syllable names only; presets are ignored.
    #[default]
    RandomOnly,
    /// Hand out each preset once, then fall back to syllable names.
    PresetFirst,
    /// Presets only; once all are used they repeat with a numeral suffix.
    PresetOnly,
}

const START: &[&str] = &[
    "Ash", "Bel", "Cor", "Dun", "El", "Fen", "Gal", "Har", "Isen", "Kel", "Lor", "Mor", "Nor",
    "Os", "Rav", "Sil", "Thal", "Vel", "Wyn", "Yr",
];
const MIDDLE: &[&str] = &["a", "en", "i", "o", "ar", "el", "un", "is"];
const END: &[&str] = &[
    "brook", "dale", "fall", "ford", "gate", "haven", "hold", "mere", "moor", "reach", "stead",
    "vale", "watch", "wick",
];

struct NameState {
    taken: HashSet<String>,
    unused_presets: Vec<String>,
}

/// Syllable-table generator with optional preset names and duplicate
/// avoidance. Every name it hands out is remembered; a repeat gets a roman
/// numeral appended (`"Ashford II"`).
pub struct SyllableNameGenerator {
    mode: NameGenerationMode,
    presets: Vec<String>,
    state: Mutex<NameState>,
}

impl SyllableNameGenerator {
    pub fn new(mode: NameGenerationMode, presets: Vec<String>) -> Self {
        Self {
            mode,
            state: Mutex::new(NameState {
                taken: HashSet::new(),
                unused_presets: presets.clone(),
            }),
            presets,
        }
    }

    /// Mark a name as in use (e.g. names loaded from saved data), so it is
    /// neither generated again nor handed out as a preset.
    pub fn reserve(&self, name: &str) {
        let mut state = self.state.lock().expect("name generator poisoned");
        state.unused_presets.retain(|preset| preset != name);
        state.taken.insert(name.to_string());
    }

    fn syllable_name(rng: &mut dyn RngCore) -> String {
        let mut name = String::new();
        name.push_str(pick(START, rng));
        for _ in 0..rng.gen_range(0..=1) {
            name.push_str(pick(MIDDLE, rng));
        }
        name.push_str(pick(END, rng));
        name
    }
}

impl Default for SyllableNameGenerator {
    fn default() -> Self {
        Self::new(NameGenerationMode::default(), Vec::new())
    }
}

impl NameGenerator for SyllableNameGenerator {
    fn generate(&self, waystone: &Waystone, rng: &mut dyn RngCore) -> String {
        let mut state = self.state.lock().expect("name generator poisoned");

        let preset = match self.mode {
            NameGenerationMode::RandomOnly => None,
            NameGenerationMode::PresetFirst => take_preset(&mut state.unused_presets, rng),
            NameGenerationMode::PresetOnly => take_preset(&mut state.unused_presets, rng)
                .or_else(|| self.presets.choose(&mut *rng).cloned()),
        };
        let base = preset.unwrap_or_else(|| Self::syllable_name(rng));

        let name = resolve_duplicate(&state.taken, base);
        state.taken.insert(name.clone());
        tracing::debug!("Named waystone {} at {}: '{}'", waystone.id(), waystone.pos(), name);
        name
    }

    fn release(&self, waystone: &Waystone) {
        let name = waystone.name();
        let freed = self
            .state
            .lock()
            .expect("name generator poisoned")
            .taken
            .remove(&name);
        if freed {
            tracing::debug!("Released waystone name '{}'", name);
        }
    }
}

fn pick<'a>(table: &[&'a str], rng: &mut dyn RngCore) -> &'a str {
    table[rng.gen_range(0..table.len())]
}

fn take_preset(unused: &mut Vec<String>, rng: &mut dyn RngCore) -> Option<String> {
    if unused.is_empty() {
        return None;
    }
    let idx = rng.gen_range(0..unused.len());
    Some(unused.swap_remove(idx))
}

fn resolve_duplicate(taken: &HashSet<String>, base: String) -> String {
    if !taken.contains(&base) {
        return base;
    }
    (2u32..)
        .map(|n| format!("{} {}", base, roman(n)))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}

fn roman(mut n: u32) -> String {
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waystone::WaystoneId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use waystones_engine::world::dimension::DimensionId;
    use waystones_engine::world::position::BlockPos;

    fn blank() -> Waystone {
        Waystone::new(
            WaystoneId::new(),
            DimensionId::Overworld,
            BlockPos::new(0, 64, 0),
            true,
            None,
        )
    }

    #[test]
    fn same_draw_same_name() {
        let a = SyllableNameGenerator::default();
        let b = SyllableNameGenerator::default();
        let name_a = a.generate(&blank(), &mut StdRng::seed_from_u64(7));
        let name_b = b.generate(&blank(), &mut StdRng::seed_from_u64(7));
        assert_eq!(name_a, name_b);
        assert!(!name_a.is_empty());
    }

    #[test]
    fn duplicates_get_numerals() {
        let generator = SyllableNameGenerator::default();
        let first = generator.generate(&blank(), &mut StdRng::seed_from_u64(3));
        let second = generator.generate(&blank(), &mut StdRng::seed_from_u64(3));
        let third = generator.generate(&blank(), &mut StdRng::seed_from_u64(3));
        assert_eq!(second, format!("{first} II"));
        assert_eq!(third, format!("{first} III"));
    }

    #[test]
    fn presets_first_then_random() {
        let generator = SyllableNameGenerator::new(
            NameGenerationMode::PresetFirst,
            vec!["Home".into(), "Spawn".into()],
        );
        let mut rng = StdRng::seed_from_u64(11);
        let mut got: Vec<String> = (0..2).map(|_| generator.generate(&blank(), &mut rng)).collect();
        got.sort();
        assert_eq!(got, vec!["Home".to_string(), "Spawn".to_string()]);

        let third = generator.generate(&blank(), &mut rng);
        assert!(third != "Home" && third != "Spawn");
    }

    #[test]
    fn preset_only_repeats_with_suffix() {
        let generator =
            SyllableNameGenerator::new(NameGenerationMode::PresetOnly, vec!["Outpost".into()]);
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(generator.generate(&blank(), &mut rng), "Outpost");
        assert_eq!(generator.generate(&blank(), &mut rng), "Outpost II");
    }

    #[test]
    fn reserved_names_are_skipped() {
        let generator =
            SyllableNameGenerator::new(NameGenerationMode::PresetOnly, vec!["Outpost".into()]);
        generator.reserve("Outpost");
        let name = generator.generate(&blank(), &mut StdRng::seed_from_u64(5));
        assert_eq!(name, "Outpost II");

        generator.release(&blank().with_name("Outpost"));
        let name = generator.generate(&blank(), &mut StdRng::seed_from_u64(5));
        assert_eq!(name, "Outpost");
    }

    #[test]
    fn roman_numerals() {
        assert_eq!(roman(2), "II");
        assert_eq!(roman(4), "IV");
        assert_eq!(roman(14), "XIV");
        assert_eq!(roman(1994), "MCMXCIV");
    }
}

//! Packed score decoding and score arithmetic
//!
//! Scoring devices store one `u64` per shot string. Each record holds two
//! independent groups of seven 4-bit counters: the first group in bits
//! `0..28`, the second in bits `32..60`. Category order inside a group is
//! alphas, bravos, charlies, deltas, no-shoots, misses, no-penalty misses.
//! This module is the only place that knows the layout.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Bit offset of the second counter group
const SECOND_GROUP_SHIFT: u32 = 32;

/// Width of one counter in bits
const NIBBLE_BITS: u32 = 4;

const NIBBLE_MASK: u64 = 0xF;

/// Paper target categories in their packed order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperCategory {
    Alphas,
    Bravos,
    Charlies,
    Deltas,
    NoShoots,
    Misses,
    NoPenaltyMisses,
}

impl PaperCategory {
    pub const ALL: [PaperCategory; 7] = [
        PaperCategory::Alphas,
        PaperCategory::Bravos,
        PaperCategory::Charlies,
        PaperCategory::Deltas,
        PaperCategory::NoShoots,
        PaperCategory::Misses,
        PaperCategory::NoPenaltyMisses,
    ];

    fn slot(self) -> u32 {
        self as u32
    }

    /// Shift of this category's counter in the first group
    pub fn first_shift(self) -> u32 {
        self.slot() * NIBBLE_BITS
    }

    /// Shift of this category's counter in the second group
    pub fn second_shift(self) -> u32 {
        SECOND_GROUP_SHIFT + self.slot() * NIBBLE_BITS
    }

    /// Sum of both groups' counters for this category in one record
    pub fn extract(self, record: u64) -> u32 {
        let first = (record >> self.first_shift()) & NIBBLE_MASK;
        let second = (record >> self.second_shift()) & NIBBLE_MASK;
        (first + second) as u32
    }
}

/// Paper target counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScorePaper {
    pub alphas: u32,
    pub bravos: u32,
    pub charlies: u32,
    pub deltas: u32,
    pub no_shoots: u32,
    pub misses: u32,
    pub no_penalty_misses: u32,
}

impl ScorePaper {
    pub fn get(&self, category: PaperCategory) -> u32 {
        match category {
            PaperCategory::Alphas => self.alphas,
            PaperCategory::Bravos => self.bravos,
            PaperCategory::Charlies => self.charlies,
            PaperCategory::Deltas => self.deltas,
            PaperCategory::NoShoots => self.no_shoots,
            PaperCategory::Misses => self.misses,
            PaperCategory::NoPenaltyMisses => self.no_penalty_misses,
        }
    }

    fn slot_mut(&mut self, category: PaperCategory) -> &mut u32 {
        match category {
            PaperCategory::Alphas => &mut self.alphas,
            PaperCategory::Bravos => &mut self.bravos,
            PaperCategory::Charlies => &mut self.charlies,
            PaperCategory::Deltas => &mut self.deltas,
            PaperCategory::NoShoots => &mut self.no_shoots,
            PaperCategory::Misses => &mut self.misses,
            PaperCategory::NoPenaltyMisses => &mut self.no_penalty_misses,
        }
    }

    /// Hits that scored (A + B + C + D)
    pub fn scoring_hits(&self) -> u32 {
        self.alphas + self.bravos + self.charlies + self.deltas
    }
}

impl AddAssign for ScorePaper {
    fn add_assign(&mut self, rhs: Self) {
        for category in PaperCategory::ALL {
            *self.slot_mut(category) += rhs.get(category);
        }
    }
}

impl Add for ScorePaper {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

/// Decode packed per-shot records into paper counters.
///
/// An empty slice yields all-zero counters.
pub fn decode(records: &[u64]) -> ScorePaper {
    let mut score = ScorePaper::default();
    for &record in records {
        for category in PaperCategory::ALL {
            *score.slot_mut(category) += category.extract(record);
        }
    }
    score
}

/// Steel target counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreSteel {
    pub hits: u32,
    pub misses: u32,
    pub no_shoots: u32,
    pub no_penalty_misses: u32,
}

impl AddAssign for ScoreSteel {
    fn add_assign(&mut self, rhs: Self) {
        self.hits += rhs.hits;
        self.misses += rhs.misses;
        self.no_shoots += rhs.no_shoots;
        self.no_penalty_misses += rhs.no_penalty_misses;
    }
}

/// Penalties assessed outside target scoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScorePenalties {
    pub procedurals: u32,
}

/// Combined score for one stage or a whole match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Score {
    pub paper: ScorePaper,
    pub steel: ScoreSteel,
    pub penalties: ScorePenalties,
}

impl Score {
    pub fn misses(&self) -> u32 {
        self.paper.misses + self.steel.misses
    }

    pub fn no_shoots(&self) -> u32 {
        self.paper.no_shoots + self.steel.no_shoots
    }

    pub fn no_penalty_misses(&self) -> u32 {
        self.paper.no_penalty_misses + self.steel.no_penalty_misses
    }

    /// Misses and no-shoots on either target type plus procedurals
    pub fn penalty_count(&self) -> u32 {
        self.misses() + self.no_shoots() + self.penalties.procedurals
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, rhs: Self) {
        self.paper += rhs.paper;
        self.steel += rhs.steel;
        self.penalties.procedurals += rhs.penalties.procedurals;
    }
}

impl Sum for Score {
    fn sum<I: Iterator<Item = Score>>(iter: I) -> Self {
        iter.fold(Score::default(), |mut acc, score| {
            acc += score;
            acc
        })
    }
}

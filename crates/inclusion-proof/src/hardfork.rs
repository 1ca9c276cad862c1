// Copyright 2024-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::error::ScheduleError;

/// Ethereum mainnet protocol rulesets, in activation order.
///
/// The order matters: comparisons between variants answer "is this fork at least as
/// recent as that one", which is how header layouts are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hardfork {
    /// genesis rules
    Frontier,
    /// homestead
    Homestead,
    /// dao fork
    Dao,
    /// tangerine whistle
    TangerineWhistle,
    /// spurious dragon
    SpuriousDragon,
    /// byzantium
    Byzantium,
    /// constantinople and petersburg, activated at the same block
    Petersburg,
    /// istanbul
    Istanbul,
    /// muir glacier
    MuirGlacier,
    /// berlin
    Berlin,
    /// london, adds `baseFeePerGas`
    London,
    /// arrow glacier
    ArrowGlacier,
    /// gray glacier
    GrayGlacier,
    /// the merge
    Paris,
    /// shanghai, adds `withdrawalsRoot`
    Shanghai,
    /// cancun, adds blob gas fields and `parentBeaconBlockRoot`
    Cancun,
    /// prague, adds `requestsHash`
    Prague,
    /// osaka, same header layout as prague
    Osaka,
}

impl Hardfork {
    /// Name of the ruleset as used by common client tooling.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Frontier => "frontier",
            Self::Homestead => "homestead",
            Self::Dao => "dao",
            Self::TangerineWhistle => "tangerineWhistle",
            Self::SpuriousDragon => "spuriousDragon",
            Self::Byzantium => "byzantium",
            Self::Petersburg => "petersburg",
            Self::Istanbul => "istanbul",
            Self::MuirGlacier => "muirGlacier",
            Self::Berlin => "berlin",
            Self::London => "london",
            Self::ArrowGlacier => "arrowGlacier",
            Self::GrayGlacier => "grayGlacier",
            Self::Paris => "paris",
            Self::Shanghai => "shanghai",
            Self::Cancun => "cancun",
            Self::Prague => "prague",
            Self::Osaka => "osaka",
        }
    }

    /// Number of post-frontier header fields this ruleset makes canonical.
    ///
    /// Those fields are appended after `nonce` in a fixed order: `baseFeePerGas`,
    /// `withdrawalsRoot`, `blobGasUsed`, `excessBlobGas`, `parentBeaconBlockRoot`,
    /// `requestsHash`.
    pub fn trailing_header_fields(self) -> usize {
        if self >= Self::Prague {
            6
        } else if self >= Self::Cancun {
            5
        } else if self >= Self::Shanghai {
            2
        } else if self >= Self::London {
            1
        } else {
            0
        }
    }

    /// Whether `withdrawalsRoot` is part of the canonical header.
    pub fn has_withdrawals_root(self) -> bool {
        self >= Self::Shanghai
    }
}

impl fmt::Display for Hardfork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Activation table for ethereum mainnet, by block number.
///
/// New forks are added by appending a row.
pub const MAINNET_HARDFORKS: &[(u64, Hardfork)] = &[
    (0, Hardfork::Frontier),
    (1_150_000, Hardfork::Homestead),
    (1_920_000, Hardfork::Dao),
    (2_463_000, Hardfork::TangerineWhistle),
    (2_675_000, Hardfork::SpuriousDragon),
    (4_370_000, Hardfork::Byzantium),
    (7_280_000, Hardfork::Petersburg),
    (9_069_000, Hardfork::Istanbul),
    (9_200_000, Hardfork::MuirGlacier),
    (12_244_000, Hardfork::Berlin),
    (12_965_000, Hardfork::London),
    (13_773_000, Hardfork::ArrowGlacier),
    (15_050_000, Hardfork::GrayGlacier),
    (15_537_394, Hardfork::Paris),
    (17_034_870, Hardfork::Shanghai),
    (19_426_587, Hardfork::Cancun),
    (22_431_084, Hardfork::Prague),
    (23_935_694, Hardfork::Osaka),
];

/// Ordered `(activation block, hardfork)` table resolving block numbers to rulesets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardforkSchedule {
    rows: Vec<(u64, Hardfork)>,
}

impl HardforkSchedule {
    /// Builds a schedule from rows sorted by activation block.
    ///
    /// The first row must activate at block 0 so every block number resolves, and
    /// activation blocks must be strictly increasing.
    pub fn new(rows: Vec<(u64, Hardfork)>) -> Result<Self, ScheduleError> {
        match rows.first() {
            None => return Err(ScheduleError::Empty),
            Some((first, _)) if *first != 0 => return Err(ScheduleError::NoGenesisRow(*first)),
            Some(_) => {}
        }

        if let Some(pair) = rows.windows(2).find(|pair| pair[1].0 <= pair[0].0) {
            return Err(ScheduleError::Unordered {
                previous: pair[0].0,
                next: pair[1].0,
            });
        }

        Ok(Self { rows })
    }

    /// Ethereum mainnet schedule.
    pub fn mainnet() -> Self {
        Self {
            rows: MAINNET_HARDFORKS.to_vec(),
        }
    }

    /// Returns the ruleset active at `block_number`: the row with the greatest
    /// activation block not above it.
    pub fn resolve(&self, block_number: u64) -> Hardfork {
        let idx = self
            .rows
            .partition_point(|(activation, _)| *activation <= block_number);
        // row 0 activates at block 0, so idx >= 1
        self.rows[idx.saturating_sub(1)].1
    }

    /// Rows of the schedule.
    pub fn rows(&self) -> &[(u64, Hardfork)] {
        &self.rows
    }
}

impl Default for HardforkSchedule {
    fn default() -> Self {
        Self::mainnet()
    }
}

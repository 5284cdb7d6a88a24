use thiserror::Error;

/// Errors raised when a region or bin number does not fit a binning scheme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinningError {
    /// Region starts before position 1 or ends past the largest position.
    #[error("genomic region {begin}-{end} is out of range (maximum position is {max_position})")]
    PositionOutOfRange {
        /// First position of the region (1-based).
        begin: u32,
        /// Last position of the region (1-based, inclusive).
        end: u32,
        /// Largest position addressable by the scheme.
        max_position: u64,
    },

    /// Region whose first position lies after its last position.
    #[error("invalid genomic region {begin}-{end}: begin lies after end")]
    InvalidInterval {
        /// First position of the region.
        begin: u32,
        /// Last position of the region.
        end: u32,
    },

    /// Scheme parameters that do not describe a usable partition.
    #[error("invalid binning scheme: first shift {first_shift}, next shift {next_shift}, {levels} levels")]
    InvalidScheme {
        /// log2 of the finest bin size.
        first_shift: u32,
        /// log2 of the size ratio between levels.
        next_shift: u32,
        /// Number of levels.
        levels: u32,
    },

    /// Bin number larger than any bin of the scheme.
    #[error("invalid bin number {bin} (maximum bin number is {max_bin})")]
    BinOutOfRange {
        /// Requested bin.
        bin: u32,
        /// Largest bin of the scheme.
        max_bin: u32,
    },
}

/// Fixed hierarchical partition of a chromosome into nested bins.
///
/// Level 0 is a single bin spanning the whole addressable range. Every next
/// level splits each bin of its parent into `2^next_shift` children, down to
/// the finest level whose bins hold `2^first_shift` positions. Bin numbers are
/// made unique across levels by adding a per-level offset equal to the number
/// of bins in all coarser levels.
///
/// All positions are 1-based and inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "SchemeParams"))]
pub struct BinningScheme {
    first_shift: u32,
    next_shift: u32,
    levels: u32,
}

/// Unchecked scheme parameters, as read from configuration.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct SchemeParams {
    first_shift: u32,
    next_shift: u32,
    levels: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<SchemeParams> for BinningScheme {
    type Error = BinningError;

    fn try_from(params: SchemeParams) -> Result<Self, Self::Error> {
        Self::new(params.first_shift, params.next_shift, params.levels)
    }
}

/// Largest total shift: positions are 32-bit.
const MAX_TOTAL_SHIFT: u32 = 32;

impl BinningScheme {
    /// Scheme with finest bins of `2^first_shift` positions, `2^next_shift`
    /// children per bin and `levels` levels.
    ///
    /// The coarsest bin must not span more than 2^32 positions, every level
    /// must be finer than its parent and every bin number must fit in a `u32`.
    ///
    /// ```
    /// use varda::binning::BinningScheme;
    ///
    /// assert_eq!(BinningScheme::new(17, 3, 5).unwrap(), BinningScheme::UCSC);
    /// assert!(BinningScheme::new(17, 3, 0).is_err());
    /// ```
    pub fn new(first_shift: u32, next_shift: u32, levels: u32) -> Result<Self, BinningError> {
        let invalid = BinningError::InvalidScheme {
            first_shift,
            next_shift,
            levels,
        };
        let total_shift = levels
            .checked_sub(1)
            .and_then(|coarser| next_shift.checked_mul(coarser))
            .and_then(|shift| shift.checked_add(first_shift))
            .ok_or_else(|| invalid.clone())?;
        let repeats_level = next_shift == 0 && levels > 1;
        if total_shift > MAX_TOTAL_SHIFT || next_shift > MAX_TOTAL_SHIFT || repeats_level {
            return Err(invalid);
        }

        let scheme = Self {
            first_shift,
            next_shift,
            levels,
        };
        let finest_bins = 1u64 << (total_shift - first_shift);
        if scheme.level_offset(levels - 1) + finest_bins - 1 > u64::from(u32::MAX) {
            return Err(invalid);
        }
        Ok(scheme)
    }

    /// log2 of the finest bin size.
    pub fn first_shift(&self) -> u32 {
        self.first_shift
    }

    /// log2 of the size ratio between consecutive levels.
    pub fn next_shift(&self) -> u32 {
        self.next_shift
    }

    /// Number of levels, coarsest included.
    pub fn levels(&self) -> u32 {
        self.levels
    }

    /// Standard UCSC Genome Browser scheme: 128 kb finest bins, ratio 8,
    /// five levels (offsets 585, 73, 9, 1, 0), positions up to 2^29.
    pub const UCSC: Self = Self {
        first_shift: 17,
        next_shift: 3,
        levels: 5,
    };

    /// UCSC scheme with one extra coarse level, addressing positions up to 2^32.
    pub const EXTENDED: Self = Self {
        first_shift: 17,
        next_shift: 3,
        levels: 6,
    };

    /// Largest position (1-based, inclusive) the scheme can bin.
    pub fn max_position(&self) -> u64 {
        1u64 << (self.first_shift + self.next_shift * (self.levels - 1))
    }

    /// Largest bin number of the scheme (last bin of the finest level).
    pub fn max_bin(&self) -> u32 {
        let finest = self.level_offset(self.levels - 1);
        (finest + ((self.max_position() - 1) >> self.first_shift)) as u32
    }

    /// Offset added to bin numbers at `level` (0 = coarsest).
    fn level_offset(&self, level: u32) -> u64 {
        let fanout = 1u64 << self.next_shift;
        (0..level).map(|depth| fanout.pow(depth)).sum()
    }

    fn check(&self, begin: u32, end: u32) -> Result<(), BinningError> {
        if begin > end {
            return Err(BinningError::InvalidInterval { begin, end });
        }
        if begin < 1 || u64::from(end) > self.max_position() {
            return Err(BinningError::PositionOutOfRange {
                begin,
                end,
                max_position: self.max_position(),
            });
        }
        Ok(())
    }

    /// First and last bin overlapping `begin..=end` for every level, finest
    /// level first.
    pub fn range_per_level(&self, begin: u32, end: u32) -> Result<Vec<(u32, u32)>, BinningError> {
        self.check(begin, end)?;

        let mut first = u64::from(begin - 1) >> self.first_shift;
        let mut last = u64::from(end - 1) >> self.first_shift;
        let mut ranges = Vec::with_capacity(self.levels as usize);

        for level in (0..self.levels).rev() {
            let offset = self.level_offset(level);
            ranges.push(((offset + first) as u32, (offset + last) as u32));
            first >>= self.next_shift;
            last >>= self.next_shift;
        }

        Ok(ranges)
    }

    /// Smallest bin fully containing `begin..=end`.
    pub fn assign_bin(&self, begin: u32, end: u32) -> Result<u32, BinningError> {
        let ranges = self.range_per_level(begin, end)?;
        // The coarsest level is a single bin (number 0), so a match always exists.
        Ok(ranges
            .into_iter()
            .find(|(first, last)| first == last)
            .map(|(bin, _)| bin)
            .unwrap_or(0))
    }

    /// Every bin overlapping `begin..=end`, ordered by level (finest first)
    /// and ascending within a level.
    ///
    /// Stored regions binned with [`assign_bin`](Self::assign_bin) can only
    /// overlap the query if their bin is in this list.
    pub fn all_bins(&self, begin: u32, end: u32) -> Result<Vec<u32>, BinningError> {
        Ok(self
            .range_per_level(begin, end)?
            .into_iter()
            .flat_map(|(first, last)| first..=last)
            .collect())
    }

    /// Bins fully containing `begin..=end`: the bin returned by
    /// [`assign_bin`](Self::assign_bin) followed by all of its ancestors.
    pub fn containing_bins(&self, begin: u32, end: u32) -> Result<Vec<u32>, BinningError> {
        Ok(self
            .range_per_level(begin, end)?
            .into_iter()
            .filter(|(first, last)| first == last)
            .map(|(bin, _)| bin)
            .collect())
    }

    /// Region covered by `bin` as `(begin, end)`, 1-based inclusive.
    ///
    /// The end is capped at `u32::MAX` for the coarsest bins of schemes whose
    /// range exceeds 32-bit positions.
    pub fn covered_region(&self, bin: u32) -> Result<(u32, u32), BinningError> {
        if bin > self.max_bin() {
            return Err(BinningError::BinOutOfRange {
                bin,
                max_bin: self.max_bin(),
            });
        }

        let bin = u64::from(bin);
        let mut shift = self.first_shift;
        for level in (0..self.levels).rev() {
            let offset = self.level_offset(level);
            if offset <= bin {
                let begin = ((bin - offset) << shift) + 1;
                let end = (bin + 1 - offset) << shift;
                return Ok((
                    u32::try_from(begin).unwrap_or(u32::MAX),
                    u32::try_from(end).unwrap_or(u32::MAX),
                ));
            }
            shift += self.next_shift;
        }

        // Offset of the coarsest level is 0, the loop always returns.
        Err(BinningError::BinOutOfRange {
            bin: bin as u32,
            max_bin: self.max_bin(),
        })
    }
}

impl Default for BinningScheme {
    fn default() -> Self {
        Self::UCSC
    }
}

/// [`BinningScheme::assign_bin`] under the UCSC scheme.
pub fn assign_bin(begin: u32, end: u32) -> Result<u32, BinningError> {
    BinningScheme::UCSC.assign_bin(begin, end)
}

/// [`BinningScheme::all_bins`] under the UCSC scheme.
pub fn all_bins(begin: u32, end: u32) -> Result<Vec<u32>, BinningError> {
    BinningScheme::UCSC.all_bins(begin, end)
}

/// [`BinningScheme::containing_bins`] under the UCSC scheme.
pub fn containing_bins(begin: u32, end: u32) -> Result<Vec<u32>, BinningError> {
    BinningScheme::UCSC.containing_bins(begin, end)
}

/// [`BinningScheme::covered_region`] under the UCSC scheme.
pub fn covered_region(bin: u32) -> Result<(u32, u32), BinningError> {
    BinningScheme::UCSC.covered_region(bin)
}

use crate::error::CoreError;
use crate::frame::Sample;

/// 10 caractères, table par défaut, du plus sombre au plus clair.
pub const TABLE_SIMPLE: &str = " .:-=+*#%@";

/// Paul Bourke, résolution étendue (`--complex`).
pub const TABLE_DETAILED: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Ordered density buckets, darkest → lightest.
///
/// # Example
/// ```
/// use pc_core::charset::CharacterTable;
/// let table = CharacterTable::simple();
/// assert_eq!(table.len(), 10);
/// assert_eq!(table.glyph(5), '+');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterTable {
    glyphs: Vec<char>,
}

impl CharacterTable {
    /// The built-in 10-entry ramp.
    #[must_use]
    pub fn simple() -> Self {
        Self {
            glyphs: TABLE_SIMPLE.chars().collect(),
        }
    }

    /// The built-in extended ramp.
    #[must_use]
    pub fn detailed() -> Self {
        Self {
            glyphs: TABLE_DETAILED.chars().collect(),
        }
    }

    /// User-supplied ramp, one bucket per character.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidCustomMap`] if the map has fewer than 2 distinct characters.
    ///
    /// # Example
    /// ```
    /// use pc_core::charset::CharacterTable;
    /// assert!(CharacterTable::custom(" @").is_ok());
    /// assert!(CharacterTable::custom("@").is_err());
    /// assert!(CharacterTable::custom("@@@").is_err());
    /// ```
    pub fn custom(map: &str) -> Result<Self, CoreError> {
        let glyphs: Vec<char> = map.chars().collect();
        let mut distinct = glyphs.clone();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(CoreError::InvalidCustomMap(map.to_string()));
        }
        Ok(Self { glyphs })
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always false: construction guarantees at least 2 buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Glyph of bucket `index`.
    #[inline]
    #[must_use]
    pub fn glyph(&self, index: usize) -> char {
        self.glyphs[index.min(self.glyphs.len() - 1)]
    }

    /// All glyphs, darkest first.
    #[must_use]
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    /// Bucket index for a sample: `floor(density / max * len)`, clamped.
    ///
    /// # Example
    /// ```
    /// use pc_core::charset::CharacterTable;
    /// use pc_core::frame::Sample;
    /// let table = CharacterTable::simple();
    /// assert_eq!(table.bucket(&Sample::from_pixel(0, 0, 0)), 0);
    /// assert_eq!(table.bucket(&Sample::from_pixel(255, 255, 255)), 9);
    /// ```
    #[inline]
    #[must_use]
    pub fn bucket(&self, sample: &Sample) -> usize {
        let len = self.glyphs.len();
        if sample.density >= sample.depth.max() {
            return len - 1;
        }
        ((sample.fraction() * len as f64) as usize).min(len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detailed_table_is_ordered_ramp() {
        let t = CharacterTable::detailed();
        assert_eq!(t.glyph(0), ' ');
        assert_eq!(t.glyph(t.len() - 1), '$');
        assert!(t.len() >= 69);
    }

    #[test]
    fn two_entry_map_reaches_only_both_ends() {
        let t = CharacterTable::custom(" @").unwrap();
        assert_eq!(t.bucket(&Sample::from_pixel(0, 0, 0)), 0);
        assert_eq!(t.bucket(&Sample::from_pixel(255, 255, 255)), 1);
        for v in 0..=255u8 {
            assert!(t.bucket(&Sample::from_pixel(v, v, v)) <= 1);
        }
    }

    #[test]
    fn mid_gray_lands_in_bucket_five() {
        let t = CharacterTable::simple();
        let idx = t.bucket(&Sample::from_pixel(128, 128, 128));
        assert_eq!(idx, 5);
        assert_eq!(t.glyph(idx), '+');
    }

    #[test]
    fn buckets_are_monotonic() {
        let t = CharacterTable::detailed();
        let mut prev = 0;
        for v in 0..=255u8 {
            let idx = t.bucket(&Sample::from_pixel(v, v, v));
            assert!(idx >= prev, "bucket non monotone à {v}");
            prev = idx;
        }
    }
}

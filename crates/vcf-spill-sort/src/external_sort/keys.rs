use std::cmp::Ordering;

/// Maps a chromosome name onto a total order.
///
/// An optional case-insensitive `chr` prefix is stripped. Numeric names sort
/// by their value, the conventional sex/mitochondrial names follow, and any
/// remaining contig falls back to a stable hash of its upper-cased name. The
/// hash fallback is deterministic but carries no biological meaning.
pub fn chrom_key(chrom: &str) -> u64 {
    let normalised = chrom.to_ascii_uppercase();
    let trimmed = normalised.strip_prefix("CHR").unwrap_or(&normalised);

    if let Ok(num) = trimmed.parse::<u64>() {
        return num;
    }

    match trimmed {
        "X" => 100,
        "Y" => 101,
        "M" | "MT" => 102,
        _ => 1000_u64.wrapping_add(u64::from(stable_hash32(trimmed))),
    }
}

fn stable_hash32(s: &str) -> u32 {
    let mut hash: u32 = 0;
    for ch in s.chars() {
        hash = hash.wrapping_mul(31).wrapping_add(ch as u32);
    }
    hash
}

/// Position component of a sort key.
///
/// Compares numerically when both sides parse as integers, lexicographically
/// otherwise, so a chunk containing a malformed position still has a total
/// order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PosOrd {
    text: String,
    numeric: Option<i64>,
}

impl PosOrd {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let numeric = text.parse::<i64>().ok();
        Self { text, numeric }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Ord for PosOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric, other.numeric) {
            (Some(left), Some(right)) => {
                left.cmp(&right).then_with(|| self.text.cmp(&other.text))
            }
            _ => self.text.cmp(&other.text),
        }
    }
}

impl PartialOrd for PosOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct SortKey {
    pub chrom: u64,
    pub pos: PosOrd,
}

impl SortKey {
    pub fn new(chrom: &str, pos: &str) -> Self {
        Self {
            chrom: chrom_key(chrom),
            pos: PosOrd::new(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chrom_key_orders_numeric_chromosomes_by_value() {
        assert!(chrom_key("1") < chrom_key("2"));
        assert!(chrom_key("2") < chrom_key("10"));
        assert!(chrom_key("10") < chrom_key("22"));
    }

    #[test]
    fn chrom_key_strips_chr_prefix_case_insensitively() {
        assert_eq!(chrom_key("chr7"), chrom_key("7"));
        assert_eq!(chrom_key("CHR7"), chrom_key("7"));
        assert_eq!(chrom_key("ChrX"), chrom_key("X"));
    }

    #[test]
    fn chrom_key_places_special_chromosomes_after_autosomes() {
        assert_eq!(chrom_key("X"), 100);
        assert_eq!(chrom_key("Y"), 101);
        assert_eq!(chrom_key("MT"), 102);
        assert_eq!(chrom_key("M"), 102);
        assert!(chrom_key("22") < chrom_key("X"));
        assert!(chrom_key("X") < chrom_key("Y"));
        assert!(chrom_key("Y") < chrom_key("chrMT"));
    }

    #[test]
    fn chrom_key_hash_fallback_is_deterministic_and_out_of_band() {
        let key = chrom_key("GL000192.1");
        assert_eq!(key, chrom_key("gl000192.1"));
        assert!(key >= 1000);
        assert_ne!(key, chrom_key("GL000193.1"));
    }

    #[test]
    fn scenario_chromosome_ordering() {
        let mut chroms = vec!["2", "10", "X", "1", "chrMT"];
        chroms.sort_by_key(|chrom| chrom_key(chrom));
        assert_eq!(chroms, vec!["1", "2", "10", "X", "chrMT"]);
    }

    #[test]
    fn pos_ord_compares_numerically_when_both_parse() {
        assert!(PosOrd::new("9") < PosOrd::new("10"));
        assert!(PosOrd::new("100") < PosOrd::new("1000"));
    }

    #[test]
    fn pos_ord_falls_back_to_lexicographic_comparison() {
        assert!(PosOrd::new("10") < PosOrd::new("a9"));
        assert!(PosOrd::new("abc") < PosOrd::new("abd"));
    }

    #[test]
    fn sort_key_orders_by_chromosome_then_position() {
        let early = SortKey::new("1", "5000");
        let later_pos = SortKey::new("1", "6000");
        let later_chrom = SortKey::new("2", "1");
        assert!(early < later_pos);
        assert!(later_pos < later_chrom);
    }
}

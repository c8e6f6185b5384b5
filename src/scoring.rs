//! Window scoring.
//!
//! An [`Aggregator`] consumes the records matched by one window, one at a
//! time, and reduces them to a [`ScoreResult`]. It returns None when no
//! record contributed ("no data"); the caller decides whether such a window
//! is dropped or printed as a placeholder.

use crate::attribute;
use crate::config::ConfigError;
use crate::gff::GffRecord;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Scoring schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// `c / (c + t)` over the `c=` and `t=` attribute tags.
    Methylation,
    /// Mean and sample variance of the score column.
    Average,
    /// Sum of the score column, missing scores counting as 1.
    Sum,
    /// Per-position base frequencies of the `seq=` attribute tag.
    SequenceFrequency,
}

impl Scheme {
    pub fn name(&self) -> &'static str {
        match self {
            Scheme::Methylation => "meth",
            Scheme::Average => "average",
            Scheme::Sum => "sum",
            Scheme::SequenceFrequency => "seq",
        }
    }
}

impl FromStr for Scheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "meth" | "methylation" => Ok(Scheme::Methylation),
            "average" | "avg" => Ok(Scheme::Average),
            "sum" => Ok(Scheme::Sum),
            "seq" | "sequence" => Ok(Scheme::SequenceFrequency),
            _ => Err(ConfigError::UnknownScheme(s.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value in a score result.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(u64),
    Float(f64),
    Text(String),
}

/// Outcome of scoring one window.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    /// None when no record carried a score.
    pub score: Option<f64>,
    /// Attribute fields, ordered by key.
    pub fields: BTreeMap<String, FieldValue>,
}

impl ScoreResult {
    fn new(score: Option<f64>) -> Self {
        Self {
            score,
            fields: BTreeMap::new(),
        }
    }

    fn with(mut self, key: &str, value: FieldValue) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }
}

/// Common contract of the per-scheme accumulators.
pub trait WindowScorer {
    /// Account for one matched record.
    fn push(&mut self, record: &GffRecord);

    /// Reduce to a result, or None if nothing contributed.
    fn finish(self) -> Option<ScoreResult>;
}

/// Single-pass mean and variance (Welford).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    n: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, x: f64) {
        let count = self.n as f64 + 1.0;
        let delta = x - self.mean;
        self.mean += delta / count;
        self.m2 += delta * (x - self.mean);
        self.n += 1;
    }

    pub fn count(&self) -> u64 {
        self.n
    }

    pub fn mean(&self) -> Option<f64> {
        (self.n > 0).then_some(self.mean)
    }

    /// Sample variance (n - 1 denominator), defined once n > 1.
    pub fn variance(&self) -> Option<f64> {
        (self.n > 1).then(|| self.m2 / (self.n - 1) as f64)
    }

    pub fn std_dev(&self) -> Option<f64> {
        self.variance().map(f64::sqrt)
    }
}

/// Fraction of methylated reads: `c / (c + t)`. Counts saturate at `u64::MAX`.
#[derive(Debug, Clone, Default)]
pub struct MethylationScore {
    c: u64,
    t: u64,
    n: u64,
}

impl WindowScorer for MethylationScore {
    fn push(&mut self, record: &GffRecord) {
        let c = attribute::get_u64(&record.attribute, "c").unwrap_or(0);
        let t = attribute::get_u64(&record.attribute, "t").unwrap_or(0);
        self.c = self.c.saturating_add(c);
        self.t = self.t.saturating_add(t);
        self.n += 1;
    }

    fn finish(self) -> Option<ScoreResult> {
        let total = self.c.saturating_add(self.t);
        if self.n == 0 || total == 0 {
            return None;
        }
        let score = self.c as f64 / total as f64;
        Some(
            ScoreResult::new(Some(score))
                .with("c", FieldValue::Int(self.c))
                .with("t", FieldValue::Int(self.t))
                .with("n", FieldValue::Int(self.n)),
        )
    }
}

/// Sum of scores. With `reverse`, the count is reported as the score and
/// the sum as `n`.
#[derive(Debug, Clone, Default)]
pub struct SumScore {
    sum: f64,
    n: u64,
    reverse: bool,
}

impl SumScore {
    pub fn new(reverse: bool) -> Self {
        Self {
            reverse,
            ..Self::default()
        }
    }
}

impl WindowScorer for SumScore {
    fn push(&mut self, record: &GffRecord) {
        self.sum += record.score.unwrap_or(1.0);
        self.n += 1;
    }

    fn finish(self) -> Option<ScoreResult> {
        if self.n == 0 {
            return None;
        }
        let result = if self.reverse {
            ScoreResult::new(Some(self.n as f64)).with("n", FieldValue::Float(self.sum))
        } else {
            ScoreResult::new(Some(self.sum)).with("n", FieldValue::Int(self.n))
        };
        Some(result)
    }
}

/// Mean of scores, with sample variance and standard deviation.
#[derive(Debug, Clone, Default)]
pub struct AverageScore {
    stats: RunningStats,
}

impl WindowScorer for AverageScore {
    fn push(&mut self, record: &GffRecord) {
        if let Some(score) = record.score {
            self.stats.push(score);
        }
    }

    fn finish(self) -> Option<ScoreResult> {
        let mean = self.stats.mean()?;
        let mut result =
            ScoreResult::new(Some(mean)).with("n", FieldValue::Int(self.stats.count()));
        if let (Some(var), Some(std)) = (self.stats.variance(), self.stats.std_dev()) {
            result = result
                .with("var", FieldValue::Float(var))
                .with("std", FieldValue::Float(std));
        }
        Some(result)
    }
}

const BASES: [char; 4] = ['a', 'c', 'g', 't'];

/// Key for symbols outside `acgt`.
const OTHER: &str = "other";

/// Per-position base composition of the `seq=` tag, plus the mean score.
#[derive(Debug, Clone, Default)]
pub struct SequenceFrequencyScore {
    positions: Vec<BTreeMap<&'static str, u64>>,
    stats: RunningStats,
    n: u64,
}

impl SequenceFrequencyScore {
    fn symbol_key(base: char) -> &'static str {
        match base.to_ascii_lowercase() {
            'a' => "a",
            'c' => "c",
            'g' => "g",
            't' => "t",
            _ => OTHER,
        }
    }
}

impl WindowScorer for SequenceFrequencyScore {
    fn push(&mut self, record: &GffRecord) {
        self.n += 1;
        if let Some(score) = record.score {
            self.stats.push(score);
        }
        let Some(seq) = attribute::get(&record.attribute, "seq") else {
            return;
        };
        for (i, base) in seq.chars().enumerate() {
            if i == self.positions.len() {
                let mut counts = BTreeMap::new();
                for b in BASES {
                    counts.insert(Self::symbol_key(b), 0);
                }
                self.positions.push(counts);
            }
            *self.positions[i].entry(Self::symbol_key(base)).or_insert(0) += 1;
        }
    }

    fn finish(self) -> Option<ScoreResult> {
        if self.n == 0 {
            return None;
        }
        let mut result = ScoreResult::new(self.stats.mean()).with("n", FieldValue::Int(self.n));

        let mut symbols: Vec<&'static str> = Vec::new();
        for counts in &self.positions {
            for key in counts.keys() {
                if !symbols.contains(key) {
                    symbols.push(*key);
                }
            }
        }

        let mut buf = ryu::Buffer::new();
        for symbol in symbols {
            let freqs: Vec<String> = self
                .positions
                .iter()
                .map(|counts| {
                    let total: u64 = counts.values().sum();
                    let count = counts.get(symbol).copied().unwrap_or(0);
                    let freq = if total == 0 {
                        0.0
                    } else {
                        count as f64 / total as f64
                    };
                    buf.format(freq).to_string()
                })
                .collect();
            result = result.with(symbol, FieldValue::Text(freqs.join(",")));
        }
        Some(result)
    }
}

/// The accumulator selected by a [`Scheme`].
#[derive(Debug, Clone)]
pub enum Aggregator {
    Methylation(MethylationScore),
    Sum(SumScore),
    Average(AverageScore),
    SequenceFrequency(SequenceFrequencyScore),
}

impl Aggregator {
    pub fn new(scheme: Scheme, reverse: bool) -> Self {
        match scheme {
            Scheme::Methylation => Aggregator::Methylation(MethylationScore::default()),
            Scheme::Sum => Aggregator::Sum(SumScore::new(reverse)),
            Scheme::Average => Aggregator::Average(AverageScore::default()),
            Scheme::SequenceFrequency => {
                Aggregator::SequenceFrequency(SequenceFrequencyScore::default())
            }
        }
    }

    /// Score a complete record sequence.
    pub fn score<'a, I>(scheme: Scheme, reverse: bool, records: I) -> Option<ScoreResult>
    where
        I: IntoIterator<Item = &'a GffRecord>,
    {
        let mut aggregator = Self::new(scheme, reverse);
        for record in records {
            aggregator.push(record);
        }
        aggregator.finish()
    }
}

impl WindowScorer for Aggregator {
    fn push(&mut self, record: &GffRecord) {
        match self {
            Aggregator::Methylation(s) => s.push(record),
            Aggregator::Sum(s) => s.push(record),
            Aggregator::Average(s) => s.push(record),
            Aggregator::SequenceFrequency(s) => s.push(record),
        }
    }

    fn finish(self) -> Option<ScoreResult> {
        match self {
            Aggregator::Methylation(s) => s.finish(),
            Aggregator::Sum(s) => s.finish(),
            Aggregator::Average(s) => s.finish(),
            Aggregator::SequenceFrequency(s) => s.finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gff::parse_record;

    fn rec(score: &str, attribute: &str) -> GffRecord {
        parse_record(&format!("chr1\ts\tf\t1\t1\t{}\t+\t.\t{}", score, attribute)).unwrap()
    }

    fn float(result: &ScoreResult, key: &str) -> f64 {
        match result.get(key) {
            Some(FieldValue::Float(v)) => *v,
            other => panic!("{} is not a float: {:?}", key, other),
        }
    }

    fn text<'a>(result: &'a ScoreResult, key: &str) -> &'a str {
        match result.get(key) {
            Some(FieldValue::Text(v)) => v,
            other => panic!("{} is not text: {:?}", key, other),
        }
    }

    #[test]
    fn test_scheme_names() {
        assert_eq!("meth".parse::<Scheme>(), Ok(Scheme::Methylation));
        assert_eq!("AVG".parse::<Scheme>(), Ok(Scheme::Average));
        assert_eq!("sum".parse::<Scheme>(), Ok(Scheme::Sum));
        assert_eq!("seq".parse::<Scheme>(), Ok(Scheme::SequenceFrequency));
        assert_eq!(
            "median".parse::<Scheme>(),
            Err(ConfigError::UnknownScheme("median".to_string()))
        );
        assert_eq!(Scheme::Average.to_string(), "average");
    }

    #[test]
    fn test_running_stats_welford() {
        let mut stats = RunningStats::new();
        for x in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.push(x);
        }
        assert_eq!(stats.count(), 8);
        assert!((stats.mean().unwrap() - 5.0).abs() < 1e-12);
        // Two-pass: sum of squared deviations 32, over n - 1 = 7.
        assert!((stats.variance().unwrap() - 32.0 / 7.0).abs() < 1e-12);
        assert!((stats.std_dev().unwrap() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_running_stats_single_value() {
        let mut stats = RunningStats::new();
        assert_eq!(stats.mean(), None);
        stats.push(3.0);
        assert_eq!(stats.mean(), Some(3.0));
        assert_eq!(stats.variance(), None);
    }

    #[test]
    fn test_methylation() {
        let records = [rec(".", "c=3; t=1"), rec(".", "c=1; t=5"), rec(".", "n=2")];
        let result = Aggregator::score(Scheme::Methylation, false, &records).unwrap();
        assert_eq!(result.score, Some(0.4));
        assert_eq!(result.get("c"), Some(&FieldValue::Int(4)));
        assert_eq!(result.get("t"), Some(&FieldValue::Int(6)));
        assert_eq!(result.get("n"), Some(&FieldValue::Int(3)));
    }

    #[test]
    fn test_methylation_no_data() {
        let records = [rec(".", "c=0; t=0")];
        assert!(Aggregator::score(Scheme::Methylation, false, &records).is_none());
        assert!(Aggregator::score(Scheme::Methylation, false, std::iter::empty::<&GffRecord>()).is_none());
    }

    #[test]
    fn test_methylation_counts_saturate() {
        let records = [
            rec(".", "c=18446744073709551615; t=1"),
            rec(".", "c=7; t=2"),
        ];
        let result = Aggregator::score(Scheme::Methylation, false, &records).unwrap();
        assert_eq!(result.get("c"), Some(&FieldValue::Int(u64::MAX)));
        assert_eq!(result.get("t"), Some(&FieldValue::Int(3)));
        assert_eq!(result.score, Some(1.0));
    }

    #[test]
    fn test_sum_missing_scores_count_as_one() {
        let records = [rec("2.5", "."), rec(".", "."), rec("4", ".")];
        let result = Aggregator::score(Scheme::Sum, false, &records).unwrap();
        assert_eq!(result.score, Some(7.5));
        assert_eq!(result.get("n"), Some(&FieldValue::Int(3)));
    }

    #[test]
    fn test_sum_reverse_swaps_sum_and_count() {
        let records = [rec("2.5", "."), rec(".", "."), rec("4", ".")];
        let result = Aggregator::score(Scheme::Sum, true, &records).unwrap();
        assert_eq!(result.score, Some(3.0));
        assert_eq!(float(&result, "n"), 7.5);
        assert!(Aggregator::score(Scheme::Sum, true, std::iter::empty::<&GffRecord>()).is_none());
    }

    #[test]
    fn test_average() {
        let records: Vec<_> = ["2", "4", "4", "4", "5", "5", "7", "9"]
            .iter()
            .map(|s| rec(s, "."))
            .collect();
        let result = Aggregator::score(Scheme::Average, false, &records).unwrap();
        assert!((result.score.unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(result.get("n"), Some(&FieldValue::Int(8)));
        assert!((float(&result, "var") - 4.571428571428571).abs() < 1e-9);
        assert!((float(&result, "std") - 2.138089935299395).abs() < 1e-9);
    }

    #[test]
    fn test_average_single_record_has_no_variance() {
        let result = Aggregator::score(Scheme::Average, false, &[rec("3", ".")]).unwrap();
        assert_eq!(result.score, Some(3.0));
        assert!(result.get("var").is_none());
        assert!(result.get("std").is_none());
    }

    #[test]
    fn test_average_ignores_missing_scores() {
        let records = [rec(".", "."), rec("6", "."), rec("2", ".")];
        let result = Aggregator::score(Scheme::Average, false, &records).unwrap();
        assert_eq!(result.score, Some(4.0));
        assert_eq!(result.get("n"), Some(&FieldValue::Int(2)));
        assert!(Aggregator::score(Scheme::Average, false, &[rec(".", ".")]).is_none());
    }

    #[test]
    fn test_sequence_frequency() {
        let records = [rec("1", "seq=ac"), rec("3", "seq=ag")];
        let result = Aggregator::score(Scheme::SequenceFrequency, false, &records).unwrap();
        assert_eq!(result.score, Some(2.0));
        assert_eq!(result.get("n"), Some(&FieldValue::Int(2)));
        assert_eq!(text(&result, "a"), "1.0,0.0");
        assert_eq!(text(&result, "c"), "0.0,0.5");
        assert_eq!(text(&result, "g"), "0.0,0.5");
        assert_eq!(text(&result, "t"), "0.0,0.0");
        assert!(result.get(OTHER).is_none());
    }

    #[test]
    fn test_sequence_frequency_uneven_lengths_and_other_symbols() {
        let records = [rec(".", "seq=ACN"), rec(".", "seq=a"), rec(".", "id=x")];
        let result = Aggregator::score(Scheme::SequenceFrequency, false, &records).unwrap();
        assert_eq!(result.score, None);
        assert_eq!(result.get("n"), Some(&FieldValue::Int(3)));
        assert_eq!(text(&result, "a"), "1.0,0.0,0.0");
        assert_eq!(text(&result, "c"), "0.0,1.0,0.0");
        assert_eq!(text(&result, OTHER), "0.0,0.0,1.0");
    }
}

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::SliceRandom;

use cadence_core::TrialSpec;

use crate::config::GoNogoConfig;
use crate::error::ConfigError;

/// Fraction of trials that are go trials, derived from the class weight
/// totals. Only strictly positive weights contribute; a digit missing from
/// the weight map counts as zero.
pub fn compute_go_ratio(
    go_digits: &[u8],
    nogo_digits: &[u8],
    digit_weights: &BTreeMap<u8, f64>,
) -> Result<f64, ConfigError> {
    check_digit_sets(go_digits, nogo_digits)?;
    let total_go = class_weight_total(go_digits, digit_weights);
    let total_nogo = class_weight_total(nogo_digits, digit_weights);
    if total_go <= 0.0 || total_nogo <= 0.0 {
        return Err(ConfigError::ZeroClassWeight);
    }
    Ok(total_go / (total_go + total_nogo))
}

/// One block's shuffled trial sequence: `round(n * go_ratio)` go trials
/// (clamped to `[0, n]`), the rest no-go, each digit drawn with replacement
/// proportionally to its weight, then the whole list shuffled.
pub fn generate_trial_schedule(
    go_digits: &[u8],
    nogo_digits: &[u8],
    digit_weights: &BTreeMap<u8, f64>,
    go_ratio: f64,
    n_trials_per_block: usize,
    rng: &mut impl Rng,
) -> Result<Vec<TrialSpec>, ConfigError> {
    check_digit_sets(go_digits, nogo_digits)?;

    let n_go = ((n_trials_per_block as f64 * go_ratio).round() as i64)
        .clamp(0, n_trials_per_block as i64) as usize;
    let n_nogo = n_trials_per_block - n_go;

    let mut trials = Vec::with_capacity(n_trials_per_block);
    sample_class(go_digits, digit_weights, n_go, true, rng, &mut trials)?;
    sample_class(nogo_digits, digit_weights, n_nogo, false, rng, &mut trials)?;

    trials.shuffle(rng);
    Ok(trials)
}

/// The full session plan: one independently drawn schedule per block, all
/// from the same ratio. Per-block rounding is intentionally independent, so
/// block go-counts can differ when `n * ratio` is not an integer.
pub fn build_trial_schedule(
    config: &GoNogoConfig,
    rng: &mut impl Rng,
) -> Result<Vec<Vec<TrialSpec>>, ConfigError> {
    let ratio = compute_go_ratio(&config.go_digits, &config.nogo_digits, &config.digit_weights)?;
    (0..config.n_blocks)
        .map(|_| {
            generate_trial_schedule(
                &config.go_digits,
                &config.nogo_digits,
                &config.digit_weights,
                ratio,
                config.n_trials_per_block,
                rng,
            )
        })
        .collect()
}

fn check_digit_sets(go_digits: &[u8], nogo_digits: &[u8]) -> Result<(), ConfigError> {
    if go_digits.is_empty() || nogo_digits.is_empty() {
        return Err(ConfigError::EmptyDigitSet);
    }
    let go: BTreeSet<u8> = go_digits.iter().copied().collect();
    let overlap: Vec<u8> = nogo_digits
        .iter()
        .copied()
        .filter(|d| go.contains(d))
        .collect();
    if !overlap.is_empty() {
        return Err(ConfigError::OverlappingDigits { digits: overlap });
    }
    Ok(())
}

fn class_weight_total(digits: &[u8], digit_weights: &BTreeMap<u8, f64>) -> f64 {
    digits
        .iter()
        .map(|d| digit_weights.get(d).copied().unwrap_or(0.0).max(0.0))
        .sum()
}

fn sample_class(
    digits: &[u8],
    digit_weights: &BTreeMap<u8, f64>,
    count: usize,
    is_go: bool,
    rng: &mut impl Rng,
    out: &mut Vec<TrialSpec>,
) -> Result<(), ConfigError> {
    let mut candidates = Vec::with_capacity(digits.len());
    let mut weights = Vec::with_capacity(digits.len());
    for &d in digits {
        let w = digit_weights.get(&d).copied().unwrap_or(0.0);
        if w > 0.0 {
            candidates.push(d);
            weights.push(w);
        }
    }
    if candidates.is_empty() {
        return Err(ConfigError::ZeroClassWeight);
    }
    let dist = WeightedIndex::new(&weights).map_err(|_| ConfigError::ZeroClassWeight)?;
    for _ in 0..count {
        out.push(TrialSpec {
            digit: candidates[dist.sample(rng)],
            is_go,
        });
    }
    Ok(())
}

//! Demand shaping: yearly seasonality, weekly rhythm and noisy integer sampling.

use std::f64::consts::PI;

use chrono::Datelike;
use chrono::NaiveDate;
use rand::Rng;
use rand_distr::Distribution;
use rand_distr::Normal;
use rand_distr::Poisson;

/// Relative demand at the middle of each month, January first. September is back-to-office season, August is
/// holidays.
pub const MONTHLY_ANCHORS: [f64; 12] = [1.2, 0.9, 1.1, 1.0, 0.85, 0.75, 0.6, 0.5, 1.5, 1.3, 1.35, 1.25];

/// Relative demand per weekday, Monday first.
pub const WEEKDAY_FACTORS: [f64; 7] = [1.15, 1.3, 1.3, 1.15, 0.95, 0.6, 0.4];

const ANCHOR_DAY: u32 = 15;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn anchor_date(year: i32, month0: i32) -> NaiveDate {
    // Month arithmetic wraps into neighbouring years.
    let year = year + month0.div_euclid(12);
    let month = month0.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, ANCHOR_DAY).expect("15th exists in every month")
}

/// Seasonal multiplier of a date. Cosine interpolation between the surrounding mid-month anchors, scaled so the
/// anchors average to 1.
pub fn seasonal_multiplier(date: NaiveDate) -> f64 {
    let month0 = date.month0() as i32;
    let (left, right) = if date.day() >= ANCHOR_DAY {
        (month0, month0 + 1)
    }
    else {
        (month0 - 1, month0)
    };

    let left_date = anchor_date(date.year(), left);
    let right_date = anchor_date(date.year(), right);
    let span = (right_date - left_date).num_days() as f64;
    let t = (date - left_date).num_days() as f64 / span;
    let w = (1.0 - (PI * t).cos()) / 2.0;

    let a = MONTHLY_ANCHORS[left.rem_euclid(12) as usize];
    let b = MONTHLY_ANCHORS[right.rem_euclid(12) as usize];

    (a + (b - a) * w) / mean(&MONTHLY_ANCHORS)
}

pub fn weekday_multiplier(date: NaiveDate) -> f64 {
    WEEKDAY_FACTORS[date.weekday().num_days_from_monday() as usize] / mean(&WEEKDAY_FACTORS)
}

/// Draws integer daily quantities around an expectation.
#[derive(Debug, Clone)]
pub struct QuantitySampler {
    noise: Normal<f64>,
}

impl QuantitySampler {
    /// `noise` is the relative standard deviation applied to the Poisson rate.
    pub fn new(noise: f64) -> Result<Self, rand_distr::NormalError> {
        Ok(Self {
            noise: Normal::new(0.0, noise)?,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, expected: f64) -> u32 {
        let rate = (expected * (1.0 + self.noise.sample(rng))).max(0.0);
        if !rate.is_finite() || rate <= 0.0 {
            return 0;
        }

        match Poisson::new(rate) {
            Ok(poisson) => {
                let drawn: f64 = poisson.sample(rng);
                drawn.max(0.0) as u32
            }
            // Rates this large never come out of realistic profiles; fall back to the mean.
            Err(_) => rate.round() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use statrs::statistics::Statistics;

    use super::*;

    fn days_of(year: i32) -> impl Iterator<Item = NaiveDate> {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .unwrap()
            .iter_days()
            .take_while(move |d| d.year() == year)
    }

    #[test]
    fn peak_in_september_trough_in_summer() {
        for year in [2023, 2024] {
            let (max_day, _) = days_of(year)
                .map(|d| (d, seasonal_multiplier(d)))
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap();
            let (min_day, _) = days_of(year)
                .map(|d| (d, seasonal_multiplier(d)))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap();

            assert_eq!(max_day.month(), 9, "peak on {max_day}");
            assert!([7, 8].contains(&min_day.month()), "trough on {min_day}");
        }
    }

    #[test]
    fn anchors_are_hit_exactly() {
        let norm = mean(&MONTHLY_ANCHORS);
        for (m, anchor) in MONTHLY_ANCHORS.iter().enumerate() {
            let date = NaiveDate::from_ymd_opt(2024, m as u32 + 1, 15).unwrap();
            assert!((seasonal_multiplier(date) - anchor / norm).abs() < 1e-12, "{date}");
        }
    }

    #[test]
    fn curve_is_continuous_across_new_year() {
        let dec31 = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let jan1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!((seasonal_multiplier(dec31) - seasonal_multiplier(jan1)).abs() < 0.01);
    }

    #[test]
    fn yearly_mean_is_about_one() {
        let values: Vec<f64> = days_of(2024).map(seasonal_multiplier).collect();
        let avg = values.mean();
        assert!((avg - 1.0).abs() < 0.02, "mean {avg}");
    }

    #[test]
    fn weekends_are_quieter() {
        // 2024-01-01 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let week: Vec<f64> = monday.iter_days().take(7).map(weekday_multiplier).collect();
        for weekend in &week[5..] {
            for midweek in &week[1..4] {
                assert!(weekend < midweek);
            }
        }
        assert!((week.iter().sum::<f64>() / 7.0 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn samples_are_non_negative_and_centered() {
        let mut rng = StdRng::seed_from_u64(7);
        let sampler = QuantitySampler::new(0.2).unwrap();
        let draws: Vec<f64> = (0..20_000).map(|_| sampler.sample(&mut rng, 8.0) as f64).collect();
        let avg = draws.iter().mean();
        assert!((avg - 8.0).abs() < 0.25, "mean {avg}");

        assert_eq!(sampler.sample(&mut rng, 0.0), 0);
        assert_eq!(sampler.sample(&mut rng, -3.0), 0);
    }

    #[test]
    fn noiseless_sampler_is_poisson() {
        let mut rng = StdRng::seed_from_u64(11);
        let sampler = QuantitySampler::new(0.0).unwrap();
        let draws: Vec<f64> = (0..20_000).map(|_| sampler.sample(&mut rng, 3.0) as f64).collect();
        let var = draws.iter().variance();
        assert!((var - 3.0).abs() < 0.2, "variance {var}");
    }
}

use chrono::{DateTime, Utc};

use super::types::StateVector;

/// Vector whose epoch is exactly `epoch`.
pub fn find_exact<'a>(vectors: &'a [StateVector], epoch: &DateTime<Utc>) -> Option<&'a StateVector> {
    vectors.iter().find(|v| v.epoch == *epoch)
}

/// Vector closest in time to `reference`. Ties go to the earlier entry.
pub fn find_nearest<'a>(
    vectors: &'a [StateVector],
    reference: &DateTime<Utc>,
) -> Option<&'a StateVector> {
    vectors
        .iter()
        .min_by_key(|v| (v.epoch - *reference).abs())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn hourly_vectors() -> Vec<StateVector> {
        (0..5)
            .map(|i| StateVector {
                epoch: Utc.with_ymd_and_hms(2024, 2, 22, 12 + i, 0, 0).unwrap(),
                x: 42164.0 + 1.2 * i as f64,
                y: -231.4 + 1.3 * i as f64,
                z: 1450.5 + 1.2 * i as f64,
                x_dot: 0.67 + 0.01 * i as f64,
                y_dot: 2.08 + 0.01 * i as f64,
                z_dot: -0.03 + 0.01 * i as f64,
            })
            .collect()
    }

    #[test]
    fn exact_match() {
        let vectors = hourly_vectors();
        let target = Utc.with_ymd_and_hms(2024, 2, 22, 14, 0, 0).unwrap();
        let found = find_exact(&vectors, &target).unwrap();
        assert_eq!(found, &vectors[2]);
    }

    #[test]
    fn exact_miss() {
        let vectors = hourly_vectors();
        let target = Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap();
        assert!(find_exact(&vectors, &target).is_none());

        let between = Utc.with_ymd_and_hms(2024, 2, 22, 14, 0, 1).unwrap();
        assert!(find_exact(&vectors, &between).is_none());
    }

    #[test]
    fn nearest_prefers_first_on_tie() {
        let vectors = hourly_vectors();
        let reference = Utc.with_ymd_and_hms(2024, 2, 22, 13, 30, 0).unwrap();
        let nearest = find_nearest(&vectors, &reference).unwrap();
        assert_eq!(nearest.epoch, Utc.with_ymd_and_hms(2024, 2, 22, 13, 0, 0).unwrap());
    }

    #[test]
    fn nearest_outside_range() {
        let vectors = hourly_vectors();
        let late = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(find_nearest(&vectors, &late), vectors.last());
        let early = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(find_nearest(&vectors, &early), vectors.first());
        assert!(find_nearest(&[], &early).is_none());
    }
}

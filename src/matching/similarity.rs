use tracing::warn;

/// Вычисляет косинусное сходство между двумя векторами, в [-1, 1].
///
/// Для вектора нулевой длины возвращает 0.0. Векторы разной размерности
/// тоже дают 0.0, ранжировщик отсекает их раньше.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;

    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // + 0.0 превращает -0.0 в 0.0
    ((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) + 0.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_vector(rng: &mut StdRng, dimension: usize) -> Vec<f32> {
        (0..dimension).map(|_| rng.gen_range(-1.0_f32..1.0)).collect()
    }

    #[test]
    fn identical_vectors_score_one() {
        let a = vec![0.3, -1.2, 4.0, 0.01];

        let sim = cosine_similarity(&a, &a);

        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![-1.0, -2.0, -3.0];

        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, -1.0]), 0.0);
    }

    #[test]
    fn zero_vector_scores_zero_against_anything() {
        let zero = vec![0.0; 3];

        assert_eq!(cosine_similarity(&zero, &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0, 3.0], &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn dimension_mismatch_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn random_vectors_are_symmetric_and_bounded() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let a = random_vector(&mut rng, 16);
            let b = random_vector(&mut rng, 16);

            let ab = cosine_similarity(&a, &b);
            let ba = cosine_similarity(&b, &a);

            assert_eq!(ab, ba);
            assert!((-1.0..=1.0).contains(&ab));
            assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        }
    }
}

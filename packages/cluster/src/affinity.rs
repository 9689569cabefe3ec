//! Affinity propagation clustering over 2D points.
//!
//! Exemplar-based clustering via iterative message passing (Frey & Dueck,
//! "Clustering by Passing Messages Between Data Points", Science 2007).
//! "Responsibility" and "availability" messages are exchanged between all
//! point pairs until a stable set of exemplars emerges; the number of
//! clusters is not a parameter, it falls out of convergence.
//!
//! Similarity is negative squared Euclidean distance. The preference
//! (self-similarity) defaults to the median of the similarity matrix. A
//! tiny similarity perturbation from a seeded xorshift generator breaks
//! the message-passing ties that otherwise leave duplicate or symmetric
//! points with zero evidence; with a fixed seed the labeling is fully
//! reproducible for identical input.

/// Tiny deterministic noise source for tie-breaking (xorshift64*).
struct TieBreaker {
    state: u64,
}

impl TieBreaker {
    const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    /// Uniform value in `[-1, 1)`.
    #[allow(clippy::cast_precision_loss, clippy::suboptimal_flops)]
    fn next(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        let uniform = (x.wrapping_mul(0x2545_F491_4F6C_DD1D) as f64)
            / 18_446_744_073_709_551_616.0;
        2.0 * uniform - 1.0
    }
}

/// Affinity propagation configuration.
///
/// The defaults mirror the common library settings: damping `0.5`,
/// at most `200` iterations, convergence declared after `15` iterations
/// with an unchanged exemplar set, and median-similarity preference.
#[derive(Debug, Clone)]
pub struct AffinityPropagation {
    /// Damping factor in `[0.5, 1)` applied to message updates.
    pub damping: f64,
    /// Maximum number of message-passing iterations.
    pub max_iterations: usize,
    /// Iterations the exemplar set must stay unchanged to converge.
    pub convergence_iterations: usize,
    /// Self-similarity for every point. Lower values produce fewer
    /// clusters. `None` uses the median of the similarity matrix.
    pub preference: Option<f64>,
    /// Seed for the tie-breaking noise. Fixed seed, reproducible output.
    pub seed: u64,
}

impl Default for AffinityPropagation {
    fn default() -> Self {
        Self {
            damping: 0.5,
            max_iterations: 200,
            convergence_iterations: 15,
            preference: None,
            seed: 42,
        }
    }
}

impl AffinityPropagation {
    /// Partitions `points` into clusters, returning one label per input
    /// point in the same order. Labels are compacted to `0..k` in
    /// first-seen order and have no meaning beyond this invocation.
    ///
    /// Edge cases, by policy:
    /// - empty input produces empty output;
    /// - fewer than two distinct points produce a single cluster
    ///   (label `0` for every point);
    /// - if no exemplars emerge at all, every point falls back into a
    ///   single all-in-one cluster (logged as a warning), so the result
    ///   is always a complete labeling.
    #[must_use]
    #[allow(clippy::too_many_lines, clippy::suboptimal_flops)]
    pub fn cluster(&self, points: &[(f64, f64)]) -> Vec<usize> {
        let n = points.len();
        if n == 0 {
            return Vec::new();
        }

        if count_distinct(points) < 2 {
            return vec![0; n];
        }

        // Similarity matrix: negative squared Euclidean distance, with
        // the preference on the diagonal. The median is taken over the
        // full matrix (zero diagonal included) before the preference is
        // applied.
        let mut s = vec![0.0f64; n * n];
        for i in 0..n {
            for k in 0..n {
                if i != k {
                    let dx = points[i].0 - points[k].0;
                    let dy = points[i].1 - points[k].1;
                    s[i * n + k] = -(dx * dx + dy * dy);
                }
            }
        }

        let preference = self.preference.unwrap_or_else(|| median(&s));
        for i in 0..n {
            s[i * n + i] = preference;
        }

        let mut noise = TieBreaker::new(self.seed);
        for value in &mut s {
            *value += (f64::EPSILON * *value + f64::MIN_POSITIVE * 100.0) * noise.next();
        }

        let mut r = vec![0.0f64; n * n];
        let mut a = vec![0.0f64; n * n];
        let damping = self.damping;

        let mut exemplars: Vec<bool> = vec![false; n];
        let mut stable = 0usize;
        let mut converged = false;

        for _ in 0..self.max_iterations {
            // Responsibilities: r(i,k) = s(i,k) - max_{k'!=k}(a(i,k') + s(i,k'))
            for i in 0..n {
                let row = i * n;
                let mut max1 = f64::NEG_INFINITY;
                let mut max2 = f64::NEG_INFINITY;
                let mut arg1 = 0usize;
                for k in 0..n {
                    let v = a[row + k] + s[row + k];
                    if v > max1 {
                        max2 = max1;
                        max1 = v;
                        arg1 = k;
                    } else if v > max2 {
                        max2 = v;
                    }
                }
                for k in 0..n {
                    let other = if k == arg1 { max2 } else { max1 };
                    let updated = s[row + k] - other;
                    r[row + k] = damping * r[row + k] + (1.0 - damping) * updated;
                }
            }

            // Availabilities:
            // a(i,k) = min(0, r(k,k) + sum_{i' not in {i,k}} max(0, r(i',k)))
            // a(k,k) = sum_{i'!=k} max(0, r(i',k))
            for k in 0..n {
                let mut sum_pos = 0.0f64;
                for i in 0..n {
                    if i != k {
                        sum_pos += r[i * n + k].max(0.0);
                    }
                }
                for i in 0..n {
                    let updated = if i == k {
                        sum_pos
                    } else {
                        (r[k * n + k] + sum_pos - r[i * n + k].max(0.0)).min(0.0)
                    };
                    a[i * n + k] = damping * a[i * n + k] + (1.0 - damping) * updated;
                }
            }

            let current: Vec<bool> = (0..n).map(|k| r[k * n + k] + a[k * n + k] > 0.0).collect();
            let any = current.iter().any(|&e| e);

            if any && current == exemplars {
                stable += 1;
                if stable >= self.convergence_iterations {
                    converged = true;
                    exemplars = current;
                    break;
                }
            } else {
                stable = 0;
            }
            exemplars = current;
        }

        let exemplar_indices: Vec<usize> = (0..n).filter(|&k| exemplars[k]).collect();

        if exemplar_indices.is_empty() {
            log::warn!(
                "affinity propagation produced no exemplars for {n} points; \
                 falling back to a single cluster"
            );
            return vec![0; n];
        }

        if !converged {
            log::warn!(
                "affinity propagation did not converge within {} iterations; \
                 using the last exemplar set ({} exemplars)",
                self.max_iterations,
                exemplar_indices.len()
            );
        }

        // Assign every point to its most similar exemplar; exemplars
        // belong to themselves. Compact labels in first-seen order.
        let mut label_of_exemplar = vec![usize::MAX; n];
        let mut next_label = 0usize;
        let mut labels = Vec::with_capacity(n);

        for i in 0..n {
            let exemplar = if exemplars[i] {
                i
            } else {
                let mut best = exemplar_indices[0];
                let mut best_sim = s[i * n + best];
                for &k in &exemplar_indices[1..] {
                    let sim = s[i * n + k];
                    if sim > best_sim {
                        best_sim = sim;
                        best = k;
                    }
                }
                best
            };

            if label_of_exemplar[exemplar] == usize::MAX {
                label_of_exemplar[exemplar] = next_label;
                next_label += 1;
            }
            labels.push(label_of_exemplar[exemplar]);
        }

        labels
    }
}

/// Number of distinct coordinate pairs, compared bitwise.
fn count_distinct(points: &[(f64, f64)]) -> usize {
    let mut seen = std::collections::BTreeSet::new();
    for &(lat, lng) in points {
        seen.insert((lat.to_bits(), lng.to_bits()));
    }
    seen.len()
}

/// Median of a slice (average of the two middle values for even lengths).
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

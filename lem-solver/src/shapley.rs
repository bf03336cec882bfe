use lem_core::ports::{SettlementError, Welfare};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use tracing::{Level, event};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// Permutations drawn from one seeded stream; chunks are the unit of parallel work
const SAMPLE_CHUNK: usize = 32;

// Spreads chunk indices across the seed space
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Shapley values of a transferable-utility game.
///
/// A participant's Shapley value is its marginal contribution to the welfare of
/// the participants that precede it, averaged over every join order. Both
/// evaluators return one share per participant, aligned with the input slice,
/// and the shares sum to `W(all) - W(none)`.
///
/// Exact evaluation enumerates all `n!` orders and is refused above a size
/// limit. Sampling draws uniformly random orders from a seeded generator, so
/// repeated calls with the same seed return identical shares, with or without
/// the `parallel` feature.
#[derive(Clone, Debug)]
pub struct ShapleyEvaluator<W> {
    welfare: W,
    limit: usize,
}

impl<W> ShapleyEvaluator<W> {
    /// The hard ceiling on exact enumeration, whatever limit is configured
    pub const CEILING: usize = 12;

    /// An evaluator over `welfare`, enumerating exactly up to 8 participants
    pub fn new(welfare: W) -> Self {
        Self { welfare, limit: 8 }
    }

    /// Set the largest participant count for which exact evaluation is attempted
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(Self::CEILING);
        self
    }

    /// The characteristic function being shared
    pub fn welfare(&self) -> &W {
        &self.welfare
    }

    /// Exact Shapley values by enumerating every permutation.
    ///
    /// The welfare of each of the `2^n` coalitions is evaluated once up front;
    /// the permutation walk then only reads that table.
    pub fn exact<P>(&self, participants: &[&P]) -> Result<Vec<f64>, SettlementError>
    where
        W: Welfare<P>,
    {
        let n = participants.len();
        if n > self.limit {
            return Err(SettlementError::TooManyParticipants {
                participants: n,
                limit: self.limit,
            });
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let table = (0..1usize << n)
            .map(|mask| {
                let coalition = (0..n)
                    .filter(|i| mask & (1 << i) != 0)
                    .map(|i| participants[i])
                    .collect::<Vec<_>>();
                self.welfare.value(&coalition)
            })
            .collect::<Vec<f64>>();

        // Partition the orders by their first participant
        let partials = map_range(n, |first| {
            let mut contributions = vec![0.0; n];
            let mut rest = (0..n).filter(|&i| i != first).collect::<Vec<_>>();
            loop {
                walk(
                    std::iter::once(first).chain(rest.iter().copied()),
                    &table,
                    &mut contributions,
                );
                if !next_permutation(&mut rest) {
                    break;
                }
            }
            contributions
        });

        let orders = (1..=n).product::<usize>() as f64;
        event!(Level::DEBUG, participants = n, orders, "exact shapley values");

        Ok(reduce(n, partials)
            .into_iter()
            .map(|total| total / orders)
            .collect())
    }

    /// Monte Carlo Shapley values from `num_samples` random join orders
    pub fn sample<P>(&self, participants: &[&P], num_samples: usize, seed: u64) -> Vec<f64>
    where
        W: Welfare<P> + Sync,
        P: Sync,
    {
        let n = participants.len();
        if n == 0 || num_samples == 0 {
            return vec![0.0; n];
        }

        let empty = self.welfare.value(&[]);
        let chunks = num_samples.div_ceil(SAMPLE_CHUNK);

        let partials = map_range(chunks, |chunk| {
            let mut rng = StdRng::seed_from_u64(seed ^ (chunk as u64).wrapping_mul(SEED_STRIDE));
            let draws = SAMPLE_CHUNK.min(num_samples - chunk * SAMPLE_CHUNK);

            let mut contributions = vec![0.0; n];
            let mut order = (0..n).collect::<Vec<_>>();
            let mut coalition = Vec::with_capacity(n);
            for _ in 0..draws {
                order.shuffle(&mut rng);
                coalition.clear();
                let mut previous = empty;
                for &index in order.iter() {
                    coalition.push(participants[index]);
                    let value = self.welfare.value(&coalition);
                    contributions[index] += value - previous;
                    previous = value;
                }
            }
            contributions
        });

        event!(
            Level::DEBUG,
            participants = n,
            num_samples,
            seed,
            "sampled shapley values"
        );

        reduce(n, partials)
            .into_iter()
            .map(|total| total / num_samples as f64)
            .collect()
    }
}

/// Accumulate the marginal contributions along one join order
fn walk(order: impl Iterator<Item = usize>, table: &[f64], contributions: &mut [f64]) {
    let mut mask = 0usize;
    let mut previous = table[0];
    for index in order {
        mask |= 1 << index;
        let value = table[mask];
        contributions[index] += value - previous;
        previous = value;
    }
}

/// Advance to the next permutation in lexicographic order, returning false
/// after the last one
fn next_permutation(order: &mut [usize]) -> bool {
    let Some(i) = order.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let pivot = order[i];
    let Some(j) = order.iter().rposition(|&x| x > pivot) else {
        return false;
    };
    order.swap(i, j);
    order[i + 1..].reverse();
    true
}

// Partials are summed in index order, so the result does not depend on scheduling
fn reduce(n: usize, partials: Vec<Vec<f64>>) -> Vec<f64> {
    partials.into_iter().fold(vec![0.0; n], |mut acc, partial| {
        for (a, p) in acc.iter_mut().zip(partial) {
            *a += p;
        }
        acc
    })
}

fn map_range<R, F>(count: usize, f: F) -> Vec<R>
where
    F: Fn(usize) -> R + Sync + Send,
    R: Send,
{
    #[cfg(feature = "parallel")]
    {
        (0..count).into_par_iter().map(f).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        (0..count).map(f).collect()
    }
}

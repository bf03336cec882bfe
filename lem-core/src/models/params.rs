/// Configuration for a clearing call.
///
/// One struct carries the parameters of every mechanism; each mechanism reads
/// the fields it needs and ignores the rest. All fields have defaults, so a
/// configuration file only needs to name what it changes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct MechanismParams {
    /// Feed-in tariff: what the grid pays for exported energy, the lower price bound (0.1)
    pub fit: f64,
    /// Time-of-use tariff: what the grid charges for imported energy, the upper price bound (0.25)
    pub tou: f64,
    /// Spread weight for MPAS (0.5)
    pub alpha: f64,
    /// Step size for iterative price adjustment (0.1)
    pub theta: f64,
    /// Convergence tolerance for iterative methods (0.01)
    pub epsilon: f64,
    /// Upper price bound for VCG, NBS, CGT and CGTS, and the admissible bid price cap (100)
    pub cap: f64,
    /// Lower price bound for VCG, NBS, CGT and CGTS (10)
    pub floor: f64,
    /// Monte Carlo permutations drawn by CGTS and COLM (100)
    pub num_samples: usize,
    /// Seed for the Monte Carlo random source (0)
    pub seed: u64,
    /// Iteration bound for UPNR, IPA and NBS (100)
    pub max_iterations: usize,
    /// Largest residual for which exact Shapley values are enumerated (8)
    pub max_exact_participants: usize,
    /// Relative bid adjustment per AUP round (0.1)
    pub step: f64,
    /// Maximum number of AUP rounds (10)
    pub rounds: usize,
}

impl Default for MechanismParams {
    fn default() -> Self {
        Self {
            fit: 0.1,
            tou: 0.25,
            alpha: 0.5,
            theta: 0.1,
            epsilon: 0.01,
            cap: 100.0,
            floor: 10.0,
            num_samples: 100,
            seed: 0,
            max_iterations: 100,
            max_exact_participants: 8,
            step: 0.1,
            rounds: 10,
        }
    }
}

impl MechanismParams {
    /// Override the tariff band, keeping everything else
    pub fn with_tariffs(mut self, fit: f64, tou: f64) -> Self {
        self.fit = fit;
        self.tou = tou;
        self
    }

    /// Clip a price to the [FIT, TOU] tariff band
    pub fn clip_tariff(&self, price: f64) -> f64 {
        price.clamp(self.fit, self.tou)
    }

    /// Clip a price to the mechanism-defined [floor, cap] band
    pub fn clip_floor_cap(&self, price: f64) -> f64 {
        price.clamp(self.floor, self.cap)
    }

    /// Check the internal consistency of the parameters.
    ///
    /// Validation also guarantees that the clipping helpers cannot panic.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let finite = [
            self.fit,
            self.tou,
            self.alpha,
            self.theta,
            self.epsilon,
            self.cap,
            self.floor,
            self.step,
        ];
        if finite.iter().any(|x| !x.is_finite()) {
            return Err(ParamsError::NonFinite);
        }
        if self.fit < 0.0 {
            return Err(ParamsError::NegativeTariff);
        }
        if self.fit > self.tou {
            return Err(ParamsError::InvertedTariffs {
                fit: self.fit,
                tou: self.tou,
            });
        }
        if self.floor > self.cap {
            return Err(ParamsError::InvertedBounds {
                floor: self.floor,
                cap: self.cap,
            });
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ParamsError::Alpha(self.alpha));
        }
        if self.theta <= 0.0 || self.epsilon <= 0.0 || self.step < 0.0 {
            return Err(ParamsError::NonPositiveStep);
        }
        if self.num_samples == 0 || self.max_iterations == 0 || self.rounds == 0 {
            return Err(ParamsError::ZeroBudget);
        }
        Ok(())
    }
}

/// The ways in which a parameter set can be inconsistent
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ParamsError {
    /// Error when any real-valued parameter is NaN or infinite
    #[error("parameters must be finite")]
    NonFinite,
    /// Error when the feed-in tariff is negative
    #[error("tariffs must be non-negative")]
    NegativeTariff,
    /// Error when the feed-in tariff exceeds the time-of-use tariff
    #[error("feed-in tariff {fit} exceeds time-of-use tariff {tou}")]
    InvertedTariffs {
        /// The feed-in tariff
        fit: f64,
        /// The time-of-use tariff
        tou: f64,
    },
    /// Error when the price floor exceeds the price cap
    #[error("price floor {floor} exceeds price cap {cap}")]
    InvertedBounds {
        /// The price floor
        floor: f64,
        /// The price cap
        cap: f64,
    },
    /// Error when the spread weight is outside [0, 1]
    #[error("alpha must lie in [0, 1], got {0}")]
    Alpha(f64),
    /// Error when a step size or tolerance is not positive
    #[error("theta and epsilon must be positive and step non-negative")]
    NonPositiveStep,
    /// Error when a sample or iteration budget is zero
    #[error("num_samples, max_iterations and rounds must be at least 1")]
    ZeroBudget,
}

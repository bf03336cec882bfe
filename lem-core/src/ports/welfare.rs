/// A characteristic function: the welfare a coalition of participants can create on its own.
///
/// Closures of the form `Fn(&[&P]) -> f64` implement this trait, so callers can
/// supply an ad-hoc welfare function wherever one is expected. The empty coalition
/// should have zero welfare for Shapley shares to sum to the grand coalition's welfare.
pub trait Welfare<P> {
    /// Evaluate the welfare of `coalition`
    fn value(&self, coalition: &[&P]) -> f64;
}

impl<P, F: Fn(&[&P]) -> f64> Welfare<P> for F {
    fn value(&self, coalition: &[&P]) -> f64 {
        self(coalition)
    }
}

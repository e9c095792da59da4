//! Non-seasonal ARIMA order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// ARIMA order `(p, d, q)`.
///
/// Serializes as a three-element array so configuration files can write
/// `fixed = [0, 1, 0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 3]", into = "[usize; 3]")]
pub struct ModelOrder {
    /// AR order.
    pub p: usize,
    /// Differencing order.
    pub d: usize,
    /// MA order.
    pub q: usize,
}

impl ModelOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Number of ARMA coefficients, `p + q`.
    pub fn arma_terms(&self) -> usize {
        self.p + self.q
    }
}

impl From<[usize; 3]> for ModelOrder {
    fn from([p, d, q]: [usize; 3]) -> Self {
        Self { p, d, q }
    }
}

impl From<ModelOrder> for [usize; 3] {
    fn from(order: ModelOrder) -> Self {
        [order.p, order.d, order.q]
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.p, self.d, self.q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        order: ModelOrder,
    }

    #[test]
    fn displays_as_tuple() {
        assert_eq!(ModelOrder::new(1, 1, 0).to_string(), "(1, 1, 0)");
    }

    #[test]
    fn deserializes_from_array() {
        let holder: Holder = toml::from_str("order = [2, 1, 3]").unwrap();
        assert_eq!(holder.order, ModelOrder::new(2, 1, 3));
        assert_eq!(holder.order.arma_terms(), 5);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(toml::from_str::<Holder>("order = [2, 1]").is_err());
    }
}

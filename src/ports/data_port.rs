//! Observation source port.

use crate::domain::error::SentiError;
use crate::domain::observation::Observation;

pub trait ObservationPort {
    /// The full series for one symbol, oldest first.
    ///
    /// An unknown symbol is `SentiError::NoData`.
    fn fetch_observations(&self, symbol: &str) -> Result<Vec<Observation>, SentiError>;

    fn list_symbols(&self) -> Result<Vec<String>, SentiError>;
}

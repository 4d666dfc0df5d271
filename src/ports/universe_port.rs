//! Stock universe port.

use crate::domain::error::TwcorrError;
use crate::domain::universe::Universe;

pub trait UniversePort {
    fn list_universe(&self) -> Result<Universe, TwcorrError>;
}

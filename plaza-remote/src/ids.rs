use plaza_common::model::{Id, PlazaSnowflakeGenerator};
use std::sync::{Mutex, PoisonError};

/// Process-wide source of document, file and account ids.
#[derive(Debug)]
pub struct IdGenerator {
    snowflake_generator: Mutex<PlazaSnowflakeGenerator>,
}

impl IdGenerator {
    #[must_use]
    pub fn new(snowflake_generator: PlazaSnowflakeGenerator) -> Self {
        Self {
            snowflake_generator: Mutex::new(snowflake_generator),
        }
    }

    #[must_use]
    pub fn random() -> Self {
        Self::new(PlazaSnowflakeGenerator::random())
    }

    pub fn generate<Marker>(&self) -> Id<Marker> {
        self.snowflake_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()
            .into()
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::random()
    }
}

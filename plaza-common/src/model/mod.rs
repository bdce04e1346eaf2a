pub mod comment;
pub mod file;
pub mod like;
pub mod post;
pub mod user;

use crate::{
    model::user::{BioTooLongError, InvalidDisplayNameError},
    snowflake::{Epoch, Snowflake, SnowflakeGenerator},
};
use std::{fmt::Display, marker::PhantomData, num::ParseIntError, str::FromStr};
use thiserror::Error;
use time::{OffsetDateTime, macros::datetime};

#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    DisplayName(#[from] InvalidDisplayNameError),
    #[error(transparent)]
    Bio(#[from] BioTooLongError),
    #[error("Invalid id {0:?}: {1}")]
    Id(String, ParseIntError),
    #[error("Like count out of range: {0}")]
    LikeCount(i64),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PlazaEpoch;
impl Epoch for PlazaEpoch {
    const EPOCH_TIME: OffsetDateTime = datetime!(2025-01-01 00:00 UTC);
}

pub type PlazaSnowflake = Snowflake<PlazaEpoch>;
pub type PlazaSnowflakeGenerator = SnowflakeGenerator<PlazaEpoch>;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct Id<Marker>(PlazaSnowflake, PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(snowflake: PlazaSnowflake) -> Self {
        Self(snowflake, PhantomData)
    }

    #[must_use]
    pub fn snowflake(self) -> PlazaSnowflake {
        self.0
    }

    /// Parses an id as it appears in remote documents.
    pub fn parse(value: &str) -> Result<Self, ModelValidationError> {
        value
            .parse()
            .map_err(|err| ModelValidationError::Id(value.to_owned(), err))
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> FromStr for Id<Marker> {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlazaSnowflake::from_str(s).map(Self::new)
    }
}

impl<Marker> From<PlazaSnowflake> for Id<Marker> {
    fn from(value: PlazaSnowflake) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<u64> for Id<Marker> {
    fn from(value: u64) -> Self {
        Id::new(PlazaSnowflake::new(value))
    }
}

impl<Marker> From<Id<Marker>> for u64 {
    fn from(value: Id<Marker>) -> Self {
        value.snowflake().get()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, ModelValidationError, post::PostMarker};

    #[test]
    fn ids_parse_from_documents() {
        let id = Id::<PostMarker>::parse("4503599627370495").unwrap();
        assert_eq!(u64::from(id), 4_503_599_627_370_495);
        assert_eq!(id.to_string(), "4503599627370495");

        assert!(matches!(
            Id::<PostMarker>::parse("f0a2-uuid"),
            Err(ModelValidationError::Id(value, _)) if value == "f0a2-uuid"
        ));
    }
}

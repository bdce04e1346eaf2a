//! Snowflake ids for everything the client creates.
//!
//! Layout, most significant bit first: 42 bits of milliseconds since the epoch, 5 bits worker id,
//! 5 bits process id and a 12 bit increment.
//!
//! See <https://discord.com/developers/docs/reference#snowflakes>

use derive_where::derive_where;
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
    num::ParseIntError,
    str::FromStr,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

pub const TIMESTAMP_OFFSET: u32 = 22;
pub const TIMESTAMP_LENGTH: u32 = 42;
pub const WORKER_ID_OFFSET: u32 = 17;
pub const PROCESS_ID_OFFSET: u32 = 12;
pub const NODE_ID_LENGTH: u32 = 5;
pub const INCREMENT_LENGTH: u32 = 12;

const fn mask(length: u32) -> u64 {
    (1 << length) - 1
}

pub trait Epoch {
    const EPOCH_TIME: OffsetDateTime;
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum SnowflakeTimeError {
    #[error("Specified time was before the snowflake epoch.")]
    TimeBeforeEpoch,
    #[error("Resulting timestamp uses too many bits.")]
    TimestampTooLarge,
}

macro_rules! node_id {
    ($name:ident) => {
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
        pub struct $name(u8);

        impl $name {
            #[must_use]
            pub fn new(id: u8) -> Option<Self> {
                (u64::from(id) <= mask(NODE_ID_LENGTH)).then_some(Self(id))
            }

            #[must_use]
            pub fn random() -> Self {
                #[allow(clippy::cast_possible_truncation)]
                Self(rand::random_range(0..=mask(NODE_ID_LENGTH) as u8))
            }

            #[must_use]
            pub fn get(self) -> u8 {
                self.0
            }
        }
    };
}

node_id!(WorkerId);
node_id!(ProcessId);

#[derive_where(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct Snowflake<SnowflakeEpoch>(u64, PhantomData<SnowflakeEpoch>);

impl<SnowflakeEpoch> Snowflake<SnowflakeEpoch> {
    #[must_use]
    pub fn new(inner: u64) -> Self {
        Self(inner, PhantomData)
    }

    #[must_use]
    pub fn from_parts(
        timestamp_millis: u64,
        worker_id: WorkerId,
        process_id: ProcessId,
        increment: u16,
    ) -> Self {
        let snowflake = (timestamp_millis & mask(TIMESTAMP_LENGTH)) << TIMESTAMP_OFFSET
            | u64::from(worker_id.get()) << WORKER_ID_OFFSET
            | u64::from(process_id.get()) << PROCESS_ID_OFFSET
            | u64::from(increment) & mask(INCREMENT_LENGTH);

        Self::new(snowflake)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn timestamp_millis(self) -> u64 {
        self.0 >> TIMESTAMP_OFFSET
    }

    #[must_use]
    pub fn created_at(self) -> OffsetDateTime
    where
        SnowflakeEpoch: Epoch,
    {
        // 42 bits of milliseconds always fit an i64.
        #[allow(clippy::cast_possible_wrap)]
        let millis = self.timestamp_millis() as i64;
        SnowflakeEpoch::EPOCH_TIME + Duration::milliseconds(millis)
    }

    #[must_use]
    pub fn worker_id(self) -> WorkerId {
        #[allow(clippy::cast_possible_truncation)]
        WorkerId((self.0 >> WORKER_ID_OFFSET & mask(NODE_ID_LENGTH)) as u8)
    }

    #[must_use]
    pub fn process_id(self) -> ProcessId {
        #[allow(clippy::cast_possible_truncation)]
        ProcessId((self.0 >> PROCESS_ID_OFFSET & mask(NODE_ID_LENGTH)) as u8)
    }

    #[must_use]
    pub fn increment(self) -> u16 {
        #[allow(clippy::cast_possible_truncation)]
        let increment = (self.0 & mask(INCREMENT_LENGTH)) as u16;
        increment
    }
}

pub fn millis_since_epoch<SnowflakeEpoch: Epoch>(
    time: OffsetDateTime,
) -> Result<u64, SnowflakeTimeError> {
    let millis = (time - SnowflakeEpoch::EPOCH_TIME).whole_milliseconds();
    if millis < 0 {
        return Err(SnowflakeTimeError::TimeBeforeEpoch);
    }

    u64::try_from(millis)
        .ok()
        .filter(|millis| *millis <= mask(TIMESTAMP_LENGTH))
        .ok_or(SnowflakeTimeError::TimestampTooLarge)
}

impl<SnowflakeEpoch> Display for Snowflake<SnowflakeEpoch> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<SnowflakeEpoch> FromStr for Snowflake<SnowflakeEpoch> {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str(s).map(Self::new)
    }
}

impl<SnowflakeEpoch> From<u64> for Snowflake<SnowflakeEpoch> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<SnowflakeEpoch> From<Snowflake<SnowflakeEpoch>> for u64 {
    fn from(value: Snowflake<SnowflakeEpoch>) -> Self {
        value.get()
    }
}

#[derive_where(Clone, Eq, PartialEq, Debug)]
pub struct SnowflakeGenerator<SnowflakeEpoch> {
    worker_id: WorkerId,
    process_id: ProcessId,
    next_increment: u16,
    phantom_data: PhantomData<SnowflakeEpoch>,
}

impl<SnowflakeEpoch> SnowflakeGenerator<SnowflakeEpoch> {
    #[must_use]
    pub fn new(worker_id: WorkerId, process_id: ProcessId) -> Self {
        Self {
            worker_id,
            process_id,
            next_increment: 0,
            phantom_data: PhantomData,
        }
    }

    /// A generator with random node ids, so that independent clients rarely collide.
    #[must_use]
    pub fn random() -> Self {
        Self::new(WorkerId::random(), ProcessId::random())
    }

    pub fn generate_at(
        &mut self,
        time: OffsetDateTime,
    ) -> Result<Snowflake<SnowflakeEpoch>, SnowflakeTimeError>
    where
        SnowflakeEpoch: Epoch,
    {
        let millis = millis_since_epoch::<SnowflakeEpoch>(time)?;
        Ok(self.next_with_millis(millis))
    }

    /// Generates an id for the current time. A clock set before the epoch yields timestamp zero.
    pub fn generate(&mut self) -> Snowflake<SnowflakeEpoch>
    where
        SnowflakeEpoch: Epoch,
    {
        let millis = match millis_since_epoch::<SnowflakeEpoch>(OffsetDateTime::now_utc()) {
            Ok(millis) => millis,
            Err(SnowflakeTimeError::TimeBeforeEpoch) => 0,
            Err(SnowflakeTimeError::TimestampTooLarge) => mask(TIMESTAMP_LENGTH),
        };
        self.next_with_millis(millis)
    }

    fn next_with_millis(&mut self, millis: u64) -> Snowflake<SnowflakeEpoch> {
        let increment = self.next_increment;
        #[allow(clippy::cast_possible_truncation)]
        let wrap = mask(INCREMENT_LENGTH) as u16;
        self.next_increment = if increment == wrap { 0 } else { increment + 1 };

        Snowflake::from_parts(millis, self.worker_id, self.process_id, increment)
    }
}

use core::fmt;

/// Date and time of a directory record, second resolution.
///
/// Stored on disk as 7 bytes: a big-endian year followed by
/// month, day, hour, minute and second bytes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Timestamp {
    /// Size of an encoded timestamp in bytes
    pub const ENCODED_SIZE: usize = 7;

    #[must_use]
    #[inline]
    /// Creates a new timestamp.
    ///
    /// Fields are not range-checked: records read from disk may hold anything.
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    #[must_use]
    pub const fn decode(raw: [u8; Self::ENCODED_SIZE]) -> Self {
        Self {
            year: u16::from_be_bytes([raw[0], raw[1]]),
            month: raw[2],
            day: raw[3],
            hour: raw[4],
            minute: raw[5],
            second: raw[6],
        }
    }

    #[must_use]
    pub const fn encode(self) -> [u8; Self::ENCODED_SIZE] {
        let year = self.year.to_be_bytes();
        [
            year[0],
            year[1],
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
        ]
    }

    #[must_use]
    #[inline]
    pub const fn year(&self) -> u16 {
        self.year
    }

    #[must_use]
    #[inline]
    pub const fn month(&self) -> u8 {
        self.month
    }

    #[must_use]
    #[inline]
    pub const fn day(&self) -> u8 {
        self.day
    }

    #[must_use]
    #[inline]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    #[must_use]
    #[inline]
    pub const fn minute(&self) -> u8 {
        self.minute
    }

    #[must_use]
    #[inline]
    pub const fn second(&self) -> u8 {
        self.second
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

pub use parsing_macro::*;

pub use byteorder::{BigEndian, LittleEndian};

/// Byte order used by [`Parse`] implementations.
///
/// Every [`byteorder::ByteOrder`] is an `Endianess`, so primitive reads can
/// go straight through `E::read_u16` and friends.
pub trait Endianess: byteorder::ByteOrder {}

impl<T: byteorder::ByteOrder> Endianess for T {}

pub type LE = LittleEndian;
pub type BE = BigEndian;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("needed {needed} bytes but only {remaining} remain")]
    OutOfData { needed: usize, remaining: usize },
    #[error("magic check failed: expected {expected:#x}, found {found:#x}")]
    BadMagic { expected: u64, found: u64 },
    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("no variant matches type value {value:#06x}")]
    UnknownVariant { value: u64 },
    #[error("declared length {declared} is smaller than its {minimum} byte header")]
    InvalidLength { declared: u64, minimum: usize },
    #[error("offset {offset} is outside a buffer of {len} bytes")]
    SeekOutOfBounds { offset: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Length of a self-delimited block once its own `header_len` bytes are read.
///
/// Meant for `[[limit_buffer = ...]]` directives where the declared size
/// includes the size field itself.
pub fn body_len(declared: u32, header_len: usize) -> Result<usize> {
    (declared as usize)
        .checked_sub(header_len)
        .ok_or(Error::InvalidLength {
            declared: declared as u64,
            minimum: header_len,
        })
}

pub trait ReadBytes<'a> {
    fn read_bytes(&mut self, num: usize) -> Result<&'a [u8]>;
    fn read_rest(&mut self) -> &'a [u8];
    fn remaining(&self) -> usize;

    fn skip(&mut self, num: usize) -> Result<()> {
        self.read_bytes(num).map(|_| ())
    }

    fn read_type<E: Endianess, T: Parse<'a, E>>(&mut self) -> Result<T>
    where
        Self: Sized,
    {
        T::parse(self)
    }
    fn read_type_be<T: Parse<'a, BigEndian>>(&mut self) -> Result<T>
    where
        Self: Sized,
    {
        self.read_type::<BigEndian, T>()
    }
    fn read_type_le<T: Parse<'a, LittleEndian>>(&mut self) -> Result<T>
    where
        Self: Sized,
    {
        self.read_type::<LittleEndian, T>()
    }
}

impl<'a> ReadBytes<'a> for &'a [u8] {
    fn read_bytes(&mut self, num: usize) -> Result<&'a [u8]> {
        match self.split_at_checked(num) {
            Some((front, back)) => {
                *self = back;
                Ok(front)
            }
            None => Err(Error::OutOfData {
                needed: num,
                remaining: self.len(),
            }),
        }
    }

    fn read_rest(&mut self) -> &'a [u8] {
        std::mem::take(self)
    }

    fn remaining(&self) -> usize {
        self.len()
    }
}

/// Seekable cursor over a borrowed buffer.
///
/// Unlike a plain `&[u8]`, a cursor remembers where it started, so callers can
/// report absolute offsets and jump back to a recorded position.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Moves to an absolute offset. Seeking to the very end is allowed.
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        if offset > self.data.len() {
            return Err(Error::SeekOutOfBounds {
                offset,
                len: self.data.len(),
            });
        }
        self.pos = offset;
        Ok(())
    }
}

impl<'a> ReadBytes<'a> for Cursor<'a> {
    fn read_bytes(&mut self, num: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if num > remaining {
            return Err(Error::OutOfData {
                needed: num,
                remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + num];
        self.pos += num;
        Ok(bytes)
    }

    fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.data[self.pos..];
        self.pos = self.data.len();
        rest
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

pub trait Parse<'a, E: Endianess>: Sized {
    fn parse(input: &mut impl ReadBytes<'a>) -> Result<Self>;
}

impl<'a, E: Endianess> Parse<'a, E> for u8 {
    fn parse(input: &mut impl ReadBytes<'a>) -> Result<Self> {
        Ok(input.read_bytes(1)?[0])
    }
}

impl<'a, E: Endianess> Parse<'a, E> for i8 {
    fn parse(input: &mut impl ReadBytes<'a>) -> Result<Self> {
        Ok(input.read_bytes(1)?[0] as i8)
    }
}

macro_rules! impl_primitive_parse {
    ($typ: ty, $read: ident) => {
        impl<'a, E: Endianess> Parse<'a, E> for $typ {
            fn parse(input: &mut impl ReadBytes<'a>) -> Result<Self> {
                let bytes = input.read_bytes(std::mem::size_of::<$typ>())?;
                Ok(E::$read(bytes))
            }
        }
    };
}

impl_primitive_parse!(u16, read_u16);
impl_primitive_parse!(u32, read_u32);
impl_primitive_parse!(u64, read_u64);

impl_primitive_parse!(i16, read_i16);
impl_primitive_parse!(i32, read_i32);
impl_primitive_parse!(i64, read_i64);

impl_primitive_parse!(f32, read_f32);
impl_primitive_parse!(f64, read_f64);

impl<'a, E, T, const N: usize> Parse<'a, E> for [T; N]
where
    E: Endianess,
    T: Parse<'a, E> + Copy + Default,
{
    fn parse(input: &mut impl ReadBytes<'a>) -> Result<Self> {
        let mut out = [T::default(); N];
        for i in out.iter_mut() {
            *i = input.read_type::<E, T>()?;
        }
        Ok(out)
    }
}

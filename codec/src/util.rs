//! Codec utility functions

use crate::Error;
use bytes::Buf;

/// Checks that the buffer has at least `len` bytes remaining. Returns an error if not.
#[inline]
pub fn at_least<B: Buf>(buf: &mut B, len: usize) -> Result<(), Error> {
    let rem = buf.remaining();
    if rem < len {
        return Err(Error::NoBufferSpace);
    }
    Ok(())
}

/// Converts a decoded length into a `usize`, failing if this platform cannot represent it.
#[inline]
pub fn to_usize(value: u64) -> Result<usize, Error> {
    usize::try_from(value).map_err(|_| Error::TooWidthSize(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_least() {
        let mut buf = &[1u8, 2, 3][..];
        assert!(at_least(&mut buf, 3).is_ok());
        assert_eq!(at_least(&mut buf, 4), Err(Error::NoBufferSpace));
    }

    #[test]
    fn test_to_usize() {
        assert_eq!(to_usize(7), Ok(7));
        #[cfg(target_pointer_width = "32")]
        assert_eq!(to_usize(u64::MAX), Err(Error::TooWidthSize(u64::MAX)));
    }
}

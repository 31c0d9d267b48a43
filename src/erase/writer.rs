//! Batched pattern writer.
//!
//! One pass writes `size` bytes from a [`ByteGenerator`] through positioned
//! writes of at most `batch_size` bytes. Peak memory is one batch buffer, which
//! is allocated once per pass and refilled for every batch. Offsets are
//! `index * batch_size`, never a running cursor.

use std::io;

use crate::erase::fs::WriteAt;
use crate::erase::pattern::ByteGenerator;

/// Overwrite `[0, size)` of `target` with bytes drawn from `generator`.
///
/// Stops at the first failed write and returns its error; bytes already
/// written stay written.
#[allow(clippy::cast_possible_truncation)]
pub fn write_pattern<W>(
    target: &W,
    size: u64,
    generator: &mut ByteGenerator,
    batch_size: usize,
) -> io::Result<()>
where
    W: WriteAt + ?Sized,
{
    if batch_size == 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "batch size must be non-zero",
        ));
    }

    let batch_len = batch_size as u64;
    let full_batches = size / batch_len;
    // Strictly less than batch_size, so it fits in usize.
    let remainder = (size % batch_len) as usize;

    let buf_len = if full_batches > 0 { batch_size } else { remainder };
    let mut buf = vec![0u8; buf_len];

    for index in 0..full_batches {
        generator.fill(&mut buf);
        target.write_all_at(&buf, index * batch_len)?;
    }

    if remainder > 0 {
        let tail = &mut buf[..remainder];
        generator.fill(tail);
        target.write_all_at(tail, full_batches * batch_len)?;
    }

    Ok(())
}

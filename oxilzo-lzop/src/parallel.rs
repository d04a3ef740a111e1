//! Parallel block compression (requires the `parallel` feature).

use crate::block::{END_OF_STREAM, encode_record};
use crate::options::LzopOptions;
use log::debug;
use oxilzo_core::error::{LzoError, Result};
use oxilzo_lzo1x::Compressor;
use rayon::prelude::*;

/// Compress `data` into an in-memory archive, compressing blocks on the
/// rayon thread pool.
///
/// Blocks are independent, so the output is byte-identical to
/// [`compress`](crate::compress) with the same options.
pub fn compress_parallel(data: &[u8], options: &LzopOptions) -> Result<Vec<u8>> {
    options.validate()?;
    let header = options.header();
    let variant = header.method.variant().ok_or(LzoError::UnsupportedMethod {
        method: header.method as u8,
    })?;
    let flags = header.flags;

    let records: Vec<Vec<u8>> = data
        .par_chunks(options.block_size)
        .map_init(
            || (Compressor::new(variant), Vec::<u8>::new()),
            |(compressor, scratch), chunk| {
                let mut record = Vec::with_capacity(chunk.len() + 32);
                encode_record(compressor, flags, chunk, scratch, &mut record);
                record
            },
        )
        .collect();

    let mut output = header.to_bytes()?;
    output.reserve(records.iter().map(Vec::len).sum::<usize>() + END_OF_STREAM.len());
    for record in &records {
        output.extend_from_slice(record);
    }
    output.extend_from_slice(&END_OF_STREAM);

    debug!(
        "compressed {} bytes into {} in {} parallel blocks",
        data.len(),
        output.len(),
        records.len()
    );
    Ok(output)
}

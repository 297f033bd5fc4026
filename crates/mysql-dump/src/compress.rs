//! Gzip compression of a finished dump.
//!
//! A producer task reads the input and pushes gzip output through a bounded
//! channel; the caller's side writes the chunks to the destination. The
//! producer reports its outcome on a separate result channel, so a failed
//! read surfaces as an error instead of a silently truncated file.

use std::io::Write;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use flate2::write::GzEncoder;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::CompressionLevel;
use crate::error::{DumpError, Result};

/// Chunks in flight between producer and consumer.
const CHANNEL_CAPACITY: usize = 16;

/// Input read size.
const READ_CHUNK: usize = 64 * 1024;

/// Byte counts of a compression run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressStats {
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// Gzip `input` into `output`.
pub async fn compress_stream<R, W>(
    input: R,
    output: &mut W,
    level: CompressionLevel,
) -> Result<CompressStats>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    let (chunk_tx, mut chunk_rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);
    let (result_tx, result_rx) = oneshot::channel::<Result<u64>>();

    tokio::spawn(async move {
        let outcome = produce(input, level, chunk_tx).await;
        // receiver gone means the consumer already failed
        let _ = result_tx.send(outcome);
    });

    let mut bytes_out = 0u64;
    while let Some(chunk) = chunk_rx.recv().await {
        output.write_all(&chunk).await?;
        bytes_out += chunk.len() as u64;
    }
    output.flush().await?;

    let bytes_in = result_rx
        .await
        .map_err(|_| DumpError::Compression("compression task ended without a result".into()))??;

    Ok(CompressStats {
        bytes_in,
        bytes_out,
    })
}

async fn produce<R>(mut input: R, level: CompressionLevel, tx: mpsc::Sender<Bytes>) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut encoder = GzEncoder::new(Vec::new(), level.to_flate2());
    let mut buf = vec![0u8; READ_CHUNK];
    let mut total = 0u64;

    loop {
        let n = input.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n as u64;
        encoder
            .write_all(&buf[..n])
            .map_err(|e| DumpError::Compression(e.to_string()))?;

        let pending = std::mem::take(encoder.get_mut());
        if !pending.is_empty() {
            send(&tx, pending).await?;
        }
    }

    let tail = encoder
        .finish()
        .map_err(|e| DumpError::Compression(e.to_string()))?;
    if !tail.is_empty() {
        send(&tx, tail).await?;
    }
    Ok(total)
}

async fn send(tx: &mpsc::Sender<Bytes>, data: Vec<u8>) -> Result<()> {
    tx.send(Bytes::from(data))
        .await
        .map_err(|_| DumpError::Compression("output side closed".into()))
}

/// Path of the compressed file: `<path>.gz`.
pub fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Compress `path` to `<path>.gz` and remove the original.
///
/// On failure the partial `.gz` is removed and the original kept.
pub async fn compress_file(path: &Path, level: CompressionLevel) -> Result<PathBuf> {
    let target = gz_path(path);
    debug!("Compressing {} to {}", path.display(), target.display());

    let input = File::open(path).await?;
    let outcome = async {
        let mut output = BufWriter::new(File::create(&target).await?);
        let stats = compress_stream(input, &mut output, level).await?;
        output.into_inner().sync_all().await?;
        Ok::<_, DumpError>(stats)
    }
    .await;

    match outcome {
        Ok(stats) => {
            tokio::fs::remove_file(path).await?;
            info!(
                "Compressed {} ({} -> {} bytes)",
                target.display(),
                stats.bytes_in,
                stats.bytes_out
            );
            Ok(target)
        }
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&target).await {
                warn!("Could not remove partial {}: {}", target.display(), cleanup);
            }
            Err(e)
        }
    }
}

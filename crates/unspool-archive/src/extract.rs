use std::io::Read;

use tracing::info;
use unspool_fs::Ownership;

use crate::error::Result;
use crate::format::{self, CompressionKind, Decoder};
use crate::materialize::{Materializer, Outcome};
use crate::options::ArchiveRequest;
use crate::tar::TarDecoder;

/// Extract `request.source_path` into `request.destination_dir`.
///
/// Checks run in this order, each before any later step: suffix
/// classification, destination existence, owner/group resolution. Only then
/// is the archive opened. The first failing entry aborts the extraction and
/// leaves whatever was already written in place.
#[tracing::instrument(
    skip_all,
    fields(
        source = %request.source_path.display(),
        destination = %request.destination_dir.display(),
    )
)]
pub fn extract(request: &ArchiveRequest) -> Result<()> {
    let kind = CompressionKind::from_path(&request.source_path)?;
    let ownership = prepare(request)?;
    let stream = format::open_as(&request.source_path, kind)?;
    run(stream, ownership, request)
}

/// Like [`extract`], for a stream the caller already opened.
///
/// `request.source_path` is only used in error reports.
#[tracing::instrument(
    skip_all,
    fields(
        kind = %kind,
        destination = %request.destination_dir.display(),
    )
)]
pub fn extract_from_reader<R: Read>(
    reader: R,
    kind: CompressionKind,
    request: &ArchiveRequest,
) -> Result<()> {
    let ownership = prepare(request)?;
    let stream = kind.decoder(reader, &request.source_path)?;
    run(stream, ownership, request)
}

fn prepare(request: &ArchiveRequest) -> Result<Ownership> {
    unspool_fs::require_dir(&request.destination_dir)?;
    Ok(Ownership::resolve(&request.owner, &request.group)?)
}

/// Owns the handle chain for the duration of one extraction.
fn run<R: Read>(stream: Decoder<R>, ownership: Ownership, request: &ArchiveRequest) -> Result<()> {
    info!(
        kind = %stream.kind(),
        strip_components = request.strip_components,
        uid = ownership.uid(),
        gid = ownership.gid(),
        "extracting archive"
    );

    let mut decoder = TarDecoder::with_limits(stream, request.limits.clone());
    let materializer = Materializer::new(request, ownership);

    let mut materialized = 0usize;
    let mut skipped = 0usize;
    while let Some(entry) = decoder.next_entry()? {
        match materializer.materialize(entry)? {
            Outcome::Materialized(_) => materialized += 1,
            Outcome::Skipped => skipped += 1,
        }
    }

    info!(materialized, skipped, bytes = decoder.offset(), "extraction finished");
    Ok(())
}

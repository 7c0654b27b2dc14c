use parsing::{Cursor, ReadBytes};

use crate::ase_file::{AsepriteFile, Chunk, ChunkHeader, Frame, HEADER_LEN};
use crate::assembler::DocumentAssembler;
use crate::document::{Header, Sprite};
use crate::error::{DecodeError, Result};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DecodeOptions {
    /// Fail on chunk types this decoder does not know instead of skipping them.
    pub strict_unknown_chunks: bool,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            strict_unknown_chunks: true,
        }
    }
}

/// Decodes a whole `.aseprite` file held in memory.
pub fn decode(bytes: &[u8], options: &DecodeOptions) -> Result<Sprite> {
    let mut input = Cursor::new(bytes);
    let file = input.read_type_le::<AsepriteFile>()?;
    let header = Header::from_raw(&file)?;
    log::debug!(
        "{}x{} sprite, {:?}, {} frames",
        header.width,
        header.height,
        header.color_depth,
        header.frame_count
    );
    if input.remaining() > 0 {
        log::debug!(
            "{} bytes after the declared file size are ignored",
            input.remaining()
        );
    }

    let mut assembler = DocumentAssembler::new(header);
    let mut frames = Cursor::new(file.frame_bytes);
    for index in 0..file.num_frames {
        let offset = HEADER_LEN + frames.position();
        let frame = frames.read_type_le::<Frame>()?;
        log::debug!(
            "frame {index} at {offset:#x}: {} bytes, {} chunks",
            frame.frame_size,
            frame.num_chunks()
        );
        decode_chunks(&frame, options, &mut assembler)?;
        assembler.finish_frame(frame.frame_dur_ms);
    }

    Ok(assembler.finish())
}

/// Size of the frame header in front of the chunks.
const FRAME_HEADER_LEN: usize = 16;

fn decode_chunks(
    frame: &Frame<'_>,
    options: &DecodeOptions,
    assembler: &mut DocumentAssembler,
) -> Result<()> {
    let mut chunks = Cursor::new(frame.chunk_bytes);
    for _ in 0..frame.num_chunks() {
        let start = chunks.position();
        let header = chunks.read_type_le::<ChunkHeader>()?;
        chunks.seek(start)?;

        // the chunk enum always consumes the declared span, known type or not
        match chunks.read_type_le::<Chunk>() {
            Ok(chunk) => {
                log::debug!(
                    "  {} chunk at +{:#x}, {} bytes",
                    chunk.name(),
                    FRAME_HEADER_LEN + start,
                    header.chunk_size
                );
                assembler.push_chunk(chunk)?;
            }
            Err(parsing::Error::UnknownVariant { .. }) if !options.strict_unknown_chunks => {
                log::warn!(
                    "skipping unknown chunk type {:#06x} ({} bytes)",
                    header.chunk_type,
                    header.chunk_size
                );
            }
            Err(err) => return Err(DecodeError::from(err)),
        }
    }
    if chunks.remaining() > 0 {
        log::debug!("{} unread bytes at the end of the frame", chunks.remaining());
    }
    Ok(())
}

//! Builds a [`Sprite`] out of the chunk stream.
//!
//! Chunks only make sense in the order they were written: user data belongs
//! to whatever came right before it, linked cels point back at frames that
//! are already done, and layers find their parent through the layers before
//! them. The assembler keeps that running state.

use std::collections::BTreeMap;
use std::mem;

use byteorder::{ByteOrder, LittleEndian};
use rgb::{RGB8, RGBA8};

use crate::ase_file::{self as wire, CelContent, Chunk};
use crate::compression::inflate_exact;
use crate::document::*;
use crate::error::{DecodeError, Result};

/// Largest palette a file may grow the running palette to.
const MAX_PALETTE_LEN: usize = 1 << 16;

fn check_palette_len(len: u64) -> Result<()> {
    if len > MAX_PALETTE_LEN as u64 {
        return Err(DecodeError::PaletteTooLarge {
            len,
            max: MAX_PALETTE_LEN,
        });
    }
    Ok(())
}

/// The entity the next user data chunk attaches to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum UserDataTarget {
    Sprite,
    Layer(usize),
    /// index into the cels of the frame being decoded
    Cel(usize),
    /// tags are annotated one after the other
    Tags { next: usize, end: usize },
    Slice(usize),
    /// the tileset first, then its tiles in order
    Tileset { id: u32, next_tile: Option<u32> },
}

pub struct DocumentAssembler {
    header: Header,
    frames: Vec<Frame>,
    cels: Vec<Cel>,
    layers: LayerTree,
    /// (layer index, child level) of the open groups
    layer_stack: Vec<(usize, u16)>,
    palette: Palette,
    seen_new_palette: bool,
    tags: Vec<Tag>,
    slices: Vec<Slice>,
    tilesets: BTreeMap<u32, Tileset>,
    external_files: BTreeMap<u32, ExternalFile>,
    color_profile: Option<ColorProfile>,
    masks: Vec<Mask>,
    user_data: Option<UserData>,
    user_data_target: Option<UserDataTarget>,
}

impl DocumentAssembler {
    pub fn new(header: Header) -> Self {
        Self {
            palette: Palette::with_len(header.color_count()),
            header,
            frames: Vec::new(),
            cels: Vec::new(),
            layers: LayerTree::default(),
            layer_stack: Vec::new(),
            seen_new_palette: false,
            tags: Vec::new(),
            slices: Vec::new(),
            tilesets: BTreeMap::new(),
            external_files: BTreeMap::new(),
            color_profile: None,
            masks: Vec::new(),
            user_data: None,
            user_data_target: None,
        }
    }

    fn frame_index(&self) -> usize {
        self.frames.len()
    }

    pub fn push_chunk(&mut self, chunk: Chunk<'_>) -> Result<()> {
        match chunk {
            Chunk::OldPaletteA(palette) => self.old_palette(&palette, false)?,
            Chunk::OldPaletteB(palette) => self.old_palette(&palette, true)?,
            Chunk::Layer(layer) => self.layer(&layer),
            Chunk::Cel(cel) => self.cel(&cel)?,
            Chunk::CelExtra(extra) => self.cel_extra(&extra),
            Chunk::ColorProfile(profile) => self.color_profile(&profile),
            Chunk::ExternalFiles(files) => self.external_files(&files),
            Chunk::Mask(mask) => self.mask(&mask),
            Chunk::Path(_) => self.user_data_target = None,
            Chunk::Tags(tags) => self.tags(&tags),
            Chunk::Palette(palette) => self.palette(&palette)?,
            Chunk::UserData(data) => self.attach_user_data(&data),
            Chunk::Slice(slice) => self.slice(&slice)?,
            Chunk::Tileset(tileset) => self.tileset(&tileset)?,
        }
        Ok(())
    }

    /// Closes the frame whose chunks were just pushed.
    pub fn finish_frame(&mut self, duration_ms: u16) {
        self.frames.push(Frame {
            duration_ms,
            cels: mem::take(&mut self.cels),
        });
        self.user_data_target = None;
    }

    pub fn finish(mut self) -> Sprite {
        if !self.cels.is_empty() {
            log::warn!("{} cels outside of any frame were dropped", self.cels.len());
        }
        for tileset in self.tilesets.values_mut() {
            if let TilesetSource::External(link) = &mut tileset.source {
                link.file_name = self
                    .external_files
                    .get(&link.file_id)
                    .map(|file| file.name.clone());
                if link.file_name.is_none() {
                    log::warn!(
                        "tileset {} links to unknown external file {}",
                        tileset.id,
                        link.file_id
                    );
                }
            }
        }
        Sprite {
            header: self.header,
            frames: self.frames,
            layers: self.layers,
            palette: self.palette,
            tags: self.tags,
            slices: self.slices,
            tilesets: self.tilesets,
            external_files: self.external_files,
            color_profile: self.color_profile,
            masks: self.masks,
            user_data: self.user_data,
        }
    }

    fn palette_target(&mut self) {
        self.user_data_target = (self.frame_index() == 0).then_some(UserDataTarget::Sprite);
    }

    fn old_palette(&mut self, chunk: &wire::OldPaletteChunk<'_>, six_bit: bool) -> Result<()> {
        self.palette_target();
        if self.seen_new_palette {
            log::debug!("old palette ignored, a new palette chunk was already seen");
            return Ok(());
        }
        let mut index = 0;
        for packet in &chunk.packets {
            index += packet.num_skip as usize;
            for [r, g, b] in packet.colors() {
                check_palette_len(index as u64 + 1)?;
                let color = if six_bit {
                    RGBA8::new(
                        wire::expand_six_bit(r),
                        wire::expand_six_bit(g),
                        wire::expand_six_bit(b),
                        255,
                    )
                } else {
                    RGBA8::new(r, g, b, 255)
                };
                self.palette.set(index, PaletteEntry { color, name: None });
                index += 1;
            }
        }
        Ok(())
    }

    fn palette(&mut self, chunk: &wire::PaletteChunk<'_>) -> Result<()> {
        if chunk.last_ind < chunk.first_ind {
            return Err(DecodeError::InvalidPaletteRange {
                first: chunk.first_ind,
                last: chunk.last_ind,
            });
        }
        check_palette_len(chunk.new_palette_size as u64)?;
        check_palette_len(chunk.last_ind as u64 + 1)?;
        self.seen_new_palette = true;
        self.palette_target();

        if chunk.new_palette_size > 0 {
            self.palette.resize(chunk.new_palette_size as usize);
        }
        for (entry, index) in chunk.entries.iter().zip(chunk.first_ind as usize..) {
            let [r, g, b, a] = entry.rgba;
            self.palette.set(
                index,
                PaletteEntry {
                    color: RGBA8::new(r, g, b, a),
                    name: entry.name.map(|name| name.text.to_owned()),
                },
            );
        }
        Ok(())
    }

    fn layer(&mut self, chunk: &wire::LayerChunk<'_>) {
        let kind = match chunk.layer_type {
            0 => LayerKind::Normal,
            1 => LayerKind::Group,
            2 => LayerKind::Tilemap,
            other => {
                log::warn!("layer {:?} has unknown type {other}", chunk.layer_name);
                LayerKind::Normal
            }
        };
        let depth = chunk.child_level;
        while self
            .layer_stack
            .last()
            .is_some_and(|&(_, level)| level >= depth)
        {
            self.layer_stack.pop();
        }
        let parent = self.layer_stack.last().map(|&(index, _)| index);

        let index = self.layers.push(
            Layer {
                name: chunk.layer_name.to_owned(),
                kind,
                flags: LayerFlags(chunk.flags),
                blend_mode: BlendMode::from_raw(chunk.blend_mode),
                opacity: chunk.opacity,
                child_level: depth,
                tileset_index: chunk.tileset_index,
                user_data: None,
            },
            parent,
        );
        self.layer_stack.push((index, depth));
        self.user_data_target = Some(UserDataTarget::Layer(index));
    }

    fn cel(&mut self, chunk: &wire::CelChunk<'_>) -> Result<()> {
        let frame_index = self.frame_index();
        let depth = self.header.color_depth;
        let payload = match chunk.content()? {
            CelContent::Raw(image) => {
                let len = image_len(image.width as u32, image.height as u32, depth)?;
                let data = image.data.get(..len).ok_or(DecodeError::OutOfData {
                    needed: len,
                    remaining: image.data.len(),
                })?;
                CelPayload::RawImage(Image::new(
                    image.width as u32,
                    image.height as u32,
                    data.to_vec(),
                ))
            }
            CelContent::Compressed(image) => {
                let len = image_len(image.width as u32, image.height as u32, depth)?;
                CelPayload::CompressedImage(Image::new(
                    image.width as u32,
                    image.height as u32,
                    inflate_exact(image.data, len)?,
                ))
            }
            CelContent::Linked(link) => {
                let target = self.linked_payload(chunk.layer_ind, link.frame_position)?;
                CelPayload::Linked(LinkedCel {
                    frame: link.frame_position,
                    target: Box::new(target),
                })
            }
            CelContent::CompressedTilemap(map) => CelPayload::CompressedTilemap(tilemap(&map)?),
        };

        self.cels.push(Cel {
            layer_index: chunk.layer_ind,
            frame_index,
            x: chunk.x_pos,
            y: chunk.y_pos,
            opacity: chunk.opacity,
            z_index: chunk.z_ind,
            payload,
            precise_bounds: None,
            user_data: None,
        });
        self.user_data_target = Some(UserDataTarget::Cel(self.cels.len() - 1));
        Ok(())
    }

    /// Copies the payload a linked cel points at. Only finished frames can be
    /// linked to, and the target must own its data.
    fn linked_payload(&self, layer: u16, target: u16) -> Result<CelPayload> {
        let dangling = || DecodeError::DanglingCelLink {
            layer,
            frame: self.frame_index(),
            target,
        };
        let cel = self
            .frames
            .get(target as usize)
            .and_then(|frame| frame.cel(layer))
            .ok_or_else(dangling)?;
        if cel.payload.is_linked() {
            return Err(dangling());
        }
        Ok(cel.payload.clone())
    }

    fn cel_extra(&mut self, chunk: &wire::CelExtraChunk) {
        let Some(cel) = self.cels.last_mut() else {
            log::warn!("cel extra chunk without a preceding cel");
            return;
        };
        if chunk.precise_bounds_set() {
            cel.precise_bounds = Some(PreciseBounds {
                x: chunk.precise_x.as_float(),
                y: chunk.precise_y.as_float(),
                width: chunk.width.as_float(),
                height: chunk.height.as_float(),
            });
        }
    }

    fn color_profile(&mut self, chunk: &wire::ColorProfileChunk<'_>) {
        let kind = match chunk.typ {
            0 => ColorProfileKind::None,
            1 => ColorProfileKind::Srgb,
            2 => ColorProfileKind::EmbeddedIcc,
            other => {
                log::warn!("unknown color profile type {other}");
                ColorProfileKind::Unknown(other)
            }
        };
        self.color_profile = Some(ColorProfile {
            kind,
            fixed_gamma: chunk
                .uses_fixed_gamma()
                .then(|| chunk.fixed_gamma.as_float()),
            icc: chunk.icc_profile.map(|blob| blob.bytes.to_vec()),
        });
        self.user_data_target = None;
    }

    fn external_files(&mut self, chunk: &wire::ExternalFilesChunk<'_>) {
        for entry in &chunk.entries {
            self.external_files.insert(
                entry.id,
                ExternalFile {
                    id: entry.id,
                    kind: ExternalFileKind::from_raw(entry.typ),
                    name: entry.file_name.to_owned(),
                },
            );
        }
        self.user_data_target = None;
    }

    fn mask(&mut self, chunk: &wire::MaskChunk<'_>) {
        self.masks.push(Mask {
            x: chunk.x_pos,
            y: chunk.y_pos,
            width: chunk.width,
            height: chunk.height,
            name: chunk.mask_name.to_owned(),
            bitmap: chunk.bitmap.to_vec(),
        });
        self.user_data_target = None;
    }

    fn tags(&mut self, chunk: &wire::TagsChunk<'_>) {
        let first = self.tags.len();
        for tag in &chunk.tags {
            let direction = LoopDirection::from_raw(tag.direction).unwrap_or_else(|| {
                log::warn!(
                    "tag {:?} has unknown direction {}, playing forward",
                    tag.tag_name,
                    tag.direction
                );
                LoopDirection::Forward
            });
            let [r, g, b] = tag.color;
            self.tags.push(Tag {
                from: tag.start_ind,
                to: tag.end_ind,
                direction,
                repeat: tag.repeat,
                color: RGB8::new(r, g, b),
                name: tag.tag_name.to_owned(),
                user_data: None,
            });
        }
        let end = self.tags.len();
        self.user_data_target = (first < end).then_some(UserDataTarget::Tags { next: first, end });
    }

    fn slice(&mut self, chunk: &wire::SliceChunk<'_>) -> Result<()> {
        let keys = chunk
            .keys()?
            .into_iter()
            .map(|key| SliceKey {
                frame: key.frame,
                bounds: bounds(key.bounds),
                center: key.center.map(bounds),
                pivot: key.pivot.map(|p| (p.x, p.y)),
            })
            .collect();
        self.slices.push(Slice {
            name: chunk.slice_name.to_owned(),
            nine_patch: chunk.is_nine_patch(),
            has_pivot: chunk.has_pivot(),
            keys,
            user_data: None,
        });
        self.user_data_target = Some(UserDataTarget::Slice(self.slices.len() - 1));
        Ok(())
    }

    fn tileset(&mut self, chunk: &wire::TilesetChunk<'_>) -> Result<()> {
        let source = match (chunk.image, chunk.external) {
            (Some(blob), _) => {
                let height = (chunk.tile_height as u32)
                    .checked_mul(chunk.num_tiles)
                    .ok_or_else(|| too_large(chunk.tile_width as u32, u32::MAX))?;
                let len = image_len(chunk.tile_width as u32, height, self.header.color_depth)?;
                TilesetSource::Embedded(Image::new(
                    chunk.tile_width as u32,
                    height,
                    inflate_exact(blob.bytes, len)?,
                ))
            }
            (None, Some(link)) => TilesetSource::External(ExternalTileset {
                file_id: link.file_id,
                tileset_id: link.tileset_id,
                file_name: None,
            }),
            (None, None) => {
                log::warn!("tileset {} has neither tiles nor an external link", chunk.id);
                TilesetSource::Missing
            }
        };

        self.tilesets.insert(
            chunk.id,
            Tileset {
                id: chunk.id,
                tile_count: chunk.num_tiles,
                tile_width: chunk.tile_width,
                tile_height: chunk.tile_height,
                base_index: chunk.base_index,
                name: chunk.tileset_name.to_owned(),
                source,
                user_data: None,
                tile_user_data: BTreeMap::new(),
            },
        );
        self.user_data_target = Some(UserDataTarget::Tileset {
            id: chunk.id,
            next_tile: None,
        });
        Ok(())
    }

    fn attach_user_data(&mut self, chunk: &wire::UserDataChunk<'_>) {
        let data = UserData {
            text: chunk.text.map(|text| text.text.to_owned()),
            color: chunk.rgba.map(|[r, g, b, a]| RGBA8::new(r, g, b, a)),
        };
        let Some(target) = self.user_data_target.take() else {
            log::warn!("user data chunk has nothing to attach to");
            return;
        };

        match target {
            UserDataTarget::Sprite => self.user_data = Some(data),
            UserDataTarget::Layer(index) => {
                if let Some(layer) = self.layers.get_mut(index) {
                    layer.user_data = Some(data);
                }
            }
            UserDataTarget::Cel(index) => {
                if let Some(cel) = self.cels.get_mut(index) {
                    cel.user_data = Some(data);
                }
            }
            UserDataTarget::Tags { next, end } => {
                if let Some(tag) = self.tags.get_mut(next) {
                    tag.user_data = Some(data);
                }
                if next + 1 < end {
                    self.user_data_target = Some(UserDataTarget::Tags {
                        next: next + 1,
                        end,
                    });
                }
            }
            UserDataTarget::Slice(index) => {
                if let Some(slice) = self.slices.get_mut(index) {
                    slice.user_data = Some(data);
                }
            }
            UserDataTarget::Tileset { id, next_tile } => {
                let Some(tileset) = self.tilesets.get_mut(&id) else {
                    return;
                };
                match next_tile {
                    None => tileset.user_data = Some(data),
                    Some(tile) => {
                        tileset.tile_user_data.insert(tile, data);
                    }
                }
                let following = next_tile.map_or(0, |tile| tile + 1);
                if following < tileset.tile_count {
                    self.user_data_target = Some(UserDataTarget::Tileset {
                        id,
                        next_tile: Some(following),
                    });
                }
            }
        }
    }
}

fn bounds(rect: wire::Rect) -> Bounds {
    Bounds {
        x: rect.tl.x,
        y: rect.tl.y,
        width: rect.size.w,
        height: rect.size.h,
    }
}

fn too_large(width: u32, height: u32) -> DecodeError {
    DecodeError::CorruptCompressedData(format!("a {width}x{height} image does not fit in memory"))
}

/// Byte size of a `width` x `height` image at `depth`.
fn image_len(width: u32, height: u32, depth: ColorDepth) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(depth.bytes_per_pixel()))
        .ok_or_else(|| too_large(width, height))
}

fn tilemap(map: &wire::TilemapCel<'_>) -> Result<Tilemap> {
    let bytes_per_tile = match map.bits_per_tile {
        8 | 16 | 32 => map.bits_per_tile as usize / 8,
        other => return Err(DecodeError::UnsupportedBitsPerTile(other)),
    };
    let count = map.width as usize * map.height as usize;
    let data = inflate_exact(map.data, count * bytes_per_tile)?;

    let tiles = match bytes_per_tile {
        1 => data.iter().map(|&tile| tile as u32).collect(),
        2 => data
            .chunks_exact(2)
            .map(|tile| LittleEndian::read_u16(tile) as u32)
            .collect(),
        _ => {
            let mut tiles = vec![0; count];
            LittleEndian::read_u32_into(&data, &mut tiles);
            tiles
        }
    };
    Ok(Tilemap::new(
        map.width,
        map.height,
        map.bits_per_tile,
        TileMasks {
            tile_id: map.tile_id_mask,
            x_flip: map.x_flip_mask,
            y_flip: map.y_flip_mask,
            rotation: map.rotation_mask,
        },
        tiles,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ase_file::AsepriteFile;

    fn header(depth: u16, color_num: u16) -> Header {
        let file = AsepriteFile {
            file_size: 128,
            num_frames: 1,
            width: 4,
            height: 4,
            color_depth: depth,
            flags: 1,
            frame_ms_dur: 100,
            invis_palette_ind: 0,
            color_num,
            pix_width: 0,
            pix_height: 0,
            grid_x_pos: 0,
            grid_y_pos: 0,
            grid_width: 16,
            grid_height: 16,
            frame_bytes: &[],
        };
        Header::from_raw(&file).unwrap()
    }

    fn layer_chunk(name: &str, child_level: u16) -> wire::LayerChunk<'_> {
        wire::LayerChunk {
            flags: 1,
            layer_type: 0,
            child_level,
            default_width: 0,
            default_height: 0,
            blend_mode: 0,
            opacity: 255,
            layer_name: name,
            tileset_index: None,
        }
    }

    fn user_data(text: &str) -> wire::UserDataChunk<'_> {
        wire::UserDataChunk {
            flags: 1,
            text: Some(wire::AseString { text }),
            rgba: None,
        }
    }

    /// 1x1 raw image tail
    fn raw_cel(pixel: u8) -> Vec<u8> {
        vec![1, 0, 1, 0, pixel]
    }

    fn push_raw_cel(assembler: &mut DocumentAssembler, layer: u16, rest: &[u8]) -> Result<()> {
        assembler.push_chunk(Chunk::Cel(wire::CelChunk {
            layer_ind: layer,
            x_pos: 0,
            y_pos: 0,
            opacity: 255,
            cel_type: 0,
            z_ind: 0,
            rest,
        }))
    }

    #[test]
    fn depth_stack_recovers_parents() {
        let mut asm = DocumentAssembler::new(header(32, 0));
        for (name, level) in [("a", 0), ("b", 1), ("c", 2), ("d", 1), ("e", 0), ("f", 2)] {
            asm.push_chunk(Chunk::Layer(layer_chunk(name, level))).unwrap();
        }
        let sprite = asm.finish();
        let tree = sprite.layers();
        assert_eq!(tree.parent(0), None);
        assert_eq!(tree.parent(1), Some(0));
        assert_eq!(tree.parent(2), Some(1));
        assert_eq!(tree.parent(3), Some(0));
        assert_eq!(tree.parent(4), None);
        // skipped a level, hangs off the nearest shallower layer
        assert_eq!(tree.parent(5), Some(4));
        assert_eq!(tree.children(0).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn initial_palette_follows_header() {
        assert_eq!(DocumentAssembler::new(header(8, 0)).finish().palette().len(), 256);
        assert_eq!(DocumentAssembler::new(header(8, 16)).finish().palette().len(), 16);
    }

    #[test]
    fn palette_resize_then_write() {
        let mut asm = DocumentAssembler::new(header(32, 8));
        let entry = |v| wire::PaletteEntry {
            flags: 0,
            rgba: [v, v, v, 255],
            name: None,
        };
        // shrinks below `last`, the write grows it back
        asm.push_chunk(Chunk::Palette(wire::PaletteChunk {
            new_palette_size: 2,
            first_ind: 2,
            last_ind: 3,
            entries: vec![entry(7), entry(9)],
        }))
        .unwrap();
        let sprite = asm.finish();
        assert_eq!(sprite.palette().len(), 4);
        assert_eq!(sprite.palette().color(3), Some(RGBA8::new(9, 9, 9, 255)));
    }

    #[test]
    fn inverted_palette_range() {
        let mut asm = DocumentAssembler::new(header(32, 8));
        let err = asm
            .push_chunk(Chunk::Palette(wire::PaletteChunk {
                new_palette_size: 0,
                first_ind: 5,
                last_ind: 4,
                entries: Vec::new(),
            }))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidPaletteRange { first: 5, last: 4 }
        ));
    }

    #[test]
    fn palette_growth_is_bounded() {
        let oversized = |new_palette_size: u32, first_ind: u32, last_ind: u32| {
            let mut asm = DocumentAssembler::new(header(32, 8));
            asm.push_chunk(Chunk::Palette(wire::PaletteChunk {
                new_palette_size,
                first_ind,
                last_ind,
                entries: vec![wire::PaletteEntry {
                    flags: 0,
                    rgba: [9; 4],
                    name: None,
                }],
            }))
            .unwrap_err()
        };
        assert!(matches!(
            oversized(0, 0xFFFF_FFF0, 0xFFFF_FFF0),
            DecodeError::PaletteTooLarge { len: 0xFFFF_FFF1, .. }
        ));
        assert!(matches!(
            oversized(u32::MAX, 0, 0),
            DecodeError::PaletteTooLarge { len: 0xFFFF_FFFF, .. }
        ));

        let mut asm = DocumentAssembler::new(header(32, 8));
        asm.push_chunk(Chunk::Palette(wire::PaletteChunk {
            new_palette_size: MAX_PALETTE_LEN as u32,
            first_ind: MAX_PALETTE_LEN as u32 - 1,
            last_ind: MAX_PALETTE_LEN as u32 - 1,
            entries: vec![wire::PaletteEntry {
                flags: 0,
                rgba: [9; 4],
                name: None,
            }],
        }))
        .unwrap();
        assert_eq!(asm.finish().palette().len(), MAX_PALETTE_LEN);
    }

    #[test]
    fn old_palette_skips_are_bounded() {
        let colors = [0_u8; 3 * 256];
        let packets = (0..300)
            .map(|_| wire::OldPalettePacket {
                num_skip: 255,
                colors: &colors,
            })
            .collect();
        let mut asm = DocumentAssembler::new(header(8, 4));
        let err = asm
            .push_chunk(Chunk::OldPaletteA(wire::OldPaletteChunk { packets }))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::PaletteTooLarge {
                max: MAX_PALETTE_LEN,
                ..
            }
        ));
    }

    #[test]
    fn old_palette_after_new_is_ignored() {
        let mut asm = DocumentAssembler::new(header(8, 4));
        asm.push_chunk(Chunk::Palette(wire::PaletteChunk {
            new_palette_size: 1,
            first_ind: 0,
            last_ind: 0,
            entries: vec![wire::PaletteEntry {
                flags: 1,
                rgba: [1, 2, 3, 4],
                name: Some(wire::AseString { text: "ink" }),
            }],
        }))
        .unwrap();
        asm.push_chunk(Chunk::OldPaletteA(wire::OldPaletteChunk {
            packets: vec![wire::OldPalettePacket {
                num_skip: 0,
                colors: &[9, 9, 9],
            }],
        }))
        .unwrap();
        let sprite = asm.finish();
        let entry = sprite.palette().get(0).unwrap();
        assert_eq!(entry.color, RGBA8::new(1, 2, 3, 4));
        assert_eq!(entry.name.as_deref(), Some("ink"));
    }

    #[test]
    fn old_palette_packets_skip() {
        let mut asm = DocumentAssembler::new(header(8, 4));
        asm.push_chunk(Chunk::OldPaletteB(wire::OldPaletteChunk {
            packets: vec![wire::OldPalettePacket {
                num_skip: 2,
                colors: &[0x3F, 0x00, 0x20],
            }],
        }))
        .unwrap();
        let sprite = asm.finish();
        assert_eq!(sprite.palette().color(2), Some(RGBA8::new(0xFF, 0, 0x82, 255)));
        assert_eq!(sprite.palette().color(0), Some(RGBA8::new(0, 0, 0, 0)));
    }

    #[test]
    fn user_data_follows_sequence() {
        let mut asm = DocumentAssembler::new(header(8, 4));
        asm.push_chunk(Chunk::Palette(wire::PaletteChunk {
            new_palette_size: 0,
            first_ind: 0,
            last_ind: 0,
            entries: vec![wire::PaletteEntry {
                flags: 0,
                rgba: [0; 4],
                name: None,
            }],
        }))
        .unwrap();
        asm.push_chunk(Chunk::UserData(user_data("sprite"))).unwrap();
        asm.push_chunk(Chunk::Layer(layer_chunk("bg", 0))).unwrap();
        asm.push_chunk(Chunk::UserData(user_data("layer"))).unwrap();
        asm.push_chunk(Chunk::Tags(wire::TagsChunk {
            tags: vec![
                wire::Tag {
                    start_ind: 0,
                    end_ind: 1,
                    direction: 2,
                    repeat: 0,
                    color: [0; 3],
                    tag_name: "walk",
                },
                wire::Tag {
                    start_ind: 2,
                    end_ind: 3,
                    direction: 9,
                    repeat: 1,
                    color: [0; 3],
                    tag_name: "run",
                },
            ],
        }))
        .unwrap();
        asm.push_chunk(Chunk::UserData(user_data("walk"))).unwrap();
        asm.push_chunk(Chunk::UserData(user_data("run"))).unwrap();
        // nothing left to attach to
        asm.push_chunk(Chunk::UserData(user_data("stray"))).unwrap();
        asm.finish_frame(100);

        let sprite = asm.finish();
        let text = |data: Option<&UserData>| data.and_then(|d| d.text.clone());
        assert_eq!(text(sprite.user_data()), Some("sprite".into()));
        assert_eq!(text(sprite.layers().get(0).unwrap().user_data.as_ref()), Some("layer".into()));
        assert_eq!(text(sprite.tags()[0].user_data.as_ref()), Some("walk".into()));
        assert_eq!(text(sprite.tags()[1].user_data.as_ref()), Some("run".into()));
        assert_eq!(sprite.tags()[0].direction, LoopDirection::PingPong);
        assert_eq!(sprite.tags()[1].direction, LoopDirection::Forward);
    }

    #[test]
    fn linked_cel_needs_an_owned_target() {
        let mut asm = DocumentAssembler::new(header(8, 4));
        push_raw_cel(&mut asm, 0, &raw_cel(3)).unwrap();
        asm.finish_frame(100);

        let link = 0_u16.to_le_bytes();
        let linked = |asm: &mut DocumentAssembler, layer| {
            asm.push_chunk(Chunk::Cel(wire::CelChunk {
                layer_ind: layer,
                x_pos: 0,
                y_pos: 0,
                opacity: 255,
                cel_type: 1,
                z_ind: 0,
                rest: &link,
            }))
        };
        linked(&mut asm, 0).unwrap();
        asm.finish_frame(100);

        let cel = asm.frames[1].cel(0).unwrap();
        assert_eq!(cel.payload.image().unwrap().data(), &[3]);

        // frame 1 is itself linked
        let link = 1_u16.to_le_bytes();
        let err = asm
            .push_chunk(Chunk::Cel(wire::CelChunk {
                layer_ind: 0,
                x_pos: 0,
                y_pos: 0,
                opacity: 255,
                cel_type: 1,
                z_ind: 0,
                rest: &link,
            }))
            .unwrap_err();
        assert!(matches!(
            err,
            DecodeError::DanglingCelLink {
                layer: 0,
                frame: 2,
                target: 1
            }
        ));
        // no cel on layer 1 in frame 0
        assert!(matches!(
            linked(&mut asm, 1),
            Err(DecodeError::DanglingCelLink { layer: 1, .. })
        ));
    }

    #[test]
    fn short_raw_cel() {
        let mut asm = DocumentAssembler::new(header(32, 4));
        let err = push_raw_cel(&mut asm, 0, &raw_cel(1)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::OutOfData {
                needed: 4,
                remaining: 1
            }
        ));
    }

    #[test]
    fn cel_extra_sets_precise_bounds() {
        let mut asm = DocumentAssembler::new(header(8, 4));
        push_raw_cel(&mut asm, 0, &raw_cel(1)).unwrap();
        asm.push_chunk(Chunk::CelExtra(wire::CelExtraChunk {
            flags: 1,
            precise_x: wire::Fixed::from_raw(0x0000_8000),
            precise_y: wire::Fixed::from_raw(0),
            width: wire::Fixed::from_raw(0x0001_0000),
            height: wire::Fixed::from_raw(0x0001_0000),
        }))
        .unwrap();
        asm.push_chunk(Chunk::UserData(user_data("cel"))).unwrap();
        asm.finish_frame(50);
        let sprite = asm.finish();
        let cel = sprite.cel(0, 0).unwrap();
        assert_eq!(cel.precise_bounds.map(|b| b.x), Some(0.5));
        assert_eq!(
            cel.user_data.as_ref().and_then(|d| d.text.as_deref()),
            Some("cel")
        );
    }

    #[test]
    fn tileset_user_data_then_tiles() {
        let mut asm = DocumentAssembler::new(header(32, 4));
        asm.push_chunk(Chunk::ExternalFiles(wire::ExternalFilesChunk {
            entries: vec![wire::ExternalFileEntry {
                id: 7,
                typ: 1,
                file_name: "tiles.aseprite",
            }],
        }))
        .unwrap();
        asm.push_chunk(Chunk::Tileset(wire::TilesetChunk {
            id: 0,
            flags: 1,
            num_tiles: 2,
            tile_width: 8,
            tile_height: 8,
            base_index: 1,
            tileset_name: "ground",
            external: Some(wire::ExternalTilesetLink {
                file_id: 7,
                tileset_id: 3,
            }),
            image: None,
        }))
        .unwrap();
        for text in ["set", "tile0", "tile1", "extra"] {
            asm.push_chunk(Chunk::UserData(user_data(text))).unwrap();
        }
        let sprite = asm.finish();
        let tileset = sprite.tileset(0).unwrap();
        assert_eq!(
            tileset.source,
            TilesetSource::External(ExternalTileset {
                file_id: 7,
                tileset_id: 3,
                file_name: Some("tiles.aseprite".into()),
            })
        );
        assert_eq!(tileset.user_data.as_ref().unwrap().text.as_deref(), Some("set"));
        assert_eq!(tileset.tile_user_data.len(), 2);
        assert_eq!(tileset.tile_user_data[&1].text.as_deref(), Some("tile1"));
        assert_eq!(
            sprite.external_file(7).map(|f| f.kind),
            Some(ExternalFileKind::Tileset)
        );
    }

    #[test]
    fn tilemap_tile_widths() {
        use std::io::Write;

        use flate2::{write::ZlibEncoder, Compression};

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&[1, 0, 2, 0x80]).unwrap();
        let data = encoder.finish().unwrap();
        let cel = wire::TilemapCel {
            width: 2,
            height: 1,
            bits_per_tile: 16,
            tile_id_mask: 0x7FFF,
            x_flip_mask: 0x8000,
            y_flip_mask: 0,
            rotation_mask: 0,
            data: &data,
        };
        let map = tilemap(&cel).unwrap();
        assert_eq!(map.tiles(), &[1, 0x8002]);
        assert_eq!(map.tile(1, 0).map(|t| (t.id, t.x_flip)), Some((2, true)));

        let odd = wire::TilemapCel {
            bits_per_tile: 12,
            ..cel
        };
        assert!(matches!(
            tilemap(&odd),
            Err(DecodeError::UnsupportedBitsPerTile(12))
        ));
    }
}

//! Wire layout of `.aseprite` files.
//!
//! Everything here borrows from the input buffer and mirrors the byte layout
//! one to one. Turning these records into the [`Sprite`](crate::Sprite)
//! document happens in the assembler.

use parsing::{Parse, ReadBytes};

pub type Byte = u8;
pub type Word = u16;
pub type Short = i16;
pub type Dword = u32;
pub type Long = i32;

pub const HEADER_MAGIC: Word = 0xA5E0;
pub const FRAME_MAGIC: Word = 0xF1FA;

/// Size of the file header, including the size field.
pub const HEADER_LEN: usize = 128;

/// 16.16 signed fixed point number.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Parse)]
pub struct Fixed {
    num: Long,
}

impl Fixed {
    pub fn from_raw(num: Long) -> Self {
        Self { num }
    }

    pub fn as_float(self) -> f32 {
        self.num as f32 / 65536.0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Parse)]
pub struct Point {
    pub x: Long,
    pub y: Long,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Parse)]
pub struct Size {
    pub w: Dword,
    pub h: Dword,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Parse)]
pub struct Rect {
    pub tl: Point,
    pub size: Size,
}

parsing::parsable_struct! {
    /// `STRING`: word length followed by UTF-8 bytes, no terminator.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct AseString<'a> {
        [[param: Word = string_size]]
        #[parse(sized_utf8_string = string_size)]
        pub text: &'a str,
    }
}

parsing::parsable_struct! {
    /// Dword length followed by that many bytes.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct SizedBlob<'a> {
        [[param: Dword = blob_size]]
        #[parse(sized_buf = blob_size)]
        pub bytes: &'a [u8],
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Debug)]
    pub struct AsepriteFile<'a> {
        pub file_size: Dword,
        [[magic: Word = HEADER_MAGIC]]
        [[limit_buffer = parsing::body_len(file_size, 6)?]]
        pub num_frames: Word,
        pub width: Word,
        pub height: Word,
        /// 32=RGBA, 16=Grayscale, 8=Indexed
        pub color_depth: Word,
        pub flags: Dword,
        /// Deprecated, now on each frame
        pub frame_ms_dur: Word,
        [[ignore: Dword]]
        [[ignore: Dword]]
        pub invis_palette_ind: Byte,
        [[padding_bytes = 3]]
        /// 0 means 256 for old sprites
        pub color_num: Word,
        pub pix_width: Byte,
        pub pix_height: Byte,
        pub grid_x_pos: Short,
        pub grid_y_pos: Short,
        pub grid_width: Word,
        pub grid_height: Word,
        [[padding_bytes = 84]]
        #[parse(rest_of_buf)]
        pub frame_bytes: &'a [u8],
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Debug)]
    pub struct Frame<'a> {
        pub frame_size: Dword,
        [[magic: Word = FRAME_MAGIC]]
        [[limit_buffer = parsing::body_len(frame_size, 6)?]]
        pub old_num_chunks: Word,
        pub frame_dur_ms: Word,
        [[padding_bytes = 2]]
        pub new_num_chunks: Dword,
        #[parse(rest_of_buf)]
        pub chunk_bytes: &'a [u8],
    }
}

impl Frame<'_> {
    /// The word sized count saturates at `0xFFFF`; only then does the dword
    /// count take over, and only when it was actually written.
    pub fn num_chunks(&self) -> usize {
        if self.old_num_chunks == 0xFFFF && self.new_num_chunks != 0 {
            self.new_num_chunks as usize
        } else {
            self.old_num_chunks as usize
        }
    }
}

parsing::parsable_struct! {
    /// The six bytes in front of every chunk. Only used to look ahead.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct ChunkHeader {
        pub chunk_size: Dword,
        pub chunk_type: Word,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Debug)]
    pub struct RestOfBytes<'a> {
        #[parse(rest_of_buf)]
        pub rest: &'a [u8]
    }
}

parsing::parsable_enum! {
    #[derive(Clone, PartialEq, Debug)]
    #[repr(u16)]
    pub enum Chunk<'a> {
        [[param: Dword = chunk_size]]
        [[limit_buffer = parsing::body_len(chunk_size, 4)?]]
        [[param: Word = chunk_type]]
        [[enum_type = chunk_type]]
        /// 8 bit channels
        OldPaletteA(OldPaletteChunk<'a>) = 0x0004,
        /// 6 bit channels
        OldPaletteB(OldPaletteChunk<'a>) = 0x0011,
        Layer(LayerChunk<'a>) = 0x2004,
        Cel(CelChunk<'a>) = 0x2005,
        CelExtra(CelExtraChunk) = 0x2006,
        ColorProfile(ColorProfileChunk<'a>) = 0x2007,
        ExternalFiles(ExternalFilesChunk<'a>) = 0x2008,
        /// deprecated
        Mask(MaskChunk<'a>) = 0x2016,
        /// never used
        Path(RestOfBytes<'a>) = 0x2017,
        Tags(TagsChunk<'a>) = 0x2018,
        Palette(PaletteChunk<'a>) = 0x2019,
        UserData(UserDataChunk<'a>) = 0x2020,
        Slice(SliceChunk<'a>) = 0x2022,
        Tileset(TilesetChunk<'a>) = 0x2023,
    }
}

impl Chunk<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Chunk::OldPaletteA(_) => "old palette (0x0004)",
            Chunk::OldPaletteB(_) => "old palette (0x0011)",
            Chunk::Layer(_) => "layer",
            Chunk::Cel(_) => "cel",
            Chunk::CelExtra(_) => "cel extra",
            Chunk::ColorProfile(_) => "color profile",
            Chunk::ExternalFiles(_) => "external files",
            Chunk::Mask(_) => "mask",
            Chunk::Path(_) => "path",
            Chunk::Tags(_) => "tags",
            Chunk::Palette(_) => "palette",
            Chunk::UserData(_) => "user data",
            Chunk::Slice(_) => "slice",
            Chunk::Tileset(_) => "tileset",
        }
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct OldPaletteChunk<'a> {
        [[param: Word = num_packets]]
        #[parse(collection: OldPalettePacket = num_packets)]
        pub packets: Vec<OldPalettePacket<'a>>,
    }
}

/// A packet color count of 0 means 256.
pub fn old_palette_color_count(num_colors: Byte) -> usize {
    if num_colors == 0 {
        256
    } else {
        num_colors as usize
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct OldPalettePacket<'a> {
        pub num_skip: Byte,
        [[param: Byte = num_colors]]
        #[parse(sized_buf = old_palette_color_count(num_colors) * 3)]
        pub colors: &'a [u8],
    }
}

impl OldPalettePacket<'_> {
    pub fn colors(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.colors.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }
}

/// Scales a 6 bit channel to 8 bits by replicating the top bits.
pub fn expand_six_bit(value: u8) -> u8 {
    let value = value & 0x3F;
    (value << 2) | (value >> 4)
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct LayerChunk<'a> {
        pub flags: Word,
        pub layer_type: Word,
        pub child_level: Word,
        /// ignored by Aseprite
        pub default_width: Word,
        /// ignored by Aseprite
        pub default_height: Word,
        pub blend_mode: Word,
        pub opacity: Byte,
        [[padding_bytes = 3]]
        [[param: Word = string_size]]
        #[parse(sized_utf8_string = string_size)]
        pub layer_name: &'a str,
        #[parse(option_if: Dword = layer_type == 2)]
        pub tileset_index: Option<Dword>,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct CelChunk<'a> {
        pub layer_ind: Word,
        pub x_pos: Short,
        pub y_pos: Short,
        pub opacity: Byte,
        pub cel_type: Word,
        pub z_ind: Short,
        [[padding_bytes = 5]]
        #[parse(rest_of_buf)]
        pub rest: &'a [u8],
    }
}

parsing::parsable_struct! {
    /// Tail of raw (0) and compressed (2) image cels.
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct ImageCel<'a> {
        pub width: Word,
        pub height: Word,
        #[parse(rest_of_buf)]
        pub data: &'a [u8],
    }
}

parsing::parsable_struct! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct LinkedCel {
        pub frame_position: Word,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct TilemapCel<'a> {
        pub width: Word,
        pub height: Word,
        pub bits_per_tile: Word,
        pub tile_id_mask: Dword,
        pub x_flip_mask: Dword,
        pub y_flip_mask: Dword,
        /// diagonal flip, i.e. a 90 degree rotation
        pub rotation_mask: Dword,
        [[padding_bytes = 10]]
        #[parse(rest_of_buf)]
        pub data: &'a [u8],
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CelContent<'a> {
    Raw(ImageCel<'a>),
    Linked(LinkedCel),
    Compressed(ImageCel<'a>),
    CompressedTilemap(TilemapCel<'a>),
}

impl<'a> CelChunk<'a> {
    /// Reads the type specific tail of the cel.
    pub fn content(&self) -> crate::Result<CelContent<'a>> {
        let mut rest = self.rest;
        Ok(match self.cel_type {
            0x0 => CelContent::Raw(rest.read_type_le()?),
            0x1 => CelContent::Linked(rest.read_type_le()?),
            0x2 => CelContent::Compressed(rest.read_type_le()?),
            0x3 => CelContent::CompressedTilemap(rest.read_type_le()?),
            other => return Err(crate::DecodeError::UnsupportedCelType(other)),
        })
    }
}

parsing::parsable_struct! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct CelExtraChunk {
        pub flags: Dword,
        pub precise_x: Fixed,
        pub precise_y: Fixed,
        pub width: Fixed,
        pub height: Fixed,
    }
}

impl CelExtraChunk {
    pub fn precise_bounds_set(&self) -> bool {
        self.flags & 1 != 0
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct ColorProfileChunk<'a> {
        pub typ: Word,
        pub flags: Word,
        pub fixed_gamma: Fixed,
        [[padding_bytes = 8]]
        #[parse(option_if: SizedBlob = typ == 2)]
        pub icc_profile: Option<SizedBlob<'a>>,
    }
}

impl ColorProfileChunk<'_> {
    pub fn uses_fixed_gamma(&self) -> bool {
        self.flags & 1 != 0
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct ExternalFilesChunk<'a> {
        [[param: Dword = num_entries]]
        [[padding_bytes = 8]]
        #[parse(collection: ExternalFileEntry = num_entries)]
        pub entries: Vec<ExternalFileEntry<'a>>,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct ExternalFileEntry<'a> {
        pub id: Dword,
        pub typ: Byte,
        [[padding_bytes = 7]]
        [[param: Word = string_size]]
        #[parse(sized_utf8_string = string_size)]
        pub file_name: &'a str,
    }
}

/// Bytes per bitmap row of a mask `width` pixels wide.
pub fn mask_row_len(width: Word) -> usize {
    (width as usize).div_ceil(8)
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct MaskChunk<'a> {
        pub x_pos: Short,
        pub y_pos: Short,
        pub width: Word,
        pub height: Word,
        [[padding_bytes = 8]]
        [[param: Word = string_size]]
        #[parse(sized_utf8_string = string_size)]
        pub mask_name: &'a str,
        #[parse(sized_buf = mask_row_len(width) * height as usize)]
        pub bitmap: &'a [u8],
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct TagsChunk<'a> {
        [[param: Word = num_tags]]
        [[padding_bytes = 8]]
        #[parse(collection: Tag = num_tags)]
        pub tags: Vec<Tag<'a>>,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct Tag<'a> {
        pub start_ind: Word,
        pub end_ind: Word,
        pub direction: Byte,
        pub repeat: Word,
        [[padding_bytes = 6]]
        /// deprecated, the user data color replaces it
        pub color: [Byte; 3],
        [[padding_bytes = 1]]
        [[param: Word = string_size]]
        #[parse(sized_utf8_string = string_size)]
        pub tag_name: &'a str,
    }
}

/// Number of entries between `first` and `last` inclusive, 0 for an inverted range.
pub fn palette_entry_count(first: Dword, last: Dword) -> u64 {
    if last < first {
        0
    } else {
        (last - first) as u64 + 1
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct PaletteChunk<'a> {
        pub new_palette_size: Dword,
        pub first_ind: Dword,
        pub last_ind: Dword,
        [[padding_bytes = 8]]
        #[parse(collection: PaletteEntry = palette_entry_count(first_ind, last_ind))]
        pub entries: Vec<PaletteEntry<'a>>,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct PaletteEntry<'a> {
        pub flags: Word,
        pub rgba: [Byte; 4],
        #[parse(option_if: AseString = (flags & 1) != 0)]
        pub name: Option<AseString<'a>>,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct UserDataChunk<'a> {
        pub flags: Dword,
        #[parse(option_if: AseString = (flags & 1) != 0)]
        pub text: Option<AseString<'a>>,
        #[parse(option_if: [Byte; 4] = (flags & 2) != 0)]
        pub rgba: Option<[Byte; 4]>,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct SliceChunk<'a> {
        pub num_keys: Dword,
        pub flags: Dword,
        [[padding_bytes = 4]]
        [[param: Word = string_size]]
        #[parse(sized_utf8_string = string_size)]
        pub slice_name: &'a str,
        #[parse(rest_of_buf)]
        pub key_bytes: &'a [u8],
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SliceKey {
    pub frame: Dword,
    pub bounds: Rect,
    pub center: Option<Rect>,
    pub pivot: Option<Point>,
}

impl SliceChunk<'_> {
    pub fn is_nine_patch(&self) -> bool {
        self.flags & 1 != 0
    }

    pub fn has_pivot(&self) -> bool {
        self.flags & 2 != 0
    }

    /// The key layout depends on the chunk flags, so keys are read on demand.
    pub fn keys(&self) -> parsing::Result<Vec<SliceKey>> {
        let mut rest = self.key_bytes;
        (0..self.num_keys)
            .map(|_| {
                let frame = rest.read_type_le::<Dword>()?;
                let bounds = rest.read_type_le::<Rect>()?;
                let center = if self.is_nine_patch() {
                    Some(rest.read_type_le::<Rect>()?)
                } else {
                    None
                };
                let pivot = if self.has_pivot() {
                    Some(rest.read_type_le::<Point>()?)
                } else {
                    None
                };
                Ok(SliceKey {
                    frame,
                    bounds,
                    center,
                    pivot,
                })
            })
            .collect()
    }
}

parsing::parsable_struct! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct ExternalTilesetLink {
        pub file_id: Dword,
        pub tileset_id: Dword,
    }
}

parsing::parsable_struct! {
    #[derive(Clone, PartialEq, Eq, Debug)]
    pub struct TilesetChunk<'a> {
        pub id: Dword,
        pub flags: Dword,
        pub num_tiles: Dword,
        pub tile_width: Word,
        pub tile_height: Word,
        pub base_index: Short,
        [[padding_bytes = 14]]
        [[param: Word = string_size]]
        #[parse(sized_utf8_string = string_size)]
        pub tileset_name: &'a str,
        #[parse(option_if: ExternalTilesetLink = (flags & 1) != 0)]
        pub external: Option<ExternalTilesetLink>,
        #[parse(option_if: SizedBlob = (flags & 2) != 0)]
        pub image: Option<SizedBlob<'a>>,
    }
}

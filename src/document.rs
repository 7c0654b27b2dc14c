//! The decoded, cross-referenced sprite.

use std::collections::BTreeMap;
use std::ops::{Deref, RangeInclusive};
use std::sync::Arc;

use rgb::{RGB8, RGBA8};
use serde::{Serialize, Serializer};

use crate::error::{DecodeError, Result};

/// Bulk buffers show up in serialized output by length only.
fn serialize_len<B, T, S>(data: &B, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    B: Deref<Target = [T]>,
    S: Serializer,
{
    serializer.serialize_u64(data.len() as u64)
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ColorDepth {
    /// 8 bits per pixel, palette indices
    Indexed,
    /// 16 bits per pixel, value + alpha
    Grayscale,
    /// 32 bits per pixel
    Rgba,
}

impl ColorDepth {
    pub fn from_bits(bits: u16) -> Result<Self> {
        match bits {
            8 => Ok(ColorDepth::Indexed),
            16 => Ok(ColorDepth::Grayscale),
            32 => Ok(ColorDepth::Rgba),
            other => Err(DecodeError::InvalidColorDepth(other)),
        }
    }

    pub fn bits(self) -> u16 {
        match self {
            ColorDepth::Indexed => 8,
            ColorDepth::Grayscale => 16,
            ColorDepth::Rgba => 32,
        }
    }

    pub fn bytes_per_pixel(self) -> usize {
        self.bits() as usize / 8
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct HeaderFlags(pub u32);

impl HeaderFlags {
    pub const LAYER_OPACITY_VALID: u32 = 1;
    pub const GROUP_OPACITY_VALID: u32 = 2;
    pub const LAYERS_HAVE_UUID: u32 = 4;

    pub fn layer_opacity_valid(self) -> bool {
        self.0 & Self::LAYER_OPACITY_VALID != 0
    }

    pub fn group_opacity_valid(self) -> bool {
        self.0 & Self::GROUP_OPACITY_VALID != 0
    }

    pub fn layers_have_uuid(self) -> bool {
        self.0 & Self::LAYERS_HAVE_UUID != 0
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct Grid {
    pub x: i16,
    pub y: i16,
    /// 0 if there is no grid
    pub width: u16,
    pub height: u16,
}

/// File header. Only the fields whose raw value needs interpretation are
/// hidden behind accessors.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Header {
    pub file_size: u32,
    pub frame_count: u16,
    pub width: u16,
    pub height: u16,
    pub color_depth: ColorDepth,
    pub flags: HeaderFlags,
    /// Deprecated, frames carry their own duration
    pub speed: u16,
    pub grid: Grid,
    transparent_index: u8,
    color_count: u16,
    pixel_width: u8,
    pixel_height: u8,
}

impl Header {
    pub(crate) fn from_raw(file: &crate::ase_file::AsepriteFile<'_>) -> Result<Self> {
        Ok(Self {
            file_size: file.file_size,
            frame_count: file.num_frames,
            width: file.width,
            height: file.height,
            color_depth: ColorDepth::from_bits(file.color_depth)?,
            flags: HeaderFlags(file.flags),
            speed: file.frame_ms_dur,
            grid: Grid {
                x: file.grid_x_pos,
                y: file.grid_y_pos,
                width: file.grid_width,
                height: file.grid_height,
            },
            transparent_index: file.invis_palette_ind,
            color_count: file.color_num,
            pixel_width: file.pix_width,
            pixel_height: file.pix_height,
        })
    }

    /// Palette entry treated as transparent. Only meaningful for indexed sprites.
    pub fn transparent_index(&self) -> Option<u8> {
        (self.color_depth == ColorDepth::Indexed).then_some(self.transparent_index)
    }

    pub fn color_count(&self) -> usize {
        if self.color_count == 0 {
            256
        } else {
            self.color_count as usize
        }
    }

    /// Pixel aspect ratio as `(width, height)`, `(1, 1)` when unset.
    pub fn pixel_ratio(&self) -> (u8, u8) {
        if self.pixel_width == 0 || self.pixel_height == 0 {
            (1, 1)
        } else {
            (self.pixel_width, self.pixel_height)
        }
    }
}

/// Decoded pixels. Cheap to clone, linked cels share the buffer of their source.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    #[serde(rename = "byte_len", serialize_with = "serialize_len")]
    data: Arc<[u8]>,
}

/// Pixel view of an [`Image`] for a given color depth.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pixels<'a> {
    Indexed(&'a [u8]),
    GrayAlpha(&'a [[u8; 2]]),
    Rgba(&'a [[u8; 4]]),
}

impl Image {
    pub(crate) fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// `None` if the buffer length is not a whole number of pixels of `depth`.
    pub fn pixels(&self, depth: ColorDepth) -> Option<Pixels<'_>> {
        match depth {
            ColorDepth::Indexed => Some(Pixels::Indexed(&self.data)),
            ColorDepth::Grayscale => bytemuck::try_cast_slice(&self.data)
                .ok()
                .map(Pixels::GrayAlpha),
            ColorDepth::Rgba => bytemuck::try_cast_slice(&self.data).ok().map(Pixels::Rgba),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct TileMasks {
    pub tile_id: u32,
    pub x_flip: u32,
    pub y_flip: u32,
    pub rotation: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Tile {
    pub id: u32,
    pub x_flip: bool,
    pub y_flip: bool,
    pub rotated: bool,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Tilemap {
    /// in tiles
    pub width: u16,
    /// in tiles
    pub height: u16,
    pub bits_per_tile: u16,
    pub masks: TileMasks,
    #[serde(rename = "tile_len", serialize_with = "serialize_len")]
    tiles: Arc<[u32]>,
}

impl Tilemap {
    pub(crate) fn new(
        width: u16,
        height: u16,
        bits_per_tile: u16,
        masks: TileMasks,
        tiles: Vec<u32>,
    ) -> Self {
        Self {
            width,
            height,
            bits_per_tile,
            masks,
            tiles: tiles.into(),
        }
    }

    /// Raw tile words, row major.
    pub fn tiles(&self) -> &[u32] {
        &self.tiles
    }

    pub fn tile(&self, x: u16, y: u16) -> Option<Tile> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let word = *self
            .tiles
            .get(y as usize * self.width as usize + x as usize)?;
        Some(Tile {
            id: word & self.masks.tile_id,
            x_flip: word & self.masks.x_flip != 0,
            y_flip: word & self.masks.y_flip != 0,
            rotated: word & self.masks.rotation != 0,
        })
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct LinkedCel {
    pub frame: u16,
    /// Payload of the cel in `frame` on the same layer, never itself linked.
    pub target: Box<CelPayload>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub enum CelPayload {
    RawImage(Image),
    CompressedImage(Image),
    Linked(LinkedCel),
    CompressedTilemap(Tilemap),
}

impl CelPayload {
    /// Follows a link to the payload that owns the data.
    pub fn resolved(&self) -> &CelPayload {
        match self {
            CelPayload::Linked(link) => &link.target,
            other => other,
        }
    }

    pub fn image(&self) -> Option<&Image> {
        match self.resolved() {
            CelPayload::RawImage(image) | CelPayload::CompressedImage(image) => Some(image),
            _ => None,
        }
    }

    pub fn tilemap(&self) -> Option<&Tilemap> {
        match self.resolved() {
            CelPayload::CompressedTilemap(tilemap) => Some(tilemap),
            _ => None,
        }
    }

    pub fn is_linked(&self) -> bool {
        matches!(self, CelPayload::Linked(_))
    }
}

/// Sub-pixel position and size from a cel extra chunk.
#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
pub struct PreciseBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Cel {
    pub layer_index: u16,
    pub frame_index: usize,
    pub x: i16,
    pub y: i16,
    pub opacity: u8,
    pub z_index: i16,
    pub payload: CelPayload,
    pub precise_bounds: Option<PreciseBounds>,
    pub user_data: Option<UserData>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Frame {
    pub duration_ms: u16,
    pub cels: Vec<Cel>,
}

impl Frame {
    pub fn cel(&self, layer_index: u16) -> Option<&Cel> {
        self.cels.iter().find(|cel| cel.layer_index == layer_index)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum LayerKind {
    Normal,
    Group,
    Tilemap,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
    Addition,
    Subtract,
    Divide,
    Unknown(u16),
}

impl BlendMode {
    pub fn from_raw(raw: u16) -> Self {
        use BlendMode::*;
        match raw {
            0 => Normal,
            1 => Multiply,
            2 => Screen,
            3 => Overlay,
            4 => Darken,
            5 => Lighten,
            6 => ColorDodge,
            7 => ColorBurn,
            8 => HardLight,
            9 => SoftLight,
            10 => Difference,
            11 => Exclusion,
            12 => Hue,
            13 => Saturation,
            14 => Color,
            15 => Luminosity,
            16 => Addition,
            17 => Subtract,
            18 => Divide,
            other => Unknown(other),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct LayerFlags(pub u16);

impl LayerFlags {
    pub const VISIBLE: u16 = 1;
    pub const EDITABLE: u16 = 2;
    pub const LOCK_MOVEMENT: u16 = 4;
    pub const BACKGROUND: u16 = 8;
    pub const PREFER_LINKED_CELS: u16 = 16;
    pub const COLLAPSED: u16 = 32;
    pub const REFERENCE: u16 = 64;

    fn has(self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    pub fn is_visible(self) -> bool {
        self.has(Self::VISIBLE)
    }

    pub fn is_editable(self) -> bool {
        self.has(Self::EDITABLE)
    }

    pub fn is_movement_locked(self) -> bool {
        self.has(Self::LOCK_MOVEMENT)
    }

    pub fn is_background(self) -> bool {
        self.has(Self::BACKGROUND)
    }

    pub fn prefers_linked_cels(self) -> bool {
        self.has(Self::PREFER_LINKED_CELS)
    }

    pub fn is_collapsed(self) -> bool {
        self.has(Self::COLLAPSED)
    }

    pub fn is_reference(self) -> bool {
        self.has(Self::REFERENCE)
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    pub flags: LayerFlags,
    pub blend_mode: BlendMode,
    /// Only meaningful when [`HeaderFlags::layer_opacity_valid`] is set
    pub opacity: u8,
    pub child_level: u16,
    pub tileset_index: Option<u32>,
    pub user_data: Option<UserData>,
}

/// Layers in file order with the parent of each one.
///
/// The format only stores a nesting depth per layer; parents are recovered
/// while layers are pushed.
#[derive(Clone, PartialEq, Debug, Default, Serialize)]
pub struct LayerTree {
    layers: Vec<Layer>,
    parents: Vec<Option<usize>>,
}

impl LayerTree {
    pub(crate) fn push(&mut self, layer: Layer, parent: Option<usize>) -> usize {
        self.layers.push(layer);
        self.parents.push(parent);
        self.layers.len() - 1
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Layer> {
        self.layers.iter()
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.parents.get(index).copied().flatten()
    }

    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.parents
            .iter()
            .enumerate()
            .filter(move |(_, parent)| **parent == Some(index))
            .map(|(child, _)| child)
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.parents
            .iter()
            .enumerate()
            .filter(|(_, parent)| parent.is_none())
            .map(|(root, _)| root)
    }

    /// Number of ancestors of `index`.
    pub fn depth(&self, index: usize) -> usize {
        std::iter::successors(self.parent(index), |&p| self.parent(p)).count()
    }

    pub fn by_name(&self, name: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.name == name)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct PaletteEntry {
    pub color: RGBA8,
    pub name: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    pub(crate) fn with_len(len: usize) -> Self {
        Self {
            entries: vec![PaletteEntry::default(); len],
        }
    }

    pub(crate) fn resize(&mut self, len: usize) {
        self.entries.resize(len, PaletteEntry::default());
    }

    /// Writes one entry, growing the palette if `index` is past the end.
    pub(crate) fn set(&mut self, index: usize, entry: PaletteEntry) {
        if index >= self.entries.len() {
            self.resize(index + 1);
        }
        self.entries[index] = entry;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PaletteEntry> {
        self.entries.get(index)
    }

    pub fn color(&self, index: usize) -> Option<RGBA8> {
        self.get(index).map(|entry| entry.color)
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum LoopDirection {
    Forward,
    Reverse,
    PingPong,
    PingPongReverse,
}

impl LoopDirection {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(LoopDirection::Forward),
            1 => Some(LoopDirection::Reverse),
            2 => Some(LoopDirection::PingPong),
            3 => Some(LoopDirection::PingPongReverse),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Tag {
    pub from: u16,
    pub to: u16,
    pub direction: LoopDirection,
    /// 0 means forever
    pub repeat: u16,
    /// Deprecated tag color, superseded by the user data color
    pub color: RGB8,
    pub name: String,
    pub user_data: Option<UserData>,
}

impl Tag {
    pub fn frames(&self) -> RangeInclusive<u16> {
        self.from..=self.to
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct SliceKey {
    /// First frame these bounds apply to
    pub frame: u32,
    pub bounds: Bounds,
    /// Nine-patch center, relative to `bounds`
    pub center: Option<Bounds>,
    /// Relative to `bounds`
    pub pivot: Option<(i32, i32)>,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Slice {
    pub name: String,
    pub nine_patch: bool,
    pub has_pivot: bool,
    pub keys: Vec<SliceKey>,
    pub user_data: Option<UserData>,
}

impl Slice {
    /// The key in effect at `frame`: the last key starting at or before it.
    pub fn key_for_frame(&self, frame: u32) -> Option<&SliceKey> {
        self.keys.iter().rev().find(|key| key.frame <= frame)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct ExternalTileset {
    pub file_id: u32,
    pub tileset_id: u32,
    /// Name from the external files table, if the id was listed there
    pub file_name: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub enum TilesetSource {
    External(ExternalTileset),
    /// All tiles stacked vertically in one image
    Embedded(Image),
    Missing,
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Tileset {
    pub id: u32,
    pub tile_count: u32,
    pub tile_width: u16,
    pub tile_height: u16,
    /// Index shown for the first tile in the UI
    pub base_index: i16,
    pub name: String,
    pub source: TilesetSource,
    pub user_data: Option<UserData>,
    pub tile_user_data: BTreeMap<u32, UserData>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ExternalFileKind {
    Palette,
    Tileset,
    ExtensionProperties,
    TileManagement,
    Unknown(u8),
}

impl ExternalFileKind {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => ExternalFileKind::Palette,
            1 => ExternalFileKind::Tileset,
            2 => ExternalFileKind::ExtensionProperties,
            3 => ExternalFileKind::TileManagement,
            other => ExternalFileKind::Unknown(other),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct ExternalFile {
    pub id: u32,
    pub kind: ExternalFileKind,
    pub name: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize)]
pub struct UserData {
    pub text: Option<String>,
    pub color: Option<RGBA8>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ColorProfileKind {
    None,
    Srgb,
    EmbeddedIcc,
    Unknown(u16),
}

#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ColorProfile {
    pub kind: ColorProfileKind,
    pub fixed_gamma: Option<f32>,
    /// Raw ICC profile, not validated
    #[serde(skip_serializing)]
    pub icc: Option<Vec<u8>>,
}

/// Deprecated selection mask.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Mask {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub name: String,
    /// One bit per pixel, rows padded to whole bytes
    #[serde(rename = "bitmap_len", serialize_with = "serialize_len")]
    pub bitmap: Vec<u8>,
}

/// A fully decoded `.aseprite` file. Read-only once returned by
/// [`decode`](crate::decode).
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct Sprite {
    pub(crate) header: Header,
    pub(crate) frames: Vec<Frame>,
    pub(crate) layers: LayerTree,
    pub(crate) palette: Palette,
    pub(crate) tags: Vec<Tag>,
    pub(crate) slices: Vec<Slice>,
    pub(crate) tilesets: BTreeMap<u32, Tileset>,
    pub(crate) external_files: BTreeMap<u32, ExternalFile>,
    pub(crate) color_profile: Option<ColorProfile>,
    pub(crate) masks: Vec<Mask>,
    pub(crate) user_data: Option<UserData>,
}

impl Sprite {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn layers(&self) -> &LayerTree {
        &self.layers
    }

    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.by_name(name).and_then(|i| self.layers.get(i))
    }

    pub fn cel(&self, frame: usize, layer_index: u16) -> Option<&Cel> {
        self.frame(frame)?.cel(layer_index)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    pub fn tilesets(&self) -> &BTreeMap<u32, Tileset> {
        &self.tilesets
    }

    pub fn tileset(&self, id: u32) -> Option<&Tileset> {
        self.tilesets.get(&id)
    }

    pub fn external_files(&self) -> &BTreeMap<u32, ExternalFile> {
        &self.external_files
    }

    pub fn external_file(&self, id: u32) -> Option<&ExternalFile> {
        self.external_files.get(&id)
    }

    pub fn color_profile(&self) -> Option<&ColorProfile> {
        self.color_profile.as_ref()
    }

    pub fn masks(&self) -> &[Mask] {
        &self.masks
    }

    /// User data attached to the sprite itself.
    pub fn user_data(&self) -> Option<&UserData> {
        self.user_data.as_ref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn layer(name: &str, child_level: u16) -> Layer {
        Layer {
            name: name.into(),
            kind: LayerKind::Normal,
            flags: LayerFlags(LayerFlags::VISIBLE),
            blend_mode: BlendMode::Normal,
            opacity: 255,
            child_level,
            tileset_index: None,
            user_data: None,
        }
    }

    #[test]
    fn color_depth_bits() {
        assert_eq!(ColorDepth::from_bits(16).unwrap(), ColorDepth::Grayscale);
        assert_eq!(ColorDepth::Rgba.bytes_per_pixel(), 4);
        assert!(matches!(
            ColorDepth::from_bits(24),
            Err(DecodeError::InvalidColorDepth(24))
        ));
    }

    #[test]
    fn layer_tree_queries() {
        let mut tree = LayerTree::default();
        let group = tree.push(layer("group", 0), None);
        let child = tree.push(layer("child", 1), Some(group));
        let grandchild = tree.push(layer("grandchild", 2), Some(child));
        let top = tree.push(layer("top", 0), None);

        assert_eq!(tree.parent(grandchild), Some(child));
        assert_eq!(tree.depth(grandchild), 2);
        assert_eq!(tree.children(group).collect::<Vec<_>>(), vec![child]);
        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![group, top]);
        assert_eq!(tree.by_name("top"), Some(top));
        assert_eq!(tree.parent(99), None);
    }

    #[test]
    fn palette_set_grows() {
        let mut palette = Palette::with_len(2);
        let red = PaletteEntry {
            color: RGBA8::new(255, 0, 0, 255),
            name: None,
        };
        palette.set(4, red.clone());
        assert_eq!(palette.len(), 5);
        assert_eq!(palette.get(4), Some(&red));
        assert_eq!(palette.color(3), Some(RGBA8::new(0, 0, 0, 0)));
    }

    #[test]
    fn image_pixel_views() {
        let image = Image::new(2, 1, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            image.pixels(ColorDepth::Rgba),
            Some(Pixels::Rgba(&[[1, 2, 3, 4], [5, 6, 7, 8]]))
        );
        let odd = Image::new(1, 1, vec![1, 2, 3]);
        assert_eq!(odd.pixels(ColorDepth::Grayscale), None);
    }

    #[test]
    fn tile_bits() {
        let masks = TileMasks {
            tile_id: 0x1FFF_FFFF,
            x_flip: 0x8000_0000,
            y_flip: 0x4000_0000,
            rotation: 0x2000_0000,
        };
        let map = Tilemap::new(2, 1, 32, masks, vec![3, 0x8000_0005]);
        assert_eq!(
            map.tile(1, 0),
            Some(Tile {
                id: 5,
                x_flip: true,
                y_flip: false,
                rotated: false,
            })
        );
        assert_eq!(map.tile(2, 0), None);
    }

    #[test]
    fn slice_key_lookup() {
        let bounds = Bounds {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        };
        let key = |frame| SliceKey {
            frame,
            bounds,
            center: None,
            pivot: None,
        };
        let slice = Slice {
            name: "s".into(),
            nine_patch: false,
            has_pivot: false,
            keys: vec![key(2), key(5)],
            user_data: None,
        };
        assert_eq!(slice.key_for_frame(0), None);
        assert_eq!(slice.key_for_frame(4).map(|k| k.frame), Some(2));
        assert_eq!(slice.key_for_frame(9).map(|k| k.frame), Some(5));
    }
}

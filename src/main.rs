use std::process::ExitCode;

use aseprite_decoder::{decode, CelPayload, DecodeOptions, Sprite, TilesetSource};

const USAGE: &str = "usage: aseprite-decoder <file.aseprite> [--strict] [--json]";

fn main() -> ExitCode {
    env_logger::init();

    let mut path = None;
    let mut options = DecodeOptions::default();
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--strict" => options.strict_unknown_chunks = true,
            "--json" => json = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return ExitCode::SUCCESS;
            }
            _ if path.is_none() => path = Some(arg),
            _ => {
                eprintln!("{USAGE}");
                return ExitCode::FAILURE;
            }
        }
    }
    let Some(path) = path else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("{path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let sprite = match decode(&bytes, &options) {
        Ok(sprite) => sprite,
        Err(err) => {
            eprintln!("{path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&sprite) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("{path}: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_summary(&sprite);
    }
    ExitCode::SUCCESS
}

fn print_summary(sprite: &Sprite) {
    let header = sprite.header();
    println!(
        "{}x{} {:?}, {} frames, {} palette entries",
        header.width,
        header.height,
        header.color_depth,
        sprite.frames().len(),
        sprite.palette().len()
    );

    println!("layers:");
    for (index, layer) in sprite.layers().iter().enumerate() {
        let indent = "  ".repeat(sprite.layers().depth(index) + 1);
        println!(
            "{indent}{} ({:?}, {:?}, opacity {})",
            layer.name, layer.kind, layer.blend_mode, layer.opacity
        );
    }

    for (index, frame) in sprite.frames().iter().enumerate() {
        println!("frame {index}: {}ms", frame.duration_ms);
        for cel in &frame.cels {
            let kind = match &cel.payload {
                CelPayload::RawImage(_) => "raw".to_string(),
                CelPayload::CompressedImage(_) => "compressed".to_string(),
                CelPayload::Linked(link) => format!("linked to frame {}", link.frame),
                CelPayload::CompressedTilemap(map) => {
                    format!("tilemap {}x{}", map.width, map.height)
                }
            };
            println!(
                "  layer {} at ({}, {}): {kind}",
                cel.layer_index, cel.x, cel.y
            );
        }
    }

    for tag in sprite.tags() {
        println!(
            "tag {:?}: frames {:?} {:?}",
            tag.name,
            tag.frames(),
            tag.direction
        );
    }
    for slice in sprite.slices() {
        println!("slice {:?}: {} keys", slice.name, slice.keys.len());
    }
    for tileset in sprite.tilesets().values() {
        let source = match &tileset.source {
            TilesetSource::Embedded(_) => "embedded".to_string(),
            TilesetSource::External(link) => format!(
                "external {}",
                link.file_name.as_deref().unwrap_or("<unknown file>")
            ),
            TilesetSource::Missing => "missing".to_string(),
        };
        println!(
            "tileset {} {:?}: {} tiles of {}x{}, {source}",
            tileset.id, tileset.name, tileset.tile_count, tileset.tile_width, tileset.tile_height
        );
    }
}

use spiht_codec::container::{Container, HEADER_SIZE, SUB_HEADER_SIZE};
use spiht_codec::{
    Codec, CodecSettings, CoeffImage, CoefficientPlanes, ColorSpihtCodec, Plane, SpihtCodec,
    SpihtError,
};
use std::io::Cursor;
use tempfile::tempdir;

fn ramp_image(width: u32, height: u32) -> CoeffImage {
    let mut img = CoeffImage::new(width, height);
    for plane in Plane::ALL {
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 31 + y * 17 + plane.index() as u32 * 11) % 201) as f64 - 100.0;
                img.set(x, y, plane, v);
            }
        }
    }
    img
}

fn encoded_joint(width: u32, height: u32) -> ColorSpihtCodec {
    let mut codec = ColorSpihtCodec::new(CodecSettings::new().with_levels(2));
    codec
        .encode(&ramp_image(width, height))
        .expect("Failed to encode image");
    codec
}

#[test]
fn test_single_stream_save_load() {
    let codec = encoded_joint(16, 16);
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("joint.spiht");
    assert!(codec.save(&path).expect("Failed to save container"));

    let size = std::fs::metadata(&path).expect("Missing saved file").len() as usize;
    let words = codec.container().streams()[0].words().len();
    assert_eq!(size, HEADER_SIZE + SUB_HEADER_SIZE + 2 * words);

    let mut loaded = Container::default();
    assert!(loaded.load(&path).expect("Failed to load container"));
    let header = loaded.header();
    assert_eq!(header.version, 0xA0);
    assert_eq!(header.stream_count, 1);
    assert_eq!(header.bits_per_word, 16);
    assert_eq!((loaded.width(), loaded.height()), (16, 16));

    let original = &codec.container().streams()[0];
    let stream = &loaded.streams()[0];
    assert_eq!(stream.max_steps(), original.max_steps());
    assert_eq!(stream.total_bits(), original.total_bits());
    assert_eq!(stream.level(), 2);
    assert_eq!(stream.words(), original.words());
}

#[test]
fn test_loaded_container_decodes_identically() {
    let mut codec = encoded_joint(16, 8);
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("joint.spiht");
    codec.save(&path).expect("Failed to save container");

    let mut reader = ColorSpihtCodec::new(CodecSettings::new().with_levels(2));
    assert!(reader.load(&path).expect("Failed to load container"));
    assert_eq!((reader.image_width(), reader.image_height()), (16, 8));

    let mut expected = CoeffImage::default();
    codec.decode(&mut expected, 0).expect("Failed to decode");
    let mut actual = CoeffImage::default();
    reader.decode(&mut actual, 0).expect("Failed to decode");
    assert_eq!(expected, actual);
}

#[test]
fn test_three_stream_save_load() {
    let img = ramp_image(32, 32);
    let settings = CodecSettings::new().with_levels(2).with_color_shift(1).with_bits(4000);
    let mut codec = SpihtCodec::new(settings.clone());
    codec.encode(&img).expect("Failed to encode image");

    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("planar.spiht");
    assert!(codec.save(&path).expect("Failed to save container"));

    let mut reader = SpihtCodec::new(settings);
    assert!(reader.load(&path).expect("Failed to load container"));
    let levels: Vec<u8> = reader.container().streams().iter().map(|s| s.level()).collect();
    assert_eq!(levels, [2, 3, 3]);
    assert_eq!(reader.container().total_bits(), codec.container().total_bits());

    let mut out = CoeffImage::default();
    reader.decode(&mut out, 0).expect("Failed to decode");
    assert!(out.max_magnitude(Plane::Y) > 0.0);
}

#[test]
fn test_missing_file_is_soft_failure() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let mut container = Container::default();
    let loaded = container
        .load(temp_dir.path().join("absent.spiht"))
        .expect("Missing file must not be an error");
    assert!(!loaded);
    assert!(container.streams().is_empty());

    let codec = encoded_joint(8, 8);
    let saved = codec
        .save(&temp_dir.path().join("no_such_dir").join("out.spiht"))
        .expect("Unwritable path must not be an error");
    assert!(!saved);
}

#[test]
fn test_truncated_file_is_soft_failure() {
    let codec = encoded_joint(16, 16);
    let mut bytes = Vec::new();
    codec
        .container()
        .write_to(&mut bytes)
        .expect("Failed to serialize container");

    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("short.spiht");
    std::fs::write(&path, &bytes[..bytes.len() / 2]).expect("Failed to write file");

    let mut container = Container::default();
    assert!(!container.load(&path).expect("Truncated file must not be an error"));
    assert!(container.streams().is_empty());
}

#[test]
fn test_structural_errors_propagate() {
    // zero streams
    let bytes = [0xA0, 16, 0, 16, 0, 16, 0];
    assert!(matches!(
        Container::read_from(&mut Cursor::new(&bytes[..])),
        Err(SpihtError::MalformedBitstream(_))
    ));

    // byte-sized storage words
    let bytes = [0xA0, 8, 1, 16, 0, 16, 0];
    assert!(matches!(
        Container::read_from(&mut Cursor::new(&bytes[..])),
        Err(SpihtError::MalformedBitstream(_))
    ));

    // more bits announced than stored
    let mut bytes = vec![0xA0, 16, 1, 16, 0, 16, 0];
    bytes.extend_from_slice(&[3, 40, 0, 0, 0, 2, 1, 0, 0, 0, 0xff, 0xff]);
    assert!(matches!(
        Container::read_from(&mut Cursor::new(&bytes[..])),
        Err(SpihtError::MalformedBitstream(_))
    ));

    // the same data on disk is an error, not a soft failure
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("bad.spiht");
    std::fs::write(&path, &bytes).expect("Failed to write file");
    let mut container = Container::default();
    assert!(container.load(&path).is_err());
}

#[test]
fn test_wrong_codec_rejects_container() {
    let codec = encoded_joint(16, 16);
    let mut planar = SpihtCodec::new(CodecSettings::new().with_levels(2))
        .with_container(codec.container().clone());
    let mut out = CoeffImage::default();
    assert!(matches!(
        planar.decode(&mut out, 0),
        Err(SpihtError::MalformedContainer(_))
    ));
}

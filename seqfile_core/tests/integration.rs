//! Whole-file round-trip tests exercising all three compression modes, the
//! resynchronization scan, and the format's documented error conditions.

use std::io::Read;
use std::sync::Arc;

use seqfile_codecs::{DefaultCodec, KnownCodecs};
use seqfile_core::{
    ClassRegistry, CompressionType, Error, IntWritable, Reader, Text, Writer, WriterOptions,
};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("seqfile_test_{name}.seq"))
}

fn cleanup(path: &std::path::Path) {
    let _ = std::fs::remove_file(path);
}

// S1: 3 pairs, uncompressed, exact magic/version bytes, exact round-trip.
#[test]
fn uncompressed_roundtrip_and_magic_bytes() {
    let path = temp_path("s1_uncompressed");
    cleanup(&path);

    let mut writer = Writer::create(&path, "io.Text", "io.Text", WriterOptions::default()).unwrap();
    let pairs = [("a", "1"), ("b", "22"), ("c", "333")];
    for (k, v) in pairs {
        writer.append(&Text::new(k), &Text::new(v)).unwrap();
    }
    writer.close().unwrap();

    let header = {
        let mut file = std::fs::File::open(&path).unwrap();
        let mut buf = [0u8; 4];
        file.read_exact(&mut buf).unwrap();
        buf
    };
    assert_eq!(header, [0x53, 0x45, 0x51, 0x06], "file must start with SEQ + version 6");

    let classes = ClassRegistry::default();
    let codecs = KnownCodecs;
    let mut reader = Reader::open(&path, 0, 0, &classes, &codecs).unwrap();
    let read_pairs: Vec<(Text, Text)> = reader
        .iter()
        .map(|r| {
            let (k, v) = r.unwrap();
            (
                Text(downcast_text(k.as_ref())),
                Text(downcast_text(v.as_ref())),
            )
        })
        .collect();

    let expected: Vec<(Text, Text)> = pairs
        .iter()
        .map(|(k, v)| (Text::new(*k), Text::new(*v)))
        .collect();
    assert_eq!(read_pairs, expected);

    cleanup(&path);
}

/// `Reader::iter` hands back opaque `Box<dyn Writable>`; pull the string
/// back out by re-serializing and decoding with the `Text` wire format.
fn downcast_text(value: &dyn seqfile_core::Writable) -> String {
    let mut buf = Vec::new();
    value.write(&mut buf).unwrap();
    let mut cursor = std::io::Cursor::new(buf);
    seqfile_core::primitives::read_text(&mut cursor).unwrap()
}

// S2: record compression round-trips and reports its mode correctly.
#[test]
fn record_compressed_roundtrip_reports_mode() {
    let path = temp_path("s2_record");
    cleanup(&path);

    let options = WriterOptions::default()
        .compression(CompressionType::Record)
        .codec(Arc::new(DefaultCodec::default()));
    let mut writer = Writer::create(&path, "io.Text", "io.Text", options).unwrap();
    let pairs = [("a", "1"), ("b", "22"), ("c", "333")];
    for (k, v) in pairs {
        writer.append(&Text::new(k), &Text::new(v)).unwrap();
    }
    writer.close().unwrap();

    let classes = ClassRegistry::default();
    let codecs = KnownCodecs;
    let mut reader = Reader::open(&path, 0, 0, &classes, &codecs).unwrap();
    assert!(reader.is_compressed());
    assert!(!reader.is_block_compressed());

    let read_pairs: Vec<(String, String)> = reader
        .iter()
        .map(|r| {
            let (k, v) = r.unwrap();
            (downcast_text(k.as_ref()), downcast_text(v.as_ref()))
        })
        .collect();
    let expected: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    assert_eq!(read_pairs, expected);

    cleanup(&path);
}

// S3: 10,000 pairs, block-compressed, big enough to span multiple blocks.
#[test]
fn block_compressed_roundtrip_spans_multiple_blocks() {
    let path = temp_path("s3_block");
    cleanup(&path);

    let options = WriterOptions::default()
        .compression(CompressionType::Block)
        .codec(Arc::new(DefaultCodec::default()))
        .compression_block_size(20_000);
    let mut writer = Writer::create(&path, "io.IntWritable", "io.Text", options).unwrap();
    for i in 0..10_000i32 {
        writer
            .append(&IntWritable(i), &Text::new(i.to_string()))
            .unwrap();
    }
    writer.close().unwrap();

    // Count sync markers in the body: at least two blocks means at least two
    // escape+tag occurrences after the header's own (unescaped) sync copy.
    let body = std::fs::read(&path).unwrap();
    let escape_count = body.windows(4).filter(|w| *w == [0xFF, 0xFF, 0xFF, 0xFF]).count();
    assert!(
        escape_count >= 2,
        "expected at least two body sync markers, found {escape_count}"
    );

    let classes = ClassRegistry::default();
    let codecs = KnownCodecs;
    let mut reader = Reader::open(&path, 0, 0, &classes, &codecs).unwrap();
    let mut count = 0i32;
    for record in reader.iter() {
        let (k, v) = record.unwrap();
        let key_buf = {
            let mut buf = Vec::new();
            k.write(&mut buf).unwrap();
            buf
        };
        let key = i32::from_be_bytes(key_buf.try_into().unwrap());
        assert_eq!(key, count, "records must read back in append order");
        assert_eq!(downcast_text(v.as_ref()), count.to_string());
        count += 1;
    }
    assert_eq!(count, 10_000);

    cleanup(&path);
}

// S4: resynchronize mid-file and confirm the reader resumes on a block
// boundary, yielding exactly the trailing suffix of records.
#[test]
fn sync_resynchronizes_to_next_block_boundary() {
    const GROUP_SIZE: i32 = 500;
    const GROUPS: i32 = 20;

    let path = temp_path("s4_resync");
    cleanup(&path);

    let options = WriterOptions::default()
        .compression(CompressionType::Block)
        .codec(Arc::new(DefaultCodec::default()))
        // Large enough that only our explicit `sync()` calls flush a block.
        .compression_block_size(10_000_000);
    let mut writer = Writer::create(&path, "io.IntWritable", "io.Text", options).unwrap();

    let mut block_starts = Vec::new();
    let mut i = 0i32;
    for _ in 0..GROUPS {
        block_starts.push(writer.position());
        for _ in 0..GROUP_SIZE {
            writer
                .append(&IntWritable(i), &Text::new(i.to_string()))
                .unwrap();
            i += 1;
        }
        writer.sync().unwrap();
    }
    writer.close().unwrap();

    // Land exactly on the 11th block's marker (index 10 of 20).
    let landing = block_starts[10];
    let expected_remaining = ((GROUPS - 10) * GROUP_SIZE) as usize;

    let classes = ClassRegistry::default();
    let codecs = KnownCodecs;
    let mut reader = Reader::open(&path, 0, 0, &classes, &codecs).unwrap();
    reader.sync(landing).unwrap();

    let mut remaining = Vec::new();
    for record in reader.iter() {
        let (k, v) = record.unwrap();
        let key_buf = {
            let mut buf = Vec::new();
            k.write(&mut buf).unwrap();
            buf
        };
        let key = i32::from_be_bytes(key_buf.try_into().unwrap());
        assert_eq!(downcast_text(v.as_ref()), key.to_string());
        remaining.push(key);
    }

    assert_eq!(remaining.len(), expected_remaining);
    assert_eq!(remaining[0], 10 * GROUP_SIZE);
    assert_eq!(*remaining.last().unwrap(), GROUPS * GROUP_SIZE - 1);

    cleanup(&path);
}

// S5: a corrupted body sync tag must surface as a corruption error, not a
// silent misread, once the reader reaches it.
#[test]
fn corrupted_sync_tag_is_reported_as_corruption() {
    let path = temp_path("s5_corrupt_sync");
    cleanup(&path);

    let options = WriterOptions::default().sync_interval(40);
    let mut writer = Writer::create(&path, "io.Text", "io.Text", options).unwrap();
    let header_end = writer.position();
    for i in 0..50 {
        writer
            .append(&Text::new(format!("k{i}")), &Text::new(format!("v{i}")))
            .unwrap();
    }
    writer.close().unwrap();

    let mut body = std::fs::read(&path).unwrap();
    let marker_pos = body[header_end as usize..]
        .windows(4)
        .position(|w| w == [0xFF, 0xFF, 0xFF, 0xFF])
        .expect("expected at least one body sync marker")
        + header_end as usize;
    // Flip the first byte of the 16-byte tag that follows the escape.
    body[marker_pos + 4] ^= 0xFF;
    std::fs::write(&path, &body).unwrap();

    let classes = ClassRegistry::default();
    let codecs = KnownCodecs;
    let mut reader = Reader::open(&path, 0, 0, &classes, &codecs).unwrap();
    let err = reader.iter().find_map(|r| r.err());
    assert!(
        matches!(err, Some(Error::Corruption(_))),
        "expected a corruption error once the reader reaches the damaged marker, got {err:?}"
    );

    cleanup(&path);
}

// S6: constructing a writer on an existing path fails before any bytes are
// written, leaving the existing file untouched.
#[test]
fn create_on_existing_path_is_rejected_before_any_write() {
    let path = temp_path("s6_already_exists");
    cleanup(&path);
    std::fs::write(&path, b"pre-existing content").unwrap();

    let result = Writer::create(&path, "io.Text", "io.Text", WriterOptions::default());
    assert!(matches!(result, Err(Error::AlreadyExists)));

    let contents = std::fs::read(&path).unwrap();
    assert_eq!(contents, b"pre-existing content", "existing file must be untouched");

    cleanup(&path);
}

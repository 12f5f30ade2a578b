//! End-to-end scenarios on formatted images.
mod common;

use common::{CREATED, MODIFIED, MockImage};
use flatfs_storage::{
    FatEntry, FsError,
    dir::dirent::DirEntry,
    path::Resolved,
};

fn file_meta(volume: &flatfs_storage::Volume<'_>, path: &str) -> flatfs_storage::dir::dirent::EntryMeta {
    match volume.resolve(path).unwrap() {
        Resolved::File { meta, .. } => meta,
        other => panic!("expected a file at {path}, got {other:?}"),
    }
}

#[test]
fn test_round_trip_sizes() {
    let mut image = MockImage::standard();
    let mut volume = image.volume();
    let root = volume.root();

    for (name, len) in [("empty", 0), ("one", 1), ("block", 512), ("tail", 1300)] {
        let content: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let written = volume.write_file(root, name, &content, &CREATED).unwrap();
        assert_eq!(written.block_count, len as u32 / 512 + 1);

        let meta = file_meta(&volume, name);
        assert_eq!(meta.size(), len as u32);
        assert_eq!(volume.read_file(&meta).unwrap(), content);
    }
}

#[test]
fn test_notes_scenario() {
    let mut image = MockImage::standard();
    let mut volume = image.volume();
    let root = volume.root();

    let written = volume.write_file(root, "NOTES.TXT", &[b'n'; 1000], &CREATED).unwrap();
    assert_eq!(written.start_block, 3);
    assert_eq!(written.block_count, 2);

    let fat = volume.fat().unwrap();
    assert_eq!(fat.get(3).unwrap(), FatEntry::Next(4));
    assert_eq!(fat.get(4).unwrap(), FatEntry::EndOfChain);

    let meta = file_meta(&volume, "/NOTES.TXT");
    assert_eq!(meta.size(), 1000);
    assert_eq!(meta.start_block(), 3);
    drop(volume);

    // Record in the first slot of the root, block 2
    let record = &image.bytes()[1024..1088];
    assert_eq!(record[0], DirEntry::STATUS_FILE);
    assert_eq!(&record[1..5], &[0, 0, 0, 3]);
    assert_eq!(&record[5..9], &[0, 0, 0, 2]);
    assert_eq!(&record[9..13], &[0, 0, 0x03, 0xE8]);
    assert_eq!(&record[27..36], b"NOTES.TXT");
}

#[test]
fn test_free_chain_restores_free_count() {
    let mut image = MockImage::standard();
    let mut volume = image.volume();
    let root = volume.root();

    let before = volume.free_space().unwrap();
    let written = volume.write_file(root, "big", &[1; 2000], &CREATED).unwrap();
    let during = volume.free_space().unwrap();
    assert_eq!(during.free, before.free - written.block_count);

    let freed = volume.fat_mut().unwrap().free_chain(written.start_block).unwrap();
    assert_eq!(freed, written.block_count);
    let after = volume.free_space().unwrap();
    assert_eq!(after.free, during.free + freed);
    assert_eq!(after, before);
}

#[test]
fn test_count_free_idempotent() {
    let mut image = MockImage::standard();
    let mut volume = image.volume();
    let root = volume.root();
    volume.write_file(root, "a", &[0; 700], &CREATED).unwrap();

    let fat = volume.fat().unwrap();
    let first = fat.count_free().unwrap();
    assert_eq!(fat.count_free().unwrap(), first);
    // 128 table slots: 100 blocks plus 28 slots of padding, all counted
    assert_eq!(fat.len(), 128);
    assert_eq!(first.free, 128 - 3 - 2);
    assert_eq!(first.reserved, 3);
    assert_eq!(first.allocated, 2);
    assert_eq!(first.first_free, Some(5));
}

#[test]
fn test_overwrite_keeps_creation_time() {
    let mut image = MockImage::standard();
    let mut volume = image.volume();
    let root = volume.root();

    volume.write_file(root, "A", b"first version", &CREATED).unwrap();
    let written = volume.write_file(root, "a", b"second", &MODIFIED).unwrap();
    assert!(written.replaced);

    let meta = file_meta(&volume, "a");
    assert_eq!(meta.created(), CREATED);
    assert_eq!(meta.modified(), MODIFIED);
    assert_eq!(volume.read_file(&meta).unwrap(), b"second");
    assert_eq!(volume.list(root).unwrap().len(), 1);
}

#[test]
fn test_missing_intermediate_directory() {
    let mut image = MockImage::standard();
    let mut volume = image.volume();
    let root = volume.root();
    volume.make_directory(root, "X", &CREATED).unwrap();

    assert_eq!(
        volume.resolve("/X/Y/Z").unwrap_err(),
        FsError::NotFound(String::from("Y"))
    );
}

#[test]
fn test_make_directory_on_full_parent() {
    let mut image = MockImage::standard();
    let mut volume = image.volume();
    let root = volume.root();
    // 512-byte root block: 8 records
    for i in 0..8 {
        volume.make_directory(root, &format!("d{i}"), &CREATED).unwrap();
    }

    let table_before = volume.fat().unwrap().count_free().unwrap();
    let fat_bytes_before = image_fat(&volume);
    assert_eq!(
        volume.make_directory(root, "d8", &CREATED).unwrap_err(),
        FsError::DirectoryFull
    );
    assert_eq!(volume.fat().unwrap().count_free().unwrap(), table_before);
    assert_eq!(image_fat(&volume), fat_bytes_before);
}

fn image_fat(volume: &flatfs_storage::Volume<'_>) -> Vec<u32> {
    let fat = volume.fat().unwrap();
    (0..fat.len()).map(|i| fat.entry_at(i).unwrap()).collect()
}

#[test]
fn test_put_into_nested_directories() {
    let mut image = MockImage::standard();
    let mut volume = image.volume();

    let (parent, name) = volume.prepare_parent("/docs/2024/report.txt", &CREATED).unwrap();
    volume.write_file(parent, name, b"quarterly", &CREATED).unwrap();

    // Intermediate names are matched ignoring case when writing
    let (again, _) = volume.prepare_parent("/DOCS/2024/other.txt", &CREATED).unwrap();
    assert_eq!(again, parent);

    let docs = volume.resolve_directory("/docs").unwrap();
    let listed = volume.list(docs).unwrap();
    assert_eq!(listed.len(), 1);
    assert!(matches!(listed[0].1, DirEntry::Directory(meta) if meta.name().exact_match("2024")));

    let meta = file_meta(&volume, "/docs/2024/report.txt");
    assert_eq!(volume.read_file(&meta).unwrap(), b"quarterly");
    // Reading is case-sensitive
    assert!(volume.resolve("/DOCS/2024/report.txt").is_err());
}

#[test]
fn test_remount_sees_writes() {
    let mut image = MockImage::standard();
    {
        let mut volume = image.volume();
        let root = volume.root();
        volume.write_file(root, "keep.bin", &[9; 600], &CREATED).unwrap();
    }

    let volume = image.volume();
    let (header, space) = volume.info().unwrap();
    assert_eq!(header.block_size(), 512);
    assert_eq!(header.block_count(), 100);
    assert_eq!(space.allocated, 2);
    let meta = file_meta(&volume, "keep.bin");
    assert_eq!(volume.read_file(&meta).unwrap(), [9; 600]);
}

#[test]
fn test_table_padding_is_reported() {
    let mut image = MockImage::standard();
    let volume = image.volume();
    let fat = volume.fat().unwrap();

    assert_eq!(fat.entry_at(127).unwrap(), 0);
    assert_eq!(fat.entry_at(128).unwrap_err(), FsError::OutOfRange);
    let (_, space) = volume.info().unwrap();
    assert_eq!(space.free, 125);
    assert_eq!(space.reserved, 3);
    assert_eq!(space.allocated, 0);
}

#[test]
fn test_write_past_last_block() {
    // 8 blocks, but a 128-slot table: 125 slots look free
    let mut image = MockImage::new(512, 8, 1, 1, 2, 1);
    let mut volume = image.volume();
    let root = volume.root();

    assert_eq!(
        volume.write_file(root, "huge", &[0; 512 * 5], &CREATED).unwrap_err(),
        FsError::OutOfRange
    );
    assert!(volume.list(root).unwrap().is_empty());
    assert_eq!(volume.free_space().unwrap().free, 125);

    // Five real blocks remain, enough for 4 blocks of content and the trailing one
    let written = volume.write_file(root, "fits", &[1; 512 * 4], &CREATED).unwrap();
    assert_eq!(written.start_block, 3);
    assert_eq!(written.block_count, 5);
}

#[test]
fn test_insufficient_space() {
    let mut image = MockImage::new(512, 128, 1, 1, 2, 1);
    let mut volume = image.volume();
    let root = volume.root();

    assert_eq!(
        volume.write_file(root, "huge", &[0; 512 * 125], &CREATED).unwrap_err(),
        FsError::InsufficientSpace {
            required: 126,
            available: 125,
        }
    );
    assert!(volume.list(root).unwrap().is_empty());
    assert_eq!(volume.free_space().unwrap().free, 125);
}

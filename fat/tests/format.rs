use fat::volume::data::{AttrFlag, DirEntry, RootDir};
use fat::volume::fat::FatArea;
use fat::volume::reserved::Bpb;
use fat::{ClusterId, Layout, SectorId, format, probe};

const MIB: usize = 1024 * 1024;

fn formatted(size: usize) -> (Vec<u8>, Layout) {
    let mut image = vec![0xA5; size];
    let layout = format(&mut image).unwrap();
    (image, layout)
}

#[test]
fn boot_sector_fields() {
    let (image, layout) = formatted(16 * MIB);

    assert_eq!([0xEBu8, 0x3C, 0x90], image[0..3]);
    assert_eq!(b"VDISK   ", &image[3..11]);
    assert_eq!(512, u16::from_le_bytes([image[11], image[12]]));
    assert_eq!(16, image[13]);
    assert_eq!(1, u16::from_le_bytes([image[14], image[15]]));
    assert_eq!(1, image[16]);
    assert_eq!(224, u16::from_le_bytes([image[17], image[18]]));
    assert_eq!(32768, u16::from_le_bytes([image[19], image[20]]));
    assert_eq!(0xF8, image[21]);
    assert_eq!(layout.fat_sectors(), u16::from_le_bytes([image[22], image[23]]));
    assert_eq!(32, u16::from_le_bytes([image[24], image[25]]));
    assert_eq!(2, u16::from_le_bytes([image[26], image[27]]));
    assert_eq!(
        0xC0FF_FFEE,
        u32::from_le_bytes([image[39], image[40], image[41], image[42]])
    );
    assert_eq!(b"NO NAME    ", &image[43..54]);
    assert_eq!(b"FAT16   ", &image[54..62]);
    assert!(image[62..510].iter().all(|&b| b == 0));
    assert_eq!([0x55u8, 0xAA], image[510..512]);
}

#[test]
fn trailer_and_total_sectors_for_every_size() {
    for size in [8 * MIB, 8 * MIB + 512, 12 * MIB, 31 * MIB + 512, 32 * MIB, 33 * MIB, 100 * MIB] {
        let (image, _) = formatted(size);
        let bpb = probe(&image).expect("formatted image should be recognizable");
        assert_eq!([0x55u8, 0xAA], image[510..512], "size={size}");
        assert_eq!((size / 512) as u32, bpb.total_sectors(), "size={size}");
        assert_eq!("FAT16", bpb.fs_type());
    }
}

#[test]
fn large_volume_uses_huge_sectors() {
    let (image, _) = formatted(64 * MIB);
    assert_eq!(0, u16::from_le_bytes([image[19], image[20]]));
    assert_eq!(
        (64 * MIB / 512) as u32,
        u32::from_le_bytes([image[32], image[33], image[34], image[35]])
    );
}

#[test]
fn fat_sectors_monotonic_and_sufficient() {
    let mut prev = 0;
    let mut size = 8 * MIB;
    while size <= 512 * MIB {
        let layout = Layout::new(size as u64).unwrap();
        assert!(layout.fat_sectors() >= prev, "size={size}");
        let entries = usize::from(layout.fat_sectors()) * 512 / 2;
        assert!(entries >= layout.clusters() as usize + 2, "size={size}");
        prev = layout.fat_sectors();
        size += 512 * 1013;
    }
}

#[test]
fn fat_reserved_entries() {
    let (image, layout) = formatted(16 * MIB);
    let fat = FatArea::new(&layout);

    let start = layout.fat_area().offset();
    assert_eq!([0xF8u8, 0xFF, 0xFF, 0xFF], image[start..start + 4]);
    assert_eq!(ClusterId::media_marker(0xF8), fat.get(&image, ClusterId::FREE));
    assert_eq!(ClusterId::EOF, fat.get(&image, ClusterId::new(1)));
    assert_eq!(ClusterId::FREE, fat.get(&image, ClusterId::MIN));
    assert!(fat.capacity() >= layout.clusters() as usize + 2);
    assert!(fat.has_reserved_entries(&image, 0xF8));
    assert!(!fat.has_reserved_entries(&image, 0xF0));

    let mut broken = image.clone();
    broken[start + 2] = 0;
    assert!(!fat.has_reserved_entries(&broken, 0xF8));
}

#[test]
fn root_dir_holds_only_volume_label() {
    let (image, layout) = formatted(8 * MIB);
    let root = RootDir::new(&layout);

    assert_eq!(SectorId::new(6), root.sectors().start);
    let entries = root.entries(&image).unwrap();
    assert_eq!(1, entries.len());

    let label = &entries[0];
    assert_eq!(DirEntry::BLANK_NAME, label.raw_name());
    assert!(label.attr().contains(AttrFlag::VolumeID));
    assert_eq!(0x08, label.attr().bits());
    assert_eq!(0, label.first_cluster());
    assert_eq!(0, label.file_size());

    let offset = layout.root_dir_area().offset();
    assert_eq!(0x08, image[offset + 11]);
    assert!(image[offset + 32..layout.data_area().offset()].iter().all(|&b| b == 0));
}

#[test]
fn image_is_zeroed() {
    let (image, layout) = formatted(8 * MIB);
    assert!(image[layout.data_area().offset()..].iter().all(|&b| b == 0));
}

#[test]
fn data_area_clusters() {
    let layout = Layout::new(8 * MIB as u64).unwrap();
    assert_eq!(SectorId::new(20), layout.data_area());
    // 数据区末尾不足一簇的扇区不计入
    assert_eq!((16384 - 20) / 16, layout.clusters());
    assert!(
        u32::from(layout.data_area()) + layout.clusters() * 16 <= layout.total_sectors()
    );
}

#[test]
fn rejects_impossible_images() {
    let mut tiny = vec![0xA5; 4096];
    assert!(format(&mut tiny).is_err());
    assert!(tiny.iter().all(|&b| b == 0xA5));

    assert!(probe(&[0; 512]).is_none());
    assert!(probe(&[0; 100]).is_none());
}

#[test]
fn probe_roundtrip() {
    let (image, layout) = formatted(8 * MIB);
    let bpb = probe(&image).unwrap();
    assert_eq!(Bpb::new(&layout), bpb);
    assert_eq!("NO NAME", bpb.volume_label());
}

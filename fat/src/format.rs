use crate::volume::data::RootDir;
use crate::volume::fat::FatArea;
use crate::volume::reserved::Bpb;
use crate::{FormatError, Layout, SectorId, SECTOR_BYTES};

/// 把整块镜像格式化为空的FAT16卷。
///
/// 布局不合法时镜像保持原样。
pub fn format(image: &mut [u8]) -> Result<Layout, FormatError> {
    let layout = Layout::new(image.len() as u64)?;
    assert!(
        image.len() >= layout.data_area().offset(),
        "image cannot hold boot sector, FAT and root directory"
    );

    image.fill(0);

    let bpb = Bpb::new(&layout);
    bpb.encode(&mut image[SectorId::BOOT.bytes()])?;
    FatArea::new(&layout).init(image, bpb.media);
    RootDir::new(&layout).init(image)?;

    log::debug!(
        "formatted FAT16: sectors={} fat_sectors={} root_dir={:?} data={:?} clusters={}",
        layout.total_sectors(),
        layout.fat_sectors(),
        layout.root_dir_area(),
        layout.data_area(),
        layout.clusters(),
    );

    Ok(layout)
}

/// 检查镜像开头是否是可识别的启动扇区
pub fn probe(image: &[u8]) -> Option<Bpb> {
    let sector = image.get(..SECTOR_BYTES)?;
    Bpb::decode(sector)
        .ok()
        .filter(|bpb| bpb.is_recognizable())
}

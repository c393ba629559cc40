use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use memmap2::{MmapMut, MmapOptions};

use crate::{VdiskError, VdiskResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackingKind {
    /// 匿名映射，卷关闭后数据即消失
    Memory,
    File(PathBuf),
}

/// 映射进内存的后备存储，由卷独占。
///
/// 字段顺序即释放顺序：先解除映射，再关闭文件。
#[derive(Debug)]
pub(crate) struct Backing {
    map: MmapMut,
    file: Option<File>,
}

impl Backing {
    pub fn memory(size: usize) -> VdiskResult<Self> {
        let map = MmapMut::map_anon(size).map_err(VdiskError::MappingFailed)?;
        Ok(Self { map, file: None })
    }

    /// 打开或新建后备文件。
    ///
    /// 返回的布尔量表示文件在打开前是否已有数据；
    /// 文件比卷小时补零扩展，比卷大时只映射前`size`字节。
    /// 本次新建的文件由返回的 [`ProvisionalFile`] 看管，卷建成前出错就删掉它。
    pub fn open(path: &Path, size: u64) -> VdiskResult<(Self, bool, ProvisionalFile)> {
        let open_failed = |source: io::Error| VdiskError::BackingStoreOpenFailed {
            path: path.to_owned(),
            source,
        };

        // 先于文件声明，出错时文件句柄先关闭再删除
        let mut provisional = ProvisionalFile::default();
        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(file) => {
                provisional = ProvisionalFile(Some(path.to_owned()));
                file
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(open_failed)?,
            Err(err) => return Err(open_failed(err)),
        };

        let existing = file.metadata().map_err(open_failed)?.len();
        if existing < size {
            file.set_len(size).map_err(open_failed)?;
        }

        let len = usize::try_from(size).map_err(|_| {
            VdiskError::MappingFailed(io::Error::new(
                io::ErrorKind::InvalidInput,
                "volume does not fit into the address space",
            ))
        })?;
        // SAFETY: 文件句柄由本结构独占，映射释放前不会关闭；
        // 其它进程同时改写该文件不在支持范围内。
        let map = unsafe { MmapOptions::new().len(len).map_mut(&file) }
            .map_err(VdiskError::MappingFailed)?;

        Ok((
            Self {
                map,
                file: Some(file),
            },
            existing > 0,
            provisional,
        ))
    }

    pub fn kind_is_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn image(&self) -> &[u8] {
        &self.map
    }

    pub fn image_mut(&mut self) -> &mut [u8] {
        &mut self.map
    }

    /// 把映射中的修改写回文件，内存卷无事可做
    pub fn flush(&self) -> VdiskResult<()> {
        if self.kind_is_file() {
            self.map.flush().map_err(VdiskError::FlushFailed)?;
        }
        Ok(())
    }
}

/// 卷创建过程中新建的后备文件。
///
/// 被丢弃时删除文件，创建成功后调用 [`ProvisionalFile::keep`] 保留。
#[derive(Debug, Default)]
pub(crate) struct ProvisionalFile(Option<PathBuf>);

impl ProvisionalFile {
    pub fn keep(mut self) {
        self.0 = None;
    }
}

impl Drop for ProvisionalFile {
    fn drop(&mut self) {
        let Some(path) = self.0.take() else {
            return;
        };
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("removed unused backing file {}", path.display()),
            Err(err) => log::warn!("failed to remove backing file {}: {err}", path.display()),
        }
    }
}

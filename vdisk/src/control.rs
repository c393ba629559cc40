//! 设备控制查询
//!
//! 只实现存储栈把这块内存当作磁盘所必需的几个查询，其余的要么是
//! 无条件成功的空操作，要么直接拒绝。查询不经过请求队列，也不触碰镜像。
//!
//! 应答记录与 Windows 的 `DISK_GEOMETRY`、`PARTITION_INFORMATION`、
//! `GET_LENGTH_INFORMATION` 逐字节一致，均为小端序。

use std::io::Cursor;

use binrw::{BinRead, BinResult, BinWrite};

use crate::{Geometry, VdiskError, VdiskResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ControlCode {
    DiskGetDriveGeometry = 0x0007_0000,
    DiskGetMediaTypes = 0x0007_0C00,
    CdromGetDriveGeometry = 0x0002_404C,
    DiskGetPartitionInfo = 0x0007_4004,
    DiskGetLengthInfo = 0x0007_405C,
    DiskCheckVerify = 0x0007_4800,
    DiskIsWritable = 0x0007_0024,
    DiskMediaRemoval = 0x0007_4804,
    DiskSetPartitionInfo = 0x0007_C008,
    DiskVerify = 0x0007_0014,
    MountdevQueryDeviceName = 0x004D_0008,
    StorageCheckVerify = 0x002D_4800,
    StorageCheckVerify2 = 0x002D_0800,
    StorageMediaRemoval = 0x002D_4804,
}

/// 查询按应答方式归类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Geometry,
    PartitionInfo,
    LengthInfo,
    /// 固定介质：总是校验通过、不可移除、可写
    NoOp,
}

impl ControlCode {
    pub const ALL: [Self; 14] = [
        Self::DiskGetDriveGeometry,
        Self::DiskGetMediaTypes,
        Self::CdromGetDriveGeometry,
        Self::DiskGetPartitionInfo,
        Self::DiskGetLengthInfo,
        Self::DiskCheckVerify,
        Self::DiskIsWritable,
        Self::DiskMediaRemoval,
        Self::DiskSetPartitionInfo,
        Self::DiskVerify,
        Self::MountdevQueryDeviceName,
        Self::StorageCheckVerify,
        Self::StorageCheckVerify2,
        Self::StorageMediaRemoval,
    ];

    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|code| *code as u32 == raw)
    }

    pub const fn query(self) -> Query {
        match self {
            Self::DiskGetDriveGeometry | Self::DiskGetMediaTypes | Self::CdromGetDriveGeometry => {
                Query::Geometry
            }
            Self::DiskGetPartitionInfo => Query::PartitionInfo,
            Self::DiskGetLengthInfo => Query::LengthInfo,
            _ => Query::NoOp,
        }
    }
}

/// `DISK_GEOMETRY`
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct DiskGeometry {
    /// @0
    pub cylinders: i64,
    /// @8
    pub media_type: u32,
    /// @12
    pub tracks_per_cylinder: u32,
    /// @16
    pub sectors_per_track: u32,
    /// @20
    pub bytes_per_sector: u32,
}

/// `PARTITION_INFORMATION`，按8字节对齐补齐到32字节
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct PartitionInformation {
    /// @0
    pub starting_offset: i64,
    /// @8
    pub partition_length: i64,
    /// @16
    pub hidden_sectors: u32,
    /// @20
    pub partition_number: u32,
    /// @24
    pub partition_type: u8,
    /// @25
    pub boot_indicator: u8,
    /// @26
    pub recognized_partition: u8,
    /// @27
    #[brw(pad_after = 4)]
    pub rewrite_partition: u8,
}

/// `GET_LENGTH_INFORMATION`
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct LengthInformation {
    /// @0
    pub length: i64,
}

impl DiskGeometry {
    pub const SIZE: usize = 24;
}

impl PartitionInformation {
    pub const SIZE: usize = 32;

    /// 分区类型沿用 FAT32 (0x0B)，存储栈只要求它是可识别的类型
    pub const PARTITION_TYPE: u8 = 0x0B;

    /// 覆盖整个卷的唯一分区
    pub fn whole_volume(size: u64) -> Self {
        Self {
            starting_offset: 0,
            partition_length: size as i64,
            hidden_sectors: 0,
            partition_number: 1,
            partition_type: Self::PARTITION_TYPE,
            boot_indicator: 0,
            recognized_partition: 1,
            rewrite_partition: 0,
        }
    }
}

impl LengthInformation {
    pub const SIZE: usize = 8;
}

impl From<&Geometry> for DiskGeometry {
    fn from(geometry: &Geometry) -> Self {
        Self {
            cylinders: geometry.cylinders as i64,
            media_type: geometry.media_type as u32,
            tracks_per_cylinder: geometry.tracks_per_cylinder,
            sectors_per_track: geometry.sectors_per_track,
            bytes_per_sector: geometry.bytes_per_sector,
        }
    }
}

macro_rules! codec {
    ($($record:ty),*) => {$(
        impl $record {
            pub fn decode(raw: &[u8]) -> BinResult<Self> {
                Self::read(&mut Cursor::new(raw))
            }

            pub fn encode(&self, raw: &mut [u8]) -> BinResult<()> {
                self.write(&mut Cursor::new(raw))
            }
        }
    )*};
}

codec!(DiskGeometry, PartitionInformation, LengthInformation);

/// 应答一次设备控制查询，返回写入`output`的字节数。
///
/// 出错时`output`保持原样。
pub fn respond(geometry: &Geometry, size: u64, code: u32, output: &mut [u8]) -> VdiskResult<usize> {
    let Some(code) = ControlCode::from_raw(code) else {
        log::debug!("unsupported control code {code:#010x}");
        return Err(VdiskError::UnsupportedRequest(code));
    };

    let written = match code.query() {
        Query::Geometry => {
            check_len(output, DiskGeometry::SIZE)?;
            DiskGeometry::from(geometry).encode(&mut output[..DiskGeometry::SIZE])?;
            DiskGeometry::SIZE
        }
        Query::PartitionInfo => {
            if output.len() < PartitionInformation::SIZE {
                return Err(VdiskError::InvalidParameter(format!(
                    "partition information needs {} bytes, got {}",
                    PartitionInformation::SIZE,
                    output.len()
                )));
            }
            PartitionInformation::whole_volume(size)
                .encode(&mut output[..PartitionInformation::SIZE])?;
            PartitionInformation::SIZE
        }
        Query::LengthInfo => {
            check_len(output, LengthInformation::SIZE)?;
            LengthInformation {
                length: size as i64,
            }
            .encode(&mut output[..LengthInformation::SIZE])?;
            LengthInformation::SIZE
        }
        Query::NoOp => 0,
    };

    log::debug!("{code:?} -> {written} bytes");
    Ok(written)
}

fn check_len(output: &[u8], needed: usize) -> VdiskResult<()> {
    if output.len() < needed {
        return Err(VdiskError::BufferTooSmall {
            needed,
            got: output.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: u64 = 16 * 1024 * 1024;

    fn ask(code: ControlCode, output: &mut [u8]) -> VdiskResult<usize> {
        respond(&Geometry::from_size(SIZE), SIZE, code as u32, output)
    }

    #[test]
    fn geometry() {
        let mut out = [0u8; 64];
        for code in [
            ControlCode::DiskGetDriveGeometry,
            ControlCode::DiskGetMediaTypes,
            ControlCode::CdromGetDriveGeometry,
        ] {
            assert_eq!(24, ask(code, &mut out).unwrap());
            let geometry = DiskGeometry::decode(&out).unwrap();
            assert_eq!(512, geometry.cylinders);
            assert_eq!(12, geometry.media_type);
            assert_eq!(2, geometry.tracks_per_cylinder);
            assert_eq!(32, geometry.sectors_per_track);
            assert_eq!(512, geometry.bytes_per_sector);
        }
    }

    #[test]
    fn geometry_buffer_too_small() {
        let mut out = [0xAAu8; 23];
        assert!(matches!(
            ask(ControlCode::DiskGetDriveGeometry, &mut out),
            Err(VdiskError::BufferTooSmall { needed: 24, got: 23 })
        ));
        assert!(out.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn partition_info() {
        let mut out = [0u8; 32];
        assert_eq!(32, ask(ControlCode::DiskGetPartitionInfo, &mut out).unwrap());
        let info = PartitionInformation::decode(&out).unwrap();
        assert_eq!(PartitionInformation::whole_volume(SIZE), info);
        assert_eq!(SIZE as i64, info.partition_length);
        assert_eq!(0, info.starting_offset);
        assert_eq!(SIZE, u64::from_le_bytes(out[8..16].try_into().unwrap()));

        let err = ask(ControlCode::DiskGetPartitionInfo, &mut [0u8; 31]).unwrap_err();
        assert!(matches!(err, VdiskError::InvalidParameter(_)));
        assert!(err.is_protocol_error());
    }

    #[test]
    fn length_info() {
        let mut out = [0u8; 8];
        assert_eq!(8, ask(ControlCode::DiskGetLengthInfo, &mut out).unwrap());
        assert_eq!(SIZE, u64::from_le_bytes(out));
        assert!(matches!(
            ask(ControlCode::DiskGetLengthInfo, &mut [0u8; 4]),
            Err(VdiskError::BufferTooSmall { needed: 8, got: 4 })
        ));
    }

    #[test]
    fn no_ops_and_unknown() {
        for code in ControlCode::ALL
            .into_iter()
            .filter(|code| code.query() == Query::NoOp)
        {
            assert_eq!(0, ask(code, &mut []).unwrap(), "{code:?}");
        }
        assert_eq!(9, ControlCode::ALL.len() - 5);

        let geometry = Geometry::from_size(SIZE);
        assert!(matches!(
            respond(&geometry, SIZE, 0xDEAD_BEEF, &mut [0u8; 64]),
            Err(VdiskError::UnsupportedRequest(0xDEAD_BEEF))
        ));
    }
}

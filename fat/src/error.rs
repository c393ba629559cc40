use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("image of {size} bytes is too small for a FAT16 layout")]
    TooSmall { size: u64 },

    #[error("{clusters} clusters exceed the FAT16 limit of {max}")]
    TooManyClusters { clusters: u32, max: u32 },

    #[error("failed to encode on-disk structure: {0}")]
    Encode(#[from] binrw::Error),
}
